use crate::db::operations::word::{self, CreateWordInput, WordDefinition};
use crate::db::DatabaseProxy;

struct SampleWord {
    word: &'static str,
    pronunciation: &'static str,
    part_of_speech: &'static str,
    meaning: &'static str,
    example: &'static str,
    example_translation: &'static str,
    difficulty: &'static str,
    frequency: i32,
    tags: &'static [&'static str],
}

const SAMPLE_WORDS: &[SampleWord] = &[
    SampleWord {
        word: "serendipity",
        pronunciation: "/ˌserənˈdɪpəti/",
        part_of_speech: "n.",
        meaning: "意外发现美好事物的能力；机缘巧合",
        example: "Finding that bookshop was pure serendipity.",
        example_translation: "找到那家书店纯属机缘巧合。",
        difficulty: "hard",
        frequency: 120,
        tags: &["GRE", "advanced"],
    },
    SampleWord {
        word: "resilient",
        pronunciation: "/rɪˈzɪliənt/",
        part_of_speech: "adj.",
        meaning: "有弹性的；能迅速恢复的",
        example: "Children are often remarkably resilient.",
        example_translation: "孩子们往往有惊人的恢复力。",
        difficulty: "medium",
        frequency: 450,
        tags: &["TOEFL", "CET6"],
    },
    SampleWord {
        word: "ambiguous",
        pronunciation: "/æmˈbɪɡjuəs/",
        part_of_speech: "adj.",
        meaning: "模棱两可的；含糊不清的",
        example: "The instructions were ambiguous and confusing.",
        example_translation: "这些说明模棱两可，令人困惑。",
        difficulty: "medium",
        frequency: 380,
        tags: &["CET6", "IELTS"],
    },
    SampleWord {
        word: "meticulous",
        pronunciation: "/məˈtɪkjələs/",
        part_of_speech: "adj.",
        meaning: "一丝不苟的；极仔细的",
        example: "She kept meticulous records of every expense.",
        example_translation: "她对每一笔开销都做了详尽的记录。",
        difficulty: "hard",
        frequency: 200,
        tags: &["GRE", "TOEFL"],
    },
    SampleWord {
        word: "collaborate",
        pronunciation: "/kəˈlæbəreɪt/",
        part_of_speech: "v.",
        meaning: "合作；协作",
        example: "The two teams collaborated on the project.",
        example_translation: "两个团队在这个项目上进行了合作。",
        difficulty: "easy",
        frequency: 680,
        tags: &["CET4"],
    },
    SampleWord {
        word: "inevitable",
        pronunciation: "/ɪnˈevɪtəbl/",
        part_of_speech: "adj.",
        meaning: "不可避免的；必然发生的",
        example: "Change is inevitable in a growing company.",
        example_translation: "在成长中的公司里，变化是不可避免的。",
        difficulty: "medium",
        frequency: 520,
        tags: &["CET6", "IELTS"],
    },
    SampleWord {
        word: "abundant",
        pronunciation: "/əˈbʌndənt/",
        part_of_speech: "adj.",
        meaning: "丰富的；充裕的",
        example: "The region has abundant natural resources.",
        example_translation: "该地区自然资源丰富。",
        difficulty: "easy",
        frequency: 610,
        tags: &["CET4"],
    },
    SampleWord {
        word: "perseverance",
        pronunciation: "/ˌpɜːrsəˈvɪrəns/",
        part_of_speech: "n.",
        meaning: "毅力；坚持不懈",
        example: "Success requires talent and perseverance.",
        example_translation: "成功需要天赋和毅力。",
        difficulty: "hard",
        frequency: 180,
        tags: &["GRE", "CET6"],
    },
];

/// Seeds the sample vocabulary when the words table is empty, so a fresh
/// deployment has something to study.
pub async fn seed_sample_words(proxy: &DatabaseProxy) {
    let count = match word::count_all_words(proxy).await {
        Ok(count) => count,
        Err(err) => {
            tracing::warn!(error = %err, "failed to check word count, skipping seed");
            return;
        }
    };

    if count > 0 {
        tracing::debug!(count, "words table already populated");
        return;
    }

    tracing::info!("words table is empty, seeding sample vocabulary...");

    let mut seeded = 0;
    for sample in SAMPLE_WORDS {
        let input = CreateWordInput {
            word: sample.word.to_string(),
            pronunciation: sample.pronunciation.to_string(),
            audio_url: None,
            definitions: vec![WordDefinition {
                part_of_speech: sample.part_of_speech.to_string(),
                meaning: sample.meaning.to_string(),
                example: sample.example.to_string(),
                example_translation: sample.example_translation.to_string(),
            }],
            difficulty: sample.difficulty.to_string(),
            frequency: sample.frequency,
            tags: sample.tags.iter().map(|t| t.to_string()).collect(),
        };

        match word::create_word(proxy, &input).await {
            Ok(_) => seeded += 1,
            Err(err) => {
                tracing::warn!(error = %err, word = sample.word, "failed to seed word");
            }
        }
    }

    tracing::info!(seeded, "sample vocabulary seeded");
}
