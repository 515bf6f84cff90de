use std::time::Duration;

pub const WORD_CATEGORIES_TTL: Duration = Duration::from_secs(60 * 60);

pub fn word_categories_key() -> &'static str {
    "words:categories"
}
