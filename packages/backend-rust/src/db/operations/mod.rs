pub mod progress;
pub mod referral;
pub mod share;
pub mod study_session;
pub mod user;
pub mod word;
pub mod wordset;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Formats a naive UTC timestamp as an ISO-8601 string with a `Z` suffix.
pub(crate) fn format_naive_iso(value: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(value, Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
