//! Small shared helpers.

use chrono::Utc;

/// Current UTC timestamp in RFC 3339, the format used for all *_at columns.
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Today's UTC calendar date as `YYYY-MM-DD`, the format used for due dates
/// and streak keys.
pub(crate) fn today_string() -> String {
    Utc::now().date_naive().to_string()
}
