use chrono::{DateTime, Utc};

/// Prefix CleverTap uses to recognise date-valued profile properties.
pub const DATE_PREFIX: &str = "$D_";

/// Format `date` as a CleverTap date property: `$D_` followed by whole
/// seconds since the Unix epoch.
pub fn clevertap_date(date: DateTime<Utc>) -> String {
    format!("{}{}", DATE_PREFIX, date.timestamp())
}
