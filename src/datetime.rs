//! Date/time utilities for Filebox.

use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;

/// Format a UTC datetime as RFC3339 in the specified timezone.
///
/// Falls back to UTC when the timezone name is not recognized.
///
/// # Examples
///
/// `2024-01-15T10:30:00Z` in "Europe/Moscow" becomes `2024-01-15T13:30:00+03:00`.
pub fn to_rfc3339(dt: &DateTime<Utc>, timezone: &str) -> String {
    match timezone.parse::<Tz>() {
        Ok(tz) => dt
            .with_timezone(&tz)
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        Err(_) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

/// Convert a filesystem timestamp to a UTC datetime.
pub fn from_system_time(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}
