//! Draw-date normalization in the operator's fixed UTC+8 timezone.
//!
//! Result pages render draw dates as civil text in UTC+8 no matter where
//! the scraper runs. Civil text is anchored at midnight in that offset;
//! instants (RFC 3339) are converted into it. The local timezone of the
//! process is never consulted.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};

/// Offset of the draw timezone from UTC, in seconds.
pub const DRAW_TZ_OFFSET_SECS: i32 = 8 * 3600;

/// Civil date formats seen on result pages and draw pickers.
const CIVIL_FORMATS: [&str; 6] = [
    "%a, %d %b %Y",
    "%A, %d %B %Y",
    "%a %d %b %Y",
    "%d %b %Y",
    "%Y-%m-%d",
    "%d/%m/%Y",
];

/// Error returned when a draw date cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    /// The text is empty after trimming.
    #[error("empty draw date")]
    Empty,
    /// The text matches none of the known formats.
    #[error("unrecognised draw date: {0:?}")]
    Unrecognised(String),
}

/// The fixed UTC+8 offset draws are published in.
#[must_use]
pub fn draw_tz() -> FixedOffset {
    FixedOffset::east_opt(DRAW_TZ_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Current civil date in the draw timezone.
#[must_use]
pub fn today_in_draw_tz() -> NaiveDate {
    date_in_draw_tz(Utc::now())
}

/// Civil date of `instant` as seen in the draw timezone.
#[must_use]
pub fn date_in_draw_tz(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&draw_tz()).date_naive()
}

/// Converts a rendered draw date into a canonical civil date.
///
/// The `Display` form of the result is `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns [`DateError`] if the text is empty or in an unknown format.
pub fn normalize_draw_date(raw: &str) -> Result<NaiveDate, DateError> {
    let text = clean(raw);
    if text.is_empty() {
        return Err(DateError::Empty);
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(&text) {
        return Ok(date_in_draw_tz(instant.with_timezone(&Utc)));
    }

    for format in CIVIL_FORMATS {
        if let Ok(civil) = NaiveDate::parse_from_str(&text, format) {
            return Ok(anchor_in_draw_tz(civil));
        }
    }

    Err(DateError::Unrecognised(raw.trim().to_string()))
}

/// Pins a civil date to midnight UTC+8 and reads the calendar date back
/// in that offset.
fn anchor_in_draw_tz(civil: NaiveDate) -> NaiveDate {
    let tz = draw_tz();
    civil
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| tz.from_local_datetime(&midnight).single())
        .map_or(civil, |anchored| anchored.date_naive())
}

/// Collapses whitespace and strips a leading `"Draw Date:"`-style label.
fn clean(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.split_once(':') {
        Some((label, rest)) if label.to_ascii_lowercase().contains("date") => {
            rest.trim().to_string()
        }
        _ => collapsed,
    }
}
