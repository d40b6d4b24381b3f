//! DOM-to-record extraction for the three result page structures.
//!
//! Extraction is split in two steps:
//!
//! 1. [`extract`] maps a rendered document to a [`RawDraw`]. It returns
//!    `None` when the game's results container is missing, which means
//!    "nothing published yet", not a fault. Every scalar in a raw draw is
//!    an `Option`; `None` marks text that did not parse.
//! 2. [`RawDraw::validate`] turns a raw draw into a [`DrawRecord`] or a
//!    [`ValidationError`]. Nothing unvalidated leaves this module, so the
//!    positional assumptions of the markup stay here.

pub mod four_d;
pub mod lotto;
pub mod options;
pub mod sweep;

use scraper::{ElementRef, Html, Selector};

use crate::domain::{DrawRecord, GameType};
use crate::scrape::dates::{DateError, normalize_draw_date};

pub use four_d::RawFourD;
pub use lotto::{RawLotto, RawPrizeRow};
pub use options::{DrawOption, PICKER_SELECTOR, draw_options};
pub use sweep::RawSweep;

/// Fields shared by every game's results header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHeader {
    /// Draw number parsed from the `"Draw No. 4123"` label.
    pub draw_number: Option<u32>,
    /// Draw date text as rendered.
    pub draw_date_text: Option<String>,
}

/// Extractor output before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawDraw {
    /// 4D page.
    FourD(RawFourD),
    /// Lotto page.
    Lotto(RawLotto),
    /// Sweep page.
    Sweep(RawSweep),
}

/// Reason a raw draw was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field was absent or did not parse.
    #[error("missing or unparseable field: {0}")]
    MissingField(&'static str),
    /// Draw number was zero.
    #[error("draw number must be positive")]
    InvalidDrawNumber,
    /// The draw date could not be normalized.
    #[error("bad draw date: {0}")]
    BadDate(#[from] DateError),
    /// A fixed-size prize group had the wrong number of entries.
    #[error("{group}: expected {expected} numbers, found {found}")]
    GroupSize {
        /// Group name.
        group: &'static str,
        /// Expected count.
        expected: usize,
        /// Count on the page.
        found: usize,
    },
    /// A Lotto number outside 1..=49.
    #[error("{field} out of range: {value}")]
    NumberOutOfRange {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: u8,
    },
    /// The same Lotto number appears twice among the seven drawn.
    #[error("number {0} drawn twice")]
    DuplicateNumber(u8),
    /// The Lotto prize table had no rows.
    #[error("prize table is empty")]
    EmptyPrizeTable,
}

/// Runs the extractor for `game` over a rendered document.
///
/// Returns `None` when the results container is absent.
#[must_use]
pub fn extract(game: GameType, html: &str) -> Option<RawDraw> {
    let document = Html::parse_document(html);
    match game {
        GameType::FourD => four_d::extract(&document).map(RawDraw::FourD),
        GameType::Lotto => lotto::extract(&document).map(RawDraw::Lotto),
        GameType::Sweep => sweep::extract(&document).map(RawDraw::Sweep),
    }
}

/// Results container selector for `game`; its presence means the page rendered.
#[must_use]
pub const fn container_selector(game: GameType) -> &'static str {
    match game {
        GameType::FourD => four_d::CONTAINER,
        GameType::Lotto => lotto::CONTAINER,
        GameType::Sweep => sweep::CONTAINER,
    }
}

/// Selector of the element showing the current draw number for `game`.
#[must_use]
pub const fn draw_number_selector(game: GameType) -> &'static str {
    match game {
        GameType::FourD => four_d::DRAW_NUMBER,
        GameType::Lotto => lotto::DRAW_NUMBER,
        GameType::Sweep => sweep::DRAW_NUMBER,
    }
}

impl RawDraw {
    /// Game the raw draw was extracted for.
    #[must_use]
    pub const fn game(&self) -> GameType {
        match self {
            Self::FourD(_) => GameType::FourD,
            Self::Lotto(_) => GameType::Lotto,
            Self::Sweep(_) => GameType::Sweep,
        }
    }

    /// Shared header fields.
    #[must_use]
    pub const fn header(&self) -> &RawHeader {
        match self {
            Self::FourD(raw) => &raw.header,
            Self::Lotto(raw) => &raw.header,
            Self::Sweep(raw) => &raw.header,
        }
    }

    /// Draw number as parsed, if any.
    #[must_use]
    pub const fn draw_number(&self) -> Option<u32> {
        self.header().draw_number
    }

    /// Validates every required field and builds the typed record.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if any required field is missing or
    /// malformed; no partial record is produced.
    pub fn validate(self) -> Result<DrawRecord, ValidationError> {
        let header = self.header().clone();
        let draw_number = required(header.draw_number, "draw_number")?;
        if draw_number == 0 {
            return Err(ValidationError::InvalidDrawNumber);
        }
        let date_text = required(header.draw_date_text, "draw_date")?;
        let draw_date = normalize_draw_date(&date_text)?;

        let payload = match self {
            Self::FourD(raw) => raw.into_payload()?,
            Self::Lotto(raw) => raw.into_payload()?,
            Self::Sweep(raw) => raw.into_payload()?,
        };

        Ok(DrawRecord {
            draw_number,
            draw_date,
            payload,
        })
    }
}

pub(crate) fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::MissingField(field))
}

/// Checks a fixed-size group and unwraps its entries.
pub(crate) fn fixed_group(
    values: Vec<Option<String>>,
    group: &'static str,
    expected: usize,
) -> Result<Vec<String>, ValidationError> {
    if values.len() != expected {
        return Err(ValidationError::GroupSize {
            group,
            expected,
            found: values.len(),
        });
    }
    values
        .into_iter()
        .map(|v| required(v, group))
        .collect()
}

// ── Text helpers ────────────────────────────────────────────────────────

pub(crate) fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// First element matching `css` anywhere in the document.
pub(crate) fn find_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let sel = selector(css)?;
    document.select(&sel).next()
}

/// Whitespace-collapsed text of an element.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first match of `css` inside `scope`.
pub(crate) fn first_text(scope: ElementRef<'_>, css: &str) -> Option<String> {
    let sel = selector(css)?;
    scope.select(&sel).next().map(element_text)
}

/// Texts of every match of `css` inside `scope`, in document order.
pub(crate) fn all_texts(scope: ElementRef<'_>, css: &str) -> Vec<String> {
    selector(css)
        .map(|sel| scope.select(&sel).map(element_text).collect())
        .unwrap_or_default()
}

/// Parses a `"Draw No. 4123"` label: the last whitespace-delimited token
/// coerced to an integer.
#[must_use]
pub fn parse_draw_number_label(text: &str) -> Option<u32> {
    let token = text.split_whitespace().last()?;
    let digits = token.trim_matches(|c: char| !c.is_ascii_digit());
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parses a money figure such as `"$1,234,567"` or `"$3,200,000.00"` into
/// whole dollars. Cents are rounded half up: `"$10.50"` gives 11 and
/// `"$10.49"` gives 10.
#[must_use]
pub fn parse_amount(text: &str) -> Option<u64> {
    let cleaned: String = text
        .trim()
        .trim_start_matches("SGD")
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    let (whole, fraction) = cleaned.split_once('.').unwrap_or((cleaned.as_str(), ""));
    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let dollars: u64 = whole.parse().ok()?;
    let round_up = fraction.chars().next().is_some_and(|c| c >= '5');
    Some(if round_up { dollars.saturating_add(1) } else { dollars })
}

/// Parses a plain integer, tolerating thousands separators.
#[must_use]
pub fn parse_count(text: &str) -> Option<u32> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    cleaned.parse().ok()
}

/// Accepts exactly `width` ASCII digits, keeping leading zeros.
#[must_use]
pub fn parse_digits(text: &str, width: usize) -> Option<String> {
    let trimmed = text.trim();
    (trimmed.len() == width && trimmed.chars().all(|c| c.is_ascii_digit()))
        .then(|| trimmed.to_string())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn draw_number_label_takes_last_token() {
        assert_eq!(parse_draw_number_label("Draw No. 4123"), Some(4123));
        assert_eq!(parse_draw_number_label("  Draw  No.  5000 "), Some(5000));
        assert_eq!(parse_draw_number_label("Draw No. ----"), None);
        assert_eq!(parse_draw_number_label(""), None);
    }

    #[test]
    fn amounts_strip_currency_and_separators() {
        assert_eq!(parse_amount("$1,234,567"), Some(1_234_567));
        assert_eq!(parse_amount("$3,200,000.00"), Some(3_200_000));
        assert_eq!(parse_amount("$10.50"), Some(11));
        assert_eq!(parse_amount("$10.49"), Some(10));
        assert_eq!(parse_amount("-"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("$1,2a3"), None);
    }

    #[test]
    fn counts_and_digits() {
        assert_eq!(parse_count("1,024"), Some(1024));
        assert_eq!(parse_count("-"), None);
        assert_eq!(parse_digits("0427", 4), Some("0427".to_string()));
        assert_eq!(parse_digits("427", 4), None);
        assert_eq!(parse_digits("04a7", 4), None);
    }

    #[test]
    fn missing_container_is_none_for_every_game() {
        let html = "<html><body><p>Results will be available shortly.</p></body></html>";
        for game in GameType::ALL {
            assert!(extract(game, html).is_none());
        }
    }

    #[test]
    fn fixed_group_rejects_wrong_size_and_holes() {
        let ok = fixed_group(vec![Some("1".to_string()), Some("2".to_string())], "g", 2);
        assert_eq!(ok, Ok(vec!["1".to_string(), "2".to_string()]));

        assert!(matches!(
            fixed_group(vec![Some("1".to_string())], "g", 2),
            Err(ValidationError::GroupSize { found: 1, .. })
        ));
        assert_eq!(
            fixed_group(vec![Some("1".to_string()), None], "g", 2),
            Err(ValidationError::MissingField("g"))
        );
    }
}
