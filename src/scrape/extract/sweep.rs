//! Sweep results page.
//!
//! Three top prizes are labelled cells. The remaining prize groups carry no
//! labels; they are the first four `table.tableSweepPrizes` in document
//! order (jackpot, lucky, gift, consolation).

use scraper::Html;

use super::{
    RawHeader, ValidationError, all_texts, find_first, first_text, fixed_group, parse_digits,
    parse_draw_number_label, required, selector,
};
use crate::domain::DrawPayload;
use crate::domain::draw::{
    SWEEP_CONSOLATION_COUNT, SWEEP_GIFT_COUNT, SWEEP_JACKPOT_COUNT, SWEEP_LUCKY_COUNT, SweepResult,
};

/// Results container.
pub const CONTAINER: &str = "div.sweep-result";
/// Draw number label.
pub const DRAW_NUMBER: &str = ".drawNumber";
const DRAW_DATE: &str = ".drawDate";
const FIRST_PRIZE: &str = "td.valueFirstPrize";
const SECOND_PRIZE: &str = "td.valueSecondPrize";
const THIRD_PRIZE: &str = "td.valueThirdPrize";
const PRIZE_TABLES: &str = "table.tableSweepPrizes";

/// Digits on a Sweep ticket.
pub const TICKET_DIGITS: usize = 7;

/// Raw Sweep draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSweep {
    /// Draw number and date.
    pub header: RawHeader,
    /// First prize.
    pub first_prize: Option<String>,
    /// Second prize.
    pub second_prize: Option<String>,
    /// Third prize.
    pub third_prize: Option<String>,
    /// Jackpot prizes.
    pub jackpot: Vec<Option<String>>,
    /// Lucky prizes.
    pub lucky: Vec<Option<String>>,
    /// Gift prizes.
    pub gift: Vec<Option<String>>,
    /// Consolation prizes.
    pub consolation: Vec<Option<String>>,
}

pub(super) fn extract(document: &Html) -> Option<RawSweep> {
    let container = find_first(document, CONTAINER)?;
    let ticket = |text: String| parse_digits(&text, TICKET_DIGITS);

    let mut groups: Vec<Vec<Option<String>>> = selector(PRIZE_TABLES)
        .map(|sel| {
            container
                .select(&sel)
                .take(4)
                .map(|table| all_texts(table, "td").into_iter().map(ticket).collect())
                .collect()
        })
        .unwrap_or_default();
    // A missing table leaves its group empty; validation reports the size.
    groups.resize(4, Vec::new());
    let mut groups = groups.into_iter();
    let mut next_group = || groups.next().unwrap_or_default();

    Some(RawSweep {
        header: RawHeader {
            draw_number: first_text(container, DRAW_NUMBER)
                .as_deref()
                .and_then(parse_draw_number_label),
            draw_date_text: first_text(container, DRAW_DATE),
        },
        first_prize: first_text(container, FIRST_PRIZE).and_then(ticket),
        second_prize: first_text(container, SECOND_PRIZE).and_then(ticket),
        third_prize: first_text(container, THIRD_PRIZE).and_then(ticket),
        jackpot: next_group(),
        lucky: next_group(),
        gift: next_group(),
        consolation: next_group(),
    })
}

impl RawSweep {
    pub(super) fn into_payload(self) -> Result<DrawPayload, ValidationError> {
        Ok(DrawPayload::Sweep(SweepResult {
            first_prize: required(self.first_prize, "first_prize")?,
            second_prize: required(self.second_prize, "second_prize")?,
            third_prize: required(self.third_prize, "third_prize")?,
            jackpot: fixed_group(self.jackpot, "jackpot", SWEEP_JACKPOT_COUNT)?,
            lucky: fixed_group(self.lucky, "lucky", SWEEP_LUCKY_COUNT)?,
            gift: fixed_group(self.gift, "gift", SWEEP_GIFT_COUNT)?,
            consolation: fixed_group(self.consolation, "consolation", SWEEP_CONSOLATION_COUNT)?,
        }))
    }
}
