//! Lotto (6/49) results page.
//!
//! Six ordered winning numbers, one additional number, and a prize table
//! whose rows are `group | prize amount | winning shares`. Right after a
//! jackpot rolls over the Group 1 amount cell can be blank or zero while
//! the jackpot figure is shown elsewhere; the extractor then uses the
//! jackpot figure for Group 1.

use scraper::Html;

use super::{
    RawHeader, ValidationError, all_texts, element_text, find_first, first_text, parse_amount,
    parse_count, parse_draw_number_label, required, selector,
};
use crate::domain::DrawPayload;
use crate::domain::draw::{LottoResult, PrizeGroup};

/// Results container.
pub const CONTAINER: &str = "div.toto-result";
/// Draw number label.
pub const DRAW_NUMBER: &str = "th.drawNumber";
const DRAW_DATE: &str = "th.drawDate";
const WINNING: [&str; 6] = [
    "td.win1", "td.win2", "td.win3", "td.win4", "td.win5", "td.win6",
];
const ADDITIONAL: &str = "td.additional";
const JACKPOT: &str = "td.jackpotPrize";
const PRIZE_ROWS: &str = "table.tableWinningShares tbody tr";

/// Highest ball number.
pub const MAX_BALL: u8 = 49;

/// One row of the prize table as read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPrizeRow {
    /// Group label.
    pub group: String,
    /// Prize amount per share.
    pub prize_amount: Option<u64>,
    /// Winning shares.
    pub winner_count: Option<u32>,
}

/// Raw Lotto draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLotto {
    /// Draw number and date.
    pub header: RawHeader,
    /// Winning numbers in page order; always six slots.
    pub winning_numbers: Vec<Option<u8>>,
    /// Additional number.
    pub additional_number: Option<u8>,
    /// Prize table rows, top tier first.
    pub prize_rows: Vec<RawPrizeRow>,
    /// Jackpot figure shown outside the table.
    pub jackpot: Option<u64>,
}

pub(super) fn extract(document: &Html) -> Option<RawLotto> {
    let container = find_first(document, CONTAINER)?;
    let ball = |text: String| text.trim().parse::<u8>().ok();

    let jackpot = first_text(container, JACKPOT).as_deref().and_then(parse_amount);
    let mut prize_rows = read_prize_rows(container);
    apply_jackpot_fallback(&mut prize_rows, jackpot);

    Some(RawLotto {
        header: RawHeader {
            draw_number: first_text(container, DRAW_NUMBER)
                .as_deref()
                .and_then(parse_draw_number_label),
            draw_date_text: first_text(container, DRAW_DATE),
        },
        winning_numbers: WINNING
            .iter()
            .map(|css| first_text(container, css).and_then(ball))
            .collect(),
        additional_number: first_text(container, ADDITIONAL).and_then(ball),
        prize_rows,
        jackpot,
    })
}

fn read_prize_rows(container: scraper::ElementRef<'_>) -> Vec<RawPrizeRow> {
    let Some(row_sel) = selector(PRIZE_ROWS) else {
        return Vec::new();
    };
    container
        .select(&row_sel)
        .filter_map(|row| {
            let cells = all_texts(row, "td");
            // Header rows use <th> and yield no cells.
            let [group, amount, winners] = cells.as_slice() else {
                if !cells.is_empty() {
                    tracing::debug!(row = %element_text(row), "skipping prize row with unexpected shape");
                }
                return None;
            };
            Some(RawPrizeRow {
                group: group.clone(),
                prize_amount: parse_amount(amount),
                winner_count: parse_winner_count(winners),
            })
        })
        .collect()
}

/// The page prints `-` for tiers nobody won.
fn parse_winner_count(text: &str) -> Option<u32> {
    match text.trim() {
        "-" | "" => Some(0),
        other => parse_count(other),
    }
}

/// Uses the displayed jackpot as the top tier amount when the table cell
/// is blank or zero.
fn apply_jackpot_fallback(rows: &mut [RawPrizeRow], jackpot: Option<u64>) {
    let Some(jackpot) = jackpot.filter(|j| *j > 0) else {
        return;
    };
    if let Some(top) = rows.first_mut()
        && top.prize_amount.is_none_or(|amount| amount == 0)
    {
        top.prize_amount = Some(jackpot);
    }
}

impl RawLotto {
    pub(super) fn into_payload(self) -> Result<DrawPayload, ValidationError> {
        let mut winning_numbers = [0u8; 6];
        if self.winning_numbers.len() != winning_numbers.len() {
            return Err(ValidationError::GroupSize {
                group: "winning_numbers",
                expected: winning_numbers.len(),
                found: self.winning_numbers.len(),
            });
        }
        for (slot, value) in winning_numbers.iter_mut().zip(self.winning_numbers) {
            *slot = checked_ball(required(value, "winning_numbers")?, "winning_numbers")?;
        }
        let additional_number =
            checked_ball(required(self.additional_number, "additional_number")?, "additional_number")?;

        let mut seen = [false; MAX_BALL as usize + 1];
        for n in winning_numbers.iter().chain(std::iter::once(&additional_number)) {
            let Some(flag) = seen.get_mut(usize::from(*n)) else {
                return Err(ValidationError::NumberOutOfRange {
                    field: "winning_numbers",
                    value: *n,
                });
            };
            if *flag {
                return Err(ValidationError::DuplicateNumber(*n));
            }
            *flag = true;
        }

        if self.prize_rows.is_empty() {
            return Err(ValidationError::EmptyPrizeTable);
        }
        let prize_groups = self
            .prize_rows
            .into_iter()
            .map(|row| {
                Ok(PrizeGroup {
                    group: row.group,
                    prize_amount: required(row.prize_amount, "prize_amount")?,
                    winner_count: required(row.winner_count, "winner_count")?,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(DrawPayload::Lotto(LottoResult {
            winning_numbers,
            additional_number,
            prize_groups,
            jackpot: self.jackpot,
        }))
    }
}

fn checked_ball(value: u8, field: &'static str) -> Result<u8, ValidationError> {
    if (1..=MAX_BALL).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::NumberOutOfRange { field, value })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::GameType;
    use crate::scrape::extract::{RawDraw, extract as extract_game};

    /// Prize table row: `(group, amount cell, winners cell)`.
    pub(crate) type Row<'a> = (&'a str, &'a str, &'a str);

    /// A rendered Lotto page.
    pub(crate) fn page(
        draw_no: u32,
        date: &str,
        numbers: [u8; 7],
        jackpot: &str,
        rows: &[Row<'_>],
    ) -> String {
        let [a, b, c, d, e, f, additional] = numbers;
        let body: String = rows
            .iter()
            .map(|(g, amount, winners)| {
                format!("<tr><td>{g}</td><td>{amount}</td><td>{winners}</td></tr>")
            })
            .collect();
        format!(
            r#"<html><body><div class="toto-result">
              <table><thead><tr><th class="drawDate">{date}</th>
                <th class="drawNumber">Draw No. {draw_no}</th></tr></thead></table>
              <table><tbody><tr>
                <td class="win1">{a}</td><td class="win2">{b}</td><td class="win3">{c}</td>
                <td class="win4">{d}</td><td class="win5">{e}</td><td class="win6">{f}</td>
              </tr></tbody></table>
              <table><tbody><tr><td class="additional">{additional}</td></tr></tbody></table>
              <table><tbody><tr><td class="jackpotPrize">{jackpot}</td></tr></tbody></table>
              <table class="tableWinningShares">
                <thead><tr><th>Prize Group</th><th>Share Amount</th><th>No. of Winning Shares</th></tr></thead>
                <tbody>{body}</tbody>
              </table>
            </div></body></html>"#
        )
    }

    /// Standard prize table with the given Group 1 cells.
    pub(crate) fn rows_with_top(amount: &'static str, winners: &'static str) -> Vec<Row<'static>> {
        vec![
            ("Group 1", amount, winners),
            ("Group 2", "$98,231", "2"),
            ("Group 3", "$1,712", "115"),
            ("Group 4", "$449", "251"),
            ("Group 5", "$50", "5,120"),
            ("Group 6", "$25", "7,001"),
            ("Group 7", "$10", "86,223"),
        ]
    }

    fn validate(html: &str) -> Result<crate::domain::DrawRecord, ValidationError> {
        let Some(raw) = extract_game(GameType::Lotto, html) else {
            panic!("container present");
        };
        raw.validate()
    }

    #[test]
    fn keeps_additional_number_apart_from_winning_numbers() {
        let html = page(
            4100,
            "Thu, 15 Oct 2026",
            [5, 12, 19, 27, 33, 48, 7],
            "$1,000,000",
            &rows_with_top("$1,250,312", "1"),
        );
        let Ok(record) = validate(&html) else {
            panic!("should validate");
        };
        let Some(lotto) = record.as_lotto() else {
            panic!("lotto payload");
        };
        assert_eq!(lotto.winning_numbers, [5, 12, 19, 27, 33, 48]);
        assert_eq!(lotto.additional_number, 7);
        assert_eq!(lotto.prize_groups.len(), 7);
        assert!(lotto.has_top_tier_winner());
    }

    #[test]
    fn zero_top_tier_amount_takes_displayed_jackpot() {
        let html = page(
            4101,
            "Mon, 19 Oct 2026",
            [1, 2, 3, 4, 5, 6, 7],
            "$3,200,000",
            &rows_with_top("$0", "0"),
        );
        let Ok(record) = validate(&html) else {
            panic!("should validate");
        };
        let Some(top) = record.as_lotto().and_then(LottoResult::top_tier) else {
            panic!("top tier present");
        };
        assert_eq!(top.group, "Group 1");
        assert_eq!(top.prize_amount, 3_200_000);
        assert_eq!(top.winner_count, 0);
    }

    #[test]
    fn blank_top_tier_cells_mean_no_winner_and_jackpot_amount() {
        let html = page(
            4102,
            "Thu, 22 Oct 2026",
            [1, 2, 3, 4, 5, 6, 7],
            "$4,500,000",
            &rows_with_top("-", "-"),
        );
        let Ok(record) = validate(&html) else {
            panic!("should validate");
        };
        let Some(lotto) = record.as_lotto() else {
            panic!("lotto payload");
        };
        assert!(!lotto.has_top_tier_winner());
        assert_eq!(lotto.top_tier().map(|g| g.prize_amount), Some(4_500_000));
    }

    #[test]
    fn nonzero_top_tier_amount_is_not_replaced() {
        let html = page(
            4103,
            "Thu, 22 Oct 2026",
            [1, 2, 3, 4, 5, 6, 7],
            "$4,500,000",
            &rows_with_top("$2,000,000", "2"),
        );
        let Ok(record) = validate(&html) else {
            panic!("should validate");
        };
        assert_eq!(
            record
                .as_lotto()
                .and_then(LottoResult::top_tier)
                .map(|g| g.prize_amount),
            Some(2_000_000)
        );
    }

    #[test]
    fn unparseable_lower_tier_amount_rejects_the_draw() {
        let mut rows = rows_with_top("$1,000,000", "1");
        if let Some(row) = rows.get_mut(3) {
            row.1 = "n/a";
        }
        let html = page(4104, "Thu, 22 Oct 2026", [1, 2, 3, 4, 5, 6, 7], "", &rows);
        assert_eq!(validate(&html), Err(ValidationError::MissingField("prize_amount")));
    }

    #[test]
    fn duplicate_or_out_of_range_numbers_are_rejected() {
        let rows = rows_with_top("$1,000,000", "1");
        let dup = page(4105, "Thu, 22 Oct 2026", [1, 2, 3, 4, 5, 6, 6], "", &rows);
        assert_eq!(validate(&dup), Err(ValidationError::DuplicateNumber(6)));

        let high = page(4106, "Thu, 22 Oct 2026", [1, 2, 3, 4, 5, 50, 7], "", &rows);
        assert!(matches!(
            validate(&high),
            Err(ValidationError::NumberOutOfRange { value: 50, .. })
        ));
    }

    #[test]
    fn empty_prize_table_is_rejected() {
        let html = page(4107, "Thu, 22 Oct 2026", [1, 2, 3, 4, 5, 6, 7], "", &[]);
        assert_eq!(validate(&html), Err(ValidationError::EmptyPrizeTable));
    }

    #[test]
    fn raw_draw_reports_game() {
        let html = page(4108, "Thu, 22 Oct 2026", [1, 2, 3, 4, 5, 6, 7], "", &[]);
        let Some(raw) = extract_game(GameType::Lotto, &html) else {
            panic!("container present");
        };
        assert!(matches!(raw, RawDraw::Lotto(_)));
        assert_eq!(raw.draw_number(), Some(4108));
    }
}
