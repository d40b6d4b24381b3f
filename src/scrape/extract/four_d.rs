//! 4D results page.
//!
//! The page lists several recent draws; the first `div.tables-wrap` is the
//! latest (or the one picked in the draw list). Starter and consolation
//! numbers are read in DOM order.

use scraper::Html;

use super::{
    RawHeader, ValidationError, all_texts, find_first, first_text, fixed_group,
    parse_digits, parse_draw_number_label, required,
};
use crate::domain::DrawPayload;
use crate::domain::draw::{FOUR_D_CONSOLATION_COUNT, FOUR_D_STARTER_COUNT, FourDResult};

/// Results container.
pub const CONTAINER: &str = "div.tables-wrap";
/// Draw number label.
pub const DRAW_NUMBER: &str = "th.drawNumber";
const DRAW_DATE: &str = "th.drawDate";
const FIRST_PRIZE: &str = "td.tdFirstPrize";
const SECOND_PRIZE: &str = "td.tdSecondPrize";
const THIRD_PRIZE: &str = "td.tdThirdPrize";
const STARTER: &str = "tbody.tbodyStarterPrizes td";
const CONSOLATION: &str = "tbody.tbodyConsolationPrizes td";

/// Raw 4D draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFourD {
    /// Draw number and date.
    pub header: RawHeader,
    /// First prize.
    pub first_prize: Option<String>,
    /// Second prize.
    pub second_prize: Option<String>,
    /// Third prize.
    pub third_prize: Option<String>,
    /// Starter numbers in page order.
    pub starter: Vec<Option<String>>,
    /// Consolation numbers in page order.
    pub consolation: Vec<Option<String>>,
}

pub(super) fn extract(document: &Html) -> Option<RawFourD> {
    let container = find_first(document, CONTAINER)?;
    let four = |text: String| parse_digits(&text, 4);

    Some(RawFourD {
        header: RawHeader {
            draw_number: first_text(container, DRAW_NUMBER)
                .as_deref()
                .and_then(parse_draw_number_label),
            draw_date_text: first_text(container, DRAW_DATE),
        },
        first_prize: first_text(container, FIRST_PRIZE).and_then(four),
        second_prize: first_text(container, SECOND_PRIZE).and_then(four),
        third_prize: first_text(container, THIRD_PRIZE).and_then(four),
        starter: all_texts(container, STARTER).into_iter().map(four).collect(),
        consolation: all_texts(container, CONSOLATION)
            .into_iter()
            .map(four)
            .collect(),
    })
}

impl RawFourD {
    pub(super) fn into_payload(self) -> Result<DrawPayload, ValidationError> {
        Ok(DrawPayload::FourD(FourDResult {
            first_prize: required(self.first_prize, "first_prize")?,
            second_prize: required(self.second_prize, "second_prize")?,
            third_prize: required(self.third_prize, "third_prize")?,
            starter: fixed_group(self.starter, "starter", FOUR_D_STARTER_COUNT)?,
            consolation: fixed_group(self.consolation, "consolation", FOUR_D_CONSOLATION_COUNT)?,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod tests {
    use super::*;
    use crate::scrape::extract::{RawDraw, extract as extract_game};
    use crate::domain::GameType;

    fn cells(numbers: &[&str]) -> String {
        numbers
            .chunks(2)
            .map(|row| {
                let tds: String = row.iter().map(|n| format!("<td>{n}</td>")).collect();
                format!("<tr>{tds}</tr>")
            })
            .collect()
    }

    /// A rendered 4D page with the given draw number, date and first prize.
    pub(crate) fn page(draw_no: u32, date: &str, first: &str) -> String {
        let starter = cells(&[
            "0012", "1290", "2301", "3412", "4523", "5634", "6745", "7856", "8967", "9078",
        ]);
        let consolation = cells(&[
            "0101", "1212", "2323", "3434", "4545", "5656", "6767", "7878", "8989", "9090",
        ]);
        format!(
            r#"<html><body>
            <div class="tables-wrap">
              <table class="table orange-header"><thead><tr>
                <th class="drawDate">{date}</th><th class="drawNumber">Draw No. {draw_no}</th>
              </tr></thead></table>
              <table><tbody>
                <tr><td class="tdFirstPrize">{first}</td></tr>
                <tr><td class="tdSecondPrize">5521</td></tr>
                <tr><td class="tdThirdPrize">0009</td></tr>
              </tbody></table>
              <table><tbody class="tbodyStarterPrizes">{starter}</tbody></table>
              <table><tbody class="tbodyConsolationPrizes">{consolation}</tbody></table>
            </div>
            <div class="tables-wrap">
              <table><thead><tr><th class="drawDate">Wed, 14 Oct 2026</th>
              <th class="drawNumber">Draw No. 1</th></tr></thead></table>
            </div>
            </body></html>"#
        )
    }

    #[test]
    fn reads_latest_draw_in_dom_order() {
        let html = page(5123, "Sat, 17 Oct 2026", "0427");
        let Some(RawDraw::FourD(raw)) = extract_game(GameType::FourD, &html) else {
            panic!("expected a 4D draw");
        };
        assert_eq!(raw.header.draw_number, Some(5123));
        assert_eq!(raw.first_prize.as_deref(), Some("0427"));
        assert_eq!(raw.starter.len(), 10);
        assert_eq!(raw.starter.first(), Some(&Some("0012".to_string())));
        assert_eq!(raw.consolation.last(), Some(&Some("9090".to_string())));

        let Ok(record) = RawDraw::FourD(raw).validate() else {
            panic!("page should validate");
        };
        assert_eq!(record.draw_number, 5123);
        assert_eq!(record.draw_date.to_string(), "2026-10-17");
    }

    #[test]
    fn malformed_prize_is_rejected() {
        let html = page(5123, "Sat, 17 Oct 2026", "04x7");
        let Some(raw) = extract_game(GameType::FourD, &html) else {
            panic!("container present");
        };
        assert_eq!(
            raw.validate(),
            Err(ValidationError::MissingField("first_prize"))
        );
    }
}
