//! Historical draw picker shared by all result pages.

use chrono::NaiveDate;
use scraper::Html;

use super::{element_text, selector};
use crate::scrape::dates::normalize_draw_date;

/// The `<select>` listing past draws.
pub const PICKER_SELECTOR: &str = "select.selectDrawList";

/// One entry of the draw picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawOption {
    /// Value to select.
    pub value: String,
    /// Label as rendered, usually the draw date.
    pub label: String,
    /// Draw date parsed from the label.
    pub draw_date: Option<NaiveDate>,
}

/// Lists the picker entries, newest first as rendered.
///
/// Options without a value are placeholders and are skipped.
#[must_use]
pub fn draw_options(html: &str) -> Vec<DrawOption> {
    let document = Html::parse_document(html);
    let Some(sel) = selector(&format!("{PICKER_SELECTOR} option")) else {
        return Vec::new();
    };
    document
        .select(&sel)
        .filter_map(|option| {
            let value = option.value().attr("value")?.trim();
            if value.is_empty() {
                return None;
            }
            let label = element_text(option);
            Some(DrawOption {
                value: value.to_string(),
                draw_date: normalize_draw_date(&label).ok(),
                label,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn lists_options_in_page_order() {
        let html = r#"<html><body>
            <select class="form-control selectDrawList">
              <option value="">Select a draw</option>
              <option value="sppl=RHJhd051bWJlcj01MTIz">Sat, 17 Oct 2026</option>
              <option value="sppl=RHJhd051bWJlcj01MTIy">Wed, 14 Oct 2026</option>
              <option value="sppl=bogus">Special Draw</option>
            </select></body></html>"#;
        let options = draw_options(html);
        assert_eq!(options.len(), 3);
        let Some(first) = options.first() else {
            panic!("expected options");
        };
        assert_eq!(first.value, "sppl=RHJhd051bWJlcj01MTIz");
        assert_eq!(first.draw_date.map(|d| d.to_string()), Some("2026-10-17".to_string()));
        assert_eq!(options.get(2).and_then(|o| o.draw_date), None);
    }

    #[test]
    fn page_without_picker_has_no_options() {
        assert!(draw_options("<html><body></body></html>").is_empty());
    }
}
