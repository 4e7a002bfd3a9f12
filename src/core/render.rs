//! Turns an enrichment result into the price history fragment.
//!
//! Rendering is pure and deterministic: the same identifier and result always
//! produce the same markup.

use crate::domain::model::{
    EnrichmentResult, Identifier, PriceChangeSection, RenderedFragment, FRAGMENT_MARKER_ATTR,
};

const TITLE_PREFIX: &str = "Total price";
const MISSING_TITLE: &str = "No price info.";
const NO_UPDATES: &str = "No updates.";

const FRAGMENT_STYLE: &str =
    "margin-top: 10px; padding: 10px; background-color: #f9f9f9; border: 1px solid #ddd;";
const FULL_WIDTH_STYLE: &str = " width: 100%;";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub full_width: bool,
}

/// Returns `None` when the result carries no price change section.
pub fn render(
    identifier: &Identifier,
    result: &EnrichmentResult,
    options: RenderOptions,
) -> Option<RenderedFragment> {
    let section = result.price_change.as_ref()?;

    Some(RenderedFragment {
        identifier: identifier.clone(),
        full_width: options.full_width,
        entries: render_entries(section),
    })
}

fn render_entries(section: &PriceChangeSection) -> Vec<String> {
    if let Some(timeline) = &section.price_time_line {
        if let Some(items) = &timeline.items {
            let title = timeline
                .title
                .as_deref()
                .filter(|t| !t.is_empty())
                .unwrap_or(MISSING_TITLE);

            let mut entries = Vec::with_capacity(items.len() + 1);
            entries.push(summary_line(title));
            entries.extend(
                items
                    .iter()
                    .map(|item| format!("{}: {}", escape_html(&item.key), escape_html(&item.value))),
            );
            return entries;
        }
    }

    let subtitle = section
        .price_update
        .as_ref()
        .and_then(|update| update.subtitle.as_deref())
        .filter(|s| !s.is_empty())
        .unwrap_or(NO_UPDATES);
    vec![escape_html(subtitle)]
}

/// "Total price decrease $500" -> styled direction plus emphasized amounts.
pub fn summary_line(title: &str) -> String {
    let stripped = title.replacen(TITLE_PREFIX, "", 1);
    let stripped = stripped.trim();

    let (direction, rest) = match stripped.split_once(' ') {
        Some((direction, rest)) => (direction, Some(rest)),
        None => (stripped, None),
    };

    let styled = style_direction(direction);
    match rest {
        Some(rest) => format!("{} {}", styled, emphasize_amounts(rest)),
        None => styled,
    }
}

pub fn style_direction(token: &str) -> String {
    if token.eq_ignore_ascii_case("increase") {
        r#"<strong style="color: red;">Increase</strong>"#.to_string()
    } else if token.eq_ignore_ascii_case("decrease") {
        r#"<strong style="color: green;">Decrease</strong>"#.to_string()
    } else {
        escape_html(token)
    }
}

/// Wraps every `$`-prefixed word in `<strong>`; spacing is preserved.
pub fn emphasize_amounts(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            if word.starts_with('$') {
                format!("<strong>{}</strong>", escape_html(word))
            } else {
                escape_html(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl RenderedFragment {
    pub fn marker(&self) -> String {
        self.identifier.fragment_tag()
    }

    pub fn style(&self) -> String {
        if self.full_width {
            format!("{}{}", FRAGMENT_STYLE, FULL_WIDTH_STYLE)
        } else {
            FRAGMENT_STYLE.to_string()
        }
    }

    pub fn to_html(&self) -> String {
        let items: String = self
            .entries
            .iter()
            .map(|entry| format!("<li>{}</li>", entry))
            .collect();

        format!(
            r#"<div {}="{}" style="{}"><ul>{}</ul></div>"#,
            FRAGMENT_MARKER_ATTR,
            escape_html(&self.marker()),
            self.style(),
            items
        )
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{PriceTimeLine, PriceUpdate, TimelineItem};

    fn timeline(title: &str, items: &[(&str, &str)]) -> EnrichmentResult {
        EnrichmentResult::with_section(PriceChangeSection {
            price_time_line: Some(PriceTimeLine {
                title: Some(title.to_string()),
                items: Some(
                    items
                        .iter()
                        .map(|(k, v)| TimelineItem {
                            key: k.to_string(),
                            value: v.to_string(),
                        })
                        .collect(),
                ),
            }),
            price_update: None,
        })
    }

    fn id() -> Identifier {
        Identifier::new("SSE-AD-12345")
    }

    #[test]
    fn test_no_section_renders_nothing() {
        assert!(render(&id(), &EnrichmentResult::none(), RenderOptions::default()).is_none());
    }

    #[test]
    fn test_decrease_scenario() {
        let result = timeline("Total price decrease $500", &[("10 Jan", "$20,000")]);
        let fragment = render(&id(), &result, RenderOptions::default()).unwrap();

        assert_eq!(fragment.entries.len(), 2);
        assert_eq!(
            fragment.entries[0],
            r#"<strong style="color: green;">Decrease</strong> <strong>$500</strong>"#
        );
        assert_eq!(fragment.entries[1], "10 Jan: $20,000");

        let html = fragment.to_html();
        assert!(html.starts_with(r#"<div data-sse-id="SSE-AD-12345-price-history""#));
        assert!(html.contains("<li>10 Jan: $20,000</li>"));
    }

    #[test]
    fn test_entry_count_is_items_plus_summary() {
        for n in [0usize, 1, 4] {
            let items: Vec<(String, String)> = (0..n)
                .map(|i| (format!("{} Feb", i + 1), format!("${},000", 20 + i)))
                .collect();
            let borrowed: Vec<(&str, &str)> =
                items.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
            let fragment =
                render(&id(), &timeline("Total price increase $1", &borrowed), RenderOptions::default())
                    .unwrap();
            assert_eq!(fragment.entries.len(), n + 1);
        }
    }

    #[test]
    fn test_timeline_entries_keep_order() {
        let result = timeline(
            "Total price decrease $900",
            &[("1 Jan", "$30,000"), ("5 Jan", "$29,500"), ("9 Jan", "$29,100")],
        );
        let fragment = render(&id(), &result, RenderOptions::default()).unwrap();
        assert_eq!(
            &fragment.entries[1..],
            &["1 Jan: $30,000", "5 Jan: $29,500", "9 Jan: $29,100"]
        );
    }

    #[test]
    fn test_direction_mapping_is_case_insensitive() {
        for token in ["increase", "INCREASE", "Increase", "iNcReAsE"] {
            assert_eq!(
                style_direction(token),
                r#"<strong style="color: red;">Increase</strong>"#
            );
        }
        for token in ["decrease", "DECREASE", "Decrease"] {
            assert_eq!(
                style_direction(token),
                r#"<strong style="color: green;">Decrease</strong>"#
            );
        }
        assert_eq!(style_direction("unchanged"), "unchanged");
        assert_eq!(style_direction(""), "");
    }

    #[test]
    fn test_only_dollar_tokens_are_emphasized() {
        assert_eq!(
            emphasize_amounts("of $1,250 since 3 weeks"),
            "of <strong>$1,250</strong> since 3 weeks"
        );
        assert_eq!(emphasize_amounts("500 dollars"), "500 dollars");
    }

    #[test]
    fn test_summary_without_prefix_or_remainder() {
        assert_eq!(
            summary_line("Increase"),
            r#"<strong style="color: red;">Increase</strong>"#
        );
        assert_eq!(summary_line("Price steady $0"), "Price steady <strong>$0</strong>");
    }

    #[test]
    fn test_missing_title_falls_back() {
        let mut result = timeline("", &[]);
        if let Some(section) = result.price_change.as_mut() {
            section.price_time_line.as_mut().unwrap().title = None;
        }
        let fragment = render(&id(), &result, RenderOptions::default()).unwrap();
        assert_eq!(fragment.entries, vec!["No price info.".to_string()]);
    }

    #[test]
    fn test_subtitle_and_no_updates_fallback() {
        let with_subtitle = EnrichmentResult::with_section(PriceChangeSection {
            price_time_line: None,
            price_update: Some(PriceUpdate {
                subtitle: Some("Price unchanged since listed".to_string()),
            }),
        });
        let fragment = render(&id(), &with_subtitle, RenderOptions::default()).unwrap();
        assert_eq!(fragment.entries, vec!["Price unchanged since listed".to_string()]);

        let empty = EnrichmentResult::with_section(PriceChangeSection::default());
        let fragment = render(&id(), &empty, RenderOptions::default()).unwrap();
        assert_eq!(fragment.entries, vec!["No updates.".to_string()]);
    }

    #[test]
    fn test_timeline_without_items_uses_subtitle() {
        let result = EnrichmentResult::with_section(PriceChangeSection {
            price_time_line: Some(PriceTimeLine {
                title: Some("Total price decrease $5".to_string()),
                items: None,
            }),
            price_update: None,
        });
        let fragment = render(&id(), &result, RenderOptions::default()).unwrap();
        assert_eq!(fragment.entries, vec!["No updates.".to_string()]);
    }

    #[test]
    fn test_external_text_is_escaped() {
        let result = timeline("Total price decrease $5", &[("<b>1 Jan</b>", "$1 & up")]);
        let fragment = render(&id(), &result, RenderOptions::default()).unwrap();
        assert_eq!(fragment.entries[1], "&lt;b&gt;1 Jan&lt;/b&gt;: $1 &amp; up");
    }

    #[test]
    fn test_full_width_style() {
        let result = timeline("Total price decrease $5", &[]);
        let fragment = render(&id(), &result, RenderOptions { full_width: true }).unwrap();
        assert!(fragment.to_html().contains("width: 100%;"));
    }
}
