//! DOM helpers over [`scraper`] for detail-page extraction.
//!
//! Pages are parsed with html5ever, so comments and the bodies of `<script>`
//! and `<style>` never become elements. Malformed markup is repaired by the
//! parser rather than rejected.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

static META: LazyLock<Selector> = LazyLock::new(|| css("meta"));

/// Text under these elements is never shown to a reader.
const HIDDEN_CONTAINERS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Compiles a selector literal. Only called with constants from this crate.
pub(crate) fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("valid CSS selector")
}

/// Visible text of `element`: hidden containers skipped, whitespace collapsed.
pub(crate) fn visible_text(element: ElementRef<'_>) -> String {
    let words: Vec<&str> = element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_CONTAINERS.contains(&el.name()))
            });
            (!hidden).then_some(&**text)
        })
        .flat_map(str::split_whitespace)
        .collect();
    words.join(" ")
}

/// First non-empty visible text among the matches of `selector`.
pub(crate) fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .map(visible_text)
        .find(|text| !text.is_empty())
}

/// Trimmed attribute value, `None` when absent or blank.
pub(crate) fn attr(element: ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// The `content` of the first `<meta>` whose `property` or `name` equals `key`.
pub(crate) fn meta_content(doc: &Html, key: &str) -> Option<String> {
    doc.select(&META)
        .find(|meta| {
            let el = meta.value();
            el.attr("property")
                .or_else(|| el.attr("name"))
                .is_some_and(|value| value.eq_ignore_ascii_case(key))
        })
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|content| !content.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_selector_is_token_exact() {
        let doc = Html::parse_document(
            r#"<span class="price-old">1</span><span class="price">2</span>"#,
        );
        let matches: Vec<String> = doc.select(&css(".price")).map(visible_text).collect();
        assert_eq!(matches, vec!["2".to_string()]);
    }

    #[test]
    fn attribute_substring_selector_matches_fragment() {
        let doc = Html::parse_document(r#"<div class="product-rating-box">4.5</div>"#);
        assert_eq!(first_text(&doc, &css("[class*=rating]")).as_deref(), Some("4.5"));
    }

    #[test]
    fn entities_are_decoded_and_whitespace_collapsed() {
        let doc = Html::parse_document("<h1 class=\"t\">Leather &amp;\n   Bag</h1>");
        assert_eq!(first_text(&doc, &css("h1.t")).as_deref(), Some("Leather & Bag"));
    }

    #[test]
    fn inline_script_and_style_text_is_skipped() {
        let doc = Html::parse_document(
            "<p class=\"d\">Hello <script>var x = 1;</script><style>p{}</style><!-- note --><b>world</b></p>",
        );
        assert_eq!(first_text(&doc, &css("p.d")).as_deref(), Some("Hello world"));
    }

    #[test]
    fn commented_markup_is_not_selectable() {
        let doc = Html::parse_document(
            r#"<!-- <h1 class="t">Old</h1> --><script>const tpl = '<h1 class="t">Tpl</h1>';</script><h1 class="t">Live</h1>"#,
        );
        let names: Vec<String> = doc.select(&css("h1.t")).map(visible_text).collect();
        assert_eq!(names, vec!["Live".to_string()]);
    }

    #[test]
    fn blank_attributes_read_as_missing() {
        let doc = Html::parse_document(r#"<img src="  " data-src=" https://x/1.jpg ">"#);
        let img = doc.select(&css("img")).next().unwrap();
        assert!(attr(img, "src").is_none());
        assert_eq!(attr(img, "data-src").as_deref(), Some("https://x/1.jpg"));
    }

    #[test]
    fn meta_content_by_property_or_name() {
        let doc = Html::parse_document(
            r#"<head><meta content="Bag" property="og:title"><meta name="description" content=" A  fine bag "></head>"#,
        );
        assert_eq!(meta_content(&doc, "og:title").as_deref(), Some("Bag"));
        assert_eq!(meta_content(&doc, "description").as_deref(), Some("A fine bag"));
        assert!(meta_content(&doc, "og:image").is_none());
    }
}
