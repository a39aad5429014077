//! Markup heuristics that pull product fields out of a page.
//!
//! Every field is looked up independently and falls back to
//! [`NOT_AVAILABLE`] when the page does not carry it.

use std::sync::LazyLock;

use fanout_core::models::{NOT_AVAILABLE, ProductRecord};
use fanout_core::traits::Extractor;
use regex::Regex;
use scraper::{Html, Selector};

/// A price with optional currency marker, e.g. `$19.99`, `USD 5,00`, `12.50`.
static PRICE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\$|USD)?\s?([0-9]+[.,][0-9]{2})").expect("Invalid price regex")
});

/// A rating such as `4.5 out of 5`; group 1 is the score.
static RATING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-5]\.?[0-9]?)\s?out of\s?5").expect("Invalid rating regex")
});

/// Extracts name, price, rating, availability, image and description from HTML.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlProductExtractor;

impl HtmlProductExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for HtmlProductExtractor {
    fn extract(&self, html: &str) -> ProductRecord {
        let document = Html::parse_document(html);
        let text = page_text(&document);

        ProductRecord {
            name: extract_name(&document).unwrap_or_else(not_available),
            price: extract_price(&text).unwrap_or_else(not_available),
            rating: extract_rating(&text).unwrap_or_else(not_available),
            availability: extract_availability(&text).unwrap_or_else(not_available),
            image_url: first_attr(&document, "img[src]", "src").unwrap_or_else(not_available),
            description: first_attr(&document, r#"meta[name="description"][content]"#, "content")
                .unwrap_or_else(not_available),
        }
    }
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// All text nodes of the document, concatenated in document order.
fn page_text(document: &Html) -> String {
    document.root_element().text().collect()
}

fn extract_name(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|title| title.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_price(text: &str) -> Option<String> {
    PRICE_REGEX
        .find(text)
        .map(|m| m.as_str().trim().to_string())
}

fn extract_rating(text: &str) -> Option<String> {
    RATING_REGEX
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn extract_availability(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    if lower.contains("in stock") {
        Some("In Stock".to_string())
    } else if lower.contains("out of stock") {
        Some("Out of Stock".to_string())
    } else {
        None
    }
}

fn first_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}
