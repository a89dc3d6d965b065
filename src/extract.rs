//! Article text extraction.
//!
//! Fetches an article page and pulls readable text out of it. Extraction
//! is deliberately generic: paragraphs inside `<article>` or `<main>`
//! when present, any paragraph otherwise. Pages that yield no text are
//! reported as errors so the download stage leaves them eligible for a
//! later retry.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::error::Error;
use tracing::{debug, instrument};

static BODY_PARAGRAPHS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article p, main p").unwrap());
static ANY_PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Download a page and extract its article text.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn extract_article_text(
    http: &reqwest::Client,
    url: &str,
) -> Result<String, Box<dyn Error>> {
    let body = http
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let text = extract_from_html(&body);
    if text.is_empty() {
        return Err(format!("no article text extracted from {url}").into());
    }
    debug!(bytes = text.len(), "Extracted article text");
    Ok(text)
}

/// Pull paragraph text out of an HTML document.
///
/// Prefers paragraphs scoped to `<article>`/`<main>`; falls back to every
/// paragraph when a page has no such landmark. Paragraph-internal
/// whitespace is collapsed and paragraphs are joined with blank lines.
pub fn extract_from_html(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut paragraphs = collect_paragraphs(&document, &BODY_PARAGRAPHS);
    if paragraphs.is_empty() {
        paragraphs = collect_paragraphs(&document, &ANY_PARAGRAPH);
    }
    paragraphs.join("\n\n")
}

fn collect_paragraphs(document: &Html, selector: &Selector) -> Vec<String> {
    document
        .select(selector)
        .map(|el| {
            let raw = el.text().collect::<Vec<_>>().join(" ");
            WHITESPACE.replace_all(raw.trim(), " ").into_owned()
        })
        .filter(|p| !p.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_article_scoped_paragraphs() {
        let html = r#"
            <html><body>
                <nav><p>Menu junk</p></nav>
                <article>
                    <p>First paragraph.</p>
                    <p>Second paragraph.</p>
                </article>
                <footer><p>Footer junk</p></footer>
            </body></html>
        "#;
        let text = extract_from_html(html);
        assert_eq!(text, "First paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn test_falls_back_to_all_paragraphs() {
        let html = "<html><body><div><p>Only paragraph.</p></div></body></html>";
        assert_eq!(extract_from_html(html), "Only paragraph.");
    }

    #[test]
    fn test_collapses_internal_whitespace() {
        let html = "<article><p>Spread\n   across\t lines.</p></article>";
        assert_eq!(extract_from_html(html), "Spread across lines.");
    }

    #[test]
    fn test_empty_page_yields_empty_string() {
        assert_eq!(extract_from_html("<html><body></body></html>"), "");
    }

    #[test]
    fn test_nested_markup_inside_paragraphs() {
        let html = "<main><p>With <em>emphasis</em> and a <a href=\"#\">link</a>.</p></main>";
        assert_eq!(extract_from_html(html), "With emphasis and a link .");
    }
}
