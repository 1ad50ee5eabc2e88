//! Small helpers over `scraper` shared by both stages.

use scraper::{ElementRef, Html, Selector};

use crate::types::{EnquiryError, EnquiryResult};

/// Parse a response body into a document. A blank body is not a document.
pub(crate) fn parse_document(html: &str) -> EnquiryResult<Html> {
    if html.trim().is_empty() {
        return Err(EnquiryError::Parse("response body is empty".to_string()));
    }

    let document = Html::parse_document(html);
    if !document.errors.is_empty() {
        tracing::debug!("html parser recovered from {} errors", document.errors.len());
    }
    Ok(document)
}

pub(crate) fn compile_selector(source: &str) -> EnquiryResult<Selector> {
    Selector::parse(source)
        .map_err(|e| EnquiryError::Layout(format!("invalid selector `{source}`: {e}")))
}

/// Concatenated text of every descendant text node, untouched.
pub(crate) fn raw_text(el: &ElementRef<'_>) -> String {
    el.text().collect()
}

pub(crate) fn trimmed_text(el: &ElementRef<'_>) -> String {
    raw_text(el).trim().to_string()
}
