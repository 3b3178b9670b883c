//! Parsed view of a raw document shared by the classifier and extractor

use scraper::{ElementRef, Html};

use crate::types::RawDocument;
use crate::utils::normalize_whitespace;

const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// HTML tree plus its flattened, whitespace-normalized text
pub struct ParsedDocument {
    html: Html,
    text: String,
    lower: String,
}

impl ParsedDocument {
    #[must_use]
    pub fn parse(raw: &RawDocument) -> Self {
        Self::from_html(&raw.html)
    }

    #[must_use]
    pub fn from_html(source: &str) -> Self {
        let html = Html::parse_document(source);
        let text = flatten_text(&html);
        let lower = text.to_lowercase();
        Self { html, text, lower }
    }

    #[must_use]
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Visible text, single-spaced
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lower-cased [`text`](Self::text) for phrase matching
    #[must_use]
    pub fn lower_text(&self) -> &str {
        &self.lower
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

fn flatten_text(html: &Html) -> String {
    let mut pieces: Vec<&str> = Vec::new();
    for node in html.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            pieces.push(text);
        }
    }
    normalize_whitespace(&pieces.join(" "))
}

/// Normalized text content of one element
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_and_styles_are_not_text() {
        let doc = ParsedDocument::from_html(
            "<html><head><style>.a{}</style><script>var notFound = 'не найдено';</script></head>\
             <body><h1>ООО  «Ромашка»</h1><p>ИНН\n7707083893</p></body></html>",
        );
        assert_eq!(doc.text(), "ООО «Ромашка» ИНН 7707083893");
        assert!(!doc.lower_text().contains("не найдено"));
    }

    #[test]
    fn whitespace_only_document_is_blank() {
        assert!(ParsedDocument::from_html("<html><body>  \n </body></html>").is_blank());
        assert!(ParsedDocument::from_html("").is_blank());
    }
}
