//! Tax figure lookup
//!
//! The figure is a label ("Налоги") and an amount with a unit that usually
//! sit in sibling elements, so the label's text node is walked upwards until
//! an ancestor's text also contains an amount.

use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

use super::document::{ParsedDocument, element_text};
use crate::error::{LookupError, LookupResult};
use crate::types::TaxFigure;

/// Ancestors inspected above the text node holding the keyword
const MAX_ANCESTORS: usize = 3;

static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[ \u{a0}]\d{3})*(?:[.,]\d+)?)\s*(млн\.?\s*руб|тыс\.?\s*руб)")
        .expect("BUG: hardcoded regex AMOUNT is invalid")
});

pub(crate) struct TaxLocator {
    keyword: Regex,
    containers: Vec<Selector>,
}

impl TaxLocator {
    pub(crate) fn new(keyword: &str, containers: &[String]) -> LookupResult<Self> {
        if keyword.trim().is_empty() {
            return Err(LookupError::Config("taxes_keyword must not be empty".to_string()));
        }
        let keyword = Regex::new(&format!("(?i){}", regex::escape(keyword.trim())))
            .map_err(|e| LookupError::Config(format!("invalid taxes keyword: {e}")))?;
        let containers = containers
            .iter()
            .map(|selector| {
                Selector::parse(selector).map_err(|e| {
                    LookupError::Config(format!("invalid tax container '{selector}': {e}"))
                })
            })
            .collect::<LookupResult<Vec<_>>>()?;
        Ok(Self {
            keyword,
            containers,
        })
    }

    pub(crate) fn locate(&self, doc: &ParsedDocument) -> Option<TaxFigure> {
        self.from_keyword_nodes(doc)
            .or_else(|| self.from_containers(doc))
    }

    fn from_keyword_nodes(&self, doc: &ParsedDocument) -> Option<TaxFigure> {
        for node in doc.html().tree.root().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            if !self.keyword.is_match(text) {
                continue;
            }
            let ancestors = node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .take(MAX_ANCESTORS);
            for ancestor in ancestors {
                if let Some(figure) = self.figure_in(&element_text(&ancestor)) {
                    return Some(figure);
                }
            }
        }
        None
    }

    fn from_containers(&self, doc: &ParsedDocument) -> Option<TaxFigure> {
        self.containers.iter().find_map(|selector| {
            doc.html().select(selector).find_map(|el| {
                let text = element_text(&el);
                if self.keyword.is_match(&text) {
                    self.figure_in(&text)
                } else {
                    None
                }
            })
        })
    }

    /// Amount after the keyword, else anywhere in `text`
    fn figure_in(&self, text: &str) -> Option<TaxFigure> {
        let after_keyword = self
            .keyword
            .find(text)
            .and_then(|m| AMOUNT.captures(&text[m.end()..]));
        let caps = after_keyword.or_else(|| AMOUNT.captures(text))?;
        let value = caps.get(1)?.as_str().replace('\u{a0}', " ");
        let unit = if caps.get(2)?.as_str().to_lowercase().starts_with("млн") {
            "млн руб."
        } else {
            "тыс. руб."
        };
        Some(TaxFigure::new(value.trim(), unit))
    }
}
