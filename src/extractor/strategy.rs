//! Compiled candidate strategies
//!
//! A `Strategy` is the compiled form of a profile [`Candidate`]. Probing
//! a strategy walks its matches in document order and hands each one to the
//! caller's plausibility check.

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::document::{ParsedDocument, element_text};
use crate::config::Candidate;
use crate::error::{LookupError, LookupResult};

/// Result of one probe: either a plausible value or nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Found(String),
    NotFound,
}

impl Probe {
    #[must_use]
    pub fn into_option(self) -> Option<String> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }
}

#[derive(Debug)]
pub(crate) enum Strategy {
    Css(Selector),
    ClassContains(Vec<String>),
    Pattern(Regex),
}

impl Strategy {
    pub(crate) fn compile(candidate: &Candidate) -> LookupResult<Self> {
        match candidate {
            Candidate::Css { selector } => Selector::parse(selector)
                .map(Self::Css)
                .map_err(|e| LookupError::Config(format!("invalid selector '{selector}': {e}"))),
            Candidate::ClassContains { words } => {
                if words.is_empty() {
                    return Err(LookupError::Config(
                        "class_contains candidate needs at least one word".to_string(),
                    ));
                }
                Ok(Self::ClassContains(
                    words.iter().map(|w| w.to_lowercase()).collect(),
                ))
            }
            Candidate::Pattern { regex } => Regex::new(regex)
                .map(Self::Pattern)
                .map_err(|e| LookupError::Config(format!("invalid pattern '{regex}': {e}"))),
        }
    }

    pub(crate) fn compile_all(candidates: &[Candidate]) -> LookupResult<Vec<Self>> {
        candidates.iter().map(Self::compile).collect()
    }

    /// First match accepted by `plausible`
    pub(crate) fn probe(&self, doc: &ParsedDocument, plausible: &dyn Fn(&str) -> bool) -> Probe {
        let accept = |raw: String| {
            let value = raw.trim().to_string();
            plausible(&value).then_some(value)
        };

        let found = match self {
            Self::Css(selector) => doc
                .html()
                .select(selector)
                .find_map(|el| accept(element_text(&el))),
            Self::ClassContains(words) => doc
                .html()
                .tree
                .root()
                .descendants()
                .filter_map(ElementRef::wrap)
                .filter(|el| {
                    el.value().attr("class").is_some_and(|class| {
                        let class = class.to_lowercase();
                        words.iter().any(|w| class.contains(w.as_str()))
                    })
                })
                .find_map(|el| accept(element_text(&el))),
            Self::Pattern(regex) => regex.captures_iter(doc.text()).find_map(|caps| {
                let m = caps.get(1).or_else(|| caps.get(0))?;
                accept(m.as_str().to_string())
            }),
        };

        match found {
            Some(value) => Probe::Found(value),
            None => Probe::NotFound,
        }
    }
}

/// Run strategies in order; first plausible hit wins
pub(crate) fn first_plausible(
    strategies: &[Strategy],
    doc: &ParsedDocument,
    plausible: &dyn Fn(&str) -> bool,
) -> Probe {
    for strategy in strategies {
        if let Probe::Found(value) = strategy.probe(doc, plausible) {
            return Probe::Found(value);
        }
    }
    Probe::NotFound
}
