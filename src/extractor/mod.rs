//! Field extraction from registry and company-profile pages
//!
//! Every field has an ordered list of strategies compiled from the
//! profile's [`ExtractionRules`]. The first plausible value wins; a field
//! with no plausible value is simply absent. Missing data never fails an
//! extraction, only a document without any text does.

pub mod document;
pub mod strategy;
pub mod taxes;

pub use document::ParsedDocument;
pub use strategy::Probe;

use tracing::{debug, warn};

use crate::config::ExtractionRules;
use crate::error::{LookupError, LookupResult};
use crate::types::{Inn, TaxFigure};
use strategy::{Strategy, first_plausible};
use taxes::TaxLocator;

/// Length bounds and boilerplate filtering for one field
#[derive(Debug, Clone, Copy)]
struct FieldSpec {
    min_chars: usize,
    max_chars: usize,
    reject_boilerplate: bool,
}

const NAME: FieldSpec = FieldSpec {
    min_chars: 6,
    max_chars: 300,
    reject_boilerplate: true,
};
const ADDRESS: FieldSpec = FieldSpec {
    min_chars: 5,
    max_chars: 500,
    reject_boilerplate: false,
};
const STATUS: FieldSpec = FieldSpec {
    min_chars: 2,
    max_chars: 120,
    reject_boilerplate: false,
};
const ACTIVITY: FieldSpec = FieldSpec {
    min_chars: 3,
    max_chars: 500,
    reject_boilerplate: false,
};
const DATE: FieldSpec = FieldSpec {
    min_chars: 6,
    max_chars: 40,
    reject_boilerplate: false,
};
const CAPITAL: FieldSpec = FieldSpec {
    min_chars: 1,
    max_chars: 80,
    reject_boilerplate: false,
};
const IDENTIFIER: FieldSpec = FieldSpec {
    min_chars: 9,
    max_chars: 15,
    reject_boilerplate: false,
};

/// Everything the extractor could read from one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFields {
    pub name: String,
    /// True only when `name` came from the page itself
    pub name_found: bool,
    pub ogrn: Option<String>,
    pub kpp: Option<String>,
    /// INN printed on the page, if any; may differ from the input
    pub observed_inn: Option<String>,
    pub address: Option<String>,
    pub status: Option<String>,
    pub registration_date: Option<String>,
    pub authorized_capital: Option<String>,
    pub main_activity: Option<String>,
    pub taxes: Option<TaxFigure>,
}

impl ExtractedFields {
    /// Number of fields read from the page (the observed INN is not counted)
    #[must_use]
    pub fn page_hits(&self) -> usize {
        let optional = [
            self.ogrn.is_some(),
            self.kpp.is_some(),
            self.address.is_some(),
            self.status.is_some(),
            self.registration_date.is_some(),
            self.authorized_capital.is_some(),
            self.main_activity.is_some(),
            self.taxes.is_some(),
        ];
        usize::from(self.name_found) + optional.iter().filter(|hit| **hit).count()
    }
}

pub struct FieldExtractor {
    name: Vec<Strategy>,
    address: Vec<Strategy>,
    status: Vec<Strategy>,
    main_activity: Vec<Strategy>,
    registration_date: Vec<Strategy>,
    authorized_capital: Vec<Strategy>,
    ogrn: Vec<Strategy>,
    kpp: Vec<Strategy>,
    inn: Vec<Strategy>,
    taxes: TaxLocator,
    boilerplate: Vec<String>,
    entity_label: String,
}

impl FieldExtractor {
    /// Compile every candidate once
    ///
    /// # Errors
    ///
    /// [`LookupError::Config`] for an invalid selector or regex.
    pub fn new(rules: &ExtractionRules) -> LookupResult<Self> {
        Ok(Self {
            name: Strategy::compile_all(&rules.name)?,
            address: Strategy::compile_all(&rules.address)?,
            status: Strategy::compile_all(&rules.status)?,
            main_activity: Strategy::compile_all(&rules.main_activity)?,
            registration_date: Strategy::compile_all(&rules.registration_date)?,
            authorized_capital: Strategy::compile_all(&rules.authorized_capital)?,
            ogrn: Strategy::compile_all(&rules.ogrn)?,
            kpp: Strategy::compile_all(&rules.kpp)?,
            inn: Strategy::compile_all(&rules.inn)?,
            taxes: TaxLocator::new(&rules.taxes_keyword, &rules.tax_containers)?,
            boilerplate: rules.boilerplate.iter().map(|w| w.to_lowercase()).collect(),
            entity_label: rules.entity_label.clone(),
        })
    }

    /// Read all fields from `doc`
    ///
    /// Name priority: page, then `declared`, then `"<entity_label> <inn>"`.
    ///
    /// # Errors
    ///
    /// [`LookupError::ExtractionFailed`] if the document has no text at all.
    pub fn extract(
        &self,
        doc: &ParsedDocument,
        inn: &Inn,
        declared: Option<&str>,
    ) -> LookupResult<ExtractedFields> {
        if doc.is_blank() {
            return Err(LookupError::ExtractionFailed(format!(
                "document for INN {inn} has no text"
            )));
        }

        let page_name = self.field(&self.name, doc, NAME, "name");
        let name_found = page_name.is_some();
        let name = page_name
            .or_else(|| {
                declared
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| self.default_name(inn));

        let observed_inn = self.field(&self.inn, doc, IDENTIFIER, "inn");
        if let Some(observed) = &observed_inn
            && observed != inn.as_str()
        {
            warn!(
                "Page shows INN {} while {} was requested; keeping the requested one",
                observed, inn
            );
        }

        Ok(ExtractedFields {
            name,
            name_found,
            ogrn: self.field(&self.ogrn, doc, IDENTIFIER, "ogrn"),
            kpp: self.field(&self.kpp, doc, IDENTIFIER, "kpp"),
            observed_inn,
            address: self.field(&self.address, doc, ADDRESS, "address"),
            status: self.field(&self.status, doc, STATUS, "status"),
            registration_date: self.field(&self.registration_date, doc, DATE, "registration_date"),
            authorized_capital: self.field(
                &self.authorized_capital,
                doc,
                CAPITAL,
                "authorized_capital",
            ),
            main_activity: self.field(&self.main_activity, doc, ACTIVITY, "main_activity"),
            taxes: self.taxes(doc),
        })
    }

    /// Tax figure only
    #[must_use]
    pub fn taxes(&self, doc: &ParsedDocument) -> Option<TaxFigure> {
        let figure = self.taxes.locate(doc);
        if let Some(figure) = &figure {
            debug!("taxes: {}", figure.full);
        }
        figure
    }

    /// Synthesized name used when neither the page nor the caller has one
    #[must_use]
    pub fn default_name(&self, inn: &Inn) -> String {
        format!("{} {}", self.entity_label, inn)
    }

    fn field(
        &self,
        strategies: &[Strategy],
        doc: &ParsedDocument,
        spec: FieldSpec,
        label: &str,
    ) -> Option<String> {
        let plausible = |value: &str| self.is_plausible(value, spec);
        let value = first_plausible(strategies, doc, &plausible).into_option();
        if let Some(value) = &value {
            debug!("{}: {}", label, value);
        }
        value
    }

    fn is_plausible(&self, value: &str, spec: FieldSpec) -> bool {
        let chars = value.chars().count();
        if chars < spec.min_chars || chars > spec.max_chars {
            return false;
        }
        if spec.reject_boilerplate {
            let lower = value.to_lowercase();
            if self.boilerplate.iter().any(|token| lower.contains(token.as_str())) {
                return false;
            }
        }
        true
    }
}
