//! Registry membership classification
//!
//! Phrase matching over the lower-cased page text. Absent phrases are checked
//! before present ones because the negative form ("не входит в реестр")
//! contains the positive one.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TargetProfile;
use crate::extractor::ParsedDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryStatus {
    Present,
    Absent,
    Indeterminate,
}

impl RegistryStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Indeterminate => "indeterminate",
        }
    }
}

/// How an indeterminate page is turned into a yes/no answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndeterminatePolicy {
    /// Present iff the extractor found a real (non-synthesized) company name
    PresentIfNamed,
    /// Never present
    Absent,
}

/// Policy applied to every indeterminate classification
///
/// A named company page without a registry phrase is reported as present.
/// This can produce false positives on pages that merely show a company
/// card; see DESIGN.md.
pub const INDETERMINATE_POLICY: IndeterminatePolicy = IndeterminatePolicy::PresentIfNamed;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: RegistryStatus,
    /// Phrase that decided the status, if any
    pub matched_phrase: Option<String>,
}

/// Final registry answer recorded in the extracted record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryDecision {
    pub status: RegistryStatus,
    pub in_registry: bool,
    pub message: String,
}

pub struct RegistryClassifier {
    present: Vec<String>,
    absent: Vec<String>,
    present_message: String,
    absent_message: String,
    named_message: String,
    unnamed_message: String,
}

impl RegistryClassifier {
    #[must_use]
    pub fn new(profile: &TargetProfile) -> Self {
        let lower = |phrases: &[String]| phrases.iter().map(|p| p.to_lowercase()).collect();
        Self {
            present: lower(&profile.present_phrases),
            absent: lower(&profile.absent_phrases),
            present_message: profile.present_message.clone(),
            absent_message: profile.absent_message.clone(),
            named_message: profile.named_message.clone(),
            unnamed_message: profile.unnamed_message.clone(),
        }
    }

    #[must_use]
    pub fn classify(&self, doc: &ParsedDocument) -> Classification {
        let text = doc.lower_text();

        if let Some(phrase) = self.absent.iter().find(|p| text.contains(p.as_str())) {
            debug!("Absent phrase matched: '{}'", phrase);
            return Classification {
                status: RegistryStatus::Absent,
                matched_phrase: Some(phrase.clone()),
            };
        }
        if let Some(phrase) = self.present.iter().find(|p| text.contains(p.as_str())) {
            debug!("Present phrase matched: '{}'", phrase);
            return Classification {
                status: RegistryStatus::Present,
                matched_phrase: Some(phrase.clone()),
            };
        }

        debug!("No registry phrase matched");
        Classification {
            status: RegistryStatus::Indeterminate,
            matched_phrase: None,
        }
    }

    /// Apply [`INDETERMINATE_POLICY`]
    #[must_use]
    pub fn resolve(&self, classification: &Classification, name_found: bool) -> RegistryDecision {
        self.resolve_with(classification, name_found, INDETERMINATE_POLICY)
    }

    #[must_use]
    pub fn resolve_with(
        &self,
        classification: &Classification,
        name_found: bool,
        policy: IndeterminatePolicy,
    ) -> RegistryDecision {
        let status = classification.status;
        let (in_registry, message) = match status {
            RegistryStatus::Present => (true, &self.present_message),
            RegistryStatus::Absent => (false, &self.absent_message),
            RegistryStatus::Indeterminate => {
                let present = match policy {
                    IndeterminatePolicy::PresentIfNamed => name_found,
                    IndeterminatePolicy::Absent => false,
                };
                if present {
                    (true, &self.named_message)
                } else {
                    (false, &self.unnamed_message)
                }
            }
        };
        RegistryDecision {
            status,
            in_registry,
            message: message.clone(),
        }
    }
}
