//! Target site profiles
//!
//! One navigator and one extractor serve every registry surface; what
//! differs between sites lives here as data. Profiles can be loaded from
//! JSON so a site redesign is a config change, not a code change.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{LookupError, LookupResult};

/// One way of locating a field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Candidate {
    /// Text of every element matching a CSS selector, in document order
    Css { selector: String },
    /// Text of every element whose class attribute contains one of `words`
    ClassContains { words: Vec<String> },
    /// First capture group of a regex over the flattened page text
    Pattern { regex: String },
}

impl Candidate {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css {
            selector: selector.into(),
        }
    }

    pub fn class_contains(words: &[&str]) -> Self {
        Self::ClassContains {
            words: words.iter().map(|w| (*w).to_string()).collect(),
        }
    }

    pub fn pattern(regex: impl Into<String>) -> Self {
        Self::Pattern {
            regex: regex.into(),
        }
    }
}

/// Candidate lists per field plus the tax lookup parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRules {
    pub name: Vec<Candidate>,
    pub address: Vec<Candidate>,
    pub status: Vec<Candidate>,
    pub main_activity: Vec<Candidate>,
    pub registration_date: Vec<Candidate>,
    pub authorized_capital: Vec<Candidate>,
    pub ogrn: Vec<Candidate>,
    pub kpp: Vec<Candidate>,
    pub inn: Vec<Candidate>,
    /// Word that labels the tax figure on the page
    pub taxes_keyword: String,
    /// Containers scanned when the keyword walk finds nothing
    pub tax_containers: Vec<String>,
    /// Lower-case tokens that disqualify a name candidate
    pub boilerplate: Vec<String>,
    /// Prefix of the synthesized name (`"<entity_label> <inn>"`)
    pub entity_label: String,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            name: vec![Candidate::css("h1"), Candidate::css("[itemprop='name']")],
            address: vec![
                Candidate::css("[itemprop='address']"),
                Candidate::css(".address"),
                Candidate::css(".company-address"),
                Candidate::css(".company-info-address"),
            ],
            status: vec![
                Candidate::css(".company-status"),
                Candidate::css(".status"),
                Candidate::css(".status-label"),
            ],
            main_activity: vec![Candidate::css(".okved"), Candidate::css(".main-activity")],
            registration_date: vec![
                Candidate::pattern(r"(?i)Дата регистрации\s*:?\s*(\d{1,2}\s+[а-яё]+\s+\d{4})"),
                Candidate::pattern(r"(?i)Регистрация\s*:?\s*(\d{1,2}\s+[а-яё]+\s+\d{4})"),
                Candidate::pattern(r"(?i)(\d{1,2}\s+[а-яё]+\s+\d{4})[^\d]{0,32}Регистрац"),
            ],
            authorized_capital: vec![Candidate::pattern(
                r"(?i)Устав(?:ный|ной) капитал\s*:?\s*(\d[\d\s,]*руб)",
            )],
            ogrn: vec![
                Candidate::pattern(r"ОГРН(?:ИП)?[:\s№]*(\d{13,15})\b"),
                Candidate::pattern(r"\b(\d{13,15})\b[^\d]{0,32}ОГРН"),
            ],
            kpp: vec![
                Candidate::pattern(r"КПП[:\s№]*(\d{9})\b"),
                Candidate::pattern(r"\b(\d{9})\b[^\d]{0,32}КПП"),
            ],
            inn: vec![Candidate::pattern(r"ИНН[:\s№]*(\d{12}|\d{10})\b")],
            taxes_keyword: "Налоги".to_string(),
            tax_containers: vec![
                ".connexion-col".to_string(),
                ".company-finance".to_string(),
                ".taxes-block".to_string(),
                "[class*='tax']".to_string(),
            ],
            boilerplate: [
                "реестр",
                "аккредит",
                "поиск",
                "результат",
                "каталог",
                "войти",
                "госуслуги",
                "ит-компани",
            ]
            .iter()
            .map(|w| (*w).to_string())
            .collect(),
            entity_label: "Компания ИНН".to_string(),
        }
    }
}

/// Everything site-specific about a registry surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetProfile {
    pub name: String,
    pub entry_url: String,
    /// Direct result URL with an `{inn}` placeholder, used by the HTTP fallback
    #[serde(default)]
    pub query_url: Option<String>,
    pub input_selectors: Vec<String>,
    /// Partial text of the link that resets the search form
    #[serde(default)]
    pub search_again_text: Option<String>,
    #[serde(default)]
    pub ready_selectors: Vec<String>,
    #[serde(default)]
    pub detail_url_markers: Vec<String>,
    /// URL fragment that identifies a results list rather than a detail page
    #[serde(default)]
    pub results_list_marker: Option<String>,
    #[serde(default)]
    pub result_link_selectors: Vec<String>,
    pub present_phrases: Vec<String>,
    pub absent_phrases: Vec<String>,
    pub present_message: String,
    pub absent_message: String,
    /// Message when an indeterminate page resolves to present
    pub named_message: String,
    /// Message when an indeterminate page resolves to absent
    pub unnamed_message: String,
    #[serde(default)]
    pub extraction: ExtractionRules,
}

impl TargetProfile {
    /// The accredited IT company registry on gosuslugi.ru
    #[must_use]
    pub fn gosuslugi() -> Self {
        let extraction = ExtractionRules {
            name: vec![
                Candidate::css("h1"),
                Candidate::css("h2"),
                Candidate::css("h3"),
                Candidate::css("h4"),
                Candidate::css("h5"),
                Candidate::class_contains(&["company", "name", "title", "organization"]),
            ],
            ..ExtractionRules::default()
        };

        Self {
            name: "gosuslugi".to_string(),
            entry_url: "https://www.gosuslugi.ru/itorgs".to_string(),
            query_url: None,
            input_selectors: strings(&[
                "input[type='text']",
                "input.search-input",
                "input[aria-label*='печатать']",
                "input[role='combobox']",
                ".search-input",
                "input",
            ]),
            search_again_text: Some("Искать снова".to_string()),
            ready_selectors: strings(&["[class*='org-card']", "[class*='search-result']"]),
            detail_url_markers: strings(&["/itorgs/"]),
            results_list_marker: None,
            result_link_selectors: Vec::new(),
            present_phrases: strings(&["входит в реестр", "аккредитована"]),
            absent_phrases: strings(&[
                "не входит в реестр",
                "не аккредитована",
                "не найдена",
                "не найдено",
                "компания с такими реквизитами не найдена",
            ]),
            present_message: "Компания входит в реестр аккредитованных ИТ-компаний".to_string(),
            absent_message: "Компания не входит в реестр аккредитованных ИТ-компаний".to_string(),
            named_message: "Компания найдена в реестре".to_string(),
            unnamed_message: "Компания не найдена в реестре".to_string(),
            extraction,
        }
    }

    /// Company profile pages on rusprofile.ru
    ///
    /// Search lands on a results list; the navigator clicks through to the
    /// first company. An active status counts as present.
    #[must_use]
    pub fn rusprofile() -> Self {
        let extraction = ExtractionRules {
            name: vec![
                Candidate::css(".company-name"),
                Candidate::css("h1"),
                Candidate::css(".legal-name"),
                Candidate::css(".company-title"),
                Candidate::css("[itemprop='name']"),
            ],
            ..ExtractionRules::default()
        };

        Self {
            name: "rusprofile".to_string(),
            entry_url: "https://www.rusprofile.ru".to_string(),
            query_url: Some("https://www.rusprofile.ru/search?query={inn}".to_string()),
            input_selectors: strings(&[
                "input[name='query']",
                "input[placeholder*='ИНН']",
                "input[placeholder*='названи']",
                "[id*='autocomplete-item']",
                "[data-autotest='index-search']",
                "input[type='text']",
            ]),
            search_again_text: None,
            ready_selectors: strings(&[
                ".company-name",
                ".search-result-item",
                "[itemprop='name']",
            ]),
            detail_url_markers: strings(&["/id/", "/ip/"]),
            results_list_marker: Some("search".to_string()),
            result_link_selectors: strings(&[
                ".company-name",
                ".search-result-item a",
                ".link-arrow",
                ".gp-name a",
                "a[href*='/id/']",
                ".legal-name",
            ]),
            present_phrases: strings(&["действующая", "действует"]),
            absent_phrases: strings(&[
                "по запросу ничего не найдено",
                "по вашему запросу ничего не найдено",
                "ликвидирован",
                "прекратило деятельность",
            ]),
            present_message: "Организация действует".to_string(),
            absent_message: "Организация не найдена или прекратила деятельность".to_string(),
            named_message: "Организация найдена".to_string(),
            unnamed_message: "Организация не найдена".to_string(),
            extraction,
        }
    }

    /// Look up a bundled preset by name
    pub fn preset(name: &str) -> LookupResult<Self> {
        match name {
            "gosuslugi" => Ok(Self::gosuslugi()),
            "rusprofile" => Ok(Self::rusprofile()),
            other => Err(LookupError::Config(format!(
                "unknown profile '{other}' (expected gosuslugi or rusprofile)"
            ))),
        }
    }

    /// Load a profile from a JSON file
    pub fn from_json_file(path: &Path) -> LookupResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            LookupError::Config(format!("cannot read profile {}: {e}", path.display()))
        })?;
        let profile: Self = serde_json::from_str(&raw).map_err(|e| {
            LookupError::Config(format!("invalid profile {}: {e}", path.display()))
        })?;
        profile.validate()?;
        Ok(profile)
    }

    /// Structural checks; selectors and regexes are checked when the
    /// extractor compiles them
    pub fn validate(&self) -> LookupResult<()> {
        url::Url::parse(&self.entry_url).map_err(|e| {
            LookupError::Config(format!("entry_url '{}' is not a URL: {e}", self.entry_url))
        })?;
        if let Some(template) = &self.query_url {
            if !template.contains("{inn}") {
                return Err(LookupError::Config(format!(
                    "query_url '{template}' has no {{inn}} placeholder"
                )));
            }
            url::Url::parse(&template.replace("{inn}", "0000000000")).map_err(|e| {
                LookupError::Config(format!("query_url '{template}' is not a URL: {e}"))
            })?;
        }
        if self.input_selectors.is_empty() {
            return Err(LookupError::Config(
                "profile needs at least one input selector".to_string(),
            ));
        }
        if self.absent_phrases.is_empty() && self.present_phrases.is_empty() {
            return Err(LookupError::Config(
                "profile needs at least one present or absent phrase".to_string(),
            ));
        }
        Ok(())
    }

    /// Fill the `{inn}` placeholder of `query_url`
    #[must_use]
    pub fn query_url_for(&self, inn: &str) -> Option<String> {
        self.query_url
            .as_ref()
            .map(|template| template.replace("{inn}", inn))
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        TargetProfile::gosuslugi().validate().expect("gosuslugi");
        TargetProfile::rusprofile().validate().expect("rusprofile");
    }

    #[test]
    fn query_template_is_filled() {
        let profile = TargetProfile::rusprofile();
        assert_eq!(
            profile.query_url_for("7707083893").as_deref(),
            Some("https://www.rusprofile.ru/search?query=7707083893")
        );
        assert_eq!(TargetProfile::gosuslugi().query_url_for("7707083893"), None);
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        let mut profile = TargetProfile::rusprofile();
        profile.query_url = Some("https://www.rusprofile.ru/search".to_string());
        assert!(matches!(profile.validate(), Err(LookupError::Config(_))));
    }

    #[test]
    fn profile_survives_json() {
        let json = serde_json::to_string(&TargetProfile::gosuslugi()).expect("serialize");
        let back: TargetProfile = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, TargetProfile::gosuslugi());
    }

    #[test]
    fn unknown_preset_is_config_error() {
        assert!(matches!(
            TargetProfile::preset("egrul"),
            Err(LookupError::Config(_))
        ));
    }
}
