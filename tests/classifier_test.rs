//! Registry classification over realistic registry pages

mod common;

use inn_registry::{
    IndeterminatePolicy, ParsedDocument, RegistryClassifier, RegistryStatus, TargetProfile,
};

fn classifier() -> RegistryClassifier {
    RegistryClassifier::new(&TargetProfile::gosuslugi())
}

#[test]
fn present_phrase_is_present() {
    let doc = ParsedDocument::from_html(&common::present_page());
    let classification = classifier().classify(&doc);
    assert_eq!(classification.status, RegistryStatus::Present);
    assert_eq!(classification.matched_phrase.as_deref(), Some("входит в реестр"));
}

#[test]
fn negative_form_is_absent_even_though_it_contains_the_positive_one() {
    let doc = ParsedDocument::from_html(
        "<div class='org-card'>ООО «Ромашка» не входит в реестр аккредитованных ИТ-компаний</div>",
    );
    let classification = classifier().classify(&doc);
    assert_eq!(classification.status, RegistryStatus::Absent);
    assert_eq!(
        classification.matched_phrase.as_deref(),
        Some("не входит в реестр")
    );
}

#[test]
fn absent_wins_when_both_phrases_appear() {
    let doc = ParsedDocument::from_html(
        "<p>Компания входит в реестр</p><p>Компания с такими реквизитами не найдена</p>",
    );
    assert_eq!(classifier().classify(&doc).status, RegistryStatus::Absent);
}

#[test]
fn matching_ignores_case() {
    let doc = ParsedDocument::from_html("<p>КОМПАНИЯ ВХОДИТ В РЕЕСТР</p>");
    assert_eq!(classifier().classify(&doc).status, RegistryStatus::Present);
}

#[test]
fn no_phrase_is_indeterminate() {
    let doc = ParsedDocument::from_html(&common::indeterminate_page());
    let classification = classifier().classify(&doc);
    assert_eq!(classification.status, RegistryStatus::Indeterminate);
    assert!(classification.matched_phrase.is_none());
}

#[test]
fn decisions_carry_profile_messages() {
    let classifier = classifier();
    let profile = TargetProfile::gosuslugi();

    let present = classifier.resolve(
        &classifier.classify(&ParsedDocument::from_html(&common::present_page())),
        true,
    );
    assert!(present.in_registry);
    assert_eq!(present.message, profile.present_message);

    let absent = classifier.resolve(
        &classifier.classify(&ParsedDocument::from_html(&common::absent_page())),
        true,
    );
    assert!(!absent.in_registry);
    assert_eq!(absent.message, profile.absent_message);
}

#[test]
fn indeterminate_depends_on_named_company() {
    let classifier = classifier();
    let profile = TargetProfile::gosuslugi();
    let classification =
        classifier.classify(&ParsedDocument::from_html(&common::indeterminate_page()));

    let named = classifier.resolve(&classification, true);
    assert!(named.in_registry);
    assert_eq!(named.status, RegistryStatus::Indeterminate);
    assert_eq!(named.message, profile.named_message);

    let unnamed = classifier.resolve(&classification, false);
    assert!(!unnamed.in_registry);
    assert_eq!(unnamed.message, profile.unnamed_message);
}

#[test]
fn strict_policy_never_reports_indeterminate_as_present() {
    let classifier = classifier();
    let classification =
        classifier.classify(&ParsedDocument::from_html(&common::indeterminate_page()));
    let decision = classifier.resolve_with(&classification, true, IndeterminatePolicy::Absent);
    assert!(!decision.in_registry);
}

#[test]
fn rusprofile_liquidated_company_is_absent() {
    let classifier = RegistryClassifier::new(&TargetProfile::rusprofile());
    let doc = ParsedDocument::from_html(
        "<h1>ООО «Старый Завод»</h1><span class='company-status'>Организация ликвидирована</span>",
    );
    assert_eq!(classifier.classify(&doc).status, RegistryStatus::Absent);
}

#[test]
fn accreditation_wording_is_present() {
    let doc = ParsedDocument::from_html("<p>ИНН 7707083893</p><p>Компания аккредитована</p>");
    let classification = classifier().classify(&doc);
    assert_eq!(classification.status, RegistryStatus::Present);
    assert_eq!(classification.matched_phrase.as_deref(), Some("аккредитована"));
}

#[test]
fn registry_header_alone_is_not_present() {
    let doc = ParsedDocument::from_html(
        "<h1>Реестр аккредитованных ИТ-компаний</h1><p>Компания не аккредитована</p>",
    );
    assert_eq!(classifier().classify(&doc).status, RegistryStatus::Absent);

    let header_only = ParsedDocument::from_html("<h1>Реестр аккредитованных ИТ-компаний</h1>");
    assert_eq!(
        classifier().classify(&header_only).status,
        RegistryStatus::Indeterminate
    );
}

#[test]
fn rusprofile_side_widget_does_not_override_active_status() {
    let classifier = RegistryClassifier::new(&TargetProfile::rusprofile());
    let doc = ParsedDocument::from_html(
        "<h1>ООО «Вектор Плюс»</h1>\
         <span class='company-status'>Действующая организация</span>\
         <aside>Судебных дел не найдено</aside>",
    );
    assert_eq!(classifier.classify(&doc).status, RegistryStatus::Present);
}

#[test]
fn rusprofile_empty_search_is_absent() {
    let classifier = RegistryClassifier::new(&TargetProfile::rusprofile());
    let doc = ParsedDocument::from_html("<p>По запросу ничего не найдено</p>");
    assert_eq!(classifier.classify(&doc).status, RegistryStatus::Absent);
}
