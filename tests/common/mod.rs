//! Test utilities for the inn_registry test suite
//!
//! `FakeDriver` stands in for Chrome: it serves scripted HTML pages and
//! answers selector queries by parsing the current page with scraper.

#![allow(dead_code)]

use inn_registry::{
    ExtractedRecord, InputHandle, LookupConfig, LookupError, LookupResult, PageDriver, PersistedId,
    RecordSink, RetryPolicy, TargetProfile,
};
use scraper::{Html, Selector};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const PRESENT_INN: &str = "7707083893";
pub const ABSENT_INN: &str = "7736207543";

/// Everything the fake driver was asked to do
#[derive(Debug, Default)]
pub struct DriverLog {
    pub gotos: Vec<String>,
    pub typed: Vec<String>,
    pub enters: usize,
    pub clicked_text: Vec<String>,
    pub clicked_selectors: Vec<String>,
    pub closed: bool,
}

#[derive(Debug, Clone)]
pub struct FakePage {
    pub url: String,
    pub html: String,
}

impl FakePage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

pub struct FakeDriver {
    log: Arc<Mutex<DriverLog>>,
    entry: FakePage,
    /// Page shown after clicking the search-again link
    search_again: Option<FakePage>,
    /// Page shown after submitting, keyed by typed INN
    results: HashMap<String, FakePage>,
    /// Page shown after submitting an INN without a scripted result
    default_result: FakePage,
    /// Page shown after clicking a result link
    detail: Option<FakePage>,
    /// Errors returned by `goto`, one per call, before it starts succeeding
    goto_failures: VecDeque<String>,
    /// `goto` never completes
    hang_on_goto: bool,
    /// `click_first` calls answered "nothing clickable" before links render
    unrendered_clicks: usize,
    current: Option<FakePage>,
    typed: String,
}

impl FakeDriver {
    pub fn new(entry: FakePage) -> Self {
        Self {
            log: Arc::new(Mutex::new(DriverLog::default())),
            entry,
            search_again: None,
            results: HashMap::new(),
            default_result: FakePage::new("https://www.gosuslugi.ru/itorgs", absent_page()),
            detail: None,
            goto_failures: VecDeque::new(),
            hang_on_goto: false,
            unrendered_clicks: 0,
            current: None,
            typed: String::new(),
        }
    }

    /// Gosuslugi-like entry page with a working search input
    pub fn gosuslugi() -> Self {
        Self::new(FakePage::new("https://www.gosuslugi.ru/itorgs", search_form()))
    }

    /// rusprofile-like home page with the header search box
    pub fn rusprofile() -> Self {
        Self::new(FakePage::new(
            "https://www.rusprofile.ru",
            r#"<html><body><form action="/search"><input name="query" placeholder="Поиск по ИНН"></form></body></html>"#,
        ))
    }

    pub fn with_result(mut self, inn: &str, page: FakePage) -> Self {
        self.results.insert(inn.to_string(), page);
        self
    }

    pub fn with_search_again(mut self, page: FakePage) -> Self {
        self.search_again = Some(page);
        self
    }

    pub fn with_detail(mut self, page: FakePage) -> Self {
        self.detail = Some(page);
        self
    }

    pub fn with_goto_failures(mut self, failures: &[&str]) -> Self {
        self.goto_failures = failures.iter().map(|f| (*f).to_string()).collect();
        self
    }

    /// Result links only become clickable after `calls` click attempts
    pub fn with_late_result_links(mut self, calls: usize) -> Self {
        self.unrendered_clicks = calls;
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hang_on_goto = true;
        self
    }

    /// Shared handle to the call log; stays valid after the driver moves
    pub fn log(&self) -> Arc<Mutex<DriverLog>> {
        self.log.clone()
    }

    fn page(&self) -> anyhow::Result<&FakePage> {
        self.current
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no page loaded"))
    }

    fn record(&self, f: impl FnOnce(&mut DriverLog)) {
        let mut log = self.log.lock().expect("log lock");
        f(&mut log);
    }
}

/// Indices of elements matching `selector` that look usable
fn usable_matches(html: &str, selector: &str) -> anyhow::Result<Vec<usize>> {
    let selector =
        Selector::parse(selector).map_err(|e| anyhow::anyhow!("bad selector {selector}: {e}"))?;
    let doc = Html::parse_document(html);
    Ok(doc
        .select(&selector)
        .enumerate()
        .filter(|(_, el)| {
            let attrs = el.value();
            attrs.attr("disabled").is_none()
                && attrs.attr("hidden").is_none()
                && !attrs
                    .attr("style")
                    .is_some_and(|s| s.replace(' ', "").contains("display:none"))
        })
        .map(|(index, _)| index)
        .collect())
}

impl PageDriver for FakeDriver {
    async fn goto(&mut self, url: &str) -> anyhow::Result<()> {
        self.record(|log| log.gotos.push(url.to_string()));
        if self.hang_on_goto {
            std::future::pending::<()>().await;
        }
        if let Some(error) = self.goto_failures.pop_front() {
            return Err(anyhow::anyhow!(error));
        }
        self.current = Some(self.entry.clone());
        Ok(())
    }

    async fn current_url(&mut self) -> anyhow::Result<String> {
        Ok(self.page()?.url.clone())
    }

    async fn content(&mut self) -> anyhow::Result<String> {
        Ok(self.page()?.html.clone())
    }

    async fn has_element(&mut self, selector: &str) -> anyhow::Result<bool> {
        let html = &self.page()?.html;
        let selector =
            Selector::parse(selector).map_err(|e| anyhow::anyhow!("bad selector: {e}"))?;
        let found = Html::parse_document(html).select(&selector).next().is_some();
        Ok(found)
    }

    async fn find_interactable(&mut self, selector: &str) -> anyhow::Result<Option<InputHandle>> {
        let matches = usable_matches(&self.page()?.html, selector)?;
        Ok(matches.first().map(|&index| InputHandle {
            selector: selector.to_string(),
            index,
        }))
    }

    async fn type_into(&mut self, _handle: &InputHandle, text: &str) -> anyhow::Result<()> {
        self.typed = text.to_string();
        self.record(|log| log.typed.push(text.to_string()));
        Ok(())
    }

    async fn press_enter(&mut self, _handle: &InputHandle) -> anyhow::Result<()> {
        self.record(|log| log.enters += 1);
        let page = self
            .results
            .get(&self.typed)
            .cloned()
            .unwrap_or_else(|| self.default_result.clone());
        self.current = Some(page);
        Ok(())
    }

    async fn click_text(&mut self, text: &str) -> anyhow::Result<bool> {
        self.record(|log| log.clicked_text.push(text.to_string()));
        let visible = self.page()?.html.contains(text);
        match (&self.search_again, visible) {
            (Some(page), true) => {
                self.current = Some(page.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn click_first(&mut self, selector: &str) -> anyhow::Result<bool> {
        if self.unrendered_clicks > 0 {
            self.unrendered_clicks -= 1;
            return Ok(false);
        }
        let clickable = !usable_matches(&self.page()?.html, selector)?.is_empty();
        if !clickable {
            return Ok(false);
        }
        self.record(|log| log.clicked_selectors.push(selector.to_string()));
        if let Some(detail) = &self.detail {
            self.current = Some(detail.clone());
        }
        Ok(true)
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.record(|log| log.closed = true);
        self.current = None;
        Ok(())
    }
}

/// Sink that keeps every record in memory and hands out sequential ids
#[derive(Clone, Default)]
pub struct MemorySink {
    pub records: Arc<Mutex<Vec<ExtractedRecord>>>,
}

impl RecordSink for MemorySink {
    async fn persist(&self, record: &ExtractedRecord) -> LookupResult<PersistedId> {
        let mut records = self.records.lock().expect("sink lock");
        records.push(record.clone());
        Ok(PersistedId(i64::try_from(records.len()).expect("small test")))
    }
}

/// Sink whose store is always unavailable
#[derive(Clone, Copy, Default)]
pub struct BrokenSink;

impl RecordSink for BrokenSink {
    async fn persist(&self, _record: &ExtractedRecord) -> LookupResult<PersistedId> {
        Err(LookupError::PersistenceFailed("database is locked".to_string()))
    }
}

/// Timings as in production; tests run on paused time so they cost nothing
pub fn config(profile: TargetProfile) -> LookupConfig {
    LookupConfig::builder()
        .profile(profile)
        .retry(RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
            jitter: Duration::ZERO,
        })
        .build()
        .expect("test config")
}

pub fn search_form() -> String {
    r#"<html><head><title>Госуслуги</title></head><body>
        <h1>Реестр аккредитованных ИТ-компаний</h1>
        <form><input type="text" class="search-input" aria-label="Начните печатать ИНН"></form>
    </body></html>"#
        .to_string()
}

/// Search screen after a previous query: no input until "Искать снова" is clicked
pub fn stale_results_page() -> String {
    r##"<html><body>
        <p>Результаты поиска</p>
        <input type="text" class="search-input" disabled>
        <a href="#">Искать снова</a>
    </body></html>"##
        .to_string()
}

pub fn present_page() -> String {
    r#"<html><head><title>Реестр ИТ-компаний</title></head><body>
        <h1>Реестр аккредитованных ИТ-компаний</h1>
        <div class="org-card">
            <h2>ООО «Вектор Плюс»</h2>
            <p>ИНН: 7707083893</p>
            <p>ОГРН: 1027700132195</p>
            <p>КПП: 770701001</p>
            <p>Компания входит в реестр аккредитованных ИТ-компаний</p>
        </div>
    </body></html>"#
        .to_string()
}

pub fn absent_page() -> String {
    r#"<html><body>
        <h1>Реестр аккредитованных ИТ-компаний</h1>
        <div class="org-card">Компания с такими реквизитами не найдена</div>
    </body></html>"#
        .to_string()
}

/// Company card without any registry phrase
pub fn indeterminate_page() -> String {
    r#"<html><body>
        <div class="org-card"><h2>АО «Северный Код»</h2><p>ОГРН 1107746000000</p></div>
    </body></html>"#
        .to_string()
}

/// rusprofile search results list
pub fn rusprofile_results_page() -> String {
    r#"<html><body>
        <div class="search-result-item"><a href="/id/123456">ООО «Вектор Плюс»</a></div>
    </body></html>"#
        .to_string()
}

/// rusprofile company page with requisites and a taxes block
pub fn rusprofile_company_page() -> String {
    r#"<html><body>
        <h1 class="company-name">ООО «Вектор Плюс»</h1>
        <span class="company-status">Действующая организация</span>
        <address class="company-address">г. Москва, ул. Вавилова, д. 19</address>
        <dl>
            <dt>ИНН</dt><dd>7707083893</dd>
            <dt>КПП</dt><dd>770701001</dd>
            <dd>1027700132195</dd><dt>ОГРН</dt>
            <dt>Дата регистрации</dt><dd>20 июня 1991</dd>
            <dt>Уставный капитал</dt><dd>10 000 руб.</dd>
        </dl>
        <div class="okved">Денежное посредничество прочее</div>
        <div class="connexion-col">
            <div class="connexion-col__title">Налоги</div>
            <div class="connexion-col__num">12 500 тыс. руб.</div>
        </div>
        <script>var tracker = "ИНН 0000000000";</script>
    </body></html>"#
        .to_string()
}

/// Result page with no ready signal at all
pub fn silent_page() -> String {
    "<html><body><div class='spinner'>Загрузка</div></body></html>".to_string()
}

pub fn temp_dir() -> TempDir {
    TempDir::new().expect("temp dir")
}
