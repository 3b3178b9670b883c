//! Search flow of the navigator against a scripted page driver
//!
//! All tests run on paused time: settle delays and bounded waits elapse
//! instantly but are still measured by `tokio::time::Instant`.

mod common;

use common::{FakeDriver, FakePage, PRESENT_INN};
use inn_registry::navigator::debug_dump::dump_path;
use inn_registry::{DocumentOrigin, Inn, LookupConfig, LookupError, Navigator, TargetProfile};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const REGISTRY_URL: &str = "https://www.gosuslugi.ru/itorgs";

fn inn() -> Inn {
    Inn::parse(PRESENT_INN).expect("valid inn")
}

fn present_driver() -> FakeDriver {
    FakeDriver::gosuslugi().with_result(
        PRESENT_INN,
        FakePage::new(REGISTRY_URL, common::present_page()),
    )
}

#[tokio::test(start_paused = true)]
async fn search_flow_captures_result_page() {
    let driver = present_driver();
    let log = driver.log();
    let config = common::config(TargetProfile::gosuslugi());
    let mut navigator = Navigator::new(driver, &config);

    let started = Instant::now();
    let doc = navigator
        .navigate(&inn(), &CancellationToken::new())
        .await
        .expect("navigate");

    assert!(doc.html.contains("ООО «Вектор Плюс»"));
    assert_eq!(doc.url, REGISTRY_URL);
    assert_eq!(doc.origin, DocumentOrigin::Browser);

    let log = log.lock().expect("log");
    assert_eq!(log.gotos, vec![REGISTRY_URL.to_string()]);
    assert_eq!(log.typed, vec![PRESENT_INN.to_string()]);
    assert_eq!(log.enters, 1);
    assert!(log.clicked_text.is_empty());

    // after_load + after_typing + after_submit
    let timings = config.timings();
    let settles = timings.after_load + timings.after_typing + timings.after_submit;
    assert!(started.elapsed() >= settles);
    assert!(started.elapsed() < timings.navigation_timeout);
}

#[tokio::test(start_paused = true)]
async fn stale_form_is_reset_with_search_again() {
    let driver = FakeDriver::new(FakePage::new(REGISTRY_URL, common::stale_results_page()))
        .with_search_again(FakePage::new(REGISTRY_URL, common::search_form()))
        .with_result(PRESENT_INN, FakePage::new(REGISTRY_URL, common::present_page()));
    let log = driver.log();
    let config = common::config(TargetProfile::gosuslugi());
    let mut navigator = Navigator::new(driver, &config);

    let started = Instant::now();
    let doc = navigator
        .navigate(&inn(), &CancellationToken::new())
        .await
        .expect("navigate");
    assert!(doc.html.contains("входит в реестр"));

    let log = log.lock().expect("log");
    assert_eq!(log.clicked_text, vec!["Искать снова".to_string()]);
    assert_eq!(log.typed, vec![PRESENT_INN.to_string()]);

    // the first input search waited out its full bound
    let timings = config.timings();
    let waited = timings.after_load + timings.input_wait + timings.after_search_again;
    assert!(started.elapsed() >= waited);
}

#[tokio::test(start_paused = true)]
async fn missing_input_fails_navigation() {
    let driver = FakeDriver::new(FakePage::new(REGISTRY_URL, common::silent_page()));
    let log = driver.log();
    let config = common::config(TargetProfile::gosuslugi());
    let mut navigator = Navigator::new(driver, &config);

    let started = Instant::now();
    let err = navigator
        .navigate(&inn(), &CancellationToken::new())
        .await
        .expect_err("no input on the page");
    assert!(started.elapsed() < config.timings().navigation_timeout);
    match err {
        LookupError::NavigationFailed { cause } => {
            assert!(cause.contains("search input not found"), "{cause}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(log.lock().expect("log").typed.is_empty());
}

#[tokio::test(start_paused = true)]
async fn missing_ready_signal_times_out() {
    let driver = FakeDriver::gosuslugi()
        .with_result(PRESENT_INN, FakePage::new(REGISTRY_URL, common::silent_page()));
    let config = common::config(TargetProfile::gosuslugi());
    let mut navigator = Navigator::new(driver, &config);

    let err = navigator
        .navigate(&inn(), &CancellationToken::new())
        .await
        .expect_err("never ready");
    match err {
        LookupError::Timeout { stage, waited } => {
            assert_eq!(stage, "ready signal");
            assert_eq!(waited, config.timings().ready_timeout);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn absent_phrase_counts_as_ready() {
    let driver = FakeDriver::gosuslugi().with_result(
        PRESENT_INN,
        FakePage::new(
            REGISTRY_URL,
            "<html><body><p>Компания с такими реквизитами не найдена</p></body></html>",
        ),
    );
    let config = common::config(TargetProfile::gosuslugi());
    let mut navigator = Navigator::new(driver, &config);

    let doc = navigator
        .navigate(&inn(), &CancellationToken::new())
        .await
        .expect("navigate");
    assert!(doc.html.contains("не найдена"));
}

#[tokio::test(start_paused = true)]
async fn hung_driver_hits_navigation_timeout() {
    let driver = present_driver().hanging();
    let config = common::config(TargetProfile::gosuslugi());
    let mut navigator = Navigator::new(driver, &config);

    let started = Instant::now();
    let err = navigator
        .navigate(&inn(), &CancellationToken::new())
        .await
        .expect_err("hangs");
    assert!(matches!(err, LookupError::Timeout { stage: "navigation", .. }));
    assert!(started.elapsed() >= config.timings().navigation_timeout);
}

#[tokio::test(start_paused = true)]
async fn driver_error_is_navigation_failure() {
    let driver = present_driver().with_goto_failures(&["net::ERR_CONNECTION_RESET"]);
    let config = common::config(TargetProfile::gosuslugi());
    let mut navigator = Navigator::new(driver, &config);

    let err = navigator
        .navigate(&inn(), &CancellationToken::new())
        .await
        .expect_err("goto fails");
    match err {
        LookupError::NavigationFailed { cause } => assert!(cause.contains("ERR_CONNECTION_RESET")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn results_list_is_clicked_through() {
    let search_url = format!("https://www.rusprofile.ru/search?query={PRESENT_INN}");
    let detail_url = "https://www.rusprofile.ru/id/123456";
    let driver = FakeDriver::rusprofile()
        .with_result(
            PRESENT_INN,
            FakePage::new(search_url, common::rusprofile_results_page()),
        )
        .with_detail(FakePage::new(detail_url, common::rusprofile_company_page()));
    let log = driver.log();
    let config = common::config(TargetProfile::rusprofile());
    let mut navigator = Navigator::new(driver, &config);

    let doc = navigator
        .navigate(&inn(), &CancellationToken::new())
        .await
        .expect("navigate");
    assert_eq!(doc.url, detail_url);
    assert!(doc.html.contains("connexion-col"));
    assert_eq!(
        log.lock().expect("log").clicked_selectors,
        vec![".search-result-item a".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn result_links_are_polled_until_they_render() {
    let search_url = format!("https://www.rusprofile.ru/search?query={PRESENT_INN}");
    let detail_url = "https://www.rusprofile.ru/id/123456";
    let profile = TargetProfile::rusprofile();
    let first_pass = profile.result_link_selectors.len();
    let driver = FakeDriver::rusprofile()
        .with_result(
            PRESENT_INN,
            FakePage::new(search_url, common::rusprofile_results_page()),
        )
        .with_detail(FakePage::new(detail_url, common::rusprofile_company_page()))
        .with_late_result_links(first_pass);
    let log = driver.log();
    let config = common::config(profile);
    let mut navigator = Navigator::new(driver, &config);

    let doc = navigator
        .navigate(&inn(), &CancellationToken::new())
        .await
        .expect("navigate");
    assert_eq!(doc.url, detail_url);
    assert_eq!(
        log.lock().expect("log").clicked_selectors,
        vec![".search-result-item a".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn list_page_is_captured_when_no_link_renders() {
    let search_url = format!("https://www.rusprofile.ru/search?query={PRESENT_INN}");
    let driver = FakeDriver::rusprofile()
        .with_result(
            PRESENT_INN,
            FakePage::new(search_url.clone(), common::rusprofile_results_page()),
        )
        .with_late_result_links(usize::MAX);
    let config = common::config(TargetProfile::rusprofile());
    let mut navigator = Navigator::new(driver, &config);

    let started = Instant::now();
    let doc = navigator
        .navigate(&inn(), &CancellationToken::new())
        .await
        .expect("navigate");
    assert_eq!(doc.url, search_url);
    assert!(started.elapsed() >= config.timings().input_wait);
}

#[tokio::test(start_paused = true)]
async fn detail_page_is_not_clicked() {
    let detail_url = "https://www.rusprofile.ru/id/123456";
    let driver = FakeDriver::rusprofile().with_result(
        PRESENT_INN,
        FakePage::new(detail_url, common::rusprofile_company_page()),
    );
    let log = driver.log();
    let config = common::config(TargetProfile::rusprofile());
    let mut navigator = Navigator::new(driver, &config);

    let doc = navigator
        .navigate(&inn(), &CancellationToken::new())
        .await
        .expect("navigate");
    assert_eq!(doc.url, detail_url);
    assert!(log.lock().expect("log").clicked_selectors.is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancelled_token_stops_navigation() {
    let config = common::config(TargetProfile::gosuslugi());
    let mut navigator = Navigator::new(present_driver(), &config);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = navigator.navigate(&inn(), &cancel).await.expect_err("cancelled");
    assert!(matches!(err, LookupError::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_a_settle_delay() {
    let driver = present_driver();
    let log = driver.log();
    let config = common::config(TargetProfile::gosuslugi());
    let mut navigator = Navigator::new(driver, &config);
    let cancel = CancellationToken::new();

    let canceller = {
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            cancel.cancel();
        }
    };
    let target = inn();
    let (result, ()) = tokio::join!(navigator.navigate(&target, &cancel), canceller);

    assert!(matches!(result, Err(LookupError::Cancelled)));
    // cancelled during the after_load settle, before typing
    assert!(log.lock().expect("log").typed.is_empty());
}

#[tokio::test(start_paused = true)]
async fn dump_dir_receives_result_html() {
    let dir = common::temp_dir();
    let config = LookupConfig::builder()
        .profile(TargetProfile::gosuslugi())
        .dump_dir(dir.path())
        .build()
        .expect("config");
    let mut navigator = Navigator::new(present_driver(), &config);

    let doc = navigator
        .navigate(&inn(), &CancellationToken::new())
        .await
        .expect("navigate");

    let path = dump_path(dir.path(), &inn());
    assert!(path.ends_with(format!("result_{PRESENT_INN}.html")));

    // the dump is written in the background
    let mut saved = None;
    for _ in 0..100 {
        if let Ok(html) = std::fs::read_to_string(&path) {
            saved = Some(html);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(saved.as_deref(), Some(doc.html.as_str()));
}

#[tokio::test(start_paused = true)]
async fn unwritable_dump_dir_does_not_fail_navigation() {
    let dir = common::temp_dir();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "occupied").expect("write file");
    let config = LookupConfig::builder()
        .profile(TargetProfile::gosuslugi())
        .dump_dir(&blocker)
        .build()
        .expect("config");
    let mut navigator = Navigator::new(present_driver(), &config);

    let doc = navigator
        .navigate(&inn(), &CancellationToken::new())
        .await
        .expect("dump failures stay off the lookup path");
    assert!(doc.html.contains("входит в реестр"));
}

#[tokio::test(start_paused = true)]
async fn close_releases_driver() {
    let driver = present_driver();
    let log = driver.log();
    let config = common::config(TargetProfile::gosuslugi());
    let mut navigator = Navigator::new(driver, &config);

    navigator.close().await.expect("close");
    assert!(log.lock().expect("log").closed);
}
