//! Routed submissions read back on the scheduler page.

mod helpers;

use std::sync::Arc;

use serde_json::json;
use url::Url;

use helpers::{page_with_cookies, Page};
use scheduler_router::coordinator::{NavigationMethod, RecordingNavigator};
use scheduler_router::scheduler_page::{MemoryTarget, PageAction, SchedulerPage, StoredSource};
use scheduler_router::storage::{CookieStore, KeyValueStore};
use scheduler_router::{normalize_form_data, ErrorType, FormData, ProcessingStats, RouterConfig};

fn submit_multi_owner(cookie_string: &str, prepare: impl FnOnce(&Page)) -> Page {
    let (mut coordinator, page) = page_with_cookies(cookie_string);
    prepare(&page);
    coordinator
        .handle_form_submission(normalize_form_data(&json!({
            "fields": [
                {"name": "0-1/does_your_practice_have_multiple_owners", "value": "Yes"},
                {"name": "0-1/email", "value": "a@b.com"},
                {"name": "0-1/firstname", "value": "Ada"}
            ]
        })))
        .expect("first submission routes");
    page
}

fn scheduler_page(page: &Page) -> SchedulerPage {
    SchedulerPage::new(
        RouterConfig::default(),
        page.storage(),
        Arc::new(ProcessingStats::new()),
    )
}

fn embedded(action: PageAction) -> (Url, Option<StoredSource>) {
    match action {
        PageAction::Embedded { url, source } => (Url::parse(&url).expect("url"), source),
        other => panic!("expected an embed, got {other:?}"),
    }
}

fn param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

#[test]
fn test_local_storage_round_trip() {
    let page = submit_multi_owner("ps_xid=click-1", |_| {});
    let mut target = MemoryTarget::new();

    let action = scheduler_page(&page).render(
        &FormData::new(),
        Some(&mut target),
        &RecordingNavigator::new(),
    );
    let (url, source) = embedded(action);
    assert_eq!(source, Some(StoredSource::LocalStorage));
    assert_eq!(param(&url, "embed").as_deref(), Some("true"));
    assert_eq!(param(&url, "email").as_deref(), Some("a@b.com"));
    assert_eq!(param(&url, "firstName").as_deref(), Some("Ada"));
    assert_eq!(param(&url, "partnerstack_click_id").as_deref(), Some("click-1"));
    assert_eq!(target.embeds.len(), 1);
}

#[test]
fn test_session_round_trip_consumes_blob() {
    // Local storage is blocked, so only the session blob carries the data.
    let page = submit_multi_owner("", |p| p.local.set_available(false));
    assert!(page
        .session
        .get_item("scheduler_router_data")
        .expect("read")
        .is_some());

    let scheduler = scheduler_page(&page);
    let mut target = MemoryTarget::new();
    let nav = RecordingNavigator::new();
    let (url, source) = embedded(scheduler.render(&FormData::new(), Some(&mut target), &nav));
    assert_eq!(source, Some(StoredSource::SessionStorage));
    assert!(url
        .as_str()
        .starts_with("https://meetings.hubspot.com/bz/consultation?embed=true"));
    assert_eq!(param(&url, "email").as_deref(), Some("a@b.com"));
    assert_eq!(page.session.get_item("scheduler_router_data"), Ok(None));

    // A reload finds nothing left and falls back to the intake form.
    let mut empty = MemoryTarget::new();
    assert_eq!(
        scheduler.render(&FormData::new(), Some(&mut empty), &nav),
        PageAction::Redirected {
            target: "/free-consult".into(),
            navigation: Some(NavigationMethod::Replace),
        }
    );
}

#[test]
fn test_cookie_fallback_round_trip_expires_cookies() {
    let page = submit_multi_owner("", |p| {
        p.local.set_available(false);
        p.session.set_available(false);
    });
    let cookies = page.cookies.cookie_string().expect("cookies");
    assert!(cookies.contains("scheduler_type=general"));
    assert!(cookies.contains("form_data="));

    let scheduler = scheduler_page(&page);
    let mut target = MemoryTarget::new();
    let (url, source) = embedded(scheduler.render(
        &FormData::new(),
        Some(&mut target),
        &RecordingNavigator::new(),
    ));
    assert_eq!(source, Some(StoredSource::Cookies));
    assert_eq!(param(&url, "email").as_deref(), Some("a@b.com"));
    assert_eq!(param(&url, "firstName").as_deref(), Some("Ada"));

    let remaining = page.cookies.cookie_string().expect("cookies");
    assert!(!remaining.contains("scheduler_type="));
    assert!(!remaining.contains("form_data="));
    // Local and session reads failed on the way to the cookies.
    assert_eq!(scheduler.stats().get_error_count(ErrorType::StorageReadError), 2);
}

#[test]
fn test_missing_target_keeps_stored_data() {
    let page = submit_multi_owner("", |p| p.local.set_available(false));
    let scheduler = scheduler_page(&page);

    assert_eq!(
        scheduler.render(&FormData::new(), None, &RecordingNavigator::new()),
        PageAction::Skipped
    );
    assert_eq!(
        scheduler.stats().get_error_count(ErrorType::MissingSchedulerTarget),
        1
    );
    assert!(page
        .session
        .get_item("scheduler_router_data")
        .expect("read")
        .is_some());
}
