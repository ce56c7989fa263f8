//! End-to-end routing scenarios over in-memory browser storage.

mod helpers;

use serde_json::json;

use helpers::{page_with_config, page_with_cookies};
use scheduler_router::coordinator::NavigationMethod;
use scheduler_router::routing::{RoutingQuestion, RoutingRules};
use scheduler_router::storage::KeyValueStore;
use scheduler_router::{
    determine_scheduler_type, normalize_form_data, Destination, RouterConfig, RouterState,
};

#[test]
fn test_multi_owner_yes_routes_to_scheduler() {
    let (mut coordinator, page) = page_with_cookies("");
    let form = normalize_form_data(&json!({
        "does_your_practice_have_multiple_owners": "Yes",
        "email": "a@b.com"
    }));

    let outcome = coordinator
        .handle_form_submission(form)
        .expect("first submission should route");

    assert_eq!(outcome.destination, Destination::general());
    assert_eq!(outcome.redirect, "/thank-you/schedule?email=a%40b.com");
    assert_eq!(
        page.visits(),
        vec![(
            NavigationMethod::Replace,
            "/thank-you/schedule?email=a%40b.com".to_string()
        )]
    );
    assert!(page
        .session
        .get_item("scheduler_router_data")
        .expect("session read")
        .is_some());
}

#[test]
fn test_multi_owner_no_routes_to_success() {
    let (mut coordinator, page) = page_with_cookies("");
    let form = normalize_form_data(&json!({"does_your_practice_have_multiple_owners": "no"}));

    let outcome = coordinator
        .handle_form_submission(form)
        .expect("first submission should route");

    assert_eq!(outcome.destination, Destination::success());
    assert_eq!(outcome.redirect, "/thank-you/success");
    assert_eq!(page.session.get_item("scheduler_router_data"), Ok(None));
}

#[test]
fn test_unanswered_routes_like_no() {
    let form = normalize_form_data(&json!({"email": "a@b.com"}));
    assert_eq!(determine_scheduler_type(&form), Destination::success());

    let form = normalize_form_data(&json!({"does_your_practice_have_multiple_owners": "maybe"}));
    assert_eq!(determine_scheduler_type(&form), Destination::success());
}

#[test]
fn test_session_identifier_beats_cookie() {
    let (mut coordinator, page) = page_with_cookies("ps_xid=cook2");
    page.session
        .set_item("ps_xid", "sess1")
        .expect("seed session storage");

    let outcome = coordinator
        .handle_form_submission(normalize_form_data(&json!({"email": "a@b.com"})))
        .expect("routes");

    assert_eq!(outcome.identifier.as_deref(), Some("sess1"));
    assert_eq!(outcome.form_data.get("partnerstack_click_id"), Some("sess1"));
    assert_eq!(outcome.form_data.get("0-3/partnerstack_click_id"), Some("sess1"));
}

#[test]
fn test_prefixed_record_keys_are_canonicalized() {
    let form = normalize_form_data(&json!({
        "fields": [{"name": "0-1/email", "value": "x@y.com"}]
    }));
    assert_eq!(form.get("0-1/email"), Some("x@y.com"));
    assert_eq!(form.get("email"), Some("x@y.com"));
}

#[test]
fn test_prefixed_answer_routes_to_scheduler() {
    let form = normalize_form_data(&json!([
        {"name": "0-2/does_your_practice_have_multiple_owners", "value": ["Multiple owners"]},
    ]));
    assert_eq!(determine_scheduler_type(&form), Destination::general());
}

#[test]
fn test_at_most_one_routing_action() {
    let (mut coordinator, page) = page_with_cookies("");
    let form = normalize_form_data(&json!({"does_your_practice_have_multiple_owners": "yes"}));

    assert!(coordinator.handle_form_submission(form.clone()).is_some());
    assert!(coordinator.handle_form_submission(form.clone()).is_none());
    assert!(coordinator.handle_form_submission(form).is_none());

    assert_eq!(coordinator.state(), RouterState::Routed);
    assert_eq!(page.visits().len(), 1);
    assert_eq!(page.analytics.events().len(), 1);
}

#[test]
fn test_two_question_rules_require_both() {
    let config = RouterConfig {
        rules: RoutingRules {
            questions: vec![
                RoutingQuestion::new("multi_practice", &["does_your_practice_have_multiple_owners"]),
                RoutingQuestion::new("revenue", &["annual_revenue_over_threshold"]),
            ],
            negative_phrases: vec!["under $100k".to_string()],
            ..RoutingRules::default()
        },
        ..RouterConfig::default()
    };

    let (mut coordinator, _) = page_with_config(config.clone(), "");
    let one_yes = normalize_form_data(&json!({
        "does_your_practice_have_multiple_owners": "yes",
        "annual_revenue_over_threshold": "Under $100k"
    }));
    assert_eq!(
        coordinator
            .handle_form_submission(one_yes)
            .expect("routes")
            .destination,
        Destination::success()
    );

    let (mut coordinator, _) = page_with_config(config, "");
    let both_yes = normalize_form_data(&json!({
        "does_your_practice_have_multiple_owners": "yes",
        "0-1/annual_revenue_over_threshold": "Yes, over $100k"
    }));
    assert_eq!(
        coordinator
            .handle_form_submission(both_yes)
            .expect("routes")
            .destination,
        Destination::general()
    );
}

#[test]
fn test_scheduler_url_is_prefilled() {
    let (mut coordinator, _) = page_with_cookies("");
    let form = normalize_form_data(&json!({
        "does_your_practice_have_multiple_owners": "yes",
        "email": "a@b.com",
        "first_name": "Ada",
        "practice_name": "Lovelace Therapy",
        "utm_campaign": "spring"
    }));

    let outcome = coordinator.handle_form_submission(form).expect("routes");
    let url = url::Url::parse(outcome.scheduler_url.as_deref().expect("scheduler url"))
        .expect("absolute url");
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    assert_eq!(url.host_str(), Some("meetings.hubspot.com"));
    assert!(pairs.contains(&("embed".into(), "true".into())));
    assert!(pairs.contains(&("email".into(), "a@b.com".into())));
    assert!(pairs.contains(&("firstName".into(), "Ada".into())));
    assert!(pairs.contains(&("company".into(), "Lovelace Therapy".into())));
    assert!(pairs.contains(&("utm_campaign".into(), "spring".into())));
}
