//! Main application entry point (CLI binary).
//!
//! Replays one HubSpot form payload through the router against in-memory
//! browser storage and prints what the page would have done:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - JSON output of the routing outcome and, optionally, of the scheduler
//!   page rendered from what the submission stored
//!
//! All routing logic lives in the library crate.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{json, Value};
use url::Url;

use scheduler_router::config::{is_stdin_path, Opt, PARTNERSTACK_FIELD_NAME};
use scheduler_router::coordinator::{RecordingNavigator, RecordingSink};
use scheduler_router::identifier::capture_from_landing_url;
use scheduler_router::initialization::init_logger_with;
use scheduler_router::scheduler_page::{MemoryTarget, SchedulerPage};
use scheduler_router::storage::{BrowserStorage, KeyValueStore};
use scheduler_router::{
    normalize_form_data, FormData, ListenerAction, MessageListener, ProcessingStats,
    RouterConfig, SubmissionCoordinator,
};

fn read_payload(path: &Path) -> Result<Value> {
    let raw = if is_stdin_path(path) {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read payload from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read payload file {}", path.display()))?
    };
    serde_json::from_str(&raw).context("Payload is not valid JSON")
}

fn main() -> Result<()> {
    // .env is optional; RUST_LOG may be set there
    let _ = dotenvy::dotenv();

    let opt = Opt::parse();
    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    let config = match &opt.config {
        Some(path) => RouterConfig::from_json_file(path)
            .with_context(|| format!("Failed to load router config from {}", path.display()))?,
        None => RouterConfig::default(),
    };
    let payload = read_payload(&opt.payload)?;

    let storage = BrowserStorage::in_memory();
    if let Some(id) = &opt.identifier {
        storage
            .session
            .set_item(PARTNERSTACK_FIELD_NAME, id)
            .context("Failed to seed click id")?;
    }

    let stats = Arc::new(ProcessingStats::new());
    let landing = match opt.landing_url.as_deref() {
        Some(raw) => {
            let url = Url::parse(raw).with_context(|| format!("Invalid landing URL: {raw}"))?;
            Some(capture_from_landing_url(
                &url,
                &storage,
                config.cookie_domain.as_deref(),
                &stats,
            ))
        }
        None => None,
    };

    let analytics = Arc::new(RecordingSink::new("cli"));
    let scheduler_page = opt
        .scheduler_page
        .then(|| SchedulerPage::new(config.clone(), storage.clone(), Arc::clone(&stats)));
    let coordinator = SubmissionCoordinator::new(
        config,
        storage,
        Box::new(RecordingNavigator::new()),
        Arc::clone(&stats),
    )
    .with_sink(Box::new(Arc::clone(&analytics)));

    let action = match &opt.origin {
        Some(origin) => MessageListener::new(coordinator).on_message(origin, &payload),
        None => {
            let mut coordinator = coordinator;
            match coordinator.handle_form_submission(normalize_form_data(&payload)) {
                Some(outcome) => ListenerAction::Routed(Box::new(outcome)),
                None => ListenerAction::AlreadyRouted,
            }
        }
    };

    // The scheduler page is a fresh page load: empty query, empty target.
    let page = scheduler_page.map(|page| {
        let mut target = MemoryTarget::new();
        page.render(
            &FormData::new(),
            Some(&mut target),
            &RecordingNavigator::new(),
        )
    });

    let errors: BTreeMap<String, usize> = stats
        .summary()
        .into_iter()
        .map(|(error_type, count)| (format!("{error_type:?}"), count))
        .collect();

    let report = json!({
        "result": action,
        "landing": landing,
        "scheduler_page": page,
        "analytics": analytics.events(),
        "errors": errors,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to render report")?
    );
    Ok(())
}
