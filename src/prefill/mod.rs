//! Click id prefill for form inputs.
//!
//! This module provides:
//! - [`inject_identifier`]: fills empty click id inputs and fires input/change events
//! - [`run_injection_schedule`]: repeats injection at fixed offsets for late-loading forms
//! - [`watch_field`]: bounded, cancelable polling of hidden input values

mod inject;
mod watch;

use std::time::Duration;

use log::debug;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

pub use inject::{
    inject_identifier, is_identifier_field, FieldEvent, FormField, InjectionReport, MemoryField,
};
pub use watch::{spawn_field_watcher, watch_field, WatchConfig, WatchStop};

/// Calls `attempt` at each offset in `delays`, measured from the call.
///
/// Offsets are expected in ascending order (the page-load schedule is
/// `[0ms, 1000ms, 3000ms]`). Stops early when `cancel` fires.
///
/// # Returns
///
/// The number of attempts that ran.
pub async fn run_injection_schedule<A>(
    delays: &[Duration],
    cancel: CancellationToken,
    mut attempt: A,
) -> usize
where
    A: FnMut(usize),
{
    let start = Instant::now();
    let mut ran = 0;

    for (index, delay) in delays.iter().enumerate() {
        tokio::select! {
            _ = sleep_until(start + *delay) => {
                debug!("Running click id injection attempt {} at {:?}", index + 1, delay);
                attempt(index);
                ran += 1;
            }
            _ = cancel.cancelled() => {
                debug!("Injection schedule cancelled after {} attempt(s)", ran);
                break;
            }
        }
    }
    ran
}
