//! Polling watcher for programmatically changed field values.
//!
//! Hidden inputs are filled by scripts without firing events, so their
//! values are polled. A watch ends when the field disappears, when its
//! token is cancelled, or after a fixed number of polls.

use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::{FIELD_WATCH_INTERVAL, FIELD_WATCH_MAX_POLLS};

/// Poll cadence and bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchConfig {
    pub interval: Duration,
    pub max_polls: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval: FIELD_WATCH_INTERVAL,
            max_polls: FIELD_WATCH_MAX_POLLS,
        }
    }
}

/// Why a watch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchStop {
    /// The read callback reported the field gone
    Removed,
    Cancelled,
    /// `max_polls` reached
    Exhausted,
}

/// Polls `read` and calls `on_change` with each new value.
///
/// `read` returns `None` once the field no longer exists. The value at the
/// start of the watch is the baseline and is not reported.
pub async fn watch_field<R, C>(
    mut read: R,
    mut on_change: C,
    config: WatchConfig,
    cancel: CancellationToken,
) -> WatchStop
where
    R: FnMut() -> Option<String>,
    C: FnMut(&str),
{
    let Some(mut last) = read() else {
        return WatchStop::Removed;
    };

    let mut ticker = interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    for _ in 0..config.max_polls {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(current) = read() else {
                    debug!("Watched field removed");
                    return WatchStop::Removed;
                };
                if current != last {
                    on_change(&current);
                    last = current;
                }
            }
            _ = cancel.cancelled() => {
                debug!("Field watch cancelled");
                return WatchStop::Cancelled;
            }
        }
    }
    WatchStop::Exhausted
}

/// Runs [`watch_field`] on a background task.
pub fn spawn_field_watcher<R, C>(
    read: R,
    on_change: C,
    config: WatchConfig,
    cancel: CancellationToken,
) -> JoinHandle<WatchStop>
where
    R: FnMut() -> Option<String> + Send + 'static,
    C: FnMut(&str) + Send + 'static,
{
    tokio::spawn(watch_field(read, on_change, config, cancel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn fast(max_polls: usize) -> WatchConfig {
        WatchConfig {
            interval: Duration::from_millis(5),
            max_polls,
        }
    }

    #[tokio::test]
    async fn test_reports_changes_then_exhausts() {
        let values = Arc::new(Mutex::new(vec!["c", "b", "b", "a"]));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let source = Arc::clone(&values);
        let sink = Arc::clone(&seen);
        let stop = watch_field(
            move || {
                let mut v = source.lock().expect("lock");
                let value = if v.len() > 1 { v.pop() } else { v.last().copied() };
                value.map(str::to_string)
            },
            move |value| sink.lock().expect("lock").push(value.to_string()),
            fast(5),
            CancellationToken::new(),
        )
        .await;

        assert_eq!(stop, WatchStop::Exhausted);
        assert_eq!(*seen.lock().expect("lock"), vec!["b".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn test_stops_when_field_removed() {
        let mut polls = 0;
        let stop = watch_field(
            move || {
                polls += 1;
                (polls < 3).then(|| "x".to_string())
            },
            |_| panic!("value never changes"),
            fast(100),
            CancellationToken::new(),
        )
        .await;
        assert_eq!(stop, WatchStop::Removed);
    }

    #[tokio::test]
    async fn test_cancellation() {
        let cancel = CancellationToken::new();
        let handle = spawn_field_watcher(
            || Some("same".to_string()),
            |_| {},
            WatchConfig {
                interval: Duration::from_secs(60),
                max_polls: 10,
            },
            cancel.clone(),
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();
        assert_eq!(handle.await.expect("join"), WatchStop::Cancelled);
    }

    #[test]
    fn test_default_config_is_bounded() {
        let config = WatchConfig::default();
        assert_eq!(config.interval, Duration::from_millis(500));
        assert_eq!(config.max_polls, 120);
    }
}
