//! API credential rotation for the video platform
//!
//! The platform enforces a daily per-key quota, so the bot carries a pool of
//! keys and rotates to the next usable one when a key is exhausted. The pool
//! is shared across all concurrent watch sessions; every operation is O(1)
//! behind a single mutex. Exhausted keys are reset once a day at the
//! platform's quota rollover (midnight US/Pacific).

use chrono::{DateTime, Days, TimeZone, Utc};
use chrono_tz::US::Pacific;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// A key handed out by the rotator. The index identifies the key back to
/// `mark_exhausted` without copying the secret around.
#[derive(Debug, Clone)]
pub struct ApiKey {
    pub index: usize,
    pub key: String,
}

/// Pool snapshot for status displays.
#[derive(Debug, Clone, Copy)]
pub struct RotatorStatus {
    pub total: usize,
    pub exhausted: usize,
}

impl RotatorStatus {
    pub fn all_exhausted(&self) -> bool {
        self.total == 0 || self.exhausted >= self.total
    }
}

struct RotatorInner {
    keys: Vec<String>,
    cursor: usize,
    exhausted: HashSet<usize>,
}

/// Shared credential pool with round-robin rotation and an exhausted set.
pub struct KeyRotator {
    inner: Mutex<RotatorInner>,
}

impl KeyRotator {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            inner: Mutex::new(RotatorInner {
                keys,
                cursor: 0,
                exhausted: HashSet::new(),
            }),
        }
    }

    /// Pick the next usable key, or `None` when the whole pool is exhausted.
    pub async fn next(&self) -> Option<ApiKey> {
        let mut inner = self.inner.lock().await;
        let total = inner.keys.len();
        if total == 0 {
            return None;
        }

        for _ in 0..total {
            let index = inner.cursor % total;
            inner.cursor = inner.cursor.wrapping_add(1);
            if !inner.exhausted.contains(&index) {
                return Some(ApiKey {
                    index,
                    key: inner.keys[index].clone(),
                });
            }
        }

        None
    }

    /// Mark a key as quota-exhausted until the next reset.
    pub async fn mark_exhausted(&self, index: usize) {
        let mut inner = self.inner.lock().await;
        if index < inner.keys.len() && inner.exhausted.insert(index) {
            warn!(
                "API key {} quota-exhausted ({}/{} keys down)",
                index,
                inner.exhausted.len(),
                inner.keys.len()
            );
        }
    }

    /// Clear the exhausted set (daily quota rollover).
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        if !inner.exhausted.is_empty() {
            info!("Resetting {} exhausted API keys", inner.exhausted.len());
        }
        inner.exhausted.clear();
    }

    pub async fn status(&self) -> RotatorStatus {
        let inner = self.inner.lock().await;
        RotatorStatus {
            total: inner.keys.len(),
            exhausted: inner.exhausted.len(),
        }
    }
}

/// Spawn the detached timer task that resets the pool at each quota rollover.
pub fn spawn_daily_reset(rotator: Arc<KeyRotator>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let wait = duration_until_reset(Utc::now());
            info!("Next API key quota reset in {:?}", wait);
            tokio::time::sleep(wait).await;
            rotator.reset().await;
        }
    })
}

/// Time until shortly after the next midnight US/Pacific.
fn duration_until_reset(now: DateTime<Utc>) -> Duration {
    let local = now.with_timezone(&Pacific);
    let next_midnight = (local.date_naive() + Days::new(1)).and_hms_opt(0, 0, 5);

    next_midnight
        .and_then(|naive| Pacific.from_local_datetime(&naive).earliest())
        .and_then(|next| (next.with_timezone(&Utc) - now).to_std().ok())
        // Midnight math only fails around timezone edge cases; an hour off
        // schedule is harmless for a quota reset
        .unwrap_or(Duration::from_secs(3600))
}
