//! Video platform integration: metadata client, duration classification,
//! and API credential rotation

pub mod classify;
pub mod client;
pub mod keys;

pub use classify::{classify_seconds, parse_iso8601_duration, SHORT_MAX_SECS};
pub use client::{YouTubeApi, YouTubeClient};
pub use keys::{spawn_daily_reset, ApiKey, KeyRotator, RotatorStatus};
