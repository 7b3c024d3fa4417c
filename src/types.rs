//! Core types for the channel watcher and its collaborators

use std::fmt;

/// Duration classification for an upload.
///
/// `Unknown` means the platform has not populated the duration yet (a
/// transient processing-lag state right after upload). It must never be
/// collapsed to `Short` without the retry-then-fallback policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationClass {
    Short,
    Long,
    Unknown,
}

impl fmt::Display for DurationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationClass::Short => write!(f, "short"),
            DurationClass::Long => write!(f, "long"),
            DurationClass::Unknown => write!(f, "unknown"),
        }
    }
}

/// A recent upload as returned by the video platform, duration not yet
/// classified. `duration_secs` is `None` while the platform is still
/// processing the upload.
#[derive(Debug, Clone)]
pub struct RecentUpload {
    pub id: String,
    pub title: String,
    pub duration_secs: Option<u64>,
}

/// A candidate video produced by the latest-video resolver.
#[derive(Debug, Clone)]
pub struct VideoCandidate {
    pub id: String,
    pub title: String,
    pub duration: DurationClass,
}

impl VideoCandidate {
    pub fn url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

/// Result of one upload-count tripwire check.
///
/// `FetchFailed` is distinct from `Increased(0)`: a failed fetch must never be
/// read as "no new video".
#[derive(Debug)]
pub enum TripwireSignal {
    Unchanged,
    Increased(u64),
    FetchFailed(PlatformError),
}

/// Outcome of a transcript fetch.
///
/// `NotYetAvailable` is not an error: captions are routinely absent for a
/// while after upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptOutcome {
    Ready(String),
    NotYetAvailable,
    Failed(String),
}

/// Errors from the video platform metadata collaborator.
///
/// Quota exhaustion is its own variant so the poll loop can distinguish
/// "every credential in the pool is spent" from transient trouble.
#[derive(Debug, Clone)]
pub enum PlatformError {
    /// All credentials in the rotation pool are exhausted
    QuotaExhausted,
    /// Per-request rate limit (retryable, does not exhaust a credential)
    RateLimited,
    /// Network/connection error (timeout, DNS, etc.)
    Network(String),
    /// Other API error with status code and message
    Api { status: u16, message: String },
}

impl PlatformError {
    /// Whether a later attempt may succeed without operator intervention
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlatformError::RateLimited | PlatformError::Network(_))
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::QuotaExhausted => {
                write!(f, "all API credentials are quota-exhausted")
            }
            PlatformError::RateLimited => write!(f, "rate limited by the platform"),
            PlatformError::Network(msg) => write!(f, "network error: {}", msg),
            PlatformError::Api { status, message } => {
                write!(f, "API error {}: {}", status, message)
            }
        }
    }
}

impl std::error::Error for PlatformError {}

/// Notifications emitted by a watch session for the operator-facing layer.
/// The core never formats chat text; the chat layer renders these.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// Baseline captured, polling begins
    Seeded {
        channel_id: String,
        upload_count: u64,
        baseline_video_id: Option<String>,
    },
    /// Upload count increased; resolving which video is new
    UploadDetected { new_count: u64, delta: u64 },
    /// The count bump turned out to be a short-form upload (or a duplicate
    /// signal); polling continues from the new count
    ShortConsumed { new_count: u64 },
    /// A new long-form video was confirmed
    NewLongVideo { video: VideoCandidate },
    /// Transcript fetched successfully
    TranscriptReady { video_id: String },
    /// Captions not published yet
    TranscriptPending { video_id: String },
    /// Transcript fetch failed terminally for this video
    TranscriptFailed { video_id: String, reason: String },
    /// Every credential in the rotation pool is exhausted; polling pauses
    QuotaExhausted,
    /// Several consecutive tripwire fetches failed
    FetchTrouble { consecutive: u32, message: String },
    /// Session cancelled by the operator
    Stopped,
}

/// Terminal result of one watch session.
#[derive(Debug)]
pub enum WatchOutcome {
    /// A new long-form video was detected and its transcript fetch concluded
    Completed {
        video: VideoCandidate,
        transcript: TranscriptOutcome,
    },
    /// Operator cancellation before a video was confirmed
    Cancelled,
}
