//! Buzzword Bot Library
//!
//! A chat bot that watches a YouTube channel for new long-form uploads,
//! fetches each new video's transcript from a captioning service, counts a
//! fixed buzzword dictionary, and optionally buys YES on the matching
//! Polymarket markets.
//!
//! The heart of the crate is the watch loop in [`watcher`]: a cheap
//! upload-count tripwire, a Shorts-filtering latest-video resolver, and a
//! transcript waiter, driven by a per-session polling state machine with
//! cooperative cancellation. Everything else is collaborator glue around it.

pub mod chat;
pub mod config;
pub mod market;
pub mod retry;
pub mod transcript;
pub mod types;
pub mod watcher;
pub mod words;
pub mod youtube;

pub use chat::ChatBot;
pub use config::Config;
pub use market::AutoTrader;
pub use transcript::TranscriptClient;
pub use types::{
    DurationClass, TranscriptOutcome, TripwireSignal, VideoCandidate, WatchEvent, WatchOutcome,
};
pub use watcher::{WatchOptions, WatchSession};
pub use words::WordCounter;
pub use youtube::{KeyRotator, YouTubeClient};
