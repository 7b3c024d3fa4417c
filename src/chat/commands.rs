//! Chat command surface and watch-session wiring
//!
//! One watch session per chat conversation. The bot long-polls for commands,
//! spawns a session task per `/watch`, forwards the session's events to the
//! chat as they happen, and runs the count-and-trade pipeline when a
//! transcript lands. A bare video link or id triggers a one-shot analysis of
//! that video.

use crate::chat::telegram::{html_escape, TelegramClient};
use crate::config::Config;
use crate::market::AutoTrader;
use crate::transcript::TranscriptClient;
use crate::types::{TranscriptOutcome, WatchEvent, WatchOutcome};
use crate::watcher::WatchSession;
use crate::words::WordCounter;
use crate::youtube::{spawn_daily_reset, KeyRotator, YouTubeClient};
use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

const HELP_TEXT: &str = "Commands:\n\
    /watch - watch the channel for the next upload\n\
    /stop - cancel the active watch\n\
    /status - watch and API key status\n\
    Send a video link or id to analyze it directly.";

/// A parsed operator command
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Watch,
    Stop,
    Status,
    Help,
    Analyze { video_id: String },
}

/// Parse a chat message into a command, if it is one.
pub fn parse_command(text: &str) -> Option<Command> {
    let trimmed = text.trim();
    let word = trimmed.split_whitespace().next()?;
    // Group chats suffix commands with @botname
    let word = word.split('@').next().unwrap_or(word);

    match word {
        "/watch" => Some(Command::Watch),
        "/stop" => Some(Command::Stop),
        "/status" => Some(Command::Status),
        "/start" | "/help" => Some(Command::Help),
        _ => extract_video_id(trimmed).map(|video_id| Command::Analyze { video_id }),
    }
}

/// Pull a video id out of a link or a bare 11-character id.
pub fn extract_video_id(input: &str) -> Option<String> {
    let link = Regex::new(r"(?:v=|/embed/|/shorts/|/watch\?v=|youtu\.be/)([0-9A-Za-z_-]{11})")
        .expect("video link pattern is valid");
    if let Some(captures) = link.captures(input) {
        return Some(captures[1].to_string());
    }

    let bare = Regex::new(r"^[0-9A-Za-z_-]{11}$").expect("video id pattern is valid");
    if bare.is_match(input) {
        return Some(input.to_string());
    }

    None
}

struct WatchHandle {
    cancel: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

/// The chat bot: command dispatch plus per-chat watch sessions
pub struct ChatBot {
    telegram: Arc<TelegramClient>,
    feed: Arc<YouTubeClient>,
    transcripts: Arc<TranscriptClient>,
    counter: Arc<WordCounter>,
    trader: Arc<AutoTrader>,
    rotator: Arc<KeyRotator>,
    config: Config,
    sessions: HashMap<i64, WatchHandle>,
}

impl ChatBot {
    pub fn new(config: Config) -> Result<Self> {
        let telegram = TelegramClient::new(config.require_telegram_token()?);
        let transcripts = TranscriptClient::new(config.require_transcript_token()?.to_string());
        config.require_channel_id()?;

        let rotator = Arc::new(KeyRotator::new(config.youtube_api_keys.clone()));
        spawn_daily_reset(Arc::clone(&rotator));

        Ok(Self {
            telegram: Arc::new(telegram),
            feed: Arc::new(YouTubeClient::new(Arc::clone(&rotator))),
            transcripts: Arc::new(transcripts),
            counter: Arc::new(WordCounter::standard()),
            trader: Arc::new(AutoTrader::new(config.trade.clone())),
            rotator,
            config,
            sessions: HashMap::new(),
        })
    }

    /// Long-poll for commands until the process is stopped.
    pub async fn run(mut self) -> Result<()> {
        info!("Chat bot started, waiting for commands");
        let mut offset = 0i64;

        loop {
            let updates = match self.telegram.get_updates(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!("getUpdates failed: {}", e);
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(message) = update.message else {
                    continue;
                };
                let Some(text) = message.text else {
                    continue;
                };
                let chat_id = message.chat.id;

                match parse_command(&text) {
                    Some(Command::Watch) => self.handle_watch(chat_id).await,
                    Some(Command::Stop) => self.handle_stop(chat_id).await,
                    Some(Command::Status) => self.handle_status(chat_id).await,
                    Some(Command::Help) => self.telegram.notify(chat_id, HELP_TEXT).await,
                    Some(Command::Analyze { video_id }) => {
                        self.handle_analyze(chat_id, video_id)
                    }
                    None => {}
                }
            }
        }
    }

    async fn handle_watch(&mut self, chat_id: i64) {
        if let Some(handle) = self.sessions.get(&chat_id) {
            if !handle.task.is_finished() {
                self.telegram
                    .notify(chat_id, "Already watching. Use /stop to cancel first.")
                    .await;
                return;
            }
        }

        let channel_id = match self.config.require_channel_id() {
            Ok(channel_id) => channel_id.to_string(),
            Err(e) => {
                self.telegram.notify(chat_id, &e.to_string()).await;
                return;
            }
        };

        let (event_tx, mut event_rx) = mpsc::channel(32);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let session = WatchSession::new(
            Arc::clone(&self.feed),
            Arc::clone(&self.transcripts),
            channel_id,
            self.config.watch.options(),
            event_tx,
            cancel_rx,
        );

        let telegram = Arc::clone(&self.telegram);
        let counter = Arc::clone(&self.counter);
        let trader = Arc::clone(&self.trader);

        let task = tokio::spawn(async move {
            let session_task = tokio::spawn(session.run());

            // Forward session events to the chat; the channel closes when
            // the session ends
            let notifier_telegram = Arc::clone(&telegram);
            let notifier = tokio::spawn(async move {
                while let Some(event) = event_rx.recv().await {
                    notifier_telegram
                        .notify(chat_id, &render_event(&event))
                        .await;
                }
            });

            let outcome = match session_task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Watch session task failed: {}", e);
                    return;
                }
            };
            let _ = notifier.await;

            if let WatchOutcome::Completed {
                video,
                transcript: TranscriptOutcome::Ready(text),
            } = outcome
            {
                report_analysis(&telegram, chat_id, &counter, &trader, &video.title, &text)
                    .await;
            }
        });

        self.sessions.insert(
            chat_id,
            WatchHandle {
                cancel: cancel_tx,
                task,
            },
        );
    }

    async fn handle_stop(&mut self, chat_id: i64) {
        match self.sessions.get(&chat_id) {
            Some(handle) if !handle.task.is_finished() => {
                let _ = handle.cancel.send(true);
            }
            _ => {
                self.telegram
                    .notify(chat_id, "No active watch session.")
                    .await;
            }
        }
    }

    async fn handle_status(&mut self, chat_id: i64) {
        let watching = self
            .sessions
            .get(&chat_id)
            .map(|h| !h.task.is_finished())
            .unwrap_or(false);
        let keys = self.rotator.status().await;

        let status = format!(
            "Watching: {}\nAPI keys: {}/{} usable\nAuto-trading: {}",
            if watching { "yes" } else { "no" },
            keys.total - keys.exhausted,
            keys.total,
            if self.trader.enabled() { "on" } else { "off" },
        );
        self.telegram.notify(chat_id, &status).await;
    }

    fn handle_analyze(&self, chat_id: i64, video_id: String) {
        let telegram = Arc::clone(&self.telegram);
        let transcripts = Arc::clone(&self.transcripts);
        let counter = Arc::clone(&self.counter);
        let trader = Arc::clone(&self.trader);

        tokio::spawn(async move {
            telegram
                .notify(chat_id, "🎥 Fetching transcript for analysis...")
                .await;

            match transcripts.fetch(&video_id).await {
                TranscriptOutcome::Ready(text) => {
                    report_analysis(&telegram, chat_id, &counter, &trader, &video_id, &text)
                        .await;
                }
                TranscriptOutcome::NotYetAvailable => {
                    telegram
                        .notify(chat_id, "Transcript fetched but empty (no captions yet?).")
                        .await;
                }
                TranscriptOutcome::Failed(reason) => {
                    telegram
                        .notify(chat_id, &format!("Transcript fetch failed: {}", reason))
                        .await;
                }
            }
        });
    }
}

/// Count buzzwords, reply with the table, and run the auto-trade pass.
async fn report_analysis(
    telegram: &TelegramClient,
    chat_id: i64,
    counter: &WordCounter,
    trader: &AutoTrader,
    label: &str,
    transcript: &str,
) {
    let counts = counter.count(transcript);
    let reply = format!(
        "<b>Buzzword counts - {}</b>\n\n<pre>{}</pre>",
        html_escape(label),
        counts.to_table()
    );
    telegram.notify(chat_id, &reply).await;

    if !trader.enabled() {
        telegram
            .notify(
                chat_id,
                "Auto-trading disabled (set AUTO_BUY_USDC_PER_MARKET > 0).",
            )
            .await;
        return;
    }

    telegram.notify(chat_id, "Checking markets for auto-trades...").await;
    match trader.run(&counts).await {
        Ok(reports) if reports.is_empty() => {
            telegram
                .notify(
                    chat_id,
                    "No auto-trades triggered (priced in or below threshold).",
                )
                .await;
        }
        Ok(reports) => {
            let lines: Vec<String> = reports
                .iter()
                .map(|r| format!("✅ {}", html_escape(&r.summary())))
                .collect();
            telegram
                .notify(
                    chat_id,
                    &format!("<b>Auto trades:</b>\n{}", lines.join("\n")),
                )
                .await;
        }
        Err(e) => {
            telegram
                .notify(chat_id, &format!("Auto-trade pass failed: {}", e))
                .await;
        }
    }
}

/// Render a watch event as an operator-facing chat message.
pub fn render_event(event: &WatchEvent) -> String {
    match event {
        WatchEvent::Seeded {
            channel_id,
            upload_count,
            ..
        } => format!(
            "👀 Watching channel {} ({} uploads). You'll hear from me when something lands.",
            channel_id, upload_count
        ),
        WatchEvent::UploadDetected { new_count, delta } => format!(
            "📈 Upload count rose to {} (+{}). Checking what it is...",
            new_count, delta
        ),
        WatchEvent::ShortConsumed { .. } => {
            "Looks like that was a Short. Still waiting for a long-form upload.".to_string()
        }
        WatchEvent::NewLongVideo { video } => format!(
            "🎬 New video: {}\nhttps://www.youtube.com/watch?v={}",
            html_escape(&video.title),
            video.id
        ),
        WatchEvent::TranscriptReady { .. } => {
            "📝 Transcript ready. Counting buzzwords...".to_string()
        }
        WatchEvent::TranscriptPending { video_id } => format!(
            "Transcript for {} isn't available yet (captions still processing).",
            video_id
        ),
        WatchEvent::TranscriptFailed { video_id, reason } => format!(
            "⚠️ Transcript fetch for {} failed: {}",
            video_id,
            html_escape(reason)
        ),
        WatchEvent::QuotaExhausted => {
            "⚠️ All API keys are quota-exhausted. Pausing until the quota resets.".to_string()
        }
        WatchEvent::FetchTrouble {
            consecutive,
            message,
        } => format!(
            "⚠️ {} consecutive fetch failures (latest: {}). Still watching.",
            consecutive,
            html_escape(message)
        ),
        WatchEvent::Stopped => "🛑 Watch session stopped.".to_string(),
    }
}
