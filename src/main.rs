//! Buzzword Bot CLI
//!
//! Watches a YouTube channel for new uploads and trades Polymarket buzzword
//! markets off the transcript.

use anyhow::Result;
use buzzword_bot::chat::commands::extract_video_id;
use buzzword_bot::chat::render_event;
use buzzword_bot::market::{MarketScanner, PriceClient};
use buzzword_bot::retry::{with_retry, RetryConfig};
use buzzword_bot::transcript::TranscriptClient;
use buzzword_bot::types::{TranscriptOutcome, WatchOutcome};
use buzzword_bot::watcher::{resolve_latest_long, WatchSession};
use buzzword_bot::youtube::{spawn_daily_reset, KeyRotator, YouTubeClient};
use buzzword_bot::{AutoTrader, ChatBot, Config, WordCounter};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "buzzword-bot")]
#[command(about = "Watches a YouTube channel and trades Polymarket buzzword markets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Telegram chat bot
    Run,

    /// Watch the channel from the console until a new video lands
    Watch,

    /// Analyze one video: transcript, buzzword counts, and trades
    Analyze {
        /// Video id or link
        video: String,
    },

    /// List the open event markets and their YES prices
    Markets,

    /// Show the channel's upload count and latest long-form video
    Channel,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    // Load configuration
    let config = Config::from_env()?;

    match cli.command {
        Commands::Run => ChatBot::new(config)?.run().await?,
        Commands::Watch => watch_console(&config).await?,
        Commands::Analyze { video } => analyze_video(&config, &video).await?,
        Commands::Markets => list_markets(&config).await?,
        Commands::Channel => show_channel(&config).await?,
    }

    Ok(())
}

fn build_feed(config: &Config) -> (Arc<KeyRotator>, Arc<YouTubeClient>) {
    let rotator = Arc::new(KeyRotator::new(config.youtube_api_keys.clone()));
    let feed = Arc::new(YouTubeClient::new(Arc::clone(&rotator)));
    (rotator, feed)
}

async fn watch_console(config: &Config) -> Result<()> {
    let channel_id = config.require_channel_id()?.to_string();
    let transcripts = Arc::new(TranscriptClient::new(
        config.require_transcript_token()?.to_string(),
    ));
    let (rotator, feed) = build_feed(config);
    spawn_daily_reset(rotator);

    println!("\n{}", "=".repeat(70));
    println!("  CHANNEL WATCH");
    println!(
        "  Channel: {} | Poll: {}s | Trading: {}",
        channel_id,
        config.watch.poll_interval_seconds,
        if config.trade.dry_run { "DRY RUN" } else { "LIVE" }
    );
    println!("{}\n", "=".repeat(70));
    println!("Watching (Ctrl+C to stop)...\n");

    let (event_tx, mut event_rx) = mpsc::channel(32);
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let session = WatchSession::new(
        feed,
        Arc::clone(&transcripts),
        channel_id,
        config.watch.options(),
        event_tx,
        cancel_rx,
    );

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        let _ = cancel_tx.send(true);
    });

    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            println!("  {}", render_event(&event));
        }
    });

    let outcome = session.run().await;
    let _ = printer.await;

    match outcome {
        WatchOutcome::Cancelled => {
            println!("\nStopped.");
        }
        WatchOutcome::Completed { video, transcript } => match transcript {
            TranscriptOutcome::Ready(text) => {
                println!("\nNew video: {} ({})", video.title, video.url());
                print_analysis(config, &text).await?;
            }
            TranscriptOutcome::NotYetAvailable => {
                println!(
                    "\nNew video {} detected, but its transcript never became available.",
                    video.id
                );
            }
            TranscriptOutcome::Failed(reason) => {
                println!("\n{} {}", "Transcript fetch failed:".red(), reason);
            }
        },
    }

    Ok(())
}

async fn analyze_video(config: &Config, video: &str) -> Result<()> {
    let video_id = extract_video_id(video)
        .ok_or_else(|| anyhow::anyhow!("not a video link or id: {}", video))?;
    let transcripts = TranscriptClient::new(config.require_transcript_token()?.to_string());

    println!("Fetching transcript for {}...", video_id);
    match transcripts.fetch(&video_id).await {
        TranscriptOutcome::Ready(text) => print_analysis(config, &text).await?,
        TranscriptOutcome::NotYetAvailable => {
            println!("Transcript fetched but empty (no captions yet?).");
        }
        TranscriptOutcome::Failed(reason) => {
            println!("{} {}", "Transcript fetch failed:".red(), reason);
        }
    }

    Ok(())
}

/// Count buzzwords, print the table, and run the trade pass if enabled.
async fn print_analysis(config: &Config, transcript: &str) -> Result<()> {
    let counts = WordCounter::standard().count(transcript);
    println!("\n{}", counts.to_table());

    let trader = AutoTrader::new(config.trade.clone());
    if !trader.enabled() {
        println!("Auto-trading disabled (set AUTO_BUY_USDC_PER_MARKET > 0).");
        return Ok(());
    }

    println!("Checking markets for auto-trades...\n");
    let reports = trader.run(&counts).await?;
    if reports.is_empty() {
        println!("No auto-trades triggered (priced in or below threshold).");
    } else {
        for report in &reports {
            let line = report.summary();
            if report.dry_run {
                println!("  {}", line.yellow());
            } else {
                println!("  {}", line.green());
            }
        }
    }

    Ok(())
}

async fn list_markets(config: &Config) -> Result<()> {
    let scanner = MarketScanner::new();
    let prices = PriceClient::new();

    println!("\n{}", "=".repeat(70));
    println!("  EVENT MARKETS - {}", config.trade.event_slug);
    println!("{}\n", "=".repeat(70));

    let markets = scanner.fetch_event_markets(&config.trade.event_slug).await?;
    if markets.is_empty() {
        println!("No open markets found.");
        return Ok(());
    }

    for market in &markets {
        let mid = match market.yes_token() {
            Some(token) => prices.midpoint(token).await.ok(),
            None => None,
        };
        let price = mid
            .map(|m| format!("{}c", (m * Decimal::from(100)).round()))
            .unwrap_or_else(|| "  ?".to_string());
        println!("  {:>5}  {}", price, market.question);
    }

    println!("\n{} markets", markets.len());
    Ok(())
}

async fn show_channel(config: &Config) -> Result<()> {
    let channel_id = config.require_channel_id()?.to_string();
    let (_rotator, feed) = build_feed(config);

    let retry_config = RetryConfig::default();
    let count = with_retry(&retry_config, "upload count", || {
        feed.upload_count(&channel_id)
    })
    .await?;

    println!("Channel {}: {} uploads", channel_id, count);

    match resolve_latest_long(feed.as_ref(), &channel_id, &config.watch.options()).await? {
        Some(video) => println!("Latest long-form video: {} ({})", video.title, video.url()),
        None => println!("No long-form video among the recent uploads."),
    }

    Ok(())
}
