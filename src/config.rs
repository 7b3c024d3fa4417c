//! Configuration management for the buzzword bot

use crate::watcher::WatchOptions;
use anyhow::Result;
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Bot configuration loaded from environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token (required for the chat bot)
    pub telegram_bot_token: Option<String>,

    /// Channel to watch for new uploads
    pub channel_id: Option<String>,

    /// Video platform API keys, rotated on quota exhaustion
    pub youtube_api_keys: Vec<String>,

    /// Captioning service token
    pub transcript_api_token: Option<String>,

    /// Watch session settings
    pub watch: WatchConfig,

    /// Auto-trading settings
    pub trade: TradeConfig,
}

/// Watch loop settings (defaults = the observed cadence)
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Seconds between tripwire checks
    pub poll_interval_seconds: u64,
    /// Seconds to wait before re-checking an unpopulated duration
    pub classify_retry_seconds: u64,
    /// How many recent uploads the resolver fetches
    pub recent_fetch: usize,
    /// Extended pause when the credential pool is exhausted, in seconds
    pub quota_pause_seconds: u64,
    /// Re-poll cadence for a not-yet-available transcript; 0 disables
    pub transcript_retry_seconds: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 60,
            classify_retry_seconds: 15,
            recent_fetch: 8,
            quota_pause_seconds: 900,
            transcript_retry_seconds: 60,
        }
    }
}

impl WatchConfig {
    /// Convert to the watcher's option struct
    pub fn options(&self) -> WatchOptions {
        WatchOptions {
            poll_interval: Duration::from_secs(self.poll_interval_seconds),
            classify_retry_delay: Duration::from_secs(self.classify_retry_seconds),
            recent_fetch: self.recent_fetch,
            quota_pause: Duration::from_secs(self.quota_pause_seconds),
            transcript_retry: match self.transcript_retry_seconds {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

/// Auto-trading configuration (defaults = trading disabled, dry-run)
#[derive(Debug, Clone)]
pub struct TradeConfig {
    /// Whether orders are simulated instead of submitted
    pub dry_run: bool,
    /// Private key for live trading (optional)
    pub private_key: Option<String>,
    /// USDC to spend per matched market; zero disables auto-trading
    pub auto_buy_usdc: Decimal,
    /// Only buy YES below this mid price
    pub max_yes_price: Decimal,
    /// Event whose markets are matched against the counts
    pub event_slug: String,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            private_key: None,
            auto_buy_usdc: Decimal::ZERO,
            max_yes_price: Decimal::new(95, 2),
            event_slug: "what-will-mrbeast-say-during-his-next-youtube-video".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let telegram_bot_token = env::var("TELEGRAM_BOT_TOKEN").ok().filter(|s| !s.is_empty());

        let channel_id = env::var("YOUTUBE_CHANNEL_ID").ok().filter(|s| !s.is_empty());

        let youtube_api_keys: Vec<String> = env::var("YOUTUBE_API_KEYS")
            .unwrap_or_default()
            .split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        let transcript_api_token = env::var("YT_TRANSCRIPT_API_TOKEN")
            .ok()
            .filter(|s| !s.is_empty());

        let defaults = WatchConfig::default();
        let watch = WatchConfig {
            poll_interval_seconds: env_or("YT_POLL_INTERVAL", defaults.poll_interval_seconds),
            classify_retry_seconds: env_or(
                "CLASSIFY_RETRY_SECONDS",
                defaults.classify_retry_seconds,
            ),
            recent_fetch: env_or("RECENT_FETCH_COUNT", defaults.recent_fetch),
            quota_pause_seconds: env_or("QUOTA_PAUSE_SECONDS", defaults.quota_pause_seconds),
            transcript_retry_seconds: env_or(
                "TRANSCRIPT_RETRY_SECONDS",
                defaults.transcript_retry_seconds,
            ),
        };

        let dry_run = env::var("DRY_RUN")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(true); // Default to dry-run for safety

        let private_key = env::var("POLYMARKET_PRIVATE_KEY")
            .ok()
            .filter(|s| !s.is_empty());

        let trade_defaults = TradeConfig::default();
        let trade = TradeConfig {
            dry_run,
            private_key,
            auto_buy_usdc: env::var("AUTO_BUY_USDC_PER_MARKET")
                .ok()
                .and_then(|v| Decimal::from_str(&v).ok())
                .unwrap_or(trade_defaults.auto_buy_usdc),
            max_yes_price: env::var("AUTO_MAX_YES_PRICE")
                .ok()
                .and_then(|v| Decimal::from_str(&v).ok())
                .unwrap_or(trade_defaults.max_yes_price),
            event_slug: env::var("MARKET_EVENT_SLUG").unwrap_or(trade_defaults.event_slug),
        };

        // Validate configuration
        if !trade.dry_run && trade.private_key.is_none() {
            anyhow::bail!("POLYMARKET_PRIVATE_KEY required for live trading");
        }

        Ok(Self {
            telegram_bot_token,
            channel_id,
            youtube_api_keys,
            transcript_api_token,
            watch,
            trade,
        })
    }

    pub fn require_telegram_token(&self) -> Result<&str> {
        self.telegram_bot_token
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("TELEGRAM_BOT_TOKEN is not set"))
    }

    pub fn require_channel_id(&self) -> Result<&str> {
        self.channel_id
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("YOUTUBE_CHANNEL_ID is not set"))
    }

    pub fn require_transcript_token(&self) -> Result<&str> {
        self.transcript_api_token
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("YT_TRANSCRIPT_API_TOKEN is not set"))
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Gamma API configuration
pub struct GammaApi;

impl GammaApi {
    pub const BASE_URL: &'static str = "https://gamma-api.polymarket.com";

    pub fn markets_url() -> String {
        format!("{}/markets", Self::BASE_URL)
    }

    pub fn events_url() -> String {
        format!("{}/events", Self::BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_options_mapping() {
        let watch = WatchConfig {
            poll_interval_seconds: 30,
            classify_retry_seconds: 10,
            recent_fetch: 5,
            quota_pause_seconds: 600,
            transcript_retry_seconds: 0,
        };
        let options = watch.options();

        assert_eq!(options.poll_interval, Duration::from_secs(30));
        assert_eq!(options.recent_fetch, 5);
        assert!(options.transcript_retry.is_none());

        let watch = WatchConfig {
            transcript_retry_seconds: 120,
            ..WatchConfig::default()
        };
        assert_eq!(
            watch.options().transcript_retry,
            Some(Duration::from_secs(120))
        );
    }

    #[test]
    fn test_trade_defaults_are_safe() {
        let trade = TradeConfig::default();
        assert!(trade.dry_run);
        assert_eq!(trade.auto_buy_usdc, Decimal::ZERO);
        assert_eq!(trade.max_yes_price, Decimal::new(95, 2));
    }
}
