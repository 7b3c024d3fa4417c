//! Auto-trade pipeline: counted transcript -> matched markets -> YES buys
//!
//! For every open market under the watched event: find the YES token, check
//! the price guard (no point buying YES that is already priced in), evaluate
//! the buzzword rule, and buy where the count clears the threshold.

use crate::config::TradeConfig;
use crate::market::clob::PriceClient;
use crate::market::executor::{ExecutionResult, TradeExecutor};
use crate::market::gamma::MarketScanner;
use crate::market::matcher::{self, Verdict};
use crate::words::WordCounts;
use anyhow::Result;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

/// One executed (or dry-run) trade, for operator reporting
#[derive(Debug, Clone)]
pub struct TradeReport {
    pub question: String,
    pub category: &'static str,
    pub count: usize,
    pub threshold: usize,
    pub mid: Decimal,
    pub amount: Decimal,
    pub dry_run: bool,
}

impl TradeReport {
    /// One-line summary for chat and console output
    pub fn summary(&self) -> String {
        format!(
            "{} Buy ${} YES on \"{}\" (count: {}, needs {}, ~{}c)",
            if self.dry_run { "DRY RUN" } else { "EXECUTED" },
            self.amount,
            self.category,
            self.count,
            self.threshold,
            (self.mid * Decimal::from(100)).round()
        )
    }
}

/// Ties the market scanner, price client, and executor together
pub struct AutoTrader {
    scanner: MarketScanner,
    prices: PriceClient,
    executor: TradeExecutor,
    config: TradeConfig,
}

impl AutoTrader {
    pub fn new(config: TradeConfig) -> Self {
        Self {
            scanner: MarketScanner::new(),
            prices: PriceClient::new(),
            executor: TradeExecutor::new(config.clone()),
            config,
        }
    }

    /// Auto-trading is off unless a per-market budget is configured
    pub fn enabled(&self) -> bool {
        self.config.auto_buy_usdc > Decimal::ZERO
    }

    /// Run the full pipeline for one counted transcript.
    pub async fn run(&self, counts: &WordCounts) -> Result<Vec<TradeReport>> {
        let markets = self
            .scanner
            .fetch_event_markets(&self.config.event_slug)
            .await?;

        let mut reports = Vec::new();

        for market in markets {
            let Some(yes_token) = market.yes_token() else {
                continue;
            };

            let (category, count, threshold) = match matcher::evaluate(&market.question, counts)
            {
                Verdict::Yes {
                    category,
                    count,
                    threshold,
                } => (category, count, threshold),
                verdict => {
                    debug!("No YES for \"{}\": {:?}", market.question, verdict);
                    continue;
                }
            };

            let mid = match self.prices.midpoint(yes_token).await {
                Ok(mid) => mid,
                Err(e) => {
                    warn!("Midpoint fetch failed for {}: {}", yes_token, e);
                    continue;
                }
            };

            if mid >= self.config.max_yes_price {
                debug!(
                    "Skipping \"{}\": YES already at {} (max {})",
                    market.question, mid, self.config.max_yes_price
                );
                continue;
            }

            match self
                .executor
                .buy_yes(yes_token, self.config.auto_buy_usdc)
                .await
            {
                Ok(ExecutionResult::Executed {
                    amount, dry_run, ..
                }) => {
                    reports.push(TradeReport {
                        question: market.question.clone(),
                        category,
                        count,
                        threshold,
                        mid,
                        amount,
                        dry_run,
                    });
                }
                Ok(ExecutionResult::Skipped { reason }) => {
                    debug!("Order skipped for \"{}\": {}", market.question, reason);
                }
                Err(e) => {
                    warn!("Order failed for \"{}\": {}", market.question, e);
                }
            }
        }

        info!("Auto-trade pass placed {} orders", reports.len());
        Ok(reports)
    }
}
