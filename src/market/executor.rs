//! Order execution for matched buzzword markets

use crate::config::TradeConfig;
use anyhow::{anyhow, Context, Result};
use rust_decimal::Decimal;
use tracing::{debug, info};

// Polymarket SDK imports
use alloy::primitives::U256;
use alloy::signers::{local::PrivateKeySigner, Signer};
use polymarket_client_sdk::clob::types::{Amount, OrderType, Side as ClobSide};
use polymarket_client_sdk::clob::{Client as ClobClient, Config as ClobConfig};

/// Polygon chain ID for signing
const POLYGON_CHAIN_ID: u64 = 137;

/// CLOB API endpoint
const CLOB_ENDPOINT: &str = "https://clob.polymarket.com";

/// Places YES buys (dry-run or real) on matched markets
pub struct TradeExecutor {
    config: TradeConfig,
}

/// Result of an execution attempt
#[derive(Debug)]
pub enum ExecutionResult {
    Executed {
        token_id: String,
        amount: Decimal,
        dry_run: bool,
    },
    Skipped {
        reason: String,
    },
}

impl TradeExecutor {
    pub fn new(config: TradeConfig) -> Self {
        Self { config }
    }

    /// Buy the YES outcome for `amount` USDC (dry-run or live).
    pub async fn buy_yes(&self, token_id: &str, amount: Decimal) -> Result<ExecutionResult> {
        if amount <= Decimal::ZERO {
            return Ok(ExecutionResult::Skipped {
                reason: "Order amount is zero".to_string(),
            });
        }

        if self.config.dry_run {
            info!("[DRY RUN] Buy ${} YES on token {}", amount, token_id);
            return Ok(ExecutionResult::Executed {
                token_id: token_id.to_string(),
                amount,
                dry_run: true,
            });
        }

        self.live_buy(token_id, amount).await
    }

    /// Live trade execution via the CLOB API
    async fn live_buy(&self, token_id: &str, amount: Decimal) -> Result<ExecutionResult> {
        let private_key = self
            .config
            .private_key
            .as_ref()
            .ok_or_else(|| anyhow!("Private key required for live trading"))?;

        info!("[LIVE] Buy ${} YES on token {}", amount, token_id);

        // Create signer from private key
        let signer: PrivateKeySigner = private_key.parse().context("Failed to parse private key")?;
        let signer = signer.with_chain_id(Some(POLYGON_CHAIN_ID));

        // Create CLOB config
        let clob_config = ClobConfig::builder().use_server_time(true).build();

        // Create and authenticate client
        debug!("Authenticating with CLOB API...");
        let client = ClobClient::new(CLOB_ENDPOINT, clob_config)
            .context("Failed to create CLOB client")?
            .authentication_builder(&signer)
            .authenticate()
            .await
            .context("Failed to authenticate with CLOB")?;

        // Convert token_id string to U256
        let token_id_u256 =
            U256::from_str_radix(token_id, 10).context("Failed to parse token ID as U256")?;

        // Create market order (Fill-or-Kill for immediate execution)
        let order = client
            .market_order()
            .token_id(token_id_u256)
            .amount(Amount::usdc(amount).context("Failed to create USDC amount")?)
            .side(ClobSide::Buy)
            .order_type(OrderType::FOK)
            .build()
            .await
            .context("Failed to build market order")?;

        // Sign and submit
        let signed_order = client
            .sign(&signer, order)
            .await
            .context("Failed to sign order")?;

        let response = client
            .post_order(signed_order)
            .await
            .context("Failed to submit order")?;

        info!("[LIVE] Order submitted: {:?}", response);

        Ok(ExecutionResult::Executed {
            token_id: token_id.to_string(),
            amount,
            dry_run: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dry_config() -> TradeConfig {
        TradeConfig {
            dry_run: true,
            private_key: None,
            auto_buy_usdc: Decimal::from(5),
            max_yes_price: Decimal::new(95, 2),
            event_slug: "test-event".to_string(),
        }
    }

    #[tokio::test]
    async fn test_dry_run_never_touches_network() {
        let executor = TradeExecutor::new(dry_config());
        let result = executor.buy_yes("123456", Decimal::from(5)).await.unwrap();
        assert!(matches!(
            result,
            ExecutionResult::Executed { dry_run: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_zero_amount_skipped() {
        let executor = TradeExecutor::new(dry_config());
        let result = executor.buy_yes("123456", Decimal::ZERO).await.unwrap();
        assert!(matches!(result, ExecutionResult::Skipped { .. }));
    }
}
