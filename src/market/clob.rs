//! Midpoint price lookups against the CLOB API

use anyhow::{Context, Result};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// CLOB API endpoint
const CLOB_API: &str = "https://clob.polymarket.com";

#[derive(Debug, Deserialize)]
struct MidpointResponse {
    mid: String,
}

/// Read-only price client for the order book
pub struct PriceClient {
    client: Client,
}

impl PriceClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Mid price for a token, in the 0..1 probability range.
    pub async fn midpoint(&self, token_id: &str) -> Result<Decimal> {
        let url = format!("{}/midpoint?token_id={}", CLOB_API, token_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch midpoint")?;

        if !response.status().is_success() {
            anyhow::bail!("CLOB API error {}", response.status());
        }

        let body: MidpointResponse = response
            .json()
            .await
            .context("Failed to parse midpoint response")?;

        Decimal::from_str(&body.mid).context("Unparseable mid price")
    }
}

impl Default for PriceClient {
    fn default() -> Self {
        Self::new()
    }
}
