//! Market scanner for the Polymarket Gamma API
//!
//! Fetches the open markets under the watched event and normalizes the
//! JSON-in-string outcome and token-id arrays into usable form.

use crate::config::GammaApi;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Raw market response from the Gamma API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GammaMarket {
    id: String,
    question: String,
    #[serde(default)]
    outcomes: Option<String>,
    #[serde(default)]
    clob_token_ids: Option<String>,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    closed: bool,
}

/// Event data from the Gamma API (parent of markets)
#[derive(Debug, Deserialize)]
struct GammaEvent {
    #[serde(default)]
    markets: Vec<GammaMarket>,
}

/// A market with normalized outcomes and CLOB token ids
#[derive(Debug, Clone)]
pub struct MarketInfo {
    pub id: String,
    pub question: String,
    pub outcomes: Vec<String>,
    pub token_ids: Vec<String>,
}

impl MarketInfo {
    /// CLOB token id for the YES outcome, if the market has one
    pub fn yes_token(&self) -> Option<&str> {
        let index = self
            .outcomes
            .iter()
            .position(|o| o.eq_ignore_ascii_case("yes"))?;
        self.token_ids.get(index).map(|s| s.as_str())
    }
}

/// Scanner for fetching the watched event's markets
pub struct MarketScanner {
    client: Client,
}

impl MarketScanner {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Fetch all open markets under an event slug.
    pub async fn fetch_event_markets(&self, event_slug: &str) -> Result<Vec<MarketInfo>> {
        let url = format!(
            "{}?slug={}",
            GammaApi::events_url(),
            urlencoding::encode(event_slug)
        );
        debug!("Fetching event markets from: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch event markets")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gamma API error {}: {}", status, body);
        }

        let events: Vec<GammaEvent> = response
            .json()
            .await
            .context("Failed to parse event response")?;

        let markets: Vec<MarketInfo> = events
            .into_iter()
            .flat_map(|e| e.markets)
            .filter(|m| m.active && !m.closed)
            .filter_map(normalize_market)
            .collect();

        info!(
            "Found {} open markets for event {}",
            markets.len(),
            event_slug
        );
        Ok(markets)
    }
}

impl Default for MarketScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a raw market, dropping ones without usable outcomes/token ids.
fn normalize_market(gm: GammaMarket) -> Option<MarketInfo> {
    let outcomes = parse_string_array(gm.outcomes.as_deref())?;
    let token_ids = parse_string_array(gm.clob_token_ids.as_deref())?;

    if outcomes.len() < 2 || token_ids.len() != outcomes.len() {
        return None;
    }

    Some(MarketInfo {
        id: gm.id,
        question: gm.question,
        outcomes,
        token_ids,
    })
}

/// The Gamma API encodes arrays as JSON strings like `"[\"Yes\", \"No\"]"`.
fn parse_string_array(raw: Option<&str>) -> Option<Vec<String>> {
    serde_json::from_str::<Vec<String>>(raw?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_market(outcomes: &str, token_ids: &str) -> GammaMarket {
        GammaMarket {
            id: "512329".to_string(),
            question: "Will MrBeast say Challenge?".to_string(),
            outcomes: Some(outcomes.to_string()),
            clob_token_ids: Some(token_ids.to_string()),
            active: true,
            closed: false,
        }
    }

    #[test]
    fn test_normalize_market() {
        let market = normalize_market(raw_market(
            r#"["Yes", "No"]"#,
            r#"["111222", "333444"]"#,
        ))
        .unwrap();

        assert_eq!(market.outcomes, vec!["Yes", "No"]);
        assert_eq!(market.yes_token(), Some("111222"));
    }

    #[test]
    fn test_normalize_rejects_mismatched_arrays() {
        assert!(normalize_market(raw_market(r#"["Yes", "No"]"#, r#"["111222"]"#)).is_none());
    }

    #[test]
    fn test_normalize_rejects_unparseable() {
        assert!(normalize_market(raw_market("not json", r#"["1", "2"]"#)).is_none());
    }

    #[test]
    fn test_yes_token_case_insensitive() {
        let market = normalize_market(raw_market(
            r#"["YES", "NO"]"#,
            r#"["111222", "333444"]"#,
        ))
        .unwrap();
        assert_eq!(market.yes_token(), Some("111222"));
    }

    #[test]
    fn test_yes_token_missing() {
        let market = normalize_market(raw_market(
            r#"["Over", "Under"]"#,
            r#"["111222", "333444"]"#,
        ))
        .unwrap();
        assert_eq!(market.yes_token(), None);
    }
}
