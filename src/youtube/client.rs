//! YouTube Data API v3 client
//!
//! Two metadata calls drive the watcher: the cheap per-channel upload count
//! (the tripwire) and the recent-uploads listing with durations (the
//! resolver). Every call picks a key from the shared rotator; a
//! quota-exhausted response marks the key and retries with the next one, so
//! callers only ever see `PlatformError::QuotaExhausted` once the whole pool
//! is spent.

use crate::types::{DurationClass, PlatformError, RecentUpload};
use crate::youtube::classify;
use crate::youtube::keys::KeyRotator;
use reqwest::{redirect, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// YouTube Data API configuration
pub struct YouTubeApi;

impl YouTubeApi {
    pub const BASE_URL: &'static str = "https://www.googleapis.com/youtube/v3";
    pub const SHORTS_URL: &'static str = "https://www.youtube.com/shorts";
}

/// How a request to the Data API failed, before rotation is applied
enum ApiFailure {
    KeyQuota,
    RateLimited,
    Other { status: u16, message: String },
}

/// Client for the video-platform metadata collaborator
pub struct YouTubeClient {
    http: Client,
    /// Separate client with redirects disabled, for the Shorts probe
    probe: Client,
    keys: Arc<KeyRotator>,
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    statistics: ChannelStatistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    video_count: String,
}

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    #[serde(default)]
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: String,
}

/// Error envelope the Data API returns on failures
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}

impl YouTubeClient {
    pub fn new(keys: Arc<KeyRotator>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        let probe = Client::builder()
            .timeout(Duration::from_secs(15))
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self { http, probe, keys }
    }

    /// Total upload count for a channel (single cheap metadata call).
    pub async fn upload_count(&self, channel_id: &str) -> Result<u64, PlatformError> {
        let query = format!("part=statistics&id={}", urlencoding::encode(channel_id));
        let response: ChannelListResponse = self.get_json("channels", &query).await?;

        let item = response.items.into_iter().next().ok_or(PlatformError::Api {
            status: 404,
            message: format!("channel not found: {}", channel_id),
        })?;

        item.statistics
            .video_count
            .parse()
            .map_err(|_| PlatformError::Api {
                status: 200,
                message: format!(
                    "unparseable video count: {}",
                    item.statistics.video_count
                ),
            })
    }

    /// The `max` most recent uploads, newest first, with durations where the
    /// platform has populated them.
    pub async fn recent_uploads(
        &self,
        channel_id: &str,
        max: usize,
    ) -> Result<Vec<RecentUpload>, PlatformError> {
        let query = format!(
            "part=snippet&channelId={}&order=date&type=video&maxResults={}",
            urlencoding::encode(channel_id),
            max
        );
        let search: SearchListResponse = self.get_json("search", &query).await?;

        let mut uploads: Vec<RecentUpload> = search
            .items
            .into_iter()
            .filter_map(|item| {
                let id = item.id.video_id?;
                let title = item.snippet.map(|s| s.title).unwrap_or_default();
                Some(RecentUpload {
                    id,
                    title,
                    duration_secs: None,
                })
            })
            .collect();

        if uploads.is_empty() {
            return Ok(uploads);
        }

        // Search results carry no durations; resolve them in one batched call
        let ids: Vec<&str> = uploads.iter().map(|u| u.id.as_str()).collect();
        let durations = self.durations_for(&ids).await?;
        for upload in &mut uploads {
            upload.duration_secs = durations.get(&upload.id).copied().flatten();
        }

        Ok(uploads)
    }

    /// Re-fetch a single video's duration (the Unknown-retry path).
    pub async fn video_duration_secs(
        &self,
        video_id: &str,
    ) -> Result<Option<u64>, PlatformError> {
        let durations = self.durations_for(&[video_id]).await?;
        Ok(durations.get(video_id).copied().flatten())
    }

    /// Probe the Shorts URL path. A direct 200 means the player accepts the
    /// video as a Short; a redirect means it is a regular video; anything
    /// else is indeterminate.
    pub async fn probe_short(&self, video_id: &str) -> DurationClass {
        let url = format!("{}/{}", YouTubeApi::SHORTS_URL, video_id);

        match self.probe.get(&url).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    DurationClass::Short
                } else if status.is_redirection() {
                    DurationClass::Long
                } else {
                    debug!("Shorts probe for {} returned {}", video_id, status);
                    DurationClass::Unknown
                }
            }
            Err(e) => {
                debug!("Shorts probe for {} failed: {}", video_id, e);
                DurationClass::Unknown
            }
        }
    }

    async fn durations_for(
        &self,
        video_ids: &[&str],
    ) -> Result<HashMap<String, Option<u64>>, PlatformError> {
        let query = format!("part=contentDetails&id={}", video_ids.join(","));
        let response: VideoListResponse = self.get_json("videos", &query).await?;

        Ok(response
            .items
            .into_iter()
            .map(|item| {
                let secs = classify::parse_iso8601_duration(&item.content_details.duration);
                (item.id, secs)
            })
            .collect())
    }

    /// GET a Data API endpoint, rotating keys on quota errors.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &str,
    ) -> Result<T, PlatformError> {
        loop {
            let Some(api_key) = self.keys.next().await else {
                return Err(PlatformError::QuotaExhausted);
            };

            let url = format!(
                "{}/{}?{}&key={}",
                YouTubeApi::BASE_URL,
                endpoint,
                query,
                api_key.key
            );

            let response = match self.http.get(&url).send().await {
                Ok(r) => r,
                Err(e) => return Err(network_error(&e)),
            };

            let status = response.status();
            if status.is_success() {
                return response.json().await.map_err(|e| PlatformError::Api {
                    status: status.as_u16(),
                    message: format!("unparseable response: {}", e),
                });
            }

            let body = response.text().await.unwrap_or_default();
            match classify_api_failure(status.as_u16(), &body) {
                ApiFailure::KeyQuota => {
                    warn!("API key {} hit its quota, rotating", api_key.index);
                    self.keys.mark_exhausted(api_key.index).await;
                    // Loop picks the next usable key; an empty pool surfaces
                    // as QuotaExhausted above
                }
                ApiFailure::RateLimited => return Err(PlatformError::RateLimited),
                ApiFailure::Other { status, message } => {
                    return Err(PlatformError::Api { status, message })
                }
            }
        }
    }
}

fn network_error(err: &reqwest::Error) -> PlatformError {
    if err.is_timeout() {
        PlatformError::Network("request timed out".to_string())
    } else if err.is_connect() {
        PlatformError::Network("connection failed".to_string())
    } else {
        PlatformError::Network(err.to_string())
    }
}

/// Classify a Data API error response body.
fn classify_api_failure(status: u16, body: &str) -> ApiFailure {
    let parsed: Option<ApiErrorBody> = serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error);

    let message = parsed
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| body.chars().take(200).collect());

    let reasons: Vec<String> = parsed
        .map(|e| e.errors.into_iter().filter_map(|d| d.reason).collect())
        .unwrap_or_default();

    let has_reason = |r: &str| reasons.iter().any(|reason| reason == r);

    if has_reason("quotaExceeded") || has_reason("dailyLimitExceeded") {
        return ApiFailure::KeyQuota;
    }

    if status == 429 || has_reason("rateLimitExceeded") || has_reason("userRateLimitExceeded") {
        return ApiFailure::RateLimited;
    }

    // 403 without a parseable reason is almost always quota on this API
    if status == 403 && message.to_lowercase().contains("quota") {
        return ApiFailure::KeyQuota;
    }

    ApiFailure::Other { status, message }
}
