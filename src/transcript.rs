//! Captioning service client (youtube-transcript.io)
//!
//! Classifies every fetch into the three-way outcome the watcher needs:
//! captions present, captions not published yet, or a real failure. An empty
//! caption payload is the normal state right after an upload and is never
//! treated as an error.

use crate::types::TranscriptOutcome;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Captioning API configuration
pub struct TranscriptApi;

impl TranscriptApi {
    pub const URL: &'static str = "https://www.youtube-transcript.io/api/transcripts";
}

/// Client for the captioning collaborator
pub struct TranscriptClient {
    http: Client,
    token: String,
}

impl TranscriptClient {
    pub fn new(token: String) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { http, token }
    }

    /// Request the transcript for a video.
    pub async fn fetch(&self, video_id: &str) -> TranscriptOutcome {
        let response = self
            .http
            .post(TranscriptApi::URL)
            .header(AUTHORIZATION, format!("Basic {}", self.token))
            .json(&json!({ "ids": [video_id] }))
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => return TranscriptOutcome::Failed(format!("request failed: {}", e)),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            return TranscriptOutcome::Failed(format!("API error {}: {}", status, preview));
        }

        let payload: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => return TranscriptOutcome::Failed(format!("unparseable response: {}", e)),
        };

        let text = extract_text(&payload);
        if text.trim().is_empty() {
            debug!("Transcript for {} fetched but empty (no captions yet)", video_id);
            TranscriptOutcome::NotYetAvailable
        } else {
            TranscriptOutcome::Ready(text)
        }
    }
}

/// Flatten the structured transcript payload into plain text.
///
/// The payload nests caption segments as `{"text": ..., "start": ...,
/// "dur": ...}` objects under per-language tracks; the segment `text` values
/// in document order are the transcript.
pub fn extract_text(payload: &Value) -> String {
    let mut parts = Vec::new();
    collect_text(payload, &mut parts);
    parts.join(" ")
}

fn collect_text<'a>(value: &'a Value, parts: &mut Vec<&'a str>) {
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                if key == "text" {
                    if let Value::String(s) = v {
                        parts.push(s);
                        continue;
                    }
                }
                collect_text(v, parts);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_text(item, parts);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_segment_text() {
        let payload = json!([{
            "id": "abc123xyz_0",
            "title": "I Gave Away $1,000,000",
            "tracks": [{
                "language": "en",
                "transcript": [
                    {"text": "today we gave away", "start": "0.0", "dur": "1.2"},
                    {"text": "one million dollars", "start": "1.2", "dur": "1.5"}
                ]
            }]
        }]);

        assert_eq!(
            extract_text(&payload),
            "today we gave away one million dollars"
        );
    }

    #[test]
    fn test_extract_empty_tracks() {
        let payload = json!([{ "id": "abc123xyz_0", "tracks": [] }]);
        assert_eq!(extract_text(&payload), "");
    }

    #[test]
    fn test_extract_ignores_non_string_text() {
        let payload = json!({ "text": 42, "nested": {"text": "kept"} });
        assert_eq!(extract_text(&payload), "kept");
    }
}
