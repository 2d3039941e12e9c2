//! Google Translate TTS backend
//!
//! Uses the public `translate_tts` endpoint. The endpoint rejects long
//! queries, so each chunk is sent as several short requests whose MP3 frames
//! are concatenated into one file.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::backend::{SynthesisRequest, TtsBackend};
use crate::error::{Result, TtsError};
use crate::params::GoogleParams;

/// Longest query the endpoint reliably accepts, in characters.
const MAX_REQUEST_CHARS: usize = 100;

/// Provider for the Google Translate TTS endpoint
pub struct GoogleBackend {
    params: GoogleParams,
    client: Client,
}

impl GoogleBackend {
    pub fn new(params: GoogleParams) -> Result<Self> {
        if params.lang.trim().is_empty() {
            return Err(TtsError::Config("google lang must not be empty".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(params.timeout_secs))
            .user_agent("Mozilla/5.0")
            .build()?;

        Ok(Self { params, client })
    }

    fn endpoint(&self) -> String {
        format!("https://translate.google.{}/translate_tts", self.params.tld)
    }

    async fn fetch_part(&self, part: &str, idx: usize, total: usize) -> Result<Vec<u8>> {
        let speed = if self.params.slow { "0.3" } else { "1" };
        let query = [
            ("ie", "UTF-8".to_string()),
            ("q", part.to_string()),
            ("tl", self.params.lang.clone()),
            ("client", "tw-ob".to_string()),
            ("ttsspeed", speed.to_string()),
            ("total", total.to_string()),
            ("idx", idx.to_string()),
            ("textlen", part.chars().count().to_string()),
        ];

        let response = self
            .client
            .get(self.endpoint())
            .query(&query)
            .send()
            .await
            .map_err(|e| TtsError::Api {
                message: format!("Request failed: {}", e),
                status_code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TtsError::Api {
                message: if message.is_empty() {
                    status.to_string()
                } else {
                    message
                },
                status_code: Some(status.as_u16()),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl TtsBackend for GoogleBackend {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<()> {
        let parts = split_for_requests(&request.text, MAX_REQUEST_CHARS);
        if parts.is_empty() {
            return Err(TtsError::Config("nothing to synthesize".into()));
        }

        let mut audio = Vec::new();
        for (idx, part) in parts.iter().enumerate() {
            let bytes = self.fetch_part(part, idx, parts.len()).await?;
            if bytes.is_empty() {
                return Err(TtsError::Api {
                    message: format!("empty audio for request {}/{}", idx + 1, parts.len()),
                    status_code: None,
                });
            }
            audio.extend_from_slice(&bytes);
        }

        tokio::fs::write(&request.output_path, audio).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "google"
    }

    fn output_extension(&self) -> &'static str {
        "mp3"
    }

    fn is_available(&self) -> Result<()> {
        // Reachability is only known once a request is made
        Ok(())
    }
}

/// Pack words into request-sized pieces of at most `max_chars` characters.
///
/// A single word longer than the limit is cut at character boundaries.
fn split_for_requests(text: &str, max_chars: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                parts.push(piece.iter().collect());
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            parts.push(std::mem::replace(&mut current, word.to_string()));
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}
