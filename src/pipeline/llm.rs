//! Generation-service interaction: build the conversion request and call
//! the Gemini `generateContent` endpoint.
//!
//! This module is intentionally thin — all prompt engineering lives in
//! [`crate::prompts`] so it can be changed without touching transport or
//! error-classification logic here.
//!
//! There is no retry loop: every service failure is terminal for the attempt
//! and surfaces as a classified error. Retrying is a user decision.

use crate::config::ConversionConfig;
use crate::error::Kml2GeoError;
use crate::prompts::{conversion_prompt, SYSTEM_INSTRUCTION};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// The structural-transformation capability the orchestrator depends on.
///
/// The real implementation is [`GeminiConverter`]; tests substitute a
/// deterministic fake so the pipeline is reproducible without network
/// access.
#[async_trait]
pub trait GeoConverter: Send + Sync {
    /// Convert KML source text to raw response text.
    ///
    /// Implementations return the service's text verbatim — isolating and
    /// validating the JSON object is the sanitiser's job, not theirs.
    async fn convert(&self, source_text: &str) -> Result<String, Kml2GeoError>;
}

/// Truncate source text to the request budget, on a char boundary.
///
/// Returns the (possibly shortened) slice and whether truncation occurred.
/// Truncation is silent by contract — a size policy, not an error.
pub fn truncate_source(source: &str, max_chars: usize) -> (&str, bool) {
    match source.char_indices().nth(max_chars) {
        Some((byte_offset, _)) => (&source[..byte_offset], true),
        None => (source, false),
    }
}

// ── Gemini request/response wire types ───────────────────────────────────

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction")]
    system_instruction: GeminiContent,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    /// Hint that the response body should be a JSON document. The sanitiser
    /// still runs regardless — the hint reduces, not eliminates, wrapping.
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiApiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    parts: Option<Vec<GeminiResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiApiError {
    message: String,
    #[serde(default)]
    status: String,
}

// ── Gemini converter ─────────────────────────────────────────────────────

/// [`GeoConverter`] backed by the Gemini REST API.
#[derive(Debug)]
pub struct GeminiConverter {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
    max_source_chars: usize,
}

impl GeminiConverter {
    /// Build a converter from the config, resolving the credential.
    ///
    /// The key is taken from `config.api_key`, falling back to the
    /// `GEMINI_API_KEY` environment variable. Absence of both fails here —
    /// before any network I/O is attempted.
    pub fn from_config(config: &ConversionConfig) -> Result<Self, Kml2GeoError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()))
            .ok_or(Kml2GeoError::MissingCredential)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| Kml2GeoError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            max_source_chars: config.max_source_chars,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.api_base, self.model, self.api_key
        )
    }

    fn build_request(&self, source_text: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: conversion_prompt(source_text),
                }],
            }],
            system_instruction: GeminiContent {
                parts: vec![GeminiPart {
                    text: SYSTEM_INSTRUCTION.to_string(),
                }],
            },
            generation_config: GeminiGenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
                response_mime_type: "application/json",
            },
        }
    }
}

#[async_trait]
impl GeoConverter for GeminiConverter {
    async fn convert(&self, source_text: &str) -> Result<String, Kml2GeoError> {
        let (source_text, truncated) = truncate_source(source_text, self.max_source_chars);
        if truncated {
            debug!(
                "Source truncated to {} chars for the conversion request",
                self.max_source_chars
            );
        }

        let request = self.build_request(source_text);

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| Kml2GeoError::ServiceUnavailable {
                detail: if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(Kml2GeoError::AuthRejected {
                detail: api_error_message(&body).unwrap_or_else(|| format!("HTTP {status}")),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API error ({}): {}", status, body);
            return Err(Kml2GeoError::ServiceUnavailable {
                detail: api_error_message(&body)
                    .map(|m| format!("HTTP {status}: {m}"))
                    .unwrap_or_else(|| format!("HTTP {status}")),
            });
        }

        let parsed: GeminiResponse =
            response
                .json()
                .await
                .map_err(|e| Kml2GeoError::ServiceUnavailable {
                    detail: format!("unreadable response body: {e}"),
                })?;

        if let Some(err) = parsed.error {
            let is_auth = err.status == "UNAUTHENTICATED" || err.status == "PERMISSION_DENIED";
            return Err(if is_auth {
                Kml2GeoError::AuthRejected { detail: err.message }
            } else {
                Kml2GeoError::ServiceUnavailable { detail: err.message }
            });
        }

        let text: String = parsed
            .candidates
            .into_iter()
            .flatten()
            .filter_map(|c| c.content)
            .filter_map(|c| c.parts)
            .flatten()
            .filter_map(|p| p.text)
            .collect();

        if text.trim().is_empty() {
            return Err(Kml2GeoError::EmptyResponse);
        }

        Ok(text)
    }
}

/// Pull the `error.message` field out of an API error body, if present.
fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}
