//! Configuration types for KML-to-GeoJSON conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across tasks and to diff two runs when their
//! outputs differ.
//!
//! # Design choice: builder over constructor
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest.

use crate::error::Kml2GeoError;
use crate::pipeline::llm::GeoConverter;
use std::fmt;
use std::sync::Arc;

/// Default Gemini model id, matching the service the converter was built for.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Default base URL of the Gemini REST API.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Configuration for a KML/KMZ-to-GeoJSON conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use kml2geo::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .model("gemini-3-flash-preview")
///     .max_source_chars(50_000)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Gemini model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// API key for the generation service.
    ///
    /// If `None`, the `GEMINI_API_KEY` environment variable is consulted at
    /// conversion time; absence of both fails with
    /// [`Kml2GeoError::MissingCredential`] before any network call.
    pub api_key: Option<String>,

    /// Base URL of the generation service. Default: [`DEFAULT_API_BASE`].
    ///
    /// Overridable so a proxy or mock endpoint can stand in for the real
    /// service without touching the converter.
    pub api_base: String,

    /// Sampling temperature for the completion. Default: 0.1.
    ///
    /// Low temperature keeps the model deterministic and faithful to the
    /// source structure — exactly what a format transformation wants.
    pub temperature: f32,

    /// Maximum number of source characters sent to the service. Default: 50 000.
    ///
    /// Longer inputs are truncated silently (on a char boundary) to bound
    /// request size. Truncation is a size policy, never an error.
    pub max_source_chars: usize,

    /// Maximum tokens the model may generate. Default: 8192.
    ///
    /// GeoJSON for a dense KML can run long; setting this too low truncates
    /// the object mid-structure and fails validation downstream.
    pub max_output_tokens: u32,

    /// Per-request timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Pre-constructed converter. Takes precedence over the Gemini client.
    ///
    /// This is the injection seam for tests and custom backends: anything
    /// implementing [`GeoConverter`] slots in here and the pipeline never
    /// touches the network.
    pub converter: Option<Arc<dyn GeoConverter>>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            temperature: 0.1,
            max_source_chars: 50_000,
            max_output_tokens: 8192,
            api_timeout_secs: 120,
            converter: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("temperature", &self.temperature)
            .field("max_source_chars", &self.max_source_chars)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("converter", &self.converter.as_ref().map(|_| "<dyn GeoConverter>"))
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = base.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_source_chars(mut self, n: usize) -> Self {
        self.config.max_source_chars = n.max(1);
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = n.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn converter(mut self, converter: Arc<dyn GeoConverter>) -> Self {
        self.config.converter = Some(converter);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Kml2GeoError> {
        let c = &self.config;
        if c.model.is_empty() {
            return Err(Kml2GeoError::InvalidConfig("model must not be empty".into()));
        }
        if !(c.api_base.starts_with("http://") || c.api_base.starts_with("https://")) {
            return Err(Kml2GeoError::InvalidConfig(format!(
                "api_base must be an HTTP(S) URL, got '{}'",
                c.api_base
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let c = ConversionConfig::default();
        assert_eq!(c.model, DEFAULT_MODEL);
        assert_eq!(c.temperature, 0.1);
        assert_eq!(c.max_source_chars, 50_000);
        assert!(c.converter.is_none());
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = ConversionConfig::builder()
            .temperature(9.0)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn builder_rejects_non_http_base() {
        let err = ConversionConfig::builder()
            .api_base("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, Kml2GeoError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_empty_model() {
        let err = ConversionConfig::builder().model("").build().unwrap_err();
        assert!(matches!(err, Kml2GeoError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = ConversionConfig::builder().api_key("secret-key").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret-key"));
        assert!(dbg.contains("redacted"));
    }
}
