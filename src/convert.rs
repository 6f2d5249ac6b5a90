//! Conversion entry points: the orchestrator that composes the pipeline.
//!
//! One attempt runs the stages strictly in sequence — classify, extract
//! (KMZ only), convert via the generation service, sanitise — and no partial
//! result ever survives a failure: the first classified error wins and all
//! intermediate text is dropped.

use crate::config::ConversionConfig;
use crate::error::Kml2GeoError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::llm::{GeminiConverter, GeoConverter};
use crate::pipeline::{archive, input, sanitize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Convert a KML or KMZ file to GeoJSON.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Every failure is classified (see [`Kml2GeoError`]) and terminal for the
/// attempt — nothing in the pipeline retries automatically.
pub async fn convert(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Kml2GeoError> {
    let path = input_path.as_ref();
    let (name, bytes) = input::read_source(path).await?;
    convert_bytes(&name, &bytes, config).await
}

/// Convert in-memory file bytes to GeoJSON.
///
/// `source_name` decides the archive/plain classification (suffix only, no
/// content sniffing) and the derived output name. This is the API the
/// verification server feeds uploads through.
pub async fn convert_bytes(
    source_name: &str,
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<ConversionOutput, Kml2GeoError> {
    let total_start = Instant::now();

    // ── Step 1: Classify by filename suffix ──────────────────────────────
    if !input::is_supported_name(source_name) {
        return Err(Kml2GeoError::UnsupportedExtension {
            name: source_name.to_string(),
        });
    }
    let source_is_archive = input::is_archive_name(source_name);
    info!(
        "Starting conversion: {} ({})",
        source_name,
        if source_is_archive { "KMZ" } else { "KML" }
    );

    // ── Step 2/3: Extract or decode the source text ──────────────────────
    let extract_start = Instant::now();
    let source_text = if source_is_archive {
        archive::extract_kml(bytes, source_name)?.content
    } else {
        // Plain KML is decoded leniently, matching how a browser file reader
        // would; structural problems surface at the conversion stage.
        String::from_utf8_lossy(bytes).into_owned()
    };
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

    if source_text.trim().is_empty() {
        return Err(Kml2GeoError::EmptyFile {
            name: source_name.to_string(),
        });
    }

    let source_chars = source_text.chars().count();
    debug!("Source text: {} chars", source_chars);

    // ── Step 4: Run the conversion client ────────────────────────────────
    let converter = resolve_converter(config)?;
    let convert_start = Instant::now();
    let raw_response = converter.convert(&source_text).await?;
    let convert_duration_ms = convert_start.elapsed().as_millis() as u64;

    // ── Step 5: Sanitise and validate the response ───────────────────────
    let geojson = sanitize::sanitize(&raw_response)?;

    // ── Step 6: Assemble the output ──────────────────────────────────────
    let output_name = input::output_name(source_name);
    let stats = ConversionStats {
        source_chars,
        source_truncated: source_chars > config.max_source_chars,
        response_chars: geojson.chars().count(),
        extract_duration_ms,
        convert_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} -> {} ({} chars, {}ms)",
        source_name, output_name, stats.response_chars, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        geojson,
        source_name: source_name.to_string(),
        output_name,
        source_is_archive,
        stats,
    })
}

/// Convert a file and write the GeoJSON directly to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Kml2GeoError> {
    let output = convert(input_path, config).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Kml2GeoError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &output.geojson)
        .await
        .map_err(|e| Kml2GeoError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Kml2GeoError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Kml2GeoError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Kml2GeoError::Internal(format!("failed to create tokio runtime: {e}")))?
        .block_on(convert(input_path, config))
}

/// Resolve the converter, from most-specific to least-specific.
///
/// 1. **Pre-built converter** (`config.converter`) — the caller constructed
///    the capability entirely; used as-is. This is how tests inject a
///    deterministic fake.
/// 2. **Gemini client** — built from `config.api_key` / `GEMINI_API_KEY`;
///    a missing credential fails here, before any network I/O.
pub fn resolve_converter(
    config: &ConversionConfig,
) -> Result<Arc<dyn GeoConverter>, Kml2GeoError> {
    if let Some(ref converter) = config.converter {
        return Ok(Arc::clone(converter));
    }
    Ok(Arc::new(GeminiConverter::from_config(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoConverter(String);

    #[async_trait]
    impl GeoConverter for EchoConverter {
        async fn convert(&self, _source_text: &str) -> Result<String, Kml2GeoError> {
            Ok(self.0.clone())
        }
    }

    fn config_with(response: &str) -> ConversionConfig {
        ConversionConfig::builder()
            .converter(Arc::new(EchoConverter(response.to_string())))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected_up_front() {
        let config = config_with("{}");
        let err = convert_bytes("notes.txt", b"hello", &config)
            .await
            .unwrap_err();
        assert!(matches!(err, Kml2GeoError::UnsupportedExtension { .. }));
    }

    #[tokio::test]
    async fn empty_plain_file_is_rejected() {
        let config = config_with("{}");
        let err = convert_bytes("trails.kml", b"   \n", &config)
            .await
            .unwrap_err();
        assert!(matches!(err, Kml2GeoError::EmptyFile { ref name } if name == "trails.kml"));
    }

    #[tokio::test]
    async fn failure_surfaces_no_partial_result() {
        // converter answers, sanitiser rejects; the caller sees only the error
        let config = config_with("no braces here");
        let err = convert_bytes("trails.kml", b"<kml/>", &config)
            .await
            .unwrap_err();
        assert!(matches!(err, Kml2GeoError::NoJsonObjectFound));
    }

    #[tokio::test]
    async fn output_name_rewrites_the_extension() {
        let config = config_with(r#"{"type":"FeatureCollection","features":[]}"#);
        let out = convert_bytes("trails.kml", b"<kml/>", &config).await.unwrap();
        assert_eq!(out.output_name, "trails.json");
        assert!(!out.source_is_archive);
        assert!(!out.stats.source_truncated);
    }

    #[test]
    fn prebuilt_converter_takes_precedence() {
        let config = config_with("{}");
        // resolves without a credential because the injected capability wins
        assert!(resolve_converter(&config).is_ok());
    }
}
