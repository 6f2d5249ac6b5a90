//! Error types for the kml2geo library.
//!
//! A single [`Kml2GeoError`] covers the whole pipeline: every variant is a
//! classified, user-facing failure that terminates the current conversion
//! attempt. There is deliberately no retryable/non-retryable split and no
//! automatic retry anywhere — a failed attempt resolves to the Error state
//! and waits for the user to re-convert (or fix their file, credential, or
//! environment first).
//!
//! Variant grouping mirrors the pipeline stages: input, archive extraction,
//! the generation-service call, response sanitisation, and output I/O.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the kml2geo library.
#[derive(Debug, Error)]
pub enum Kml2GeoError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The input is neither a `.kml` nor a `.kmz` file.
    #[error("Unsupported file type: '{name}'\nOnly .kml and .kmz files are accepted.")]
    UnsupportedExtension { name: String },

    /// The input file decoded to an empty string.
    #[error("File '{name}' is empty — nothing to convert.")]
    EmptyFile { name: String },

    // ── Archive errors ────────────────────────────────────────────────────
    /// The KMZ archive contains no `.kml` member.
    #[error("No KML file found inside the KMZ archive '{archive}'.")]
    NoKmlEntry { archive: String },

    /// The KMZ container could not be read as a zip archive.
    #[error("Failed to extract KMZ archive: {detail}")]
    CorruptArchive { detail: String },

    /// A `.kml` member exists but its bytes are not valid text.
    #[error("KMZ member '{entry}' is not valid UTF-8 text: {detail}")]
    CorruptEntry { entry: String, detail: String },

    // ── Generation-service errors ─────────────────────────────────────────
    /// No API key configured — checked before any network I/O.
    #[error(
        "GEMINI_API_KEY is not set.\n\
         Get an API key from https://ai.google.dev/ and export it, or pass --api-key."
    )]
    MissingCredential,

    /// The service rejected the configured credential (HTTP 401/403).
    #[error("The generation service rejected the API key: {detail}\nCheck the credential and its permissions.")]
    AuthRejected { detail: String },

    /// Transport failure, timeout, or a service-side error.
    #[error("The generation service is unavailable: {detail}\nTry again later.")]
    ServiceUnavailable { detail: String },

    /// The service answered but produced no text.
    #[error("The generation service returned an empty response. Try again.")]
    EmptyResponse,

    // ── Sanitiser errors ──────────────────────────────────────────────────
    /// No `{…}` span could be located in the response text.
    #[error(
        "The service did not return a JSON object.\n\
         Try again, or check that the input is a valid KML file."
    )]
    NoJsonObjectFound,

    /// A candidate object was found but does not parse as JSON.
    #[error("The service produced invalid GeoJSON: {detail}\nTry again.")]
    MalformedGeoJson { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error. Still resolves the attempt to Error —
    /// never leaves the state machine stuck in Loading.
    #[error("Internal error: {0}")]
    Internal(String),
}
