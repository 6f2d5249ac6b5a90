//! Prompts for the KML-to-GeoJSON generation request.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the conversion instructions
//!    requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the exact request text
//!    without a live service call, making prompt regressions easy to catch.

/// System instruction constraining the service to emit a bare JSON object.
///
/// The "no markdown, no prose" wording matters: without it the model
/// routinely wraps output in code fences or a friendly sentence, which the
/// sanitiser then has to strip back out.
pub const SYSTEM_INSTRUCTION: &str = "You are a specialized geospatial data engineer. \
Your task is to convert KML data to valid GeoJSON. \
Output ONLY the raw JSON string. Do not include markdown formatting, explanations, \
or any text other than the GeoJSON object itself.";

/// Build the user prompt around (already truncated) KML source text.
pub fn conversion_prompt(kml: &str) -> String {
    format!(
        "Convert the following KML file content into a standard, valid GeoJSON format.\n\
         Ensure all coordinates and properties (like name, description, timestamps) are preserved.\n\
         Return ONLY the JSON object string.\n\n\
         KML content:\n{kml}"
    )
}
