//! Response sanitisation: isolate the JSON object and confirm it parses.
//!
//! ## Why a brace scan?
//!
//! Even with a system instruction demanding a bare object and a JSON
//! response-type hint, generation services occasionally wrap output in prose
//! or code fences. Scanning from the first `{` to the last `}` is robust to
//! leading/trailing noise without requiring exact-format compliance.
//!
//! The known limit of this policy: a `{…}` quoted in prose *before* the real
//! payload would shift the span start. The service contract makes that shape
//! unexpected, and tightening the scan would change the contract — so the
//! policy stays as is.

use crate::error::Kml2GeoError;

/// Isolate the brace-bounded candidate from raw response text and validate
/// that it parses as JSON.
///
/// On success the candidate substring is returned **unchanged** — byte-for-
/// byte what the service produced, never re-serialised. This keeps the
/// downloadable document identical to what was validated.
///
/// Idempotent: sanitising an already-sanitised document returns it as is.
pub fn sanitize(raw: &str) -> Result<String, Kml2GeoError> {
    let start = raw.find('{');
    let end = raw.rfind('}');

    let candidate = match (start, end) {
        (Some(s), Some(e)) if e >= s => &raw[s..=e],
        _ => return Err(Kml2GeoError::NoJsonObjectFound),
    };

    if let Err(e) = serde_json::from_str::<serde_json::Value>(candidate) {
        return Err(Kml2GeoError::MalformedGeoJson {
            detail: e.to_string(),
        });
    }

    Ok(candidate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE: &str = r#"{"type":"FeatureCollection","features":[]}"#;

    #[test]
    fn bare_object_passes_through_unchanged() {
        assert_eq!(sanitize(BARE).unwrap(), BARE);
    }

    #[test]
    fn prose_and_fence_noise_is_trimmed() {
        let raw = format!("Sure! Here's your GeoJSON: {BARE} Hope that helps!");
        assert_eq!(sanitize(&raw).unwrap(), BARE);

        let fenced = format!("```json\n{BARE}\n```");
        assert_eq!(sanitize(&fenced).unwrap(), BARE);
    }

    #[test]
    fn recovered_span_is_exactly_first_to_last_brace() {
        // inner braces belong to the candidate, not the noise
        let raw = r#"note {"a":{"b":1}} done"#;
        assert_eq!(sanitize(raw).unwrap(), r#"{"a":{"b":1}}"#);
    }

    #[test]
    fn sanitisation_is_idempotent() {
        let raw = format!("prefix {BARE} suffix");
        let once = sanitize(&raw).unwrap();
        let twice = sanitize(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_braces_are_no_object_found() {
        for raw in ["no braces at all", "only { open", "only } close", ""] {
            let err = sanitize(raw).unwrap_err();
            assert!(
                matches!(err, Kml2GeoError::NoJsonObjectFound),
                "input {raw:?} should yield NoJsonObjectFound"
            );
        }
    }

    #[test]
    fn close_before_open_is_no_object_found() {
        let err = sanitize("} then {").unwrap_err();
        assert!(matches!(err, Kml2GeoError::NoJsonObjectFound));
    }

    #[test]
    fn unparseable_candidate_is_malformed() {
        let err = sanitize(r#"text {"type": "Feature", } text"#).unwrap_err();
        match err {
            Kml2GeoError::MalformedGeoJson { detail } => {
                assert!(!detail.is_empty(), "parser detail must be carried");
            }
            other => panic!("expected MalformedGeoJson, got {other:?}"),
        }
    }

    #[test]
    fn document_is_not_reserialised() {
        // unusual-but-valid whitespace must survive byte-for-byte
        let raw = "x {\n  \"a\":\t1\n} y";
        assert_eq!(sanitize(raw).unwrap(), "{\n  \"a\":\t1\n}");
    }
}
