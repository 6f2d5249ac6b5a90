//! Input classification and reading.
//!
//! The archive/plain decision is made from the filename suffix alone — never
//! from content sniffing — so a mislabelled file fails loudly in the stage
//! that actually consumes it rather than being silently reinterpreted.

use crate::error::Kml2GeoError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Matches a `.kml` or `.kmz` suffix, case-insensitively.
static RE_SOURCE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.(kml|kmz)$").unwrap());

/// True when the name carries the compressed-container suffix.
pub fn is_archive_name(name: &str) -> bool {
    has_suffix(name, ".kmz")
}

/// True when the name carries either accepted suffix.
pub fn is_supported_name(name: &str) -> bool {
    has_suffix(name, ".kml") || has_suffix(name, ".kmz")
}

fn has_suffix(name: &str, suffix: &str) -> bool {
    let Some(start) = name.len().checked_sub(suffix.len()) else {
        return false;
    };
    // a non-boundary index means the tail is multi-byte, never an ASCII suffix
    name.is_char_boundary(start) && name[start..].eq_ignore_ascii_case(suffix)
}

/// Derive the output file name by rewriting the source extension to `.json`.
///
/// Inputs reaching this point always match the suffix regex (the orchestrator
/// rejects anything else up front); the append branch is defensive only.
pub fn output_name(source_name: &str) -> String {
    if RE_SOURCE_SUFFIX.is_match(source_name) {
        RE_SOURCE_SUFFIX.replace(source_name, ".json").into_owned()
    } else {
        format!("{source_name}.json")
    }
}

/// Read the source file, mapping I/O failures to classified errors.
pub async fn read_source(path: &Path) -> Result<(String, Vec<u8>), Kml2GeoError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Kml2GeoError::FileNotFound {
            path: path.to_path_buf(),
        })?;

    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Kml2GeoError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Kml2GeoError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    Ok((name, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_classification_is_case_insensitive() {
        assert!(is_archive_name("parks.kmz"));
        assert!(is_archive_name("PARKS.KMZ"));
        assert!(!is_archive_name("trails.kml"));
        assert!(!is_archive_name("notes.txt"));
        assert!(!is_archive_name("kmz")); // suffix, not a bare name
    }

    #[test]
    fn supported_names() {
        assert!(is_supported_name("trails.kml"));
        assert!(is_supported_name("Trails.KML"));
        assert!(is_supported_name("parks.kmz"));
        assert!(!is_supported_name("trails.json"));
        assert!(!is_supported_name("trails.kml.bak"));
    }

    #[test]
    fn non_ascii_names_never_panic() {
        assert!(is_supported_name("経路.kml"));
        assert!(is_archive_name("公園.kmz"));
        assert!(!is_supported_name("日本"));
        assert!(!is_supported_name("éz"));
        assert_eq!(output_name("経路.kml"), "経路.json");
    }

    #[test]
    fn output_name_rewrites_extension() {
        assert_eq!(output_name("trails.kml"), "trails.json");
        assert_eq!(output_name("parks.kmz"), "parks.json");
        assert_eq!(output_name("UPPER.KML"), "UPPER.json");
        // dots earlier in the name are untouched
        assert_eq!(output_name("hike.v2.kml"), "hike.v2.json");
    }

    #[test]
    fn output_name_appends_for_unmatched_suffix() {
        assert_eq!(output_name("weird"), "weird.json");
    }

    #[tokio::test]
    async fn read_source_maps_missing_file() {
        let err = read_source(Path::new("/definitely/not/here.kml"))
            .await
            .unwrap_err();
        assert!(matches!(err, Kml2GeoError::FileNotFound { .. }));
    }
}
