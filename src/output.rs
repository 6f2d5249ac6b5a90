//! Output types returned by the conversion entry points.

use serde::{Deserialize, Serialize};

/// The result of one successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The validated GeoJSON text, byte-for-byte what the service produced
    /// (modulo the brace-bounded trim). Never re-serialised.
    pub geojson: String,

    /// Original file name as supplied by the caller.
    pub source_name: String,

    /// Output file name: the source name with its extension rewritten to `.json`.
    pub output_name: String,

    /// Whether the source was the compressed KMZ container.
    pub source_is_archive: bool,

    /// Timing and size statistics for the run.
    pub stats: ConversionStats,
}

/// Statistics describing one conversion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Characters of KML source handed to the conversion client.
    pub source_chars: usize,
    /// Whether the source exceeded the request budget and was truncated.
    pub source_truncated: bool,
    /// Characters in the validated GeoJSON document.
    pub response_chars: usize,
    /// Milliseconds spent extracting the KMZ member (0 for plain KML).
    pub extract_duration_ms: u64,
    /// Milliseconds spent in the generation-service call.
    pub convert_duration_ms: u64,
    /// End-to-end milliseconds for the whole attempt.
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_round_trips_through_json() {
        let out = ConversionOutput {
            geojson: r#"{"type":"FeatureCollection","features":[]}"#.into(),
            source_name: "trails.kml".into(),
            output_name: "trails.json".into(),
            source_is_archive: false,
            stats: ConversionStats {
                source_chars: 120,
                source_truncated: false,
                response_chars: 42,
                extract_duration_ms: 0,
                convert_duration_ms: 900,
                total_duration_ms: 910,
            },
        };
        let json = serde_json::to_string(&out).unwrap();
        let back: ConversionOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(back.output_name, "trails.json");
        assert_eq!(back.stats.convert_duration_ms, 900);
    }
}
