//! KMZ extraction: locate and decode the single KML member of the container.
//!
//! Extraction is fully in-memory — a KMZ is small enough that spilling to a
//! temp directory buys nothing, and the extracted text is owned exclusively
//! by the in-flight attempt anyway.

use crate::error::Kml2GeoError;
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

/// A single document found inside a KMZ container.
#[derive(Debug, Clone)]
pub struct ExtractedEntry {
    /// Path of the member inside the archive.
    pub entry_name: String,
    /// Decoded text content.
    pub content: String,
}

/// Extract the annotation document from KMZ container bytes.
///
/// Selection rule: the first member (in the archive's stable enumeration
/// order) whose name ends in `.kml`, case-insensitively. Directories never
/// match. Auxiliary assets (icons, overlays) are ignored.
pub fn extract_kml(container: &[u8], archive_name: &str) -> Result<ExtractedEntry, Kml2GeoError> {
    let mut archive =
        ZipArchive::new(Cursor::new(container)).map_err(|e| Kml2GeoError::CorruptArchive {
            detail: e.to_string(),
        })?;

    let entry_index = (0..archive.len()).find(|&i| {
        archive
            .by_index(i)
            .map(|f| !f.is_dir() && f.name().to_ascii_lowercase().ends_with(".kml"))
            .unwrap_or(false)
    });

    let Some(index) = entry_index else {
        return Err(Kml2GeoError::NoKmlEntry {
            archive: archive_name.to_string(),
        });
    };

    let mut entry = archive
        .by_index(index)
        .map_err(|e| Kml2GeoError::CorruptArchive {
            detail: e.to_string(),
        })?;
    let entry_name = entry.name().to_string();

    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| Kml2GeoError::CorruptArchive {
            detail: format!("failed to read member '{entry_name}': {e}"),
        })?;

    let content = String::from_utf8(bytes).map_err(|e| Kml2GeoError::CorruptEntry {
        entry: entry_name.clone(),
        detail: e.to_string(),
    })?;

    debug!("Extracted '{}' ({} chars) from {}", entry_name, content.len(), archive_name);

    Ok(ExtractedEntry {
        entry_name,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build_kmz(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in members {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn extracts_single_matching_entry_unchanged() {
        let kml = "<kml><Placemark><name>Ridge Loop</name></Placemark></kml>";
        let kmz = build_kmz(&[("doc.kml", kml.as_bytes()), ("icon.png", b"\x89PNG")]);

        let entry = extract_kml(&kmz, "trails.kmz").unwrap();
        assert_eq!(entry.entry_name, "doc.kml");
        assert_eq!(entry.content, kml);
    }

    #[test]
    fn selection_is_first_in_enumeration_order() {
        let kmz = build_kmz(&[
            ("assets/readme.txt", b"hi"),
            ("first.kml", b"<kml>first</kml>"),
            ("second.kml", b"<kml>second</kml>"),
        ]);

        let entry = extract_kml(&kmz, "x.kmz").unwrap();
        assert_eq!(entry.entry_name, "first.kml");
        assert_eq!(entry.content, "<kml>first</kml>");
    }

    #[test]
    fn suffix_match_is_case_insensitive() {
        let kmz = build_kmz(&[("DOC.KML", b"<kml/>")]);
        assert_eq!(extract_kml(&kmz, "x.kmz").unwrap().entry_name, "DOC.KML");
    }

    #[test]
    fn no_matching_member_is_a_dedicated_error() {
        let kmz = build_kmz(&[("overlay.png", b"\x89PNG"), ("notes.txt", b"n/a")]);
        let err = extract_kml(&kmz, "parks.kmz").unwrap_err();
        assert!(matches!(err, Kml2GeoError::NoKmlEntry { ref archive } if archive == "parks.kmz"));
    }

    #[test]
    fn garbage_bytes_are_a_corrupt_archive() {
        let err = extract_kml(b"this is not a zip file", "bad.kmz").unwrap_err();
        assert!(matches!(err, Kml2GeoError::CorruptArchive { .. }));
    }

    #[test]
    fn non_utf8_member_is_a_corrupt_entry() {
        let kmz = build_kmz(&[("doc.kml", &[0xff, 0xfe, 0x00, 0x41][..])]);
        let err = extract_kml(&kmz, "x.kmz").unwrap_err();
        assert!(matches!(err, Kml2GeoError::CorruptEntry { ref entry, .. } if entry == "doc.kml"));
    }

    #[test]
    fn nested_member_paths_match() {
        let kmz = build_kmz(&[("files/doc.kml", b"<kml/>")]);
        assert_eq!(
            extract_kml(&kmz, "x.kmz").unwrap().entry_name,
            "files/doc.kml"
        );
    }
}
