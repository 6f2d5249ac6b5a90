//! Pipeline stages for KML/KMZ-to-GeoJSON conversion.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap
//! implementations (e.g. a fake converter in tests) without touching other
//! stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ archive ──▶ llm ──▶ sanitize
//! (file)    (KMZ only)  (Gemini) (brace scan + parse)
//! ```
//!
//! 1. [`input`]    — classify `.kml`/`.kmz` by suffix and read the file
//! 2. [`archive`]  — locate and decode the single `.kml` member of a KMZ
//! 3. [`llm`]      — drive the generation-service call; the only stage with
//!    network I/O
//! 4. [`sanitize`] — isolate the brace-bounded object and validate that it
//!    parses

pub mod archive;
pub mod input;
pub mod llm;
pub mod sanitize;
