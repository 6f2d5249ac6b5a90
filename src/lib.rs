//! # kml2geo
//!
//! Convert KML/KMZ geographic annotations to GeoJSON using an LLM, and
//! verify the result on an interactive map.
//!
//! ## Why this crate?
//!
//! KML in the wild is messy — vendor extensions, nested folders, styles
//! interleaved with geometry. Instead of chasing every dialect with a local
//! parser, this crate hands the structural mapping to a generation service
//! (Google Gemini) and spends its own effort where determinism pays off:
//! strict response validation, a race-safe result lifecycle, and a map
//! renderer for eyeballing the output before trusting it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! KML / KMZ
//!  │
//!  ├─ 1. Input     classify by suffix, read bytes
//!  ├─ 2. Extract   KMZ only: first .kml member, in memory
//!  ├─ 3. Convert   one Gemini generateContent call (temperature 0.1)
//!  ├─ 4. Sanitise  first '{' … last '}' + JSON parse
//!  └─ 5. Output    trails.kml → trails.json, map render plan
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kml2geo::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential from GEMINI_API_KEY
//!     let config = ConversionConfig::default();
//!     let output = convert("trails.kml", &config).await?;
//!     println!("{}", output.geojson);
//!     eprintln!("{} -> {} in {}ms",
//!         output.source_name, output.output_name, output.stats.total_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! Or run the verification UI and convert in the browser:
//!
//! ```text
//! kml2geo serve --port 8080
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `kml2geo` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! kml2geo = { version = "0.3", default-features = false }
//! ```
//!
//! ## Testing without the service
//!
//! The conversion capability is an injectable trait: put any
//! [`GeoConverter`] into [`ConversionConfig::converter`] and the pipeline
//! runs deterministically with no network access.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod map;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod server;
pub mod state;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert, convert_bytes, convert_sync, convert_to_file};
pub use error::Kml2GeoError;
pub use map::{MapSurface, RenderPlan};
pub use output::{ConversionOutput, ConversionStats};
pub use pipeline::llm::{GeminiConverter, GeoConverter};
pub use state::{AttemptTracker, ConversionAttempt, ConversionStatus};
