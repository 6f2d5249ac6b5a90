//! Map rendering: turn a validated GeoJSON document into an interactive,
//! auto-fitted Leaflet view.
//!
//! The split keeps everything that can be wrong *computable in Rust*:
//!
//! 1. [`geojson`] — defensive document walking and bounds accumulation
//! 2. [`popup`]   — per-feature popup HTML (escaped)
//! 3. [`surface`] — the persistent surface: one base layer, one swappable
//!    feature layer, viewport fitting with padding and a zoom ceiling
//! 4. [`page`]    — the self-contained HTML page that materialises a
//!    [`surface::RenderPlan`] in the browser
//!
//! The browser side is a thin projector: Leaflet receives a fully computed
//! plan (style, popups, viewport) and never re-derives any of it.

pub mod geojson;
pub mod page;
pub mod popup;
pub mod surface;

pub use surface::{MapSurface, RenderPlan, Viewport};
