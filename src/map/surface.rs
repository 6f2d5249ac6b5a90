//! The persistent map surface.
//!
//! One surface outlives many successive documents: the base layer is created
//! lazily on the first render and reused forever after, and the feature
//! layer is a single-slot ownership handle — each successful render drops
//! the old layer and installs the new one, so layers never stack.
//!
//! A document that fails to parse leaves the surface exactly as it was: a
//! newer invalid document must not blank out the last good view. In practice
//! that path is unreachable for already-validated documents, but the surface
//! does not rely on its callers having validated anything.

use crate::error::Kml2GeoError;
use crate::map::geojson::{compute_bounds, features_of, Bounds};
use crate::map::page;
use crate::map::popup::popup_html;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Pixel padding kept around fitted bounds.
const FIT_PADDING_PX: f64 = 40.0;

/// Zoom ceiling for fitted viewports — prevents absurd zoom-in on
/// single-point documents.
const MAX_FIT_ZOOM: f64 = 16.0;

/// Tile size of the base layer, in pixels.
const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the Web-Mercator projection.
const MERCATOR_LAT_LIMIT: f64 = 85.051_128_78;

/// Camera state of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub lat: f64,
    pub lng: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    /// The initial whole-world view shown before any document renders.
    fn default() -> Self {
        Self {
            lat: 0.0,
            lng: 0.0,
            zoom: 2.0,
        }
    }
}

/// The base map: tile source plus attribution. Created once, lazily.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseLayer {
    pub tile_url: String,
    pub attribution: String,
}

impl BaseLayer {
    fn osm() -> Self {
        Self {
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: r#"&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> contributors"#.to_string(),
        }
    }
}

/// Uniform style applied to every feature geometry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStyle {
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    pub fill_color: String,
    pub fill_opacity: f64,
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            color: "#f97316".to_string(),
            weight: 4.0,
            opacity: 0.8,
            fill_color: "#fdba74".to_string(),
            fill_opacity: 0.4,
        }
    }
}

/// The renderable feature collection plus per-feature metadata.
#[derive(Debug, Clone)]
pub struct FeatureLayer {
    pub document: Value,
    /// Popup HTML per feature, index-aligned with the document's features.
    pub popups: Vec<Option<String>>,
    pub bounds: Bounds,
    pub style: LayerStyle,
}

/// Everything the browser needs to materialise the current surface state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPlan {
    pub base: BaseLayer,
    pub document: Value,
    pub popups: Vec<Option<String>>,
    pub style: LayerStyle,
    pub viewport: Viewport,
}

/// A long-lived interactive map surface.
pub struct MapSurface {
    base: Option<BaseLayer>,
    layer: Option<FeatureLayer>,
    viewport: Viewport,
    width_px: u32,
    height_px: u32,
}

impl Default for MapSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MapSurface {
    /// A fresh surface with the default container size (960×450 px, the
    /// served page's map panel) and a whole-world viewport.
    pub fn new() -> Self {
        Self {
            base: None,
            layer: None,
            viewport: Viewport::default(),
            width_px: 960,
            height_px: 450,
        }
    }

    /// Render a validated document onto the surface.
    ///
    /// Creates the base layer on the first call only, swaps the feature
    /// layer (never stacks), and fits the viewport to the new layer's
    /// bounds — unless the bounds are empty, in which case the viewport is
    /// left exactly where it was.
    ///
    /// On a parse failure the previous layer and viewport stay untouched
    /// and the error is returned for logging.
    pub fn update(&mut self, document_text: &str) -> Result<(), Kml2GeoError> {
        if self.base.is_none() {
            self.base = Some(BaseLayer::osm());
        }

        let document: Value = match serde_json::from_str(document_text) {
            Ok(v) => v,
            Err(e) => {
                warn!("Map render skipped, document does not parse: {e}");
                return Err(Kml2GeoError::MalformedGeoJson {
                    detail: e.to_string(),
                });
            }
        };

        let popups = features_of(&document).iter().map(|f| popup_html(f)).collect();
        let bounds = compute_bounds(&document);

        if bounds.is_valid() {
            self.viewport = fit_bounds(&bounds, self.width_px, self.height_px);
        }

        // single-slot swap: the previous layer is dropped here
        self.layer = Some(FeatureLayer {
            document,
            popups,
            bounds,
            style: LayerStyle::default(),
        });

        Ok(())
    }

    /// Recompute the surface's size after its container changed.
    ///
    /// Affects how future documents are fitted; the current viewport is not
    /// re-fitted retroactively.
    pub fn invalidate_size(&mut self, width_px: u32, height_px: u32) {
        self.width_px = width_px.max(1);
        self.height_px = height_px.max(1);
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The current feature layer, if any document has rendered yet.
    pub fn feature_layer(&self) -> Option<&FeatureLayer> {
        self.layer.as_ref()
    }

    /// Whether the base layer has been created yet.
    pub fn has_base_layer(&self) -> bool {
        self.base.is_some()
    }

    /// The plan the browser materialises, or `None` before the first
    /// successful render.
    pub fn render_plan(&self) -> Option<RenderPlan> {
        let layer = self.layer.as_ref()?;
        let base = self.base.clone()?;
        Some(RenderPlan {
            base,
            document: layer.document.clone(),
            popups: layer.popups.clone(),
            style: layer.style.clone(),
            viewport: self.viewport,
        })
    }

    /// A standalone, self-contained HTML page showing the current surface.
    pub fn render_page(&self, title: &str) -> Option<String> {
        self.render_plan().map(|plan| page::render_map_page(title, &plan))
    }
}

/// Fit `bounds` into a `width_px`×`height_px` viewport.
///
/// Web-Mercator: find the largest integer zoom at which the padded bounds
/// fit, clamped to `[0, MAX_FIT_ZOOM]`. Degenerate (point) extents land on
/// the ceiling rather than diverging.
fn fit_bounds(bounds: &Bounds, width_px: u32, height_px: u32) -> Viewport {
    let (x_min, y_top) = project(bounds.min_lng, bounds.max_lat);
    let (x_max, y_bottom) = project(bounds.max_lng, bounds.min_lat);

    let dx = (x_max - x_min).max(0.0);
    let dy = (y_bottom - y_top).max(0.0);

    let usable_w = (width_px as f64 - 2.0 * FIT_PADDING_PX).max(1.0);
    let usable_h = (height_px as f64 - 2.0 * FIT_PADDING_PX).max(1.0);

    let zoom_x = if dx > 0.0 {
        (usable_w / (TILE_SIZE * dx)).log2()
    } else {
        f64::INFINITY
    };
    let zoom_y = if dy > 0.0 {
        (usable_h / (TILE_SIZE * dy)).log2()
    } else {
        f64::INFINITY
    };

    let zoom = zoom_x.min(zoom_y).floor().clamp(0.0, MAX_FIT_ZOOM);

    Viewport {
        lat: unproject_lat((y_top + y_bottom) / 2.0),
        lng: (bounds.min_lng + bounds.max_lng) / 2.0,
        zoom,
    }
}

/// Project to normalised Web-Mercator world coordinates in `[0, 1]`.
fn project(lng: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MERCATOR_LAT_LIMIT, MERCATOR_LAT_LIMIT);
    let x = (lng + 180.0) / 360.0;
    let sin = lat.to_radians().sin();
    let y = 0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * std::f64::consts::PI);
    (x, y)
}

/// Latitude of a normalised Web-Mercator `y`.
fn unproject_lat(y: f64) -> f64 {
    (std::f64::consts::PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees()
}
