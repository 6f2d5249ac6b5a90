//! Standalone map page generation.
//!
//! The page is fully self-contained: Leaflet from a CDN, the render plan
//! inlined as a JSON literal, and a small projector script that applies it.
//! No server is needed to open the result in a browser.

use crate::map::surface::RenderPlan;

const MAP_PAGE_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>__TITLE__</title>

  <!-- Leaflet 1.9.4 -->
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css"
    crossorigin="anonymous" referrerpolicy="no-referrer" />
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"
    crossorigin="anonymous" referrerpolicy="no-referrer"></script>

  <style>
    html, body { height: 100%; margin: 0; font-family: system-ui, sans-serif; }
    #map { height: 100%; width: 100%; background: #f3f4f6; }
    .map-hint {
      position: absolute; bottom: 8px; left: 8px; z-index: 1000;
      background: rgba(255, 255, 255, 0.85); border: 1px solid #e5e7eb;
      border-radius: 4px; padding: 2px 8px; font-size: 10px; color: #6b7280;
      pointer-events: none;
    }
    .popup-title { margin: 0 0 4px; border-bottom: 1px solid #e5e7eb; }
    .popup-desc { margin: 0; font-size: 13px; }
    .popup-extras { margin-top: 6px; border-top: 1px solid #e5e7eb; padding-top: 4px; }
    .popup-extra { font-size: 10px; color: #6b7280; }
  </style>
</head>
<body>
  <div id="map"></div>
  <div class="map-hint">Verify your KML/KMZ data visually</div>

  <script>
    const PLAN = __PLAN_JSON__;

    const map = L.map('map', { zoomControl: true, scrollWheelZoom: true })
      .setView([PLAN.viewport.lat, PLAN.viewport.lng], PLAN.viewport.zoom);

    L.tileLayer(PLAN.base.tileUrl, { attribution: PLAN.base.attribution }).addTo(map);

    let featureIndex = 0;
    L.geoJSON(PLAN.document, {
      style: PLAN.style,
      onEachFeature: (feature, layer) => {
        const popup = PLAN.popups[featureIndex++];
        if (popup) layer.bindPopup(popup);
      }
    }).addTo(map);

    new ResizeObserver(() => map.invalidateSize())
      .observe(document.getElementById('map'));
  </script>
</body>
</html>
"#;

/// Render a self-contained HTML page for a computed plan.
pub fn render_map_page(title: &str, plan: &RenderPlan) -> String {
    let plan_json = serde_json::to_string(plan)
        .unwrap_or_else(|_| "null".to_string())
        // keep any '</script>' inside popup strings from closing our tag
        .replace("</", "<\\/");

    MAP_PAGE_TEMPLATE
        .replace("__TITLE__", &crate::map::popup::html_escape(title))
        .replace("__PLAN_JSON__", &plan_json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MapSurface;

    fn page_for(doc: &str) -> String {
        let mut surface = MapSurface::new();
        surface.update(doc).unwrap();
        surface.render_page("trails.json").unwrap()
    }

    #[test]
    fn page_embeds_plan_and_title() {
        let page = page_for(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"name":"Ridge Loop"},
                 "geometry":{"type":"Point","coordinates":[-122.4,37.8]}}]}"#,
        );
        assert!(page.contains("<title>trails.json</title>"));
        assert!(page.contains("Ridge Loop"));
        assert!(page.contains("tile.openstreetmap.org"));
        assert!(page.contains("L.geoJSON"));
    }

    #[test]
    fn script_close_sequences_are_neutralised() {
        let page = page_for(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"name":"x</script><script>alert(1)"},
                 "geometry":{"type":"Point","coordinates":[0,0]}}]}"#,
        );
        // the popup value must not be able to close the inline script block
        let plan_start = page.find("const PLAN").unwrap();
        let plan_line_end = page[plan_start..].find('\n').unwrap() + plan_start;
        assert!(!page[plan_start..plan_line_end].contains("</script>"));
    }

    #[test]
    fn title_is_escaped() {
        let mut surface = MapSurface::new();
        surface
            .update(r#"{"type":"FeatureCollection","features":[]}"#)
            .unwrap();
        let page = surface.render_page("<evil>").unwrap();
        assert!(page.contains("<title>&lt;evil&gt;</title>"));
    }
}
