//! The embedded verification app page.
//!
//! Served as a single static document; all dynamic state flows through the
//! JSON API. The map handling mirrors the surface's own rules client-side:
//! one Leaflet instance created lazily, one GeoJSON layer at a time, the
//! previous layer removed before the next is added.

pub const APP_PAGE_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>kml2geo — KML/KMZ to GeoJSON</title>

  <!-- Leaflet 1.9.4 -->
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css"
    crossorigin="anonymous" referrerpolicy="no-referrer" />
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"
    crossorigin="anonymous" referrerpolicy="no-referrer"></script>

  <style>
    body { margin: 0; font-family: system-ui, sans-serif; background: #f9fafb; color: #111827; }
    main { max-width: 880px; margin: 0 auto; padding: 24px 16px 64px; }
    h1 { font-size: 22px; }
    h2 { font-size: 17px; border-bottom: 2px solid #f3f4f6; padding-bottom: 4px; }
    section { margin-bottom: 28px; }
    input[type=file] {
      width: 100%; box-sizing: border-box; padding: 10px;
      border: 1px solid #e5e7eb; border-radius: 10px; background: #fff;
    }
    button {
      padding: 10px 18px; border: 0; border-radius: 10px; font-weight: 600;
      cursor: pointer; background: #3b82f6; color: #fff;
    }
    button:disabled { background: #d1d5db; cursor: not-allowed; }
    button.secondary { background: #eff6ff; color: #2563eb; }
    #convert { width: 100%; margin-top: 12px; padding: 14px; }
    .notice { padding: 12px 16px; border-radius: 10px; border: 1px solid; }
    .notice.idle { background: #fff7ed; border-color: #ffedd5; color: #9a3412; }
    .notice.loading { background: #eff6ff; border-color: #dbeafe; color: #1d4ed8; }
    .notice.error { background: #fef2f2; border-color: #fecaca; color: #991b1b; }
    .result-bar { display: flex; justify-content: space-between; align-items: center; margin: 8px 0; }
    .result-bar .name { font-family: ui-monospace, monospace; font-size: 13px; color: #6b7280; }
    .result-bar .actions { display: flex; gap: 8px; }
    pre {
      background: #111827; color: #93c5fd; padding: 18px; border-radius: 14px;
      overflow: auto; max-height: 320px; font-size: 12px;
    }
    #map {
      height: 450px; width: 100%; border-radius: 14px; border: 1px solid #e5e7eb;
      background: #f3f4f6;
    }
    .map-hint { font-size: 11px; color: #6b7280; margin-top: 4px; }
    .hidden { display: none; }
    .popup-title { margin: 0 0 4px; border-bottom: 1px solid #e5e7eb; }
    .popup-desc { margin: 0; font-size: 13px; }
    .popup-extras { margin-top: 6px; border-top: 1px solid #e5e7eb; padding-top: 4px; }
    .popup-extra { font-size: 10px; color: #6b7280; }
  </style>
</head>
<body>
<main>
  <h1>KML / KMZ → GeoJSON</h1>

  <section>
    <h2>File to convert</h2>
    <input type="file" id="file" accept=".kml,.kmz" />
    <button id="convert" disabled>Convert</button>
  </section>

  <section>
    <h2>Result</h2>
    <div id="status" class="notice idle">First select a file (.kml or .kmz) and click convert</div>
    <div id="result" class="hidden">
      <div class="result-bar">
        <span class="name" id="output-name"></span>
        <span class="actions">
          <button class="secondary" id="copy">Copy JSON</button>
          <button class="secondary" id="download">Download .json</button>
        </span>
      </div>
      <pre id="geojson"></pre>
    </div>
  </section>

  <section>
    <h2>Map preview</h2>
    <div id="map"></div>
    <div class="map-hint">Verify your KML/KMZ data visually</div>
  </section>
</main>

<script>
  const fileInput = document.getElementById('file');
  const convertBtn = document.getElementById('convert');
  const statusBox = document.getElementById('status');
  const resultBox = document.getElementById('result');
  const geojsonPre = document.getElementById('geojson');
  const outputName = document.getElementById('output-name');

  let map = null;
  let geoLayer = null;
  let pollTimer = null;

  fileInput.addEventListener('change', async () => {
    convertBtn.disabled = !fileInput.files.length;
    await fetch('/api/reset', { method: 'POST' });
    showStatus('idle', 'First select a file (.kml or .kmz) and click convert');
    resultBox.classList.add('hidden');
  });

  convertBtn.addEventListener('click', async () => {
    const file = fileInput.files[0];
    if (!file) return;

    convertBtn.disabled = true;
    const isKmz = file.name.toLowerCase().endsWith('.kmz');
    showStatus('loading', isKmz ? 'Extracting & Converting…' : 'Converting…');

    const bytes = await file.arrayBuffer();
    const resp = await fetch('/api/convert?name=' + encodeURIComponent(file.name), {
      method: 'POST',
      body: bytes
    });
    if (!resp.ok) {
      const body = await resp.json().catch(() => ({}));
      showStatus('error', body.error || 'Failed to start the conversion.');
      convertBtn.disabled = false;
      return;
    }
    pollTimer = setInterval(pollResult, 700);
  });

  async function pollResult() {
    const attempt = await (await fetch('/api/result')).json();
    if (attempt.status === 'loading') return;

    clearInterval(pollTimer);
    convertBtn.disabled = !fileInput.files.length;

    if (attempt.status === 'success') {
      statusBox.classList.add('hidden');
      resultBox.classList.remove('hidden');
      outputName.textContent = attempt.output_name;
      geojsonPre.textContent = attempt.result_document;
      await renderMap();
    } else if (attempt.status === 'error') {
      showStatus('error', attempt.error_message || 'An error occurred during conversion.');
      resultBox.classList.add('hidden');
    }
  }

  async function renderMap() {
    const plan = await (await fetch('/api/map')).json();
    if (!plan) return;

    if (!map) {
      map = L.map('map', { zoomControl: true, scrollWheelZoom: true });
      L.tileLayer(plan.base.tileUrl, { attribution: plan.base.attribution }).addTo(map);
      new ResizeObserver(() => map.invalidateSize())
        .observe(document.getElementById('map'));
    }
    map.setView([plan.viewport.lat, plan.viewport.lng], plan.viewport.zoom);

    if (geoLayer) map.removeLayer(geoLayer);

    let featureIndex = 0;
    geoLayer = L.geoJSON(plan.document, {
      style: plan.style,
      onEachFeature: (feature, layer) => {
        const popup = plan.popups[featureIndex++];
        if (popup) layer.bindPopup(popup);
      }
    }).addTo(map);
  }

  document.getElementById('copy').addEventListener('click', () => {
    navigator.clipboard.writeText(geojsonPre.textContent);
  });

  document.getElementById('download').addEventListener('click', () => {
    window.location.href = '/api/download';
  });

  function showStatus(kind, message) {
    statusBox.className = 'notice ' + kind;
    statusBox.textContent = message;
    statusBox.classList.remove('hidden');
  }
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_restricts_accepted_file_types() {
        assert!(APP_PAGE_HTML.contains(r#"accept=".kml,.kmz""#));
    }

    #[test]
    fn page_talks_to_the_api() {
        for endpoint in ["/api/convert", "/api/result", "/api/reset", "/api/map", "/api/download"] {
            assert!(APP_PAGE_HTML.contains(endpoint), "page must call {endpoint}");
        }
    }
}
