//! Per-feature popup content.
//!
//! `name` becomes the title, `description` the body, and every remaining
//! property an auxiliary key/value row. All values pass through HTML
//! escaping — popup content comes straight from a generated document and is
//! untrusted.

use serde_json::Value;

/// Escape HTML special characters for safe rendering.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Build the popup HTML for one feature.
///
/// Returns `None` for features without a `properties` object (or with
/// nothing renderable in it) — such features get no popup at all rather than
/// an empty shell.
pub fn popup_html(feature: &Value) -> Option<String> {
    let props = feature.get("properties")?.as_object()?;

    let mut html = String::from(r#"<div class="popup">"#);
    let mut rendered = false;

    if let Some(name) = props.get("name").and_then(Value::as_str) {
        html.push_str(&format!(r#"<h4 class="popup-title">{}</h4>"#, html_escape(name)));
        rendered = true;
    }
    if let Some(description) = props.get("description").and_then(Value::as_str) {
        html.push_str(&format!(r#"<p class="popup-desc">{}</p>"#, html_escape(description)));
        rendered = true;
    }

    let mut extras = String::new();
    for (key, value) in props {
        if key == "name" || key == "description" {
            continue;
        }
        let rendered_value = match value {
            Value::String(s) => html_escape(s),
            other => html_escape(&other.to_string()),
        };
        extras.push_str(&format!(
            r#"<div class="popup-extra"><strong>{}:</strong> {}</div>"#,
            html_escape(key),
            rendered_value
        ));
    }
    if !extras.is_empty() {
        html.push_str(&format!(r#"<div class="popup-extras">{extras}</div>"#));
        rendered = true;
    }

    html.push_str("</div>");
    rendered.then_some(html)
}
