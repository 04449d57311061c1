//! Test fixtures for mapquery.
//!
//! Builders for provider-shaped pages: the embedded JSON blob wrapper,
//! directions pages with instruction panels, and geocode/local-search
//! marker pages. Route coordinates are real Las Vegas Strip locations.

use mapquery::polyline::{encode, Coordinate};

/// Wraps a JSON blob the way provider pages embed it.
pub fn page(blob: serde_json::Value) -> String {
    format!(
        "<html><head></head><body><script>loadApp({});</script></body></html>",
        blob
    )
}

/// One instruction row in the panel's scraped format.
pub fn panel_row(
    id: &str,
    point_index: Option<usize>,
    text: &str,
    distance: &str,
    duration: &str,
) -> String {
    let point_attr = point_index
        .map(|p| format!(r#" data-point="{}""#, p))
        .unwrap_or_default();
    format!(
        r#"<tr class="dirstep" id="{}"{}><td class="dirsegtext">{}</td><td class="dirsegdist">{}</td><td class="dirsegtime">{}</td></tr>"#,
        id, point_attr, text, distance, duration
    )
}

/// A directions page with the given geometry and panel rows.
pub fn directions_page(points: &[(f64, f64)], rows: &[String]) -> String {
    let coords: Vec<Coordinate> = points
        .iter()
        .map(|&(lat, lon)| Coordinate::from_degrees(lat, lon))
        .collect();
    directions_page_raw(&encode(&coords), rows)
}

/// A directions page with a pre-encoded polyline (for fault injection).
pub fn directions_page_raw(polyline: &str, rows: &[String]) -> String {
    let panel = format!("<table>{}</table>", rows.join(""));
    page(serde_json::json!({
        "polylines": [{ "points": polyline, "levels": "BBBB" }],
        "distance": "6.2 mi",
        "duration": "14 mins",
        "panel": panel,
    }))
}

/// A geocode/local-search page carrying the given markers.
pub fn marker_page(markers: serde_json::Value) -> String {
    page(serde_json::json!({ "markers": markers }))
}

/// Route geometry along the Strip: Bellagio up to the Wynn.
pub fn strip_route() -> Vec<(f64, f64)> {
    vec![
        (36.11299, -115.17623),
        (36.11571, -115.17355),
        (36.11623, -115.17454),
        (36.12101, -115.17231),
        (36.12638, -115.16582),
    ]
}
