//! Extraction of structured data from the provider's browser-facing pages.
//!
//! The provider embeds a JSON blob in each page for its own frontend code;
//! this module locates that blob, digs the fields the client needs, and
//! pulls instruction rows out of the panel HTML. The format is unversioned
//! and hostile to automated consumption, so every miss is surfaced as
//! [`Error::UpstreamFormatChanged`] with the stage that failed, never a
//! panic or a silent empty result.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::correlate::InstructionFragment;
use crate::error::Error;
use crate::model::{fresh_id, Location};
use crate::traits::InstructionExtractor;

/// Marker preceding the embedded JSON blob in provider pages.
const BLOB_MARKER: &str = "loadApp(";

/// The fields a directions page contributes to a `Path`, pre-correlation.
#[derive(Debug, Clone)]
pub struct DirectionsPage {
    pub polyline: String,
    pub distance: String,
    pub duration: String,
    pub panel: Option<String>,
    pub levels: Option<String>,
}

/// Locates and parses the embedded JSON blob.
pub(crate) fn embedded_blob(body: &str) -> Result<Value, Error> {
    let start = body
        .find(BLOB_MARKER)
        .ok_or(Error::UpstreamFormatChanged { stage: "blob marker" })?
        + BLOB_MARKER.len();
    let json = balanced_object(&body[start..])
        .ok_or(Error::UpstreamFormatChanged { stage: "blob braces" })?;
    serde_json::from_str(json)
        .map_err(|_| Error::UpstreamFormatChanged { stage: "blob json" })
}

/// Returns the balanced `{…}` object at the start of `text`, tracking
/// string literals and escapes so braces inside values don't miscount.
fn balanced_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'{') {
        return None;
    }
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &byte) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses a directions page into its route-level fields.
///
/// The instruction panel is carried through raw; fragment extraction is the
/// [`PanelExtractor`]'s job.
pub fn parse_directions(body: &str) -> Result<DirectionsPage, Error> {
    let blob = embedded_blob(body)?;
    let polylines = blob["polylines"]
        .as_array()
        .filter(|list| !list.is_empty())
        .ok_or(Error::UpstreamFormatChanged { stage: "polylines" })?;
    let polyline = polylines[0]["points"]
        .as_str()
        .ok_or(Error::UpstreamFormatChanged { stage: "polyline points" })?
        .to_string();
    let levels = polylines[0]["levels"].as_str().map(str::to_string);
    let distance = blob["distance"]
        .as_str()
        .ok_or(Error::UpstreamFormatChanged { stage: "route summary" })?
        .to_string();
    let duration = blob["duration"]
        .as_str()
        .ok_or(Error::UpstreamFormatChanged { stage: "route summary" })?
        .to_string();
    let panel = blob["panel"].as_str().map(str::to_string);
    debug!(
        polyline_chars = polyline.len(),
        has_panel = panel.is_some(),
        "parsed directions page"
    );
    Ok(DirectionsPage {
        polyline,
        distance,
        duration,
        panel,
        levels,
    })
}

/// Parses an address-resolution page into candidate locations.
///
/// A page carrying a nonempty `suggestions` list is the provider's "did you
/// mean" response and fails with `AddressAmbiguous`; an empty marker list
/// fails with `AddressNotFound`.
pub fn parse_geocode(body: &str) -> Result<Vec<Location>, Error> {
    let blob = embedded_blob(body)?;
    if let Some(suggestions) = blob["suggestions"].as_array() {
        if !suggestions.is_empty() {
            let candidates = suggestions
                .iter()
                .map(marker_location)
                .collect::<Result<Vec<_>, _>>()?;
            return Err(Error::AddressAmbiguous(candidates));
        }
    }
    let markers = blob["markers"]
        .as_array()
        .ok_or(Error::UpstreamFormatChanged { stage: "markers" })?;
    if markers.is_empty() {
        return Err(Error::AddressNotFound);
    }
    markers.iter().map(marker_location).collect()
}

/// Parses a local-search page into result locations (possibly none).
pub fn parse_local_search(body: &str) -> Result<Vec<Location>, Error> {
    let blob = embedded_blob(body)?;
    let markers = blob["markers"]
        .as_array()
        .ok_or(Error::UpstreamFormatChanged { stage: "markers" })?;
    markers.iter().map(marker_location).collect()
}

fn marker_location(marker: &Value) -> Result<Location, Error> {
    let lat = marker["lat"]
        .as_f64()
        .ok_or(Error::UpstreamFormatChanged { stage: "marker coordinates" })?;
    let lon = marker["lng"]
        .as_f64()
        .ok_or(Error::UpstreamFormatChanged { stage: "marker coordinates" })?;
    let mut location = Location::new(lat, lon);
    if let Some(title) = marker["title"].as_str() {
        location = location.with_title(clean_text(title));
    }
    if let Some(lines) = marker["lines"].as_array() {
        let lines = lines
            .iter()
            .filter_map(Value::as_str)
            .map(clean_text)
            .collect();
        location = location.with_lines(lines);
    }
    if let Some(id) = marker["id"].as_str() {
        location = location.with_id(id);
    }
    if let Some(icon) = marker["icon"].as_str() {
        location = location.with_icon(icon);
    }
    if let Some(info_style) = marker["infoStyle"].as_str() {
        location = location.with_info_style(info_style);
    }
    Ok(location)
}

/// Default instruction extractor: scrapes the directions panel HTML.
#[derive(Debug, Clone, Default)]
pub struct PanelExtractor;

impl InstructionExtractor for PanelExtractor {
    /// A recognized page with no panel yields an empty list; deciding that
    /// zero instructions is a failure belongs to the correlator.
    fn extract(&self, body: &str) -> Result<Vec<InstructionFragment>, Error> {
        let page = parse_directions(body)?;
        match page.panel {
            Some(panel) => parse_instructions(&panel),
            None => Ok(Vec::new()),
        }
    }
}

fn row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<tr([^>]*class="dirstep"[^>]*)>(.*?)</tr>"#).expect("row regex compiles")
    })
}

fn id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"id="([^"]+)""#).expect("id regex compiles"))
}

fn point_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"data-point="(\d+)""#).expect("point regex compiles"))
}

fn cell_re(class: &str) -> Regex {
    Regex::new(&format!(r#"(?s)<td class="{}">(.*?)</td>"#, class)).expect("cell regex compiles")
}

/// Pulls instruction rows out of panel HTML.
pub fn parse_instructions(panel: &str) -> Result<Vec<InstructionFragment>, Error> {
    let text_re = cell_re("dirsegtext");
    let dist_re = cell_re("dirsegdist");
    let time_re = cell_re("dirsegtime");

    let mut fragments = Vec::new();
    for row in row_re().captures_iter(panel) {
        let attrs = &row[1];
        let cells = &row[2];

        let text = text_re
            .captures(cells)
            .map(|c| clean_text(&c[1]))
            .ok_or(Error::UpstreamFormatChanged { stage: "instruction text" })?;
        let distance = dist_re
            .captures(cells)
            .map(|c| clean_text(&c[1]))
            .unwrap_or_default();
        let duration = time_re
            .captures(cells)
            .map(|c| clean_text(&c[1]))
            .unwrap_or_default();
        let id = id_re()
            .captures(attrs)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| fresh_id("seg"));
        let point_index = point_re()
            .captures(attrs)
            .and_then(|c| c[1].parse().ok());

        fragments.push(InstructionFragment {
            id,
            point_index,
            text,
            distance,
            duration,
        });
    }
    debug!(count = fragments.len(), "extracted instruction fragments");
    Ok(fragments)
}

/// Strips markup and decodes the handful of entities the panel uses.
fn clean_text(html: &str) -> String {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let tag_re = TAG_RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag regex compiles"));
    tag_re
        .replace_all(html, "")
        .replace("&#160;", " ")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
