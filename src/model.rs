//! Domain entities for map query results.
//!
//! `Location`, `Segment` and `Path` are plain records, immutable after
//! construction. A `Path` owns its segments; segments reference their
//! endpoint locations by value (the shared boundary point between adjacent
//! segments is physically duplicated, conceptually shared).

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::polyline::Coordinate;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Generates a process-unique id for entities the provider left unnamed.
pub(crate) fn fresh_id(prefix: &str) -> String {
    format!("{}-{}", prefix, NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

/// A named geographic point.
///
/// Constructed directly by the caller as a query endpoint, parsed out of an
/// address-resolution or local-search response, or synthesized by the
/// correlator as an interior path point (coordinate and id only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    coord: Coordinate,
    title: Option<String>,
    lines: Vec<String>,
    id: String,
    icon: Option<String>,
    info_style: Option<String>,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self::from_coordinate(Coordinate::from_degrees(lat, lon))
    }

    pub fn from_coordinate(coord: Coordinate) -> Self {
        Self {
            coord,
            title: None,
            lines: Vec::new(),
            id: fresh_id("loc"),
            icon: None,
            info_style: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Address/label lines as scraped from the provider response.
    pub fn with_lines(mut self, lines: Vec<String>) -> Self {
        self.lines = lines;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_info_style(mut self, info_style: impl Into<String>) -> Self {
        self.info_style = Some(info_style.into());
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coord
    }

    pub fn lat(&self) -> f64 {
        self.coord.lat()
    }

    pub fn lon(&self) -> f64 {
        self.coord.lon()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn info_style(&self) -> Option<&str> {
        self.info_style.as_deref()
    }
}

/// Input to a directions query: either a resolved location or a raw address
/// string that still needs resolution.
///
/// `get_directions` only accepts resolved locations; an `Address` waypoint
/// fails with `InvalidWaypointType` and must go through `resolve_address`
/// first.
#[derive(Debug, Clone, PartialEq)]
pub enum Waypoint {
    Place(Location),
    Address(String),
}

impl From<Location> for Waypoint {
    fn from(location: Location) -> Self {
        Waypoint::Place(location)
    }
}

impl From<&str> for Waypoint {
    fn from(address: &str) -> Self {
        Waypoint::Address(address.to_string())
    }
}

/// One instruction-bearing leg of a path.
///
/// Owns a contiguous run of the path's points. `from`/`to` duplicate the
/// first and closing points for direct access. `point_index` is the offset
/// of this segment's first decoded point within the full path sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    points: Vec<Location>,
    from: Location,
    to: Location,
    distance: String,
    duration: String,
    instruction: String,
    point_index: usize,
    id: String,
}

impl Segment {
    pub(crate) fn new(
        points: Vec<Location>,
        distance: String,
        duration: String,
        instruction: String,
        point_index: usize,
        id: String,
    ) -> Self {
        debug_assert!(!points.is_empty());
        let from = points.first().cloned().unwrap_or_else(|| Location::new(0.0, 0.0));
        let to = points.last().cloned().unwrap_or_else(|| from.clone());
        Self {
            points,
            from,
            to,
            distance,
            duration,
            instruction,
            point_index,
            id,
        }
    }

    /// Appends a stray point without moving the segment's `to` endpoint.
    pub(crate) fn append_point(&mut self, point: Location) {
        self.points.push(point);
    }

    /// Appends the query's final destination and makes it the endpoint.
    pub(crate) fn finish(&mut self, destination: Location) {
        self.to = destination.clone();
        self.points.push(destination);
    }

    pub fn points(&self) -> &[Location] {
        &self.points
    }

    pub fn from(&self) -> &Location {
        &self.from
    }

    pub fn to(&self) -> &Location {
        &self.to
    }

    pub fn distance(&self) -> &str {
        &self.distance
    }

    pub fn duration(&self) -> &str {
        &self.duration
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn point_index(&self) -> usize {
        self.point_index
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// The aggregate result of a directions query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    segments: Vec<Segment>,
    distance: String,
    duration: String,
    polyline: String,
    query_locations: Vec<Location>,
    panel: Option<String>,
    levels: Option<String>,
}

impl Path {
    pub(crate) fn new(
        segments: Vec<Segment>,
        distance: String,
        duration: String,
        polyline: String,
        query_locations: Vec<Location>,
        panel: Option<String>,
        levels: Option<String>,
    ) -> Self {
        debug_assert!(!segments.is_empty());
        Self {
            segments,
            distance,
            duration,
            polyline,
            query_locations,
            panel,
            levels,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Overall distance text, as reported by the provider.
    pub fn distance(&self) -> &str {
        &self.distance
    }

    /// Overall duration text, as reported by the provider.
    pub fn duration(&self) -> &str {
        &self.duration
    }

    /// The original encoded polyline, preserved for round-trip/debugging.
    pub fn polyline(&self) -> &str {
        &self.polyline
    }

    /// The query locations (start, waypoints, destination) in order.
    pub fn query_locations(&self) -> &[Location] {
        &self.query_locations
    }

    /// Raw instruction panel markup, kept only for output-format fidelity.
    pub fn panel(&self) -> Option<&str> {
        self.panel.as_deref()
    }

    /// Raw level-of-detail string, kept only for output-format fidelity.
    pub fn levels(&self) -> Option<&str> {
        self.levels.as_deref()
    }
}
