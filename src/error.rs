//! Error taxonomy for map queries.
//!
//! Every entry point returns a per-call `Result`; there is no shared
//! last-error state, and a failed call never affects later calls.

use thiserror::Error;

use crate::model::Location;

#[derive(Error, Debug)]
pub enum Error {
    /// The encoded polyline stream ended mid-chunk or with an unpaired
    /// latitude value.
    #[error("polyline input truncated at byte {at}")]
    MalformedPolyline { at: usize },

    /// The provider response contained no instruction fragments at all.
    #[error("no directions found in provider response")]
    NoDirectionsFound,

    /// A directions query needs a start and a destination at minimum.
    #[error("directions require at least 2 waypoints, got {got}")]
    InsufficientWaypoints { got: usize },

    /// A waypoint was not a resolved Location (e.g. a raw address string
    /// that was never passed through address resolution).
    #[error("waypoint {index} is not a resolved location")]
    InvalidWaypointType { index: usize },

    /// Address resolution produced no candidates.
    #[error("address did not resolve to any location")]
    AddressNotFound,

    /// Address resolution produced multiple candidates; the caller must
    /// disambiguate. The candidates are carried for display.
    #[error("address is ambiguous ({} candidates)", .0.len())]
    AddressAmbiguous(Vec<Location>),

    /// The scraped page no longer matches the expected shape. Carries the
    /// extraction stage that failed so the caller can log it.
    #[error("provider page format not recognized at stage `{stage}`")]
    UpstreamFormatChanged { stage: &'static str },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}
