//! mapquery: structured queries over a mapping web service's browser pages
//!
//! Scrapes the provider's geocoding, local-search and directions responses
//! into `Location`, `Segment` and `Path` entities. The core — the polyline
//! codec and the geometry/instruction correlator — is pure and synchronous;
//! fetching and page parsing sit behind collaborator traits.

pub mod client;
pub mod correlate;
pub mod error;
pub mod model;
pub mod polyline;
pub mod scrape;
pub mod traits;

pub use client::{HttpFetcher, MapService, ServiceConfig};
pub use correlate::InstructionFragment;
pub use error::Error;
pub use model::{Location, Path, Segment, Waypoint};
pub use polyline::{Coordinate, Polyline};
