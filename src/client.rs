//! HTTP fetcher and query entry points.
//!
//! `MapService` wires the collaborators together: a `PageFetcher` brings
//! back raw page bodies, the scrape module digs out the embedded data, the
//! codec decodes the geometry, and the correlator assembles the path.

use tracing::debug;

use crate::correlate::correlate;
use crate::error::Error;
use crate::model::{Location, Path, Waypoint};
use crate::polyline;
use crate::scrape::{self, PanelExtractor};
use crate::traits::{AddressResolver, InstructionExtractor, PageFetcher};

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.google.com".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Blocking HTTP fetcher over a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, Error> {
        debug!(url, "fetching provider page");
        let body = self.client.get(url).send()?.error_for_status()?.text()?;
        Ok(body)
    }
}

/// The map query client.
///
/// Holds only immutable configuration and collaborators; every entry point
/// returns a per-call `Result`, so a failed call never affects later ones.
#[derive(Debug, Clone)]
pub struct MapService<F = HttpFetcher, X = PanelExtractor> {
    config: ServiceConfig,
    fetcher: F,
    extractor: X,
}

impl MapService {
    pub fn new(config: ServiceConfig) -> Result<Self, Error> {
        let fetcher = HttpFetcher::new(config.timeout_secs)?;
        Ok(Self {
            config,
            fetcher,
            extractor: PanelExtractor,
        })
    }
}

impl<F: PageFetcher, X: InstructionExtractor> MapService<F, X> {
    /// Builds a service with explicit collaborators (tests, alternate
    /// transports, alternate instruction sources).
    pub fn with_collaborators(config: ServiceConfig, fetcher: F, extractor: X) -> Self {
        Self {
            config,
            fetcher,
            extractor,
        }
    }

    /// Resolves free-form address text into candidate locations.
    pub fn resolve_address(&self, text: &str) -> Result<Vec<Location>, Error> {
        let url = format!(
            "{}/maps?q={}&output=js",
            self.config.base_url,
            query_escape(text)
        );
        let body = self.fetcher.fetch(&url)?;
        scrape::parse_geocode(&body)
    }

    /// Searches for places matching `query` near `origin`.
    pub fn find_nearby(&self, origin: &Location, query: &str) -> Result<Vec<Location>, Error> {
        let url = format!(
            "{}/maps?q={}&sll={}&output=js",
            self.config.base_url,
            query_escape(query),
            origin.coordinate()
        );
        let body = self.fetcher.fetch(&url)?;
        scrape::parse_local_search(&body)
    }

    /// Fetches and assembles directions through the given waypoints.
    ///
    /// Needs at least two waypoints, all of them resolved locations; an
    /// unresolved `Waypoint::Address` fails with `InvalidWaypointType`.
    pub fn get_directions(&self, waypoints: &[Waypoint]) -> Result<Path, Error> {
        if waypoints.len() < 2 {
            return Err(Error::InsufficientWaypoints {
                got: waypoints.len(),
            });
        }
        let mut locations = Vec::with_capacity(waypoints.len());
        for (index, waypoint) in waypoints.iter().enumerate() {
            match waypoint {
                Waypoint::Place(location) => locations.push(location.clone()),
                Waypoint::Address(_) => return Err(Error::InvalidWaypointType { index }),
            }
        }

        let url = self.directions_url(&locations);
        let body = self.fetcher.fetch(&url)?;
        let page = scrape::parse_directions(&body)?;
        let fragments = self.extractor.extract(&body)?;
        let geometry = polyline::decode(&page.polyline)?;

        let start = &locations[0];
        let end = &locations[locations.len() - 1];
        let segments = correlate(start, end, &geometry, &fragments)?;

        Ok(Path::new(
            segments,
            page.distance,
            page.duration,
            page.polyline,
            locations,
            page.panel,
            page.levels,
        ))
    }

    fn directions_url(&self, locations: &[Location]) -> String {
        let saddr = locations[0].coordinate().to_string();
        let daddr = locations[1..]
            .iter()
            .map(|location| location.coordinate().to_string())
            .collect::<Vec<_>>()
            .join("+to:");
        format!(
            "{}/maps?saddr={}&daddr={}&output=js",
            self.config.base_url, saddr, daddr
        )
    }
}

impl<F: PageFetcher, X: InstructionExtractor> AddressResolver for MapService<F, X> {
    fn resolve(&self, text: &str) -> Result<Vec<Location>, Error> {
        self.resolve_address(text)
    }
}

/// Minimal query-string escaping for the characters the provider chokes on.
fn query_escape(text: &str) -> String {
    text.replace('%', "%25")
        .replace('+', "%2B")
        .replace('&', "%26")
        .replace('#', "%23")
        .replace('?', "%3F")
        .replace(' ', "+")
}
