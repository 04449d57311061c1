//! Collaborator seams for the map query client.
//!
//! These are intentionally minimal. The core (codec + correlator) is pure;
//! everything that touches the network or the provider's unversioned page
//! format sits behind one of these traits so it can be swapped or faked.

use crate::correlate::InstructionFragment;
use crate::error::Error;
use crate::model::Location;

/// Fetches a raw response body for a URL.
///
/// Transient failures are this collaborator's concern; the core never
/// retries. Implementations decide timeout and cancellation policy.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String, Error>;
}

/// Resolves free-form address text into candidate locations.
pub trait AddressResolver {
    /// Zero candidates is `AddressNotFound`; multiple candidates that the
    /// provider flags as needing disambiguation is `AddressAmbiguous`.
    fn resolve(&self, text: &str) -> Result<Vec<Location>, Error>;
}

/// Extracts ordered instruction fragments from a scraped response body.
///
/// The core imposes no format requirement on how the list is produced;
/// the default implementation scrapes the provider's instruction panel.
pub trait InstructionExtractor {
    fn extract(&self, body: &str) -> Result<Vec<InstructionFragment>, Error>;
}
