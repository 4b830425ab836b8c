//! Response caching for generated content.
//!
//! - [`RequestFingerprint`]: stable hash of a request
//! - [`KeyValueStore`] / [`LruStore`]: bounded storage
//! - [`SingleFlight`]: collapses concurrent identical requests
//! - [`ResponseCache`]: all of the above behind `get_or_fetch`

pub mod fingerprint;
pub mod response;
pub mod single_flight;
pub mod store;

pub use fingerprint::RequestFingerprint;
pub use response::ResponseCache;
pub use single_flight::SingleFlight;
pub use store::{CacheStats, KeyValueStore, LruStore};
