//! Offline cache worker: network-first fetch gateway with a generation-tagged
//! cache, independent of the UI controller.

mod fetcher;
mod store;
mod worker;

pub use fetcher::{FetchRequest, FetchResponse, Fetcher, HttpFetcher, ServedFrom};
#[cfg(test)]
pub(crate) use fetcher::NullFetcher;
pub use store::CacheStore;
pub use worker::{CacheWorker, RouteDecision, WorkerPhase};
