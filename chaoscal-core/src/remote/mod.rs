//! Remote feed fetching and reconciliation.

mod fetch;
mod reconcile;

pub use fetch::{FeedFetcher, HttpFetcher, feed_url};
pub use reconcile::{Reconciler, SyncOutcome};
