//! Fetch-and-parse for a single subscription.
//!
//! The reconciler owns no state: it takes a subscription snapshot and
//! returns what happened. Applying the outcome (replace-by-source merge and
//! status update) is the caller's job.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{ChaosCalError, ChaosCalResult};
use crate::event::CalendarEvent;
use crate::ics::{SkippedBlock, parse_feed};
use crate::remote::fetch::{FeedFetcher, feed_url};
use crate::subscription::{CalendarSubscription, SyncStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The feed was fetched and parsed. `events` replace the feed's
    /// previous contribution wholesale.
    Synced {
        events: Vec<CalendarEvent>,
        skipped: Vec<SkippedBlock>,
        synced_at: DateTime<Utc>,
    },
    /// Nothing may change except the subscription's status.
    Failed { error: ChaosCalError },
}

impl SyncOutcome {
    /// Status the subscription should move to.
    pub fn status(&self) -> SyncStatus {
        match self {
            SyncOutcome::Synced { .. } => SyncStatus::Active,
            SyncOutcome::Failed { .. } => SyncStatus::Error,
        }
    }
}

pub struct Reconciler {
    fetcher: Arc<dyn FeedFetcher>,
    proxy_url: String,
}

impl Reconciler {
    pub fn new(fetcher: Arc<dyn FeedFetcher>, proxy_url: &str) -> Self {
        Reconciler {
            fetcher,
            proxy_url: proxy_url.to_string(),
        }
    }

    /// Fetch and parse one feed. Errors never escape; they become
    /// `SyncOutcome::Failed`.
    pub async fn reconcile(&self, subscription: &CalendarSubscription) -> SyncOutcome {
        let body = match self.fetch(subscription).await {
            Ok(body) => body,
            Err(error) => {
                tracing::warn!("Sync failed for {}: {}", subscription, error);
                return SyncOutcome::Failed { error };
            }
        };

        let feed = parse_feed(&body, Some(&subscription.id));
        if !feed.skipped.is_empty() {
            tracing::warn!(
                "Skipped {} incomplete event block(s) in {}",
                feed.skipped.len(),
                subscription
            );
        }
        tracing::debug!("Parsed {} event(s) from {}", feed.events.len(), subscription);

        SyncOutcome::Synced {
            events: feed.events,
            skipped: feed.skipped,
            synced_at: Utc::now(),
        }
    }

    async fn fetch(&self, subscription: &CalendarSubscription) -> ChaosCalResult<String> {
        let url = feed_url(subscription, &self.proxy_url)?;
        tracing::debug!("Fetching {} from {}", subscription, url);
        self.fetcher.fetch(&url).await
    }
}
