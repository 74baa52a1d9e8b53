//! The coordinator that owns the event set and the subscription registry.
//!
//! `CalendarHub` is a cheap handle: clones share the same state. All state
//! changes happen inside short critical sections; the lock is never held
//! while a feed is being fetched.
//!
//! Overlapping syncs of one feed are resolved with per-feed tickets. Every
//! `sync` takes a new ticket before fetching and only the holder of the
//! latest ticket may merge, so the most recently started fetch wins. A fetch
//! that completes after its subscription was removed is dropped. A sync that
//! is cancelled mid-fetch does not leave its feed in `Loading`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::config::SyncConfig;
use crate::error::{ChaosCalError, ChaosCalResult};
use crate::event::{CalendarEvent, EventPatch, NewEvent};
use crate::ics::{SkippedBlock, generate_ics, parse_feed, unsafe_events};
use crate::registry::SubscriptionRegistry;
use crate::remote::{FeedFetcher, HttpFetcher, Reconciler, SyncOutcome};
use crate::scheduler::SyncScheduler;
use crate::store::{EventStore, MergeSummary};
use crate::subscription::{CalendarSubscription, SubscriptionId, SyncStatus};

/// Result of importing a document as local events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: Vec<SkippedBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    /// The subscription was removed while its fetch was in flight
    Removed,
    /// A newer sync of the same subscription was started
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncResult {
    Merged {
        summary: MergeSummary,
        /// Incomplete event blocks left out of the merge
        skipped: usize,
    },
    Failed {
        error: ChaosCalError,
    },
    Discarded(DiscardReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub subscription_id: SubscriptionId,
    pub result: SyncResult,
}

#[derive(Default)]
struct HubState {
    events: EventStore,
    registry: SubscriptionRegistry,
    /// Latest ticket handed out per subscription
    tickets: HashMap<SubscriptionId, u64>,
}

/// Puts a feed's status back if its sync is dropped mid-fetch.
struct InFlight {
    state: Arc<Mutex<HubState>>,
    id: SubscriptionId,
    ticket: u64,
    prior: SyncStatus,
    settled: bool,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        // A newer sync owns the status now, or the feed is gone
        if state.tickets.get(&self.id) != Some(&self.ticket) {
            return;
        }

        let status = match self.prior {
            SyncStatus::Loading => SyncStatus::Error,
            settled => settled,
        };
        state.registry.set_status(&self.id, status);
        tracing::debug!("Sync of {} cancelled, status back to {:?}", self.id, status);
    }
}

#[derive(Clone)]
pub struct CalendarHub {
    state: Arc<Mutex<HubState>>,
    reconciler: Arc<Reconciler>,
    config: Arc<SyncConfig>,
}

impl CalendarHub {
    pub fn new(config: SyncConfig, fetcher: Arc<dyn FeedFetcher>) -> Self {
        let reconciler = Reconciler::new(fetcher, &config.proxy_url);
        CalendarHub {
            state: Arc::new(Mutex::new(HubState::default())),
            reconciler: Arc::new(reconciler),
            config: Arc::new(config),
        }
    }

    /// Hub that fetches feeds over HTTP.
    pub fn with_http(config: SyncConfig) -> ChaosCalResult<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::new(config, Arc::new(fetcher)))
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // LOCAL EVENTS:

    pub fn add_event(&self, new: NewEvent) -> ChaosCalResult<CalendarEvent> {
        if new.title.is_empty() {
            return Err(ChaosCalError::EmptyTitle);
        }

        let event = CalendarEvent::new(new);
        self.lock().events.push(event.clone());
        Ok(event)
    }

    /// Edit an event. Edits to feed events last until the feed's next sync.
    pub fn update_event(&self, id: &str, patch: EventPatch) -> ChaosCalResult<CalendarEvent> {
        self.lock().events.update(id, patch).cloned()
    }

    pub fn delete_event(&self, id: &str) -> bool {
        self.lock().events.remove(id).is_some()
    }

    pub fn event(&self, id: &str) -> Option<CalendarEvent> {
        self.lock().events.get(id).cloned()
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        self.lock().events.to_vec()
    }

    /// Events on one calendar day, earliest first.
    pub fn events_on(&self, day: NaiveDate) -> Vec<CalendarEvent> {
        self.lock().events.on_day(day)
    }

    // IMPORT / EXPORT:

    /// Parse a document and add its events as local events.
    pub fn import_ics(&self, content: &str) -> ImportReport {
        let feed = parse_feed(content, None);
        let imported = feed.events.len();
        self.lock().events.extend(feed.events);

        tracing::info!(
            "Imported {} event(s), skipped {} block(s)",
            imported,
            feed.skipped.len()
        );

        ImportReport {
            imported,
            skipped: feed.skipped,
        }
    }

    /// Serialize every event in store order.
    pub fn export_ics(&self) -> String {
        let events = self.events();
        let unsafe_ids = unsafe_events(&events);
        if !unsafe_ids.is_empty() {
            tracing::warn!(
                "{} event(s) contain line breaks and will not round-trip",
                unsafe_ids.len()
            );
        }
        generate_ics(&events)
    }

    // SUBSCRIPTIONS:

    pub fn subscriptions(&self) -> Vec<CalendarSubscription> {
        self.lock().registry.list()
    }

    pub fn subscription(&self, id: &SubscriptionId) -> Option<CalendarSubscription> {
        self.lock().registry.get(id).cloned()
    }

    /// Register a feed and run its initial sync. Returns the subscription as
    /// it stands after that sync.
    pub async fn add_subscription(
        &self,
        name: &str,
        url: &str,
        use_proxy: bool,
    ) -> CalendarSubscription {
        let subscription = self.lock().registry.add(name, url, use_proxy);
        tracing::info!("Added subscription {}", subscription);

        self.sync(&subscription.id).await;

        self.subscription(&subscription.id).unwrap_or(subscription)
    }

    /// Remove a feed and every event it contributed. Unknown ids are a no-op.
    pub fn remove_subscription(&self, id: &SubscriptionId) -> bool {
        let mut state = self.lock();
        let Some(removed) = state.registry.remove(id) else {
            return false;
        };
        state.tickets.remove(id);
        let purged = state.events.purge_source(id);

        tracing::info!("Removed subscription {} and {} event(s)", removed, purged);
        true
    }

    // SYNC:

    /// Fetch one feed and merge the result. Returns None for unknown ids.
    ///
    /// If the returned future is dropped before the fetch completes, the
    /// feed's status is put back to what it was before the sync started (a
    /// feed that never completed a fetch becomes `Error`).
    pub async fn sync(&self, id: &SubscriptionId) -> Option<SyncReport> {
        let (subscription, mut in_flight) = {
            let mut state = self.lock();
            let HubState {
                registry, tickets, ..
            } = &mut *state;

            let subscription = registry.get(id)?.clone();
            let prior = subscription.status;
            registry.set_status(id, SyncStatus::Loading);

            let ticket = tickets.entry(id.clone()).or_insert(0);
            *ticket += 1;
            let in_flight = InFlight {
                state: Arc::clone(&self.state),
                id: id.clone(),
                ticket: *ticket,
                prior,
                settled: false,
            };
            (subscription, in_flight)
        };

        let outcome = self.reconciler.reconcile(&subscription).await;
        in_flight.settled = true;
        let result = self.apply(&subscription.id, in_flight.ticket, outcome);

        Some(SyncReport {
            subscription_id: subscription.id,
            result,
        })
    }

    /// Sync every registered feed concurrently. Reports come back in
    /// registry order.
    ///
    /// Each feed syncs on its own task, so dropping this future (as stopping
    /// the scheduler does) leaves fetches already in flight to finish and
    /// merge.
    pub async fn sync_all(&self) -> Vec<SyncReport> {
        let ids = self.lock().registry.ids();

        let handles: Vec<JoinHandle<Option<SyncReport>>> = ids
            .into_iter()
            .map(|id| {
                let hub = self.clone();
                tokio::spawn(async move { hub.sync(&id).await })
            })
            .collect();

        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(Some(report)) => reports.push(report),
                Ok(None) => {}
                Err(e) => tracing::error!("Sync task failed: {}", e),
            }
        }
        reports
    }

    /// Start the periodic re-sync using the configured interval. The timer
    /// stops when the returned scheduler is dropped.
    pub fn start_scheduler(&self) -> ChaosCalResult<SyncScheduler> {
        SyncScheduler::start(self.clone(), self.config.sync_interval)
    }

    fn apply(&self, id: &SubscriptionId, ticket: u64, outcome: SyncOutcome) -> SyncResult {
        let mut state = self.lock();
        let HubState {
            events,
            registry,
            tickets,
        } = &mut *state;

        if !registry.contains(id) {
            tracing::debug!("Dropping sync result for removed subscription {}", id);
            return SyncResult::Discarded(DiscardReason::Removed);
        }
        if tickets.get(id) != Some(&ticket) {
            tracing::debug!("Dropping superseded sync result for {}", id);
            return SyncResult::Discarded(DiscardReason::Superseded);
        }

        let status = outcome.status();
        let result = match outcome {
            SyncOutcome::Synced {
                events: candidates,
                skipped,
                synced_at,
            } => {
                let summary = events.replace_source(id, candidates);
                registry.set_last_synced(id, synced_at);
                tracing::debug!(
                    "Merged {}: removed {}, inserted {}",
                    id,
                    summary.removed,
                    summary.inserted
                );
                SyncResult::Merged {
                    summary,
                    skipped: skipped.len(),
                }
            }
            SyncOutcome::Failed { error } => SyncResult::Failed { error },
        };
        registry.set_status(id, status);

        result
    }
}
