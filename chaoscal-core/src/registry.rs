//! Registered feed subscriptions and their sync status.

use chrono::{DateTime, Utc};

use crate::subscription::{CalendarSubscription, SubscriptionId, SyncStatus};

/// Subscriptions in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    subscriptions: Vec<CalendarSubscription>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a feed. It starts in `Loading` with no sync time.
    pub fn add(&mut self, name: &str, url: &str, use_proxy: bool) -> CalendarSubscription {
        let subscription = CalendarSubscription::new(name, url, use_proxy);
        self.subscriptions.push(subscription.clone());
        subscription
    }

    /// Remove a feed. Unknown ids are ignored.
    pub fn remove(&mut self, id: &SubscriptionId) -> Option<CalendarSubscription> {
        let idx = self.subscriptions.iter().position(|s| &s.id == id)?;
        Some(self.subscriptions.remove(idx))
    }

    pub fn get(&self, id: &SubscriptionId) -> Option<&CalendarSubscription> {
        self.subscriptions.iter().find(|s| &s.id == id)
    }

    fn get_mut(&mut self, id: &SubscriptionId) -> Option<&mut CalendarSubscription> {
        self.subscriptions.iter_mut().find(|s| &s.id == id)
    }

    pub fn contains(&self, id: &SubscriptionId) -> bool {
        self.get(id).is_some()
    }

    /// Returns false if the subscription does not exist.
    pub fn set_status(&mut self, id: &SubscriptionId, status: SyncStatus) -> bool {
        match self.get_mut(id) {
            Some(sub) => {
                sub.status = status;
                true
            }
            None => false,
        }
    }

    /// Returns false if the subscription does not exist.
    pub fn set_last_synced(&mut self, id: &SubscriptionId, at: DateTime<Utc>) -> bool {
        match self.get_mut(id) {
            Some(sub) => {
                sub.last_synced = Some(at);
                true
            }
            None => false,
        }
    }

    pub fn list(&self) -> Vec<CalendarSubscription> {
        self.subscriptions.clone()
    }

    pub fn ids(&self) -> Vec<SubscriptionId> {
        self.subscriptions.iter().map(|s| s.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
