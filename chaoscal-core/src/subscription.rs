//! Remote feed subscriptions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SUBSCRIPTION_COLOR;

/// Opaque subscription identifier, also used as the `source_id` of every
/// event fetched from that feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    pub fn new() -> Self {
        SubscriptionId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for SubscriptionId {
    fn from(id: &str) -> Self {
        SubscriptionId(id.to_string())
    }
}

impl From<String> for SubscriptionId {
    fn from(id: String) -> Self {
        SubscriptionId(id)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// A fetch is in flight (also the state of a freshly added feed)
    Loading,
    /// The last accepted fetch succeeded
    Active,
    /// The last accepted fetch failed; previously synced events are kept
    Error,
}

/// A registered remote feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarSubscription {
    pub id: SubscriptionId,
    pub name: String,
    pub url: String,
    /// Route fetches through the pass-through proxy
    pub use_proxy: bool,
    /// Display color for the feed's events, as a CSS hex string
    #[serde(default = "default_color")]
    pub color: String,
    pub status: SyncStatus,
    pub last_synced: Option<DateTime<Utc>>,
}

impl CalendarSubscription {
    pub fn new(name: &str, url: &str, use_proxy: bool) -> Self {
        CalendarSubscription {
            id: SubscriptionId::new(),
            name: name.to_string(),
            url: url.to_string(),
            use_proxy,
            color: default_color(),
            status: SyncStatus::Loading,
            last_synced: None,
        }
    }
}

fn default_color() -> String {
    DEFAULT_SUBSCRIPTION_COLOR.to_string()
}

impl fmt::Display for CalendarSubscription {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
