//! Calendar event types.
//!
//! Events are either authored locally (no `source_id`) or produced by parsing
//! a subscribed feed, in which case `source_id` names the subscription that
//! owns them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::subscription::SubscriptionId;

/// A scheduled item on the calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    /// Wall-clock start; there is no end time or timezone.
    pub date: NaiveDateTime,
    pub category: Category,
    pub description: Option<String>,
    /// Subscription this event was fetched from (None for local events)
    pub source_id: Option<SubscriptionId>,
}

impl CalendarEvent {
    /// Build a local event with a freshly minted id.
    pub fn new(new: NewEvent) -> Self {
        CalendarEvent {
            id: new_event_id(),
            title: new.title,
            date: new.date,
            category: new.category,
            description: new.description,
            source_id: None,
        }
    }

    pub fn is_local(&self) -> bool {
        self.source_id.is_none()
    }

    pub fn is_from(&self, source: &SubscriptionId) -> bool {
        self.source_id.as_ref() == Some(source)
    }

    /// Apply the fields present in `patch`.
    pub(crate) fn apply(&mut self, patch: EventPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
    }
}

/// Mint an event id. Ids are never reused.
pub(crate) fn new_event_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Work,
    Personal,
    Urgent,
}

/// Fields for a locally authored event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub date: NaiveDateTime,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update of a local event. `None` leaves a field unchanged;
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub category: Option<Category>,
    pub description: Option<Option<String>>,
}
