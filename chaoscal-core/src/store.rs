//! The local event set.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ChaosCalError, ChaosCalResult};
use crate::event::{CalendarEvent, EventPatch};
use crate::subscription::SubscriptionId;

/// What a replace-by-source merge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    pub removed: usize,
    pub inserted: usize,
}

/// Ordered collection of events, unique by id.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Vec<CalendarEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event, replacing any existing event with the same id.
    pub fn push(&mut self, event: CalendarEvent) {
        match self.events.iter_mut().find(|e| e.id == event.id) {
            Some(existing) => *existing = event,
            None => self.events.push(event),
        }
    }

    /// Add many events with the same replace-by-id rule as `push`, in one
    /// pass over the existing set.
    pub fn extend(&mut self, events: impl IntoIterator<Item = CalendarEvent>) {
        let mut positions: HashMap<String, usize> = self
            .events
            .iter()
            .enumerate()
            .map(|(idx, e)| (e.id.clone(), idx))
            .collect();

        for event in events {
            match positions.get(&event.id) {
                Some(&idx) => self.events[idx] = event,
                None => {
                    positions.insert(event.id.clone(), self.events.len());
                    self.events.push(event);
                }
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&CalendarEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Apply a patch to an existing event. Titles may not become empty.
    pub fn update(&mut self, id: &str, patch: EventPatch) -> ChaosCalResult<&CalendarEvent> {
        if patch.title.as_deref().is_some_and(str::is_empty) {
            return Err(ChaosCalError::EmptyTitle);
        }

        let event = self
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ChaosCalError::EventNotFound(id.to_string()))?;
        event.apply(patch);
        Ok(event)
    }

    pub fn remove(&mut self, id: &str) -> Option<CalendarEvent> {
        let idx = self.events.iter().position(|e| e.id == id)?;
        Some(self.events.remove(idx))
    }

    /// Drop every event owned by `source` and append `candidates` in their
    /// given order. Events from other sources and local events are untouched.
    pub fn replace_source(
        &mut self,
        source: &SubscriptionId,
        candidates: Vec<CalendarEvent>,
    ) -> MergeSummary {
        let removed = self.purge_source(source);
        let inserted = candidates.len();
        self.extend(candidates);
        MergeSummary { removed, inserted }
    }

    /// Remove every event owned by `source`, returning how many were removed.
    pub fn purge_source(&mut self, source: &SubscriptionId) -> usize {
        let before = self.events.len();
        self.events.retain(|e| !e.is_from(source));
        before - self.events.len()
    }

    pub fn by_source<'a>(
        &'a self,
        source: &'a SubscriptionId,
    ) -> impl Iterator<Item = &'a CalendarEvent> {
        self.events.iter().filter(move |e| e.is_from(source))
    }

    /// Events on the given calendar day, earliest first.
    pub fn on_day(&self, day: NaiveDate) -> Vec<CalendarEvent> {
        let mut events: Vec<CalendarEvent> = self
            .events
            .iter()
            .filter(|e| e.date.date() == day)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.date);
        events
    }

    pub fn iter(&self) -> impl Iterator<Item = &CalendarEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn to_vec(&self) -> Vec<CalendarEvent> {
        self.events.clone()
    }
}
