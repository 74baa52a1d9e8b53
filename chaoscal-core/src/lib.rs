//! Core of the chaoscal personal calendar.
//!
//! - `ics` reads and writes a small, line-oriented subset of iCalendar
//! - `remote` fetches subscribed feeds and turns them into events
//! - `hub::CalendarHub` owns the event set and the subscriptions, merges
//!   fetched feeds with replace-by-source semantics, and tracks sync status
//! - `scheduler::SyncScheduler` re-syncs every feed on a fixed period
//!
//! Nothing is persisted: events and subscriptions live as long as the hub.

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod hub;
pub mod ics;
pub mod registry;
pub mod remote;
pub mod scheduler;
pub mod store;
pub mod subscription;

pub use config::SyncConfig;
pub use error::{ChaosCalError, ChaosCalResult};
pub use event::{CalendarEvent, Category, EventPatch, NewEvent};
pub use hub::{CalendarHub, DiscardReason, ImportReport, SyncReport, SyncResult};
pub use scheduler::SyncScheduler;
pub use store::MergeSummary;
pub use subscription::{CalendarSubscription, SubscriptionId, SyncStatus};
