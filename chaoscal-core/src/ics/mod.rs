//! Interchange text reading and writing.
//!
//! This is a deliberately small subset of RFC 5545: one start time, a title
//! and an optional description per event, with no escaping or line folding.

mod generate;
mod parse;

pub use generate::{generate_ics, generate_ics_at, is_interchange_safe, unsafe_events};
pub use parse::{ParsedFeed, SkipReason, SkippedBlock, parse_events, parse_feed};
