//! Line scanner for the interchange subset.
//!
//! Only `SUMMARY`, `DESCRIPTION` and `DTSTART` are read from inside
//! `BEGIN:VEVENT` / `END:VEVENT` blocks. Everything else, including the
//! calendar wrapper, is ignored.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::event::{CalendarEvent, Category, new_event_id};
use crate::subscription::SubscriptionId;

const BEGIN_EVENT: &str = "BEGIN:VEVENT";
const END_EVENT: &str = "END:VEVENT";
const SUMMARY: &str = "SUMMARY:";
const DESCRIPTION: &str = "DESCRIPTION:";
const DTSTART: &str = "DTSTART:";

/// Why an event block was left out of the parse result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingTitle,
    MissingDate,
    /// A new block started, or the input ended, before `END:VEVENT`
    Unterminated,
}

/// An event block that was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedBlock {
    /// 1-based line number of the block's `BEGIN:VEVENT`
    pub line: usize,
    pub reason: SkipReason,
}

/// Result of parsing a document: accepted events plus the dropped blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeed {
    pub events: Vec<CalendarEvent>,
    pub skipped: Vec<SkippedBlock>,
}

/// Parse interchange text into events, discarding incomplete blocks.
///
/// Every returned event gets a fresh id and `source_id` set to `source`.
pub fn parse_events(content: &str, source: Option<&SubscriptionId>) -> Vec<CalendarEvent> {
    parse_feed(content, source).events
}

/// Parse interchange text, also reporting which blocks were dropped.
pub fn parse_feed(content: &str, source: Option<&SubscriptionId>) -> ParsedFeed {
    let mut feed = ParsedFeed::default();
    let mut current: Option<PartialEvent> = None;

    for (idx, line) in split_lines(content).enumerate() {
        let line_no = idx + 1;

        if line == BEGIN_EVENT {
            if let Some(open) = current.take() {
                feed.skipped.push(SkippedBlock {
                    line: open.line,
                    reason: SkipReason::Unterminated,
                });
            }
            current = Some(PartialEvent::new(line_no));
            continue;
        }

        if line == END_EVENT {
            if let Some(open) = current.take() {
                match open.finish(source) {
                    Ok(event) => feed.events.push(event),
                    Err(skipped) => feed.skipped.push(skipped),
                }
            }
            continue;
        }

        let Some(open) = current.as_mut() else {
            continue;
        };

        if let Some(title) = line.strip_prefix(SUMMARY) {
            open.title = Some(title.to_string());
        } else if let Some(description) = line.strip_prefix(DESCRIPTION) {
            open.description = Some(description.to_string());
        } else if let Some(value) = line.strip_prefix(DTSTART) {
            if let Some(date) = parse_date_time(value) {
                open.date = Some(date);
            }
        }
    }

    if let Some(open) = current {
        feed.skipped.push(SkippedBlock {
            line: open.line,
            reason: SkipReason::Unterminated,
        });
    }

    feed
}

/// Split on CRLF, LF or CR.
fn split_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .split("\r\n")
        .flat_map(|chunk| chunk.split(['\r', '\n']))
}

struct PartialEvent {
    line: usize,
    id: String,
    title: Option<String>,
    date: Option<NaiveDateTime>,
    description: Option<String>,
}

impl PartialEvent {
    fn new(line: usize) -> Self {
        PartialEvent {
            line,
            id: new_event_id(),
            title: None,
            date: None,
            description: None,
        }
    }

    fn finish(self, source: Option<&SubscriptionId>) -> Result<CalendarEvent, SkippedBlock> {
        let skipped = |reason| SkippedBlock {
            line: self.line,
            reason,
        };

        let title = match self.title {
            Some(title) if !title.is_empty() => title,
            _ => return Err(skipped(SkipReason::MissingTitle)),
        };
        let date = self.date.ok_or_else(|| skipped(SkipReason::MissingDate))?;

        Ok(CalendarEvent {
            id: self.id,
            title,
            date,
            category: Category::Work,
            description: self.description,
            source_id: source.cloned(),
        })
    }
}

/// Decode `YYYYMMDD[THHMM[SS]][Z]` as wall-clock components.
///
/// Returns None for truncated dates, impossible dates and malformed times.
fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    let (date_part, time_part) = match value.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (value, None),
    };

    let year = digits(date_part, 0..4)?;
    let month = digits(date_part, 4..6)?;
    let day = digits(date_part, 6..8)?;
    let date = NaiveDate::from_ymd_opt(year as i32, month, day)?;

    let Some(time) = time_part else {
        return date.and_hms_opt(0, 0, 0);
    };

    let time = time.strip_suffix('Z').unwrap_or(time);
    let hour = digits(time, 0..2)?;
    let minute = digits(time, 2..4)?;
    let second = if time.len() >= 6 { digits(time, 4..6)? } else { 0 };

    date.and_hms_opt(hour, minute, second)
}

fn digits(s: &str, range: std::ops::Range<usize>) -> Option<u32> {
    let chunk = s.get(range)?;
    if !chunk.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    chunk.parse().ok()
}
