//! Export of the event set as interchange text.
//!
//! Field values are written verbatim. Text containing line breaks cannot be
//! represented; use [`is_interchange_safe`] / [`unsafe_events`] to detect it.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::constants::{PRODUCT_ID, UID_DOMAIN};
use crate::event::CalendarEvent;

const STAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Generate a calendar document for `events`, stamped with the current time.
pub fn generate_ics(events: &[CalendarEvent]) -> String {
    generate_ics_at(events, Utc::now())
}

/// Generate a calendar document with an explicit DTSTAMP.
///
/// Events are written in the given order.
pub fn generate_ics_at(events: &[CalendarEvent], stamp: DateTime<Utc>) -> String {
    let dtstamp = stamp.format(STAMP_FORMAT).to_string();

    let mut out = String::new();
    push_line(&mut out, "BEGIN:VCALENDAR");
    push_line(&mut out, "VERSION:2.0");
    push_line(&mut out, &format!("PRODID:{PRODUCT_ID}"));

    for event in events {
        push_line(&mut out, "BEGIN:VEVENT");
        push_line(&mut out, &format!("UID:{}@{}", event.id, UID_DOMAIN));
        push_line(&mut out, &format!("DTSTAMP:{dtstamp}"));
        push_line(&mut out, &format!("DTSTART:{}", format_start(&event.date)));
        push_line(&mut out, &format!("SUMMARY:{}", event.title));
        if let Some(ref description) = event.description {
            push_line(&mut out, &format!("DESCRIPTION:{description}"));
        }
        push_line(&mut out, "END:VEVENT");
    }

    push_line(&mut out, "END:VCALENDAR");
    out
}

/// Wall-clock start written as a UTC stamp, truncated to seconds.
fn format_start(date: &NaiveDateTime) -> String {
    date.format(STAMP_FORMAT).to_string()
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push_str("\r\n");
}

/// True when `text` survives an export/import round trip unchanged.
///
/// Values are written without escaping, so any CR or LF would end the line
/// early and the remainder would be read as a separate (likely ignored) line.
pub fn is_interchange_safe(text: &str) -> bool {
    !text.contains(['\r', '\n'])
}

/// Ids of events whose title or description cannot be exported faithfully.
pub fn unsafe_events(events: &[CalendarEvent]) -> Vec<&str> {
    events
        .iter()
        .filter(|e| {
            !is_interchange_safe(&e.title)
                || e.description.as_deref().is_some_and(|d| !is_interchange_safe(d))
        })
        .map(|e| e.id.as_str())
        .collect()
}
