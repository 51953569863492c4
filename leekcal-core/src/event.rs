//! Scraper-neutral event types.
//!
//! The extractor converts LeekDuck listing blocks into these records, and
//! the ICS generator works exclusively with them. Records are rebuilt from
//! scratch on every run; nothing here is persisted.

use chrono::{DateTime, Duration};
use chrono_tz::Tz;

/// A single scraped event, localized to the configured timezone.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Event title, non-empty after trimming.
    pub title: String,
    /// Start of the event, always known.
    pub start: DateTime<Tz>,
    /// End of the event. `None` means the source stated no end; the
    /// serializer applies the configured default duration.
    pub end: Option<DateTime<Tz>>,
    /// Absolute link to the event detail page, when the block had one.
    pub source_url: Option<String>,
    /// Stable identifier for this event across runs, derived from the
    /// event link's URL slug. Feeds the calendar entry's UID so
    /// subscribing clients see updates rather than duplicates.
    pub raw_id: String,
    /// Short blurb from the listing block, when present.
    pub description: Option<String>,
}

impl EventRecord {
    /// The effective end time: the stated end, or start plus the given
    /// default duration when the source had none.
    pub fn end_or_default(&self, default_duration: Duration) -> DateTime<Tz> {
        self.end.unwrap_or(self.start + default_duration)
    }

    /// Whether the record carries everything the serializer requires.
    pub fn is_serializable(&self) -> bool {
        !self.title.trim().is_empty() && !self.raw_id.is_empty()
    }
}
