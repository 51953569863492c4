//! Feed parsing using the icalendar crate's parser.
//!
//! The pipeline never reads the published feed back, but tests use this to
//! verify round-trip fidelity, and `preview` of an existing feed goes
//! through it too.

use icalendar::parser::{read_calendar, unfold};

use crate::error::{LeekCalError, LeekCalResult};

/// One VEVENT as read back from a generated feed. Values are kept raw
/// (still ICS-escaped); this is an identity check, not a full round-trip
/// into `EventRecord`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub uid: String,
    pub summary: String,
    pub dtstart: String,
    pub dtend: String,
    pub url: Option<String>,
}

/// Parse a generated feed into its entries, in document order.
pub fn parse_feed(content: &str) -> LeekCalResult<Vec<FeedEntry>> {
    let unfolded = unfold(content);
    let calendar =
        read_calendar(&unfolded).map_err(|e| LeekCalError::IcsParse(e.to_string()))?;

    let mut entries = Vec::new();

    for component in &calendar.components {
        if component.name != "VEVENT" {
            continue;
        }

        let Some(uid) = component.find_prop("UID") else {
            continue;
        };
        let Some(dtstart) = component.find_prop("DTSTART") else {
            continue;
        };

        entries.push(FeedEntry {
            uid: uid.val.to_string(),
            summary: component
                .find_prop("SUMMARY")
                .map(|p| p.val.to_string())
                .unwrap_or_default(),
            dtstart: dtstart.val.to_string(),
            dtend: component
                .find_prop("DTEND")
                .map(|p| p.val.to_string())
                .unwrap_or_default(),
            url: component.find_prop("URL").map(|p| p.val.to_string()),
        });
    }

    Ok(entries)
}
