//! ICS feed generation.

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use icalendar::{Calendar, Component, Property};
use tracing::warn;

use crate::classify::IconTable;
use crate::error::LeekCalResult;
use crate::event::EventRecord;

/// Calendar-level metadata for the generated feed.
#[derive(Debug, Clone)]
pub struct FeedMetadata {
    pub name: String,
    pub description: String,
    pub timezone: Tz,
    /// Applied when a record has no stated end time.
    pub default_duration: Duration,
}

/// Generate the full .ics document for a run.
///
/// Records that cannot be serialized (blank title, empty id) are dropped
/// with a warning; the document is still produced for the rest. An empty
/// record slice yields a valid calendar shell with zero events.
pub fn generate_calendar(
    records: &[EventRecord],
    icons: &IconTable,
    metadata: &FeedMetadata,
) -> LeekCalResult<String> {
    let mut cal = Calendar::new();

    // De facto standard calendar metadata (X-WR-*), as calendar apps expect
    // from subscription feeds.
    cal.append_property(Property::new("X-WR-CALNAME", &metadata.name));
    cal.append_property(Property::new("X-WR-TIMEZONE", metadata.timezone.name()));
    cal.append_property(Property::new("X-WR-CALDESC", &metadata.description));

    for record in records {
        if !record.is_serializable() {
            warn!(
                raw_id = %record.raw_id,
                "dropping record missing a required field"
            );
            continue;
        }

        let mut ics_event = icalendar::Event::new();
        ics_event.uid(&format!("{}@leekduck", record.raw_id));

        let icon = icons.classify(&record.title);
        ics_event.summary(&format!("{} {}", icon, record.title.trim()));

        // DTSTAMP is required by RFC 5545. Derive it from the event start
        // instead of wall-clock now, so identical input produces
        // byte-identical output.
        let dtstamp = record
            .start
            .with_timezone(&chrono::Utc)
            .format("%Y%m%dT%H%M%SZ")
            .to_string();
        ics_event.add_property("DTSTAMP", &dtstamp);

        add_zoned_property(&mut ics_event, "DTSTART", &record.start);

        // A stated end earlier than the start is a source glitch; fall back
        // to the default duration rather than emitting an inverted range.
        let end = match record.end {
            Some(end) if end >= record.start => end,
            Some(end) => {
                warn!(
                    raw_id = %record.raw_id,
                    %end,
                    "stated end precedes start, applying default duration"
                );
                record.start + metadata.default_duration
            }
            None => record.start + metadata.default_duration,
        };
        add_zoned_property(&mut ics_event, "DTEND", &end);

        ics_event.description(&build_description(record));

        if let Some(ref url) = record.source_url {
            ics_event.add_property("URL", url);
        }

        cal.push(ics_event.done());
    }

    let cal = cal.done();

    Ok(strip_ics_bloat(&cal.to_string()))
}

/// DESCRIPTION text: the listing blurb, a "More info" link, and the data
/// attribution line.
fn build_description(record: &EventRecord) -> String {
    let mut description = record.description.clone().unwrap_or_default();

    if let Some(ref url) = record.source_url {
        if !description.is_empty() {
            description.push_str("\n\n");
        }
        description.push_str("More info: ");
        description.push_str(url);
    }

    if !description.is_empty() {
        description.push_str("\n\n");
    }
    description.push_str("Data from LeekDuck.com");

    description
}

/// Add a local datetime property carrying a TZID parameter.
fn add_zoned_property(ics_event: &mut icalendar::Event, name: &str, datetime: &DateTime<Tz>) {
    let mut prop = Property::new(name, datetime.format("%Y%m%dT%H%M%S").to_string());
    prop.add_parameter("TZID", datetime.timezone().name());
    ics_event.append_property(prop);
}

/// Clean up ICS output from the icalendar crate
/// - Replace the crate's PRODID with ours
/// - Remove CALSCALE:GREGORIAN (it's the default)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:-//leekcal//LeekDuck Events//EN\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Brussels;

    fn metadata() -> FeedMetadata {
        FeedMetadata {
            name: "LeekDuck Pokemon GO Events".to_string(),
            description: "Pokemon GO events from LeekDuck.com".to_string(),
            timezone: Brussels,
            default_duration: Duration::hours(1),
        }
    }

    fn make_test_record() -> EventRecord {
        EventRecord {
            title: "Raid Hour: Mewtwo".to_string(),
            start: Brussels.with_ymd_and_hms(2025, 10, 13, 18, 0, 0).unwrap(),
            end: Some(Brussels.with_ymd_and_hms(2025, 10, 13, 19, 0, 0).unwrap()),
            source_url: Some("https://leekduck.com/events/raid-hour/".to_string()),
            raw_id: "raid-hour".to_string(),
            description: None,
        }
    }

    #[test]
    fn test_empty_input_yields_valid_calendar_shell() {
        let ics = generate_calendar(&[], &IconTable::leekduck_defaults(), &metadata()).unwrap();

        assert!(ics.starts_with("BEGIN:VCALENDAR"), "ICS:\n{}", ics);
        assert!(ics.contains("VERSION:2.0"), "ICS:\n{}", ics);
        assert!(
            ics.contains("PRODID:-//leekcal//LeekDuck Events//EN"),
            "ICS:\n{}",
            ics
        );
        assert!(!ics.contains("BEGIN:VEVENT"), "ICS:\n{}", ics);
        assert!(ics.trim_end().ends_with("END:VCALENDAR"), "ICS:\n{}", ics);
    }

    #[test]
    fn test_event_has_uid_summary_and_zoned_times() {
        let ics = generate_calendar(
            &[make_test_record()],
            &IconTable::leekduck_defaults(),
            &metadata(),
        )
        .unwrap();

        assert!(ics.contains("UID:raid-hour@leekduck"), "ICS:\n{}", ics);
        assert!(
            ics.contains("SUMMARY:⏰ Raid Hour: Mewtwo"),
            "summary should be icon-prefixed. ICS:\n{}",
            ics
        );
        assert!(
            ics.contains("DTSTART;TZID=Europe/Brussels:20251013T180000"),
            "ICS:\n{}",
            ics
        );
        assert!(
            ics.contains("DTEND;TZID=Europe/Brussels:20251013T190000"),
            "ICS:\n{}",
            ics
        );
    }

    #[test]
    fn test_missing_end_gets_default_duration() {
        let mut record = make_test_record();
        record.end = None;

        let ics =
            generate_calendar(&[record], &IconTable::leekduck_defaults(), &metadata()).unwrap();

        assert!(
            ics.contains("DTEND;TZID=Europe/Brussels:20251013T190000"),
            "DTEND should be start + 1h. ICS:\n{}",
            ics
        );
    }

    #[test]
    fn test_inverted_end_falls_back_to_default_duration() {
        let mut record = make_test_record();
        record.end = Some(Brussels.with_ymd_and_hms(2025, 10, 13, 17, 0, 0).unwrap());

        let ics =
            generate_calendar(&[record], &IconTable::leekduck_defaults(), &metadata()).unwrap();

        assert!(
            ics.contains("DTEND;TZID=Europe/Brussels:20251013T190000"),
            "ICS:\n{}",
            ics
        );
    }

    #[test]
    fn test_record_with_blank_title_is_dropped_not_fatal() {
        let mut bad = make_test_record();
        bad.title = "  ".to_string();
        bad.raw_id = "blank".to_string();

        let good = make_test_record();

        let ics = generate_calendar(
            &[bad, good],
            &IconTable::leekduck_defaults(),
            &metadata(),
        )
        .unwrap();

        assert!(!ics.contains("UID:blank@leekduck"), "ICS:\n{}", ics);
        assert!(ics.contains("UID:raid-hour@leekduck"), "ICS:\n{}", ics);
    }

    #[test]
    fn test_description_carries_link_and_attribution() {
        let ics = generate_calendar(
            &[make_test_record()],
            &IconTable::leekduck_defaults(),
            &metadata(),
        )
        .unwrap();

        // The crate folds long lines, so unfold before matching text.
        let unfolded = ics.replace("\r\n ", "");
        assert!(
            unfolded.contains("More info: https://leekduck.com/events/raid-hour/"),
            "ICS:\n{}",
            ics
        );
        assert!(unfolded.contains("Data from LeekDuck.com"), "ICS:\n{}", ics);
    }

    #[test]
    fn test_output_is_byte_identical_across_runs() {
        let records = vec![make_test_record()];
        let icons = IconTable::leekduck_defaults();

        let first = generate_calendar(&records, &icons, &metadata()).unwrap();
        let second = generate_calendar(&records, &icons, &metadata()).unwrap();

        assert_eq!(first, second, "generation must be deterministic");
    }
}
