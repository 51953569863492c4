//! Structural extraction of event blocks from listing HTML.
//!
//! Event blocks are located by tag/attribute structure (anchors whose href
//! points at an event detail page), not by regex over the raw document, so
//! incidental whitespace or attribute churn on the site doesn't break the
//! scrape. A redesign of the site's structure will; that risk is accepted
//! and surfaced through the structural-change check in the pipeline.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use leekcal_core::EventRecord;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::dates::parse_event_times;

/// Below this input size, zero extracted events is "site returned nothing",
/// which the fetcher already screens; above it, zero events means the
/// repeated block structure is gone.
pub const NON_TRIVIAL_INPUT_BYTES: usize = 512;

/// Hrefs shorter than this are navigation links, not event pages
/// (the listing root itself is "/events/").
const MIN_EVENT_HREF_LEN: usize = 10;

const EVENT_PATH_PREFIX: &str = "/events/";

static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2, .event-title").unwrap());
static BLURB_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".event-description").unwrap());

/// Extract all event records from one listing page, in document order.
///
/// Blocks that fail to yield a title and a start time are skipped with a
/// warning; one malformed block never affects its siblings. Within a page,
/// the first block for a given event link wins.
pub fn extract_events(
    html: &str,
    page_url: &str,
    tz: Tz,
    now: DateTime<Utc>,
) -> Vec<EventRecord> {
    let document = Html::parse_document(html);
    let mut seen_hrefs: HashSet<String> = HashSet::new();
    let mut records = Vec::new();

    for anchor in document.select(&ANCHOR_SEL) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !is_event_href(href) {
            continue;
        }
        if !seen_hrefs.insert(href.to_string()) {
            debug!(href, "duplicate event link within page, keeping first");
            continue;
        }

        match extract_block(anchor, href, page_url, tz, now) {
            Some(record) => records.push(record),
            None => warn!(href, "skipping event block with no usable title/date"),
        }
    }

    records
}

fn is_event_href(href: &str) -> bool {
    href.starts_with(EVENT_PATH_PREFIX)
        && href != EVENT_PATH_PREFIX
        && href.len() > MIN_EVENT_HREF_LEN
}

fn extract_block(
    anchor: ElementRef<'_>,
    href: &str,
    page_url: &str,
    tz: Tz,
    now: DateTime<Utc>,
) -> Option<EventRecord> {
    let title = extract_title(anchor)?;

    // Date text lives in varying child elements; the parser works over the
    // block's full text so markup shuffles below the anchor don't matter.
    let block_text = anchor.text().collect::<Vec<_>>().join(" ");
    let times = parse_event_times(&block_text, tz, now)?;

    let source_url = resolve_url(page_url, href);

    let raw_id = match event_slug(href) {
        Some(slug) => slug,
        None => format!("{}-{}", slugify(&title), times.start.format("%Y%m%d")),
    };

    let description = anchor
        .select(&BLURB_SEL)
        .next()
        .map(collect_text)
        .filter(|t| !t.is_empty());

    Some(EventRecord {
        title,
        start: times.start,
        end: times.end,
        source_url,
        raw_id,
        description,
    })
}

/// Title from the block's heading, falling back to the first line of the
/// anchor's own text.
fn extract_title(anchor: ElementRef<'_>) -> Option<String> {
    let from_heading = anchor
        .select(&TITLE_SEL)
        .next()
        .map(collect_text)
        .filter(|t| !t.is_empty());

    from_heading
        .or_else(|| {
            anchor
                .text()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(str::to_string)
        })
        .filter(|t| !t.is_empty())
}

fn collect_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve_url(page_url: &str, href: &str) -> Option<String> {
    let base = Url::parse(page_url).ok()?;
    base.join(href).ok().map(String::from)
}

/// The event's URL slug, the stable identifier LeekDuck itself uses:
/// "/events/community-day-bulbasaur/" -> "community-day-bulbasaur".
fn event_slug(href: &str) -> Option<String> {
    let slug = href
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .map(slugify)
        .filter(|s| !s.is_empty())?;
    Some(slug)
}

/// Convert a string to an identifier-safe slug.
fn slugify(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .take(60)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Brussels;

    const PAGE_URL: &str = "https://leekduck.com/events/";

    fn june_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn extract(html: &str) -> Vec<EventRecord> {
        extract_events(html, PAGE_URL, Brussels, june_now())
    }

    const LISTING: &str = r#"
        <html><body>
        <a href="/news/">News</a>
        <a href="/events/community-day-bulbasaur/">
          <div class="event-item">
            <h2>Community Day: Bulbasaur</h2>
            <p>Sunday, October 12, 2025 10:00 AM to 1:00 PM Local Time</p>
          </div>
        </a>
        <a href="/events/raid-hour-mewtwo/">
          <div class="event-item">
            <h2>Raid Hour: Mewtwo</h2>
            <p>Wednesday, October 15, 2025, at 6:00 PM Local Time</p>
          </div>
        </a>
        </body></html>
    "#;

    #[test]
    fn test_extracts_blocks_in_document_order() {
        let records = extract(LISTING);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Community Day: Bulbasaur");
        assert_eq!(records[0].raw_id, "community-day-bulbasaur");
        assert_eq!(records[1].title, "Raid Hour: Mewtwo");
        assert_eq!(records[1].raw_id, "raid-hour-mewtwo");
    }

    #[test]
    fn test_links_resolve_to_absolute_urls() {
        let records = extract(LISTING);
        assert_eq!(
            records[0].source_url.as_deref(),
            Some("https://leekduck.com/events/community-day-bulbasaur/")
        );
    }

    #[test]
    fn test_same_day_range_parses_with_shared_date() {
        let records = extract(LISTING);

        let start = records[0].start;
        let end = records[0].end.expect("time range should give an end");
        assert_eq!(start, Brussels.with_ymd_and_hms(2025, 10, 12, 10, 0, 0).unwrap());
        assert_eq!(end, Brussels.with_ymd_and_hms(2025, 10, 12, 13, 0, 0).unwrap());
    }

    #[test]
    fn test_block_without_end_time_has_no_end() {
        let records = extract(LISTING);
        assert_eq!(records[1].end, None);
    }

    #[test]
    fn test_bad_date_drops_only_that_block() {
        let html = r#"
            <a href="/events/mystery-event-2025/">
              <h2>Mystery Event</h2>
              <p>Date to be announced</p>
            </a>
            <a href="/events/raid-hour-mewtwo/">
              <h2>Raid Hour: Mewtwo</h2>
              <p>Wednesday, October 15, 2025, at 6:00 PM Local Time</p>
            </a>
        "#;

        let records = extract(html);
        assert_eq!(records.len(), 1, "only the parseable block survives");
        assert_eq!(records[0].raw_id, "raid-hour-mewtwo");
    }

    #[test]
    fn test_duplicate_links_keep_first_block() {
        let html = r#"
            <a href="/events/raid-hour-mewtwo/">
              <h2>Raid Hour: Mewtwo</h2>
              <p>Wednesday, October 15, 2025, at 6:00 PM Local Time</p>
            </a>
            <a href="/events/raid-hour-mewtwo/">
              <h2>Raid Hour: Mewtwo (again)</h2>
              <p>Thursday, October 16, 2025, at 6:00 PM Local Time</p>
            </a>
        "#;

        let records = extract(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Raid Hour: Mewtwo");
    }

    #[test]
    fn test_navigation_links_are_ignored() {
        let html = r#"
            <a href="/events/">All events</a>
            <a href="/news/raid-hour/">News</a>
        "#;
        assert!(extract(html).is_empty());
    }

    #[test]
    fn test_title_falls_back_to_link_text() {
        let html = r#"
            <a href="/events/spotlight-hour-litwick/">
              Litwick Spotlight Hour
              <span>Tuesday, October 14, 2025, at 6:00 PM Local Time</span>
            </a>
        "#;

        let records = extract(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Litwick Spotlight Hour");
    }

    #[test]
    fn test_blurb_is_captured_when_present() {
        let html = r#"
            <a href="/events/community-day-bulbasaur/">
              <h2>Community Day: Bulbasaur</h2>
              <p>Sunday, October 12, 2025 10:00 AM to 1:00 PM</p>
              <p class="event-description">Bulbasaur will appear more often.</p>
            </a>
        "#;

        let records = extract(html);
        assert_eq!(
            records[0].description.as_deref(),
            Some("Bulbasaur will appear more often.")
        );
    }

    #[test]
    fn test_empty_input_extracts_nothing() {
        assert!(extract("").is_empty());
        assert!(extract("<html><body></body></html>").is_empty());
    }
}
