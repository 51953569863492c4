//! Full-regeneration pipeline: fetch -> extract -> serialize -> publish.
//!
//! Each run is a pure function of (remote markup, wall clock, config). The
//! feed is rebuilt from scratch and the output file replaced atomically;
//! on any escalated error the previously published file is left untouched.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use leekcal_core::ics::{FeedMetadata, generate_calendar};
use leekcal_core::{EventRecord, FeedConfig, LeekCalError};
use tracing::{debug, info, warn};

use crate::extract::{NON_TRIVIAL_INPUT_BYTES, extract_events};
use crate::fetch::Fetcher;

#[derive(Debug)]
pub struct RunSummary {
    pub events_written: usize,
    pub output: PathBuf,
}

/// Run one full regeneration: fetch every configured listing page, extract
/// and dedupe events, and atomically overwrite the output feed.
pub async fn run(
    config: &FeedConfig,
    fetcher: &Fetcher,
    now: DateTime<Utc>,
) -> Result<RunSummary> {
    let records = collect_records(config, fetcher, now).await?;

    let metadata = FeedMetadata {
        name: config.calendar_name.clone(),
        description: config.calendar_description.clone(),
        timezone: config.tz()?,
        default_duration: config.duration(),
    };

    let ics = generate_calendar(&records, &config.icon_table(), &metadata)?;

    let output = config.output_path();
    write_atomic(&output, &ics)
        .with_context(|| format!("writing feed to {}", output.display()))?;

    let events_written = records.iter().filter(|r| r.is_serializable()).count();
    info!(events_written, output = %output.display(), "feed regenerated");

    Ok(RunSummary {
        events_written,
        output,
    })
}

/// Fetch and extract all configured pages, deduping by `raw_id` across
/// pages. First occurrence wins, so the order of `urls` in the config is
/// meaningful.
pub async fn collect_records(
    config: &FeedConfig,
    fetcher: &Fetcher,
    now: DateTime<Utc>,
) -> Result<Vec<EventRecord>> {
    let tz = config.tz()?;
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut records = Vec::new();

    for url in &config.urls {
        let html = fetcher
            .fetch(url)
            .await
            .with_context(|| format!("fetching {url}"))?;

        let page_records = extract_events(&html, url, tz, now);

        if page_records.is_empty() && html.len() > NON_TRIVIAL_INPUT_BYTES {
            // Distinct from a legitimately empty listing: the page had real
            // content but none of it matched the expected block structure.
            let msg = format!(
                "no event blocks found in {url} ({} bytes of input); site structure may have changed",
                html.len()
            );
            if config.strict {
                return Err(LeekCalError::StructuralParse(msg).into());
            }
            warn!("{msg}");
        }

        for record in page_records {
            if seen_ids.insert(record.raw_id.clone()) {
                records.push(record);
            } else {
                debug!(raw_id = %record.raw_id, url, "duplicate event across pages, keeping first");
            }
        }
    }

    Ok(records)
}

/// Write via temp file + rename so a concurrent reader of the published
/// feed never sees a partial document.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("ics.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;

    Ok(())
}
