mod dates;
mod extract;
mod fetch;
mod pipeline;

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use leekcal_core::FeedConfig;
use tracing_subscriber::EnvFilter;

use fetch::Fetcher;

#[derive(Parser)]
#[command(name = "leekcal")]
#[command(about = "Scrape Pokémon GO events from LeekDuck into an iCalendar feed")]
struct Cli {
    /// Config file path (defaults to ~/.config/leekcal/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate the feed from scratch and overwrite the output file
    Run,
    /// Fetch and parse events, print them, write nothing
    Preview,
    /// Create a default config file with all options commented out
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("leekcal=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => cmd_run(cli.config).await,
        Commands::Preview => cmd_preview(cli.config).await,
        Commands::Init => cmd_init(cli.config),
    }
}

async fn cmd_run(config_path: Option<PathBuf>) -> Result<()> {
    let config = FeedConfig::load(config_path.as_deref())?;
    let fetcher = Fetcher::new()?;

    let summary = pipeline::run(&config, &fetcher, Utc::now()).await?;

    println!(
        "📅 Wrote {} events to {}",
        summary.events_written,
        summary.output.display()
    );

    Ok(())
}

async fn cmd_preview(config_path: Option<PathBuf>) -> Result<()> {
    let config = FeedConfig::load(config_path.as_deref())?;
    let fetcher = Fetcher::new()?;
    let icons = config.icon_table();

    let records = pipeline::collect_records(&config, &fetcher, Utc::now()).await?;

    println!("Found {} events", records.len());

    for record in &records {
        let end = record.end_or_default(config.duration());
        let duration = end - record.start;
        let duration_str = if duration.num_days() > 0 {
            format!("{}d {}h", duration.num_days(), duration.num_hours() % 24)
        } else {
            format!("{}h {}m", duration.num_hours(), duration.num_minutes() % 60)
        };

        println!("  - {} {}", icons.classify(&record.title), record.title);
        println!(
            "    {} -> {} ({})",
            record.start.format("%Y-%m-%d %H:%M %Z"),
            end.format("%Y-%m-%d %H:%M %Z"),
            duration_str
        );
    }

    Ok(())
}

fn cmd_init(config_path: Option<PathBuf>) -> Result<()> {
    let path = match config_path {
        Some(p) => p,
        None => FeedConfig::config_path()?,
    };

    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    FeedConfig::create_default_config(&path)?;
    println!("Wrote default config to {}", path.display());
    println!("Run `leekcal run` to generate the feed.");

    Ok(())
}
