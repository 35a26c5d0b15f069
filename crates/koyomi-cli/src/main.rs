//! Command line front end: normalize an iCalendar file into a
//! zone-aware agenda.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use koyomi_engine::{AgendaOptions, InvalidEventPolicy, build_agenda};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "koyomi")]
#[command(about = "Expand and normalize the events of an iCalendar file")]
struct Cli {
    /// Path to the .ics file
    file: PathBuf,

    /// Convert UTC values into this zone (e.g. "Europe/Paris")
    #[arg(short, long)]
    zone: Option<String>,

    /// Zone label reported for floating values
    #[arg(long, default_value = "UTC")]
    default_zone: String,

    /// Per-event occurrence cap for unbounded recurrences
    #[arg(long, default_value_t = koyomi_engine::DEFAULT_OCCURRENCE_CAP)]
    limit: u16,

    /// Fail on uninterpretable events instead of skipping them
    #[arg(long)]
    strict: bool,

    /// Emit the agenda as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let input = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("reading {}", cli.file.display()))?;
    debug!(path = %cli.file.display(), bytes = input.len(), "loaded calendar document");

    let options = AgendaOptions {
        target_zone: cli.zone,
        default_zone: cli.default_zone,
        max_occurrences: cli.limit,
        invalid_events: if cli.strict {
            InvalidEventPolicy::Fail
        } else {
            InvalidEventPolicy::Skip
        },
    };

    let agenda = build_agenda(&input, &options).context("normalizing calendar")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&agenda)?);
        return Ok(());
    }

    for occurrence in &agenda.occurrences {
        let title = occurrence.title.as_deref().unwrap_or("(untitled)");
        match &occurrence.end {
            Some(end) => println!("{} .. {end}  {title}", occurrence.start),
            None => println!("{}  {title}", occurrence.start),
        }
    }

    if !agenda.zones.is_empty() {
        let zones: Vec<_> = agenda.zones.iter().map(String::as_str).collect();
        println!();
        println!("zones: {}", zones.join(", "));
    }

    for warning in &agenda.warnings {
        eprintln!("warning: {warning}");
    }

    Ok(())
}
