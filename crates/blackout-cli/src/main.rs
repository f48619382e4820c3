//! `blackout` CLI — manage a blackout calendar, exclusion overrides and jobs
//! stored in a snapshot file, and ask which jobs could start now.
//!
//! ## Usage
//!
//! ```sh
//! # Replace the calendar from an .ics file (or stdin)
//! blackout import -i calendar.ics
//!
//! # Add a one-off or recurring blackout
//! blackout add-event --start 2024-07-01T09:00 --end 2024-07-01T12:00 --name maintenance
//! blackout add-event --start 2024-07-01T00:00 --end 2024-07-01T06:00 --rrule FREQ=DAILY
//!
//! # Reopen blacked-out time
//! blackout exclude --start 2024-07-03T00:00 --end 2024-07-03T06:00
//!
//! # Register jobs and ask which could start at a given instant
//! blackout add-job --name benchy --duration 01:30
//! blackout suggest --at 2024-07-01T06:00
//!
//! # Use a different snapshot file
//! BLACKOUT_SNAPSHOT=/var/lib/blackout/schedule.json blackout jobs
//! ```
//!
//! Instants accept RFC 3339 or a naive `YYYY-MM-DDTHH:MM[:SS]`, read as UTC.
//! Results are printed as JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use blackout_engine::timestamp::parse_utc;
use blackout_engine::{Interval, Job, JobId, RecurrenceRule, Schedule, SnapshotStore};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Longest period the listing queries accept.
const MAX_QUERY_SPAN_DAYS: i64 = 365;

#[derive(Parser)]
#[command(
    name = "blackout",
    version,
    about = "Blackout calendar scheduling CLI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Snapshot file holding the schedule
    #[arg(
        long,
        global = true,
        env = "BLACKOUT_SNAPSHOT",
        default_value = "schedule.json"
    )]
    snapshot: PathBuf,

    /// Log engine activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the calendar with events read from iCalendar text
    Import {
        /// Input .ics file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Add a blackout event, recurring when --rrule is given
    AddEvent {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long)]
        name: Option<String>,
        /// RFC 5545 rule text, e.g. "FREQ=WEEKLY;BYDAY=MO"
        #[arg(long)]
        rrule: Option<String>,
        /// Last instant a recurrence may start (requires --rrule)
        #[arg(long, requires = "rrule")]
        stop: Option<String>,
    },
    /// List blackout occurrences in a period
    Events {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Reopen a blacked-out period
    Exclude {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// List exclusion overrides in a period
    Exclusions {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Show free windows starting at an instant
    Available {
        #[arg(long)]
        start: String,
        /// Window length as HH:MM
        #[arg(long)]
        duration: String,
    },
    /// Register a job
    AddJob {
        #[arg(long)]
        name: String,
        /// Job length as HH:MM
        #[arg(long)]
        duration: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Remove a job by id
    RemoveJob { id: JobId },
    /// List registered jobs
    Jobs,
    /// Jobs that could start at an instant, longest first
    Suggest {
        /// Defaults to now
        #[arg(long)]
        at: Option<String>,
    },
    /// Drop every exclusion override
    Reset,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let store = SnapshotStore::new(&cli.snapshot);
    let mut schedule = store
        .load_or_default()
        .with_context(|| format!("Failed to load snapshot: {}", cli.snapshot.display()))?;

    let changed = run(cli.command, &mut schedule)?;
    if changed {
        store
            .save(&schedule)
            .with_context(|| format!("Failed to save snapshot: {}", cli.snapshot.display()))?;
    } else {
        tracing::debug!(path = %cli.snapshot.display(), "schedule unchanged, snapshot not rewritten");
    }
    Ok(())
}

/// Execute one command; returns whether the schedule changed.
fn run(command: Commands, schedule: &mut Schedule) -> Result<bool> {
    match command {
        Commands::Import { input } => {
            let text = read_input(input.as_deref())?;
            let count = schedule
                .import_calendar(&text)
                .context("Calendar file cannot be parsed")?;
            print_json(&json!({ "message": "Schedule updated successfully", "events": count }))?;
            Ok(true)
        }
        Commands::AddEvent {
            start,
            end,
            name,
            rrule,
            stop,
        } => {
            let stop = stop.as_deref().map(parse_instant).transpose()?;
            schedule
                .add_event(
                    parse_instant(&start)?,
                    parse_instant(&end)?,
                    name,
                    rrule.map(RecurrenceRule::new),
                    stop,
                )
                .context("Cannot add event")?;
            print_json(&json!({ "message": "Event added successfully" }))?;
            Ok(true)
        }
        Commands::Events { start, end } => {
            let period = parse_query_period(&start, &end)?;
            let events = schedule
                .blackout_events(period)
                .context("Cannot expand calendar")?;
            print_json(&events)?;
            Ok(false)
        }
        Commands::Exclude { start, end } => {
            schedule.add_exclusion_interval(parse_period(&start, &end)?);
            print_json(&json!({ "message": "Interval excluded successfully" }))?;
            Ok(true)
        }
        Commands::Exclusions { start, end } => {
            let period = parse_query_period(&start, &end)?;
            print_json(schedule.exclusions_within(period).intervals())?;
            Ok(false)
        }
        Commands::Available { start, duration } => {
            let free = schedule
                .available_intervals(parse_instant(&start)?, parse_hh_mm(&duration)?)
                .context("Cannot compute availability")?;
            print_json(free.intervals())?;
            Ok(false)
        }
        Commands::AddJob {
            name,
            duration,
            description,
        } => {
            let job = Job::new(name, parse_hh_mm(&duration)?)
                .context("Cannot add job")?
                .with_description(description);
            let id = schedule.add_job(job);
            print_json(&json!({ "id": id, "message": "Job submitted successfully" }))?;
            Ok(true)
        }
        Commands::RemoveJob { id } => {
            let count = schedule.remove_job(id);
            print_json(&json!({ "message": "Job remove success", "count": count }))?;
            Ok(count > 0)
        }
        Commands::Jobs => {
            print_json(&json!({ "jobs": schedule.jobs() }))?;
            Ok(false)
        }
        Commands::Suggest { at } => {
            let at = match at {
                Some(raw) => parse_instant(&raw)?,
                None => Utc::now(),
            };
            let options = schedule
                .scheduled_job_options(at)
                .context("Cannot compute job options")?;
            print_json(&options)?;
            Ok(false)
        }
        Commands::Reset => {
            schedule.reset();
            print_json(&json!({ "message": "Exclusions cleared" }))?;
            Ok(true)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    parse_utc(raw).with_context(|| format!("Cannot parse date: {:?}", raw))
}

fn parse_period(start: &str, end: &str) -> Result<Interval> {
    Interval::new(parse_instant(start)?, parse_instant(end)?).context("Cannot parse date interval")
}

/// A listing period, capped at [`MAX_QUERY_SPAN_DAYS`].
fn parse_query_period(start: &str, end: &str) -> Result<Interval> {
    let period = parse_period(start, end)?;
    if period.duration() > Duration::days(MAX_QUERY_SPAN_DAYS) {
        anyhow::bail!(
            "Target interval is over {} days long. Please make it shorter",
            MAX_QUERY_SPAN_DAYS
        );
    }
    Ok(period)
}

/// Parse `HH:MM` into a duration. Hours may exceed 23.
fn parse_hh_mm(raw: &str) -> Result<Duration> {
    let parsed = raw.trim().split_once(':').and_then(|(hours, minutes)| {
        let hours: u32 = hours.parse().ok()?;
        let minutes: u32 = minutes.parse().ok()?;
        if minutes >= 60 {
            return None;
        }
        Duration::try_minutes(i64::from(hours) * 60 + i64::from(minutes))
    });
    parsed.with_context(|| format!("Duration must be HH:MM, got {:?}", raw))
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
