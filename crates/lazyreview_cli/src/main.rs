//! `lazyreview` command line front end.
//!
//! # Responsibility
//! - Map each subcommand onto one `ReviewService` operation.
//! - Print the resulting payload as plain text.

mod app;

use anyhow::{bail, Result};
use app::App;
use clap::{Parser, Subcommand};
use lazyreview_core::{format_date, parse_date, today, Chapter, SyncSummary};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lazyreview", about = "Spaced-repetition review planner", version)]
struct Cli {
    /// Configuration file (defaults apply when it does not exist)
    #[arg(long, global = true, default_value = "lazyreview.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a chapter and schedule its review cycle
    Add {
        subject: String,
        chapter: String,
        /// Cycle start date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        start: Option<String>,
    },

    /// List chapters due for review
    Due {
        /// Day to check, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// List subjects and chapters
    List,

    /// Confirm the pending review of a chapter
    Confirm { subject: String, chapter: String },

    /// Restart a chapter's cycle from today
    Decline { subject: String, chapter: String },

    /// Delete one chapter
    DeleteChapter { subject: String, chapter: String },

    /// Delete a subject with all its chapters
    DeleteSubject { subject: String },

    /// Delete everything and restore default intervals
    ResetAll {
        /// Required; the reset cannot be undone
        #[arg(long)]
        yes: bool,
    },

    /// Show or change review intervals
    #[command(subcommand)]
    Intervals(IntervalsCommand),
}

#[derive(Subcommand)]
enum IntervalsCommand {
    /// Print the current intervals
    Show,
    /// Replace the intervals, e.g. `set 1 3 7 15`
    Set {
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        values: Vec<String>,
    },
    /// Restore 1 3 7 15
    Reset,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut app = App::open(&cli.config)?;

    match cli.command {
        Command::Add {
            subject,
            chapter,
            start,
        } => {
            let start = start.unwrap_or_else(|| format_date(today()));
            let outcome = app
                .service
                .add_subject_and_chapter(&subject, &chapter, &start)?;
            println!("Added {} - {}", outcome.subject, outcome.chapter.title());
            print_schedule(&outcome.chapter);
            print_sync(&app, outcome.sync);
        }
        Command::Due { date } => {
            let date = match date {
                Some(text) => parse_date(&text)?,
                None => today(),
            };
            let due = app.service.list_due_today(date);
            if due.is_empty() {
                println!("Nothing due on {}", format_date(date));
            }
            for review in due {
                println!("{} - {}", review.subject, review.chapter.title());
            }
        }
        Command::List => {
            for subject in app.service.list_subjects() {
                println!("{}", subject.name);
                for chapter in subject.chapters {
                    let next = chapter
                        .next_review_date
                        .map(format_date)
                        .unwrap_or_else(|| "completed".to_string());
                    println!(
                        "  {}  next: {}  remaining: {}",
                        chapter.title, next, chapter.remaining_reviews
                    );
                }
            }
        }
        Command::Confirm { subject, chapter } => {
            let outcome = app.service.confirm_review(&subject, &chapter)?;
            match outcome.chapter.next_review_date() {
                Some(next) => println!("Confirmed; next review {}", format_date(next)),
                None => println!("Confirmed; review cycle completed"),
            }
            print_sync(&app, outcome.sync);
        }
        Command::Decline { subject, chapter } => {
            let outcome = app.service.decline_review(&subject, &chapter, today())?;
            println!("Restarted {} - {}", outcome.subject, outcome.chapter.title());
            print_schedule(&outcome.chapter);
            print_sync(&app, outcome.sync);
        }
        Command::DeleteChapter { subject, chapter } => {
            let sync = app.service.delete_chapter(&subject, &chapter)?;
            println!("Deleted {subject} - {chapter}");
            print_sync(&app, sync);
        }
        Command::DeleteSubject { subject } => {
            let sync = app.service.delete_subject(&subject)?;
            println!("Deleted {subject}");
            print_sync(&app, sync);
        }
        Command::ResetAll { yes } => {
            if !yes {
                bail!("reset-all deletes every subject; pass --yes to proceed");
            }
            let sync = app.service.reset_all_data()?;
            println!("All data cleared");
            print_sync(&app, sync);
        }
        Command::Intervals(IntervalsCommand::Show) => {
            println!("{}", app.service.intervals());
        }
        Command::Intervals(IntervalsCommand::Set { values }) => {
            let intervals = app.service.set_intervals_text(&values.join(" "))?;
            println!("Intervals set to {intervals}");
        }
        Command::Intervals(IntervalsCommand::Reset) => {
            let intervals = app.service.reset_intervals_to_default()?;
            println!("Intervals reset to {intervals}");
        }
    }

    Ok(())
}

fn print_schedule(chapter: &Chapter) {
    let dates = chapter
        .review_dates()
        .into_iter()
        .map(format_date)
        .collect::<Vec<_>>();
    match chapter.next_review_date() {
        Some(next) if dates.is_empty() => println!("  next: {}", format_date(next)),
        Some(next) => println!("  next: {}  then: {}", format_date(next), dates.join(", ")),
        None => println!("  cycle completed"),
    }
}

fn print_sync(app: &App, sync: SyncSummary) {
    if !app.calendar_enabled() {
        return;
    }
    println!(
        "  calendar: {} scheduled, {} cancelled, {} failed ({})",
        sync.scheduled, sync.cancelled, sync.failed, app.config.calendar.calendar_id
    );
}
