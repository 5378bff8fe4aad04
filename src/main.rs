//! treino - Personal weekly workout schedule

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{Mutex, mpsc};

use treino::config::{self, Config};
use treino::exercises::{DayName, Exercise, NewExercise};
use treino::schedule::{self, CalendarNavigator, Capability, SyncReport, WeekSchedule, catalog};
use treino::settings::{self, FileStorage};
use treino::timer::{self, SetState, TimerEventKind, TimerService};
use treino::timespec::{format_clock, parse_time_to_seconds};
use treino::week::{self, parse_date};
use treino::Database;

#[derive(Parser)]
#[command(name = "treino")]
#[command(author, version, about = "Weekly workout schedule with calendar history and rest timers")]
struct Cli {
    /// SQLite file with the schedule
    #[arg(long, env = config::DB_PATH_VAR)]
    db: Option<String>,

    /// Local settings file (reset watermark, default rest)
    #[arg(long, env = config::SETTINGS_PATH_VAR)]
    settings: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show this week's schedule
    Show,

    /// Add an exercise to a weekday
    Add {
        /// Weekday ("Segunda-feira", "seg", 0-6)
        day: String,
        name: String,
        #[arg(short, long, default_value = "3")]
        sets: u32,
        #[arg(short, long, default_value = "10")]
        reps: u32,
        /// Hold time ("30s", "1min")
        #[arg(short, long, default_value = "")]
        time: String,
    },

    /// Flip an exercise's completed flag
    Toggle {
        day: String,
        /// Exercise id or unique prefix
        id: String,
    },

    /// Remove an exercise from a weekday
    Delete { day: String, id: String },

    /// Show a calendar week (0 = this week, -1 = last week)
    Week {
        #[arg(default_value = "0", allow_hyphen_values = true)]
        offset: i64,
    },

    /// Add an exercise on a calendar date (YYYY-MM-DD)
    CalAdd {
        date: String,
        name: String,
        #[arg(short, long, default_value = "3")]
        sets: u32,
        #[arg(short, long, default_value = "10")]
        reps: u32,
        #[arg(short, long, default_value = "")]
        time: String,
    },

    /// Flip completed on a calendar date
    CalToggle { date: String, id: String },

    /// Remove an exercise from a calendar date
    CalDelete { date: String, id: String },

    /// Show or set the default rest between sets
    Rest {
        /// New value ("90s", "2min"); empty string restores the default
        value: Option<String>,
    },

    /// Run the set/rest cycle for an exercise
    Train { day: String, id: String },

    /// Run the isometric hold timer for an exercise
    Hold { day: String, id: String },

    /// List known exercise names
    Catalog {
        /// Substring filter
        filter: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    config::load_dotenv();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env().with_overrides(cli.db, cli.settings);

    let db = Database::open(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path))?;
    let storage = FileStorage::open(&config.settings_path)
        .with_context(|| format!("opening {}", config.settings_path))?;
    let today = Local::now().date_naive();

    let startup = schedule::start_session(&db, &storage, today);
    if !startup.reset.failures.is_empty() {
        println!(
            "Weekly reset incomplete ({} failures), will retry next start",
            startup.reset.failures.len()
        );
    }

    let mut week_schedule = WeekSchedule::open(&db, Capability::Editable);

    match cli.command {
        Some(Commands::Show) | None => print_schedule(&week_schedule),

        Some(Commands::Add { day, name, sets, reps, time }) => {
            let day = parse_day(&day)?;
            let (exercise, report) =
                week_schedule.add_exercise(day, NewExercise::new(name, sets, reps, time), today)?;
            warn_unsynced(&report);
            println!("Added to {}: {} (id: {})", day, exercise.name, short_id(&exercise.id));
        }

        Some(Commands::Toggle { day, id }) => {
            let day = parse_day(&day)?;
            let id = resolve_id(day_exercises(&week_schedule, day)?, &id)?;
            warn_unsynced(&week_schedule.toggle_complete(day, &id, today)?);
            week_schedule.refresh();
            print_schedule(&week_schedule);
        }

        Some(Commands::Delete { day, id }) => {
            let day = parse_day(&day)?;
            let id = resolve_id(day_exercises(&week_schedule, day)?, &id)?;
            warn_unsynced(&week_schedule.delete_exercise(day, &id, today)?);
            println!("Deleted {} from {}", short_id(&id), day);
        }

        Some(Commands::Week { offset }) => {
            let mut calendar = CalendarNavigator::new(&db, today, Capability::Editable);
            calendar.shift_weeks(offset);
            calendar.load_week();
            print_calendar(&calendar, today);
        }

        Some(Commands::CalAdd { date, name, sets, reps, time }) => {
            let date = parse_date_arg(&date)?;
            let mut calendar = CalendarNavigator::new(&db, today, Capability::Editable);
            let (exercise, report) =
                calendar.add_exercise(date, NewExercise::new(name, sets, reps, time))?;
            warn_unsynced(&report);
            println!("Added on {}: {} (id: {})", date, exercise.name, short_id(&exercise.id));
        }

        Some(Commands::CalToggle { date, id }) => {
            let date = parse_date_arg(&date)?;
            let mut calendar = CalendarNavigator::new(&db, today, Capability::Editable);
            calendar.show_week_of(date);
            calendar.load_week();
            let id = resolve_id(calendar_exercises(&calendar, date), &id)?;
            warn_unsynced(&calendar.toggle_complete(date, &id)?);
            print_calendar(&calendar, today);
        }

        Some(Commands::CalDelete { date, id }) => {
            let date = parse_date_arg(&date)?;
            let mut calendar = CalendarNavigator::new(&db, today, Capability::Editable);
            calendar.show_week_of(date);
            calendar.load_week();
            let id = resolve_id(calendar_exercises(&calendar, date), &id)?;
            warn_unsynced(&calendar.delete_exercise(date, &id)?);
            println!("Deleted {} from {}", short_id(&id), date);
        }

        Some(Commands::Rest { value }) => {
            if let Some(value) = value {
                settings::set_default_rest(&storage, &value)?;
            }
            let rest = settings::default_rest(&storage);
            println!("Default rest: {} ({})", rest, format_clock(parse_time_to_seconds(&rest)));
        }

        Some(Commands::Train { day, id }) => {
            let day = parse_day(&day)?;
            let id = resolve_id(day_exercises(&week_schedule, day)?, &id)?;
            let rest = settings::rest_seconds(&storage);
            train(&mut week_schedule, day, &id, rest, today).await?;
        }

        Some(Commands::Hold { day, id }) => {
            let day = parse_day(&day)?;
            let id = resolve_id(day_exercises(&week_schedule, day)?, &id)?;
            hold(&mut week_schedule, day, &id, today).await?;
        }

        Some(Commands::Catalog { filter }) => {
            let names = catalog::names(&db)?;
            for name in catalog::suggestions(&names, filter.as_deref().unwrap_or("")) {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

fn parse_day(text: &str) -> Result<DayName> {
    Ok(text.parse::<DayName>()?)
}

fn parse_date_arg(text: &str) -> Result<NaiveDate> {
    parse_date(text).with_context(|| format!("expected YYYY-MM-DD, got {:?}", text))
}

fn day_exercises<'a>(schedule: &'a WeekSchedule<'_>, day: DayName) -> Result<&'a [Exercise]> {
    schedule
        .day(day)
        .map(|d| d.exercises.as_slice())
        .with_context(|| format!("{} is not loaded", day))
}

fn calendar_exercises<'a>(calendar: &'a CalendarNavigator<'_>, date: NaiveDate) -> &'a [Exercise] {
    calendar
        .column(date)
        .map(|c| c.exercises.as_slice())
        .unwrap_or(&[])
}

/// Full id or a unique prefix of one
fn resolve_id(exercises: &[Exercise], prefix: &str) -> Result<String> {
    let matches: Vec<_> = exercises.iter().filter(|e| e.id.starts_with(prefix)).collect();
    match matches.as_slice() {
        [one] => Ok(one.id.clone()),
        [] => bail!("no exercise with id {}", prefix),
        _ => bail!("id prefix {} is ambiguous", prefix),
    }
}

/// First 8 characters of an id
fn short_id(id: &str) -> &str {
    id.char_indices().nth(8).map_or(id, |(i, _)| &id[..i])
}

fn progress_bar(fraction_left: f32) -> String {
    const WIDTH: usize = 20;
    let filled = ((fraction_left.clamp(0.0, 1.0) * WIDTH as f32).round()) as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(WIDTH - filled))
}

fn warn_unsynced(report: &SyncReport) {
    if !report.is_clean() {
        println!("Saved locally, {} store write(s) failed; retry later", report.failures.len());
    }
}

fn print_exercises(exercises: &[Exercise]) {
    for ex in exercises {
        let hold = match parse_time_to_seconds(&ex.time) {
            0 => String::new(),
            secs => format_clock(secs),
        };
        println!(
            "  [{}] {} | {:20} | {}x{} | {}",
            if ex.completed { "x" } else { " " },
            short_id(&ex.id),
            ex.name,
            ex.sets,
            ex.reps,
            hold
        );
    }
}

fn print_schedule(schedule: &WeekSchedule<'_>) {
    if schedule.days().is_empty() {
        println!("No workout days loaded");
        return;
    }
    for day in schedule.days() {
        println!("{:-<60}", "");
        println!("{} ({:.0}%)", day.name, day.progress());
        if day.is_rest_day() {
            println!("  Dia de descanso!");
        }
        print_exercises(&day.exercises);
    }
}

fn print_calendar(calendar: &CalendarNavigator<'_>, today: NaiveDate) {
    let marker = if calendar.is_current_week() { " (this week)" } else { "" };
    println!("Week {}{}", calendar.range_label(), marker);
    for column in calendar.week() {
        println!("{:-<60}", "");
        let here = if column.date == today { " <" } else { "" };
        println!(
            "{} {} ({:.0}%){}",
            week::format_display(column.date),
            column.day_name.short(),
            column.progress(),
            here
        );
        if column.exercises.is_empty() {
            println!("  Dia de descanso!");
        }
        print_exercises(&column.exercises);
    }
}

/// Interactive set/rest cycle: Enter marks the current set, rest counts down,
/// the last rest marks the exercise completed.
async fn train(
    schedule: &mut WeekSchedule<'_>,
    day: DayName,
    id: &str,
    rest_seconds: u32,
    today: NaiveDate,
) -> Result<()> {
    let exercise = schedule
        .find_exercise(day, id)
        .cloned()
        .context("exercise disappeared")?;

    let service = Arc::new(Mutex::new(TimerService::new()));
    service.lock().await.track_sets(&exercise, schedule.capability());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _ticker = timer::spawn_ticker(service.clone(), timer::TICK, tx);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}: {} sets x {} reps, rest {}", exercise.name, exercise.total_sets(), exercise.reps, format_clock(rest_seconds));

    loop {
        let state = match service.lock().await.sets(id) {
            Some(timer) => timer.state(),
            None => break,
        };

        match state {
            SetState::Idle { sets_done } => {
                println!("Set {}/{} - press Enter when done", sets_done + 1, exercise.total_sets());
                if lines.next_line().await?.is_none() {
                    break;
                }
                service.lock().await.tap_set(id, sets_done, rest_seconds)?;
            }
            SetState::Resting { .. } => {
                let Some(batch) = rx.recv().await else { break };
                let completed = batch
                    .iter()
                    .any(|e| e.exercise_id == id && e.kind == TimerEventKind::Completed);
                if completed {
                    warn_unsynced(&schedule.mark_completed(day, id, today)?);
                    println!("{} completed!", exercise.name);
                    break;
                }
                let service = service.lock().await;
                if let Some(timer) = service.sets(id)
                    && let SetState::Resting { seconds_left, .. } = timer.state()
                {
                    println!("Rest {} {}", format_clock(seconds_left), progress_bar(timer.rest_fraction_left()));
                }
            }
            SetState::Complete => break,
        }
    }

    Ok(())
}

/// Isometric hold: Enter pauses/resumes (or restarts a finished hold)
async fn hold(schedule: &mut WeekSchedule<'_>, day: DayName, id: &str, today: NaiveDate) -> Result<()> {
    let exercise = schedule
        .find_exercise(day, id)
        .cloned()
        .context("exercise disappeared")?;

    let service = Arc::new(Mutex::new(TimerService::new()));
    if !service.lock().await.track_hold(&exercise, schedule.capability()) {
        bail!("{} has no hold time", exercise.name);
    }
    service.lock().await.hold_mut(id)?.start();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _ticker = timer::spawn_ticker(service.clone(), timer::TICK, tx);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}: hold {} - Enter to pause/resume", exercise.name, exercise.time);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                if line?.is_none() {
                    break;
                }
                let mut service = service.lock().await;
                let timer = service.hold_mut(id)?;
                timer.control();
                println!("{}", if timer.is_running() { "Running" } else { "Paused" });
            }
            batch = rx.recv() => {
                let Some(batch) = batch else { break };
                if batch.iter().any(|e| e.exercise_id == id && e.kind == TimerEventKind::Completed) {
                    warn_unsynced(&schedule.mark_completed(day, id, today)?);
                    println!("{} completed!", exercise.name);
                    break;
                }
                if let Some(timer) = service.lock().await.hold(id)
                    && timer.is_running()
                {
                    println!("{} {}", format_clock(timer.remaining()), progress_bar(timer.fraction_left()));
                }
            }
        }
    }

    Ok(())
}
