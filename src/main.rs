//! gymplanner - weekly workout plan, rest timer and progress log

use std::sync::Arc;

use anyhow::Result;
use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::info;

use gymplanner::caps::{DesktopCapabilities, ToastLevel, ToastQueue};
use gymplanner::config::{self, Config};
use gymplanner::db::LocalCache;
use gymplanner::input::{count_arg, weight_arg};
use gymplanner::model::{Day, ExerciseDraft, LogDraft, MuscleGroup};
use gymplanner::remote::{MemoryRemote, RemoteStore, SupabaseClient};
use gymplanner::store::{Session, WorkoutStore};
use gymplanner::timer::{TimerDriver, TimerState};
use gymplanner::tui::App;

#[derive(Parser)]
#[command(name = "gymplanner")]
#[command(author, version, about = "Weekly workout planner with rest timer and progress log")]
struct Cli {
    /// Local cache file
    #[arg(long, env = "GYMPLANNER_DB", default_value = config::DEFAULT_DB_PATH)]
    db: String,

    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: Option<String>,

    /// Supabase anon key
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    supabase_key: Option<String>,

    /// User access token; without it data is stored as "anonymous"
    #[arg(long, env = "SUPABASE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Ignore Supabase settings and keep remote data in memory
    #[arg(long)]
    offline: bool,

    /// Disable sound cues
    #[arg(long)]
    no_sound: bool,

    /// Disable desktop notifications
    #[arg(long)]
    no_notify: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open TUI dashboard
    Tui {
        /// Rest timer length in seconds
        #[arg(short, long, default_value_t = config::DEFAULT_REST_SECS)]
        rest: u32,
    },

    /// Show the weekly plan
    Plan,

    /// Show today's exercises
    Today,

    /// Add an exercise to a day
    AddExercise {
        /// Monday..Sunday
        day: Day,
        name: String,
        #[arg(short, long, default_value = "Chest")]
        group: MuscleGroup,
        #[arg(short, long, default_value = "3", value_parser = count_arg)]
        sets: u32,
        #[arg(short, long, default_value = "10", value_parser = count_arg)]
        reps: u32,
        /// Weight in kg
        #[arg(short, long, value_parser = weight_arg)]
        weight: Option<f64>,
    },

    /// Remove an exercise by id
    RemoveExercise { day: Day, id: String },

    /// Log progress for a muscle group
    Log {
        group: MuscleGroup,
        /// Calendar date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
        #[arg(short, long, value_parser = weight_arg)]
        weight: Option<f64>,
        #[arg(short, long, value_parser = count_arg)]
        reps: Option<u32>,
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List progress logs, newest first
    Logs {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Logs of one muscle group in date order
    Progress { group: MuscleGroup },

    /// Last training date per muscle group
    LastTrained,

    /// Muscle groups not trained recently
    Inactive {
        #[arg(short, long, default_value_t = config::DEFAULT_INACTIVE_DAYS)]
        days: i64,
    },

    /// Run a rest timer in the terminal
    Timer {
        #[arg(short, long, default_value_t = config::DEFAULT_REST_SECS,
              value_parser = clap::value_parser!(u32).range(config::MIN_REST_SECS as i64..=config::MAX_REST_SECS as i64))]
        seconds: u32,
    },

    /// Push the plan and logs to the remote store now
    Sync,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(matches!(cli.command, None | Some(Commands::Tui { .. })))?;

    let mut config = Config {
        db_path: cli.db.clone(),
        notifications: !cli.no_notify,
        sound: !cli.no_sound,
        ..Config::default()
    };
    if !cli.offline {
        config = config.with_remote(cli.supabase_url.clone(), cli.supabase_key.clone(), cli.access_token.clone());
    }

    match config.supabase.clone() {
        Some(remote) => {
            info!("Using Supabase at {}", remote.url);
            run(cli.command, config, SupabaseClient::new(&remote)?).await
        }
        None => {
            info!("No remote configured, remote data stays in memory");
            run(cli.command, config, MemoryRemote::default()).await
        }
    }
}

/// Dashboard logs go to a file so they do not tear the screen
fn init_logging(to_file: bool) -> Result<()> {
    if to_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(config::TUI_LOG_PATH)?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    }
    Ok(())
}

async fn run<R: RemoteStore + 'static>(command: Option<Commands>, config: Config, remote: R) -> Result<()> {
    let toasts = ToastQueue::default();
    let caps = Arc::new(DesktopCapabilities::new(config.notifications, config.sound, toasts.clone()));
    let cache = LocalCache::open(&config.db_path)?;
    let mut store = WorkoutStore::new(cache, Arc::new(remote), caps.clone(), Local::now().date_naive());

    let command = command.unwrap_or(Commands::Tui {
        rest: config.rest_secs,
    });

    match command {
        Commands::Tui { rest } => {
            let session = Session::start(store, config::SYNC_INTERVAL);
            let timer = TimerDriver::new(Config::clamp_rest(rest), caps);
            App::new(session, timer, toasts).run().await?;
            return Ok(());
        }

        Commands::Timer { seconds } => {
            run_timer(seconds, caps).await;
        }

        command => {
            store.load().await;
            one_shot(&mut store, command).await;
            store.flush().await;
        }
    }

    print_toasts(&toasts);
    Ok(())
}

async fn one_shot<R: RemoteStore + 'static>(store: &mut WorkoutStore<R>, command: Commands) {
    match command {
        Commands::Plan => {
            for day in store.state().plan.days() {
                println!("{}", day.day);
                if day.exercises.is_empty() {
                    println!("  (no exercises)");
                }
                for e in &day.exercises {
                    print_exercise(e);
                }
            }
        }

        Commands::Today => {
            let today = store.state().todays_plan();
            println!("Today is {}", today.day);
            println!("{:-<60}", "");
            if today.exercises.is_empty() {
                println!("No exercises planned.");
            }
            for e in &today.exercises {
                print_exercise(e);
            }
        }

        Commands::AddExercise { day, name, group, sets, reps, weight } => {
            let draft = ExerciseDraft {
                name: name.clone(),
                muscle_group: group,
                sets,
                reps,
                weight,
            };
            let id = store.add_exercise(day, draft);
            println!("Added: {} on {} - {}x{} (id: {})", name, day, sets, reps, id);
        }

        Commands::RemoveExercise { day, id } => {
            let before = store.state().plan.day(day).exercises.len();
            store.remove_exercise(day, &id);
            if store.state().plan.day(day).exercises.len() < before {
                println!("Removed {} from {}", id, day);
            } else {
                println!("No exercise {} on {}", id, day);
            }
        }

        Commands::Log { group, date, weight, reps, notes } => {
            let draft = LogDraft {
                date: date.unwrap_or_else(|| Local::now().date_naive()),
                muscle_group: group,
                weight,
                reps,
                notes,
            };
            let id = store.add_progress_log(draft);
            println!("Logged {} (id: {})", group, id);
        }

        Commands::Logs { limit } => {
            println!("Recent progress:");
            println!("{:-<60}", "");
            for l in store.state().logs.iter().take(limit) {
                print_log(l);
            }
        }

        Commands::Progress { group } => {
            let logs = store.state().progress_by_group(group);
            println!("{} progress ({} entries)", group, logs.len());
            println!("{:-<60}", "");
            for l in &logs {
                print_log(l);
            }
        }

        Commands::LastTrained => {
            let last = store.state().last_trained_by_group();
            for group in MuscleGroup::all() {
                match last.get(group) {
                    Some(date) => println!("{:10} {}", group.label(), date),
                    None => println!("{:10} never", group.label()),
                }
            }
        }

        Commands::Inactive { days } => {
            let inactive = store.state().inactive_muscle_groups(days, Utc::now());
            if inactive.is_empty() {
                println!("Every muscle group trained in the last {} days", days);
            } else {
                println!("Not trained in {} days:", days);
                for g in inactive {
                    println!("  {}", g);
                }
            }
        }

        Commands::Sync => {
            let report = store.sync_now().await;
            println!("Synced: {} pushed, {} failed", report.pushed, report.failed);
        }

        Commands::Tui { .. } | Commands::Timer { .. } => {}
    }
}

async fn run_timer(seconds: u32, caps: Arc<DesktopCapabilities>) {
    let mut timer = TimerDriver::new(seconds, caps);
    let mut updates = timer.subscribe();
    timer.start();

    loop {
        let snapshot = updates.borrow_and_update().clone();
        print!("\rRest {}  {:>3.0}%", snapshot.display(), snapshot.progress());
        let _ = std::io::Write::flush(&mut std::io::stdout());

        if snapshot.state() == TimerState::Completed {
            println!();
            break;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                timer.reset();
                println!("\nTimer cancelled");
                return;
            }
        }
    }

    // Completion effects run on a blocking task; give them a moment to queue the toast
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
}

fn print_exercise(e: &gymplanner::model::Exercise) {
    let weight = e.weight.map(|w| format!(" @ {}kg", w)).unwrap_or_default();
    println!("  {:24} {:10} {}x{}{}  [{}]", e.name, e.muscle_group.label(), e.sets, e.reps, weight, e.id);
}

fn print_log(l: &gymplanner::model::ProgressLog) {
    println!(
        "{} | {:10} | {:>7} | {:>4} | {}",
        l.date,
        l.muscle_group.label(),
        l.weight.map(|w| format!("{}kg", w)).unwrap_or_else(|| "-".into()),
        l.reps.map(|r| r.to_string()).unwrap_or_else(|| "-".into()),
        l.notes.as_deref().unwrap_or("-")
    );
}

fn print_toasts(toasts: &ToastQueue) {
    for toast in toasts.drain() {
        let marker = match toast.level {
            ToastLevel::Success => "✓",
            ToastLevel::Error => "✗",
            ToastLevel::Info => "•",
        };
        match toast.description {
            Some(d) => println!("{} {} {}", marker, toast.message, d),
            None => println!("{} {}", marker, toast.message),
        }
    }
}
