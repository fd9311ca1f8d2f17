use clap::{Parser, Subcommand, ValueEnum};
use pulse_core::weekly::{CARDIO_WEEKLY_TARGET, SKILL_WEEKLY_TARGET};
use pulse_core::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Number of log entries shown by `status`
const RECENT_LOG_COUNT: usize = 16;

#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "Celestial Pulse calisthenics progress tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use a specific config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage local profiles
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// List every movement and skill ladder
    Catalog,

    /// Show XP, level, weekly progress and recent logs
    Status,

    /// Log a workout for the active user
    Log {
        #[command(subcommand)]
        activity: LogActivity,
    },

    /// Move one step up or down a movement or skill ladder
    Step {
        /// Movement or skill key (e.g. pushup, lsit)
        key: String,

        #[arg(value_enum)]
        direction: StepDirection,
    },

    /// Export the active user's progress as JSON
    Export {
        /// Directory to write into (defaults to the configured export dir)
        #[arg(long, conflicts_with = "stdout")]
        out: Option<PathBuf>,

        /// Print the document instead of writing a file
        #[arg(long)]
        stdout: bool,
    },

    /// Replace the active user's progress with an exported document
    Import {
        file: PathBuf,
    },

    /// Discard all of the active user's progress
    Reset {
        /// Confirm the reset; it cannot be undone
        #[arg(long)]
        yes: bool,
    },

    /// Write the active user's log history to a CSV file
    HistoryCsv {
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a profile and log in as it
    Create { username: String },

    /// Log in as an existing profile
    Login { username: String },

    /// End the current session
    Logout,

    /// List profiles, most recently active first
    List,

    /// Permanently delete a profile
    Delete {
        username: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum LogActivity {
    /// Strength session at the movement's current step
    Movement {
        key: String,

        #[arg(long, allow_negative_numbers = true)]
        sets: Option<i64>,

        #[arg(long, allow_negative_numbers = true)]
        reps: Option<i64>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Skill hold at the skill's current step
    Skill {
        key: String,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Cardio session
    Cardio {
        #[arg(allow_negative_numbers = true)]
        minutes: Option<f64>,

        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StepDirection {
    Up,
    Down,
}

impl From<StepDirection> for Direction {
    fn from(d: StepDirection) -> Self {
        match d {
            StepDirection::Up => Direction::Up,
            StepDirection::Down => Direction::Down,
        }
    }
}

/// Active user remembered between invocations
#[derive(Serialize, Deserialize)]
struct SessionPointer {
    user_id: uuid::Uuid,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !e.is_user_error() {
                tracing::error!("{:?}", e);
            }
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Initialize logging
    pulse_core::logging::init_with_level(&config.logging.level);

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());

    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    let mut store = UserStore::new(JsonFileRepository::open(&data_dir)?);

    match cli.command {
        Commands::User { action } => cmd_user(&mut store, &data_dir, action),
        Commands::Catalog => {
            print_catalog(catalog);
            Ok(())
        }
        Commands::Status => cmd_status(&store, &data_dir, catalog),
        Commands::Log { activity } => cmd_log(&mut store, &data_dir, catalog, &config, activity),
        Commands::Step { key, direction } => {
            cmd_step(&mut store, &data_dir, catalog, &key, direction.into())
        }
        Commands::Export { out, stdout } => cmd_export(&store, &data_dir, &config, out, stdout),
        Commands::Import { file } => cmd_import(&mut store, &data_dir, catalog, &file),
        Commands::Reset { yes } => cmd_reset(&mut store, &data_dir, yes),
        Commands::HistoryCsv { path } => cmd_history_csv(&store, &data_dir, catalog, &path),
    }
}

// ============================================================================
// Session pointer
// ============================================================================

fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join("session.json")
}

fn remember_session(data_dir: &Path, session: &Session) -> Result<()> {
    let path = session_path(data_dir);
    match session.user() {
        Some(user) => {
            let pointer = SessionPointer { user_id: user.id };
            std::fs::write(&path, serde_json::to_string(&pointer)?)?;
        }
        None => {
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
        }
    }
    Ok(())
}

fn active_session<R: UserRepository>(store: &UserStore<R>, data_dir: &Path) -> Result<Session> {
    let path = session_path(data_dir);
    let not_logged_in =
        || Error::State("No user is logged in. Run `pulse user login <name>` first.".into());

    if !path.exists() {
        return Err(not_logged_in());
    }

    let pointer: SessionPointer = match std::fs::read_to_string(&path)
        .map_err(Error::from)
        .and_then(|s| serde_json::from_str(&s).map_err(Error::from))
    {
        Ok(pointer) => pointer,
        Err(e) => {
            tracing::warn!("Ignoring unreadable session file {:?}: {}", path, e);
            return Err(not_logged_in());
        }
    };

    match store.resume(pointer.user_id) {
        Err(Error::NotFound(_)) => {
            tracing::warn!("Session refers to a deleted user, clearing it");
            remember_session(data_dir, &Session::none())?;
            Err(not_logged_in())
        }
        other => other,
    }
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_user<R: UserRepository>(
    store: &mut UserStore<R>,
    data_dir: &Path,
    action: UserAction,
) -> Result<()> {
    match action {
        UserAction::Create { username } => {
            let user = store.create_user(&username)?;
            let session = Session::active(user);
            remember_session(data_dir, &session)?;
            if let Some(user) = session.user() {
                println!("✓ Created profile '{}' and logged in", user.username);
            }
        }

        UserAction::Login { username } => {
            let session = store.login_user(&username)?;
            remember_session(data_dir, &session)?;
            if let Some(user) = session.user() {
                println!(
                    "✓ Logged in as '{}' (level {}, {} XP)",
                    user.username,
                    user.progress_state.level(),
                    user.progress_state.xp
                );
            }
        }

        UserAction::Logout => {
            let mut session = active_session(store, data_dir).unwrap_or_default();
            let name = session.user().map(|u| u.username.clone());
            store.logout(&mut session);
            remember_session(data_dir, &session)?;
            match name {
                Some(name) => println!("✓ Logged out '{}'", name),
                None => println!("No user was logged in."),
            }
        }

        UserAction::List => {
            let users = store.list_users()?;
            if users.is_empty() {
                println!("No profiles yet. Create one with `pulse user create <name>`.");
                return Ok(());
            }
            let active_id = active_session(store, data_dir)
                .ok()
                .and_then(|s| s.user().map(|u| u.id));
            for user in users {
                let marker = if Some(user.id) == active_id { "*" } else { " " };
                println!(
                    "{} {:<20} level {:>3}  {:>6} XP  last active {}",
                    marker,
                    user.username,
                    user.level,
                    user.total_xp,
                    user.last_active_at.format("%Y-%m-%d %H:%M")
                );
            }
        }

        UserAction::Delete { username, yes } => {
            if !yes {
                return Err(Error::Validation(
                    "Deleting a profile cannot be undone; pass --yes to confirm".into(),
                ));
            }
            let user = store.find_user(&username)?;
            let mut session = active_session(store, data_dir).unwrap_or_default();
            store.delete_user(&mut session, user.id)?;
            remember_session(data_dir, &session)?;
            println!("✓ Deleted profile '{}'", user.username);
        }
    }
    Ok(())
}

fn cmd_status<R: UserRepository>(
    store: &UserStore<R>,
    data_dir: &Path,
    catalog: &Catalog,
) -> Result<()> {
    let session = active_session(store, data_dir)?;
    let user = session
        .user()
        .ok_or_else(|| Error::State("No user is logged in".into()))?;
    let progress = &user.progress_state;
    let stats = WeeklyStats::compute(progress, catalog);

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", user.username);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!(
        "  Total XP: {}   Level: {}   ({} XP to next level)",
        progress.xp,
        progress.level(),
        xp::xp_to_next_level(progress.xp)
    );
    println!();
    println!(
        "  This week (from {}):",
        stats.window.start.format("%a %Y-%m-%d")
    );
    println!(
        "    Strength  {:>3}/{:<3} exposures  {:>3}%",
        stats.strength_done, stats.strength_total_targets, stats.strength_pct
    );
    println!(
        "    Skills    {:>3}/{:<3} sessions   {:>3}%",
        stats.weekly_skill_sessions, SKILL_WEEKLY_TARGET, stats.skill_pct
    );
    println!(
        "    Cardio    {:>3}/{:<3} minutes    {:>3}%",
        stats.weekly_cardio_minutes, CARDIO_WEEKLY_TARGET, stats.cardio_pct
    );

    println!();
    println!("  Strength:");
    for movement in &catalog.movements {
        let key = ProgressionKey::Movement(movement.key);
        let step = progress.current_step(catalog, key)?;
        println!(
            "    {:<18} step {:>2}/{:<2} {:<28} this week {}/{}",
            movement.name,
            progress.current_index(key) + 1,
            movement.steps.len(),
            step.label,
            stats.strength_count(movement.key),
            movement.target_per_week
        );
    }

    println!();
    println!("  Skills:");
    for skill in &catalog.skills {
        let key = ProgressionKey::Skill(skill.key);
        let step = progress.current_step(catalog, key)?;
        println!(
            "    {:<18} step {}/{} {}",
            skill.name,
            progress.current_index(key) + 1,
            skill.steps.len(),
            step.label
        );
    }

    println!();
    println!("  Recent logs:");
    let recent = progress.recent_logs(RECENT_LOG_COUNT);
    if recent.is_empty() {
        println!("    (none yet)");
    }
    for log in recent {
        println!("    {}", describe_log(log, catalog));
    }
    println!();

    Ok(())
}

fn cmd_log<R: UserRepository>(
    store: &mut UserStore<R>,
    data_dir: &Path,
    catalog: &Catalog,
    config: &Config,
    activity: LogActivity,
) -> Result<()> {
    let mut session = active_session(store, data_dir)?;

    let log = match activity {
        LogActivity::Movement {
            key,
            sets,
            reps,
            notes,
        } => {
            let key: MovementKey = key.parse()?;
            let sets = sets.unwrap_or(config.defaults.sets);
            let reps = reps.unwrap_or(config.defaults.reps);
            store.apply(&mut session, |p| {
                p.log_movement(catalog, key, sets, reps, notes.as_deref())
            })?
        }
        LogActivity::Skill { key, notes } => {
            let key: SkillKey = key.parse()?;
            store.apply(&mut session, |p| p.log_skill(catalog, key, notes.as_deref()))?
        }
        LogActivity::Cardio { minutes, notes } => {
            let minutes = minutes.unwrap_or(config.defaults.cardio_minutes);
            store.apply(&mut session, |p| Ok(p.log_cardio(minutes, notes.as_deref())))?
        }
    };

    println!("\n✓ {}", describe_log(&log, catalog));
    if let Some(progress) = session.progress() {
        println!("  Total XP: {}  Level: {}", progress.xp, progress.level());
    }
    Ok(())
}

fn cmd_step<R: UserRepository>(
    store: &mut UserStore<R>,
    data_dir: &Path,
    catalog: &Catalog,
    key: &str,
    direction: Direction,
) -> Result<()> {
    let key: ProgressionKey = key.parse()?;
    let mut session = active_session(store, data_dir)?;

    let index = store.apply(&mut session, |p| Ok(p.advance_step(catalog, key, direction)))?;

    let total = catalog.steps(key).map(|s| s.len()).unwrap_or(0);
    let label = catalog
        .step_at(key, index)
        .map(|s| s.label.as_str())
        .unwrap_or("?");
    println!(
        "✓ {}: step {}/{} {}",
        catalog.name(key).unwrap_or("?"),
        index + 1,
        total,
        label
    );
    Ok(())
}

fn cmd_export<R: UserRepository>(
    store: &UserStore<R>,
    data_dir: &Path,
    config: &Config,
    out: Option<PathBuf>,
    stdout: bool,
) -> Result<()> {
    let session = active_session(store, data_dir)?;
    let user = session
        .user()
        .ok_or_else(|| Error::State("No user is logged in".into()))?;

    if stdout {
        println!("{}", user.progress_state.export_state()?);
        return Ok(());
    }

    let dir = out.unwrap_or_else(|| config.export.dir.clone());
    let today = chrono::Utc::now().date_naive();
    let path = transfer::write_export(&user.progress_state, &user.username, &dir, today)?;
    println!("✓ Exported to {}", path.display());
    Ok(())
}

fn cmd_import<R: UserRepository>(
    store: &mut UserStore<R>,
    data_dir: &Path,
    catalog: &Catalog,
    file: &Path,
) -> Result<()> {
    let document = std::fs::read_to_string(file)?;
    let mut session = active_session(store, data_dir)?;

    store.apply(&mut session, |p| p.import_state(&document, catalog))?;

    if let Some(progress) = session.progress() {
        println!(
            "✓ Imported {} logs ({} XP, level {})",
            progress.logs.len(),
            progress.xp,
            progress.level()
        );
    }
    Ok(())
}

fn cmd_reset<R: UserRepository>(store: &mut UserStore<R>, data_dir: &Path, yes: bool) -> Result<()> {
    if !yes {
        return Err(Error::Validation(
            "Reset discards all workout data and cannot be undone; pass --yes to confirm".into(),
        ));
    }
    let mut session = active_session(store, data_dir)?;
    store.apply(&mut session, |p| {
        p.reset_all();
        Ok(())
    })?;
    println!("✓ All workout data reset");
    Ok(())
}

fn cmd_history_csv<R: UserRepository>(
    store: &UserStore<R>,
    data_dir: &Path,
    catalog: &Catalog,
    path: &Path,
) -> Result<()> {
    let session = active_session(store, data_dir)?;
    let progress = session
        .progress()
        .ok_or_else(|| Error::State("No user is logged in".into()))?;

    let count = export_logs_csv(progress, catalog, path)?;
    println!("✓ Wrote {} logs to {}", count, path.display());
    Ok(())
}

// ============================================================================
// Display
// ============================================================================

fn print_catalog(catalog: &Catalog) {
    println!("Strength progressions:");
    for movement in &catalog.movements {
        println!(
            "\n  {} [{}]  target {} per week",
            movement.name, movement.key, movement.target_per_week
        );
        for (i, step) in movement.steps.iter().enumerate() {
            println!("    {:>2}. {:<28} {:>3} XP", i + 1, step.label, step.xp);
        }
    }

    println!("\nSkill holds:");
    for skill in &catalog.skills {
        println!("\n  {} [{}]", skill.name, skill.key);
        for (i, step) in skill.steps.iter().enumerate() {
            println!("    {:>2}. {:<28} {:>3} XP", i + 1, step.label, step.xp);
        }
    }
}

fn describe_log(log: &WorkoutLog, catalog: &Catalog) -> String {
    let when = log
        .date()
        .with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M");

    let what = match log {
        WorkoutLog::Movement {
            key,
            step_index,
            sets,
            reps,
            ..
        } => {
            let label = catalog
                .step_at(ProgressionKey::Movement(*key), *step_index)
                .map(|s| s.label.as_str())
                .unwrap_or("?");
            format!("{} ({}x{})", label, sets, reps)
        }
        WorkoutLog::Skill {
            key, step_index, ..
        } => catalog
            .step_at(ProgressionKey::Skill(*key), *step_index)
            .map(|s| format!("{} hold", s.label))
            .unwrap_or_else(|| format!("{} hold", key)),
        WorkoutLog::Cardio { minutes, .. } => format!("Cardio {} min", minutes),
    };

    match log.notes() {
        Some(notes) => format!("{}  {}  +{} XP  \"{}\"", when, what, log.xp_awarded(), notes),
        None => format!("{}  {}  +{} XP", when, what, log.xp_awarded()),
    }
}
