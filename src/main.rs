use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use clap::{error::ErrorKind, Args, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin, BufRead, BufReader, Write},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use spineguard::{
    achievements::AchievementTracker,
    app::{App, Stores},
    app_dirs::AppDirs,
    calibration::CalibrationState,
    classifier::PostureMode,
    config::Config,
    export,
    history::HistoryDb,
    logging,
    monitor::Monitor,
    replay,
    report::{self, Comparison, ReportData},
    runtime::{AppEvent, CrosstermEventSource, FeedFrames, FixedTicker, Runner},
    session::PostureReading,
    ui::screen::current_screen,
};

const TICK_RATE_MS: u64 = 100;

/// terminal posture coach driven by a pose landmark feed
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal posture coach: reads pose landmarks from a line-delimited JSON feed, tracks your torso angle, classifies posture against your personal calibration, and keeps a history for streaks, reports and CSV export."
)]
pub struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,

    #[clap(flatten)]
    monitor: MonitorArgs,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// live monitoring TUI (default)
    Monitor(MonitorArgs),
    /// run a recorded feed headlessly and print a summary
    Replay(ReplayArgs),
    /// print a posture report for recent days
    Report(ReportArgs),
    /// export history as CSV
    Export(ExportArgs),
}

/// Settings that override the stored config and are saved back
#[derive(Args, Debug, Clone, Default)]
struct SettingsArgs {
    /// posture mode used for default thresholds
    #[clap(short = 'm', long, value_enum)]
    mode: Option<PostureMode>,

    /// smoothing responsiveness between 0.0 and 1.0
    #[clap(short = 's', long)]
    sensitivity: Option<f64>,

    /// minutes between break reminders
    #[clap(long)]
    break_interval: Option<u32>,

    /// disable posture alerts
    #[clap(long)]
    no_alerts: bool,

    /// disable break reminders
    #[clap(long)]
    no_breaks: bool,
}

impl SettingsArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(mode) = self.mode {
            config.posture_mode = mode;
        }
        if let Some(sensitivity) = self.sensitivity {
            config.sensitivity = sensitivity;
        }
        if let Some(mins) = self.break_interval {
            config.break_interval_mins = mins;
        }
        if self.no_alerts {
            config.nudges_enabled = false;
        }
        if self.no_breaks {
            config.break_reminders = false;
        }
        *config = config.clone().sanitized();
    }
}

#[derive(Args, Debug, Clone, Default)]
struct MonitorArgs {
    /// landmark feed: JSONL file, FIFO, or - for stdin
    #[clap(short = 'f', long)]
    feed: Option<PathBuf>,

    /// directory for session CSV exports (default: current directory)
    #[clap(long)]
    export_dir: Option<PathBuf>,

    #[clap(flatten)]
    settings: SettingsArgs,
}

#[derive(Args, Debug, Clone)]
struct ReplayArgs {
    /// landmark feed to replay, - for stdin
    #[clap(short = 'f', long)]
    feed: PathBuf,

    /// write the session readings to this CSV file
    #[clap(long)]
    csv: Option<PathBuf>,

    /// store the session in the history
    #[clap(long)]
    save: bool,

    /// ignore the stored calibration
    #[clap(long)]
    uncalibrated: bool,

    #[clap(flatten)]
    settings: SettingsArgs,
}

#[derive(Args, Debug, Clone)]
struct ReportArgs {
    /// number of days ending today
    #[clap(short = 'd', long, default_value_t = 7)]
    days: u32,

    /// write the report to a file instead of stdout
    #[clap(short = 'o', long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct ExportArgs {
    /// number of days ending today, one row per day
    #[clap(short = 'd', long, default_value_t = 30)]
    days: u32,

    /// export the readings of the sessions on this date (YYYY-MM-DD) instead
    #[clap(long)]
    date: Option<NaiveDate>,

    /// write the CSV to a file instead of stdout
    #[clap(short = 'o', long)]
    out: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Monitor(args)) => run_monitor(args),
        Some(Command::Replay(args)) => run_replay(args),
        Some(Command::Report(args)) => run_report(args),
        Some(Command::Export(args)) => run_export(args),
        None => run_monitor(cli.monitor),
    }
}

fn open_feed(path: &Path) -> io::Result<Box<dyn BufRead + Send>> {
    if path == Path::new("-") {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

fn output(out: Option<&Path>) -> io::Result<Box<dyn Write>> {
    match out {
        Some(path) => Ok(Box::new(File::create(path)?)),
        None => Ok(Box::new(io::stdout())),
    }
}

fn load_config(stores: &Stores, settings: &SettingsArgs) -> Config {
    let mut config = stores.config.load();
    settings.apply(&mut config);
    if let Err(e) = stores.config.save(&config) {
        tracing::warn!(error = %e, "failed to save config");
    }
    config
}

fn run_monitor(args: MonitorArgs) -> Result<(), Box<dyn Error>> {
    let reads_stdin = args.feed.as_deref() == Some(Path::new("-"));
    if !reads_stdin && !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    logging::init_file(&AppDirs::log_path());

    let stores = Stores::default_locations();
    let config = load_config(&stores, &args.settings);
    let history = match HistoryDb::new() {
        Ok(db) => Some(db),
        Err(e) => {
            tracing::error!(error = %e, "history unavailable");
            None
        }
    };
    let export_dir = match args.export_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let feed = args.feed.as_deref().map(open_feed).transpose()?;
    if feed.is_none() {
        tracing::warn!("no landmark feed given; nothing will be classified");
    }

    let mut app = App::new(config, stores, history, export_dir, Local::now());

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, feed);
    app.shutdown(Local::now());

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn draw(app: &App, f: &mut Frame) {
    current_screen(&app.state).render(app, f);
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    feed: Option<Box<dyn BufRead + Send>>,
) -> Result<(), Box<dyn Error>> {
    let tick = Duration::from_millis(TICK_RATE_MS);
    let runner = Runner::new(CrosstermEventSource::new(feed), FixedTicker::new(tick));
    let mut last_tick = Instant::now();

    terminal.draw(|f| draw(app, f))?;

    loop {
        let event = runner.step();
        let is_tick = matches!(event, AppEvent::Tick);
        app.handle_event(event, Local::now());

        // a busy feed starves the timeout tick
        if is_tick {
            last_tick = Instant::now();
        } else if last_tick.elapsed() >= tick {
            app.on_tick(Local::now());
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
        terminal.draw(|f| draw(app, f))?;
    }

    Ok(())
}

fn run_replay(args: ReplayArgs) -> Result<(), Box<dyn Error>> {
    logging::init_stderr();

    let stores = Stores::default_locations();
    let config = load_config(&stores, &args.settings);
    let calibration = if args.uncalibrated {
        CalibrationState::Uncalibrated
    } else {
        stores.calibration.load()
    };
    let achievements = AchievementTracker::with_unlocked(&stores.achievements.load());

    let start = Local::now();
    let mut monitor = Monitor::new(config, calibration, achievements, start);
    let frames = FeedFrames::new(open_feed(&args.feed)?);
    let summary = replay::replay(&mut monitor, frames, start);

    print!("{}", replay::render_summary(&summary));

    if let Some(path) = &args.csv {
        let readings: Vec<PostureReading> = summary
            .session
            .as_ref()
            .map(|s| s.data.readings.iter().copied().collect())
            .unwrap_or_default();
        export::write_session_csv(&readings, File::create(path)?)?;
        println!("csv:         {}", path.display());
    }

    if args.save {
        if let Some(session) = &summary.session {
            let mut db = HistoryDb::new()?;
            let now = Local::now();
            db.save_session(session, now)?;
            monitor.on_history_updated(db.tracked_days()?, now);
            stores.achievements.save(monitor.achievements.achievements())?;
            println!("saved:       {}", AppDirs::db_path().display());
        }
    }

    Ok(())
}

fn run_report(args: ReportArgs) -> Result<(), Box<dyn Error>> {
    logging::init_stderr();

    let db = HistoryDb::new()?;
    let today = Local::now().date_naive();
    let span = args.days.max(1);

    let days = db.date_range(span, today)?;
    let start = days.first().map(|d| d.date).unwrap_or(today);
    let current = ReportData::from_days(&days, start, today);

    let previous_end = start - ChronoDuration::days(1);
    let previous_days = db.date_range(span, previous_end)?;
    let previous_start = previous_days
        .first()
        .map(|d| d.date)
        .unwrap_or(previous_end);
    let previous = ReportData::from_days(&previous_days, previous_start, previous_end);
    let comparison = (previous.days_tracked > 0).then(|| Comparison::between(&current, &previous));

    let text = report::render_text(&current, &days, &db.streaks(today)?, comparison.as_ref());
    output(args.out.as_deref())?.write_all(text.as_bytes())?;
    Ok(())
}

fn run_export(args: ExportArgs) -> Result<(), Box<dyn Error>> {
    logging::init_stderr();

    let db = HistoryDb::new()?;
    let out = output(args.out.as_deref())?;

    match args.date {
        Some(date) => {
            let readings: Vec<PostureReading> = db
                .sessions_on(date)?
                .into_iter()
                .flat_map(|s| s.readings)
                .collect();
            export::write_session_csv(&readings, out)?;
        }
        None => {
            let days = db.date_range(args.days.max(1), Local::now().date_naive())?;
            export::write_daily_csv(&days, out)?;
        }
    }
    Ok(())
}
