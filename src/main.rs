mod ui;

use std::{
    io::{self, stdin, BufWriter, Write},
    path::PathBuf,
    sync::mpsc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};

use repcue::{
    config::{Config, ConfigStore, FileConfigStore},
    cues::{Cue, CueScheduler},
    recording::{self, Command, RecordedFrame},
    replay::{apply_command, replay},
    runtime::{
        spawn_replay, spawn_terminal_input, AppEvent, ChannelEventSource, FixedTicker, Runner,
        SessionClock,
    },
    Arm, PoseSnapshot, SessionController, SessionEvent, SessionStatus,
};

const TICK_RATE_MS: u64 = 100;

/// pose-driven rep counter for single-arm raises
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Counts single-arm raise reps from a recorded pose stream (JSON Lines),\n\
                  gating on posture and timing rest between sets."
)]
pub struct Cli {
    /// pose recording to play, one JSON frame per line
    recording: PathBuf,

    /// reps per set
    #[clap(short = 'r', long)]
    reps: Option<u32>,

    /// number of sets
    #[clap(short = 's', long)]
    sets: Option<u32>,

    /// rest between sets, in seconds
    #[clap(long)]
    rest: Option<u32>,

    /// arm being exercised
    #[clap(short = 'a', long, value_enum)]
    arm: Option<Arm>,

    /// playback speed multiplier for the live view
    #[clap(long, default_value_t = 1.0)]
    speed: f64,

    /// print events as JSON lines instead of opening the terminal UI
    #[clap(long)]
    headless: bool,

    /// persist the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,

    /// config file to use instead of the per-user default
    #[clap(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Stored defaults with command line overrides applied
    fn effective_config(&self, stored: Config) -> Config {
        Config {
            reps_per_set: self.reps.unwrap_or(stored.reps_per_set),
            total_sets: self.sets.unwrap_or(stored.total_sets),
            rest_seconds: self.rest.unwrap_or(stored.rest_seconds),
            arm: self.arm.unwrap_or(stored.arm),
            thresholds: stored.thresholds,
        }
    }
}

#[derive(Debug)]
pub struct App {
    pub controller: SessionController,
    pub config: Config,
    pub cues: CueScheduler,
    pub last_cue: Option<Cue>,
    pub clock: SessionClock,
    pub now: Duration,
    pub replay_done: bool,
}

impl App {
    pub fn new(config: Config, speed: f64) -> Self {
        Self {
            controller: SessionController::new(config.thresholds, config.arm),
            config,
            cues: CueScheduler::new(),
            last_cue: None,
            clock: SessionClock::new(speed),
            now: Duration::ZERO,
            replay_done: false,
        }
    }

    fn advance_clock(&mut self) {
        self.now = self.clock.now();
    }

    fn handle_events(&mut self, events: Vec<SessionEvent>) {
        for event in events {
            let cues = self.cues.cues_for(
                &event,
                self.controller.config(),
                self.controller.arm(),
                self.now,
            );
            if let Some(cue) = cues.into_iter().last() {
                self.last_cue = Some(cue);
            }
        }
    }

    pub fn command(&mut self, command: Command) {
        self.advance_clock();
        match apply_command(
            &mut self.controller,
            command,
            self.config.session_config(),
            self.now,
        ) {
            Ok(events) => self.handle_events(events),
            Err(e) => log::error!("{:?} rejected: {}", command, e),
        }
    }

    pub fn start(&mut self) {
        self.command(Command::Start);
    }

    pub fn stop(&mut self) {
        self.command(Command::Stop);
    }

    pub fn on_frame(&mut self, pose: Option<&PoseSnapshot>) {
        self.advance_clock();
        let events = self.controller.process_frame(pose, self.now);
        self.handle_events(events);
        self.remind();
    }

    pub fn on_recorded(&mut self, frame: RecordedFrame) {
        match frame.command {
            Some(command) => self.command(command),
            None => self.on_frame(frame.pose.as_ref()),
        }
    }

    pub fn on_tick(&mut self) {
        self.advance_clock();
        let events = self.controller.tick(self.now);
        self.handle_events(events);
    }

    fn remind(&mut self) {
        if self.controller.status() != SessionStatus::Running {
            return;
        }
        if let Some(cue) = self.cues.reminder(
            self.controller.state().feedback,
            self.controller.arm(),
            self.now,
        ) {
            self.last_cue = Some(cue);
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let config = cli.effective_config(store.load());
    if let Err(e) = config.session_config().validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::InvalidValue, e.to_string()).exit();
    }
    if cli.save_config {
        store
            .save(&config)
            .with_context(|| format!("saving config to {}", store.path().display()))?;
        log::info!("saved settings to {}", store.path().display());
    }

    let frames = recording::load(&cli.recording)
        .with_context(|| format!("loading recording {}", cli.recording.display()))?;
    log::info!("loaded {} frames from {}", frames.len(), cli.recording.display());

    if cli.headless {
        return run_headless(&config, &frames);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty (use --headless otherwise)")
            .exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, cli.speed);
    let result = start_tui(&mut terminal, &mut app, frames, cli.speed);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_headless(config: &Config, frames: &[RecordedFrame]) -> Result<()> {
    let mut controller = SessionController::new(config.thresholds, config.arm);
    let events = replay(&mut controller, config.session_config(), frames)?;

    let mut out = BufWriter::new(io::stdout().lock());
    for event in &events {
        serde_json::to_writer(&mut out, event)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    frames: Vec<RecordedFrame>,
    speed: f64,
) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    spawn_terminal_input(tx.clone());
    spawn_replay(tx, frames, speed);
    let runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    app.start();
    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.step() {
            AppEvent::Frame(frame) => app.on_recorded(frame),
            AppEvent::Tick => app.on_tick(),
            AppEvent::ReplayEnded => app.replay_done = true,
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if is_quit(&key) {
                    break;
                }
                match key.code {
                    KeyCode::Char(' ') => app.command(Command::TogglePause),
                    KeyCode::Char('a') => {
                        let arm = app.controller.arm().opposite();
                        app.command(Command::SetArm(arm));
                    }
                    KeyCode::Char('s') => app.command(Command::Stop),
                    KeyCode::Char('r') => {
                        app.command(Command::Stop);
                        app.command(Command::Start);
                    }
                    _ => {}
                }
            }
        }
        terminal.draw(|f| ui(app, f))?;
    }

    Ok(())
}

fn is_quit(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
