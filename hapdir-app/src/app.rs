use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use hapdir_core::TrialPhase;
use hapdir_experiment::scoring::{Score, score_result};
use hapdir_experiment::{
    CsvOptions, ExperimentConfig, SessionParams, TrialController, TrialEvent,
};
use hapdir_timing::{HighPrecisionTimer, Timer};
use hapdir_transport::{
    Command, DetachedTransport, Encoding, NullTransport, SendOutcome, SerialSink, Transport,
    UdpSink,
};
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::args::{EncodingArg, HapdirArgs};
use crate::input::{HELP, Input, parse_line};

/// Longest the loop sleeps before looking for typed input again.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

type Controller = TrialController<HighPrecisionTimer, StdRng, Box<dyn Transport>>;

pub struct App {
    controller: Controller,
    params: SessionParams,
    out_dir: PathBuf,
    csv: CsvOptions,
    write_json: bool,
    fly: bool,

    // What the terminal last showed, so each change is printed once.
    shown: Option<(TrialPhase, usize)>,
    shown_stimulus: bool,
    shown_connected: bool,

    should_exit: bool,
}

impl App {
    pub fn new(args: HapdirArgs) -> Result<Self> {
        let params = SessionParams::new(args.participant.as_str(), args.method, args.practice)?;
        let config = build_config(&args)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let transport = open_transport(&args);
        let connected = transport.is_connected();
        let controller = TrialController::new(config, HighPrecisionTimer::new(), rng, transport);

        Ok(Self {
            controller,
            params,
            out_dir: args.out,
            csv: CsvOptions {
                delimiter: args.delimiter,
                bom: !args.no_bom,
            },
            write_json: args.json,
            fly: args.takeoff,
            shown: None,
            shown_stimulus: false,
            shown_connected: connected,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let lines = spawn_stdin_reader();
        println!("{HELP}");
        if !self.shown_connected {
            println!("Actuator not connected. Trials run without a physical stimulus.");
        }
        if self.fly {
            self.send_direct(Command::takeoff());
        }
        self.controller.start_session(self.params.clone())?;

        while !self.should_exit {
            self.show_changes();
            match lines.try_recv() {
                Ok(line) => self.on_line(&line),
                Err(TryRecvError::Empty) => {
                    let timer = &self.controller.timer;
                    timer.sleep(idle_wait(timer.now(), self.controller.next_deadline()));
                }
                Err(TryRecvError::Disconnected) => {
                    info!("Input closed");
                    self.should_exit = true;
                }
            }
            self.controller.tick();
            if self.controller.is_finished() {
                self.should_exit = true;
            }
        }

        let result = if self.controller.is_finished() {
            self.export()
        } else {
            println!("Session incomplete. Nothing was written.");
            Ok(())
        };

        if self.fly {
            self.send_direct(Command::land());
        }
        self.controller.transport.close();
        result
    }

    fn on_line(&mut self, line: &str) {
        let Some(input) = parse_line(line) else {
            if !line.trim().is_empty() {
                println!("Unrecognised input. Type \"help\" for the commands.");
            }
            return;
        };

        match input {
            Input::Event(event) => {
                let answered = self.controller.results().len();
                if !self.controller.handle_event(event) {
                    println!("Not accepted while {}.", self.controller.phase());
                    return;
                }
                let picked = matches!(
                    event,
                    TrialEvent::SelectAngle(_) | TrialEvent::SelectPoint { .. }
                );
                if let Some(angle) = self.controller.selected_angle().filter(|_| picked) {
                    println!("Selected {angle:.1}°");
                }
                if self.params.practice && self.controller.results().len() > answered {
                    self.show_feedback();
                }
            }
            Input::Status => self.show_status(),
            Input::Help => println!("{HELP}"),
            Input::Reset => {
                self.controller.reset();
                self.shown = None;
                match self.controller.start_session(self.params.clone()) {
                    Ok(()) => println!("Session restarted with a new trial order."),
                    Err(error) => {
                        warn!("Could not restart: {error}");
                        self.should_exit = true;
                    }
                }
            }
            Input::Quit => self.should_exit = true,
        }
    }

    fn show_changes(&mut self) {
        let connected = self.controller.transport_connected();
        if self.shown_connected && !connected {
            println!("Actuator not connected. Trials continue without a physical stimulus.");
        }
        self.shown_connected = connected;

        let stimulus = self.controller.is_stimulus_active();
        if self.shown_stimulus && !stimulus {
            println!("Stimulus window closed.");
        }
        self.shown_stimulus = stimulus;

        let Some((number, total)) = self.controller.trial_progress() else {
            return;
        };
        let now = (self.controller.phase(), number);
        if self.shown == Some(now) {
            return;
        }
        self.shown = Some(now);

        match now.0 {
            TrialPhase::Waiting => {
                println!(
                    "\nTrial {number}/{total}. Stimulus in {:.1} s.",
                    self.controller.config.pre_stimulus_delay_ms as f64 / 1e3
                );
                if let Some(view) = self.controller.practice_view() {
                    println!("  practice: direction {}° {}", view.true_direction, view.intensity);
                }
            }
            TrialPhase::AwaitingResponse => {
                println!("Stimulus on. Pick a direction, then \"ok\", or \"skip\".");
            }
            TrialPhase::Rating => println!(
                "Rate clarity and confidence from 1 to 7: r <clarity> <confidence>"
            ),
            phase => debug!("Showing {phase}"),
        }
    }

    fn show_status(&self) {
        match self.controller.trial_progress() {
            Some((number, total)) => println!(
                "Trial {number}/{total}, {}, {} answered",
                self.controller.phase(),
                self.controller.results().len()
            ),
            None => println!("No trial running ({}).", self.controller.phase()),
        }
        if let Some(view) = self.controller.practice_view() {
            match view.elapsed_ms {
                Some(ms) => println!(
                    "  practice: direction {}°, {ms:.0} ms since onset",
                    view.true_direction
                ),
                None => println!("  practice: direction {}°", view.true_direction),
            }
        }
    }

    fn show_feedback(&self) {
        let Some(result) = self.controller.results().last() else {
            return;
        };
        match score_result(result, self.controller.config.correct_threshold_deg) {
            Score::Scored { error_deg, correct } => println!(
                "  practice: true direction {}°, off by {error_deg:.1}° ({})",
                result.true_direction,
                if correct { "correct" } else { "incorrect" }
            ),
            Score::Skipped => println!("  practice: true direction {}°", result.true_direction),
        }
    }

    fn send_direct(&mut self, command: Command) {
        match self.controller.transport.send(&command) {
            Ok(SendOutcome::Dispatched) => info!("Sent \"{command}\""),
            Ok(SendOutcome::NotConnected) => warn!("\"{command}\" dropped: not connected"),
            Err(error) => warn!("\"{command}\" failed: {error}"),
        }
    }

    fn export(&self) -> Result<()> {
        let session = self.controller.session().context("no session to export")?;
        let unix_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        std::fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("creating {}", self.out_dir.display()))?;
        let path = session.write_csv(&self.out_dir, unix_secs, &self.csv)?;
        println!("\nResults written to {}", path.display());

        if self.write_json {
            let json_path = path.with_extension("json");
            std::fs::write(&json_path, session.export_json()?)
                .with_context(|| format!("writing {}", json_path.display()))?;
            println!("Session record written to {}", json_path.display());
        }

        let summary = session.summary();
        println!(
            "{} answered, {} skipped, {} correct",
            summary.answered, summary.skipped, summary.correct
        );
        if let Some(error) = summary.mean_error_deg {
            println!("Mean error {error:.1}°");
        }
        Ok(())
    }
}

/// Sleeps up to the next timer deadline, capped so typed input stays
/// responsive.
fn idle_wait(now_ns: u64, next_deadline_ns: Option<u64>) -> Duration {
    match next_deadline_ns {
        Some(deadline) => Duration::from_nanos(deadline.saturating_sub(now_ns)).min(POLL_INTERVAL),
        None => POLL_INTERVAL,
    }
}

/// Settings file first, then the flags on top.
fn build_config(args: &HapdirArgs) -> Result<ExperimentConfig> {
    let mut config = match &args.config {
        Some(path) => ExperimentConfig::from_json_file(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => ExperimentConfig {
            encoding: args.method.default_encoding(),
            ..ExperimentConfig::default()
        },
    };

    match args.encoding {
        Some(EncodingArg::Direct) => config.encoding = Encoding::Direct,
        Some(EncodingArg::Compass) => config.encoding = Encoding::Compass { step_cm: args.step },
        None if args.config.is_none() => {
            if let Encoding::Compass { step_cm } = &mut config.encoding {
                *step_cm = args.step;
            }
        }
        None => {}
    }
    if args.no_ratings {
        config.collect_ratings = false;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    debug!("{config:?}");
    Ok(config)
}

/// A link that fails to open leaves the session running unconnected.
fn open_transport(args: &HapdirArgs) -> Box<dyn Transport> {
    if let Some(path) = &args.serial {
        match SerialSink::open(path, args.baud) {
            Ok(sink) => return Box::new(DetachedTransport::spawn(sink)),
            Err(error) => warn!("Failed to open {path}: {error}"),
        }
    } else if let Some(addr) = args.udp {
        match UdpSink::open(addr) {
            Ok(sink) => return Box::new(DetachedTransport::spawn(sink)),
            Err(error) => warn!("Failed to reach {addr}: {error}"),
        }
    }
    Box::new(NullTransport)
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(error) => {
                    warn!("stdin : {error}");
                    break;
                }
            }
        }
    });
    rx
}
