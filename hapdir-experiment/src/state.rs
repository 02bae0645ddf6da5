use super::config::ExperimentConfig;
use super::error::ExperimentError;
use super::scoring;
use super::session::{Session, SessionParams};
use super::trial::ActiveTrial;
use hapdir_core::{
    Intensity, Ratings, Response, ResponseCapture, TrialPhase, TrialResult, TrialSpec,
    normalize_degrees, point_to_angle,
};
use hapdir_timing::{Timer, TimerQueue};
use hapdir_transport::{SendOutcome, Transport};
use log::{debug, info, warn};
use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrialEvent {
    /// Pre-stimulus delay of `trial` ran out.
    DelayElapsed { trial: usize },
    /// The "stimulus active" indicator of `trial` should go off.
    StimulusWindowClosed { trial: usize },
    /// Pick an angle on the dial. Can be repeated before submitting.
    SelectAngle(f64),
    /// Pick by screen offset from the dial centre (y grows downwards).
    SelectPoint { dx: f64, dy: f64 },
    /// Commit the selected angle.
    Submit,
    Skip,
    Rate(Ratings),
}

/// What a practice participant gets to see about the running trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PracticeView {
    pub true_direction: u16,
    pub intensity: Intensity,
    /// Time since stimulus onset; `None` before onset.
    pub elapsed_ms: Option<f64>,
}

/// Sequences one trial at a time: delay, stimulus dispatch, response,
/// optional ratings, result.
///
/// The controller is passive. Its driver calls [`update`](Self::update) to
/// collect due timer events and feeds them, together with participant input,
/// to [`handle_event`](Self::handle_event). Events that do not fit the current
/// phase are ignored and `handle_event` returns `false`.
pub struct TrialController<T, R, G>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
    G: Transport,
{
    pub config: ExperimentConfig,
    pub timer: T,
    pub rng: R,
    pub transport: G,
    phase: TrialPhase,
    timers: TimerQueue<TrialEvent>,
    session: Option<Session>,
    current: Option<ActiveTrial>,
    stimulus_active: bool,
    warned_disconnected: bool,
}

impl<T, R, G> TrialController<T, R, G>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
    G: Transport,
{
    pub fn new(config: ExperimentConfig, timer: T, rng: R, transport: G) -> Self {
        Self {
            config,
            timer,
            rng,
            transport,
            phase: TrialPhase::Idle,
            timers: TimerQueue::new(),
            session: None,
            current: None,
            stimulus_active: false,
            warned_disconnected: false,
        }
    }

    /// Generates a fresh sequence and starts its first trial. Refused while a
    /// trial is in flight; a finished session is replaced.
    pub fn start_session(&mut self, params: SessionParams) -> Result<(), ExperimentError> {
        if self.phase.is_active() {
            return Err(ExperimentError::SessionInProgress(self.phase));
        }
        if params.participant_id.trim().is_empty() {
            return Err(ExperimentError::MissingParticipant);
        }
        let sequence = self.config.design.generate(&mut self.rng)?;
        info!(
            "Session for {} ({}{}) with {} trials",
            params.participant_id,
            params.method,
            if params.practice { ", practice" } else { "" },
            sequence.len()
        );

        self.timers.cancel_all();
        self.current = None;
        self.session = Some(Session::new(
            params,
            sequence,
            self.config.correct_threshold_deg,
        ));
        self.warned_disconnected = false;
        self.advise_if_disconnected();
        self.start_trial(0);
        Ok(())
    }

    /// Enters `Waiting` for trial `index`. Only accepted from `Idle` and only
    /// for the next trial of the session.
    pub fn start_trial(&mut self, index: usize) -> bool {
        if !self.phase.allows_start() {
            debug!("start_trial({}) ignored in phase {}", index, self.phase);
            return false;
        }
        let Some(session) = &self.session else {
            debug!("start_trial({}) ignored without a session", index);
            return false;
        };
        if index != session.current_index() {
            debug!(
                "start_trial({}) ignored, next trial is {}",
                index,
                session.current_index()
            );
            return false;
        }
        let Some(spec) = session.spec(index).copied() else {
            return false;
        };

        // Nothing from an earlier trial may fire into this one.
        self.timers.cancel_all();
        let now = self.timer.now();
        let delay = self.timers.arm_in(
            now,
            Duration::from_millis(self.config.pre_stimulus_delay_ms),
            TrialEvent::DelayElapsed { trial: index },
        );
        self.current = Some(ActiveTrial::new(index, spec, delay));
        self.stimulus_active = false;
        self.phase = TrialPhase::Waiting;
        info!(
            "Trial {} started at {} ns: {}° {:?}",
            index, now, spec.direction, spec.intensity
        );
        true
    }

    /// Returns the timer events that are due.
    pub fn update(&mut self) -> Vec<TrialEvent> {
        let now = self.timer.now();
        self.timers.expired(now)
    }

    /// Runs `update` and handles everything it returned.
    pub fn tick(&mut self) -> usize {
        let mut handled = 0;
        for event in self.update() {
            if self.handle_event(event) {
                handled += 1;
            }
        }
        handled
    }

    pub fn handle_event(&mut self, event: TrialEvent) -> bool {
        let current = self.current.as_ref().map(|t| t.index);
        let handled = match (self.phase, event) {
            (TrialPhase::Waiting, TrialEvent::DelayElapsed { trial }) if current == Some(trial) => {
                self.arm_stimulus();
                true
            }

            // Cosmetic; may arrive while awaiting a response or during rating.
            (_, TrialEvent::StimulusWindowClosed { trial }) if current == Some(trial) => {
                self.stimulus_active = false;
                debug!("Stimulus window of trial {} closed", trial);
                true
            }

            (phase, TrialEvent::SelectAngle(angle)) if phase.allows_response() => {
                self.select(angle)
            }

            (phase, TrialEvent::SelectPoint { dx, dy }) if phase.allows_response() => {
                self.select(point_to_angle(dx, dy))
            }

            (phase, TrialEvent::Submit) if phase.allows_response() => {
                match self.current.as_ref().and_then(|t| t.selected_angle) {
                    Some(angle) => self.capture(Response::Angle(angle)),
                    None => false,
                }
            }

            (phase, TrialEvent::Skip) if phase.allows_response() => {
                self.capture(Response::Skipped)
            }

            (phase, TrialEvent::Rate(ratings)) if phase.allows_rating() => self.rate(ratings),

            _ => false,
        };
        if !handled {
            debug!("{:?} ignored in phase {}", event, self.phase);
        }
        handled
    }

    /// Cancels every timer and drops the session. In-flight sends are left to
    /// the transport and never reported back.
    pub fn reset(&mut self) {
        let cancelled = self.timers.cancel_all();
        self.current = None;
        self.session = None;
        self.stimulus_active = false;
        self.phase = TrialPhase::Idle;
        info!("Session reset, {} pending timers cancelled", cancelled);
    }

    fn arm_stimulus(&mut self) {
        let now = self.timer.now();
        self.phase = TrialPhase::Armed;
        let Some(trial) = self.current.as_mut() else {
            return;
        };
        trial.timers.delay = None;
        trial.stimulus_start = Some(now);
        trial.timers.stimulus_window = Some(self.timers.arm_in(
            now,
            Duration::from_millis(self.config.stimulus_active_ms),
            TrialEvent::StimulusWindowClosed { trial: trial.index },
        ));
        let (index, spec) = (trial.index, trial.spec);
        self.stimulus_active = true;
        debug!("Trial {} armed at {} ns", index, now);

        self.dispatch(&spec);
        self.phase = TrialPhase::AwaitingResponse;
    }

    /// Hands the encoded stimulus to the transport and moves on. Whatever
    /// happens to the commands afterwards is only logged.
    fn dispatch(&mut self, spec: &TrialSpec) {
        self.advise_if_disconnected();
        for command in self.config.encoding.encode(spec) {
            match self.transport.send(&command) {
                Ok(SendOutcome::Dispatched) => debug!("Dispatched \"{}\"", command),
                Ok(SendOutcome::NotConnected) => {
                    debug!("No actuator, \"{}\" not sent", command)
                }
                Err(error) => warn!("Sending \"{}\" failed: {}", command, error),
            }
        }
    }

    fn advise_if_disconnected(&mut self) {
        if !self.transport.is_connected() && !self.warned_disconnected {
            warn!("Actuator not connected; trials continue without a physical stimulus");
            self.warned_disconnected = true;
        }
    }

    fn select(&mut self, angle: f64) -> bool {
        if !angle.is_finite() {
            return false;
        }
        match self.current.as_mut() {
            Some(trial) => {
                trial.selected_angle = Some(normalize_degrees(angle));
                true
            }
            None => false,
        }
    }

    fn capture(&mut self, response: Response) -> bool {
        let now = self.timer.now();
        let Some(trial) = self.current.as_mut() else {
            return false;
        };
        let Some(stimulus_start) = trial.stimulus_start else {
            return false;
        };
        self.phase = TrialPhase::Scoring;

        let capture = ResponseCapture {
            response,
            capture_start_ns: stimulus_start,
            captured_at_ns: now,
        };
        let result = scoring::reduce(trial.index, &trial.spec, &capture);
        info!(
            "Response for trial {}: {}, RT = {:.3} ms",
            trial.index,
            match response {
                Response::Angle(a) => format!("{a:.2}°"),
                Response::Skipped => "skipped".to_string(),
            },
            result.response_time_ms
        );

        if self.config.collect_ratings {
            trial.pending = Some(result);
            self.phase = TrialPhase::Rating;
        } else {
            self.finalize(result);
        }
        true
    }

    fn rate(&mut self, ratings: Ratings) -> bool {
        if Ratings::new(ratings.clarity, ratings.confidence).is_none() {
            return false;
        }
        let Some(mut result) = self.current.as_mut().and_then(|t| t.pending.take()) else {
            return false;
        };
        result.ratings = Some(ratings);
        self.finalize(result);
        true
    }

    fn finalize(&mut self, result: TrialResult) {
        if let Some(trial) = self.current.take() {
            for token in trial.timers.tokens() {
                self.timers.cancel(token);
            }
        }
        self.stimulus_active = false;
        self.phase = TrialPhase::Idle;

        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.record(result) {
            warn!("Trial result out of sequence, dropped");
        }
        if session.is_complete() {
            let summary = session.summary();
            info!(
                "Session complete: {} answered, {} skipped, {} correct, mean error {}",
                summary.answered,
                summary.skipped,
                summary.correct,
                summary
                    .mean_error_deg
                    .map(|e| format!("{e:.2}°"))
                    .unwrap_or_else(|| "n/a".to_string())
            );
        } else {
            let next = session.current_index();
            self.start_trial(next);
        }
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn results(&self) -> &[TrialResult] {
        self.session.as_ref().map_or(&[], |s| s.results())
    }

    pub fn is_finished(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_complete())
    }

    pub fn current_trial(&self) -> Option<&ActiveTrial> {
        self.current.as_ref()
    }

    pub fn selected_angle(&self) -> Option<f64> {
        self.current.as_ref().and_then(|t| t.selected_angle)
    }

    /// Cosmetic indicator; responses are accepted regardless.
    pub fn is_stimulus_active(&self) -> bool {
        self.stimulus_active
    }

    pub fn transport_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Time since stimulus onset of the running trial.
    pub fn elapsed_response(&self) -> Option<Duration> {
        let start = self.current.as_ref()?.stimulus_start?;
        Some(self.timer.elapsed(start))
    }

    pub fn practice_view(&self) -> Option<PracticeView> {
        let session = self.session.as_ref()?;
        if !session.params().practice {
            return None;
        }
        let trial = self.current.as_ref()?;
        Some(PracticeView {
            true_direction: trial.spec.direction,
            intensity: trial.spec.intensity,
            elapsed_ms: self.elapsed_response().map(|d| d.as_secs_f64() * 1e3),
        })
    }

    /// 1-based number of the running trial and the session length.
    pub fn trial_progress(&self) -> Option<(usize, usize)> {
        let session = self.session.as_ref()?;
        if session.is_complete() {
            return None;
        }
        Some((session.current_index() + 1, session.len()))
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}
