use hapdir_core::{TrialResult, TrialSpec};
use hapdir_timing::TimerToken;

/// The trial currently owned by the controller.
#[derive(Debug, Clone)]
pub struct ActiveTrial {
    pub index: usize,
    pub spec: TrialSpec,
    /// Monotonic ns of stimulus onset; the response clock starts here.
    pub stimulus_start: Option<u64>,
    pub timers: TrialTimers,
    /// Latest angle picked on the dial; may change until submitted.
    pub selected_angle: Option<f64>,
    /// Scored result waiting for ratings.
    pub pending: Option<TrialResult>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrialTimers {
    pub delay: Option<TimerToken>,
    pub stimulus_window: Option<TimerToken>,
}

impl TrialTimers {
    pub fn tokens(&self) -> impl Iterator<Item = TimerToken> {
        self.delay.into_iter().chain(self.stimulus_window)
    }
}

impl ActiveTrial {
    pub fn new(index: usize, spec: TrialSpec, delay: TimerToken) -> Self {
        Self {
            index,
            spec,
            stimulus_start: None,
            timers: TrialTimers {
                delay: Some(delay),
                stimulus_window: None,
            },
            selected_angle: None,
            pending: None,
        }
    }
}
