use serde::{Deserialize, Serialize};

use crate::stimulus::Intensity;

/// Angle recorded for a skipped trial. Never a valid response angle.
pub const SKIPPED_ANGLE: f64 = -1.0;

/// What the participant answered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Response {
    /// Perceived direction in `[0, 360)`.
    Angle(f64),
    Skipped,
}

impl Response {
    pub fn is_skip(&self) -> bool {
        matches!(self, Response::Skipped)
    }

    /// Exported angle, with `-1` for a skip.
    pub fn angle_or_sentinel(&self) -> f64 {
        match self {
            Response::Angle(a) => *a,
            Response::Skipped => SKIPPED_ANGLE,
        }
    }
}

/// A single accepted input with the monotonic timestamps (ns) of the
/// response window. Consumed right away by the reducer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseCapture {
    pub response: Response,
    pub capture_start_ns: u64,
    pub captured_at_ns: u64,
}

impl ResponseCapture {
    pub fn response_time_ms(&self) -> f64 {
        self.captured_at_ns.saturating_sub(self.capture_start_ns) as f64 / 1_000_000.0
    }
}

/// Subjective ratings given after each trial, each on a 1–7 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratings {
    pub clarity: u8,
    pub confidence: u8,
}

impl Ratings {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 7;

    /// Returns `None` when either value falls outside the scale.
    pub fn new(clarity: u8, confidence: u8) -> Option<Self> {
        let scale = Self::MIN..=Self::MAX;
        (scale.contains(&clarity) && scale.contains(&confidence)).then_some(Self {
            clarity,
            confidence,
        })
    }
}

/// Recorded result per trial. Append-only once handed to the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial_index: usize,
    pub true_direction: u16,
    pub intensity: Intensity,
    pub response: Response,
    pub response_time_ms: f64,
    pub ratings: Option<Ratings>,
}

impl TrialResult {
    pub fn response_angle(&self) -> f64 {
        self.response.angle_or_sentinel()
    }

    pub fn is_skip(&self) -> bool {
        self.response.is_skip()
    }
}
