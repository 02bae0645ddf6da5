use hapdir_core::{Response, ResponseCapture, TrialResult, TrialSpec, normalize_degrees};
use serde::Serialize;

/// Shorter arc between two directions on the 360° wheel, in `[0, 180]`.
pub fn circular_error(a: f64, b: f64) -> f64 {
    let d = (normalize_degrees(a) - normalize_degrees(b)).abs();
    if d > 180.0 { 360.0 - d } else { d }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    Scored { error_deg: f64, correct: bool },
    Skipped,
}

impl Score {
    pub fn error_deg(&self) -> Option<f64> {
        match self {
            Score::Scored { error_deg, .. } => Some(*error_deg),
            Score::Skipped => None,
        }
    }

    /// 1 correct, 0 incorrect, -1 skipped.
    pub fn correct_flag(&self) -> i8 {
        match self {
            Score::Scored { correct: true, .. } => 1,
            Score::Scored { correct: false, .. } => 0,
            Score::Skipped => -1,
        }
    }
}

pub fn score(true_direction: u16, response: Response, threshold_deg: f64) -> Score {
    match response {
        Response::Skipped => Score::Skipped,
        Response::Angle(angle) => {
            let error_deg = circular_error(f64::from(true_direction), angle);
            Score::Scored {
                error_deg,
                correct: error_deg <= threshold_deg,
            }
        }
    }
}

pub fn score_result(result: &TrialResult, threshold_deg: f64) -> Score {
    score(result.true_direction, result.response, threshold_deg)
}

/// Turns a capture into the record kept by the session. Ratings are
/// attached later when the design asks for them.
pub fn reduce(trial_index: usize, spec: &TrialSpec, capture: &ResponseCapture) -> TrialResult {
    let response = match capture.response {
        Response::Angle(a) => Response::Angle(normalize_degrees(a)),
        Response::Skipped => Response::Skipped,
    };
    TrialResult {
        trial_index,
        true_direction: spec.direction,
        intensity: spec.intensity,
        response,
        response_time_ms: capture.response_time_ms(),
        ratings: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SessionSummary {
    pub answered: usize,
    pub skipped: usize,
    pub correct: usize,
    pub mean_error_deg: Option<f64>,
    pub mean_response_time_ms: Option<f64>,
}

pub fn summarize(results: &[TrialResult], threshold_deg: f64) -> SessionSummary {
    let mut summary = SessionSummary::default();
    let mut error_sum = 0.0;
    for r in results {
        match score_result(r, threshold_deg) {
            Score::Skipped => summary.skipped += 1,
            Score::Scored { error_deg, correct } => {
                summary.answered += 1;
                error_sum += error_deg;
                if correct {
                    summary.correct += 1;
                }
            }
        }
    }
    if summary.answered > 0 {
        summary.mean_error_deg = Some(error_sum / summary.answered as f64);
    }
    if !results.is_empty() {
        let total: f64 = results.iter().map(|r| r.response_time_ms).sum();
        summary.mean_response_time_ms = Some(total / results.len() as f64);
    }
    summary
}
