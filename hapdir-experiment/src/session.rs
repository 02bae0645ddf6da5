use std::str::FromStr;

use hapdir_core::{TrialResult, TrialSpec};
use hapdir_transport::Encoding;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ExperimentError;
use crate::scoring::{self, SessionSummary};

/// How the stimulus reaches the participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    WristWorn,
    HandGrip,
    Drone,
}

impl Method {
    pub const ALL: [Method; 3] = [Method::WristWorn, Method::HandGrip, Method::Drone];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::WristWorn => "wrist-worn",
            Method::HandGrip => "hand-grip",
            Method::Drone => "drone",
        }
    }

    /// The wearable and hand-held devices resolve direction themselves; the
    /// drone only understands movement tokens.
    pub fn default_encoding(&self) -> Encoding {
        match self {
            Method::WristWorn | Method::HandGrip => Encoding::Direct,
            Method::Drone => Encoding::compass(),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ExperimentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ExperimentError::UnknownMethod(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionParams {
    pub participant_id: String,
    pub method: Method,
    /// Reveals ground truth and timing to the participant. Scoring is
    /// unaffected.
    pub practice: bool,
}

impl SessionParams {
    pub fn new(
        participant_id: impl Into<String>,
        method: Method,
        practice: bool,
    ) -> Result<Self, ExperimentError> {
        let participant_id = participant_id.into().trim().to_string();
        if participant_id.is_empty() {
            return Err(ExperimentError::MissingParticipant);
        }
        Ok(Self {
            participant_id,
            method,
            practice,
        })
    }
}

/// One participant's run: the fixed sequence and the results so far.
#[derive(Debug, Clone)]
pub struct Session {
    params: SessionParams,
    sequence: Vec<TrialSpec>,
    results: Vec<TrialResult>,
    threshold_deg: f64,
}

impl Session {
    pub fn new(params: SessionParams, sequence: Vec<TrialSpec>, threshold_deg: f64) -> Self {
        Self {
            params,
            results: Vec::with_capacity(sequence.len()),
            sequence,
            threshold_deg,
        }
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    pub fn sequence(&self) -> &[TrialSpec] {
        &self.sequence
    }

    pub fn results(&self) -> &[TrialResult] {
        &self.results
    }

    pub fn threshold_deg(&self) -> f64 {
        self.threshold_deg
    }

    /// Index of the next trial to run; equal to the number of results.
    pub fn current_index(&self) -> usize {
        self.results.len()
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        !self.sequence.is_empty() && self.results.len() == self.sequence.len()
    }

    pub fn spec(&self, index: usize) -> Option<&TrialSpec> {
        self.sequence.get(index)
    }

    /// Appends a finished trial. Only the result for the current index is
    /// accepted, and its truth must match the sequence.
    pub(crate) fn record(&mut self, result: TrialResult) -> bool {
        let index = self.current_index();
        let matches = self.sequence.get(index).is_some_and(|spec| {
            result.trial_index == index
                && result.true_direction == spec.direction
                && result.intensity == spec.intensity
        });
        if !matches {
            debug!(
                "rejected result for trial {} (expected trial {})",
                result.trial_index, index
            );
            return false;
        }
        self.results.push(result);
        true
    }

    pub fn summary(&self) -> SessionSummary {
        scoring::summarize(&self.results, self.threshold_deg)
    }

    /// Whether the exported table carries an intensity column.
    pub fn has_intensity(&self) -> bool {
        self.sequence.iter().any(|t| t.intensity.percent().is_some())
    }

    pub fn has_ratings(&self) -> bool {
        self.results.iter().any(|r| r.ratings.is_some())
    }

    /// Export is refused until every trial has a result.
    pub fn ensure_exportable(&self) -> Result<(), ExperimentError> {
        if self.results.is_empty() {
            return Err(ExperimentError::EmptyExport);
        }
        if !self.is_complete() {
            return Err(ExperimentError::IncompleteSession {
                completed: self.results.len(),
                total: self.sequence.len(),
            });
        }
        Ok(())
    }

    pub fn suggested_filename(&self, unix_secs: u64) -> String {
        format!(
            "experiment_{}_{}_{}.csv",
            sanitize(&self.params.participant_id),
            self.params.method,
            unix_secs
        )
    }
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
