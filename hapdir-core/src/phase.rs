use serde::{Deserialize, Serialize};

/// Phase of the single active trial.
///
/// `Armed` and `Scoring` are passed through within one transition handler;
/// they are observable only from log output and from inside the controller.
/// `Rating` is the rating-collection sub-state of scoring.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrialPhase {
    #[default]
    Idle,
    Waiting,
    Armed,
    AwaitingResponse,
    Scoring,
    Rating,
}

impl TrialPhase {
    pub fn allows_start(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn allows_response(&self) -> bool {
        matches!(self, Self::AwaitingResponse)
    }

    pub fn allows_rating(&self) -> bool {
        matches!(self, Self::Rating)
    }

    /// True while a trial is in flight, from the pre-stimulus delay until
    /// its result is finalized.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl std::fmt::Display for TrialPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TrialPhase::Idle => "idle",
            TrialPhase::Waiting => "waiting",
            TrialPhase::Armed => "armed",
            TrialPhase::AwaitingResponse => "awaiting-response",
            TrialPhase::Scoring => "scoring",
            TrialPhase::Rating => "rating",
        };
        f.write_str(name)
    }
}
