use hapdir_core::TrialPhase;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("a participant id is required to start a session")]
    MissingParticipant,
    #[error("unknown delivery method {0:?}")]
    UnknownMethod(String),
    #[error("a trial is already running ({0}); reset the session first")]
    SessionInProgress(TrialPhase),
    #[error("the trial design produces no trials")]
    EmptyDesign,
    #[error("there are no results to export")]
    EmptyExport,
    #[error("session incomplete: {completed} of {total} trials done")]
    IncompleteSession { completed: usize, total: usize },
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
