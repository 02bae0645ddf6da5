pub mod config;
pub mod design;
pub mod error;
pub mod export;
pub mod scoring;
pub mod session;
pub mod state;
pub mod trial;
pub use config::ExperimentConfig;
pub use design::TrialDesign;
pub use error::ExperimentError;
pub use export::CsvOptions;
pub use scoring::{Score, SessionSummary};
pub use session::{Method, Session, SessionParams};
pub use state::{PracticeView, TrialController, TrialEvent};
pub use trial::{ActiveTrial, TrialTimers};
