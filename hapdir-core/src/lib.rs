pub mod phase;
pub mod stimulus;
pub mod trial;

pub use phase::TrialPhase;
pub use stimulus::{BASE_DIRECTIONS, Intensity, TrialSpec, normalize_degrees, point_to_angle};
pub use trial::{Ratings, Response, ResponseCapture, SKIPPED_ANGLE, TrialResult};
