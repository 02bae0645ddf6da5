use serde::{Deserialize, Serialize};

/// The eight canonical stimulus directions, counter-clockwise from "right".
pub const BASE_DIRECTIONS: [u16; 8] = [0, 45, 90, 135, 180, 225, 270, 315];

/// Stimulus strength for one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Intensity {
    /// Designs without an intensity factor.
    Single,
    /// Motor duty cycle (or travel) as a percentage.
    Percent(u8),
}

impl Intensity {
    pub fn percent(&self) -> Option<u8> {
        match self {
            Intensity::Single => None,
            Intensity::Percent(p) => Some(*p),
        }
    }
}

impl std::fmt::Display for Intensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intensity::Single => Ok(()),
            Intensity::Percent(p) => write!(f, "{p}"),
        }
    }
}

/// One cell of the experimental design. Immutable once generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrialSpec {
    pub direction: u16,
    pub intensity: Intensity,
}

impl TrialSpec {
    pub fn new(direction: u16, intensity: Intensity) -> Self {
        Self {
            direction,
            intensity,
        }
    }
}

/// Reduces any angle in degrees to `[0, 360)`.
pub fn normalize_degrees(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if d >= 360.0 { 0.0 } else { d }
}

/// Converts a screen-space offset from the dial centre into a response angle.
///
/// Screen `y` grows downwards, so it is inverted before `atan2`: the result is
/// 0° to the right, increasing counter-clockwise, in `[0, 360)`.
pub fn point_to_angle(dx: f64, dy: f64) -> f64 {
    normalize_degrees((-dy).atan2(dx).to_degrees())
}
