use hapdir_core::{Intensity, TrialSpec, normalize_degrees};
use serde::{Deserialize, Serialize};

/// Default travel per movement token for the quadrotor proxy, in cm.
pub const DEFAULT_STEP_CM: u32 = 50;

/// Duty cycle sent for designs without an intensity factor.
const FULL_DUTY: u8 = 100;

/// One text token understood by the actuator's transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command(String);

impl Command {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Puts the quadrotor into SDK command mode.
    pub fn sdk_mode() -> Self {
        Self::new("command")
    }

    pub fn takeoff() -> Self {
        Self::new("takeoff")
    }

    pub fn land() -> Self {
        Self::new("land")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wire encodings for a stimulus.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    /// `"<direction> <intensity>"`, resolved by the actuator firmware.
    #[default]
    Direct,
    /// Direction bucketed into eight 45° sectors and rendered as one or two
    /// movement tokens of `step_cm` each.
    Compass { step_cm: u32 },
}

impl Encoding {
    pub fn compass() -> Self {
        Encoding::Compass {
            step_cm: DEFAULT_STEP_CM,
        }
    }

    /// Total over every direction; never fails.
    pub fn encode(&self, spec: &TrialSpec) -> Vec<Command> {
        let direction = normalize_degrees(f64::from(spec.direction));
        match *self {
            Encoding::Direct => {
                let duty = match spec.intensity {
                    Intensity::Single => FULL_DUTY,
                    Intensity::Percent(p) => p,
                };
                // 359.6 would round up to 360
                let deg = direction.round() as u16 % 360;
                vec![Command::new(format!("{deg} {duty}"))]
            }
            Encoding::Compass { step_cm } => compass_moves(compass_sector(direction))
                .iter()
                .map(|mv| Command::new(format!("{mv} {step_cm}")))
                .collect(),
        }
    }
}

/// Sector index 0..8, each centred on a multiple of 45° with boundaries at
/// `k * 45 + 22.5`.
pub fn compass_sector(direction: f64) -> usize {
    let d = normalize_degrees(direction);
    ((d + 22.5) / 45.0).floor() as usize % 8
}

fn compass_moves(sector: usize) -> &'static [&'static str] {
    match sector {
        0 => &["right"],
        1 => &["forward", "right"],
        2 => &["forward"],
        3 => &["forward", "left"],
        4 => &["left"],
        5 => &["back", "left"],
        6 => &["back"],
        _ => &["back", "right"],
    }
}
