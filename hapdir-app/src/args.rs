// Command line arguments for the terminal session driver

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use hapdir_experiment::Method;
use hapdir_transport::encoder::DEFAULT_STEP_CM;
use hapdir_transport::serial::DEFAULT_BAUD_RATE;
use hapdir_transport::udp::DEFAULT_DRONE_ADDR;

#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
pub struct HapdirArgs {
    /// Participant identifier, e.g. P01. Required to start a session
    #[arg(short, long, default_value = "")]
    pub participant: String,

    /// Stimulus delivery method: wrist-worn, hand-grip or drone
    #[arg(short, long, default_value = "wrist-worn")]
    pub method: Method,

    /// Show the true direction and response timer during trials
    #[arg(long)]
    pub practice: bool,

    /// JSON file with experiment settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Fixes the trial order
    #[arg(long)]
    pub seed: Option<u64>,

    /// Skip the clarity and confidence questions
    #[arg(long)]
    pub no_ratings: bool,

    /// Stimulus encoding; the method picks one when omitted
    #[arg(short, long, value_enum)]
    pub encoding: Option<EncodingArg>,

    /// Movement distance per compass token, in cm
    #[arg(long, default_value_t = DEFAULT_STEP_CM)]
    pub step: u32,

    /// Serial device of the wearable or grip controller
    #[arg(long, conflicts_with = "udp")]
    pub serial: Option<String>,

    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,

    /// Drone command address; the drone's own access point when given bare
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_DRONE_ADDR)]
    pub udp: Option<SocketAddr>,

    /// Send takeoff before the first trial and land after the last
    #[arg(long, requires = "udp")]
    pub takeoff: bool,

    /// Print the serial devices and exit
    #[arg(long)]
    pub list_ports: bool,

    /// Directory the result files are written to
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// CSV field delimiter
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    /// Omit the UTF-8 byte order mark
    #[arg(long)]
    pub no_bom: bool,

    /// Also write the session as JSON next to the CSV
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EncodingArg {
    Direct,
    Compass,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = HapdirArgs::try_parse_from(["hapdir", "-p", "P01"]).unwrap();
        assert_eq!(args.participant, "P01");
        assert_eq!(args.method, Method::WristWorn);
        assert_eq!(args.step, DEFAULT_STEP_CM);
        assert_eq!(args.delimiter, ',');
        assert!(args.encoding.is_none());
        assert!(!args.practice);
    }

    #[test]
    fn parses_drone_link() {
        let args = HapdirArgs::try_parse_from([
            "hapdir",
            "-p",
            "P02",
            "--method",
            "Drone",
            "--udp",
            "192.168.10.1:8889",
            "--takeoff",
            "--encoding",
            "compass",
        ])
        .unwrap();
        assert_eq!(args.method, Method::Drone);
        assert_eq!(args.udp, Some("192.168.10.1:8889".parse().unwrap()));
        assert!(args.takeoff);
        assert_eq!(args.encoding, Some(EncodingArg::Compass));
    }

    #[test]
    fn bare_udp_flag_targets_the_drone_access_point() {
        let args =
            HapdirArgs::try_parse_from(["hapdir", "-p", "P03", "--udp", "--takeoff"]).unwrap();
        assert_eq!(args.udp, Some(DEFAULT_DRONE_ADDR.parse().unwrap()));
        assert!(args.takeoff);
        let args = HapdirArgs::try_parse_from(["hapdir", "-p", "P03"]).unwrap();
        assert_eq!(args.udp, None);
    }

    #[test]
    fn rejects_two_links_and_unknown_methods() {
        assert!(
            HapdirArgs::try_parse_from([
                "hapdir",
                "--serial",
                "/dev/ttyUSB0",
                "--udp",
                "127.0.0.1:8889"
            ])
            .is_err()
        );
        assert!(HapdirArgs::try_parse_from(["hapdir", "--method", "telepathy"]).is_err());
        assert!(HapdirArgs::try_parse_from(["hapdir", "--takeoff"]).is_err());
    }
}
