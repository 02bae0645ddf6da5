use hapdir_core::Ratings;
use hapdir_experiment::TrialEvent;

/// One line typed by the operator or participant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    Event(TrialEvent),
    Status,
    Help,
    Reset,
    Quit,
}

pub const HELP: &str = "\
  a <deg>          pick a direction on the dial (0 = right, 90 = forward)
  p <dx> <dy>      pick by pointer offset from the dial centre (screen axes)
  ok               submit the picked direction
  skip             submit \"I could not tell\"
  r <clarity> <confidence>   ratings from 1 to 7
  status           show the current trial
  reset            abandon the session
  quit";

/// Returns `None` for anything that does not parse; the caller decides how
/// loudly to complain.
pub fn parse_line(line: &str) -> Option<Input> {
    let mut words = line.split_whitespace();
    let head = words.next()?.to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    let input = match (head.as_str(), args.as_slice()) {
        ("a" | "angle", [deg]) => {
            let deg = parse_finite(deg)?;
            Input::Event(TrialEvent::SelectAngle(deg))
        }
        ("p" | "point", [dx, dy]) => Input::Event(TrialEvent::SelectPoint {
            dx: parse_finite(dx)?,
            dy: parse_finite(dy)?,
        }),
        ("ok" | "submit", []) => Input::Event(TrialEvent::Submit),
        ("s" | "skip", []) => Input::Event(TrialEvent::Skip),
        ("r" | "rate", [clarity, confidence]) => {
            let ratings = Ratings::new(clarity.parse().ok()?, confidence.parse().ok()?)?;
            Input::Event(TrialEvent::Rate(ratings))
        }
        ("status", []) => Input::Status,
        ("h" | "help" | "?", []) => Input::Help,
        ("reset", []) => Input::Reset,
        ("q" | "quit" | "exit", []) => Input::Quit,
        _ => return None,
    };
    Some(input)
}

fn parse_finite(word: &str) -> Option<f64> {
    word.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dial_and_pointer_picks() {
        assert_eq!(
            parse_line("a 135"),
            Some(Input::Event(TrialEvent::SelectAngle(135.0)))
        );
        assert_eq!(
            parse_line("  P -12.5 4 "),
            Some(Input::Event(TrialEvent::SelectPoint { dx: -12.5, dy: 4.0 }))
        );
        assert_eq!(parse_line("a nan"), None);
        assert_eq!(parse_line("a"), None);
    }

    #[test]
    fn parses_submit_skip_and_ratings() {
        assert_eq!(parse_line("ok"), Some(Input::Event(TrialEvent::Submit)));
        assert_eq!(parse_line("SKIP"), Some(Input::Event(TrialEvent::Skip)));
        assert_eq!(
            parse_line("r 5 6"),
            Some(Input::Event(TrialEvent::Rate(Ratings::new(5, 6).unwrap())))
        );
    }

    #[test]
    fn ratings_outside_the_scale_do_not_parse() {
        assert_eq!(parse_line("r 0 4"), None);
        assert_eq!(parse_line("r 4 8"), None);
        assert_eq!(parse_line("r 4"), None);
    }

    #[test]
    fn control_words() {
        assert_eq!(parse_line("quit"), Some(Input::Quit));
        assert_eq!(parse_line("reset"), Some(Input::Reset));
        assert_eq!(parse_line("?"), Some(Input::Help));
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("dance"), None);
    }
}
