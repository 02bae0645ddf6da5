//! Tabular and JSON renderings of a finished session.

use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

use hapdir_core::{TrialResult, normalize_degrees};
use serde::Serialize;

use crate::error::ExperimentError;
use crate::scoring::{self, Score, SessionSummary};
use crate::session::{Session, SessionParams};

const BOM: &str = "\u{FEFF}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: char,
    /// Prefix a byte-order mark so spreadsheets pick UTF-8.
    pub bom: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            bom: true,
        }
    }
}

impl Session {
    pub fn export_csv(&self, opts: &CsvOptions) -> Result<String, ExperimentError> {
        self.ensure_exportable()?;
        let with_intensity = self.has_intensity();
        let with_ratings = self.has_ratings();

        let mut header = vec!["participantId", "method", "trialIndex", "trueDirection"];
        if with_intensity {
            header.push("intensity");
        }
        header.extend(["responseAngle", "responseTimeMs", "error", "isCorrect"]);
        if with_ratings {
            header.extend(["clarity", "confidence"]);
        }

        let mut lines = Vec::with_capacity(self.results().len() + 1);
        lines.push(join(header.iter().map(|h| Cow::Borrowed(*h)), opts.delimiter));
        for r in self.results() {
            lines.push(join(
                row(self.params(), r, self.threshold_deg(), with_intensity, with_ratings)
                    .into_iter()
                    .map(Cow::Owned),
                opts.delimiter,
            ));
        }

        let mut out = String::new();
        if opts.bom {
            out.push_str(BOM);
        }
        out.push_str(&lines.join("\n"));
        Ok(out)
    }

    pub fn export_json(&self) -> Result<String, ExperimentError> {
        self.ensure_exportable()?;
        let record = SessionRecord {
            params: self.params(),
            threshold_deg: self.threshold_deg(),
            summary: self.summary(),
            results: self.results(),
        };
        Ok(serde_json::to_string_pretty(&record)?)
    }

    /// Writes the CSV table into `dir` under the suggested name.
    pub fn write_csv(
        &self,
        dir: impl AsRef<Path>,
        unix_secs: u64,
        opts: &CsvOptions,
    ) -> Result<PathBuf, ExperimentError> {
        let text = self.export_csv(opts)?;
        let path = dir.as_ref().join(self.suggested_filename(unix_secs));
        let mut file = std::fs::File::create(&path)?;
        file.write_all(text.as_bytes())?;
        file.flush()?;
        Ok(path)
    }
}

#[derive(Serialize)]
struct SessionRecord<'a> {
    params: &'a SessionParams,
    threshold_deg: f64,
    summary: SessionSummary,
    results: &'a [TrialResult],
}

/// Rounds to the two printed decimals, folding 360.00 back onto 0.00.
fn round_angle(deg: f64) -> f64 {
    normalize_degrees((deg * 100.0).round() / 100.0)
}

fn row(
    params: &SessionParams,
    r: &TrialResult,
    threshold_deg: f64,
    with_intensity: bool,
    with_ratings: bool,
) -> Vec<String> {
    let score = scoring::score_result(r, threshold_deg);
    let mut fields = vec![
        params.participant_id.clone(),
        params.method.to_string(),
        r.trial_index.to_string(),
        r.true_direction.to_string(),
    ];
    if with_intensity {
        fields.push(r.intensity.to_string());
    }
    fields.push(match score {
        Score::Skipped => "-1".to_string(),
        Score::Scored { .. } => format!("{:.2}", round_angle(r.response_angle())),
    });
    fields.push(format!("{}", r.response_time_ms.round() as u64));
    fields.push(
        score
            .error_deg()
            .map(|e| format!("{e:.2}"))
            .unwrap_or_default(),
    );
    fields.push(score.correct_flag().to_string());
    if with_ratings {
        let (clarity, confidence) = match r.ratings {
            Some(ratings) => (ratings.clarity.to_string(), ratings.confidence.to_string()),
            None => (String::new(), String::new()),
        };
        fields.push(clarity);
        fields.push(confidence);
    }
    fields
}

fn join<'a>(fields: impl Iterator<Item = Cow<'a, str>>, delimiter: char) -> String {
    fields
        .map(|f| quote(f, delimiter))
        .collect::<Vec<_>>()
        .join(&delimiter.to_string())
}

fn quote(field: Cow<'_, str>, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Method;
    use hapdir_core::{Intensity, Ratings, Response, TrialSpec};

    fn finished(ratings: bool) -> Session {
        let params = SessionParams::new("P01", Method::WristWorn, false).unwrap();
        let sequence = vec![
            TrialSpec::new(0, Intensity::Percent(70)),
            TrialSpec::new(10, Intensity::Percent(100)),
            TrialSpec::new(45, Intensity::Percent(70)),
        ];
        let responses = [
            (Response::Angle(350.0), 1234.4),
            (Response::Angle(200.0), 987.6),
            (Response::Skipped, 2500.5),
        ];
        let mut session = Session::new(params, sequence.clone(), 30.0);
        for (i, (spec, (response, rt))) in sequence.iter().zip(responses).enumerate() {
            assert!(session.record(TrialResult {
                trial_index: i,
                true_direction: spec.direction,
                intensity: spec.intensity,
                response,
                response_time_ms: rt,
                ratings: ratings.then(|| Ratings::new(5, 6).unwrap()),
            }));
        }
        session
    }

    #[test]
    fn csv_rows_follow_the_published_layout() {
        let csv = finished(true).export_csv(&CsvOptions::default()).unwrap();
        let body = csv.strip_prefix(BOM).expect("bom");
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(
            lines[0],
            "participantId,method,trialIndex,trueDirection,intensity,responseAngle,responseTimeMs,error,isCorrect,clarity,confidence"
        );
        assert_eq!(lines[1], "P01,wrist-worn,0,0,70,350.00,1234,10.00,1,5,6");
        assert_eq!(lines[2], "P01,wrist-worn,1,10,100,200.00,988,170.00,0,5,6");
        assert_eq!(lines[3], "P01,wrist-worn,2,45,70,-1,2501,,-1,5,6");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn optional_columns_are_dropped() {
        let opts = CsvOptions {
            delimiter: ';',
            bom: false,
        };
        let csv = finished(false).export_csv(&opts).unwrap();
        let first = csv.lines().next().unwrap();
        assert!(!first.contains("clarity"));
        assert!(first.starts_with("participantId;method"));
    }

    #[test]
    fn delimiter_in_a_field_is_quoted() {
        let params = SessionParams::new("P,\"1\"", Method::HandGrip, false).unwrap();
        let spec = TrialSpec::new(90, Intensity::Single);
        let mut session = Session::new(params, vec![spec], 30.0);
        session.record(TrialResult {
            trial_index: 0,
            true_direction: 90,
            intensity: Intensity::Single,
            response: Response::Angle(91.234),
            response_time_ms: 10.0,
            ratings: None,
        });
        let csv = session
            .export_csv(&CsvOptions {
                delimiter: ',',
                bom: false,
            })
            .unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "participantId,method,trialIndex,trueDirection,responseAngle,responseTimeMs,error,isCorrect"
        );
        assert_eq!(lines[1], "\"P,\"\"1\"\"\",hand-grip,0,90,91.23,10,1.23,1");
    }

    #[test]
    fn angles_just_below_a_full_turn_print_as_zero() {
        let params = SessionParams::new("P", Method::WristWorn, false).unwrap();
        let spec = TrialSpec::new(0, Intensity::Single);
        let mut session = Session::new(params, vec![spec], 30.0);
        session.record(TrialResult {
            trial_index: 0,
            true_direction: 0,
            intensity: Intensity::Single,
            response: Response::Angle(359.996),
            response_time_ms: 0.0,
            ratings: None,
        });
        let csv = session
            .export_csv(&CsvOptions {
                delimiter: ',',
                bom: false,
            })
            .unwrap();
        assert_eq!(csv.lines().nth(1), Some("P,wrist-worn,0,0,0.00,0,0.00,1"));
    }

    #[test]
    fn incomplete_sessions_are_not_exported() {
        let params = SessionParams::new("P01", Method::WristWorn, false).unwrap();
        let session = Session::new(params, vec![TrialSpec::new(0, Intensity::Single)], 30.0);
        assert!(matches!(
            session.export_csv(&CsvOptions::default()),
            Err(ExperimentError::EmptyExport)
        ));
        assert!(session.export_json().is_err());
    }

    #[test]
    fn json_carries_summary_and_results() {
        let json = finished(true).export_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["params"]["method"], "wrist-worn");
        assert_eq!(value["summary"]["skipped"], 1);
        assert_eq!(value["results"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn writes_csv_under_the_suggested_name() {
        let dir = tempfile::tempdir().unwrap();
        let session = finished(false);
        let path = session
            .write_csv(dir.path(), 42, &CsvOptions::default())
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "experiment_P01_wrist-worn_42.csv");
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
    }
}
