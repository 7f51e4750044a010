//! Terminal Front-End
//!
//! Asks for the listing attributes one line at a time and prints the estimate.
//! Answers are passed to the engine as strings, so the terminal goes through
//! the same shape check as the web API.

use data_validator::{FieldReader, ValidationError};
use inference_engine::{FeatureImportance, InferenceEngine, PricePrediction};
use serde_json::{Map, Value};
use std::io::{self, BufRead, Write};
use tracing::{debug, info};

const HEADER: &str = "\n--- Sri Lanka House Price Predictor (Terminal) ---";
const RULE: &str = "======================================";
const BAR_WIDTH: usize = 40;

/// How an answer becomes a field value
#[derive(Clone, Copy)]
enum Answer {
    Label,
    Decimal,
    Count,
    Year,
    YesNo,
}

impl Answer {
    /// Convert one answer, checking numbers as soon as they are typed
    fn read(self, field: &'static str, text: &str) -> Result<Option<Value>, ValidationError> {
        let raw = Value::String(text.to_string());
        let fields = Map::from_iter([(field.to_string(), raw.clone())]);
        let reader = FieldReader::new(&fields);

        match self {
            // Anything but `y` means no
            Answer::YesNo => Ok(Some(Value::Bool(text.eq_ignore_ascii_case("y")))),
            // Blank labels are left out and reported as missing
            Answer::Label if text.is_empty() => Ok(None),
            Answer::Label => Ok(Some(raw)),
            // A blank number is missing, not mistyped
            _ if text.is_empty() => Err(ValidationError::MissingField(field)),
            Answer::Decimal => reader.float(field).map(|_| Some(raw)),
            Answer::Count => reader.unsigned(field).map(|_| Some(raw)),
            Answer::Year => reader.integer(field).map(|_| Some(raw)),
        }
    }
}

/// Prompts in the order they are asked
const PROMPTS: [(&str, &str, Answer); 13] = [
    ("district", "District (e.g. Colombo): ", Answer::Label),
    ("area", "Area (e.g. Borella): ", Answer::Label),
    ("perch", "Perch: ", Answer::Decimal),
    ("bedrooms", "Bedrooms: ", Answer::Count),
    ("bathrooms", "Bathrooms: ", Answer::Count),
    ("kitchen_area_sqft", "Kitchen Area (sqft): ", Answer::Count),
    ("parking_spots", "Parking Spots: ", Answer::Count),
    ("has_garden", "Has Garden? (y/n): ", Answer::YesNo),
    ("has_ac", "Has A/C? (y/n): ", Answer::YesNo),
    ("water_supply", "Water Supply (e.g. Pipe-borne): ", Answer::Label),
    ("electricity", "Electricity (e.g. Single phase): ", Answer::Label),
    ("floors", "Floors: ", Answer::Count),
    ("year_built", "Year Built: ", Answer::Year),
];

/// Run one prompt session
///
/// Returns `Ok(None)` when the input was rejected or closed early. Only I/O
/// failures on the streams themselves are errors.
pub fn run_prompt<R: BufRead, W: Write>(
    engine: &InferenceEngine,
    mut input: R,
    out: &mut W,
) -> io::Result<Option<PricePrediction>> {
    writeln!(out, "{HEADER}")?;
    writeln!(out, "Please enter the following details:")?;

    let mut fields = Map::new();
    let mut line = String::new();

    for (field, prompt, answer) in PROMPTS {
        write!(out, "{prompt}")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            writeln!(out, "Input closed before all details were entered.")?;
            return Ok(None);
        }

        match answer.read(field, line.trim()) {
            Ok(Some(value)) => {
                fields.insert(field.to_string(), value);
            }
            Ok(None) => {}
            Err(err) => {
                writeln!(out, "Invalid input: {err}")?;
                return Ok(None);
            }
        }
    }

    debug!(fields = fields.len(), "Terminal input collected");

    match engine.predict_fields(&fields) {
        Ok(prediction) => {
            writeln!(out, "\n{RULE}")?;
            writeln!(out, " ESTIMATED PRICE: {}", prediction.formatted)?;
            writeln!(out, "{RULE}\n")?;
            info!(price = prediction.price, "Terminal prediction");
            Ok(Some(prediction))
        }
        Err(err) => {
            writeln!(out, "Invalid input: {err}")?;
            Ok(None)
        }
    }
}

/// Print importances as a horizontal bar chart
pub fn print_importances<W: Write>(bars: &[FeatureImportance], out: &mut W) -> io::Result<()> {
    let max = bars.iter().map(|b| b.importance).fold(0.0f64, f64::max);
    let label_width = bars.iter().map(|b| b.feature.len()).max().unwrap_or(0);

    writeln!(out, "Feature importance")?;
    for bar in bars {
        let len = if max > 0.0 {
            ((bar.importance / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        writeln!(
            out,
            "{:<label_width$}  {:<BAR_WIDTH$}  {:.4}",
            bar.feature,
            "#".repeat(len),
            bar.importance,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_validator::ValidationConfig;
    use inference_engine::ArtifactPaths;
    use std::path::Path;
    use std::sync::OnceLock;

    fn engine() -> &'static InferenceEngine {
        static ENGINE: OnceLock<InferenceEngine> = OnceLock::new();
        ENGINE.get_or_init(|| {
            let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures");
            InferenceEngine::load(&ArtifactPaths::in_dir(dir), ValidationConfig::default()).unwrap()
        })
    }

    const COLOMBO: &str = "Colombo\nColombo 7\n10\n3\n2\n150\n2\ny\ny\nPipe-borne\nThree phase\n2\n2020\n";

    fn session(input: &str) -> (Option<PricePrediction>, String) {
        let mut out = Vec::new();
        let result = run_prompt(engine(), input.as_bytes(), &mut out).unwrap();
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_prompt_prints_estimate() {
        let (prediction, output) = session(COLOMBO);

        assert_eq!(prediction.unwrap().price, 28_500_000.0);
        assert!(output.starts_with(HEADER));
        assert!(output.contains("Kitchen Area (sqft): "));
        assert!(output.contains(" ESTIMATED PRICE: LKR 28,500,000.00\n"));
    }

    #[test]
    fn test_yes_no_answers() {
        let uppercase = COLOMBO.replace("\ny\ny\n", "\nY\nY\n");
        let (upper, _) = session(&uppercase);
        assert_eq!(upper.unwrap().price, 28_500_000.0);

        // Only `y` counts as yes
        let spelled = COLOMBO.replace("\ny\ny\n", "\nyes\nyes\n");
        let (no, _) = session(&spelled);
        assert_eq!(no.unwrap().price, 27_500_000.0);
    }

    #[test]
    fn test_unknown_district_is_reported() {
        let (prediction, output) = session(&COLOMBO.replacen("Colombo\n", "Atlantis\n", 1));

        assert!(prediction.is_none());
        assert!(output.contains("Invalid input: "));
        assert!(output.contains("Atlantis"));
        assert!(!output.contains("ESTIMATED PRICE"));
    }

    #[test]
    fn test_non_numeric_answer_is_reported() {
        let (prediction, output) = session(&COLOMBO.replace("\n150\n", "\nlarge\n"));

        assert!(prediction.is_none());
        assert!(output.contains("Invalid input: "));
        assert!(output.contains("kitchen_area_sqft"));
    }

    #[test]
    fn test_bad_number_stops_the_prompts() {
        let (prediction, output) = session(&COLOMBO.replacen("\n10\n", "\nten\n", 1));

        assert!(prediction.is_none());
        assert!(output.contains("Invalid input: perch must be a number"));
        assert!(!output.contains("Bedrooms: "));
    }

    #[test]
    fn test_blank_answer_is_missing() {
        let (prediction, output) = session(&COLOMBO.replace("\n2020\n", "\n\n"));

        assert!(prediction.is_none());
        assert!(output.contains("Invalid input: Missing required field: year_built"));
    }

    #[test]
    fn test_closed_input() {
        let (prediction, output) = session("Colombo\nColombo 7\n");

        assert!(prediction.is_none());
        assert!(output.contains("Input closed"));
        assert!(!output.contains("Bedrooms: "));
    }

    #[test]
    fn test_importance_chart() {
        let mut out = Vec::new();
        print_importances(&engine().feature_importances(), &mut out).unwrap();
        let chart = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = chart.lines().collect();

        assert_eq!(lines.len(), 14);
        assert!(lines[1].starts_with("perch"));
        assert!(lines[1].contains(&"#".repeat(BAR_WIDTH)));
        assert!(lines.last().unwrap().ends_with("0.0000"));
    }
}
