//! Text ingest: `day,yield` lines into observations.
//!
//! Design goals:
//! - **Strict rows**: a single bad line rejects the whole batch (no silent skips)
//! - **Useful errors**: the offending line and its 1-based number are reported
//! - **Separation of concerns**: no fitting logic here

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::domain::{MIN_OBSERVATIONS, Observation};
use crate::error::{AnalysisError, AppError, ParseReason};

/// Parse a block of text (one `day,yield` pair per line).
///
/// Leading/trailing whitespace of the whole block is ignored, so a trailing
/// newline is fine. Blank lines *inside* the block are rejected like any other
/// malformed line.
pub fn parse_text(text: &str) -> Result<Vec<Observation>, AnalysisError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return parse_observations(std::iter::empty::<&str>());
    }
    parse_observations(trimmed.lines())
}

/// Parse already-split lines, then enforce the minimum dataset size.
pub fn parse_observations<I, S>(lines: I) -> Result<Vec<Observation>, AnalysisError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = Vec::new();
    for (idx, line) in lines.into_iter().enumerate() {
        out.push(parse_line(idx + 1, line.as_ref())?);
    }

    if out.len() < MIN_OBSERVATIONS {
        return Err(AnalysisError::InsufficientData {
            found: out.len(),
            required: MIN_OBSERVATIONS,
        });
    }
    Ok(out)
}

/// Parse a single `day,yield` line.
pub fn parse_line(line_no: usize, line: &str) -> Result<Observation, AnalysisError> {
    let fail = |reason| AnalysisError::Parse {
        line_no,
        line: line.to_string(),
        reason,
    };

    let mut fields = line.split(',');
    let (Some(day), Some(yield_)) = (fields.next(), fields.next()) else {
        return Err(fail(ParseReason::MissingSeparator));
    };
    if fields.next().is_some() {
        return Err(fail(ParseReason::TooManyFields));
    }

    let day = day
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|d| *d >= 1)
        .ok_or_else(|| fail(ParseReason::InvalidDay))?;
    let yield_ = yield_
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|y| y.is_finite() && *y >= 0.0)
        .ok_or_else(|| fail(ParseReason::InvalidYield))?;

    Ok(Observation { day, yield_ })
}

/// Read raw dataset text from a file, or from stdin when `path` is `-`.
pub fn read_dataset_text(path: &Path) -> Result<String, AppError> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| AppError::new(2, format!("Failed to read dataset from stdin: {e}")))?;
        return Ok(text);
    }

    fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to open dataset '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE: &str = "15,25.5\n30,35.1\n45,40.2\n60,42.5\n75,41.8\n";

    #[test]
    fn parses_valid_lines_in_order() {
        let obs = parse_text(FIVE).unwrap();
        assert_eq!(obs.len(), 5);
        assert_eq!(obs[0], Observation { day: 15, yield_: 25.5 });
        assert_eq!(obs[4], Observation { day: 75, yield_: 41.8 });
    }

    #[test]
    fn tolerates_whitespace_and_crlf() {
        let obs = parse_text("  15 , 25.5\r\n30,35\r\n 45,40.2\n60 ,42.5\n75,  41.8  \n\n").unwrap();
        assert_eq!(obs.len(), 5);
        assert_eq!(obs[1], Observation { day: 30, yield_: 35.0 });
    }

    #[test]
    fn non_numeric_yield_names_the_line() {
        let text = "15,25.5\n30,abc\n45,40.2\n60,42.5\n75,41.8";
        let err = parse_text(text).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::Parse {
                line_no: 2,
                line: "30,abc".to_string(),
                reason: ParseReason::InvalidYield,
            }
        );
    }

    #[test]
    fn missing_comma_names_the_line() {
        let text = "15,25.5\n30,35.1\n45,40.2\n60,42.5\n30";
        let err = parse_text(text).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::Parse {
                line_no: 5,
                line: "30".to_string(),
                reason: ParseReason::MissingSeparator,
            }
        );
    }

    #[test]
    fn rejects_extra_fields_and_bad_days() {
        let err = parse_line(1, "30,1.0,2.0").unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { reason: ParseReason::TooManyFields, .. }));

        for bad in ["0,10", "-5,10", "30.5,10", "x,10", ",10"] {
            let err = parse_line(1, bad).unwrap_err();
            assert!(
                matches!(err, AnalysisError::Parse { reason: ParseReason::InvalidDay, .. }),
                "{bad}: {err:?}"
            );
        }

        for bad in ["30,-1", "30,NaN", "30,inf", "30,"] {
            let err = parse_line(1, bad).unwrap_err();
            assert!(
                matches!(err, AnalysisError::Parse { reason: ParseReason::InvalidYield, .. }),
                "{bad}: {err:?}"
            );
        }
    }

    #[test]
    fn interior_blank_line_is_an_error() {
        let text = "15,25.5\n30,35.1\n\n45,40.2\n60,42.5\n75,41.8";
        let err = parse_text(text).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { line_no: 3, .. }));
    }

    #[test]
    fn four_rows_are_insufficient() {
        let err = parse_text("15,25.5\n30,35.1\n45,40.2\n60,42.5").unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { found: 4, required: 5 });

        let err = parse_text("   \n").unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { found: 0, required: 5 });
    }

    #[test]
    fn parse_error_wins_over_row_count() {
        let err = parse_text("15,25.5\n30").unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { line_no: 2, .. }));
    }

    #[test]
    fn reads_dataset_file() {
        let path = std::env::temp_dir().join(format!("lacta_ingest_{}.txt", std::process::id()));
        fs::write(&path, FIVE).unwrap();
        let text = read_dataset_text(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(parse_text(&text).unwrap().len(), 5);

        let missing = read_dataset_text(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert_eq!(missing.exit_code(), 2);
    }
}
