use chrono::{Local, NaiveDate};
use records::{HealthSample, Reading};

use crate::models::{DATE_FORMAT, RowError, SampleRow};

pub fn today() -> String {
    Local::now().date_naive().format(DATE_FORMAT).to_string()
}

pub fn parse_prn(input: &str) -> Result<String, RowError> {
    let prn = input.trim();

    if prn.is_empty() || !prn.chars().all(|c| c.is_ascii_digit()) {
        return Err(RowError::Prn(input.to_string()));
    }

    Ok(prn.to_string())
}

pub fn parse_date(input: &str) -> Result<String, RowError> {
    let date = NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| RowError::Date(input.to_string()))?;

    Ok(date.format(DATE_FORMAT).to_string())
}

/// `Unknown`, `-` and blank all mean no reading. Anything else must be a number.
fn parse_reading(input: &str) -> Option<Reading> {
    let trimmed = input.trim();

    if trimmed.is_empty() || trimmed == "-" || trimmed.eq_ignore_ascii_case("unknown") {
        return Some(Reading::Unknown);
    }

    match Reading::parse(trimmed) {
        Reading::Unknown => None,
        known => Some(known),
    }
}

fn parse_bounded(
    input: &str,
    accept: impl Fn(f64) -> bool,
    error: fn(String) -> RowError,
) -> Result<Reading, RowError> {
    match parse_reading(input) {
        Some(Reading::Known(value)) if !accept(value) => Err(error(input.to_string())),
        Some(reading) => Ok(reading),
        None => Err(error(input.to_string())),
    }
}

pub fn parse_oxygen(input: &str) -> Result<Reading, RowError> {
    parse_bounded(input, |v| (0.0..=100.0).contains(&v), RowError::OxygenSaturation)
}

pub fn parse_heart_rate(input: &str) -> Result<Reading, RowError> {
    parse_bounded(input, |v| v > 0.0, RowError::HeartRate)
}

pub fn parse_weight(input: &str) -> Result<Reading, RowError> {
    parse_bounded(input, |v| v > 0.0, RowError::Weight)
}

pub fn parse_row(line: &str) -> Result<SampleRow, RowError> {
    let fields: Vec<&str> = line.split(',').collect();

    if !(4..=5).contains(&fields.len()) {
        return Err(RowError::FieldCount(fields.len()));
    }

    let prn = parse_prn(fields[0])?;
    let date = parse_date(fields[1])?;

    let sample = HealthSample {
        oxygen_saturation: parse_oxygen(fields[2])?,
        heart_rate: parse_heart_rate(fields[3])?,
        weight: fields.get(4).map(|w| parse_weight(w)).transpose()?,
    };

    Ok(SampleRow { prn, date, sample })
}

/// Lines worth parsing, paired with their 1-based line number.
pub fn data_lines(contents: &str) -> impl Iterator<Item = (usize, &str)> {
    contents
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic() {
        let row = parse_row("123456789012,2025-04-26,98,72").unwrap();

        assert_eq!(row.prn, "123456789012");
        assert_eq!(row.date, "2025-04-26");
        assert_eq!(row.sample.oxygen_saturation, Reading::Known(98.0));
        assert_eq!(row.sample.heart_rate, Reading::Known(72.0));
        assert_eq!(row.sample.weight, None);
    }

    #[test]
    fn test_weight_and_spaces() {
        let row = parse_row(" 42 , 2025-04-06 , unknown , 60 , 71.5 ").unwrap();

        assert_eq!(row.prn, "42");
        assert_eq!(row.date, "2025-04-06");
        assert_eq!(row.sample.oxygen_saturation, Reading::Unknown);
        assert_eq!(row.sample.weight, Some(Reading::Known(71.5)));
    }

    #[test]
    fn test_unknown_markers() {
        assert_eq!(parse_heart_rate("-"), Ok(Reading::Unknown));
        assert_eq!(parse_heart_rate(""), Ok(Reading::Unknown));
        assert_eq!(parse_heart_rate("UNKNOWN"), Ok(Reading::Unknown));
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            parse_oxygen("101"),
            Err(RowError::OxygenSaturation(_))
        ));
        assert!(matches!(parse_oxygen("abc"), Err(RowError::OxygenSaturation(_))));
        assert!(matches!(parse_heart_rate("0"), Err(RowError::HeartRate(_))));
        assert!(matches!(parse_weight("-3"), Err(RowError::Weight(_))));
    }

    #[test]
    fn test_bad_rows() {
        assert_eq!(parse_row("1,2025-04-26,98"), Err(RowError::FieldCount(3)));
        assert!(matches!(
            parse_row("12a,2025-04-26,98,72"),
            Err(RowError::Prn(_))
        ));
        assert!(matches!(
            parse_row("12,26/04/2025,98,72"),
            Err(RowError::Date(_))
        ));
    }

    #[test]
    fn test_data_lines() {
        let contents = "# prn,date,spo2,heart_rate\n\n1,2025-04-26,98,72\n  \n2,2025-04-26,97,80\n";
        let lines: Vec<_> = data_lines(contents).collect();

        assert_eq!(
            lines,
            vec![(3, "1,2025-04-26,98,72"), (5, "2,2025-04-26,97,80")]
        );
    }
}
