//! Parsing of OPeNDAP (DAP2) text responses served by NOMADS GrADS-DODS.
//!
//! Two response kinds are handled:
//! - `.dds` structure listings, to discover which variables a run exposes;
//! - `.ascii?` data listings, for coordinate axes and field hyperslabs.
//!
//! ASCII listings are a sequence of arrays. Each starts with a header line
//! `name, [d0][d1]...` followed by comma separated values, optionally prefixed
//! by row indices such as `[0][3], `.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use forecast_common::{ForecastError, ForecastResult};

/// GrADS writes missing values as 9.999e20.
pub const FILL_VALUE_THRESHOLD: f64 = 9.99e20;

/// One array from an ASCII response.
#[derive(Debug, Clone, PartialEq)]
pub struct DapArray {
    pub name: String,
    pub dims: Vec<usize>,
    pub values: Vec<f64>,
}

impl DapArray {
    /// Name without a `grid.` prefix (`pratesfc.lat` → `lat`).
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    fn expected_len(&self) -> usize {
        self.dims.iter().product()
    }
}

/// Parse a DAP2 ASCII response into its arrays, in order of appearance.
pub fn parse_ascii(body: &str) -> ForecastResult<Vec<DapArray>> {
    check_error_body(body)?;

    let mut arrays: Vec<DapArray> = Vec::new();
    for raw in body.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("Dataset") || line.starts_with("---") {
            continue;
        }

        if let Some((name, dims)) = parse_header(line) {
            arrays.push(DapArray {
                name,
                dims,
                values: Vec::new(),
            });
            continue;
        }

        let current = arrays.last_mut().ok_or_else(|| {
            ForecastError::MalformedResponse(format!("data before any array header: {}", line))
        })?;

        for token in strip_index_prefix(line).split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let value: f64 = token.parse().map_err(|_| {
                ForecastError::MalformedResponse(format!(
                    "invalid number '{}' in {}",
                    token, current.name
                ))
            })?;
            current.values.push(value);
        }
    }

    if arrays.is_empty() {
        return Err(ForecastError::MalformedResponse(
            "no arrays in OPeNDAP response".to_string(),
        ));
    }

    for array in &arrays {
        if array.values.len() != array.expected_len() {
            return Err(ForecastError::MalformedResponse(format!(
                "{}: expected {} values, got {}",
                array.name,
                array.expected_len(),
                array.values.len()
            )));
        }
    }

    Ok(arrays)
}

/// Find an array by its short name.
pub fn find_array<'a>(arrays: &'a [DapArray], name: &str) -> ForecastResult<&'a DapArray> {
    arrays
        .iter()
        .find(|a| a.short_name() == name)
        .ok_or_else(|| ForecastError::MalformedResponse(format!("missing array '{}'", name)))
}

/// Variable names declared in a `.dds` response.
pub fn parse_dds_variables(body: &str) -> ForecastResult<BTreeSet<String>> {
    check_error_body(body)?;
    if !body.trim_start().starts_with("Dataset") {
        return Err(ForecastError::MalformedResponse(
            "DDS response does not start with 'Dataset'".to_string(),
        ));
    }

    let mut names = BTreeSet::new();
    for line in body.lines() {
        let line = line.trim();
        let Some((kind, rest)) = line.split_once(char::is_whitespace) else {
            continue;
        };
        if !matches!(
            kind,
            "Float32" | "Float64" | "Int16" | "Int32" | "UInt16" | "UInt32" | "Byte"
        ) {
            continue;
        }
        let name: String = rest
            .trim()
            .chars()
            .take_while(|c| *c != '[' && *c != ';')
            .collect();
        if !name.is_empty() {
            names.insert(name);
        }
    }
    Ok(names)
}

/// Surface DAP `Error { ... }` bodies as errors.
fn check_error_body(body: &str) -> ForecastResult<()> {
    let trimmed = body.trim_start();
    if !trimmed.starts_with("Error") && !trimmed.starts_with("<") {
        return Ok(());
    }
    let message = extract_error_message(trimmed);
    let lower = message.to_ascii_lowercase();
    if lower.contains("not an available dataset") || lower.contains("not found") {
        Err(ForecastError::RunNotAvailable(message))
    } else {
        Err(ForecastError::MalformedResponse(message))
    }
}

fn extract_error_message(body: &str) -> String {
    if let Some(start) = body.find("message") {
        let rest = &body[start..];
        if let (Some(open), Some(close)) = (rest.find('"'), rest.rfind('"')) {
            if close > open {
                return rest[open + 1..close].to_string();
            }
        }
    }
    body.lines().take(3).collect::<Vec<_>>().join(" ")
}

/// `name, [a][b]` → `("name", [a, b])`.
fn parse_header(line: &str) -> Option<(String, Vec<usize>)> {
    let (name, rest) = line.split_once(", ")?;
    let rest = rest.trim();
    if name.starts_with('[') || !rest.starts_with('[') || !rest.ends_with(']') {
        return None;
    }
    let dims = rest[1..rest.len() - 1]
        .split("][")
        .map(|d| d.trim().parse::<usize>().ok())
        .collect::<Option<Vec<_>>>()?;
    Some((name.trim().to_string(), dims))
}

/// Drop a leading `[i][j], ` row index.
fn strip_index_prefix(line: &str) -> &str {
    if line.starts_with('[') {
        line.split_once(", ").map(|(_, rest)| rest).unwrap_or("")
    } else {
        line
    }
}

/// Convert a GrADS fill value to NaN.
pub fn fill_to_nan(value: f64) -> f32 {
    if value.abs() >= FILL_VALUE_THRESHOLD || value.is_nan() {
        f32::NAN
    } else {
        value as f32
    }
}

/// Decode a GrADS time coordinate (days since 0001-01-01 00:00, Julian before
/// the Gregorian reform) into UTC.
pub fn grads_days_to_utc(days: f64) -> Option<DateTime<Utc>> {
    if !days.is_finite() {
        return None;
    }
    let whole = days.floor();
    let seconds = ((days - whole) * 86_400.0).round() as i64;
    // Julian 0001-01-01 falls on proleptic Gregorian 0000-12-30.
    let date = NaiveDate::from_num_days_from_ce_opt(whole as i32 - 1)?;
    let midnight = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?);
    Some(midnight + Duration::seconds(seconds))
}

/// Inverse of [`grads_days_to_utc`].
pub fn utc_to_grads_days(time: &DateTime<Utc>) -> f64 {
    use chrono::{Datelike, Timelike};
    let day = time.date_naive().num_days_from_ce() as f64 + 1.0;
    day + time.num_seconds_from_midnight() as f64 / 86_400.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("pratesfc, [1][5][4]"),
            Some(("pratesfc".to_string(), vec![1, 5, 4]))
        );
        assert_eq!(parse_header("[0][1], 1.0, 2.0"), None);
        assert_eq!(parse_header("1.0, 2.0"), None);
    }

    #[test]
    fn test_strip_index_prefix() {
        assert_eq!(strip_index_prefix("[0][3], 1.5, 2.5"), "1.5, 2.5");
        assert_eq!(strip_index_prefix("1.5, 2.5"), "1.5, 2.5");
    }

    #[test]
    fn test_fill_to_nan() {
        assert!(fill_to_nan(9.999e20).is_nan());
        assert_eq!(fill_to_nan(1.5), 1.5);
    }

    #[test]
    fn test_grads_epoch() {
        // Day 2 of the GrADS axis is proleptic Gregorian 0001-01-01.
        let dt = grads_days_to_utc(2.0).unwrap();
        assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(1, 1, 1).unwrap());
    }
}
