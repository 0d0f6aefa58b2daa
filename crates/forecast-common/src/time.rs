//! Forecast runs, lead times and title formatting.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, ForecastResult};

/// Longest lead time published by the hourly GFS product.
pub const MAX_FORECAST_HOUR: u32 = 240;

/// Model run cycles (GFS runs 4x daily).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelCycle {
    /// 00Z run
    Z00,
    /// 06Z run
    Z06,
    /// 12Z run
    Z12,
    /// 18Z run
    Z18,
}

impl ModelCycle {
    pub fn from_hour(hour: u32) -> Option<Self> {
        match hour {
            0 => Some(ModelCycle::Z00),
            6 => Some(ModelCycle::Z06),
            12 => Some(ModelCycle::Z12),
            18 => Some(ModelCycle::Z18),
            _ => None,
        }
    }

    /// Parse the two-digit form offered by the UI ("00", "06", "12", "18").
    pub fn parse(s: &str) -> ForecastResult<Self> {
        s.trim()
            .trim_end_matches(|c: char| c == 'z' || c == 'Z')
            .parse::<u32>()
            .ok()
            .and_then(Self::from_hour)
            .ok_or_else(|| ForecastError::InvalidRunHour(s.to_string()))
    }

    pub fn hour(&self) -> u32 {
        match self {
            ModelCycle::Z00 => 0,
            ModelCycle::Z06 => 6,
            ModelCycle::Z12 => 12,
            ModelCycle::Z18 => 18,
        }
    }

    /// Two-digit label, e.g. "06".
    pub fn label(&self) -> String {
        format!("{:02}", self.hour())
    }

    /// Get all cycles for models that run 4x daily
    pub fn all_4x_daily() -> &'static [ModelCycle] {
        &[ModelCycle::Z00, ModelCycle::Z06, ModelCycle::Z12, ModelCycle::Z18]
    }
}

/// One model initialization, identified by issue date and cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForecastRun {
    pub date: NaiveDate,
    pub cycle: ModelCycle,
}

impl ForecastRun {
    pub fn new(date: NaiveDate, cycle: ModelCycle) -> Self {
        Self { date, cycle }
    }

    /// Parse a `YYYY-MM-DD` (or `YYYYMMDD`) date and a run hour.
    pub fn parse(date: &str, hour: &str) -> ForecastResult<Self> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(date.trim(), "%Y%m%d"))
            .map_err(|_| ForecastError::InvalidDate(date.to_string()))?;
        Ok(Self::new(date, ModelCycle::parse(hour)?))
    }

    /// Date component as used in NOMADS paths: `YYYYMMDD`.
    pub fn date_compact(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }

    /// Model issue time.
    pub fn reference_time(&self) -> DateTime<Utc> {
        let midnight = self.date.and_hms_opt(0, 0, 0).unwrap_or_default();
        Utc.from_utc_datetime(&midnight) + Duration::hours(self.cycle.hour() as i64)
    }
}

impl std::fmt::Display for ForecastRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}z", self.date_compact(), self.cycle.label())
    }
}

/// Lead time in hours, validated against [`MAX_FORECAST_HOUR`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ForecastStep(u32);

impl ForecastStep {
    pub fn new(hour: i64) -> ForecastResult<Self> {
        if (0..=MAX_FORECAST_HOUR as i64).contains(&hour) {
            Ok(Self(hour as u32))
        } else {
            Err(ForecastError::InvalidForecastStep {
                step: hour,
                max: MAX_FORECAST_HOUR,
            })
        }
    }

    pub fn hour(&self) -> u32 {
        self.0
    }

    /// Index into the time dimension of an hourly dataset.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Left-hand title: `"{label} Valid 06UTC Tue 05 Mar 2024"`.
pub fn valid_title(label: &str, valid: &DateTime<Utc>) -> String {
    format!("{} Valid {}", label, valid.format("%HUTC %a %d %b %Y"))
}

/// Right-hand title: `"GFS t+012"`.
pub fn lead_title(forecast_hour: u32) -> String {
    format!("GFS t+{:03}", forecast_hour)
}
