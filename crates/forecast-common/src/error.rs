//! Error types for the forecast viewer.

use thiserror::Error;

/// Result type alias using ForecastError.
pub type ForecastResult<T> = Result<T, ForecastError>;

/// How a failure is presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Bad selection; the user can fix it and try again.
    Warning,
    /// The request could not be served.
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Primary error type for a visualization request.
///
/// Every variant is terminal for the current request only.
#[derive(Debug, Error)]
pub enum ForecastError {
    // === Input Errors ===
    #[error("Parameter tidak dikenali: {0}")]
    InvalidParameter(String),

    #[error("Forecast step {step} out of range 0..={max}")]
    InvalidForecastStep { step: i64, max: u32 },

    #[error("Invalid forecast step '{0}': expected whole hours")]
    MalformedForecastStep(String),

    #[error("Invalid run hour '{0}': expected one of 00, 06, 12, 18")]
    InvalidRunHour(String),

    #[error("Invalid run date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid region bounds: {0}")]
    InvalidRegion(String),

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    // === Data Errors ===
    #[error("Gagal memuat data GFS: {0}")]
    FetchFailed(String),

    #[error("GFS run not available: {0}")]
    RunNotAvailable(String),

    #[error("Malformed dataset response: {0}")]
    MalformedResponse(String),

    #[error("Field '{0}' not present in dataset")]
    MissingField(String),

    #[error("No grid cells inside region {0}")]
    EmptySubset(String),

    // === Rendering Errors ===
    #[error("Rendering failed: {0}")]
    RenderError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ForecastError {
    /// Whether the user sees this as a warning or an error.
    pub fn severity(&self) -> Severity {
        match self {
            ForecastError::InvalidParameter(_)
            | ForecastError::InvalidForecastStep { .. }
            | ForecastError::MalformedForecastStep(_)
            | ForecastError::InvalidRunHour(_)
            | ForecastError::InvalidDate(_)
            | ForecastError::InvalidRegion(_)
            | ForecastError::UnknownRegion(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            ForecastError::InvalidParameter(_)
            | ForecastError::InvalidForecastStep { .. }
            | ForecastError::MalformedForecastStep(_)
            | ForecastError::InvalidRunHour(_)
            | ForecastError::InvalidDate(_)
            | ForecastError::InvalidRegion(_)
            | ForecastError::EmptySubset(_) => 400,

            ForecastError::UnknownRegion(_)
            | ForecastError::RunNotAvailable(_)
            | ForecastError::MissingField(_) => 404,

            ForecastError::FetchFailed(_) | ForecastError::MalformedResponse(_) => 502,

            _ => 500,
        }
    }
}

impl From<crate::bbox::BboxParseError> for ForecastError {
    fn from(err: crate::bbox::BboxParseError) -> Self {
        ForecastError::InvalidRegion(err.to_string())
    }
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Internal(format!("JSON error: {}", err))
    }
}
