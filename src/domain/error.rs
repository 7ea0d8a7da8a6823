//! Domain error types.

use std::fmt;

/// Pipeline stage in which an analysis failed, recorded in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preprocess,
    Trend,
    Risk,
    Recommend,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Preprocess => "preprocess",
            Stage::Trend => "trend",
            Stage::Risk => "risk",
            Stage::Recommend => "recommend",
            Stage::Render => "render",
        };
        f.write_str(name)
    }
}

/// Top-level error type for navpredictor.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("insufficient data: have {observations} observations, need {minimum}")]
    InsufficientData { observations: usize, minimum: usize },

    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("chart rendering failed: {reason}")]
    Render { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        AnalysisError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&AnalysisError> for std::process::ExitCode {
    fn from(err: &AnalysisError) -> Self {
        let code: u8 = match err {
            AnalysisError::Io(_) => 1,
            AnalysisError::ConfigParse { .. }
            | AnalysisError::ConfigMissing { .. }
            | AnalysisError::ConfigInvalid { .. } => 2,
            AnalysisError::Data { .. } => 3,
            AnalysisError::InvalidValue { .. } => 4,
            AnalysisError::InsufficientData { .. } => 5,
            AnalysisError::Render { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
