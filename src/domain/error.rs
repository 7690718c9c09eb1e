//! Domain error types.
//!
//! Numeric degeneracies (flat equity, no closed trades) are not errors: they are
//! reported through sentinel values by the metric calculators.

/// Top-level error type for stratlab.
#[derive(Debug, thiserror::Error)]
pub enum StratlabError {
    #[error("validation error: {reason}")]
    Validation { reason: String },

    #[error("unsupported frequency '{freq}', valid options: 1d, 1h, 1min")]
    UnsupportedFrequency { freq: String },

    #[error("empty result: {reason}")]
    EmptyResult { reason: String },

    #[error("unknown strategy '{name}', available: {available}")]
    UnknownStrategy { name: String, available: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StratlabError {
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        StratlabError::Validation {
            reason: reason.into(),
        }
    }
}

impl From<&StratlabError> for std::process::ExitCode {
    fn from(err: &StratlabError) -> Self {
        let code: u8 = match err {
            StratlabError::Io(_) => 1,
            StratlabError::ConfigParse { .. }
            | StratlabError::ConfigInvalid { .. }
            | StratlabError::UnsupportedFrequency { .. } => 2,
            StratlabError::Data { .. } => 3,
            StratlabError::UnknownStrategy { .. } => 4,
            StratlabError::Validation { .. } | StratlabError::EmptyResult { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
