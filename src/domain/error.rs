//! Domain error types.

/// Top-level error type for barrierlab.
#[derive(Debug, thiserror::Error)]
pub enum LabError {
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

    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("misaligned input: {reason}")]
    MisalignedInput { reason: String },

    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LabError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        LabError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&LabError> for std::process::ExitCode {
    fn from(err: &LabError) -> Self {
        let code: u8 = match err {
            LabError::Io(_) => 1,
            LabError::ConfigParse { .. }
            | LabError::ConfigMissing { .. }
            | LabError::ConfigInvalid { .. } => 2,
            LabError::DataSource { .. } => 3,
            LabError::InsufficientData { .. }
            | LabError::MisalignedInput { .. }
            | LabError::MalformedInput { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
