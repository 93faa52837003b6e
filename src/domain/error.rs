//! Domain error types.

/// Top-level error type for stratsim.
#[derive(Debug, thiserror::Error)]
pub enum StratsimError {
    #[error("malformed strategy: {reason}")]
    MalformedStrategy { reason: String },

    #[error("indicator rule error for '{rule}': {reason}")]
    StrategyIndicator { rule: String, reason: String },

    #[error("indicator error: {reason}")]
    Indicator { reason: String },

    #[error("invalid symbol: {symbol}")]
    InvalidSymbol { symbol: String },

    #[error("insufficient data for {symbol}: {reason}")]
    InsufficientData { symbol: String, reason: String },

    #[error("missing credential: {name}")]
    MissingCredential { name: String },

    #[error("broker error: {reason}")]
    Broker { reason: String },

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

    #[error("strategy document error: {0}")]
    StrategyDocument(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&StratsimError> for std::process::ExitCode {
    fn from(err: &StratsimError) -> Self {
        let code: u8 = match err {
            StratsimError::Io(_) => 1,
            StratsimError::ConfigParse { .. }
            | StratsimError::ConfigMissing { .. }
            | StratsimError::ConfigInvalid { .. } => 2,
            StratsimError::Broker { .. }
            | StratsimError::InvalidSymbol { .. }
            | StratsimError::InsufficientData { .. }
            | StratsimError::MissingCredential { .. } => 3,
            StratsimError::MalformedStrategy { .. }
            | StratsimError::StrategyIndicator { .. }
            | StratsimError::StrategyDocument(_) => 4,
            StratsimError::Indicator { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
