//! Domain error types.
//!
//! Only malformed input is an error. Degenerate trading situations (no cash
//! to enter, exit while flat, indicator warm-up) and numerical edge cases
//! (zero volatility, no losing trades) resolve to defined values instead.

/// Top-level error type for stratbench.
#[derive(Debug, thiserror::Error)]
pub enum StratbenchError {
    #[error("price series is empty")]
    EmptySeries,

    #[error("timestamps must be strictly increasing: bar {index} is not after its predecessor")]
    NonMonotonicTimestamp { index: usize },

    #[error("invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("initial_capital must be positive, got {value}")]
    InvalidCapital { value: f64 },

    #[error("{name} must be non-negative and finite, got {value}")]
    InvalidRate { name: String, value: f64 },

    #[error("unknown strategy id: {id}")]
    UnknownStrategy { id: String },

    #[error("strategy {strategy} has no parameter named {parameter}")]
    UnknownParameter { strategy: String, parameter: String },

    #[error("parameter {parameter}={value} out of domain for {strategy}: {reason}")]
    ParameterOutOfDomain {
        strategy: String,
        parameter: String,
        value: f64,
        reason: String,
    },

    #[error("parameter grid entry {parameter} has no candidate values")]
    EmptyGrid { parameter: String },

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

    #[error("market data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&StratbenchError> for std::process::ExitCode {
    fn from(err: &StratbenchError) -> Self {
        let code: u8 = match err {
            StratbenchError::Io(_) | StratbenchError::Json(_) => 1,
            StratbenchError::ConfigParse { .. }
            | StratbenchError::ConfigMissing { .. }
            | StratbenchError::ConfigInvalid { .. } => 2,
            StratbenchError::Data { .. } => 3,
            StratbenchError::UnknownStrategy { .. }
            | StratbenchError::UnknownParameter { .. }
            | StratbenchError::ParameterOutOfDomain { .. }
            | StratbenchError::EmptyGrid { .. } => 4,
            StratbenchError::EmptySeries
            | StratbenchError::NonMonotonicTimestamp { .. }
            | StratbenchError::InvalidBar { .. }
            | StratbenchError::InvalidCapital { .. }
            | StratbenchError::InvalidRate { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
