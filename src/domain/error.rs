//! Domain error types.
//!
//! Two layers: [`Shortfall`] is the terminal "cannot compute" outcome of an
//! indicator or accumulation call and is returned as a value, never raised.
//! [`EngineError`] covers everything a caller must stop on (bad configuration,
//! invalid inputs, unreadable data).

/// Why an indicator or accumulation call produced no result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Shortfall {
    #[error("no price data")]
    NoData,

    #[error("insufficient data: have {have} prices, need {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("invalid parameters: {reason}")]
    InvalidParameters { reason: String },
}

/// Top-level error type for signalfolio.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
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

    #[error("invalid price for {asset}: {value}")]
    InvalidPrice { asset: String, value: f64 },

    #[error("invalid amount {value}: {reason}")]
    InvalidAmount { value: f64, reason: String },

    #[error("invalid target allocation for {asset}: {fraction} is outside [0, 1]")]
    InvalidAllocation { asset: String, fraction: f64 },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("portfolio lock poisoned by a panicked writer")]
    PortfolioPoisoned,

    #[error(transparent)]
    Shortfall(#[from] Shortfall),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        EngineError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&EngineError> for std::process::ExitCode {
    fn from(err: &EngineError) -> Self {
        let code: u8 = match err {
            EngineError::Io(_) | EngineError::PortfolioPoisoned => 1,
            EngineError::ConfigParse { .. }
            | EngineError::ConfigMissing { .. }
            | EngineError::ConfigInvalid { .. } => 2,
            EngineError::DataSource { .. } => 3,
            EngineError::InvalidPrice { .. }
            | EngineError::InvalidAmount { .. }
            | EngineError::InvalidAllocation { .. } => 4,
            EngineError::Shortfall(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}
