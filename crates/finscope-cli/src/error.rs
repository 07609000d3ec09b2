use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] finscope_core::ValidationError),

    #[error("unexpected input '{0}' after SYMBOL [WINDOW] [GRANULARITY]")]
    ExtraWatchFields(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::ExtraWatchFields(_) => 2,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

/// A product failed to load; its error is already part of the rendered report.
pub const PRODUCT_FAILURE_EXIT_CODE: u8 = 3;
