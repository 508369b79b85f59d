//! CLI-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0} element(s) detached from the forest")]
    Detached(usize),
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        Self::Application(ApplicationError::Domain(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::Detached(_) => crate::exitcode::DETACHED,
            CliError::Application(e) => match e {
                ApplicationError::Domain(DomainError::UnknownElement(_)) => crate::exitcode::USAGE,
                ApplicationError::Domain(_) => crate::exitcode::DATAERR,
                ApplicationError::Catalog { .. } => crate::exitcode::DATAERR,
                ApplicationError::CatalogNotFound(_) => crate::exitcode::NOINPUT,
                ApplicationError::NoCatalog => crate::exitcode::USAGE,
                ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                ApplicationError::OperationFailed { .. } => crate::exitcode::SOFTWARE,
            },
        }
    }
}
