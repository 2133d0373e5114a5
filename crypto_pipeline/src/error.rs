use file_archive::FileArchiveError;
use signer_runner::error::SignerRunnerError;
use thiserror::Error;

/// The underlying cause of a failed pipeline step.
#[derive(Error, Debug)]
pub enum StepFailure {
    #[error("signer tool error: {0}")]
    Signer(#[from] SignerRunnerError),
    #[error("archive error: {0}")]
    Archive(#[from] FileArchiveError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("logical file name is required but was not set")]
    MissingLogicalFileName,
}

/// A pipeline failure tagged with the logical operation that caused it.
///
/// Exactly one of these surfaces per failed run; cleanup problems are never
/// reported through it.
#[derive(Error, Debug)]
#[error("failed to perform operation \"{operation}\": {cause}")]
pub struct Error {
    pub operation: &'static str,
    #[source]
    pub cause: StepFailure,
}

impl Error {
    pub fn new(operation: &'static str, cause: StepFailure) -> Self {
        Self { operation, cause }
    }
}
