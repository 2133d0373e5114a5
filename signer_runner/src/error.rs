use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignerRunnerError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Input file not found")]
    InputFileNotFound,
    #[error("Signer tool failed with status: {0}")]
    ToolFailed(String),
}
