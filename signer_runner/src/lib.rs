use async_process::Command;
use std::path::PathBuf;

use error::SignerRunnerError;

pub mod error;
pub mod ops;

/// Which certificate store the signer tool should look in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreScope {
    User,
    Machine,
}

impl StoreScope {
    /// Single-letter store selector the signer tool expects in its flags.
    pub fn letter(&self) -> &'static str {
        match self {
            StoreScope::User => "u",
            StoreScope::Machine => "m",
        }
    }
}

/// One of the four operations the signer tool performs. Certificates are
/// identified by their store thumbprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerOperation {
    Sign { thumbprint: String },
    Verify,
    Encrypt { thumbprint: String },
    Decrypt { thumbprint: String },
}

/// A single invocation of the signer tool: the executable, the operation with
/// its certificate, the store scope and the input/output file names relative
/// to the working directory.
#[derive(Debug, Clone)]
pub struct SignerInvocation {
    pub executable: PathBuf,
    pub operation: SignerOperation,
    pub store_scope: StoreScope,
    pub input_file: String,
    pub output_file: String,
    pub work_dir: PathBuf,
}

impl SignerInvocation {
    /// Builds the argument vector for the signer tool.
    ///
    /// Chain building and revocation checks are suppressed for every
    /// operation that accepts the flags, output encoding is DER, and the
    /// store flag carries the scope letter. Input and output paths come last.
    pub fn to_arguments(&self) -> Vec<String> {
        let scope = self.store_scope.letter();
        let mut args: Vec<String> = match &self.operation {
            SignerOperation::Sign { thumbprint } => vec![
                "-sign".into(),
                "-thumbprint".into(),
                thumbprint.clone(),
                "-nochain".into(),
                "-norev".into(),
                format!("-{}My", scope),
                "-der".into(),
                "-strict".into(),
            ],
            SignerOperation::Verify => vec![
                "-verify".into(),
                "-nochain".into(),
                "-norev".into(),
                format!("-{}AddressBook", scope),
            ],
            SignerOperation::Encrypt { thumbprint } => vec![
                "-encr".into(),
                "-thumbprint".into(),
                thumbprint.clone(),
                "-nochain".into(),
                "-norev".into(),
                format!("-{}", scope),
                "-der".into(),
            ],
            SignerOperation::Decrypt { thumbprint } => {
                vec!["-decr".into(), "-thumbprint".into(), thumbprint.clone()]
            }
        };
        args.push(self.input_file.clone());
        args.push(self.output_file.clone());
        args
    }
}

/// Runs the signer tool once for the given invocation.
///
/// The process is started in the invocation's working directory with the
/// argument vector from [`SignerInvocation::to_arguments`]. A non-zero exit
/// status (or a failure to launch) is the only failure signal; the tool's
/// output is not parsed.
///
/// # errors
/// * `SignerRunnerError::InputFileNotFound`: if the input file does not exist.
/// * `SignerRunnerError::IoError`: if the process cannot be started.
/// * `SignerRunnerError::ToolFailed`: if the tool exits with non-zero status.
pub async fn run_signer_tool(invocation: &SignerInvocation) -> Result<(), SignerRunnerError> {
    let input_path = invocation.work_dir.join(&invocation.input_file);
    if !input_path.exists() {
        return Err(SignerRunnerError::InputFileNotFound);
    }

    let args = invocation.to_arguments();

    tracing::debug!("Signer executable: {}", invocation.executable.display());
    tracing::debug!("Signer arguments: {:?}", args);

    let status = Command::new(&invocation.executable)
        .args(&args)
        .current_dir(&invocation.work_dir)
        .status()
        .await
        .map_err(|e| {
            SignerRunnerError::IoError(format!("Failed to get status of signer tool: {}", e))
        })?;

    if !status.success() {
        return Err(SignerRunnerError::ToolFailed(status.to_string()));
    }

    Ok(())
}
