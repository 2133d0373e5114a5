use crate::error::SignerRunnerError;
use crate::{run_signer_tool, SignerInvocation};
use std::sync::{Arc, Mutex};

/// Trait for signer tool operations.
///
/// Abstracts subprocess execution so pipelines can be tested without a real
/// signer binary installed.
#[async_trait::async_trait]
pub trait SignerToolOps: Send + Sync {
    /// Runs the signer tool once for the given invocation.
    ///
    /// # Returns
    /// * `Ok(())` when the tool exits successfully and the output file exists
    /// * `Err(SignerRunnerError)` on launch failure or non-zero exit
    async fn run(&self, invocation: &SignerInvocation) -> Result<(), SignerRunnerError>;
}

/// Default implementation that spawns the actual signer subprocess.
pub struct DefaultSignerToolOps;

impl DefaultSignerToolOps {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DefaultSignerToolOps {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SignerToolOps for DefaultSignerToolOps {
    async fn run(&self, invocation: &SignerInvocation) -> Result<(), SignerRunnerError> {
        run_signer_tool(invocation).await
    }
}

/// Mock implementation for testing signer tool operations.
///
/// Records every invocation and, on success, copies the input file to the
/// output file inside the working directory so that downstream pipeline steps
/// have a file to consume. Sign/verify and encrypt/decrypt therefore cancel
/// out, which lets full outbound/inbound round trips run in tests.
#[derive(Clone, Default)]
pub struct MockSignerToolOps {
    should_fail: bool,
    error_message: Option<String>,
    run_calls: Arc<Mutex<Vec<SignerInvocation>>>,
}

impl MockSignerToolOps {
    /// Creates a new mock that succeeds on every invocation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new mock that fails every invocation with the given message.
    pub fn with_failure(error_msg: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(error_msg.into()),
            ..Default::default()
        }
    }

    /// Returns all recorded invocations.
    pub fn run_calls(&self) -> Vec<SignerInvocation> {
        self.run_calls.lock().unwrap().clone()
    }

    /// Returns the total number of invocations made.
    pub fn total_calls(&self) -> usize {
        self.run_calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl SignerToolOps for MockSignerToolOps {
    async fn run(&self, invocation: &SignerInvocation) -> Result<(), SignerRunnerError> {
        self.run_calls.lock().unwrap().push(invocation.clone());

        if self.should_fail {
            return Err(SignerRunnerError::ToolFailed(
                self.error_message
                    .clone()
                    .unwrap_or_else(|| "Mock signer run failed".to_string()),
            ));
        }

        let input_path = invocation.work_dir.join(&invocation.input_file);
        let output_path = invocation.work_dir.join(&invocation.output_file);
        std::fs::copy(&input_path, &output_path)
            .map_err(|e| SignerRunnerError::IoError(format!("Mock copy failed: {}", e)))?;
        Ok(())
    }
}
