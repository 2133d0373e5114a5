use std::{io::Write, path::PathBuf, sync::Arc};

use signer_runner::ops::{DefaultSignerToolOps, SignerToolOps};
use tempfile::TempDir;

use crate::{
    context::CryptoContext,
    error::{Error, StepFailure},
    model::{CryptoOptions, Direction},
    pipeline::{CryptoProcessor, ProcessorBuilder},
    steps::{ArchiveStep, DecryptStep, EncryptStep, SignStep, UnarchiveStep, VerifyStep},
};

/// Orchestration entry points for preparing outbound and recovering inbound
/// messages.
///
/// Each call materializes a unique working directory with a seed file, runs
/// the matching pipeline over a fresh context and disposes the context
/// afterward, on success and on failure alike. The working directory itself
/// is a `TempDir` guard held across the run, so even files a failed cleanup
/// leaves behind are removed with the directory.
pub struct CryptoExchangeService {
    options: CryptoOptions,
    signer: Arc<dyn SignerToolOps>,
}

impl CryptoExchangeService {
    pub fn new(options: CryptoOptions) -> Self {
        Self::new_with_signer_ops(options, Arc::new(DefaultSignerToolOps))
    }

    pub fn new_with_signer_ops(options: CryptoOptions, signer: Arc<dyn SignerToolOps>) -> Self {
        Self { options, signer }
    }

    fn build_processor() -> CryptoProcessor {
        let mut builder = ProcessorBuilder::new();
        builder.add_outbound_step(Box::new(ArchiveStep));
        builder.add_outbound_step(Box::new(SignStep));
        builder.add_outbound_step(Box::new(EncryptStep));
        builder.add_inbound_step(Box::new(DecryptStep));
        builder.add_inbound_step(Box::new(VerifyStep));
        builder.add_inbound_step(Box::new(UnarchiveStep));
        builder.build()
    }

    /// Prepares `payload` for sending: archive under `logical_file_name`,
    /// sign, encrypt. Returns the encrypted bytes.
    pub async fn process_outbound(
        &self,
        payload: &[u8],
        logical_file_name: &str,
    ) -> Result<Vec<u8>, Error> {
        let (work_directory, seed_file_name, _work_dir_guard) = create_work_area(payload)
            .map_err(|e| Error::new("Prepare", StepFailure::Io(e)))?;

        let mut context = CryptoContext::new(
            &self.options,
            self.signer.clone(),
            work_directory,
            seed_file_name,
            Direction::Outbound,
            Some(logical_file_name.to_string()),
        );

        let run_result = Self::build_processor().execute(&mut context).await;
        let outcome = match run_result {
            Ok(()) => read_current_file(&context),
            Err(e) => Err(e),
        };
        context.dispose().await;

        outcome
    }

    /// Recovers a received message: decrypt, verify, unarchive. Returns the
    /// payload bytes and the logical file name found inside the archive.
    pub async fn process_inbound(&self, payload: &[u8]) -> Result<(Vec<u8>, String), Error> {
        let (work_directory, seed_file_name, _work_dir_guard) = create_work_area(payload)
            .map_err(|e| Error::new("Prepare", StepFailure::Io(e)))?;

        let mut context = CryptoContext::new(
            &self.options,
            self.signer.clone(),
            work_directory,
            seed_file_name,
            Direction::Inbound,
            None,
        );

        let run_result = Self::build_processor().execute(&mut context).await;
        let outcome = match run_result {
            Ok(()) => read_current_file(&context).and_then(|bytes| {
                let logical_file_name = context
                    .logical_file_name()
                    .map(str::to_string)
                    .ok_or_else(|| {
                        Error::new("Unarchive", StepFailure::MissingLogicalFileName)
                    })?;
                Ok((bytes, logical_file_name))
            }),
            Err(e) => Err(e),
        };
        context.dispose().await;

        outcome
    }
}

/// Creates a unique working directory holding a unique seed file with the
/// given content. Returns the directory path, the seed file name and the
/// directory guard that removes the whole area when dropped.
fn create_work_area(payload: &[u8]) -> std::io::Result<(PathBuf, String, TempDir)> {
    let dir = tempfile::Builder::new()
        .prefix("crypto-exchange-")
        .tempdir()?;

    let mut seed = tempfile::Builder::new()
        .prefix("payload-")
        .suffix(".tmp")
        .tempfile_in(dir.path())?;
    seed.write_all(payload)?;
    let (_, seed_path) = seed.keep().map_err(|e| e.error)?;

    let seed_file_name = seed_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok((dir.path().to_path_buf(), seed_file_name, dir))
}

fn read_current_file(context: &CryptoContext) -> Result<Vec<u8>, Error> {
    std::fs::read(context.work_directory.join(context.input_file_name()))
        .map_err(|e| Error::new("ReadResult", StepFailure::Io(e)))
}
