use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use signer_runner::{ops::SignerToolOps, StoreScope};

use crate::model::{CryptoOptions, Direction};

/// How many times a temp-file deletion is attempted before giving up.
pub const CLEANUP_RETRY_ATTEMPTS: usize = 3;
/// Fixed delay between deletion attempts.
pub const CLEANUP_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Mutable, single-owner state for one file's journey through the pipeline.
///
/// A context is created by an orchestration entry point, mutated only by the
/// steps of one pipeline run, and disposed exactly once at the end of that
/// run. It must never be shared between concurrent runs.
pub struct CryptoContext {
    /// Directory all files of this run live under.
    pub work_directory: PathBuf,
    /// Seed file name on disk (physical name).
    pub physical_file_name: String,
    /// Name the payload should carry inside the archive (logical name).
    logical_file_name: Option<String>,
    pub direction: Direction,
    /// Name of the file produced by the most recent step.
    last_file_name: Option<String>,
    /// File names to delete at disposal, insertion-ordered, case-insensitively
    /// unique, append-only during the run.
    temp_files: Vec<String>,
    disposed: bool,

    // Signer configuration, copied from the options at construction.
    pub is_machine_store: bool,
    pub signer_tool_path: PathBuf,
    pub sign_certificate: String,
    pub verify_certificate: String,
    pub encrypt_certificate: String,
    pub decrypt_certificate: String,

    /// Collaborator performing the actual signer tool invocations.
    pub signer: Arc<dyn SignerToolOps>,
}

impl CryptoContext {
    pub fn new(
        options: &CryptoOptions,
        signer: Arc<dyn SignerToolOps>,
        work_directory: PathBuf,
        physical_file_name: String,
        direction: Direction,
        logical_file_name: Option<String>,
    ) -> Self {
        Self {
            work_directory,
            physical_file_name,
            logical_file_name,
            direction,
            last_file_name: None,
            temp_files: Vec::new(),
            disposed: false,
            is_machine_store: options.is_machine_store,
            signer_tool_path: options.signer_tool_path.clone(),
            sign_certificate: options.sign_certificate.clone(),
            verify_certificate: options.verify_certificate.clone(),
            encrypt_certificate: options.encrypt_certificate.clone(),
            decrypt_certificate: options.decrypt_certificate.clone(),
            signer,
        }
    }

    /// The file the next step should consume: the last produced file, or the
    /// seed file before any step has run.
    pub fn input_file_name(&self) -> &str {
        self.last_file_name
            .as_deref()
            .unwrap_or(&self.physical_file_name)
    }

    pub fn last_file_name(&self) -> Option<&str> {
        self.last_file_name.as_deref()
    }

    pub fn set_last_file_name(&mut self, file_name: String) {
        self.last_file_name = Some(file_name);
    }

    pub fn logical_file_name(&self) -> Option<&str> {
        self.logical_file_name.as_deref()
    }

    pub fn set_logical_file_name(&mut self, name: String) {
        self.logical_file_name = Some(name);
    }

    pub fn store_scope(&self) -> StoreScope {
        if self.is_machine_store {
            StoreScope::Machine
        } else {
            StoreScope::User
        }
    }

    /// Registers a file name for deletion at disposal.
    ///
    /// Empty names are ignored, and a name already present (compared
    /// case-insensitively over the full Unicode range) is not added again.
    pub fn add_temp_file(&mut self, file_name: &str) {
        if file_name.is_empty() {
            return;
        }
        let folded = file_name.to_lowercase();
        if !self
            .temp_files
            .iter()
            .any(|f| f.to_lowercase() == folded)
        {
            self.temp_files.push(file_name.to_string());
        }
    }

    #[cfg(test)]
    pub(crate) fn temp_files(&self) -> &[String] {
        &self.temp_files
    }

    /// Deletes every registered temp file, best-effort.
    ///
    /// The current last file is registered first, so a disposed context leaves
    /// nothing of the run behind on the happy path. A missing file is not an
    /// error. Each failing deletion is retried `CLEANUP_RETRY_ATTEMPTS` times
    /// with `CLEANUP_RETRY_DELAY` in between and then given up on with a
    /// warning: cleanup never affects the run's primary outcome. Calling
    /// `dispose` more than once is a no-op.
    pub async fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        if let Some(last) = self.last_file_name.clone() {
            self.add_temp_file(&last);
        }

        let paths: Vec<PathBuf> = self
            .temp_files
            .drain(..)
            .map(|f| self.work_directory.join(f))
            .collect();

        for path in &paths {
            delete_with_retry(path).await;
        }
    }
}

async fn delete_with_retry(path: &Path) {
    for attempt in 1..=CLEANUP_RETRY_ATTEMPTS {
        if !path.exists() {
            return;
        }
        match std::fs::remove_file(path) {
            Ok(()) => return,
            Err(e) => {
                tracing::warn!(
                    "Attempt {}/{} to delete {} failed: {}",
                    attempt,
                    CLEANUP_RETRY_ATTEMPTS,
                    path.display(),
                    e
                );
                if attempt < CLEANUP_RETRY_ATTEMPTS {
                    async_std::task::sleep(CLEANUP_RETRY_DELAY).await;
                }
            }
        }
    }
    tracing::warn!("Giving up on deleting {}", path.display());
}
