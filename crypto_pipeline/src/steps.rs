//! The concrete pipeline steps.
//!
//! Outbound order: Archive, Sign, Encrypt. Inbound order: Decrypt, Verify,
//! Unarchive. Every step consumes `context.input_file_name()`, produces a file
//! whose name swaps in the step's own extension, registers the consumed file
//! for cleanup and advances `last_file_name`.

use crate::{
    context::CryptoContext,
    error::StepFailure,
    file_name::replace_extension,
    pipeline::PipelineStep,
};
use signer_runner::{SignerInvocation, SignerOperation};

fn signer_invocation(
    context: &CryptoContext,
    operation: SignerOperation,
    input_file: String,
    output_file: String,
) -> SignerInvocation {
    SignerInvocation {
        executable: context.signer_tool_path.clone(),
        operation,
        store_scope: context.store_scope(),
        input_file,
        output_file,
        work_dir: context.work_directory.clone(),
    }
}

/// Signs the current file with the own signing certificate, producing `.sgn`.
pub struct SignStep;

#[async_trait::async_trait]
impl PipelineStep for SignStep {
    fn name(&self) -> &'static str {
        "Sign"
    }

    async fn execute(&self, context: &mut CryptoContext) -> Result<(), StepFailure> {
        let input_file = context.input_file_name().to_string();
        let output_file = replace_extension(&input_file, "sgn");

        let invocation = signer_invocation(
            context,
            SignerOperation::Sign {
                thumbprint: context.sign_certificate.clone(),
            },
            input_file.clone(),
            output_file.clone(),
        );
        context.signer.run(&invocation).await?;

        context.add_temp_file(&input_file);
        context.set_last_file_name(output_file);
        Ok(())
    }
}

/// Verifies the signature of the current file against the address-book store,
/// producing the raw payload as `.usg`.
pub struct VerifyStep;

#[async_trait::async_trait]
impl PipelineStep for VerifyStep {
    fn name(&self) -> &'static str {
        "Verify"
    }

    async fn execute(&self, context: &mut CryptoContext) -> Result<(), StepFailure> {
        let input_file = context.input_file_name().to_string();
        let output_file = replace_extension(&input_file, "usg");

        let invocation = signer_invocation(
            context,
            SignerOperation::Verify,
            input_file.clone(),
            output_file.clone(),
        );
        context.signer.run(&invocation).await?;

        context.add_temp_file(&input_file);
        context.set_last_file_name(output_file);
        Ok(())
    }
}

/// Encrypts the current file for the partner certificate, producing `.enc`.
pub struct EncryptStep;

#[async_trait::async_trait]
impl PipelineStep for EncryptStep {
    fn name(&self) -> &'static str {
        "Encrypt"
    }

    async fn execute(&self, context: &mut CryptoContext) -> Result<(), StepFailure> {
        let input_file = context.input_file_name().to_string();
        let output_file = replace_extension(&input_file, "enc");

        let invocation = signer_invocation(
            context,
            SignerOperation::Encrypt {
                thumbprint: context.encrypt_certificate.clone(),
            },
            input_file.clone(),
            output_file.clone(),
        );
        context.signer.run(&invocation).await?;

        context.add_temp_file(&input_file);
        context.set_last_file_name(output_file);
        Ok(())
    }
}

/// Decrypts the current file with the own decryption certificate, producing
/// `.unc`.
pub struct DecryptStep;

#[async_trait::async_trait]
impl PipelineStep for DecryptStep {
    fn name(&self) -> &'static str {
        "Decrypt"
    }

    async fn execute(&self, context: &mut CryptoContext) -> Result<(), StepFailure> {
        let input_file = context.input_file_name().to_string();
        let output_file = replace_extension(&input_file, "unc");

        let invocation = signer_invocation(
            context,
            SignerOperation::Decrypt {
                thumbprint: context.decrypt_certificate.clone(),
            },
            input_file.clone(),
            output_file.clone(),
        );
        context.signer.run(&invocation).await?;

        context.add_temp_file(&input_file);
        context.set_last_file_name(output_file);
        Ok(())
    }
}

/// Packs the current file into a zip archive as a single entry named after
/// the context's logical file name, producing `.zip`.
pub struct ArchiveStep;

#[async_trait::async_trait]
impl PipelineStep for ArchiveStep {
    fn name(&self) -> &'static str {
        "Archive"
    }

    async fn execute(&self, context: &mut CryptoContext) -> Result<(), StepFailure> {
        let input_file = context.input_file_name().to_string();
        let entry_name = context
            .logical_file_name()
            .ok_or(StepFailure::MissingLogicalFileName)?
            .to_string();
        let output_file = replace_extension(&input_file, "zip");

        file_archive::pack_single_entry(
            &context.work_directory.join(&input_file),
            &context.work_directory.join(&output_file),
            &entry_name,
        )?;

        context.add_temp_file(&input_file);
        context.set_last_file_name(output_file);
        Ok(())
    }
}

/// Extracts the first entry of the current zip archive, producing `.xyz` and
/// reporting the entry's base name back through the logical file name.
pub struct UnarchiveStep;

#[async_trait::async_trait]
impl PipelineStep for UnarchiveStep {
    fn name(&self) -> &'static str {
        "Unarchive"
    }

    async fn execute(&self, context: &mut CryptoContext) -> Result<(), StepFailure> {
        let input_file = context.input_file_name().to_string();
        let output_file = replace_extension(&input_file, "xyz");

        let entry_name = file_archive::extract_first_entry(
            &context.work_directory.join(&input_file),
            &context.work_directory.join(&output_file),
        )?;

        context.add_temp_file(&input_file);
        context.set_last_file_name(output_file);
        context.set_logical_file_name(entry_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{CryptoOptions, Direction},
        pipeline::ProcessorBuilder,
    };
    use signer_runner::ops::MockSignerToolOps;
    use std::{fs::File, io::Write, path::PathBuf, sync::Arc};
    use tempfile::tempdir;
    use zip::{write::SimpleFileOptions, ZipWriter};

    fn test_options() -> CryptoOptions {
        CryptoOptions {
            is_machine_store: false,
            signer_tool_path: PathBuf::from("signer"),
            sign_certificate: "sign-cert".to_string(),
            verify_certificate: "verify-cert".to_string(),
            encrypt_certificate: "encrypt-cert".to_string(),
            decrypt_certificate: "decrypt-cert".to_string(),
        }
    }

    fn test_context(
        signer: Arc<MockSignerToolOps>,
        work_dir: PathBuf,
        direction: Direction,
        logical_file_name: Option<&str>,
    ) -> CryptoContext {
        CryptoContext::new(
            &test_options(),
            signer,
            work_dir,
            "seed.tmp".to_string(),
            direction,
            logical_file_name.map(str::to_string),
        )
    }

    #[async_std::test]
    async fn test_sign_step_advances_context() {
        let temp_dir = tempdir().unwrap();
        std::fs::write(temp_dir.path().join("seed.tmp"), b"payload").unwrap();

        let signer = Arc::new(MockSignerToolOps::new());
        let mut context = test_context(
            signer.clone(),
            temp_dir.path().to_path_buf(),
            Direction::Outbound,
            None,
        );

        SignStep.execute(&mut context).await.unwrap();

        assert_eq!(context.last_file_name(), Some("seed.sgn"));
        assert_eq!(context.temp_files(), ["seed.tmp"]);

        let calls = signer.run_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].operation,
            SignerOperation::Sign {
                thumbprint: "sign-cert".to_string()
            }
        );
        assert!(calls[0].to_arguments().contains(&"-uMy".to_string()));
    }

    #[async_std::test]
    async fn test_archive_step_requires_logical_file_name() {
        let temp_dir = tempdir().unwrap();
        std::fs::write(temp_dir.path().join("seed.tmp"), b"payload").unwrap();

        let mut context = test_context(
            Arc::new(MockSignerToolOps::new()),
            temp_dir.path().to_path_buf(),
            Direction::Outbound,
            None,
        );

        let result = ArchiveStep.execute(&mut context).await;
        assert!(matches!(result, Err(StepFailure::MissingLogicalFileName)));
        // A failed step leaves the context untouched.
        assert!(context.last_file_name().is_none());
        assert!(context.temp_files().is_empty());
    }

    #[async_std::test]
    async fn test_archive_then_unarchive_round_trips_entry_name() {
        let temp_dir = tempdir().unwrap();
        std::fs::write(temp_dir.path().join("seed.tmp"), b"payload").unwrap();

        let signer = Arc::new(MockSignerToolOps::new());
        let mut context = test_context(
            signer.clone(),
            temp_dir.path().to_path_buf(),
            Direction::Outbound,
            Some("report.csv"),
        );

        ArchiveStep.execute(&mut context).await.unwrap();
        assert_eq!(context.last_file_name(), Some("seed.zip"));
        assert!(temp_dir.path().join("seed.zip").exists());

        UnarchiveStep.execute(&mut context).await.unwrap();
        assert_eq!(context.last_file_name(), Some("seed.xyz"));
        assert_eq!(context.logical_file_name(), Some("report.csv"));
        assert_eq!(
            std::fs::read(temp_dir.path().join("seed.xyz")).unwrap(),
            b"payload"
        );
    }

    #[async_std::test]
    async fn test_unarchive_extracts_only_first_entry() {
        let temp_dir = tempdir().unwrap();
        let mut writer = ZipWriter::new(File::create(temp_dir.path().join("seed.tmp")).unwrap());
        writer
            .start_file("a.csv", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"first").unwrap();
        writer
            .start_file("b.csv", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"second").unwrap();
        writer.finish().unwrap();

        let mut context = test_context(
            Arc::new(MockSignerToolOps::new()),
            temp_dir.path().to_path_buf(),
            Direction::Inbound,
            None,
        );

        UnarchiveStep.execute(&mut context).await.unwrap();

        assert_eq!(context.logical_file_name(), Some("a.csv"));
        assert_eq!(
            std::fs::read(temp_dir.path().join("seed.xyz")).unwrap(),
            b"first"
        );
    }

    #[async_std::test]
    async fn test_failing_sign_aborts_before_encrypt() {
        let temp_dir = tempdir().unwrap();
        std::fs::write(temp_dir.path().join("seed.tmp"), b"payload").unwrap();

        let signer = Arc::new(MockSignerToolOps::with_failure("no such certificate"));
        let mut context = test_context(
            signer.clone(),
            temp_dir.path().to_path_buf(),
            Direction::Outbound,
            None,
        );

        let mut builder = ProcessorBuilder::new();
        builder.add_outbound_step(Box::new(SignStep));
        builder.add_outbound_step(Box::new(EncryptStep));
        let processor = builder.build();

        let error = processor.execute(&mut context).await.unwrap_err();

        assert_eq!(error.operation, "Sign");
        assert_eq!(signer.total_calls(), 1);
    }
}
