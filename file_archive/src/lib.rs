use std::{
    fs::File,
    io,
    path::Path,
};

use thiserror::Error;
use zip::{write::SimpleFileOptions, ZipArchive, ZipWriter};

#[derive(Error, Debug)]
pub enum FileArchiveError {
    #[error("Zip error: {0}")]
    ZipError(String),
    #[error("File IO error: {0}")]
    FileIoError(String),
    #[error("Archive contains no entries")]
    EmptyArchive,
}

/// Creates a new zip archive at `output_path` containing exactly one entry.
///
/// The entry is named `entry_name` and its content is the file at
/// `input_path`. Any existing file at `output_path` is overwritten.
pub fn pack_single_entry(
    input_path: &Path,
    output_path: &Path,
    entry_name: &str,
) -> Result<(), FileArchiveError> {
    let mut input = File::open(input_path)
        .map_err(|e| FileArchiveError::FileIoError(format!("Failed opening input file: {}", e)))?;
    let output = File::create(output_path)
        .map_err(|e| FileArchiveError::FileIoError(format!("Failed creating archive: {}", e)))?;

    let mut writer = ZipWriter::new(output);
    writer
        .start_file(entry_name, SimpleFileOptions::default())
        .map_err(|e| FileArchiveError::ZipError(format!("Failed starting entry: {}", e)))?;
    io::copy(&mut input, &mut writer)
        .map_err(|e| FileArchiveError::FileIoError(format!("Failed writing entry: {}", e)))?;
    writer
        .finish()
        .map_err(|e| FileArchiveError::ZipError(format!("Failed finishing archive: {}", e)))?;

    Ok(())
}

/// Opens the zip archive at `input_path` and extracts only its first entry to
/// `output_path`, returning the entry's base name.
///
/// Entries beyond the first are deliberately ignored: the exchange format
/// carries exactly one payload per archive.
pub fn extract_first_entry(
    input_path: &Path,
    output_path: &Path,
) -> Result<String, FileArchiveError> {
    let input = File::open(input_path)
        .map_err(|e| FileArchiveError::FileIoError(format!("Failed opening archive: {}", e)))?;
    let mut archive = ZipArchive::new(input)
        .map_err(|e| FileArchiveError::ZipError(format!("Failed reading archive: {}", e)))?;

    if archive.is_empty() {
        return Err(FileArchiveError::EmptyArchive);
    }

    let mut entry = archive
        .by_index(0)
        .map_err(|e| FileArchiveError::ZipError(format!("Failed reading entry: {}", e)))?;

    // The in-archive name may carry a relative path, keep only the base name.
    let entry_name = Path::new(entry.name())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| FileArchiveError::ZipError("Entry has no file name".to_string()))?;

    let mut output = File::create(output_path)
        .map_err(|e| FileArchiveError::FileIoError(format!("Failed creating output: {}", e)))?;
    io::copy(&mut entry, &mut output)
        .map_err(|e| FileArchiveError::FileIoError(format!("Failed extracting entry: {}", e)))?;

    Ok(entry_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_pack_and_extract_single_entry() {
        let temp_dir = tempdir().unwrap();
        let input_path = temp_dir.path().join("payload.tmp");
        let archive_path = temp_dir.path().join("payload.zip");
        let output_path = temp_dir.path().join("payload.xyz");
        std::fs::write(&input_path, b"report content").unwrap();

        pack_single_entry(&input_path, &archive_path, "report.csv").unwrap();
        let entry_name = extract_first_entry(&archive_path, &output_path).unwrap();

        assert_eq!(entry_name, "report.csv");
        assert_eq!(std::fs::read(&output_path).unwrap(), b"report content");
    }

    #[test]
    fn test_extract_takes_only_first_entry() {
        let temp_dir = tempdir().unwrap();
        let archive_path = temp_dir.path().join("multi.zip");
        let output_path = temp_dir.path().join("multi.xyz");

        let mut writer = ZipWriter::new(File::create(&archive_path).unwrap());
        writer
            .start_file("a.csv", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"first").unwrap();
        writer
            .start_file("b.csv", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"second").unwrap();
        writer.finish().unwrap();

        let entry_name = extract_first_entry(&archive_path, &output_path).unwrap();

        assert_eq!(entry_name, "a.csv");
        assert_eq!(std::fs::read(&output_path).unwrap(), b"first");
    }

    #[test]
    fn test_extract_strips_entry_path() {
        let temp_dir = tempdir().unwrap();
        let archive_path = temp_dir.path().join("nested.zip");
        let output_path = temp_dir.path().join("nested.xyz");

        let mut writer = ZipWriter::new(File::create(&archive_path).unwrap());
        writer
            .start_file("outbox/report.csv", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"nested").unwrap();
        writer.finish().unwrap();

        let entry_name = extract_first_entry(&archive_path, &output_path).unwrap();
        assert_eq!(entry_name, "report.csv");
    }

    #[test]
    fn test_extract_from_empty_archive_fails() {
        let temp_dir = tempdir().unwrap();
        let archive_path = temp_dir.path().join("empty.zip");
        let output_path = temp_dir.path().join("empty.xyz");

        let writer = ZipWriter::new(File::create(&archive_path).unwrap());
        writer.finish().unwrap();

        let result = extract_first_entry(&archive_path, &output_path);
        assert!(matches!(result, Err(FileArchiveError::EmptyArchive)));
    }
}
