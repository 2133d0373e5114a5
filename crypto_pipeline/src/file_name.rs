//! File name derivation helpers shared by the steps and the CLI.

use std::path::Path;

/// Replaces the final extension of `file_name` with `ext` (appends it when
/// there is no extension). The leading dot in `ext` is optional.
pub fn replace_extension(file_name: &str, ext: &str) -> String {
    Path::new(file_name)
        .with_extension(ext.trim_start_matches('.'))
        .to_string_lossy()
        .into_owned()
}

/// Strips the final extension of `file_name`; if the remaining name carries no
/// extension of its own, `default_ext` is applied to it.
pub fn remove_last_extension(file_name: &str, default_ext: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if Path::new(&stem).extension().is_none() {
        replace_extension(&stem, default_ext)
    } else {
        stem
    }
}

/// Appends `ext` to `file_name`, keeping any extension already present:
/// `"archive.zip"` + `".sgn"` becomes `"archive.zip.sgn"`, while a name
/// without an extension simply gets `ext` as its extension.
pub fn append_extension(file_name: &str, ext: &str) -> String {
    let trimmed = ext.trim_start_matches('.');
    if Path::new(file_name).extension().is_some() {
        format!("{}.{}", file_name, trimmed)
    } else {
        replace_extension(file_name, trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_extension() {
        assert_eq!(replace_extension("payload.tmp", ".zip"), "payload.zip");
        assert_eq!(replace_extension("payload.zip", "sgn"), "payload.sgn");
        assert_eq!(replace_extension("payload", ".sgn"), "payload.sgn");
    }

    #[test]
    fn test_remove_last_extension_keeps_inner_extension() {
        assert_eq!(remove_last_extension("a.zip.sgn", ".txt"), "a.zip");
    }

    #[test]
    fn test_remove_last_extension_applies_default() {
        assert_eq!(remove_last_extension("report", ".txt"), "report.txt");
        assert_eq!(remove_last_extension("report.csv", ".txt"), "report.txt");
    }

    #[test]
    fn test_append_extension() {
        assert_eq!(append_extension("archive.zip", ".sgn"), "archive.zip.sgn");
        assert_eq!(append_extension("archive", ".sgn"), "archive.sgn");
        assert_eq!(append_extension("archive.zip", "sgn"), "archive.zip.sgn");
    }
}
