//! Common utility functions used across the pipeline

use std::path::{Path, PathBuf};

/// Replace every character outside `[a-zA-Z0-9_.\-/]` with an underscore.
///
/// Applied to the final video path before the burn-in stage writes to it.
pub fn sanitize_output_path(path: &Path) -> PathBuf {
    let sanitized: String = path
        .to_string_lossy()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '/') {
                c
            } else {
                '_'
            }
        })
        .collect();
    PathBuf::from(sanitized)
}

/// Check if a file exists and has valid content (non-zero size)
pub async fn check_file_exists_and_valid(path: &Path) -> bool {
    if let Ok(metadata) = tokio::fs::metadata(path).await {
        if metadata.is_file() && metadata.len() > 0 {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_output_path() {
        assert_eq!(
            sanitize_output_path(Path::new("/tmp/builds/1700000000_anime/output.mp4")),
            PathBuf::from("/tmp/builds/1700000000_anime/output.mp4")
        );
        assert_eq!(
            sanitize_output_path(Path::new("/tmp/my build/épisode (1).mp4")),
            PathBuf::from("/tmp/my_build/_pisode__1_.mp4")
        );
        assert_eq!(
            sanitize_output_path(Path::new("out:put?.mp4")),
            PathBuf::from("out_put_.mp4")
        );
    }

    #[test]
    fn empty_files_are_not_valid() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.jpg");
        let full = dir.path().join("full.jpg");
        std::fs::write(&empty, b"").unwrap();
        std::fs::write(&full, b"jpeg").unwrap();

        assert!(!tokio_test::block_on(check_file_exists_and_valid(&empty)));
        assert!(tokio_test::block_on(check_file_exists_and_valid(&full)));
        let missing = dir.path().join("missing.jpg");
        assert!(!tokio_test::block_on(check_file_exists_and_valid(&missing)));
        assert!(!tokio_test::block_on(check_file_exists_and_valid(dir.path())));
    }
}
