//! Модуль для работы с временными файлами
//!
//! Замена файла "на месте": оригинал переименовывается во временный соседний
//! файл, а при любом выходе без подтверждения возвращается обратно.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{ReelSyncError, Result};

/// Временный соседний файл для изменения файла на месте
///
/// Пока guard жив, оригинальные данные лежат по `temp_path()`, а путь
/// оригинала свободен для записи результата. `commit` удаляет временный файл,
/// `rollback` (или Drop без `commit`) возвращает оригинал на место.
pub struct SiblingSwap {
    original: PathBuf,
    temp: PathBuf,
    settled: bool,
}

impl SiblingSwap {
    /// Переименовать `original` во временный соседний файл
    pub fn acquire(original: &Path) -> Result<Self> {
        let temp = temp_sibling_path(original);

        if temp.exists() {
            return Err(ReelSyncError::FileSystem(format!(
                "temporary path {} already exists, refusing to overwrite it",
                temp.display()
            )));
        }

        fs::rename(original, &temp).map_err(|e| {
            ReelSyncError::FileSystem(format!(
                "Failed to rename {} to {}: {}",
                original.display(),
                temp.display(),
                e
            ))
        })?;
        log::debug!("Moved {} aside to {}", original.display(), temp.display());

        Ok(Self {
            original: original.to_path_buf(),
            temp,
            settled: false,
        })
    }

    /// Путь к оригинальным данным на время операции
    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    /// Путь, по которому должен появиться результат
    pub fn original_path(&self) -> &Path {
        &self.original
    }

    /// Операция завершилась успешно: удалить временный файл
    pub fn commit(mut self) -> Result<()> {
        self.settled = true;
        fs::remove_file(&self.temp).map_err(|e| {
            ReelSyncError::FileSystem(format!(
                "Failed to delete temporary file {}: {}",
                self.temp.display(),
                e
            ))
        })?;
        log::debug!("Deleted temporary file {}", self.temp.display());
        Ok(())
    }

    /// Операция не удалась: вернуть оригинал на место
    pub fn rollback(mut self) -> Result<()> {
        self.settled = true;
        self.restore().map_err(|e| {
            ReelSyncError::FileSystem(format!(
                "Failed to restore {} from {}: {}",
                self.original.display(),
                self.temp.display(),
                e
            ))
        })
    }

    fn restore(&self) -> io::Result<()> {
        // частичный результат кодировщика мешает переименованию на Windows
        if self.original.exists() {
            fs::remove_file(&self.original)?;
        }
        fs::rename(&self.temp, &self.original)?;
        log::info!("Restored original file {}", self.original.display());
        Ok(())
    }
}

impl Drop for SiblingSwap {
    fn drop(&mut self) {
        if !self.settled {
            if let Err(e) = self.restore() {
                log::error!(
                    "Failed to restore {} from {}: {}",
                    self.original.display(),
                    self.temp.display(),
                    e
                );
            }
        }
    }
}

/// `<dir>/<stem>_temp.<ext>` рядом с оригиналом
pub fn temp_sibling_path(original: &Path) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let file_name = match original.extension() {
        Some(ext) => format!("{}_temp.{}", stem, ext.to_string_lossy()),
        None => format!("{}_temp", stem),
    };
    original.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_sibling_keeps_extension_and_directory() {
        assert_eq!(
            temp_sibling_path(Path::new("/out/build/output.mp3")),
            PathBuf::from("/out/build/output_temp.mp3")
        );
        assert_eq!(
            temp_sibling_path(Path::new("narration")),
            PathBuf::from("narration_temp")
        );
    }

    #[test]
    fn commit_removes_temp_and_keeps_new_output() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("voice.mp3");
        fs::write(&original, b"old").unwrap();

        let swap = SiblingSwap::acquire(&original).unwrap();
        assert!(!original.exists());
        assert_eq!(fs::read(swap.temp_path()).unwrap(), b"old");

        fs::write(&original, b"new").unwrap();
        let temp = swap.temp_path().to_path_buf();
        swap.commit().unwrap();

        assert_eq!(fs::read(&original).unwrap(), b"new");
        assert!(!temp.exists());
    }

    #[test]
    fn rollback_discards_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("voice.mp3");
        fs::write(&original, b"old").unwrap();

        let swap = SiblingSwap::acquire(&original).unwrap();
        fs::write(&original, b"partial").unwrap();
        let temp = swap.temp_path().to_path_buf();
        swap.rollback().unwrap();

        assert_eq!(fs::read(&original).unwrap(), b"old");
        assert!(!temp.exists());
    }

    #[test]
    fn drop_without_commit_restores_original() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("voice.wav");
        fs::write(&original, b"old").unwrap();

        {
            let _swap = SiblingSwap::acquire(&original).unwrap();
            assert!(!original.exists());
        }

        assert_eq!(fs::read(&original).unwrap(), b"old");
        assert!(!dir.path().join("voice_temp.wav").exists());
    }

    #[test]
    fn existing_temp_path_is_not_clobbered() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("voice.mp3");
        let temp = dir.path().join("voice_temp.mp3");
        fs::write(&original, b"old").unwrap();
        fs::write(&temp, b"someone else's").unwrap();

        let err = SiblingSwap::acquire(&original).err().unwrap();
        assert!(matches!(err, ReelSyncError::FileSystem(_)));
        assert_eq!(fs::read(&original).unwrap(), b"old");
        assert_eq!(fs::read(&temp).unwrap(), b"someone else's");
    }

    #[test]
    fn missing_original_fails_to_acquire() {
        let dir = tempfile::tempdir().unwrap();
        let result = SiblingSwap::acquire(&dir.path().join("missing.mp3"));
        assert!(matches!(result, Err(ReelSyncError::FileSystem(_))));
    }
}
