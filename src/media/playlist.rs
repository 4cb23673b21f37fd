//! Плейлист для concat-демультиплексора ffmpeg
//!
//! Формат: на каждый кадр директива `file '<path>'` и директива
//! `duration <secs>`. Одинарные кавычки в пути экранируются как `'\''`.

use std::path::{Path, PathBuf};

use crate::error::{ReelSyncError, Result};

/// Элемент плейлиста: изображение и время его показа
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEntry {
    /// Путь к изображению
    pub path: PathBuf,
    /// Длительность показа в секундах
    pub duration: f64,
}

/// Собрать элементы плейлиста из путей и длительностей одинаковой длины
pub fn build_entries(images: &[PathBuf], durations: &[f64]) -> Result<Vec<PlaylistEntry>> {
    if images.len() != durations.len() {
        return Err(ReelSyncError::InputValidation(format!(
            "{} images but {} durations",
            images.len(),
            durations.len()
        )));
    }

    Ok(images
        .iter()
        .zip(durations)
        .map(|(path, &duration)| PlaylistEntry {
            path: path.clone(),
            duration,
        })
        .collect())
}

/// Сериализовать плейлист в текст
pub fn render_playlist(entries: &[PlaylistEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            format!(
                "file {}\nduration {}",
                quote_path(&entry.path),
                entry.duration
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Записать плейлист в файл
pub async fn write_playlist(path: &Path, entries: &[PlaylistEntry]) -> Result<()> {
    let content = render_playlist(entries);
    tokio::fs::write(path, content).await.map_err(|e| {
        ReelSyncError::FileSystem(format!("Failed to write concat file {}: {}", path.display(), e))
    })?;
    log::debug!("Wrote concat playlist with {} entries to {}", entries.len(), path.display());
    Ok(())
}

/// Разобрать текст плейлиста обратно в элементы
pub fn parse_playlist(content: &str) -> Result<Vec<PlaylistEntry>> {
    let mut entries = Vec::new();
    let mut pending: Option<PathBuf> = None;

    for (number, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line == "ffconcat version 1.0" {
            continue;
        }

        if let Some(rest) = line.strip_prefix("file ") {
            if let Some(path) = pending.take() {
                return Err(ReelSyncError::Parse(format!(
                    "line {}: file {} has no duration",
                    number + 1,
                    path.display()
                )));
            }
            pending = Some(PathBuf::from(unquote(rest.trim())?));
        } else if let Some(rest) = line.strip_prefix("duration ") {
            let path = pending.take().ok_or_else(|| {
                ReelSyncError::Parse(format!("line {}: duration without file", number + 1))
            })?;
            let duration = rest.trim().parse::<f64>().map_err(|e| {
                ReelSyncError::Parse(format!("line {}: bad duration {:?}: {}", number + 1, rest, e))
            })?;
            entries.push(PlaylistEntry { path, duration });
        } else {
            return Err(ReelSyncError::Parse(format!(
                "line {}: unknown directive {:?}",
                number + 1,
                line
            )));
        }
    }

    if let Some(path) = pending {
        return Err(ReelSyncError::Parse(format!("file {} has no duration", path.display())));
    }

    Ok(entries)
}

fn quote_path(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

// Обратное к quote_path: кавычки снимаются, `\x` дает `x` вне кавычек
fn unquote(value: &str) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    let mut quoted = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' => quoted = !quoted,
            '\\' if !quoted => match chars.next() {
                Some(escaped) => out.push(escaped),
                None => return Err(ReelSyncError::Parse(format!("dangling escape in {:?}", value))),
            },
            _ => out.push(c),
        }
    }

    if quoted {
        return Err(ReelSyncError::Parse(format!("unterminated quote in {:?}", value)));
    }
    Ok(out)
}
