//! Модуль для работы с аудио
//!
//! Измерение длительности озвучки и изменение темпа без изменения высоты тона.

use std::path::{Path, PathBuf};

use crate::config::ReelSyncConfig;
use crate::error::{EncoderStage, ReelSyncError, Result};
use crate::utils::ffmpeg::{run_ffmpeg, run_ffprobe};
use crate::utils::temp::SiblingSwap;

/// Допустимый диапазон одного фильтра atempo
const ATEMPO_MIN: f64 = 0.5;
const ATEMPO_MAX: f64 = 2.0;

/// Получение длительности аудио в секундах
pub async fn probe_audio_duration(config: &ReelSyncConfig, path: &Path) -> Result<f64> {
    let args = vec![
        "-v".to_string(),
        "error".to_string(),
        "-show_entries".to_string(),
        "format=duration".to_string(),
        "-of".to_string(),
        "default=noprint_wrappers=1:nokey=1".to_string(),
        path.display().to_string(),
    ];

    let stdout = run_ffprobe(config, &args, path).await?;
    let trimmed = stdout.trim();
    let duration = trimmed.parse::<f64>().map_err(|e| ReelSyncError::ExternalProbe {
        path: path.display().to_string(),
        reason: format!("unparseable duration {:?}: {}", trimmed, e),
    })?;

    if !(duration.is_finite() && duration > 0.0) {
        return Err(ReelSyncError::ExternalProbe {
            path: path.display().to_string(),
            reason: format!("duration must be positive, got {}", duration),
        });
    }

    log::info!("Audio {} lasts {:.3}s", path.display(), duration);
    Ok(duration)
}

/// Цепочка фильтров atempo с произведением `factor`
pub fn atempo_filter(factor: f64) -> Result<String> {
    if !(factor.is_finite() && factor > 0.0) {
        return Err(ReelSyncError::InputValidation(format!(
            "tempo factor must be positive, got {}",
            factor
        )));
    }

    let mut stages = Vec::new();
    let mut remaining = factor;
    while remaining > ATEMPO_MAX {
        stages.push(format!("atempo={}", ATEMPO_MAX));
        remaining /= ATEMPO_MAX;
    }
    while remaining < ATEMPO_MIN {
        stages.push(format!("atempo={}", ATEMPO_MIN));
        remaining /= ATEMPO_MIN;
    }
    stages.push(format!("atempo={}", remaining));

    Ok(stages.join(","))
}

fn tempo_args(input: &Path, filter: &str, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        input.display().to_string(),
        "-filter:a".to_string(),
        filter.to_string(),
        output.display().to_string(),
    ]
}

/// Канонический путь файла
///
/// Для еще не созданного файла канонизируется родительский каталог.
async fn resolve_path(path: &Path) -> Option<PathBuf> {
    if let Ok(resolved) = tokio::fs::canonicalize(path).await {
        return Some(resolved);
    }
    let name = path.file_name()?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    tokio::fs::canonicalize(parent).await.ok().map(|dir| dir.join(name))
}

/// Указывают ли два пути на один и тот же файл
async fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (resolve_path(a).await, resolve_path(b).await) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Изменение темпа аудио без изменения высоты тона
///
/// Если `input` и `output` указывают на один файл, оригинал на время работы
/// ffmpeg переименовывается в `<stem>_temp.<ext>` и при ошибке возвращается
/// на место.
pub async fn adjust_tempo(
    config: &ReelSyncConfig,
    input: &Path,
    output: &Path,
    factor: f64,
) -> Result<()> {
    let filter = atempo_filter(factor)?;

    if !same_file(input, output).await {
        log::info!(
            "Adjusting tempo of {} by {} into {}",
            input.display(),
            factor,
            output.display()
        );
        return run_ffmpeg(config, &tempo_args(input, &filter, output), EncoderStage::Tempo).await;
    }

    let target = resolve_path(input).await.unwrap_or_else(|| input.to_path_buf());
    log::info!("Adjusting tempo of {} in place by {}", target.display(), factor);
    let swap = SiblingSwap::acquire(&target)?;
    let args = tempo_args(swap.temp_path(), &filter, swap.original_path());

    match run_ffmpeg(config, &args, EncoderStage::Tempo).await {
        Ok(()) => {
            swap.commit()?;
            log::info!("Tempo adjusted for {}", target.display());
            Ok(())
        }
        Err(e) => {
            log::error!("Tempo adjustment failed for {}: {}", target.display(), e);
            if let Err(restore_err) = swap.rollback() {
                log::error!("{}", restore_err);
            }
            Err(e)
        }
    }
}
