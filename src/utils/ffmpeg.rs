//! Модуль для работы с FFmpeg
//!
//! Запуск ffmpeg/ffprobe как блокирующих шагов конвейера: каждый вызов
//! дожидается завершения процесса, статус выхода превращается в ошибку этапа.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;

use crate::config::ReelSyncConfig;
use crate::error::{EncoderStage, ReelSyncError, Result};

/// Сколько последних строк stderr попадает в текст ошибки
const STDERR_TAIL_LINES: usize = 5;

/// Найти исполняемый файл инструмента в PATH
pub fn locate_tool(program: &Path) -> Result<PathBuf> {
    which::which(program).map_err(|e| {
        ReelSyncError::Configuration(format!("{} not found: {}", program.display(), e))
    })
}

/// Получение версии инструмента (первая строка `-version`)
pub async fn encoder_version(program: &Path) -> Result<String> {
    let output = Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .output()
        .await?;

    if !output.status.success() {
        return Err(ReelSyncError::Configuration(format!(
            "{} -version exited with {}",
            program.display(),
            output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or("").to_string())
}

/// Запуск ffmpeg для указанного этапа
pub async fn run_ffmpeg(
    config: &ReelSyncConfig,
    args: &[String],
    stage: EncoderStage,
) -> Result<()> {
    log::debug!("ffmpeg ({}): {} {}", stage, config.ffmpeg_path.display(), args.join(" "));

    let output = match run_with_timeout(&config.ffmpeg_path, args, config.encoder_timeout()).await {
        Ok(output) => output,
        Err(RunError::Spawn(e)) => {
            return Err(ReelSyncError::encoder(
                stage,
                format!("failed to start {}: {}", config.ffmpeg_path.display(), e),
            ));
        }
        Err(RunError::TimedOut(secs)) => {
            return Err(ReelSyncError::Timeout {
                what: format!("ffmpeg {}", stage),
                secs,
            });
        }
    };

    if !output.status.success() {
        let tail = stderr_tail(&output.stderr);
        log::error!("ffmpeg {} failed with {}: {}", stage, output.status, tail);
        return Err(ReelSyncError::encoder(
            stage,
            format!("ffmpeg exited with {}: {}", output.status, tail),
        ));
    }

    Ok(())
}

/// Запуск ffprobe, возвращает stdout
pub async fn run_ffprobe(
    config: &ReelSyncConfig,
    args: &[String],
    probed: &Path,
) -> Result<String> {
    log::debug!("ffprobe: {} {}", config.ffprobe_path.display(), args.join(" "));

    let probe_error = |reason: String| ReelSyncError::ExternalProbe {
        path: probed.display().to_string(),
        reason,
    };

    let timeout = config.encoder_timeout();
    let output = match run_with_timeout(&config.ffprobe_path, args, timeout).await {
        Ok(output) => output,
        Err(RunError::Spawn(e)) => {
            return Err(probe_error(format!(
                "failed to start {}: {}",
                config.ffprobe_path.display(),
                e
            )));
        }
        Err(RunError::TimedOut(secs)) => {
            return Err(ReelSyncError::Timeout {
                what: format!("ffprobe {}", probed.display()),
                secs,
            });
        }
    };

    if !output.status.success() {
        return Err(probe_error(format!(
            "ffprobe exited with {}: {}",
            output.status,
            stderr_tail(&output.stderr)
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

enum RunError {
    Spawn(std::io::Error),
    TimedOut(u64),
}

async fn run_with_timeout(
    program: &Path,
    args: &[String],
    timeout: Option<Duration>,
) -> std::result::Result<Output, RunError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let run = command.output();
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, run).await {
            Ok(result) => result.map_err(RunError::Spawn),
            Err(_) => Err(RunError::TimedOut(limit.as_secs())),
        },
        None => run.await.map_err(RunError::Spawn),
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}
