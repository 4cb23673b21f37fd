//! Модуль для работы с видео
//!
//! Сборка базового видео из плейлиста кадров и озвучки, затем вжигание
//! субтитров в готовое видео.

use std::path::{Path, PathBuf};

use crate::config::ReelSyncConfig;
use crate::error::{EncoderStage, Result};
use crate::utils::common::sanitize_output_path;
use crate::utils::ffmpeg::run_ffmpeg;

/// Фильтр масштабирования кадров в вертикальный формат с полями
pub fn scale_pad_filter(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,format=yuv420p",
        w = width,
        h = height
    )
}

/// Аргументы ffmpeg для сборки видео из concat-плейлиста и аудио
pub fn mux_args(
    config: &ReelSyncConfig,
    playlist: &Path,
    audio: &Path,
    output: &Path,
) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        playlist.display().to_string(),
        "-i".to_string(),
        audio.display().to_string(),
        "-vf".to_string(),
        scale_pad_filter(config.video_width, config.video_height),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-strict".to_string(),
        "experimental".to_string(),
        output.display().to_string(),
    ]
}

/// Собрать видео без субтитров
///
/// Частичный результат при ошибке не удаляется.
pub async fn mux_base_video(
    config: &ReelSyncConfig,
    playlist: &Path,
    audio: &Path,
    output: &Path,
) -> Result<()> {
    log::info!("Muxing {} with {} into {}", playlist.display(), audio.display(), output.display());
    run_ffmpeg(config, &mux_args(config, playlist, audio, output), EncoderStage::Mux).await?;
    log::info!("Base video written to {}", output.display());
    Ok(())
}

/// Экранирование пути для парсера filtergraph
pub fn escape_filter_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut escaped = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        if matches!(c, '\\' | ':' | '\'' | ',' | '[' | ']' | ';') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Аргументы ffmpeg для вжигания субтитров
pub fn burn_in_args(video: &Path, subtitles: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        video.display().to_string(),
        "-vf".to_string(),
        format!("subtitles={}", escape_filter_path(subtitles)),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-strict".to_string(),
        "experimental".to_string(),
        output.display().to_string(),
    ]
}

/// Вжечь субтитры в видео
///
/// Результат пишется по очищенному пути, который и возвращается.
pub async fn burn_in_subtitles(
    config: &ReelSyncConfig,
    video: &Path,
    subtitles: &Path,
    output: &Path,
) -> Result<PathBuf> {
    let output = sanitize_output_path(output);
    log::info!("Burning {} into {} -> {}", subtitles.display(), video.display(), output.display());
    run_ffmpeg(config, &burn_in_args(video, subtitles, &output), EncoderStage::BurnIn).await?;
    log::info!("Final video written to {}", output.display());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReelSyncError;

    #[test]
    fn mux_args_use_concat_demuxer_and_vertical_frame() {
        let config = ReelSyncConfig::default();
        let args = mux_args(
            &config,
            Path::new("/o/concat.txt"),
            Path::new("/o/voice.mp3"),
            Path::new("/o/base.mp4"),
        );

        let joined = args.join(" ");
        assert!(joined.starts_with("-y -f concat -safe 0 -i /o/concat.txt -i /o/voice.mp3"));
        assert!(joined.contains("scale=1080:1920:force_original_aspect_ratio=decrease"));
        assert!(joined.contains(",pad=1080:1920:(ow-iw)/2:(oh-ih)/2,format=yuv420p"));
        assert!(joined.contains("-c:v libx264 -c:a aac"));
        assert_eq!(args.last().unwrap(), "/o/base.mp4");
    }

    #[test]
    fn filter_path_escapes_filtergraph_specials() {
        assert_eq!(escape_filter_path(Path::new("/out/subtitles.srt")), "/out/subtitles.srt");
        assert_eq!(
            escape_filter_path(Path::new(r"C:\out\it's,[a].srt")),
            r"C\:\\out\\it\'s\,\[a\].srt"
        );
    }

    #[test]
    fn burn_in_args_embed_subtitle_filter() {
        let subs = Path::new("/o/subs.srt");
        let args = burn_in_args(Path::new("base.mp4"), subs, Path::new("/o/output.mp4"));
        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert_eq!(args[vf + 1], "subtitles=/o/subs.srt");
        assert_eq!(args[2], "base.mp4");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn burn_in_writes_to_sanitized_path() {
        let dir = tempfile::tempdir().unwrap();
        let (ffmpeg, log) = crate::utils::test_support::fake_ffmpeg(dir.path(), None);
        let config = ReelSyncConfig {
            ffmpeg_path: ffmpeg,
            ..ReelSyncConfig::default()
        };
        let video = dir.path().join("base.mp4");
        std::fs::write(&video, b"video").unwrap();

        let requested = dir.path().join("my reel (final).mp4");
        let written = burn_in_subtitles(&config, &video, &dir.path().join("subs.srt"), &requested)
            .await
            .unwrap();

        assert_eq!(written, sanitize_output_path(&requested));
        assert!(written.to_string_lossy().ends_with("my_reel__final_.mp4"));
        assert_eq!(std::fs::read(&written).unwrap(), b"video");
        assert!(std::fs::read_to_string(log).unwrap().contains("subtitles="));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn mux_failure_is_reported_as_mux_stage() {
        let config = ReelSyncConfig {
            ffmpeg_path: PathBuf::from("false"),
            ..ReelSyncConfig::default()
        };
        let (playlist, audio) = (Path::new("c.txt"), Path::new("a.mp3"));
        let err = mux_base_video(&config, playlist, audio, Path::new("o.mp4"))
            .await
            .unwrap_err();
        assert!(err.is_encoder_stage(EncoderStage::Mux));
        assert!(!err.is_encoder_stage(EncoderStage::BurnIn));
        assert!(matches!(err, ReelSyncError::Encoder { .. }));
    }
}
