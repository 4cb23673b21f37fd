//! Основной файл библиотеки reel-sync с поддержкой системы прогресса и уведомлений
//!
//! Библиотека собирает вертикальное видео с вшитыми субтитрами из набора
//! изображений, озвучки, сценария с разметкой времени и расшифровки. Итоговая
//! длительность видео точно совпадает с измеренной длительностью озвучки.

pub mod assets;
pub mod config;
pub mod error;
pub mod inference;
pub mod media;
pub mod notification;
pub mod progress;
pub mod subtitle;
pub mod timing;
pub mod utils;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{DurationSource, ReelSyncConfig};
use crate::error::{ReelSyncError, Result};
use crate::inference::{ImageGenerator, OpenAiCompatibleClient, TextInference};
use crate::media::playlist::{build_entries, write_playlist};
use crate::progress::{
    BuildStep, DefaultProgressReporter, ProgressObserver, ProgressReporter, ProgressTracker,
};
use crate::timing::{extract_durations, rebalance, RebalanceSettings};

/// Плейлист concat-демультиплексора
pub const CONCAT_FILE: &str = "concat.txt";
/// Видео без субтитров
pub const BASE_VIDEO_FILE: &str = "video_without_subtitles.mp4";
/// Файл субтитров
pub const SUBTITLES_FILE: &str = "subtitles.srt";
/// Итоговое видео
pub const FINAL_VIDEO_FILE: &str = "output.mp4";

/// Входные данные одной сборки
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Изображения в порядке показа
    pub images: Vec<PathBuf>,
    /// Файл озвучки; при включенном `narration_tempo` изменяется на месте
    pub audio_path: PathBuf,
    /// Сценарий с разметкой вида `(0s-5s) Image 1: ...`
    pub script: String,
    /// Текст озвучки, возможно уже разбитый на строки
    pub transcript: String,
    /// Каталог для промежуточных файлов и результата
    pub output_dir: PathBuf,
}

impl BuildRequest {
    /// Понадобится ли сборке сервис генерации текста
    ///
    /// Без него обходятся только длительности из меток сценария вместе с уже
    /// разбитой на строки расшифровкой.
    pub fn needs_inference(&self, source: DurationSource) -> bool {
        source != DurationSource::Markers || !self.transcript.contains('\n')
    }
}

/// Результат сборки
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Итоговое видео (путь уже очищен)
    pub final_video: PathBuf,
    /// Видео без субтитров
    pub base_video: PathBuf,
    /// Файл субтитров
    pub subtitles: PathBuf,
    /// Итоговые длительности кадров, сумма равна `audio_duration`
    pub durations: Vec<f64>,
    /// Измеренная длительность озвучки в секундах
    pub audio_duration: f64,
}

/// Основная структура для работы с библиотекой
pub struct ReelSync {
    /// Конфигурация библиотеки
    config: ReelSyncConfig,
    /// Сервис генерации текста
    inference: Arc<dyn TextInference>,
    /// Трекер прогресса
    progress_tracker: Option<ProgressTracker>,
}

impl ReelSync {
    /// Создать новый экземпляр ReelSync с конфигурацией и сервисом генерации текста
    pub fn new(config: ReelSyncConfig, inference: Arc<dyn TextInference>) -> Self {
        Self {
            config,
            inference,
            progress_tracker: None,
        }
    }

    /// Создать экземпляр с OpenAI-совместимым клиентом из конфигурации
    pub fn from_config(config: ReelSyncConfig) -> Result<Self> {
        let client = OpenAiCompatibleClient::from_config(&config)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    /// Создать новый экземпляр ReelSync с репортером прогресса
    pub fn with_progress_reporter(
        config: ReelSyncConfig,
        inference: Arc<dyn TextInference>,
        reporter: Box<dyn ProgressReporter>,
    ) -> Self {
        Self {
            config,
            inference,
            progress_tracker: Some(ProgressTracker::with_reporter(reporter)),
        }
    }

    /// Конфигурация
    pub fn config(&self) -> &ReelSyncConfig {
        &self.config
    }

    /// Установить репортер прогресса
    pub fn set_progress_reporter(&mut self, reporter: Box<dyn ProgressReporter>) {
        match &mut self.progress_tracker {
            Some(tracker) => tracker.set_reporter(reporter),
            None => self.progress_tracker = Some(ProgressTracker::with_reporter(reporter)),
        }
    }

    /// Добавить наблюдателя прогресса
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> usize {
        let tracker = self.progress_tracker.get_or_insert_with(ProgressTracker::new);
        if !tracker.has_reporter() {
            tracker.set_reporter(Box::new(DefaultProgressReporter::new()));
        }
        tracker.add_observer(observer).unwrap_or(0)
    }

    fn tracker(&self) -> Option<&ProgressTracker> {
        self.progress_tracker.as_ref()
    }

    fn step(&self, step: BuildStep, details: impl Into<String>) {
        if let Some(t) = self.tracker() {
            t.set_step(step);
            t.update_step_progress(0.0, Some(details.into()));
        }
    }

    fn step_done(&self, details: impl Into<String>) {
        if let Some(t) = self.tracker() {
            t.update_step_progress(100.0, Some(details.into()));
        }
    }

    /// Сгенерировать изображения для будущей сборки
    pub async fn acquire_images(
        &self,
        prompts: &[String],
        output_dir: &Path,
        generator: &dyn ImageGenerator,
    ) -> Result<Vec<PathBuf>> {
        if let Some(t) = self.tracker() {
            t.start(&[BuildStep::ImageAcquisition]);
        }

        let tracker = self.tracker();
        let images =
            assets::acquire_images(prompts, output_dir, generator, &self.config, tracker).await?;

        if let Some(t) = self.tracker() {
            t.complete();
        }
        Ok(images)
    }

    /// Изменить темп аудио (на месте, если пути совпадают)
    pub async fn adjust_tempo(&self, input: &Path, output: &Path, factor: f64) -> Result<()> {
        media::audio::adjust_tempo(&self.config, input, output, factor).await
    }

    /// Собрать видео с субтитрами
    ///
    /// При ошибке оставшиеся этапы не выполняются, а уже созданные
    /// промежуточные файлы остаются в `output_dir`.
    pub async fn build(&self, request: &BuildRequest) -> Result<BuildOutput> {
        let build_id = uuid::Uuid::new_v4();
        log::info!(
            "Starting build {} with {} images into {}",
            build_id,
            request.images.len(),
            request.output_dir.display()
        );

        if let Some(t) = self.tracker() {
            t.start(&BuildStep::BUILD);
        }

        match self.run_build(request).await {
            Ok(output) => {
                if let Some(t) = self.tracker() {
                    t.complete();
                }
                log::info!("Build {} finished: {}", build_id, output.final_video.display());
                Ok(output)
            }
            Err(e) => {
                log::error!("Build {} failed: {}", build_id, e);
                Err(e)
            }
        }
    }

    async fn run_build(&self, request: &BuildRequest) -> Result<BuildOutput> {
        let config = &self.config;

        // 1. Проверка входных данных до любых внешних вызовов
        self.step(BuildStep::Validation, "Проверка входных файлов");
        config.validate()?;
        let images = validate_request(request).await?;
        self.step_done("Входные данные проверены");

        // 2. Изменение темпа озвучки
        if let Some(factor) = config.narration_tempo {
            self.step(BuildStep::TempoAdjustment, format!("Темп {}", factor));
            let audio = &request.audio_path;
            media::audio::adjust_tempo(config, audio, audio, factor).await?;
            self.step_done("Темп изменен");
        }

        // 3. Длительность аудио
        self.step(BuildStep::AudioProbe, request.audio_path.display().to_string());
        let audio_duration = media::audio::probe_audio_duration(config, &request.audio_path).await?;
        self.step_done(format!("{:.3}s", audio_duration));

        // 4. Длительности кадров
        self.step(BuildStep::DurationAnalysis, "Анализ сценария");
        let inference = self.inference.as_ref();
        let raw = extract_durations(&request.script, config.duration_source, inference).await;
        let durations = rebalance(
            &raw,
            images.len(),
            audio_duration,
            &RebalanceSettings::from(config),
        )?;
        log::info!("Frame durations: {:?}", durations);
        self.step_done(format!("{} кадров", durations.len()));

        // 5. Видео без субтитров
        self.step(BuildStep::VideoAssembly, "Запись плейлиста");
        let playlist = request.output_dir.join(CONCAT_FILE);
        let base_video = request.output_dir.join(BASE_VIDEO_FILE);
        write_playlist(&playlist, &build_entries(&images, &durations)?).await?;
        if let Some(t) = self.tracker() {
            t.update_step_progress(10.0, Some("Кодирование видео".to_string()));
        }
        media::video::mux_base_video(config, &playlist, &request.audio_path, &base_video).await?;
        self.step_done("Видео собрано");

        // 6. Субтитры
        self.step(BuildStep::SubtitleSynthesis, "Разбиение расшифровки");
        let transcript = subtitle::segment_transcript(&request.transcript, inference).await;
        let cues = subtitle::synthesize_cues(&transcript, &durations, config.default_segment_secs);
        let subtitles = request.output_dir.join(SUBTITLES_FILE);
        tokio::fs::write(&subtitles, subtitle::render_srt(&cues)).await.map_err(|e| {
            ReelSyncError::FileSystem(format!("Failed to write {}: {}", subtitles.display(), e))
        })?;
        self.step_done(format!("{} реплик", cues.len()));

        // 7. Вжигание субтитров
        self.step(BuildStep::SubtitleBurnIn, "Кодирование итогового видео");
        let final_video = media::video::burn_in_subtitles(
            config,
            &base_video,
            &subtitles,
            &request.output_dir.join(FINAL_VIDEO_FILE),
        )
        .await?;
        self.step_done("Субтитры вшиты");

        if config.cleanup_playlist {
            if let Err(e) = tokio::fs::remove_file(&playlist).await {
                log::warn!("Failed to delete {}: {}", playlist.display(), e);
            }
        }

        Ok(BuildOutput {
            final_video,
            base_video,
            subtitles,
            durations,
            audio_duration,
        })
    }
}

/// Проверить запрос и вернуть абсолютные пути изображений
///
/// Плейлист concat-демультиплексора разрешает относительные пути от своего
/// каталога, а не от текущего, поэтому в него попадают только абсолютные.
async fn validate_request(request: &BuildRequest) -> Result<Vec<PathBuf>> {
    if request.images.is_empty() {
        return Err(ReelSyncError::InputValidation(
            "at least one image is required".to_string(),
        ));
    }

    let mut images = Vec::with_capacity(request.images.len());
    for image in &request.images {
        if !utils::common::check_file_exists_and_valid(image).await {
            return Err(ReelSyncError::InputValidation(format!(
                "image file not found or empty: {}",
                image.display()
            )));
        }
        let absolute = tokio::fs::canonicalize(image).await.map_err(|e| {
            ReelSyncError::InputValidation(format!(
                "cannot resolve image path {}: {}",
                image.display(),
                e
            ))
        })?;
        images.push(absolute);
    }

    if !utils::common::check_file_exists_and_valid(&request.audio_path).await {
        return Err(ReelSyncError::InputValidation(format!(
            "audio file not found or empty: {}",
            request.audio_path.display()
        )));
    }

    if request.script.trim().is_empty() {
        return Err(ReelSyncError::InputValidation("script is empty".to_string()));
    }

    if request.transcript.trim().is_empty() {
        return Err(ReelSyncError::InputValidation("transcript is empty".to_string()));
    }

    if request.output_dir.as_os_str().is_empty() {
        return Err(ReelSyncError::InputValidation(
            "output directory is empty".to_string(),
        ));
    }

    tokio::fs::create_dir_all(&request.output_dir).await.map_err(|e| {
        ReelSyncError::FileSystem(format!(
            "Failed to create output directory {}: {}",
            request.output_dir.display(),
            e
        ))
    })?;

    Ok(images)
}

/// Публичный API для удобного использования
pub async fn build_reel(config: ReelSyncConfig, request: &BuildRequest) -> Result<BuildOutput> {
    ReelSync::from_config(config)?.build(request).await
}

/// Публичный API с поддержкой отслеживания прогресса
pub async fn build_reel_with_progress(
    config: ReelSyncConfig,
    request: &BuildRequest,
    reporter: Box<dyn ProgressReporter>,
) -> Result<BuildOutput> {
    let mut engine = ReelSync::from_config(config)?;
    engine.set_progress_reporter(reporter);
    engine.build(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(transcript: &str) -> BuildRequest {
        BuildRequest {
            images: vec![PathBuf::from("image_1.jpg")],
            audio_path: PathBuf::from("narration.mp3"),
            script: "(0s-5s) Image 1: Dawn.".to_string(),
            transcript: transcript.to_string(),
            output_dir: PathBuf::from("build"),
        }
    }

    #[test]
    fn offline_build_needs_markers_and_split_transcript() {
        let split = request("Dawn breaks.\nBoats leave.");
        assert!(!split.needs_inference(DurationSource::Markers));
        assert!(split.needs_inference(DurationSource::Inference));
        assert!(split.needs_inference(DurationSource::Auto));

        let single_line = request("Dawn breaks. Boats leave.");
        assert!(single_line.needs_inference(DurationSource::Markers));
    }
}
