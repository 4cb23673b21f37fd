//! Модуль конфигурации библиотеки reel-sync
//!
//! Этот модуль содержит структуры и перечисления для настройки сборки видео.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ReelSyncError, Result};

/// Источник длительностей кадров
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DurationSource {
    /// Запрос к сервису генерации текста
    Inference,
    /// Разбор меток вида `(0s-5s)` прямо из сценария
    Markers,
    /// Сначала сервис, при пустом результате метки
    Auto,
}

impl Default for DurationSource {
    fn default() -> Self {
        Self::Inference
    }
}

impl DurationSource {
    /// Получить строковое представление источника
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inference => "inference",
            Self::Markers => "markers",
            Self::Auto => "auto",
        }
    }
}

/// Конфигурация библиотеки
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelSyncConfig {
    /// API ключ сервиса генерации
    pub api_key: String,
    /// Базовый URL OpenAI-совместимого API
    pub api_base_url: String,
    /// Модель для извлечения длительностей и разбиения текста
    pub chat_model: String,
    /// Модель генерации изображений
    pub image_model: String,
    /// Ширина запрашиваемого изображения
    pub image_width: u32,
    /// Высота запрашиваемого изображения
    pub image_height: u32,
    /// Количество шагов генерации изображения
    pub image_steps: u32,
    /// Таймаут HTTP запросов в секундах
    pub request_timeout_secs: u64,
    /// Максимальное количество изображений в одной сборке
    pub max_images: usize,
    /// Пауза после каждого запроса изображения в миллисекундах
    pub image_request_delay_ms: u64,
    /// Источник длительностей кадров
    pub duration_source: DurationSource,
    /// Длительность кадра по умолчанию в секундах
    pub default_segment_secs: f64,
    /// Минимальная длительность последнего кадра в секундах
    pub min_segment_secs: f64,
    /// Ширина итогового видео
    pub video_width: u32,
    /// Высота итогового видео
    pub video_height: u32,
    /// Коэффициент темпа озвучки (None - без изменения)
    pub narration_tempo: Option<f64>,
    /// Путь к ffmpeg
    pub ffmpeg_path: PathBuf,
    /// Путь к ffprobe
    pub ffprobe_path: PathBuf,
    /// Таймаут внешних процессов в секундах
    pub encoder_timeout_secs: Option<u64>,
    /// Удалять плейлист после успешной сборки
    pub cleanup_playlist: bool,
}

impl Default for ReelSyncConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: "https://api.together.xyz/v1".to_string(),
            chat_model: "meta-llama/Llama-Vision-Free".to_string(),
            image_model: "black-forest-labs/FLUX.1-schnell-Free".to_string(),
            image_width: 1024,
            image_height: 1024,
            image_steps: 4,
            request_timeout_secs: 120,
            max_images: 9,
            image_request_delay_ms: 10_000,
            duration_source: DurationSource::default(),
            default_segment_secs: 5.0,
            min_segment_secs: 0.1,
            video_width: 1080,
            video_height: 1920,
            narration_tempo: Some(0.9),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            encoder_timeout_secs: None,
            cleanup_playlist: true,
        }
    }
}

impl ReelSyncConfig {
    /// Создать конфигурацию по умолчанию с переопределениями из окружения
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Применить переопределения из окружения к уже загруженной конфигурации
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_env(|key| std::env::var(key).ok());
        self
    }

    /// Загрузить конфигурацию из JSON файла
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReelSyncError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty("REEL_SYNC_API_KEY").or_else(|| non_empty("TOGETHER_AI_API_KEY"));
        if let Some(key) = api_key {
            self.api_key = key;
        }
        if let Some(url) = non_empty("REEL_SYNC_API_BASE_URL") {
            self.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = non_empty("REEL_SYNC_CHAT_MODEL") {
            self.chat_model = model;
        }
        if let Some(model) = non_empty("REEL_SYNC_IMAGE_MODEL") {
            self.image_model = model;
        }
        if let Some(path) = non_empty("REEL_SYNC_FFMPEG") {
            self.ffmpeg_path = PathBuf::from(path);
        }
        if let Some(path) = non_empty("REEL_SYNC_FFPROBE") {
            self.ffprobe_path = PathBuf::from(path);
        }
    }

    /// Проверить корректность значений
    pub fn validate(&self) -> Result<()> {
        if !(self.default_segment_secs.is_finite() && self.default_segment_secs > 0.0) {
            return Err(ReelSyncError::Configuration(format!(
                "default_segment_secs must be positive, got {}",
                self.default_segment_secs
            )));
        }
        if !(self.min_segment_secs.is_finite() && self.min_segment_secs > 0.0) {
            return Err(ReelSyncError::Configuration(format!(
                "min_segment_secs must be positive, got {}",
                self.min_segment_secs
            )));
        }
        if self.video_width == 0 || self.video_height == 0 {
            return Err(ReelSyncError::Configuration(
                "video resolution must be non-zero".to_string(),
            ));
        }
        if self.max_images == 0 {
            return Err(ReelSyncError::Configuration(
                "max_images must be at least 1".to_string(),
            ));
        }
        if let Some(tempo) = self.narration_tempo {
            if !(tempo.is_finite() && tempo > 0.0) {
                return Err(ReelSyncError::Configuration(format!(
                    "narration_tempo must be positive, got {}",
                    tempo
                )));
            }
        }
        Ok(())
    }

    /// Пауза после запроса изображения
    pub fn image_request_delay(&self) -> Duration {
        Duration::from_millis(self.image_request_delay_ms)
    }

    /// Таймаут HTTP запросов
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Таймаут внешних процессов, если задан
    pub fn encoder_timeout(&self) -> Option<Duration> {
        self.encoder_timeout_secs.map(Duration::from_secs)
    }
}
