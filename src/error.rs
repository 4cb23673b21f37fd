//! Модуль обработки ошибок библиотеки reel-sync
//!
//! Этот модуль содержит типы ошибок, которые могут возникнуть при сборке видео.

use std::fmt;
use thiserror::Error;

/// Этап, на котором был вызван внешний кодировщик
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderStage {
    /// Сборка видео из плейлиста и аудио
    Mux,
    /// Вжигание субтитров в видео
    BurnIn,
    /// Изменение темпа аудио
    Tempo,
}

impl EncoderStage {
    /// Получить строковое представление этапа
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mux => "muxing",
            Self::BurnIn => "subtitle burn-in",
            Self::Tempo => "tempo adjustment",
        }
    }
}

impl fmt::Display for EncoderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ошибки библиотеки reel-sync
#[derive(Debug, Error)]
pub enum ReelSyncError {
    /// Некорректные входные данные, обнаруженные до любых внешних вызовов
    #[error("Invalid input: {0}")]
    InputValidation(String),

    /// Не удалось определить длительность аудио
    #[error("Audio probe failed for {path}: {reason}")]
    ExternalProbe { path: String, reason: String },

    /// Кодировщик завершился с ошибкой
    #[error("Encoder failed during {stage}: {message}")]
    Encoder { stage: EncoderStage, message: String },

    /// Ошибка файловой системы (переименование, удаление)
    #[error("File system error: {0}")]
    FileSystem(String),

    /// Ошибка разбора ответа сервиса
    #[error("Parse error: {0}")]
    Parse(String),

    /// Ошибка сервиса генерации текста
    #[error("Inference error: {0}")]
    Inference(String),

    /// Ошибка генерации изображения
    #[error("Image generation error: {0}")]
    ImageGeneration(String),

    /// Ошибка конфигурации
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Превышено время ожидания внешнего процесса
    #[error("Timed out after {secs}s: {what}")]
    Timeout { what: String, secs: u64 },

    /// Ошибка HTTP запроса
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Ошибка ввода-вывода
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка сериализации/десериализации JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Другая ошибка
    #[error("Other error: {0}")]
    Other(String),
}

impl ReelSyncError {
    /// Создать ошибку кодировщика для указанного этапа
    pub fn encoder(stage: EncoderStage, message: impl Into<String>) -> Self {
        Self::Encoder {
            stage,
            message: message.into(),
        }
    }

    /// Является ли ошибка сбоем кодировщика на указанном этапе
    pub fn is_encoder_stage(&self, expected: EncoderStage) -> bool {
        matches!(self, Self::Encoder { stage, .. } if *stage == expected)
    }
}

impl From<&str> for ReelSyncError {
    fn from(s: &str) -> Self {
        ReelSyncError::Other(s.to_string())
    }
}

impl From<String> for ReelSyncError {
    fn from(s: String) -> Self {
        ReelSyncError::Other(s)
    }
}

/// Тип Result для библиотеки reel-sync
pub type Result<T> = std::result::Result<T, ReelSyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoder_errors_carry_stage_context() {
        let mux = ReelSyncError::encoder(EncoderStage::Mux, "exit status: 1");
        let burn = ReelSyncError::encoder(EncoderStage::BurnIn, "exit status: 1");

        assert_eq!(mux.to_string(), "Encoder failed during muxing: exit status: 1");
        assert_eq!(
            burn.to_string(),
            "Encoder failed during subtitle burn-in: exit status: 1"
        );
        assert!(mux.is_encoder_stage(EncoderStage::Mux));
        assert!(!mux.is_encoder_stage(EncoderStage::BurnIn));
    }
}
