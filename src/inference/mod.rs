//! Модуль внешних сервисов генерации
//!
//! Конвейер обращается к сервисам только через трейты этого модуля, поэтому
//! в тестах и при другом поставщике API их легко подменить.

pub mod openai;
pub mod prompts;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{ReelSyncError, Result};

pub use openai::OpenAiCompatibleClient;

/// Сервис генерации текста
#[async_trait]
pub trait TextInference: Send + Sync {
    /// Отправить запрос и получить текст ответа
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Сервис генерации изображений
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Сгенерировать изображение и вернуть URL для скачивания
    async fn generate_image_url(&self, prompt: &str) -> Result<String>;

    /// Скачать сгенерированное изображение
    async fn fetch_image(&self, url: &str) -> Result<Bytes>;
}

/// Заглушка для сборок без сервиса генерации текста
///
/// Любой запрос завершается ошибкой конфигурации; конвейер при этом
/// откатывается на значения по умолчанию.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledInference;

#[async_trait]
impl TextInference for DisabledInference {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(ReelSyncError::Configuration(
            "text inference is disabled, no API key configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_inference_always_fails() {
        let result = DisabledInference.complete("Split into lines").await;
        assert!(matches!(result, Err(ReelSyncError::Configuration(_))));
    }
}
