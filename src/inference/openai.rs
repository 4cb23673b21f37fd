//! Модуль для работы с OpenAI-совместимым API
//!
//! Чат-запросы (`/chat/completions`) и генерация изображений
//! (`/images/generations`) через reqwest. По умолчанию используется
//! Together AI, но подходит любой сервер с тем же протоколом.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ReelSyncConfig;
use crate::error::{ReelSyncError, Result};
use crate::inference::prompts::decorate_image_prompt;
use crate::inference::{ImageGenerator, TextInference};

// Chat message structure
#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: String,
    width: u32,
    height: u32,
    steps: u32,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

/// Клиент OpenAI-совместимого API
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    client: Client,
    base_url: String,
    api_key: String,
    chat_model: String,
    image_model: String,
    image_width: u32,
    image_height: u32,
    image_steps: u32,
}

impl OpenAiCompatibleClient {
    /// Создать клиент по конфигурации
    pub fn from_config(config: &ReelSyncConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            log::error!("API key is empty");
            return Err(ReelSyncError::Configuration(
                "API key is required for the inference backend".to_string(),
            ));
        }

        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            chat_model: config.chat_model.clone(),
            image_model: config.image_model.clone(),
            image_width: config.image_width,
            image_height: config.image_height,
            image_steps: config.image_steps,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn error_body(response: reqwest::Response) -> String {
        match response.text().await {
            Ok(text) => text,
            Err(e) => format!("Failed to read error response: {}", e),
        }
    }
}

#[async_trait]
impl TextInference for OpenAiCompatibleClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.chat_model,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        log::debug!("Sending chat request to {} (model {})", self.base_url, self.chat_model);
        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = Self::error_body(response).await;
            log::error!("Chat API error: HTTP {}, body: {}", status, error_text);
            return Err(ReelSyncError::Inference(format!("HTTP {}: {}", status, error_text)));
        }

        let completion: ChatCompletion = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ReelSyncError::Inference("response contains no choices".to_string()))?;

        log::debug!("Received chat completion ({} chars)", content.len());
        Ok(content)
    }
}

#[async_trait]
impl ImageGenerator for OpenAiCompatibleClient {
    async fn generate_image_url(&self, prompt: &str) -> Result<String> {
        let request = ImageRequest {
            model: &self.image_model,
            prompt: decorate_image_prompt(prompt),
            width: self.image_width,
            height: self.image_height,
            steps: self.image_steps,
            n: 1,
        };

        let response = self
            .client
            .post(self.endpoint("images/generations"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = Self::error_body(response).await;
            log::error!("Image API error: HTTP {}, body: {}", status, error_text);
            return Err(ReelSyncError::ImageGeneration(format!("HTTP {}: {}", status, error_text)));
        }

        let body: ImageResponse = response.json().await?;
        body.data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .ok_or_else(|| {
                ReelSyncError::ImageGeneration("No image URL found in the response".to_string())
            })
    }

    async fn fetch_image(&self, url: &str) -> Result<Bytes> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReelSyncError::ImageGeneration(format!(
                "Image download failed with HTTP {}",
                status
            )));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ReelSyncError::ImageGeneration("Downloaded image is empty".to_string()));
        }
        Ok(bytes)
    }
}
