//! Общие заглушки для интеграционных тестов

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use reel_sync::error::{ReelSyncError, Result};
use reel_sync::inference::TextInference;

#[path = "../../src/utils/test_support.rs"]
mod test_support;

pub use test_support::*;

/// Сервис генерации текста с заготовленными ответами
///
/// Запрос длительностей узнается по тексту "JSON array", остальные
/// считаются запросами на разбиение расшифровки.
pub struct FakeInference {
    pub durations_reply: std::result::Result<String, String>,
    pub lines_reply: std::result::Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeInference {
    pub fn new(durations: &str, lines: &str) -> Self {
        Self {
            durations_reply: Ok(durations.to_string()),
            lines_reply: Ok(lines.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn offline() -> Self {
        Self {
            durations_reply: Err("connection refused".to_string()),
            lines_reply: Err("connection refused".to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextInference for FakeInference {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = if prompt.contains("JSON array") {
            &self.durations_reply
        } else {
            &self.lines_reply
        };
        reply.clone().map_err(ReelSyncError::Inference)
    }
}

/// Каталог с тремя изображениями, озвучкой и каталогом сборки
pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub images: Vec<PathBuf>,
    pub audio: PathBuf,
    pub output_dir: PathBuf,
}

impl Fixture {
    pub fn new(image_count: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let images = (1..=image_count)
            .map(|i| {
                let path = dir.path().join(format!("image_{}.jpg", i));
                fs::write(&path, format!("jpeg {}", i)).unwrap();
                path
            })
            .collect();
        let audio = dir.path().join("narration.mp3");
        fs::write(&audio, b"mp3 narration").unwrap();
        let output_dir = dir.path().join("build");

        Self {
            dir,
            images,
            audio,
            output_dir,
        }
    }

    pub fn tools(&self) -> PathBuf {
        let tools = self.dir.path().join("tools");
        fs::create_dir_all(&tools).unwrap();
        tools
    }
}
