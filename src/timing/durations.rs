//! Извлечение длительностей кадров из сценария
//!
//! Основной путь - запрос к сервису генерации текста, который должен вернуть
//! JSON-массив чисел. Любая ошибка запроса или разбора дает пустой список:
//! недоступные длительности означают "неизвестно", а не сбой сборки.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::DurationSource;
use crate::error::{ReelSyncError, Result};
use crate::inference::prompts::duration_extraction_prompt;
use crate::inference::TextInference;

// (0s-5s), (5s – 10s), (10-15s), (1.5s—3s)
static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\s*(\d+(?:\.\d+)?)\s*s?\s*[-–—]\s*(\d+(?:\.\d+)?)\s*s\s*\)")
        .expect("marker regex is valid")
});

/// Извлечь длительности кадров выбранным способом
pub async fn extract_durations(
    script: &str,
    source: DurationSource,
    inference: &dyn TextInference,
) -> Vec<f64> {
    match source {
        DurationSource::Inference => infer_durations(script, inference).await,
        DurationSource::Markers => parse_segment_markers(script),
        DurationSource::Auto => {
            let inferred = infer_durations(script, inference).await;
            if inferred.is_empty() {
                log::info!("Inference gave no durations, falling back to script markers");
                parse_segment_markers(script)
            } else {
                inferred
            }
        }
    }
}

async fn infer_durations(script: &str, inference: &dyn TextInference) -> Vec<f64> {
    let prompt = duration_extraction_prompt(script);

    let content = match inference.complete(&prompt).await {
        Ok(content) => content,
        Err(e) => {
            log::warn!("Duration extraction request failed: {}", e);
            return Vec::new();
        }
    };

    match parse_duration_array(&content) {
        Ok(durations) => {
            log::info!("Extracted {} durations from script", durations.len());
            durations
        }
        Err(e) => {
            log::warn!("Failed to parse script durations: {}", e);
            Vec::new()
        }
    }
}

/// Разобрать ответ сервиса как JSON-массив чисел
///
/// Допускаются пробелы и Markdown-ограждение ```` ```json ````.
pub fn parse_duration_array(content: &str) -> Result<Vec<f64>> {
    let trimmed = strip_code_fence(content.trim());
    serde_json::from_str::<Vec<f64>>(trimmed).map_err(|e| {
        ReelSyncError::Parse(format!("expected a JSON array of numbers, got {:?}: {}", trimmed, e))
    })
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Длительности по меткам времени `(Ns-Ms)` в тексте сценария
pub fn parse_segment_markers(script: &str) -> Vec<f64> {
    MARKER_RE
        .captures_iter(script)
        .filter_map(|caps| {
            let start: f64 = caps[1].parse().ok()?;
            let end: f64 = caps[2].parse().ok()?;
            let span = end - start;
            (span > 0.0).then_some(span)
        })
        .collect()
}
