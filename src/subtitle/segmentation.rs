//! Разбиение расшифровки на строки субтитров

use crate::inference::prompts::line_segmentation_prompt;
use crate::inference::TextInference;

/// Разбить расшифровку на строки
///
/// Расшифровка с переводами строк возвращается как есть. Иначе строки
/// запрашиваются у сервиса генерации текста; при ошибке или пустом ответе
/// вся расшифровка становится одной строкой.
pub async fn segment_transcript(transcript: &str, inference: &dyn TextInference) -> String {
    if transcript.contains('\n') {
        return transcript.to_string();
    }

    match inference.complete(&line_segmentation_prompt(transcript)).await {
        Ok(response) if !response.trim().is_empty() => {
            let segmented = response.trim().to_string();
            let count = segmented.lines().filter(|l| !l.trim().is_empty()).count();
            log::info!("Transcript split into {} lines", count);
            segmented
        }
        Ok(_) => {
            log::warn!("Line segmentation returned nothing, using transcript as a single line");
            transcript.to_string()
        }
        Err(e) => {
            log::warn!("Line segmentation failed, using transcript as a single line: {}", e);
            transcript.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ReelSyncError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        reply: std::result::Result<&'static str, &'static str>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(reply: std::result::Result<&'static str, &'static str>) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TextInference for Scripted {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .map_err(|e| ReelSyncError::Inference(e.to_string()))
        }
    }

    #[tokio::test]
    async fn multi_line_transcript_is_not_sent() {
        let inference = Scripted::new(Ok("ignored"));
        let transcript = "One.\nTwo.";
        assert_eq!(segment_transcript(transcript, &inference).await, transcript);
        assert_eq!(inference.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn single_line_transcript_uses_segmentation() {
        let inference = Scripted::new(Ok("\n  One thing.\nAnother thing.  \n"));
        let lines = segment_transcript("One thing. Another thing.", &inference).await;
        assert_eq!(lines, "One thing.\nAnother thing.");
        assert_eq!(inference.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_or_blank_reply_keeps_original() {
        let transcript = "One thing. Another thing.";
        for reply in [Err("timeout"), Ok("  \n ")] {
            let inference = Scripted::new(reply);
            assert_eq!(segment_transcript(transcript, &inference).await, transcript);
        }
    }
}
