//! Модуль для работы с субтитрами
//!
//! Разбиение расшифровки на строки и построение SRT по длительностям кадров.

pub mod segmentation;
pub mod srt;

pub use segmentation::segment_transcript;
pub use srt::{format_time, render_srt, synthesize_cues, SubtitleCue};
