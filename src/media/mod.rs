//! Модуль для работы с медиафайлами
//!
//! Этот модуль содержит функции для работы с аудио и видео через ffmpeg.

pub mod audio;
pub mod playlist;
pub mod video;

pub use audio::{adjust_tempo, atempo_filter, probe_audio_duration};
pub use playlist::{build_entries, parse_playlist, render_playlist, write_playlist, PlaylistEntry};
pub use video::{burn_in_subtitles, escape_filter_path, mux_base_video};
