//! Вспомогательные модули: запуск ffmpeg, временные файлы, пути, логирование

pub mod common;
pub mod ffmpeg;
pub mod logger;
pub mod temp;

#[cfg(test)]
pub(crate) mod test_support;
