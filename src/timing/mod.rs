//! Расчет длительностей кадров: извлечение из сценария и балансировка по аудио

pub mod durations;
pub mod rebalance;

pub use durations::{extract_durations, parse_duration_array, parse_segment_markers};
pub use rebalance::{rebalance, RebalanceSettings};
