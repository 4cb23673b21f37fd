//! Модуль получения исходных материалов сборки

pub mod images;

pub use images::{acquire_images, image_dir};
