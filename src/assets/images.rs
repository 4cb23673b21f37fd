//! Загрузка изображений для кадров
//!
//! Запросы идут строго по очереди, после каждого выдерживается пауза для
//! соблюдения лимитов сервиса. Ошибка одного изображения не прерывает пакет.

use std::path::{Path, PathBuf};

use crate::config::ReelSyncConfig;
use crate::error::{ReelSyncError, Result};
use crate::inference::ImageGenerator;
use crate::progress::ProgressTracker;

/// Каталог изображений внутри каталога сборки
pub fn image_dir(output_dir: &Path) -> PathBuf {
    output_dir.join("img")
}

/// Сгенерировать изображения по промптам и сохранить их в `<output_dir>/img`
///
/// Возвращает пути успешно сохраненных файлов в порядке промптов. Файлы
/// нумеруются по числу уже сохраненных, поэтому пропуски не оставляют дыр.
pub async fn acquire_images(
    prompts: &[String],
    output_dir: &Path,
    generator: &dyn ImageGenerator,
    config: &ReelSyncConfig,
    tracker: Option<&ProgressTracker>,
) -> Result<Vec<PathBuf>> {
    let img_dir = image_dir(output_dir);
    tokio::fs::create_dir_all(&img_dir).await.map_err(|e| {
        ReelSyncError::FileSystem(format!("Failed to create {}: {}", img_dir.display(), e))
    })?;

    let selected = &prompts[..prompts.len().min(config.max_images)];
    if selected.len() < prompts.len() {
        log::info!("Using the first {} of {} image prompts", selected.len(), prompts.len());
    }

    let delay = config.image_request_delay();
    let mut images = Vec::with_capacity(selected.len());

    for (i, prompt) in selected.iter().enumerate() {
        let target = img_dir.join(format!("image_{}.jpg", images.len() + 1));

        match fetch_one(generator, prompt, &target).await {
            Ok(()) => {
                log::info!("Saved image {} for prompt {:?}", target.display(), prompt);
                images.push(target);
            }
            Err(e) => log::error!("Error generating image for prompt {:?}: {}", prompt, e),
        }

        if let Some(tracker) = tracker {
            tracker.update_step_progress(
                (i + 1) as f32 / selected.len() as f32 * 100.0,
                Some(format!("{}/{}", i + 1, selected.len())),
            );
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    log::info!("Acquired {} of {} images", images.len(), selected.len());
    Ok(images)
}

async fn fetch_one(generator: &dyn ImageGenerator, prompt: &str, target: &Path) -> Result<()> {
    let url = generator.generate_image_url(prompt).await?;
    let bytes = generator.fetch_image(&url).await?;
    tokio::fs::write(target, &bytes).await.map_err(|e| {
        ReelSyncError::FileSystem(format!("Failed to write {}: {}", target.display(), e))
    })
}
