//! Сборка с относительными путями
//!
//! Тест меняет текущий каталог процесса, поэтому живет в отдельном бинарнике.

#![cfg(unix)]

mod common;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use common::{fake_ffmpeg, fake_ffprobe, FakeInference, Fixture};
use reel_sync::config::ReelSyncConfig;
use reel_sync::media::parse_playlist;
use reel_sync::{BuildRequest, ReelSync, CONCAT_FILE};

#[tokio::test]
async fn relative_image_paths_are_written_as_absolute() {
    let fixture = Fixture::new(3);
    let tools = fixture.tools();
    let (ffmpeg, _log) = fake_ffmpeg(&tools, None);
    let config = ReelSyncConfig {
        ffmpeg_path: ffmpeg,
        ffprobe_path: fake_ffprobe(&tools, "12.0"),
        narration_tempo: None,
        cleanup_playlist: false,
        ..ReelSyncConfig::default()
    };
    std::env::set_current_dir(fixture.dir.path()).unwrap();

    let request = BuildRequest {
        images: (1..=3).map(|i| PathBuf::from(format!("image_{}.jpg", i))).collect(),
        audio_path: PathBuf::from("narration.mp3"),
        script: "(0s-4s) Image 1: a\n(4s-8s) Image 2: b\n(8s-12s) Image 3: c".to_string(),
        transcript: "a\nb\nc".to_string(),
        output_dir: PathBuf::from("build"),
    };
    let engine = ReelSync::new(config, Arc::new(FakeInference::new("[4, 4, 4]", "a\nb\nc")));

    engine.build(&request).await.unwrap();

    let playlist = fs::read_to_string(fixture.output_dir.join(CONCAT_FILE)).unwrap();
    let entries = parse_playlist(&playlist).unwrap();
    assert_eq!(entries.len(), 3);
    for (i, entry) in entries.iter().enumerate() {
        assert!(entry.path.is_absolute(), "{}", entry.path.display());
        assert!(entry.path.ends_with(format!("image_{}.jpg", i + 1)));
        assert_eq!(fs::read_to_string(&entry.path).unwrap(), format!("jpeg {}", i + 1));
    }
}
