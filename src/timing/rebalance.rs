//! Балансировка длительностей кадров по длине озвучки
//!
//! Два прохода: пропорциональное сжатие (только если кадры длиннее аудио),
//! затем последний кадр получает остаток `L - sum(первые N-1)`. Вся ошибка
//! округления оседает в последнем кадре, сумма равна длине аудио.

use crate::config::ReelSyncConfig;
use crate::error::{ReelSyncError, Result};

/// Параметры балансировки
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RebalanceSettings {
    /// Длительность для недостающих или некорректных значений
    pub default_secs: f64,
    /// Нижняя граница длительности последнего кадра
    pub min_secs: f64,
}

impl Default for RebalanceSettings {
    fn default() -> Self {
        Self {
            default_secs: 5.0,
            min_secs: 0.1,
        }
    }
}

impl From<&ReelSyncConfig> for RebalanceSettings {
    fn from(config: &ReelSyncConfig) -> Self {
        Self {
            default_secs: config.default_segment_secs,
            min_secs: config.min_segment_secs,
        }
    }
}

/// Привести длительности к количеству кадров и длине аудио
pub fn rebalance(
    raw: &[f64],
    image_count: usize,
    audio_secs: f64,
    settings: &RebalanceSettings,
) -> Result<Vec<f64>> {
    if image_count == 0 {
        return Err(ReelSyncError::InputValidation(
            "cannot rebalance durations for zero images".to_string(),
        ));
    }
    if !(audio_secs.is_finite() && audio_secs > 0.0) {
        return Err(ReelSyncError::InputValidation(format!(
            "audio duration must be positive, got {}",
            audio_secs
        )));
    }

    let mut durations = fit_to_count(raw, image_count, settings.default_secs);

    let total: f64 = durations.iter().sum();
    if audio_secs < total {
        let scale = audio_secs / total;
        log::debug!(
            "Scaling {} durations by {:.4} ({:.3}s -> {:.3}s)",
            image_count,
            scale,
            total,
            audio_secs
        );
        for duration in durations.iter_mut() {
            *duration *= scale;
        }
    }

    absorb_remainder(&mut durations, audio_secs);

    if durations[image_count - 1] < settings.min_secs {
        clamp_last(&mut durations, audio_secs, settings.min_secs);
    }

    Ok(durations)
}

/// Дополнить значениями по умолчанию или обрезать до `count`
fn fit_to_count(raw: &[f64], count: usize, default_secs: f64) -> Vec<f64> {
    if raw.len() < count {
        log::debug!("Padding {} durations with {}s up to {}", raw.len(), default_secs, count);
    } else if raw.len() > count {
        log::debug!("Truncating {} durations to {}", raw.len(), count);
    }

    let mut durations: Vec<f64> = raw
        .iter()
        .take(count)
        .map(|&d| if d.is_finite() && d > 0.0 { d } else { default_secs })
        .collect();
    durations.resize(count, default_secs);
    durations
}

/// Последний элемент становится `target - sum(остальных)`
fn absorb_remainder(durations: &mut [f64], target: f64) {
    let Some((last, prefix)) = durations.split_last_mut() else {
        return;
    };
    let prefix_sum: f64 = prefix.iter().sum();
    *last = target - prefix_sum;
}

fn clamp_last(durations: &mut [f64], audio_secs: f64, min_secs: f64) {
    let count = durations.len();
    log::warn!(
        "Last duration {:.4}s is below the {:.3}s floor, renormalizing",
        durations[count - 1],
        min_secs
    );

    if audio_secs < min_secs * count as f64 {
        // аудио слишком короткое для нижней границы: делим поровну
        let even = audio_secs / count as f64;
        durations.iter_mut().for_each(|d| *d = even);
    } else if let Some((_, prefix)) = durations.split_last_mut() {
        let prefix_sum: f64 = prefix.iter().sum();
        let scale = (audio_secs - min_secs) / prefix_sum;
        prefix.iter_mut().for_each(|d| *d *= scale);
    }

    absorb_remainder(durations, audio_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn settings() -> RebalanceSettings {
        RebalanceSettings::default()
    }

    fn assert_sums_to(durations: &[f64], target: f64) {
        let sum: f64 = durations.iter().sum();
        assert!((sum - target).abs() < EPS, "sum {} != {}", sum, target);
    }

    #[test]
    fn shrinks_to_twelve_seconds() {
        let durations = rebalance(&[5.0, 5.0, 5.0], 3, 12.0, &settings()).unwrap();
        assert_eq!(durations.len(), 3);
        for d in &durations {
            assert!((d - 4.0).abs() < EPS);
        }
        assert_eq!(durations[2], 12.0 - durations[0] - durations[1]);
        assert_sums_to(&durations, 12.0);
    }

    #[test]
    fn shrinks_to_ten_seconds_with_drift_in_last() {
        let durations = rebalance(&[5.0, 5.0, 5.0], 3, 10.0, &settings()).unwrap();
        let scaled = 5.0 * (10.0 / 15.0);
        assert_eq!(durations[0], scaled);
        assert_eq!(durations[1], scaled);
        assert_eq!(durations[2], 10.0 - (scaled + scaled));
        assert!((durations[2] - 3.3333).abs() < 1e-3);
        assert_sums_to(&durations, 10.0);
    }

    #[test]
    fn never_stretches_short_inferred_durations() {
        let durations = rebalance(&[2.0, 3.0], 2, 20.0, &settings()).unwrap();
        assert_eq!(durations, vec![2.0, 18.0]);
    }

    #[test]
    fn empty_input_pads_with_defaults_then_scales() {
        let durations = rebalance(&[], 4, 8.0, &settings()).unwrap();
        assert_eq!(durations.len(), 4);
        for d in &durations {
            assert!((d - 2.0).abs() < EPS);
        }
        assert_sums_to(&durations, 8.0);
    }

    #[test]
    fn pads_short_and_truncates_long_sequences() {
        let padded = rebalance(&[1.0], 3, 100.0, &settings()).unwrap();
        assert_eq!(padded, vec![1.0, 5.0, 94.0]);

        let truncated = rebalance(&[1.0, 2.0, 3.0, 4.0], 2, 50.0, &settings()).unwrap();
        assert_eq!(truncated, vec![1.0, 49.0]);
    }

    #[test]
    fn single_image_takes_whole_audio() {
        assert_eq!(rebalance(&[3.0], 1, 7.25, &settings()).unwrap(), vec![7.25]);
        assert_eq!(rebalance(&[30.0], 1, 7.25, &settings()).unwrap(), vec![7.25]);
        assert_eq!(rebalance(&[], 1, 7.25, &settings()).unwrap(), vec![7.25]);
    }

    #[test]
    fn invalid_raw_entries_are_replaced_with_default() {
        let durations = rebalance(&[-2.0, f64::NAN, 0.0], 3, 30.0, &settings()).unwrap();
        assert_eq!(durations, vec![5.0, 5.0, 20.0]);
    }

    #[test]
    fn tiny_last_segment_is_clamped_to_floor() {
        let durations = rebalance(&[10.0, 10.0, 0.01], 3, 20.01, &settings()).unwrap();
        assert!(durations.iter().all(|d| *d > 0.0));
        assert!((durations[2] - 0.1).abs() < 1e-9);
        assert!((durations[0] - durations[1]).abs() < EPS);
        assert_sums_to(&durations, 20.01);
    }

    #[test]
    fn audio_shorter_than_floors_splits_evenly() {
        let durations = rebalance(&[0.01, 0.01, 0.01], 3, 0.06, &settings()).unwrap();
        for d in &durations {
            assert!((d - 0.02).abs() < EPS);
        }
        assert_sums_to(&durations, 0.06);
    }

    #[test]
    fn property_n_positive_entries_summing_to_audio() {
        let raws: [&[f64]; 5] = [
            &[],
            &[1.0],
            &[7.0, 3.5, 2.25, 9.0],
            &[0.5; 12],
            &[120.0, 0.2, 0.3],
        ];
        for raw in raws {
            for n in 1..=9 {
                for audio in [0.9, 4.0, 12.0, 33.3, 61.7] {
                    let durations = rebalance(raw, n, audio, &settings()).unwrap();
                    assert_eq!(durations.len(), n);
                    let positive = durations.iter().all(|d| *d > 0.0);
                    assert!(positive, "{:?} n={} L={}: {:?}", raw, n, audio, durations);
                    assert_sums_to(&durations, audio);
                }
            }
        }
    }

    #[test]
    fn rejects_zero_images_and_non_positive_audio() {
        assert!(matches!(
            rebalance(&[5.0], 0, 10.0, &settings()),
            Err(ReelSyncError::InputValidation(_))
        ));
        assert!(rebalance(&[5.0], 1, 0.0, &settings()).is_err());
        assert!(rebalance(&[5.0], 1, f64::INFINITY, &settings()).is_err());
    }
}
