//! Формирование SRT субтитров
//!
//! Каждая строка расшифровки получает один кадр из списка длительностей.
//! Реплики идут встык: конец i-й реплики равен началу (i+1)-й.

use std::fmt;

/// Одна реплика SRT
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    /// Номер реплики, начиная с 1
    pub index: usize,
    /// Время начала в секундах
    pub start: f64,
    /// Время окончания в секундах
    pub end: f64,
    /// Текст реплики
    pub text: String,
}

impl fmt::Display for SubtitleCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{} --> {}\n{}\n",
            self.index,
            format_time(self.start),
            format_time(self.end),
            self.text
        )
    }
}

/// Построить реплики по строкам расшифровки
///
/// Пустые строки пропускаются. Если длительностей меньше, чем строк,
/// недостающие заполняются `default_secs`.
pub fn synthesize_cues(transcript: &str, durations: &[f64], default_secs: f64) -> Vec<SubtitleCue> {
    let mut cues = Vec::new();
    let mut elapsed = 0.0;

    let lines = transcript.lines().map(str::trim).filter(|line| !line.is_empty());
    for (i, line) in lines.enumerate() {
        let duration = durations.get(i).copied().unwrap_or(default_secs);
        let end = elapsed + duration;
        cues.push(SubtitleCue {
            index: i + 1,
            start: elapsed,
            end,
            text: line.to_string(),
        });
        elapsed = end;
    }

    if cues.len() > durations.len() {
        log::debug!(
            "Transcript has {} lines but only {} durations, padded with {}s",
            cues.len(),
            durations.len(),
            default_secs
        );
    }
    cues
}

/// Сериализовать реплики в текст SRT
pub fn render_srt(cues: &[SubtitleCue]) -> String {
    cues.iter().map(|cue| format!("{}\n", cue)).collect()
}

/// Секунды в `HH:MM:SS,mmm`, миллисекунды отбрасываются без округления
pub fn format_time(seconds: f64) -> String {
    // 1e-6 гасит ошибку представления вроде 3661.234 * 1000 = 3661233.9999
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0 + 1e-6).floor() as u64
    } else {
        0
    };

    let millis = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let minutes = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_time_codes() {
        assert_eq!(format_time(0.0), "00:00:00,000");
        assert_eq!(format_time(3661.234), "01:01:01,234");
        assert_eq!(format_time(4.0), "00:00:04,000");
        assert_eq!(format_time(59.9999), "00:00:59,999");
        assert_eq!(format_time(0.1 + 0.2), "00:00:00,300");
        assert_eq!(format_time(36000.5), "10:00:00,500");
        assert_eq!(format_time(-3.0), "00:00:00,000");
    }

    #[test]
    fn cues_are_contiguous_and_one_based() {
        let transcript = "First line\n\nSecond line\nThird line\n";
        let cues = synthesize_cues(transcript, &[4.0, 4.0, 4.0], 5.0);

        assert_eq!(cues.len(), 3);
        assert_eq!(cues[0].index, 1);
        assert_eq!(cues[0].start, 0.0);
        for pair in cues.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert_eq!(pair[1].index, pair[0].index + 1);
        }
        assert_eq!(cues[2].end, 12.0);
        assert_eq!(cues[1].text, "Second line");
    }

    #[test]
    fn missing_durations_are_padded() {
        let cues = synthesize_cues("a\nb\nc", &[2.0], 5.0);
        assert_eq!(cues.iter().map(|c| c.end).collect::<Vec<_>>(), vec![2.0, 7.0, 12.0]);
    }

    #[test]
    fn extra_durations_are_ignored() {
        let cues = synthesize_cues("only line", &[3.0, 9.0], 5.0);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].end, 3.0);
    }

    #[test]
    fn renders_srt_blocks() {
        let cues = synthesize_cues("Hello\nWorld", &[1.5, 2.25], 5.0);
        assert_eq!(
            render_srt(&cues),
            "1\n00:00:00,000 --> 00:00:01,500\nHello\n\n2\n00:00:01,500 --> 00:00:03,750\nWorld\n\n"
        );
        assert_eq!(render_srt(&[]), "");
    }
}
