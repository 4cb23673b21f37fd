//! Поддельные ffmpeg/ffprobe для тестов
//!
//! Файл также подключается из `tests/common` через `#[path]`, поэтому здесь
//! только стандартная библиотека.

use std::fs;
use std::path::{Path, PathBuf};

/// Записать исполняемый shell-скрипт
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// ffmpeg, копирующий первый `-i` в последний аргумент
///
/// Аргументы каждого вызова дописываются в журнал. Если в аргументах есть
/// `fail_on`, скрипт падает, оставив частичный результат.
#[cfg(unix)]
pub fn fake_ffmpeg(dir: &Path, fail_on: Option<&str>) -> (PathBuf, PathBuf) {
    let log = dir.join("ffmpeg_calls.log");
    let fail_check = match fail_on {
        Some(pattern) => format!(
            "case \"$*\" in *\"{}\"*) echo partial > \"$out\"; \
             echo \"Error opening filters\" >&2; exit 1;; esac\n",
            pattern
        ),
        None => String::new(),
    };
    let body = format!(
        r#"echo "$@" >> "{log}"
in=""
prev=""
out=""
for a in "$@"; do
  if [ "$prev" = "-i" ] && [ -z "$in" ]; then in="$a"; fi
  prev="$a"
  out="$a"
done
{fail_check}if [ -n "$in" ] && [ -f "$in" ]; then cp "$in" "$out"; else echo fake > "$out"; fi
"#,
        log = log.display(),
        fail_check = fail_check
    );
    (write_script(dir, "fake_ffmpeg.sh", &body), log)
}

/// ffprobe, всегда сообщающий указанную длительность
#[cfg(unix)]
pub fn fake_ffprobe(dir: &Path, seconds: &str) -> PathBuf {
    write_script(dir, "fake_ffprobe.sh", &format!("echo {}\n", seconds))
}
