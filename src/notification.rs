//! Наблюдатели прогресса сборки
//!
//! Все текстовые наблюдатели пишут в stderr или в файл: stdout командной
//! строки занят путями результатов.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::error::{ReelSyncError, Result};
use crate::progress::{ProgressInfo, ProgressObserver};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Однострочное описание обновления
pub fn describe(progress: &ProgressInfo) -> String {
    let mut line = format!(
        "{} {:>5.1}% | всего {:>5.1}%",
        progress.step, progress.step_progress, progress.total_progress
    );
    if let Some(details) = progress.details.as_deref().filter(|d| !d.is_empty()) {
        line.push_str(" | ");
        line.push_str(details);
    }
    line
}

/// Наблюдатель, пишущий обновления в журнал через `log`
///
/// Уровень `info` для смены шага и завершения, `debug` для промежуточных
/// обновлений внутри шага.
#[derive(Default)]
pub struct LogProgressObserver {
    current_step: Mutex<Option<String>>,
}

impl LogProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressObserver for LogProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        let mut current = lock(&self.current_step);
        let step_changed = current.as_deref() != Some(progress.step.as_str());
        if step_changed || progress.total_progress >= 100.0 {
            log::info!("{}", describe(&progress));
            *current = Some(progress.step);
        } else {
            log::debug!("{}", describe(&progress));
        }
    }
}

/// Наблюдатель, дописывающий строки прогресса в произвольный приемник
pub struct WriterProgressObserver {
    sink: Mutex<Box<dyn Write + Send>>,
    timestamps: bool,
}

impl WriterProgressObserver {
    /// Писать в указанный приемник без меток времени
    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Mutex::new(Box::new(writer)),
            timestamps: false,
        }
    }

    /// Писать в stderr
    pub fn stderr() -> Self {
        Self::from_writer(io::stderr())
    }

    /// Дописывать в файл журнала, создав его при необходимости
    ///
    /// Каждая строка начинается с локального времени.
    pub fn append_to(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                ReelSyncError::FileSystem(format!(
                    "Failed to open progress log {}: {}",
                    path.display(),
                    e
                ))
            })?;
        Ok(Self::from_writer(file).with_timestamps())
    }

    /// Добавлять локальное время в начало строки
    pub fn with_timestamps(mut self) -> Self {
        self.timestamps = true;
        self
    }
}

impl ProgressObserver for WriterProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        let line = if self.timestamps {
            format!(
                "[{}] {}\n",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                describe(&progress)
            )
        } else {
            format!("{}\n", describe(&progress))
        };

        let mut sink = lock(&self.sink);
        if let Err(e) = sink.write_all(line.as_bytes()).and_then(|_| sink.flush()) {
            log::warn!("Failed to write progress line: {}", e);
        }
    }
}

/// Наблюдатель, сохраняющий все обновления в памяти
#[derive(Clone, Default)]
pub struct MemoryProgressObserver {
    history: Arc<Mutex<Vec<ProgressInfo>>>,
}

impl MemoryProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Копия истории обновлений
    pub fn history(&self) -> Vec<ProgressInfo> {
        lock(&self.history).clone()
    }

    /// Последнее обновление
    pub fn last(&self) -> Option<ProgressInfo> {
        lock(&self.history).last().cloned()
    }

    pub fn clear_history(&self) {
        lock(&self.history).clear();
    }
}

impl ProgressObserver for MemoryProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        lock(&self.history).push(progress);
    }
}

/// Наблюдатель, передающий обновления в ограниченный канал tokio
///
/// Конвейер не ждет получателя: при заполненном или закрытом канале
/// обновление отбрасывается и учитывается в `dropped()`.
pub struct ChannelProgressObserver {
    sender: mpsc::Sender<ProgressInfo>,
    dropped: AtomicUsize,
}

impl ChannelProgressObserver {
    /// Создать наблюдателя и приемный конец канала
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressInfo>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let observer = Self {
            sender,
            dropped: AtomicUsize::new(0),
        };
        (observer, receiver)
    }

    /// Сколько обновлений не удалось доставить
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl ProgressObserver for ChannelProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        if let Err(e) = self.sender.try_send(progress) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            log::debug!("Progress update not delivered: {}", e);
        }
    }
}

type ProgressCallback = Box<dyn Fn(&ProgressInfo) + Send + Sync>;

/// Наблюдатель, вызывающий замыкание на каждое обновление
pub struct CallbackProgressObserver {
    callback: ProgressCallback,
}

impl CallbackProgressObserver {
    pub fn new(callback: impl Fn(&ProgressInfo) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }
}

impl ProgressObserver for CallbackProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        (self.callback)(&progress);
    }
}

/// Прогресс-бар в stderr
///
/// Перерисовывается только при смене шага или целого процента.
pub struct ProgressBarObserver {
    width: usize,
    shown: Mutex<Option<(String, u32)>>,
}

impl ProgressBarObserver {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            shown: Mutex::new(None),
        }
    }

    fn render(&self, progress: &ProgressInfo) -> String {
        let fraction = (progress.total_progress / 100.0).clamp(0.0, 1.0);
        let filled = ((fraction * self.width as f32) as usize).min(self.width);
        format!(
            "[{}{}] {:>5.1}% {}",
            "#".repeat(filled),
            "-".repeat(self.width - filled),
            progress.total_progress,
            progress.step
        )
    }

    /// Нужно ли перерисовать бар для этого обновления
    fn should_redraw(&self, progress: &ProgressInfo) -> bool {
        let key = (progress.step.clone(), progress.total_progress.max(0.0) as u32);
        let mut shown = lock(&self.shown);
        if shown.as_ref() == Some(&key) {
            return false;
        }
        *shown = Some(key);
        true
    }
}

impl Default for ProgressBarObserver {
    fn default() -> Self {
        Self::new(40)
    }
}

impl ProgressObserver for ProgressBarObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        if !self.should_redraw(&progress) {
            return;
        }

        let mut stderr = io::stderr().lock();
        let finished = progress.total_progress >= 100.0;
        let tail = if finished { "\n" } else { "" };
        let _ = write!(stderr, "\r{}{}", self.render(&progress), tail);
        let _ = stderr.flush();
    }
}

/// Рассылка обновлений нескольким наблюдателям
#[derive(Default)]
pub struct CompositeProgressObserver {
    observers: Vec<Box<dyn ProgressObserver>>,
}

impl CompositeProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавить наблюдателя
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    /// То же, что `add_observer`, в стиле построителя
    pub fn with(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl ProgressObserver for CompositeProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        for observer in &self.observers {
            observer.on_progress_update(progress.clone());
        }
    }
}
