//! Модуль для отслеживания прогресса выполнения операций
//!
//! Прогресс сборки передается наблюдателям явно: конвейер получает трекер
//! при создании и сообщает о каждом этапе через него, без перехвата логов.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Информация о прогрессе выполнения операции
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressInfo {
    /// Текущий этап операции
    pub step: String,
    /// Процент выполнения текущего этапа (0.0 - 100.0)
    pub step_progress: f32,
    /// Общий процент выполнения всей операции (0.0 - 100.0)
    pub total_progress: f32,
    /// Дополнительная информация о текущем этапе
    pub details: Option<String>,
}

impl ProgressInfo {
    /// Создает новый экземпляр ProgressInfo
    pub fn new(
        step: impl Into<String>,
        step_progress: f32,
        total_progress: f32,
        details: Option<String>,
    ) -> Self {
        Self {
            step: step.into(),
            step_progress: step_progress.clamp(0.0, 100.0),
            total_progress: total_progress.clamp(0.0, 100.0),
            details,
        }
    }
}

/// Трейт для наблюдателя, получающего уведомления о прогрессе
pub trait ProgressObserver: Send + Sync {
    /// Метод, вызываемый при обновлении прогресса
    fn on_progress_update(&self, progress: ProgressInfo);
}

/// Трейт для объекта, отправляющего уведомления о прогрессе
pub trait ProgressReporter: Send + Sync {
    /// Добавить наблюдателя, возвращает его идентификатор
    fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> usize;

    /// Удалить наблюдателя по идентификатору
    fn remove_observer(&mut self, id: usize) -> Option<Box<dyn ProgressObserver>>;

    /// Уведомить всех наблюдателей о прогрессе
    fn notify_progress(&self, progress: ProgressInfo);
}

/// Реализация ProgressReporter, синхронно вызывающая наблюдателей
pub struct DefaultProgressReporter {
    observers: RwLock<HashMap<usize, Box<dyn ProgressObserver>>>,
    next_id: AtomicUsize,
}

impl DefaultProgressReporter {
    /// Создать новый экземпляр DefaultProgressReporter
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(HashMap::new()),
            next_id: AtomicUsize::new(0),
        }
    }

    fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for DefaultProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for DefaultProgressReporter {
    fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> usize {
        let id = self.next_id();
        let observers = self.observers.get_mut().unwrap_or_else(|e| e.into_inner());
        observers.insert(id, observer);
        id
    }

    fn remove_observer(&mut self, id: usize) -> Option<Box<dyn ProgressObserver>> {
        let observers = self.observers.get_mut().unwrap_or_else(|e| e.into_inner());
        observers.remove(&id)
    }

    fn notify_progress(&self, progress: ProgressInfo) {
        let observers = self.observers.read().unwrap_or_else(|e| e.into_inner());
        for observer in observers.values() {
            observer.on_progress_update(progress.clone());
        }
    }
}

/// Репортер, публикующий прогресс в broadcast-канал Tokio
///
/// Подходит для удаленного наблюдателя: подписчик получает поток
/// `ProgressInfo`, не зависящий от логов процесса.
pub struct BroadcastProgressReporter {
    tx: broadcast::Sender<ProgressInfo>,
    inner: DefaultProgressReporter,
}

impl BroadcastProgressReporter {
    /// Создать репортер и первого подписчика
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<ProgressInfo>) {
        let (tx, rx) = broadcast::channel(capacity.max(1));
        let reporter = Self {
            tx,
            inner: DefaultProgressReporter::new(),
        };
        (reporter, rx)
    }

    /// Новый подписчик на обновления
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressInfo> {
        self.tx.subscribe()
    }
}

impl ProgressReporter for BroadcastProgressReporter {
    fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> usize {
        self.inner.add_observer(observer)
    }

    fn remove_observer(&mut self, id: usize) -> Option<Box<dyn ProgressObserver>> {
        self.inner.remove_observer(id)
    }

    fn notify_progress(&self, progress: ProgressInfo) {
        self.inner.notify_progress(progress.clone());
        // нет подписчиков - не ошибка
        if self.tx.send(progress).is_err() {
            log::trace!("Progress update dropped: no subscribers");
        }
    }
}

/// Этапы сборки видео
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStep {
    /// Загрузка изображений
    ImageAcquisition,
    /// Проверка входных данных
    Validation,
    /// Изменение темпа озвучки
    TempoAdjustment,
    /// Измерение длительности аудио
    AudioProbe,
    /// Извлечение и балансировка длительностей
    DurationAnalysis,
    /// Сборка видео из плейлиста и аудио
    VideoAssembly,
    /// Генерация субтитров
    SubtitleSynthesis,
    /// Вжигание субтитров
    SubtitleBurnIn,
}

impl BuildStep {
    /// Этапы сборки видео по порядку
    pub const BUILD: [BuildStep; 7] = [
        BuildStep::Validation,
        BuildStep::TempoAdjustment,
        BuildStep::AudioProbe,
        BuildStep::DurationAnalysis,
        BuildStep::VideoAssembly,
        BuildStep::SubtitleSynthesis,
        BuildStep::SubtitleBurnIn,
    ];

    /// Получить название этапа в виде строки
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImageAcquisition => "Загрузка изображений",
            Self::Validation => "Проверка входных данных",
            Self::TempoAdjustment => "Изменение темпа озвучки",
            Self::AudioProbe => "Измерение длительности аудио",
            Self::DurationAnalysis => "Расчет длительностей кадров",
            Self::VideoAssembly => "Сборка видео",
            Self::SubtitleSynthesis => "Генерация субтитров",
            Self::SubtitleBurnIn => "Вжигание субтитров",
        }
    }

    /// Весовой коэффициент этапа (в процентах от операции)
    pub fn weight(&self) -> f32 {
        match self {
            Self::ImageAcquisition => 100.0,
            Self::Validation => 2.0,
            Self::TempoAdjustment => 8.0,
            Self::AudioProbe => 2.0,
            Self::DurationAnalysis => 10.0,
            Self::VideoAssembly => 35.0,
            Self::SubtitleSynthesis => 8.0,
            Self::SubtitleBurnIn => 35.0,
        }
    }
}

struct TrackerState {
    plan: Vec<BuildStep>,
    current_step: BuildStep,
    step_progress: f32,
    total_progress: f32,
    completed_steps: HashMap<BuildStep, f32>,
}

impl TrackerState {
    fn new(plan: &[BuildStep]) -> Self {
        Self {
            plan: plan.to_vec(),
            current_step: plan.first().copied().unwrap_or(BuildStep::Validation),
            step_progress: 0.0,
            total_progress: 0.0,
            completed_steps: HashMap::new(),
        }
    }

    fn update_total_progress(&mut self) {
        let plan_weight: f32 = self.plan.iter().map(BuildStep::weight).sum();
        if plan_weight <= 0.0 {
            return;
        }

        let mut done = 0.0;
        for (step, progress) in &self.completed_steps {
            if *step != self.current_step {
                done += step.weight() * progress / 100.0;
            }
        }
        done += self.current_step.weight() * self.step_progress / 100.0;

        self.total_progress = (done / plan_weight * 100.0).clamp(0.0, 100.0);
    }

    fn snapshot(&self, details: Option<String>) -> ProgressInfo {
        ProgressInfo::new(
            self.current_step.as_str(),
            self.step_progress,
            self.total_progress,
            details,
        )
    }
}

/// Трекер прогресса для отслеживания выполнения сборки
pub struct ProgressTracker {
    reporter: Option<Box<dyn ProgressReporter>>,
    state: Mutex<TrackerState>,
}

impl ProgressTracker {
    /// Создать новый экземпляр ProgressTracker
    pub fn new() -> Self {
        Self {
            reporter: None,
            state: Mutex::new(TrackerState::new(&BuildStep::BUILD)),
        }
    }

    /// Создать новый экземпляр ProgressTracker с репортером
    pub fn with_reporter(reporter: Box<dyn ProgressReporter>) -> Self {
        let mut tracker = Self::new();
        tracker.reporter = Some(reporter);
        tracker
    }

    /// Установить репортер прогресса
    pub fn set_reporter(&mut self, reporter: Box<dyn ProgressReporter>) {
        self.reporter = Some(reporter);
    }

    /// Установлен ли репортер
    pub fn has_reporter(&self) -> bool {
        self.reporter.is_some()
    }

    /// Добавить наблюдателя
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> Option<usize> {
        self.reporter.as_mut().map(|reporter| reporter.add_observer(observer))
    }

    fn state(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Начать новую операцию с указанным набором этапов
    pub fn start(&self, plan: &[BuildStep]) {
        let snapshot = {
            let mut state = self.state();
            *state = TrackerState::new(plan);
            state.snapshot(None)
        };
        self.report(snapshot);
    }

    /// Установить текущий этап
    pub fn set_step(&self, step: BuildStep) {
        let snapshot = {
            let mut state = self.state();
            if state.current_step == step {
                return;
            }
            let previous = state.current_step;
            state.completed_steps.insert(previous, 100.0);
            state.current_step = step;
            state.step_progress = 0.0;
            state.update_total_progress();
            state.snapshot(None)
        };
        self.report(snapshot);
    }

    /// Обновить прогресс текущего этапа
    pub fn update_step_progress(&self, progress: f32, details: Option<String>) {
        let snapshot = {
            let mut state = self.state();
            state.step_progress = progress.clamp(0.0, 100.0);
            state.update_total_progress();
            state.snapshot(details)
        };
        self.report(snapshot);
    }

    /// Отметить завершение всей операции
    pub fn complete(&self) {
        let snapshot = {
            let mut state = self.state();
            let current = state.current_step;
            state.completed_steps.insert(current, 100.0);
            state.step_progress = 100.0;
            state.total_progress = 100.0;
            state.snapshot(Some("Процесс завершен".to_string()))
        };
        self.report(snapshot);
    }

    /// Текущий общий прогресс
    pub fn total_progress(&self) -> f32 {
        self.state().total_progress
    }

    fn report(&self, progress: ProgressInfo) {
        if let Some(reporter) = &self.reporter {
            reporter.notify_progress(progress);
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
