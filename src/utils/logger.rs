use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

const DEFAULT_FILTER: &str = "warn,reel_sync=info";

pub fn init_logger() {
    // Установка базового фильтра и переопределение через переменные окружения
    let env = Env::default().filter_or("RUST_LOG", DEFAULT_FILTER);

    let mut builder = Builder::from_env(env);

    // Явно подавляем логи от определенных модулей
    builder
        .filter_module("mio", LevelFilter::Error)
        .filter_module("hyper", LevelFilter::Error)
        .filter_module("hyper_util", LevelFilter::Error)
        .filter_module("rustls", LevelFilter::Warn)
        // Форматирование логов
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr);

    // Повторная инициализация (например, в тестах) не считается ошибкой
    if let Err(e) = builder.try_init() {
        eprintln!("Logger already initialized: {}", e);
    }
}
