use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod services;
mod utils;

use config::{Config, CountingMode};
use services::{
    create_keyboard_listener,
    ColorBands,
    DiagnosticSink,
    EventRecorder,
    InputClassifier,
    OverlayDriver,
    RateEstimator,
    TerminalRenderer,
};

#[derive(Parser, Debug)]
#[command(name = "wpm-meter")]
#[command(about = "Скорость набора (WPM) в реальном времени по глобальным нажатиям клавиш")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "wpm.toml")]
    config: String,

    /// Режим сухого запуска (эмуляция набора вместо реальной клавиатуры)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (перекрывает значение из конфигурации)
    #[arg(long)]
    log_level: Option<String>,

    /// Считать завершённые слова вместо нажатий
    #[arg(long)]
    words: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let mut config = Config::load(&args.config)?;
    if args.words {
        config.counting.mode = CountingMode::Words;
    }
    let config = Arc::new(config);

    // Инициализация системы логирования
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Запуск WPM Meter v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    match config.counting.mode {
        CountingMode::Keystrokes => info!("Режим подсчёта нажатий: печатные символы + пробел/Enter"),
        CountingMode::Words => info!("Режим подсчёта слов: слово завершается пробелом/Enter"),
    }

    if args.dry_run {
        warn!("Режим сухого запуска - клавиатура эмулируется");
    } else {
        utils::permissions::check_permissions()?;
    }

    // Общее состояние: журнал событий разделяют слушатель и драйвер
    let recorder = Arc::new(EventRecorder::new(config.max_window_secs()));
    info!("Горизонт хранения событий: {:?}", recorder.retention());

    let diagnostics = DiagnosticSink::from_config(&config.diagnostics);

    let classifier = InputClassifier::new(Arc::clone(&recorder), config.counting.mode)
        .with_autorepeat(config.input.count_autorepeat)
        .with_diagnostics(diagnostics);

    let bands = ColorBands::new(config.color_bands()?)
        .ok_or_else(|| anyhow::anyhow!("Нужна хотя бы одна цветовая полоса"))?;
    let windows = [
        config.sampling.windows_secs[0],
        config.sampling.windows_secs[1],
        config.sampling.windows_secs[2],
    ];
    let estimator = RateEstimator::new(
        Arc::clone(&recorder),
        windows,
        bands,
        config.sampling.history_len,
    );

    let keyboard_listener = create_keyboard_listener(config.clone(), classifier, args.dry_run)?;
    let driver = OverlayDriver::new(
        estimator,
        Box::new(TerminalRenderer::stdout(config.render.sparkline_width, config.render.height)),
        tokio::time::Duration::from_millis(config.sampling.sample_interval_ms),
    );

    info!("Все компоненты инициализированы");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Запуск всех сервисов параллельно
    let listener_shutdown = shutdown_rx.clone();
    let keyboard_handle = tokio::spawn(async move {
        if let Err(e) = keyboard_listener.run(listener_shutdown).await {
            error!("Ошибка в KeyboardListener: {}", e);
        }
    });
    let driver_handle = tokio::spawn(async move {
        if let Err(e) = driver.run(shutdown_rx).await {
            error!("Ошибка в OverlayDriver: {}", e);
        }
    });

    info!("Все сервисы запущены");

    // Ожидание сигнала завершения
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Получен сигнал завершения (Ctrl+C)");
        }
        Err(err) => {
            error!("Ошибка при ожидании сигнала завершения: {}", err);
        }
    }

    info!("Завершение работы...");

    // Кооперативная остановка: сервисы сами выходят из циклов
    let _ = shutdown_tx.send(true);

    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        let _ = keyboard_handle.await;
        let _ = driver_handle.await;
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    // Завершаем строку состояния в терминале
    println!();
    info!("Событий в журнале при завершении: {}", recorder.len());
    info!("WPM Meter завершил работу");
    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    // Логи в stderr, чтобы не ломать строку состояния в stdout
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        "pretty" => registry
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
    }

    Ok(())
}
