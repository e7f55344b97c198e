use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_appender::non_blocking::WorkerGuard;
use anyhow::Result;
use crate::config::LoggingSettings;

/// Initializes the logging system for the application
///
/// This function sets up the logging subscriber and layers based on the provided configuration
/// It logs to the console on stderr, leaving stdout to the operator prompt, and to a log file when a directory is configured
/// The log file is named `iqx-doorbus_{current_date}.log` and is located in the specified directory
/// The logging level is determined from the environment variable `RUST_LOG` or defaults to the configured level
///
/// # Arguments
///
/// * `settings`: The logging settings; `path` is the optional directory for the log file
///
/// # Returns
///
/// * `Ok(Some(WorkerGuard))`: If logging is initialized successfully with a file appender, the `WorkerGuard` is returned
/// * `Ok(None)`: If logging is initialized successfully without a file appender (console only)
/// * `Err(anyhow::Error)`: If there's an error initializing the logging system
pub fn init_logger(settings: &LoggingSettings) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))?;

    let format = fmt::format()
        .with_timer(fmt::time::LocalTime::rfc_3339())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if let Some(path) = settings.path.clone() {
        std::fs::create_dir_all(&path)?;

        let file_name = log_file_name();
        let file_appender = RollingFileAppender::new(Rotation::NEVER, &path, &file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = fmt::Layer::default()
            .event_format(format.clone())
            .with_writer(non_blocking);

        let console_layer = fmt::Layer::default()
            .event_format(format.with_ansi(true))
            .with_writer(std::io::stderr);

        let subscriber = subscriber.with(file_layer).with(console_layer);
        tracing::subscriber::set_global_default(subscriber)?;

        tracing::info!("Logging initialized successfully, writing to {}", path.join(file_name).display());
        Ok(Some(guard))
    } else {
        let console_layer = fmt::Layer::default()
            .event_format(format.with_ansi(true))
            .with_writer(std::io::stderr);

        let subscriber = subscriber.with(console_layer);
        tracing::subscriber::set_global_default(subscriber)?;

        tracing::info!("Logging initialized successfully (console only)");
        Ok(None)
    }
}

fn log_file_name() -> PathBuf {
    PathBuf::from(format!(
        "iqx-doorbus_{}.log",
        chrono::Local::now().format("%Y-%m-%d")
    ))
}
