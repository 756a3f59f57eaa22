//! Status/error sink shared by the bootstrap and the update coordinator.
//!
//! The rich sink is the `log` facade backed by `tauri-plugin-log`. When that
//! plugin cannot be installed (for instance because another global logger is
//! already registered) the app falls back to [`ConsoleLog`], which keeps the
//! same three-method contract.

use tauri::{AppHandle, Manager};
use tauri_plugin_log::{Target, TargetKind};

const LOG_TARGET: &str = "operaciones_ce";

pub(crate) trait AppLog: Send + Sync + 'static {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsoleLevel {
    Info,
    Warn,
    Error,
}

impl ConsoleLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ConsoleLog {
    scope: &'static str,
}

impl ConsoleLog {
    pub(crate) fn new(scope: &'static str) -> Self {
        Self { scope }
    }

    fn format_line(&self, level: ConsoleLevel, message: &str) -> String {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        format!("[{timestamp}] [{}] [{}] {message}", level.as_str(), self.scope)
    }
}

impl AppLog for ConsoleLog {
    fn info(&self, message: &str) {
        println!("{}", self.format_line(ConsoleLevel::Info, message));
    }

    fn warn(&self, message: &str) {
        eprintln!("{}", self.format_line(ConsoleLevel::Warn, message));
    }

    fn error(&self, message: &str) {
        eprintln!("{}", self.format_line(ConsoleLevel::Error, message));
    }
}

#[derive(Debug, Clone)]
pub(crate) enum AppLogger {
    Facade,
    Console(ConsoleLog),
}

impl AppLog for AppLogger {
    fn info(&self, message: &str) {
        match self {
            Self::Facade => log::info!(target: LOG_TARGET, "{message}"),
            Self::Console(console) => console.info(message),
        }
    }

    fn warn(&self, message: &str) {
        match self {
            Self::Facade => log::warn!(target: LOG_TARGET, "{message}"),
            Self::Console(console) => console.warn(message),
        }
    }

    fn error(&self, message: &str) {
        match self {
            Self::Facade => log::error!(target: LOG_TARGET, "{message}"),
            Self::Console(console) => console.error(message),
        }
    }
}

fn log_level() -> log::LevelFilter {
    if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
}

/// Registers `tauri-plugin-log` and returns the matching sink, or the console
/// shim when registration fails.
pub(crate) fn install_app_logger(app_handle: &AppHandle) -> AppLogger {
    let plugin = tauri_plugin_log::Builder::new()
        .level(log_level())
        .targets([
            Target::new(TargetKind::Stdout),
            Target::new(TargetKind::Webview),
            Target::new(TargetKind::LogDir { file_name: None }),
        ])
        .build();

    logger_for_registration(app_handle.plugin(plugin))
}

fn logger_for_registration<E>(registered: Result<(), E>) -> AppLogger
where
    E: std::fmt::Display,
{
    match registered {
        Ok(()) => AppLogger::Facade,
        Err(error) => {
            let console = ConsoleLog::new("desktop");
            console.warn(&format!(
                "structured logger unavailable, falling back to console: {error}"
            ));
            AppLogger::Console(console)
        }
    }
}

/// Sink registered during setup, or the console shim before setup has run.
pub(crate) fn app_logger(app_handle: &AppHandle) -> AppLogger {
    app_handle
        .try_state::<AppLogger>()
        .map(|logger| logger.inner().clone())
        .unwrap_or_else(|| AppLogger::Console(ConsoleLog::new("desktop")))
}
