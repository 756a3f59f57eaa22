use std::time::Duration;

pub(crate) const MAIN_WINDOW_LABEL: &str = "main";
pub(crate) const MAIN_WINDOW_PAGE: &str = "index.html";
pub(crate) const MAIN_WINDOW_TITLE: &str = "Operaciones CE";
pub(crate) const MAIN_WINDOW_WIDTH: f64 = 1280.0;
pub(crate) const MAIN_WINDOW_HEIGHT: f64 = 800.0;
pub(crate) const MAIN_WINDOW_MIN_WIDTH: f64 = 1100.0;
pub(crate) const MAIN_WINDOW_MIN_HEIGHT: f64 = 700.0;

pub(crate) const UPDATE_CHECK_INTERVAL: Duration = Duration::from_secs(4 * 60 * 60);

pub(crate) const UPDATES_STATUS_EVENT: &str = "updates:status";
pub(crate) const UPDATES_PROGRESS_EVENT: &str = "updates:progress";
pub(crate) const UPDATES_DOWNLOADED_EVENT: &str = "updates:downloaded";
pub(crate) const UPDATES_ERROR_EVENT: &str = "updates:error";

pub(crate) const INSTALL_PROMPT_TITLE: &str = "Actualización lista";
pub(crate) const INSTALL_PROMPT_RESTART_BUTTON: &str = "Restart now";
pub(crate) const INSTALL_PROMPT_LATER_BUTTON: &str = "Later";
