use std::sync::Arc;

use tauri::{AppHandle, ExitRequestApi, Manager};

use crate::{
    logging::{app_logger, AppLog},
    main_window,
    update_coordinator::AppUpdateCoordinator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExitDecision {
    AllowExit,
    KeepRunningWithoutWindows,
}

/// macOS apps stay alive with zero windows until reactivated.
fn platform_keeps_running_without_windows() -> bool {
    cfg!(target_os = "macos")
}

/// `requested_code` is `None` when the exit comes from the last window closing
/// rather than an explicit quit or restart.
pub(crate) fn decide_exit(
    requested_code: Option<i32>,
    keeps_running_without_windows: bool,
) -> ExitDecision {
    if requested_code.is_none() && keeps_running_without_windows {
        ExitDecision::KeepRunningWithoutWindows
    } else {
        ExitDecision::AllowExit
    }
}

pub(crate) fn handle_exit_requested(
    app_handle: &AppHandle,
    requested_code: Option<i32>,
    api: &ExitRequestApi,
) {
    match decide_exit(requested_code, platform_keeps_running_without_windows()) {
        ExitDecision::KeepRunningWithoutWindows => {
            api.prevent_exit();
            app_logger(app_handle)
                .info("last window closed; staying alive until reactivated");
        }
        ExitDecision::AllowExit => {
            app_logger(app_handle).info(&format!(
                "exit requested (code {})",
                requested_code.map_or_else(|| "none".to_string(), |code| code.to_string())
            ));
        }
    }
}

pub(crate) fn handle_exit_event(app_handle: &AppHandle) {
    let log = app_logger(app_handle);
    if let Some(coordinator) = app_handle.try_state::<Arc<AppUpdateCoordinator>>() {
        if coordinator.install_on_quit() {
            log.info("deferred update handed to installer");
        }
    }
    log.info("desktop process exiting");
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub(crate) fn handle_reopen(app_handle: &AppHandle, has_visible_windows: bool) {
    if has_visible_windows {
        return;
    }
    let log = app_logger(app_handle);
    main_window::focus_main_window(app_handle, &log);
}
