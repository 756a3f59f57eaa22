use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder};

use crate::{
    logging::AppLog, renderer_bridge::UPDATES_BRIDGE_SCRIPT, MAIN_WINDOW_HEIGHT,
    MAIN_WINDOW_LABEL, MAIN_WINDOW_MIN_HEIGHT, MAIN_WINDOW_MIN_WIDTH, MAIN_WINDOW_PAGE,
    MAIN_WINDOW_TITLE, MAIN_WINDOW_WIDTH,
};

pub(crate) fn should_create_main_window(open_windows: usize) -> bool {
    open_windows == 0
}

fn create_main_window(app_handle: &AppHandle) -> tauri::Result<WebviewWindow> {
    let mut builder = WebviewWindowBuilder::new(
        app_handle,
        MAIN_WINDOW_LABEL,
        WebviewUrl::App(MAIN_WINDOW_PAGE.into()),
    )
    .title(MAIN_WINDOW_TITLE)
    .inner_size(MAIN_WINDOW_WIDTH, MAIN_WINDOW_HEIGHT)
    .min_inner_size(MAIN_WINDOW_MIN_WIDTH, MAIN_WINDOW_MIN_HEIGHT)
    .initialization_script(UPDATES_BRIDGE_SCRIPT);

    if let Some(icon) = app_handle.default_window_icon() {
        builder = builder.icon(icon.clone())?;
    }

    builder.build()
}

/// Creates the main window when no window is open. Returns whether a window
/// was created.
pub(crate) fn ensure_main_window<L>(app_handle: &AppHandle, log: &L) -> bool
where
    L: AppLog,
{
    let open_windows = app_handle.webview_windows().len();
    if !should_create_main_window(open_windows) {
        return false;
    }

    match create_main_window(app_handle) {
        Ok(_) => {
            log.info("main window created");
            true
        }
        Err(error) => {
            log.error(&format!("failed to create main window: {error}"));
            false
        }
    }
}

/// What a second launch does to the main window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FocusAction {
    Create,
    RestoreAndFocus,
    Focus,
}

pub(crate) fn decide_focus(window_exists: bool, minimized: bool) -> FocusAction {
    match (window_exists, minimized) {
        (false, _) => FocusAction::Create,
        (true, true) => FocusAction::RestoreAndFocus,
        (true, false) => FocusAction::Focus,
    }
}

pub(crate) fn focus_main_window<L>(app_handle: &AppHandle, log: &L)
where
    L: AppLog,
{
    let window = app_handle.get_webview_window(MAIN_WINDOW_LABEL);
    let minimized = window
        .as_ref()
        .is_some_and(|window| matches!(window.is_minimized(), Ok(true)));

    let window = match (decide_focus(window.is_some(), minimized), window) {
        (FocusAction::Create, _) | (_, None) => {
            ensure_main_window(app_handle, log);
            return;
        }
        (FocusAction::RestoreAndFocus, Some(window)) => {
            if let Err(error) = window.unminimize() {
                log.warn(&format!("failed to restore main window: {error}"));
            }
            window
        }
        (FocusAction::Focus, Some(window)) => window,
    };

    if let Err(error) = window.show() {
        log.warn(&format!("failed to show main window: {error}"));
    }
    if let Err(error) = window.set_focus() {
        log.warn(&format!("failed to focus main window: {error}"));
    }
}
