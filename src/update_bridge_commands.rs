use std::sync::Arc;

use tauri::{AppHandle, Manager};

use crate::{
    update_coordinator::{AppUpdateCoordinator, CheckTrigger},
    update_session::{SessionSnapshot, UpdateSession},
    BridgeResult, UpdateError,
};

fn enabled_coordinator(app_handle: &AppHandle) -> Result<Arc<AppUpdateCoordinator>, BridgeResult> {
    let Some(coordinator) = app_handle.try_state::<Arc<AppUpdateCoordinator>>() else {
        return Err(BridgeResult::rejected("Update coordinator is not ready."));
    };
    if !coordinator.is_enabled() {
        return Err(BridgeResult::rejected(UpdateError::Disabled.to_string()));
    }
    Ok(Arc::clone(coordinator.inner()))
}

#[tauri::command]
pub(crate) fn updates_check(app_handle: AppHandle) -> BridgeResult {
    let coordinator = match enabled_coordinator(&app_handle) {
        Ok(coordinator) => coordinator,
        Err(rejected) => return rejected,
    };

    // Results reach the page through the status and error streams.
    tauri::async_runtime::spawn(async move {
        let _ = coordinator.run_check_cycle(CheckTrigger::OnDemand).await;
    });
    BridgeResult::accepted()
}

#[tauri::command]
pub(crate) fn updates_download(app_handle: AppHandle) -> BridgeResult {
    let coordinator = match enabled_coordinator(&app_handle) {
        Ok(coordinator) => coordinator,
        Err(rejected) => return rejected,
    };

    tauri::async_runtime::spawn(async move {
        let _ = coordinator.request_download().await;
    });
    BridgeResult::accepted()
}

#[tauri::command]
pub(crate) async fn updates_quit_and_install(app_handle: AppHandle) -> BridgeResult {
    let coordinator = match enabled_coordinator(&app_handle) {
        Ok(coordinator) => coordinator,
        Err(rejected) => return rejected,
    };

    let installed =
        tauri::async_runtime::spawn_blocking(move || coordinator.quit_and_install()).await;
    install_result(installed)
}

fn install_result<E>(installed: Result<Result<(), UpdateError>, E>) -> BridgeResult
where
    E: std::fmt::Display,
{
    match installed {
        Ok(Ok(())) => BridgeResult::accepted(),
        Ok(Err(error)) => BridgeResult::rejected(error.to_string()),
        Err(error) => BridgeResult::rejected(format!("Update install task failed: {error}")),
    }
}

#[tauri::command]
pub(crate) fn updates_get_state(app_handle: AppHandle) -> SessionSnapshot {
    app_handle
        .try_state::<Arc<AppUpdateCoordinator>>()
        .map(|coordinator| coordinator.snapshot())
        .unwrap_or_else(|| UpdateSession::default().snapshot())
}
