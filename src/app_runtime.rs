use std::sync::Arc;

use tauri::{Manager, RunEvent, WindowEvent};

use crate::{
    build_mode::BuildMode,
    exit_events,
    install_prompt::TauriInstallDialog,
    logging::{self, AppLog},
    main_window,
    release_feed::TauriReleaseFeed,
    update_coordinator::UpdateCoordinator,
    UpdatePolicy, MAIN_WINDOW_LABEL,
};

pub(crate) fn run() {
    tauri::Builder::default()
        // Must be registered first so a second launch exits before anything else starts.
        .plugin(tauri_plugin_single_instance::init(|app_handle, argv, _cwd| {
            let log = logging::app_logger(app_handle);
            log.info(&format!(
                "second launch intercepted ({} args); focusing existing window",
                argv.len()
            ));
            main_window::focus_main_window(app_handle, &log);
        }))
        .plugin(tauri_plugin_updater::Builder::new().build())
        .plugin(tauri_plugin_dialog::init())
        .invoke_handler(tauri::generate_handler![
            crate::update_bridge_commands::updates_check,
            crate::update_bridge_commands::updates_download,
            crate::update_bridge_commands::updates_quit_and_install,
            crate::update_bridge_commands::updates_get_state,
        ])
        .on_window_event(|window, event| {
            if window.label() != MAIN_WINDOW_LABEL {
                return;
            }
            if let WindowEvent::Destroyed = event {
                logging::app_logger(window.app_handle()).info("main window closed");
            }
        })
        .setup(|app| {
            let app_handle = app.handle().clone();
            let logger = logging::install_app_logger(&app_handle);
            app.manage(logger.clone());

            let mode = BuildMode::detect();
            logger.info(&format!(
                "desktop process starting: version={} build={}",
                app_handle.package_info().version,
                mode.as_str()
            ));

            main_window::ensure_main_window(&app_handle, &logger);

            let coordinator = Arc::new(UpdateCoordinator::new(
                mode,
                UpdatePolicy::default(),
                TauriReleaseFeed::new(app_handle.clone()),
                TauriInstallDialog::new(app_handle.clone()),
                app_handle.clone(),
                logger,
            ));
            app.manage(Arc::clone(&coordinator));
            coordinator.start();

            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| match event {
            RunEvent::ExitRequested { code, api, .. } => {
                exit_events::handle_exit_requested(app_handle, code, &api);
            }
            RunEvent::Exit => {
                exit_events::handle_exit_event(app_handle);
            }
            #[cfg(target_os = "macos")]
            RunEvent::Reopen {
                has_visible_windows,
                ..
            } => {
                exit_events::handle_reopen(app_handle, has_visible_windows);
            }
            _ => {}
        });
}
