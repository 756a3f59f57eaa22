#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app_constants;
mod app_runtime;
mod app_types;
mod build_mode;
mod exit_events;
mod install_prompt;
mod logging;
mod main_window;
mod release_feed;
mod renderer_bridge;
mod update_bridge_commands;
mod update_coordinator;
mod update_error;
mod update_session;

pub(crate) use app_constants::*;
pub(crate) use app_types::{AtomicFlagGuard, BridgeResult, UpdatePolicy};
pub(crate) use update_error::{UpdateError, UpdateErrorPayload};

fn main() {
    app_runtime::run();
}
