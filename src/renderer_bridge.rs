use tauri::{AppHandle, Emitter};

use crate::{
    update_session::{DownloadProgress, ReleaseInfo, UpdatePhase},
    UpdateErrorPayload, UPDATES_DOWNLOADED_EVENT, UPDATES_ERROR_EVENT, UPDATES_PROGRESS_EVENT,
    UPDATES_STATUS_EVENT,
};

/// Injected into the main window before the page loads; defines `window.updates`.
pub(crate) const UPDATES_BRIDGE_SCRIPT: &str = include_str!("bridge/updates.js");

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BridgeEvent {
    Status(UpdatePhase),
    Progress(DownloadProgress),
    Downloaded(ReleaseInfo),
    Error(UpdateErrorPayload),
}

impl BridgeEvent {
    pub(crate) fn channel(&self) -> &'static str {
        match self {
            Self::Status(_) => UPDATES_STATUS_EVENT,
            Self::Progress(_) => UPDATES_PROGRESS_EVENT,
            Self::Downloaded(_) => UPDATES_DOWNLOADED_EVENT,
            Self::Error(_) => UPDATES_ERROR_EVENT,
        }
    }
}

pub(crate) trait BridgeEmitter: Send + Sync + 'static {
    fn emit_bridge(&self, event: &BridgeEvent) -> Result<(), String>;
}

impl BridgeEmitter for AppHandle {
    fn emit_bridge(&self, event: &BridgeEvent) -> Result<(), String> {
        let channel = event.channel();
        let result = match event {
            BridgeEvent::Status(phase) => self.emit(channel, phase.as_str()),
            BridgeEvent::Progress(progress) => self.emit(channel, progress),
            BridgeEvent::Downloaded(info) => self.emit(channel, info),
            BridgeEvent::Error(payload) => self.emit(channel, payload),
        };
        result.map_err(|error| format!("failed to emit {channel}: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_script_listens_on_every_update_channel() {
        for channel in [
            UPDATES_STATUS_EVENT,
            UPDATES_PROGRESS_EVENT,
            UPDATES_DOWNLOADED_EVENT,
            UPDATES_ERROR_EVENT,
        ] {
            assert!(
                UPDATES_BRIDGE_SCRIPT.contains(&format!("'{channel}'")),
                "bridge script does not subscribe to {channel}"
            );
        }
    }

    #[test]
    fn bridge_script_invokes_every_update_command() {
        for command in [
            "updates_check",
            "updates_download",
            "updates_quit_and_install",
            "updates_get_state",
        ] {
            assert!(
                UPDATES_BRIDGE_SCRIPT.contains(&format!("'{command}'")),
                "bridge script does not invoke {command}"
            );
        }
    }

    #[test]
    fn bridge_script_replaces_listener_on_resubscribe() {
        let suite = concat!(env!("CARGO_MANIFEST_DIR"), "/src/bridge/updates.test.mjs");
        let output = match std::process::Command::new("node")
            .arg("--test")
            .arg(suite)
            .output()
        {
            Ok(output) => output,
            Err(error) => {
                eprintln!("skipping bridge script suite, node unavailable: {error}");
                return;
            }
        };

        assert!(
            output.status.success(),
            "bridge script suite failed:\n{}",
            String::from_utf8_lossy(&output.stdout)
        );
    }

    #[test]
    fn events_map_to_fixed_channels() {
        assert_eq!(
            BridgeEvent::Status(UpdatePhase::Checking).channel(),
            "updates:status"
        );
        assert_eq!(
            BridgeEvent::Progress(DownloadProgress::from_bytes(0, None)).channel(),
            "updates:progress"
        );
    }
}
