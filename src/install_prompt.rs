use std::future::Future;

use tauri::{AppHandle, Manager};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};

use crate::{
    update_session::ReleaseInfo, INSTALL_PROMPT_LATER_BUTTON, INSTALL_PROMPT_RESTART_BUTTON,
    INSTALL_PROMPT_TITLE, MAIN_WINDOW_LABEL,
};

const RESTART_BUTTON_INDEX: usize = 0;
const LATER_BUTTON_INDEX: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InstallChoice {
    InstallNow,
    Defer,
}

impl InstallChoice {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::InstallNow => "restart now",
            Self::Defer => "later",
        }
    }
}

/// Contents of the modal shown once an update has been downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InstallPrompt {
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) detail: String,
    pub(crate) buttons: [&'static str; 2],
    pub(crate) default_id: usize,
    pub(crate) cancel_id: usize,
}

impl InstallPrompt {
    pub(crate) fn for_release(info: &ReleaseInfo) -> Self {
        Self {
            title: INSTALL_PROMPT_TITLE.to_string(),
            message: format!("Se descargó la versión {}.", info.version),
            detail: format!(
                "Elige \"{}\" para instalarla ahora o \"{}\" para instalarla al cerrar la \
                 aplicación. (Versión actual: {})",
                INSTALL_PROMPT_RESTART_BUTTON, INSTALL_PROMPT_LATER_BUTTON, info.current_version
            ),
            buttons: [INSTALL_PROMPT_RESTART_BUTTON, INSTALL_PROMPT_LATER_BUTTON],
            default_id: RESTART_BUTTON_INDEX,
            cancel_id: LATER_BUTTON_INDEX,
        }
    }

    pub(crate) fn choice_for_response(&self, response: usize) -> InstallChoice {
        if response == RESTART_BUTTON_INDEX {
            InstallChoice::InstallNow
        } else {
            InstallChoice::Defer
        }
    }

    fn body(&self) -> String {
        format!("{}\n\n{}", self.message, self.detail)
    }
}

pub(crate) trait InstallConfirmation: Send + Sync + 'static {
    fn confirm(&self, prompt: &InstallPrompt) -> impl Future<Output = InstallChoice> + Send;
}

pub(crate) struct TauriInstallDialog {
    app_handle: AppHandle,
}

impl TauriInstallDialog {
    pub(crate) fn new(app_handle: AppHandle) -> Self {
        Self { app_handle }
    }
}

impl TauriInstallDialog {
    fn show(&self, prompt: &InstallPrompt, on_answer: tokio::sync::oneshot::Sender<bool>) {
        let mut builder = self
            .app_handle
            .dialog()
            .message(prompt.body())
            .title(prompt.title.clone())
            .kind(MessageDialogKind::Info)
            .buttons(MessageDialogButtons::OkCancelCustom(
                prompt.buttons[RESTART_BUTTON_INDEX].to_string(),
                prompt.buttons[LATER_BUTTON_INDEX].to_string(),
            ));
        if let Some(window) = self.app_handle.get_webview_window(MAIN_WINDOW_LABEL) {
            builder = builder.parent(&window);
        }
        builder.show(move |confirmed| {
            let _ = on_answer.send(confirmed);
        });
    }
}

impl InstallConfirmation for TauriInstallDialog {
    async fn confirm(&self, prompt: &InstallPrompt) -> InstallChoice {
        let (sender, receiver) = tokio::sync::oneshot::channel();
        self.show(prompt, sender);

        // A dropped callback counts as dismissing the dialog.
        let response = match receiver.await {
            Ok(true) => prompt.default_id,
            Ok(false) | Err(_) => prompt.cancel_id,
        };
        prompt.choice_for_response(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release() -> ReleaseInfo {
        ReleaseInfo {
            version: "2.3.0".to_string(),
            current_version: "2.2.1".to_string(),
            notes: Some("Bug fixes".to_string()),
            date: None,
        }
    }

    #[test]
    fn prompt_offers_restart_then_later() {
        let prompt = InstallPrompt::for_release(&release());
        assert_eq!(prompt.buttons, ["Restart now", "Later"]);
        assert_eq!(prompt.default_id, 0);
        assert_eq!(prompt.cancel_id, 1);
        assert!(prompt.message.contains("2.3.0"));
        assert!(prompt.detail.contains("2.2.1"));
    }

    #[test]
    fn prompt_text_is_spanish_and_names_both_buttons() {
        let prompt = InstallPrompt::for_release(&release());
        assert_eq!(prompt.title, "Actualización lista");
        assert_eq!(prompt.message, "Se descargó la versión 2.3.0.");
        assert!(prompt.detail.contains("\"Restart now\""));
        assert!(prompt.detail.contains("\"Later\""));
        assert!(prompt.detail.contains("Versión actual: 2.2.1"));
    }

    #[test]
    fn only_first_button_installs() {
        let prompt = InstallPrompt::for_release(&release());
        assert_eq!(prompt.choice_for_response(0), InstallChoice::InstallNow);
        assert_eq!(prompt.choice_for_response(1), InstallChoice::Defer);
        assert_eq!(prompt.choice_for_response(7), InstallChoice::Defer);
    }
}
