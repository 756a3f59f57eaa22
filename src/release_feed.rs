use std::future::Future;

use tauri::AppHandle;
use tauri_plugin_updater::{Update, UpdaterExt};

use crate::{update_session::ReleaseInfo, UpdateError};

/// Boundary to the release feed and the platform installer.
pub(crate) trait ReleaseFeed: Send + Sync + 'static {
    type Release: Send + Sync + 'static;

    fn check(&self) -> impl Future<Output = Result<Option<Self::Release>, UpdateError>> + Send;

    fn describe(&self, release: &Self::Release) -> ReleaseInfo;

    /// `on_progress` receives the size of each chunk and the total size when known.
    fn download<P>(
        &self,
        release: &Self::Release,
        on_progress: P,
    ) -> impl Future<Output = Result<Vec<u8>, UpdateError>> + Send
    where
        P: FnMut(u64, Option<u64>) + Send;

    fn install(&self, release: &Self::Release, bytes: &[u8]) -> Result<(), UpdateError>;

    fn relaunch(&self);
}

pub(crate) struct TauriReleaseFeed {
    app_handle: AppHandle,
}

impl TauriReleaseFeed {
    pub(crate) fn new(app_handle: AppHandle) -> Self {
        Self { app_handle }
    }
}

impl ReleaseFeed for TauriReleaseFeed {
    type Release = Update;

    async fn check(&self) -> Result<Option<Update>, UpdateError> {
        let updater = self.app_handle.updater().map_err(|error| {
            UpdateError::FeedUnreachable(format!("failed to initialize updater: {error}"))
        })?;
        updater
            .check()
            .await
            .map_err(|error| UpdateError::FeedUnreachable(error.to_string()))
    }

    fn describe(&self, release: &Update) -> ReleaseInfo {
        ReleaseInfo {
            version: release.version.clone(),
            current_version: release.current_version.clone(),
            notes: release.body.clone(),
            date: release.date.map(|date| date.to_string()),
        }
    }

    async fn download<P>(&self, release: &Update, mut on_progress: P) -> Result<Vec<u8>, UpdateError>
    where
        P: FnMut(u64, Option<u64>) + Send,
    {
        release
            .download(move |chunk, total| on_progress(chunk as u64, total), || {})
            .await
            .map_err(|error| UpdateError::DownloadFailed(error.to_string()))
    }

    fn install(&self, release: &Update, bytes: &[u8]) -> Result<(), UpdateError> {
        release
            .install(bytes)
            .map_err(|error| UpdateError::InstallFailed(error.to_string()))
    }

    fn relaunch(&self) {
        self.app_handle.request_restart();
    }
}
