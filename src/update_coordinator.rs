//! Drives the check → download → confirm → install cycle.
//!
//! Every feed event goes through [`UpdateCoordinator::dispatch`], which applies
//! it to the session, logs the transition and mirrors the resulting events to
//! the renderer bridge. Session locks are never held across an `.await`.

use std::sync::{atomic::AtomicBool, Arc, Mutex, MutexGuard, PoisonError};

use tokio::time::MissedTickBehavior;

use crate::{
    build_mode::BuildMode,
    install_prompt::{InstallChoice, InstallConfirmation, InstallPrompt, TauriInstallDialog},
    logging::{AppLog, AppLogger},
    release_feed::{ReleaseFeed, TauriReleaseFeed},
    renderer_bridge::BridgeEmitter,
    update_session::{
        DownloadProgress, FeedEvent, ReleaseInfo, SessionSnapshot, UpdatePhase, UpdateSession,
    },
    AtomicFlagGuard, UpdateError, UpdatePolicy,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CheckTrigger {
    Scheduled,
    OnDemand,
}

impl CheckTrigger {
    fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::OnDemand => "on-demand",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CheckOutcome {
    Disabled,
    AlreadyRunning,
    AlreadyStaged(ReleaseInfo),
    UpToDate,
    Available(ReleaseInfo),
    Downloaded(ReleaseInfo),
}

pub(crate) type AppUpdateCoordinator =
    UpdateCoordinator<TauriReleaseFeed, TauriInstallDialog, tauri::AppHandle, AppLogger>;

enum FeedAnswer {
    Found(ReleaseInfo),
    UpToDate,
    StillStaged(ReleaseInfo),
}

struct DetectedUpdate<R> {
    release: Arc<R>,
    info: ReleaseInfo,
}

struct StagedUpdate<R> {
    release: Arc<R>,
    bytes: Arc<Vec<u8>>,
    info: ReleaseInfo,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct UpdateCoordinator<F: ReleaseFeed, D, E, L> {
    mode: BuildMode,
    policy: UpdatePolicy,
    feed: F,
    dialog: D,
    bridge: E,
    log: L,
    session: Mutex<UpdateSession>,
    detected: Mutex<Option<DetectedUpdate<F::Release>>>,
    staged: Mutex<Option<StagedUpdate<F::Release>>>,
    cycle_in_flight: AtomicBool,
    prompt_open: AtomicBool,
}

impl<F, D, E, L> UpdateCoordinator<F, D, E, L>
where
    F: ReleaseFeed,
    D: InstallConfirmation,
    E: BridgeEmitter,
    L: AppLog,
{
    pub(crate) fn new(
        mode: BuildMode,
        policy: UpdatePolicy,
        feed: F,
        dialog: D,
        bridge: E,
        log: L,
    ) -> Self {
        Self {
            mode,
            policy,
            feed,
            dialog,
            bridge,
            log,
            session: Mutex::new(UpdateSession::default()),
            detected: Mutex::new(None),
            staged: Mutex::new(None),
            cycle_in_flight: AtomicBool::new(false),
            prompt_open: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.mode.is_packaged()
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        lock(&self.session).snapshot()
    }

    /// Spawns the periodic check loop. Returns `false` in development builds,
    /// where nothing is scheduled.
    pub(crate) fn start(self: &Arc<Self>) -> bool {
        if !self.mode.is_packaged() {
            self.log
                .info("auto-update disabled: development build has no release feed");
            return false;
        }

        self.log.info(&format!(
            "auto-update enabled: checking now and every {} minutes",
            self.policy.check_interval.as_secs() / 60
        ));
        let coordinator = Arc::clone(self);
        tauri::async_runtime::spawn(async move {
            coordinator.run_periodic_checks().await;
        });
        true
    }

    pub(crate) async fn run_periodic_checks(&self) {
        let mut ticker = tokio::time::interval(self.policy.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            // Failures were already logged and forwarded; the next tick retries.
            let _ = self.run_check_cycle(CheckTrigger::Scheduled).await;
        }
    }

    pub(crate) async fn run_check_cycle(
        &self,
        trigger: CheckTrigger,
    ) -> Result<CheckOutcome, UpdateError> {
        self.cycle(trigger, self.policy.auto_download).await
    }

    /// Downloads the release found by the last check, or checks first when
    /// nothing is waiting.
    pub(crate) async fn request_download(&self) -> Result<CheckOutcome, UpdateError> {
        self.cycle(CheckTrigger::OnDemand, true).await
    }

    pub(crate) fn quit_and_install(&self) -> Result<(), UpdateError> {
        if !self.mode.is_packaged() {
            return Err(UpdateError::Disabled);
        }

        let (release, bytes, info) = {
            let staged = lock(&self.staged);
            let staged = staged.as_ref().ok_or(UpdateError::NothingStaged)?;
            (
                Arc::clone(&staged.release),
                Arc::clone(&staged.bytes),
                staged.info.clone(),
            )
        };

        self.log
            .info(&format!("installing update {} and relaunching", info.version));
        if let Err(error) = self.feed.install(&release, &bytes) {
            self.dispatch(FeedEvent::Error(error.clone()));
            return Err(error);
        }

        lock(&self.staged).take();
        self.feed.relaunch();
        Ok(())
    }

    /// Installs an update that was downloaded but deferred. Called while the
    /// process exits.
    pub(crate) fn install_on_quit(&self) -> bool {
        if !self.mode.is_packaged() || !self.policy.auto_install_on_quit {
            return false;
        }
        let Some(staged) = lock(&self.staged).take() else {
            return false;
        };

        self.log.info(&format!(
            "installing deferred update {} on quit",
            staged.info.version
        ));
        match self.feed.install(&staged.release, &staged.bytes) {
            Ok(()) => true,
            Err(error) => {
                self.log.error(&format!("install on quit failed: {error}"));
                false
            }
        }
    }

    async fn cycle(
        &self,
        trigger: CheckTrigger,
        download_when_found: bool,
    ) -> Result<CheckOutcome, UpdateError> {
        if !self.mode.is_packaged() {
            self.log.info(&format!(
                "{} update check skipped: development build",
                trigger.as_str()
            ));
            return Ok(CheckOutcome::Disabled);
        }

        let info = {
            let Some(_in_flight) = AtomicFlagGuard::try_set(&self.cycle_in_flight) else {
                self.log.info(&format!(
                    "{} update check skipped: another check is in flight",
                    trigger.as_str()
                ));
                return Ok(CheckOutcome::AlreadyRunning);
            };

            let answer = match self.awaiting_download() {
                Some(info) if download_when_found => FeedAnswer::Found(info),
                _ => self.check_feed(trigger).await?,
            };
            let found = match answer {
                FeedAnswer::Found(info) => info,
                FeedAnswer::UpToDate => return Ok(CheckOutcome::UpToDate),
                FeedAnswer::StillStaged(info) => return Ok(CheckOutcome::AlreadyStaged(info)),
            };
            if !download_when_found {
                return Ok(CheckOutcome::Available(found));
            }
            self.download_detected().await?
        };

        self.prompt_install(&info).await;
        Ok(CheckOutcome::Downloaded(info))
    }

    fn staged_info(&self) -> Option<ReleaseInfo> {
        lock(&self.staged).as_ref().map(|staged| staged.info.clone())
    }

    fn awaiting_download(&self) -> Option<ReleaseInfo> {
        if lock(&self.session).phase() != UpdatePhase::Available {
            return None;
        }
        lock(&self.detected)
            .as_ref()
            .map(|detected| detected.info.clone())
    }

    /// Queries the feed. While an update is staged, an answer offering the
    /// same version (or nothing) keeps it staged and re-announces it.
    async fn check_feed(&self, trigger: CheckTrigger) -> Result<FeedAnswer, UpdateError> {
        let staged = self.staged_info();
        match &staged {
            Some(staged) => self.log.info(&format!(
                "{} update check started ({} is already downloaded)",
                trigger.as_str(),
                staged.version
            )),
            None => self
                .log
                .info(&format!("{} update check started", trigger.as_str())),
        }
        self.dispatch(FeedEvent::CheckingForUpdate);

        let checked = self.feed.check().await;
        let release = match checked {
            Ok(release) => release,
            Err(error) => {
                self.dispatch(FeedEvent::Error(error.clone()));
                return Err(error);
            }
        };

        let release = release.map(|release| {
            let info = self.feed.describe(&release);
            (release, info)
        });
        match (release, staged) {
            (Some((_, info)), Some(staged)) if info.version == staged.version => {
                self.dispatch(FeedEvent::StagedRetained(staged.clone()));
                Ok(FeedAnswer::StillStaged(staged))
            }
            (None, Some(staged)) => {
                self.dispatch(FeedEvent::StagedRetained(staged.clone()));
                Ok(FeedAnswer::StillStaged(staged))
            }
            (Some((release, info)), _) => {
                *lock(&self.detected) = Some(DetectedUpdate {
                    release: Arc::new(release),
                    info: info.clone(),
                });
                self.dispatch(FeedEvent::UpdateAvailable(info.clone()));
                Ok(FeedAnswer::Found(info))
            }
            (None, None) => {
                *lock(&self.detected) = None;
                self.dispatch(FeedEvent::UpdateNotAvailable);
                Ok(FeedAnswer::UpToDate)
            }
        }
    }

    async fn download_detected(&self) -> Result<ReleaseInfo, UpdateError> {
        let detected = lock(&self.detected)
            .as_ref()
            .map(|detected| (Arc::clone(&detected.release), detected.info.clone()));
        let Some((release, info)) = detected else {
            return Err(UpdateError::DownloadFailed(
                "no update has been detected".to_string(),
            ));
        };

        self.log
            .info(&format!("downloading update {}", info.version));
        self.dispatch(FeedEvent::DownloadProgress(DownloadProgress::from_bytes(
            0, None,
        )));

        let mut transferred = 0_u64;
        let downloaded = self
            .feed
            .download(&release, |chunk, total| {
                transferred = transferred.saturating_add(chunk);
                self.dispatch(FeedEvent::DownloadProgress(DownloadProgress::from_bytes(
                    transferred,
                    total,
                )));
            })
            .await;

        match downloaded {
            Ok(bytes) => {
                *lock(&self.detected) = None;
                *lock(&self.staged) = Some(StagedUpdate {
                    release,
                    bytes: Arc::new(bytes),
                    info: info.clone(),
                });
                self.dispatch(FeedEvent::UpdateDownloaded(info.clone()));
                Ok(info)
            }
            Err(error) => {
                self.dispatch(FeedEvent::Error(error.clone()));
                Err(error)
            }
        }
    }

    async fn prompt_install(&self, info: &ReleaseInfo) -> Option<InstallChoice> {
        let Some(_prompt_open) = AtomicFlagGuard::try_set(&self.prompt_open) else {
            self.log.info(&format!(
                "install prompt for {} suppressed: a prompt is already open",
                info.version
            ));
            return None;
        };

        let prompt = InstallPrompt::for_release(info);
        let choice = self.dialog.confirm(&prompt).await;
        self.log.info(&format!(
            "install prompt for {} answered: {}",
            info.version,
            choice.as_str()
        ));

        match choice {
            InstallChoice::InstallNow => {
                // Install failures are dispatched as error events.
                let _ = self.quit_and_install();
            }
            InstallChoice::Defer if self.policy.auto_install_on_quit => {
                self.log.info(&format!(
                    "update {} will be installed when the application quits",
                    info.version
                ));
            }
            InstallChoice::Defer => {
                self.log
                    .info(&format!("update {} stays staged", info.version));
            }
        }
        Some(choice)
    }

    fn dispatch(&self, event: FeedEvent) {
        let applied = lock(&self.session).apply(&event);
        let bridge_events = match applied {
            Ok(bridge_events) => bridge_events,
            Err(rejected) => {
                self.log.warn(&format!("ignored feed event: {rejected}"));
                return;
            }
        };
        if bridge_events.is_empty() {
            return;
        }

        self.log_transition(&event);
        for bridge_event in &bridge_events {
            if let Err(error) = self.bridge.emit_bridge(bridge_event) {
                self.log.warn(&error);
            }
        }
    }

    fn log_transition(&self, event: &FeedEvent) {
        match event {
            FeedEvent::CheckingForUpdate => self.log.info("checking for update"),
            FeedEvent::UpdateAvailable(info) => self.log.info(&format!(
                "update available: {} (current {})",
                info.version, info.current_version
            )),
            FeedEvent::UpdateNotAvailable => self.log.info("no update available"),
            FeedEvent::DownloadProgress(progress) => self.log.info(&format!(
                "download progress: {}% ({}/{} MB)",
                progress.whole_percent(),
                progress.transferred_megabytes(),
                progress.total_megabytes()
            )),
            FeedEvent::UpdateDownloaded(info) => {
                self.log
                    .info(&format!("update {} downloaded", info.version))
            }
            FeedEvent::StagedRetained(info) => self.log.info(&format!(
                "nothing newer than {} on the feed; it stays staged",
                info.version
            )),
            FeedEvent::Error(error) => self
                .log
                .error(&format!("update error ({}): {error}", error.kind())),
        }
    }
}
