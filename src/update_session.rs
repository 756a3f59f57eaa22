//! Update session state machine.
//!
//! `UpdateSession` only changes through [`UpdateSession::apply`], which checks
//! the transition table and returns the bridge events the change produces.

use std::fmt;

use serde::Serialize;

use crate::{renderer_bridge::BridgeEvent, UpdateError, UpdateErrorPayload};

const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum UpdatePhase {
    Idle,
    Checking,
    Available,
    NotAvailable,
    Downloading,
    Downloaded,
    Error,
}

impl UpdatePhase {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::Available => "available",
            Self::NotAvailable => "not-available",
            Self::Downloading => "downloading",
            Self::Downloaded => "downloaded",
            Self::Error => "error",
        }
    }

    fn can_enter(self, next: UpdatePhase) -> bool {
        match next {
            Self::Checking => matches!(
                self,
                Self::Idle
                    | Self::Checking
                    | Self::Available
                    | Self::NotAvailable
                    | Self::Downloaded
                    | Self::Error
            ),
            Self::Available | Self::NotAvailable => self == Self::Checking,
            Self::Downloading => matches!(self, Self::Available | Self::Downloading),
            Self::Downloaded => self == Self::Downloading,
            Self::Error => true,
            Self::Idle => false,
        }
    }
}

impl fmt::Display for UpdatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Version metadata of a release found on the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReleaseInfo {
    pub(crate) version: String,
    pub(crate) current_version: String,
    pub(crate) notes: Option<String>,
    pub(crate) date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct DownloadProgress {
    pub(crate) percent: f64,
    pub(crate) transferred: u64,
    pub(crate) total: u64,
}

impl DownloadProgress {
    /// `total` is `None` when the feed did not send a content length; the
    /// percentage then stays at zero and `total` tracks `transferred`.
    pub(crate) fn from_bytes(transferred: u64, total: Option<u64>) -> Self {
        let reported_total = total.unwrap_or(0);
        let percent = if reported_total == 0 {
            0.0
        } else {
            (transferred as f64 / reported_total as f64 * 100.0).clamp(0.0, 100.0)
        };

        Self {
            percent,
            transferred,
            total: reported_total.max(transferred),
        }
    }

    pub(crate) fn whole_percent(&self) -> u8 {
        self.percent.floor() as u8
    }

    pub(crate) fn transferred_megabytes(&self) -> u64 {
        self.transferred / BYTES_PER_MEGABYTE
    }

    pub(crate) fn total_megabytes(&self) -> u64 {
        self.total / BYTES_PER_MEGABYTE
    }
}

/// Events raised by the release feed while a cycle runs.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FeedEvent {
    CheckingForUpdate,
    UpdateAvailable(ReleaseInfo),
    UpdateNotAvailable,
    DownloadProgress(DownloadProgress),
    UpdateDownloaded(ReleaseInfo),
    /// A re-check found nothing newer than the update already staged.
    StagedRetained(ReleaseInfo),
    Error(UpdateError),
}

impl FeedEvent {
    fn target_phase(&self) -> UpdatePhase {
        match self {
            Self::CheckingForUpdate => UpdatePhase::Checking,
            Self::UpdateAvailable(_) => UpdatePhase::Available,
            Self::UpdateNotAvailable => UpdatePhase::NotAvailable,
            Self::DownloadProgress(_) => UpdatePhase::Downloading,
            Self::UpdateDownloaded(_) | Self::StagedRetained(_) => UpdatePhase::Downloaded,
            Self::Error(_) => UpdatePhase::Error,
        }
    }

    fn allowed_from(&self, previous: UpdatePhase) -> bool {
        match self {
            Self::StagedRetained(_) => previous == UpdatePhase::Checking,
            _ => previous.can_enter(self.target_phase()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("update session cannot move from {from} to {to}")]
pub(crate) struct TransitionRejected {
    pub(crate) from: UpdatePhase,
    pub(crate) to: UpdatePhase,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionSnapshot {
    pub(crate) phase: UpdatePhase,
    pub(crate) remote_version: Option<String>,
    pub(crate) progress: Option<DownloadProgress>,
    pub(crate) last_error: Option<UpdateErrorPayload>,
}

#[derive(Debug)]
pub(crate) struct UpdateSession {
    phase: UpdatePhase,
    remote_version: Option<String>,
    progress: Option<DownloadProgress>,
    last_error: Option<UpdateError>,
}

impl Default for UpdateSession {
    fn default() -> Self {
        Self {
            phase: UpdatePhase::Idle,
            remote_version: None,
            progress: None,
            last_error: None,
        }
    }
}

impl UpdateSession {
    pub(crate) fn phase(&self) -> UpdatePhase {
        self.phase
    }

    pub(crate) fn apply(&mut self, event: &FeedEvent) -> Result<Vec<BridgeEvent>, TransitionRejected> {
        let previous = self.phase;
        let next = event.target_phase();
        if !event.allowed_from(previous) {
            return Err(TransitionRejected {
                from: previous,
                to: next,
            });
        }
        self.phase = next;

        let events = match event {
            FeedEvent::CheckingForUpdate => {
                self.progress = None;
                self.last_error = None;
                vec![BridgeEvent::Status(UpdatePhase::Checking)]
            }
            FeedEvent::UpdateAvailable(info) => {
                self.remote_version = Some(info.version.clone());
                vec![BridgeEvent::Status(UpdatePhase::Available)]
            }
            FeedEvent::UpdateNotAvailable => {
                self.remote_version = None;
                vec![BridgeEvent::Status(UpdatePhase::NotAvailable)]
            }
            FeedEvent::DownloadProgress(progress) => {
                let entering = previous != UpdatePhase::Downloading;
                let percent_changed = self
                    .progress
                    .map_or(true, |last| last.whole_percent() != progress.whole_percent());
                self.progress = Some(*progress);

                let mut events = Vec::with_capacity(2);
                if entering {
                    events.push(BridgeEvent::Status(UpdatePhase::Downloading));
                }
                if entering || percent_changed {
                    events.push(BridgeEvent::Progress(*progress));
                }
                events
            }
            FeedEvent::UpdateDownloaded(info) | FeedEvent::StagedRetained(info) => {
                self.remote_version = Some(info.version.clone());
                vec![
                    BridgeEvent::Status(UpdatePhase::Downloaded),
                    BridgeEvent::Downloaded(info.clone()),
                ]
            }
            FeedEvent::Error(error) => {
                self.last_error = Some(error.clone());
                vec![
                    BridgeEvent::Status(UpdatePhase::Error),
                    BridgeEvent::Error(error.to_payload()),
                ]
            }
        };

        Ok(events)
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            remote_version: self.remote_version.clone(),
            progress: self.progress,
            last_error: self.last_error.as_ref().map(UpdateError::to_payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(version: &str) -> ReleaseInfo {
        ReleaseInfo {
            version: version.to_string(),
            current_version: "2.2.1".to_string(),
            notes: None,
            date: None,
        }
    }

    fn statuses(events: &[BridgeEvent]) -> Vec<UpdatePhase> {
        events
            .iter()
            .filter_map(|event| match event {
                BridgeEvent::Status(phase) => Some(*phase),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn full_cycle_reaches_downloaded_through_downloading() {
        let mut session = UpdateSession::default();
        session.apply(&FeedEvent::CheckingForUpdate).unwrap();
        session
            .apply(&FeedEvent::UpdateAvailable(release("2.3.0")))
            .unwrap();
        let events = session
            .apply(&FeedEvent::DownloadProgress(DownloadProgress::from_bytes(0, None)))
            .unwrap();
        assert_eq!(statuses(&events), vec![UpdatePhase::Downloading]);

        let events = session
            .apply(&FeedEvent::UpdateDownloaded(release("2.3.0")))
            .unwrap();
        assert_eq!(
            events,
            vec![
                BridgeEvent::Status(UpdatePhase::Downloaded),
                BridgeEvent::Downloaded(release("2.3.0")),
            ]
        );
        assert_eq!(session.snapshot().remote_version.as_deref(), Some("2.3.0"));
    }

    #[test]
    fn downloaded_is_rejected_unless_downloading() {
        let mut session = UpdateSession::default();
        session.apply(&FeedEvent::CheckingForUpdate).unwrap();
        session
            .apply(&FeedEvent::UpdateAvailable(release("2.3.0")))
            .unwrap();

        let rejected = session
            .apply(&FeedEvent::UpdateDownloaded(release("2.3.0")))
            .unwrap_err();
        assert_eq!(rejected.from, UpdatePhase::Available);
        assert_eq!(rejected.to, UpdatePhase::Downloaded);
        assert_eq!(session.phase(), UpdatePhase::Available);
    }

    #[test]
    fn downloading_is_rejected_unless_available() {
        let mut session = UpdateSession::default();
        session.apply(&FeedEvent::CheckingForUpdate).unwrap();

        let progress = DownloadProgress::from_bytes(10, Some(100));
        assert!(session.apply(&FeedEvent::DownloadProgress(progress)).is_err());
        assert_eq!(session.phase(), UpdatePhase::Checking);
    }

    #[test]
    fn check_is_rejected_while_an_update_is_downloading() {
        let mut session = UpdateSession::default();
        session.apply(&FeedEvent::CheckingForUpdate).unwrap();
        session
            .apply(&FeedEvent::UpdateAvailable(release("2.3.0")))
            .unwrap();
        session
            .apply(&FeedEvent::DownloadProgress(DownloadProgress::from_bytes(0, None)))
            .unwrap();
        assert!(session.apply(&FeedEvent::CheckingForUpdate).is_err());
        assert_eq!(session.phase(), UpdatePhase::Downloading);
    }

    #[test]
    fn staged_update_can_be_rechecked_and_retained() {
        let mut session = UpdateSession::default();
        session.apply(&FeedEvent::CheckingForUpdate).unwrap();
        session
            .apply(&FeedEvent::UpdateAvailable(release("2.3.0")))
            .unwrap();
        session
            .apply(&FeedEvent::DownloadProgress(DownloadProgress::from_bytes(0, None)))
            .unwrap();
        session
            .apply(&FeedEvent::UpdateDownloaded(release("2.3.0")))
            .unwrap();

        session.apply(&FeedEvent::CheckingForUpdate).unwrap();
        let events = session
            .apply(&FeedEvent::StagedRetained(release("2.3.0")))
            .unwrap();
        assert_eq!(
            events,
            vec![
                BridgeEvent::Status(UpdatePhase::Downloaded),
                BridgeEvent::Downloaded(release("2.3.0")),
            ]
        );
        assert_eq!(session.phase(), UpdatePhase::Downloaded);
    }

    #[test]
    fn staged_retained_is_only_accepted_after_a_check() {
        let mut session = UpdateSession::default();
        assert!(session
            .apply(&FeedEvent::StagedRetained(release("2.3.0")))
            .is_err());

        session.apply(&FeedEvent::CheckingForUpdate).unwrap();
        session
            .apply(&FeedEvent::UpdateAvailable(release("2.3.0")))
            .unwrap();
        let rejected = session
            .apply(&FeedEvent::StagedRetained(release("2.3.0")))
            .unwrap_err();
        assert_eq!(rejected.from, UpdatePhase::Available);
        assert_eq!(rejected.to, UpdatePhase::Downloaded);
    }

    #[test]
    fn error_is_reachable_from_any_phase_and_new_check_clears_it() {
        let mut session = UpdateSession::default();
        session.apply(&FeedEvent::CheckingForUpdate).unwrap();
        let events = session
            .apply(&FeedEvent::Error(UpdateError::FeedUnreachable(
                "timed out".to_string(),
            )))
            .unwrap();
        assert_eq!(statuses(&events), vec![UpdatePhase::Error]);
        assert_eq!(
            session.snapshot().last_error.map(|payload| payload.kind),
            Some("feed-unreachable")
        );

        session.apply(&FeedEvent::CheckingForUpdate).unwrap();
        assert!(session.snapshot().last_error.is_none());
    }

    #[test]
    fn progress_is_forwarded_once_per_whole_percent() {
        let mut session = UpdateSession::default();
        session.apply(&FeedEvent::CheckingForUpdate).unwrap();
        session
            .apply(&FeedEvent::UpdateAvailable(release("2.3.0")))
            .unwrap();

        let total = Some(1_000);
        let first = session
            .apply(&FeedEvent::DownloadProgress(DownloadProgress::from_bytes(1, total)))
            .unwrap();
        assert_eq!(first.len(), 2);

        let same_percent = session
            .apply(&FeedEvent::DownloadProgress(DownloadProgress::from_bytes(5, total)))
            .unwrap();
        assert!(same_percent.is_empty());

        let next_percent = session
            .apply(&FeedEvent::DownloadProgress(DownloadProgress::from_bytes(10, total)))
            .unwrap();
        assert_eq!(
            next_percent,
            vec![BridgeEvent::Progress(DownloadProgress::from_bytes(10, total))]
        );
    }

    #[test]
    fn progress_stays_within_bounds() {
        let overrun = DownloadProgress::from_bytes(150, Some(100));
        assert_eq!(overrun.percent, 100.0);
        assert!(overrun.transferred <= overrun.total);

        let unknown_total = DownloadProgress::from_bytes(4_096, None);
        assert_eq!(unknown_total.percent, 0.0);
        assert_eq!(unknown_total.total, 4_096);

        let partial = DownloadProgress::from_bytes(333, Some(1_000));
        assert_eq!(partial.whole_percent(), 33);
    }

    #[test]
    fn progress_reports_whole_megabytes() {
        let progress = DownloadProgress::from_bytes(5 * 1024 * 1024 + 10, Some(12 * 1024 * 1024));
        assert_eq!(progress.transferred_megabytes(), 5);
        assert_eq!(progress.total_megabytes(), 12);
    }

    #[test]
    fn phases_serialize_in_kebab_case() {
        assert_eq!(
            serde_json::to_value(UpdatePhase::NotAvailable).unwrap(),
            serde_json::json!("not-available")
        );
        assert_eq!(UpdatePhase::Downloaded.to_string(), "downloaded");
    }
}
