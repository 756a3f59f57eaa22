use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum UpdateError {
    #[error("update feed unreachable: {0}")]
    FeedUnreachable(String),
    #[error("update download failed: {0}")]
    DownloadFailed(String),
    #[error("update install failed: {0}")]
    InstallFailed(String),
    #[error("updates are disabled in development builds")]
    Disabled,
    #[error("no downloaded update is staged for installation")]
    NothingStaged,
}

impl UpdateError {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::FeedUnreachable(_) => "feed-unreachable",
            Self::DownloadFailed(_) => "download-failure",
            Self::InstallFailed(_) => "install-failure",
            Self::Disabled => "disabled",
            Self::NothingStaged => "nothing-staged",
        }
    }

    pub(crate) fn to_payload(&self) -> UpdateErrorPayload {
        UpdateErrorPayload {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Shape of the error stream delivered to the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct UpdateErrorPayload {
    pub(crate) kind: &'static str,
    pub(crate) message: String,
}
