#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BuildMode {
    Packaged,
    Development,
}

impl BuildMode {
    /// Development runs (`tauri dev`) have no release feed to talk to.
    pub(crate) fn detect() -> Self {
        Self::from_dev_flag(tauri::is_dev())
    }

    pub(crate) fn from_dev_flag(is_dev: bool) -> Self {
        if is_dev {
            Self::Development
        } else {
            Self::Packaged
        }
    }

    pub(crate) fn is_packaged(self) -> bool {
        self == Self::Packaged
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Packaged => "packaged",
            Self::Development => "development",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_flag_selects_development_mode() {
        assert_eq!(BuildMode::from_dev_flag(true), BuildMode::Development);
        assert!(!BuildMode::Development.is_packaged());
        assert!(BuildMode::from_dev_flag(false).is_packaged());
    }
}
