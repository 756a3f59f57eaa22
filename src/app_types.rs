use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use crate::UPDATE_CHECK_INTERVAL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UpdatePolicy {
    pub(crate) check_interval: Duration,
    pub(crate) auto_download: bool,
    pub(crate) auto_install_on_quit: bool,
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        Self {
            check_interval: UPDATE_CHECK_INTERVAL,
            auto_download: true,
            auto_install_on_quit: true,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub(crate) struct BridgeResult {
    pub(crate) ok: bool,
    pub(crate) reason: Option<String>,
}

impl BridgeResult {
    pub(crate) fn accepted() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    pub(crate) fn rejected(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
        }
    }
}

pub(crate) struct AtomicFlagGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> AtomicFlagGuard<'a> {
    pub(crate) fn try_set(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self { flag })
    }
}

impl Drop for AtomicFlagGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[test]
    fn atomic_flag_guard_try_set_rejects_double_set_until_drop() {
        let flag = AtomicBool::new(false);

        let guard = AtomicFlagGuard::try_set(&flag).expect("first set should succeed");
        assert!(flag.load(Ordering::Relaxed));
        assert!(AtomicFlagGuard::try_set(&flag).is_none());

        drop(guard);
        assert!(!flag.load(Ordering::Relaxed));
        assert!(AtomicFlagGuard::try_set(&flag).is_some());
    }

    #[test]
    fn default_policy_checks_every_four_hours_and_installs_on_quit() {
        let policy = UpdatePolicy::default();
        assert_eq!(policy.check_interval, Duration::from_secs(14_400));
        assert!(policy.auto_download);
        assert!(policy.auto_install_on_quit);
    }

    #[test]
    fn bridge_result_serializes_reason() {
        let json = serde_json::to_value(BridgeResult::rejected("busy")).unwrap();
        assert_eq!(json, serde_json::json!({ "ok": false, "reason": "busy" }));
    }
}
