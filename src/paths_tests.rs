//! Tests for paths module.

use super::*;
use serial_test::serial;
use tempfile::tempdir;

/// Points `VISIONSAVE_HOME` at `path` until dropped. Tests using it must be `#[serial]`.
pub(crate) struct HomeOverride {
    previous: Option<std::ffi::OsString>,
}

impl HomeOverride {
    pub(crate) fn set(path: &std::path::Path) -> Self {
        let previous = std::env::var_os(HOME_ENV);
        std::env::set_var(HOME_ENV, path);
        Self { previous }
    }
}

impl Drop for HomeOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => std::env::set_var(HOME_ENV, value),
            None => std::env::remove_var(HOME_ENV),
        }
    }
}

#[test]
#[serial]
fn test_home_override_is_created() {
    let dir = tempdir().unwrap();
    let home = dir.path().join("nested").join("store");
    let _guard = HomeOverride::set(&home);

    let resolved = visionsave_home_dir().unwrap();
    assert_eq!(resolved, home);
    assert!(home.is_dir());
}

#[test]
#[serial]
fn test_file_paths_live_under_home() {
    let dir = tempdir().unwrap();
    let _guard = HomeOverride::set(dir.path());

    assert_eq!(user_record_path().unwrap(), dir.path().join("user.json"));
    assert_eq!(payments_path().unwrap(), dir.path().join("payments.json"));
    assert_eq!(config_path().unwrap(), dir.path().join("config.yaml"));
    assert_eq!(
        coordinator_lock_path().unwrap(),
        dir.path().join("coordinator.lock")
    );
}

#[test]
#[serial]
fn test_directories_are_created() {
    let dir = tempdir().unwrap();
    let _guard = HomeOverride::set(dir.path());

    let downloads = downloads_dir().unwrap();
    let logs = logs_dir().unwrap();
    assert!(downloads.ends_with("downloads"));
    assert!(logs.ends_with("logs"));
    assert!(downloads.is_dir());
    assert!(logs.is_dir());
}
