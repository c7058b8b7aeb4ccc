//! Integration tests for configuration management
//!
//! These tests check that `CERTBUNDLE__*` environment variables are layered
//! over the configuration file.

use certbundle::config::load_config;
use std::env;
use std::io::Write;
use std::sync::Mutex;

// Use a mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const VARS: [&str; 4] = [
    "CERTBUNDLE__KEY_MANAGER__ENDPOINT",
    "CERTBUNDLE__KEY_MANAGER__TOKEN",
    "CERTBUNDLE__KEY_MANAGER__PAGE_SIZE",
    "CERTBUNDLE__CATALOG__ENABLED_SERVICES",
];

/// Runs `f` with the given variables set, restoring the previous values after.
fn with_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let saved: Vec<_> = VARS.iter().map(|name| (*name, env::var(name).ok())).collect();
    for name in VARS {
        env::remove_var(name);
    }
    for (name, value) in vars {
        env::set_var(name, value);
    }

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

    for (name, value) in saved {
        match value {
            Some(value) => env::set_var(name, value),
            None => env::remove_var(name),
        }
    }

    if let Err(panic) = result {
        std::panic::resume_unwind(panic);
    }
}

#[test]
fn test_environment_overrides_defaults() {
    with_env(
        &[
            ("CERTBUNDLE__KEY_MANAGER__ENDPOINT", "https://kms.internal:9311"),
            ("CERTBUNDLE__KEY_MANAGER__TOKEN", "env-token"),
            ("CERTBUNDLE__KEY_MANAGER__PAGE_SIZE", "25"),
            ("CERTBUNDLE__CATALOG__ENABLED_SERVICES", "key-manager,load-balancer"),
        ],
        || {
            let config = load_config(None).unwrap();
            assert_eq!(config.key_manager.endpoint, "https://kms.internal:9311");
            assert_eq!(config.key_manager.token.expose_secret(), "env-token");
            assert_eq!(config.key_manager.page_size, 25);
            assert_eq!(config.catalog.enabled_services, vec!["key-manager", "load-balancer"]);
        },
    );
}

#[test]
fn test_environment_wins_over_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[key_manager]\nendpoint = \"https://from-file:9311\"\npage_size = 10").unwrap();

    with_env(&[("CERTBUNDLE__KEY_MANAGER__ENDPOINT", "https://from-env:9311")], || {
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.key_manager.endpoint, "https://from-env:9311");
        assert_eq!(config.key_manager.page_size, 10);
        assert!(!config.key_manager.has_token());
    });
}

#[test]
fn test_invalid_environment_value_is_rejected() {
    with_env(&[("CERTBUNDLE__KEY_MANAGER__PAGE_SIZE", "0")], || {
        assert!(load_config(None).is_err());
    });

    with_env(&[("CERTBUNDLE__KEY_MANAGER__PAGE_SIZE", "many")], || {
        assert!(load_config(None).is_err());
    });
}
