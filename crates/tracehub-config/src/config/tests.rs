// tracehub-config/src/config/tests.rs
// ============================================================================
// Module: Configuration Unit Tests
// Description: Tests for parsing, env overrides, and validation.
// Purpose: Pin fail-closed behavior for invalid deployments.
// Dependencies: tracehub-config
// ============================================================================

//! ## Overview
//! Exercises TOML parsing, every recognized environment override, and the
//! validation constraints.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::missing_docs_in_private_items,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use super::ConfigError;
use super::TracehubConfig;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Minimal valid configuration document.
const MINIMAL_TOML: &str = r#"
[database]
url = "tracehub.db"

[storage]
bucket_prefix = "tracehub-dev"
local_root = "./blobs"

[carrier]
base_url = "https://tracking.example.test"
api_key = "test-key"

[auth]
verifier_key = "0123456789abcdef"
"#;

/// Builds an env lookup over a static map.
fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: BTreeMap<String, String> =
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
    move |name: &str| map.get(name).cloned()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn minimal_toml_parses_with_defaults() {
    let config = TracehubConfig::from_toml_str(MINIMAL_TOML).unwrap();
    assert_eq!(config.workers.pool_size, 16);
    assert_eq!(config.poll_intervals.in_transit_secs, 3_600);
    assert_eq!(config.poll_intervals.arrived_secs, 1_800);
    assert_eq!(config.poll_intervals.docs_complete_secs, 21_600);
    assert_eq!(config.mail.provider, "log");
}

#[test]
fn env_overrides_apply() {
    let config = TracehubConfig::from_toml_str(MINIMAL_TOML)
        .unwrap()
        .apply_env(env_from(&[
            ("DATABASE_URL", "prod.db"),
            ("WORKER_POOL_SIZE", "32"),
            ("MAIL_PROVIDER", "ses"),
        ]))
        .unwrap();
    assert_eq!(config.database.url, "prod.db");
    assert_eq!(config.workers.pool_size, 32);
    assert_eq!(config.mail.provider, "ses");
}

#[test]
fn poll_interval_overrides_parse_json() {
    let config = TracehubConfig::from_toml_str(MINIMAL_TOML)
        .unwrap()
        .apply_env(env_from(&[(
            "POLL_INTERVAL_OVERRIDES",
            r#"{"in_transit": 900, "docs_complete": 7200}"#,
        )]))
        .unwrap();
    assert_eq!(config.poll_intervals.in_transit_secs, 900);
    assert_eq!(config.poll_intervals.docs_complete_secs, 7_200);
    assert_eq!(config.poll_intervals.arrived_secs, 1_800);
}

#[test]
fn unknown_poll_state_fails_closed() {
    let err = TracehubConfig::from_toml_str(MINIMAL_TOML)
        .unwrap()
        .apply_env(env_from(&[("POLL_INTERVAL_OVERRIDES", r#"{"warp_drive": 60}"#)]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnv { name: "POLL_INTERVAL_OVERRIDES", .. }));
}

#[test]
fn non_numeric_pool_size_fails_closed() {
    let err = TracehubConfig::from_toml_str(MINIMAL_TOML)
        .unwrap()
        .apply_env(env_from(&[("WORKER_POOL_SIZE", "many")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnv { name: "WORKER_POOL_SIZE", .. }));
}

#[test]
fn zero_pool_size_is_rejected() {
    let err = TracehubConfig::from_toml_str(MINIMAL_TOML)
        .unwrap()
        .apply_env(env_from(&[("WORKER_POOL_SIZE", "0")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn missing_verifier_key_is_rejected() {
    let toml = MINIMAL_TOML.replace("0123456789abcdef", "");
    assert!(TracehubConfig::from_toml_str(&toml).is_err());
}

#[test]
fn local_driver_requires_root() {
    let toml = MINIMAL_TOML.replace("local_root = \"./blobs\"", "");
    assert!(TracehubConfig::from_toml_str(&toml).is_err());
}

#[test]
fn zero_io_deadlines_are_rejected() {
    let storage = MINIMAL_TOML
        .replace("local_root = \"./blobs\"", "local_root = \"./blobs\"\ndeadline_ms = 0");
    assert!(TracehubConfig::from_toml_str(&storage).is_err());

    let carrier = MINIMAL_TOML
        .replace("api_key = \"test-key\"", "api_key = \"test-key\"\ndeadline_ms = 0");
    assert!(TracehubConfig::from_toml_str(&carrier).is_err());
}
