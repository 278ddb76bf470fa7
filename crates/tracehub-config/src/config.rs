// tracehub-config/src/config.rs
// ============================================================================
// Module: TraceHub Configuration Model
// Description: Typed configuration with env overrides and validation.
// Purpose: Fail closed on invalid deployments before any worker starts.
// Dependencies: serde, serde_json, thiserror, toml
// ============================================================================

//! ## Overview
//! The configuration model mirrors `tracehub.toml`. Environment variables
//! override individual fields; `POLL_INTERVAL_OVERRIDES` carries a JSON map
//! of per-state polling intervals. Validation rejects zero-sized pools,
//! missing keys for enabled drivers, and nonsensical deadlines.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default background worker pool size.
pub const DEFAULT_WORKER_POOL_SIZE: usize = 16;
/// Default database call deadline in milliseconds.
pub const DEFAULT_DB_DEADLINE_MS: u64 = 10_000;
/// Default blob store call deadline in milliseconds.
pub const DEFAULT_BLOB_DEADLINE_MS: u64 = 30_000;
/// Default carrier call deadline in milliseconds.
pub const DEFAULT_CARRIER_DEADLINE_MS: u64 = 20_000;
/// Default retry backoff base in milliseconds (5 seconds).
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 5_000;
/// Default retry backoff cap in milliseconds (30 minutes).
pub const DEFAULT_BACKOFF_CAP_MS: u64 = 1_800_000;
/// Default maximum retry attempts for transient upstream failures.
pub const DEFAULT_MAX_RETRIES: u32 = 5;
/// Default in-transit poll interval in seconds (1 hour).
pub const DEFAULT_POLL_IN_TRANSIT_SECS: u64 = 3_600;
/// Default arrived/customs poll interval in seconds (30 minutes).
pub const DEFAULT_POLL_ARRIVED_SECS: u64 = 1_800;
/// Default docs-complete poll interval in seconds (6 hours).
pub const DEFAULT_POLL_DOCS_COMPLETE_SECS: u64 = 21_600;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Environment override carries an invalid value.
    #[error("invalid environment override {name}: {reason}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Failure reason.
        reason: String,
    },
    /// Validation failure (fail closed).
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL or file path.
    pub url: String,
    /// Per-call deadline in milliseconds.
    #[serde(default = "default_db_deadline_ms")]
    pub deadline_ms: u64,
    /// Read connection pool size.
    #[serde(default = "default_read_pool_size")]
    pub read_pool_size: usize,
}

/// Returns the default database deadline.
const fn default_db_deadline_ms() -> u64 {
    DEFAULT_DB_DEADLINE_MS
}

/// Returns the default read pool size.
const fn default_read_pool_size() -> usize {
    4
}

/// Blob storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket name prefix (e.g. `tracehub-prod`).
    pub bucket_prefix: String,
    /// Driver selection.
    #[serde(default)]
    pub driver: StorageDriver,
    /// Local driver root directory (local driver only).
    #[serde(default)]
    pub local_root: Option<String>,
    /// Per-call deadline in milliseconds.
    #[serde(default = "default_blob_deadline_ms")]
    pub deadline_ms: u64,
}

/// Returns the default blob deadline.
const fn default_blob_deadline_ms() -> u64 {
    DEFAULT_BLOB_DEADLINE_MS
}

/// Blob storage driver selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageDriver {
    /// Local directory driver (development and tests).
    #[default]
    Local,
    /// S3-compatible object storage.
    S3,
}

/// Carrier adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierConfig {
    /// Provider API base URL.
    pub base_url: String,
    /// Provider API key (empty disables polling).
    #[serde(default)]
    pub api_key: String,
    /// Per-call deadline in milliseconds.
    #[serde(default = "default_carrier_deadline_ms")]
    pub deadline_ms: u64,
}

/// Returns the default carrier deadline.
const fn default_carrier_deadline_ms() -> u64 {
    DEFAULT_CARRIER_DEADLINE_MS
}

/// Classifier adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Pipeline base URL (empty selects the keyword fallback).
    #[serde(default)]
    pub base_url: String,
    /// Pipeline API key.
    #[serde(default)]
    pub api_key: String,
}

/// Mail configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailConfig {
    /// Provider label routed by the dispatcher (`log` for development).
    #[serde(default = "default_mail_provider")]
    pub provider: String,
}

/// Returns the default mail provider.
fn default_mail_provider() -> String {
    "log".to_string()
}

/// Bearer-token verification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared verifier key for bearer tokens (hex or base64url).
    pub verifier_key: String,
}

/// Background worker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Worker pool size shared by the background loops.
    #[serde(default = "default_worker_pool_size")]
    pub pool_size: usize,
    /// Retry backoff base in milliseconds.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Retry backoff cap in milliseconds.
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,
    /// Maximum transient retry attempts.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Shutdown grace period in milliseconds.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

/// Returns the default worker pool size.
const fn default_worker_pool_size() -> usize {
    DEFAULT_WORKER_POOL_SIZE
}

/// Returns the default backoff base.
const fn default_backoff_base_ms() -> u64 {
    DEFAULT_BACKOFF_BASE_MS
}

/// Returns the default backoff cap.
const fn default_backoff_cap_ms() -> u64 {
    DEFAULT_BACKOFF_CAP_MS
}

/// Returns the default retry count.
const fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

/// Returns the default shutdown grace period.
const fn default_shutdown_grace_ms() -> u64 {
    30_000
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_WORKER_POOL_SIZE,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            backoff_cap_ms: DEFAULT_BACKOFF_CAP_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            shutdown_grace_ms: 30_000,
        }
    }
}

/// Per-state carrier polling intervals in seconds.
///
/// # Invariants
/// - All intervals are greater than zero after validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollIntervals {
    /// Interval for `in_transit` shipments.
    #[serde(default = "default_poll_in_transit")]
    pub in_transit_secs: u64,
    /// Interval for `arrived` shipments.
    #[serde(default = "default_poll_arrived")]
    pub arrived_secs: u64,
    /// Interval for `customs` shipments.
    #[serde(default = "default_poll_arrived")]
    pub customs_secs: u64,
    /// Interval for `docs_complete` shipments.
    #[serde(default = "default_poll_docs_complete")]
    pub docs_complete_secs: u64,
}

/// Returns the default in-transit interval.
const fn default_poll_in_transit() -> u64 {
    DEFAULT_POLL_IN_TRANSIT_SECS
}

/// Returns the default arrived/customs interval.
const fn default_poll_arrived() -> u64 {
    DEFAULT_POLL_ARRIVED_SECS
}

/// Returns the default docs-complete interval.
const fn default_poll_docs_complete() -> u64 {
    DEFAULT_POLL_DOCS_COMPLETE_SECS
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            in_transit_secs: DEFAULT_POLL_IN_TRANSIT_SECS,
            arrived_secs: DEFAULT_POLL_ARRIVED_SECS,
            customs_secs: DEFAULT_POLL_ARRIVED_SECS,
            docs_complete_secs: DEFAULT_POLL_DOCS_COMPLETE_SECS,
        }
    }
}

// ============================================================================
// SECTION: Root Configuration
// ============================================================================

/// Root TraceHub configuration.
///
/// # Invariants
/// - Every load path calls [`TracehubConfig::validate`] before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracehubConfig {
    /// Database section.
    pub database: DatabaseConfig,
    /// Blob storage section.
    pub storage: StorageConfig,
    /// Carrier adapter section.
    pub carrier: CarrierConfig,
    /// Classifier adapter section.
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// Mail section.
    #[serde(default)]
    pub mail: MailConfig,
    /// Bearer auth section.
    pub auth: AuthConfig,
    /// Worker section.
    #[serde(default)]
    pub workers: WorkerConfig,
    /// Polling intervals.
    #[serde(default)]
    pub poll_intervals: PollIntervals,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            provider: default_mail_provider(),
        }
    }
}

impl TracehubConfig {
    /// Parses a TOML document into a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(input).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides through a lookup function.
    ///
    /// Recognized variables: `DATABASE_URL`, `STORAGE_BUCKET_PREFIX`,
    /// `CARRIER_API_KEY`, `CLASSIFIER_API_KEY`, `MAIL_PROVIDER`,
    /// `JWT_VERIFIER_KEY`, `WORKER_POOL_SIZE`, `POLL_INTERVAL_OVERRIDES`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when an override fails to parse
    /// and [`ConfigError::Invalid`] when the result fails validation.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(prefix) = lookup("STORAGE_BUCKET_PREFIX") {
            self.storage.bucket_prefix = prefix;
        }
        if let Some(key) = lookup("CARRIER_API_KEY") {
            self.carrier.api_key = key;
        }
        if let Some(key) = lookup("CLASSIFIER_API_KEY") {
            self.classifier.api_key = key;
        }
        if let Some(provider) = lookup("MAIL_PROVIDER") {
            self.mail.provider = provider;
        }
        if let Some(key) = lookup("JWT_VERIFIER_KEY") {
            self.auth.verifier_key = key;
        }
        if let Some(size) = lookup("WORKER_POOL_SIZE") {
            self.workers.pool_size =
                size.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    name: "WORKER_POOL_SIZE",
                    reason: format!("not a positive integer: {size}"),
                })?;
        }
        if let Some(overrides) = lookup("POLL_INTERVAL_OVERRIDES") {
            self.apply_poll_overrides(&overrides)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Applies the `POLL_INTERVAL_OVERRIDES` JSON map.
    fn apply_poll_overrides(&mut self, raw: &str) -> Result<(), ConfigError> {
        let map: BTreeMap<String, u64> =
            serde_json::from_str(raw).map_err(|err| ConfigError::InvalidEnv {
                name: "POLL_INTERVAL_OVERRIDES",
                reason: err.to_string(),
            })?;
        for (state, secs) in map {
            match state.as_str() {
                "in_transit" => self.poll_intervals.in_transit_secs = secs,
                "arrived" => self.poll_intervals.arrived_secs = secs,
                "customs" => self.poll_intervals.customs_secs = secs,
                "docs_complete" => self.poll_intervals.docs_complete_secs = secs,
                other => {
                    return Err(ConfigError::InvalidEnv {
                        name: "POLL_INTERVAL_OVERRIDES",
                        reason: format!("unknown shipment state: {other}"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Validates the configuration (fail closed).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url must not be empty".to_string()));
        }
        if self.database.deadline_ms == 0 {
            return Err(ConfigError::Invalid("database.deadline_ms must be positive".to_string()));
        }
        if self.database.read_pool_size == 0 {
            return Err(ConfigError::Invalid(
                "database.read_pool_size must be positive".to_string(),
            ));
        }
        if self.storage.bucket_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "storage.bucket_prefix must not be empty".to_string(),
            ));
        }
        if self.storage.driver == StorageDriver::Local
            && self.storage.local_root.as_deref().is_none_or(|root| root.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "storage.local_root required for the local driver".to_string(),
            ));
        }
        if self.storage.deadline_ms == 0 {
            return Err(ConfigError::Invalid("storage.deadline_ms must be positive".to_string()));
        }
        if self.carrier.deadline_ms == 0 {
            return Err(ConfigError::Invalid("carrier.deadline_ms must be positive".to_string()));
        }
        if self.auth.verifier_key.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.verifier_key must not be empty".to_string()));
        }
        if self.workers.pool_size == 0 {
            return Err(ConfigError::Invalid("workers.pool_size must be positive".to_string()));
        }
        if self.workers.backoff_base_ms == 0
            || self.workers.backoff_cap_ms < self.workers.backoff_base_ms
        {
            return Err(ConfigError::Invalid(
                "workers backoff base must be positive and no greater than the cap".to_string(),
            ));
        }
        if self.workers.max_retries == 0 {
            return Err(ConfigError::Invalid("workers.max_retries must be positive".to_string()));
        }
        let intervals = [
            self.poll_intervals.in_transit_secs,
            self.poll_intervals.arrived_secs,
            self.poll_intervals.customs_secs,
            self.poll_intervals.docs_complete_secs,
        ];
        if intervals.iter().any(|secs| *secs == 0) {
            return Err(ConfigError::Invalid("poll intervals must be positive".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
