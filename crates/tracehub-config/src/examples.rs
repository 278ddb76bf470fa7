// tracehub-config/src/examples.rs
// ============================================================================
// Module: TraceHub Config Examples
// Description: Deterministic tracehub.toml example generation.
// Purpose: Keep shipped documentation in lockstep with the config model.
// Dependencies: crate::config
// ============================================================================

//! ## Overview
//! Generates the canonical `tracehub.toml` example. The generator output must
//! always parse and validate through [`crate::config::TracehubConfig`];
//! drift between docs and model is a test failure.

// ============================================================================
// SECTION: Example Generation
// ============================================================================

/// Returns the canonical example `tracehub.toml` document.
#[must_use]
pub fn config_toml_example() -> String {
    let mut out = String::new();
    out.push_str("# TraceHub engine configuration\n");
    out.push_str("\n[database]\n");
    out.push_str("url = \"tracehub.db\"\n");
    out.push_str("deadline_ms = 10000\n");
    out.push_str("read_pool_size = 4\n");
    out.push_str("\n[storage]\n");
    out.push_str("bucket_prefix = \"tracehub-dev\"\n");
    out.push_str("driver = \"local\"\n");
    out.push_str("local_root = \"./blobs\"\n");
    out.push_str("deadline_ms = 30000\n");
    out.push_str("\n[carrier]\n");
    out.push_str("base_url = \"https://tracking.example.test\"\n");
    out.push_str("api_key = \"replace-me\"\n");
    out.push_str("deadline_ms = 20000\n");
    out.push_str("\n[classifier]\n");
    out.push_str("base_url = \"\"\n");
    out.push_str("api_key = \"\"\n");
    out.push_str("\n[mail]\n");
    out.push_str("provider = \"log\"\n");
    out.push_str("\n[auth]\n");
    out.push_str("verifier_key = \"replace-me\"\n");
    out.push_str("\n[workers]\n");
    out.push_str("pool_size = 16\n");
    out.push_str("backoff_base_ms = 5000\n");
    out.push_str("backoff_cap_ms = 1800000\n");
    out.push_str("max_retries = 5\n");
    out.push_str("shutdown_grace_ms = 30000\n");
    out.push_str("\n[poll_intervals]\n");
    out.push_str("in_transit_secs = 3600\n");
    out.push_str("arrived_secs = 1800\n");
    out.push_str("customs_secs = 1800\n");
    out.push_str("docs_complete_secs = 21600\n");
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
