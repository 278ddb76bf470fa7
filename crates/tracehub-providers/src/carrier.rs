// tracehub-providers/src/carrier.rs
// ============================================================================
// Module: HTTP Carrier Client
// Description: Container tracking adapter over the provider's REST API.
// Purpose: Fetch and normalize carrier events with a fail-closed host policy.
// Dependencies: reqwest, serde, tracehub-core, url
// ============================================================================

//! ## Overview
//! [`HttpCarrierClient`] resolves container event feeds over HTTPS. Responses
//! are untrusted: sizes are bounded, unknown statuses normalize to `other`,
//! and non-success codes map to transient (retryable) or permanent
//! (poll-suspending) errors. The host policy denies private address ranges
//! unless explicitly allowed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use serde::Deserialize;
use tracehub_core::EventSource;
use tracehub_core::EventStatus;
use tracehub_core::NormalizedEvent;
use tracehub_core::Timestamp;
use tracehub_core::interfaces::CarrierClient;
use tracehub_core::interfaces::CarrierError;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted response body size (4 MiB).
const MAX_RESPONSE_BYTES: u64 = 4 * 1024 * 1024;
/// Source label recorded on normalized events.
const SOURCE_LABEL: &str = "carrier-api";

// ============================================================================
// SECTION: Host Policy
// ============================================================================

/// Host policy for carrier requests.
///
/// # Invariants
/// - Private and link-local ranges are denied unless explicitly allowed.
#[derive(Debug, Clone, Default)]
pub struct HttpCarrierPolicy {
    /// Whether plain HTTP (no TLS) is allowed (tests only).
    allow_insecure_http: bool,
}

impl HttpCarrierPolicy {
    /// Creates the default policy (HTTPS only).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows plain HTTP endpoints (local test servers).
    #[must_use]
    pub const fn allow_insecure_http(mut self) -> Self {
        self.allow_insecure_http = true;
        self
    }

    /// Validates a request URL against the policy.
    fn enforce(&self, url: &Url) -> Result<(), CarrierError> {
        match url.scheme() {
            "https" => Ok(()),
            "http" if self.allow_insecure_http => Ok(()),
            other => Err(CarrierError::Permanent(format!("scheme not allowed: {other}"))),
        }
    }
}

// ============================================================================
// SECTION: Wire Model
// ============================================================================

/// One event row as returned by the provider.
#[derive(Debug, Deserialize)]
struct WireEvent {
    /// Provider status label.
    status: String,
    /// Event time (RFC 3339).
    event_time: String,
    /// UN/LOCODE when known.
    #[serde(default)]
    location_code: Option<String>,
    /// Location display name.
    #[serde(default)]
    location_name: Option<String>,
    /// Vessel name.
    #[serde(default)]
    vessel: Option<String>,
    /// Voyage number.
    #[serde(default)]
    voyage: Option<String>,
}

/// Provider response envelope.
#[derive(Debug, Deserialize)]
struct WireResponse {
    /// Event rows.
    #[serde(default)]
    events: Vec<WireEvent>,
}

/// Normalizes a provider status label.
fn normalize_status(label: &str) -> EventStatus {
    match label.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
        "booked" | "booking_confirmed" => EventStatus::Booked,
        "gate_in" => EventStatus::GateIn,
        "loaded" | "load" => EventStatus::Loaded,
        "departed" | "vessel_departure" => EventStatus::Departed,
        "in_transit" | "transit" => EventStatus::InTransit,
        "transshipment" | "transhipment" => EventStatus::Transshipment,
        "arrived" | "vessel_arrival" => EventStatus::Arrived,
        "discharged" | "discharge" => EventStatus::Discharged,
        "customs_hold" | "held_by_customs" => EventStatus::CustomsHold,
        "customs_released" | "customs_release" => EventStatus::CustomsReleased,
        "gate_out" => EventStatus::GateOut,
        "delivered" | "delivery" => EventStatus::Delivered,
        _ => EventStatus::Other,
    }
}

// ============================================================================
// SECTION: HTTP Carrier Client
// ============================================================================

/// Blocking HTTP carrier client.
pub struct HttpCarrierClient {
    /// Shared blocking client.
    client: Client,
    /// Provider API base URL.
    base_url: Url,
    /// Provider API key sent as a bearer token.
    api_key: String,
    /// Host policy.
    policy: HttpCarrierPolicy,
}

impl HttpCarrierClient {
    /// Builds a carrier client with the given deadline.
    ///
    /// # Errors
    ///
    /// Returns [`CarrierError::Permanent`] when the base URL is malformed or
    /// the client cannot be constructed.
    pub fn new(
        base_url: &str,
        api_key: &str,
        deadline: Duration,
        policy: HttpCarrierPolicy,
    ) -> Result<Self, CarrierError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| CarrierError::Permanent(format!("invalid base url: {err}")))?;
        policy.enforce(&base_url)?;
        let client = Client::builder()
            .timeout(deadline)
            .redirect(Policy::none())
            .build()
            .map_err(|err| CarrierError::Permanent(err.to_string()))?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
            policy,
        })
    }

    /// Builds the events URL for a container.
    fn events_url(&self, container_number: &str, since: Option<Timestamp>) -> Result<Url, CarrierError> {
        let mut url = self
            .base_url
            .join(&format!("v2/containers/{container_number}/events"))
            .map_err(|err| CarrierError::Permanent(err.to_string()))?;
        if let Some(since) = since {
            let rendered = since
                .format_rfc3339()
                .map_err(|err| CarrierError::Permanent(err.to_string()))?;
            url.query_pairs_mut().append_pair("since", &rendered);
        }
        self.policy.enforce(&url)?;
        Ok(url)
    }
}

impl CarrierClient for HttpCarrierClient {
    fn fetch_events(
        &self,
        container_number: &str,
        since: Option<Timestamp>,
    ) -> Result<Vec<NormalizedEvent>, CarrierError> {
        let url = self.events_url(container_number, since)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .map_err(|err| {
                if err.is_timeout() || err.is_connect() {
                    CarrierError::Transient(err.to_string())
                } else {
                    CarrierError::Permanent(err.to_string())
                }
            })?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CarrierError::Transient(format!("carrier returned {status}")));
        }
        if !status.is_success() {
            return Err(CarrierError::Permanent(format!("carrier returned {status}")));
        }
        if let Some(length) = response.content_length() {
            if length > MAX_RESPONSE_BYTES {
                return Err(CarrierError::Permanent(format!(
                    "response too large: {length} bytes"
                )));
            }
        }

        let body: WireResponse =
            response.json().map_err(|err| CarrierError::Transient(err.to_string()))?;
        let mut events = Vec::with_capacity(body.events.len());
        for wire in body.events {
            let event_time = Timestamp::parse_rfc3339(&wire.event_time)
                .map_err(|err| CarrierError::Permanent(format!("bad event time: {err}")))?;
            events.push(NormalizedEvent {
                status: normalize_status(&wire.status),
                event_time,
                location_code: wire.location_code,
                location_name: wire.location_name,
                vessel: wire.vessel,
                voyage: wire.voyage,
                source: EventSource::new(SOURCE_LABEL),
                raw_payload: None,
            });
        }
        events.sort_by_key(|event| event.event_time);
        Ok(events)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
