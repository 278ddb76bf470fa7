// tracehub-api/src/error.rs
// ============================================================================
// Module: API Error Envelope
// Description: Error kinds, status mapping, and the JSON error envelope.
// Purpose: Surface every failure as {error: {code, message, details, request_id}}.
// Dependencies: axum, serde_json, tracehub-core
// ============================================================================

//! ## Overview
//! Every non-2xx response carries a stable error code, a human-readable
//! message, and the request identifier that ties it to the audit log.
//! Cross-tenant reads surface as `NOT_FOUND` (404 preferred to avoid tenant
//! enumeration); cross-tenant writes surface as `CROSS_TENANT` (403) and are
//! additionally logged as security audit events by the handler layer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tracehub_core::RequestId;
use tracehub_core::interfaces::BlobError;
use tracehub_core::interfaces::StoreError;

use crate::auth::AuthError;

// ============================================================================
// SECTION: Error Kind
// ============================================================================

/// API error with its envelope fields.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    /// HTTP status code.
    pub status: StatusCode,
    /// Stable error code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Structured details.
    pub details: Value,
    /// Request identifier tying the response to an audit record.
    pub request_id: Option<RequestId>,
}

impl ApiError {
    /// Builds an error with empty details.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: json!({}),
            request_id: None,
        }
    }

    /// Returns a copy with the request identifier attached.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// 400 validation failure.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION", message)
    }

    /// 403 permission failure.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    /// 404 not found (also used for cross-tenant reads).
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// 500 internal failure.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", message)
    }

    /// Returns true when the failure should emit a security audit event.
    #[must_use]
    pub fn is_security_event(&self) -> bool {
        matches!(self.code, "CROSS_TENANT" | "TENANT_INTEGRITY")
    }
}

// ============================================================================
// SECTION: Conversions
// ============================================================================

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", error.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Unscoped => {
                Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", "tenant context required")
            }
            StoreError::TenantMismatch { .. } => Self::new(
                StatusCode::FORBIDDEN,
                "CROSS_TENANT",
                "resource belongs to another organization",
            ),
            StoreError::NotFound(message) => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
            }
            StoreError::Conflict(message) => {
                Self::new(StatusCode::CONFLICT, "CONFLICT", message)
            }
            StoreError::InvalidTransition(message) => {
                Self::new(StatusCode::CONFLICT, "INVALID_TRANSITION", message)
            }
            StoreError::AlreadyUsed => {
                Self::new(StatusCode::BAD_REQUEST, "ALREADY_USED", "invitation already used")
            }
            StoreError::Expired => {
                Self::new(StatusCode::BAD_REQUEST, "EXPIRED", "invitation expired")
            }
            StoreError::LastAdmin => Self::new(
                StatusCode::CONFLICT,
                "LAST_ADMIN",
                "organization must retain at least one active admin member",
            ),
            StoreError::EudrExcluded(message) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "EUDR_EXCLUDED", message)
            }
            StoreError::Invalid(message) => {
                Self::new(StatusCode::BAD_REQUEST, "VALIDATION", message)
            }
            StoreError::Corrupt(message) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "TENANT_INTEGRITY",
                message,
            ),
            StoreError::Io(message) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", message)
            }
        }
    }
}

impl From<BlobError> for ApiError {
    fn from(error: BlobError) -> Self {
        match error {
            BlobError::TenantMismatch(message) => {
                Self::new(StatusCode::FORBIDDEN, "CROSS_TENANT", message)
            }
            BlobError::NotFound(message) => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
            }
            BlobError::Transient(message) => {
                Self::new(StatusCode::BAD_GATEWAY, "UPSTREAM_TRANSIENT", message)
            }
            BlobError::Io(message) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", message)
            }
        }
    }
}

// ============================================================================
// SECTION: Response Rendering
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let retry_after = self
            .details
            .get("retry_after_secs")
            .and_then(serde_json::Value::as_u64);
        let body = json!({
            "error": {
                "code": self.code,
                "message": self.message,
                "details": self.details,
                "request_id": self.request_id,
            }
        });
        let mut response = (self.status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = axum::http::HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(axum::http::header::RETRY_AFTER, value);
            }
        }
        response
    }
}
