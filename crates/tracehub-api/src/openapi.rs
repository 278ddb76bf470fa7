// tracehub-api/src/openapi.rs
// ============================================================================
// Module: OpenAPI Document
// Description: Deterministic generation of the public API description.
// Purpose: Emit /openapi.json from the same route table the router uses.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! The OpenAPI document is generated from a static operation table so it can
//! never drift silently from the router: the route-set test compares both.
//! Schemas reference the serialized entity forms; the document itself is
//! deterministic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Operation Table
// ============================================================================

/// One documented operation.
struct Operation {
    /// HTTP method (lowercase).
    method: &'static str,
    /// Route path in OpenAPI syntax.
    path: &'static str,
    /// Operation identifier.
    id: &'static str,
    /// Short summary.
    summary: &'static str,
}

/// Every public operation, grouped as the contract documents them.
const OPERATIONS: &[Operation] = &[
    Operation { method: "get", path: "/auth/me", id: "authMe", summary: "Resolved tenant context" },
    Operation { method: "post", path: "/organizations", id: "createOrganization", summary: "Create an organization" },
    Operation { method: "get", path: "/organizations/{id}", id: "getOrganization", summary: "Load an organization" },
    Operation { method: "delete", path: "/organizations/{id}", id: "suspendOrganization", summary: "Soft-suspend an organization" },
    Operation { method: "put", path: "/organizations/{id}/settings", id: "updateOrganizationSettings", summary: "Update organization settings" },
    Operation { method: "post", path: "/invitations", id: "createInvitation", summary: "Issue a single-use invitation" },
    Operation { method: "post", path: "/invitations/accept", id: "acceptInvitation", summary: "Accept an invitation" },
    Operation { method: "post", path: "/invitations/{id}/resend", id: "resendInvitation", summary: "Reissue an invitation token" },
    Operation { method: "post", path: "/invitations/{id}/revoke", id: "revokeInvitation", summary: "Revoke an invitation" },
    Operation { method: "post", path: "/shipments", id: "createShipment", summary: "Create a shipment" },
    Operation { method: "get", path: "/shipments", id: "listShipments", summary: "List visible shipments" },
    Operation { method: "get", path: "/shipments/{id}", id: "getShipment", summary: "Load a shipment" },
    Operation { method: "put", path: "/shipments/{id}", id: "updateShipment", summary: "Update shipment routing columns" },
    Operation { method: "post", path: "/shipments/{id}/products", id: "addProduct", summary: "Add a product line" },
    Operation { method: "post", path: "/shipments/{id}/origins", id: "addOrigin", summary: "Add an origin attestation" },
    Operation { method: "post", path: "/shipments/{id}/archive", id: "archiveShipment", summary: "Archive a delivered shipment" },
    Operation { method: "post", path: "/shipments/{id}/unarchive", id: "unarchiveShipment", summary: "Reverse an archive" },
    Operation { method: "get", path: "/shipments/{id}/documents", id: "listShipmentDocuments", summary: "List documents on a shipment" },
    Operation { method: "post", path: "/documents", id: "uploadDocument", summary: "Upload a document" },
    Operation { method: "get", path: "/documents/{id}", id: "getDocument", summary: "Load a document" },
    Operation { method: "post", path: "/documents/{id}/validate", id: "validateDocument", summary: "Approve a document" },
    Operation { method: "post", path: "/documents/{id}/reject", id: "rejectDocument", summary: "Reject a document" },
    Operation { method: "get", path: "/documents/{id}/download", id: "downloadDocument", summary: "Signed download URL" },
    Operation { method: "get", path: "/tracking/{id}/events", id: "listEvents", summary: "Container event history" },
    Operation { method: "post", path: "/tracking/{id}/events", id: "ingestEvents", summary: "Manually ingest events" },
    Operation { method: "post", path: "/tracking/{id}/resume", id: "resumeTracking", summary: "Resume suspended polling" },
    Operation { method: "post", path: "/compliance/evaluate/{id}", id: "evaluateShipment", summary: "Run the rules engine" },
    Operation { method: "get", path: "/compliance/{id}/issues", id: "listIssues", summary: "List compliance issues" },
    Operation { method: "post", path: "/compliance/issues/{id}/override", id: "overrideIssue", summary: "Override an issue" },
    Operation { method: "get", path: "/audit-packs/{id}", id: "assembleAuditPack", summary: "Assemble the audit pack" },
    Operation { method: "get", path: "/notifications", id: "notificationFeed", summary: "In-app notification feed" },
    Operation { method: "post", path: "/notifications/{id}/read", id: "markNotificationRead", summary: "Mark a notification read" },
    Operation { method: "get", path: "/notifications/preferences", id: "getPreferences", summary: "Notification preferences" },
    Operation { method: "put", path: "/notifications/preferences", id: "putPreferences", summary: "Replace notification preferences" },
];

// ============================================================================
// SECTION: Document Generation
// ============================================================================

/// Returns the documented `(method, path)` pairs for drift tests.
#[must_use]
pub fn documented_routes() -> Vec<(String, String)> {
    OPERATIONS
        .iter()
        .map(|op| (op.method.to_string(), op.path.to_string()))
        .collect()
}

/// Generates the OpenAPI 3.1 document.
#[must_use]
pub fn openapi_document() -> Value {
    let mut paths = serde_json::Map::new();
    for op in OPERATIONS {
        let entry = paths
            .entry(op.path.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if let Value::Object(map) = entry {
            map.insert(
                op.method.to_string(),
                json!({
                    "operationId": op.id,
                    "summary": op.summary,
                    "security": [{"bearerAuth": []}],
                    "responses": {
                        "default": {
                            "description": "Envelope-wrapped response",
                        }
                    }
                }),
            );
        }
    }
    json!({
        "openapi": "3.1.0",
        "info": {
            "title": "TraceHub Compliance & Shipment Engine",
            "version": "0.1.0",
        },
        "components": {
            "securitySchemes": {
                "bearerAuth": {"type": "http", "scheme": "bearer"}
            }
        },
        "paths": Value::Object(paths),
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
