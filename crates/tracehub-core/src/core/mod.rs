// tracehub-core/src/core/mod.rs
// ============================================================================
// Module: TraceHub Core Types
// Description: Canonical entity model for the Compliance & Shipment Engine.
// Purpose: Group identifier, time, entity, tenancy, and audit definitions.
// Dependencies: serde, sha2, thiserror, time
// ============================================================================

//! ## Overview
//! The `core` module holds the canonical data model. Every record that can be
//! persisted carries its owning `organization_id`; children inherit tenant
//! scope from their parent at write time.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod document;
pub mod hashing;
pub mod identifiers;
pub mod notify;
pub mod org;
pub mod shipment;
pub mod tenant;
pub mod time;
pub mod tracking;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditAction;
pub use audit::AuditRecord;
pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use document::BolCargoItem;
pub use document::CanonicalData;
pub use document::CertificateFields;
pub use document::ComplianceResult;
pub use document::DetectionMethod;
pub use document::Document;
pub use document::DocumentContent;
pub use document::DocumentIssue;
pub use document::DocumentStatus;
pub use document::DocumentType;
pub use document::InvoiceFields;
pub use document::PackingListFields;
pub use document::ParsedBol;
pub use document::Severity;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use hashing::canonical_json_bytes;
pub use hashing::hash_bytes;
pub use hashing::hash_canonical_json;
pub use identifiers::ContentId;
pub use identifiers::DocumentId;
pub use identifiers::EventId;
pub use identifiers::InvitationId;
pub use identifiers::IssueId;
pub use identifiers::MembershipId;
pub use identifiers::NotificationId;
pub use identifiers::OrgId;
pub use identifiers::OriginId;
pub use identifiers::ProductId;
pub use identifiers::RequestId;
pub use identifiers::ShipmentId;
pub use identifiers::UserId;
pub use notify::Notification;
pub use notify::NotificationChannel;
pub use notify::NotificationKind;
pub use notify::NotificationPreferences;
pub use org::Address;
pub use org::INVITATION_TTL_MILLIS;
pub use org::Invitation;
pub use org::InvitationStatus;
pub use org::MembershipStatus;
pub use org::OrgRole;
pub use org::OrgSettings;
pub use org::OrgStatus;
pub use org::OrgType;
pub use org::Organization;
pub use org::OrganizationMembership;
pub use org::SystemRole;
pub use org::User;
pub use shipment::Geolocation;
pub use shipment::Origin;
pub use shipment::Product;
pub use shipment::Shipment;
pub use shipment::ShipmentStatus;
pub use tenant::AuthzDecision;
pub use tenant::Permission;
pub use tenant::ResourceKind;
pub use tenant::TenantContext;
pub use tenant::authorize;
pub use time::MILLIS_PER_DAY;
pub use time::MILLIS_PER_HOUR;
pub use time::MILLIS_PER_MINUTE;
pub use time::MILLIS_PER_SECOND;
pub use time::TimeParseError;
pub use time::Timestamp;
pub use tracking::ContainerEvent;
pub use tracking::EVENT_DEDUP_TOLERANCE_MILLIS;
pub use tracking::EventSource;
pub use tracking::EventStatus;
pub use tracking::NormalizedEvent;
