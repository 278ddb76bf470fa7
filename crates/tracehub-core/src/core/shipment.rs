// tracehub-core/src/core/shipment.rs
// ============================================================================
// Module: TraceHub Shipments
// Description: Shipment, product, and origin records.
// Purpose: Model the shipment aggregate and its EUDR origin attestations.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! A shipment is owned by one organization and optionally readable by a buyer
//! organization. Product lines carry HS codes that drive the compliance
//! matrix; origins carry geolocation attestations and exist only for
//! EUDR-applicable products.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::OrgId;
use crate::core::identifiers::OriginId;
use crate::core::identifiers::ProductId;
use crate::core::identifiers::ShipmentId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Shipment Status
// ============================================================================

/// Shipment lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
/// - Status only advances; regressions are rejected by the lifecycle table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    /// Created, no documents yet.
    Draft,
    /// At least one document uploaded; required set incomplete.
    DocsPending,
    /// Every required document present and compliant.
    DocsComplete,
    /// Departed the port of loading.
    InTransit,
    /// Arrived or discharged at the port of discharge.
    Arrived,
    /// Held in customs.
    Customs,
    /// Delivered to the consignee.
    Delivered,
    /// Archived after quiescence or admin action.
    Archived,
}

impl ShipmentStatus {
    /// Returns a stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::DocsPending => "docs_pending",
            Self::DocsComplete => "docs_complete",
            Self::InTransit => "in_transit",
            Self::Arrived => "arrived",
            Self::Customs => "customs",
            Self::Delivered => "delivered",
            Self::Archived => "archived",
        }
    }

    /// Returns true when the status is terminal for document archival.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Archived)
    }
}

// ============================================================================
// SECTION: Shipment
// ============================================================================

/// Shipment record.
///
/// # Invariants
/// - `reference` is unique within the owning organization.
/// - `buyer_organization_id`, when set, grants that organization read-only
///   access to this row and its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    /// Shipment identifier.
    pub id: ShipmentId,
    /// Owning organization.
    pub organization_id: OrgId,
    /// Optional buyer organization with read-only access.
    pub buyer_organization_id: Option<OrgId>,
    /// Owner-scoped unique reference (e.g. `VIBO-2026-001`).
    pub reference: String,
    /// ISO 6346 container number when known.
    pub container_number: Option<String>,
    /// Product type key into the compliance matrix (e.g. `horn_hoof`).
    pub product_type: String,
    /// Bill of Lading number when known.
    pub bl_number: Option<String>,
    /// Vessel name.
    pub vessel: Option<String>,
    /// Voyage number.
    pub voyage: Option<String>,
    /// Port of loading UN/LOCODE.
    pub pol_code: Option<String>,
    /// Port of loading display name.
    pub pol_name: Option<String>,
    /// Port of discharge UN/LOCODE.
    pub pod_code: Option<String>,
    /// Port of discharge display name.
    pub pod_name: Option<String>,
    /// Estimated time of departure.
    pub etd: Option<Timestamp>,
    /// Estimated time of arrival.
    pub eta: Option<Timestamp>,
    /// Actual time of departure.
    pub atd: Option<Timestamp>,
    /// Actual time of arrival.
    pub ata: Option<Timestamp>,
    /// Incoterms code (e.g. `CIF`).
    pub incoterms: Option<String>,
    /// Lifecycle status.
    pub status: ShipmentStatus,
    /// Whether the shipment was imported from a legacy system.
    pub is_historical: bool,
    /// Carrier permanent-failure message; polling is suppressed while set.
    pub tracking_error: Option<String>,
    /// Timestamp of the delivery event, used for archive quiescence.
    pub delivered_at: Option<Timestamp>,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Product
// ============================================================================

/// Product line within a shipment.
///
/// # Invariants
/// - `organization_id` matches the parent shipment's owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier.
    pub id: ProductId,
    /// Parent shipment.
    pub shipment_id: ShipmentId,
    /// Owning organization (inherited from the shipment).
    pub organization_id: OrgId,
    /// Harmonized System commodity code (e.g. `0506.90`).
    pub hs_code: String,
    /// Cargo description.
    pub description: String,
    /// Net quantity in kilograms.
    pub quantity_net_kg: Option<f64>,
    /// Gross quantity in kilograms.
    pub quantity_gross_kg: Option<f64>,
}

// ============================================================================
// SECTION: Origin
// ============================================================================

/// Geographic coordinate pair with optional plot polygon.
///
/// # Invariants
/// - `lat` is within [-90, 90] and `lng` within [-180, 180] when validated by
///   the rules engine; this type itself performs no validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geolocation {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
    /// Optional plot polygon as `(lat, lng)` vertices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<(f64, f64)>>,
}

/// Origin attestation for an EUDR-applicable product.
///
/// # Invariants
/// - Present only when the product's HS code is EUDR-applicable; horn/hoof
///   shipments (HS 0506/0507) must never carry origin rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    /// Origin identifier.
    pub id: OriginId,
    /// Parent shipment.
    pub shipment_id: ShipmentId,
    /// Product line attested.
    pub product_id: ProductId,
    /// Owning organization (inherited from the shipment).
    pub organization_id: OrgId,
    /// Farm or plot identifier.
    pub farm_plot_identifier: String,
    /// Geolocation of the plot.
    pub geolocation: Geolocation,
    /// ISO 3166-1 alpha-2 production country.
    pub country: String,
    /// Production window start.
    pub production_start_date: Option<Timestamp>,
    /// Production window end.
    pub production_end_date: Option<Timestamp>,
    /// Deforestation-free statement text.
    pub deforestation_free_statement: Option<String>,
}
