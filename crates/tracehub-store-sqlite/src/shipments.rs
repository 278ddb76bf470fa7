// tracehub-store-sqlite/src/shipments.rs
// ============================================================================
// Module: Shipment Persistence
// Description: Shipments, products, origins, and status derivation.
// Purpose: Enforce tenancy, the buyer read path, and the EUDR write guard.
// Dependencies: crate::store, rusqlite, tracehub-core
// ============================================================================

//! ## Overview
//! Shipment rows carry the owner predicate plus a secondary read-only buyer
//! predicate. Origins are rejected at write for horn/hoof commodities; the
//! status recompute path re-derives the lifecycle from full document and
//! event history so document and event ingestion commute.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::OptionalExtension;
use rusqlite::params;
use serde_json::json;
use tracehub_core::AuditAction;
use tracehub_core::ComplianceMatrix;
use tracehub_core::DocumentStatus;
use tracehub_core::EventStatus;
use tracehub_core::OrgId;
use tracehub_core::Origin;
use tracehub_core::OriginId;
use tracehub_core::Product;
use tracehub_core::ProductId;
use tracehub_core::Shipment;
use tracehub_core::ShipmentFlow;
use tracehub_core::ShipmentId;
use tracehub_core::ShipmentStatus;
use tracehub_core::Timestamp;
use tracehub_core::interfaces::StoreError;
use tracehub_core::is_horn_hoof;
use tracehub_core::shipment::Geolocation;

use crate::store::TenantSession;
use crate::store::from_json;
use crate::store::id_to_i64;
use crate::store::org_to_i64;
use crate::store::to_json;

// ============================================================================
// SECTION: Request Payloads
// ============================================================================

/// Inputs for creating a shipment.
#[derive(Debug, Clone)]
pub struct NewShipment {
    /// Owning organization.
    pub organization_id: OrgId,
    /// Optional read-only buyer organization.
    pub buyer_organization_id: Option<OrgId>,
    /// Owner-scoped unique reference.
    pub reference: String,
    /// Product type key into the compliance matrix.
    pub product_type: String,
    /// Incoterms code.
    pub incoterms: Option<String>,
    /// Whether the shipment is a legacy import.
    pub is_historical: bool,
}

/// Inputs for adding a product line.
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Parent shipment.
    pub shipment_id: ShipmentId,
    /// HS commodity code.
    pub hs_code: String,
    /// Cargo description.
    pub description: String,
    /// Net quantity in kilograms.
    pub quantity_net_kg: Option<f64>,
    /// Gross quantity in kilograms.
    pub quantity_gross_kg: Option<f64>,
}

/// Inputs for adding an origin attestation.
#[derive(Debug, Clone)]
pub struct NewOrigin {
    /// Parent shipment.
    pub shipment_id: ShipmentId,
    /// Product line attested.
    pub product_id: ProductId,
    /// Farm or plot identifier.
    pub farm_plot_identifier: String,
    /// Geolocation of the plot.
    pub geolocation: Geolocation,
    /// Production country.
    pub country: String,
    /// Production window start.
    pub production_start_date: Option<Timestamp>,
    /// Production window end.
    pub production_end_date: Option<Timestamp>,
    /// Deforestation-free statement text.
    pub deforestation_free_statement: Option<String>,
}

// ============================================================================
// SECTION: Shipments
// ============================================================================

impl TenantSession<'_> {
    /// Creates a shipment in `draft`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the reference is taken within
    /// the owning organization.
    pub fn create_shipment(&self, new: &NewShipment, now: Timestamp) -> Result<Shipment, StoreError> {
        self.check_write_org(new.organization_id)?;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        let id = self.next_id(&tx, "shipments")?;
        let shipment = Shipment {
            id: ShipmentId::from_raw(id)
                .ok_or_else(|| StoreError::Corrupt("zero id".to_string()))?,
            organization_id: new.organization_id,
            buyer_organization_id: new.buyer_organization_id,
            reference: new.reference.clone(),
            container_number: None,
            product_type: new.product_type.clone(),
            bl_number: None,
            vessel: None,
            voyage: None,
            pol_code: None,
            pol_name: None,
            pod_code: None,
            pod_name: None,
            etd: None,
            eta: None,
            atd: None,
            ata: None,
            incoterms: new.incoterms.clone(),
            status: ShipmentStatus::Draft,
            is_historical: new.is_historical,
            tracking_error: None,
            delivered_at: None,
            created_at: now,
        };
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO shipments
                 (id, organization_id, buyer_organization_id, reference, status, record_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id_to_i64(id),
                org_to_i64(new.organization_id),
                new.buyer_organization_id.map(org_to_i64),
                shipment.reference,
                shipment.status.as_str(),
                to_json(&shipment)?
            ],
        );
        match inserted {
            Ok(1) => {}
            Ok(_) => {
                return Err(StoreError::Conflict(format!(
                    "reference taken: {}",
                    new.reference
                )));
            }
            Err(err) => return Err(StoreError::Io(err.to_string())),
        }
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Create,
            "shipment",
            Some(id.to_string()),
            json!({"reference": shipment.reference, "product_type": shipment.product_type}),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(shipment)
    }

    /// Loads a shipment visible to the session (owner, buyer, or admin).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for missing or cross-tenant rows; the
    /// caller surfaces 404 to avoid tenant enumeration.
    pub fn get_shipment(&self, shipment_id: ShipmentId) -> Result<Shipment, StoreError> {
        self.require_scope()?;
        let conn = self.lock_conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT record_json FROM shipments
                 WHERE id = ?1
                   AND (organization_id = ?2 OR buyer_organization_id = ?2 OR ?3)",
                params![id_to_i64(shipment_id.get()), self.org_param(), self.is_system_admin()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        json.map_or_else(
            || Err(StoreError::NotFound(format!("shipment {shipment_id}"))),
            |snapshot| from_json(&snapshot),
        )
    }

    /// Returns true when the session owns the shipment for writes.
    ///
    /// Buyer organizations hold read access only.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the row is invisible.
    pub fn require_shipment_write(&self, shipment_id: ShipmentId) -> Result<Shipment, StoreError> {
        let shipment = self.get_shipment(shipment_id)?;
        if !self.is_system_admin() && self.scope.org_id != Some(shipment.organization_id) {
            // Buyer-visible rows surface as read-only, not as missing.
            return Err(StoreError::TenantMismatch {
                target: shipment.organization_id,
                session: self.scope.org_id.unwrap_or(shipment.organization_id),
            });
        }
        Ok(shipment)
    }

    /// Lists shipments visible to the session, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure or unscoped sessions.
    pub fn list_shipments(&self, limit: usize) -> Result<Vec<Shipment>, StoreError> {
        self.require_scope()?;
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT record_json FROM shipments
                 WHERE (organization_id = ?1 OR buyer_organization_id = ?1 OR ?2)
                 ORDER BY id DESC LIMIT ?3",
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(
                params![
                    self.org_param(),
                    self.is_system_admin(),
                    i64::try_from(limit).unwrap_or(i64::MAX)
                ],
                |row| row.get::<_, String>(0),
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut shipments = Vec::new();
        for row in rows {
            let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
            shipments.push(from_json(&json)?);
        }
        Ok(shipments)
    }

    /// Persists a full shipment snapshot (status and indexed columns included).
    pub(crate) fn save_shipment_tx(
        &self,
        tx: &rusqlite::Transaction<'_>,
        shipment: &Shipment,
    ) -> Result<(), StoreError> {
        tx.execute(
            "UPDATE shipments SET buyer_organization_id = ?2, status = ?3, record_json = ?4
             WHERE id = ?1",
            params![
                id_to_i64(shipment.id.get()),
                shipment.buyer_organization_id.map(org_to_i64),
                shipment.status.as_str(),
                to_json(shipment)?
            ],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }

    /// Rewrites mutable shipment columns from an owner session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on cross-tenant writes or I/O failure.
    pub fn update_shipment(&self, shipment: &Shipment, now: Timestamp) -> Result<(), StoreError> {
        self.require_shipment_write(shipment.id)?;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        self.save_shipment_tx(&tx, shipment)?;
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Update,
            "shipment",
            Some(shipment.id.to_string()),
            json!({"reference": shipment.reference}),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))
    }

    /// Records a carrier permanent failure and suspends polling.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the shipment is invisible or I/O fails.
    pub fn set_tracking_error(
        &self,
        shipment_id: ShipmentId,
        message: &str,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let mut shipment = self.get_shipment(shipment_id)?;
        shipment.tracking_error = Some(message.to_string());
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        self.save_shipment_tx(&tx, &shipment)?;
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Update,
            "shipment",
            Some(shipment_id.to_string()),
            json!({"tracking_error": message}),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))
    }

    /// Clears a carrier permanent failure after operator action.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the shipment is invisible or I/O fails.
    pub fn clear_tracking_error(
        &self,
        shipment_id: ShipmentId,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let mut shipment = self.require_shipment_write(shipment_id)?;
        shipment.tracking_error = None;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        self.save_shipment_tx(&tx, &shipment)?;
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Update,
            "shipment",
            Some(shipment_id.to_string()),
            json!({"tracking_error": serde_json::Value::Null}),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))
    }

    /// Lists shipments eligible for carrier polling.
    ///
    /// Eligible states: `docs_complete`, `in_transit`, `arrived`, `customs`,
    /// excluding rows with a recorded tracking error or no container number.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure.
    pub fn pollable_shipments(&self) -> Result<Vec<Shipment>, StoreError> {
        self.require_scope()?;
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT record_json FROM shipments
                 WHERE status IN ('docs_complete', 'in_transit', 'arrived', 'customs')
                   AND (organization_id = ?1 OR ?2)
                 ORDER BY id",
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(params![self.org_param(), self.is_system_admin()], |row| {
                row.get::<_, String>(0)
            })
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut shipments: Vec<Shipment> = Vec::new();
        for row in rows {
            let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
            let shipment: Shipment = from_json(&json)?;
            if shipment.tracking_error.is_none() && shipment.container_number.is_some() {
                shipments.push(shipment);
            }
        }
        Ok(shipments)
    }
}

// ============================================================================
// SECTION: Products & Origins
// ============================================================================

impl TenantSession<'_> {
    /// Adds a product line; tenant scope is inherited from the shipment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on cross-tenant writes or I/O failure.
    pub fn add_product(&self, new: &NewProduct, now: Timestamp) -> Result<Product, StoreError> {
        let shipment = self.require_shipment_write(new.shipment_id)?;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        let id = self.next_id(&tx, "products")?;
        let product = Product {
            id: ProductId::from_raw(id)
                .ok_or_else(|| StoreError::Corrupt("zero id".to_string()))?,
            shipment_id: new.shipment_id,
            organization_id: shipment.organization_id,
            hs_code: new.hs_code.clone(),
            description: new.description.clone(),
            quantity_net_kg: new.quantity_net_kg,
            quantity_gross_kg: new.quantity_gross_kg,
        };
        tx.execute(
            "INSERT INTO products (id, shipment_id, organization_id, record_json)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                id_to_i64(id),
                id_to_i64(new.shipment_id.get()),
                org_to_i64(shipment.organization_id),
                to_json(&product)?
            ],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Create,
            "product",
            Some(id.to_string()),
            json!({"shipment_id": new.shipment_id, "hs_code": product.hs_code}),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(product)
    }

    /// Lists product lines for a visible shipment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure.
    pub fn products_for_shipment(&self, shipment_id: ShipmentId) -> Result<Vec<Product>, StoreError> {
        self.get_shipment(shipment_id)?;
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare("SELECT record_json FROM products WHERE shipment_id = ?1 ORDER BY id")
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(params![id_to_i64(shipment_id.get())], |row| row.get::<_, String>(0))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut products = Vec::new();
        for row in rows {
            let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
            products.push(from_json(&json)?);
        }
        Ok(products)
    }

    /// Adds an origin attestation, rejecting EUDR-excluded commodities.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EudrExcluded`] for horn/hoof products and
    /// [`StoreError`] on cross-tenant writes or I/O failure.
    pub fn add_origin(&self, new: &NewOrigin, now: Timestamp) -> Result<Origin, StoreError> {
        let shipment = self.require_shipment_write(new.shipment_id)?;
        let products = self.products_for_shipment(new.shipment_id)?;
        let product = products
            .iter()
            .find(|p| p.id == new.product_id)
            .ok_or_else(|| StoreError::NotFound(format!("product {}", new.product_id)))?;
        if is_horn_hoof(&product.hs_code) || shipment.product_type == "horn_hoof" {
            return Err(StoreError::EudrExcluded(format!(
                "origin attestations are not accepted for HS {}",
                product.hs_code
            )));
        }
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        let id = self.next_id(&tx, "origins")?;
        let origin = Origin {
            id: OriginId::from_raw(id)
                .ok_or_else(|| StoreError::Corrupt("zero id".to_string()))?,
            shipment_id: new.shipment_id,
            product_id: new.product_id,
            organization_id: shipment.organization_id,
            farm_plot_identifier: new.farm_plot_identifier.clone(),
            geolocation: new.geolocation.clone(),
            country: new.country.clone(),
            production_start_date: new.production_start_date,
            production_end_date: new.production_end_date,
            deforestation_free_statement: new.deforestation_free_statement.clone(),
        };
        tx.execute(
            "INSERT INTO origins (id, shipment_id, organization_id, record_json)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                id_to_i64(id),
                id_to_i64(new.shipment_id.get()),
                org_to_i64(shipment.organization_id),
                to_json(&origin)?
            ],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Create,
            "origin",
            Some(id.to_string()),
            json!({"shipment_id": new.shipment_id, "product_id": new.product_id}),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(origin)
    }

    /// Lists origin attestations for a visible shipment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure.
    pub fn origins_for_shipment(&self, shipment_id: ShipmentId) -> Result<Vec<Origin>, StoreError> {
        self.get_shipment(shipment_id)?;
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare("SELECT record_json FROM origins WHERE shipment_id = ?1 ORDER BY id")
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(params![id_to_i64(shipment_id.get())], |row| row.get::<_, String>(0))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut origins = Vec::new();
        for row in rows {
            let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
            origins.push(from_json(&json)?);
        }
        Ok(origins)
    }
}

// ============================================================================
// SECTION: Status Derivation
// ============================================================================

/// Outcome of a status recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    /// Status before the recompute.
    pub previous: ShipmentStatus,
    /// Status after the recompute.
    pub current: ShipmentStatus,
}

impl StatusChange {
    /// Returns true when the status advanced.
    #[must_use]
    pub fn advanced(&self) -> bool {
        self.previous != self.current
    }
}

impl TenantSession<'_> {
    /// Re-derives the shipment status from full document and event history.
    ///
    /// Returns the change when the status advanced; regressions never occur
    /// because derivation is monotone over the same history.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query or write failure.
    pub fn recompute_shipment_status(
        &self,
        shipment_id: ShipmentId,
        matrix: &ComplianceMatrix,
        now: Timestamp,
    ) -> Result<Option<StatusChange>, StoreError> {
        let mut shipment = self.get_shipment(shipment_id)?;
        if matches!(shipment.status, ShipmentStatus::Delivered | ShipmentStatus::Archived) {
            return Ok(None);
        }

        let documents = self.primary_documents(shipment_id)?;
        let documents_uploaded = !documents.is_empty();
        let required = matrix.required_documents(&shipment.product_type);
        let required_docs_complete = !required.is_empty()
            && required.iter().all(|doc_type| {
                documents
                    .iter()
                    .any(|doc| doc.document_type == *doc_type && doc.status.is_compliant())
            });

        let events = self.events_for_shipment(shipment_id)?;
        let statuses: Vec<EventStatus> = events.iter().map(|event| event.event_status).collect();

        let derived = ShipmentFlow::derive(documents_uploaded, required_docs_complete, &statuses);
        if derived == shipment.status || ShipmentFlow::is_regression(shipment.status, derived) {
            return Ok(None);
        }

        let previous = shipment.status;
        shipment.status = derived;
        if derived == ShipmentStatus::Delivered {
            shipment.delivered_at = Some(now);
        }

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        self.save_shipment_tx(&tx, &shipment)?;
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Transition,
            "shipment",
            Some(shipment_id.to_string()),
            json!({"previous_status": previous.as_str(), "new_status": derived.as_str()}),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(Some(StatusChange {
            previous,
            current: derived,
        }))
    }

    /// Archives a delivered shipment (quiescence or admin action) and moves
    /// its linked documents to `archived`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTransition`] when the shipment is not in
    /// `delivered`.
    pub fn archive_shipment(
        &self,
        shipment_id: ShipmentId,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let mut shipment = self.require_shipment_write(shipment_id)?;
        let next = ShipmentFlow::apply(
            shipment.status,
            tracehub_core::ShipmentEvent::AdminArchive,
        )
        .map_err(|err| StoreError::InvalidTransition(err.to_string()))?;
        let previous = shipment.status;
        shipment.status = next;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        self.save_shipment_tx(&tx, &shipment)?;
        self.archive_linked_documents_tx(&tx, shipment_id, now)?;
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Transition,
            "shipment",
            Some(shipment_id.to_string()),
            json!({"previous_status": previous.as_str(), "new_status": next.as_str()}),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))
    }

    /// Reverses an archive (system administrators only).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unscoped`] for tenant sessions and
    /// [`StoreError::InvalidTransition`] when the shipment is not archived.
    pub fn unarchive_shipment(
        &self,
        shipment_id: ShipmentId,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        if !self.is_system_admin() {
            return Err(StoreError::Unscoped);
        }
        let mut shipment = self.get_shipment(shipment_id)?;
        let next = ShipmentFlow::apply(
            shipment.status,
            tracehub_core::ShipmentEvent::AdminUnarchive,
        )
        .map_err(|err| StoreError::InvalidTransition(err.to_string()))?;
        let previous = shipment.status;
        shipment.status = next;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        self.save_shipment_tx(&tx, &shipment)?;
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Transition,
            "shipment",
            Some(shipment_id.to_string()),
            json!({"previous_status": previous.as_str(), "new_status": next.as_str()}),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))
    }

    /// Moves every linked document of a shipment to `archived`.
    fn archive_linked_documents_tx(
        &self,
        tx: &rusqlite::Transaction<'_>,
        shipment_id: ShipmentId,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let documents = {
            let mut stmt = tx
                .prepare(
                    "SELECT record_json FROM documents
                     WHERE shipment_id = ?1 AND status = 'linked'",
                )
                .map_err(|err| StoreError::Io(err.to_string()))?;
            let rows = stmt
                .query_map(params![id_to_i64(shipment_id.get())], |row| row.get::<_, String>(0))
                .map_err(|err| StoreError::Io(err.to_string()))?;
            let mut documents: Vec<tracehub_core::Document> = Vec::new();
            for row in rows {
                let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
                documents.push(from_json(&json)?);
            }
            documents
        };
        for mut document in documents {
            let previous = document.status;
            document.status = DocumentStatus::Archived;
            tx.execute(
                "UPDATE documents SET status = ?2, record_json = ?3 WHERE id = ?1",
                params![
                    id_to_i64(document.id.get()),
                    document.status.as_str(),
                    to_json(&document)?
                ],
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
            self.append_audit_tx(
                tx,
                now,
                AuditAction::Transition,
                "document",
                Some(document.id.to_string()),
                json!({"previous_status": previous.as_str(), "new_status": "archived"}),
            )?;
        }
        Ok(())
    }
}
