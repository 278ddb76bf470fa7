// tracehub-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Data Store
// Description: Connection management, schema, sessions, and advisory locks.
// Purpose: Persist tenant-scoped entities with fail-closed isolation.
// Dependencies: rusqlite, serde_json, tracehub-core
// ============================================================================

//! ## Overview
//! The store opens one write connection guarded by a mutex (writes are
//! serialized, reads share the same handle under `SQLite` full-mutex mode)
//! and maintains a per-shipment advisory lock map keyed by a hash of the
//! shipment id. Sessions bind `current_org_id` and `is_system_admin` at open;
//! the tenant predicate is injected into every statement the session issues,
//! so an unscoped query cannot be expressed at all.
//!
//! Audit records that accompany a mutation are written inside the same
//! transaction as the mutation itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde_json::Value;
use tracehub_core::AuditAction;
use tracehub_core::AuditRecord;
use tracehub_core::OrgId;
use tracehub_core::RequestId;
use tracehub_core::ShipmentId;
use tracehub_core::Timestamp;
use tracehub_core::UserId;
use tracehub_core::interfaces::StoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default statement deadline (ms); database calls abort past this.
const DEFAULT_STATEMENT_DEADLINE_MS: u64 = 10_000;
/// Virtual-machine ops between progress handler callbacks.
const PROGRESS_HANDLER_OPS: i32 = 1_000;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the `SQLite` data store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory); `:memory:` is
///   accepted for tests.
/// - `statement_deadline_ms` bounds how long any statement batch may run
///   before the connection interrupts it.
#[derive(Debug, Clone)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds (lock-wait only).
    pub busy_timeout_ms: u64,
    /// Statement deadline in milliseconds (overall call bound).
    pub statement_deadline_ms: u64,
}

impl SqliteStoreConfig {
    /// Builds a config for the given path with default timeouts.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            statement_deadline_ms: DEFAULT_STATEMENT_DEADLINE_MS,
        }
    }

    /// Returns a copy with the statement deadline replaced.
    #[must_use]
    pub fn with_statement_deadline_ms(mut self, deadline_ms: u64) -> Self {
        self.statement_deadline_ms = deadline_ms;
        self
    }

    /// Builds an in-memory config for tests.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }
}

// ============================================================================
// SECTION: Session Scope
// ============================================================================

/// Tenant scope bound at session open.
///
/// # Invariants
/// - A scope with neither an organization nor the system-admin flag reads
///   zero rows and refuses writes.
#[derive(Debug, Clone)]
pub struct SessionScope {
    /// Organization bound as `current_org_id`.
    pub org_id: Option<OrgId>,
    /// Whether the session bypasses tenant predicates.
    pub is_system_admin: bool,
    /// Acting user recorded on audit rows.
    pub user_id: Option<UserId>,
    /// Request identifier recorded on audit rows.
    pub request_id: Option<RequestId>,
}

impl SessionScope {
    /// Builds a tenant-scoped session scope.
    #[must_use]
    pub const fn tenant(org_id: OrgId, user_id: UserId) -> Self {
        Self {
            org_id: Some(org_id),
            is_system_admin: false,
            user_id: Some(user_id),
            request_id: None,
        }
    }

    /// Builds a system-admin session scope.
    #[must_use]
    pub const fn system_admin(user_id: UserId) -> Self {
        Self {
            org_id: None,
            is_system_admin: true,
            user_id: Some(user_id),
            request_id: None,
        }
    }

    /// Builds a background-worker scope (system-level, no user).
    #[must_use]
    pub const fn worker() -> Self {
        Self {
            org_id: None,
            is_system_admin: true,
            user_id: None,
            request_id: None,
        }
    }

    /// Returns a copy with the request identifier set.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }
}

// ============================================================================
// SECTION: Data Store
// ============================================================================

/// `SQLite`-backed data store.
pub struct SqliteDataStore {
    /// Guarded connection; `SQLite` serializes writers through this mutex.
    pub(crate) conn: Arc<Mutex<Connection>>,
    /// Start instant of the current statement batch, reset on every
    /// connection acquisition; read by the progress handler.
    pub(crate) call_started: Arc<Mutex<std::time::Instant>>,
    /// Per-shipment advisory locks keyed by shipment-id hash bucket.
    shipment_locks: Mutex<HashMap<u64, Arc<Mutex<()>>>>,
}

impl SqliteDataStore {
    /// Opens (or creates) the database and initializes the schema.
    ///
    /// A progress handler enforces the configured statement deadline: any
    /// call still executing past it is interrupted and surfaces as
    /// [`StoreError::Io`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the database cannot be opened or the
    /// schema version is incompatible.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, StoreError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let mut connection = Connection::open_with_flags(&config.path, flags)
            .map_err(|err| StoreError::Io(err.to_string()))?;
        apply_pragmas(&connection, config)?;
        initialize_schema(&mut connection)?;

        let call_started = Arc::new(Mutex::new(std::time::Instant::now()));
        let deadline = std::time::Duration::from_millis(config.statement_deadline_ms);
        let handler_started = Arc::clone(&call_started);
        // A poisoned marker fails open: better a slow statement than a
        // spuriously interrupted one.
        let _ = connection.progress_handler(
            PROGRESS_HANDLER_OPS,
            Some(move || {
                handler_started.lock().map_or(false, |started| started.elapsed() > deadline)
            }),
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(connection)),
            call_started,
            shipment_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Opens a tenant session bound to the given scope.
    #[must_use]
    pub const fn session(&self, scope: SessionScope) -> TenantSession<'_> {
        TenantSession { store: self, scope }
    }

    /// Runs a closure under the advisory lock for one shipment.
    ///
    /// Document transitions, rule evaluations, and tracking ingestion for a
    /// single shipment serialize through this lock. The lock is never held
    /// across external I/O.
    ///
    /// # Errors
    ///
    /// Propagates the closure's error; lock poisoning maps to
    /// [`StoreError::Io`].
    pub fn with_shipment_lock<T, F>(&self, shipment_id: ShipmentId, f: F) -> Result<T, StoreError>
    where
        F: FnOnce() -> Result<T, StoreError>,
    {
        let key = shipment_lock_key(shipment_id);
        let lock = {
            let mut map = self
                .shipment_locks
                .lock()
                .map_err(|_| StoreError::Io("shipment lock map poisoned".to_string()))?;
            Arc::clone(map.entry(key).or_default())
        };
        let _guard =
            lock.lock().map_err(|_| StoreError::Io("shipment lock poisoned".to_string()))?;
        f()
    }
}

/// Returns the advisory lock key for a shipment (identity hash bucket).
const fn shipment_lock_key(shipment_id: ShipmentId) -> u64 {
    // A multiplicative hash keeps neighboring ids off the same bucket lock.
    shipment_id.get().wrapping_mul(0x9e37_79b9_7f4a_7c15)
}

// ============================================================================
// SECTION: Tenant Session
// ============================================================================

/// Transactional session bound to one tenant scope.
///
/// # Invariants
/// - Every statement issued through the session carries the tenant predicate.
/// - Writes naming a foreign organization fail [`StoreError::TenantMismatch`].
pub struct TenantSession<'a> {
    /// Owning store.
    pub(crate) store: &'a SqliteDataStore,
    /// Bound scope.
    pub(crate) scope: SessionScope,
}

impl TenantSession<'_> {
    /// Returns the bound organization, or fails for unscoped tenants.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unscoped`] when neither an organization nor the
    /// system-admin flag is bound.
    pub fn require_scope(&self) -> Result<(), StoreError> {
        if self.scope.org_id.is_none() && !self.scope.is_system_admin {
            return Err(StoreError::Unscoped);
        }
        Ok(())
    }

    /// Returns the bound organization id rendered for SQL, or `None` for
    /// system-admin sessions.
    pub(crate) fn org_param(&self) -> Option<i64> {
        self.scope.org_id.map(|org| org_to_i64(org))
    }

    /// Returns true when the session bypasses tenant predicates.
    pub(crate) const fn is_system_admin(&self) -> bool {
        self.scope.is_system_admin
    }

    /// Verifies that a write targets the session's own organization.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TenantMismatch`] for cross-tenant writes and
    /// [`StoreError::Unscoped`] for unscoped sessions.
    pub(crate) fn check_write_org(&self, target: OrgId) -> Result<(), StoreError> {
        if self.scope.is_system_admin {
            return Ok(());
        }
        match self.scope.org_id {
            Some(session) if session == target => Ok(()),
            Some(session) => Err(StoreError::TenantMismatch { target, session }),
            None => Err(StoreError::Unscoped),
        }
    }

    /// Appends an audit record inside the caller's transaction.
    pub(crate) fn append_audit_tx(
        &self,
        tx: &rusqlite::Transaction<'_>,
        now: Timestamp,
        action: AuditAction,
        resource_type: &str,
        resource_id: Option<String>,
        details: Value,
    ) -> Result<(), StoreError> {
        let record = AuditRecord {
            timestamp: now,
            organization_id: self.scope.org_id,
            user_id: self.scope.user_id,
            action,
            resource_type: resource_type.to_string(),
            resource_id,
            details,
            request_id: self.scope.request_id.clone(),
        };
        let json = serde_json::to_string(&record)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        tx.execute(
            "INSERT INTO audit_log (timestamp, organization_id, record_json) VALUES (?1, ?2, ?3)",
            params![now.unix_millis(), self.scope.org_id.map(org_to_i64), json],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }

    /// Lists audit records visible to the session, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure or unscoped sessions.
    pub fn list_audit(&self, limit: usize) -> Result<Vec<AuditRecord>, StoreError> {
        self.require_scope()?;
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT record_json FROM audit_log
                 WHERE (organization_id = ?1 OR ?2)
                 ORDER BY timestamp DESC, id DESC LIMIT ?3",
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
        let mut records = Vec::new();
        for row in rows {
            let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
            let record: AuditRecord = serde_json::from_str(&json)
                .map_err(|err| StoreError::Corrupt(err.to_string()))?;
            records.push(record);
        }
        Ok(records)
    }

    /// Locks the underlying connection and restarts the deadline clock.
    pub(crate) fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        let guard = self
            .store
            .conn
            .lock()
            .map_err(|_| StoreError::Io("connection mutex poisoned".to_string()))?;
        if let Ok(mut started) = self.store.call_started.lock() {
            *started = std::time::Instant::now();
        }
        Ok(guard)
    }

    /// Returns the next identifier for a table (serialized by the connection).
    pub(crate) fn next_id(
        &self,
        tx: &rusqlite::Transaction<'_>,
        table: &str,
    ) -> Result<u64, StoreError> {
        let sql = format!("SELECT COALESCE(MAX(id), 0) + 1 FROM {table}");
        let id: i64 = tx
            .query_row(&sql, params![], |row| row.get(0))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        u64::try_from(id).map_err(|_| StoreError::Corrupt("identifier overflow".to_string()))
    }
}

/// Renders an org id for SQL parameters.
///
/// Ids are assigned from rowid scale, so the conversion cannot fail in
/// practice; out-of-range values collapse to `i64::MAX` rather than wrap.
pub(crate) fn org_to_i64(org: OrgId) -> i64 {
    i64::try_from(org.get()).unwrap_or(i64::MAX)
}

/// Renders any numeric id for SQL parameters.
pub(crate) fn id_to_i64(id: u64) -> i64 {
    i64::try_from(id).unwrap_or(i64::MAX)
}

/// Serializes a record snapshot for storage.
pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|err| StoreError::Invalid(err.to_string()))
}

/// Deserializes a stored record snapshot.
pub(crate) fn from_json<T: serde::de::DeserializeOwned>(json: &str) -> Result<T, StoreError> {
    serde_json::from_str(json).map_err(|err| StoreError::Corrupt(err.to_string()))
}

// ============================================================================
// SECTION: Connection Setup
// ============================================================================

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(connection: &Connection, config: &SqliteStoreConfig) -> Result<(), StoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| StoreError::Io(err.to_string()))?;
    connection
        .execute_batch("PRAGMA journal_mode = wal;")
        .map_err(|err| StoreError::Io(err.to_string()))?;
    connection
        .execute_batch("PRAGMA synchronous = full;")
        .map_err(|err| StoreError::Io(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| StoreError::Io(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), StoreError> {
    let tx = connection.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| StoreError::Io(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| StoreError::Io(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| StoreError::Io(err.to_string()))?;
            tx.execute_batch(SCHEMA_SQL).map_err(|err| StoreError::Io(err.to_string()))?;
        }
        Some(SCHEMA_VERSION) => {}
        Some(found) => {
            return Err(StoreError::Corrupt(format!(
                "schema version mismatch: found {found}, expected {SCHEMA_VERSION}"
            )));
        }
    }
    tx.commit().map_err(|err| StoreError::Io(err.to_string()))
}

/// Full schema for version 1.
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS organizations (
    id INTEGER PRIMARY KEY,
    slug TEXT NOT NULL UNIQUE,
    record_json TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    organization_id INTEGER NOT NULL,
    record_json TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS memberships (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    organization_id INTEGER NOT NULL,
    record_json TEXT NOT NULL,
    UNIQUE (user_id, organization_id)
);
CREATE TABLE IF NOT EXISTS invitations (
    id INTEGER PRIMARY KEY,
    organization_id INTEGER NOT NULL,
    token_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    record_json TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_invitations_hash ON invitations (token_hash);
CREATE TABLE IF NOT EXISTS shipments (
    id INTEGER PRIMARY KEY,
    organization_id INTEGER NOT NULL,
    buyer_organization_id INTEGER,
    reference TEXT NOT NULL,
    status TEXT NOT NULL,
    record_json TEXT NOT NULL,
    UNIQUE (organization_id, reference)
);
CREATE INDEX IF NOT EXISTS idx_shipments_status ON shipments (status);
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY,
    shipment_id INTEGER NOT NULL,
    organization_id INTEGER NOT NULL,
    record_json TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_products_shipment ON products (shipment_id);
CREATE TABLE IF NOT EXISTS origins (
    id INTEGER PRIMARY KEY,
    shipment_id INTEGER NOT NULL,
    organization_id INTEGER NOT NULL,
    record_json TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_origins_shipment ON origins (shipment_id);
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY,
    shipment_id INTEGER NOT NULL,
    organization_id INTEGER,
    document_type TEXT NOT NULL,
    reference_number TEXT,
    status TEXT NOT NULL,
    is_primary INTEGER NOT NULL,
    expiry_date INTEGER,
    record_json TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_documents_shipment ON documents (shipment_id, document_type);
CREATE TABLE IF NOT EXISTS document_issues (
    id INTEGER PRIMARY KEY,
    document_id INTEGER NOT NULL,
    shipment_id INTEGER NOT NULL,
    organization_id INTEGER NOT NULL,
    rule_id TEXT NOT NULL,
    record_json TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_issues_shipment ON document_issues (shipment_id);
CREATE TABLE IF NOT EXISTS compliance_results (
    id INTEGER PRIMARY KEY,
    document_id INTEGER NOT NULL,
    organization_id INTEGER NOT NULL,
    record_json TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS container_events (
    id INTEGER PRIMARY KEY,
    shipment_id INTEGER NOT NULL,
    organization_id INTEGER NOT NULL,
    event_status TEXT NOT NULL,
    event_time INTEGER NOT NULL,
    source TEXT NOT NULL,
    record_json TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_events_dedup
    ON container_events (shipment_id, event_status, source, event_time);
CREATE TABLE IF NOT EXISTS reference_registry (
    organization_id INTEGER NOT NULL,
    shipment_id INTEGER NOT NULL,
    reference_number TEXT NOT NULL,
    document_type TEXT NOT NULL,
    first_seen_at INTEGER NOT NULL,
    PRIMARY KEY (shipment_id, document_type, reference_number)
);
CREATE TABLE IF NOT EXISTS notifications (
    id INTEGER PRIMARY KEY,
    organization_id INTEGER NOT NULL,
    user_id INTEGER,
    kind TEXT NOT NULL,
    shipment_id INTEGER,
    created_at INTEGER NOT NULL,
    emailed_at INTEGER,
    read_at INTEGER,
    record_json TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_notifications_feed
    ON notifications (organization_id, created_at);
CREATE TABLE IF NOT EXISTS notification_preferences (
    user_id INTEGER PRIMARY KEY,
    record_json TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS audit_log (
    id INTEGER PRIMARY KEY,
    timestamp INTEGER NOT NULL,
    organization_id INTEGER,
    record_json TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_audit_org_time ON audit_log (organization_id, timestamp);
";
