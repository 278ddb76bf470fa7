// tracehub-core/src/runtime/rules.rs
// ============================================================================
// Module: TraceHub Bill-of-Lading Rules
// Description: Canonical BoL rule set and the placeholder predicate.
// Purpose: Evaluate BOL-001..BOL-011 as pure functions over rule context.
// Dependencies: crate::core::{document, shipment}, serde
// ============================================================================

//! ## Overview
//! Each rule is a pure function over a [`RuleContext`]; the engine runs every
//! registered rule in `rule_id`-ascending order and aggregates the results.
//! Rules read the parsed Bill of Lading when present and fall back to the
//! shipment columns it would have enriched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::document::CanonicalData;
use crate::core::document::Document;
use crate::core::document::DocumentType;
use crate::core::document::ParsedBol;
use crate::core::document::Severity;
use crate::core::shipment::Origin;
use crate::core::shipment::Product;
use crate::core::shipment::Shipment;

// ============================================================================
// SECTION: Placeholder Predicate
// ============================================================================

/// Canonical placeholder tokens (matched case-insensitively).
const PLACEHOLDER_TOKENS: &[&str] = &["TBD", "TBC", "PENDING", "PLACEHOLDER", "N/A", "NA", ""];

/// Returns true when a value is a placeholder.
///
/// A value is a placeholder iff it contains `-CNT-`, or equals one of
/// `TBD, TBC, PENDING, PLACEHOLDER, N/A, NA, ""`, all matched
/// case-insensitively. A missing value (`None`) is treated as a placeholder
/// by callers.
#[must_use]
pub fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.to_ascii_uppercase().contains("-CNT-") {
        return true;
    }
    PLACEHOLDER_TOKENS.iter().any(|token| trimmed.eq_ignore_ascii_case(token))
}

/// Returns true when an optional value is missing or a placeholder.
#[must_use]
pub fn is_missing_or_placeholder(value: Option<&str>) -> bool {
    value.is_none_or(is_placeholder)
}

// ============================================================================
// SECTION: Rule Context
// ============================================================================

/// Read-only evaluation context handed to every rule.
///
/// # Invariants
/// - `documents` contains only primary document versions.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Shipment under evaluation.
    pub shipment: &'a Shipment,
    /// Product lines of the shipment.
    pub products: &'a [Product],
    /// Origin attestations of the shipment.
    pub origins: &'a [Origin],
    /// Primary documents of the shipment.
    pub documents: &'a [Document],
}

impl<'a> RuleContext<'a> {
    /// Returns the primary document of the given type when present.
    #[must_use]
    pub fn primary(&self, document_type: &DocumentType) -> Option<&'a Document> {
        self.documents.iter().find(|doc| doc.is_primary && doc.document_type == *document_type)
    }

    /// Returns the parsed Bill of Lading extraction when present.
    #[must_use]
    pub fn parsed_bol(&self) -> Option<&'a ParsedBol> {
        self.primary(&DocumentType::BillOfLading)
            .and_then(|doc| doc.canonical_data.as_ref())
            .and_then(CanonicalData::as_bol)
    }
}

// ============================================================================
// SECTION: Rule Result
// ============================================================================

/// Outcome of one rule evaluation.
///
/// # Invariants
/// - `severity` is meaningful whether or not the rule passed; passed results
///   keep the rule's declared severity for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult {
    /// Rule identifier (e.g. `BOL-001`).
    pub rule_id: String,
    /// Human-readable rule name.
    pub rule_name: String,
    /// Declared severity of a failure.
    pub severity: Severity,
    /// Whether the rule passed.
    pub passed: bool,
    /// Outcome message.
    pub message: String,
    /// Field the rule examined.
    pub field: Option<String>,
    /// Expected value when applicable.
    pub expected: Option<String>,
    /// Actual value when applicable.
    pub actual: Option<String>,
    /// Whether a prior override suppresses this failure.
    pub overridden: bool,
}

impl RuleResult {
    /// Builds a passing result.
    #[must_use]
    pub fn pass(def: &RuleDef, message: impl Into<String>) -> Self {
        Self {
            rule_id: def.id.to_string(),
            rule_name: def.name.to_string(),
            severity: def.severity,
            passed: true,
            message: message.into(),
            field: None,
            expected: None,
            actual: None,
            overridden: false,
        }
    }

    /// Builds a failing result.
    #[must_use]
    pub fn fail(def: &RuleDef, message: impl Into<String>, field: Option<&str>) -> Self {
        Self {
            rule_id: def.id.to_string(),
            rule_name: def.name.to_string(),
            severity: def.severity,
            passed: false,
            message: message.into(),
            field: field.map(ToString::to_string),
            expected: None,
            actual: None,
            overridden: false,
        }
    }

    /// Returns a copy with expected/actual values attached.
    #[must_use]
    pub fn with_values(mut self, expected: Option<String>, actual: Option<String>) -> Self {
        self.expected = expected;
        self.actual = actual;
        self
    }
}

// ============================================================================
// SECTION: Rule Definition
// ============================================================================

/// Pure rule function signature.
pub type RuleFn = fn(&RuleDef, &RuleContext<'_>) -> RuleResult;

/// Static rule definition.
///
/// # Invariants
/// - `id` values are unique across all registered rule sets.
#[derive(Debug, Clone, Copy)]
pub struct RuleDef {
    /// Rule identifier; evaluation order is ascending by this value.
    pub id: &'static str,
    /// Human-readable rule name.
    pub name: &'static str,
    /// Declared failure severity.
    pub severity: Severity,
    /// Rule body.
    pub run: RuleFn,
}

// ============================================================================
// SECTION: BoL Field Access
// ============================================================================

/// Returns the effective B/L number (parsed BoL wins over shipment column).
fn effective_bol_number<'a>(ctx: &RuleContext<'a>) -> Option<&'a str> {
    ctx.parsed_bol()
        .and_then(|bol| bol.bol_number.as_deref())
        .or(ctx.shipment.bl_number.as_deref())
}

/// Returns the effective container number.
fn effective_container<'a>(ctx: &RuleContext<'a>) -> Option<&'a str> {
    ctx.parsed_bol()
        .and_then(|bol| bol.containers.first().map(String::as_str))
        .or(ctx.shipment.container_number.as_deref())
}

/// Validates an ISO 6346 container number (4 letters + 7 digits).
fn is_iso6346(container: &str) -> bool {
    let trimmed = container.trim();
    if trimmed.len() != 11 {
        return false;
    }
    let bytes = trimmed.as_bytes();
    bytes[..4].iter().all(u8::is_ascii_uppercase) && bytes[4..].iter().all(u8::is_ascii_digit)
}

// ============================================================================
// SECTION: BoL Rules
// ============================================================================

/// BOL-001: shipper name present and not a placeholder.
fn rule_shipper_present(def: &RuleDef, ctx: &RuleContext<'_>) -> RuleResult {
    let shipper = ctx.parsed_bol().and_then(|bol| bol.shipper.as_deref());
    let placeholder = is_missing_or_placeholder(shipper)
        || shipper.is_some_and(|name| name.trim().eq_ignore_ascii_case("unknown shipper"));
    if placeholder {
        RuleResult::fail(def, "shipper name missing or placeholder", Some("shipper"))
            .with_values(None, shipper.map(ToString::to_string))
    } else {
        RuleResult::pass(def, "shipper name present")
    }
}

/// BOL-002: consignee name present and not a placeholder.
fn rule_consignee_present(def: &RuleDef, ctx: &RuleContext<'_>) -> RuleResult {
    let consignee = ctx.parsed_bol().and_then(|bol| bol.consignee.as_deref());
    let placeholder = is_missing_or_placeholder(consignee)
        || consignee.is_some_and(|name| name.trim().eq_ignore_ascii_case("unknown consignee"));
    if placeholder {
        RuleResult::fail(def, "consignee name missing or placeholder", Some("consignee"))
            .with_values(None, consignee.map(ToString::to_string))
    } else {
        RuleResult::pass(def, "consignee name present")
    }
}

/// BOL-003: container number matches ISO 6346.
fn rule_container_format(def: &RuleDef, ctx: &RuleContext<'_>) -> RuleResult {
    match effective_container(ctx) {
        Some(container) if is_iso6346(container) => {
            RuleResult::pass(def, "container number matches ISO 6346")
        }
        Some(container) => RuleResult::fail(
            def,
            "container number does not match ISO 6346 (4 letters + 7 digits)",
            Some("container_number"),
        )
        .with_values(
            Some("AAAA0000000".to_string()),
            Some(container.to_string()),
        ),
        None => RuleResult::fail(def, "container number missing", Some("container_number")),
    }
}

/// BOL-004: B/L number present and not UNKNOWN.
fn rule_bol_number(def: &RuleDef, ctx: &RuleContext<'_>) -> RuleResult {
    let number = effective_bol_number(ctx);
    let missing = is_missing_or_placeholder(number)
        || number.is_some_and(|value| value.trim().eq_ignore_ascii_case("unknown"));
    if missing {
        RuleResult::fail(def, "B/L number missing or UNKNOWN", Some("bl_number"))
            .with_values(None, number.map(ToString::to_string))
    } else {
        RuleResult::pass(def, "B/L number present")
    }
}

/// BOL-005: port of loading specified.
fn rule_port_of_loading(def: &RuleDef, ctx: &RuleContext<'_>) -> RuleResult {
    let pol = ctx
        .parsed_bol()
        .and_then(|bol| bol.port_of_loading.as_deref())
        .or(ctx.shipment.pol_code.as_deref());
    if is_missing_or_placeholder(pol) {
        RuleResult::fail(def, "port of loading not specified", Some("pol_code"))
    } else {
        RuleResult::pass(def, "port of loading specified")
    }
}

/// BOL-006: at least one cargo description line.
fn rule_cargo_lines(def: &RuleDef, ctx: &RuleContext<'_>) -> RuleResult {
    let has_cargo = ctx.parsed_bol().is_some_and(|bol| !bol.cargo_items.is_empty())
        || !ctx.products.is_empty();
    if has_cargo {
        RuleResult::pass(def, "cargo description present")
    } else {
        RuleResult::fail(def, "no cargo description lines", Some("cargo_items"))
    }
}

/// BOL-007: at least one container attached.
fn rule_container_attached(def: &RuleDef, ctx: &RuleContext<'_>) -> RuleResult {
    if effective_container(ctx).is_some() {
        RuleResult::pass(def, "container attached")
    } else {
        RuleResult::fail(def, "no container attached", Some("containers"))
    }
}

/// BOL-008: port of discharge specified.
fn rule_port_of_discharge(def: &RuleDef, ctx: &RuleContext<'_>) -> RuleResult {
    let pod = ctx
        .parsed_bol()
        .and_then(|bol| bol.port_of_discharge.as_deref())
        .or(ctx.shipment.pod_code.as_deref());
    if is_missing_or_placeholder(pod) {
        RuleResult::fail(def, "port of discharge not specified", Some("pod_code"))
    } else {
        RuleResult::pass(def, "port of discharge specified")
    }
}

/// BOL-009: vessel name present.
fn rule_vessel(def: &RuleDef, ctx: &RuleContext<'_>) -> RuleResult {
    let vessel = ctx
        .parsed_bol()
        .and_then(|bol| bol.vessel.as_deref())
        .or(ctx.shipment.vessel.as_deref());
    if is_missing_or_placeholder(vessel) {
        RuleResult::fail(def, "vessel name missing", Some("vessel"))
    } else {
        RuleResult::pass(def, "vessel name present")
    }
}

/// BOL-010: voyage number present.
fn rule_voyage(def: &RuleDef, ctx: &RuleContext<'_>) -> RuleResult {
    let voyage = ctx
        .parsed_bol()
        .and_then(|bol| bol.voyage.as_deref())
        .or(ctx.shipment.voyage.as_deref());
    if is_missing_or_placeholder(voyage) {
        RuleResult::fail(def, "voyage number missing", Some("voyage"))
    } else {
        RuleResult::pass(def, "voyage number present")
    }
}

/// BOL-011: parser confidence at least 0.50.
fn rule_parser_confidence(def: &RuleDef, ctx: &RuleContext<'_>) -> RuleResult {
    match ctx.parsed_bol() {
        Some(bol) if bol.confidence >= 0.50 => RuleResult::pass(def, "parser confidence adequate"),
        Some(bol) => RuleResult::fail(def, "parser confidence below 0.50", Some("confidence"))
            .with_values(Some("0.50".to_string()), Some(format!("{:.2}", bol.confidence))),
        None => RuleResult::fail(def, "no parsed Bill of Lading", Some("confidence")),
    }
}

// ============================================================================
// SECTION: Rule Registry
// ============================================================================

/// Canonical BoL rule set in declaration order.
pub const BOL_RULES: &[RuleDef] = &[
    RuleDef {
        id: "BOL-001",
        name: "Shipper name present",
        severity: Severity::Error,
        run: rule_shipper_present,
    },
    RuleDef {
        id: "BOL-002",
        name: "Consignee name present",
        severity: Severity::Error,
        run: rule_consignee_present,
    },
    RuleDef {
        id: "BOL-003",
        name: "Container number format",
        severity: Severity::Warning,
        run: rule_container_format,
    },
    RuleDef {
        id: "BOL-004",
        name: "B/L number present",
        severity: Severity::Error,
        run: rule_bol_number,
    },
    RuleDef {
        id: "BOL-005",
        name: "Port of loading specified",
        severity: Severity::Warning,
        run: rule_port_of_loading,
    },
    RuleDef {
        id: "BOL-006",
        name: "Cargo description present",
        severity: Severity::Warning,
        run: rule_cargo_lines,
    },
    RuleDef {
        id: "BOL-007",
        name: "Container attached",
        severity: Severity::Warning,
        run: rule_container_attached,
    },
    RuleDef {
        id: "BOL-008",
        name: "Port of discharge specified",
        severity: Severity::Warning,
        run: rule_port_of_discharge,
    },
    RuleDef {
        id: "BOL-009",
        name: "Vessel name present",
        severity: Severity::Info,
        run: rule_vessel,
    },
    RuleDef {
        id: "BOL-010",
        name: "Voyage number present",
        severity: Severity::Info,
        run: rule_voyage,
    },
    RuleDef {
        id: "BOL-011",
        name: "Parser confidence",
        severity: Severity::Info,
        run: rule_parser_confidence,
    },
];

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
