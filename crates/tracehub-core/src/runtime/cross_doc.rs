// tracehub-core/src/runtime/cross_doc.rs
// ============================================================================
// Module: TraceHub Cross-Document Rules
// Description: XD-* rules comparing canonical fields across documents.
// Purpose: Detect disagreements between BoL, invoice, and packing list.
// Dependencies: crate::core::document, crate::runtime::rules
// ============================================================================

//! ## Overview
//! Cross-document rules compare canonical fields across the documents of one
//! shipment. A disagreement produces a WARNING, or an ERROR when one side is
//! authoritative: the Bill of Lading wins on container and B/L numbers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::document::CanonicalData;
use crate::core::document::DocumentType;
use crate::core::document::Severity;
use crate::runtime::rules::RuleContext;
use crate::runtime::rules::RuleDef;
use crate::runtime::rules::RuleResult;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Relative tolerance for cross-document weight comparison (policy ±1%).
pub const WEIGHT_TOLERANCE_RATIO: f64 = 0.01;

// ============================================================================
// SECTION: Field Access
// ============================================================================

/// Returns the packing list extraction when present.
fn packing_list_fields<'a>(
    ctx: &RuleContext<'a>,
) -> Option<&'a crate::core::document::PackingListFields> {
    ctx.primary(&DocumentType::PackingList)
        .and_then(|doc| doc.canonical_data.as_ref())
        .and_then(|data| match data {
            CanonicalData::PackingList(fields) => Some(fields),
            _ => None,
        })
}

/// Returns the invoice extraction when present.
fn invoice_fields<'a>(ctx: &RuleContext<'a>) -> Option<&'a crate::core::document::InvoiceFields> {
    ctx.primary(&DocumentType::CommercialInvoice)
        .and_then(|doc| doc.canonical_data.as_ref())
        .and_then(|data| match data {
            CanonicalData::Invoice(fields) => Some(fields),
            _ => None,
        })
}

// ============================================================================
// SECTION: Cross-Document Rules
// ============================================================================

/// XD-001: container number on the BoL matches the packing list.
///
/// The BoL is authoritative, so a mismatch is an ERROR.
fn rule_container_agreement(def: &RuleDef, ctx: &RuleContext<'_>) -> RuleResult {
    let bol_container =
        ctx.parsed_bol().and_then(|bol| bol.containers.first().map(String::as_str));
    let pl_container = packing_list_fields(ctx).and_then(|fields| fields.container_number.as_deref());
    match (bol_container, pl_container) {
        (Some(bol), Some(pl)) if !bol.trim().eq_ignore_ascii_case(pl.trim()) => RuleResult::fail(
            def,
            "container number on packing list disagrees with Bill of Lading",
            Some("container_number"),
        )
        .with_values(Some(bol.to_string()), Some(pl.to_string())),
        _ => RuleResult::pass(def, "container numbers agree"),
    }
}

/// XD-002: net weight on the invoice within tolerance of the packing list.
fn rule_weight_agreement(def: &RuleDef, ctx: &RuleContext<'_>) -> RuleResult {
    let invoice_net = invoice_fields(ctx).and_then(|fields| fields.net_weight_kg);
    let packing_net = packing_list_fields(ctx).and_then(|fields| fields.net_weight_kg);
    match (invoice_net, packing_net) {
        (Some(invoice), Some(packing)) if packing > 0.0 => {
            let deviation = ((invoice - packing) / packing).abs();
            if deviation > WEIGHT_TOLERANCE_RATIO {
                RuleResult::fail(
                    def,
                    "invoice net weight outside tolerance of packing list",
                    Some("net_weight_kg"),
                )
                .with_values(Some(format!("{packing:.1}")), Some(format!("{invoice:.1}")))
            } else {
                RuleResult::pass(def, "net weights agree within tolerance")
            }
        }
        _ => RuleResult::pass(def, "net weights not comparable"),
    }
}

/// XD-003: B/L number on the invoice matches the Bill of Lading.
///
/// The BoL is authoritative, so a mismatch is an ERROR.
fn rule_bol_number_agreement(def: &RuleDef, ctx: &RuleContext<'_>) -> RuleResult {
    let bol_number = ctx.parsed_bol().and_then(|bol| bol.bol_number.as_deref());
    let invoice_reference = ctx
        .primary(&DocumentType::CommercialInvoice)
        .and_then(|doc| doc.reference_number.as_deref());
    match (bol_number, invoice_reference) {
        (Some(bol), Some(inv)) if !bol.trim().eq_ignore_ascii_case(inv.trim()) => RuleResult::fail(
            def,
            "B/L number on invoice disagrees with Bill of Lading",
            Some("bl_number"),
        )
        .with_values(Some(bol.to_string()), Some(inv.to_string())),
        _ => RuleResult::pass(def, "B/L numbers agree"),
    }
}

// ============================================================================
// SECTION: Rule Registry
// ============================================================================

/// Cross-document rule set in declaration order.
pub const CROSS_DOC_RULES: &[RuleDef] = &[
    RuleDef {
        id: "XD-001",
        name: "Container number agreement",
        severity: Severity::Error,
        run: rule_container_agreement,
    },
    RuleDef {
        id: "XD-002",
        name: "Net weight agreement",
        severity: Severity::Warning,
        run: rule_weight_agreement,
    },
    RuleDef {
        id: "XD-003",
        name: "B/L number agreement",
        severity: Severity::Error,
        run: rule_bol_number_agreement,
    },
];

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
