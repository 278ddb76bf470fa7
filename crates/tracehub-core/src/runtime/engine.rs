// tracehub-core/src/runtime/engine.rs
// ============================================================================
// Module: TraceHub Rules Engine
// Description: Deterministic rule evaluation and decision aggregation.
// Purpose: Produce APPROVE / HOLD / REJECT decisions per shipment.
// Dependencies: crate::core, crate::runtime::{cross_doc, eudr, matrix, rules}
// ============================================================================

//! ## Overview
//! The rules engine is the single canonical evaluation path. It runs the BoL
//! rules, the cross-document rules, and (when the shipment's HS codes are
//! EUDR-applicable) the product rules, in `rule_id`-ascending order, then
//! aggregates: one un-overridden ERROR rejects, otherwise one un-overridden
//! WARNING holds, otherwise the shipment is approved. Prior overrides are
//! re-applied by `(rule_id, field)` so re-evaluation never resurrects an
//! already-waived failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::document::Document;
use crate::core::document::DocumentIssue;
use crate::core::document::Severity;
use crate::core::shipment::Origin;
use crate::core::shipment::Product;
use crate::core::shipment::Shipment;
use crate::core::time::Timestamp;
use crate::runtime::cross_doc::CROSS_DOC_RULES;
use crate::runtime::eudr::EUDR_RULES;
use crate::runtime::matrix::ComplianceMatrix;
use crate::runtime::matrix::eudr_applicable;
use crate::runtime::rules::BOL_RULES;
use crate::runtime::rules::RuleContext;
use crate::runtime::rules::RuleDef;
use crate::runtime::rules::RuleResult;

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Aggregate compliance decision for a shipment.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// No blocking failures.
    Approve,
    /// At least one un-overridden WARNING and no ERRORs.
    Hold,
    /// At least one un-overridden ERROR.
    Reject,
}

impl Decision {
    /// Returns a stable label for the decision.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "APPROVE",
            Self::Hold => "HOLD",
            Self::Reject => "REJECT",
        }
    }
}

// ============================================================================
// SECTION: Evaluation Input
// ============================================================================

/// Complete input for one deterministic evaluation.
///
/// # Invariants
/// - `documents` contains only primary versions; superseded rows are the
///   store's concern and never reach the engine.
#[derive(Debug, Clone)]
pub struct EvaluationInput {
    /// Shipment under evaluation.
    pub shipment: Shipment,
    /// Product lines of the shipment.
    pub products: Vec<Product>,
    /// Origin attestations of the shipment.
    pub origins: Vec<Origin>,
    /// Primary documents of the shipment.
    pub documents: Vec<Document>,
    /// Prior issues carrying overrides to re-apply.
    pub prior_issues: Vec<DocumentIssue>,
}

// ============================================================================
// SECTION: Evaluation Report
// ============================================================================

/// Result of one rules engine evaluation.
///
/// # Invariants
/// - `results` is ordered by `rule_id` ascending.
/// - `active_failures` counts failed, un-overridden results only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Aggregate decision.
    pub decision: Decision,
    /// Every rule outcome in deterministic order.
    pub results: Vec<RuleResult>,
    /// Count of failed, un-overridden results.
    pub active_failures: usize,
    /// Evaluation timestamp supplied by the caller.
    pub evaluated_at: Timestamp,
}

// ============================================================================
// SECTION: Rules Engine
// ============================================================================

/// Deterministic rules engine over an immutable matrix snapshot.
pub struct RulesEngine<'a> {
    /// Compliance matrix snapshot consulted for applicability.
    matrix: &'a ComplianceMatrix,
}

impl<'a> RulesEngine<'a> {
    /// Creates an engine over a matrix snapshot.
    #[must_use]
    pub const fn new(matrix: &'a ComplianceMatrix) -> Self {
        Self { matrix }
    }

    /// Evaluates every applicable rule and aggregates the decision.
    ///
    /// Identical inputs produce identical reports in identical order.
    #[must_use]
    pub fn evaluate(&self, input: &EvaluationInput, now: Timestamp) -> EvaluationReport {
        let ctx = RuleContext {
            shipment: &input.shipment,
            products: &input.products,
            origins: &input.origins,
            documents: &input.documents,
        };

        let mut defs: Vec<&RuleDef> = Vec::new();
        defs.extend(BOL_RULES.iter());
        defs.extend(CROSS_DOC_RULES.iter());
        if self.shipment_is_eudr(input) {
            defs.extend(EUDR_RULES.iter());
        }
        defs.sort_by(|a, b| a.id.cmp(b.id));

        let mut results: Vec<RuleResult> = defs.iter().map(|def| (def.run)(def, &ctx)).collect();
        apply_overrides(&mut results, &input.prior_issues);

        let active_failures =
            results.iter().filter(|result| !result.passed && !result.overridden).count();
        let decision = aggregate(&results);

        EvaluationReport {
            decision,
            results,
            active_failures,
            evaluated_at: now,
        }
    }

    /// Returns true when any product line is EUDR-applicable.
    fn shipment_is_eudr(&self, input: &EvaluationInput) -> bool {
        let by_hs = input.products.iter().any(|product| eudr_applicable(&product.hs_code));
        let by_matrix = self
            .matrix
            .entry_for_product(&input.shipment.product_type)
            .is_some_and(|entry| entry.eudr_applicable);
        by_hs || (input.products.is_empty() && by_matrix)
    }
}

// ============================================================================
// SECTION: Aggregation
// ============================================================================

/// Aggregates rule results into a decision.
///
/// REJECT iff an un-overridden ERROR failure exists; HOLD iff no such
/// failure exists but an un-overridden WARNING failure does; APPROVE
/// otherwise.
#[must_use]
pub fn aggregate(results: &[RuleResult]) -> Decision {
    let mut has_warning = false;
    for result in results {
        if result.passed || result.overridden {
            continue;
        }
        match result.severity {
            Severity::Error => return Decision::Reject,
            Severity::Warning => has_warning = true,
            Severity::Info => {}
        }
    }
    if has_warning { Decision::Hold } else { Decision::Approve }
}

/// Re-applies prior overrides onto fresh results by `(rule_id, field)`.
fn apply_overrides(results: &mut [RuleResult], prior_issues: &[DocumentIssue]) {
    for result in results.iter_mut() {
        if result.passed {
            continue;
        }
        let overridden = prior_issues.iter().any(|issue| {
            issue.is_overridden && issue.rule_id == result.rule_id && issue.field == result.field
        });
        if overridden {
            result.overridden = true;
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
