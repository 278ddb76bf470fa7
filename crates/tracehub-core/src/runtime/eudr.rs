// tracehub-core/src/runtime/eudr.rs
// ============================================================================
// Module: TraceHub EUDR Product Rules
// Description: EUDR-* rules for deforestation-regulated commodities.
// Purpose: Validate geolocation, cutoff dates, and attestation presence.
// Dependencies: crate::core, crate::runtime::{matrix, rules}
// ============================================================================

//! ## Overview
//! Product rules run only when the shipment carries an EUDR-applicable HS
//! code; horn/hoof shipments never produce `EUDR-*` results. The engine
//! filters on [`crate::runtime::matrix::eudr_applicable`] before invoking
//! this set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::document::Severity;
use crate::core::time::Timestamp;
use crate::runtime::matrix::EUDR_PRODUCTION_CUTOFF_MILLIS;
use crate::runtime::rules::RuleContext;
use crate::runtime::rules::RuleDef;
use crate::runtime::rules::RuleResult;

// ============================================================================
// SECTION: EUDR Rules
// ============================================================================

/// EUDR-GEO: geolocation coordinates present and within valid ranges.
fn rule_geolocation(def: &RuleDef, ctx: &RuleContext<'_>) -> RuleResult {
    if ctx.origins.is_empty() {
        return RuleResult::fail(def, "no origin geolocation recorded", Some("geolocation"));
    }
    for origin in ctx.origins {
        let geo = &origin.geolocation;
        if !(-90.0..=90.0).contains(&geo.lat) || !(-180.0..=180.0).contains(&geo.lng) {
            return RuleResult::fail(
                def,
                "origin geolocation outside valid coordinate ranges",
                Some("geolocation"),
            )
            .with_values(
                Some("lat in [-90, 90], lng in [-180, 180]".to_string()),
                Some(format!("lat={}, lng={}", geo.lat, geo.lng)),
            );
        }
    }
    RuleResult::pass(def, "origin geolocation present and valid")
}

/// EUDR-DATE: production after the regulatory cutoff (2020-12-31).
fn rule_production_date(def: &RuleDef, ctx: &RuleContext<'_>) -> RuleResult {
    let cutoff = Timestamp::from_unix_millis(EUDR_PRODUCTION_CUTOFF_MILLIS);
    if ctx.origins.is_empty() {
        return RuleResult::fail(def, "no production window recorded", Some("production_start_date"));
    }
    for origin in ctx.origins {
        match origin.production_start_date {
            Some(start) if start > cutoff => {}
            Some(start) => {
                return RuleResult::fail(
                    def,
                    "production window begins before the regulatory cutoff",
                    Some("production_start_date"),
                )
                .with_values(
                    Some("after 2020-12-31".to_string()),
                    start.format_rfc3339().ok(),
                );
            }
            None => {
                return RuleResult::fail(
                    def,
                    "production start date missing",
                    Some("production_start_date"),
                );
            }
        }
    }
    RuleResult::pass(def, "production window after regulatory cutoff")
}

/// EUDR-STMT: deforestation-free statement attached.
fn rule_statement(def: &RuleDef, ctx: &RuleContext<'_>) -> RuleResult {
    let attested = ctx.origins.iter().all(|origin| {
        origin
            .deforestation_free_statement
            .as_deref()
            .is_some_and(|statement| !statement.trim().is_empty())
    });
    if ctx.origins.is_empty() || !attested {
        return RuleResult::fail(
            def,
            "deforestation-free statement missing",
            Some("deforestation_free_statement"),
        );
    }
    RuleResult::pass(def, "deforestation-free statement attached")
}

/// EUDR-RISK: production country risk classification present.
fn rule_country_risk(def: &RuleDef, ctx: &RuleContext<'_>) -> RuleResult {
    let has_country = !ctx.origins.is_empty()
        && ctx.origins.iter().all(|origin| !origin.country.trim().is_empty());
    if has_country {
        RuleResult::pass(def, "production country recorded for risk classification")
    } else {
        RuleResult::fail(def, "production country missing", Some("country"))
    }
}

// ============================================================================
// SECTION: Rule Registry
// ============================================================================

/// EUDR product rule set in declaration order.
pub const EUDR_RULES: &[RuleDef] = &[
    RuleDef {
        id: "EUDR-DATE",
        name: "Production after cutoff",
        severity: Severity::Error,
        run: rule_production_date,
    },
    RuleDef {
        id: "EUDR-GEO",
        name: "Origin geolocation",
        severity: Severity::Error,
        run: rule_geolocation,
    },
    RuleDef {
        id: "EUDR-RISK",
        name: "Country risk classification",
        severity: Severity::Warning,
        run: rule_country_risk,
    },
    RuleDef {
        id: "EUDR-STMT",
        name: "Deforestation-free statement",
        severity: Severity::Error,
        run: rule_statement,
    },
];
