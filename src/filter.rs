//! Dynamic filter planner.
//!
//! Before the GET/WALK phases, each dynamic filter walks its probe OID,
//! matches the rendered row values against the filter's regex set, and
//! rewrites the scrape plan: filtered target columns leave the walk plan
//! and come back as index-qualified GETs for the allowed rows only.
//!
//! A failed probe walk never fails the scrape; the filter is skipped and
//! the original plan for its targets is kept.

use crate::coerce::pdu_value_as_string;
use crate::config::{DynamicFilter, MetricType, Module};
use crate::metrics::ExporterMetrics;
use crate::oid::Oid;
use crate::session::SnmpSession;
use crate::varbind::VarBind;
use crate::version::Version;
use regex::Regex;

/// The per-scrape fetch plan, after filter rewriting.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapePlan {
    /// Exact OIDs to GET.
    pub get: Vec<Oid>,
    /// Subtrees to WALK.
    pub walk: Vec<Oid>,
}

/// Apply the module's dynamic filters, producing the plan for this scrape.
///
/// Filters are processed in order, each pass updating the plan produced by
/// the previous one.
pub async fn apply_dynamic_filters<S: SnmpSession>(
    session: &S,
    module: &Module,
    metrics: &ExporterMetrics,
) -> ScrapePlan {
    let mut plan = ScrapePlan {
        get: module.get.clone(),
        walk: module.walk.clone(),
    };

    for filter in &module.filters {
        let pdus = if module.walk_params.version == Version::V1 {
            session.walk_all(&filter.oid).await
        } else {
            session.bulk_walk_all(&filter.oid).await
        };
        // Do not try to filter anything if we had errors.
        let pdus = match pdus {
            Ok(pdus) => pdus,
            Err(err) => {
                tracing::info!(
                    target: "snmp_collector::filter",
                    oid = %filter.oid,
                    error = %err,
                    "error walking filter probe, not filtering on this oid"
                );
                continue;
            }
        };

        let allowed = allowed_indices(filter, &pdus, metrics);

        plan.walk = update_walk_plan(&plan.walk, filter);
        plan.get = update_get_plan(&plan.get, filter);
        for target in &filter.targets {
            for &index in &allowed {
                tracing::debug!(
                    target: "snmp_collector::filter",
                    oid = %target.child(index),
                    "adding filtered get"
                );
                plan.get.push(target.child(index));
            }
        }
    }

    plan
}

/// Row indices of the probe PDUs whose rendered value matches any filter
/// pattern.
fn allowed_indices(filter: &DynamicFilter, pdus: &[VarBind], metrics: &ExporterMetrics) -> Vec<u32> {
    let patterns: Vec<Regex> = filter
        .values
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(err) => {
                tracing::debug!(
                    target: "snmp_collector::filter",
                    pattern = %pattern,
                    error = %err,
                    "invalid filter pattern, skipping"
                );
                None
            }
        })
        .collect();

    let mut allowed = Vec::new();
    for pdu in pdus {
        let value = pdu_value_as_string(pdu, Some(MetricType::DisplayString), metrics);
        if patterns.iter().any(|re| re.is_match(&value)) {
            if let Some(index) = pdu.oid.last_arc() {
                tracing::debug!(target: "snmp_collector::filter", index, "caching index");
                allowed.push(index);
            }
        }
    }
    allowed
}

/// Remove filter targets from the walk plan (exact matches).
fn update_walk_plan(walk: &[Oid], filter: &DynamicFilter) -> Vec<Oid> {
    walk.iter()
        .filter(|oid| {
            let filtered = filter.targets.contains(oid);
            if filtered {
                tracing::debug!(target: "snmp_collector::filter", oid = %oid, "deleting from walk plan");
            }
            !filtered
        })
        .cloned()
        .collect()
}

/// Remove OIDs under any filter target from the get plan.
fn update_get_plan(get: &[Oid], filter: &DynamicFilter) -> Vec<Oid> {
    get.iter()
        .filter(|oid| !filter.targets.iter().any(|target| oid.starts_with(target)))
        .cloned()
        .collect()
}
