//! Metric lookup tree.
//!
//! A radix tree keyed on OID arcs, built per scrape from the module's
//! metric definitions. Matching an incoming PDU OID is a single descent;
//! the deepest node carrying a definition wins (longest-prefix match) and
//! the arcs beyond it form the index tail.

use crate::config::Metric;
use crate::oid::Oid;
use std::collections::HashMap;

#[derive(Default)]
struct Node<'a> {
    metric: Option<&'a Metric>,
    children: HashMap<u32, Node<'a>>,
}

/// Tree of metric definitions for fast OID matching.
///
/// Nodes hold references into the module configuration, so the tree is
/// bounded by a scrape's lifetime.
pub struct MetricTree<'a> {
    root: Node<'a>,
}

impl<'a> MetricTree<'a> {
    /// Build the tree from the module's metrics.
    ///
    /// Metric OIDs are unique within a module, so each terminal node holds
    /// at most one definition.
    pub fn build(metrics: &'a [Metric]) -> Self {
        let mut root = Node::default();
        for metric in metrics {
            let mut head = &mut root;
            for &arc in metric.oid.arcs() {
                head = head.children.entry(arc).or_default();
            }
            head.metric = Some(metric);
        }
        Self { root }
    }

    /// Match an OID against the tree.
    ///
    /// Returns the metric whose OID is the longest configured prefix of
    /// `oid`, plus the remaining arcs (the index tail). Returns `None` when
    /// no configured metric prefixes the OID; such PDUs are ignored.
    pub fn lookup<'o>(&self, oid: &'o Oid) -> Option<(&'a Metric, &'o [u32])> {
        let arcs = oid.arcs();
        let mut head = &self.root;
        let mut best: Option<(&'a Metric, &'o [u32])> = None;
        for (i, arc) in arcs.iter().enumerate() {
            head = head.children.get(arc)?;
            if let Some(metric) = head.metric {
                best = Some((metric, &arcs[i + 1..]));
            }
        }
        best
    }
}
