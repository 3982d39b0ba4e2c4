//! # snmp-collector
//!
//! Collector core for an SNMP-to-Prometheus exporter.
//!
//! Given a target endpoint, a credential set and one or more *modules*
//! (declarative recipes of OIDs to fetch and how to interpret them), the
//! collector produces a stream of well-formed observability samples.
//!
//! ## Pipeline
//!
//! - [`scrape`] drives the session: GET batches, subtree walks, retries,
//!   timeouts and cancellation, with SNMPv1 quirks handled.
//! - [`filter`] rewrites the per-scrape plan from dynamic filter probes.
//! - [`trie`] matches returned OIDs to metric definitions and splits off
//!   the index tail.
//! - [`index`] decodes index tails into typed label strings.
//! - [`sample`] combines the above into samples, handling enums, BITS,
//!   DateAndTime, regex extraction, scaling and lookups.
//! - [`derived`] keeps per-target cross-scrape state and synthesizes
//!   node-exporter style CPU, memory and load metrics.
//! - [`collector`] fans modules out over a worker pool and emits samples.
//!
//! The SNMP wire protocol itself is behind the [`session`] traits; a
//! production transport plugs in via [`session::Connector`], and
//! [`session::MockSession`] serves tests.
//!
//! ## Quick start
//!
//! ```rust
//! use snmp_collector::{oid, Auth, Collector, ExporterMetrics, Sample};
//! use snmp_collector::config::{Index, Metric, MetricType, Module, NamedModule};
//! use snmp_collector::session::{MockConnector, MockSession};
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let session = MockSession::new();
//!     session.insert(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10, 1), 1234u64);
//!
//!     let module = Module {
//!         walk: vec![oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10)],
//!         metrics: vec![
//!             Metric::new("ifInOctets", oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10), MetricType::Counter)
//!                 .index(Index::new("ifIndex", MetricType::Integer32)),
//!         ],
//!         ..Module::default()
//!     };
//!
//!     let collector = Arc::new(Collector::new(
//!         MockConnector::new(session),
//!         "192.0.2.1",
//!         Auth::community("public"),
//!         vec![NamedModule::new("if_mib", module)],
//!         ExporterMetrics::unregistered(),
//!     ));
//!     let (tx, mut rx) = tokio::sync::mpsc::channel(64);
//!     collector.collect(tx).await;
//!
//!     let mut names = Vec::new();
//!     while let Some(sample) = rx.recv().await {
//!         names.push(sample.name().to_string());
//!     }
//!     assert!(names.iter().any(|name| name == "ifInOctets"));
//! }
//! ```

pub mod auth;
pub mod coerce;
pub mod collector;
pub mod config;
pub mod derived;
pub mod error;
pub mod filter;
pub mod index;
pub mod metrics;
pub mod oid;
pub mod sample;
pub mod scrape;
pub mod session;
pub mod trie;
pub mod value;
pub mod varbind;
pub mod version;

#[cfg(feature = "cli")]
pub mod cli;

// Re-exports for convenience
pub use auth::Auth;
pub use collector::Collector;
pub use config::{DynamicFilter, Index, Lookup, Metric, MetricType, Module, NamedModule, WalkParams};
pub use derived::DerivedRegistry;
pub use error::{Error, ErrorStatus, Result, ScrapePhase};
pub use metrics::ExporterMetrics;
pub use oid::Oid;
pub use sample::{Sample, SampleKind};
pub use scrape::{scrape_target, ScrapeOptions, ScrapeResults};
pub use session::{Connector, GetResponse, SessionConfig, SnmpSession};
pub use value::Value;
pub use varbind::VarBind;
pub use version::Version;
