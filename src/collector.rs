//! Collector façade.
//!
//! Fans a target's modules out across a bounded worker pool, runs the full
//! scrape pipeline for each (target, module) pair, and emits samples to the
//! caller's sink: raw samples first, then the derived node metrics, then
//! the per-module bookkeeping gauges. On scrape failure a single
//! `snmp_error` invalid sample is emitted for that module.

use crate::auth::Auth;
use crate::config::NamedModule;
use crate::derived::DerivedRegistry;
use crate::metrics::ExporterMetrics;
use crate::oid::Oid;
use crate::sample::{Sample, SampleKind};
use crate::scrape::{scrape_target, ScrapeOptions};
use crate::session::Connector;
use crate::trie::MetricTree;
use crate::varbind::VarBind;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Scrapes one target's modules and streams samples to a sink.
pub struct Collector<C> {
    connector: C,
    target: String,
    auth: Auth,
    modules: Vec<NamedModule>,
    metrics: ExporterMetrics,
    options: ScrapeOptions,
    registry: Arc<DerivedRegistry>,
    concurrency: usize,
    cancel: CancellationToken,
}

impl<C> Collector<C>
where
    C: Connector + Send + Sync + 'static,
    C::Session: 'static,
{
    /// Create a collector with default options, a fresh derived-metrics
    /// registry and no cancellation.
    pub fn new(
        connector: C,
        target: impl Into<String>,
        auth: Auth,
        modules: Vec<NamedModule>,
        metrics: ExporterMetrics,
    ) -> Self {
        Self {
            connector,
            target: target.into(),
            auth,
            modules,
            metrics,
            options: ScrapeOptions::default(),
            registry: Arc::new(DerivedRegistry::new()),
            concurrency: 1,
            cancel: CancellationToken::new(),
        }
    }

    /// Set the number of parallel module scrapes.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the scrape options.
    pub fn options(mut self, options: ScrapeOptions) -> Self {
        self.options = options;
        self
    }

    /// Share a process-wide derived-metrics registry.
    ///
    /// Collectors for different targets must share one registry for the
    /// cross-scrape derivations to see each other's history.
    pub fn registry(mut self, registry: Arc<DerivedRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Attach a cancellation token carrying the per-scrape deadline.
    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Scrape every module, emitting samples to `sink`.
    ///
    /// Spawns up to `concurrency` workers sharing the module queue and
    /// returns when all modules are done. Sample emission order across
    /// modules is not guaranteed.
    pub async fn collect(self: Arc<Self>, sink: mpsc::Sender<Sample>) {
        let worker_count = self.concurrency.max(1).min(self.modules.len().max(1));
        let queue: Arc<Mutex<VecDeque<NamedModule>>> =
            Arc::new(Mutex::new(self.modules.iter().cloned().collect()));

        let mut workers = JoinSet::new();
        for _ in 0..worker_count {
            let this = self.clone();
            let queue = queue.clone();
            let sink = sink.clone();
            workers.spawn(async move {
                loop {
                    let module = queue.lock().unwrap().pop_front();
                    let Some(module) = module else { break };

                    tracing::debug!(
                        target: "snmp_collector::collector",
                        module = %module.name,
                        "starting scrape"
                    );
                    let start = Instant::now();
                    this.collect_module(&module, &sink).await;
                    let duration = start.elapsed().as_secs_f64();
                    tracing::debug!(
                        target: "snmp_collector::collector",
                        module = %module.name,
                        duration_seconds = duration,
                        "finished scrape"
                    );
                    this.metrics
                        .collection_duration
                        .with_label_values(&[&module.name])
                        .observe(duration);
                }
            });
        }
        while workers.join_next().await.is_some() {}
    }

    async fn collect_module(&self, module: &NamedModule, sink: &mpsc::Sender<Sample>) {
        let start = Instant::now();
        let results = match scrape_target(
            &self.connector,
            &self.target,
            &self.auth,
            &module.module,
            &self.metrics,
            &self.options,
            &self.cancel,
        )
        .await
        {
            Ok(results) => results,
            Err(err) => {
                tracing::info!(
                    target: "snmp_collector::collector",
                    module = %module.name,
                    error = %err,
                    "error scraping target"
                );
                let _ = sink
                    .send(Sample::invalid("Error scraping target", err))
                    .await;
                return;
            }
        };

        let module_labels = vec![("module".to_string(), module.name.clone())];
        let bookkeeping = |name: &str, help: &str, value: f64| Sample::Metric {
            name: name.to_string(),
            help: help.to_string(),
            kind: SampleKind::Gauge,
            labels: module_labels.clone(),
            value,
        };
        let _ = sink
            .send(bookkeeping(
                "snmp_scrape_walk_duration_seconds",
                "Time SNMP walk/bulkwalk took.",
                start.elapsed().as_secs_f64(),
            ))
            .await;
        let _ = sink
            .send(bookkeeping(
                "snmp_scrape_packets_sent",
                "Packets sent for get, bulkget, and walk; including retries.",
                results.packets as f64,
            ))
            .await;
        let _ = sink
            .send(bookkeeping(
                "snmp_scrape_packets_retried",
                "Packets retried for get, bulkget, and walk.",
                results.retries as f64,
            ))
            .await;
        let _ = sink
            .send(bookkeeping(
                "snmp_scrape_pdus_returned",
                "PDUs returned from get, bulkget, and walk.",
                results.pdus.len() as f64,
            ))
            .await;

        let mut oid_to_pdu: HashMap<Oid, VarBind> = HashMap::with_capacity(results.pdus.len());
        for vb in results.pdus {
            oid_to_pdu.insert(vb.oid.clone(), vb);
        }

        let tree = MetricTree::build(&module.module.metrics);
        let state = self.registry.begin_scrape(&self.target);

        for (oid, vb) in &oid_to_pdu {
            let Some((metric, index_oids)) = tree.lookup(oid) else {
                continue;
            };

            let intercepted = match state.intercept(
                metric,
                index_oids,
                vb,
                &oid_to_pdu,
                self.options.wrap_counters,
                &self.metrics,
            ) {
                Ok(intercepted) => intercepted,
                Err(err) => {
                    let _ = sink
                        .send(Sample::invalid("Error scraping target", err))
                        .await;
                    return;
                }
            };
            if intercepted {
                continue;
            }

            let samples = match crate::sample::pdu_to_samples(
                index_oids,
                vb,
                metric,
                &oid_to_pdu,
                self.options.wrap_counters,
                &self.metrics,
            ) {
                Ok(samples) => samples,
                Err(err) => {
                    let _ = sink
                        .send(Sample::invalid("Error scraping target", err))
                        .await;
                    return;
                }
            };
            for sample in samples {
                let _ = sink.send(sample).await;
            }
        }

        for sample in state.finalize() {
            let _ = sink.send(sample).await;
        }

        let _ = sink
            .send(bookkeeping(
                "snmp_scrape_duration_seconds",
                "Total SNMP time scrape took (walk and processing).",
                start.elapsed().as_secs_f64(),
            ))
            .await;

        state.copy_history();
    }
}
