//! Derived node metrics.
//!
//! A process-wide registry keeps, per target, the most recent and previous
//! scrape's system-level counters (raw CPU ticks, per-process CPU/memory,
//! processor loads, system date). From those it synthesizes the gauges a
//! node exporter would publish natively: CPU percent per mode, memory
//! used/available, and 1/5/15-minute load averages.
//!
//! Independently of the cross-scrape state, a static table renames ~40
//! well-known SNMP metrics to their `node_*` equivalents at emission time,
//! optionally rewriting labels and values.

mod cpu;
mod filesystem;
mod loadavg;
mod memory;
mod renames;

use crate::config::Metric;
use crate::error::Result;
use crate::metrics::ExporterMetrics;
use crate::oid::Oid;
use crate::sample::{
    indexes_to_labels, label_value, parse_date_and_time, Labels, Sample, SampleKind,
};
use crate::varbind::VarBind;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

pub(crate) use loadavg::LOAD15_WINDOW_SECONDS;

/// One processor-load observation kept in the rolling history.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LoadSample {
    /// `hrSystemDate` at observation time, unix seconds.
    pub hr_system_date: f64,
    /// The load average observed.
    pub value: f64,
}

/// Per-process CPU accounting from the host-resources run table.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PerfCpu {
    /// `hrSWRunType` of the process ("2" is operatingSystem).
    pub run_type: String,
    /// Centi-seconds of CPU consumed.
    pub ticks: f64,
}

/// The system-level counters of one scrape of one target.
#[derive(Debug, Clone, Default)]
pub(crate) struct TargetRecord {
    pub ss_cpu_raw_user: f64,
    pub ss_cpu_raw_nice: f64,
    pub ss_cpu_raw_system: f64,
    pub ss_cpu_raw_idle: f64,
    pub ss_cpu_raw_wait: f64,
    pub ss_cpu_raw_kernel: f64,
    pub ss_cpu_raw_interrupt: f64,
    pub ss_cpu_raw_softirq: f64,
    pub ss_cpu_raw_steal: f64,
    pub ss_cpu_raw_guest: f64,
    /// `hrSystemDate` of this scrape, unix seconds.
    pub hr_system_date: f64,
    /// Per-processor `hrProcessorLoad` gauges seen this scrape.
    pub hr_processor_load: Vec<f64>,
    /// Rolling load observations (history records only).
    pub hr_processor_loads: Vec<LoadSample>,
    /// `hrMemorySize` in KBytes.
    pub hr_memory_size: f64,
    /// Sum of `hrSWRunPerfMem` across processes, KBytes.
    pub hr_sw_run_perf_mem: f64,
    /// `hrSWRunPerfCPU` keyed by run index.
    pub hr_sw_run_perf_cpu: HashMap<String, PerfCpu>,
    /// `hrSWRunName` keyed by run index (current scrape only).
    pub hr_sw_run_name: HashMap<String, String>,
    /// Names of the metrics matched this scrape.
    pub collected: HashSet<String>,
}

impl TargetRecord {
    /// Sum of all ten raw CPU counters.
    pub(crate) fn total_cpu_ticks(&self) -> f64 {
        self.ss_cpu_raw_user
            + self.ss_cpu_raw_nice
            + self.ss_cpu_raw_system
            + self.ss_cpu_raw_idle
            + self.ss_cpu_raw_wait
            + self.ss_cpu_raw_kernel
            + self.ss_cpu_raw_interrupt
            + self.ss_cpu_raw_softirq
            + self.ss_cpu_raw_steal
            + self.ss_cpu_raw_guest
    }

    /// Mean of this scrape's processor loads, or -1 when none were seen.
    pub(crate) fn processor_load(&self) -> f64 {
        if self.hr_processor_load.is_empty() {
            return -1.0;
        }
        self.hr_processor_load.iter().sum::<f64>() / self.hr_processor_load.len() as f64
    }
}

#[derive(Debug, Default)]
pub(crate) struct TargetEntry {
    pub current: TargetRecord,
    pub history: Option<TargetRecord>,
}

/// Process-wide per-target state.
///
/// The registry map is guarded for concurrent inserts; each entry carries
/// its own mutex which the collector holds for the duration of one
/// scrape's PDU processing and derivation. Concurrent scrapes of the same
/// target are unsupported and must be serialized by the caller.
#[derive(Default)]
pub struct DerivedRegistry {
    targets: RwLock<HashMap<String, Arc<Mutex<TargetEntry>>>>,
}

impl DerivedRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry for `target`, created on first use.
    pub(crate) fn target(&self, target: &str) -> Arc<Mutex<TargetEntry>> {
        if let Some(entry) = self.targets.read().unwrap().get(target) {
            return entry.clone();
        }
        self.targets
            .write()
            .unwrap()
            .entry(target.to_string())
            .or_default()
            .clone()
    }

    /// Lock `target` for one scrape, resetting its current record.
    pub fn begin_scrape(&self, target: &str) -> ScrapeState {
        let entry = self.target(target);
        {
            let mut guard = entry.lock().unwrap();
            guard.current = TargetRecord::default();
        }
        ScrapeState { entry }
    }
}

/// Handle to one target's record for the duration of a scrape.
///
/// Obtained from [`DerivedRegistry::begin_scrape`]; the per-target mutex is
/// acquired per call, but the collector processes one scrape of a target
/// at a time, so the record is consistent across the scrape.
pub struct ScrapeState {
    entry: Arc<Mutex<TargetEntry>>,
}

impl ScrapeState {
    fn lock(&self) -> MutexGuard<'_, TargetEntry> {
        self.entry.lock().unwrap()
    }

    /// Intercept a matched PDU.
    ///
    /// Recognized system metrics are recorded into the current record;
    /// returns `true` when the PDU is fully consumed and no sample should
    /// be emitted for it.
    pub fn intercept(
        &self,
        metric: &Metric,
        index_oids: &[u32],
        vb: &VarBind,
        oid_to_pdu: &HashMap<Oid, VarBind>,
        wrap_counters: bool,
        metrics: &ExporterMetrics,
    ) -> Result<bool> {
        let value = crate::coerce::pdu_value(&vb.value, wrap_counters);
        let mut entry = self.lock();
        let record = &mut entry.current;
        record.collected.insert(metric.name.clone());

        let consumed = match metric.name.as_str() {
            "ssCpuRawUser" => {
                record.ss_cpu_raw_user = value;
                true
            }
            "ssCpuRawNice" => {
                record.ss_cpu_raw_nice = value;
                true
            }
            "ssCpuRawSystem" => {
                record.ss_cpu_raw_system = value;
                true
            }
            "ssCpuRawIdle" => {
                record.ss_cpu_raw_idle = value;
                true
            }
            "ssCpuRawWait" => {
                record.ss_cpu_raw_wait = value;
                true
            }
            "ssCpuRawKernel" => {
                record.ss_cpu_raw_kernel = value;
                true
            }
            "ssCpuRawInterrupt" => {
                record.ss_cpu_raw_interrupt = value;
                true
            }
            "ssCpuRawSoftIRQ" => {
                record.ss_cpu_raw_softirq = value;
                true
            }
            "ssCpuRawSteal" => {
                record.ss_cpu_raw_steal = value;
                true
            }
            "ssCpuRawGuest" => {
                record.ss_cpu_raw_guest = value;
                true
            }
            "hrSystemDate" => {
                record.hr_system_date = parse_date_and_time(vb).unwrap_or_default();
                true
            }
            "hrSWRunPerfMem" => {
                record.hr_sw_run_perf_mem += value;
                true
            }
            "hrSWRunPerfCPU" => {
                let labels = indexes_to_labels(index_oids, metric, oid_to_pdu, metrics)?;
                let index = label_value(&labels, "hrSWRunIndex").unwrap_or_default();
                record.hr_sw_run_perf_cpu.insert(
                    index.to_string(),
                    PerfCpu {
                        run_type: label_value(&labels, "hrSWRunType")
                            .unwrap_or_default()
                            .to_string(),
                        ticks: value,
                    },
                );
                true
            }
            "hrSWRunName" => {
                let labels = indexes_to_labels(index_oids, metric, oid_to_pdu, metrics)?;
                let index = label_value(&labels, "hrSWRunIndex").unwrap_or_default();
                let name = vb
                    .value
                    .as_bytes()
                    .map(|b| String::from_utf8_lossy(b).into_owned())
                    .unwrap_or_default();
                record.hr_sw_run_name.insert(index.to_string(), name);
                true
            }
            // Recorded for derivation but still emitted normally.
            "hrMemorySize" => {
                record.hr_memory_size = value;
                false
            }
            "hrProcessorLoad" => {
                record.hr_processor_load.push(value);
                false
            }
            _ => false,
        };
        Ok(consumed)
    }

    /// Derive the end-of-scrape samples: CPU averages, synthesized memory,
    /// load averages.
    pub fn finalize(&self) -> Vec<Sample> {
        let entry = self.lock();
        let mut samples = cpu::cpu_average_samples(&entry);
        samples.extend(memory::memory_samples(&entry.current));
        samples.extend(loadavg::load_average_samples(&entry));
        samples
    }

    /// Replicate the current record into the rolling history.
    ///
    /// Keeps the raw CPU counters, `hrSystemDate`, the purged processor
    /// load observations and `hrSWRunPerfCPU`; everything else starts
    /// fresh next scrape.
    pub fn copy_history(&self) {
        let mut entry = self.lock();

        let mut loads = entry
            .history
            .as_ref()
            .map(|h| h.hr_processor_loads.clone())
            .unwrap_or_default();
        let current_date = entry.current.hr_system_date;
        loads.retain(|sample| current_date - sample.hr_system_date < LOAD15_WINDOW_SECONDS);

        let loadavg = entry.current.processor_load();
        if loadavg != -1.0 {
            loads.push(LoadSample {
                hr_system_date: current_date,
                value: loadavg,
            });
        }

        // Snapshot keeps the ten raw counters, the system date and the
        // run-table CPU map; everything else is current-scrape-only.
        let snapshot = entry.current.clone();
        entry.history = Some(TargetRecord {
            hr_processor_loads: loads,
            hr_processor_load: Vec::new(),
            hr_memory_size: 0.0,
            hr_sw_run_perf_mem: 0.0,
            hr_sw_run_name: HashMap::new(),
            collected: HashSet::new(),
            ..snapshot
        });
    }
}

/// Rewrite a sample through the node-metric rename table.
///
/// Returns `None` when the metric is not in the table (or its declared
/// type does not match), in which case the sample is emitted as-is.
pub(crate) fn rename_sample(
    metric: &Metric,
    kind: SampleKind,
    value: f64,
    labels: &Labels,
) -> Option<Vec<Sample>> {
    renames::rename_sample(metric, kind, value, labels)
}

/// Strip a trailing `- 1.3.6.1...` OID reference from generated help text.
pub(crate) fn remove_oid_suffix(help: &str) -> String {
    static OID_SUFFIX: std::sync::LazyLock<regex::Regex> =
        std::sync::LazyLock::new(|| regex::Regex::new(r"- (\d+\.)*\d+$").unwrap());
    match OID_SUFFIX.find(help) {
        Some(found) => help[..found.start()].to_string(),
        None => help.to_string(),
    }
}
