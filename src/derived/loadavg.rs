//! Load average derivation.
//!
//! Targets that expose only `hrProcessorLoad` (a point-in-time per-CPU
//! percentage) get their 1/5/15-minute load averages reconstructed from
//! the rolling history of observations the registry keeps per target.

use super::TargetEntry;
use crate::sample::{label_value, Labels, Sample};

pub(crate) const NODE_LOAD1_NAME: &str = "node_load1";
pub(crate) const NODE_LOAD5_NAME: &str = "node_load5";
pub(crate) const NODE_LOAD15_NAME: &str = "node_load15";

pub(crate) const NODE_LOAD1_HELP: &str = "1m load average.";
pub(crate) const NODE_LOAD5_HELP: &str = "5m load average.";
pub(crate) const NODE_LOAD15_HELP: &str = "15m load average.";

/// Observations older than this are purged from the history.
pub(crate) const LOAD15_WINDOW_SECONDS: f64 = 15.0 * 60.0;

/// The averaging window for `node_load5`.
///
/// The current observation stands for the most recent minute, so the
/// history contributes at most four more minutes.
const LOAD5_WINDOW_SECONDS: f64 = 4.0 * 60.0;
const LOAD15_MEAN_WINDOW_SECONDS: f64 = 14.0 * 60.0;

pub(super) fn load_average_samples(entry: &TargetEntry) -> Vec<Sample> {
    let loadavg = entry.current.processor_load();
    if loadavg == -1.0 {
        return Vec::new();
    }

    let current_date = entry.current.hr_system_date;
    let history_loads = entry
        .history
        .as_ref()
        .map(|h| h.hr_processor_loads.as_slice())
        .unwrap_or_default();

    let windowed_mean = |window: f64| {
        let mut sum = loadavg;
        let mut count = 1usize;
        for sample in history_loads {
            if current_date - sample.hr_system_date < window {
                sum += sample.value;
                count += 1;
            }
        }
        sum / count as f64
    };

    vec![
        Sample::gauge(NODE_LOAD1_NAME, NODE_LOAD1_HELP, Vec::new(), loadavg),
        Sample::gauge(
            NODE_LOAD5_NAME,
            NODE_LOAD5_HELP,
            Vec::new(),
            windowed_mean(LOAD5_WINDOW_SECONDS),
        ),
        Sample::gauge(
            NODE_LOAD15_NAME,
            NODE_LOAD15_HELP,
            Vec::new(),
            windowed_mean(LOAD15_MEAN_WINDOW_SECONDS),
        ),
    ]
}

/// Rename handler for `laLoadFloat`: dispatch on the `laNames` label to the
/// matching `node_loadN` series, dropping all labels.
pub(super) fn la_load_samples(labels: &Labels, value: f64) -> Vec<Sample> {
    match label_value(labels, "laNames") {
        Some("Load-1") => vec![Sample::gauge(NODE_LOAD1_NAME, NODE_LOAD1_HELP, Vec::new(), value)],
        Some("Load-5") => vec![Sample::gauge(NODE_LOAD5_NAME, NODE_LOAD5_HELP, Vec::new(), value)],
        Some("Load-15") => vec![Sample::gauge(
            NODE_LOAD15_NAME,
            NODE_LOAD15_HELP,
            Vec::new(),
            value,
        )],
        _ => Vec::new(),
    }
}
