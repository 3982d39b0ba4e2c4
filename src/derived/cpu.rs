//! CPU utilization derivation.
//!
//! Synthesizes `node_cpu_average` percentages from the delta of the raw
//! CPU tick counters between the previous and the current scrape. When a
//! target exposes no raw counters (typically Windows), the per-process
//! run-table ticks are classified into user/system/idle instead.

use super::TargetEntry;
use crate::sample::{Sample, SampleKind};

const NODE_CPU_AVERAGE_NAME: &str = "node_cpu_average";
const NODE_CPU_AVERAGE_HELP: &str = "The percentage of CPU utilization.";

fn cpu_sample(mode: &str, value: f64) -> Sample {
    Sample::Metric {
        name: NODE_CPU_AVERAGE_NAME.to_string(),
        help: NODE_CPU_AVERAGE_HELP.to_string(),
        kind: SampleKind::Gauge,
        labels: vec![
            ("cpu".to_string(), "All".to_string()),
            ("mode".to_string(), mode.to_string()),
        ],
        value,
    }
}

pub(super) fn cpu_average_samples(entry: &TargetEntry) -> Vec<Sample> {
    let mut samples = Vec::new();

    let Some(history) = &entry.history else {
        return samples;
    };
    let current = &entry.current;
    if current.hr_system_date <= history.hr_system_date {
        return samples;
    }

    let total_ticks = current.total_cpu_ticks() - history.total_cpu_ticks();
    if total_ticks <= 0.0 {
        // No raw counters moved; fall back to classifying per-process ticks.
        let mut idle_ticks = 0.0;
        let mut user_ticks = 0.0;
        let mut system_ticks = 0.0;
        for (index, current_item) in &current.hr_sw_run_perf_cpu {
            let mut ticks = current_item.ticks;
            if let Some(history_item) = history.hr_sw_run_perf_cpu.get(index) {
                ticks -= history_item.ticks;
            }
            if ticks <= 0.0 {
                ticks = 0.0;
            }

            // "2" == "operatingSystem"
            if current_item.run_type == "2" {
                if current.hr_sw_run_name.get(index).map(String::as_str)
                    == Some("System Idle Process")
                {
                    idle_ticks = ticks;
                } else {
                    system_ticks += ticks;
                }
            } else {
                user_ticks += ticks;
            }
        }

        if user_ticks <= 0.0 && system_ticks <= 0.0 && idle_ticks <= 0.0 {
            return samples;
        }

        let total_ticks = user_ticks + system_ticks + idle_ticks;
        samples.push(cpu_sample("user", user_ticks / total_ticks * 100.0));
        samples.push(cpu_sample("system", system_ticks / total_ticks * 100.0));
        samples.push(cpu_sample("idle", idle_ticks / total_ticks * 100.0));
        return samples;
    }

    let modes = [
        ("user", current.ss_cpu_raw_user - history.ss_cpu_raw_user),
        ("nice", current.ss_cpu_raw_nice - history.ss_cpu_raw_nice),
        ("system", current.ss_cpu_raw_system - history.ss_cpu_raw_system),
        ("idle", current.ss_cpu_raw_idle - history.ss_cpu_raw_idle),
        ("wait", current.ss_cpu_raw_wait - history.ss_cpu_raw_wait),
        ("kernel", current.ss_cpu_raw_kernel - history.ss_cpu_raw_kernel),
        (
            "irq",
            current.ss_cpu_raw_interrupt - history.ss_cpu_raw_interrupt,
        ),
        (
            "softirq",
            current.ss_cpu_raw_softirq - history.ss_cpu_raw_softirq,
        ),
        ("steal", current.ss_cpu_raw_steal - history.ss_cpu_raw_steal),
        ("guest", current.ss_cpu_raw_guest - history.ss_cpu_raw_guest),
    ];
    for (mode, diff) in modes {
        if diff >= 0.0 {
            samples.push(cpu_sample(mode, diff / total_ticks * 100.0));
        }
    }

    samples
}
