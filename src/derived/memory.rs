//! Memory derivation.
//!
//! Targets without the UCD `memAvailReal` object (typically Windows) get
//! their used/available memory synthesized from the host-resources run
//! table: the sum of per-process resident memory versus the physical
//! memory size.

use super::TargetRecord;
use crate::sample::Sample;

const MEM_USED_NAME: &str = "node_memory_MemUsed";
const MEM_AVAILABLE_NAME: &str = "node_memory_MemAvailable";

const MEM_USED_HELP: &str = "The amount of physical memory in use, in bytes.";
const MEM_AVAILABLE_HELP: &str = "The amount of physical memory not in use, in bytes.";

pub(super) fn memory_samples(record: &TargetRecord) -> Vec<Sample> {
    // Targets that report memAvailReal are covered by the rename table.
    if record.collected.contains("memAvailReal") || !record.collected.contains("hrSWRunPerfMem") {
        return Vec::new();
    }

    vec![
        Sample::gauge(
            MEM_USED_NAME,
            MEM_USED_HELP,
            Vec::new(),
            record.hr_sw_run_perf_mem * 1024.0,
        ),
        Sample::gauge(
            MEM_AVAILABLE_NAME,
            MEM_AVAILABLE_HELP,
            Vec::new(),
            (record.hr_memory_size - record.hr_sw_run_perf_mem) * 1024.0,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(collected: &[&str], memory_size: f64, perf_mem: f64) -> TargetRecord {
        TargetRecord {
            hr_memory_size: memory_size,
            hr_sw_run_perf_mem: perf_mem,
            collected: collected.iter().map(|s| s.to_string()).collect(),
            ..TargetRecord::default()
        }
    }

    #[test]
    fn test_synthesizes_when_mem_avail_real_missing() {
        let samples = memory_samples(&record(&["hrSWRunPerfMem"], 4096.0, 1024.0));
        assert_eq!(
            samples,
            vec![
                Sample::gauge(MEM_USED_NAME, MEM_USED_HELP, Vec::new(), 1024.0 * 1024.0),
                Sample::gauge(
                    MEM_AVAILABLE_NAME,
                    MEM_AVAILABLE_HELP,
                    Vec::new(),
                    3072.0 * 1024.0
                ),
            ]
        );
    }

    #[test]
    fn test_skipped_when_mem_avail_real_present() {
        let samples = memory_samples(&record(
            &["hrSWRunPerfMem", "memAvailReal"],
            4096.0,
            1024.0,
        ));
        assert!(samples.is_empty());
    }

    #[test]
    fn test_skipped_without_run_table() {
        let samples = memory_samples(&record(&["memTotalSwap"], 4096.0, 0.0));
        assert!(samples.is_empty());
    }
}
