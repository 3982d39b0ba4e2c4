//! Filesystem and virtual-memory derivation from `hrStorageSize`.
//!
//! The host-resources storage table mixes physical disks, RAM and virtual
//! memory into one table. The rename handler splits a storage row into
//! `node_filesystem_size/used/free` for fixed disks and a virtual-memory
//! total for the "Virtual Memory" row, using the row's companion labels
//! (allocation units, type, description, used) produced by the module's
//! lookups.

use super::remove_oid_suffix;
use crate::config::Metric;
use crate::sample::{label_value, Labels, Sample, SampleKind};

const HR_STORAGE_VIRTUAL_MEMORY: &str = "3";
const HR_STORAGE_FIXED_DISK: &str = "4";

const FILESYSTEM_SIZE_NAME: &str = "node_filesystem_size";
const FILESYSTEM_USED_NAME: &str = "node_filesystem_used";
const FILESYSTEM_FREE_NAME: &str = "node_filesystem_free";

const FILESYSTEM_USED_HELP: &str = "The used size of the filesystem";
const FILESYSTEM_FREE_HELP: &str = "The free size of the filesystem";

const MEM_VIRTUAL_NAME: &str = "node_memory_VirtualMemoryTotal";
const MEM_VIRTUAL_HELP: &str = "The total size of virtual memory, in bytes.";

pub(super) fn hr_storage_samples(
    metric: &Metric,
    _kind: SampleKind,
    value: f64,
    labels: &Labels,
) -> Vec<Sample> {
    let unit: f64 = match label_value(labels, "hrStorageAllocationUnits")
        .unwrap_or_default()
        .parse()
    {
        Ok(unit) => unit,
        Err(err) => {
            return vec![Sample::invalid(
                "Error deriving filesystem metrics",
                format!("failed to parse hrStorageAllocationUnits: {}", err),
            )]
        }
    };
    // The storage type arrives as an OID; its last arc is the type code.
    let storage_type = label_value(labels, "hrStorageType")
        .unwrap_or_default()
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_string();
    let mut descr = label_value(labels, "hrStorageDescr")
        .unwrap_or_default()
        .to_string();
    if let Some(label_start) = descr.find(" Label:") {
        descr.truncate(label_start);
    }
    let used: f64 = match label_value(labels, "hrStorageUsed") {
        Some(raw) => match raw.parse() {
            Ok(used) => used,
            Err(err) => {
                return vec![Sample::invalid(
                    "Error deriving filesystem metrics",
                    format!("failed to parse hrStorageUsed: {}", err),
                )]
            }
        },
        None => 0.0,
    };

    let mut samples = Vec::new();

    if storage_type == HR_STORAGE_VIRTUAL_MEMORY
        && descr.trim().eq_ignore_ascii_case("virtual memory")
    {
        samples.push(Sample::gauge(
            MEM_VIRTUAL_NAME,
            MEM_VIRTUAL_HELP,
            Vec::new(),
            unit * value,
        ));
    }

    if storage_type == HR_STORAGE_FIXED_DISK {
        let fs_labels: Labels = vec![
            ("device".to_string(), String::new()),
            ("fstype".to_string(), "unknown".to_string()),
            ("mountpoint".to_string(), descr),
        ];
        samples.push(Sample::gauge(
            FILESYSTEM_SIZE_NAME,
            remove_oid_suffix(&metric.help),
            fs_labels.clone(),
            value * unit,
        ));
        samples.push(Sample::gauge(
            FILESYSTEM_USED_NAME,
            FILESYSTEM_USED_HELP,
            fs_labels.clone(),
            used * unit,
        ));
        samples.push(Sample::gauge(
            FILESYSTEM_FREE_NAME,
            FILESYSTEM_FREE_HELP,
            fs_labels,
            (value - used) * unit,
        ));
    }

    samples
}
