//! Node-metric rename table.
//!
//! Maps well-known SNMP metric names to the names, labels and units their
//! `node_exporter` equivalents use. An entry matches on metric name and
//! declared type; matched samples are rewritten at emission time. A few
//! entries build entirely different sample sets (uptime, load names,
//! storage rows).

use super::{filesystem, loadavg, remove_oid_suffix};
use crate::config::{Metric, MetricType};
use crate::sample::{Labels, Sample, SampleKind};
use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Label rewrite applied by a rename entry.
enum LabelOp {
    /// Rename one label, keeping its value.
    Rename {
        from: &'static str,
        to: &'static str,
    },
    /// Append `cpu="cpu"` and `mode=<mode>`.
    CpuMode(&'static str),
}

/// Value rewrite applied by a rename entry.
enum ValueOp {
    Mul(f64),
    Div(f64),
}

type BuildFn = fn(&Metric, SampleKind, f64, &Labels) -> Vec<Sample>;

pub(super) struct DerivedDef {
    metric_type: MetricType,
    rename_to: Option<&'static str>,
    help: Option<&'static str>,
    label_op: Option<LabelOp>,
    value_op: Option<ValueOp>,
    build: Option<BuildFn>,
}

impl DerivedDef {
    fn counter(rename_to: &'static str) -> Self {
        Self {
            metric_type: MetricType::Counter,
            rename_to: Some(rename_to),
            help: None,
            label_op: None,
            value_op: None,
            build: None,
        }
    }

    fn gauge(rename_to: &'static str) -> Self {
        Self {
            metric_type: MetricType::Gauge,
            ..Self::counter(rename_to)
        }
    }

    fn builder(metric_type: MetricType, build: BuildFn) -> Self {
        Self {
            metric_type,
            rename_to: None,
            help: None,
            label_op: None,
            value_op: None,
            build: Some(build),
        }
    }

    fn device_label(mut self, from: &'static str) -> Self {
        self.label_op = Some(LabelOp::Rename {
            from,
            to: "device",
        });
        self
    }

    fn cpu_mode(mut self, mode: &'static str) -> Self {
        self.label_op = Some(LabelOp::CpuMode(mode));
        self
    }

    fn mul(mut self, factor: f64) -> Self {
        self.value_op = Some(ValueOp::Mul(factor));
        self
    }

    fn div(mut self, divisor: f64) -> Self {
        self.value_op = Some(ValueOp::Div(divisor));
        self
    }
}

fn uptime_samples(metric: &Metric, kind: SampleKind, value: f64, labels: &Labels) -> Vec<Sample> {
    let seconds = value / 100.0;
    let node_time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as f64)
        .unwrap_or_default();
    let node_boot_time = node_time - seconds;
    let help = remove_oid_suffix(&metric.help);

    let sample = |name: &str, value: f64| Sample::Metric {
        name: name.to_string(),
        help: help.clone(),
        kind,
        labels: labels.clone(),
        value,
    };
    vec![
        sample("node_time", node_time),
        sample("node_boot_time", node_boot_time),
    ]
}

fn la_load_build(_metric: &Metric, _kind: SampleKind, value: f64, labels: &Labels) -> Vec<Sample> {
    loadavg::la_load_samples(labels, value)
}

static DERIVED_DEFS: LazyLock<HashMap<&'static str, DerivedDef>> = LazyLock::new(|| {
    let mut defs = HashMap::new();

    // Special builders.
    defs.insert(
        "hrSystemUptime",
        DerivedDef::builder(MetricType::Gauge, uptime_samples),
    );
    defs.insert(
        "laLoadFloat",
        DerivedDef::builder(MetricType::OpaqueFloat, la_load_build),
    );
    defs.insert(
        "hrStorageSize",
        DerivedDef::builder(MetricType::Gauge, filesystem::hr_storage_samples),
    );

    // Interface counters, UCD ifTable names.
    defs.insert("ifInOctets", DerivedDef::counter("node_network_receive_bytes").device_label("ifDescr"));
    defs.insert("ifInUcastPkts", DerivedDef::counter("node_network_receive_packets").device_label("ifDescr"));
    defs.insert("ifInNUcastPkts", DerivedDef::counter("node_network_receive_multicast").device_label("ifDescr"));
    defs.insert("ifInDiscards", DerivedDef::counter("node_network_receive_drop").device_label("ifDescr"));
    defs.insert("ifInErrors", DerivedDef::counter("node_network_receive_errs").device_label("ifDescr"));
    defs.insert("ifOutOctets", DerivedDef::counter("node_network_transmit_bytes").device_label("ifDescr"));
    defs.insert("ifOutUcastPkts", DerivedDef::counter("node_network_transmit_packets").device_label("ifDescr"));
    defs.insert("ifOutNUcastPkts", DerivedDef::counter("node_network_transmit_multicast").device_label("ifDescr"));
    defs.insert("ifOutDiscards", DerivedDef::counter("node_network_transmit_drop").device_label("ifDescr"));
    defs.insert("ifOutErrors", DerivedDef::counter("node_network_transmit_errs").device_label("ifDescr"));

    // UCD disk I/O table. Byte counters convert to 512-byte sectors,
    // busy-time from microseconds to milliseconds.
    defs.insert("diskIONRead", DerivedDef::counter("node_disk_sectors_read").device_label("diskIODevice").div(512.0));
    defs.insert("diskIONWritten", DerivedDef::counter("node_disk_sectors_written").device_label("diskIODevice").div(512.0));
    defs.insert("diskIONReadX", DerivedDef::counter("node_disk_sectors_read").device_label("diskIODevice").div(512.0));
    defs.insert("diskIONWrittenX", DerivedDef::counter("node_disk_sectors_written").device_label("diskIODevice").div(512.0));
    defs.insert("diskIOReads", DerivedDef::counter("node_disk_reads_completed").device_label("diskIODevice"));
    defs.insert("diskIOWrites", DerivedDef::counter("node_disk_writes_completed").device_label("diskIODevice"));
    defs.insert("diskIOBusyTime", DerivedDef::counter("node_disk_io_time_ms").device_label("diskIODevice").div(1000.0));

    // UCD vmstat. I/O counters are in blocks of two pages.
    defs.insert("ssIORawReceived", DerivedDef::counter("node_vmstat_pgpgin").div(2.0));
    defs.insert("ssIORawSent", DerivedDef::counter("node_vmstat_pgpgout").div(2.0));
    defs.insert("ssSwapIn", DerivedDef::gauge("node_vmstat_pswpin"));
    defs.insert("ssSwapOut", DerivedDef::gauge("node_vmstat_pswpout"));

    // Memory sizes arrive in KBytes.
    defs.insert("memTotalSwap", DerivedDef::gauge("node_memory_SwapTotal").mul(1024.0));
    defs.insert("memAvailSwap", DerivedDef::gauge("node_memory_SwapFree").mul(1024.0));
    defs.insert("hrMemorySize", DerivedDef::gauge("node_memory_MemTotal").mul(1024.0));
    defs.insert("memAvailReal", DerivedDef::gauge("node_memory_MemFree").mul(1024.0));
    defs.insert("memShared", DerivedDef::gauge("node_memory_Shmem").mul(1024.0));
    defs.insert("memBuffer", DerivedDef::gauge("node_memory_Buffers").mul(1024.0));
    defs.insert("memCached", DerivedDef::gauge("node_memory_Cached").mul(1024.0));
    defs.insert("memSysAvail", DerivedDef::counter("node_memory_MemAvailable").mul(1024.0));

    // Raw CPU tick counters. Normally intercepted before emission; the
    // entries cover modules that carry the counters without the rest of
    // the system group.
    defs.insert("ssCpuRawUser", DerivedDef::counter("node_cpu").cpu_mode("user"));
    defs.insert("ssCpuRawNice", DerivedDef::counter("node_cpu").cpu_mode("nice"));
    defs.insert("ssCpuRawSystem", DerivedDef::counter("node_cpu").cpu_mode("system"));
    defs.insert("ssCpuRawIdle", DerivedDef::counter("node_cpu").cpu_mode("idle"));
    defs.insert("ssCpuRawWait", DerivedDef::counter("node_cpu").cpu_mode("iowait"));
    defs.insert("ssCpuRawInterrupt", DerivedDef::counter("node_cpu").cpu_mode("irq"));
    defs.insert("ssCpuRawSoftIRQ", DerivedDef::counter("node_cpu").cpu_mode("softirq"));
    defs.insert("ssCpuRawSteal", DerivedDef::counter("node_cpu").cpu_mode("steal"));
    defs.insert("ssCpuRawGuest", DerivedDef::counter("node_cpu").cpu_mode("guest"));

    // IP-MIB ipSystemStats, including the high-capacity variants.
    defs.insert("ipSystemStatsInReceives", DerivedDef::counter("node_netstat_Ip_InReceives"));
    defs.insert("ipSystemStatsHCInReceives", DerivedDef::counter("node_netstat_Ip_InReceives"));
    defs.insert("ipSystemStatsInOctets", DerivedDef::counter("node_netstat_IpExt_InOctets"));
    defs.insert("ipSystemStatsHCInOctets", DerivedDef::counter("node_netstat_IpExt_InOctets"));
    defs.insert("ipSystemStatsInHdrErrors", DerivedDef::counter("node_netstat_IP_InHdrErrors"));
    defs.insert("ipSystemStatsInNoRoutes", DerivedDef::counter("node_netstat_IpExt_InNoRoutes"));
    defs.insert("ipSystemStatsInAddrErrors", DerivedDef::counter("node_netstat_Ip_InAddrErrors"));
    defs.insert("ipSystemStatsInUnknownProtos", DerivedDef::counter("node_netstat_Ip_InUnknownProtos"));
    defs.insert("ipSystemStatsInTruncatedPkts", DerivedDef::counter("node_netstat_IpExt_InTruncatedPkts"));
    defs.insert("ipSystemStatsReasmReqds", DerivedDef::counter("node_netstat_Ip_ReasmReqds"));
    defs.insert("ipSystemStatsReasmOKs", DerivedDef::counter("node_netstat_Ip_ReasmOKs"));
    defs.insert("ipSystemStatsReasmFails", DerivedDef::counter("node_netstat_Ip_ReasmFails"));
    defs.insert("ipSystemStatsInDiscards", DerivedDef::counter("node_netstat_Ip_InDiscards"));
    defs.insert("ipSystemStatsInDelivers", DerivedDef::counter("node_netstat_Ip_InDelivers"));
    defs.insert("ipSystemStatsHCInDelivers", DerivedDef::counter("node_netstat_Ip_InDelivers"));
    defs.insert("ipSystemStatsOutRequests", DerivedDef::counter("node_netstat_Ip_OutRequests"));
    defs.insert("ipSystemStatsHCOutRequests", DerivedDef::counter("node_netstat_Ip_OutRequests"));
    defs.insert("ipSystemStatsOutNoRoutes", DerivedDef::counter("node_netstat_Ip_OutNoRoutes"));
    defs.insert("ipSystemStatsOutForwDatagrams", DerivedDef::counter("node_netstat_Ip_ForwDatagrams"));
    defs.insert("ipSystemStatsHCOutForwDatagrams", DerivedDef::counter("node_netstat_Ip_ForwDatagrams"));
    defs.insert("ipSystemStatsOutDiscards", DerivedDef::counter("node_netstat_Ip_OutDiscards"));
    defs.insert("ipSystemStatsOutFragOKs", DerivedDef::counter("node_netstat_Ip_FragOKs"));
    defs.insert("ipSystemStatsOutFragFails", DerivedDef::counter("node_netstat_Ip_FragFails"));
    defs.insert("ipSystemStatsOutFragCreates", DerivedDef::counter("node_netstat_Ip_FragCreates"));
    defs.insert("ipSystemStatsOutOctets", DerivedDef::counter("node_netstat_IpExt_OutOctets"));
    defs.insert("ipSystemStatsHCOutOctets", DerivedDef::counter("node_netstat_IpExt_OutOctets"));
    defs.insert("ipSystemStatsInMcastPkts", DerivedDef::counter("node_netstat_IpExt_InMcastPkts"));
    defs.insert("ipSystemStatsHCInMcastPkts", DerivedDef::counter("node_netstat_IpExt_InMcastPkts"));
    defs.insert("ipSystemStatsInMcastOctets", DerivedDef::counter("node_netstat_IpExt_InMcastOctets"));
    defs.insert("ipSystemStatsHCInMcastOctets", DerivedDef::counter("node_netstat_IpExt_InMcastOctets"));
    defs.insert("ipSystemStatsOutMcastPkts", DerivedDef::counter("node_netstat_IpExt_OutMcastPkts"));
    defs.insert("ipSystemStatsHCOutMcastPkts", DerivedDef::counter("node_netstat_IpExt_OutMcastPkts"));
    defs.insert("ipSystemStatsOutMcastOctets", DerivedDef::counter("node_netstat_IpExt_OutMcastOctets"));
    defs.insert("ipSystemStatsHCOutMcastOctets", DerivedDef::counter("node_netstat_IpExt_OutMcastOctets"));
    defs.insert("ipSystemStatsInBcastPkts", DerivedDef::counter("node_netstat_IpExt_InBcastPkts"));
    defs.insert("ipSystemStatsHCInBcastPkts", DerivedDef::counter("node_netstat_IpExt_InBcastPkts"));
    defs.insert("ipSystemStatsOutBcastPkts", DerivedDef::counter("node_netstat_IpExt_OutBcastPkts"));
    defs.insert("ipSystemStatsHCOutBcastPkts", DerivedDef::counter("node_netstat_IpExt_OutBcastPkts"));

    defs
});

pub(super) fn lookup(metric: &Metric) -> Option<&'static DerivedDef> {
    let def = DERIVED_DEFS.get(metric.name.as_str())?;
    if def.metric_type != metric.metric_type {
        return None;
    }
    Some(def)
}

pub(super) fn rename_sample(
    metric: &Metric,
    kind: SampleKind,
    value: f64,
    labels: &Labels,
) -> Option<Vec<Sample>> {
    let def = lookup(metric)?;

    if let Some(build) = def.build {
        return Some(build(metric, kind, value, labels));
    }

    let mut labels = labels.clone();
    match &def.label_op {
        Some(LabelOp::Rename { from, to }) => {
            for (name, _) in labels.iter_mut() {
                if name == from {
                    *name = to.to_string();
                }
            }
        }
        Some(LabelOp::CpuMode(mode)) => {
            labels.push(("cpu".to_string(), "cpu".to_string()));
            labels.push(("mode".to_string(), mode.to_string()));
        }
        None => {}
    }

    let value = match def.value_op {
        Some(ValueOp::Mul(factor)) => value * factor,
        Some(ValueOp::Div(divisor)) => value / divisor,
        None => value,
    };

    let help = match def.help {
        Some(help) => help.to_string(),
        None => remove_oid_suffix(&metric.help),
    };

    Some(vec![Sample::Metric {
        name: def
            .rename_to
            .expect("rename entries without a builder carry a name")
            .to_string(),
        help,
        kind,
        labels,
        value,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::sample::label_value;

    fn metric(name: &str, metric_type: MetricType) -> Metric {
        Metric::new(name, oid!(1, 3, 6, 1, 99), metric_type)
            .help("Some help - 1.3.6.1.99")
    }

    #[test]
    fn test_unlisted_metric_passes_through() {
        assert!(rename_sample(
            &metric("ifInOctetsCustom", MetricType::Counter),
            SampleKind::Counter,
            1.0,
            &Vec::new()
        )
        .is_none());
    }

    #[test]
    fn test_type_mismatch_passes_through() {
        // ifInOctets is registered as a counter.
        assert!(rename_sample(
            &metric("ifInOctets", MetricType::Gauge),
            SampleKind::Gauge,
            1.0,
            &Vec::new()
        )
        .is_none());
    }

    #[test]
    fn test_network_rename_with_device_label() {
        let labels = vec![
            ("ifIndex".to_string(), "3".to_string()),
            ("ifDescr".to_string(), "eth0".to_string()),
        ];
        let samples = rename_sample(
            &metric("ifInOctets", MetricType::Counter),
            SampleKind::Counter,
            500.0,
            &labels,
        )
        .unwrap();

        match &samples[0] {
            Sample::Metric { name, help, labels, value, .. } => {
                assert_eq!(name, "node_network_receive_bytes");
                // The OID suffix is stripped from the help text.
                assert_eq!(help, "Some help ");
                assert_eq!(*value, 500.0);
                assert_eq!(label_value(labels, "device"), Some("eth0"));
                assert!(label_value(labels, "ifDescr").is_none());
                assert_eq!(label_value(labels, "ifIndex"), Some("3"));
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_disk_sectors_divide() {
        let samples = rename_sample(
            &metric("diskIONRead", MetricType::Counter),
            SampleKind::Counter,
            1024.0,
            &Vec::new(),
        )
        .unwrap();
        match &samples[0] {
            Sample::Metric { name, value, .. } => {
                assert_eq!(name, "node_disk_sectors_read");
                assert_eq!(*value, 2.0);
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_memory_kb_to_bytes() {
        let samples = rename_sample(
            &metric("memTotalSwap", MetricType::Gauge),
            SampleKind::Gauge,
            2048.0,
            &Vec::new(),
        )
        .unwrap();
        match &samples[0] {
            Sample::Metric { name, value, .. } => {
                assert_eq!(name, "node_memory_SwapTotal");
                assert_eq!(*value, 2048.0 * 1024.0);
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_cpu_mode_labels() {
        let samples = rename_sample(
            &metric("ssCpuRawWait", MetricType::Counter),
            SampleKind::Counter,
            9.0,
            &Vec::new(),
        )
        .unwrap();
        match &samples[0] {
            Sample::Metric { name, labels, .. } => {
                assert_eq!(name, "node_cpu");
                assert_eq!(label_value(labels, "cpu"), Some("cpu"));
                assert_eq!(label_value(labels, "mode"), Some("iowait"));
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_uptime_builder_emits_time_pair() {
        let samples = rename_sample(
            &metric("hrSystemUptime", MetricType::Gauge),
            SampleKind::Gauge,
            360_000.0, // 1 hour of timeticks
            &Vec::new(),
        )
        .unwrap();
        assert_eq!(samples.len(), 2);
        let (time, boot) = match (&samples[0], &samples[1]) {
            (
                Sample::Metric { name: n1, value: v1, .. },
                Sample::Metric { name: n2, value: v2, .. },
            ) => {
                assert_eq!(n1, "node_time");
                assert_eq!(n2, "node_boot_time");
                (*v1, *v2)
            }
            other => panic!("unexpected samples {:?}", other),
        };
        assert!((time - boot - 3600.0).abs() < 1.0);
    }

    #[test]
    fn test_la_load_dispatch() {
        let labels = vec![("laNames".to_string(), "Load-5".to_string())];
        let samples = rename_sample(
            &metric("laLoadFloat", MetricType::OpaqueFloat),
            SampleKind::Gauge,
            0.75,
            &labels,
        )
        .unwrap();
        match &samples[0] {
            Sample::Metric { name, value, labels, .. } => {
                assert_eq!(name, "node_load5");
                assert_eq!(*value, 0.75);
                assert!(labels.is_empty());
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_la_load_unknown_name_emits_nothing() {
        let labels = vec![("laNames".to_string(), "Load-60".to_string())];
        let samples = rename_sample(
            &metric("laLoadFloat", MetricType::OpaqueFloat),
            SampleKind::Gauge,
            0.75,
            &labels,
        )
        .unwrap();
        assert!(samples.is_empty());
    }
}
