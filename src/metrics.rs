//! Exporter self-observability.
//!
//! Counters and histograms describing the exporter's own behavior, as
//! opposed to the samples scraped from targets. A single [`ExporterMetrics`]
//! handle is shared by every collector in the process.

use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, Opts, Registry};

/// The exporter's own metrics.
#[derive(Clone)]
pub struct ExporterMetrics {
    /// Per-module collection duration.
    pub collection_duration: HistogramVec,
    /// PDUs whose value type the renderer did not recognize.
    pub unexpected_pdu_type: IntCounter,
    /// Round-trip latency of individual SNMP requests.
    pub packet_duration: Histogram,
    /// Packets sent, including retries.
    pub packets: IntCounter,
    /// Packets retried.
    pub retries: IntCounter,
}

impl ExporterMetrics {
    /// Create the metrics and register them with `registry`.
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let metrics = Self::unregistered();
        registry.register(Box::new(metrics.collection_duration.clone()))?;
        registry.register(Box::new(metrics.unexpected_pdu_type.clone()))?;
        registry.register(Box::new(metrics.packet_duration.clone()))?;
        registry.register(Box::new(metrics.packets.clone()))?;
        registry.register(Box::new(metrics.retries.clone()))?;
        Ok(metrics)
    }

    /// Create the metrics without registering them. Useful in tests.
    pub fn unregistered() -> Self {
        Self {
            collection_duration: HistogramVec::new(
                HistogramOpts::new(
                    "snmp_collection_duration_seconds",
                    "Duration of collections by the SNMP exporter.",
                ),
                &["module"],
            )
            .expect("static metric definition"),
            unexpected_pdu_type: IntCounter::with_opts(Opts::new(
                "snmp_unexpected_pdu_type_total",
                "Unexpected Go types in a PDU.",
            ))
            .expect("static metric definition"),
            packet_duration: Histogram::with_opts(
                HistogramOpts::new(
                    "snmp_packet_duration_seconds",
                    "A histogram of latencies for SNMP packets.",
                )
                .buckets(prometheus::exponential_buckets(0.0001, 2.0, 15).unwrap()),
            )
            .expect("static metric definition"),
            packets: IntCounter::with_opts(Opts::new(
                "snmp_packets_total",
                "Number of SNMP packet sent, including retries.",
            ))
            .expect("static metric definition"),
            retries: IntCounter::with_opts(Opts::new(
                "snmp_packet_retries_total",
                "Number of SNMP packet retries.",
            ))
            .expect("static metric definition"),
        }
    }
}
