//! Sample builder.
//!
//! Turns a matched PDU into observability samples: decodes the label tuple
//! from the index tail, applies lookups, coerces the value, and dispatches
//! on the declared metric type (counters, gauges, DateAndTime, enum infos
//! and state sets, BITS constructs, regex extractions, plain strings).

use crate::coerce::{pdu_value, pdu_value_as_string};
use crate::config::{Metric, MetricType};
use crate::derived;
use crate::error::Result;
use crate::index::{combined_subtype, index_oids_as_string};
use crate::metrics::ExporterMetrics;
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::VarBind;
use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;

/// Whether a sample is a counter or a gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// Monotonic counter.
    Counter,
    /// Point-in-time gauge.
    Gauge,
}

/// Ordered label pairs attached to a sample.
pub type Labels = Vec<(String, String)>;

/// One emitted sample.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    /// A well-formed sample.
    Metric {
        /// Sample name.
        name: String,
        /// Help text.
        help: String,
        /// Counter or gauge.
        kind: SampleKind,
        /// Label pairs, in emission order.
        labels: Labels,
        /// Sample value.
        value: f64,
    },
    /// An error carrier, rendered by the consumer as a scrape failure.
    Invalid {
        /// Help text describing what failed.
        help: String,
        /// The underlying error message.
        error: String,
    },
}

impl Sample {
    /// A gauge sample.
    pub fn gauge(name: impl Into<String>, help: impl Into<String>, labels: Labels, value: f64) -> Self {
        Sample::Metric {
            name: name.into(),
            help: help.into(),
            kind: SampleKind::Gauge,
            labels,
            value,
        }
    }

    /// A counter sample.
    pub fn counter(
        name: impl Into<String>,
        help: impl Into<String>,
        labels: Labels,
        value: f64,
    ) -> Self {
        Sample::Metric {
            name: name.into(),
            help: help.into(),
            kind: SampleKind::Counter,
            labels,
            value,
        }
    }

    /// An invalid sample carrying an error.
    pub fn invalid(help: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Sample::Invalid {
            help: help.into(),
            error: error.to_string(),
        }
    }

    /// The sample name, or `snmp_error` for invalid samples.
    pub fn name(&self) -> &str {
        match self {
            Sample::Metric { name, .. } => name,
            Sample::Invalid { .. } => "snmp_error",
        }
    }
}

fn set_label(labels: &mut Labels, name: &str, value: String) {
    if let Some(entry) = labels.iter_mut().find(|(n, _)| n == name) {
        entry.1 = value;
    } else {
        labels.push((name.to_string(), value));
    }
}

fn remove_label(labels: &mut Labels, name: &str) {
    labels.retain(|(n, _)| n != name);
}

fn has_label(labels: &Labels, name: &str) -> bool {
    labels.iter().any(|(n, _)| n == name)
}

/// Look up a label's value.
pub fn label_value<'a>(labels: &'a Labels, name: &str) -> Option<&'a str> {
    labels
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

/// Decode the metric's declared indexes from the OID tail and apply its
/// lookups, producing the label tuple for this row.
///
/// Index decoding failures are configuration errors and fail the scrape.
pub fn indexes_to_labels(
    index_oids: &[u32],
    metric: &Metric,
    oid_to_pdu: &HashMap<Oid, VarBind>,
    metrics: &ExporterMetrics,
) -> Result<Labels> {
    let mut labels: Labels = Vec::new();
    let mut label_oids: HashMap<String, Vec<u32>> = HashMap::new();

    // Convert indexes to label strings, each consuming a prefix of the tail.
    let mut remaining = index_oids.to_vec();
    for index in &metric.indexes {
        let (value, consumed, rest) = index_oids_as_string(
            &remaining,
            index.index_type,
            index.fixed_size,
            index.implied,
            &index.enum_values,
        )?;
        set_label(&mut labels, &index.labelname, value);
        // Save the oids in case a lookup needs them to address a row.
        label_oids.insert(index.labelname.clone(), consumed);
        remaining = rest;
    }

    for lookup in &metric.lookups {
        if lookup.labels.is_empty() {
            remove_label(&mut labels, &lookup.labelname);
            continue;
        }
        let mut oid = lookup.oid.clone();
        for label in &lookup.labels {
            if let Some(oids) = label_oids.get(label) {
                oid = oid.join(oids);
            }
        }
        if let Some(pdu) = oid_to_pdu.get(&oid) {
            let mut typ = lookup.lookup_type;
            if typ.is_combined() {
                // The concrete subtype is tagged in the previous object.
                if let Some(mut prev_oid) = lookup.oid.prev_sibling() {
                    for label in &lookup.labels {
                        if let Some(oids) = label_oids.get(label) {
                            prev_oid = prev_oid.join(oids);
                        }
                    }
                    if let Some(prev_pdu) = oid_to_pdu.get(&prev_oid) {
                        let tag = pdu_value(&prev_pdu.value, false) as i64;
                        if let Some(subtype) = combined_subtype(typ, tag) {
                            typ = subtype;
                        }
                    }
                }
            }
            set_label(
                &mut labels,
                &lookup.labelname,
                pdu_value_as_string(pdu, Some(typ), metrics),
            );
            label_oids.insert(
                lookup.labelname.clone(),
                vec![pdu.value.as_i64().unwrap_or(0) as u32],
            );
        } else {
            set_label(&mut labels, &lookup.labelname, String::new());
        }
    }

    Ok(labels)
}

/// Extract a UNIX timestamp from an RFC 2579 DateAndTime.
///
/// The 8-byte form carries no time zone and is read as UTC; the 11-byte
/// form appends a `±HH MM` offset. Anything else is malformed.
pub fn parse_date_and_time(vb: &VarBind) -> std::result::Result<f64, String> {
    let bytes = vb
        .value
        .as_bytes()
        .ok_or_else(|| format!("invalid DateAndTime type {:?}", vb.value))?;

    let offset_seconds = match bytes.len() {
        8 => 0,
        11 => {
            let sign = match bytes[8] {
                b'+' => 1i32,
                b'-' => -1i32,
                other => return Err(format!("error parsing timezone sign {:#04x}", other)),
            };
            if bytes[9] > 14 || bytes[10] > 59 {
                return Err(format!(
                    "error parsing timezone offset {:02}:{:02}",
                    bytes[9], bytes[10]
                ));
            }
            sign * (bytes[9] as i32 * 3600 + bytes[10] as i32 * 60)
        }
        other => return Err(format!("invalid DateAndTime length {}", other)),
    };

    let year = u16::from_be_bytes([bytes[0], bytes[1]]) as i32;
    let date = NaiveDate::from_ymd_opt(year, bytes[2] as u32, bytes[3] as u32)
        .ok_or_else(|| format!("invalid DateAndTime date in {:?}", bytes))?;
    let datetime = date
        .and_hms_nano_opt(
            bytes[4] as u32,
            bytes[5] as u32,
            bytes[6] as u32,
            bytes[7] as u32 * 100_000_000,
        )
        .ok_or_else(|| format!("invalid DateAndTime time in {:?}", bytes))?;

    let tz = FixedOffset::east_opt(offset_seconds)
        .ok_or_else(|| format!("invalid DateAndTime offset {}", offset_seconds))?;
    let timestamp = tz
        .from_local_datetime(&datetime)
        .single()
        .ok_or_else(|| format!("ambiguous DateAndTime {:?}", bytes))?
        .with_timezone(&Utc)
        .timestamp();
    Ok(timestamp as f64)
}

/// Build the samples for one matched PDU.
///
/// `index_oids` is the OID tail following the metric's OID; `oid_to_pdu`
/// indexes every PDU of this scrape for lookups and sibling-tag dispatch.
pub fn pdu_to_samples(
    index_oids: &[u32],
    vb: &VarBind,
    metric: &Metric,
    oid_to_pdu: &HashMap<Oid, VarBind>,
    wrap_counters: bool,
    metrics: &ExporterMetrics,
) -> Result<Vec<Sample>> {
    let mut labels = indexes_to_labels(index_oids, metric, oid_to_pdu, metrics)?;

    let mut value = pdu_value(&vb.value, wrap_counters);

    let kind = match metric.metric_type {
        MetricType::Counter | MetricType::Counter64 => SampleKind::Counter,
        MetricType::Gauge | MetricType::OpaqueFloat | MetricType::OpaqueDouble => SampleKind::Gauge,
        MetricType::DateAndTime => {
            match parse_date_and_time(vb) {
                Ok(timestamp) => value = timestamp,
                Err(err) => {
                    tracing::debug!(
                        target: "snmp_collector::sample",
                        metric = %metric.name,
                        error = %err,
                        "error parsing DateAndTime"
                    );
                    return Ok(Vec::new());
                }
            }
            SampleKind::Gauge
        }
        MetricType::EnumAsInfo => return Ok(enum_as_info(metric, value as i64, labels)),
        MetricType::EnumAsStateSet => return Ok(enum_as_state_set(metric, value as i64, labels)),
        MetricType::Bits => return Ok(bits(metric, &vb.value, labels)),
        _ => {
            // It's some form of string.
            value = 1.0;
            let mut metric_type = metric.metric_type;

            if metric_type.is_combined() {
                metric_type = resolve_combined(metric, index_oids, oid_to_pdu);
            }

            if !metric.regex_extracts.is_empty() {
                let rendered = pdu_value_as_string(vb, Some(metric_type), metrics);
                return Ok(apply_regex_extracts(metric, &rendered, &labels));
            }
            // For strings the value becomes a label with the same name as
            // the metric, unless an index already claimed that name.
            if !has_label(&labels, &metric.name) {
                let rendered = pdu_value_as_string(vb, Some(metric_type), metrics);
                labels.push((metric.name.clone(), rendered));
            }
            SampleKind::Gauge
        }
    };

    if metric.scale != 0.0 {
        value *= metric.scale;
    }
    value += metric.offset;

    if let Some(samples) = derived::rename_sample(metric, kind, value, &labels) {
        return Ok(samples);
    }

    Ok(vec![Sample::Metric {
        name: metric.name.clone(),
        help: metric.help.clone(),
        kind,
        labels,
        value,
    }])
}

/// Resolve a combined metric type by consulting the sibling tag column at
/// `prev(metric.oid)` for this row. Falls back to `OctetString`.
fn resolve_combined(
    metric: &Metric,
    index_oids: &[u32],
    oid_to_pdu: &HashMap<Oid, VarBind>,
) -> MetricType {
    let Some(prev_oid) = metric.oid.prev_sibling().map(|oid| oid.join(index_oids)) else {
        return MetricType::OctetString;
    };
    let Some(prev_pdu) = oid_to_pdu.get(&prev_oid) else {
        tracing::debug!(
            target: "snmp_collector::sample",
            oid = %prev_oid,
            metric = %metric.name,
            "unable to find type at oid for metric"
        );
        return MetricType::OctetString;
    };
    let tag = pdu_value(&prev_pdu.value, false) as i64;
    match combined_subtype(metric.metric_type, tag) {
        Some(subtype) => subtype,
        None => {
            tracing::debug!(
                target: "snmp_collector::sample",
                tag,
                oid = %prev_oid,
                metric = %metric.name,
                "unable to handle type value"
            );
            MetricType::OctetString
        }
    }
}

fn enum_as_info(metric: &Metric, value: i64, mut labels: Labels) -> Vec<Sample> {
    let state = match metric.enum_values.get(&value) {
        Some(state) => state.clone(),
        None => value.to_string(),
    };
    labels.push((metric.name.clone(), state));

    vec![Sample::gauge(
        format!("{}_info", metric.name),
        format!("{} (EnumAsInfo)", metric.help),
        labels,
        1.0,
    )]
}

fn enum_as_state_set(metric: &Metric, value: i64, labels: Labels) -> Vec<Sample> {
    let help = format!("{} (EnumAsStateSet)", metric.help);
    let mut results = Vec::with_capacity(metric.enum_values.len() + 1);

    let state = match metric.enum_values.get(&value) {
        Some(state) => state.clone(),
        None => value.to_string(),
    };
    let mut matched = labels.clone();
    matched.push((metric.name.clone(), state));
    results.push(Sample::gauge(metric.name.clone(), help.clone(), matched, 1.0));

    for (&k, v) in &metric.enum_values {
        if k == value {
            continue;
        }
        let mut state_labels = labels.clone();
        state_labels.push((metric.name.clone(), v.clone()));
        results.push(Sample::gauge(
            metric.name.clone(),
            help.clone(),
            state_labels,
            0.0,
        ));
    }
    results
}

fn bits(metric: &Metric, value: &Value, labels: Labels) -> Vec<Sample> {
    let Some(bytes) = value.as_bytes() else {
        tracing::debug!(
            target: "snmp_collector::sample",
            metric = %metric.name,
            "BITS value was not an octet string on the wire, dropping sample"
        );
        return Vec::new();
    };
    let help = format!("{} (Bits)", metric.help);
    let mut results = Vec::with_capacity(metric.enum_values.len());

    for (&k, v) in &metric.enum_values {
        // Most significant byte first, most significant bit first.
        let mut bit = 0.0;
        if k >= 0 && (k as usize) < bytes.len() * 8 {
            let k = k as usize;
            if bytes[k / 8] & (128 >> (k % 8)) != 0 {
                bit = 1.0;
            }
        }
        let mut bit_labels = labels.clone();
        bit_labels.push((metric.name.clone(), v.clone()));
        results.push(Sample::gauge(metric.name.clone(), help.clone(), bit_labels, bit));
    }
    results
}

fn apply_regex_extracts(metric: &Metric, rendered: &str, labels: &Labels) -> Vec<Sample> {
    let mut results = Vec::new();
    for (suffix, extracts) in &metric.regex_extracts {
        for extract in extracts {
            let Some(captures) = extract.regex.captures(rendered) else {
                tracing::debug!(
                    target: "snmp_collector::sample",
                    metric = %metric.name,
                    value = rendered,
                    regex = %extract.regex,
                    "no match found for regexp"
                );
                continue;
            };
            let mut expanded = String::new();
            captures.expand(&extract.value, &mut expanded);
            let Ok(value) = expanded.parse::<f64>() else {
                tracing::debug!(
                    target: "snmp_collector::sample",
                    metric = %metric.name,
                    value = rendered,
                    extracted = %expanded,
                    "error parsing float from extracted value"
                );
                continue;
            };
            results.push(Sample::gauge(
                format!("{}{}", metric.name, suffix),
                format!("{} (regex extracted)", metric.help),
                labels.clone(),
                value,
            ));
            break;
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Index, Lookup, RegexExtract};
    use crate::oid;
    use bytes::Bytes;
    use regex::Regex;
    use std::collections::BTreeMap;

    fn build(
        index_oids: &[u32],
        vb: &VarBind,
        metric: &Metric,
        oid_to_pdu: &HashMap<Oid, VarBind>,
    ) -> Vec<Sample> {
        pdu_to_samples(
            index_oids,
            vb,
            metric,
            oid_to_pdu,
            true,
            &ExporterMetrics::unregistered(),
        )
        .unwrap()
    }

    fn enums(pairs: &[(i64, &str)]) -> BTreeMap<i64, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_counter_sample() {
        let metric = Metric::new("ifHCInOctets", oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10), MetricType::Counter)
            .help("Octets received.")
            .index(Index::new("ifIndex", MetricType::Integer32));
        let vb = VarBind::new(metric.oid.child(3), Value::Counter32(1000));

        let samples = build(&[3], &vb, &metric, &HashMap::new());
        assert_eq!(
            samples,
            vec![Sample::counter(
                "ifHCInOctets",
                "Octets received.",
                vec![("ifIndex".to_string(), "3".to_string())],
                1000.0
            )]
        );
    }

    #[test]
    fn test_scale_and_offset() {
        let metric = Metric::new("temp", oid!(1, 3, 6, 1, 99), MetricType::Gauge)
            .scale_offset(0.1, -273.0);
        let vb = VarBind::new(metric.oid.clone(), Value::Integer(3000));

        let samples = build(&[], &vb, &metric, &HashMap::new());
        match &samples[0] {
            Sample::Metric { value, .. } => assert!((value - 27.0).abs() < 1e-9),
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_offset_applies_without_scale() {
        let metric =
            Metric::new("x", oid!(1, 3, 6, 1, 99), MetricType::Gauge).scale_offset(0.0, 5.0);
        let vb = VarBind::new(metric.oid.clone(), Value::Integer(10));

        let samples = build(&[], &vb, &metric, &HashMap::new());
        match &samples[0] {
            Sample::Metric { value, .. } => assert_eq!(*value, 15.0),
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_date_and_time_8_byte() {
        let metric = Metric::new("hrSystemDateSample", oid!(1, 3, 6, 1, 77), MetricType::DateAndTime);
        // 2022-03-15 10:30:00 UTC
        let vb = VarBind::new(
            metric.oid.clone(),
            Value::OctetString(Bytes::from_static(&[
                0x07, 0xE6, 0x03, 0x0F, 0x0A, 0x1E, 0x00, 0x00,
            ])),
        );

        let samples = build(&[], &vb, &metric, &HashMap::new());
        match &samples[0] {
            Sample::Metric { value, kind, .. } => {
                assert_eq!(*kind, SampleKind::Gauge);
                assert_eq!(*value, 1_647_340_200.0);
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_date_and_time_11_byte_with_offset() {
        let metric = Metric::new("d", oid!(1, 3, 6, 1, 77), MetricType::DateAndTime);
        // 2022-03-15 10:30:00 +02:00 == 08:30:00 UTC
        let vb = VarBind::new(
            metric.oid.clone(),
            Value::OctetString(Bytes::from_static(&[
                0x07, 0xE6, 0x03, 0x0F, 0x0A, 0x1E, 0x00, 0x00, b'+', 2, 0,
            ])),
        );

        let samples = build(&[], &vb, &metric, &HashMap::new());
        match &samples[0] {
            Sample::Metric { value, .. } => assert_eq!(*value, 1_647_340_200.0 - 7200.0),
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_date_and_time_malformed_emits_nothing() {
        let metric = Metric::new("d", oid!(1, 3, 6, 1, 77), MetricType::DateAndTime);
        let short = VarBind::new(
            metric.oid.clone(),
            Value::OctetString(Bytes::from_static(&[0x07, 0xE6, 0x03])),
        );
        assert!(build(&[], &short, &metric, &HashMap::new()).is_empty());

        let not_bytes = VarBind::new(metric.oid.clone(), Value::Integer(5));
        assert!(build(&[], &not_bytes, &metric, &HashMap::new()).is_empty());
    }

    #[test]
    fn test_enum_as_info() {
        let metric = Metric::new("ifType", oid!(1, 3, 6, 1, 30), MetricType::EnumAsInfo)
            .help("Interface type.")
            .enum_values(enums(&[(6, "ethernetCsmacd")]));
        let vb = VarBind::new(metric.oid.clone(), Value::Integer(6));

        let samples = build(&[], &vb, &metric, &HashMap::new());
        assert_eq!(
            samples,
            vec![Sample::gauge(
                "ifType_info",
                "Interface type. (EnumAsInfo)",
                vec![("ifType".to_string(), "ethernetCsmacd".to_string())],
                1.0
            )]
        );
    }

    #[test]
    fn test_enum_as_info_decimal_fallback() {
        let metric = Metric::new("ifType", oid!(1, 3, 6, 1, 30), MetricType::EnumAsInfo)
            .enum_values(enums(&[(6, "ethernetCsmacd")]));
        let vb = VarBind::new(metric.oid.clone(), Value::Integer(99));

        let samples = build(&[], &vb, &metric, &HashMap::new());
        match &samples[0] {
            Sample::Metric { labels, .. } => {
                assert_eq!(label_value(labels, "ifType"), Some("99"));
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_enum_as_state_set() {
        let metric = Metric::new("state", oid!(1, 3, 6, 1, 31), MetricType::EnumAsStateSet)
            .enum_values(enums(&[(1, "up"), (2, "down"), (3, "testing")]));
        let vb = VarBind::new(metric.oid.clone(), Value::Integer(2));

        let samples = build(&[], &vb, &metric, &HashMap::new());
        assert_eq!(samples.len(), 3);
        // Matched state first with value 1, then the others with 0.
        match &samples[0] {
            Sample::Metric { labels, value, .. } => {
                assert_eq!(label_value(labels, "state"), Some("down"));
                assert_eq!(*value, 1.0);
            }
            other => panic!("unexpected sample {:?}", other),
        }
        for sample in &samples[1..] {
            match sample {
                Sample::Metric { value, .. } => assert_eq!(*value, 0.0),
                other => panic!("unexpected sample {:?}", other),
            }
        }
    }

    #[test]
    fn test_bits() {
        let metric = Metric::new("flags", oid!(1, 3, 6, 1, 32), MetricType::Bits)
            .enum_values(enums(&[(0, "a"), (1, "b"), (2, "c"), (9, "d"), (20, "e")]));
        // 0xC0 0x40: bits 0, 1 and 9 set.
        let vb = VarBind::new(
            metric.oid.clone(),
            Value::OctetString(Bytes::from_static(&[0xC0, 0x40])),
        );

        let samples = build(&[], &vb, &metric, &HashMap::new());
        let by_state: HashMap<&str, f64> = samples
            .iter()
            .map(|s| match s {
                Sample::Metric { labels, value, .. } => {
                    (label_value(labels, "flags").unwrap(), *value)
                }
                other => panic!("unexpected sample {:?}", other),
            })
            .collect();
        assert_eq!(by_state["a"], 1.0);
        assert_eq!(by_state["b"], 1.0);
        assert_eq!(by_state["c"], 0.0);
        assert_eq!(by_state["d"], 1.0);
        // Out of range reads as 0.
        assert_eq!(by_state["e"], 0.0);
    }

    #[test]
    fn test_bits_non_bytes_dropped() {
        let metric = Metric::new("flags", oid!(1, 3, 6, 1, 32), MetricType::Bits)
            .enum_values(enums(&[(0, "a")]));
        let vb = VarBind::new(metric.oid.clone(), Value::Integer(3));
        assert!(build(&[], &vb, &metric, &HashMap::new()).is_empty());
    }

    #[test]
    fn test_string_metric_becomes_label() {
        let metric = Metric::new("sysDescr", oid!(1, 3, 6, 1, 2, 1, 1, 1), MetricType::DisplayString);
        let vb = VarBind::new(metric.oid.child(0), "Linux router 5.4.0");

        let samples = build(&[0], &vb, &metric, &HashMap::new());
        match &samples[0] {
            Sample::Metric { labels, value, kind, .. } => {
                assert_eq!(*kind, SampleKind::Gauge);
                assert_eq!(*value, 1.0);
                assert_eq!(label_value(labels, "sysDescr"), Some("Linux router 5.4.0"));
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_string_metric_keeps_existing_index_label() {
        let metric = Metric::new("entry", oid!(1, 3, 6, 1, 40), MetricType::DisplayString)
            .index(Index::new("entry", MetricType::Integer32));
        let vb = VarBind::new(metric.oid.child(7), "text");

        let samples = build(&[7], &vb, &metric, &HashMap::new());
        match &samples[0] {
            Sample::Metric { labels, .. } => {
                // The index already claimed the name; the value is not re-set.
                assert_eq!(label_value(labels, "entry"), Some("7"));
                assert_eq!(labels.len(), 1);
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_combined_type_sibling_dispatch() {
        // ipAddressIfIndex-style metric typed InetAddress; the type column
        // is the previous sibling.
        let metric = Metric::new("addr", oid!(1, 3, 6, 1, 50, 2), MetricType::InetAddress);
        let index_oids = [1, 4, 10, 0, 0, 1];
        let vb = VarBind::new(
            metric.oid.join(&index_oids),
            Value::OctetString(Bytes::from_static(&[192, 0, 2, 1])),
        );
        let mut oid_to_pdu = HashMap::new();
        oid_to_pdu.insert(
            oid!(1, 3, 6, 1, 50, 1).join(&index_oids),
            VarBind::new(oid!(1, 3, 6, 1, 50, 1).join(&index_oids), Value::Integer(1)),
        );

        let samples = build(&index_oids, &vb, &metric, &oid_to_pdu);
        match &samples[0] {
            Sample::Metric { labels, .. } => {
                assert_eq!(label_value(labels, "addr"), Some("192.0.2.1"));
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_combined_type_missing_sibling_falls_back_to_hex() {
        let metric = Metric::new("addr", oid!(1, 3, 6, 1, 50, 2), MetricType::InetAddress);
        let vb = VarBind::new(
            metric.oid.child(1),
            Value::OctetString(Bytes::from_static(&[192, 0, 2, 1])),
        );

        let samples = build(&[1], &vb, &metric, &HashMap::new());
        match &samples[0] {
            Sample::Metric { labels, .. } => {
                assert_eq!(label_value(labels, "addr"), Some("0xC0000201"));
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_regex_extracts() {
        let metric = Metric::new("power", oid!(1, 3, 6, 1, 60), MetricType::DisplayString)
            .help("PSU status.")
            .regex_extract(
                "Watts",
                vec![RegexExtract {
                    regex: Regex::new(r"(\d+)W").unwrap(),
                    value: "$1".to_string(),
                }],
            );
        let vb = VarBind::new(metric.oid.child(1), "450W nominal");

        let samples = build(&[], &vb, &metric, &HashMap::new());
        assert_eq!(
            samples,
            vec![Sample::gauge(
                "powerWatts",
                "PSU status. (regex extracted)",
                vec![],
                450.0
            )]
        );
    }

    #[test]
    fn test_regex_extract_unparsable_falls_to_next() {
        let metric = Metric::new("m", oid!(1, 3, 6, 1, 60), MetricType::DisplayString)
            .regex_extract(
                "X",
                vec![
                    RegexExtract {
                        regex: Regex::new(r"(\w+)").unwrap(),
                        value: "$1".to_string(),
                    },
                    RegexExtract {
                        regex: Regex::new(r"=(\d+)").unwrap(),
                        value: "$1".to_string(),
                    },
                ],
            );
        let vb = VarBind::new(metric.oid.child(1), "level=42");

        let samples = build(&[], &vb, &metric, &HashMap::new());
        match &samples[0] {
            Sample::Metric { name, value, .. } => {
                assert_eq!(name, "mX");
                assert_eq!(*value, 42.0);
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_regex_extract_no_match_emits_nothing() {
        let metric = Metric::new("m", oid!(1, 3, 6, 1, 60), MetricType::DisplayString)
            .regex_extract(
                "X",
                vec![RegexExtract {
                    regex: Regex::new(r"(\d+)W").unwrap(),
                    value: "$1".to_string(),
                }],
            );
        let vb = VarBind::new(metric.oid.child(1), "no watts here");

        assert!(build(&[], &vb, &metric, &HashMap::new()).is_empty());
    }

    #[test]
    fn test_lookup_resolves_label() {
        let if_descr = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2);
        let metric = Metric::new("ifHCInOctets", oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10), MetricType::Counter)
            .index(Index::new("ifIndex", MetricType::Integer32))
            .lookup(Lookup {
                labelname: "ifDescr".to_string(),
                oid: if_descr.clone(),
                lookup_type: MetricType::DisplayString,
                labels: vec!["ifIndex".to_string()],
            });
        let vb = VarBind::new(metric.oid.child(3), Value::Counter32(9));
        let mut oid_to_pdu = HashMap::new();
        oid_to_pdu.insert(
            if_descr.child(3),
            VarBind::new(if_descr.child(3), "eth3"),
        );

        let samples = build(&[3], &vb, &metric, &oid_to_pdu);
        match &samples[0] {
            Sample::Metric { labels, .. } => {
                assert_eq!(label_value(labels, "ifIndex"), Some("3"));
                assert_eq!(label_value(labels, "ifDescr"), Some("eth3"));
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_lookup_missing_pdu_sets_empty_label() {
        let metric = Metric::new("ifHCInOctets", oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10), MetricType::Counter)
            .index(Index::new("ifIndex", MetricType::Integer32))
            .lookup(Lookup {
                labelname: "ifDescr".to_string(),
                oid: oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2),
                lookup_type: MetricType::DisplayString,
                labels: vec!["ifIndex".to_string()],
            });
        let vb = VarBind::new(metric.oid.child(3), Value::Counter32(9));

        let samples = build(&[3], &vb, &metric, &HashMap::new());
        match &samples[0] {
            Sample::Metric { labels, .. } => {
                assert_eq!(label_value(labels, "ifDescr"), Some(""));
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_lookup_with_empty_labels_deletes() {
        let metric = Metric::new("ifHCInOctets", oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10), MetricType::Counter)
            .index(Index::new("ifIndex", MetricType::Integer32))
            .lookup(Lookup {
                labelname: "ifIndex".to_string(),
                oid: Oid::empty(),
                lookup_type: MetricType::DisplayString,
                labels: Vec::new(),
            });
        let vb = VarBind::new(metric.oid.child(3), Value::Counter32(9));

        let samples = build(&[3], &vb, &metric, &HashMap::new());
        match &samples[0] {
            Sample::Metric { labels, .. } => assert!(labels.is_empty()),
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_unknown_index_type_fails_scrape() {
        let metric = Metric::new("bad", oid!(1, 3, 6, 1, 70), MetricType::Gauge)
            .index(Index::new("idx", MetricType::DateAndTime));
        let vb = VarBind::new(metric.oid.child(1), Value::Integer(1));

        let result = pdu_to_samples(
            &[1],
            &vb,
            &metric,
            &HashMap::new(),
            true,
            &ExporterMetrics::unregistered(),
        );
        assert!(result.is_err());
    }
}
