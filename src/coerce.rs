//! PDU value coercion.
//!
//! Two renderings of a returned value: [`pdu_value`] produces the f64 a
//! numeric sample carries, [`pdu_value_as_string`] produces the string a
//! label carries. Byte-string label rendering reuses the index decoder so
//! octet strings look identical whether they arrive as a value or as an
//! index.

use crate::config::MetricType;
use crate::index::index_oids_as_string;
use crate::metrics::ExporterMetrics;
use crate::value::Value;
use crate::varbind::VarBind;
use std::collections::BTreeMap;

/// 2^53, the largest integer span a double can represent exactly.
pub const FLOAT64_MANTISSA: u64 = 9_007_199_254_740_992;

/// Convert a PDU value to the f64 a sample carries.
///
/// With `wrap_counters` enabled, Counter64 values are reduced modulo 2^53 so
/// they stay exactly representable; rate() handles the artificial wrap the
/// same way it handles a real counter wrap.
///
/// # Examples
///
/// ```
/// use snmp_collector::coerce::{pdu_value, FLOAT64_MANTISSA};
/// use snmp_collector::Value;
///
/// let big = Value::Counter64(FLOAT64_MANTISSA + 5);
/// assert_eq!(pdu_value(&big, true), 5.0);
/// assert_eq!(pdu_value(&Value::Integer(-3), false), -3.0);
/// ```
pub fn pdu_value(value: &Value, wrap_counters: bool) -> f64 {
    match value {
        Value::Counter64(v) => {
            if wrap_counters {
                (v % FLOAT64_MANTISSA) as f64
            } else {
                *v as f64
            }
        }
        Value::OpaqueFloat(v) => *v as f64,
        Value::OpaqueDouble(v) => *v,
        other => other.as_i64().unwrap_or(0) as f64,
    }
}

/// Render a PDU value as a label string.
///
/// `typ` is the declared type of the metric or lookup the value belongs to;
/// it matters only for byte strings, where it selects the index-decoder
/// rendering (`0xHEX`, UTF-8 text, address formats). `None` and `Bits`
/// both fall back to the raw octet-string rendering.
pub fn pdu_value_as_string(
    vb: &VarBind,
    typ: Option<MetricType>,
    metrics: &ExporterMetrics,
) -> String {
    match &vb.value {
        Value::Integer(v) => v.to_string(),
        Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => v.to_string(),
        Value::Counter64(v) => v.to_string(),
        Value::OpaqueFloat(v) => format!("{}", v),
        Value::OpaqueDouble(v) => format!("{}", v),
        Value::ObjectIdentifier(oid) => oid.to_string(),
        Value::IpAddress(addr) => format!("{}.{}.{}.{}", addr[0], addr[1], addr[2], addr[3]),
        Value::OctetString(bytes) => {
            let typ = match typ {
                None | Some(MetricType::Bits) => MetricType::OctetString,
                Some(t) => t,
            };
            // Reuse the OID index parsing code; the length is explicit in
            // an index, so prepend it for the sized string types.
            let mut parts: Vec<u32> = Vec::with_capacity(bytes.len() + 1);
            if matches!(typ, MetricType::OctetString | MetricType::DisplayString) {
                parts.push(bytes.len() as u32);
            }
            parts.extend(bytes.iter().map(|&b| b as u32));
            match index_oids_as_string(&parts, typ, 0, false, &BTreeMap::new()) {
                Ok((value, _, _)) => value,
                Err(err) => {
                    tracing::debug!(
                        target: "snmp_collector::coerce",
                        oid = %vb.oid,
                        error = %err,
                        "cannot render octet string with declared type"
                    );
                    metrics.unexpected_pdu_type.inc();
                    vb.value.to_string()
                }
            }
        }
        Value::Null => String::new(),
        other => {
            // This shouldn't happen.
            metrics.unexpected_pdu_type.inc();
            other.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use bytes::Bytes;

    fn vb(value: Value) -> VarBind {
        VarBind::new(oid!(1, 3, 6, 1), value)
    }

    fn render(value: Value, typ: Option<MetricType>) -> String {
        pdu_value_as_string(&vb(value), typ, &ExporterMetrics::unregistered())
    }

    #[test]
    fn test_counter64_wrap() {
        let v = Value::Counter64(FLOAT64_MANTISSA + 17);
        assert_eq!(pdu_value(&v, true), 17.0);
        assert_eq!(pdu_value(&v, false), (FLOAT64_MANTISSA + 17) as f64);
    }

    #[test]
    fn test_counter64_below_mantissa_unchanged() {
        let v = Value::Counter64(123_456);
        assert_eq!(pdu_value(&v, true), 123_456.0);
        assert_eq!(pdu_value(&v, false), 123_456.0);
    }

    #[test]
    fn test_opaque_floats() {
        assert_eq!(pdu_value(&Value::OpaqueFloat(1.5), true), 1.5);
        assert_eq!(pdu_value(&Value::OpaqueDouble(-2.25), true), -2.25);
    }

    #[test]
    fn test_signed_interpretation() {
        assert_eq!(pdu_value(&Value::Integer(-7), true), -7.0);
        assert_eq!(pdu_value(&Value::Gauge32(7), true), 7.0);
        // Non-numeric values coerce to zero.
        assert_eq!(pdu_value(&Value::OctetString(Bytes::new()), true), 0.0);
        assert_eq!(pdu_value(&Value::Null, true), 0.0);
    }

    #[test]
    fn test_render_numbers() {
        assert_eq!(render(Value::Integer(-5), None), "-5");
        assert_eq!(render(Value::Counter64(99), None), "99");
        assert_eq!(render(Value::OpaqueDouble(1.25), None), "1.25");
    }

    #[test]
    fn test_render_oid_has_no_leading_dot() {
        assert_eq!(
            render(Value::ObjectIdentifier(oid!(1, 3, 6, 1, 2)), None),
            "1.3.6.1.2"
        );
    }

    #[test]
    fn test_render_octets_default_hex() {
        assert_eq!(
            render(Value::OctetString(Bytes::from_static(&[0xDE, 0xAD])), None),
            "0xDEAD"
        );
        // Bits also renders as raw octets.
        assert_eq!(
            render(
                Value::OctetString(Bytes::from_static(&[0xC0])),
                Some(MetricType::Bits)
            ),
            "0xC0"
        );
    }

    #[test]
    fn test_render_display_string() {
        assert_eq!(
            render(
                Value::OctetString(Bytes::from_static(b"GigabitEthernet0/1")),
                Some(MetricType::DisplayString)
            ),
            "GigabitEthernet0/1"
        );
    }

    #[test]
    fn test_render_display_string_sanitizes_invalid_utf8() {
        assert_eq!(
            render(
                Value::OctetString(Bytes::from_static(&[0x61, 0xFF])),
                Some(MetricType::DisplayString)
            ),
            "a\u{FFFD}"
        );
    }

    #[test]
    fn test_render_address_types() {
        assert_eq!(
            render(
                Value::OctetString(Bytes::from_static(&[10, 0, 0, 1])),
                Some(MetricType::InetAddressIPv4)
            ),
            "10.0.0.1"
        );
        assert_eq!(
            render(
                Value::OctetString(Bytes::from_static(&[0, 0x1A, 0x2B, 0x3C, 0x4D, 0x5E])),
                Some(MetricType::PhysAddress48)
            ),
            "00:1A:2B:3C:4D:5E"
        );
    }

    #[test]
    fn test_render_ip_address_value() {
        assert_eq!(render(Value::IpAddress([192, 0, 2, 9]), None), "192.0.2.9");
    }

    #[test]
    fn test_render_null_empty() {
        assert_eq!(render(Value::Null, None), "");
    }

    #[test]
    fn test_render_exception_counts_unexpected() {
        let metrics = ExporterMetrics::unregistered();
        let s = pdu_value_as_string(&vb(Value::NoSuchObject), None, &metrics);
        assert_eq!(s, "noSuchObject");
        assert_eq!(metrics.unexpected_pdu_type.get(), 1);
    }
}
