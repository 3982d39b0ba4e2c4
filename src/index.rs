//! Index decoder.
//!
//! A table metric's row identity is encoded in the OID tail that follows
//! the metric's own OID. This module converts those index oids into typed
//! label strings: integers, MAC addresses, IPv4/IPv6 addresses, octet
//! strings with implied / fixed / length-prefixed sizing, enumerations, and
//! tag-dispatched unions such as `InetAddress` whose concrete subtype is
//! chosen by one or two leading tag oids.

use crate::config::MetricType;
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Right pad `oids` with zeros and split at `count`.
///
/// Some agents exclude trailing zero arcs from responses, so the head is
/// zero-filled to the requested length rather than failing short.
pub(crate) fn split_oid(oids: &[u32], count: usize) -> (Vec<u32>, Vec<u32>) {
    let mut head = vec![0u32; count];
    let mut tail = Vec::new();
    for (i, &o) in oids.iter().enumerate() {
        if i < count {
            head[i] = o;
        } else {
            tail.push(o);
        }
    }
    (head, tail)
}

/// The concrete type a combined-type tag selects, if any.
///
/// Tag values come from the object immediately preceding the value column
/// (`InetAddressType` before `InetAddress`, `LldpPortIdSubtype` before
/// `LldpPortId`).
pub fn combined_subtype(typ: MetricType, tag: i64) -> Option<MetricType> {
    match typ {
        MetricType::InetAddress | MetricType::InetAddressMissingSize => match tag {
            1 => Some(MetricType::InetAddressIPv4),
            2 => Some(MetricType::InetAddressIPv6),
            _ => None,
        },
        MetricType::LldpPortId => match tag {
            1 | 2 | 5 | 7 => Some(MetricType::DisplayString),
            3 => Some(MetricType::PhysAddress48),
            _ => None,
        },
        _ => None,
    }
}

/// Convert index oids to a string label value.
///
/// Returns the rendered string, the oids that were consumed, and the oids
/// left over for the next index declaration.
///
/// Octet-string length is determined as: `fixed_size` when non-zero, all
/// remaining oids when `implied`, otherwise one leading length oid.
///
/// A type that cannot appear in an index position (e.g. `DateAndTime`) is a
/// configuration error and fails the scrape.
pub fn index_oids_as_string(
    index_oids: &[u32],
    typ: MetricType,
    fixed_size: usize,
    implied: bool,
    enum_values: &BTreeMap<i64, String>,
) -> Result<(String, Vec<u32>, Vec<u32>)> {
    if typ.is_combined() {
        // One or two leading oids select the concrete type.
        let tag_len = if typ == MetricType::InetAddressMissingSize {
            1
        } else {
            2
        };
        let (sub_oid, value_oids) = split_oid(index_oids, tag_len);

        if let Some(subtype) = combined_subtype(typ, sub_oid[0] as i64) {
            let (value, used, remaining) =
                index_oids_as_string(&value_oids, subtype, 0, false, enum_values)?;
            let mut consumed = sub_oid;
            consumed.extend_from_slice(&used);
            return Ok((value, consumed, remaining));
        }
        if typ == MetricType::InetAddressMissingSize {
            // Unknown tag and no length available; consume everything.
            return index_oids_as_string(
                index_oids,
                MetricType::OctetString,
                0,
                true,
                enum_values,
            );
        }
        // The 2nd tag oid is the length of the value that follows.
        return index_oids_as_string(
            index_oids,
            MetricType::OctetString,
            sub_oid[1] as usize + 2,
            false,
            enum_values,
        );
    }

    match typ {
        MetricType::Integer32 | MetricType::Gauge | MetricType::Counter => {
            let (sub_oid, remaining) = split_oid(index_oids, 1);
            Ok((format!("{}", sub_oid[0]), sub_oid, remaining))
        }
        MetricType::PhysAddress48 => {
            let (sub_oid, remaining) = split_oid(index_oids, 6);
            let parts: Vec<String> = sub_oid.iter().map(|o| format!("{:02X}", o)).collect();
            Ok((parts.join(":"), sub_oid, remaining))
        }
        MetricType::OctetString => {
            let (content, sub_oid, remaining) = octet_content(index_oids, fixed_size, implied);
            if content.is_empty() {
                return Ok((String::new(), sub_oid, remaining));
            }
            let mut value = String::with_capacity(2 + content.len() * 2);
            value.push_str("0x");
            for b in &content {
                value.push_str(&format!("{:02X}", b));
            }
            Ok((value, sub_oid, remaining))
        }
        MetricType::DisplayString => {
            let (content, sub_oid, remaining) = octet_content(index_oids, fixed_size, implied);
            let value = String::from_utf8_lossy(&content).into_owned();
            Ok((value, sub_oid, remaining))
        }
        MetricType::InetAddressIPv4 => {
            let (sub_oid, remaining) = split_oid(index_oids, 4);
            let parts: Vec<String> = sub_oid.iter().map(|o| o.to_string()).collect();
            Ok((parts.join("."), sub_oid, remaining))
        }
        MetricType::InetAddressIPv6 => {
            let (sub_oid, remaining) = split_oid(index_oids, 16);
            let mut groups = Vec::with_capacity(8);
            for pair in sub_oid.chunks(2) {
                groups.push(format!("{:02X}{:02X}", pair[0], pair[1]));
            }
            Ok((groups.join(":"), sub_oid, remaining))
        }
        MetricType::EnumAsInfo => {
            let (sub_oid, remaining) = split_oid(index_oids, 1);
            let value = match enum_values.get(&(sub_oid[0] as i64)) {
                Some(text) => text.clone(),
                None => format!("{}", sub_oid[0]),
            };
            Ok((value, sub_oid, remaining))
        }
        other => Err(Error::config(format!(
            "unknown index type {:?}",
            other
        ))),
    }
}

/// Apply the octet-string length rules, returning the content bytes, the
/// consumed oids (length oid included when read) and the remainder.
fn octet_content(index_oids: &[u32], fixed_size: usize, implied: bool) -> (Vec<u8>, Vec<u32>, Vec<u32>) {
    let mut sub_oid = Vec::new();
    let mut oids = index_oids.to_vec();
    let mut length = fixed_size;
    if implied {
        length = oids.len();
    }
    if length == 0 {
        let (head, tail) = split_oid(&oids, 1);
        length = head[0] as usize;
        sub_oid = head;
        oids = tail;
    }
    let (content, remaining) = split_oid(&oids, length);
    sub_oid.extend_from_slice(&content);
    let bytes: Vec<u8> = content.iter().map(|&o| o as u8).collect();
    (bytes, sub_oid, remaining)
}
