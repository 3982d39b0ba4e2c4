//! SNMP value types.
//!
//! The `Value` enum represents the SNMP data types a scrape can return,
//! including the SMIv2 exception values and the Opaque-wrapped float types
//! some agents use for sensor data.

use crate::oid::Oid;
use bytes::Bytes;

/// SNMP value.
///
/// One variant per wire type the session layer can hand back. The value
/// coercer dispatches exhaustively on this enum, so adding a variant
/// requires revisiting [`coerce`](crate::coerce).
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    /// INTEGER (ASN.1 primitive, signed 32-bit)
    Integer(i32),

    /// OCTET STRING (arbitrary bytes)
    OctetString(Bytes),

    /// NULL
    Null,

    /// OBJECT IDENTIFIER
    ObjectIdentifier(Oid),

    /// IpAddress (4 bytes, big-endian)
    IpAddress([u8; 4]),

    /// Counter32 (unsigned 32-bit, wrapping)
    Counter32(u32),

    /// Gauge32 / Unsigned32 (unsigned 32-bit, non-wrapping)
    Gauge32(u32),

    /// TimeTicks (hundredths of seconds since epoch)
    TimeTicks(u32),

    /// Counter64 (unsigned 64-bit, wrapping).
    ///
    /// SNMPv2c/v3 only. Values above 2^53 lose precision as f64; see
    /// [`coerce::pdu_value`](crate::coerce::pdu_value) for the wrap option.
    Counter64(u64),

    /// Opaque-wrapped IEEE 754 single-precision float.
    OpaqueFloat(f32),

    /// Opaque-wrapped IEEE 754 double-precision float.
    OpaqueDouble(f64),

    /// noSuchObject exception - the OID is valid but has no value on this agent.
    NoSuchObject,

    /// noSuchInstance exception - the specific instance does not exist.
    NoSuchInstance,

    /// endOfMibView exception - end of the MIB has been reached during a walk.
    EndOfMibView,
}

impl Value {
    /// Interpret as a signed 64-bit integer.
    ///
    /// This mirrors how the exporter coerces "any other numeric PDU": every
    /// integer-valued variant converts, everything else returns `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use snmp_collector::Value;
    ///
    /// assert_eq!(Value::Integer(-42).as_i64(), Some(-42));
    /// assert_eq!(Value::Counter32(100).as_i64(), Some(100));
    /// assert_eq!(Value::Counter64(u64::MAX).as_i64(), Some(-1)); // two's complement
    /// assert_eq!(Value::Null.as_i64(), None);
    /// ```
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v as i64),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(*v as i64),
            Value::Counter64(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Try to get as u64.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Counter64(v) => Some(*v),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(*v as u64),
            Value::Integer(v) if *v >= 0 => Some(*v as u64),
            _ => None,
        }
    }

    /// Try to get as bytes.
    ///
    /// Returns `Some(&[u8])` for [`Value::OctetString`], `None` otherwise.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as string (UTF-8).
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Try to get as OID.
    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Value::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }

    /// Check if this is an exception value.
    ///
    /// The scrape engine skips `NoSuchObject`/`NoSuchInstance` variables in
    /// GET responses rather than reporting them as errors.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(data) => {
                if let Ok(s) = std::str::from_utf8(data) {
                    write!(f, "{}", s)
                } else {
                    write!(f, "0x")?;
                    for b in data.iter() {
                        write!(f, "{:02x}", b)?;
                    }
                    Ok(())
                }
            }
            Value::Null => write!(f, "NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::IpAddress(addr) => {
                write!(f, "{}.{}.{}.{}", addr[0], addr[1], addr[2], addr[3])
            }
            Value::Counter32(v) => write!(f, "{}", v),
            Value::Gauge32(v) => write!(f, "{}", v),
            Value::TimeTicks(v) => write!(f, "{}", v),
            Value::Counter64(v) => write!(f, "{}", v),
            Value::OpaqueFloat(v) => write!(f, "{}", v),
            Value::OpaqueDouble(v) => write!(f, "{}", v),
            Value::NoSuchObject => write!(f, "noSuchObject"),
            Value::NoSuchInstance => write!(f, "noSuchInstance"),
            Value::EndOfMibView => write!(f, "endOfMibView"),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Counter64(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::OctetString(Bytes::from(s))
    }
}

impl From<&[u8]> for Value {
    fn from(data: &[u8]) -> Self {
        Value::OctetString(Bytes::copy_from_slice(data))
    }
}

impl From<Bytes> for Value {
    fn from(data: Bytes) -> Self {
        Value::OctetString(data)
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectIdentifier(oid)
    }
}

impl From<std::net::Ipv4Addr> for Value {
    fn from(addr: std::net::Ipv4Addr) -> Self {
        Value::IpAddress(addr.octets())
    }
}

impl From<[u8; 4]> for Value {
    fn from(addr: [u8; 4]) -> Self {
        Value::IpAddress(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_i64() {
        assert_eq!(Value::Integer(42).as_i64(), Some(42));
        assert_eq!(Value::Integer(-42).as_i64(), Some(-42));
        assert_eq!(Value::Counter32(100).as_i64(), Some(100));
        assert_eq!(Value::Gauge32(200).as_i64(), Some(200));
        assert_eq!(Value::TimeTicks(300).as_i64(), Some(300));
        assert_eq!(Value::Counter64(400).as_i64(), Some(400));
        assert_eq!(Value::Null.as_i64(), None);
        assert_eq!(Value::OctetString(Bytes::new()).as_i64(), None);
    }

    #[test]
    fn test_as_u64() {
        assert_eq!(Value::Counter64(100).as_u64(), Some(100));
        assert_eq!(Value::Counter32(100).as_u64(), Some(100));
        assert_eq!(Value::Integer(50).as_u64(), Some(50));
        assert_eq!(Value::Integer(-1).as_u64(), None);
    }

    #[test]
    fn test_as_bytes_and_str() {
        let s = Value::OctetString(Bytes::from_static(b"hello"));
        assert_eq!(s.as_bytes(), Some(b"hello".as_slice()));
        assert_eq!(s.as_str(), Some("hello"));

        let invalid = Value::OctetString(Bytes::from_static(&[0xFF, 0xFE]));
        assert_eq!(invalid.as_str(), None);
        assert!(invalid.as_bytes().is_some());

        assert_eq!(Value::Integer(1).as_bytes(), None);
    }

    #[test]
    fn test_is_exception() {
        assert!(Value::NoSuchObject.is_exception());
        assert!(Value::NoSuchInstance.is_exception());
        assert!(Value::EndOfMibView.is_exception());
        assert!(!Value::Integer(1).is_exception());
        assert!(!Value::Null.is_exception());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Integer(-42).to_string(), "-42");
        assert_eq!(
            Value::OctetString(Bytes::from_static(b"eth0")).to_string(),
            "eth0"
        );
        assert_eq!(
            Value::OctetString(Bytes::from_static(&[0xFF, 0xFE])).to_string(),
            "0xfffe"
        );
        assert_eq!(Value::IpAddress([192, 168, 1, 1]).to_string(), "192.168.1.1");
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::NoSuchObject.to_string(), "noSuchObject");
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from(42i32), Value::Integer(42));
        assert_eq!(Value::from(42u64), Value::Counter64(42));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(
            Value::from(std::net::Ipv4Addr::new(10, 0, 0, 1)),
            Value::IpAddress([10, 0, 0, 1])
        );
    }
}
