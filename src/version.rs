//! SNMP protocol version.

/// SNMP protocol version.
///
/// The scrape engine keys two behaviors off this: SNMPv1 walks use GETNEXT
/// instead of GETBULK, and SNMPv1 GET batches are forced to a single OID so
/// `noSuchName` packet errors can be attributed to one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Version {
    /// SNMPv1
    V1,
    /// SNMPv2c (default)
    #[default]
    V2c,
    /// SNMPv3
    V3,
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::V1 => write!(f, "1"),
            Version::V2c => write!(f, "2c"),
            Version::V3 => write!(f, "3"),
        }
    }
}
