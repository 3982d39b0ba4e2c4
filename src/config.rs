//! Parsed module configuration.
//!
//! These are the objects the configuration loader hands to the collector: a
//! [`Module`] is a declarative recipe of OIDs to fetch, dynamic filters to
//! apply, and how the returned PDUs should be interpreted. The collector
//! treats a module as immutable for the lifetime of a scrape.

use crate::oid::Oid;
use crate::version::Version;
use regex::Regex;
use std::collections::BTreeMap;
use std::time::Duration;

/// Metric and index type names recognized in module configuration.
///
/// The same set of names is used for metric declarations and for index
/// declarations; not every type is valid in both positions (for example
/// `DateAndTime` cannot appear as an index). The index decoder rejects
/// invalid index types as configuration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum MetricType {
    /// Numeric gauge.
    Gauge,
    /// Monotonic counter.
    Counter,
    /// Signed 32-bit integer (also used for plain `Integer` indexes).
    Integer32,
    /// Raw octet string, rendered as `0x<HEX>`.
    OctetString,
    /// Octet string rendered as UTF-8 text.
    DisplayString,
    /// Six-byte MAC address.
    PhysAddress48,
    /// Tag-dispatched address union (RFC 4001): tag 1 = IPv4, 2 = IPv6.
    InetAddress,
    /// `InetAddress` variant whose index omits the length octet.
    InetAddressMissingSize,
    /// Four-byte IPv4 address.
    InetAddressIPv4,
    /// Sixteen-byte IPv6 address.
    InetAddressIPv6,
    /// Tag-dispatched LLDP port identifier (interface name or MAC).
    LldpPortId,
    /// RFC 2579 DateAndTime, emitted as a unix-seconds gauge.
    DateAndTime,
    /// Enumeration emitted as a `_info` series with the state as a label.
    EnumAsInfo,
    /// Enumeration emitted as a full state set (one series per state).
    EnumAsStateSet,
    /// BITS construct, one series per defined bit.
    Bits,
    /// Opaque-wrapped single-precision float.
    OpaqueFloat,
    /// Opaque-wrapped double-precision float.
    OpaqueDouble,
    /// 64-bit counter, optionally wrapped to the f64 mantissa.
    Counter64,
}

impl MetricType {
    /// Parse a configuration type name.
    ///
    /// Accepts the aliases the module generator emits (`Integer` for
    /// `Integer32`, `Float`/`Double` for the Opaque forms).
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "gauge" => Self::Gauge,
            "counter" => Self::Counter,
            "Integer32" | "Integer" => Self::Integer32,
            "OctetString" => Self::OctetString,
            "DisplayString" => Self::DisplayString,
            "PhysAddress48" => Self::PhysAddress48,
            "InetAddress" => Self::InetAddress,
            "InetAddressMissingSize" => Self::InetAddressMissingSize,
            "InetAddressIPv4" => Self::InetAddressIPv4,
            "InetAddressIPv6" => Self::InetAddressIPv6,
            "LldpPortId" => Self::LldpPortId,
            "DateAndTime" => Self::DateAndTime,
            "EnumAsInfo" => Self::EnumAsInfo,
            "EnumAsStateSet" => Self::EnumAsStateSet,
            "Bits" => Self::Bits,
            "OpaqueFloat" | "Float" => Self::OpaqueFloat,
            "OpaqueDouble" | "Double" => Self::OpaqueDouble,
            "Counter64" => Self::Counter64,
            _ => return None,
        })
    }

    /// Whether this is a combined type whose concrete form is chosen by a
    /// tag in a sibling object.
    pub fn is_combined(&self) -> bool {
        matches!(
            self,
            Self::InetAddress | Self::InetAddressMissingSize | Self::LldpPortId
        )
    }
}

/// One index declaration of a table metric.
///
/// Order within [`Metric::indexes`] is significant: indexes are parsed
/// left-to-right, each consuming a prefix of the OID tail.
#[derive(Debug, Clone)]
pub struct Index {
    /// Label name the decoded index value is attached under.
    pub labelname: String,
    /// How the index oids are decoded.
    pub index_type: MetricType,
    /// Fixed octet-string length from the MIB; 0 means not fixed.
    pub fixed_size: usize,
    /// IMPLIED index: the octet string consumes all remaining oids.
    pub implied: bool,
    /// Enumeration for `EnumAsInfo` indexes.
    pub enum_values: BTreeMap<i64, String>,
}

impl Index {
    /// Create an index with no sizing options.
    pub fn new(labelname: impl Into<String>, index_type: MetricType) -> Self {
        Self {
            labelname: labelname.into(),
            index_type,
            fixed_size: 0,
            implied: false,
            enum_values: BTreeMap::new(),
        }
    }

    /// Set the fixed octet-string size.
    pub fn fixed_size(mut self, size: usize) -> Self {
        self.fixed_size = size;
        self
    }

    /// Mark the index as IMPLIED.
    pub fn implied(mut self) -> Self {
        self.implied = true;
        self
    }

    /// Set the enumeration values.
    pub fn enum_values(mut self, values: BTreeMap<i64, String>) -> Self {
        self.enum_values = values;
        self
    }
}

/// A label lookup: decorate a metric's label set with a value fetched from
/// another OID in the same scrape.
///
/// An empty `labels` list means "delete `labelname` from the label set".
#[derive(Debug, Clone)]
pub struct Lookup {
    /// Label name to set (or delete).
    pub labelname: String,
    /// Base OID of the column to read the label value from.
    pub oid: Oid,
    /// How the looked-up PDU is rendered into a label string.
    pub lookup_type: MetricType,
    /// Index label names whose oids are appended to `oid` to address the row.
    pub labels: Vec<String>,
}

/// A dynamic filter: walk a probe OID, keep the row indices whose rendered
/// value matches any of `values`, and rewrite the scrape plan for `targets`
/// to index-filtered GETs.
#[derive(Debug, Clone)]
pub struct DynamicFilter {
    /// Probe subtree to walk.
    pub oid: Oid,
    /// Regex set; a row is kept if any pattern matches its rendered value.
    pub values: Vec<String>,
    /// OIDs whose walk/get plan is replaced with filtered gets.
    pub targets: Vec<Oid>,
}

/// One named regex extraction from a string-valued metric.
#[derive(Debug, Clone)]
pub struct RegexExtract {
    /// Pattern to match against the rendered PDU value.
    pub regex: Regex,
    /// Replacement template expanded from the match (e.g. `"$1"`), then
    /// parsed as f64.
    pub value: String,
}

/// A metric definition.
#[derive(Debug, Clone)]
pub struct Metric {
    /// Sample name.
    pub name: String,
    /// OID this metric is rooted at.
    pub oid: Oid,
    /// Declared type.
    pub metric_type: MetricType,
    /// Help text.
    pub help: String,
    /// Index declarations, parsed left-to-right from the OID tail.
    pub indexes: Vec<Index>,
    /// Label lookups applied after index decoding.
    pub lookups: Vec<Lookup>,
    /// Enumeration for `EnumAsInfo`/`EnumAsStateSet`/`Bits` metrics.
    pub enum_values: BTreeMap<i64, String>,
    /// Named regex extractions for string metrics; the suffix is appended to
    /// the metric name.
    pub regex_extracts: BTreeMap<String, Vec<RegexExtract>>,
    /// Multiplier applied to numeric values; 0 disables scaling.
    pub scale: f64,
    /// Addend applied to numeric values.
    pub offset: f64,
}

impl Metric {
    /// Create a metric definition with empty options.
    pub fn new(name: impl Into<String>, oid: Oid, metric_type: MetricType) -> Self {
        Self {
            name: name.into(),
            oid,
            metric_type,
            help: String::new(),
            indexes: Vec::new(),
            lookups: Vec::new(),
            enum_values: BTreeMap::new(),
            regex_extracts: BTreeMap::new(),
            scale: 0.0,
            offset: 0.0,
        }
    }

    /// Set the help text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Append an index declaration.
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Append a lookup.
    pub fn lookup(mut self, lookup: Lookup) -> Self {
        self.lookups.push(lookup);
        self
    }

    /// Set the enumeration values.
    pub fn enum_values(mut self, values: BTreeMap<i64, String>) -> Self {
        self.enum_values = values;
        self
    }

    /// Add a named regex extraction.
    pub fn regex_extract(mut self, suffix: impl Into<String>, extracts: Vec<RegexExtract>) -> Self {
        self.regex_extracts.insert(suffix.into(), extracts);
        self
    }

    /// Set scale and offset.
    pub fn scale_offset(mut self, scale: f64, offset: f64) -> Self {
        self.scale = scale;
        self.offset = offset;
        self
    }
}

/// Per-module walk parameters applied to the session.
#[derive(Debug, Clone)]
pub struct WalkParams {
    /// SNMP version spoken to the target.
    pub version: Version,
    /// Max-repetitions for GETBULK; also caps the GET batch size.
    pub max_repetitions: u32,
    /// Retries per request.
    pub retries: u32,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Use an unconnected UDP socket (responses may come from a different
    /// source address than the request went to).
    pub use_unconnected_udp_socket: bool,
    /// Tolerate agents that return OIDs out of lexicographic order.
    pub allow_non_increasing_oids: bool,
}

impl Default for WalkParams {
    fn default() -> Self {
        Self {
            version: Version::V2c,
            max_repetitions: 25,
            retries: 3,
            timeout: Duration::from_secs(5),
            use_unconnected_udp_socket: false,
            allow_non_increasing_oids: false,
        }
    }
}

/// A module: the full recipe for one kind of target.
#[derive(Debug, Clone, Default)]
pub struct Module {
    /// Subtree OIDs to WALK, in order.
    pub walk: Vec<Oid>,
    /// Exact OIDs to GET, in order.
    pub get: Vec<Oid>,
    /// Metric definitions. OIDs must be unique within a module.
    pub metrics: Vec<Metric>,
    /// Dynamic filters, applied in order before the GET/WALK phases.
    pub filters: Vec<DynamicFilter>,
    /// Session parameters.
    pub walk_params: WalkParams,
}

/// A module paired with its configuration name, for per-module labeling.
#[derive(Debug, Clone)]
pub struct NamedModule {
    /// Configuration key of the module.
    pub name: String,
    /// The module itself.
    pub module: Module,
}

impl NamedModule {
    /// Pair a module with its name.
    pub fn new(name: impl Into<String>, module: Module) -> Self {
        Self {
            name: name.into(),
            module,
        }
    }
}
