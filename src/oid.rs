//! Object Identifier (OID) type.
//!
//! OIDs are stored as `SmallVec<[u32; 16]>` to avoid heap allocation for
//! common OIDs. Beyond the usual parse/format operations, this type carries
//! the arc arithmetic the resolver and sample builder need: prefix tests,
//! index-tail extraction and previous-sibling computation.

use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::fmt;

/// Object Identifier.
///
/// Stored as a sequence of arc values (u32). Uses SmallVec to avoid
/// heap allocation for OIDs with 16 or fewer arcs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self {
            arcs: SmallVec::new(),
        }
    }

    /// Create an OID from arc values.
    ///
    /// Accepts any iterator of `u32` values.
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    /// Create an OID from a slice of arcs.
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse an OID from dotted string notation (e.g., "1.3.6.1.2.1.1.1.0").
    ///
    /// A leading dot is accepted and ignored, matching the convention used in
    /// exporter module configuration (`.1.3.6.1.2.1.2.2.1.8`).
    ///
    /// # Examples
    ///
    /// ```
    /// use snmp_collector::oid::Oid;
    ///
    /// let oid = Oid::parse("1.3.6.1.2.1.1.1.0").unwrap();
    /// assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1, 1, 1, 0]);
    ///
    /// let dotted = Oid::parse(".1.3.6.1").unwrap();
    /// assert_eq!(dotted.to_string(), "1.3.6.1");
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::empty());
        }

        let mut arcs = SmallVec::new();

        for part in s.split('.') {
            if part.is_empty() {
                continue;
            }

            let arc: u32 = part
                .parse()
                .map_err(|_| Error::InvalidOid(s.to_string().into_boxed_str()).boxed())?;

            arcs.push(arc);
        }

        Ok(Self { arcs })
    }

    /// Get the arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Get the number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Check if the OID is empty.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// The final arc, if any.
    ///
    /// Dynamic filters use this as the row index of a probed table entry.
    pub fn last_arc(&self) -> Option<u32> {
        self.arcs.last().copied()
    }

    /// Check if this OID starts with another OID.
    ///
    /// Returns `true` if `self` begins with the same arcs as `other`.
    /// An OID always starts with itself, and any OID starts with an empty OID.
    ///
    /// # Examples
    ///
    /// ```
    /// use snmp_collector::oid::Oid;
    ///
    /// let if_in_octets = Oid::parse("1.3.6.1.2.1.2.2.1.10.3").unwrap();
    /// let if_table = Oid::parse("1.3.6.1.2.1.2.2").unwrap();
    ///
    /// assert!(if_in_octets.starts_with(&if_table));
    /// assert!(!if_table.starts_with(&if_in_octets));
    /// assert!(if_in_octets.starts_with(&if_in_octets));
    /// ```
    pub fn starts_with(&self, other: &Oid) -> bool {
        self.arcs.len() >= other.arcs.len() && self.arcs[..other.arcs.len()] == other.arcs[..]
    }

    /// The arcs following `prefix`, or `None` if `prefix` does not prefix `self`.
    ///
    /// This is the index tail of a PDU matched to a metric.
    ///
    /// # Examples
    ///
    /// ```
    /// use snmp_collector::oid::Oid;
    ///
    /// let pdu = Oid::parse("1.3.6.1.2.1.2.2.1.10.3").unwrap();
    /// let metric = Oid::parse("1.3.6.1.2.1.2.2.1.10").unwrap();
    /// assert_eq!(pdu.suffix(&metric), Some(&[3u32][..]));
    /// assert_eq!(metric.suffix(&pdu), None);
    /// ```
    pub fn suffix(&self, prefix: &Oid) -> Option<&[u32]> {
        if self.starts_with(prefix) {
            Some(&self.arcs[prefix.arcs.len()..])
        } else {
            None
        }
    }

    /// Get the parent OID (all arcs except the last).
    ///
    /// Returns `None` if the OID is empty.
    pub fn parent(&self) -> Option<Oid> {
        if self.arcs.is_empty() {
            None
        } else {
            Some(Oid {
                arcs: SmallVec::from_slice(&self.arcs[..self.arcs.len() - 1]),
            })
        }
    }

    /// Create a child OID by appending an arc.
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Oid { arcs }
    }

    /// Create a new OID with `tail` appended.
    ///
    /// # Examples
    ///
    /// ```
    /// use snmp_collector::oid::Oid;
    ///
    /// let base = Oid::parse("1.3.6.1.2.1.2.2.1.2").unwrap();
    /// assert_eq!(base.join(&[4]).to_string(), "1.3.6.1.2.1.2.2.1.2.4");
    /// ```
    pub fn join(&self, tail: &[u32]) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.extend_from_slice(tail);
        Oid { arcs }
    }

    /// The sibling OID whose final arc is one less.
    ///
    /// Combined index types (`InetAddress`, `LldpPortId`, ...) store their
    /// type tag in the column immediately preceding the value column; this
    /// computes that column's OID. Returns `None` for an empty OID or when
    /// the final arc is already zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use snmp_collector::oid::Oid;
    ///
    /// let addr = Oid::parse("1.3.6.1.2.1.4.34.1.3").unwrap();
    /// let addr_type = addr.prev_sibling().unwrap();
    /// assert_eq!(addr_type.to_string(), "1.3.6.1.2.1.4.34.1.2");
    /// ```
    pub fn prev_sibling(&self) -> Option<Oid> {
        let last = self.arcs.last().copied()?;
        let prev = last.checked_sub(1)?;
        let mut arcs = self.arcs.clone();
        *arcs.last_mut().unwrap() = prev;
        Some(Oid { arcs })
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.arcs {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = Box<crate::error::Error>;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::new(arcs)
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.arcs.cmp(&other.arcs)
    }
}

/// Macro to create an OID at compile time.
///
/// This is the preferred way to create OID constants since it's concise
/// and avoids parsing overhead.
///
/// # Examples
///
/// ```
/// use snmp_collector::oid;
///
/// let if_oper_status = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 8);
/// assert_eq!(if_oper_status.to_string(), "1.3.6.1.2.1.2.2.1.8");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}
