//! SNMP session contracts.
//!
//! The collector core does not speak the SNMP wire protocol itself; it
//! drives a session through the [`SnmpSession`] trait and obtains one
//! through a [`Connector`]. A production transport implements both; the
//! [`mock`] module provides a programmable in-memory implementation for
//! tests.
//!
//! The scrape engine is generic over the connector, mirroring how the
//! client in a transport library is generic over its transport.

pub mod mock;

use crate::error::{ErrorStatus, Result};
use crate::oid::Oid;
use crate::varbind::VarBind;
use crate::version::Version;
use bytes::Bytes;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub use mock::{MockConnector, MockSession};

/// Response to a GET request.
///
/// `error_status`/`error_index` carry the packet-level error the agent
/// reported; `varbinds` are the returned variables (possibly exception
/// values on SNMPv2c/v3).
#[derive(Debug, Clone)]
pub struct GetResponse {
    /// Packet-level error status.
    pub error_status: ErrorStatus,
    /// 1-based index of the varbind the error applies to; 0 for the PDU.
    pub error_index: u32,
    /// Returned variables.
    pub variables: Vec<VarBind>,
}

impl GetResponse {
    /// A successful response carrying `variables`.
    pub fn ok(variables: Vec<VarBind>) -> Self {
        Self {
            error_status: ErrorStatus::NoError,
            error_index: 0,
            variables,
        }
    }

    /// An error response with no variables.
    pub fn error(status: ErrorStatus) -> Self {
        Self {
            error_status: status,
            error_index: 0,
            variables: Vec::new(),
        }
    }
}

/// Observability hooks installed on a session.
///
/// The session implementation invokes these around its network I/O:
/// `on_send` once per packet sent (including retries), `on_recv` with the
/// request round-trip time once per response received, `on_retry` once per
/// retransmission.
#[derive(Clone, Default)]
pub struct SessionHooks {
    /// Called when a packet is sent.
    pub on_send: Option<Arc<dyn Fn() + Send + Sync>>,
    /// Called with the round-trip latency when a response arrives.
    pub on_recv: Option<Arc<dyn Fn(Duration) + Send + Sync>>,
    /// Called when a request is retransmitted.
    pub on_retry: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl SessionHooks {
    /// Invoke the send hook, if installed.
    pub fn sent(&self) {
        if let Some(f) = &self.on_send {
            f();
        }
    }

    /// Invoke the receive hook with the observed round-trip latency.
    pub fn received(&self, latency: Duration) {
        if let Some(f) = &self.on_recv {
            f(latency);
        }
    }

    /// Invoke the retry hook, if installed.
    pub fn retried(&self) {
        if let Some(f) = &self.on_retry {
            f();
        }
    }
}

impl std::fmt::Debug for SessionHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHooks")
            .field("on_send", &self.on_send.is_some())
            .field("on_recv", &self.on_recv.is_some())
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

/// Everything a connector needs to open a session to one target.
///
/// Built by the scrape engine from the module's walk parameters, the auth
/// object and the collector-level options; consumed by
/// [`Connector::connect`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Target hostname or address (no transport prefix, no port).
    pub target: String,
    /// Target port (default 161).
    pub port: u16,
    /// Transport scheme, e.g. "udp" or "tcp".
    pub transport: String,
    /// SNMP version to speak.
    pub version: Version,
    /// Community string for v1/v2c.
    pub community: Bytes,
    /// USM security parameters for v3.
    pub security: Option<UsmSecurity>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries per request.
    pub retries: u32,
    /// Max-repetitions for GETBULK walks.
    pub max_repetitions: u32,
    /// Local bind address (`host:port`); empty port means OS-chosen.
    pub local_addr: Option<String>,
    /// Use an unconnected UDP socket.
    pub use_unconnected_udp_socket: bool,
    /// Tolerate non-increasing OIDs during walks.
    pub allow_non_increasing_oids: bool,
    /// Observability hooks.
    pub hooks: SessionHooks,
}

impl Default for SessionConfig {
    /// Returns configuration for SNMPv2c with community "public" against
    /// port 161 over UDP.
    fn default() -> Self {
        Self {
            target: String::new(),
            port: 161,
            transport: "udp".to_string(),
            version: Version::V2c,
            community: Bytes::from_static(b"public"),
            security: None,
            timeout: Duration::from_secs(5),
            retries: 3,
            max_repetitions: 25,
            local_addr: None,
            use_unconnected_udp_socket: false,
            allow_non_increasing_oids: false,
            hooks: SessionHooks::default(),
        }
    }
}

/// USM (SNMPv3) security parameters.
#[derive(Debug, Clone)]
pub struct UsmSecurity {
    /// Security name.
    pub username: String,
    /// Authentication protocol and passphrase.
    pub auth: Option<(AuthProtocol, String)>,
    /// Privacy protocol and passphrase.
    pub privacy: Option<(PrivProtocol, String)>,
    /// Context name, if any.
    pub context_name: Option<String>,
}

/// SNMPv3 authentication protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthProtocol {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

/// SNMPv3 privacy protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PrivProtocol {
    Des,
    Aes128,
    Aes192,
    Aes256,
}

/// An open SNMP session.
///
/// All operations are async and may be raced against a cancellation token
/// by the caller. Implementations count packets and observe latency through
/// the hooks in their [`SessionConfig`].
pub trait SnmpSession: Send + Sync {
    /// GET the exact OIDs. One request; the caller batches.
    fn get(&self, oids: &[Oid]) -> impl Future<Output = Result<GetResponse>> + Send;

    /// Walk a subtree with GETNEXT, returning every varbind under it.
    fn walk_all(&self, subtree: &Oid) -> impl Future<Output = Result<Vec<VarBind>>> + Send;

    /// Walk a subtree with GETBULK, returning every varbind under it.
    fn bulk_walk_all(&self, subtree: &Oid) -> impl Future<Output = Result<Vec<VarBind>>> + Send;

    /// Release the session. Called on every scrape exit path.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// Opens sessions.
///
/// The scrape engine is generic over this, so tests can substitute
/// [`MockConnector`] and production code a real transport.
pub trait Connector: Send + Sync {
    /// Session type this connector produces.
    type Session: SnmpSession;

    /// Open a session with the given configuration.
    fn connect(&self, config: SessionConfig) -> impl Future<Output = Result<Self::Session>> + Send;
}
