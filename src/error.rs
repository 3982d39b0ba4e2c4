//! Error types for snmp-collector.
//!
//! This module provides:
//!
//! - [`Error`] - The main error type covering every scrape failure mode
//! - [`ErrorStatus`] - SNMP protocol errors returned by agents (RFC 3416)
//! - [`ScrapePhase`] - The scrape phase an error or cancellation occurred in
//!
//! # Error Handling
//!
//! Errors are boxed for efficiency: `Result<T> = Result<T, Box<Error>>`.
//!
//! Recoverable conditions (unsupported OIDs, filter probe failures, malformed
//! samples) are debug-logged at the point of occurrence and never surface
//! here; only errors that terminate the scrape of a module are represented.

use std::time::Duration;

/// Result type alias using the library's boxed Error type.
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// The scrape phase in progress when an error occurred.
///
/// Used to build the cancellation messages the exporter reports, e.g.
/// `scrape cancelled after 9.8s (possible timeout) walking target 10.0.0.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapePhase {
    /// Opening the session to the target.
    Connecting,
    /// Issuing GET batches.
    Getting,
    /// Walking subtrees.
    Walking,
}

impl std::fmt::Display for ScrapePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting to"),
            Self::Getting => write!(f, "getting"),
            Self::Walking => write!(f, "walking"),
        }
    }
}

/// The main error type for all snmp-collector operations.
///
/// Each variant corresponds to one of the distinct failure kinds a scrape can
/// report. The collector facade converts any of these into a single
/// `snmp_error` invalid sample for the module that failed.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Context cancelled or deadline exceeded during a scrape phase.
    #[error("scrape cancelled after {elapsed:?} (possible timeout) {phase} target {target}")]
    Cancelled {
        phase: ScrapePhase,
        target: String,
        elapsed: Duration,
    },

    /// Transport-level inability to reach the target.
    #[error("error connecting to target {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: Box<Error>,
    },

    /// GET request failure (RPC or framing error).
    #[error("error getting target {target}: {source}")]
    Get {
        target: String,
        #[source]
        source: Box<Error>,
    },

    /// WALK/BULKWALK failure (RPC or framing error).
    #[error("error walking target {target}: {source}")]
    Walk {
        target: String,
        #[source]
        source: Box<Error>,
    },

    /// Non-zero SNMP error-status reported by the target.
    #[error("error reported by target {target}: Error Status {}", .status.as_i32())]
    TargetError { target: String, status: ErrorStatus },

    /// Raw session-level failure (timeout, I/O, malformed response).
    ///
    /// Produced by [`SnmpSession`](crate::session::SnmpSession)
    /// implementations; the scrape engine wraps it with the phase context.
    #[error("transport error: {0}")]
    Transport(Box<str>),

    /// Invalid configuration (e.g. a type that cannot be used as an index).
    #[error("configuration error: {0}")]
    Config(Box<str>),

    /// Invalid OID format.
    #[error("invalid OID: {0}")]
    InvalidOid(Box<str>),
}

impl Error {
    /// Box this error (convenience for constructing boxed errors).
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Construct a transport error from any displayable cause.
    pub fn transport(message: impl std::fmt::Display) -> Box<Self> {
        Error::Transport(message.to_string().into_boxed_str()).boxed()
    }

    /// Construct a configuration error.
    pub fn config(message: impl Into<String>) -> Box<Self> {
        Error::Config(message.into().into_boxed_str()).boxed()
    }
}

/// SNMP protocol error status codes (RFC 3416).
///
/// These codes are returned by agents in the response packet header. The
/// scrape engine treats `NoSuchName` on SNMPv1 as "OID unsupported, skip the
/// batch"; any other non-zero status fails the scrape with
/// [`Error::TargetError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorStatus {
    /// Operation completed successfully (status = 0).
    NoError,
    /// Response message would be too large for transport (status = 1).
    TooBig,
    /// Requested OID not found (status = 2). SNMPv1 only; v2c+ uses exception values.
    NoSuchName,
    /// Invalid value provided in SET request (status = 3).
    BadValue,
    /// Attempted to SET a read-only object (status = 4).
    ReadOnly,
    /// Unspecified error occurred (status = 5).
    GenErr,
    /// Object exists but access is denied (status = 6).
    NoAccess,
    /// SET value has wrong ASN.1 type (status = 7).
    WrongType,
    /// SET value has incorrect length (status = 8).
    WrongLength,
    /// SET value uses wrong encoding (status = 9).
    WrongEncoding,
    /// SET value is out of range or otherwise invalid (status = 10).
    WrongValue,
    /// Object does not support row creation (status = 11).
    NoCreation,
    /// Value is inconsistent with other managed objects (status = 12).
    InconsistentValue,
    /// Resource required for SET is unavailable (status = 13).
    ResourceUnavailable,
    /// SET commit phase failed (status = 14).
    CommitFailed,
    /// SET undo phase failed (status = 15).
    UndoFailed,
    /// Access denied by VACM (status = 16).
    AuthorizationError,
    /// Object does not support modification (status = 17).
    NotWritable,
    /// Named object cannot be created (status = 18).
    InconsistentName,
    /// Unknown or future error status code.
    Unknown(i32),
}

impl ErrorStatus {
    /// Create from raw status code.
    pub fn from_i32(code: i32) -> Self {
        match code {
            0 => Self::NoError,
            1 => Self::TooBig,
            2 => Self::NoSuchName,
            3 => Self::BadValue,
            4 => Self::ReadOnly,
            5 => Self::GenErr,
            6 => Self::NoAccess,
            7 => Self::WrongType,
            8 => Self::WrongLength,
            9 => Self::WrongEncoding,
            10 => Self::WrongValue,
            11 => Self::NoCreation,
            12 => Self::InconsistentValue,
            13 => Self::ResourceUnavailable,
            14 => Self::CommitFailed,
            15 => Self::UndoFailed,
            16 => Self::AuthorizationError,
            17 => Self::NotWritable,
            18 => Self::InconsistentName,
            other => Self::Unknown(other),
        }
    }

    /// Get the raw status code.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::NoError => 0,
            Self::TooBig => 1,
            Self::NoSuchName => 2,
            Self::BadValue => 3,
            Self::ReadOnly => 4,
            Self::GenErr => 5,
            Self::NoAccess => 6,
            Self::WrongType => 7,
            Self::WrongLength => 8,
            Self::WrongEncoding => 9,
            Self::WrongValue => 10,
            Self::NoCreation => 11,
            Self::InconsistentValue => 12,
            Self::ResourceUnavailable => 13,
            Self::CommitFailed => 14,
            Self::UndoFailed => 15,
            Self::AuthorizationError => 16,
            Self::NotWritable => 17,
            Self::InconsistentName => 18,
            Self::Unknown(code) => *code,
        }
    }

    /// Whether this status indicates success.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::NoError)
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NoError => "noError",
            Self::TooBig => "tooBig",
            Self::NoSuchName => "noSuchName",
            Self::BadValue => "badValue",
            Self::ReadOnly => "readOnly",
            Self::GenErr => "genErr",
            Self::NoAccess => "noAccess",
            Self::WrongType => "wrongType",
            Self::WrongLength => "wrongLength",
            Self::WrongEncoding => "wrongEncoding",
            Self::WrongValue => "wrongValue",
            Self::NoCreation => "noCreation",
            Self::InconsistentValue => "inconsistentValue",
            Self::ResourceUnavailable => "resourceUnavailable",
            Self::CommitFailed => "commitFailed",
            Self::UndoFailed => "undoFailed",
            Self::AuthorizationError => "authorizationError",
            Self::NotWritable => "notWritable",
            Self::InconsistentName => "inconsistentName",
            Self::Unknown(code) => return write!(f, "unknown({})", code),
        };
        write!(f, "{}", name)
    }
}
