//! Scrape engine.
//!
//! Drives one module scrape against one target: opens the session, applies
//! dynamic filters, issues the GET batches and subtree walks, and accounts
//! packets and retries. The engine holds no state across scrapes; the
//! per-target history lives in [`derived`](crate::derived).

use crate::auth::Auth;
use crate::config::Module;
use crate::error::{Error, ErrorStatus, Result, ScrapePhase};
use crate::filter::apply_dynamic_filters;
use crate::metrics::ExporterMetrics;
use crate::oid::Oid;
use crate::session::{Connector, SessionConfig, SnmpSession};
use crate::varbind::VarBind;
use crate::version::Version;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Collector-level options applied to every scrape.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Wrap Counter64 values to 2^53 to avoid floating point rounding.
    pub wrap_counters: bool,
    /// Local `host:port` to send SNMP from; empty port means OS-chosen.
    pub source_address: Option<String>,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            wrap_counters: true,
            source_address: None,
        }
    }
}

/// What one scrape returned.
#[derive(Debug, Default)]
pub struct ScrapeResults {
    /// Every PDU the GET and WALK phases produced.
    pub pdus: Vec<VarBind>,
    /// Packets sent, including retries.
    pub packets: u64,
    /// Packets retried.
    pub retries: u64,
}

/// Split a `transport://host:port` target into its parts.
///
/// The transport prefix is optional (default "udp"); the port is optional
/// (default 161). A host that fails host:port splitting is used verbatim,
/// so bare IPv6 literals fall through with the default port.
pub(crate) fn parse_target(target: &str) -> Result<(String, String, u16)> {
    let (transport, rest) = match target.split_once("://") {
        Some((transport, rest)) => (transport.to_string(), rest),
        None => ("udp".to_string(), target),
    };

    if let Some(stripped) = rest.strip_prefix('[') {
        // Bracketed IPv6 literal.
        if let Some((host, after)) = stripped.split_once(']') {
            if let Some(port) = after.strip_prefix(':') {
                let port: u16 = port.parse().map_err(|_| {
                    Error::config(format!(
                        "error converting port number to int for target {:?}",
                        target
                    ))
                })?;
                return Ok((transport, host.to_string(), port));
            }
        }
        return Ok((transport, rest.to_string(), 161));
    }

    match rest.rsplit_once(':') {
        // More than one colon without brackets is a bare IPv6 literal.
        Some((host, _)) if host.contains(':') => Ok((transport, rest.to_string(), 161)),
        Some((host, port)) => {
            let port: u16 = port.parse().map_err(|_| {
                Error::config(format!(
                    "error converting port number to int for target {:?}",
                    target
                ))
            })?;
            Ok((transport, host.to_string(), port))
        }
        None => Ok((transport, rest.to_string(), 161)),
    }
}

/// Scrape one module from one target.
///
/// The session is created here and released on every exit path. The
/// cancellation token interrupts any in-flight phase; the resulting error
/// names the phase and the elapsed time.
pub async fn scrape_target<C: Connector>(
    connector: &C,
    target: &str,
    auth: &Auth,
    module: &Module,
    metrics: &ExporterMetrics,
    options: &ScrapeOptions,
    cancel: &CancellationToken,
) -> Result<ScrapeResults> {
    let (transport, host, port) = parse_target(target)?;

    let packets = Arc::new(AtomicU64::new(0));
    let retries = Arc::new(AtomicU64::new(0));

    let mut config = SessionConfig {
        target: host,
        port,
        transport,
        version: module.walk_params.version,
        timeout: module.walk_params.timeout,
        retries: module.walk_params.retries,
        max_repetitions: module.walk_params.max_repetitions,
        local_addr: options.source_address.clone(),
        use_unconnected_udp_socket: module.walk_params.use_unconnected_udp_socket,
        allow_non_increasing_oids: module.walk_params.allow_non_increasing_oids,
        ..SessionConfig::default()
    };
    auth.apply(&mut config);

    {
        let packets = packets.clone();
        let packets_total = metrics.packets.clone();
        config.hooks.on_send = Some(Arc::new(move || {
            packets_total.inc();
            packets.fetch_add(1, Ordering::Relaxed);
        }));
        let packet_duration = metrics.packet_duration.clone();
        config.hooks.on_recv = Some(Arc::new(move |latency| {
            packet_duration.observe(latency.as_secs_f64());
        }));
        let retries = retries.clone();
        let retries_total = metrics.retries.clone();
        config.hooks.on_retry = Some(Arc::new(move || {
            retries_total.inc();
            retries.fetch_add(1, Ordering::Relaxed);
        }));
    }

    let start = Instant::now();
    let cancelled = |phase: ScrapePhase| {
        Error::Cancelled {
            phase,
            target: target.to_string(),
            elapsed: start.elapsed(),
        }
        .boxed()
    };

    let session = tokio::select! {
        _ = cancel.cancelled() => return Err(cancelled(ScrapePhase::Connecting)),
        result = connector.connect(config) => result.map_err(|source| {
            Error::Connect {
                target: target.to_string(),
                source,
            }
            .boxed()
        })?,
    };

    let result = run_phases(&session, target, module, metrics, cancel, &cancelled).await;
    session.close().await;

    result.map(|pdus| ScrapeResults {
        pdus,
        packets: packets.load(Ordering::Relaxed),
        retries: retries.load(Ordering::Relaxed),
    })
}

async fn run_phases<S: SnmpSession>(
    session: &S,
    target: &str,
    module: &Module,
    metrics: &ExporterMetrics,
    cancel: &CancellationToken,
    cancelled: &impl Fn(ScrapePhase) -> Box<Error>,
) -> Result<Vec<VarBind>> {
    // A cancellation firing inside a filter probe is treated like any other
    // probe failure (the filter is skipped); the GET phase reports it.
    let plan = tokio::select! {
        _ = cancel.cancelled() => return Err(cancelled(ScrapePhase::Getting)),
        plan = apply_dynamic_filters(session, module, metrics) => plan,
    };

    let mut pdus = Vec::new();

    // Max-repetitions can be 0, the batch size cannot. SNMPv1 can only
    // report one OID error per call.
    let mut batch_size = module.walk_params.max_repetitions as usize;
    if batch_size == 0 || module.walk_params.version == Version::V1 {
        batch_size = 1;
    }

    let mut get_oids: &[Oid] = &plan.get;
    while !get_oids.is_empty() {
        let n = get_oids.len().min(batch_size);

        tracing::debug!(target: "snmp_collector::scrape", oids = n, "getting OIDs");
        let get_start = Instant::now();
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(cancelled(ScrapePhase::Getting)),
            result = session.get(&get_oids[..n]) => result.map_err(|source| {
                Error::Get {
                    target: target.to_string(),
                    source,
                }
                .boxed()
            })?,
        };
        tracing::debug!(
            target: "snmp_collector::scrape",
            oids = n,
            duration_seconds = get_start.elapsed().as_secs_f64(),
            "get of OIDs completed"
        );

        // SNMPv1 reports unsupported OIDs as a packet error.
        if response.error_status == ErrorStatus::NoSuchName
            && module.walk_params.version == Version::V1
        {
            tracing::debug!(
                target: "snmp_collector::scrape",
                oid = %get_oids[0],
                "OID not supported by target"
            );
            get_oids = &get_oids[n..];
            continue;
        }
        if !response.error_status.is_ok() {
            return Err(Error::TargetError {
                target: target.to_string(),
                status: response.error_status,
            }
            .boxed());
        }
        for vb in response.variables {
            if vb.value == crate::value::Value::NoSuchObject
                || vb.value == crate::value::Value::NoSuchInstance
            {
                tracing::debug!(
                    target: "snmp_collector::scrape",
                    oid = %vb.oid,
                    "OID not supported by target"
                );
                continue;
            }
            pdus.push(vb);
        }
        get_oids = &get_oids[n..];
    }

    for subtree in &plan.walk {
        tracing::debug!(target: "snmp_collector::scrape", oid = %subtree, "walking subtree");
        let walk_start = Instant::now();
        let walked = tokio::select! {
            _ = cancel.cancelled() => return Err(cancelled(ScrapePhase::Walking)),
            result = walk_subtree(session, subtree, module.walk_params.version) => {
                result.map_err(|source| {
                    Error::Walk {
                        target: target.to_string(),
                        source,
                    }
                    .boxed()
                })?
            }
        };
        tracing::debug!(
            target: "snmp_collector::scrape",
            oid = %subtree,
            duration_seconds = walk_start.elapsed().as_secs_f64(),
            "walk of subtree completed"
        );
        pdus.extend(walked);
    }

    Ok(pdus)
}

async fn walk_subtree<S: SnmpSession>(
    session: &S,
    subtree: &Oid,
    version: Version,
) -> Result<Vec<VarBind>> {
    if version == Version::V1 {
        session.walk_all(subtree).await
    } else {
        session.bulk_walk_all(subtree).await
    }
}
