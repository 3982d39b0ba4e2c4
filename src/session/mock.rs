//! Mock session for testing.
//!
//! Provides a programmable session that can simulate agent behavior
//! without a network connection: a value tree served to GET and WALK,
//! scripted packet errors, failing subtrees, and artificial latency.

use super::{Connector, GetResponse, SessionConfig, SessionHooks, SnmpSession};
use crate::error::{Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::VarBind;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A recorded operation issued through the mock session.
#[derive(Debug, Clone, PartialEq)]
pub enum MockRequest {
    /// GET with the requested OIDs.
    Get(Vec<Oid>),
    /// GETNEXT walk of a subtree.
    Walk(Oid),
    /// GETBULK walk of a subtree.
    BulkWalk(Oid),
}

#[derive(Default)]
struct MockSessionInner {
    /// The agent's value tree, keyed by full instance OID.
    tree: BTreeMap<Oid, Value>,
    /// Packet error statuses returned by upcoming GETs, in order.
    get_errors: VecDeque<ErrorStatus>,
    /// Subtrees whose walk fails with a transport error.
    failing_subtrees: HashSet<Oid>,
    /// Recorded operations.
    requests: Vec<MockRequest>,
    /// Artificial delay before every response.
    delay: Option<Duration>,
    /// Whether close() has been called.
    closed: bool,
    /// Hooks installed at connect time.
    hooks: SessionHooks,
}

/// Mock SNMP session.
///
/// Cloning shares the underlying state, so a test can keep a handle while
/// the scrape engine owns another.
///
/// # Example
///
/// ```
/// use snmp_collector::session::MockSession;
/// use snmp_collector::{Value, oid};
///
/// let session = MockSession::new();
/// session.insert(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 8, 1), Value::Integer(1));
/// session.insert(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 8, 2), Value::Integer(2));
/// ```
#[derive(Clone, Default)]
pub struct MockSession {
    inner: Arc<Mutex<MockSessionInner>>,
}

impl MockSession {
    /// Create an empty mock session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value into the agent tree.
    pub fn insert(&self, oid: Oid, value: impl Into<Value>) {
        let mut inner = self.inner.lock().unwrap();
        inner.tree.insert(oid, value.into());
    }

    /// Queue a packet-level error status for the next GET.
    pub fn queue_get_error(&self, status: ErrorStatus) {
        let mut inner = self.inner.lock().unwrap();
        inner.get_errors.push_back(status);
    }

    /// Make walks of `subtree` fail with a transport error.
    pub fn fail_subtree(&self, subtree: Oid) {
        let mut inner = self.inner.lock().unwrap();
        inner.failing_subtrees.insert(subtree);
    }

    /// Delay every response by `delay` (for cancellation tests).
    pub fn set_delay(&self, delay: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.delay = Some(delay);
    }

    /// All recorded operations, in order.
    pub fn requests(&self) -> Vec<MockRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    /// Whether the session was closed.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }

    fn install_hooks(&self, hooks: SessionHooks) {
        self.inner.lock().unwrap().hooks = hooks;
    }

    async fn simulate_io(&self) {
        let (delay, hooks) = {
            let inner = self.inner.lock().unwrap();
            (inner.delay, inner.hooks.clone())
        };
        hooks.sent();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        hooks.received(delay.unwrap_or(Duration::from_micros(50)));
    }

    fn subtree_varbinds(&self, subtree: &Oid) -> Vec<VarBind> {
        let inner = self.inner.lock().unwrap();
        inner
            .tree
            .iter()
            .filter(|(oid, _)| oid.starts_with(subtree))
            .map(|(oid, value)| VarBind::new(oid.clone(), value.clone()))
            .collect()
    }
}

impl SnmpSession for MockSession {
    async fn get(&self, oids: &[Oid]) -> Result<GetResponse> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.requests.push(MockRequest::Get(oids.to_vec()));
        }
        self.simulate_io().await;

        if let Some(status) = self.inner.lock().unwrap().get_errors.pop_front() {
            return Ok(GetResponse::error(status));
        }

        let inner = self.inner.lock().unwrap();
        let variables = oids
            .iter()
            .map(|oid| match inner.tree.get(oid) {
                Some(value) => VarBind::new(oid.clone(), value.clone()),
                None => VarBind::new(oid.clone(), Value::NoSuchInstance),
            })
            .collect();
        Ok(GetResponse::ok(variables))
    }

    async fn walk_all(&self, subtree: &Oid) -> Result<Vec<VarBind>> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.requests.push(MockRequest::Walk(subtree.clone()));
        }
        self.simulate_io().await;

        if self
            .inner
            .lock()
            .unwrap()
            .failing_subtrees
            .contains(subtree)
        {
            return Err(Error::transport(format!("walk of {} failed", subtree)));
        }
        Ok(self.subtree_varbinds(subtree))
    }

    async fn bulk_walk_all(&self, subtree: &Oid) -> Result<Vec<VarBind>> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.requests.push(MockRequest::BulkWalk(subtree.clone()));
        }
        self.simulate_io().await;

        if self
            .inner
            .lock()
            .unwrap()
            .failing_subtrees
            .contains(subtree)
        {
            return Err(Error::transport(format!("bulk walk of {} failed", subtree)));
        }
        Ok(self.subtree_varbinds(subtree))
    }

    async fn close(&self) {
        self.inner.lock().unwrap().closed = true;
    }
}

/// Mock connector handing out clones of one programmed session.
#[derive(Clone, Default)]
pub struct MockConnector {
    session: MockSession,
    fail_connect: Arc<Mutex<bool>>,
    connect_delay: Arc<Mutex<Option<Duration>>>,
    last_config: Arc<Mutex<Option<SessionConfig>>>,
}

impl MockConnector {
    /// Create a connector serving `session`.
    pub fn new(session: MockSession) -> Self {
        Self {
            session,
            ..Self::default()
        }
    }

    /// Make connect() fail with a transport error.
    pub fn fail_connect(&self) {
        *self.fail_connect.lock().unwrap() = true;
    }

    /// Delay connect() by `delay` (for cancellation tests).
    pub fn set_connect_delay(&self, delay: Duration) {
        *self.connect_delay.lock().unwrap() = Some(delay);
    }

    /// The configuration of the most recent connect() call.
    pub fn last_config(&self) -> Option<SessionConfig> {
        self.last_config.lock().unwrap().clone()
    }
}

impl Connector for MockConnector {
    type Session = MockSession;

    async fn connect(&self, config: SessionConfig) -> Result<MockSession> {
        let delay = *self.connect_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_connect.lock().unwrap() {
            return Err(Error::transport(format!(
                "connection refused by {}:{}",
                config.target, config.port
            )));
        }
        self.session.install_hooks(config.hooks.clone());
        *self.last_config.lock().unwrap() = Some(config);
        Ok(self.session.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    #[tokio::test]
    async fn test_get_returns_tree_values() {
        let session = MockSession::new();
        session.insert(oid!(1, 3, 6, 1, 1), Value::Integer(7));

        let response = session
            .get(&[oid!(1, 3, 6, 1, 1), oid!(1, 3, 6, 1, 2)])
            .await
            .unwrap();

        assert!(response.error_status.is_ok());
        assert_eq!(response.variables[0].value, Value::Integer(7));
        assert_eq!(response.variables[1].value, Value::NoSuchInstance);
    }

    #[tokio::test]
    async fn test_walk_returns_subtree_in_order() {
        let session = MockSession::new();
        session.insert(oid!(1, 3, 6, 1, 2, 2), Value::Integer(2));
        session.insert(oid!(1, 3, 6, 1, 2, 1), Value::Integer(1));
        session.insert(oid!(1, 3, 6, 1, 9, 1), Value::Integer(9));

        let pdus = session.walk_all(&oid!(1, 3, 6, 1, 2)).await.unwrap();

        assert_eq!(pdus.len(), 2);
        assert_eq!(pdus[0].oid, oid!(1, 3, 6, 1, 2, 1));
        assert_eq!(pdus[1].oid, oid!(1, 3, 6, 1, 2, 2));
    }

    #[tokio::test]
    async fn test_queued_get_error() {
        let session = MockSession::new();
        session.queue_get_error(ErrorStatus::NoSuchName);

        let response = session.get(&[oid!(1, 3, 6)]).await.unwrap();
        assert_eq!(response.error_status, ErrorStatus::NoSuchName);

        // Subsequent GETs succeed.
        let response = session.get(&[oid!(1, 3, 6)]).await.unwrap();
        assert!(response.error_status.is_ok());
    }

    #[tokio::test]
    async fn test_failing_subtree() {
        let session = MockSession::new();
        session.fail_subtree(oid!(1, 3, 6, 1, 2));

        assert!(session.bulk_walk_all(&oid!(1, 3, 6, 1, 2)).await.is_err());
        assert!(session.bulk_walk_all(&oid!(1, 3, 6, 1, 3)).await.is_ok());
    }

    #[tokio::test]
    async fn test_connector_records_config_and_installs_hooks() {
        use std::sync::atomic::{AtomicU64, Ordering};

        let session = MockSession::new();
        let connector = MockConnector::new(session);

        let sent = Arc::new(AtomicU64::new(0));
        let sent_clone = sent.clone();
        let mut config = SessionConfig {
            target: "192.0.2.5".to_string(),
            ..SessionConfig::default()
        };
        config.hooks.on_send = Some(Arc::new(move || {
            sent_clone.fetch_add(1, Ordering::Relaxed);
        }));

        let session = connector.connect(config).await.unwrap();
        session.get(&[oid!(1, 3)]).await.unwrap();

        assert_eq!(sent.load(Ordering::Relaxed), 1);
        assert_eq!(connector.last_config().unwrap().target, "192.0.2.5");
    }

    #[tokio::test]
    async fn test_fail_connect() {
        let connector = MockConnector::new(MockSession::new());
        connector.fail_connect();
        assert!(connector.connect(SessionConfig::default()).await.is_err());
    }
}
