use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use log::{debug, warn};
use parking_lot::Mutex;
use url::Url;

use crate::errors::{ErrorKind, FedError, FedResult};
use crate::rdf::{materialize, Constraint, NodeId, RemoteQuery, ServerUri, Statements};
use crate::resolver::graph::{graph_uri, remote_server_of};
use crate::resolver::{AnswerResolution, FederationConfig};
use crate::session::{RemoteSession, SessionPool};
use crate::xa::{ResourceCoordinator, Xid};

/// Carries out the remote work of one transaction.
///
/// The delegate borrows at most one session per server from the
/// [`SessionPool`]. The first operation against a server also enlists that
/// session's participant into the coordinator under the delegate's xid.
/// [`close`](FederationDelegate::close) hands every borrowed session back.
pub struct FederationDelegate {
    xid: Xid,
    can_write: bool,
    config: FederationConfig,
    coordinator: ResourceCoordinator,
    session_pool: SessionPool,
    sessions: Mutex<IndexMap<ServerUri, RemoteSession>>,
    /// Sessions whose participant failed to enlist but is still tracked.
    unenlisted: Mutex<Vec<(ServerUri, RemoteSession)>>,
    closed: AtomicBool,
}

impl FederationDelegate {
    pub fn new(
        xid: Xid,
        can_write: bool,
        config: FederationConfig,
        coordinator: ResourceCoordinator,
        session_pool: SessionPool,
    ) -> Self {
        FederationDelegate {
            xid,
            can_write,
            config,
            coordinator,
            session_pool,
            sessions: Mutex::new(IndexMap::new()),
            unenlisted: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn xid(&self) -> &Xid {
        &self.xid
    }

    /// Servers this transaction has touched, in order of first use.
    pub fn servers(&self) -> Vec<ServerUri> {
        self.sessions.lock().keys().cloned().collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Resolves `constraint` against the remote server owning its graph.
    pub fn resolve(&self, constraint: &Constraint) -> FedResult<AnswerResolution> {
        let graph = match constraint.graph().as_local() {
            Some(graph) => graph,
            None => {
                log::error!("Graph of {} must be a local node", constraint);
                return Err(FedError::new(
                    &format!("Graph of {} must be a local node", constraint),
                    ErrorKind::QueryError,
                ));
            }
        };

        let graph = graph_uri(graph, &self.config)?;
        let server = remote_server_of(&graph, &self.config)?;
        let query = RemoteQuery::from_constraint(constraint, graph, self.config.node_pool())?;
        debug!("Routing {} to {}", query, server);

        let session = self.session_for(&server)?;
        let answer = session.query(&query).map_err(|e| {
            FedError::new_with_cause(
                &format!("Remote query on {} failed", server),
                ErrorKind::QueryError,
                e,
            )
        })?;
        Ok(AnswerResolution::new(
            server,
            constraint.clone(),
            answer,
            self.config.node_pool().clone(),
        ))
    }

    /// Inserts `statements` into the remote graph.
    pub fn add(&self, graph: NodeId, statements: &dyn Statements) -> FedResult<()> {
        self.modify(graph, statements, true)
    }

    /// Deletes `statements` from the remote graph.
    pub fn remove(&self, graph: NodeId, statements: &dyn Statements) -> FedResult<()> {
        self.modify(graph, statements, false)
    }

    /// Returns every borrowed session to the pool. Further calls fail.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut sessions: Vec<(ServerUri, RemoteSession)> = self.sessions.lock().drain(..).collect();
        sessions.append(&mut self.unenlisted.lock());
        for (server, session) in sessions {
            debug!("Returning session for {} after {}", server, self.xid);
            self.session_pool.return_session(&server, session);
        }
    }

    fn modify(&self, graph: NodeId, statements: &dyn Statements, insert: bool) -> FedResult<()> {
        let verb = if insert { "Insertion" } else { "Deletion" };
        let graph: Url = graph_uri(graph, &self.config)?;
        let server = remote_server_of(&graph, &self.config)?;
        let triples = materialize(statements, self.config.node_pool()).map_err(|e| {
            FedError::new_with_cause(
                &format!("{} data can't be sent to {}", verb, server),
                ErrorKind::ResolverError,
                e,
            )
        })?;

        debug!("{} of {} statements on {}", verb, triples.len(), graph);
        let session = self.session_for(&server)?;
        let result = if insert {
            session.insert(&graph, &triples)
        } else {
            session.delete(&graph, &triples)
        };
        result.map_err(|e| {
            FedError::new_with_cause(
                &format!("{} on {} failed", verb, graph),
                ErrorKind::QueryError,
                e,
            )
        })
    }

    fn session_for(&self, server: &ServerUri) -> FedResult<RemoteSession> {
        if self.is_closed() {
            log::error!("Delegate for {} is closed", self.xid);
            return Err(FedError::new(
                &format!("Delegate for {} is closed", self.xid),
                ErrorKind::InvalidOperation,
            ));
        }

        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.get(server) {
            return Ok(session.clone());
        }

        let session = self.session_pool.get_session(server)?;
        let participant = match session.xa_resource(!self.can_write) {
            Ok(participant) => participant,
            Err(e) => {
                self.session_pool.return_session(server, session);
                return Err(FedError::new_with_cause(
                    &format!("No participant for session on {}", server),
                    ErrorKind::SessionError,
                    e,
                ));
            }
        };

        debug!(
            "Enlisting {} participant for {} in {}",
            if self.can_write { "read-write" } else { "read-only" },
            server,
            self.xid
        );
        if let Err(e) = self.coordinator.enlist(&self.xid, participant) {
            warn!("Failed to enlist session for {} in {}: {}", server, self.xid, e);
            if e.is_gone() || e.cause().map_or(false, |c| c.is_gone()) {
                if let Err(close_error) = session.close() {
                    warn!("Failed to close session for {}: {}", server, close_error);
                }
            } else {
                // the coordinator still reaches this participant on rollback,
                // so the session stays open until the transaction completes
                self.unenlisted.lock().push((server.clone(), session));
            }
            return Err(e);
        }

        sessions.insert(server.clone(), session.clone());
        Ok(session)
    }
}
