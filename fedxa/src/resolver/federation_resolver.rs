use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use log::debug;

use crate::errors::{ErrorKind, FedError, FedResult};
use crate::rdf::{Constraint, NodeId, Statements};
use crate::resolver::{AnswerResolution, FederationConfig, FederationDelegate};
use crate::session::SessionPool;
use crate::xa::{ResourceCoordinator, XaCode, Xid};

/// Resolver over graphs held by remote servers.
///
/// Each resolver owns one [`ResourceCoordinator`], which the outer
/// transaction manager drives through [`coordinator`](FederationResolver::coordinator).
/// Work arriving while a transaction is active is routed to that
/// transaction's [`FederationDelegate`]. The delegate is closed, returning
/// its sessions to the pool, once the coordinator has finished with the
/// transaction.
#[derive(Clone)]
pub struct FederationResolver {
    inner: Arc<ResolverInner>,
}

struct ResolverInner {
    can_write: bool,
    config: FederationConfig,
    session_pool: SessionPool,
    coordinator: ResourceCoordinator,
    delegates: DashMap<Xid, Arc<FederationDelegate>>,
}

impl FederationResolver {
    pub(crate) fn new(config: FederationConfig, session_pool: SessionPool, can_write: bool) -> Self {
        let coordinator = ResourceCoordinator::with_options(
            config.transaction_timeout(),
            config.min_participant_timeout(),
            config.report_read_only_votes(),
        );
        let inner = Arc::new(ResolverInner {
            can_write,
            config,
            session_pool,
            coordinator,
            delegates: DashMap::new(),
        });

        let weak: Weak<ResolverInner> = Arc::downgrade(&inner);
        inner.coordinator.add_completion_listener(Arc::new(move |xid: &Xid| {
            if let Some(inner) = weak.upgrade() {
                inner.close_delegate(xid);
            }
        }));

        FederationResolver { inner }
    }

    pub fn can_write(&self) -> bool {
        self.inner.can_write
    }

    /// Creating graphs on remote servers is not offered.
    pub fn create_graph(&self, graph: NodeId, graph_type: NodeId) -> FedResult<()> {
        log::error!("Cannot create graph {} of type {} on a remote server", graph, graph_type);
        Err(FedError::new(
            "Creating graphs on remote servers is not supported",
            ErrorKind::NotSupported,
        ))
    }

    /// Removing graphs from remote servers is not offered.
    pub fn remove_graph(&self, graph: NodeId) -> FedResult<()> {
        log::error!("Cannot remove graph {} from a remote server", graph);
        Err(FedError::new(
            "Removing graphs from remote servers is not supported",
            ErrorKind::NotSupported,
        ))
    }

    /// Inserts (`occurs`) or deletes `statements` in a remote graph.
    pub fn modify_graph(&self, graph: NodeId, statements: &dyn Statements, occurs: bool) -> FedResult<()> {
        if !self.inner.can_write {
            log::error!("Resolver is read-only, cannot modify graph {}", graph);
            return Err(FedError::new(
                &format!("Resolver is read-only, cannot modify graph {}", graph),
                ErrorKind::InvalidOperation,
            ));
        }

        let delegate = self.inner.current_delegate()?;
        let result = if occurs {
            delegate.add(graph, statements)
        } else {
            delegate.remove(graph, statements)
        };
        result.map_err(|e| {
            FedError::new_with_cause(
                &format!("Failed to modify graph {}", graph),
                ErrorKind::ResolverError,
                e,
            )
        })
    }

    /// Resolves `constraint` on the remote server owning its graph.
    ///
    /// # Errors
    /// * `QueryError` if the graph position is not a local node id
    /// * `XAER_PROTO` if no transaction is active on the coordinator
    pub fn resolve(&self, constraint: &Constraint) -> FedResult<AnswerResolution> {
        if constraint.graph().as_local().is_none() {
            log::error!("Graph of {} must be a local node", constraint);
            return Err(FedError::new(
                &format!("Graph of {} must be a local node", constraint),
                ErrorKind::QueryError,
            ));
        }
        self.inner.current_delegate()?.resolve(constraint)
    }

    /// The participant handle the outer transaction manager drives.
    pub fn coordinator(&self) -> ResourceCoordinator {
        self.inner.coordinator.clone()
    }

    /// Closes every delegate, returning all borrowed sessions to the pool.
    pub fn abort(&self) {
        debug!("Aborting resolver {}", self.inner.coordinator.id());
        let xids: Vec<Xid> = self.inner.delegates.iter().map(|d| d.key().clone()).collect();
        for xid in xids {
            self.inner.close_delegate(&xid);
        }
    }

    /// Number of transactions with an open delegate.
    pub fn delegate_count(&self) -> usize {
        self.inner.delegates.len()
    }

    pub fn config(&self) -> &FederationConfig {
        &self.inner.config
    }
}

impl Debug for FederationResolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FederationResolver")
            .field("coordinator", &self.inner.coordinator.id())
            .field("can_write", &self.inner.can_write)
            .field("delegates", &self.inner.delegates.len())
            .finish()
    }
}

impl ResolverInner {
    fn current_delegate(&self) -> FedResult<Arc<FederationDelegate>> {
        let xid = match self.coordinator.active_xid() {
            Some(xid) => xid,
            None => {
                log::warn!("Resolver used outside of an active transaction");
                return Err(FedError::xa(
                    "Resolver used outside of an active transaction",
                    XaCode::Protocol,
                ));
            }
        };

        let delegate = self
            .delegates
            .entry(xid.clone())
            .or_insert_with(|| {
                debug!("Creating delegate for {}", xid);
                Arc::new(FederationDelegate::new(
                    xid.clone(),
                    self.can_write,
                    self.config.clone(),
                    self.coordinator.clone(),
                    self.session_pool.clone(),
                ))
            })
            .value()
            .clone();
        Ok(delegate)
    }

    fn close_delegate(&self, xid: &Xid) {
        if let Some((_, delegate)) = self.delegates.remove(xid) {
            debug!("Closing delegate for {}", xid);
            delegate.close();
        }
    }
}
