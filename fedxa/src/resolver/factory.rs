use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::{ErrorKind, FedError, FedResult};
use crate::resolver::{FederationConfig, FederationResolver};
use crate::session::SessionPool;

/// Creates federation resolvers sharing one session pool.
///
/// Built by [`FederationBuilder`](crate::resolver::FederationBuilder).
/// Closing the factory closes the pooled sessions.
#[derive(Clone)]
pub struct FederationResolverFactory {
    inner: Arc<FactoryInner>,
}

struct FactoryInner {
    config: FederationConfig,
    session_pool: SessionPool,
    closed: AtomicBool,
}

impl FederationResolverFactory {
    pub(crate) fn new(config: FederationConfig) -> Self {
        let session_pool = SessionPool::new(config.session_factory_finder());
        FederationResolverFactory {
            inner: Arc::new(FactoryInner {
                config,
                session_pool,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Creates a resolver with its own coordinator.
    ///
    /// A resolver created with `can_write == false` enlists read-only
    /// participants and rejects modifications.
    pub fn new_resolver(&self, can_write: bool) -> FedResult<FederationResolver> {
        if self.inner.closed.load(Ordering::Acquire) {
            log::error!("Resolver factory is closed");
            return Err(FedError::new(
                "Resolver factory is closed",
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(FederationResolver::new(
            self.inner.config.clone(),
            self.inner.session_pool.clone(),
            can_write,
        ))
    }

    pub fn config(&self) -> &FederationConfig {
        &self.inner.config
    }

    pub fn session_pool(&self) -> &SessionPool {
        &self.inner.session_pool
    }

    pub fn close(&self) -> FedResult<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        log::debug!("Closing resolver factory");
        self.inner.session_pool.close()
    }
}
