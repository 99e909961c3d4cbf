use std::fmt::{Debug, Formatter};
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::FedResult;
use crate::xa::{EndFlags, RecoverFlags, StartFlags, Vote, Xid};

/// Transactional resource contract of a single resource manager.
///
/// # Purpose
/// Every participant of a federated transaction is driven through this trait:
/// remote sessions hand out implementations of it, the
/// [`ResourceCoordinator`](crate::xa::ResourceCoordinator) implements it
/// itself, and test doubles implement it to observe the call sequence.
///
/// # Failures
/// Failures are reported as [`ErrorKind::Xa`](crate::errors::ErrorKind::Xa).
/// Callers fold them with [`Outcome::of`](crate::xa::Outcome::of), so an
/// implementation only needs to pick the right [`XaCode`](crate::xa::XaCode).
///
/// # Thread Safety
/// Implementers must be `Send + Sync`; the coordinator may drive different
/// transactions of the same resource from different threads.
pub trait XaResourceProvider: Send + Sync {
    /// Starts work on behalf of `xid`.
    fn start(&self, xid: &Xid, flags: StartFlags) -> FedResult<()>;

    /// Ends, fails or suspends the work of `xid`.
    fn end(&self, xid: &Xid, flags: EndFlags) -> FedResult<()>;

    /// Asks the resource manager to vote on `xid`.
    ///
    /// # Returns
    /// * `Ok(Vote::Ok)` if the branch is prepared
    /// * `Ok(Vote::ReadOnly)` if the branch made no changes and is already complete
    /// * `Err(FedError)` if the branch cannot be committed
    fn prepare(&self, xid: &Xid) -> FedResult<Vote>;

    fn commit(&self, xid: &Xid, one_phase: bool) -> FedResult<()>;

    fn rollback(&self, xid: &Xid) -> FedResult<()>;

    /// Discards the knowledge of a heuristically completed branch.
    fn forget(&self, xid: &Xid) -> FedResult<()>;

    /// Lists the branches that are prepared or heuristically completed.
    fn recover(&self, flags: RecoverFlags) -> FedResult<Vec<Xid>>;

    fn transaction_timeout(&self) -> FedResult<Duration>;

    /// Sets the timeout for the branches started afterwards.
    ///
    /// # Returns
    /// * `Ok(true)` if the timeout was accepted
    /// * `Ok(false)` if the resource manager does not support timeouts
    fn set_transaction_timeout(&self, timeout: Duration) -> FedResult<bool>;

    /// Identity of the resource manager behind this handle. Two handles with
    /// the same id address the same resource manager.
    fn resource_manager_id(&self) -> String;

    /// Checks whether `other` addresses the same resource manager.
    fn is_same_rm(&self, other: &XaResource) -> FedResult<bool> {
        Ok(self.resource_manager_id() == other.resource_manager_id())
    }
}

/// Shared handle to an [`XaResourceProvider`].
///
/// Cloning is cheap and every clone addresses the same resource.
#[derive(Clone)]
pub struct XaResource {
    inner: Arc<dyn XaResourceProvider>,
}

impl XaResource {
    pub fn new<T: XaResourceProvider + 'static>(inner: T) -> Self {
        XaResource {
            inner: Arc::new(inner),
        }
    }

    pub fn from_arc(inner: Arc<dyn XaResourceProvider>) -> Self {
        XaResource { inner }
    }

    /// Checks whether both handles point to the same provider instance.
    pub fn ptr_eq(&self, other: &XaResource) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Deref for XaResource {
    type Target = Arc<dyn XaResourceProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Debug for XaResource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "XaResource({})", self.inner.resource_manager_id())
    }
}
