use std::fmt::{Debug, Formatter};
use std::ops::Deref;
use std::sync::Arc;

use url::Url;

use crate::errors::FedResult;
use crate::rdf::{Node, RemoteQuery, ServerUri, Triple, Variable};
use crate::xa::XaResource;

/// Result set returned by a remote server.
///
/// Rows carry one column per variable of [`Answer::variables`]; a `None`
/// column is unbound.
pub trait Answer: Send {
    fn variables(&self) -> &[Variable];

    /// Advances to the next row, or returns `None` when exhausted.
    fn next_row(&mut self) -> FedResult<Option<Vec<Option<Node>>>>;

    fn close(&mut self) -> FedResult<()>;
}

/// One connection to a remote database server.
///
/// The wire protocol belongs to implementations of this trait.
pub trait RemoteSessionProvider: Send + Sync {
    fn query(&self, query: &RemoteQuery) -> FedResult<Box<dyn Answer>>;

    fn insert(&self, graph: &Url, statements: &[Triple]) -> FedResult<()>;

    fn delete(&self, graph: &Url, statements: &[Triple]) -> FedResult<()>;

    /// The participant handle of this session, read-only or read-write.
    fn xa_resource(&self, read_only: bool) -> FedResult<XaResource>;

    fn close(&self) -> FedResult<()>;
}

/// Shared handle to a [`RemoteSessionProvider`].
#[derive(Clone)]
pub struct RemoteSession {
    inner: Arc<dyn RemoteSessionProvider>,
}

impl RemoteSession {
    pub fn new<T: RemoteSessionProvider + 'static>(inner: T) -> Self {
        RemoteSession {
            inner: Arc::new(inner),
        }
    }

    pub fn ptr_eq(&self, other: &RemoteSession) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Deref for RemoteSession {
    type Target = Arc<dyn RemoteSessionProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Debug for RemoteSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RemoteSession({:p})", Arc::as_ptr(&self.inner))
    }
}

/// Creates sessions against one server.
pub trait SessionFactoryProvider: Send + Sync {
    fn new_session(&self) -> FedResult<RemoteSession>;

    fn close(&self) -> FedResult<()>;
}

/// Shared handle to a [`SessionFactoryProvider`].
#[derive(Clone)]
pub struct SessionFactory {
    inner: Arc<dyn SessionFactoryProvider>,
}

impl SessionFactory {
    pub fn new<T: SessionFactoryProvider + 'static>(inner: T) -> Self {
        SessionFactory {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for SessionFactory {
    type Target = Arc<dyn SessionFactoryProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Locates the session factory for a server.
pub trait SessionFactoryFinder: Send + Sync {
    fn find(&self, server: &ServerUri) -> FedResult<SessionFactory>;
}
