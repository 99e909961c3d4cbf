use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::errors::{ErrorKind, FedError, FedResult};
use crate::rdf::{Node, NodeId};

/// Converts between local node ids and global terms.
///
/// # Responsibilities
/// - `localize` returns the id of a term, allocating one on first sight
/// - `globalize` returns the term of an id previously handed out
///
/// Implementations must be safe to call from several resolvers at once.
pub trait NodePoolProvider: Send + Sync {
    fn localize(&self, node: &Node) -> FedResult<NodeId>;

    fn globalize(&self, id: NodeId) -> FedResult<Node>;
}

/// Shared handle to a [`NodePoolProvider`].
#[derive(Clone)]
pub struct NodePool {
    inner: Arc<dyn NodePoolProvider>,
}

impl NodePool {
    pub fn new<T: NodePoolProvider + 'static>(inner: T) -> Self {
        NodePool {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for NodePool {
    type Target = Arc<dyn NodePoolProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Concurrent in-memory node pool.
///
/// Ids are allocated from 1 upwards and never reused.
pub struct MemoryNodePool {
    ids: DashMap<Node, NodeId>,
    nodes: DashMap<NodeId, Node>,
    next_id: AtomicU64,
}

impl MemoryNodePool {
    pub fn new() -> Self {
        MemoryNodePool {
            ids: DashMap::new(),
            nodes: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for MemoryNodePool {
    fn default() -> Self {
        Self::new()
    }
}

impl NodePoolProvider for MemoryNodePool {
    fn localize(&self, node: &Node) -> FedResult<NodeId> {
        if let Some(id) = self.ids.get(node) {
            return Ok(*id);
        }

        // the entry guard serializes concurrent allocation for the same term
        let id = *self.ids.entry(node.clone()).or_insert_with(|| {
            let id = NodeId(self.next_id.fetch_add(1, Ordering::Relaxed));
            self.nodes.insert(id, node.clone());
            id
        });
        Ok(id)
    }

    fn globalize(&self, id: NodeId) -> FedResult<Node> {
        match self.nodes.get(&id) {
            Some(node) => Ok(node.clone()),
            None => {
                log::error!("Unknown local node id {}", id);
                Err(FedError::new(
                    &format!("Unknown local node id {}", id),
                    ErrorKind::LocalizationError,
                ))
            }
        }
    }
}
