use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::rdf::{Node, NodeId};

/// A statement of global terms, as shipped to a remote server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Node,
    pub predicate: Node,
    pub object: Node,
}

impl Triple {
    pub fn new(subject: Node, predicate: Node, object: Node) -> Self {
        Triple {
            subject,
            predicate,
            object,
        }
    }
}

impl Display for Triple {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// A statement of local node ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalTriple {
    pub subject: NodeId,
    pub predicate: NodeId,
    pub object: NodeId,
}

impl LocalTriple {
    pub fn new(subject: NodeId, predicate: NodeId, object: NodeId) -> Self {
        LocalTriple {
            subject,
            predicate,
            object,
        }
    }
}
