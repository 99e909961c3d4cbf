use std::fmt::{Debug, Formatter};

use log::warn;

use crate::errors::{ErrorKind, FedError, FedResult};
use crate::rdf::{BlankNode, Constraint, Node, NodeId, NodePool, ServerUri, Variable};
use crate::session::Answer;

/// Rows of a remote answer, translated into local node ids.
///
/// Terms are localized one row at a time as the iterator advances. Blank
/// nodes minted by the remote server become [`BlankNode::Foreign`] keyed by
/// the server, so equal ids from different servers stay distinct.
pub struct AnswerResolution {
    server: ServerUri,
    constraint: Constraint,
    variables: Vec<Variable>,
    answer: Box<dyn Answer>,
    node_pool: NodePool,
    closed: bool,
}

impl Debug for AnswerResolution {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerResolution")
            .field("server", &self.server)
            .field("constraint", &self.constraint)
            .field("variables", &self.variables)
            .field("closed", &self.closed)
            .finish()
    }
}

impl AnswerResolution {
    pub fn new(
        server: ServerUri,
        constraint: Constraint,
        answer: Box<dyn Answer>,
        node_pool: NodePool,
    ) -> Self {
        let variables = answer.variables().to_vec();
        AnswerResolution {
            server,
            constraint,
            variables,
            answer,
            node_pool,
            closed: false,
        }
    }

    /// The constraint this resolution satisfies.
    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn server(&self) -> &ServerUri {
        &self.server
    }

    pub fn close(&mut self) -> FedResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.answer.close()
    }

    fn localize(&self, node: Node) -> FedResult<NodeId> {
        let node = match node {
            Node::Blank(BlankNode::Local(id)) => Node::Blank(BlankNode::Foreign {
                server: self.server.clone(),
                id,
            }),
            other => other,
        };
        self.node_pool.localize(&node)
    }

    fn localize_row(&self, row: Vec<Option<Node>>) -> FedResult<Vec<Option<NodeId>>> {
        if row.len() != self.variables.len() {
            log::error!(
                "Row from {} has {} columns, expected {}",
                self.server,
                row.len(),
                self.variables.len()
            );
            return Err(FedError::new(
                &format!(
                    "Row from {} has {} columns, expected {}",
                    self.server,
                    row.len(),
                    self.variables.len()
                ),
                ErrorKind::ResolverError,
            ));
        }

        row.into_iter()
            .map(|column| column.map(|node| self.localize(node)).transpose())
            .collect()
    }
}

impl Iterator for AnswerResolution {
    type Item = FedResult<Vec<Option<NodeId>>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }
        match self.answer.next_row() {
            Ok(Some(row)) => Some(self.localize_row(row)),
            Ok(None) => None,
            Err(e) => Some(Err(FedError::new_with_cause(
                &format!("Failed to read answer from {}", self.server),
                ErrorKind::ResolverError,
                e,
            ))),
        }
    }
}

impl Drop for AnswerResolution {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close answer from {}: {}", self.server, e);
        }
    }
}
