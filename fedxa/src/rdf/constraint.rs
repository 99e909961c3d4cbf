use std::fmt::{Display, Formatter};

use url::Url;

use crate::errors::{ErrorKind, FedError, FedResult};
use crate::rdf::{Node, NodeId, NodePool};

/// A query variable, displayed as `?name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable(String);

impl Variable {
    pub fn new(name: &str) -> Self {
        Variable(name.trim_start_matches('?').to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "?{}", self.0)
    }
}

/// One position of a [`Constraint`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstraintElement {
    Variable(Variable),
    Local(NodeId),
    Node(Node),
}

impl ConstraintElement {
    pub fn variable(name: &str) -> Self {
        ConstraintElement::Variable(Variable::new(name))
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            ConstraintElement::Variable(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_local(&self) -> Option<NodeId> {
        match self {
            ConstraintElement::Local(id) => Some(*id),
            _ => None,
        }
    }

    fn globalize(&self, pool: &NodePool) -> FedResult<PatternElement> {
        match self {
            ConstraintElement::Variable(v) => Ok(PatternElement::Variable(v.clone())),
            ConstraintElement::Local(id) => Ok(PatternElement::Node(pool.globalize(*id)?)),
            ConstraintElement::Node(node) => Ok(PatternElement::Node(node.clone())),
        }
    }
}

impl Display for ConstraintElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintElement::Variable(v) => write!(f, "{}", v),
            ConstraintElement::Local(id) => write!(f, "{}", id),
            ConstraintElement::Node(node) => write!(f, "{}", node),
        }
    }
}

/// A triple pattern scoped to a graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    subject: ConstraintElement,
    predicate: ConstraintElement,
    object: ConstraintElement,
    graph: ConstraintElement,
}

impl Constraint {
    pub fn new(
        subject: ConstraintElement,
        predicate: ConstraintElement,
        object: ConstraintElement,
        graph: ConstraintElement,
    ) -> Self {
        Constraint {
            subject,
            predicate,
            object,
            graph,
        }
    }

    pub fn subject(&self) -> &ConstraintElement {
        &self.subject
    }

    pub fn predicate(&self) -> &ConstraintElement {
        &self.predicate
    }

    pub fn object(&self) -> &ConstraintElement {
        &self.object
    }

    pub fn graph(&self) -> &ConstraintElement {
        &self.graph
    }

    /// Unbound positions in order of first appearance, without repeats.
    pub fn variables(&self) -> Vec<Variable> {
        let mut variables: Vec<Variable> = Vec::new();
        for element in [&self.subject, &self.predicate, &self.object, &self.graph] {
            if let Some(v) = element.as_variable() {
                if !variables.contains(v) {
                    variables.push(v.clone());
                }
            }
        }
        variables
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} {} {} in {}]",
            self.subject, self.predicate, self.object, self.graph
        )
    }
}

/// A pattern position after globalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternElement {
    Variable(Variable),
    Node(Node),
}

impl Display for PatternElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternElement::Variable(v) => write!(f, "{}", v),
            PatternElement::Node(node) => write!(f, "{}", node),
        }
    }
}

/// The query sent to a remote server for a single constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteQuery {
    variables: Vec<Variable>,
    graph: Url,
    pattern: [PatternElement; 3],
}

impl RemoteQuery {
    /// Globalizes the triple pattern of `constraint` against `graph`.
    ///
    /// The graph position itself must not be a variable.
    pub fn from_constraint(constraint: &Constraint, graph: Url, pool: &NodePool) -> FedResult<Self> {
        if constraint.graph().as_variable().is_some() {
            log::error!("Graph of a remote query cannot be a variable: {}", constraint);
            return Err(FedError::new(
                &format!("Graph of a remote query cannot be a variable: {}", constraint),
                ErrorKind::QueryError,
            ));
        }

        let pattern = [
            constraint.subject().globalize(pool)?,
            constraint.predicate().globalize(pool)?,
            constraint.object().globalize(pool)?,
        ];
        Ok(RemoteQuery {
            variables: constraint.variables(),
            graph,
            pattern,
        })
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn graph(&self) -> &Url {
        &self.graph
    }

    pub fn pattern(&self) -> &[PatternElement; 3] {
        &self.pattern
    }
}

impl Display for RemoteQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "select")?;
        for v in &self.variables {
            write!(f, " {}", v)?;
        }
        write!(
            f,
            " from <{}> where {} {} {}",
            self.graph, self.pattern[0], self.pattern[1], self.pattern[2]
        )
    }
}
