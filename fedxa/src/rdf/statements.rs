use indexmap::IndexSet;

use crate::errors::FedResult;
use crate::rdf::{LocalTriple, NodePool, Triple};

/// Source of local statements for a graph modification.
pub trait Statements {
    fn triples(&self) -> Box<dyn Iterator<Item = FedResult<LocalTriple>> + '_>;
}

impl Statements for [LocalTriple] {
    fn triples(&self) -> Box<dyn Iterator<Item = FedResult<LocalTriple>> + '_> {
        Box::new(self.iter().copied().map(Ok))
    }
}

impl Statements for Vec<LocalTriple> {
    fn triples(&self) -> Box<dyn Iterator<Item = FedResult<LocalTriple>> + '_> {
        self.as_slice().triples()
    }
}

/// Globalizes `statements` into a duplicate-free list, keeping first-seen order.
pub fn materialize(statements: &dyn Statements, pool: &NodePool) -> FedResult<Vec<Triple>> {
    let mut set = IndexSet::new();
    for triple in statements.triples() {
        let triple = triple?;
        let global = Triple::new(
            pool.globalize(triple.subject)?,
            pool.globalize(triple.predicate)?,
            pool.globalize(triple.object)?,
        );
        set.insert(global);
    }
    Ok(set.into_iter().collect())
}
