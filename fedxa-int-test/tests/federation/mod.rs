
use fedxa::errors::FedResult;
use fedxa::rdf::{Constraint, ConstraintElement, Node};
use fedxa::resolver::{AnswerResolution, FederationResolver};
use fedxa::xa::{EndFlags, StartFlags, Vote, XaResourceProvider, Xid};
use fedxa_int_test::test_util::{create_federation_context, triple, uri, FederationContext};

pub const DB2: &str = "rmi://db2/server1";
pub const DB3: &str = "rmi://db3/server1";
pub const PEOPLE: &str = "rmi://db2/server1#people";
pub const PLACES: &str = "rmi://db3/server1#places";

pub const KNOWS: &str = "http://xmlns.com/foaf/0.1/knows";
pub const NAME: &str = "http://xmlns.com/foaf/0.1/name";
pub const ALICE: &str = "http://example.org/alice";
pub const BOB: &str = "http://example.org/bob";
pub const CAROL: &str = "http://example.org/carol";
pub const PARIS: &str = "http://example.org/paris";

/// Two servers: db2 holds a small social graph, db3 a place.
pub fn federation() -> FedResult<FederationContext> {
    let ctx = create_federation_context(&[DB2, DB3])?;
    ctx.server(0).load(
        PEOPLE,
        vec![
            triple(ALICE, KNOWS, uri(BOB)),
            triple(BOB, KNOWS, uri(CAROL)),
            triple(ALICE, NAME, Node::literal("Alice")),
        ],
    )?;
    ctx.server(1)
        .load(PLACES, vec![triple(PARIS, NAME, Node::literal("Paris"))])?;
    Ok(ctx)
}

/// Starts a new transaction on the resolver's coordinator.
pub fn begin(resolver: &FederationResolver) -> FedResult<Xid> {
    let xid = Xid::generate();
    resolver.coordinator().start(&xid, StartFlags::NoFlags)?;
    Ok(xid)
}

/// Ends, prepares and commits `xid`.
pub fn commit(resolver: &FederationResolver, xid: &Xid) -> FedResult<()> {
    let coordinator = resolver.coordinator();
    coordinator.end(xid, EndFlags::Success)?;
    if coordinator.prepare(xid)? == Vote::Ok {
        coordinator.commit(xid, false)?;
    }
    Ok(())
}

pub fn rollback(resolver: &FederationResolver, xid: &Xid) -> FedResult<()> {
    let coordinator = resolver.coordinator();
    coordinator.end(xid, EndFlags::Success)?;
    coordinator.rollback(xid)
}

/// Builds a constraint; terms starting with `?` are variables, the rest URIs.
pub fn constraint(
    ctx: &FederationContext,
    subject: &str,
    predicate: &str,
    object: &str,
    graph: &str,
) -> FedResult<Constraint> {
    Ok(Constraint::new(
        element(ctx, subject)?,
        element(ctx, predicate)?,
        element(ctx, object)?,
        element(ctx, graph)?,
    ))
}

fn element(ctx: &FederationContext, term: &str) -> FedResult<ConstraintElement> {
    if term.starts_with('?') {
        Ok(ConstraintElement::variable(term))
    } else {
        Ok(ConstraintElement::Local(ctx.local_uri(term)?))
    }
}

/// Drains a resolution into global rows.
pub fn rows(
    ctx: &FederationContext,
    resolution: AnswerResolution,
) -> FedResult<Vec<Vec<Option<Node>>>> {
    let mut rows = Vec::new();
    for row in resolution {
        let row = row?
            .into_iter()
            .map(|id| id.map(|id| ctx.node_pool().globalize(id)).transpose())
            .collect::<FedResult<Vec<_>>>()?;
        rows.push(row);
    }
    Ok(rows)
}
