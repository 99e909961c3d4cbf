use url::Url;

use crate::errors::{ErrorKind, FedError, FedResult};
use crate::rdf::{NodeId, ServerUri};
use crate::resolver::FederationConfig;

/// Looks up the URI of a local graph id.
pub(crate) fn graph_uri(graph: NodeId, config: &FederationConfig) -> FedResult<Url> {
    let node = config.node_pool().globalize(graph).map_err(|e| {
        FedError::new_with_cause(
            &format!("Error globalizing graph {}", graph),
            ErrorKind::ResolverError,
            e,
        )
    })?;
    Ok(node.expect_uri("Graph")?.clone())
}

/// Returns the remote server owning `graph`.
///
/// The scheme must be claimed by the federation, and a graph on a local
/// host alias with the local server's path is rejected.
pub(crate) fn remote_server_of(graph: &Url, config: &FederationConfig) -> FedResult<ServerUri> {
    if !config.claims_scheme(graph.scheme()) {
        log::error!("Scheme of {} is not routed to remote servers", graph);
        return Err(FedError::new(
            &format!("Scheme of {} is not routed to remote servers", graph),
            ErrorKind::ResolverError,
        ));
    }

    if let (Some(host), Some(local)) = (graph.host_str(), config.local_server()) {
        if config.is_local_host(host) && local.path() == graph.path() {
            log::error!("Attempt to resolve local graph {} through the federation", graph);
            return Err(FedError::new(
                &format!("Attempt to resolve local graph {} through the federation", graph),
                ErrorKind::ResolverError,
            ));
        }
    }

    Ok(ServerUri::of_graph(graph))
}
