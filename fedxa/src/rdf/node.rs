use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{ErrorKind, FedError, FedResult};

/// Compact local identifier of a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a remote server: a graph URI with its fragment removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerUri(Url);

impl ServerUri {
    pub fn parse(uri: &str) -> FedResult<Self> {
        let url = Url::parse(uri)?;
        Ok(ServerUri::of_graph(&url))
    }

    /// Derives the server owning `graph`.
    pub fn of_graph(graph: &Url) -> Self {
        let mut url = graph.clone();
        url.set_fragment(None);
        ServerUri(url)
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }
}

impl Display for ServerUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A blank node, either native to the server that minted it or imported
/// from a remote server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlankNode {
    Local(u64),
    Foreign { server: ServerUri, id: u64 },
}

impl Display for BlankNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BlankNode::Local(id) => write!(f, "_:b{}", id),
            BlankNode::Foreign { server, id } => write!(f, "_:b{}@{}", id, server),
        }
    }
}

/// A global RDF term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Node {
    Uri(Url),
    Literal {
        lexical: String,
        datatype: Option<Url>,
        language: Option<String>,
    },
    Blank(BlankNode),
}

impl Node {
    pub fn uri(uri: &str) -> FedResult<Node> {
        Ok(Node::Uri(Url::parse(uri)?))
    }

    /// Creates a plain literal.
    pub fn literal(lexical: &str) -> Node {
        Node::Literal {
            lexical: lexical.to_string(),
            datatype: None,
            language: None,
        }
    }

    pub fn typed_literal(lexical: &str, datatype: &str) -> FedResult<Node> {
        Ok(Node::Literal {
            lexical: lexical.to_string(),
            datatype: Some(Url::parse(datatype)?),
            language: None,
        })
    }

    pub fn lang_literal(lexical: &str, language: &str) -> Node {
        Node::Literal {
            lexical: lexical.to_string(),
            datatype: None,
            language: Some(language.to_lowercase()),
        }
    }

    pub fn as_uri(&self) -> Option<&Url> {
        match self {
            Node::Uri(url) => Some(url),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Node::Blank(_))
    }

    /// Returns the URI of this node, or a resolver error naming `role`.
    pub(crate) fn expect_uri(&self, role: &str) -> FedResult<&Url> {
        match self {
            Node::Uri(url) => Ok(url),
            other => {
                log::error!("{} must be a URI, found {}", role, other);
                Err(FedError::new(
                    &format!("{} must be a URI, found {}", role, other),
                    ErrorKind::ResolverError,
                ))
            }
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Uri(url) => write!(f, "<{}>", url),
            Node::Literal {
                lexical,
                datatype,
                language,
            } => {
                write!(f, "\"{}\"", lexical.replace('"', "\\\""))?;
                if let Some(language) = language {
                    write!(f, "@{}", language)?;
                } else if let Some(datatype) = datatype {
                    write!(f, "^^<{}>", datatype)?;
                }
                Ok(())
            }
            Node::Blank(blank) => write!(f, "{}", blank),
        }
    }
}
