use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::common::{
    DEFAULT_HOST_ALIASES, DEFAULT_SCHEME, DEFAULT_TRANSACTION_TIMEOUT, MIN_PARTICIPANT_TIMEOUT,
};
use crate::errors::{ErrorKind, FedError, FedResult};
use crate::rdf::NodePool;
use crate::resolver::FederationResolverFactory;
use crate::session::SessionFactoryFinder;

/// Immutable settings shared by a resolver factory and its resolvers.
#[derive(Clone)]
pub struct FederationConfig {
    inner: Arc<FederationConfigInner>,
}

struct FederationConfigInner {
    transaction_timeout: Duration,
    min_participant_timeout: Duration,
    schemes: Vec<String>,
    local_server: Option<Url>,
    host_aliases: Vec<String>,
    report_read_only_votes: bool,
    node_pool: NodePool,
    finder: Arc<dyn SessionFactoryFinder>,
}

impl FederationConfig {
    pub fn transaction_timeout(&self) -> Duration {
        self.inner.transaction_timeout
    }

    pub fn min_participant_timeout(&self) -> Duration {
        self.inner.min_participant_timeout
    }

    /// URI schemes routed to remote servers.
    pub fn schemes(&self) -> &[String] {
        &self.inner.schemes
    }

    pub fn claims_scheme(&self, scheme: &str) -> bool {
        self.inner.schemes.iter().any(|s| s.eq_ignore_ascii_case(scheme))
    }

    /// The server this process serves itself, if any.
    pub fn local_server(&self) -> Option<&Url> {
        self.inner.local_server.as_ref()
    }

    /// Host names that refer to this machine.
    pub fn host_aliases(&self) -> &[String] {
        &self.inner.host_aliases
    }

    pub fn is_local_host(&self, host: &str) -> bool {
        self.inner
            .host_aliases
            .iter()
            .any(|alias| alias.eq_ignore_ascii_case(host))
    }

    pub fn report_read_only_votes(&self) -> bool {
        self.inner.report_read_only_votes
    }

    pub fn node_pool(&self) -> &NodePool {
        &self.inner.node_pool
    }

    pub fn session_factory_finder(&self) -> Arc<dyn SessionFactoryFinder> {
        self.inner.finder.clone()
    }
}

impl Debug for FederationConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FederationConfig")
            .field("transaction_timeout", &self.inner.transaction_timeout)
            .field("min_participant_timeout", &self.inner.min_participant_timeout)
            .field("schemes", &self.inner.schemes)
            .field("local_server", &self.inner.local_server)
            .field("host_aliases", &self.inner.host_aliases)
            .field("report_read_only_votes", &self.inner.report_read_only_votes)
            .finish()
    }
}

/// Fluent builder of a [`FederationResolverFactory`].
///
/// The first invalid setting is remembered and returned from
/// [`build`](FederationBuilder::build); later settings are ignored.
///
/// # Examples
///
/// ```rust,ignore
/// let factory = FederationBuilder::new()
///     .transaction_timeout(Duration::from_secs(30))
///     .local_server("rmi://db1.example.org/server1")
///     .host_alias("db1.example.org")
///     .node_pool(NodePool::new(MemoryNodePool::new()))
///     .session_factory_finder(finder)
///     .build()?;
/// let resolver = factory.new_resolver(true)?;
/// ```
pub struct FederationBuilder {
    error: Option<FedError>,
    transaction_timeout: Duration,
    min_participant_timeout: Duration,
    schemes: Vec<String>,
    local_server: Option<Url>,
    host_aliases: Vec<String>,
    report_read_only_votes: bool,
    node_pool: Option<NodePool>,
    finder: Option<Arc<dyn SessionFactoryFinder>>,
}

impl Default for FederationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FederationBuilder {
    pub fn new() -> Self {
        FederationBuilder {
            error: None,
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
            min_participant_timeout: MIN_PARTICIPANT_TIMEOUT,
            schemes: vec![DEFAULT_SCHEME.to_string()],
            local_server: None,
            host_aliases: DEFAULT_HOST_ALIASES.iter().map(|h| h.to_string()).collect(),
            report_read_only_votes: false,
            node_pool: None,
            finder: None,
        }
    }

    pub fn transaction_timeout(mut self, timeout: Duration) -> Self {
        if self.error.is_none() {
            if timeout.is_zero() {
                self.fail("Transaction timeout must be greater than zero");
            } else {
                self.transaction_timeout = timeout;
            }
        }
        self
    }

    pub fn min_participant_timeout(mut self, timeout: Duration) -> Self {
        if self.error.is_none() {
            if timeout.is_zero() {
                self.fail("Minimum participant timeout must be greater than zero");
            } else {
                self.min_participant_timeout = timeout;
            }
        }
        self
    }

    /// Replaces the claimed schemes.
    pub fn schemes(mut self, schemes: &[&str]) -> Self {
        if self.error.is_none() {
            if schemes.is_empty() || schemes.iter().any(|s| s.is_empty()) {
                self.fail("Claimed schemes cannot be empty");
            } else {
                self.schemes = schemes.iter().map(|s| s.to_lowercase()).collect();
            }
        }
        self
    }

    pub fn local_server(mut self, uri: &str) -> Self {
        if self.error.is_none() {
            match Url::parse(uri) {
                Ok(url) => self.local_server = Some(url),
                Err(e) => self.fail(&format!("Invalid local server URI {}: {}", uri, e)),
            }
        }
        self
    }

    /// Adds a host name that refers to this machine.
    pub fn host_alias(mut self, host: &str) -> Self {
        if self.error.is_none() {
            if host.is_empty() {
                self.fail("Host alias cannot be empty");
            } else if !self.host_aliases.iter().any(|h| h.eq_ignore_ascii_case(host)) {
                self.host_aliases.push(host.to_string());
            }
        }
        self
    }

    pub fn report_read_only_votes(mut self, enabled: bool) -> Self {
        self.report_read_only_votes = enabled;
        self
    }

    pub fn node_pool(mut self, node_pool: NodePool) -> Self {
        self.node_pool = Some(node_pool);
        self
    }

    pub fn session_factory_finder(mut self, finder: Arc<dyn SessionFactoryFinder>) -> Self {
        self.finder = Some(finder);
        self
    }

    /// Validates the settings and creates the factory.
    pub fn build(self) -> FedResult<FederationResolverFactory> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let node_pool = self.node_pool.ok_or_else(|| {
            log::error!("A node pool is required");
            FedError::new("A node pool is required", ErrorKind::ConfigurationError)
        })?;
        let finder = self.finder.ok_or_else(|| {
            log::error!("A session factory finder is required");
            FedError::new(
                "A session factory finder is required",
                ErrorKind::ConfigurationError,
            )
        })?;

        let config = FederationConfig {
            inner: Arc::new(FederationConfigInner {
                transaction_timeout: self.transaction_timeout,
                min_participant_timeout: self.min_participant_timeout,
                schemes: self.schemes,
                local_server: self.local_server,
                host_aliases: self.host_aliases,
                report_read_only_votes: self.report_read_only_votes,
                node_pool,
                finder,
            }),
        };
        log::debug!("Building resolver factory with {:?}", config);
        Ok(FederationResolverFactory::new(config))
    }

    fn fail(&mut self, message: &str) {
        log::error!("{}", message);
        self.error = Some(FedError::new(message, ErrorKind::ConfigurationError));
    }
}
