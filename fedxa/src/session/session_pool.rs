use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use log::{debug, warn};
use parking_lot::Mutex;

use crate::errors::{ErrorKind, FedError, FedResult};
use crate::rdf::ServerUri;
use crate::session::{RemoteSession, SessionFactory, SessionFactoryFinder};

/// Process-wide cache of remote sessions, keyed by server.
///
/// Each server gets a lazily created [`SessionFactory`] and a list of idle
/// sessions. Sessions are borrowed for one transaction and handed back with
/// [`SessionPool::return_session`]; entries are never evicted.
#[derive(Clone)]
pub struct SessionPool {
    inner: Arc<SessionPoolInner>,
}

impl SessionPool {
    pub fn new(finder: Arc<dyn SessionFactoryFinder>) -> Self {
        SessionPool {
            inner: Arc::new(SessionPoolInner {
                finder,
                entries: DashMap::new(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Returns an idle session for `server`, or a new one from its factory.
    pub fn get_session(&self, server: &ServerUri) -> FedResult<RemoteSession> {
        self.inner.get_session(server)
    }

    /// Hands a borrowed session back for reuse.
    pub fn return_session(&self, server: &ServerUri, session: RemoteSession) {
        self.inner.return_session(server, session)
    }

    pub fn idle_count(&self, server: &ServerUri) -> usize {
        self.inner
            .entry_of(server)
            .map(|entry| entry.idle.lock().len())
            .unwrap_or(0)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Closes every idle session and drops the cached factories.
    ///
    /// Sessions returned afterwards are closed instead of cached.
    pub fn close(&self) -> FedResult<()> {
        self.inner.close()
    }
}

struct SessionPoolInner {
    finder: Arc<dyn SessionFactoryFinder>,
    entries: DashMap<ServerUri, Arc<PoolEntry>>,
    closed: AtomicBool,
}

#[derive(Default)]
struct PoolEntry {
    factory: Mutex<Option<SessionFactory>>,
    idle: Mutex<Vec<RemoteSession>>,
}

impl SessionPoolInner {
    fn entry_of(&self, server: &ServerUri) -> Option<Arc<PoolEntry>> {
        self.entries.get(server).map(|e| e.value().clone())
    }

    fn entry_or_create(&self, server: &ServerUri) -> Arc<PoolEntry> {
        // clone out so no shard guard is held while the entry is locked
        self.entries
            .entry(server.clone())
            .or_default()
            .value()
            .clone()
    }

    fn get_session(&self, server: &ServerUri) -> FedResult<RemoteSession> {
        if self.closed.load(Ordering::Acquire) {
            log::error!("Session pool is closed, cannot serve {}", server);
            return Err(FedError::new(
                &format!("Session pool is closed, cannot serve {}", server),
                ErrorKind::SessionError,
            ));
        }

        let entry = self.entry_or_create(server);
        if let Some(session) = entry.idle.lock().pop() {
            debug!("Reusing cached session for {}", server);
            return Ok(session);
        }

        let factory = {
            let mut factory = entry.factory.lock();
            match factory.as_ref() {
                Some(f) => f.clone(),
                None => {
                    debug!("Creating session factory for {}", server);
                    let created = self.finder.find(server).map_err(|e| {
                        FedError::new_with_cause(
                            &format!("No session factory for {}", server),
                            ErrorKind::SessionError,
                            e,
                        )
                    })?;
                    *factory = Some(created.clone());
                    created
                }
            }
        };

        debug!("Opening new session for {}", server);
        factory.new_session().map_err(|e| {
            FedError::new_with_cause(
                &format!("Failed to open session for {}", server),
                ErrorKind::SessionError,
                e,
            )
        })
    }

    fn return_session(&self, server: &ServerUri, session: RemoteSession) {
        if self.closed.load(Ordering::Acquire) {
            debug!("Session pool closed, closing returned session for {}", server);
            if let Err(e) = session.close() {
                warn!("Failed to close session for {}: {}", server, e);
            }
            return;
        }

        let entry = self.entry_or_create(server);
        entry.idle.lock().push(session);
    }

    fn close(&self) -> FedResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let entries: Vec<(ServerUri, Arc<PoolEntry>)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        let mut first_error = None;
        for (server, entry) in entries {
            let idle: Vec<RemoteSession> = entry.idle.lock().drain(..).collect();
            for session in idle {
                if let Err(e) = session.close() {
                    warn!("Failed to close idle session for {}: {}", server, e);
                    first_error.get_or_insert(e);
                }
            }
            if let Some(factory) = entry.factory.lock().take() {
                if let Err(e) = factory.close() {
                    warn!("Failed to close session factory for {}: {}", server, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        self.entries.clear();

        match first_error {
            Some(e) => Err(FedError::new_with_cause(
                "Failed to close session pool",
                ErrorKind::SessionError,
                e,
            )),
            None => Ok(()),
        }
    }
}
