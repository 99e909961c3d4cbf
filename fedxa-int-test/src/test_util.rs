use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fedxa::errors::{ErrorKind, FedError, FedResult};
use fedxa::rdf::{
    LocalTriple, MemoryNodePool, Node, NodeId, NodePool, PatternElement, RemoteQuery, ServerUri,
    Triple, Variable,
};
use fedxa::resolver::{FederationBuilder, FederationResolver, FederationResolverFactory};
use fedxa::session::{
    Answer, RemoteSession, RemoteSessionProvider, SessionFactory, SessionFactoryFinder,
    SessionFactoryProvider,
};
use fedxa::xa::{
    EndFlags, Heuristic, RecoverFlags, StartFlags, Vote, XaCode, XaResource, XaResourceProvider,
    Xid,
};
use parking_lot::Mutex;
use url::Url;

/// Runs a test between a setup and a teardown step.
/// The teardown runs even if the test fails; a failure of any step panics with its error.
pub fn run_test<C, T, B, A>(before: B, test: T, after: A)
where
    C: Clone,
    B: Fn() -> FedResult<C>,
    T: Fn(C) -> FedResult<()>,
    A: Fn(C) -> FedResult<()>,
{
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let test_ctx = ctx.clone();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || test(test_ctx)));
    let after_result = after(ctx);

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => panic!("Test failed: {:?}", e),
        Err(panic) => std::panic::resume_unwind(panic),
    }
    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

/// Ordered record of every call made to the test doubles.
///
/// Entries look like `p1.start(TMNOFLAGS)`, `p1.prepare` or `db2.query`.
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        CallLog::default()
    }

    pub fn record(&self, entry: String) {
        log::debug!("call: {}", entry);
        self.entries.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Calls made to `name`, without the name prefix.
    pub fn calls_of(&self, name: &str) -> Vec<String> {
        let prefix = format!("{}.", name);
        self.entries
            .lock()
            .iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(|s| s.to_string()))
            .collect()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries.lock().iter().filter(|e| *e == entry).count()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Start,
    End,
    Prepare,
    Commit,
    Rollback,
    Forget,
}

/// Branch state as seen by a [`MockParticipant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockState {
    Idle,
    Active,
    Suspended,
    Ended,
    RollbackOnly,
    Prepared,
    Committed,
    RolledBack,
    Heuristic(Heuristic),
    Forgotten,
    Gone,
}

pub type Hook = Box<dyn Fn() + Send + Sync>;

/// A participant that checks every verb against the XA state machine.
///
/// Calls out of order are answered with XAER_PROTO and remembered in
/// [`violations`](MockParticipant::violations). Fail points make a verb
/// fail with a given code; a failure moves the branch to the state the code
/// implies (gone, rolled back or heuristically completed).
pub struct MockParticipant {
    name: String,
    rm_id: String,
    log: CallLog,
    vote: Mutex<Vote>,
    state: Mutex<MockState>,
    xid: Mutex<Option<Xid>>,
    fail_points: Mutex<HashMap<Verb, (XaCode, bool)>>,
    timeout: Mutex<Duration>,
    violations: Mutex<Vec<String>>,
    on_commit: Mutex<Option<Hook>>,
    on_rollback: Mutex<Option<Hook>>,
    connection_closed: Mutex<Option<Arc<AtomicBool>>>,
}

impl MockParticipant {
    pub fn new(name: &str, log: &CallLog) -> Arc<Self> {
        MockParticipant::with_rm(name, name, log)
    }

    /// A participant of resource manager `rm_id`.
    pub fn with_rm(name: &str, rm_id: &str, log: &CallLog) -> Arc<Self> {
        Arc::new(MockParticipant {
            name: name.to_string(),
            rm_id: rm_id.to_string(),
            log: log.clone(),
            vote: Mutex::new(Vote::Ok),
            state: Mutex::new(MockState::Idle),
            xid: Mutex::new(None),
            fail_points: Mutex::new(HashMap::new()),
            timeout: Mutex::new(Duration::ZERO),
            violations: Mutex::new(Vec::new()),
            on_commit: Mutex::new(None),
            on_rollback: Mutex::new(None),
            connection_closed: Mutex::new(None),
        })
    }

    /// A participant that votes read-only.
    pub fn read_only(name: &str, log: &CallLog) -> Arc<Self> {
        let participant = MockParticipant::new(name, log);
        participant.set_vote(Vote::ReadOnly);
        participant
    }

    /// A participant whose first `verb` fails with `code`.
    pub fn failing(name: &str, log: &CallLog, verb: Verb, code: XaCode) -> Arc<Self> {
        let participant = MockParticipant::new(name, log);
        participant.fail_on(verb, code);
        participant
    }

    /// Makes the next `verb` fail with `code`.
    pub fn fail_on(&self, verb: Verb, code: XaCode) {
        self.fail_points.lock().insert(verb, (code, false));
    }

    /// Makes every `verb` fail with `code`.
    pub fn fail_always(&self, verb: Verb, code: XaCode) {
        self.fail_points.lock().insert(verb, (code, true));
    }

    pub fn set_vote(&self, vote: Vote) {
        *self.vote.lock() = vote;
    }

    pub fn on_commit(&self, hook: Hook) {
        *self.on_commit.lock() = Some(hook);
    }

    pub fn on_rollback(&self, hook: Hook) {
        *self.on_rollback.lock() = Some(hook);
    }

    /// Makes every verb fail with XAER_RMFAIL once `closed` is set.
    pub fn bind_connection(&self, closed: Arc<AtomicBool>) {
        *self.connection_closed.lock() = Some(closed);
    }

    pub fn resource(self: &Arc<Self>) -> XaResource {
        XaResource::from_arc(self.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> MockState {
        *self.state.lock()
    }

    pub fn timeout(&self) -> Duration {
        *self.timeout.lock()
    }

    pub fn violations(&self) -> Vec<String> {
        self.violations.lock().clone()
    }

    fn take_failure(&self, verb: Verb) -> Option<XaCode> {
        let mut fail_points = self.fail_points.lock();
        match fail_points.get(&verb).copied() {
            Some((code, true)) => Some(code),
            Some((code, false)) => {
                fail_points.remove(&verb);
                Some(code)
            }
            None => None,
        }
    }

    fn check_connection(&self, verb: &str) -> FedResult<()> {
        let closed = self
            .connection_closed
            .lock()
            .as_ref()
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(false);
        if closed {
            return Err(FedError::xa(
                &format!("{} received {} on a closed connection", self.name, verb),
                XaCode::ResourceFailed,
            ));
        }
        Ok(())
    }

    fn violation(&self, verb: &str, state: MockState) -> FedError {
        let message = format!("{} received {} in state {:?}", self.name, verb, state);
        log::warn!("{}", message);
        self.violations.lock().push(message.clone());
        FedError::xa(&message, XaCode::Protocol)
    }

    fn fail(&self, state: &mut MockState, verb: &str, code: XaCode) -> FedError {
        if code.is_gone() {
            *state = MockState::Gone;
        } else if code.is_rollback() {
            *state = MockState::RolledBack;
        } else if let Some(kind) = code.heuristic() {
            *state = MockState::Heuristic(kind);
        }
        FedError::xa(&format!("{} failed {} with {}", self.name, verb, code), code)
    }

    fn run_hook(hook: &Mutex<Option<Hook>>) {
        if let Some(hook) = hook.lock().as_ref() {
            hook();
        }
    }
}

impl XaResourceProvider for MockParticipant {
    fn start(&self, xid: &Xid, flags: StartFlags) -> FedResult<()> {
        self.log.record(format!("{}.start({})", self.name, flags));
        self.check_connection("start")?;
        let mut state = self.state.lock();
        let expected = match flags {
            StartFlags::NoFlags | StartFlags::Join => MockState::Idle,
            StartFlags::Resume => MockState::Suspended,
        };
        if *state != expected {
            return Err(self.violation("start", *state));
        }
        if let Some(code) = self.take_failure(Verb::Start) {
            return Err(self.fail(&mut state, "start", code));
        }
        *state = MockState::Active;
        *self.xid.lock() = Some(xid.clone());
        Ok(())
    }

    fn end(&self, _xid: &Xid, flags: EndFlags) -> FedResult<()> {
        self.log.record(format!("{}.end({})", self.name, flags));
        self.check_connection("end")?;
        let mut state = self.state.lock();
        let allowed = match flags {
            EndFlags::Suspend => *state == MockState::Active,
            EndFlags::Success | EndFlags::Fail => {
                matches!(*state, MockState::Active | MockState::Suspended)
            }
        };
        if !allowed {
            return Err(self.violation("end", *state));
        }
        if let Some(code) = self.take_failure(Verb::End) {
            let err = self.fail(&mut state, "end", code);
            if matches!(*state, MockState::Active | MockState::Suspended) {
                *state = MockState::Ended;
            }
            return Err(err);
        }
        *state = if flags == EndFlags::Suspend {
            MockState::Suspended
        } else {
            MockState::Ended
        };
        Ok(())
    }

    fn prepare(&self, _xid: &Xid) -> FedResult<Vote> {
        self.log.record(format!("{}.prepare", self.name));
        self.check_connection("prepare")?;
        let mut state = self.state.lock();
        if *state != MockState::Ended {
            return Err(self.violation("prepare", *state));
        }
        if let Some(code) = self.take_failure(Verb::Prepare) {
            let err = self.fail(&mut state, "prepare", code);
            if *state == MockState::Ended {
                *state = MockState::RollbackOnly;
            }
            return Err(err);
        }
        let vote = *self.vote.lock();
        *state = match vote {
            Vote::Ok => MockState::Prepared,
            Vote::ReadOnly => MockState::Committed,
        };
        Ok(vote)
    }

    fn commit(&self, _xid: &Xid, one_phase: bool) -> FedResult<()> {
        if one_phase {
            self.log.record(format!("{}.commit(1pc)", self.name));
        } else {
            self.log.record(format!("{}.commit", self.name));
        }
        self.check_connection("commit")?;
        {
            let mut state = self.state.lock();
            let expected = if one_phase {
                MockState::Ended
            } else {
                MockState::Prepared
            };
            if *state != expected {
                return Err(self.violation("commit", *state));
            }
            if let Some(code) = self.take_failure(Verb::Commit) {
                return Err(self.fail(&mut state, "commit", code));
            }
            *state = MockState::Committed;
        }
        MockParticipant::run_hook(&self.on_commit);
        Ok(())
    }

    fn rollback(&self, xid: &Xid) -> FedResult<()> {
        self.log.record(format!("{}.rollback", self.name));
        self.check_connection("rollback")?;
        {
            let mut state = self.state.lock();
            if *state == MockState::Idle {
                return Err(FedError::xa(
                    &format!("{} does not know {}", self.name, xid),
                    XaCode::NotA,
                ));
            }
            if !matches!(
                *state,
                MockState::Suspended
                    | MockState::Ended
                    | MockState::RollbackOnly
                    | MockState::Prepared
            ) {
                return Err(self.violation("rollback", *state));
            }
            if let Some(code) = self.take_failure(Verb::Rollback) {
                return Err(self.fail(&mut state, "rollback", code));
            }
            *state = MockState::RolledBack;
        }
        MockParticipant::run_hook(&self.on_rollback);
        Ok(())
    }

    fn forget(&self, _xid: &Xid) -> FedResult<()> {
        self.log.record(format!("{}.forget", self.name));
        self.check_connection("forget")?;
        let mut state = self.state.lock();
        if !matches!(*state, MockState::Heuristic(_)) {
            return Err(self.violation("forget", *state));
        }
        if let Some(code) = self.take_failure(Verb::Forget) {
            return Err(self.fail(&mut state, "forget", code));
        }
        *state = MockState::Forgotten;
        Ok(())
    }

    fn recover(&self, _flags: RecoverFlags) -> FedResult<Vec<Xid>> {
        self.log.record(format!("{}.recover", self.name));
        let in_doubt = matches!(
            self.state(),
            MockState::Prepared | MockState::Heuristic(_)
        );
        match (in_doubt, self.xid.lock().as_ref()) {
            (true, Some(xid)) => Ok(vec![xid.clone()]),
            _ => Ok(Vec::new()),
        }
    }

    fn transaction_timeout(&self) -> FedResult<Duration> {
        Ok(self.timeout())
    }

    fn set_transaction_timeout(&self, timeout: Duration) -> FedResult<bool> {
        *self.timeout.lock() = timeout;
        Ok(true)
    }

    fn resource_manager_id(&self) -> String {
        self.rm_id.clone()
    }
}

enum Change {
    Insert(Url, Vec<Triple>),
    Delete(Url, Vec<Triple>),
}

/// An in-memory remote database server.
///
/// Sessions buffer their changes until their participant commits.
pub struct MemoryServer {
    uri: ServerUri,
    log: CallLog,
    graphs: Mutex<HashMap<Url, Vec<Triple>>>,
    sessions_opened: AtomicUsize,
    sessions_closed: AtomicUsize,
    answers_closed: Arc<AtomicUsize>,
    queries: AtomicUsize,
    participant_fail_points: Mutex<Vec<(Verb, XaCode)>>,
}

impl MemoryServer {
    pub fn new(uri: &str, log: &CallLog) -> FedResult<Arc<Self>> {
        Ok(Arc::new(MemoryServer {
            uri: ServerUri::parse(uri)?,
            log: log.clone(),
            graphs: Mutex::new(HashMap::new()),
            sessions_opened: AtomicUsize::new(0),
            sessions_closed: AtomicUsize::new(0),
            answers_closed: Arc::new(AtomicUsize::new(0)),
            queries: AtomicUsize::new(0),
            participant_fail_points: Mutex::new(Vec::new()),
        }))
    }

    pub fn uri(&self) -> &ServerUri {
        &self.uri
    }

    /// Short name used in the call log: the host of the server.
    pub fn name(&self) -> String {
        self.uri.host().unwrap_or("server").to_string()
    }

    /// Stores committed statements in `graph`.
    pub fn load(&self, graph: &str, triples: Vec<Triple>) -> FedResult<()> {
        let graph = Url::parse(graph)?;
        self.graphs.lock().entry(graph).or_default().extend(triples);
        Ok(())
    }

    /// Committed statements of `graph`.
    pub fn triples(&self, graph: &str) -> FedResult<Vec<Triple>> {
        let graph = Url::parse(graph)?;
        Ok(self.graphs.lock().get(&graph).cloned().unwrap_or_default())
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.sessions_closed.load(Ordering::SeqCst)
    }

    pub fn answers_closed(&self) -> usize {
        self.answers_closed.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Arms a fail point on the next participant handed out by a session.
    pub fn fail_next_participant(&self, verb: Verb, code: XaCode) {
        self.participant_fail_points.lock().push((verb, code));
    }

    fn apply(&self, changes: Vec<Change>) {
        let mut graphs = self.graphs.lock();
        for change in changes {
            match change {
                Change::Insert(graph, triples) => {
                    let stored = graphs.entry(graph).or_default();
                    for triple in triples {
                        if !stored.contains(&triple) {
                            stored.push(triple);
                        }
                    }
                }
                Change::Delete(graph, triples) => {
                    if let Some(stored) = graphs.get_mut(&graph) {
                        stored.retain(|t| !triples.contains(t));
                    }
                }
            }
        }
    }

    fn view(&self, graph: &Url, pending: &[Change]) -> Vec<Triple> {
        let mut triples = self.graphs.lock().get(graph).cloned().unwrap_or_default();
        for change in pending {
            match change {
                Change::Insert(g, inserted) if g == graph => {
                    for triple in inserted {
                        if !triples.contains(triple) {
                            triples.push(triple.clone());
                        }
                    }
                }
                Change::Delete(g, deleted) if g == graph => {
                    triples.retain(|t| !deleted.contains(t));
                }
                _ => {}
            }
        }
        triples
    }
}

fn bind(query: &RemoteQuery, triple: &Triple) -> Option<Vec<Option<Node>>> {
    let mut bindings: HashMap<&Variable, &Node> = HashMap::new();
    let terms = [&triple.subject, &triple.predicate, &triple.object];
    for (element, term) in query.pattern().iter().zip(terms) {
        match element {
            PatternElement::Node(node) if node != term => return None,
            PatternElement::Node(_) => {}
            PatternElement::Variable(v) => match bindings.get(v) {
                Some(bound) if *bound != term => return None,
                Some(_) => {}
                None => {
                    bindings.insert(v, term);
                }
            },
        }
    }
    Some(
        query
            .variables()
            .iter()
            .map(|v| bindings.get(v).map(|n| (*n).clone()))
            .collect(),
    )
}

struct MemoryAnswer {
    variables: Vec<Variable>,
    rows: VecDeque<Vec<Option<Node>>>,
    closed: Arc<AtomicUsize>,
}

impl Answer for MemoryAnswer {
    fn variables(&self) -> &[Variable] {
        &self.variables
    }

    fn next_row(&mut self) -> FedResult<Option<Vec<Option<Node>>>> {
        Ok(self.rows.pop_front())
    }

    fn close(&mut self) -> FedResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A session against a [`MemoryServer`].
pub struct MemorySession {
    server: Arc<MemoryServer>,
    pending: Arc<Mutex<Vec<Change>>>,
    closed: Arc<AtomicBool>,
}

impl MemorySession {
    fn check_open(&self) -> FedResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(FedError::new("Session is closed", ErrorKind::SessionError));
        }
        Ok(())
    }
}

impl RemoteSessionProvider for MemorySession {
    fn query(&self, query: &RemoteQuery) -> FedResult<Box<dyn Answer>> {
        self.check_open()?;
        self.server.log.record(format!("{}.query", self.server.name()));
        self.server.queries.fetch_add(1, Ordering::SeqCst);

        let triples = self.server.view(query.graph(), &self.pending.lock());
        let rows = triples.iter().filter_map(|t| bind(query, t)).collect();
        Ok(Box::new(MemoryAnswer {
            variables: query.variables().to_vec(),
            rows,
            closed: self.server.answers_closed.clone(),
        }))
    }

    fn insert(&self, graph: &Url, statements: &[Triple]) -> FedResult<()> {
        self.check_open()?;
        self.server
            .log
            .record(format!("{}.insert({})", self.server.name(), statements.len()));
        self.pending
            .lock()
            .push(Change::Insert(graph.clone(), statements.to_vec()));
        Ok(())
    }

    fn delete(&self, graph: &Url, statements: &[Triple]) -> FedResult<()> {
        self.check_open()?;
        self.server
            .log
            .record(format!("{}.delete({})", self.server.name(), statements.len()));
        self.pending
            .lock()
            .push(Change::Delete(graph.clone(), statements.to_vec()));
        Ok(())
    }

    fn xa_resource(&self, read_only: bool) -> FedResult<XaResource> {
        self.check_open()?;
        let name = self.server.name();
        self.server.log.record(format!(
            "{}.xa_resource({})",
            name,
            if read_only { "ro" } else { "rw" }
        ));

        let participant = MockParticipant::with_rm(&name, &self.server.uri.to_string(), &self.server.log);
        participant.bind_connection(self.closed.clone());
        if read_only {
            participant.set_vote(Vote::ReadOnly);
        }
        for (verb, code) in self.server.participant_fail_points.lock().drain(..) {
            participant.fail_on(verb, code);
        }

        let server = self.server.clone();
        let pending = self.pending.clone();
        participant.on_commit(Box::new(move || {
            let changes: Vec<Change> = pending.lock().drain(..).collect();
            server.apply(changes);
        }));
        let pending = self.pending.clone();
        participant.on_rollback(Box::new(move || pending.lock().clear()));
        Ok(participant.resource())
    }

    fn close(&self) -> FedResult<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.server.log.record(format!("{}.close", self.server.name()));
            self.server.sessions_closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

struct MemorySessionFactory {
    server: Arc<MemoryServer>,
}

impl SessionFactoryProvider for MemorySessionFactory {
    fn new_session(&self) -> FedResult<RemoteSession> {
        self.server.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(RemoteSession::new(MemorySession {
            server: self.server.clone(),
            pending: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
        }))
    }

    fn close(&self) -> FedResult<()> {
        self.server
            .log
            .record(format!("{}.factory_close", self.server.name()));
        Ok(())
    }
}

/// Finds the in-memory servers of a test federation.
pub struct MemoryFinder {
    servers: HashMap<ServerUri, Arc<MemoryServer>>,
    lookups: AtomicUsize,
}

impl MemoryFinder {
    pub fn new(servers: &[Arc<MemoryServer>]) -> Self {
        MemoryFinder {
            servers: servers.iter().map(|s| (s.uri().clone(), s.clone())).collect(),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl SessionFactoryFinder for MemoryFinder {
    fn find(&self, server: &ServerUri) -> FedResult<SessionFactory> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        match self.servers.get(server) {
            Some(found) => Ok(SessionFactory::new(MemorySessionFactory {
                server: found.clone(),
            })),
            None => Err(FedError::new(
                &format!("No server at {}", server),
                ErrorKind::SessionError,
            )),
        }
    }
}

/// A resolver factory wired to in-memory servers.
#[derive(Clone)]
pub struct FederationContext {
    factory: FederationResolverFactory,
    node_pool: NodePool,
    servers: Vec<Arc<MemoryServer>>,
    finder: Arc<MemoryFinder>,
    log: CallLog,
}

impl FederationContext {
    pub fn factory(&self) -> &FederationResolverFactory {
        &self.factory
    }

    pub fn resolver(&self, can_write: bool) -> FedResult<FederationResolver> {
        self.factory.new_resolver(can_write)
    }

    pub fn node_pool(&self) -> &NodePool {
        &self.node_pool
    }

    pub fn server(&self, index: usize) -> Arc<MemoryServer> {
        self.servers[index].clone()
    }

    pub fn finder(&self) -> &MemoryFinder {
        &self.finder
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    pub fn local(&self, node: &Node) -> FedResult<NodeId> {
        self.node_pool.localize(node)
    }

    pub fn local_uri(&self, uri: &str) -> FedResult<NodeId> {
        self.node_pool.localize(&Node::uri(uri)?)
    }

    pub fn local_triple(&self, triple: &Triple) -> FedResult<LocalTriple> {
        Ok(LocalTriple::new(
            self.local(&triple.subject)?,
            self.local(&triple.predicate)?,
            self.local(&triple.object)?,
        ))
    }
}

/// Creates a federation over in-memory servers at `server_uris`.
///
/// The local server is `rmi://localhost/local`.
pub fn create_federation_context(server_uris: &[&str]) -> FedResult<FederationContext> {
    let log = CallLog::new();
    let servers = server_uris
        .iter()
        .map(|uri| MemoryServer::new(uri, &log))
        .collect::<FedResult<Vec<_>>>()?;
    let finder = Arc::new(MemoryFinder::new(&servers));
    let node_pool = NodePool::new(MemoryNodePool::new());

    let factory = FederationBuilder::new()
        .transaction_timeout(Duration::from_secs(30))
        .local_server("rmi://localhost/local")
        .node_pool(node_pool.clone())
        .session_factory_finder(finder.clone())
        .build()?;

    Ok(FederationContext {
        factory,
        node_pool,
        servers,
        finder,
        log,
    })
}

pub fn cleanup(ctx: FederationContext) -> FedResult<()> {
    ctx.factory.close()
}

pub fn uri(uri: &str) -> Node {
    Node::uri(uri).expect("valid test URI")
}

pub fn triple(subject: &str, predicate: &str, object: Node) -> Triple {
    Triple::new(uri(subject), uri(predicate), object)
}
