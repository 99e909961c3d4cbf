use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::common::{
    atomic, Atomic, ReadExecutor, WriteExecutor, DEFAULT_TRANSACTION_TIMEOUT,
    MIN_PARTICIPANT_TIMEOUT,
};
use crate::errors::{ErrorKind, FedError, FedResult};
use crate::xa::outcome::OutcomeTally;
use crate::xa::record::{Decision, Enlisted, TransactionRecord};
use crate::xa::{
    EndFlags, Outcome, ParticipantStatus, RecoverFlags, RollbackReason, StartFlags,
    TransactionState, Vote, XaCode, XaResource, XaResourceProvider, Xid,
};

/// Callback invoked with the xid of every transaction the coordinator has
/// finished with and removed from its registry.
pub type CompletionListener = Arc<dyn Fn(&Xid) + Send + Sync>;

/// Presents a dynamic set of participants as a single transactional resource.
///
/// The outer transaction manager drives the coordinator through
/// [`XaResourceProvider`]; the federation layer adds participants to the
/// currently active transaction with [`enlist`](ResourceCoordinator::enlist).
/// Every verb is fanned out to the participants of the transaction one at a
/// time and their individual outcomes are folded into one result.
///
/// # Concurrency
/// - At most one transaction is active (between `start` and `end`) at a time.
/// - `prepare`, `commit`, `rollback` and `forget` of ended transactions may
///   run on other threads while a different transaction is active.
/// - Calls for the same xid must not overlap; each transaction record is
///   locked for the duration of a verb.
///
/// # Limitations
/// Transactions are only known in memory, so `recover` and `forget` do not
/// survive a restart.
#[derive(Clone)]
pub struct ResourceCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl ResourceCoordinator {
    /// Creates a coordinator with the given transaction timeout and the
    /// default participant timeout floor.
    pub fn new(transaction_timeout: Duration) -> Self {
        ResourceCoordinator::with_options(transaction_timeout, MIN_PARTICIPANT_TIMEOUT, false)
    }

    /// Creates a coordinator.
    ///
    /// # Arguments
    /// * `transaction_timeout` - budget of a transaction, shared by all participants
    /// * `min_participant_timeout` - floor of the timeout handed to late participants
    /// * `report_read_only_votes` - answer `Vote::ReadOnly` from `prepare` when
    ///   every participant voted read-only, instead of `Vote::Ok`
    pub fn with_options(
        transaction_timeout: Duration,
        min_participant_timeout: Duration,
        report_read_only_votes: bool,
    ) -> Self {
        ResourceCoordinator {
            inner: Arc::new(CoordinatorInner {
                id: Uuid::new_v4().to_string(),
                transaction_timeout: atomic(transaction_timeout),
                min_participant_timeout,
                report_read_only_votes,
                transactions: DashMap::new(),
                active: Mutex::new(None),
                listeners: atomic(Vec::new()),
            }),
        }
    }

    /// Adds a participant to the currently active transaction `xid`.
    ///
    /// A participant of a resource manager that is already enlisted is only
    /// joined and not tracked again.
    ///
    /// # Errors
    /// * `XAER_PROTO` if `xid` is not the active transaction
    /// * `XAER_RMERR` if the participant left the transaction while starting
    /// * the participant's own failure otherwise; it then stays tracked so a
    ///   later rollback still reaches it
    pub fn enlist(&self, xid: &Xid, participant: XaResource) -> FedResult<()> {
        self.inner.enlist(xid, participant)
    }

    /// The xid currently between `start` and `end`, if any.
    pub fn active_xid(&self) -> Option<Xid> {
        self.inner.active.lock().clone()
    }

    /// Number of transactions known to this coordinator.
    pub fn transaction_count(&self) -> usize {
        self.inner.transactions.len()
    }

    pub fn state_of(&self, xid: &Xid) -> Option<TransactionState> {
        self.inner.with_record(xid, |rec| rec.state)
    }

    /// Number of participants still tracked for `xid`.
    pub fn participant_count(&self, xid: &Xid) -> Option<usize> {
        self.inner.with_record(xid, |rec| rec.participants.len())
    }

    pub fn participant_statuses(&self, xid: &Xid) -> Option<Vec<ParticipantStatus>> {
        self.inner
            .with_record(xid, |rec| rec.participants.iter().map(|p| p.status).collect())
    }

    pub fn add_completion_listener(&self, listener: CompletionListener) {
        self.inner.listeners.write_with(|listeners| listeners.push(listener));
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }
}

impl XaResourceProvider for ResourceCoordinator {
    fn start(&self, xid: &Xid, flags: StartFlags) -> FedResult<()> {
        self.inner.start(xid, flags)
    }

    fn end(&self, xid: &Xid, flags: EndFlags) -> FedResult<()> {
        self.inner.end(xid, flags)
    }

    fn prepare(&self, xid: &Xid) -> FedResult<Vote> {
        self.inner.prepare(xid)
    }

    fn commit(&self, xid: &Xid, one_phase: bool) -> FedResult<()> {
        self.inner.commit(xid, one_phase)
    }

    fn rollback(&self, xid: &Xid) -> FedResult<()> {
        self.inner.rollback(xid)
    }

    fn forget(&self, xid: &Xid) -> FedResult<()> {
        self.inner.forget(xid)
    }

    fn recover(&self, flags: RecoverFlags) -> FedResult<Vec<Xid>> {
        Ok(self.inner.recover(flags))
    }

    fn transaction_timeout(&self) -> FedResult<Duration> {
        Ok(self.inner.transaction_timeout())
    }

    fn set_transaction_timeout(&self, timeout: Duration) -> FedResult<bool> {
        let timeout = if timeout.is_zero() {
            DEFAULT_TRANSACTION_TIMEOUT
        } else {
            timeout
        };
        self.inner.transaction_timeout.write_with(|t| *t = timeout);
        Ok(true)
    }

    fn resource_manager_id(&self) -> String {
        self.inner.id.clone()
    }
}

/// Lock order: a record lock may be held while taking the active slot or a
/// registry shard, never the other way around.
struct CoordinatorInner {
    id: String,
    transaction_timeout: Atomic<Duration>,
    min_participant_timeout: Duration,
    report_read_only_votes: bool,
    transactions: DashMap<Xid, Arc<Mutex<TransactionRecord>>>,
    active: Mutex<Option<Xid>>,
    listeners: Atomic<Vec<CompletionListener>>,
}

fn protocol_error(message: &str) -> FedError {
    FedError::xa(message, XaCode::Protocol)
}

/// Remaining share of `total` after `elapsed`, never below `floor`.
fn remaining_or_floor(total: Duration, elapsed: Duration, floor: Duration) -> Duration {
    total.saturating_sub(elapsed).max(floor)
}

/// A finished record only accepts retries in the direction it was driven.
fn check_retry(rec: &TransactionRecord, wanted: Decision) -> FedResult<()> {
    match rec.decision {
        Some(decision) if decision != wanted => {
            log::warn!(
                "Retry of xid={} as {:?} after it was driven as {:?}",
                rec.xid,
                wanted,
                decision
            );
            Err(protocol_error(match decision {
                Decision::Commit => "Transaction was committed, it cannot be rolled back",
                Decision::Rollback => "Transaction was rolled back, it cannot be committed",
            }))
        }
        _ => Ok(()),
    }
}

fn not_a(xid: &Xid, operation: &str) -> FedError {
    log::error!("Attempting to {} unknown transaction: xid={}", operation, xid);
    FedError::xa(
        &format!("Unknown transaction {}", xid),
        XaCode::NotA,
    )
}

impl CoordinatorInner {
    fn transaction_timeout(&self) -> Duration {
        self.transaction_timeout.read_with(|t| *t)
    }

    fn lookup(&self, xid: &Xid) -> Option<Arc<Mutex<TransactionRecord>>> {
        self.transactions.get(xid).map(|entry| entry.value().clone())
    }

    fn with_record<R>(&self, xid: &Xid, f: impl FnOnce(&TransactionRecord) -> R) -> Option<R> {
        let record = self.lookup(xid)?;
        let rec = record.lock();
        if rec.completed {
            None
        } else {
            Some(f(&rec))
        }
    }

    fn is_active(&self, xid: &Xid) -> bool {
        self.active.lock().as_ref() == Some(xid)
    }

    fn release_slot(&self) {
        *self.active.lock() = None;
    }

    /// Runs `f` on the locked record of `xid`. A record marked completed by
    /// `f` is removed from the registry and reported to the listeners.
    fn drive<T>(
        &self,
        xid: &Xid,
        operation: &str,
        f: impl FnOnce(&mut TransactionRecord) -> FedResult<T>,
    ) -> FedResult<T> {
        let record = self.lookup(xid).ok_or_else(|| not_a(xid, operation))?;
        let (result, completed) = {
            let mut rec = record.lock();
            if rec.completed {
                return Err(not_a(xid, operation));
            }
            let result = f(&mut rec);
            if rec.completed {
                self.transactions.remove(xid);
            }
            (result, rec.completed)
        };

        if completed {
            log::debug!("Transaction completed: xid={}", xid);
            let listeners = self.listeners.read_with(|listeners| listeners.clone());
            for listener in listeners {
                listener(xid);
            }
        }
        result
    }

    fn enlist(&self, xid: &Xid, participant: XaResource) -> FedResult<()> {
        let record = self
            .lookup(xid)
            .ok_or_else(|| protocol_error("No transaction active"))?;
        let mut rec = record.lock();
        if rec.completed || rec.state != TransactionState::Active || !self.is_active(xid) {
            log::warn!("Rejecting enlistment into inactive transaction: xid={}", xid);
            return Err(protocol_error("No transaction active"));
        }

        let name = participant.resource_manager_id();
        log::debug!("Enlisting participant '{}' in xid={}", name, xid);

        let timeout = remaining_or_floor(
            self.transaction_timeout(),
            rec.started_at.elapsed(),
            self.min_participant_timeout,
        );
        if let Err(err) = participant.set_transaction_timeout(timeout) {
            log::warn!("Failed to set timeout of participant '{}': {}", name, err);
        }

        for existing in &rec.participants {
            if participant.is_same_rm(&existing.resource)? {
                log::debug!("Participant '{}' joins an enlisted resource manager", name);
                return participant.start(xid, StartFlags::Join).map_err(|err| {
                    if err.is_gone() {
                        FedError::resource_error("Participant left the transaction on join", err)
                    } else {
                        err
                    }
                });
            }
        }

        rec.participants.push(Enlisted::new(participant.clone()));
        if let Err(err) = participant.start(xid, StartFlags::NoFlags) {
            log::warn!("Failed to start participant '{}' in xid={}: {}", name, xid, err);
            if err.is_gone() {
                rec.participants.pop();
                return Err(FedError::resource_error(
                    "Participant left the transaction on start",
                    err,
                ));
            }
            if let Some(last) = rec.participants.last_mut() {
                last.status = ParticipantStatus::Ended;
            }
            return Err(err);
        }
        Ok(())
    }

    fn start(&self, xid: &Xid, flags: StartFlags) -> FedResult<()> {
        log::debug!("Start xid={} flags={}", xid, flags);
        match flags {
            StartFlags::NoFlags => self.begin(xid),
            StartFlags::Resume => self.resume(xid),
            StartFlags::Join => {
                log::warn!("Rejecting join of xid={}", xid);
                Err(FedError::xa("Can't handle joins", XaCode::Invalid))
            }
        }
    }

    fn begin(&self, xid: &Xid) -> FedResult<()> {
        let mut active = self.active.lock();
        if let Some(current) = active.as_ref() {
            log::warn!("Start of xid={} while xid={} is active", xid, current);
            return Err(protocol_error("Another transaction is active"));
        }
        if self.transactions.contains_key(xid) {
            log::warn!("Received plain start for existing transaction: xid={}", xid);
            return Err(FedError::xa(
                &format!("Transaction {} already exists", xid),
                XaCode::DuplicateId,
            ));
        }

        let mut record = TransactionRecord::new(xid.clone());
        record.state = TransactionState::Active;
        self.transactions
            .insert(xid.clone(), Arc::new(Mutex::new(record)));
        *active = Some(xid.clone());
        Ok(())
    }

    fn resume(&self, xid: &Xid) -> FedResult<()> {
        self.drive(xid, "resume", |rec| {
            if rec.state != TransactionState::Suspended {
                log::warn!("Resume of xid={} in state {}", xid, rec.state);
                return Err(protocol_error("Transaction is not suspended"));
            }
            {
                let mut active = self.active.lock();
                if active.is_some() {
                    return Err(protocol_error("Another transaction is active"));
                }
                *active = Some(xid.clone());
            }
            rec.state = TransactionState::Active;

            let mut failure = None;
            for (index, participant) in rec.participants.iter_mut().enumerate() {
                if participant.status != ParticipantStatus::Suspended {
                    continue;
                }
                match participant.resource.start(xid, StartFlags::Resume) {
                    Ok(()) => participant.status = ParticipantStatus::Active,
                    Err(err) => {
                        failure = Some((index, err));
                        break;
                    }
                }
            }

            match failure {
                None => Ok(()),
                Some((failed_index, err)) => Err(self.abort_resume(rec, failed_index, err)),
            }
        })
    }

    /// Fail-ends every participant but the one whose resume failed, so that
    /// a following rollback finds them all ended.
    fn abort_resume(&self, rec: &mut TransactionRecord, failed_index: usize, err: FedError) -> FedError {
        log::warn!("Failed to resume xid={}: {}", rec.xid, err);
        let xid = rec.xid.clone();
        let failed_gone = err.is_gone();

        let mut index = 0;
        rec.participants.retain_mut(|participant| {
            let current = index;
            index += 1;
            if current == failed_index {
                participant.status = ParticipantStatus::Ended;
                return !failed_gone;
            }
            if !matches!(
                participant.status,
                ParticipantStatus::Active | ParticipantStatus::Suspended
            ) {
                return true;
            }
            participant.status = ParticipantStatus::Ended;
            match participant.resource.end(&xid, EndFlags::Fail) {
                Ok(()) => true,
                Err(end_err) => {
                    log::error!(
                        "Error failing participant '{}' while handling aborted resume: {}",
                        participant.name(),
                        end_err
                    );
                    !end_err.is_gone()
                }
            }
        });

        rec.state = TransactionState::Ended;
        self.release_slot();

        if failed_gone {
            FedError::resource_error("Participant left the transaction on resume", err)
        } else {
            err
        }
    }

    fn end(&self, xid: &Xid, flags: EndFlags) -> FedResult<()> {
        log::debug!("End xid={} flags={}", xid, flags);
        self.drive(xid, "end", |rec| self.end_record(rec, flags))
    }

    fn end_record(&self, rec: &mut TransactionRecord, flags: EndFlags) -> FedResult<()> {
        if !self.is_active(&rec.xid) {
            log::warn!("End of xid={} which is not active", rec.xid);
            return Err(protocol_error("Transaction is not active"));
        }

        let xid = rec.xid.clone();
        let suspend = flags == EndFlags::Suspend;
        let mut first: Option<FedError> = None;

        rec.participants.retain_mut(|participant| {
            if participant.status != ParticipantStatus::Active {
                return true;
            }
            match participant.resource.end(&xid, flags) {
                Ok(()) => {
                    participant.status = if suspend {
                        ParticipantStatus::Suspended
                    } else {
                        ParticipantStatus::Ended
                    };
                    true
                }
                Err(err) => {
                    participant.status = ParticipantStatus::Ended;
                    let gone = err.is_gone();
                    if first.is_none() {
                        first = Some(err);
                    } else {
                        log::error!(
                            "2nd or more failure during end; participant = '{}': {}",
                            participant.name(),
                            err
                        );
                    }
                    !gone
                }
            }
        });

        self.release_slot();

        // a partial suspend cannot be resumed; fail the suspended ones
        if suspend && first.is_some() {
            rec.participants.retain_mut(|participant| {
                if participant.status != ParticipantStatus::Suspended {
                    return true;
                }
                participant.status = ParticipantStatus::Ended;
                match participant.resource.end(&xid, EndFlags::Fail) {
                    Ok(()) => true,
                    Err(err) => {
                        log::error!(
                            "2nd or more failure during end; participant = '{}': {}",
                            participant.name(),
                            err
                        );
                        !err.is_gone()
                    }
                }
            });
        }

        rec.state = if suspend && first.is_none() {
            TransactionState::Suspended
        } else {
            TransactionState::Ended
        };

        match first {
            None => Ok(()),
            Some(err) if err.is_gone() => Err(FedError::resource_error(
                "Participant left the transaction on end",
                err,
            )),
            Some(err) => Err(err),
        }
    }

    fn prepare(&self, xid: &Xid) -> FedResult<Vote> {
        log::debug!("Prepare xid={}", xid);
        self.drive(xid, "prepare", |rec| {
            let vote = self.prepare_record(rec)?;
            if vote == Vote::ReadOnly {
                rec.completed = true;
            }
            Ok(vote)
        })
    }

    fn prepare_record(&self, rec: &mut TransactionRecord) -> FedResult<Vote> {
        if self.is_active(&rec.xid) || rec.state != TransactionState::Ended {
            log::warn!("Prepare of xid={} in state {}", rec.xid, rec.state);
            return Err(protocol_error("Transaction is not ended"));
        }

        let xid = rec.xid.clone();
        let mut first: Option<FedError> = None;
        rec.state = TransactionState::Preparing;

        rec.participants.retain_mut(|participant| {
            match participant.resource.prepare(&xid) {
                Ok(Vote::Ok) => {
                    participant.status = ParticipantStatus::Prepared;
                    true
                }
                // read-only voters take no part in commit or rollback
                Ok(Vote::ReadOnly) => false,
                Err(err) => {
                    log::debug!("Prepare vetoed by '{}': {}", participant.name(), err);
                    participant.status = ParticipantStatus::Failed;
                    let keep = !(err.is_gone() || err.is_rollback());
                    if first.is_none() {
                        first = Some(err);
                    }
                    keep
                }
            }
        });

        rec.state = TransactionState::Prepared;

        if let Some(err) = first {
            return if err.is_gone() || err.is_rollback() {
                Err(FedError::resource_error("Prepare vetoed", err))
            } else {
                Err(err)
            };
        }

        if self.report_read_only_votes && rec.participants.is_empty() {
            Ok(Vote::ReadOnly)
        } else {
            Ok(Vote::Ok)
        }
    }

    fn commit(&self, xid: &Xid, one_phase: bool) -> FedResult<()> {
        log::debug!("Commit xid={} one_phase={}", xid, one_phase);
        self.drive(xid, "commit", |rec| self.commit_record(rec, one_phase))
    }

    fn commit_record(&self, rec: &mut TransactionRecord, one_phase: bool) -> FedResult<()> {
        if self.is_active(&rec.xid) {
            return Err(protocol_error("Transaction is still active"));
        }

        let retry = match (rec.state, one_phase) {
            (TransactionState::Ended, true) => {
                match self.prepare_record(rec) {
                    Ok(Vote::ReadOnly) => {
                        rec.completed = true;
                        return Ok(());
                    }
                    Ok(Vote::Ok) => {}
                    Err(err) => {
                        log::error!("Attempt to prepare in one-phase commit failed: {}", err);
                        self.rollback_record(rec)?;
                        return Err(FedError::new_with_cause(
                            "One-phase commit rolled back",
                            ErrorKind::Xa(XaCode::Rollback(RollbackReason::Unspecified)),
                            err,
                        ));
                    }
                }
                false
            }
            (TransactionState::Prepared, false) => false,
            (TransactionState::Finished, false) => {
                check_retry(rec, Decision::Commit)?;
                true
            }
            (state, _) => {
                log::warn!(
                    "Commit of xid={} in state {} one_phase={}",
                    rec.xid,
                    state,
                    one_phase
                );
                return Err(protocol_error("Transaction cannot be committed"));
            }
        };

        let xid = rec.xid.clone();
        let mut tally = OutcomeTally::new("commit");
        let mut switched = false;
        rec.state = TransactionState::Committing;
        rec.decision = Some(Decision::Commit);

        rec.participants.retain_mut(|participant| {
            if matches!(participant.status, ParticipantStatus::Heuristic(_))
                || (retry && participant.status != ParticipantStatus::Failed)
            {
                return true;
            }

            // the first commit failed with a rollback, so roll back all
            let rolling_back = tally.should_switch_to_rollback();
            switched |= rolling_back;
            let result = if rolling_back {
                participant.resource.rollback(&xid)
            } else {
                participant.resource.commit(&xid, false)
            };

            match result {
                Ok(()) => {
                    if !rolling_back {
                        tally.record_success();
                    }
                    false
                }
                Err(err) => {
                    let keep = match Outcome::of_error(&err) {
                        Outcome::Gone | Outcome::RollbackOnly => false,
                        Outcome::Heuristic(kind) => {
                            participant.status = ParticipantStatus::Heuristic(kind);
                            true
                        }
                        _ => {
                            participant.status = ParticipantStatus::Failed;
                            true
                        }
                    };
                    if !(rolling_back && err.is_rollback()) {
                        tally.record_failure(&participant.name(), err);
                    }
                    keep
                }
            }
        });

        rec.state = TransactionState::Finished;
        if switched {
            rec.decision = Some(Decision::Rollback);
        }
        let result = tally.commit_result();
        if result.is_ok() && rec.participants.is_empty() {
            rec.completed = true;
        }
        result
    }

    fn rollback(&self, xid: &Xid) -> FedResult<()> {
        log::debug!("Rollback xid={}", xid);
        self.drive(xid, "roll back", |rec| self.rollback_record(rec))
    }

    fn rollback_record(&self, rec: &mut TransactionRecord) -> FedResult<()> {
        if self.is_active(&rec.xid) {
            return Err(protocol_error("Transaction is still active"));
        }

        let retry = match rec.state {
            TransactionState::Ended | TransactionState::Suspended | TransactionState::Prepared => {
                false
            }
            TransactionState::Finished => {
                check_retry(rec, Decision::Rollback)?;
                true
            }
            state => {
                log::warn!("Rollback of xid={} in state {}", rec.xid, state);
                return Err(protocol_error("Transaction cannot be rolled back"));
            }
        };

        let xid = rec.xid.clone();
        let mut tally = OutcomeTally::new("rollback");
        rec.state = TransactionState::RollingBack;
        rec.decision = Some(Decision::Rollback);

        rec.participants.retain_mut(|participant| {
            if matches!(participant.status, ParticipantStatus::Heuristic(_))
                || (retry && participant.status != ParticipantStatus::Failed)
            {
                return true;
            }

            match participant.resource.rollback(&xid) {
                Ok(()) => {
                    tally.record_success();
                    false
                }
                Err(err) => match Outcome::of_error(&err) {
                    // a rollback code confirms the branch is rolled back
                    Outcome::RollbackOnly => {
                        tally.record_success();
                        false
                    }
                    Outcome::Gone => {
                        tally.record_failure(&participant.name(), err);
                        false
                    }
                    Outcome::Heuristic(kind) => {
                        participant.status = ParticipantStatus::Heuristic(kind);
                        tally.record_failure(&participant.name(), err);
                        true
                    }
                    _ => {
                        participant.status = ParticipantStatus::Failed;
                        tally.record_failure(&participant.name(), err);
                        true
                    }
                },
            }
        });

        rec.state = TransactionState::Finished;
        let result = tally.rollback_result();
        if result.is_ok() && rec.participants.is_empty() {
            rec.completed = true;
        }
        result
    }

    fn forget(&self, xid: &Xid) -> FedResult<()> {
        log::debug!("Forget xid={}", xid);
        self.drive(xid, "forget", |rec| {
            if rec.state != TransactionState::Finished {
                log::warn!("Forget of xid={} in state {}", xid, rec.state);
                return Err(protocol_error("Transaction is not completed"));
            }

            let mut first: Option<FedError> = None;
            rec.participants.retain_mut(|participant| {
                let result = participant.resource.forget(xid);
                match (Outcome::of(&result), result) {
                    (_, Ok(())) => false,
                    (Outcome::Gone, Err(err)) => {
                        log::debug!(
                            "Transaction {} was not active on participant '{}': {}",
                            xid,
                            participant.name(),
                            err
                        );
                        false
                    }
                    (_, Err(err)) => {
                        if first.is_none() {
                            first = Some(err);
                        } else {
                            log::error!(
                                "2nd or more failure during forget; participant = '{}': {}",
                                participant.name(),
                                err
                            );
                        }
                        true
                    }
                }
            });

            if rec.participants.is_empty() {
                rec.completed = true;
            }
            match first {
                None => Ok(()),
                Some(err) => Err(err),
            }
        })
    }

    fn recover(&self, flags: RecoverFlags) -> Vec<Xid> {
        log::debug!("Recover flags={:?}", flags);
        if !flags.contains(RecoverFlags::START_SCAN) {
            return Vec::new();
        }

        let records: Vec<_> = self
            .transactions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records
            .iter()
            .filter_map(|record| {
                let rec = record.lock();
                if !rec.completed && rec.state.is_recoverable() {
                    Some(rec.xid.clone())
                } else {
                    None
                }
            })
            .collect()
    }
}
