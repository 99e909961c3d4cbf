use std::fmt::{Display, Formatter};
use std::time::Instant;

use crate::xa::{Heuristic, XaResource, Xid};

/// Protocol state of one transaction inside the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    Idle,
    Active,
    Suspended,
    Ended,
    Preparing,
    Prepared,
    Committing,
    RollingBack,
    Finished,
}

impl TransactionState {
    /// States reported by `recover`.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TransactionState::Preparing
                | TransactionState::Prepared
                | TransactionState::Committing
                | TransactionState::RollingBack
                | TransactionState::Finished
        )
    }
}

impl Display for TransactionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransactionState::Idle => "IDLE",
            TransactionState::Active => "ACTIVE",
            TransactionState::Suspended => "SUSPENDED",
            TransactionState::Ended => "ENDED",
            TransactionState::Preparing => "PREPARING",
            TransactionState::Prepared => "PREPARED",
            TransactionState::Committing => "COMMITTING",
            TransactionState::RollingBack => "ROLLINGBACK",
            TransactionState::Finished => "FINISHED",
        };
        write!(f, "{}", name)
    }
}

/// Where a single participant stands within its transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticipantStatus {
    Active,
    Suspended,
    /// No further `end` is sent.
    Ended,
    Prepared,
    /// An ordinary failure; addressed again by a commit or rollback retry.
    Failed,
    /// Completed unilaterally; kept until forgotten.
    Heuristic(Heuristic),
}

#[derive(Debug, Clone)]
pub(crate) struct Enlisted {
    pub(crate) resource: XaResource,
    pub(crate) status: ParticipantStatus,
}

impl Enlisted {
    pub(crate) fn new(resource: XaResource) -> Self {
        Enlisted {
            resource,
            status: ParticipantStatus::Active,
        }
    }

    pub(crate) fn name(&self) -> String {
        self.resource.resource_manager_id()
    }
}

/// Direction a transaction was driven in once its outcome fan-out began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Commit,
    Rollback,
}

/// Per-xid bookkeeping of the coordinator.
pub(crate) struct TransactionRecord {
    pub(crate) xid: Xid,
    pub(crate) participants: Vec<Enlisted>,
    pub(crate) state: TransactionState,
    pub(crate) started_at: Instant,
    /// Retries on a finished record must go the same way.
    pub(crate) decision: Option<Decision>,
    /// Set once the record has been removed from the registry.
    pub(crate) completed: bool,
}

impl TransactionRecord {
    pub(crate) fn new(xid: Xid) -> Self {
        TransactionRecord {
            xid,
            participants: Vec::new(),
            state: TransactionState::Idle,
            started_at: Instant::now(),
            decision: None,
            completed: false,
        }
    }
}
