use std::fmt::{Display, Formatter};

/// Reason a resource manager gives for rolling back a transaction branch.
///
/// These correspond to the `XA_RB*` range of the X/Open return codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RollbackReason {
    /// XA_RBROLLBACK: rollback for an unspecified reason
    Unspecified,
    /// XA_RBCOMMFAIL: communication failure
    CommunicationFailure,
    /// XA_RBDEADLOCK: a deadlock was detected
    Deadlock,
    /// XA_RBINTEGRITY: an integrity violation was detected
    Integrity,
    /// XA_RBOTHER: a reason not listed here
    Other,
    /// XA_RBPROTO: a protocol error inside the resource manager
    Protocol,
    /// XA_RBTIMEOUT: the branch took too long
    Timeout,
    /// XA_RBTRANSIENT: the branch may be retried
    Transient,
}

/// Kind of a heuristic (unilateral) completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Heuristic {
    /// XA_HEURMIX: partly committed, partly rolled back
    Mixed,
    /// XA_HEURRB: rolled back
    Rollback,
    /// XA_HEURCOM: committed
    Commit,
    /// XA_HEURHAZ: outcome unknown
    Hazard,
}

impl Heuristic {
    /// Merges two heuristic outcomes of the same transaction.
    ///
    /// Equal kinds stay as they are, anything else escalates to [`Heuristic::Mixed`].
    pub fn merge(self, other: Heuristic) -> Heuristic {
        if self == other {
            self
        } else {
            Heuristic::Mixed
        }
    }
}

/// Closed set of X/Open XA return and error codes.
///
/// Every participant call in this crate reports failures through
/// [`ErrorKind::Xa`](crate::errors::ErrorKind::Xa) carrying one of these codes.
/// The fan-out logic only ever looks at the three classifications
/// [`is_gone`](XaCode::is_gone), [`is_rollback`](XaCode::is_rollback) and
/// [`is_heuristic`](XaCode::is_heuristic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XaCode {
    /// XA_RB*: the branch was (or must be) rolled back
    Rollback(RollbackReason),
    /// XA_HEUR*: the branch was completed heuristically
    Heuristic(Heuristic),
    /// XA_RETRY: the routine may be reissued
    Retry,
    /// XAER_ASYNC: an asynchronous operation is outstanding
    Async,
    /// XAER_RMERR: generic resource manager error
    ResourceError,
    /// XAER_NOTA: the xid is not known to the resource manager
    NotA,
    /// XAER_INVAL: invalid arguments
    Invalid,
    /// XAER_PROTO: routine invoked in an improper context
    Protocol,
    /// XAER_RMFAIL: the resource manager is unavailable
    ResourceFailed,
    /// XAER_DUPID: the xid already exists
    DuplicateId,
    /// XAER_OUTSIDE: the resource manager is doing work outside any transaction
    Outside,
}

pub const XA_RBBASE: i32 = 100;
pub const XA_RBEND: i32 = XA_RBBASE + 7;

impl XaCode {
    /// Returns the numeric X/Open value of this code.
    pub fn code(&self) -> i32 {
        match self {
            XaCode::Rollback(reason) => match reason {
                RollbackReason::Unspecified => XA_RBBASE,
                RollbackReason::CommunicationFailure => XA_RBBASE + 1,
                RollbackReason::Deadlock => XA_RBBASE + 2,
                RollbackReason::Integrity => XA_RBBASE + 3,
                RollbackReason::Other => XA_RBBASE + 4,
                RollbackReason::Protocol => XA_RBBASE + 5,
                RollbackReason::Timeout => XA_RBBASE + 6,
                RollbackReason::Transient => XA_RBEND,
            },
            XaCode::Heuristic(Heuristic::Mixed) => 5,
            XaCode::Heuristic(Heuristic::Rollback) => 6,
            XaCode::Heuristic(Heuristic::Commit) => 7,
            XaCode::Heuristic(Heuristic::Hazard) => 8,
            XaCode::Retry => 4,
            XaCode::Async => -2,
            XaCode::ResourceError => -3,
            XaCode::NotA => -4,
            XaCode::Invalid => -5,
            XaCode::Protocol => -6,
            XaCode::ResourceFailed => -7,
            XaCode::DuplicateId => -8,
            XaCode::Outside => -9,
        }
    }

    /// Maps a numeric X/Open value back to a code.
    ///
    /// Session implementations use this to turn the return code of a remote
    /// server into an [`ErrorKind::Xa`](crate::errors::ErrorKind::Xa) failure.
    pub fn from_code(code: i32) -> Option<XaCode> {
        let xa_code = match code {
            100 => XaCode::Rollback(RollbackReason::Unspecified),
            101 => XaCode::Rollback(RollbackReason::CommunicationFailure),
            102 => XaCode::Rollback(RollbackReason::Deadlock),
            103 => XaCode::Rollback(RollbackReason::Integrity),
            104 => XaCode::Rollback(RollbackReason::Other),
            105 => XaCode::Rollback(RollbackReason::Protocol),
            106 => XaCode::Rollback(RollbackReason::Timeout),
            107 => XaCode::Rollback(RollbackReason::Transient),
            5 => XaCode::Heuristic(Heuristic::Mixed),
            6 => XaCode::Heuristic(Heuristic::Rollback),
            7 => XaCode::Heuristic(Heuristic::Commit),
            8 => XaCode::Heuristic(Heuristic::Hazard),
            4 => XaCode::Retry,
            -2 => XaCode::Async,
            -3 => XaCode::ResourceError,
            -4 => XaCode::NotA,
            -5 => XaCode::Invalid,
            -6 => XaCode::Protocol,
            -7 => XaCode::ResourceFailed,
            -8 => XaCode::DuplicateId,
            -9 => XaCode::Outside,
            _ => return None,
        };
        Some(xa_code)
    }

    /// The resource manager is permanently done with the transaction
    /// (XAER_RMFAIL or XAER_NOTA). No further calls should be issued to it.
    pub fn is_gone(&self) -> bool {
        matches!(self, XaCode::ResourceFailed | XaCode::NotA)
    }

    /// The resource manager rolled back, or demands a rollback.
    pub fn is_rollback(&self) -> bool {
        matches!(self, XaCode::Rollback(_))
    }

    /// The resource manager made a unilateral decision.
    pub fn is_heuristic(&self) -> bool {
        matches!(self, XaCode::Heuristic(_))
    }

    pub fn heuristic(&self) -> Option<Heuristic> {
        match self {
            XaCode::Heuristic(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl Display for XaCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            XaCode::Rollback(RollbackReason::Unspecified) => "XA_RBROLLBACK",
            XaCode::Rollback(RollbackReason::CommunicationFailure) => "XA_RBCOMMFAIL",
            XaCode::Rollback(RollbackReason::Deadlock) => "XA_RBDEADLOCK",
            XaCode::Rollback(RollbackReason::Integrity) => "XA_RBINTEGRITY",
            XaCode::Rollback(RollbackReason::Other) => "XA_RBOTHER",
            XaCode::Rollback(RollbackReason::Protocol) => "XA_RBPROTO",
            XaCode::Rollback(RollbackReason::Timeout) => "XA_RBTIMEOUT",
            XaCode::Rollback(RollbackReason::Transient) => "XA_RBTRANSIENT",
            XaCode::Heuristic(Heuristic::Mixed) => "XA_HEURMIX",
            XaCode::Heuristic(Heuristic::Rollback) => "XA_HEURRB",
            XaCode::Heuristic(Heuristic::Commit) => "XA_HEURCOM",
            XaCode::Heuristic(Heuristic::Hazard) => "XA_HEURHAZ",
            XaCode::Retry => "XA_RETRY",
            XaCode::Async => "XAER_ASYNC",
            XaCode::ResourceError => "XAER_RMERR",
            XaCode::NotA => "XAER_NOTA",
            XaCode::Invalid => "XAER_INVAL",
            XaCode::Protocol => "XAER_PROTO",
            XaCode::ResourceFailed => "XAER_RMFAIL",
            XaCode::DuplicateId => "XAER_DUPID",
            XaCode::Outside => "XAER_OUTSIDE",
        };
        write!(f, "{}({})", name, self.code())
    }
}
