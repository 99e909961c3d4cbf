//! X/Open XA style transaction coordination.
//!
//! [`ResourceCoordinator`] presents every participant enlisted into a
//! transaction as one [`XaResourceProvider`] to an outer transaction manager.

mod code;
mod coordinator;
mod flags;
mod outcome;
mod record;
mod resource;
mod xid;

pub use code::{Heuristic, RollbackReason, XaCode, XA_RBBASE, XA_RBEND};
pub use coordinator::{CompletionListener, ResourceCoordinator};
pub use flags::{EndFlags, RecoverFlags, StartFlags, Vote};
pub use outcome::Outcome;
pub use record::{ParticipantStatus, TransactionState};
pub use resource::{XaResource, XaResourceProvider};
pub use xid::Xid;
