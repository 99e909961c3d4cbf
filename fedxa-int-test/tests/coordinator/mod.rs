mod failure_test;
mod recovery_test;
mod two_phase_test;

use std::sync::Arc;
use std::time::Duration;

use fedxa::errors::FedResult;
use fedxa::xa::{ResourceCoordinator, StartFlags, XaResourceProvider, Xid};
use fedxa_int_test::test_util::MockParticipant;

pub fn new_coordinator() -> ResourceCoordinator {
    ResourceCoordinator::new(Duration::from_secs(30))
}

/// Starts a new transaction and enlists `participants` in order.
pub fn begin_with(
    coordinator: &ResourceCoordinator,
    participants: &[&Arc<MockParticipant>],
) -> FedResult<Xid> {
    let xid = Xid::generate();
    coordinator.start(&xid, StartFlags::NoFlags)?;
    for participant in participants {
        coordinator.enlist(&xid, participant.resource())?;
    }
    Ok(xid)
}

/// Asserts that none of `participants` saw a call out of protocol order.
pub fn assert_no_violations(participants: &[&Arc<MockParticipant>]) {
    for participant in participants {
        assert!(
            participant.violations().is_empty(),
            "{} saw violations: {:?}",
            participant.name(),
            participant.violations()
        );
    }
}
