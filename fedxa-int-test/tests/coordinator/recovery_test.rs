use std::collections::HashSet;

use fedxa::errors::FedResult;
use fedxa::xa::{EndFlags, Heuristic, RecoverFlags, XaCode, XaResourceProvider, Xid};
use fedxa_int_test::test_util::{CallLog, MockParticipant, Verb};

use super::{begin_with, new_coordinator};

#[test]
fn test_recover_lists_only_in_doubt_transactions() -> FedResult<()> {
    let log = CallLog::new();
    let coordinator = new_coordinator();

    let prepared = begin_with(&coordinator, &[&MockParticipant::new("a", &log)])?;
    coordinator.end(&prepared, EndFlags::Success)?;
    coordinator.prepare(&prepared)?;

    let heuristic = MockParticipant::failing("b", &log, Verb::Commit, XaCode::Heuristic(Heuristic::Commit));
    let finished = begin_with(&coordinator, &[&heuristic])?;
    coordinator.end(&finished, EndFlags::Success)?;
    coordinator.prepare(&finished)?;
    assert!(coordinator.commit(&finished, false).is_err());

    let ended = begin_with(&coordinator, &[&MockParticipant::new("c", &log)])?;
    coordinator.end(&ended, EndFlags::Success)?;

    let suspended = begin_with(&coordinator, &[&MockParticipant::new("d", &log)])?;
    coordinator.end(&suspended, EndFlags::Suspend)?;

    let active = begin_with(&coordinator, &[&MockParticipant::new("e", &log)])?;
    assert_eq!(coordinator.transaction_count(), 5);

    let recovered: HashSet<Xid> = coordinator
        .recover(RecoverFlags::START_SCAN)?
        .into_iter()
        .collect();
    let expected: HashSet<Xid> = [prepared, finished].into_iter().collect();
    assert_eq!(recovered, expected);
    assert!(!recovered.contains(&active));
    assert!(!recovered.contains(&ended));
    assert!(!recovered.contains(&suspended));
    Ok(())
}

#[test]
fn test_recover_without_start_scan_is_empty() -> FedResult<()> {
    let log = CallLog::new();
    let coordinator = new_coordinator();
    let xid = begin_with(&coordinator, &[&MockParticipant::new("a", &log)])?;
    coordinator.end(&xid, EndFlags::Success)?;
    coordinator.prepare(&xid)?;

    assert!(coordinator.recover(RecoverFlags::NO_FLAGS)?.is_empty());
    assert!(coordinator.recover(RecoverFlags::END_SCAN)?.is_empty());
    assert_eq!(
        coordinator.recover(RecoverFlags::START_SCAN | RecoverFlags::END_SCAN)?,
        vec![xid]
    );
    Ok(())
}

#[test]
fn test_completed_transactions_are_not_recovered() -> FedResult<()> {
    let log = CallLog::new();
    let coordinator = new_coordinator();
    let xid = begin_with(&coordinator, &[&MockParticipant::new("a", &log)])?;
    coordinator.end(&xid, EndFlags::Success)?;
    coordinator.prepare(&xid)?;
    coordinator.commit(&xid, false)?;

    assert!(coordinator.recover(RecoverFlags::START_SCAN)?.is_empty());
    Ok(())
}
