use fedxa::errors::FedResult;
use fedxa::xa::{
    EndFlags, Heuristic, ParticipantStatus, RollbackReason, TransactionState, XaCode,
    XaResourceProvider,
};
use fedxa_int_test::test_util::{CallLog, MockParticipant, MockState, Verb};

use super::{assert_no_violations, begin_with, new_coordinator};

#[test]
fn test_gone_participant_at_enlist_is_not_tracked() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::new("a", &log);
    let b = MockParticipant::failing("b", &log, Verb::Start, XaCode::ResourceFailed);
    let c = MockParticipant::new("c", &log);
    let coordinator = new_coordinator();

    let xid = begin_with(&coordinator, &[&a])?;
    let err = coordinator.enlist(&xid, b.resource()).unwrap_err();
    assert_eq!(err.xa_code(), Some(XaCode::ResourceError));
    assert!(err.cause().map(|c| c.is_gone()).unwrap_or(false));
    coordinator.enlist(&xid, c.resource())?;
    assert_eq!(coordinator.participant_count(&xid), Some(2));

    coordinator.end(&xid, EndFlags::Success)?;
    coordinator.rollback(&xid)?;

    assert_eq!(log.calls_of("b"), vec!["start(TMNOFLAGS)"]);
    assert_eq!(a.state(), MockState::RolledBack);
    assert_eq!(c.state(), MockState::RolledBack);
    assert_eq!(coordinator.transaction_count(), 0);
    assert_no_violations(&[&a, &b, &c]);
    Ok(())
}

#[test]
fn test_failed_start_stays_tracked_for_rollback() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::failing("a", &log, Verb::Start, XaCode::ResourceError);
    let coordinator = new_coordinator();

    let xid = begin_with(&coordinator, &[])?;
    let err = coordinator.enlist(&xid, a.resource()).unwrap_err();
    assert_eq!(err.xa_code(), Some(XaCode::ResourceError));
    assert_eq!(
        coordinator.participant_statuses(&xid),
        Some(vec![ParticipantStatus::Ended])
    );

    // the participant never started and answers XAER_NOTA on rollback
    coordinator.end(&xid, EndFlags::Success)?;
    let err = coordinator.rollback(&xid).unwrap_err();
    assert_eq!(err.heuristic(), Some(Heuristic::Hazard));
    assert_eq!(log.calls_of("a"), vec!["start(TMNOFLAGS)", "rollback"]);
    assert_eq!(coordinator.participant_count(&xid), Some(0));

    coordinator.forget(&xid)?;
    assert_eq!(coordinator.transaction_count(), 0);
    Ok(())
}

#[test]
fn test_prepare_failure_with_three_participants() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::new("a", &log);
    let b = MockParticipant::failing("b", &log, Verb::Prepare, XaCode::ResourceError);
    let c = MockParticipant::new("c", &log);
    let coordinator = new_coordinator();

    let xid = begin_with(&coordinator, &[&a, &b, &c])?;
    coordinator.end(&xid, EndFlags::Success)?;

    let err = coordinator.prepare(&xid).unwrap_err();
    assert_eq!(err.xa_code(), Some(XaCode::ResourceError));
    assert_eq!(a.state(), MockState::Prepared);
    assert_eq!(b.state(), MockState::RollbackOnly);
    assert_eq!(c.state(), MockState::Prepared);
    assert_eq!(coordinator.state_of(&xid), Some(TransactionState::Prepared));

    coordinator.rollback(&xid)?;
    assert_eq!(a.state(), MockState::RolledBack);
    assert_eq!(b.state(), MockState::RolledBack);
    assert_eq!(c.state(), MockState::RolledBack);
    assert_eq!(coordinator.transaction_count(), 0);
    assert_no_violations(&[&a, &b, &c]);
    Ok(())
}

#[test]
fn test_prepare_rollback_vote_drops_participant() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::new("a", &log);
    let b = MockParticipant::failing(
        "b",
        &log,
        Verb::Prepare,
        XaCode::Rollback(RollbackReason::Integrity),
    );
    let coordinator = new_coordinator();

    let xid = begin_with(&coordinator, &[&a, &b])?;
    coordinator.end(&xid, EndFlags::Success)?;

    let err = coordinator.prepare(&xid).unwrap_err();
    assert_eq!(err.xa_code(), Some(XaCode::ResourceError));
    assert!(err.cause().map(|c| c.is_rollback()).unwrap_or(false));
    assert_eq!(coordinator.participant_count(&xid), Some(1));

    coordinator.rollback(&xid)?;
    assert_eq!(log.calls_of("b"), vec!["start(TMNOFLAGS)", "end(TMSUCCESS)", "prepare"]);
    assert_eq!(a.state(), MockState::RolledBack);
    assert_no_violations(&[&a, &b]);
    Ok(())
}

#[test]
fn test_first_commit_rollback_rolls_back_the_rest() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::failing(
        "a",
        &log,
        Verb::Commit,
        XaCode::Rollback(RollbackReason::Deadlock),
    );
    let b = MockParticipant::new("b", &log);
    let coordinator = new_coordinator();

    let xid = begin_with(&coordinator, &[&a, &b])?;
    coordinator.end(&xid, EndFlags::Success)?;
    coordinator.prepare(&xid)?;

    let err = coordinator.commit(&xid, false).unwrap_err();
    assert_eq!(err.heuristic(), Some(Heuristic::Rollback));
    assert_eq!(log.calls_of("b").last().map(String::as_str), Some("rollback"));
    assert_eq!(b.state(), MockState::RolledBack);
    assert_eq!(coordinator.state_of(&xid), Some(TransactionState::Finished));

    coordinator.forget(&xid)?;
    assert_eq!(coordinator.transaction_count(), 0);
    assert_no_violations(&[&a, &b]);
    Ok(())
}

#[test]
fn test_commit_retry_reaches_failed_participant_only() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::failing("a", &log, Verb::Commit, XaCode::ResourceError);
    let b = MockParticipant::new("b", &log);
    let coordinator = new_coordinator();

    let xid = begin_with(&coordinator, &[&a, &b])?;
    coordinator.end(&xid, EndFlags::Success)?;
    coordinator.prepare(&xid)?;

    let err = coordinator.commit(&xid, false).unwrap_err();
    assert_eq!(err.heuristic(), Some(Heuristic::Mixed));
    assert_eq!(
        coordinator.participant_statuses(&xid),
        Some(vec![ParticipantStatus::Failed])
    );

    coordinator.commit(&xid, false)?;
    assert_eq!(log.count("a.commit"), 2);
    assert_eq!(log.count("b.commit"), 1);
    assert_eq!(a.state(), MockState::Committed);
    assert_eq!(coordinator.transaction_count(), 0);
    assert_no_violations(&[&a, &b]);
    Ok(())
}

#[test]
fn test_rollback_failure_is_hazard_and_retryable() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::failing("a", &log, Verb::Rollback, XaCode::ResourceError);
    let b = MockParticipant::new("b", &log);
    let coordinator = new_coordinator();

    let xid = begin_with(&coordinator, &[&a, &b])?;
    coordinator.end(&xid, EndFlags::Success)?;

    let err = coordinator.rollback(&xid).unwrap_err();
    assert_eq!(err.heuristic(), Some(Heuristic::Hazard));
    assert_eq!(b.state(), MockState::RolledBack);

    coordinator.rollback(&xid)?;
    assert_eq!(log.count("a.rollback"), 2);
    assert_eq!(log.count("b.rollback"), 1);
    assert_eq!(coordinator.transaction_count(), 0);
    assert_no_violations(&[&a, &b]);
    Ok(())
}

#[test]
fn test_commit_after_failed_rollback_is_protocol_error() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::failing("a", &log, Verb::Rollback, XaCode::ResourceError);
    let b = MockParticipant::new("b", &log);
    let coordinator = new_coordinator();

    let xid = begin_with(&coordinator, &[&a, &b])?;
    coordinator.end(&xid, EndFlags::Success)?;
    coordinator.prepare(&xid)?;

    let err = coordinator.rollback(&xid).unwrap_err();
    assert_eq!(err.heuristic(), Some(Heuristic::Hazard));

    let err = coordinator.commit(&xid, false).unwrap_err();
    assert_eq!(err.xa_code(), Some(XaCode::Protocol));
    assert_eq!(log.count("a.commit"), 0);
    assert_eq!(a.state(), MockState::Prepared);
    assert_eq!(coordinator.participant_count(&xid), Some(1));

    coordinator.rollback(&xid)?;
    assert_eq!(a.state(), MockState::RolledBack);
    assert_eq!(b.state(), MockState::RolledBack);
    assert_eq!(coordinator.transaction_count(), 0);
    assert_no_violations(&[&a, &b]);
    Ok(())
}

#[test]
fn test_rollback_after_failed_commit_is_protocol_error() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::failing("a", &log, Verb::Commit, XaCode::ResourceError);
    let b = MockParticipant::new("b", &log);
    let coordinator = new_coordinator();

    let xid = begin_with(&coordinator, &[&a, &b])?;
    coordinator.end(&xid, EndFlags::Success)?;
    coordinator.prepare(&xid)?;

    let err = coordinator.commit(&xid, false).unwrap_err();
    assert_eq!(err.heuristic(), Some(Heuristic::Mixed));

    let err = coordinator.rollback(&xid).unwrap_err();
    assert_eq!(err.xa_code(), Some(XaCode::Protocol));
    assert_eq!(log.count("a.rollback"), 0);
    assert_eq!(a.state(), MockState::Prepared);

    coordinator.commit(&xid, false)?;
    assert_eq!(a.state(), MockState::Committed);
    assert_eq!(b.state(), MockState::Committed);
    assert_eq!(coordinator.transaction_count(), 0);
    assert_no_violations(&[&a, &b]);
    Ok(())
}

#[test]
fn test_commit_switched_to_rollback_only_retries_rollback() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::failing(
        "a",
        &log,
        Verb::Commit,
        XaCode::Rollback(RollbackReason::Integrity),
    );
    let b = MockParticipant::failing("b", &log, Verb::Rollback, XaCode::ResourceError);
    let coordinator = new_coordinator();

    let xid = begin_with(&coordinator, &[&a, &b])?;
    coordinator.end(&xid, EndFlags::Success)?;
    coordinator.prepare(&xid)?;

    assert!(coordinator.commit(&xid, false).is_err());
    assert_eq!(
        coordinator.participant_statuses(&xid),
        Some(vec![ParticipantStatus::Failed])
    );

    let err = coordinator.commit(&xid, false).unwrap_err();
    assert_eq!(err.xa_code(), Some(XaCode::Protocol));
    assert_eq!(log.count("b.commit"), 0);

    coordinator.rollback(&xid)?;
    assert_eq!(b.state(), MockState::RolledBack);
    assert_eq!(coordinator.transaction_count(), 0);
    assert_no_violations(&[&a, &b]);
    Ok(())
}

#[test]
fn test_rollback_code_during_rollback_counts_as_done() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::failing(
        "a",
        &log,
        Verb::Rollback,
        XaCode::Rollback(RollbackReason::Timeout),
    );
    let coordinator = new_coordinator();

    let xid = begin_with(&coordinator, &[&a])?;
    coordinator.end(&xid, EndFlags::Success)?;
    coordinator.rollback(&xid)?;
    assert_eq!(coordinator.transaction_count(), 0);
    Ok(())
}

#[test]
fn test_gone_participant_during_end_is_dropped() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::failing("a", &log, Verb::End, XaCode::NotA);
    let b = MockParticipant::new("b", &log);
    let coordinator = new_coordinator();

    let xid = begin_with(&coordinator, &[&a, &b])?;
    let err = coordinator.end(&xid, EndFlags::Success).unwrap_err();
    assert_eq!(err.xa_code(), Some(XaCode::ResourceError));
    assert_eq!(coordinator.active_xid(), None);
    assert_eq!(coordinator.participant_count(&xid), Some(1));

    coordinator.rollback(&xid)?;
    assert_eq!(log.calls_of("a"), vec!["start(TMNOFLAGS)", "end(TMSUCCESS)"]);
    assert_eq!(b.state(), MockState::RolledBack);
    Ok(())
}
