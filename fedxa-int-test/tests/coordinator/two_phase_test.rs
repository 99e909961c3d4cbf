use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fedxa::errors::FedResult;
use fedxa::xa::{
    EndFlags, ResourceCoordinator, RollbackReason, StartFlags, TransactionState, Vote, XaCode,
    XaResourceProvider, Xid,
};
use fedxa_int_test::test_util::{CallLog, MockParticipant, MockState, Verb};
use parking_lot::Mutex;

use super::{assert_no_violations, begin_with, new_coordinator};

#[test]
fn test_two_phase_commit() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::new("a", &log);
    let b = MockParticipant::new("b", &log);
    let coordinator = new_coordinator();

    let xid = begin_with(&coordinator, &[&a, &b])?;
    assert_eq!(coordinator.participant_count(&xid), Some(2));
    coordinator.end(&xid, EndFlags::Success)?;
    assert_eq!(coordinator.prepare(&xid)?, Vote::Ok);
    assert_eq!(coordinator.state_of(&xid), Some(TransactionState::Prepared));
    coordinator.commit(&xid, false)?;

    assert_eq!(
        log.entries(),
        vec![
            "a.start(TMNOFLAGS)",
            "b.start(TMNOFLAGS)",
            "a.end(TMSUCCESS)",
            "b.end(TMSUCCESS)",
            "a.prepare",
            "b.prepare",
            "a.commit",
            "b.commit",
        ]
    );
    assert_eq!(a.state(), MockState::Committed);
    assert_eq!(b.state(), MockState::Committed);
    assert_eq!(coordinator.transaction_count(), 0);
    assert_no_violations(&[&a, &b]);
    Ok(())
}

#[test]
fn test_read_only_voters_get_no_completion() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::new("a", &log);
    let b = MockParticipant::read_only("b", &log);
    let c = MockParticipant::new("c", &log);
    let coordinator = new_coordinator();

    let xid = begin_with(&coordinator, &[&a, &b, &c])?;
    coordinator.end(&xid, EndFlags::Success)?;
    assert_eq!(coordinator.prepare(&xid)?, Vote::Ok);
    assert_eq!(coordinator.participant_count(&xid), Some(2));
    coordinator.commit(&xid, false)?;

    assert_eq!(log.calls_of("a"), vec!["start(TMNOFLAGS)", "end(TMSUCCESS)", "prepare", "commit"]);
    assert_eq!(log.calls_of("b"), vec!["start(TMNOFLAGS)", "end(TMSUCCESS)", "prepare"]);
    assert_eq!(log.calls_of("c"), vec!["start(TMNOFLAGS)", "end(TMSUCCESS)", "prepare", "commit"]);
    assert_no_violations(&[&a, &b, &c]);
    Ok(())
}

#[test]
fn test_all_read_only_answers_ok_by_default() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::read_only("a", &log);
    let coordinator = new_coordinator();

    let xid = begin_with(&coordinator, &[&a])?;
    coordinator.end(&xid, EndFlags::Success)?;
    assert_eq!(coordinator.prepare(&xid)?, Vote::Ok);
    assert_eq!(coordinator.transaction_count(), 1);

    coordinator.commit(&xid, false)?;
    assert_eq!(coordinator.transaction_count(), 0);
    assert_eq!(log.calls_of("a"), vec!["start(TMNOFLAGS)", "end(TMSUCCESS)", "prepare"]);
    Ok(())
}

#[test]
fn test_all_read_only_reported_when_enabled() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::read_only("a", &log);
    let coordinator =
        ResourceCoordinator::with_options(Duration::from_secs(30), Duration::from_secs(10), true);

    let xid = begin_with(&coordinator, &[&a])?;
    coordinator.end(&xid, EndFlags::Success)?;
    assert_eq!(coordinator.prepare(&xid)?, Vote::ReadOnly);
    assert_eq!(coordinator.transaction_count(), 0);

    let err = coordinator.commit(&xid, false).unwrap_err();
    assert_eq!(err.xa_code(), Some(XaCode::NotA));
    Ok(())
}

#[test]
fn test_one_phase_commit() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::new("a", &log);
    let b = MockParticipant::new("b", &log);
    let coordinator = new_coordinator();

    let xid = begin_with(&coordinator, &[&a, &b])?;
    coordinator.end(&xid, EndFlags::Success)?;
    coordinator.commit(&xid, true)?;

    assert_eq!(log.calls_of("a"), vec!["start(TMNOFLAGS)", "end(TMSUCCESS)", "prepare", "commit"]);
    assert_eq!(a.state(), MockState::Committed);
    assert_eq!(b.state(), MockState::Committed);
    assert_eq!(coordinator.transaction_count(), 0);
    assert_no_violations(&[&a, &b]);
    Ok(())
}

#[test]
fn test_one_phase_commit_rolls_back_on_prepare_failure() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::new("a", &log);
    let b = MockParticipant::failing("b", &log, Verb::Prepare, XaCode::ResourceError);
    let coordinator = new_coordinator();

    let xid = begin_with(&coordinator, &[&a, &b])?;
    coordinator.end(&xid, EndFlags::Success)?;
    let err = coordinator.commit(&xid, true).unwrap_err();

    assert_eq!(
        err.xa_code(),
        Some(XaCode::Rollback(RollbackReason::Unspecified))
    );
    assert_eq!(err.cause().and_then(|c| c.xa_code()), Some(XaCode::ResourceError));
    assert_eq!(a.state(), MockState::RolledBack);
    assert_eq!(b.state(), MockState::RolledBack);
    assert_eq!(coordinator.transaction_count(), 0);
    assert_no_violations(&[&a, &b]);
    Ok(())
}

#[test]
fn test_join_is_rejected() {
    let coordinator = new_coordinator();
    let err = coordinator
        .start(&Xid::generate(), StartFlags::Join)
        .unwrap_err();
    assert_eq!(err.xa_code(), Some(XaCode::Invalid));
    assert_eq!(coordinator.transaction_count(), 0);
}

#[test]
fn test_start_while_active_is_protocol_error() -> FedResult<()> {
    let coordinator = new_coordinator();
    let first = Xid::generate();
    coordinator.start(&first, StartFlags::NoFlags)?;

    let err = coordinator
        .start(&Xid::generate(), StartFlags::NoFlags)
        .unwrap_err();
    assert_eq!(err.xa_code(), Some(XaCode::Protocol));
    assert_eq!(coordinator.active_xid(), Some(first));
    assert_eq!(coordinator.transaction_count(), 1);
    Ok(())
}

#[test]
fn test_duplicate_start_is_rejected() -> FedResult<()> {
    let coordinator = new_coordinator();
    let xid = Xid::generate();
    coordinator.start(&xid, StartFlags::NoFlags)?;
    coordinator.end(&xid, EndFlags::Success)?;

    let err = coordinator.start(&xid, StartFlags::NoFlags).unwrap_err();
    assert_eq!(err.xa_code(), Some(XaCode::DuplicateId));
    Ok(())
}

#[test]
fn test_prepare_while_active_is_protocol_error() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::new("a", &log);
    let coordinator = new_coordinator();

    let xid = begin_with(&coordinator, &[&a])?;
    let err = coordinator.prepare(&xid).unwrap_err();
    assert_eq!(err.xa_code(), Some(XaCode::Protocol));
    assert_eq!(log.calls_of("a"), vec!["start(TMNOFLAGS)"]);

    let err = coordinator.commit(&xid, true).unwrap_err();
    assert_eq!(err.xa_code(), Some(XaCode::Protocol));
    Ok(())
}

#[test]
fn test_verbs_on_unknown_xid() {
    let coordinator = new_coordinator();
    let xid = Xid::generate();
    assert_eq!(coordinator.end(&xid, EndFlags::Success).unwrap_err().xa_code(), Some(XaCode::NotA));
    assert_eq!(coordinator.prepare(&xid).unwrap_err().xa_code(), Some(XaCode::NotA));
    assert_eq!(coordinator.commit(&xid, false).unwrap_err().xa_code(), Some(XaCode::NotA));
    assert_eq!(coordinator.rollback(&xid).unwrap_err().xa_code(), Some(XaCode::NotA));
    assert_eq!(coordinator.forget(&xid).unwrap_err().xa_code(), Some(XaCode::NotA));
    assert_eq!(
        coordinator.start(&xid, StartFlags::Resume).unwrap_err().xa_code(),
        Some(XaCode::NotA)
    );
}

#[test]
fn test_enlist_outside_active_transaction() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::new("a", &log);
    let coordinator = new_coordinator();

    let err = coordinator.enlist(&Xid::generate(), a.resource()).unwrap_err();
    assert_eq!(err.xa_code(), Some(XaCode::Protocol));

    let xid = begin_with(&coordinator, &[])?;
    coordinator.end(&xid, EndFlags::Success)?;
    let err = coordinator.enlist(&xid, a.resource()).unwrap_err();
    assert_eq!(err.xa_code(), Some(XaCode::Protocol));
    assert!(log.entries().is_empty());
    Ok(())
}

#[test]
fn test_same_resource_manager_is_joined() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::with_rm("a", "rm-1", &log);
    let a2 = MockParticipant::with_rm("a2", "rm-1", &log);
    let coordinator = new_coordinator();

    let xid = begin_with(&coordinator, &[&a, &a2])?;
    assert_eq!(coordinator.participant_count(&xid), Some(1));
    assert_eq!(log.calls_of("a2"), vec!["start(TMJOIN)"]);

    coordinator.end(&xid, EndFlags::Success)?;
    coordinator.prepare(&xid)?;
    coordinator.commit(&xid, false)?;
    assert_eq!(log.calls_of("a2"), vec!["start(TMJOIN)"]);
    assert_eq!(a.state(), MockState::Committed);
    Ok(())
}

#[test]
fn test_enlist_sets_participant_timeout() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::new("a", &log);
    let coordinator = new_coordinator();

    begin_with(&coordinator, &[&a])?;
    assert!(a.timeout() <= Duration::from_secs(30));
    assert!(a.timeout() >= Duration::from_secs(10));
    Ok(())
}

#[test]
fn test_transaction_timeout_settings() -> FedResult<()> {
    let coordinator = new_coordinator();
    assert_eq!(coordinator.transaction_timeout()?, Duration::from_secs(30));
    assert!(coordinator.set_transaction_timeout(Duration::from_secs(5))?);
    assert_eq!(coordinator.transaction_timeout()?, Duration::from_secs(5));
    assert!(coordinator.set_transaction_timeout(Duration::ZERO)?);
    assert_eq!(coordinator.transaction_timeout()?, Duration::from_secs(10));
    Ok(())
}

#[test]
fn test_completion_listener_notified() -> FedResult<()> {
    let log = CallLog::new();
    let a = MockParticipant::new("a", &log);
    let coordinator = new_coordinator();
    let completed: Arc<Mutex<Vec<Xid>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = completed.clone();
    coordinator.add_completion_listener(Arc::new(move |xid: &Xid| sink.lock().push(xid.clone())));

    let xid = begin_with(&coordinator, &[&a])?;
    coordinator.end(&xid, EndFlags::Success)?;
    coordinator.prepare(&xid)?;
    assert!(completed.lock().is_empty());

    coordinator.commit(&xid, false)?;
    assert_eq!(*completed.lock(), vec![xid]);
    Ok(())
}

#[test]
fn test_ended_transactions_complete_on_other_threads() -> FedResult<()> {
    let log = CallLog::new();
    let coordinator = new_coordinator();
    let mut participants = Vec::new();
    let mut handles = Vec::new();

    for i in 0..8 {
        let participant = MockParticipant::new(&format!("p{}", i), &log);
        let xid = begin_with(&coordinator, &[&participant])?;
        coordinator.end(&xid, EndFlags::Success)?;
        participants.push(participant);

        let coordinator = coordinator.clone();
        handles.push(thread::spawn(move || -> FedResult<()> {
            coordinator.prepare(&xid)?;
            coordinator.commit(&xid, false)
        }));
    }

    for handle in handles {
        handle.join().expect("completion thread panicked")?;
    }
    assert_eq!(coordinator.transaction_count(), 0);
    for participant in &participants {
        assert_eq!(participant.state(), MockState::Committed);
        assert_no_violations(&[participant]);
    }
    Ok(())
}

#[test]
fn test_coordinator_is_its_own_resource_manager() {
    let a = new_coordinator();
    let b = new_coordinator();
    assert!(a.is_same_rm(&fedxa::xa::XaResource::new(a.clone())).unwrap());
    assert!(!a.is_same_rm(&fedxa::xa::XaResource::new(b)).unwrap());
}
