use crate::errors::{ErrorKind, FedError, FedResult};
use crate::xa::{Heuristic, XaCode};

/// Classified result of a single participant call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    /// The resource manager is done with the transaction; stop talking to it.
    Gone,
    /// The branch was rolled back, or must be.
    RollbackOnly,
    /// The branch was completed unilaterally.
    Heuristic(Heuristic),
    /// Any other failure.
    Failed,
}

impl Outcome {
    pub fn of<T>(result: &FedResult<T>) -> Outcome {
        match result {
            Ok(_) => Outcome::Ok,
            Err(err) => Outcome::of_error(err),
        }
    }

    pub fn of_error(err: &FedError) -> Outcome {
        match err.xa_code() {
            Some(code) if code.is_gone() => Outcome::Gone,
            Some(code) if code.is_rollback() => Outcome::RollbackOnly,
            Some(XaCode::Heuristic(kind)) => Outcome::Heuristic(kind),
            _ => Outcome::Failed,
        }
    }
}

/// Folds the failures of one fan-out into a single representative result.
///
/// The first failure is kept, later ones are logged. Heuristic failures are
/// merged so that differing kinds escalate to mixed.
pub(crate) struct OutcomeTally {
    operation: &'static str,
    first: Option<FedError>,
    heuristic: Option<Heuristic>,
    failures: usize,
    heuristic_commits: usize,
    heuristic_rollbacks: usize,
    completed: usize,
}

impl OutcomeTally {
    pub(crate) fn new(operation: &'static str) -> Self {
        OutcomeTally {
            operation,
            first: None,
            heuristic: None,
            failures: 0,
            heuristic_commits: 0,
            heuristic_rollbacks: 0,
            completed: 0,
        }
    }

    pub(crate) fn record_success(&mut self) {
        self.completed += 1;
    }

    pub(crate) fn record_failure(&mut self, participant: &str, err: FedError) {
        self.failures += 1;
        if let Some(kind) = err.heuristic() {
            self.heuristic = Some(match self.heuristic {
                Some(merged) => merged.merge(kind),
                None => kind,
            });
            match kind {
                Heuristic::Commit => self.heuristic_commits += 1,
                Heuristic::Rollback => self.heuristic_rollbacks += 1,
                _ => {}
            }
        }

        if self.first.is_none() {
            self.first = Some(err);
        } else {
            log::error!(
                "2nd or more failure during {}; participant = '{}': {}",
                self.operation,
                participant,
                err
            );
        }
    }

    /// Whether the remaining participants of a commit should be rolled back
    /// instead: nothing committed yet and the first failure was a rollback.
    pub(crate) fn should_switch_to_rollback(&self) -> bool {
        self.completed == 0
            && self
                .first
                .as_ref()
                .map(|err| err.is_rollback() || err.heuristic() == Some(Heuristic::Rollback))
                .unwrap_or(false)
    }

    pub(crate) fn commit_result(self) -> FedResult<()> {
        let kind = match (&self.first, self.heuristic) {
            (None, _) => return Ok(()),
            (Some(_), Some(Heuristic::Mixed)) => Heuristic::Mixed,
            (Some(_), _) if self.heuristic_commits == self.failures => Heuristic::Commit,
            (Some(_), _) if self.completed == 0 => Heuristic::Rollback,
            (Some(_), _) => Heuristic::Mixed,
        };
        Err(self.into_error(kind))
    }

    pub(crate) fn rollback_result(self) -> FedResult<()> {
        let kind = match (&self.first, self.heuristic) {
            (None, _) => return Ok(()),
            (Some(_), Some(Heuristic::Mixed)) => Heuristic::Mixed,
            (Some(_), _) if self.heuristic_rollbacks == self.failures => Heuristic::Rollback,
            (Some(_), _) if self.heuristic_commits == self.failures => {
                if self.completed == 0 {
                    Heuristic::Commit
                } else {
                    Heuristic::Mixed
                }
            }
            (Some(_), _) => Heuristic::Hazard,
        };
        Err(self.into_error(kind))
    }

    fn into_error(self, kind: Heuristic) -> FedError {
        let message = format!("{} completed heuristically", self.operation);
        match self.first {
            Some(first) if first.heuristic() == Some(kind) => first,
            Some(first) => {
                FedError::new_with_cause(&message, ErrorKind::Xa(XaCode::Heuristic(kind)), first)
            }
            None => FedError::xa(&message, XaCode::Heuristic(kind)),
        }
    }
}
