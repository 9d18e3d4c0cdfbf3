use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use rama::{error::BoxError, telemetry::tracing};
use tokio_util::sync::CancellationToken;

/// State shared by all worker sessions of a single run.
#[derive(Debug)]
pub(super) struct RunState {
    requests: AtomicU64,
    failed: AtomicBool,
    first_error: Mutex<Option<BoxError>>,
    cancel: CancellationToken,
}

impl RunState {
    pub(super) fn new(cancel: CancellationToken) -> Self {
        Self {
            requests: AtomicU64::new(0),
            failed: AtomicBool::new(false),
            first_error: Mutex::new(None),
            cancel,
        }
    }

    /// Spend one request of the global budget.
    ///
    /// Returns `false` when the budget is exhausted. A denied attempt still
    /// increments the counter, so the counter can end up above `max_requests`
    /// while the amount of performed requests never does.
    pub(super) fn try_spend_request(&self, max_requests: u64) -> bool {
        let n = self.requests.fetch_add(1, Ordering::AcqRel) + 1;
        n <= max_requests
    }

    /// Record `err` as the error of the run if no other error was recorded yet,
    /// and cancel the run. Returns `true` if `err` was the one recorded.
    pub(super) fn fail(&self, err: BoxError) -> bool {
        let first = self
            .failed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if first {
            tracing::debug!("record first error of run: {err}");
            *self.first_error.lock() = Some(err);
        }
        self.cancel.cancel();
        first
    }

    pub(super) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(super) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(super) fn take_error(&self) -> Option<BoxError> {
        self.first_error.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_budget_is_spent_first_come_first_served() {
        let state = RunState::new(CancellationToken::new());
        assert!(state.try_spend_request(2));
        assert!(state.try_spend_request(2));
        assert!(!state.try_spend_request(2));
        assert!(!state.try_spend_request(2));
        assert_eq!(state.requests.load(Ordering::Acquire), 4);
    }

    #[test]
    fn test_first_error_wins() {
        let parent = CancellationToken::new();
        let state = RunState::new(parent.child_token());

        assert!(state.fail(BoxError::from("first")));
        assert!(state.is_cancelled());
        assert!(!parent.is_cancelled());

        assert!(!state.fail(BoxError::from("second")));

        assert_eq!(state.take_error().unwrap().to_string(), "first");
        assert!(state.take_error().is_none());
    }

    #[test]
    fn test_concurrent_failures_record_exactly_one() {
        let state = Arc::new(RunState::new(CancellationToken::new()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let state = state.clone();
                std::thread::spawn(move || state.fail(BoxError::from(format!("error {i}"))))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|first| *first)
            .count();
        assert_eq!(winners, 1);
        assert!(state.take_error().is_some());
    }

    #[test]
    fn test_budget_under_contention_never_overspends() {
        let state = Arc::new(RunState::new(CancellationToken::new()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = state.clone();
                std::thread::spawn(move || (0..100).filter(|_| state.try_spend_request(250)).count())
            })
            .collect();

        let spent: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(spent, 250);
    }
}
