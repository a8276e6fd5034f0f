//! Per-call and per-pass results

use crate::error::{AggregateError, CleanupError};

/// Count of targeted instances plus the failure, if any, of one executor call
///
/// A failed call may still carry a partial count: bulk operations keep going
/// after a per-instance failure.
#[derive(Debug, Default)]
pub struct Outcome {
    pub count: usize,
    pub error: Option<CleanupError>,
}

impl Outcome {
    /// Successful call targeting `count` instances
    pub fn ok(count: usize) -> Self {
        Self { count, error: None }
    }

    /// Failed call that targeted nothing
    pub fn failed(error: CleanupError) -> Self {
        Self {
            count: 0,
            error: Some(error),
        }
    }

    /// Partial count together with the collected failures
    pub fn partial(count: usize, errors: AggregateError) -> Self {
        Self {
            count,
            error: errors.into_error(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Wrap the failure, if any, with the interrupted operation
    pub fn context(mut self, context: impl FnOnce() -> String) -> Self {
        self.error = self.error.map(|e| e.with_context(context()));
        self
    }
}

/// Outcome of one orchestration pass
#[derive(Debug, Default)]
pub struct CleanupResult {
    /// Instances targeted across every item, dry-run included
    pub count: usize,
    /// Item failures, in item order
    pub errors: AggregateError,
}

impl CleanupResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add one executor outcome to the running totals
    pub fn record(&mut self, outcome: Outcome) {
        self.count += outcome.count;
        if let Some(error) = outcome.error {
            self.errors.push(error);
        }
    }

    /// The count, and one error joining every failure when there was any
    pub fn into_parts(self) -> (usize, Option<CleanupError>) {
        let error = if self.errors.is_empty() {
            None
        } else {
            Some(CleanupError::Aggregate(self.errors))
        };
        (self.count, error)
    }
}
