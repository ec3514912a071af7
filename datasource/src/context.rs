//! Cancellation and deadlines threaded through every datasource read.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::{DatasourceError, DatasourceResult};

/// Read context carrying a cancellation signal and an optional deadline.
///
/// Contexts are cheap to clone; clones share the same cancellation state.
/// Derived contexts ([`Context::child`], [`Context::with_timeout`]) are
/// cancelled when their parent is, but cancelling a child leaves the parent
/// untouched.
///
/// # Examples
///
/// ```
/// use datasource::Context;
///
/// let ctx = Context::background();
/// let child = ctx.child();
/// ctx.cancel();
/// assert!(child.check().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that is cancelled along with `self`.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a context that expires at `deadline` or at the parent's
    /// deadline, whichever comes first.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let earliest = self.deadline.map_or(deadline, |own| own.min(deadline));
        Self {
            token: self.token.child_token(),
            deadline: Some(earliest),
        }
    }

    /// Derive a context that expires after `timeout`.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Cancel this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether [`Context::cancel`] was called on this context or a parent.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Deadline after which reads should stop, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail when the context is cancelled or past its deadline.
    ///
    /// # Errors
    ///
    /// Returns [`DatasourceError::Cancelled`] or
    /// [`DatasourceError::DeadlineExceeded`].
    pub fn check(&self) -> DatasourceResult<()> {
        if self.is_cancelled() {
            return Err(Arc::new(DatasourceError::Cancelled));
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Err(Arc::new(DatasourceError::DeadlineExceeded))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use rstest::rstest;

    use super::Context;
    use crate::DatasourceError;

    #[rstest]
    fn background_context_is_live() {
        assert!(Context::background().check().is_ok());
    }

    #[rstest]
    fn cancelling_child_leaves_parent_live() {
        let parent = Context::background();
        let child = parent.child();
        child.cancel();
        assert!(parent.check().is_ok());
        assert!(matches!(
            child.check().map_err(|e| e.is_context_error()),
            Err(true)
        ));
    }

    #[rstest]
    fn expired_deadline_is_reported() {
        let ctx = Context::background().with_timeout(Duration::ZERO);
        let err = ctx.check().expect_err("deadline should have passed");
        assert!(matches!(*err, DatasourceError::DeadlineExceeded));
    }

    #[rstest]
    fn earlier_parent_deadline_wins() {
        let soon = Instant::now() + Duration::from_secs(1);
        let later = soon + Duration::from_secs(60);
        let ctx = Context::background().with_deadline(soon).with_deadline(later);
        assert_eq!(ctx.deadline(), Some(soon));
    }
}
