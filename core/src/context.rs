//! Per-call deadline and cancellation.
//!
//! A `Context` is threaded through every `Transport::execute` call. The
//! transport races the round trip against both signals and reports which one
//! won, so a timeout never looks like an ordinary network failure.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl Context {
    /// No deadline and a token nobody else holds.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            token: CancellationToken::new(),
        }
    }

    /// Bind an existing token, e.g. one shared with a shutdown handler.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            deadline: None,
            token,
        }
    }

    /// Derive a context that is cancelled with this one and whose deadline is
    /// the earlier of the two.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let own = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < own => parent,
            _ => own,
        };
        Self {
            deadline: Some(deadline),
            token: self.token.child_token(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the deadline passes; never resolves without one.
    pub(crate) async fn deadline_elapsed(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_has_no_deadline() {
        let ctx = Context::background();
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_cancelled());
    }

    #[tokio::test]
    async fn child_inherits_earlier_deadline() {
        let parent = Context::with_timeout(Duration::from_millis(5));
        let child = parent.child_with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[tokio::test]
    async fn child_keeps_own_earlier_deadline() {
        let parent = Context::with_timeout(Duration::from_secs(60));
        let child = parent.child_with_timeout(Duration::from_millis(5));
        assert!(child.deadline().unwrap() < parent.deadline().unwrap());
    }

    #[test]
    fn cancelling_parent_cancels_child() {
        let parent = Context::background();
        let child = parent.child_with_timeout(Duration::from_secs(1));
        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn cancelling_child_leaves_parent() {
        let parent = Context::background();
        let child = parent.child_with_timeout(Duration::from_secs(1));
        child.cancel();
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn elapsed_deadline_resolves() {
        let ctx = Context::with_deadline(Instant::now());
        ctx.deadline_elapsed().await;
    }
}
