//! Per-call context: cancellation, deadline, and request-scoped values.
//!
//! A [`Context`] is handed to every middleware stage and handler of one
//! `send` or `publish` call. The dispatcher forwards it untouched; it never
//! checks the deadline or the cancellation flag itself. Handlers and
//! middleware that want to honour them call [`Context::check`] before
//! expensive work, or race their work against [`Context::done`]. The opt-in
//! [`middleware::cancellation`](crate::middleware::cancellation) behavior does
//! the latter for the whole chain.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::Error;

/// Cancellation, deadline, and typed values for one dispatch.
///
/// Cloning is cheap: the token and value map are reference counted. Deriving
/// methods (`with_*`, [`child`](Context::child)) return a new context and
/// leave the receiver unchanged.
#[derive(Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
    values: Arc<http::Extensions>,
}

impl Context {
    /// A context that is never cancelled, has no deadline and no values.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a context whose deadline is `timeout` from now, or the
    /// existing deadline if that one is earlier.
    ///
    /// A timeout too large to represent as an `Instant` never elapses, so the
    /// derived context keeps the receiver's deadline (or lack of one).
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    /// Derives a context with the given deadline, keeping the existing one if
    /// it is earlier.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        };
        Self { deadline: Some(deadline), ..self.clone() }
    }

    /// Derives a context carrying `value`. A value of the same type already
    /// present is shadowed in the new context only.
    pub fn with_value<T: Clone + Send + Sync + 'static>(&self, value: T) -> Self {
        let mut values = http::Extensions::clone(&self.values);
        values.insert(value);
        Self { values: Arc::new(values), ..self.clone() }
    }

    pub fn value<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values.get::<T>()
    }

    /// Derives a context that is cancelled when this one is, but can also be
    /// cancelled on its own without affecting this one.
    pub fn child(&self) -> Self {
        Self { token: self.token.child_token(), ..self.clone() }
    }

    /// Cancels this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// `Ok(())` while the context is live, otherwise the reason it is done.
    /// Cancellation takes precedence over an elapsed deadline.
    pub fn check(&self) -> Result<(), Error> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    /// Never resolves for a background context.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.token.cancelled() => {}
                    () = tokio::time::sleep_until(deadline.into()) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("cancelled", &self.token.is_cancelled())
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
