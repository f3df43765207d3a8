//! Unified error type.

use thiserror::Error;

/// The error type returned by courier's fallible operations.
///
/// Business errors raised by handlers are *not* wrapped in this type: they
/// travel as [`anyhow::Error`] and reach the caller of
/// [`Mediator::send`](crate::Mediator::send) exactly as the handler produced
/// them. `Error` covers the dispatcher's own failures: registration conflicts,
/// missing handlers, and fan-out failures during publish.
#[derive(Debug, Error)]
pub enum Error {
    /// A second request handler was registered for the same request type.
    #[error("a handler is already registered for request `{request}`")]
    DuplicateHandler { request: &'static str },

    /// `register_notification_handlers` was called with no handlers.
    #[error("no handlers provided for notification `{notification}`")]
    EmptyHandlerList { notification: &'static str },

    /// No handler is registered for the request type being sent.
    #[error("no handler for request `{request}`")]
    NoHandlerFound { request: &'static str },

    /// A value flowing through the pipeline did not have the type the
    /// registered contract promised. This is a defect, not a user error: a
    /// middleware replaced the envelope with a value of another type, or the
    /// registry is inconsistent.
    #[error("handler type mismatch: expected `{expected}`, found `{found}`")]
    HandlerTypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The first failing notification handler during a publish. Handlers
    /// registered after it were not invoked.
    #[error("error handling notification `{notification}`: {source}")]
    NotificationHandlerFailure {
        notification: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The [`Context`](crate::Context) was cancelled.
    #[error("context cancelled")]
    Cancelled,

    /// The [`Context`](crate::Context) deadline elapsed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

impl Error {
    /// Returns `true` for failures that indicate a bug rather than a usage
    /// error the caller can recover from.
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::HandlerTypeMismatch { .. })
    }

    pub(crate) fn mismatch<T: 'static>(found: &'static str) -> Self {
        Self::HandlerTypeMismatch {
            expected: std::any::type_name::<T>(),
            found,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_type() {
        let err = Error::NoHandlerFound { request: "app::GetUser" };
        assert_eq!(err.to_string(), "no handler for request `app::GetUser`");
    }

    #[test]
    fn test_notification_failure_keeps_source() {
        let err = Error::NotificationHandlerFailure {
            notification: "app::UserCreated",
            source: anyhow::anyhow!("smtp down"),
        };

        assert!(err.to_string().contains("smtp down"));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "smtp down");
    }

    #[test]
    fn test_only_mismatch_is_a_defect() {
        assert!(Error::mismatch::<u32>("alloc::string::String").is_defect());
        assert!(!Error::Cancelled.is_defect());
        assert!(!Error::DuplicateHandler { request: "x" }.is_defect());
    }
}
