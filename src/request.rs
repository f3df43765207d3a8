//! Request and notification contracts.

/// A value dispatched to exactly one handler.
///
/// The associated [`Response`](Request::Response) fixes, at compile time,
/// what the handler produces and what [`Mediator::send`](crate::Mediator::send)
/// returns. A type has one impl, so it has one response type for the lifetime
/// of the process.
///
/// ```rust
/// use courier::Request;
///
/// struct GetUser { id: u64 }
/// struct User { id: u64, name: String }
///
/// impl Request for GetUser {
///     type Response = User;
/// }
/// ```
pub trait Request: Send + 'static {
    type Response: Send + 'static;
}

/// A value published to every handler registered for its type.
///
/// Each handler receives its own clone of the published value. Implement it
/// with an empty impl block:
///
/// ```rust
/// #[derive(Clone)]
/// struct UserCreated { id: u64 }
///
/// impl courier::Notification for UserCreated {}
/// ```
pub trait Notification: Clone + Send + Sync + 'static {}
