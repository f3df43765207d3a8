//! Type-indexed handler registry.
//!
//! One table for request handlers (at most one per type), one for
//! notification handlers (an ordered list per type), and the composed
//! middleware chain. O(1) lookup by [`TypeKey`].
//!
//! # Configure, then serve
//!
//! Every table sits behind a read/write lock, so concurrent dispatches are
//! safe with each other and a registration never observes a half-written
//! table. Registering while dispatches are in flight is still a usage error:
//! a dispatch racing a registration may or may not see it. Finish
//! registration before serving traffic, or use
//! [`MediatorBuilder`](crate::MediatorBuilder), which makes that ordering
//! impossible to get wrong. Lock guards are never held across an `.await`.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::Error;
use crate::handler::{BoxedNotificationHandler, NotificationHandler, RequestHandler};
use crate::key::TypeKey;
use crate::middleware::chain::Chain;
use crate::middleware::{Behavior, Next};
use crate::request::{Notification, Request};

/// Shared handler and middleware tables.
///
/// Usually built once at startup and handed to a [`Mediator`](crate::Mediator)
/// inside an `Arc`. Every method takes `&self`.
#[derive(Default)]
pub struct Registry {
    requests: RwLock<HashMap<TypeKey, Next>>,
    notifications: RwLock<HashMap<TypeKey, Vec<BoxedNotificationHandler>>>,
    chain: RwLock<Chain>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Registration ─────────────────────────────────────────────────────────

    /// Registers the handler for request type `R`.
    ///
    /// Fails with [`Error::DuplicateHandler`] if `R` already has one; the
    /// existing handler stays in place.
    ///
    /// ```rust
    /// use courier::{Context, Registry, Request};
    ///
    /// struct Ping;
    /// impl Request for Ping { type Response = &'static str; }
    ///
    /// async fn ping(_ctx: Context, _req: Ping) -> anyhow::Result<&'static str> {
    ///     Ok("pong")
    /// }
    ///
    /// let registry = Registry::new();
    /// registry.register_request_handler(ping).unwrap();
    /// assert!(registry.register_request_handler(ping).is_err());
    /// ```
    pub fn register_request_handler<R, H>(&self, handler: H) -> Result<(), Error>
    where
        R: Request,
        H: RequestHandler<R>,
    {
        let key = TypeKey::of::<R>();
        let mut requests = self.requests.write();
        if requests.contains_key(&key) {
            return Err(Error::DuplicateHandler { request: key.name() });
        }
        requests.insert(key, handler.into_stage());
        debug!(request = key.name(), "request handler registered");
        Ok(())
    }

    /// Appends a handler to the list for notification type `N`.
    pub fn register_notification_handler<N, H>(&self, handler: H) -> Result<(), Error>
    where
        N: Notification,
        H: NotificationHandler<N>,
    {
        let key = TypeKey::of::<N>();
        let mut notifications = self.notifications.write();
        let handlers = notifications.entry(key).or_default();
        handlers.push(handler.into_erased());
        debug!(notification = key.name(), handlers = handlers.len(), "notification handler registered");
        Ok(())
    }

    /// Appends several handlers for `N`, in the order given.
    ///
    /// Fails with [`Error::EmptyHandlerList`] when `handlers` is empty. The
    /// handlers are registered one by one with no rollback: if a later one
    /// fails, the earlier ones stay registered.
    pub fn register_notification_handlers<N, H, I>(&self, handlers: I) -> Result<(), Error>
    where
        N: Notification,
        H: NotificationHandler<N>,
        I: IntoIterator<Item = H>,
    {
        let mut handlers = handlers.into_iter().peekable();
        if handlers.peek().is_none() {
            return Err(Error::EmptyHandlerList { notification: TypeKey::of::<N>().name() });
        }
        for handler in handlers {
            self.register_notification_handler(handler)?;
        }
        Ok(())
    }

    /// Adds a layer of middleware outside everything registered so far.
    /// Within `behaviors`, the first one is outermost.
    pub fn register_middleware<I>(&self, behaviors: I)
    where
        I: IntoIterator<Item = Behavior>,
    {
        let behaviors: Vec<Behavior> = behaviors.into_iter().collect();
        debug!(behaviors = behaviors.len(), "middleware layer registered");
        self.chain.write().push(behaviors);
    }

    // ── Resolution ───────────────────────────────────────────────────────────

    /// The handler registered for `key`, already erased to a pipeline stage.
    pub fn resolve_request_handler(&self, key: TypeKey) -> Result<Next, Error> {
        self.requests
            .read()
            .get(&key)
            .cloned()
            .ok_or(Error::NoHandlerFound { request: key.name() })
    }

    /// The handlers registered for `key`, in registration order. Empty when
    /// none are registered.
    pub fn resolve_notification_handlers(&self, key: TypeKey) -> Vec<BoxedNotificationHandler> {
        self.notifications.read().get(&key).cloned().unwrap_or_default()
    }

    /// Wraps `terminal` in the registered middleware. Returns `terminal`
    /// itself when no middleware is registered.
    pub fn build_pipeline(&self, terminal: Next) -> Next {
        self.chain.read().build(terminal)
    }

    pub fn has_request_handler<R: Request>(&self) -> bool {
        self.requests.read().contains_key(&TypeKey::of::<R>())
    }

    pub fn notification_handler_count<N: Notification>(&self) -> usize {
        self.notifications.read().get(&TypeKey::of::<N>()).map_or(0, Vec::len)
    }

    pub fn has_middleware(&self) -> bool {
        !self.chain.read().is_empty()
    }

    // ── Maintenance ──────────────────────────────────────────────────────────

    /// Clears requests, notifications, and middleware.
    ///
    /// Meant for test teardown. Takes all three write locks before clearing, so
    /// a concurrent dispatch sees either the old state or the empty one.
    pub fn reset(&self) {
        let mut requests = self.requests.write();
        let mut notifications = self.notifications.write();
        let mut chain = self.chain.write();
        requests.clear();
        notifications.clear();
        *chain = Chain::default();
        debug!("registry reset");
    }

    pub fn reset_requests(&self) {
        self.requests.write().clear();
        debug!("request registrations reset");
    }

    pub fn reset_notifications(&self) {
        self.notifications.write().clear();
        debug!("notification registrations reset");
    }

    pub fn reset_middleware(&self) {
        *self.chain.write() = Chain::default();
        debug!("middleware reset");
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("requests", &self.requests.read().keys().collect::<Vec<_>>())
            .field("notifications", &self.notifications.read().keys().collect::<Vec<_>>())
            .field("middleware", &self.has_middleware())
            .finish()
    }
}
