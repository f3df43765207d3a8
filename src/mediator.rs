//! Request dispatch and notification fan-out.

use std::sync::Arc;

use tracing::trace;

use crate::context::Context;
use crate::envelope::Envelope;
use crate::error::Error;
use crate::handler::{NotificationHandler, RequestHandler};
use crate::key::TypeKey;
use crate::middleware::Behavior;
use crate::registry::Registry;
use crate::request::{Notification, Request};

/// The dispatcher.
///
/// A cheap handle around a shared [`Registry`]: clone it into every task that
/// needs to send or publish. Build one with [`Mediator::builder`] to configure
/// everything up front, or wrap an existing registry with [`Mediator::new`].
#[derive(Clone, Debug)]
pub struct Mediator {
    registry: Arc<Registry>,
}

impl Mediator {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::default()
    }

    /// The shared registry, for maintenance such as resets in test teardown.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Sends `request` to the handler registered for `R`, through the
    /// middleware chain, and returns its response.
    ///
    /// Errors raised by the handler or a behavior come back exactly as they
    /// were raised. The dispatcher's own failures are [`Error`] values inside
    /// the returned `anyhow::Error`:
    ///
    /// - [`Error::NoHandlerFound`] when `R` has no handler;
    /// - [`Error::HandlerTypeMismatch`] when a behavior swapped the request or
    ///   response for a value of another type.
    ///
    /// ```rust
    /// # use courier::{Context, Error, Mediator, Request};
    /// struct Unknown;
    /// impl Request for Unknown { type Response = (); }
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let mediator = Mediator::builder().build();
    /// let err = mediator.send(&Context::background(), Unknown).await.unwrap_err();
    /// assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NoHandlerFound { .. })));
    /// # }
    /// ```
    pub async fn send<R: Request>(&self, ctx: &Context, request: R) -> anyhow::Result<R::Response> {
        let key = TypeKey::of::<R>();
        let handler = self.registry.resolve_request_handler(key)?;
        let pipeline = self.registry.build_pipeline(handler);

        trace!(request = key.name(), "dispatching request");
        let response = pipeline.run(ctx.clone(), Envelope::new(request)).await?;

        response
            .downcast::<R::Response>()
            .map_err(|other| Error::mismatch::<R::Response>(other.type_name()).into())
    }

    /// Publishes `notification` to every handler registered for `N`, in
    /// registration order.
    ///
    /// Fail-fast: the first handler error stops the fan-out, and the handlers
    /// after it are not invoked. The error comes back as
    /// [`Error::NotificationHandlerFailure`] with the handler's error as its
    /// source. Publishing with no handlers registered succeeds and does
    /// nothing. Middleware does not apply to notifications.
    pub async fn publish<N: Notification>(&self, ctx: &Context, notification: N) -> Result<(), Error> {
        let key = TypeKey::of::<N>();
        let handlers = self.registry.resolve_notification_handlers(key);

        trace!(notification = key.name(), handlers = handlers.len(), "publishing notification");
        for handler in handlers {
            handler
                .call(ctx.clone(), &notification, key.name())?
                .await
                .map_err(|source| Error::NotificationHandlerFailure { notification: key.name(), source })?;
        }
        Ok(())
    }
}

/// Collects handlers and middleware, then seals them into a [`Mediator`].
///
/// Nothing can dispatch until [`build`](MediatorBuilder::build) returns, so
/// every registration is visible to every dispatch.
///
/// ```rust
/// use courier::{Context, Mediator, Notification, Request, middleware};
///
/// struct Add(i64, i64);
/// impl Request for Add { type Response = i64; }
///
/// #[derive(Clone)]
/// struct Added(i64);
/// impl Notification for Added {}
///
/// async fn add(_ctx: Context, req: Add) -> anyhow::Result<i64> { Ok(req.0 + req.1) }
/// async fn log(_ctx: Context, event: Added) -> anyhow::Result<()> { println!("{}", event.0); Ok(()) }
///
/// let mediator = Mediator::builder()
///     .middleware([middleware::trace()])
///     .request_handler(add)?
///     .notification_handler(log)?
///     .build();
/// # Ok::<(), courier::Error>(())
/// ```
#[derive(Default)]
pub struct MediatorBuilder {
    registry: Registry,
}

impl MediatorBuilder {
    /// See [`Registry::register_request_handler`].
    pub fn request_handler<R, H>(self, handler: H) -> Result<Self, Error>
    where
        R: Request,
        H: RequestHandler<R>,
    {
        self.registry.register_request_handler(handler)?;
        Ok(self)
    }

    /// See [`Registry::register_notification_handler`].
    pub fn notification_handler<N, H>(self, handler: H) -> Result<Self, Error>
    where
        N: Notification,
        H: NotificationHandler<N>,
    {
        self.registry.register_notification_handler(handler)?;
        Ok(self)
    }

    /// See [`Registry::register_notification_handlers`].
    pub fn notification_handlers<N, H, I>(self, handlers: I) -> Result<Self, Error>
    where
        N: Notification,
        H: NotificationHandler<N>,
        I: IntoIterator<Item = H>,
    {
        self.registry.register_notification_handlers(handlers)?;
        Ok(self)
    }

    /// See [`Registry::register_middleware`].
    pub fn middleware<I>(self, behaviors: I) -> Self
    where
        I: IntoIterator<Item = Behavior>,
    {
        self.registry.register_middleware(behaviors);
        self
    }

    pub fn build(self) -> Mediator {
        Mediator::new(Arc::new(self.registry))
    }
}
