//! Handler traits and type erasure.
//!
//! # How typed handlers are stored
//!
//! The registry holds handlers for *different* request types in a single
//! `HashMap<TypeKey, Next>`. Rust collections can only hold one concrete type,
//! so each typed handler is wrapped once, at registration, in an adapter that
//! speaks the pipeline's erased shape and stored as a trait object.
//!
//! The chain from user code to vtable call is:
//!
//! ```text
//! async fn get_user(ctx: Context, req: GetUser) -> anyhow::Result<User>   ← user writes this
//!        ↓ registry.register_request_handler(get_user)
//! get_user.into_stage()                               ← RequestHandler blanket impl
//!        ↓
//! Next(Arc::new(TypedHandler(get_user)))              ← erased pipeline stage
//!        ↓  stored under TypeKey::of::<GetUser>()
//! stage.run(ctx, Envelope)  at dispatch time          ← one vtable dispatch
//!        ↓
//! Envelope → GetUser, call, User → Envelope           ← checked unwrap + rebox
//! ```
//!
//! Notification handlers follow the same pattern with their own erased trait,
//! since they are never wrapped by middleware.

use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::context::Context;
use crate::envelope::Envelope;
use crate::error::Error;
use crate::middleware::{BoxFuture, ErasedStage, Next, StageResult};
use crate::request::{Notification, Request};

// ── Public handler traits ─────────────────────────────────────────────────────

/// Implemented for every valid request handler for `R`.
///
/// You never implement this yourself. It is automatically satisfied for any
/// function or closure with the signature:
///
/// ```text
/// async fn name(ctx: Context, req: R) -> anyhow::Result<R::Response>
/// ```
///
/// The trait is **sealed** (via a private supertrait): only the blanket
/// impl below can satisfy it.
pub trait RequestHandler<R: Request>: private::SealedRequest<R> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_stage(self) -> Next;
}

/// Implemented for every valid notification handler for `N`.
///
/// Satisfied by any function or closure with the signature:
///
/// ```text
/// async fn name(ctx: Context, event: N) -> anyhow::Result<()>
/// ```
pub trait NotificationHandler<N: Notification>:
    private::SealedNotification<N> + Send + Sync + 'static
{
    #[doc(hidden)]
    fn into_erased(self) -> BoxedNotificationHandler;
}

/// The sealing module. External crates cannot name these traits and
/// therefore cannot implement the handler traits on their own types.
mod private {
    pub trait SealedRequest<R> {}
    pub trait SealedNotification<N> {}
}

// ── Request side ──────────────────────────────────────────────────────────────

impl<F, Fut, R> private::SealedRequest<R> for F
where
    R: Request,
    F: Fn(Context, R) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R::Response>> + Send + 'static,
{
}

impl<F, Fut, R> RequestHandler<R> for F
where
    R: Request,
    F: Fn(Context, R) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R::Response>> + Send + 'static,
{
    fn into_stage(self) -> Next {
        Next::from_erased(Arc::new(TypedHandler { handler: self, _request: PhantomData }))
    }
}

/// Newtype wrapper that holds a handler for `R` and implements
/// [`ErasedStage`], bridging the typed world to the envelope world.
///
/// `PhantomData<fn(R)>` keeps the adapter `Send + Sync` whatever `R` is.
struct TypedHandler<F, R> {
    handler: F,
    _request: PhantomData<fn(R)>,
}

impl<F, Fut, R> ErasedStage for TypedHandler<F, R>
where
    R: Request,
    F: Fn(Context, R) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R::Response>> + Send + 'static,
{
    fn call(&self, ctx: Context, req: Envelope) -> BoxFuture<StageResult> {
        let req = match req.downcast::<R>() {
            Ok(req) => req,
            Err(other) => {
                let err = anyhow::Error::from(Error::mismatch::<R>(other.type_name()));
                return Box::pin(async move { StageResult::Err(err) });
            }
        };

        let fut = (self.handler)(ctx, req);
        Box::pin(async move { fut.await.map(Envelope::new) })
    }
}

// ── Notification side ─────────────────────────────────────────────────────────

/// Type-erased notification handler. The notification is borrowed as `dyn
/// Any` and cloned into the handler once its type has been checked.
/// `type_name` names the published value and is only used to report a
/// mismatch.
#[doc(hidden)]
pub trait ErasedNotificationHandler: Send + Sync + 'static {
    fn call(
        &self,
        ctx: Context,
        notification: &(dyn Any + Send + Sync),
        type_name: &'static str,
    ) -> Result<BoxFuture<anyhow::Result<()>>, Error>;
}

#[doc(hidden)]
pub type BoxedNotificationHandler = Arc<dyn ErasedNotificationHandler>;

impl<F, Fut, N> private::SealedNotification<N> for F
where
    N: Notification,
    F: Fn(Context, N) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
}

impl<F, Fut, N> NotificationHandler<N> for F
where
    N: Notification,
    F: Fn(Context, N) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn into_erased(self) -> BoxedNotificationHandler {
        Arc::new(TypedNotificationHandler { handler: self, _event: PhantomData })
    }
}

struct TypedNotificationHandler<F, N> {
    handler: F,
    _event: PhantomData<fn(N)>,
}

impl<F, Fut, N> ErasedNotificationHandler for TypedNotificationHandler<F, N>
where
    N: Notification,
    F: Fn(Context, N) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn call(
        &self,
        ctx: Context,
        notification: &(dyn Any + Send + Sync),
        type_name: &'static str,
    ) -> Result<BoxFuture<anyhow::Result<()>>, Error> {
        let event = notification
            .downcast_ref::<N>()
            .ok_or_else(|| Error::mismatch::<N>(type_name))?
            .clone();
        Ok(Box::pin((self.handler)(ctx, event)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Add(i32, i32);
    impl Request for Add {
        type Response = i32;
    }

    #[derive(Clone)]
    struct Tick;
    impl Notification for Tick {}

    async fn add(_ctx: Context, req: Add) -> anyhow::Result<i32> {
        Ok(req.0 + req.1)
    }

    #[tokio::test]
    async fn test_typed_handler_round_trip() {
        let stage = RequestHandler::<Add>::into_stage(add);
        let out = stage.run(Context::background(), Envelope::new(Add(2, 3))).await.unwrap();
        assert_eq!(out.downcast::<i32>().unwrap(), 5);
    }

    #[tokio::test]
    async fn test_wrong_request_type_is_mismatch() {
        let stage = RequestHandler::<Add>::into_stage(add);
        let err = stage.run(Context::background(), Envelope::new("nope")).await.unwrap_err();

        let err = err.downcast::<Error>().unwrap();
        assert!(err.is_defect());
        assert!(err.to_string().contains("&str"));
    }

    #[tokio::test]
    async fn test_closure_handler() {
        let offset = 10;
        let stage = RequestHandler::<Add>::into_stage(move |_ctx: Context, req: Add| async move {
            Ok::<_, anyhow::Error>(req.0 + req.1 + offset)
        });
        let out = stage.run(Context::background(), Envelope::new(Add(1, 1))).await.unwrap();
        assert_eq!(out.downcast::<i32>().unwrap(), 12);
    }

    #[tokio::test]
    async fn test_notification_handler_checks_type() {
        let handler = NotificationHandler::<Tick>::into_erased(|_ctx: Context, _tick: Tick| async {
            Ok::<_, anyhow::Error>(())
        });

        let fut = handler.call(Context::background(), &Tick, "Tick").unwrap();
        assert!(fut.await.is_ok());

        let err = handler.call(Context::background(), &7u32, "u32").err().unwrap();
        assert!(err.is_defect());
        assert!(matches!(err, Error::HandlerTypeMismatch { found: "u32", .. }));
    }
}
