//! Middleware layer.
//!
//! Middleware intercepts every `send` and is the right place for
//! cross-cutting concerns: structured tracing, metrics, validation,
//! authorisation, and deadline enforcement.
//!
//! # Shape
//!
//! A pipeline stage is a [`Next`]: an async function from
//! `(Context, Envelope)` to `anyhow::Result<Envelope>`. A [`Behavior`] turns
//! one stage into another by wrapping it. Each behavior may inspect or
//! rewrite the request before calling `next`, and inspect or rewrite the
//! result (or error) afterwards:
//!
//! ```text
//!   A-pre → B-pre → handler → B-post → A-post
//! ```
//!
//! ```rust
//! use courier::middleware::{Behavior, Next};
//!
//! let audit = Behavior::new(|next: Next| {
//!     Next::new(move |ctx, req| {
//!         let next = next.clone();
//!         async move {
//!             let name = req.type_name();
//!             let res = next.run(ctx, req).await;
//!             if res.is_err() {
//!                 eprintln!("{name} failed");
//!             }
//!             res
//!         }
//!     })
//! });
//! ```
//!
//! # Ordering
//!
//! Within one `register_middleware` call the first behavior listed is the
//! outermost. A later `register_middleware` call wraps outside everything
//! registered before it.
//!
//! Built-in behaviors:
//! - [`trace`]: per-request span with type name, outcome, and latency
//! - [`cancellation`]: fails fast once the [`Context`] is cancelled or past
//!   its deadline

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::envelope::Envelope;

mod cancellation;
pub(crate) mod chain;
mod trace;

pub use cancellation::cancellation;
pub use trace::trace;

/// A heap-allocated, type-erased future, as returned by every pipeline stage.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// What a pipeline stage resolves to.
pub type StageResult = anyhow::Result<Envelope>;

// ── Stage ─────────────────────────────────────────────────────────────────────

/// Internal dispatch interface shared by closures and typed handlers.
pub(crate) trait ErasedStage: Send + Sync + 'static {
    fn call(&self, ctx: Context, req: Envelope) -> BoxFuture<StageResult>;
}

/// One stage of the pipeline: either the terminal handler or a behavior
/// wrapped around the stages inside it.
///
/// Cloning is one atomic increment.
#[derive(Clone)]
pub struct Next(Arc<dyn ErasedStage>);

impl Next {
    /// Builds a stage from an async closure.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Context, Envelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StageResult> + Send + 'static,
    {
        Self(Arc::new(FnStage(f)))
    }

    pub(crate) fn from_erased(stage: Arc<dyn ErasedStage>) -> Self {
        Self(stage)
    }

    /// Runs this stage and everything inside it.
    pub fn run(&self, ctx: Context, req: Envelope) -> BoxFuture<StageResult> {
        self.0.call(ctx, req)
    }
}

struct FnStage<F>(F);

impl<F, Fut> ErasedStage for FnStage<F>
where
    F: Fn(Context, Envelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StageResult> + Send + 'static,
{
    fn call(&self, ctx: Context, req: Envelope) -> BoxFuture<StageResult> {
        Box::pin((self.0)(ctx, req))
    }
}

// ── Behavior ──────────────────────────────────────────────────────────────────

/// A wrapping function from the next stage to a new stage.
#[derive(Clone)]
pub struct Behavior(Arc<dyn Fn(Next) -> Next + Send + Sync + 'static>);

impl Behavior {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Next) -> Next + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Wraps `next`, returning the stage that now sits outside it.
    pub fn wrap(&self, next: Next) -> Next {
        (self.0)(next)
    }
}

impl std::fmt::Debug for Behavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Behavior")
    }
}
