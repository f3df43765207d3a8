use super::{Behavior, Next, StageResult};
use crate::context::Context;
use crate::envelope::Envelope;
use crate::error::Error;

/// Fails the request once its [`Context`] is done.
///
/// Checks the context before entering the rest of the chain, then races the
/// chain against [`Context::done`]. When the context wins, the inner future is
/// dropped and the caller gets [`Error::Cancelled`] or
/// [`Error::DeadlineExceeded`].
///
/// Install it outermost so no other behavior runs for a request that is
/// already dead.
pub fn cancellation() -> Behavior {
    Behavior::new(|next: Next| {
        Next::new(move |ctx, req| guarded(next.clone(), ctx, req))
    })
}

async fn guarded(next: Next, ctx: Context, req: Envelope) -> StageResult {
    ctx.check()?;
    let watch = ctx.clone();
    tokio::select! {
        res = next.run(ctx, req) => res,
        () = watch.done() => Err(watch.check().err().unwrap_or(Error::Cancelled).into()),
    }
}
