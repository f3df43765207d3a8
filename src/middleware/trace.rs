use std::time::{Duration, Instant};

use tracing::{Instrument, debug, debug_span};

use super::{Behavior, Next, StageResult};
use crate::context::Context;
use crate::envelope::Envelope;

/// Per-request span with type name, outcome, and latency.
///
/// Opens a `dispatch` span around the rest of the chain, so events emitted by
/// inner behaviors and the handler are nested under it. Results pass through
/// unchanged.
pub fn trace() -> Behavior {
    Behavior::new(|next: Next| {
        Next::new(move |ctx, req: Envelope| {
            let span = debug_span!("dispatch", request = req.type_name());
            traced(next.clone(), ctx, req).instrument(span)
        })
    })
}

async fn traced(next: Next, ctx: Context, req: Envelope) -> StageResult {
    let started = Instant::now();
    let res = next.run(ctx, req).await;
    let elapsed_us = micros(started.elapsed());
    match &res {
        Ok(out) => debug!(elapsed_us, response = out.type_name(), "request handled"),
        Err(e) => debug!(elapsed_us, error = %e, "request failed"),
    }
    res
}

/// Saturates instead of truncating.
fn micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}
