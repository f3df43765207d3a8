//! Middleware ordering and behavior through the public API.

use std::sync::Arc;
use std::time::Duration;

use courier::middleware::{self, Behavior, Next};
use courier::{Context, Error, Mediator, Registry, Request};
use parking_lot::Mutex;

type Log = Arc<Mutex<Vec<String>>>;

struct Record;

impl Request for Record {
    type Response = ();
}

/// A behavior that appends `<tag>-pre` before calling next and `<tag>-post`
/// after it returns.
fn tag(name: &'static str, log: &Log) -> Behavior {
    let log = Arc::clone(log);
    Behavior::new(move |next: Next| {
        let log = Arc::clone(&log);
        Next::new(move |ctx, req| {
            let next = next.clone();
            let log = Arc::clone(&log);
            async move {
                log.lock().push(format!("{name}-pre"));
                let res = next.run(ctx, req).await;
                log.lock().push(format!("{name}-post"));
                res
            }
        })
    })
}

fn registry_with_handler(log: &Log) -> Arc<Registry> {
    let registry = Arc::new(Registry::new());
    let log = Arc::clone(log);
    registry
        .register_request_handler(move |_ctx: Context, _req: Record| {
            log.lock().push("H".to_owned());
            async { Ok::<_, anyhow::Error>(()) }
        })
        .unwrap();
    registry
}

async fn send_and_collect(registry: Arc<Registry>, log: &Log) -> Vec<String> {
    Mediator::new(registry).send(&Context::background(), Record).await.unwrap();
    log.lock().clone()
}

#[tokio::test]
async fn test_single_call_first_listed_is_outermost() {
    let log = Log::default();
    let registry = registry_with_handler(&log);
    registry.register_middleware([tag("A", &log), tag("B", &log)]);

    assert_eq!(
        send_and_collect(registry, &log).await,
        ["A-pre", "B-pre", "H", "B-post", "A-post"],
    );
}

#[tokio::test]
async fn test_later_call_wraps_outside_earlier_call() {
    let log = Log::default();
    let registry = registry_with_handler(&log);
    registry.register_middleware([tag("A", &log)]);
    registry.register_middleware([tag("B", &log)]);

    assert_eq!(
        send_and_collect(registry, &log).await,
        ["B-pre", "A-pre", "H", "A-post", "B-post"],
    );
}

#[tokio::test]
async fn test_builder_applies_same_ordering() {
    let log = Log::default();
    let handler_log = Arc::clone(&log);
    let mediator = Mediator::builder()
        .middleware([tag("A", &log), tag("B", &log)])
        .middleware([tag("C", &log)])
        .request_handler(move |_ctx: Context, _req: Record| {
            handler_log.lock().push("H".to_owned());
            async { Ok::<_, anyhow::Error>(()) }
        })
        .unwrap()
        .build();

    mediator.send(&Context::background(), Record).await.unwrap();
    assert_eq!(
        *log.lock(),
        ["C-pre", "A-pre", "B-pre", "H", "B-post", "A-post", "C-post"],
    );
}

#[tokio::test]
async fn test_behavior_can_short_circuit() {
    let log = Log::default();
    let registry = registry_with_handler(&log);
    let deny = Behavior::new(|_next: Next| {
        Next::new(|_ctx, _req| async { Err(anyhow::anyhow!("denied")) })
    });
    registry.register_middleware([tag("A", &log), deny]);

    let err = Mediator::new(registry).send(&Context::background(), Record).await.unwrap_err();
    assert_eq!(err.to_string(), "denied");
    assert_eq!(*log.lock(), ["A-pre", "A-post"]);
}

#[tokio::test]
async fn test_behavior_can_rewrite_request_and_translate_error() {
    struct Divide(i32, i32);
    impl Request for Divide {
        type Response = i32;
    }

    async fn divide(_ctx: Context, req: Divide) -> anyhow::Result<i32> {
        anyhow::ensure!(req.1 != 0, "division by zero");
        Ok(req.0 / req.1)
    }

    // Doubles the dividend on the way in, and turns handler failures into a
    // friendlier error on the way out.
    let adjust = Behavior::new(|next: Next| {
        Next::new(move |ctx, mut req| {
            let next = next.clone();
            async move {
                if let Some(div) = req.downcast_mut::<Divide>() {
                    div.0 *= 2;
                }
                next.run(ctx, req)
                    .await
                    .map_err(|e| anyhow::anyhow!("could not divide: {e}"))
            }
        })
    });

    let mediator = Mediator::builder()
        .middleware([adjust])
        .request_handler(divide)
        .unwrap()
        .build();

    let ctx = Context::background();
    assert_eq!(mediator.send(&ctx, Divide(10, 5)).await.unwrap(), 4);

    let err = mediator.send(&ctx, Divide(1, 0)).await.unwrap_err();
    assert_eq!(err.to_string(), "could not divide: division by zero");
}

#[tokio::test]
async fn test_request_swap_is_a_defect() {
    let log = Log::default();
    let registry = registry_with_handler(&log);
    let swap = Behavior::new(|next: Next| {
        Next::new(move |ctx, _req| next.run(ctx, courier::Envelope::new(17u8)))
    });
    registry.register_middleware([swap]);

    let err = Mediator::new(registry).send(&Context::background(), Record).await.unwrap_err();
    let err = err.downcast_ref::<Error>().unwrap();
    assert!(err.is_defect());
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn test_cancellation_behavior_rejects_expired_context() {
    struct Sleepy;
    impl Request for Sleepy {
        type Response = ();
    }

    async fn sleepy(_ctx: Context, _req: Sleepy) -> anyhow::Result<()> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }

    let mediator = Mediator::builder()
        .middleware([middleware::cancellation(), middleware::trace()])
        .request_handler(sleepy)
        .unwrap()
        .build();

    let ctx = Context::background().with_timeout(Duration::from_millis(20));
    let err = mediator.send(&ctx, Sleepy).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::DeadlineExceeded)));
}

#[tokio::test]
async fn test_without_cancellation_behavior_deadline_is_advisory() {
    struct Quick;
    impl Request for Quick {
        type Response = bool;
    }

    async fn quick(ctx: Context, _req: Quick) -> anyhow::Result<bool> {
        Ok(ctx.check().is_err())
    }

    let mediator = Mediator::builder().request_handler(quick).unwrap().build();

    let ctx = Context::background();
    ctx.cancel();
    // The dispatcher forwards the dead context; the handler decides.
    assert!(mediator.send(&ctx, Quick).await.unwrap());
}
