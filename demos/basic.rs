//! Minimal courier example: a couple of requests, a notification with two
//! subscribers, and the built-in middleware.
//!
//! Run with:
//!   cargo run --example basic

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use courier::{Context, Mediator, Notification, Request, middleware};
use parking_lot::RwLock;

type Users = Arc<RwLock<HashMap<u64, String>>>;

// CreateUser → u64 (the new id)
struct CreateUser {
    name: String,
}

impl Request for CreateUser {
    type Response = u64;
}

// GetUser → Option<String>
struct GetUser {
    id: u64,
}

impl Request for GetUser {
    type Response = Option<String>;
}

#[derive(Clone)]
struct UserCreated {
    id: u64,
    name: String,
}

impl Notification for UserCreated {}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let users = Users::default();

    let mediator = Mediator::builder()
        .middleware([middleware::cancellation(), middleware::trace()])
        .request_handler({
            let users = Arc::clone(&users);
            move |_ctx: Context, req: CreateUser| {
                let users = Arc::clone(&users);
                async move {
                    let mut users = users.write();
                    let id = users.len() as u64 + 1;
                    users.insert(id, req.name);
                    Ok::<_, anyhow::Error>(id)
                }
            }
        })?
        .request_handler({
            let users = Arc::clone(&users);
            move |_ctx: Context, req: GetUser| {
                let users = Arc::clone(&users);
                async move { Ok::<_, anyhow::Error>(users.read().get(&req.id).cloned()) }
            }
        })?
        .notification_handler(send_welcome_mail)?
        .notification_handler(update_directory)?
        .build();

    let ctx = Context::background().with_timeout(Duration::from_secs(5));

    let id = mediator.send(&ctx, CreateUser { name: "alice".into() }).await?;
    mediator.publish(&ctx, UserCreated { id, name: "alice".into() }).await?;

    let name = mediator.send(&ctx, GetUser { id }).await?;
    println!("user {id} is {name:?}");

    let missing = mediator.send(&ctx, GetUser { id: 99 }).await?;
    println!("user 99 is {missing:?}");

    Ok(())
}

async fn send_welcome_mail(_ctx: Context, event: UserCreated) -> anyhow::Result<()> {
    tracing::info!(id = event.id, "welcome mail queued for {}", event.name);
    Ok(())
}

async fn update_directory(ctx: Context, event: UserCreated) -> anyhow::Result<()> {
    // Long-running subscribers should honour the caller's deadline.
    ctx.check()?;
    tracing::info!(id = event.id, "directory updated");
    Ok(())
}
