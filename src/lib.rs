//! # courier
//!
//! An in-process mediator for Rust services. Requests go to exactly one
//! handler through a middleware pipeline; notifications fan out to every
//! handler registered for their type.
//!
//! ## The contract
//!
//! courier routes values by their *type*. A request type declares its
//! response type once, at compile time, via [`Request`]; a notification type
//! opts in with [`Notification`]. There are no string keys and no runtime
//! reflection. Lookup is a `HashMap` probe on a [`TypeKey`].
//!
//! What courier intentionally leaves to the caller:
//!
//! - **Transport.** Put HTTP or gRPC in front of it if you need to.
//! - **Delivery guarantees.** No durability, no retries, no cross-process bus.
//! - **Cancellation policy.** The [`Context`] is forwarded to every stage; the
//!   dispatcher never times a call out on its own. Install
//!   [`middleware::cancellation`] if you want it to.
//!
//! ## Configure, then serve
//!
//! Register everything, then dispatch. [`Mediator::builder`] enforces that
//! ordering; a shared [`Registry`] allows late registration, but a dispatch
//! racing a registration may or may not observe it.
//!
//! ## Quick start
//!
//! ```rust
//! use courier::{Context, Mediator, Notification, Request, middleware};
//!
//! struct GetUser { id: u64 }
//! struct User { id: u64, name: String }
//! impl Request for GetUser { type Response = User; }
//!
//! #[derive(Clone)]
//! struct UserViewed { id: u64 }
//! impl Notification for UserViewed {}
//!
//! async fn get_user(_ctx: Context, req: GetUser) -> anyhow::Result<User> {
//!     Ok(User { id: req.id, name: "alice".into() })
//! }
//!
//! async fn count_view(_ctx: Context, event: UserViewed) -> anyhow::Result<()> {
//!     println!("user {} viewed", event.id);
//!     Ok(())
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let mediator = Mediator::builder()
//!     .middleware([middleware::trace()])
//!     .request_handler(get_user)?
//!     .notification_handler(count_view)?
//!     .build();
//!
//! let ctx = Context::background();
//! let user = mediator.send(&ctx, GetUser { id: 42 }).await?;
//! mediator.publish(&ctx, UserViewed { id: user.id }).await?;
//! assert_eq!(user.name, "alice");
//! # Ok(())
//! # }
//! ```

mod context;
mod envelope;
mod error;
mod handler;
mod key;
mod mediator;
mod registry;
mod request;

pub mod middleware;

pub use context::Context;
pub use envelope::Envelope;
pub use error::Error;
pub use handler::{NotificationHandler, RequestHandler};
pub use key::TypeKey;
pub use mediator::{Mediator, MediatorBuilder};
pub use registry::Registry;
pub use request::{Notification, Request};
