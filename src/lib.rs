//! # svckit
//!
//! Request plumbing for Rust HTTP services: a trace span per request, panic
//! recovery with a pointer to the offending source line, and the small
//! helpers every handler ends up needing.
//!
//! ## What it does
//!
//! - **Tracing**: [`middleware::Trace`] joins the caller's trace (or starts
//!   one), tags the span with the request body (credentials masked), headers,
//!   URL and method, and closes it exactly once, panics included.
//! - **Recovery**: [`middleware::Recover`] turns a panicking handler into a
//!   `500` envelope, finds the innermost application frame and raises an
//!   alert through a pluggable [`notify::Notifier`].
//! - **Helpers**: a JSON response [`Envelope`], input [`validate`]ion,
//!   disposable email [`domains`], and [`random`] identifiers.
//!
//! What it leaves to the application: the listener, routing, TLS. Plug the
//! result into any hyper accept loop with [`service::service`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use svckit::middleware::{Recover, Trace};
//! use svckit::panic::Diagnostic;
//! use svckit::tracer::NoopTracer;
//! use svckit::{Erased, Request, Response};
//!
//! async fn create_user(mut req: Request) -> Response {
//!     let body = req.bytes().await.unwrap_or_default();
//!     if body.is_empty() {
//!         return Response::status(http::StatusCode::BAD_REQUEST);
//!     }
//!     Response::builder()
//!         .status(http::StatusCode::CREATED)
//!         .json(body.to_vec())
//! }
//!
//! let traced = Trace::new(NoopTracer).wrap(create_user);
//! let handler = Recover::new(Diagnostic::logging()).wrap(Erased(traced));
//! let svc = svckit::service::service::<hyper::body::Incoming>(handler);
//! ```

mod context;
mod error;
mod handler;
mod request;
mod response;

pub mod body;
pub mod domains;
pub mod envelope;
pub mod middleware;
pub mod notify;
pub mod panic;
pub mod random;
pub mod redact;
pub mod service;
pub mod tracer;
pub mod validate;

pub use body::Body;
pub use context::{Context, TraceContext};
pub use envelope::Envelope;
pub use error::{BoxError, Error, ExtractError, NotifyError};
pub use handler::{BoxFuture, BoxedHandler, Erased, ErasedHandler, Handler};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
