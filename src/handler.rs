//! Handler trait and type erasure.
//!
//! Middleware needs to hold handlers of *different* types behind one
//! interface, so every handler is erased into a [`BoxedHandler`]:
//!
//! ```text
//! async fn hello(req: Request) -> Response { … }   ← user writes this
//!        ↓ Trace::new(tracer).wrap(hello)
//! hello.into_boxed_handler()                       ← Handler blanket impl
//!        ↓
//! Arc::new(Typed(hello))                           ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req)  at request time               ← one vtable dispatch
//! ```
//!
//! Middleware wrappers are themselves [`ErasedHandler`]s, so layers stack by
//! wrapping one `BoxedHandler` in another.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::FutureExt;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// `Send + 'static` lets tokio move the future across worker threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Dispatch interface shared by plain handlers and middleware wrappers.
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid request handler.
///
/// You never implement this yourself. It is satisfied for any `async fn`
/// with the signature:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// and for an already-erased [`BoxedHandler`] wrapped in [`Erased`].
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(Typed(self))
    }
}

/// Passes an already-erased handler (usually another middleware) back into
/// an API that takes `impl Handler`.
///
/// ```rust,no_run
/// # use svckit::{Erased, Request, Response};
/// # use svckit::middleware::{Recover, Trace};
/// # use svckit::panic::Diagnostic;
/// # use svckit::tracer::NoopTracer;
/// # async fn app(_: Request) -> Response { Response::text("") }
/// let traced = Trace::new(NoopTracer).wrap(app);
/// let handler = Recover::new(Diagnostic::logging()).wrap(Erased(traced));
/// ```
pub struct Erased(pub BoxedHandler);

impl private::Sealed for Erased {}

impl Handler for Erased {
    fn into_boxed_handler(self) -> BoxedHandler {
        self.0
    }
}

/// A concrete handler behind the [`ErasedHandler`] vtable.
struct Typed<F>(F);

impl<F, Fut, R> ErasedHandler for Typed<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        (self.0)(req).map(IntoResponse::into_response).boxed()
    }
}
