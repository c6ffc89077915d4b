//! Panic recovery.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use http::StatusCode;

use crate::envelope::Envelope;
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler};
use crate::panic::{self, Diagnostic};
use crate::request::Request;
use crate::response::IntoResponse;

/// Catches a panicking handler and answers `500`.
///
/// The panic goes through [`Diagnostic::identify`] with `"{METHOD} {path}"`
/// as its label, and the response envelope carries the returned
/// `panic: <message>` text. Building the middleware installs the stack
/// capturing panic hook.
pub struct Recover {
    diagnostic: Arc<Diagnostic>,
}

impl Recover {
    pub fn new(diagnostic: Diagnostic) -> Self {
        panic::install_hook();
        Self { diagnostic: Arc::new(diagnostic) }
    }

    pub fn wrap(&self, handler: impl Handler) -> BoxedHandler {
        Arc::new(RecoverHandler {
            diagnostic: Arc::clone(&self.diagnostic),
            inner: handler.into_boxed_handler(),
        })
    }
}

struct RecoverHandler {
    diagnostic: Arc<Diagnostic>,
    inner: BoxedHandler,
}

impl ErasedHandler for RecoverHandler {
    fn call(&self, req: Request) -> BoxFuture {
        let label = format!("{} {}", req.method(), req.path());
        let diagnostic = Arc::clone(&self.diagnostic);
        let inner = Arc::clone(&self.inner);

        Box::pin(async move {
            let outcome = AssertUnwindSafe(async move { inner.call(req).await })
                .catch_unwind()
                .await;
            match outcome {
                Ok(res) => res,
                Err(payload) => {
                    let message = diagnostic.identify(&label, payload.as_ref());
                    Envelope::new(StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
                }
            }
        })
    }
}
