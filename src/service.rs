//! Bridge from a [`BoxedHandler`] to hyper.
//!
//! svckit does not own the listener. Hand [`service`] to whatever accept
//! loop the application already runs:
//!
//! ```rust,ignore
//! let svc = svckit::service::service::<hyper::body::Incoming>(handler);
//! hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
//!     .serve_connection(TokioIo::new(stream), svc)
//!     .await?;
//! ```

use std::convert::Infallible;
use std::marker::PhantomData;

use bytes::Bytes;
use futures::future::{FutureExt, Map};
use http_body_util::Full;
use hyper::service::Service;

use crate::error::BoxError;
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::response::Response;

type HttpResult = Result<http::Response<Full<Bytes>>, Infallible>;

/// Runs one request through `handler`.
///
/// The error type is [`Infallible`]: every failure is already a response by
/// the time the handler returns.
pub async fn dispatch<B>(handler: &BoxedHandler, req: http::Request<B>) -> HttpResult
where
    B: hyper::body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let response = handler.call(Request::new(req)).await;
    Ok(response.into_inner())
}

/// A hyper [`Service`] over `handler`, cheap to clone per connection.
pub fn service<B>(handler: BoxedHandler) -> HandlerService<B> {
    HandlerService { handler, _body: PhantomData }
}

/// hyper [`Service`] returned by [`service`].
pub struct HandlerService<B> {
    handler: BoxedHandler,
    _body: PhantomData<fn(B)>,
}

impl<B> Clone for HandlerService<B> {
    fn clone(&self) -> Self {
        Self { handler: self.handler.clone(), _body: PhantomData }
    }
}

fn into_http(res: Response) -> HttpResult {
    Ok(res.into_inner())
}

impl<B> Service<http::Request<B>> for HandlerService<B>
where
    B: hyper::body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    type Response = http::Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Map<BoxFuture, fn(Response) -> HttpResult>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        self.handler
            .call(Request::new(req))
            .map(into_http as fn(Response) -> HttpResult)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use http::StatusCode;

    #[tokio::test]
    async fn dispatch_converts_the_response() {
        let handler: BoxedHandler = crate::handler::Handler::into_boxed_handler(|req: Request| async move {
            Response::builder()
                .status(StatusCode::CREATED)
                .header("x-path", req.path())
                .text("made")
        });

        let req = http::Request::builder()
            .uri("/things")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let res = dispatch(&handler, req).await.unwrap();

        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers()["x-path"], "/things");
    }

    #[tokio::test]
    async fn service_is_callable() {
        let handler: BoxedHandler =
            crate::handler::Handler::into_boxed_handler(|_req: Request| async { "pong" });
        let svc = service::<Full<Bytes>>(handler);

        let req = http::Request::builder().body(Full::new(Bytes::from_static(b"ping"))).unwrap();
        let res = svc.call(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
    }
}
