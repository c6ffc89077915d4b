//! Minimal svckit example: one traced, panic-safe endpoint on hyper.
//!
//! Run with:
//!   RUST_LOG=svckit=debug cargo run --example traced
//!
//! Try:
//!   curl -X POST http://localhost:3000/login -d 'user=al&password=secret'
//!   curl -X POST http://localhost:3000/login \
//!        -H 'traceparent: 00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01' \
//!        -H 'content-type: application/json' \
//!        -d '{"email":"al@example.com","password":"secret"}'
//!   curl http://localhost:3000/panic

use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use svckit::envelope::Envelope;
use svckit::middleware::{Recover, Trace};
use svckit::panic::Diagnostic;
use svckit::tracer::OtelTracer;
use svckit::{Erased, IntoResponse, Request, Response};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let provider = SdkTracerProvider::builder().build();
    let tracer = OtelTracer::new(provider.tracer("svckit-demo"));

    let traced = Trace::new(tracer).wrap(route);
    let handler = Recover::new(Diagnostic::logging()).wrap(Erased(traced));
    let svc = svckit::service::service::<hyper::body::Incoming>(handler);

    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    info!("listening on 0.0.0.0:3000");

    loop {
        let (stream, peer) = listener.accept().await?;
        let svc = svc.clone();
        tokio::spawn(async move {
            if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                .serve_connection(TokioIo::new(stream), svc)
                .await
            {
                error!(%peer, "connection error: {e}");
            }
        });
    }
}

// The handler sees the body exactly as sent, even though the middleware
// already read it for the span tag.
async fn route(mut req: Request) -> Response {
    if req.path() == "/panic" {
        panic!("demo panic on {}", req.path());
    }

    let trace_id = req
        .context()
        .trace()
        .map(|t| format!("{:032x}", t.span_context().trace_id))
        .unwrap_or_default();

    match req.bytes().await {
        Ok(body) => Envelope::new(http::StatusCode::OK, "ok")
            .data(serde_json::json!({
                "trace_id": trace_id,
                "received": String::from_utf8_lossy(&body),
            }))
            .into_response(),
        Err(e) => Envelope::new(http::StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}
