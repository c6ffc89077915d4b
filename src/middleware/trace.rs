//! Per-request trace span.
//!
//! For every request [`Trace`] runs, in order:
//!
//! 1. join the upstream trace found in the headers, or start a root span
//!    from the request context;
//! 2. drain the body once, keep a copy, and hand the handler a replay of
//!    the exact same bytes;
//! 3. tag the span with the redacted body, the headers, URL and method;
//! 4. log `start_handling_request`, call the handler;
//! 5. log `complete_handling_request` and finish the span.
//!
//! Step 5 lives in [`SpanGuard`]'s `Drop`, so it also runs when the handler
//! panics or the request future is dropped mid-flight.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::body::{self, CapturedBody};
use crate::context::TraceContext;
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler};
use crate::request::Request;
use crate::response::Response;
use crate::tracer::{Span, SpanRole, TagValue, Tracer};

pub const TAG_SPAN_KIND: &str = "span.kind";
pub const TAG_BODY: &str = "body";
pub const TAG_HEADERS: &str = "http.headers";
pub const TAG_URL: &str = "http.url";
pub const TAG_METHOD: &str = "http.method";

pub const EVENT_START: &str = "start_handling_request";
pub const EVENT_COMPLETE: &str = "complete_handling_request";

/// How spans are tagged with `span.kind`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RolePolicy {
    /// Root spans are `server`, spans joined to an upstream trace are
    /// `client`. Matches traces recorded by earlier deployments.
    #[default]
    Mirrored,
    /// Every inbound span is `server`.
    Conventional,
}

impl RolePolicy {
    fn continuation_role(self) -> SpanRole {
        match self {
            Self::Mirrored => SpanRole::Client,
            Self::Conventional => SpanRole::Server,
        }
    }
}

/// Settings of the trace middleware.
#[derive(Clone, Debug)]
pub struct TraceConfig {
    pub role_policy: RolePolicy,
    /// Attach the redacted body as a span tag. The body always reaches the
    /// handler either way.
    pub capture_body: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self { role_policy: RolePolicy::default(), capture_body: true }
    }
}

/// Trace middleware over a [`Tracer`].
///
/// ```rust,no_run
/// use svckit::middleware::Trace;
/// use svckit::tracer::NoopTracer;
/// use svckit::{Request, Response};
///
/// async fn create_user(_req: Request) -> Response { Response::text("ok") }
///
/// let handler = Trace::new(NoopTracer).wrap(create_user);
/// ```
pub struct Trace<T> {
    tracer: Arc<T>,
    config: TraceConfig,
}

impl<T: Tracer> Trace<T> {
    pub fn new(tracer: T) -> Self {
        Self::shared(Arc::new(tracer))
    }

    /// Middleware over a tracer that is also used elsewhere.
    pub fn shared(tracer: Arc<T>) -> Self {
        Self { tracer, config: TraceConfig::default() }
    }

    pub fn config(mut self, config: TraceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn wrap(&self, handler: impl Handler) -> BoxedHandler {
        Arc::new(TraceHandler {
            tracer: Arc::clone(&self.tracer),
            config: self.config.clone(),
            inner: handler.into_boxed_handler(),
        })
    }
}

struct TraceHandler<T> {
    tracer: Arc<T>,
    config: TraceConfig,
    inner: BoxedHandler,
}

impl<T: Tracer> ErasedHandler for TraceHandler<T> {
    fn call(&self, req: Request) -> BoxFuture {
        let tracer = Arc::clone(&self.tracer);
        let config = self.config.clone();
        let inner = Arc::clone(&self.inner);
        Box::pin(async move { traced(&*tracer, &config, &inner, req).await })
    }
}

async fn traced<T: Tracer>(
    tracer: &T,
    config: &TraceConfig,
    inner: &BoxedHandler,
    mut req: Request,
) -> Response {
    let operation = operation_name(&req);
    let (span, trace) = start_request_span(tracer, config.role_policy, &operation, &req);
    let mut guard = SpanGuard::new(span);

    let (captured, replay) = body::intercept(req.take_body()).await;
    req.set_body(replay);

    tag_request(guard.span_mut(), config, &req, &captured);
    guard.span_mut().log_event(EVENT_START);

    req.context_mut().set_trace(trace);
    inner.call(req).await
}

/// `"{METHOD} {host}{path}"`, e.g. `POST api.example.com/users`.
pub fn operation_name(req: &Request) -> String {
    format!("{} {}{}", req.method(), req.host(), req.path())
}

/// Starts the span of one inbound request.
///
/// A trace context in the headers makes the span its continuation, tagged
/// per `policy`. Otherwise the span is a root (or a child of a trace already
/// in the request context) tagged `server`. Missing or malformed headers are
/// not an error.
pub fn start_request_span<T: Tracer>(
    tracer: &T,
    policy: RolePolicy,
    operation: &str,
    req: &Request,
) -> (T::Span, TraceContext) {
    let (mut span, role) = match tracer.extract(req.headers()) {
        Ok(upstream) => {
            let role = policy.continuation_role();
            (tracer.start_span(operation, Some(&upstream), role), role)
        }
        Err(reason) => {
            debug!(%reason, operation, "no upstream trace, starting root span");
            let ambient = req.context().trace().map(TraceContext::span_context);
            (tracer.start_span(operation, ambient, SpanRole::Server), SpanRole::Server)
        }
    };
    span.set_tag(TAG_SPAN_KIND, role.as_str().into());
    let trace = TraceContext::new(span.context(), role, operation.to_owned());
    (span, trace)
}

/// Tags `span` with the request body, headers, URL and method.
///
/// The body tag carries the redacted copy and is skipped when the request
/// context sets `remove-tag-body` or `capture_body` is off.
pub fn tag_request<S: Span>(span: &mut S, config: &TraceConfig, req: &Request, body: &CapturedBody) {
    let removed = req.context().remove_tag_body().unwrap_or(false);
    if config.capture_body && !removed {
        span.set_tag(TAG_BODY, TagValue::Str(body.redacted()));
    }
    span.set_tag(TAG_HEADERS, TagValue::Str(headers_json(req)));
    span.set_tag(TAG_URL, TagValue::Str(format!("{}{}", req.host(), req.request_uri())));
    span.set_tag(TAG_METHOD, req.method().as_str().into());
}

/// Headers as a JSON object of name to list of values.
fn headers_json(req: &Request) -> String {
    let mut map: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for (name, value) in req.headers() {
        map.entry(name.as_str())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    serde_json::to_string(&map).unwrap_or_default()
}

/// Owns a request span and closes it when dropped.
///
/// Dropping logs `complete_handling_request` and finishes the span, on
/// normal return as well as during unwinding. Drop runs once, so the span
/// is finished once.
pub struct SpanGuard<S: Span> {
    span: S,
}

impl<S: Span> SpanGuard<S> {
    pub fn new(span: S) -> Self {
        Self { span }
    }

    pub fn span_mut(&mut self) -> &mut S {
        &mut self.span
    }
}

impl<S: Span> Drop for SpanGuard<S> {
    fn drop(&mut self) {
        self.span.log_event(EVENT_COMPLETE);
        self.span.finish();
    }
}
