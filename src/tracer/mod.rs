//! Tracer provider capability set.
//!
//! svckit does not ship a tracing backend. The trace middleware talks to
//! whatever backend the service runs through two small traits:
//!
//! - [`Tracer`]: reads an upstream context from inbound headers and starts
//!   spans.
//! - [`Span`]: takes tags and log events, and is finished once.
//!
//! Two implementations come with the crate: [`NoopTracer`] for tests and
//! services without tracing, and [`OtelTracer`] over any OpenTelemetry
//! tracer. The tracer is chosen when the middleware is built; there is no
//! global registry.

mod otel;

use std::fmt;

use http::HeaderMap;

use crate::error::ExtractError;

pub use otel::{OtelSpan, OtelTracer};

/// A tracing backend.
pub trait Tracer: Send + Sync + 'static {
    type Span: Span;

    /// Reads an upstream trace context from the inbound header carrier.
    fn extract(&self, carrier: &HeaderMap) -> Result<SpanContext, ExtractError>;

    /// Starts a span named `name` playing `role`, as a child of `parent`
    /// when one is given and as a new root otherwise.
    fn start_span(&self, name: &str, parent: Option<&SpanContext>, role: SpanRole) -> Self::Span;
}

/// One traced operation.
pub trait Span: Send + 'static {
    fn context(&self) -> SpanContext;
    fn set_tag(&mut self, key: &'static str, value: TagValue);
    fn log_event(&mut self, name: &'static str);
    fn finish(&mut self);
}

/// Backend-neutral identity of a span.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SpanContext {
    pub trace_id: u128,
    pub span_id: u64,
    pub sampled: bool,
    /// Set when the context was read from an upstream carrier.
    pub remote: bool,
    /// Vendor entries in W3C `tracestate` header form, e.g. `vendor=abc`.
    /// Empty when the trace carries none.
    pub trace_state: String,
}

impl SpanContext {
    pub fn is_valid(&self) -> bool {
        self.trace_id != 0 && self.span_id != 0
    }
}

/// Value of a span tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagValue {
    Str(String),
    Bool(bool),
    I64(i64),
}

impl From<String> for TagValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<bool> for TagValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for TagValue {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::I64(n) => write!(f, "{n}"),
        }
    }
}

/// Which side of an RPC a span stands for, tagged as `span.kind`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanRole {
    Server,
    Client,
}

impl SpanRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Client => "client",
        }
    }
}

impl fmt::Display for SpanRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracer that never finds upstream context and records nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTracer;

/// Span handed out by [`NoopTracer`].
#[derive(Debug, Default)]
pub struct NoopSpan {
    context: SpanContext,
}

impl Tracer for NoopTracer {
    type Span = NoopSpan;

    fn extract(&self, _carrier: &HeaderMap) -> Result<SpanContext, ExtractError> {
        Err(ExtractError::NotFound)
    }

    fn start_span(&self, _name: &str, parent: Option<&SpanContext>, _role: SpanRole) -> NoopSpan {
        NoopSpan { context: parent.cloned().unwrap_or_default() }
    }
}

impl Span for NoopSpan {
    fn context(&self) -> SpanContext {
        self.context.clone()
    }

    fn set_tag(&mut self, _key: &'static str, _value: TagValue) {}

    fn log_event(&mut self, _name: &'static str) {}

    fn finish(&mut self) {}
}
