//! Request-scoped context.
//!
//! Values that travel with one request from outer layers to the handler:
//! the active trace and the flag that keeps the body out of span tags. The
//! context lives inside the [`Request`](crate::Request) and is dropped
//! with it; nothing here is shared between requests.

use crate::tracer::{SpanContext, SpanRole};

/// Per-request values set by middleware and read by inner layers.
#[derive(Clone, Debug, Default)]
pub struct Context {
    trace: Option<TraceContext>,
    remove_tag_body: Option<bool>,
}

impl Context {
    /// The span the trace middleware opened for this request, if any.
    pub fn trace(&self) -> Option<&TraceContext> {
        self.trace.as_ref()
    }

    /// The `remove-tag-body` flag. `Some(true)` keeps the request body out
    /// of the span tags.
    pub fn remove_tag_body(&self) -> Option<bool> {
        self.remove_tag_body
    }

    pub fn set_remove_tag_body(&mut self, remove: bool) {
        self.remove_tag_body = Some(remove);
    }

    pub(crate) fn set_trace(&mut self, trace: TraceContext) {
        self.trace = Some(trace);
    }
}

/// The active span of one request, as seen by downstream handlers.
///
/// Read-only: handlers use it to parent their own spans or to propagate
/// the trace to outbound calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceContext {
    span: SpanContext,
    role: SpanRole,
    operation: String,
}

impl TraceContext {
    pub(crate) fn new(span: SpanContext, role: SpanRole, operation: String) -> Self {
        Self { span, role, operation }
    }

    pub fn span_context(&self) -> &SpanContext {
        &self.span
    }

    pub fn role(&self) -> SpanRole {
        self.role
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}
