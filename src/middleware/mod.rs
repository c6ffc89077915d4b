//! Middleware layer.
//!
//! Middleware wraps a handler and returns a [`BoxedHandler`](crate::BoxedHandler)
//! that can be wrapped again:
//!
//! - [`Trace`]: one span per request, joined to the upstream trace when the
//!   caller sent one, tagged with the redacted body, headers, URL and method.
//! - [`Recover`]: catches a panicking handler, diagnoses it and answers
//!   `500` with a safe message.
//!
//! Put `Recover` outside `Trace` so a panicking request still closes its
//! span before the panic is turned into a response.

mod recover;
mod trace;

pub use recover::Recover;
pub use trace::{
    operation_name, start_request_span, tag_request, RolePolicy, SpanGuard, Trace, TraceConfig,
    EVENT_COMPLETE, EVENT_START, TAG_BODY, TAG_HEADERS, TAG_METHOD, TAG_SPAN_KIND, TAG_URL,
};
