//! OpenTelemetry-backed [`Tracer`].

use std::borrow::Cow;
use std::str::FromStr;

use http::{HeaderMap, HeaderName};
use opentelemetry::propagation::{Extractor, TextMapPropagator};
use opentelemetry::trace::{
    self as otel, Span as _, SpanId, SpanKind, TraceContextExt, TraceFlags, TraceId, TraceState,
    Tracer as _,
};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::propagation::TraceContextPropagator;

use super::{Span, SpanContext, SpanRole, TagValue, Tracer};
use crate::error::ExtractError;

/// [`Tracer`] over an OpenTelemetry tracer and text-map propagator.
///
/// The propagator defaults to W3C Trace Context (`traceparent` /
/// `tracestate`).
pub struct OtelTracer<T, P = TraceContextPropagator> {
    tracer: T,
    propagator: P,
}

impl<T> OtelTracer<T> {
    pub fn new(tracer: T) -> Self {
        Self { tracer, propagator: TraceContextPropagator::new() }
    }
}

impl<T, P> OtelTracer<T, P> {
    pub fn with_propagator(tracer: T, propagator: P) -> Self {
        Self { tracer, propagator }
    }
}

impl<T, P> Tracer for OtelTracer<T, P>
where
    T: otel::Tracer + Send + Sync + 'static,
    T::Span: Send + 'static,
    P: TextMapPropagator + Send + Sync + 'static,
{
    type Span = OtelSpan<T::Span>;

    fn extract(&self, carrier: &HeaderMap) -> Result<SpanContext, ExtractError> {
        let present = self
            .propagator
            .fields()
            .any(|field| carrier.contains_key(field));
        if !present {
            return Err(ExtractError::NotFound);
        }

        let cx = self.propagator.extract(&HeaderExtractor(carrier));
        let span = cx.span();
        let upstream = span.span_context();
        if !upstream.is_valid() {
            let raw = self
                .propagator
                .fields()
                .filter_map(|field| carrier.get(field))
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ExtractError::Malformed(raw));
        }
        Ok(from_otel(upstream))
    }

    fn start_span(&self, name: &str, parent: Option<&SpanContext>, role: SpanRole) -> Self::Span {
        let parent_cx = match parent {
            Some(parent) => Context::new().with_remote_span_context(to_otel(parent)),
            None => Context::new(),
        };
        let inner = self
            .tracer
            .span_builder(name.to_owned())
            .with_kind(span_kind(role))
            .start_with_context(&self.tracer, &parent_cx);
        OtelSpan { inner }
    }
}

/// Span produced by [`OtelTracer`]; tags become span attributes and log
/// events become span events.
pub struct OtelSpan<S> {
    inner: S,
}

impl<S> Span for OtelSpan<S>
where
    S: otel::Span + Send + 'static,
{
    fn context(&self) -> SpanContext {
        from_otel(self.inner.span_context())
    }

    fn set_tag(&mut self, key: &'static str, value: TagValue) {
        let kv = match value {
            TagValue::Str(s) => KeyValue::new(key, s),
            TagValue::Bool(b) => KeyValue::new(key, b),
            TagValue::I64(n) => KeyValue::new(key, n),
        };
        self.inner.set_attribute(kv);
    }

    fn log_event(&mut self, name: &'static str) {
        self.inner.add_event(Cow::Borrowed(name), Vec::new());
    }

    fn finish(&mut self) {
        self.inner.end();
    }
}

fn span_kind(role: SpanRole) -> SpanKind {
    match role {
        SpanRole::Server => SpanKind::Server,
        SpanRole::Client => SpanKind::Client,
    }
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}

fn from_otel(sc: &otel::SpanContext) -> SpanContext {
    SpanContext {
        trace_id: u128::from_be_bytes(sc.trace_id().to_bytes()),
        span_id: u64::from_be_bytes(sc.span_id().to_bytes()),
        sampled: sc.is_sampled(),
        remote: sc.is_remote(),
        trace_state: sc.trace_state().header(),
    }
}

fn to_otel(sc: &SpanContext) -> otel::SpanContext {
    let flags = if sc.sampled { TraceFlags::SAMPLED } else { TraceFlags::default() };
    otel::SpanContext::new(
        TraceId::from_bytes(sc.trace_id.to_be_bytes()),
        SpanId::from_bytes(sc.span_id.to_be_bytes()),
        flags,
        sc.remote,
        TraceState::from_str(&sc.trace_state).unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use opentelemetry::trace::noop::NoopTracer as OtelNoop;
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracer, SdkTracerProvider};

    const TRACEPARENT: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    fn tracer() -> OtelTracer<OtelNoop> {
        OtelTracer::new(OtelNoop::new())
    }

    #[test]
    fn valid_traceparent_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert("traceparent", TRACEPARENT.parse().unwrap());

        let upstream = tracer().extract(&headers).expect("valid traceparent");

        assert_eq!(upstream.trace_id, 0x4bf92f3577b34da6a3ce929d0e0e4736);
        assert_eq!(upstream.span_id, 0x00f067aa0ba902b7);
        assert!(upstream.sampled);
        assert!(upstream.remote);
    }

    #[test]
    fn missing_headers_are_not_found() {
        assert_eq!(tracer().extract(&HeaderMap::new()), Err(ExtractError::NotFound));
    }

    #[test]
    fn garbage_traceparent_is_malformed() {
        let mut headers = HeaderMap::new();
        headers.insert("traceparent", "not-a-trace".parse().unwrap());

        assert!(matches!(tracer().extract(&headers), Err(ExtractError::Malformed(_))));
    }

    #[test]
    fn ids_survive_conversion() {
        let sc = SpanContext {
            trace_id: 0xabc,
            span_id: 0xdef,
            sampled: true,
            remote: true,
            trace_state: "vendor=abc,other=1".to_owned(),
        };
        assert_eq!(from_otel(&to_otel(&sc)), sc);
    }

    #[test]
    fn unparsable_trace_state_is_dropped() {
        let sc = SpanContext {
            trace_id: 1,
            span_id: 2,
            trace_state: "no equals sign".to_owned(),
            ..SpanContext::default()
        };
        assert_eq!(to_otel(&sc).trace_state().header(), "");
    }

    #[test]
    fn tracestate_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert("traceparent", TRACEPARENT.parse().unwrap());
        headers.insert("tracestate", "vendor=abc".parse().unwrap());

        let upstream = tracer().extract(&headers).expect("valid traceparent");

        assert_eq!(upstream.trace_state, "vendor=abc");
    }

    fn exporting() -> (OtelTracer<SdkTracer>, InMemorySpanExporter, SdkTracerProvider) {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        (OtelTracer::new(provider.tracer("svckit-test")), exporter, provider)
    }

    #[test]
    fn role_sets_the_exported_span_kind() {
        let (tracer, exporter, _provider) = exporting();

        tracer.start_span("root", None, SpanRole::Server).finish();
        tracer.start_span("continued", None, SpanRole::Client).finish();

        let spans = exporter.get_finished_spans().unwrap();
        let kind = |name: &str| {
            spans
                .iter()
                .find(|s| s.name == name)
                .map(|s| s.span_kind.clone())
                .expect("span exported")
        };
        assert_eq!(kind("root"), SpanKind::Server);
        assert_eq!(kind("continued"), SpanKind::Client);
    }

    #[test]
    fn continuation_keeps_the_upstream_trace_state() {
        let (tracer, exporter, _provider) = exporting();
        let mut headers = HeaderMap::new();
        headers.insert("traceparent", TRACEPARENT.parse().unwrap());
        headers.insert("tracestate", "vendor=abc".parse().unwrap());

        let upstream = tracer.extract(&headers).expect("valid traceparent");
        let mut span = tracer.start_span("continued", Some(&upstream), SpanRole::Client);
        assert_eq!(span.context().trace_state, "vendor=abc");
        span.finish();

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].span_context.trace_state().header(), "vendor=abc");
        assert_eq!(spans[0].parent_span_id, SpanId::from_bytes(0x00f067aa0ba902b7u64.to_be_bytes()));
    }
}
