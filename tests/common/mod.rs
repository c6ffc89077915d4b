#![allow(dead_code)]

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http::HeaderMap;
use http_body_util::Full;
use svckit::notify::{Alert, Notifier};
use svckit::tracer::{Span, SpanContext, SpanRole, TagValue, Tracer};
use svckit::{ExtractError, NotifyError, Request};

/// Everything one span went through.
#[derive(Debug, Default)]
pub struct SpanRecord {
    pub name: String,
    pub parent: Option<SpanContext>,
    pub role: Option<SpanRole>,
    pub tags: Vec<(&'static str, TagValue)>,
    pub events: Vec<&'static str>,
    pub finished: usize,
}

impl SpanRecord {
    pub fn tag(&self, key: &str) -> Option<&TagValue> {
        self.tags.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Tracer that keeps every span it starts. Reads `x-trace` / `x-span`
/// headers as the upstream context and `x-state` as its trace state.
#[derive(Clone, Default)]
pub struct RecordingTracer {
    spans: Arc<Mutex<Vec<Arc<Mutex<SpanRecord>>>>>,
}

impl RecordingTracer {
    pub fn spans(&self) -> Vec<Arc<Mutex<SpanRecord>>> {
        self.spans.lock().unwrap().clone()
    }

    pub fn only_span(&self) -> Arc<Mutex<SpanRecord>> {
        let spans = self.spans();
        assert_eq!(spans.len(), 1, "expected exactly one span");
        Arc::clone(&spans[0])
    }
}

pub struct RecordingSpan {
    context: SpanContext,
    record: Arc<Mutex<SpanRecord>>,
}

impl Tracer for RecordingTracer {
    type Span = RecordingSpan;

    fn extract(&self, carrier: &HeaderMap) -> Result<SpanContext, ExtractError> {
        let trace = carrier.get("x-trace").ok_or(ExtractError::NotFound)?;
        let span = carrier.get("x-span").ok_or(ExtractError::NotFound)?;
        let parse = |v: &http::HeaderValue| {
            v.to_str()
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .ok_or_else(|| ExtractError::Malformed(format!("{v:?}")))
        };
        Ok(SpanContext {
            trace_id: u128::from(parse(trace)?),
            span_id: parse(span)?,
            sampled: true,
            remote: true,
            trace_state: carrier
                .get("x-state")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_owned(),
        })
    }

    fn start_span(&self, name: &str, parent: Option<&SpanContext>, role: SpanRole) -> RecordingSpan {
        let mut spans = self.spans.lock().unwrap();
        let context = SpanContext {
            trace_id: parent.map_or(1000 + spans.len() as u128, |p| p.trace_id),
            span_id: 1 + spans.len() as u64,
            sampled: true,
            remote: false,
            trace_state: parent.map(|p| p.trace_state.clone()).unwrap_or_default(),
        };
        let record = Arc::new(Mutex::new(SpanRecord {
            name: name.to_owned(),
            parent: parent.cloned(),
            role: Some(role),
            ..SpanRecord::default()
        }));
        spans.push(Arc::clone(&record));
        RecordingSpan { context, record }
    }
}

impl Span for RecordingSpan {
    fn context(&self) -> SpanContext {
        self.context.clone()
    }

    fn set_tag(&mut self, key: &'static str, value: TagValue) {
        self.record.lock().unwrap().tags.push((key, value));
    }

    fn log_event(&mut self, name: &'static str) {
        self.record.lock().unwrap().events.push(name);
    }

    fn finish(&mut self) {
        self.record.lock().unwrap().finished += 1;
    }
}

/// Notifier that forwards alerts into a channel.
pub struct ChannelNotifier(Mutex<mpsc::Sender<Alert>>);

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::Receiver<Alert>) {
        let (tx, rx) = mpsc::channel();
        (Self(Mutex::new(tx)), rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        let _ = self.0.lock().unwrap().send(alert.clone());
        Ok(())
    }
}

pub fn recv_alert(rx: &mpsc::Receiver<Alert>) -> Alert {
    rx.recv_timeout(Duration::from_secs(5)).expect("alert delivered")
}

pub fn post(uri: &str) -> http::request::Builder {
    http::Request::builder().method("POST").uri(uri).header("host", "api.example.com")
}

pub fn request(builder: http::request::Builder, body: &'static [u8]) -> Request {
    Request::new(builder.body(Full::new(Bytes::from_static(body))).unwrap())
}
