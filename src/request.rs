//! Incoming HTTP request type.

use bytes::Bytes;
use http::request::Parts;
use http::{HeaderMap, Method, Uri};

use crate::body::Body;
use crate::context::Context;
use crate::error::{BoxError, Error};

/// An incoming HTTP request: head, streaming body, and request-scoped
/// [`Context`].
pub struct Request {
    pub(crate) head: Parts,
    pub(crate) body: Body,
    pub(crate) context: Context,
}

impl Request {
    pub fn new<B>(req: http::Request<B>) -> Self
    where
        B: hyper::body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (head, body) = req.into_parts();
        Self { head, body: Body::new(body), context: Context::default() }
    }

    pub fn method(&self) -> &Method { &self.head.method }
    pub fn uri(&self) -> &Uri { &self.head.uri }
    pub fn path(&self) -> &str { self.head.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.head.headers }
    pub fn context(&self) -> &Context { &self.context }
    pub fn context_mut(&mut self) -> &mut Context { &mut self.context }

    /// Header lookup. Values that are not visible ASCII read as `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `Host` header, or the URI authority for absolute-form requests.
    pub fn host(&self) -> &str {
        self.header("host")
            .or_else(|| self.head.uri.authority().map(|a| a.as_str()))
            .unwrap_or("")
    }

    /// Path and query as sent by the client, e.g. `/users?page=2`.
    pub fn request_uri(&self) -> &str {
        self.head
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
    }

    /// `https://` when the request arrived over TLS (directly or through a
    /// proxy setting `x-forwarded-proto`), `http://` otherwise.
    pub fn protocol(&self) -> &'static str {
        let tls = self.head.uri.scheme_str() == Some("https")
            || self
                .header("x-forwarded-proto")
                .is_some_and(|p| p.eq_ignore_ascii_case("https"));
        if tls { "https://" } else { "http://" }
    }

    /// Protocol and host, e.g. `https://api.example.com`.
    pub fn host_url(&self) -> String {
        format!("{}{}", self.protocol(), self.host())
    }

    /// Absolute URL of this request, for `self` links in responses.
    pub fn self_link(&self) -> String {
        format!("{}{}", self.host_url(), self.request_uri())
    }

    /// Takes the body stream, leaving an empty one in its place.
    pub fn take_body(&mut self) -> Body {
        std::mem::take(&mut self.body)
    }

    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = body.into();
    }

    /// Reads the remaining body to its end.
    pub async fn bytes(&mut self) -> Result<Bytes, Error> {
        self.take_body().collect_bytes().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use http_body_util::Full;

    fn request(uri: &str) -> http::request::Builder {
        http::Request::builder().method("POST").uri(uri)
    }

    #[test]
    fn host_prefers_the_host_header() {
        let req = Request::new(
            request("/users?page=2")
                .header("host", "api.example.com")
                .body(Full::new(Bytes::new()))
                .unwrap(),
        );

        assert_eq!(req.host(), "api.example.com");
        assert_eq!(req.request_uri(), "/users?page=2");
        assert_eq!(req.self_link(), "http://api.example.com/users?page=2");
    }

    #[test]
    fn absolute_form_uses_the_authority() {
        let req = Request::new(
            request("https://svc.internal:8443/ping").body(Full::new(Bytes::new())).unwrap(),
        );

        assert_eq!(req.host(), "svc.internal:8443");
        assert_eq!(req.protocol(), "https://");
        assert_eq!(req.path(), "/ping");
    }

    #[test]
    fn forwarded_proto_marks_tls() {
        let req = Request::new(
            request("/")
                .header("host", "example.com")
                .header("x-forwarded-proto", "HTTPS")
                .body(Full::new(Bytes::new()))
                .unwrap(),
        );

        assert_eq!(req.host_url(), "https://example.com");
    }

    #[tokio::test]
    async fn body_is_read_once() {
        let mut req = Request::new(
            request("/").body(Full::new(Bytes::from_static(b"payload"))).unwrap(),
        );

        assert_eq!(&req.bytes().await.unwrap()[..], b"payload");
        assert!(req.bytes().await.unwrap().is_empty());
    }
}
