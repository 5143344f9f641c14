//! Request and response halves of one HTTP exchange

use std::{fmt, io};

use bytes::{Bytes, BytesMut};
use http_body_util::Full;
use hyper::{
    header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE},
    http::request::Parts,
    Response, StatusCode,
};

/// Read a header as a string, treating missing or non-UTF-8 values as empty
pub(crate) fn header_str(headers: &HeaderMap, name: HeaderName) -> &str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// The `Content-Type` of a request head
pub fn content_type(parts: &Parts) -> &str {
    header_str(&parts.headers, CONTENT_TYPE)
}

/// The `Accept` header of a request head
pub fn accept(parts: &Parts) -> &str {
    header_str(&parts.headers, ACCEPT)
}

/// A request handed to a decoder factory
///
/// The head is borrowed from the exchange; the body has already been read in
/// full and is owned by whichever decoder the factory builds.
#[derive(Debug)]
pub struct Inbound<'a> {
    /// The request head
    pub parts: &'a Parts,

    /// The request body
    pub body: Bytes,
}

impl<'a> Inbound<'a> {
    /// Create a new inbound request
    pub fn new(parts: &'a Parts, body: Bytes) -> Self {
        Self { parts, body }
    }

    /// The request's `Content-Type`, or `""`
    pub fn content_type(&self) -> &str {
        content_type(self.parts)
    }

    /// The raw query string, if any
    pub fn query(&self) -> Option<&str> {
        self.parts.uri.query()
    }
}

/// Response under construction
///
/// Encoders stream into the body through [`io::Write`] or [`fmt::Write`].
/// Convert into a `hyper` response with [`ResponseSink::into_response`].
#[derive(Debug, Clone)]
pub struct ResponseSink {
    /// Status code
    pub status: StatusCode,

    /// Response headers
    pub headers: HeaderMap,

    body: BytesMut,
}

impl ResponseSink {
    /// Create an empty `200 OK` response
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }

    /// Set the status code
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Set a header, replacing any previous value
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// The `Content-Type` header, if one was set
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Set the `Content-Type` header
    pub fn set_content_type(&mut self, value: HeaderValue) {
        self.set_header(CONTENT_TYPE, value);
    }

    /// Append bytes to the body
    pub fn push(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    /// The body written so far
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Check if nothing has been written to the body
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Take the finished body
    pub fn into_body(self) -> Bytes {
        self.body.freeze()
    }

    /// Build a `hyper` response from the sink
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Default for ResponseSink {
    fn default() -> Self {
        Self::new()
    }
}

impl io::Write for ResponseSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Write for ResponseSink {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push(s.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use hyper::Request;

    use super::*;

    #[test]
    fn test_header_helpers() {
        let (parts, ()) = Request::builder()
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .header(ACCEPT, "text/yaml")
            .uri("/people?page=2")
            .body(())
            .unwrap()
            .into_parts();

        assert_eq!(content_type(&parts), "application/json; charset=utf-8");
        assert_eq!(accept(&parts), "text/yaml");

        let inbound = Inbound::new(&parts, Bytes::new());
        assert_eq!(inbound.query(), Some("page=2"));
    }

    #[test]
    fn test_missing_headers_are_empty() {
        let (parts, ()) = Request::new(()).into_parts();
        assert_eq!(content_type(&parts), "");
        assert_eq!(accept(&parts), "");
    }

    #[test]
    fn test_sink_into_response() {
        let mut sink = ResponseSink::new().status(StatusCode::CREATED);
        sink.set_content_type(HeaderValue::from_static("text/plain"));
        sink.write_all(b"hello").unwrap();

        assert_eq!(sink.content_type(), Some("text/plain"));
        assert_eq!(sink.body(), b"hello");

        let response = sink.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
    }
}
