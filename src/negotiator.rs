//! Bind and write dispatch

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Limited};
use hyper::{body::Body, http::request::Parts};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::NegotiatorConfig,
    error::{BoxError, Error, Result},
    exchange::{self, Inbound, ResponseSink},
    registry::{default_decoders, default_encoders, DecoderRegistry, EncoderRegistry},
};

/// Selects and runs codecs for one pair of registries
///
/// # Example
///
/// ```
/// use http_body_util::Full;
/// use hyper::{body::Bytes, Request};
/// use serde::{Deserialize, Serialize};
/// use tower_negotiate::{Negotiator, ResponseSink};
///
/// #[derive(Serialize, Deserialize)]
/// struct Greeting {
///     name: String,
/// }
///
/// # tokio_test::block_on(async {
/// let request = Request::builder()
///     .header("Content-Type", "application/json")
///     .header("Accept", "text/yaml")
///     .body(Full::new(Bytes::from(r#"{"name":"Bob"}"#)))
///     .unwrap();
/// let (parts, body) = request.into_parts();
///
/// let negotiator = Negotiator::default();
/// let (format, greeting) = negotiator.bind::<Greeting, _>(&parts, body).await;
/// assert_eq!(format, "json");
///
/// let mut sink = ResponseSink::new();
/// negotiator.write(&mut sink, &parts, &greeting.unwrap()).unwrap();
/// assert_eq!(sink.body(), b"name: Bob\n");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Negotiator {
    decoders: Arc<DecoderRegistry>,
    encoders: Arc<EncoderRegistry>,
    config: NegotiatorConfig,
}

impl Negotiator {
    /// Create a negotiator over the given registries
    pub fn new(
        decoders: impl Into<Arc<DecoderRegistry>>,
        encoders: impl Into<Arc<EncoderRegistry>>,
    ) -> Self {
        Self {
            decoders: decoders.into(),
            encoders: encoders.into(),
            config: NegotiatorConfig::default(),
        }
    }

    /// Create a negotiator over the current process-wide defaults
    pub fn from_defaults() -> Self {
        Self::new(default_decoders(), default_encoders())
    }

    /// Set the configuration
    pub fn with_config(mut self, config: NegotiatorConfig) -> Self {
        self.config = config;
        self
    }

    /// The negotiator attached to a request by
    /// [`NegotiationLayer`](crate::layer::NegotiationLayer), or one over the
    /// process-wide defaults
    pub fn for_request(parts: &Parts) -> Arc<Negotiator> {
        parts
            .extensions
            .get::<Arc<Negotiator>>()
            .cloned()
            .unwrap_or_else(|| Arc::new(Self::from_defaults()))
    }

    /// The decoder registry
    pub fn decoders(&self) -> &DecoderRegistry {
        &self.decoders
    }

    /// The encoder registry
    pub fn encoders(&self) -> &EncoderRegistry {
        &self.encoders
    }

    /// The configuration
    pub fn config(&self) -> &NegotiatorConfig {
        &self.config
    }

    /// Decode a request body according to its `Content-Type`
    ///
    /// Returns the matched token with the decode result. When no token
    /// matches, the raw header value is returned with
    /// [`Error::InvalidFormat`] and the body is left unread.
    pub async fn bind<T, B>(&self, parts: &Parts, body: B) -> (String, Result<T>)
    where
        T: DeserializeOwned,
        B: Body,
        B::Error: Into<BoxError>,
    {
        let header = exchange::content_type(parts);
        let Some((token, factory)) = self.decoders.select(header) else {
            tracing::debug!(header, "no decoder matches content type");
            return (header.to_owned(), Err(Error::InvalidFormat));
        };
        tracing::debug!(format = token, header, "selected decoder");

        let result = match read_body(body, self.config.max_body_size).await {
            Ok(body) => {
                factory
                    .make_decoder(Inbound::new(parts, body))
                    .decode()
                    .await
            }
            Err(err) => Err(err),
        };

        (token.to_owned(), result)
    }

    /// Encode `value` according to the request's `Accept` header
    ///
    /// Returns [`Error::InvalidFormat`] without touching the sink when no
    /// token matches.
    pub fn write<T>(&self, sink: &mut ResponseSink, parts: &Parts, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.write_with(sink, parts, value, None::<fn(&mut ResponseSink) -> Result<()>>)
    }

    /// Like [`write`](Self::write), but call `fallback` when no token matches
    ///
    /// The fallback writes its own headers and body; its result is returned
    /// unchanged.
    pub fn write_or_else<T, F>(
        &self,
        sink: &mut ResponseSink,
        parts: &Parts,
        value: &T,
        fallback: F,
    ) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&mut ResponseSink) -> Result<()>,
    {
        self.write_with(sink, parts, value, Some(fallback))
    }

    fn write_with<T, F>(
        &self,
        sink: &mut ResponseSink,
        parts: &Parts,
        value: &T,
        fallback: Option<F>,
    ) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&mut ResponseSink) -> Result<()>,
    {
        let header = exchange::accept(parts);
        if let Some((token, factory)) = self.encoders.select(header) {
            tracing::debug!(format = token, header, "selected encoder");
            return factory.make_encoder(sink).encode(value);
        }

        match fallback {
            Some(fallback) => {
                tracing::debug!(header, "no encoder matches accept header, using fallback");
                fallback(sink)
            }
            None => {
                tracing::debug!(header, "no encoder matches accept header");
                Err(Error::InvalidFormat)
            }
        }
    }
}

impl Default for Negotiator {
    fn default() -> Self {
        Self::new(DecoderRegistry::default(), EncoderRegistry::default())
    }
}

async fn read_body<B>(body: B, limit: Option<usize>) -> Result<Bytes>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let collected = match limit {
        Some(limit) => Limited::new(body, limit)
            .collect()
            .await
            .map_err(Error::Body)?,
        None => body.collect().await.map_err(|err| Error::Body(err.into()))?,
    };

    let bytes = collected.to_bytes();
    tracing::trace!(bytes = bytes.len(), "read request body");
    Ok(bytes)
}

/// Decode a request body with the request's negotiator
///
/// Uses the negotiator attached by
/// [`NegotiationLayer`](crate::layer::NegotiationLayer), or the process-wide
/// default registries. See [`Negotiator::bind`].
pub async fn bind<T, B>(parts: &Parts, body: B) -> (String, Result<T>)
where
    T: DeserializeOwned,
    B: Body,
    B::Error: Into<BoxError>,
{
    let negotiator = Negotiator::for_request(parts);
    negotiator.bind(parts, body).await
}

/// Encode a value with the request's negotiator. See [`Negotiator::write`].
pub fn write<T>(sink: &mut ResponseSink, parts: &Parts, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    Negotiator::for_request(parts).write(sink, parts, value)
}

/// Encode a value with the request's negotiator, or call `fallback`.
/// See [`Negotiator::write_or_else`].
pub fn write_or_else<T, F>(
    sink: &mut ResponseSink,
    parts: &Parts,
    value: &T,
    fallback: F,
) -> Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&mut ResponseSink) -> Result<()>,
{
    Negotiator::for_request(parts).write_or_else(sink, parts, value, fallback)
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use http_body_util::{Empty, Full, StreamBody};
    use hyper::{
        body::Frame,
        header::{ACCEPT, CONTENT_TYPE},
        Request,
    };
    use serde::Deserialize;

    use super::*;
    use crate::codec::{JsonFormat, XmlFormat};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: u32,
    }

    fn head(name: hyper::header::HeaderName, value: &str) -> Parts {
        Request::builder()
            .header(name, value)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn test_bind_no_match_leaves_body_unread() {
        let parts = head(CONTENT_TYPE, "text/csv");

        // Polling this body would fail the test
        let body = StreamBody::new(futures::stream::poll_fn(
            |_| -> std::task::Poll<Option<std::result::Result<Frame<Bytes>, Infallible>>> {
                panic!("body must not be read")
            },
        ));

        let (format, result) = Negotiator::default().bind::<Item, _>(&parts, body).await;
        assert_eq!(format, "text/csv");
        assert!(matches!(result, Err(Error::InvalidFormat)));
    }

    #[tokio::test]
    async fn test_bind_body_limit() {
        let parts = head(CONTENT_TYPE, "application/json");
        let negotiator =
            Negotiator::default().with_config(NegotiatorConfig::new().with_max_body_size(4));

        let (format, result) = negotiator
            .bind::<Item, _>(&parts, Full::new(Bytes::from_static(br#"{"id":1}"#)))
            .await;
        assert_eq!(format, "json");

        let err = result.unwrap_err();
        assert!(matches!(err, Error::Body(_)));
        assert_eq!(err.status_hint(), hyper::StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_bind_empty_body_is_decode_error() {
        let parts = head(CONTENT_TYPE, "application/json");

        let (format, result) = Negotiator::default()
            .bind::<Item, _>(&parts, Empty::<Bytes>::new())
            .await;
        assert_eq!(format, "json");
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[tokio::test]
    async fn test_custom_registry_priority() {
        let decoders = DecoderRegistry::new()
            .with("json", JsonFormat)
            .with("xml", XmlFormat);
        let negotiator = Negotiator::new(decoders, EncoderRegistry::default());

        // Both tokens appear; the first registered wins
        let parts = head(CONTENT_TYPE, "application/xml+json");
        let (format, result) = negotiator
            .bind::<Item, _>(&parts, Full::new(Bytes::from_static(br#"{"id":7}"#)))
            .await;
        assert_eq!(format, "json");
        assert_eq!(result.unwrap(), Item { id: 7 });
    }

    #[test]
    fn test_write_without_fallback() {
        let parts = head(ACCEPT, "text/html");
        let mut sink = ResponseSink::new();

        let err = Negotiator::default()
            .write(&mut sink, &parts, &Item { id: 1 })
            .unwrap_err();
        assert!(err.is_invalid_format());
        assert!(sink.is_empty());
        assert_eq!(sink.content_type(), None);
    }

    #[test]
    fn test_write_fallback_error_returned() {
        let parts = head(ACCEPT, "text/html");
        let mut sink = ResponseSink::new();

        let err = Negotiator::default()
            .write_or_else(&mut sink, &parts, &Item { id: 1 }, |_| {
                Err(Error::custom("template missing"))
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "template missing");
    }

    #[test]
    fn test_fallback_not_called_on_match() {
        let parts = head(ACCEPT, "application/json");
        let mut sink = ResponseSink::new();

        Negotiator::default()
            .write_or_else(&mut sink, &parts, &Item { id: 1 }, |_| {
                panic!("fallback must not run")
            })
            .unwrap();
        assert_eq!(sink.body(), b"{\"id\":1}\n");
    }

    #[test]
    fn test_for_request_uses_extension() {
        let custom = Arc::new(Negotiator::new(
            DecoderRegistry::new(),
            EncoderRegistry::new().with("json", JsonFormat),
        ));

        let mut parts = head(ACCEPT, "application/xml");
        parts.extensions.insert(custom.clone());
        let negotiator = Negotiator::for_request(&parts);
        assert!(Arc::ptr_eq(&negotiator, &custom));

        let mut sink = ResponseSink::new();
        let err = write(&mut sink, &parts, &Item { id: 1 }).unwrap_err();
        assert!(err.is_invalid_format());
    }
}
