//! Format codecs and the factories that bind them to an exchange
//!
//! A codec lives for one exchange. Factories ([`MakeDecoder`],
//! [`MakeEncoder`]) are what registries hold: stateless, shared, and never
//! failing. Errors only come out of [`Decoder::decode`] and [`Encoder::encode`].

pub mod form;
pub mod json;
pub mod value;
pub mod xml;
pub mod yaml;

pub use form::{FormDecoder, FormError, FormFormat};
pub use json::{JsonDecoder, JsonEncoder, JsonFormat};
pub use value::{ValueCodec, ValueDecoder, ValueEncoder, ValueFormat};
pub use xml::{XmlDecoder, XmlEncoder, XmlFormat};
pub use yaml::{YamlDecoder, YamlEncoder, YamlFormat};

use hyper::header::HeaderValue;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    error::Result,
    exchange::{Inbound, ResponseSink},
};

/// A decoder bound to one request body
pub enum Decoder {
    /// XML body
    Xml(XmlDecoder),

    /// JSON body
    Json(JsonDecoder),

    /// YAML body
    Yaml(YamlDecoder),

    /// URL-encoded or multipart form
    Form(FormDecoder),

    /// Caller-supplied format
    Value(ValueDecoder),
}

impl Decoder {
    /// Decode the body into a `T`, consuming the decoder
    pub async fn decode<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            Decoder::Xml(d) => d.decode(),
            Decoder::Json(d) => d.decode(),
            Decoder::Yaml(d) => d.decode(),
            Decoder::Form(d) => d.decode().await,
            Decoder::Value(d) => d.decode(),
        }
    }
}

/// An encoder bound to one response sink
pub enum Encoder<'a> {
    /// XML output
    Xml(XmlEncoder<'a>),

    /// JSON output
    Json(JsonEncoder<'a>),

    /// YAML output
    Yaml(YamlEncoder<'a>),

    /// Caller-supplied format
    Value(ValueEncoder<'a>),
}

impl Encoder<'_> {
    /// The canonical MIME type written to `Content-Type`
    ///
    /// This is not the registry token: "json" selects the encoder, while
    /// "application/json" is what the client gets back.
    pub fn content_type(&self) -> HeaderValue {
        match self {
            Encoder::Xml(_) => HeaderValue::from_static(xml::CONTENT_TYPE),
            Encoder::Json(_) => HeaderValue::from_static(json::CONTENT_TYPE),
            Encoder::Yaml(_) => HeaderValue::from_static(yaml::CONTENT_TYPE),
            Encoder::Value(e) => e.content_type(),
        }
    }

    /// Set the content type on the sink and write `value`, consuming the encoder
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<()> {
        match self {
            Encoder::Xml(e) => e.encode(value),
            Encoder::Json(e) => e.encode(value),
            Encoder::Yaml(e) => e.encode(value),
            Encoder::Value(e) => e.encode(value),
        }
    }
}

/// Factory for decoders, held by a decoder registry
///
/// Implemented by the reference formats and by any
/// `Fn(Inbound<'_>) -> Decoder` closure.
pub trait MakeDecoder: Send + Sync {
    /// Bind a new decoder to the request
    fn make_decoder(&self, req: Inbound<'_>) -> Decoder;
}

impl<F> MakeDecoder for F
where
    F: Fn(Inbound<'_>) -> Decoder + Send + Sync,
{
    fn make_decoder(&self, req: Inbound<'_>) -> Decoder {
        self(req)
    }
}

/// Factory for encoders, held by an encoder registry
pub trait MakeEncoder: Send + Sync {
    /// Bind a new encoder to the response sink
    fn make_encoder<'a>(&self, sink: &'a mut ResponseSink) -> Encoder<'a>;
}

impl<F> MakeEncoder for F
where
    F: for<'a> Fn(&'a mut ResponseSink) -> Encoder<'a> + Send + Sync,
{
    fn make_encoder<'a>(&self, sink: &'a mut ResponseSink) -> Encoder<'a> {
        self(sink)
    }
}
