//! Caller-supplied formats
//!
//! A [`ValueFormat`] converts between body bytes and a `serde_json::Value`.
//! Wrapped in a [`ValueCodec`] it can be inserted into decoder and encoder
//! registries next to the reference formats.

use std::{fmt, sync::Arc};

use bytes::Bytes;
use hyper::header::HeaderValue;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    codec::{Decoder, Encoder, MakeDecoder, MakeEncoder},
    error::{BoxError, Error, Result},
    exchange::{Inbound, ResponseSink},
};

/// A wire format expressed in terms of `serde_json::Value`
#[cfg_attr(test, mockall::automock)]
pub trait ValueFormat: Send + Sync {
    /// MIME type to send back when encoding
    fn content_type(&self) -> HeaderValue;

    /// Parse a request body
    fn decode_value(&self, body: &[u8]) -> Result<Value, BoxError>;

    /// Render a value as a response body
    fn encode_value(&self, value: &Value) -> Result<Vec<u8>, BoxError>;
}

/// Registry factory for a [`ValueFormat`]
#[derive(Clone)]
pub struct ValueCodec {
    format: Arc<dyn ValueFormat>,
}

impl ValueCodec {
    /// Wrap a format
    pub fn new(format: impl ValueFormat + 'static) -> Self {
        Self {
            format: Arc::new(format),
        }
    }
}

impl fmt::Debug for ValueCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCodec")
            .field("content_type", &self.format.content_type())
            .finish()
    }
}

impl MakeDecoder for ValueCodec {
    fn make_decoder(&self, req: Inbound<'_>) -> Decoder {
        Decoder::Value(ValueDecoder {
            format: self.format.clone(),
            body: req.body,
        })
    }
}

impl MakeEncoder for ValueCodec {
    fn make_encoder<'a>(&self, sink: &'a mut ResponseSink) -> Encoder<'a> {
        Encoder::Value(ValueEncoder {
            format: self.format.clone(),
            sink,
        })
    }
}

/// Decoder for a caller-supplied format
pub struct ValueDecoder {
    format: Arc<dyn ValueFormat>,
    body: Bytes,
}

impl ValueDecoder {
    /// Decode the body
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        let value = self
            .format
            .decode_value(&self.body)
            .map_err(Error::ValueRead)?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Encoder for a caller-supplied format
pub struct ValueEncoder<'a> {
    format: Arc<dyn ValueFormat>,
    sink: &'a mut ResponseSink,
}

impl ValueEncoder<'_> {
    /// The MIME type this format writes
    pub fn content_type(&self) -> HeaderValue {
        self.format.content_type()
    }

    /// Encode `value`
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<()> {
        self.sink.set_content_type(self.format.content_type());
        let value = serde_json::to_value(value).map_err(Error::JsonWrite)?;
        let bytes = self
            .format
            .encode_value(&value)
            .map_err(Error::ValueWrite)?;
        self.sink.push(&bytes);
        Ok(())
    }
}
