//! JSON codec

use std::io::Write;

use bytes::Bytes;
use hyper::header::HeaderValue;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    codec::{Decoder, Encoder, MakeDecoder, MakeEncoder},
    error::{Error, Result},
    exchange::{Inbound, ResponseSink},
};

/// MIME type written by the JSON encoder
pub const CONTENT_TYPE: &str = "application/json";

/// Factory for the JSON decoder and encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl MakeDecoder for JsonFormat {
    fn make_decoder(&self, req: Inbound<'_>) -> Decoder {
        Decoder::Json(JsonDecoder::new(req.body))
    }
}

impl MakeEncoder for JsonFormat {
    fn make_encoder<'a>(&self, sink: &'a mut ResponseSink) -> Encoder<'a> {
        Encoder::Json(JsonEncoder::new(sink))
    }
}

/// Reads one JSON document from a request body
#[derive(Debug)]
pub struct JsonDecoder {
    body: Bytes,
}

impl JsonDecoder {
    /// Create a new JSON decoder over `body`
    pub fn new(body: Bytes) -> Self {
        Self { body }
    }

    /// Decode the first JSON value in the body
    ///
    /// Anything after that value is left unread.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        let mut deserializer = serde_json::Deserializer::from_slice(&self.body);
        Ok(T::deserialize(&mut deserializer)?)
    }
}

/// Writes JSON to a response sink
#[derive(Debug)]
pub struct JsonEncoder<'a> {
    sink: &'a mut ResponseSink,
}

impl<'a> JsonEncoder<'a> {
    /// Create a new JSON encoder over `sink`
    pub fn new(sink: &'a mut ResponseSink) -> Self {
        Self { sink }
    }

    /// Encode `value`, terminated by a newline
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<()> {
        self.sink.set_content_type(HeaderValue::from_static(CONTENT_TYPE));
        serde_json::to_writer(&mut *self.sink, value).map_err(Error::JsonWrite)?;
        self.sink.write_all(b"\n")?;
        Ok(())
    }
}
