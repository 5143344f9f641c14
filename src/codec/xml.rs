//! XML codec backed by quick-xml's serde support
//!
//! The root element is named after the serialized type, so destination types
//! usually carry `#[serde(rename = "...")]` to pick their element name.
//! Decoding ignores the root element's name.

use bytes::{Buf, Bytes};
use hyper::header::HeaderValue;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    codec::{Decoder, Encoder, MakeDecoder, MakeEncoder},
    error::Result,
    exchange::{Inbound, ResponseSink},
};

/// MIME type written by the XML encoder
pub const CONTENT_TYPE: &str = "application/xml";

/// Factory for the XML decoder and encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlFormat;

impl MakeDecoder for XmlFormat {
    fn make_decoder(&self, req: Inbound<'_>) -> Decoder {
        Decoder::Xml(XmlDecoder::new(req.body))
    }
}

impl MakeEncoder for XmlFormat {
    fn make_encoder<'a>(&self, sink: &'a mut ResponseSink) -> Encoder<'a> {
        Encoder::Xml(XmlEncoder::new(sink))
    }
}

/// Reads an XML document from a request body
#[derive(Debug)]
pub struct XmlDecoder {
    body: Bytes,
}

impl XmlDecoder {
    /// Create a new XML decoder over `body`
    pub fn new(body: Bytes) -> Self {
        Self { body }
    }

    /// Decode the body
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        Ok(quick_xml::de::from_reader(self.body.reader())?)
    }
}

/// Writes XML to a response sink
#[derive(Debug)]
pub struct XmlEncoder<'a> {
    sink: &'a mut ResponseSink,
}

impl<'a> XmlEncoder<'a> {
    /// Create a new XML encoder over `sink`
    pub fn new(sink: &'a mut ResponseSink) -> Self {
        Self { sink }
    }

    /// Encode `value` as a single element
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<()> {
        self.sink.set_content_type(HeaderValue::from_static(CONTENT_TYPE));
        quick_xml::se::to_writer(&mut *self.sink, value)?;
        Ok(())
    }
}
