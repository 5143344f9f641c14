//! YAML codec
//!
//! serde_yaml works on whole documents, so the decoder parses the buffered
//! body in one go and the encoder renders the full document before writing it.

use bytes::Bytes;
use hyper::header::HeaderValue;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    codec::{Decoder, Encoder, MakeDecoder, MakeEncoder},
    error::{Error, Result},
    exchange::{Inbound, ResponseSink},
};

/// MIME type written by the YAML encoder
pub const CONTENT_TYPE: &str = "text/yaml";

/// Factory for the YAML decoder and encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFormat;

impl MakeDecoder for YamlFormat {
    fn make_decoder(&self, req: Inbound<'_>) -> Decoder {
        Decoder::Yaml(YamlDecoder::new(req.body))
    }
}

impl MakeEncoder for YamlFormat {
    fn make_encoder<'a>(&self, sink: &'a mut ResponseSink) -> Encoder<'a> {
        Encoder::Yaml(YamlEncoder::new(sink))
    }
}

/// Reads a YAML document from a request body
#[derive(Debug)]
pub struct YamlDecoder {
    body: Bytes,
}

impl YamlDecoder {
    /// Create a new YAML decoder over `body`
    pub fn new(body: Bytes) -> Self {
        Self { body }
    }

    /// Decode the body
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_yaml::from_slice(&self.body)?)
    }
}

/// Writes YAML to a response sink
#[derive(Debug)]
pub struct YamlEncoder<'a> {
    sink: &'a mut ResponseSink,
}

impl<'a> YamlEncoder<'a> {
    /// Create a new YAML encoder over `sink`
    pub fn new(sink: &'a mut ResponseSink) -> Self {
        Self { sink }
    }

    /// Encode `value` as one YAML document
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<()> {
        self.sink.set_content_type(HeaderValue::from_static(CONTENT_TYPE));
        let document = serde_yaml::to_string(value).map_err(Error::YamlWrite)?;
        self.sink.push(document.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_decode_single_space_indent() {
        let body = Bytes::from_static(b"outer:\n inner: value\n");
        let map: BTreeMap<String, BTreeMap<String, String>> =
            YamlDecoder::new(body).decode().unwrap();
        assert_eq!(map["outer"]["inner"], "value");
    }

    #[test]
    fn test_decode_error_passes_through() {
        let err = YamlDecoder::new(Bytes::from_static(b"items: [unclosed"))
            .decode::<BTreeMap<String, Vec<String>>>()
            .unwrap_err();
        assert!(matches!(err, crate::Error::Yaml(_)));
    }

    #[test]
    fn test_encode() {
        let mut sink = ResponseSink::new();
        let value = BTreeMap::from([("name", "Bob")]);
        YamlEncoder::new(&mut sink).encode(&value).unwrap();

        assert_eq!(sink.content_type(), Some("text/yaml"));
        assert_eq!(sink.body(), b"name: Bob\n");
    }
}
