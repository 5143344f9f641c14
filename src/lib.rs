//! # Tower Negotiate
//!
//! Header-driven content negotiation for `hyper` and `tower` services.
//!
//! Request bodies are decoded by matching the `Content-Type` header against a
//! registry of decoders, and responses are encoded by matching the `Accept`
//! header against a registry of encoders. Both registries are ordered lists of
//! format tokens; the first token found anywhere in the header wins.
//!
//! ## Features
//!
//! - **Built-in formats**: XML, JSON, YAML, URL-encoded and multipart forms
//! - **Pluggable**: register caller formats through [`codec::ValueFormat`]
//! - **Scoped registries**: process-wide defaults, or per-service through
//!   [`NegotiationLayer`]
//! - **Fallbacks**: [`write_or_else`] hands the response to the caller when no
//!   encoder matches
//!
//! ## Example
//!
//! ```rust
//! use http_body_util::Full;
//! use hyper::{body::Bytes, Request};
//! use serde::{Deserialize, Serialize};
//! use tower_negotiate::prelude::*;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Location {
//!     address: String,
//! }
//!
//! # tokio_test::block_on(async {
//! let request = Request::builder()
//!     .header("Content-Type", "application/x-www-form-urlencoded")
//!     .header("Accept", "application/json")
//!     .body(Full::new(Bytes::from("address=internets")))
//!     .unwrap();
//! let (parts, body) = request.into_parts();
//!
//! let (format, location) = bind::<Location, _>(&parts, body).await;
//! assert_eq!(format, "form-urlencoded");
//!
//! let mut sink = ResponseSink::new();
//! write(&mut sink, &parts, &location.unwrap()).unwrap();
//! assert_eq!(sink.body(), b"{\"address\":\"internets\"}\n");
//! # });
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod exchange;
pub mod layer;
pub mod negotiator;
pub mod registry;

pub use config::NegotiatorConfig;
pub use error::{BoxError, Error, Result};
pub use exchange::{Inbound, ResponseSink};
pub use layer::{NegotiationLayer, NegotiationService};
pub use negotiator::{bind, write, write_or_else, Negotiator};
pub use registry::{
    default_decoders, default_encoders, set_default_decoders, set_default_encoders,
    update_default_decoders, update_default_encoders, DecoderRegistry, EncoderRegistry, Registry,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        bind,
        codec::{FormFormat, JsonFormat, ValueCodec, ValueFormat, XmlFormat, YamlFormat},
        write, write_or_else, DecoderRegistry, EncoderRegistry, Error, NegotiationLayer,
        Negotiator, NegotiatorConfig, ResponseSink,
    };
}
