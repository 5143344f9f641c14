//! URL-encoded and multipart form decoding
//!
//! Form fields are collected as `(key, value)` pairs, body first and then the
//! URL query string, and bound into the destination by dotted key paths:
//! `location.address=internets` fills `location: Location { address }`.

mod binder;

use std::fmt::Display;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    codec::{Decoder, MakeDecoder},
    error::Result,
    exchange::Inbound,
};

/// Default multipart memory budget, in bytes
pub const DEFAULT_MAX_MEMORY: usize = 4096;

/// Text field allowance granted on top of the memory budget, in bytes
pub const TEXT_ALLOWANCE: usize = 10 << 20;

/// Errors produced while parsing or binding form fields
#[derive(Debug, Error)]
pub enum FormError {
    /// The body or query string is not valid `application/x-www-form-urlencoded`
    #[error(transparent)]
    Urlencoded(#[from] serde_urlencoded::de::Error),

    /// A key is used both as a value and as the parent of dotted keys
    #[error("form key {0:?} is used both as a value and as a parent of nested keys")]
    ConflictingKey(String),

    /// Multipart text fields exceed the text size limit
    #[error("multipart text fields exceed the {limit} byte limit")]
    TooLarge { limit: usize },

    /// A field value could not be converted to the destination type
    #[error("invalid value {value:?}: {reason}")]
    InvalidValue { value: String, reason: String },

    /// Any other binding error reported by the destination type
    #[error("{0}")]
    Bind(String),
}

impl serde::de::Error for FormError {
    fn custom<T: Display>(msg: T) -> Self {
        FormError::Bind(msg.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormKind {
    UrlEncoded,
    Multipart {
        max_memory: usize,
        max_text_size: Option<usize>,
    },
}

/// Factory for form decoders
///
/// # Example
///
/// ```
/// use tower_negotiate::{codec::FormFormat, DecoderRegistry};
///
/// let registry = DecoderRegistry::new()
///     .with("form-urlencoded", FormFormat::urlencoded())
///     .with("multipart/form-data", FormFormat::multipart().max_memory(1 << 20));
/// assert_eq!(registry.len(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormFormat {
    kind: FormKind,
}

impl FormFormat {
    /// Decode `application/x-www-form-urlencoded` bodies
    pub fn urlencoded() -> Self {
        Self {
            kind: FormKind::UrlEncoded,
        }
    }

    /// Decode `multipart/form-data` bodies, keeping text fields only
    pub fn multipart() -> Self {
        Self {
            kind: FormKind::Multipart {
                max_memory: DEFAULT_MAX_MEMORY,
                max_text_size: None,
            },
        }
    }

    /// Set the multipart memory budget; no effect on urlencoded forms
    ///
    /// Unless [`max_text_size`](Self::max_text_size) is set, text fields may
    /// total this budget plus [`TEXT_ALLOWANCE`].
    pub fn max_memory(mut self, bytes: usize) -> Self {
        if let FormKind::Multipart { max_memory, .. } = &mut self.kind {
            *max_memory = bytes;
        }
        self
    }

    /// Set the total size allowed for multipart text fields; no effect on
    /// urlencoded forms
    pub fn max_text_size(mut self, bytes: usize) -> Self {
        if let FormKind::Multipart { max_text_size, .. } = &mut self.kind {
            *max_text_size = Some(bytes);
        }
        self
    }
}

impl MakeDecoder for FormFormat {
    fn make_decoder(&self, req: Inbound<'_>) -> Decoder {
        Decoder::Form(FormDecoder {
            kind: self.kind,
            content_type: req.content_type().to_owned(),
            query: req.query().map(str::to_owned),
            body: req.body,
        })
    }
}

/// Decoder for one form submission
#[derive(Debug)]
pub struct FormDecoder {
    kind: FormKind,
    content_type: String,
    query: Option<String>,
    body: Bytes,
}

impl FormDecoder {
    /// Parse the form fields and bind them into a `T`
    pub async fn decode<T: DeserializeOwned>(self) -> Result<T> {
        let mut pairs = match self.kind {
            FormKind::UrlEncoded => parse_urlencoded(&self.body)?,
            FormKind::Multipart {
                max_memory,
                max_text_size,
            } => {
                let limit =
                    max_text_size.unwrap_or_else(|| max_memory.saturating_add(TEXT_ALLOWANCE));
                read_multipart(&self.content_type, self.body, limit).await?
            }
        };

        if let Some(query) = &self.query {
            pairs.extend(parse_urlencoded(query.as_bytes())?);
        }

        tracing::trace!(fields = pairs.len(), "binding form fields");
        Ok(binder::from_pairs(pairs)?)
    }
}

fn parse_urlencoded(input: &[u8]) -> Result<Vec<(String, String)>, FormError> {
    Ok(serde_urlencoded::from_bytes(input)?)
}

async fn read_multipart(
    content_type: &str,
    body: Bytes,
    limit: usize,
) -> Result<Vec<(String, String)>> {
    let boundary = multer::parse_boundary(content_type)?;
    let stream = futures::stream::once(futures::future::ready(Ok::<_, std::io::Error>(body)));
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut pairs = Vec::new();
    let mut text_size = 0usize;

    while let Some(field) = multipart.next_field().await? {
        // File parts are not bound; an empty filename is a plain value
        if field.file_name().is_some_and(|name| !name.is_empty()) {
            continue;
        }
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        let text = field.text().await?;
        text_size += text.len();
        if text_size > limit {
            return Err(FormError::TooLarge { limit }.into());
        }

        pairs.push((name, text));
    }

    Ok(pairs)
}
