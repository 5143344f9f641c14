//! Error types for content negotiation

use hyper::StatusCode;
use thiserror::Error;

use crate::codec::form::FormError;

/// Boxed error used for request bodies and caller-supplied formats
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for bind and write operations
///
/// Apart from [`Error::InvalidFormat`], every variant carries the error of the
/// codec that failed, displayed as-is. Match on the variant to get at the
/// codec's own error type.
#[derive(Debug, Error)]
pub enum Error {
    /// No registered format token appears in the negotiated header
    #[error("invalid data format")]
    InvalidFormat,

    /// The request body could not be read, or exceeded the configured limit
    #[error(transparent)]
    Body(BoxError),

    /// JSON decode error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// JSON encode error
    #[error(transparent)]
    JsonWrite(serde_json::Error),

    /// XML decode error
    #[error(transparent)]
    Xml(#[from] quick_xml::DeError),

    /// XML encode error
    #[error(transparent)]
    XmlWrite(#[from] quick_xml::SeError),

    /// YAML decode error
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// YAML encode error
    #[error(transparent)]
    YamlWrite(serde_yaml::Error),

    /// Form parse or bind error
    #[error(transparent)]
    Form(#[from] FormError),

    /// Multipart stream error
    #[error(transparent)]
    Multipart(#[from] multer::Error),

    /// I/O error while writing to a sink
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Decode error reported by a caller-supplied format
    #[error(transparent)]
    ValueRead(BoxError),

    /// Encode error reported by a caller-supplied format
    #[error(transparent)]
    ValueWrite(BoxError),

    /// Error reported by a fallback writer or host code
    #[error(transparent)]
    Custom(BoxError),
}

impl Error {
    /// Wrap an arbitrary error, typically from a fallback writer
    pub fn custom(err: impl Into<BoxError>) -> Self {
        Error::Custom(err.into())
    }

    /// Check if this is the "no matching format" error
    pub fn is_invalid_format(&self) -> bool {
        matches!(self, Error::InvalidFormat)
    }

    /// Suggest a status code for a host translating this error into a response
    ///
    /// Nothing in this crate writes error responses; this is only a hint.
    pub fn status_hint(&self) -> StatusCode {
        match self {
            Error::InvalidFormat => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::Body(err) if err.is::<http_body_util::LengthLimitError>() => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            Error::Form(FormError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::JsonWrite(_)
            | Error::XmlWrite(_)
            | Error::YamlWrite(_)
            | Error::ValueWrite(_)
            | Error::Io(_)
            | Error::Custom(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Result type alias for negotiation operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_format_message() {
        let err = Error::InvalidFormat;
        assert_eq!(err.to_string(), "invalid data format");
        assert!(err.is_invalid_format());
        assert_eq!(err.status_hint(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_codec_error_is_transparent() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let message = json_err.to_string();

        let err = Error::from(json_err);
        assert_eq!(err.to_string(), message);
        assert!(matches!(err, Error::Json(_)));
        assert_eq!(err.status_hint(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_custom_error() {
        let err = Error::custom("template failed");
        assert_eq!(err.to_string(), "template failed");
        assert!(!err.is_invalid_format());
        assert_eq!(err.status_hint(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_encode_errors_are_server_side() {
        let json_err = serde_json::to_string(&std::collections::HashMap::from([((1, 2), 3)]))
            .unwrap_err();
        assert_eq!(
            Error::JsonWrite(json_err).status_hint(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let value_err = Error::ValueWrite("unsupported value".into());
        assert_eq!(value_err.status_hint(), StatusCode::INTERNAL_SERVER_ERROR);

        let value_err = Error::ValueRead("bad frame".into());
        assert_eq!(value_err.status_hint(), StatusCode::BAD_REQUEST);
    }
}
