use crate::api::models::ErrorBody;
use crate::codec::CodecError;
use crate::format::ImageFormat;
use crate::page::{Language, Translations};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// No `image` part in the upload
    #[error("No image provided")]
    MissingPayload,

    /// Format hint outside the supported set (or the configured allowlist)
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Signature of the uploaded bytes contradicts the declared format
    #[error("Declared format {claimed} but data looks like {}", .detected.map(|d| d.name()).unwrap_or("an unknown format"))]
    FormatMismatch {
        claimed: ImageFormat,
        detected: Option<ImageFormat>,
    },

    /// Malformed Base64 on decode
    #[error(transparent)]
    InvalidEncoding(#[from] CodecError),

    /// Upload exceeds the configured body limit
    #[error("Payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Request body could not be understood
    #[error("{message}")]
    BadRequest { message: String },

    /// Request body is not in the expected encoding
    #[error("Unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    /// Method/path combination the service does not handle
    #[error("Invalid request: {method} {path}")]
    InvalidRequest { method: String, path: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingPayload
            | Error::UnsupportedFormat { .. }
            | Error::FormatMismatch { .. }
            | Error::InvalidEncoding(_)
            | Error::BadRequest { .. }
            | Error::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::UnsupportedContentType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::Internal { .. } | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self, t: &Translations) -> String {
        match self {
            Error::MissingPayload => t.missing_image.to_string(),
            Error::UnsupportedFormat { .. } => t.unsupported_format.to_string(),
            Error::FormatMismatch { .. } => t.format_mismatch.to_string(),
            Error::InvalidEncoding(_) => t.invalid_base64.to_string(),
            Error::PayloadTooLarge { .. } => t.payload_too_large.to_string(),
            Error::UnsupportedContentType { .. } => t.unsupported_content_type.to_string(),
            Error::BadRequest { .. } | Error::InvalidRequest { .. } => t.invalid_request.to_string(),
            Error::Internal { .. } | Error::Other(_) => t.processing_error.to_string(),
        }
    }

    /// Whether the response body is plain text rather than `{"error": ...}`
    fn is_plain_text(&self) -> bool {
        matches!(self, Error::UnsupportedContentType { .. } | Error::InvalidRequest { .. })
    }

    pub fn with_language(self, language: Language) -> LocalizedError {
        LocalizedError { error: self, language }
    }
}

/// An [`Error`] paired with the language its message should be rendered in.
#[derive(Debug)]
pub struct LocalizedError {
    pub error: Error,
    pub language: Language,
}

impl IntoResponse for LocalizedError {
    fn into_response(self) -> Response {
        let LocalizedError { error, language } = self;

        match &error {
            Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", error);
            }
            Error::PayloadTooLarge { .. } => {
                tracing::warn!("Rejected upload: {}", error);
            }
            _ => {
                tracing::debug!("Client error: {}", error);
            }
        }

        let status = error.status_code();
        let message = error.user_message(language.translations());

        if error.is_plain_text() {
            (status, message).into_response()
        } else {
            (status, Json(ErrorBody { error: message })).into_response()
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.with_language(Language::default()).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(response: Response) -> (StatusCode, Option<String>, String) {
        let status = response.status();
        let content_type = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_client_errors_render_as_json() {
        let (status, content_type, body) = body_of(Error::MissingPayload.into_response()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body, r#"{"error":"No image uploaded"}"#);
    }

    #[tokio::test]
    async fn test_content_type_error_is_plain_text() {
        let error = Error::UnsupportedContentType {
            content_type: "application/json".to_string(),
        };
        let (status, content_type, body) = body_of(error.into_response()).await;

        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(content_type.unwrap().starts_with("text/plain"));
        assert_eq!(body, "Unsupported content type");
    }

    #[tokio::test]
    async fn test_internal_errors_do_not_leak_details() {
        let error = Error::Other(anyhow::anyhow!("disk on fire at /var/secret"));
        let (status, _, body) = body_of(error.with_language(Language::Zh).into_response()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"error":"处理图片时发生错误"}"#);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::UnsupportedFormat { format: "exe".into() }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::PayloadTooLarge { limit: 1 }.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            Error::InvalidEncoding(CodecError::InvalidEncoding { reason: "x".into() }).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Internal { operation: "x".into() }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
