//! `POST /upload`: encode an uploaded image as Base64.

use axum::{
    Json,
    extract::{
        Multipart, Query, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::QueryRejection,
    },
    http::{HeaderMap, StatusCode, header},
};
use tracing::{debug, info};

use crate::AppState;
use crate::api::handlers::request_language;
use crate::api::models::{ErrorBody, LanguageQuery, UploadResponse};
use crate::codec;
use crate::config::Config;
use crate::errors::{Error, LocalizedError, Result};
use crate::format::{self, ImageFormat};

#[utoipa::path(
    post,
    path = "/upload",
    tag = "conversion",
    summary = "Convert image to Base64",
    description = "Upload an image as multipart form data (`image` file part, optional `format` name) and receive its Base64 encoding.",
    params(LanguageQuery),
    request_body(
        content_type = "multipart/form-data",
        description = "Fields: `image` (required, file) and `format` (optional, one of jpeg/png/gif/bmp/webp/svg/tiff)"
    ),
    responses(
        (status = 200, description = "Image encoded", body = UploadResponse),
        (status = 400, description = "Missing image or unsupported format", body = ErrorBody),
        (status = 413, description = "Payload too large", body = ErrorBody),
        (status = 415, description = "Request is not multipart/form-data"),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn upload_image(
    State(state): State<AppState>,
    query: std::result::Result<Query<LanguageQuery>, QueryRejection>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Json<UploadResponse>, LocalizedError> {
    let language = request_language(&state.config, &query, &headers);

    encode_upload(&state.config, &headers, multipart)
        .await
        .map(Json)
        .map_err(|e| e.with_language(language))
}

async fn encode_upload(
    config: &Config,
    headers: &HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<UploadResponse> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.to_ascii_lowercase().contains("multipart/form-data") {
        return Err(Error::UnsupportedContentType {
            content_type: content_type.to_string(),
        });
    }

    let mut multipart = multipart.map_err(|e| Error::Internal {
        operation: format!("parse multipart request: {e}"),
    })?;

    let limit = config.limits.max_upload_size;
    let mut image: Option<(Option<String>, Vec<u8>)> = None;
    let mut format_hint: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(e, limit))? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "image" => {
                let filename = field.file_name().map(|s| s.to_string());
                let data = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
                image = Some((filename, data.to_vec()));
            }
            "format" => {
                format_hint = Some(field.text().await.map_err(|e| multipart_error(e, limit))?);
            }
            other => {
                debug!(field = other, "Ignoring unexpected multipart field");
            }
        }
    }

    let (filename, data) = image.ok_or(Error::MissingPayload)?;
    let format = resolve_format(config, format_hint.as_deref())?;
    let detected = format::detect_bytes(&data);

    info!(
        size = data.len(),
        format = %format,
        detected = ?detected,
        extension_hint = ?filename.as_deref().and_then(ImageFormat::from_extension),
        "Encoding uploaded image"
    );

    if config.verify_signature && detected != Some(format) {
        return Err(Error::FormatMismatch { claimed: format, detected });
    }

    Ok(UploadResponse {
        base64: codec::encode(&data),
    })
}

/// The declared format, or the configured default when none (or an empty one) was sent.
fn resolve_format(config: &Config, hint: Option<&str>) -> Result<ImageFormat> {
    let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty()) else {
        return Ok(config.formats.default_format);
    };

    match hint.parse::<ImageFormat>() {
        Ok(format) if config.is_format_enabled(format) => Ok(format),
        _ => Err(Error::UnsupportedFormat { format: hint.to_string() }),
    }
}

fn multipart_error(err: MultipartError, limit: usize) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge { limit }
    } else {
        Error::Internal {
            operation: format!("read multipart data: {}", err.body_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FormatsConfig, LimitsConfig};
    use crate::test_utils::{create_test_app, create_test_config};
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::Value;

    const PNG_PAYLOAD: [u8; 10] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00];

    fn image_part(bytes: &[u8], filename: &str) -> Part {
        Part::bytes(bytes.to_vec()).file_name(filename).mime_type("application/octet-stream")
    }

    #[test_log::test(tokio::test)]
    async fn test_upload_returns_base64() {
        let server = create_test_app(create_test_config());

        let form = MultipartForm::new().add_part("image", image_part(&PNG_PAYLOAD, "tiny.png"));
        let response = server.post("/upload").multipart(form).await;

        response.assert_status(StatusCode::OK);
        assert_eq!(response.header("content-type"), "application/json");
        let body: UploadResponse = response.json();
        assert_eq!(codec::decode(&body.base64).unwrap(), PNG_PAYLOAD);
        assert!(body.base64.starts_with("iVBORw0KGgo"));
    }

    #[tokio::test]
    async fn test_upload_with_explicit_format() {
        let server = create_test_app(create_test_config());

        let form = MultipartForm::new()
            .add_text("format", "jpeg")
            .add_part("image", image_part(&[0xFF, 0xD8, 0xFF, 0xE0], "photo.JPG"));
        let response = server.post("/upload").multipart(form).await;

        response.assert_status(StatusCode::OK);
        let body: UploadResponse = response.json();
        assert_eq!(body.base64, "/9j/4A==");
    }

    #[tokio::test]
    async fn test_upload_empty_image_is_not_missing() {
        let server = create_test_app(create_test_config());

        let form = MultipartForm::new().add_part("image", image_part(&[], "empty.png"));
        let response = server.post("/upload").multipart(form).await;

        response.assert_status(StatusCode::OK);
        let body: UploadResponse = response.json();
        assert_eq!(body.base64, "");
    }

    #[tokio::test]
    async fn test_upload_unsupported_format() {
        let server = create_test_app(create_test_config());

        let form = MultipartForm::new()
            .add_text("format", "exe")
            .add_part("image", image_part(&PNG_PAYLOAD, "tiny.png"));
        let response = server.post("/upload").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "Unsupported image format");
    }

    #[tokio::test]
    async fn test_upload_format_outside_allowlist() {
        let mut config = create_test_config();
        config.formats = FormatsConfig {
            supported: vec![ImageFormat::Png, ImageFormat::Jpeg],
            default_format: ImageFormat::Png,
        };
        let server = create_test_app(config);

        let form = MultipartForm::new()
            .add_text("format", "gif")
            .add_part("image", image_part(b"GIF89a", "anim.gif"));
        let response = server.post("/upload").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_upload_missing_image() {
        let server = create_test_app(create_test_config());

        let form = MultipartForm::new().add_text("format", "png");
        let response = server.post("/upload").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "No image uploaded");
    }

    #[tokio::test]
    async fn test_missing_image_checked_before_format() {
        let server = create_test_app(create_test_config());

        let form = MultipartForm::new().add_text("format", "exe");
        let response = server.post("/upload").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "No image uploaded");
    }

    #[tokio::test]
    async fn test_upload_error_messages_follow_language() {
        let server = create_test_app(create_test_config());

        let form = MultipartForm::new().add_text("format", "png");
        let response = server.post("/upload?lang=zh").multipart(form).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "未上传图片");

        let form = MultipartForm::new().add_text("format", "png");
        let response = server
            .post("/upload")
            .add_header("accept-language", "zh-CN,zh;q=0.9")
            .multipart(form)
            .await;
        let body: Value = response.json();
        assert_eq!(body["error"], "未上传图片");
    }

    #[tokio::test]
    async fn test_upload_rejects_non_multipart() {
        let server = create_test_app(create_test_config());

        let response = server
            .post("/upload")
            .json(&serde_json::json!({ "image": "iVBORw0KGgo=" }))
            .await;

        response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(response.header("content-type").to_str().unwrap().starts_with("text/plain"));
        assert_eq!(response.text(), "Unsupported content type");
    }

    #[tokio::test]
    async fn test_upload_too_large() {
        let mut config = create_test_config();
        config.limits = LimitsConfig { max_upload_size: 1024 };
        let server = create_test_app(config);

        let form = MultipartForm::new().add_part("image", image_part(&vec![0u8; 64 * 1024], "big.png"));
        let response = server.post("/upload").multipart(form).await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_signature_verification() {
        let mut config = create_test_config();
        config.verify_signature = true;
        let server = create_test_app(config);

        // PNG bytes declared as jpeg
        let form = MultipartForm::new()
            .add_text("format", "jpeg")
            .add_part("image", image_part(&PNG_PAYLOAD, "renamed.jpg"));
        let response = server.post("/upload").multipart(form).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "Uploaded data does not match the declared format");

        // Matching signature passes
        let form = MultipartForm::new()
            .add_text("format", "png")
            .add_part("image", image_part(&PNG_PAYLOAD, "tiny.png"));
        let response = server.post("/upload").multipart(form).await;
        response.assert_status(StatusCode::OK);
    }

    #[test]
    fn test_resolve_format() {
        let config = create_test_config();

        assert_eq!(resolve_format(&config, None).unwrap(), ImageFormat::Png);
        assert_eq!(resolve_format(&config, Some("  ")).unwrap(), ImageFormat::Png);
        assert_eq!(resolve_format(&config, Some("TIFF")).unwrap(), ImageFormat::Tiff);
        assert!(matches!(
            resolve_format(&config, Some("exe")),
            Err(Error::UnsupportedFormat { format }) if format == "exe"
        ));
    }
}
