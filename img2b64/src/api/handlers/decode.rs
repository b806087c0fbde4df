//! `POST /decode`: turn Base64 text back into a downloadable image.

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::AppState;
use crate::api::handlers::request_language;
use crate::api::models::{DecodeRequest, ErrorBody, LanguageQuery};
use crate::codec;
use crate::config::Config;
use crate::errors::{Error, Result};
use crate::format::{self, ImageFormat};

#[utoipa::path(
    post,
    path = "/decode",
    tag = "conversion",
    summary = "Convert Base64 to image",
    description = "Decode Base64 text (or a `data:` URI) into image bytes. The format is detected from the data's signature.",
    params(LanguageQuery),
    request_body = DecodeRequest,
    responses(
        (status = 200, description = "Decoded image bytes, typed by signature and served as an attachment named `image.<ext>`"),
        (status = 400, description = "Empty input, unrecognised image type, or malformed Base64", body = ErrorBody),
        (status = 413, description = "Body exceeds the upload limit", body = ErrorBody),
        (status = 415, description = "Request body is not JSON")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn decode_image(
    State(state): State<AppState>,
    query: std::result::Result<Query<LanguageQuery>, QueryRejection>,
    headers: HeaderMap,
    body: std::result::Result<Json<DecodeRequest>, JsonRejection>,
) -> Response {
    let language = request_language(&state.config, &query, &headers);

    match decode_body(&state.config, body) {
        Ok((format, bytes)) => {
            let disposition = format!("attachment; filename=\"image.{}\"", format.extension());
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, format.mime_type().to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => e.with_language(language).into_response(),
    }
}

fn decode_body(config: &Config, body: std::result::Result<Json<DecodeRequest>, JsonRejection>) -> Result<(ImageFormat, Vec<u8>)> {
    let Json(request) = body.map_err(|rejection| match rejection {
        JsonRejection::MissingJsonContentType(_) => Error::UnsupportedContentType {
            content_type: "expected application/json".to_string(),
        },
        other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => Error::PayloadTooLarge {
            limit: config.limits.max_upload_size,
        },
        other => Error::BadRequest {
            message: other.body_text(),
        },
    })?;

    // Pasted or tool-wrapped Base64 is commonly split across lines
    let text: String = codec::strip_data_uri(&request.base64)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let text = text.as_str();
    if text.is_empty() {
        return Err(Error::MissingPayload);
    }

    // Classify before decoding, so unknown data is reported as such even when it is also malformed
    let format = format::detect_signature(text)
        .filter(|f| config.is_format_enabled(*f))
        .ok_or_else(|| Error::UnsupportedFormat {
            format: text.chars().take(12).collect(),
        })?;
    let bytes = codec::decode(text)?;

    info!(size = bytes.len(), format = %format, "Decoded Base64 image");
    Ok((format, bytes))
}
