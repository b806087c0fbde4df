//! Request and response bodies for the conversion endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Successful upload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Standard, padded Base64 encoding of the uploaded image
    pub base64: String,
}

/// Body of `POST /decode`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DecodeRequest {
    /// Base64 text, or a full `data:image/...;base64,` URI
    pub base64: String,
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// Optional language override, accepted by every endpoint
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LanguageQuery {
    /// `en` or `zh`; falls back to `Accept-Language`, then the configured default
    pub lang: Option<String>,
}
