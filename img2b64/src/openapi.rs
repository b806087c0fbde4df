//! OpenAPI documentation for the conversion endpoints, served at `/openapi.json` and browsable at
//! `/docs`.

use utoipa::OpenApi;

use crate::api::handlers::{decode, upload};
use crate::api::models::{DecodeRequest, ErrorBody, UploadResponse};
use crate::format::ImageFormat;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "img2b64",
        description = "Convert images to Base64 and back"
    ),
    paths(upload::upload_image, decode::decode_image),
    components(schemas(UploadResponse, DecodeRequest, ErrorBody, ImageFormat)),
    tags(
        (name = "conversion", description = "Image <-> Base64 conversion")
    )
)]
pub struct ApiDoc;
