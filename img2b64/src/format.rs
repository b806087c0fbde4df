//! Image format detection.
//!
//! Two independent strategies classify an image into one of the supported [`ImageFormat`]s:
//!
//! - **Extension-based** ([`detect_file_extension`], [`ImageFormat::from_extension`]): a lookup on
//!   the lowercased text after the last `.` of a filename. This is a hint only; a renamed file can
//!   claim any extension.
//! - **Signature-based** ([`detect_signature`], [`detect_bytes`]): a first-match-wins prefix test
//!   against the Base64 encoding of each format's magic bytes. This is what should be trusted when
//!   validating an upload.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

use crate::codec;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Webp,
    Svg,
    Tiff,
}

/// Base64 magic prefixes, in match order.
const SIGNATURES: [(ImageFormat, &str); 7] = [
    (ImageFormat::Jpeg, "/9j/"),
    (ImageFormat::Png, "iVBORw0KGgo"),
    (ImageFormat::Gif, "R0lGODlh"),
    (ImageFormat::Bmp, "Qk0"),
    (ImageFormat::Webp, "UklGRhIAA"),
    (ImageFormat::Svg, "PHN2ZyB"),
    (ImageFormat::Tiff, "SUkqAA"),
];

/// Number of leading bytes that cover every signature once encoded. A multiple of 3, so the
/// encoded prefix is identical to the prefix of the full encoding.
const SNIFF_LEN: usize = 12;

impl ImageFormat {
    /// Every supported format, in signature-table order.
    pub const ALL: [ImageFormat; 7] = [
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::Gif,
        ImageFormat::Bmp,
        ImageFormat::Webp,
        ImageFormat::Svg,
        ImageFormat::Tiff,
    ];

    /// Lowercase name used on the wire (`format` form field, JSON).
    pub fn name(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Webp => "webp",
            ImageFormat::Svg => "svg",
            ImageFormat::Tiff => "tiff",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Svg => "image/svg+xml",
            ImageFormat::Tiff => "image/tiff",
        }
    }

    /// File extension used when offering a decoded image for download.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            other => other.name(),
        }
    }

    /// The Base64 prefix that identifies this format.
    pub fn signature(self) -> &'static str {
        SIGNATURES
            .iter()
            .find(|(format, _)| *format == self)
            .map(|(_, prefix)| *prefix)
            .unwrap_or_default()
    }

    /// Look up a format from a filename's extension.
    ///
    /// The extension is whatever follows the last `.`, or the whole name when there is no `.`.
    pub fn from_extension(filename: &str) -> Option<Self> {
        let extension = filename.rsplit('.').next().unwrap_or(filename).to_ascii_lowercase();
        match extension.as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "gif" => Some(ImageFormat::Gif),
            "bmp" => Some(ImageFormat::Bmp),
            "webp" => Some(ImageFormat::Webp),
            "svg" => Some(ImageFormat::Svg),
            "tiff" => Some(ImageFormat::Tiff),
            _ => None,
        }
    }

    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let mime = mime.split(';').next().unwrap_or_default().trim();
        Self::ALL.into_iter().find(|format| format.mime_type().eq_ignore_ascii_case(mime))
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported image format: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for ImageFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "png" => Ok(ImageFormat::Png),
            "gif" => Ok(ImageFormat::Gif),
            "bmp" => Ok(ImageFormat::Bmp),
            "webp" => Ok(ImageFormat::Webp),
            "svg" => Ok(ImageFormat::Svg),
            "tiff" => Ok(ImageFormat::Tiff),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// MIME type for a filename, based on its extension alone.
pub fn detect_file_extension(filename: &str) -> Option<&'static str> {
    ImageFormat::from_extension(filename).map(ImageFormat::mime_type)
}

/// Classify Base64 text by its leading characters.
pub fn detect_signature(base64: &str) -> Option<ImageFormat> {
    SIGNATURES
        .iter()
        .find(|(_, prefix)| base64.starts_with(prefix))
        .map(|(format, _)| *format)
}

/// Classify raw bytes with the same signature table as [`detect_signature`].
pub fn detect_bytes(bytes: &[u8]) -> Option<ImageFormat> {
    let head = &bytes[..bytes.len().min(SNIFF_LEN)];
    detect_signature(&codec::encode(head))
}

/// Whether `mime` names one of the supported image types.
pub fn is_supported_mime(mime: &str) -> bool {
    ImageFormat::from_mime_type(mime).is_some()
}

/// The signature table in match order, for handing to the client script.
pub fn signature_table() -> impl Iterator<Item = (ImageFormat, &'static str)> {
    SIGNATURES.iter().copied()
}
