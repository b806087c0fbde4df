//! Rendering of the converter page and its translation table.
//!
//! The page is a minijinja template embedded with the other static assets. Everything
//! language-dependent comes from a [`Translations`] table selected by an explicit [`Language`]
//! argument; nothing about the current language is stored globally.

use anyhow::Context as _;
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::errors::{Error, Result};
use crate::format::{self, ImageFormat};
use crate::static_assets::Assets;

const INDEX_TEMPLATE: &str = "index.html";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }

    pub fn translations(self) -> &'static Translations {
        match self {
            Language::En => &EN,
            Language::Zh => &ZH,
        }
    }

    /// Pick the language for a request: explicit `lang` parameter, then the primary
    /// `Accept-Language` tag, then `fallback`.
    pub fn negotiate(lang_param: Option<&str>, accept_language: Option<&str>, fallback: Language) -> Language {
        if let Some(lang) = lang_param.and_then(|l| l.parse().ok()) {
            return lang;
        }
        accept_language
            .and_then(|header| header.split(',').next())
            .and_then(|tag| tag.split(';').next())
            .and_then(|tag| tag.trim().split('-').next())
            .and_then(|primary| primary.parse().ok())
            .unwrap_or(fallback)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "zh" => Ok(Language::Zh),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// Every user-visible string, for one language.
#[derive(Debug, Serialize)]
pub struct Translations {
    pub title: &'static str,
    pub heading: &'static str,
    pub upload_heading: &'static str,
    pub upload_button: &'static str,
    pub copy_button: &'static str,
    pub decode_heading: &'static str,
    pub decode_placeholder: &'static str,
    pub decode_button: &'static str,
    pub file_size: &'static str,
    pub select_image: &'static str,
    pub copied: &'static str,
    pub enter_base64: &'static str,
    pub unsupported_image_type: &'static str,
    pub invalid_base64: &'static str,
    pub upload_failed: &'static str,
    pub missing_image: &'static str,
    pub unsupported_format: &'static str,
    pub format_mismatch: &'static str,
    pub payload_too_large: &'static str,
    pub processing_error: &'static str,
    pub unsupported_content_type: &'static str,
    pub invalid_request: &'static str,
}

static EN: Translations = Translations {
    title: "Image to Base64 Converter",
    heading: "Image to Base64 & Base64 to Image Converter",
    upload_heading: "Upload Image and Generate Base64",
    upload_button: "Upload and Convert to Base64",
    copy_button: "Copy Base64 to Clipboard",
    decode_heading: "Convert Base64 to Image",
    decode_placeholder: "Paste Base64 encoded data here",
    decode_button: "Convert and Download Image",
    file_size: "File size",
    select_image: "Please select an image to upload.",
    copied: "Base64 copied to clipboard!",
    enter_base64: "Please enter Base64 encoded data.",
    unsupported_image_type: "Unsupported image type.",
    invalid_base64: "Invalid Base64 data. Please check and try again.",
    upload_failed: "Failed to convert image.",
    missing_image: "No image uploaded",
    unsupported_format: "Unsupported image format",
    format_mismatch: "Uploaded data does not match the declared format",
    payload_too_large: "Image is too large",
    processing_error: "An error occurred while processing the image",
    unsupported_content_type: "Unsupported content type",
    invalid_request: "Invalid Request",
};

static ZH: Translations = Translations {
    title: "图片转 Base64 工具",
    heading: "图片转 Base64 & Base64 转图片",
    upload_heading: "上传图片并生成 Base64",
    upload_button: "上传并转换为 Base64",
    copy_button: "复制 Base64 到剪贴板",
    decode_heading: "Base64 转图片",
    decode_placeholder: "在此粘贴 Base64 编码数据",
    decode_button: "转换并下载图片",
    file_size: "文件大小",
    select_image: "请选择要上传的图片。",
    copied: "Base64 已复制到剪贴板！",
    enter_base64: "请输入 Base64 编码数据。",
    unsupported_image_type: "不支持的图片类型。",
    invalid_base64: "无效的 Base64 数据，请检查后重试。",
    upload_failed: "图片转换失败。",
    missing_image: "未上传图片",
    unsupported_format: "不支持的图片格式",
    format_mismatch: "上传的数据与声明的格式不符",
    payload_too_large: "图片过大",
    processing_error: "处理图片时发生错误",
    unsupported_content_type: "不支持的内容类型",
    invalid_request: "无效请求",
};

#[derive(Serialize)]
struct SignatureEntry {
    name: &'static str,
    prefix: &'static str,
    mime: &'static str,
}

/// Render the converter page for `language`, offering `formats` in the file picker.
pub fn render_index(language: Language, formats: &[ImageFormat]) -> Result<String> {
    let asset = Assets::get(INDEX_TEMPLATE).ok_or_else(|| Error::Internal {
        operation: format!("load embedded {INDEX_TEMPLATE}"),
    })?;
    let source = std::str::from_utf8(&asset.data).with_context(|| format!("read embedded {INDEX_TEMPLATE}"))?;

    render(source, language, formats)
}

fn render(source: &str, language: Language, formats: &[ImageFormat]) -> Result<String> {
    let accept = formats.iter().map(|f| f.mime_type()).collect::<Vec<_>>().join(",");

    // The client script classifies pasted Base64 with the server's own signature table
    let signatures: Vec<SignatureEntry> = format::signature_table()
        .filter(|(format, _)| formats.contains(format))
        .map(|(format, prefix)| SignatureEntry {
            name: format.name(),
            prefix,
            mime: format.mime_type(),
        })
        .collect();
    let client_config = serde_json::json!({
        "signatures": signatures,
        "messages": language.translations(),
    });

    let env = Environment::new();
    let html = env
        .render_str(
            source,
            context! {
                lang => language.code(),
                t => language.translations(),
                accept => accept,
                formats => formats.iter().map(|f| f.name()).collect::<Vec<_>>(),
                client_config => client_config.to_string(),
            },
        )
        .with_context(|| format!("render {INDEX_TEMPLATE}"))?;

    Ok(html)
}
