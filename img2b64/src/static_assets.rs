//! Embedded static assets: the page template, its script, stylesheet and icon.

use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "static/"]
pub struct Assets;
