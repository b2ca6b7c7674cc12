//! User-selected images.

use std::io::Cursor;

use image::ImageFormat;
use serde::{Deserialize, Serialize};

/// Content type used when the format cannot be sniffed.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Pixel dimensions read from the image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for ImageDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x {} pixels", self.width, self.height)
    }
}

/// An image selected for submission.
///
/// Holds the raw file content as read from disk; nothing is decoded beyond
/// the header, which is only used for display metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    filename: String,
    content: Vec<u8>,
    content_type: &'static str,
    dimensions: Option<ImageDimensions>,
}

impl ImageHandle {
    /// Create a handle, sniffing the content type and pixel dimensions.
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        let content_type = image::guess_format(&content)
            .map(content_type_for)
            .unwrap_or(FALLBACK_CONTENT_TYPE);
        let dimensions = read_dimensions(&content);

        Self {
            filename: filename.into(),
            content,
            content_type,
            dimensions,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn dimensions(&self) -> Option<ImageDimensions> {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

fn content_type_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Png => "image/png",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        _ => FALLBACK_CONTENT_TYPE,
    }
}

// Header-only read; failure just means no dimensions to show.
fn read_dimensions(content: &[u8]) -> Option<ImageDimensions> {
    let reader = image::io::Reader::new(Cursor::new(content))
        .with_guessed_format()
        .ok()?;
    let (width, height) = reader.into_dimensions().ok()?;
    Some(ImageDimensions { width, height })
}
