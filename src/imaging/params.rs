//! Parameter types for image operations.
//!
//! These structs describe *what* to encode, not *how*. They sit between
//! [`operations`](super::operations), which decides which files to produce,
//! and the [`backend`](super::backend), which does the pixel work. Tests swap
//! in a mock backend without touching the operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 80). Clamped on construction.
//! - [`OutputFormat`]: Target container, inferred from the output extension.
//! - [`EncodeParams`]: Source, output, target dimensions and quality for one file.

use std::path::{Path, PathBuf};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Encoded output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Lossy AV1 still image; used for gallery thumbnails.
    Avif,
    /// Lossless WebP; used for the full-size lightbox image.
    WebP,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "avif" => Some(Self::Avif),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }
}

/// One encode: decode `source`, resize to `width`×`height` if that differs
/// from the source, write `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
