//! High-level image operations.
//!
//! These functions combine calculations with backend execution. They take
//! configuration, compute encode parameters, and call the backend.
//!
//! Each portfolio image yields two files:
//!
//! ```text
//! <thumbnail_dir>/<id>.avif   bounded long edge, lossy
//! <original_dir>/<id>.webp    full size, lossless
//! ```

use super::backend::{BackendError, ImageBackend};
use super::calculations::bounded_dimensions;
use super::params::{EncodeParams, Quality};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Configuration for gallery thumbnail generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailConfig {
    pub long_edge: u32,
    pub quality: Quality,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            long_edge: 1200,
            quality: Quality::default(),
        }
    }
}

/// Plan a thumbnail encode without executing it.
pub fn plan_thumbnail(
    source: &Path,
    output: &Path,
    original_dims: (u32, u32),
    config: &ThumbnailConfig,
) -> EncodeParams {
    let (width, height) = bounded_dimensions(original_dims, config.long_edge);
    EncodeParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        quality: config.quality,
    }
}

/// Create the gallery thumbnail for one source image.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    original_dims: (u32, u32),
    config: &ThumbnailConfig,
) -> Result<(u32, u32)> {
    let params = plan_thumbnail(source, output, original_dims, config);
    backend.encode(&params)?;
    Ok((params.width, params.height))
}

/// Create the full-size lightbox image. Dimensions are kept as-is.
pub fn create_original(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    original_dims: (u32, u32),
) -> Result<()> {
    let (width, height) = original_dims;
    backend.encode(&EncodeParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        quality: Quality::new(100),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    #[test]
    fn get_dimensions_calls_backend() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1920,
            height: 1080,
        }]);

        let dims = get_dimensions(&backend, Path::new("/test.jpg")).unwrap();
        assert_eq!(dims, (1920, 1080));
    }

    #[test]
    fn plan_thumbnail_bounds_long_edge() {
        let params = plan_thumbnail(
            Path::new("/source.jpg"),
            Path::new("/thumb.avif"),
            (6000, 4000),
            &ThumbnailConfig::default(),
        );

        assert_eq!((params.width, params.height), (1200, 800));
        assert_eq!(params.quality.value(), 80);
    }

    #[test]
    fn plan_thumbnail_small_source_untouched() {
        let config = ThumbnailConfig {
            long_edge: 2000,
            quality: Quality::new(60),
        };
        let params = plan_thumbnail(
            Path::new("/source.jpg"),
            Path::new("/thumb.avif"),
            (900, 1600),
            &config,
        );
        assert_eq!((params.width, params.height), (900, 1600));
    }

    #[test]
    fn create_thumbnail_uses_backend() {
        let backend = MockBackend::new();
        let dims = create_thumbnail(
            &backend,
            Path::new("/todo/dusk.jpg"),
            Path::new("/optimized/dusk.avif"),
            (3000, 4000),
            &ThumbnailConfig::default(),
        )
        .unwrap();
        assert_eq!(dims, (900, 1200));

        let ops = backend.get_operations();
        assert_eq!(
            ops,
            vec![RecordedOp::Encode {
                source: "/todo/dusk.jpg".into(),
                output: "/optimized/dusk.avif".into(),
                width: 900,
                height: 1200,
                quality: 80,
            }]
        );
    }

    #[test]
    fn create_original_keeps_dimensions() {
        let backend = MockBackend::new();
        create_original(
            &backend,
            Path::new("/todo/dusk.jpg"),
            Path::new("/original/dusk.webp"),
            (3000, 4000),
        )
        .unwrap();

        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Encode {
                width: 3000,
                height: 4000,
                ..
            }
        ));
    }
}
