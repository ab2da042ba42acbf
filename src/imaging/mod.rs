//! Image processing in pure Rust, statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Thumbnail → AVIF** | Lanczos3 resize + rav1e encoder |
//! | **Original → WebP** | lossless `WebPEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::bounded_dimensions;
pub use operations::{ThumbnailConfig, create_original, create_thumbnail, get_dimensions};
pub use params::{EncodeParams, OutputFormat, Quality};
pub use rust_backend::{RustBackend, supported_input_extensions};
