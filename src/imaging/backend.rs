//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: identify and encode.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, everything
//! statically linked into the binary.

use super::params::EncodeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can be shared across rayon workers.
pub trait ImageBackend: Sync {
    /// Get image dimensions without a full decode where possible.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode, resize if needed, and write the output in the format its
    /// extension names.
    fn encode(&self, params: &EncodeParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::Quality;
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<Dimensions>>,
        pub operations: Mutex<Vec<RecordedOp>>,
        /// Source paths whose encode should fail.
        pub failing_sources: Vec<String>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Encode {
            source: String,
            output: String,
            width: u32,
            height: u32,
            quality: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Results are popped from the end, so list them in reverse call order.
        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                identify_results: Mutex::new(dims),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn encoded_outputs(&self) -> Vec<String> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Encode { output, .. } => Some(output),
                    RecordedOp::Identify(_) => None,
                })
                .collect()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));

            self.identify_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::ProcessingFailed("No mock dimensions".to_string()))
        }

        fn encode(&self, params: &EncodeParams) -> Result<(), BackendError> {
            let source = params.source.to_string_lossy().to_string();
            if self.failing_sources.contains(&source) {
                return Err(BackendError::ProcessingFailed(format!(
                    "mock failure for {source}"
                )));
            }
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                source,
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
            });
            Ok(())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 800,
            height: 600,
        }]);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_identify_without_results_errors() {
        let backend = MockBackend::new();
        assert!(backend.identify(Path::new("/a.jpg")).is_err());
    }

    #[test]
    fn mock_records_encode() {
        let backend = MockBackend::new();

        backend
            .encode(&EncodeParams {
                source: "/source.jpg".into(),
                output: "/output.avif".into(),
                width: 800,
                height: 600,
                quality: Quality::new(80),
            })
            .unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Encode {
                width: 800,
                height: 600,
                quality: 80,
                ..
            }
        ));
        assert_eq!(backend.encoded_outputs(), vec!["/output.avif".to_string()]);
    }

    #[test]
    fn mock_can_fail_encodes() {
        let backend = MockBackend {
            failing_sources: vec!["/bad.jpg".into()],
            ..MockBackend::default()
        };
        let result = backend.encode(&EncodeParams {
            source: "/bad.jpg".into(),
            output: "/bad.avif".into(),
            width: 1,
            height: 1,
            quality: Quality::default(),
        });
        assert!(result.is_err());
        assert!(backend.get_operations().is_empty());
    }
}
