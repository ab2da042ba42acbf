//! Source image optimization for the gallery.
//!
//! Every JPEG/PNG/TIFF/WebP under `[images] source_dir` becomes two files
//! named after the source's file stem:
//!
//! ```text
//! images/todo/dusk.jpg
//!   → images/optimized/dusk.avif   gallery thumbnail, long edge bounded
//!   → images/original/dusk.webp    lightbox image, full size, lossless
//! ```
//!
//! Images are processed in parallel on a rayon pool sized by
//! `[processing] max_processes`. Unchanged sources are skipped through the
//! [`cache`](crate::cache) manifest. One failing image is reported and does
//! not stop the others.

use crate::cache::{self, CacheManifest, CacheStats};
use crate::collection::load_collection;
use crate::config::{SiteConfig, effective_threads};
use crate::imaging::{
    BackendError, ImageBackend, Quality, RustBackend, ThumbnailConfig, create_original,
    create_thumbnail, get_dimensions, supported_input_extensions,
};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Source directory not found: {0}")]
    SourceDirNotFound(PathBuf),
    #[error("Could not start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// How an output file came to exist after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStatus {
    /// Already up to date on disk.
    Cached,
    /// Copied from an output written for the same content under another id.
    Copied,
    Encoded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedImage {
    pub id: String,
    pub thumbnail: OutputStatus,
    pub original: OutputStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedImage {
    pub source: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct OptimizeReport {
    /// Sorted by id.
    pub images: Vec<OptimizedImage>,
    pub failures: Vec<FailedImage>,
    /// Optimized ids the collection has no item for. `None` when the
    /// collection could not be read.
    pub unknown_ids: Option<Vec<String>>,
    pub cache: CacheStats,
}

/// Sources under `dir` with a supported extension, sorted by path.
pub fn discover_sources(dir: &Path) -> Result<Vec<PathBuf>, OptimizeError> {
    if !dir.is_dir() {
        return Err(OptimizeError::SourceDirNotFound(dir.to_path_buf()));
    }
    let supported = supported_input_extensions();
    let mut sources = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|e| OptimizeError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        if !hidden && ext.is_some_and(|e| supported.contains(&e.as_str())) {
            sources.push(path.to_path_buf());
        }
    }
    sources.sort();
    Ok(sources)
}

/// Item id for a source file: its file stem.
pub fn image_id(source: &Path) -> Option<String> {
    source
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn optimize(
    root: &Path,
    config: &SiteConfig,
    use_cache: bool,
) -> Result<OptimizeReport, OptimizeError> {
    optimize_with_backend(&RustBackend::new(), root, config, use_cache)
}

/// Optimize using a specific backend (allows testing with mock).
pub fn optimize_with_backend(
    backend: &impl ImageBackend,
    root: &Path,
    config: &SiteConfig,
    use_cache: bool,
) -> Result<OptimizeReport, OptimizeError> {
    let sources = discover_sources(&root.join(&config.images.source_dir))?;
    std::fs::create_dir_all(root.join(&config.images.thumbnail_dir))?;
    std::fs::create_dir_all(root.join(&config.images.original_dir))?;

    let manifest = if use_cache {
        CacheManifest::load(root)
    } else {
        CacheManifest::empty()
    };
    let job = Job {
        backend,
        root,
        config,
        thumbnail: ThumbnailConfig {
            long_edge: config.images.thumbnail_long_edge,
            quality: Quality::new(config.images.thumbnail_quality),
        },
        manifest: Mutex::new(manifest),
        stats: Mutex::new(CacheStats::default()),
    };

    let threads = effective_threads(&config.processing);
    tracing::info!(sources = sources.len(), threads, "optimizing images");
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?;
    let results: Vec<(PathBuf, Result<OptimizedImage, OptimizeError>)> = pool.install(|| {
        sources
            .par_iter()
            .map(|source| (source.clone(), job.run(source)))
            .collect()
    });

    let mut report = OptimizeReport::default();
    for (source, result) in results {
        match result {
            Ok(image) => report.images.push(image),
            Err(err) => {
                tracing::warn!(source = %source.display(), error = %err, "image failed");
                report.failures.push(FailedImage {
                    source,
                    reason: err.to_string(),
                });
            }
        }
    }
    report.images.sort_by(|a, b| a.id.cmp(&b.id));

    let Job {
        manifest, stats, ..
    } = job;
    let manifest = manifest.into_inner().unwrap_or_else(|e| e.into_inner());
    report.cache = stats.into_inner().unwrap_or_else(|e| e.into_inner());
    manifest.save(root)?;

    report.unknown_ids = match load_collection(
        &root.join(&config.data.portfolio),
        config.votes.bounds(),
    ) {
        Ok(items) => {
            let known: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
            Some(
                report
                    .images
                    .iter()
                    .filter(|img| !known.contains(img.id.as_str()))
                    .map(|img| img.id.clone())
                    .collect(),
            )
        }
        Err(err) => {
            tracing::warn!(error = %err, "collection unreadable, skipping id check");
            None
        }
    };

    tracing::info!(
        images = report.images.len(),
        failures = report.failures.len(),
        cache = %report.cache,
        "optimization finished"
    );
    Ok(report)
}

/// Shared state of one optimization run.
struct Job<'a, B: ImageBackend> {
    backend: &'a B,
    root: &'a Path,
    config: &'a SiteConfig,
    thumbnail: ThumbnailConfig,
    manifest: Mutex<CacheManifest>,
    stats: Mutex<CacheStats>,
}

impl<B: ImageBackend> Job<'_, B> {
    fn run(&self, source: &Path) -> Result<OptimizedImage, OptimizeError> {
        let id = image_id(source).ok_or_else(|| {
            BackendError::ProcessingFailed(format!("no usable file stem: {}", source.display()))
        })?;
        let source_hash = cache::hash_file(source)?;
        let images = &self.config.images;

        // Identify lazily: fully cached images are never decoded
        let mut dims = None;
        let mut dimensions = || -> Result<(u32, u32), OptimizeError> {
            if let Some(d) = dims {
                return Ok(d);
            }
            let d = get_dimensions(self.backend, source)?;
            dims = Some(d);
            Ok(d)
        };

        let thumb_rel = images.thumbnail_src(&id);
        let thumb_params =
            cache::hash_thumbnail_params(self.thumbnail.long_edge, self.thumbnail.quality.value());
        let thumbnail = self.produce(&thumb_rel, &source_hash, thumb_params, |out| {
            create_thumbnail(self.backend, source, out, dimensions()?, &self.thumbnail)?;
            Ok(())
        })?;

        let original_rel = images.original_src(&id);
        let original = self.produce(
            &original_rel,
            &source_hash,
            cache::hash_original_params(),
            |out| {
                create_original(self.backend, source, out, dimensions()?)?;
                Ok(())
            },
        )?;

        tracing::debug!(%id, ?thumbnail, ?original, "image optimized");
        Ok(OptimizedImage {
            id,
            thumbnail,
            original,
        })
    }

    /// Make sure `rel` exists for this content: reuse, copy or encode.
    fn produce(
        &self,
        rel: &str,
        source_hash: &str,
        params_hash: String,
        encode: impl FnOnce(&Path) -> Result<(), OptimizeError>,
    ) -> Result<OutputStatus, OptimizeError> {
        let output = self.root.join(rel);
        let cached = self
            .manifest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .find_cached(source_hash, &params_hash, self.root);

        let status = match cached {
            Some(stored) if stored == rel => OutputStatus::Cached,
            Some(stored) => {
                std::fs::copy(self.root.join(&stored), &output)?;
                OutputStatus::Copied
            }
            None => {
                encode(&output)?;
                OutputStatus::Encoded
            }
        };

        {
            let mut stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
            match status {
                OutputStatus::Cached => stats.hit(),
                OutputStatus::Copied => stats.copy(),
                OutputStatus::Encoded => stats.miss(),
            }
        }
        self.manifest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(rel.to_string(), source_hash.to_string(), params_hash);
        Ok(status)
    }
}
