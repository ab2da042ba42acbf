//! Encode cache for `folio optimize`.
//!
//! AVIF encoding dominates the optimizer's run time, so outputs are reused
//! when neither the source image nor the encoding parameters changed since
//! the last run.
//!
//! ## Keys
//!
//! Entries are **content-addressed** by `source_hash` + `params_hash`, not by
//! output path:
//!
//! - **`source_hash`**: SHA-256 of the source file bytes. Survives
//!   `git checkout` resetting modification times.
//! - **`params_hash`**: SHA-256 of what shapes the encoded bytes. For
//!   thumbnails that is the long-edge bound and quality; full-size originals
//!   are lossless and only carry a kind tag.
//!
//! A hit needs a matching entry *and* the previously written file still on
//! disk. If the same content was written under another id (the source file
//! was renamed), the old output is copied to the new path instead of
//! re-encoded.
//!
//! ## Storage
//!
//! `<site root>/images/.folio-cache.json`, paths relative to the site root.
//! `--no-cache` starts from an empty manifest; outputs are overwritten.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

const MANIFEST_FILENAME: &str = "images/.folio-cache.json";

/// Bump to invalidate every existing cache when key computation changes.
const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
}

/// Output path → entry, plus a runtime reverse index by content key.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
    /// `"{source_hash}:{params_hash}"` → output path. Never serialized.
    #[serde(skip)]
    by_content: HashMap<String, String>,
}

fn content_key(source_hash: &str, params_hash: &str) -> String {
    format!("{source_hash}:{params_hash}")
}

impl CacheManifest {
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
            by_content: HashMap::new(),
        }
    }

    /// Load from the site root. A missing, corrupt or outdated manifest
    /// yields an empty one; the cache is only ever an optimization.
    pub fn load(root: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(manifest_path(root)) else {
            return Self::empty();
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(mut manifest) if manifest.version == MANIFEST_VERSION => {
                manifest.by_content = manifest
                    .entries
                    .iter()
                    .map(|(path, e)| (content_key(&e.source_hash, &e.params_hash), path.clone()))
                    .collect();
                manifest
            }
            _ => Self::empty(),
        }
    }

    pub fn save(&self, root: &Path) -> io::Result<()> {
        let path = manifest_path(root);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)
    }

    /// Stored output path for this content, if that file still exists.
    pub fn find_cached(&self, source_hash: &str, params_hash: &str, root: &Path) -> Option<String> {
        let stored = self.by_content.get(&content_key(source_hash, params_hash))?;
        root.join(stored).exists().then(|| stored.clone())
    }

    /// Record an output. An older entry for the same content under another
    /// path is dropped.
    pub fn insert(&mut self, output_path: String, source_hash: String, params_hash: String) {
        let key = content_key(&source_hash, &params_hash);
        if let Some(previous) = self.by_content.get(&key)
            && *previous != output_path
        {
            self.entries.remove(previous.as_str());
        }
        self.by_content.insert(key, output_path.clone());
        self.entries.insert(
            output_path,
            CacheEntry {
                source_hash,
                params_hash,
            },
        );
    }
}

/// SHA-256 of a file's contents, hex encoded.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Params hash of a gallery thumbnail.
pub fn hash_thumbnail_params(long_edge: u32, quality: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"thumbnail\0");
    hasher.update(long_edge.to_le_bytes());
    hasher.update(quality.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Params hash of a full-size lossless original.
pub fn hash_original_params() -> String {
    format!("{:x}", Sha256::digest(b"original\0lossless"))
}

/// Cache outcome counts for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub copies: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn copy(&mut self) {
        self.copies += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.copies + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.hits, self.copies) {
            (0, 0) => write!(f, "{} encoded", self.misses),
            (_, 0) => write!(
                f,
                "{} cached, {} encoded ({} total)",
                self.hits,
                self.misses,
                self.total()
            ),
            _ => write!(
                f,
                "{} cached, {} copied, {} encoded ({} total)",
                self.hits,
                self.copies,
                self.misses,
                self.total()
            ),
        }
    }
}

pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILENAME)
}
