//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. A single file at the
//! site root overrides the stock defaults; every key is optional.
//!
//! ## Config File Location
//!
//! ```text
//! site/
//! ├── config.toml              # Site config (overrides stock defaults)
//! ├── data/
//! │   ├── portfolio.json       # Item collection (read by gallery, written by votes)
//! │   └── blog.json            # Blog posts
//! └── images/
//!     ├── todo/                # Sources waiting for `folio optimize`
//!     ├── optimized/           # Gallery thumbnails (<id>.avif)
//!     └── original/            # Lightbox images (<id>.webp)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [votes.rate_limit]
//! max_requests = 20
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Locations of the JSON collections.
    pub data: DataConfig,
    /// Image directories, extensions and encoder settings.
    pub images: ImagesConfig,
    /// Gallery lazy-loading behaviour.
    pub gallery: GalleryConfig,
    /// Lightbox gestures and timings.
    pub lightbox: LightboxConfig,
    /// Blog paging and recommendations.
    pub blog: BlogConfig,
    /// Rating bounds and endpoint throttling.
    pub votes: VotesConfig,
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Category display labels and facet order.
    pub categories: CategoriesConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.images.thumbnail_quality) {
            return Err(ConfigError::Validation(
                "images.thumbnail_quality must be 1-100".into(),
            ));
        }
        if self.images.thumbnail_long_edge == 0 {
            return Err(ConfigError::Validation(
                "images.thumbnail_long_edge must be non-zero".into(),
            ));
        }
        if self.votes.min_rating == 0 || self.votes.min_rating > self.votes.max_rating {
            return Err(ConfigError::Validation(
                "votes.min_rating must be at least 1 and not above votes.max_rating".into(),
            ));
        }
        if self.votes.rate_limit.max_requests == 0 || self.votes.rate_limit.window_secs == 0 {
            return Err(ConfigError::Validation(
                "votes.rate_limit values must be non-zero".into(),
            ));
        }
        if self.blog.posts_per_page == 0 {
            return Err(ConfigError::Validation(
                "blog.posts_per_page must be non-zero".into(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = self.categories.order.iter().find(|t| !seen.insert(*t)) {
            return Err(ConfigError::Validation(format!(
                "categories.order lists '{dup}' twice"
            )));
        }
        Ok(())
    }
}

/// Paths of the JSON collections, relative to the site root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    pub portfolio: PathBuf,
    pub blog: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            portfolio: PathBuf::from("data/portfolio.json"),
            blog: PathBuf::from("data/blog.json"),
        }
    }
}

/// Image locations (as URL prefixes and directories under the site root)
/// and encoder settings for `folio optimize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Where unprocessed sources are picked up.
    pub source_dir: String,
    /// Gallery thumbnails.
    pub thumbnail_dir: String,
    pub thumbnail_ext: String,
    /// Full-size lightbox images.
    pub original_dir: String,
    pub original_ext: String,
    /// AVIF thumbnail quality (1-100).
    pub thumbnail_quality: u32,
    /// Thumbnails are scaled down so the longer edge fits this many pixels.
    pub thumbnail_long_edge: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            source_dir: "images/todo".to_string(),
            thumbnail_dir: "images/optimized".to_string(),
            thumbnail_ext: "avif".to_string(),
            original_dir: "images/original".to_string(),
            original_ext: "webp".to_string(),
            thumbnail_quality: 80,
            thumbnail_long_edge: 1200,
        }
    }
}

impl ImagesConfig {
    /// Relative URL of an item's gallery thumbnail.
    pub fn thumbnail_src(&self, id: &str) -> String {
        format!("{}/{}.{}", self.thumbnail_dir, id, self.thumbnail_ext)
    }

    /// Relative URL of an item's full-size image.
    pub fn original_src(&self, id: &str) -> String {
        format!("{}/{}.{}", self.original_dir, id, self.original_ext)
    }
}

/// Proximity margins for lazy loading, in CSS pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Distance outside the viewport at which an image fetch starts.
    pub load_margin_px: u32,
    /// Distance outside the viewport at which the entry animation starts.
    pub reveal_margin_px: u32,
    /// Fade-in duration once an image has loaded.
    pub fade_ms: u32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            load_margin_px: 200,
            reveal_margin_px: 100,
            fade_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightboxConfig {
    /// Minimum horizontal travel for a swipe to count as navigation.
    pub swipe_threshold_px: u32,
    /// How long the load-error text stays before the spinner is removed.
    pub error_display_ms: u32,
}

impl Default for LightboxConfig {
    fn default() -> Self {
        Self {
            swipe_threshold_px: 50,
            error_display_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlogConfig {
    pub posts_per_page: usize,
    /// Recommendations chosen by shared tags.
    pub tag_recommendations: usize,
    /// Recommendations chosen by recency, after the tag-based ones.
    pub recent_recommendations: usize,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            posts_per_page: 6,
            tag_recommendations: 2,
            recent_recommendations: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VotesConfig {
    pub min_rating: u8,
    pub max_rating: u8,
    pub rate_limit: RateLimitConfig,
}

impl Default for VotesConfig {
    fn default() -> Self {
        Self {
            min_rating: 1,
            max_rating: 5,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl VotesConfig {
    /// Inclusive `(min, max)` star range.
    pub fn bounds(&self) -> (u8, u8) {
        (self.min_rating, self.max_rating)
    }
}

/// Fixed-window request budget per client address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 15 * 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Value of `Access-Control-Allow-Origin`; `"*"` allows any origin.
    pub allow_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
            allow_origin: "*".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Category facets: display labels and the order buttons appear in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoriesConfig {
    pub order: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

impl Default for CategoriesConfig {
    fn default() -> Self {
        let pairs = [
            ("best", "Best"),
            ("street", "Street"),
            ("nature", "Nature"),
            ("concept", "Concept"),
            ("mono", "Mono B&W"),
            ("experiments", "Experiments"),
            ("arch", "Architecture"),
        ];
        Self {
            order: pairs.iter().map(|(tag, _)| tag.to_string()).collect(),
            labels: pairs
                .iter()
                .map(|(tag, label)| (tag.to_string(), label.to_string()))
                .collect(),
        }
    }
}

impl CategoriesConfig {
    /// Display label for a tag; unknown tags are shown as-is.
    pub fn label<'a>(&'a self, tag: &'a str) -> &'a str {
        self.labels.get(tag).map(String::as_str).unwrap_or(tag)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load config from `config.toml` in the given site root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match load_raw_config(root)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# folio configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Collections (paths relative to the site root)
# ---------------------------------------------------------------------------
[data]
portfolio = "data/portfolio.json"
blog = "data/blog.json"

# ---------------------------------------------------------------------------
# Images
# ---------------------------------------------------------------------------
[images]
# Sources picked up by `folio optimize`; the file stem becomes the item id.
source_dir = "images/todo"

# Gallery thumbnails: <thumbnail_dir>/<id>.<thumbnail_ext>
thumbnail_dir = "images/optimized"
thumbnail_ext = "avif"

# Lightbox images: <original_dir>/<id>.<original_ext>
original_dir = "images/original"
original_ext = "webp"

# AVIF thumbnail quality (1 = worst, 100 = best).
thumbnail_quality = 80

# Thumbnails are scaled so the longer edge fits this many pixels.
thumbnail_long_edge = 1200

# ---------------------------------------------------------------------------
# Gallery lazy loading
# ---------------------------------------------------------------------------
[gallery]
# Start fetching a thumbnail this far outside the viewport.
load_margin_px = 200
# Start the entry animation this far outside the viewport.
reveal_margin_px = 100
# Fade-in duration after a thumbnail arrives.
fade_ms = 300

# ---------------------------------------------------------------------------
# Lightbox
# ---------------------------------------------------------------------------
[lightbox]
# Horizontal swipe distance that counts as prev/next.
swipe_threshold_px = 50
# How long a load error stays on screen.
error_display_ms = 2000

# ---------------------------------------------------------------------------
# Blog
# ---------------------------------------------------------------------------
[blog]
posts_per_page = 6
tag_recommendations = 2
recent_recommendations = 1

# ---------------------------------------------------------------------------
# Votes
# ---------------------------------------------------------------------------
[votes]
min_rating = 1
max_rating = 5

# Requests allowed per client address per window.
[votes.rate_limit]
max_requests = 100
window_secs = 900

# ---------------------------------------------------------------------------
# HTTP service (`folio serve`)
# ---------------------------------------------------------------------------
[server]
bind = "0.0.0.0"
port = 3000
allow_origin = "*"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Categories: facet button order and display labels
# ---------------------------------------------------------------------------
[categories]
order = ["best", "street", "nature", "concept", "mono", "experiments", "arch"]

[categories.labels]
best = "Best"
street = "Street"
nature = "Nature"
concept = "Concept"
mono = "Mono B&W"
experiments = "Experiments"
arch = "Architecture"
"##
}
