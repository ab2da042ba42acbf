//! Shared test utilities for the folio test suite.
//!
//! Builders for portfolio items and blog posts, writers that drop a
//! collection into a temp site root, and lookups that panic with the list of
//! available ids on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let path = write_collection(tmp.path(), &[item("a", &["street"], 2023)]);
//! let items = load_collection(&path, (1, 5)).unwrap();
//! assert_eq!(find_item(&items, "a").year, 2023);
//! ```

use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{BlogPost, PortfolioItem};

// =========================================================================
// Builders
// =========================================================================

/// A portfolio item with no description and no votes. Title is the id
/// uppercased so assertions can tell the two apart.
pub fn item(id: &str, categories: &[&str], year: i32) -> PortfolioItem {
    PortfolioItem {
        id: id.to_string(),
        title: id.to_uppercase(),
        categories: categories.iter().map(|c| c.to_string()).collect(),
        year,
        description: None,
        votes: None,
    }
}

/// A blog post dated `YYYY-MM-DD` with Markdown content.
pub fn post(id: &str, date: &str, tags: &[&str]) -> BlogPost {
    BlogPost {
        id: id.to_string(),
        title: format!("Post {id}"),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        excerpt: format!("About {id}"),
        image: format!("images/blog/{id}.webp"),
        content: format!("# {id}\n\nSome *text*."),
    }
}

/// Small mixed collection used across module tests.
pub fn sample_items() -> Vec<PortfolioItem> {
    vec![
        item("dusk", &["street", "best"], 2023),
        item("fern", &["nature"], 2024),
        item("wall", &["arch", "mono"], 2022),
        item("rain", &["street", "mono"], 2024),
        item("pond", &["nature", "best"], 2023),
    ]
}

// =========================================================================
// Fixture writers
// =========================================================================

/// Write `data/portfolio.json` under `root` and return its path.
pub fn write_collection(root: &Path, items: &[PortfolioItem]) -> PathBuf {
    write_json(root, "data/portfolio.json", items)
}

/// Write `data/blog.json` under `root` and return its path.
pub fn write_blog(root: &Path, posts: &[BlogPost]) -> PathBuf {
    write_json(root, "data/blog.json", posts)
}

fn write_json<T: serde::Serialize + ?Sized>(root: &Path, rel: &str, value: &T) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find an item by id. Panics if not found.
pub fn find_item<'a>(items: &'a [PortfolioItem], id: &str) -> &'a PortfolioItem {
    items.iter().find(|i| i.id == id).unwrap_or_else(|| {
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        panic!("item '{id}' not found. Available: {ids:?}")
    })
}
