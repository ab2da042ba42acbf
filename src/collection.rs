//! Loading and validating the JSON collections.
//!
//! The portfolio collection (`data/portfolio.json`) is read once per session
//! and its shape is checked here, once, so the filter engine never has to
//! re-validate records on every pass. The blog collection gets the same
//! treatment.
//!
//! ## Validation
//!
//! - Every item has a non-empty `id`, and ids are unique
//! - Every item has at least one category, and no category twice
//! - `votes`, when present, is consistent: a non-zero count carries an
//!   average inside the configured rating bounds
//! - Blog post ids are unique and non-empty
//!
//! Failures are returned as [`CollectionError`]; callers turn them into an
//! inline message in the affected section of the page.

use crate::types::{BlogPost, PortfolioItem};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Item #{0} has an empty id")]
    EmptyId(usize),
    #[error("Duplicate id: {0}")]
    DuplicateId(String),
    #[error("Item {0} has no categories")]
    NoCategories(String),
    #[error("Item {id} lists category {category} more than once")]
    DuplicateCategory { id: String, category: String },
    #[error("Item {id} has inconsistent votes (average {average}, count {count})")]
    InvalidVotes { id: String, average: f64, count: u32 },
}

/// Read and validate the portfolio collection.
///
/// `rating_bounds` is the `(min, max)` star range votes were cast in; stored
/// averages outside it are rejected.
pub fn load_collection(
    path: &Path,
    rating_bounds: (u8, u8),
) -> Result<Vec<PortfolioItem>, CollectionError> {
    let items: Vec<PortfolioItem> = read_json(path)?;
    validate_items(&items, rating_bounds)?;
    Ok(items)
}

/// Read and validate the blog collection.
pub fn load_blog(path: &Path) -> Result<Vec<BlogPost>, CollectionError> {
    let posts: Vec<BlogPost> = read_json(path)?;
    let mut seen = HashSet::new();
    for (idx, post) in posts.iter().enumerate() {
        if post.id.trim().is_empty() {
            return Err(CollectionError::EmptyId(idx));
        }
        if !seen.insert(post.id.as_str()) {
            return Err(CollectionError::DuplicateId(post.id.clone()));
        }
    }
    Ok(posts)
}

/// Write the collection back, pretty-printed like the hand-edited file.
pub fn save_collection(path: &Path, items: &[PortfolioItem]) -> Result<(), CollectionError> {
    let json = serde_json::to_string_pretty(items).map_err(|source| CollectionError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| CollectionError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Shape checks run once after loading.
pub fn validate_items(
    items: &[PortfolioItem],
    (min_rating, max_rating): (u8, u8),
) -> Result<(), CollectionError> {
    let rating_range = f64::from(min_rating)..=f64::from(max_rating);
    let mut seen = HashSet::new();
    for (idx, item) in items.iter().enumerate() {
        if item.id.trim().is_empty() {
            return Err(CollectionError::EmptyId(idx));
        }
        if !seen.insert(item.id.as_str()) {
            return Err(CollectionError::DuplicateId(item.id.clone()));
        }
        if item.categories.iter().all(|c| c.trim().is_empty()) {
            return Err(CollectionError::NoCategories(item.id.clone()));
        }
        let mut tags = HashSet::new();
        if let Some(repeated) = item.categories.iter().find(|c| !tags.insert(c.as_str())) {
            return Err(CollectionError::DuplicateCategory {
                id: item.id.clone(),
                category: repeated.clone(),
            });
        }
        if let Some(votes) = item.votes
            && votes.count > 0
            && !rating_range.contains(&votes.average)
        {
            return Err(CollectionError::InvalidVotes {
                id: item.id.clone(),
                average: votes.average,
                count: votes.count,
            });
        }
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CollectionError> {
    let content = fs::read_to_string(path).map_err(|source| CollectionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CollectionError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{item, post, write_blog, write_collection};
    use crate::types::Votes;
    use tempfile::TempDir;

    const STARS: (u8, u8) = (1, 5);

    #[test]
    fn loads_valid_collection() {
        let tmp = TempDir::new().unwrap();
        let path = write_collection(
            tmp.path(),
            &[
                item("a", &["street"], 2023),
                item("b", &["nature", "mono"], 2024),
            ],
        );

        let items = load_collection(&path, STARS).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].categories, vec!["nature", "mono"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_collection(&tmp.path().join("nope.json"), STARS);
        assert!(matches!(result, Err(CollectionError::Io { .. })));
    }

    #[test]
    fn malformed_json_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("portfolio.json");
        fs::write(&path, "[{\"id\": \"a\",").unwrap();
        assert!(matches!(
            load_collection(&path, STARS),
            Err(CollectionError::Json { .. })
        ));
    }

    #[test]
    fn record_missing_year_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("portfolio.json");
        fs::write(&path, r#"[{"id":"a","title":"A","categories":["street"]}]"#).unwrap();
        assert!(matches!(
            load_collection(&path, STARS),
            Err(CollectionError::Json { .. })
        ));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let items = vec![item("a", &["street"], 2023), item("a", &["mono"], 2022)];
        assert!(matches!(
            validate_items(&items, STARS),
            Err(CollectionError::DuplicateId(id)) if id == "a"
        ));
    }

    #[test]
    fn empty_categories_rejected() {
        let items = vec![item("a", &[], 2023)];
        assert!(matches!(
            validate_items(&items, STARS),
            Err(CollectionError::NoCategories(_))
        ));
    }

    #[test]
    fn empty_id_rejected() {
        let items = vec![item("a", &["street"], 2023), item(" ", &["street"], 2023)];
        assert!(matches!(
            validate_items(&items, STARS),
            Err(CollectionError::EmptyId(1))
        ));
    }

    #[test]
    fn votes_out_of_range_rejected() {
        let mut bad = item("a", &["street"], 2023);
        bad.votes = Some(Votes {
            average: 7.5,
            count: 2,
        });
        assert!(matches!(
            validate_items(&[bad], STARS),
            Err(CollectionError::InvalidVotes { .. })
        ));
    }

    #[test]
    fn votes_checked_against_configured_bounds() {
        let mut ten_star = item("a", &["street"], 2023);
        ten_star.votes = Some(Votes {
            average: 8.0,
            count: 1,
        });
        assert!(validate_items(&[ten_star.clone()], (1, 10)).is_ok());
        assert!(matches!(
            validate_items(&[ten_star], STARS),
            Err(CollectionError::InvalidVotes { .. })
        ));
    }

    #[test]
    fn repeated_category_rejected() {
        let items = vec![item("a", &["street", "mono", "street"], 2023)];
        assert!(matches!(
            validate_items(&items, STARS),
            Err(CollectionError::DuplicateCategory { id, category }) if id == "a" && category == "street"
        ));
    }

    #[test]
    fn zero_count_votes_accepted() {
        let mut fresh = item("a", &["street"], 2023);
        fresh.votes = Some(Votes::default());
        assert!(validate_items(&[fresh], STARS).is_ok());
    }

    #[test]
    fn save_then_load_preserves_votes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("portfolio.json");
        let mut voted = item("a", &["street"], 2023);
        voted.votes = Some(Votes {
            average: 4.25,
            count: 4,
        });
        save_collection(&path, &[voted.clone()]).unwrap();

        let loaded = load_collection(&path, STARS).unwrap();
        assert_eq!(loaded, vec![voted]);
    }

    #[test]
    fn loads_blog_posts() {
        let tmp = TempDir::new().unwrap();
        let posts = vec![
            post("first-roll", "2024-03-09", &["film"]),
            post("harbour", "2024-05-01", &["travel", "film"]),
        ];
        let path = write_blog(tmp.path(), &posts);

        let loaded = load_blog(&path).unwrap();
        assert_eq!(loaded, posts);
        assert_eq!(loaded[0].short_date(), "09.03.24");
    }

    #[test]
    fn blog_duplicate_ids_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("blog.json");
        fs::write(
            &path,
            r#"[{"id":"p","title":"A","date":"2024-01-01"},{"id":"p","title":"B","date":"2024-01-02"}]"#,
        )
        .unwrap();
        assert!(matches!(
            load_blog(&path),
            Err(CollectionError::DuplicateId(_))
        ));
    }

    #[test]
    fn blog_bad_date_is_json_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("blog.json");
        fs::write(&path, r#"[{"id":"p","title":"A","date":"yesterday"}]"#).unwrap();
        assert!(matches!(
            load_blog(&path),
            Err(CollectionError::Json { .. })
        ));
    }
}
