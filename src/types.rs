//! Shared record types for the portfolio and blog collections.
//!
//! These types are the JSON shapes of `data/portfolio.json` and
//! `data/blog.json`. The gallery, lightbox, vote store and HTTP service all
//! read and write them, so field names must stay in sync with the files the
//! site ships.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single photograph in the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioItem {
    /// Stable identifier. Also the image file stem (`images/optimized/<id>.avif`).
    pub id: String,
    pub title: String,
    /// Category tags. Order is not significant.
    pub categories: Vec<String>,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Absent until the first vote arrives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<Votes>,
}

impl PortfolioItem {
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    /// Caption shown under the full-size image: `title` or `title: description`.
    pub fn caption(&self) -> String {
        match self.description.as_deref() {
            Some(desc) if !desc.is_empty() => format!("{}: {}", self.title, desc),
            _ => self.title.clone(),
        }
    }
}

/// Running aggregate of star ratings for one item.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Votes {
    pub average: f64,
    pub count: u32,
}

impl Votes {
    /// Fold one more rating into the running mean.
    pub fn record(self, rating: u8) -> Votes {
        let count = self.count + 1;
        let average = (self.average * f64::from(self.count) + f64::from(rating)) / f64::from(count);
        Votes { average, count }
    }
}

/// A blog post as stored in `data/blog.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub image: String,
    /// Markdown (HTML passes through untouched).
    #[serde(default)]
    pub content: String,
}

impl BlogPost {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Short date used on cards and post headers: `dd.mm.yy`.
    pub fn short_date(&self) -> String {
        self.date.format("%d.%m.%y").to_string()
    }
}
