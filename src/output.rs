//! CLI output formatting for every subcommand.
//!
//! Items are listed by identity first: positional index, title, then
//! secondary context (year, category labels, vote summary) on the same line
//! or indented below.
//!
//! ## Check
//!
//! ```text
//! Portfolio (5 items)
//!     Categories: Best (2), Street (2), Nature (2)
//!     Years: 2024 (2), 2023 (2), 2022 (1)
//!     Votes: 2 rated items, 7 votes
//! Blog (3 posts)
//!     Tags: film (2), travel (1)
//! ```
//!
//! ## Filter
//!
//! ```text
//! Filter: categories street, mono | years all
//! 001 RAIN (2024) Street, Mono B&W
//! 002 DUSK (2023) Street, Best  ★ 4.5 (2)
//! 2 of 5 items
//! ```
//!
//! ## Optimize
//!
//! ```text
//! 001 dusk
//!     thumbnail: encoded
//!     original: cached
//! Failed
//!     images/todo/bad.jpg: Processing failed: ...
//! Not in collection: stray
//! Optimized 1 image: 1 cached, 1 encoded (2 total)
//! ```
//!
//! Each command has a `format_*` function returning lines, pure and
//! testable, and a `print_*` wrapper that writes them to stdout.

use crate::blog::{TagFilter, tag_counts};
use crate::config::CategoriesConfig;
use crate::filter::{Facet, FilterState};
use crate::optimize::{OptimizeReport, OutputStatus};
use crate::taxonomy::{FacetOption, Taxonomy};
use crate::types::{BlogPost, PortfolioItem};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn facet_summary(options: &[FacetOption]) -> String {
    if options.is_empty() {
        return "none".to_string();
    }
    options
        .iter()
        .map(|o| format!("{} ({})", o.label, o.count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `★ 4.3 (12)` for rated items, nothing otherwise.
fn vote_summary(item: &PortfolioItem) -> Option<String> {
    item.votes
        .filter(|v| v.count > 0)
        .map(|v| format!("★ {:.1} ({})", v.average, v.count))
}

fn status_label(status: OutputStatus) -> &'static str {
    match status {
        OutputStatus::Cached => "cached",
        OutputStatus::Copied => "copied",
        OutputStatus::Encoded => "encoded",
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_output(
    items: &[PortfolioItem],
    taxonomy: &Taxonomy,
    posts: Option<&[BlogPost]>,
) -> Vec<String> {
    let mut lines = vec![format!("Portfolio ({})", plural(items.len(), "item", "items"))];
    lines.push(format!(
        "{}Categories: {}",
        indent(1),
        facet_summary(&taxonomy.categories)
    ));
    lines.push(format!("{}Years: {}", indent(1), facet_summary(&taxonomy.years)));

    let rated: Vec<_> = items
        .iter()
        .filter_map(|i| i.votes)
        .filter(|v| v.count > 0)
        .collect();
    let total_votes: u32 = rated.iter().map(|v| v.count).sum();
    lines.push(format!(
        "{}Votes: {}, {}",
        indent(1),
        plural(rated.len(), "rated item", "rated items"),
        plural(total_votes as usize, "vote", "votes")
    ));

    match posts {
        Some(posts) => {
            lines.push(format!("Blog ({})", plural(posts.len(), "post", "posts")));
            let tags = tag_counts(posts, &TagFilter::all());
            let summary = if tags.is_empty() {
                "none".to_string()
            } else {
                tags.iter()
                    .map(|t| format!("{} ({})", t.tag, t.count))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            lines.push(format!("{}Tags: {}", indent(1), summary));
        }
        None => lines.push("Blog (not found)".to_string()),
    }
    lines
}

pub fn print_check_output(items: &[PortfolioItem], taxonomy: &Taxonomy, posts: Option<&[BlogPost]>) {
    for line in format_check_output(items, taxonomy, posts) {
        println!("{line}");
    }
}

// ============================================================================
// Filter
// ============================================================================

fn active_summary(state: &FilterState, facet: Facet) -> String {
    let active = state.active(facet);
    if active.is_empty() {
        "all".to_string()
    } else {
        active.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    }
}

pub fn format_filter_output(
    visible: &[&PortfolioItem],
    total: usize,
    state: &FilterState,
    labels: &CategoriesConfig,
) -> Vec<String> {
    let mut lines = vec![format!(
        "Filter: categories {} | years {}",
        active_summary(state, Facet::Category),
        active_summary(state, Facet::Year)
    )];
    for (pos, item) in visible.iter().enumerate() {
        let categories = item
            .categories
            .iter()
            .map(|c| labels.label(c))
            .collect::<Vec<_>>()
            .join(", ");
        let mut line = format!(
            "{} {} ({}) {}",
            format_index(pos + 1),
            item.title,
            item.year,
            categories
        );
        if let Some(votes) = vote_summary(item) {
            line.push_str("  ");
            line.push_str(&votes);
        }
        lines.push(line);
    }
    lines.push(format!("{} of {}", visible.len(), plural(total, "item", "items")));
    lines
}

pub fn print_filter_output(
    visible: &[&PortfolioItem],
    total: usize,
    state: &FilterState,
    labels: &CategoriesConfig,
) {
    for line in format_filter_output(visible, total, state, labels) {
        println!("{line}");
    }
}

// ============================================================================
// Optimize
// ============================================================================

pub fn format_optimize_output(report: &OptimizeReport, root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for (pos, image) in report.images.iter().enumerate() {
        lines.push(format!("{} {}", format_index(pos + 1), image.id));
        lines.push(format!(
            "{}thumbnail: {}",
            indent(1),
            status_label(image.thumbnail)
        ));
        lines.push(format!(
            "{}original: {}",
            indent(1),
            status_label(image.original)
        ));
    }

    if !report.failures.is_empty() {
        lines.push("Failed".to_string());
        for failure in &report.failures {
            let source = failure
                .source
                .strip_prefix(root)
                .unwrap_or(&failure.source);
            lines.push(format!(
                "{}{}: {}",
                indent(1),
                source.display(),
                failure.reason
            ));
        }
    }

    match &report.unknown_ids {
        Some(ids) if !ids.is_empty() => {
            lines.push(format!("Not in collection: {}", ids.join(", ")));
        }
        Some(_) => {}
        None => lines.push("Collection unreadable, ids not checked".to_string()),
    }

    lines.push(format!(
        "Optimized {}: {}",
        plural(report.images.len(), "image", "images"),
        report.cache
    ));
    lines
}

pub fn print_optimize_output(report: &OptimizeReport, root: &Path) {
    for line in format_optimize_output(report, root) {
        println!("{line}");
    }
}
