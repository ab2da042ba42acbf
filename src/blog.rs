//! Blog reader: tag filtering, paging, recommendations and markup.
//!
//! ## Tag filter
//!
//! The active tag set starts empty ("all"). Toggling a tag adds or removes
//! it; removing the last one returns to "all". A post is shown when it
//! carries *every* active tag.
//!
//! ## Counts
//!
//! Facet buttons list each tag with the number of posts carrying it, most
//! used first, ties alphabetical. Once a filter is active the counts are
//! recomputed against the filtered posts and tags with nothing left are
//! disabled. The "all" button always shows the collection total.
//!
//! ## Paging
//!
//! Infinite scroll: page `n` shows the first `n × posts_per_page` posts and
//! reports whether more remain.
//!
//! ## Recommendations
//!
//! Under a post: the posts sharing the most tags with it (newest first on
//! ties), then the most recent other posts not already listed.

use crate::config::BlogConfig;
use crate::types::BlogPost;
use maud::{Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

/// Active tag selection. Empty means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    active: BTreeSet<String>,
}

impl TagFilter {
    pub fn with_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            active: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_all(&self) -> bool {
        self.active.is_empty()
    }

    pub fn is_active(&self, tag: &str) -> bool {
        self.active.contains(tag)
    }

    pub fn active(&self) -> impl Iterator<Item = &str> {
        self.active.iter().map(String::as_str)
    }

    /// Toggle one tag; the "all" state follows from the set being empty.
    pub fn toggle(&self, tag: &str) -> Self {
        let mut next = self.clone();
        if !next.active.remove(tag) {
            next.active.insert(tag.to_string());
        }
        next
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, post: &BlogPost) -> bool {
        self.active.iter().all(|tag| post.has_tag(tag))
    }

    fn match_count(&self, post: &BlogPost) -> usize {
        post.tags.iter().filter(|t| self.active.contains(*t)).count()
    }
}

/// One tag facet button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
    pub disabled: bool,
}

/// Posts passing the filter, in display order.
pub fn filter_posts<'a>(posts: &'a [BlogPost], filter: &TagFilter) -> Vec<&'a BlogPost> {
    let mut matched: Vec<&BlogPost> = posts.iter().filter(|p| filter.matches(p)).collect();
    if !filter.is_all() {
        matched.sort_by_key(|p| Reverse(filter.match_count(p)));
    }
    matched
}

fn count_tags<'a>(posts: impl IntoIterator<Item = &'a BlogPost>) -> BTreeMap<&'a str, usize> {
    let mut counts = BTreeMap::new();
    for post in posts {
        let unique: BTreeSet<&str> = post.tags.iter().map(String::as_str).collect();
        for tag in unique {
            *counts.entry(tag).or_insert(0) += 1;
        }
    }
    counts
}

/// Tag facets with counts against the filtered set.
///
/// Button order comes from the whole collection so it doesn't jump around
/// while filtering.
pub fn tag_counts(posts: &[BlogPost], filter: &TagFilter) -> Vec<TagCount> {
    let mut order: Vec<(&str, usize)> = count_tags(posts).into_iter().collect();
    order.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let filtered = count_tags(posts.iter().filter(|p| filter.matches(p)));
    order
        .into_iter()
        .map(|(tag, _)| {
            let count = filtered.get(tag).copied().unwrap_or(0);
            TagCount {
                tag: tag.to_string(),
                count,
                disabled: count == 0,
            }
        })
        .collect()
}

/// A page of the infinite-scroll listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    pub posts: Vec<&'a BlogPost>,
    pub has_more: bool,
}

/// First `page × per_page` posts. Page numbers start at 1; 0 is treated as 1.
pub fn paginate<'a>(filtered: &[&'a BlogPost], page: usize, per_page: usize) -> Page<'a> {
    let end = page.max(1).saturating_mul(per_page);
    Page {
        posts: filtered.iter().take(end).copied().collect(),
        has_more: end < filtered.len(),
    }
}

pub fn find_post<'a>(posts: &'a [BlogPost], id: &str) -> Option<&'a BlogPost> {
    posts.iter().find(|p| p.id == id)
}

/// Posts to suggest under `current`.
pub fn recommendations<'a>(
    posts: &'a [BlogPost],
    current: &BlogPost,
    config: &BlogConfig,
) -> Vec<&'a BlogPost> {
    let mut by_tags: Vec<(usize, &BlogPost)> = posts
        .iter()
        .filter(|p| p.id != current.id)
        .map(|p| (p.tags.iter().filter(|t| current.has_tag(t)).count(), p))
        .filter(|(shared, _)| *shared > 0)
        .collect();
    by_tags.sort_by_key(|(shared, p)| (Reverse(*shared), Reverse(p.date)));

    let mut picked: Vec<&BlogPost> = by_tags
        .into_iter()
        .take(config.tag_recommendations)
        .map(|(_, p)| p)
        .collect();

    let mut recent: Vec<&BlogPost> = posts
        .iter()
        .filter(|p| p.id != current.id && !picked.iter().any(|q| q.id == p.id))
        .collect();
    recent.sort_by_key(|p| Reverse(p.date));
    picked.extend(recent.into_iter().take(config.recent_recommendations));
    picked
}

/// Render Markdown (inline HTML passes through).
pub fn render_markdown(source: &str) -> String {
    let mut out = String::new();
    md_html::push_html(&mut out, Parser::new(source));
    out
}

// ============================================================================
// Markup
// ============================================================================

fn render_tags(post: &BlogPost) -> Markup {
    html! {
        div.blog-tags {
            @for tag in &post.tags {
                span.blog-tag { (tag) }
            }
        }
    }
}

/// Tag filter bar.
pub fn render_filters(posts: &[BlogPost], filter: &TagFilter) -> Markup {
    html! {
        div.blog-filters {
            button.blog-filter.active[filter.is_all()] data-tag="all" {
                "All (" (posts.len()) ")"
            }
            @for facet in tag_counts(posts, filter) {
                button.blog-filter.active[filter.is_active(&facet.tag)].disabled[facet.disabled]
                    data-tag=(facet.tag) disabled[facet.disabled] {
                    (facet.tag) " (" (facet.count) ")"
                }
            }
        }
        @if !filter.is_all() {
            div.blog-active-filters {
                @for tag in filter.active() {
                    div.blog-active-filter {
                        (tag)
                        button.blog-active-filter-remove data-tag=(tag) { "×" }
                    }
                }
            }
        }
    }
}

fn render_card(post: &BlogPost) -> Markup {
    html! {
        article.blog-card data-id=(post.id) {
            div.blog-card__image-container {
                img src=(post.image) alt=(post.title) loading="lazy";
            }
            div.blog-card__content {
                div.blog-meta {
                    time datetime=(post.date.to_string()) { (post.short_date()) }
                    (render_tags(post))
                }
                h3.blog-card__title { (post.title) }
                p.blog-card__excerpt { (post.excerpt) }
                a.blog-card__link href={ "#blog/" (post.id) } { "Read →" }
            }
        }
    }
}

/// Listing: filter bar, cards for the requested page, and the scroll loader
/// when more posts remain.
pub fn render_listing(posts: &[BlogPost], filter: &TagFilter, page: usize, config: &BlogConfig) -> Markup {
    let filtered = filter_posts(posts, filter);
    let page = paginate(&filtered, page, config.posts_per_page);
    html! {
        div.blog-header {
            (render_filters(posts, filter))
        }
        div.blog-grid {
            @for post in &page.posts {
                (render_card(post))
            }
        }
        @if page.has_more {
            div.blog-loader {}
        }
    }
}

/// Single post view with recommendations, or the not-found view.
pub fn render_post(posts: &[BlogPost], id: &str, config: &BlogConfig) -> Markup {
    let Some(post) = find_post(posts, id) else {
        return render_post_not_found();
    };
    let recommended = recommendations(posts, post, config);

    html! {
        article.blog-post {
            a.blog-back-btn href="#blog" { "← Back to blog" }
            header.blog-post-header {
                h1.blog-post-title { (post.title) }
                div.blog-post-meta {
                    time datetime=(post.date.to_string()) { (post.short_date()) }
                    (render_tags(post))
                }
            }
            @if !post.image.is_empty() {
                div.blog-post-image {
                    img src=(post.image) alt=(post.title) loading="lazy";
                }
            }
            div.blog-post-content {
                (PreEscaped(render_markdown(&post.content)))
            }
            footer.blog-post-footer {
                h3 { "Recommended reading" }
                div.blog-recommendations {
                    @if recommended.is_empty() {
                        p { "Have a look at all posts in the blog" }
                    }
                    @for rec in &recommended {
                        a.blog-recommendation href={ "#blog/" (rec.id) } {
                            img src=(rec.image) alt=(rec.title);
                            div {
                                h4 { (rec.title) }
                                time { (rec.short_date()) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn render_post_not_found() -> Markup {
    html! {
        div.error-message {
            p { "Post not found" }
            a.blog-back-btn href="#blog" { "← Back to blog" }
        }
    }
}
