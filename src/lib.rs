//! # Folio
//!
//! The engine behind a personal photography portfolio and blog. A single JSON
//! collection of photographs is the data source: the gallery filters and
//! orders it, the lightbox pages through it, and visitors' star ratings are
//! written back into it.
//!
//! # Architecture
//!
//! ```text
//! data/portfolio.json ─┬─> taxonomy ─> filter ─> gallery ─> loader
//!                      │                           └──────> lightbox ─> vote request
//!                      └─< votes <── server  POST /api/save_vote
//! images/todo/ ──> optimize ──> images/optimized/*.avif, images/original/*.webp
//! data/blog.json ──> blog (tag facets, paging, recommendations)
//! ```
//!
//! Page state lives in explicit values ([`filter::FilterState`],
//! [`loader::SessionToken`], [`lightbox::ViewerState`]) rather than in
//! markup, so every interaction is a pure transition that can be tested
//! without a browser.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | JSON record types: `PortfolioItem`, `Votes`, `BlogPost` |
//! | [`collection`] | Load, validate and save the JSON collections |
//! | [`taxonomy`] | Category and year facets derived from the collection |
//! | [`filter`] | Filter state toggles and the ranking that orders visible items |
//! | [`loader`] | Proximity-triggered image loading with cancellable sessions |
//! | [`gallery`] | Display order, grid elements and gallery markup |
//! | [`lightbox`] | Full-size viewer state machine, navigation and voting |
//! | [`votes`] | Vote request validation and the file-backed aggregate store |
//! | [`router`] | `#section` / `#blog/<id>` fragment routing and page titles |
//! | [`blog`] | Tag filtering, pagination, recommendations and post markup |
//! | [`server`] | HTTP service: vote endpoint, collection data, CORS, rate limit |
//! | [`rate_limit`] | Fixed-window per-client request budget |
//! | [`optimize`] | Batch conversion of source photos into gallery/lightbox images |
//! | [`cache`] | Content-addressed encode cache for `optimize` |
//! | [`imaging`] | Pure-Rust decode, resize and AVIF/WebP encode |
//! | [`config`] | `config.toml` loading, merging over defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Collection File Is the Database
//!
//! Votes are folded into `data/portfolio.json` in place. One process
//! serializes its own writes; separate processes sharing the file race and the
//! last writer wins. A small personal site doesn't warrant more.
//!
//! ## Maud for Markup
//!
//! Gallery and blog fragments are built with [Maud](https://maud.lambda.xyz/):
//! malformed HTML is a build error and all interpolation is escaped.

pub mod blog;
pub mod cache;
pub mod collection;
pub mod config;
pub mod filter;
pub mod gallery;
pub mod imaging;
pub mod lightbox;
pub mod loader;
pub mod optimize;
pub mod output;
pub mod rate_limit;
pub mod router;
pub mod server;
pub mod taxonomy;
pub mod types;
pub mod votes;

#[cfg(test)]
pub(crate) mod test_helpers;
