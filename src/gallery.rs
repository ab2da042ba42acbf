//! Gallery renderer.
//!
//! Owns the loaded collection, the current [`FilterState`], the lazy
//! [`ImageLoader`] and the [`Lightbox`]. Every facet click goes through
//! [`Gallery::render`]: recompute the display order, replace the grid
//! contents and start a fresh loader session over the new elements.
//!
//! Facet buttons are rendered from the state, never read back from markup.

use crate::collection::{self, CollectionError};
use crate::config::{CategoriesConfig, ImagesConfig, SiteConfig};
use crate::filter::{Facet, FacetClick, FilterState, compute_visible};
use crate::lightbox::{ImageRequest, Lightbox};
use crate::loader::{ImageLoader, LoadState, LoadTarget, Rect, SessionToken};
use crate::taxonomy::{FacetOption, Taxonomy};
use crate::types::{PortfolioItem, Votes};
use crate::votes::VoteResponse;
use maud::{Markup, html};
use std::path::Path;

/// Fixed-size grid used to place elements for proximity checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub columns: usize,
    pub cell_width: f64,
    pub cell_height: f64,
    pub gap: f64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: 3,
            cell_width: 400.0,
            cell_height: 300.0,
            gap: 16.0,
        }
    }
}

impl GridLayout {
    pub fn rect(&self, index: usize) -> Rect {
        let columns = self.columns.max(1);
        let (row, col) = (index / columns, index % columns);
        Rect::new(
            col as f64 * (self.cell_width + self.gap),
            row as f64 * (self.cell_height + self.gap),
            self.cell_width,
            self.cell_height,
        )
    }
}

/// One grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayElement {
    pub id: String,
    pub title: String,
    pub year: i32,
    pub thumbnail_src: String,
    /// Display labels of the item's categories.
    pub category_labels: Vec<String>,
    pub rect: Rect,
}

#[derive(Debug)]
pub struct Gallery {
    items: Vec<PortfolioItem>,
    images: ImagesConfig,
    categories: CategoriesConfig,
    layout: GridLayout,
    taxonomy: Taxonomy,
    state: FilterState,
    display: Vec<DisplayElement>,
    loader: ImageLoader,
    lightbox: Lightbox,
}

impl Gallery {
    /// Build a gallery over a validated collection and render it unfiltered.
    pub fn new(items: Vec<PortfolioItem>, config: &SiteConfig) -> Self {
        let taxonomy = Taxonomy::from_items(&items, &config.categories);
        let mut gallery = Self {
            items,
            images: config.images.clone(),
            categories: config.categories.clone(),
            layout: GridLayout::default(),
            taxonomy,
            state: FilterState::default(),
            display: Vec::new(),
            loader: ImageLoader::new(&config.gallery),
            lightbox: Lightbox::new(
                &config.images,
                &config.lightbox,
                config.votes.bounds(),
            ),
        };
        gallery.render(FilterState::default());
        gallery
    }

    /// Load the collection file and build the gallery.
    pub fn load(path: &Path, config: &SiteConfig) -> Result<Self, CollectionError> {
        let items = collection::load_collection(path, config.votes.bounds())?;
        Ok(Self::new(items, config))
    }

    pub fn with_layout(mut self, layout: GridLayout) -> Self {
        self.layout = layout;
        let state = self.state.clone();
        self.render(state);
        self
    }

    pub fn items(&self) -> &[PortfolioItem] {
        &self.items
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn display(&self) -> &[DisplayElement] {
        &self.display
    }

    pub fn loader(&self) -> &ImageLoader {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut ImageLoader {
        &mut self.loader
    }

    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    pub fn lightbox_mut(&mut self) -> &mut Lightbox {
        &mut self.lightbox
    }

    /// Replace the state, rebuild the grid and restart lazy loading.
    pub fn render(&mut self, state: FilterState) -> SessionToken {
        self.display = compute_visible(&self.items, &state)
            .into_iter()
            .enumerate()
            .map(|(index, item)| DisplayElement {
                id: item.id.clone(),
                title: item.title.clone(),
                year: item.year,
                thumbnail_src: self.images.thumbnail_src(&item.id),
                category_labels: item
                    .categories
                    .iter()
                    .map(|c| self.categories.label(c).to_string())
                    .collect(),
                rect: self.layout.rect(index),
            })
            .collect();
        self.state = state;

        let targets = self
            .display
            .iter()
            .map(|el| LoadTarget {
                id: el.id.clone(),
                src: el.thumbnail_src.clone(),
                rect: el.rect,
            })
            .collect();
        self.loader.observe(targets)
    }

    /// Handle a facet button click.
    pub fn click(&mut self, facet: Facet, click: FacetClick<'_>) -> SessionToken {
        let available = match facet {
            Facet::Category => self.taxonomy.category_values(),
            Facet::Year => self.taxonomy.year_values(),
        };
        let next = self.state.toggle(facet, click, &available);
        self.render(next)
    }

    /// Open the viewer on a grid element, navigating within the current
    /// display order.
    pub fn select(&mut self, id: &str) -> Option<ImageRequest> {
        let order: Vec<PortfolioItem> = self
            .display
            .iter()
            .filter_map(|el| self.items.iter().find(|item| item.id == el.id))
            .cloned()
            .collect();
        self.lightbox.open(order, id)
    }

    /// Apply a vote endpoint response to both the collection and the viewer.
    pub fn apply_vote_response(&mut self, item_id: &str, response: &VoteResponse) {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == item_id) {
            item.votes = Some(Votes {
                average: response.new_average,
                count: response.new_count,
            });
        }
        self.lightbox.apply_vote_response(item_id, response);
    }

    // ------------------------------------------------------------------------
    // Markup
    // ------------------------------------------------------------------------

    fn render_facet_row(&self, facet: Facet, options: &[FacetOption], class: &str, attr: &str) -> Markup {
        let classes = |active: bool| {
            if active {
                format!("{class} active")
            } else {
                class.to_string()
            }
        };
        html! {
            div class={ "portfolio-" (attr) "-filters" } {
                button class=(classes(self.state.is_unconstrained(facet))) data-value="all" { "All" }
                @for option in options {
                    button class=(classes(self.state.is_active(facet, &option.value))) data-value=(option.value) {
                        (option.label)
                    }
                }
            }
        }
    }

    /// Facet rows and the item grid.
    pub fn markup(&self) -> Markup {
        html! {
            div.portfolio-filters {
                (self.render_facet_row(Facet::Category, &self.taxonomy.categories, "filter-btn", "category"))
                (self.render_facet_row(Facet::Year, &self.taxonomy.years, "year-filter-btn", "year"))
            }
            div.portfolio-grid {
                @if self.display.is_empty() {
                    p.portfolio-empty { "Nothing matches these filters." }
                }
                @for el in &self.display {
                    (self.render_cell(el))
                }
            }
        }
    }

    /// One grid cell, drawn from its loader state.
    fn render_cell(&self, el: &DisplayElement) -> Markup {
        let overlay = html! {
            div.portfolio-item__overlay {
                h3.portfolio-item__title { (el.title) }
                p.portfolio-item__category { (el.category_labels.join(", ")) }
            }
        };
        match self.loader.state(&el.id).unwrap_or(&LoadState::Pending) {
            LoadState::Pending => html! {
                div.portfolio-item data-id=(el.id) data-year=(el.year) {
                    img data-src=(el.thumbnail_src) alt=(el.title) loading="lazy";
                    (overlay)
                }
            },
            LoadState::Loading => html! {
                div.portfolio-item.loading data-id=(el.id) data-year=(el.year) {
                    div.loading-spinner {}
                    img data-src=(el.thumbnail_src) alt=(el.title) loading="lazy";
                    (overlay)
                }
            },
            LoadState::Loaded { fade_ms } => html! {
                div.portfolio-item.loaded data-id=(el.id) data-year=(el.year)
                    style={ "transition: opacity " (fade_ms) "ms" } {
                    img src=(el.thumbnail_src) alt=(el.title);
                    (overlay)
                }
            },
            LoadState::Failed { reason } => html! {
                div.portfolio-item.error data-id=(el.id) data-year=(el.year) {
                    div.portfolio-item__error role="alert" title=(reason) {
                        "Image failed to load"
                    }
                    (overlay)
                }
            },
        }
    }
}

/// Inline message shown in place of the grid when the collection can't load.
pub fn render_load_error(err: &CollectionError) -> Markup {
    html! {
        div.portfolio-error {
            p { "The portfolio could not be loaded." }
            p.portfolio-error__details { (err.to_string()) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lightbox::ViewerState;
    use crate::loader::Completion;
    use crate::test_helpers::{item, sample_items, write_collection};
    use tempfile::TempDir;

    fn gallery() -> Gallery {
        Gallery::new(sample_items(), &SiteConfig::default())
    }

    fn display_ids(gallery: &Gallery) -> Vec<&str> {
        gallery.display().iter().map(|el| el.id.as_str()).collect()
    }

    #[test]
    fn initial_render_is_year_descending() {
        let gallery = gallery();
        assert_eq!(display_ids(&gallery), vec!["fern", "rain", "dusk", "pond", "wall"]);
        assert_eq!(gallery.display()[0].thumbnail_src, "images/optimized/fern.avif");
    }

    #[test]
    fn click_rerenders_and_restarts_loader() {
        let mut gallery = gallery();
        let before = gallery.loader().token().clone();

        let token = gallery.click(Facet::Category, FacetClick::Value("street"));
        assert!(before.is_cancelled());
        assert!(!token.is_cancelled());
        assert_eq!(display_ids(&gallery), vec!["rain", "dusk"]);
        assert_eq!(gallery.loader().pending(), 2);
    }

    #[test]
    fn stale_thumbnail_completion_does_not_touch_new_grid() {
        let mut gallery = gallery();
        let old = gallery.loader().token().clone();
        gallery
            .loader_mut()
            .on_viewport(Rect::new(0.0, 0.0, 1200.0, 800.0));

        gallery.click(Facet::Year, FacetClick::Value("2024"));
        assert_eq!(
            gallery.loader_mut().complete(&old, "fern", Ok(())),
            Completion::Stale
        );
        assert_eq!(gallery.loader().state("fern"), Some(&LoadState::Pending));
    }

    #[test]
    fn selecting_every_year_collapses_to_all() {
        let mut gallery = gallery();
        for year in ["2024", "2023", "2022"] {
            gallery.click(Facet::Year, FacetClick::Value(year));
        }
        assert!(gallery.state().is_unconstrained(Facet::Year));
        assert_eq!(gallery.display().len(), 5);
    }

    #[test]
    fn select_navigates_within_filtered_order() {
        let mut gallery = gallery();
        gallery.click(Facet::Category, FacetClick::Value("nature"));
        let req = gallery.select("fern").unwrap();
        assert_eq!(req.src, "images/original/fern.webp");

        let next = gallery.lightbox_mut().next().unwrap();
        assert_eq!(next.id, "pond");
        assert!(gallery.lightbox_mut().next().is_none());
    }

    #[test]
    fn select_hidden_item_does_nothing() {
        let mut gallery = gallery();
        gallery.click(Facet::Category, FacetClick::Value("nature"));
        assert!(gallery.select("wall").is_none());
        assert_eq!(gallery.lightbox().state(), &ViewerState::Closed);
    }

    #[test]
    fn vote_response_updates_collection_and_viewer() {
        let mut gallery = gallery();
        gallery.select("wall").unwrap();
        let vote = gallery.lightbox_mut().vote(5).unwrap();
        gallery.apply_vote_response(
            &vote.item_id,
            &VoteResponse {
                success: true,
                new_average: 5.0,
                new_count: 1,
            },
        );
        let wall = gallery.items().iter().find(|i| i.id == "wall").unwrap();
        assert_eq!(wall.votes.map(|v| v.count), Some(1));
        assert_eq!(gallery.lightbox().current().and_then(|i| i.votes).map(|v| v.count), Some(1));
    }

    #[test]
    fn markup_reflects_state() {
        let mut gallery = gallery();
        gallery.click(Facet::Category, FacetClick::Value("mono"));
        let html = gallery.markup().into_string();
        assert!(html.contains(r#"class="filter-btn active" data-value="mono""#));
        assert!(html.contains(r#"class="year-filter-btn active" data-value="all""#));
        assert!(html.contains("Mono B&amp;W"));
        assert_eq!(html.matches(r#"class="portfolio-item""#).count(), 2);
        assert_eq!(html.matches("data-src=").count(), 2);
    }

    #[test]
    fn markup_follows_thumbnail_load_outcome() {
        let mut gallery = gallery();
        let session = gallery.loader().token().clone();
        let pass = gallery
            .loader_mut()
            .on_viewport(Rect::new(0.0, 0.0, 1200.0, 300.0));
        assert_eq!(pass.fetches.len(), 5);

        let html = gallery.markup().into_string();
        assert_eq!(html.matches("portfolio-item loading").count(), 5);
        assert_eq!(html.matches("loading-spinner").count(), 5);

        gallery.loader_mut().complete(&session, "fern", Ok(()));
        for id in ["rain", "dusk", "pond", "wall"] {
            gallery
                .loader_mut()
                .complete(&session, id, Err("404".into()));
        }

        let html = gallery.markup().into_string();
        assert!(!html.contains("loading-spinner"));
        assert!(html.contains(r#"src="images/optimized/fern.avif""#));
        assert!(html.contains("transition: opacity 300ms"));
        assert_eq!(html.matches("portfolio-item error").count(), 4);
        assert_eq!(html.matches("Image failed to load").count(), 4);
        assert!(html.contains(r#"title="404""#));
    }

    #[test]
    fn explicit_selection_is_not_toggled() {
        let mut gallery = gallery();
        gallery.render(FilterState::new(["mono", "mono"], Vec::<String>::new()));
        assert_eq!(display_ids(&gallery), vec!["rain", "wall"]);

        let every: Vec<String> = gallery
            .taxonomy()
            .category_values()
            .into_iter()
            .map(String::from)
            .collect();
        gallery.render(FilterState::new(every, ["2023"]));
        assert!(!gallery.state().is_unconstrained(Facet::Category));
        assert_eq!(display_ids(&gallery), vec!["dusk", "pond"]);
    }

    #[test]
    fn markup_empty_grid_message() {
        let gallery = Gallery::new(vec![item("a", &["street"], 2020)], &SiteConfig::default());
        let mut gallery = gallery;
        gallery.click(Facet::Category, FacetClick::Value("nature"));
        assert!(gallery.markup().into_string().contains("Nothing matches"));
    }

    #[test]
    fn layout_places_rows() {
        let layout = GridLayout::default();
        assert_eq!(layout.rect(4), Rect::new(416.0, 316.0, 400.0, 300.0));
    }

    #[test]
    fn load_error_renders_inline() {
        let tmp = TempDir::new().unwrap();
        let err = Gallery::load(&tmp.path().join("missing.json"), &SiteConfig::default()).unwrap_err();
        assert!(render_load_error(&err).into_string().contains("could not be loaded"));

        let path = write_collection(tmp.path(), &sample_items());
        assert_eq!(
            Gallery::load(&path, &SiteConfig::default()).unwrap().items().len(),
            5
        );
    }
}
