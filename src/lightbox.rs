//! Detail viewer (lightbox) state machine.
//!
//! ```text
//!            open / prev / next
//! Closed ─────────────────────────▶ Loading ──ok──▶ Shown
//!   ▲                                  │             │
//!   │                                  └───err──▶ Error
//!   └──── close / Escape / backdrop ─────────────────┘
//! ```
//!
//! The viewer navigates within the display order it was opened with, so
//! prev/next never leave the filtered set. Each full-size fetch is tagged
//! with a request number; a completion for any other request (the user
//! already moved on) is ignored.
//!
//! Votes are recorded at most once per item for the lifetime of the viewer,
//! which the gallery keeps for the whole session.

use crate::config::{ImagesConfig, LightboxConfig};
use crate::types::{PortfolioItem, Votes};
use crate::votes::{VoteRequest, VoteResponse};
use std::collections::HashSet;
use thiserror::Error;

/// Instruction to fetch a full-size image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub request: u64,
    pub id: String,
    pub src: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerState {
    Closed,
    /// Placeholder and spinner shown while the full-size image loads.
    Loading { index: usize, request: u64 },
    Shown { index: usize, size: (u32, u32) },
    /// Load failed; the viewer stays open and navigable.
    Error { index: usize, message: String },
}

/// Keyboard input the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Other,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VoteRejected {
    #[error("No image is open")]
    NotOpen,
    #[error("Already voted for {0} in this session")]
    AlreadyVoted(String),
    #[error("Rating {rating} outside {min}..={max}")]
    OutOfRange { rating: u8, min: u8, max: u8 },
}

/// Scale `natural` to fit inside `bounds`, preserving aspect ratio and never
/// enlarging.
pub fn fit_dimensions(natural: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (w, h) = natural;
    if w == 0 || h == 0 {
        return (0, 0);
    }
    let scale = (f64::from(bounds.0) / f64::from(w))
        .min(f64::from(bounds.1) / f64::from(h))
        .min(1.0);
    (
        (f64::from(w) * scale).round() as u32,
        (f64::from(h) * scale).round() as u32,
    )
}

#[derive(Debug)]
pub struct Lightbox {
    images: ImagesConfig,
    swipe_threshold: f64,
    rating_bounds: (u8, u8),
    order: Vec<PortfolioItem>,
    state: ViewerState,
    /// Natural size of the shown image, kept for re-fitting on resize.
    natural: Option<(u32, u32)>,
    next_request: u64,
    voted: HashSet<String>,
}

impl Lightbox {
    pub fn new(images: &ImagesConfig, config: &LightboxConfig, rating_bounds: (u8, u8)) -> Self {
        Self {
            images: images.clone(),
            swipe_threshold: f64::from(config.swipe_threshold_px),
            rating_bounds,
            order: Vec::new(),
            state: ViewerState::Closed,
            natural: None,
            next_request: 0,
            voted: HashSet::new(),
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != ViewerState::Closed
    }

    /// Open on `id` within `order`. Returns `None` if the id is not part of
    /// the order.
    pub fn open(&mut self, order: Vec<PortfolioItem>, id: &str) -> Option<ImageRequest> {
        let index = order.iter().position(|item| item.id == id)?;
        self.order = order;
        Some(self.load(index))
    }

    fn load(&mut self, index: usize) -> ImageRequest {
        self.next_request += 1;
        let request = self.next_request;
        self.natural = None;
        self.state = ViewerState::Loading { index, request };
        let id = self.order[index].id.clone();
        ImageRequest {
            request,
            src: self.images.original_src(&id),
            id,
        }
    }

    fn index(&self) -> Option<usize> {
        match self.state {
            ViewerState::Closed => None,
            ViewerState::Loading { index, .. }
            | ViewerState::Shown { index, .. }
            | ViewerState::Error { index, .. } => Some(index),
        }
    }

    /// Item currently displayed (or loading).
    pub fn current(&self) -> Option<&PortfolioItem> {
        self.index().map(|i| &self.order[i])
    }

    /// Caption text: a loading notice until the image is shown.
    pub fn caption(&self) -> Option<String> {
        match &self.state {
            ViewerState::Closed => None,
            ViewerState::Loading { .. } => Some("Loading...".to_string()),
            ViewerState::Shown { index, .. } => Some(self.order[*index].caption()),
            ViewerState::Error { message, .. } => Some(message.clone()),
        }
    }

    pub fn has_prev(&self) -> bool {
        self.index().is_some_and(|i| i > 0)
    }

    pub fn has_next(&self) -> bool {
        self.index().is_some_and(|i| i + 1 < self.order.len())
    }

    /// Full-size image arrived. Returns false for a stale request.
    pub fn image_loaded(&mut self, request: u64, natural: (u32, u32), viewport: (u32, u32)) -> bool {
        match self.state {
            ViewerState::Loading { index, request: current } if current == request => {
                self.natural = Some(natural);
                self.state = ViewerState::Shown {
                    index,
                    size: fit_dimensions(natural, viewport),
                };
                true
            }
            _ => false,
        }
    }

    /// Full-size image failed. Returns false for a stale request.
    pub fn image_failed(&mut self, request: u64) -> bool {
        match self.state {
            ViewerState::Loading { index, request: current } if current == request => {
                self.state = ViewerState::Error {
                    index,
                    message: "Failed to load image".to_string(),
                };
                true
            }
            _ => false,
        }
    }

    /// Re-fit the shown image after the viewport changed.
    pub fn resize(&mut self, viewport: (u32, u32)) {
        if let ViewerState::Shown { index, .. } = self.state
            && let Some(natural) = self.natural
        {
            self.state = ViewerState::Shown {
                index,
                size: fit_dimensions(natural, viewport),
            };
        }
    }

    pub fn close(&mut self) {
        self.state = ViewerState::Closed;
        self.natural = None;
    }

    /// Click on the dimmed area around the image.
    pub fn backdrop_click(&mut self) {
        self.close();
    }

    pub fn next(&mut self) -> Option<ImageRequest> {
        let index = self.index()?;
        (index + 1 < self.order.len()).then(|| self.load(index + 1))
    }

    pub fn prev(&mut self) -> Option<ImageRequest> {
        let index = self.index()?;
        (index > 0).then(|| self.load(index - 1))
    }

    pub fn key(&mut self, key: Key) -> Option<ImageRequest> {
        if !self.is_open() {
            return None;
        }
        match key {
            Key::Escape => {
                self.close();
                None
            }
            Key::ArrowLeft => self.prev(),
            Key::ArrowRight => self.next(),
            Key::Other => None,
        }
    }

    /// Horizontal swipe of `dx` pixels: left swipe goes forward.
    pub fn swipe(&mut self, dx: f64) -> Option<ImageRequest> {
        if dx <= -self.swipe_threshold {
            self.next()
        } else if dx >= self.swipe_threshold {
            self.prev()
        } else {
            None
        }
    }

    pub fn has_voted(&self, id: &str) -> bool {
        self.voted.contains(id)
    }

    /// Build a vote for the current item. The item is marked as voted
    /// immediately so a second click cannot double-submit while the request
    /// is in flight; call [`Lightbox::vote_failed`] if it is not counted.
    pub fn vote(&mut self, rating: u8) -> Result<VoteRequest, VoteRejected> {
        let (min, max) = self.rating_bounds;
        let id = self.current().ok_or(VoteRejected::NotOpen)?.id.clone();
        if !(min..=max).contains(&rating) {
            return Err(VoteRejected::OutOfRange { rating, min, max });
        }
        if !self.voted.insert(id.clone()) {
            return Err(VoteRejected::AlreadyVoted(id));
        }
        Ok(VoteRequest {
            item_id: id,
            rating,
        })
    }

    /// Release the session guard after a submission the endpoint rejected
    /// or never received (429, 5xx, network error), so the visitor can retry.
    /// Returns whether the item was marked.
    pub fn vote_failed(&mut self, item_id: &str) -> bool {
        self.voted.remove(item_id)
    }

    /// Show the aggregate returned by the endpoint without refetching the
    /// collection. Returns the updated item.
    pub fn apply_vote_response(&mut self, item_id: &str, response: &VoteResponse) -> Option<&PortfolioItem> {
        let item = self.order.iter_mut().find(|item| item.id == item_id)?;
        item.votes = Some(Votes {
            average: response.new_average,
            count: response.new_count,
        });
        Some(&*item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{item, sample_items};

    fn lightbox() -> Lightbox {
        Lightbox::new(&ImagesConfig::default(), &LightboxConfig::default(), (1, 5))
    }

    fn opened(id: &str) -> (Lightbox, ImageRequest) {
        let mut lb = lightbox();
        let req = lb.open(sample_items(), id).unwrap();
        (lb, req)
    }

    #[test]
    fn fit_never_upscales() {
        assert_eq!(fit_dimensions((800, 600), (1920, 1080)), (800, 600));
    }

    #[test]
    fn fit_preserves_aspect_ratio() {
        assert_eq!(fit_dimensions((4000, 2000), (1000, 1000)), (1000, 500));
        assert_eq!(fit_dimensions((1000, 3000), (1200, 900)), (300, 900));
        assert_eq!(fit_dimensions((0, 10), (100, 100)), (0, 0));
    }

    #[test]
    fn open_requests_original_image() {
        let (lb, req) = opened("wall");
        assert_eq!(req.src, "images/original/wall.webp");
        assert!(matches!(lb.state(), ViewerState::Loading { index: 2, .. }));
        assert_eq!(lb.caption().as_deref(), Some("Loading..."));
    }

    #[test]
    fn open_unknown_id_stays_closed() {
        let mut lb = lightbox();
        assert!(lb.open(sample_items(), "nope").is_none());
        assert!(!lb.is_open());
    }

    #[test]
    fn load_success_shows_fitted_image_and_caption() {
        let mut lb = lightbox();
        let mut items = sample_items();
        items[0].description = Some("Old town".into());
        let req = lb.open(items, "dusk").unwrap();

        assert!(lb.image_loaded(req.request, (3000, 2000), (1500, 1500)));
        assert_eq!(
            lb.state(),
            &ViewerState::Shown {
                index: 0,
                size: (1500, 1000)
            }
        );
        assert_eq!(lb.caption().as_deref(), Some("DUSK: Old town"));

        lb.resize((750, 750));
        assert!(matches!(lb.state(), ViewerState::Shown { size: (750, 500), .. }));
    }

    #[test]
    fn load_failure_keeps_viewer_navigable() {
        let (mut lb, req) = opened("fern");
        assert!(lb.image_failed(req.request));
        assert!(matches!(lb.state(), ViewerState::Error { .. }));
        assert!(lb.is_open());
        assert!(lb.next().is_some());
    }

    #[test]
    fn stale_completion_is_ignored() {
        let (mut lb, first) = opened("fern");
        let second = lb.next().unwrap();
        assert!(!lb.image_loaded(first.request, (10, 10), (100, 100)));
        assert!(!lb.image_failed(first.request));
        assert!(lb.image_loaded(second.request, (10, 10), (100, 100)));
        assert_eq!(lb.current().map(|i| i.id.as_str()), Some("wall"));
    }

    #[test]
    fn navigation_stops_at_bounds() {
        let (mut lb, _) = opened("dusk");
        assert!(!lb.has_prev());
        assert!(lb.prev().is_none());
        assert!(matches!(lb.state(), ViewerState::Loading { index: 0, .. }));

        let (mut lb, _) = opened("pond");
        assert!(!lb.has_next());
        assert!(lb.key(Key::ArrowRight).is_none());
        assert!(lb.key(Key::ArrowLeft).is_some());
        assert_eq!(lb.current().map(|i| i.id.as_str()), Some("rain"));
    }

    #[test]
    fn navigation_stays_in_filtered_order() {
        let mut lb = lightbox();
        let order = vec![item("x", &["street"], 2024), item("y", &["street"], 2020)];
        lb.open(order, "x").unwrap();
        let req = lb.next().unwrap();
        assert_eq!(req.id, "y");
        assert!(lb.next().is_none());
    }

    #[test]
    fn escape_closes() {
        let (mut lb, _) = opened("fern");
        assert!(lb.key(Key::Escape).is_none());
        assert_eq!(lb.state(), &ViewerState::Closed);
        assert!(lb.caption().is_none());
    }

    #[test]
    fn backdrop_click_closes() {
        let (mut lb, _) = opened("fern");
        lb.backdrop_click();
        assert!(!lb.is_open());
    }

    #[test]
    fn swipe_respects_threshold() {
        let (mut lb, _) = opened("fern");
        assert!(lb.swipe(-30.0).is_none());
        assert_eq!(lb.swipe(-60.0).map(|r| r.id), Some("wall".to_string()));
        assert_eq!(lb.swipe(80.0).map(|r| r.id), Some("fern".to_string()));
    }

    #[test]
    fn one_vote_per_item_per_session() {
        let (mut lb, _) = opened("fern");
        let vote = lb.vote(4).unwrap();
        assert_eq!(vote.item_id, "fern");
        assert_eq!(lb.vote(5), Err(VoteRejected::AlreadyVoted("fern".into())));

        // Reopening does not reset the session set
        lb.close();
        lb.open(sample_items(), "fern").unwrap();
        assert!(lb.has_voted("fern"));
        assert!(lb.vote(3).is_err());
    }

    #[test]
    fn vote_out_of_range_does_not_consume_the_vote() {
        let (mut lb, _) = opened("fern");
        assert!(matches!(lb.vote(0), Err(VoteRejected::OutOfRange { .. })));
        assert!(matches!(lb.vote(6), Err(VoteRejected::OutOfRange { .. })));
        assert!(lb.vote(5).is_ok());
    }

    #[test]
    fn failed_submission_allows_retry() {
        let (mut lb, _) = opened("fern");
        lb.vote(5).unwrap();
        assert!(lb.vote(5).is_err());

        // Endpoint answered 429; nothing was counted
        assert!(lb.vote_failed("fern"));
        assert!(!lb.has_voted("fern"));
        let retry = lb.vote(5).unwrap();
        assert_eq!(retry.item_id, "fern");
        assert_eq!(lb.vote(4), Err(VoteRejected::AlreadyVoted("fern".into())));
        assert!(!lb.vote_failed("wall"));
    }

    #[test]
    fn vote_requires_open_viewer() {
        assert_eq!(lightbox().vote(3), Err(VoteRejected::NotOpen));
    }

    #[test]
    fn apply_response_updates_displayed_aggregate() {
        let (mut lb, _) = opened("fern");
        let response = VoteResponse {
            success: true,
            new_average: 4.5,
            new_count: 2,
        };
        let updated = lb.apply_vote_response("fern", &response).unwrap();
        assert_eq!(updated.votes.map(|v| v.count), Some(2));
        assert_eq!(lb.current().and_then(|i| i.votes).map(|v| v.average), Some(4.5));
    }
}
