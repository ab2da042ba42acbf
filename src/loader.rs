//! Incremental image loader.
//!
//! Thumbnails are fetched only when their element comes within a proximity
//! margin of the viewport. The loader itself does no I/O: it answers
//! viewport updates with [`FetchCommand`]s and is told the outcome through
//! [`ImageLoader::complete`].
//!
//! ## Sessions
//!
//! Every call to [`ImageLoader::observe`] starts a new session and cancels
//! the previous one. Fetches carry the [`SessionToken`] they were issued
//! under; a completion whose token is not the current one is dropped and
//! never touches the current elements. Fetch tasks can also poll
//! [`SessionToken::is_cancelled`] to abandon work early.
//!
//! ## Per-element lifecycle
//!
//! ```text
//! Pending ──(within load margin)──▶ Loading ──ok──▶ Loaded (fade in)
//!                                          └─err─▶ Failed (no retry)
//! ```
//!
//! Independently, an element is *revealed* (entry animation) once it comes
//! within the smaller reveal margin.

use crate::config::GalleryConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Axis-aligned rectangle in page pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Grow the rectangle by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Rect {
        Rect {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + 2.0 * margin,
            height: self.height + 2.0 * margin,
        }
    }

    /// True if the rectangles overlap or touch.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.x + other.width
            && other.x <= self.x + self.width
            && self.y <= other.y + other.height
            && other.y <= self.y + self.height
    }
}

/// Handle identifying one observation session.
#[derive(Debug, Clone)]
pub struct SessionToken {
    generation: u64,
    cancelled: Arc<AtomicBool>,
}

impl SessionToken {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

impl PartialEq for SessionToken {
    fn eq(&self, other: &Self) -> bool {
        self.generation == other.generation
    }
}

/// Load state of one element's image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Registered, waiting to come near the viewport.
    Pending,
    /// Fetch issued; a spinner is shown.
    Loading,
    /// Image arrived; fade in over `fade_ms`.
    Loaded { fade_ms: u32 },
    /// Fetch failed; the error indicator stays until the next session.
    Failed { reason: String },
}

/// An element handed to the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTarget {
    pub id: String,
    pub src: String,
    pub rect: Rect,
}

/// Instruction to fetch one image.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchCommand {
    pub token: SessionToken,
    pub id: String,
    pub src: String,
}

/// What a single viewport update triggered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewportPass {
    pub fetches: Vec<FetchCommand>,
    /// Ids whose entry animation starts in this pass.
    pub revealed: Vec<String>,
}

/// Result of reporting a fetch outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Applied(LoadState),
    /// Token from a cancelled session; ignored.
    Stale,
    /// No element with that id is loading in this session.
    Unknown,
}

#[derive(Debug)]
struct Tracked {
    target: LoadTarget,
    state: LoadState,
    revealed: bool,
}

#[derive(Debug)]
pub struct ImageLoader {
    load_margin: f64,
    reveal_margin: f64,
    fade_ms: u32,
    token: SessionToken,
    elements: Vec<Tracked>,
}

impl ImageLoader {
    pub fn new(config: &GalleryConfig) -> Self {
        Self {
            load_margin: f64::from(config.load_margin_px),
            reveal_margin: f64::from(config.reveal_margin_px),
            fade_ms: config.fade_ms,
            token: SessionToken::new(0),
            elements: Vec::new(),
        }
    }

    /// Start a new session over `targets`, cancelling the previous one.
    pub fn observe(&mut self, targets: Vec<LoadTarget>) -> SessionToken {
        self.token.cancel();
        self.token = SessionToken::new(self.token.generation + 1);
        self.elements = targets
            .into_iter()
            .map(|target| Tracked {
                target,
                state: LoadState::Pending,
                revealed: false,
            })
            .collect();
        self.token.clone()
    }

    /// Current session token.
    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Process a viewport position. Each pending element inside the load
    /// margin is fetched exactly once.
    pub fn on_viewport(&mut self, viewport: Rect) -> ViewportPass {
        let load_zone = viewport.expand(self.load_margin);
        let reveal_zone = viewport.expand(self.reveal_margin);
        let mut pass = ViewportPass::default();

        for tracked in &mut self.elements {
            if tracked.state == LoadState::Pending && tracked.target.rect.intersects(&load_zone) {
                tracked.state = LoadState::Loading;
                pass.fetches.push(FetchCommand {
                    token: self.token.clone(),
                    id: tracked.target.id.clone(),
                    src: tracked.target.src.clone(),
                });
            }
            if !tracked.revealed && tracked.target.rect.intersects(&reveal_zone) {
                tracked.revealed = true;
                pass.revealed.push(tracked.target.id.clone());
            }
        }
        pass
    }

    /// Report a fetch outcome.
    pub fn complete(
        &mut self,
        token: &SessionToken,
        id: &str,
        outcome: Result<(), String>,
    ) -> Completion {
        if *token != self.token {
            return Completion::Stale;
        }
        let fade_ms = self.fade_ms;
        let Some(tracked) = self
            .elements
            .iter_mut()
            .find(|t| t.target.id == id && t.state == LoadState::Loading)
        else {
            return Completion::Unknown;
        };

        tracked.state = match outcome {
            Ok(()) => LoadState::Loaded { fade_ms },
            Err(reason) => LoadState::Failed { reason },
        };
        Completion::Applied(tracked.state.clone())
    }

    pub fn state(&self, id: &str) -> Option<&LoadState> {
        self.elements
            .iter()
            .find(|t| t.target.id == id)
            .map(|t| &t.state)
    }

    pub fn is_revealed(&self, id: &str) -> bool {
        self.elements.iter().any(|t| t.target.id == id && t.revealed)
    }

    /// Number of elements still waiting for the viewport.
    pub fn pending(&self) -> usize {
        self.elements
            .iter()
            .filter(|t| t.state == LoadState::Pending)
            .count()
    }
}
