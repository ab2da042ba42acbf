//! Star-rating votes: wire types, request validation and the file-backed
//! aggregate store.
//!
//! The store is the portfolio collection file itself. A vote is a
//! read-modify-write of that file:
//!
//! ```text
//! new_average = (average × count + rating) / (count + 1)
//! new_count   = count + 1
//! ```
//!
//! Within one process, writes are serialized by a mutex so concurrent votes
//! for the same item are never lost. There is no cross-process lock: two
//! server processes sharing the file race, and the last writer wins.

use crate::collection::{self, CollectionError};
use crate::types::Votes;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoteError {
    #[error("Invalid request data: {0}")]
    InvalidRequest(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Vote store failure: {0}")]
    Store(#[from] CollectionError),
}

/// Body of `POST /api/save_vote`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub item_id: String,
    pub rating: u8,
}

/// Lenient shape used to tell "missing field" from "bad value".
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVoteRequest {
    item_id: Option<String>,
    rating: Option<f64>,
}

impl VoteRequest {
    /// Parse and validate a JSON body against the configured rating bounds.
    pub fn parse(body: &[u8], min_rating: u8, max_rating: u8) -> Result<Self, VoteError> {
        let raw: RawVoteRequest = serde_json::from_slice(body)
            .map_err(|e| VoteError::InvalidRequest(format!("malformed JSON: {e}")))?;

        let item_id = match raw.item_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Err(VoteError::InvalidRequest("itemId is required".into())),
        };
        let Some(rating) = raw.rating else {
            return Err(VoteError::InvalidRequest("rating is required".into()));
        };
        let request = Self {
            item_id,
            rating: whole_rating(rating)
                .ok_or_else(|| VoteError::InvalidRequest("rating must be a whole number".into()))?,
        };
        request.validate(min_rating, max_rating)?;
        Ok(request)
    }

    pub fn validate(&self, min_rating: u8, max_rating: u8) -> Result<(), VoteError> {
        if !(min_rating..=max_rating).contains(&self.rating) {
            return Err(VoteError::InvalidRequest(format!(
                "rating must be between {min_rating} and {max_rating}"
            )));
        }
        Ok(())
    }
}

fn whole_rating(value: f64) -> Option<u8> {
    (value.fract() == 0.0 && (0.0..=f64::from(u8::MAX)).contains(&value)).then(|| value as u8)
}

/// Successful response of `POST /api/save_vote`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub success: bool,
    pub new_average: f64,
    pub new_count: u32,
}

impl From<Votes> for VoteResponse {
    fn from(votes: Votes) -> Self {
        Self {
            success: true,
            new_average: votes.average,
            new_count: votes.count,
        }
    }
}

/// File-backed vote aggregate.
#[derive(Debug)]
pub struct VoteStore {
    path: PathBuf,
    rating_bounds: (u8, u8),
    write_lock: Mutex<()>,
}

impl VoteStore {
    /// `rating_bounds` must match the range requests are validated against,
    /// or the store would write averages it refuses to read back.
    pub fn new(path: impl Into<PathBuf>, rating_bounds: (u8, u8)) -> Self {
        Self {
            path: path.into(),
            rating_bounds,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fold one rating into the item's aggregate and persist the collection.
    ///
    /// Blocking; call from a blocking context in async code.
    pub fn record(&self, request: &VoteRequest) -> Result<Votes, VoteError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut items = collection::load_collection(&self.path, self.rating_bounds)?;
        let item = items
            .iter_mut()
            .find(|item| item.id == request.item_id)
            .ok_or_else(|| VoteError::NotFound(request.item_id.clone()))?;

        let updated = item.votes.unwrap_or_default().record(request.rating);
        item.votes = Some(updated);
        collection::save_collection(&self.path, &items)?;
        Ok(updated)
    }
}
