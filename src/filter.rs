//! Filter-sort engine for the portfolio gallery.
//!
//! The active facet selection is an explicit, immutable [`FilterState`] value.
//! Facet buttons are a rendering of that value; clicking one produces a new
//! state via [`FilterState::toggle`] and the display order is rebuilt from
//! scratch by [`compute_visible`]. Nothing is read back from markup, so a
//! click arriving mid-animation just recomputes from the current state.
//!
//! ## Ranking
//!
//! ```text
//! category_matches = |item.categories ∩ active_categories|   (0 if none active)
//! year_match       = active_years = ∅  ∨  item.year ∈ active_years
//! visible          = year_match ∧ (active_categories = ∅ ∨ category_matches > 0)
//! order            = category_matches desc, year desc, collection order
//! ```
//!
//! With no active categories every item scores 0, so the order falls through
//! to year descending.

use crate::types::PortfolioItem;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeSet;

/// A filter dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Category,
    Year,
}

/// A click on one facet button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetClick<'a> {
    /// The "all" pseudo-button of the dimension.
    All,
    /// A specific category tag or year.
    Value(&'a str),
}

/// Active facet selections. Empty sets mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub active_categories: BTreeSet<String>,
    /// Years as strings, matching how they appear on facet buttons.
    #[serde(default)]
    pub active_years: BTreeSet<String>,
}

impl FilterState {
    /// Build a state from explicit selections (CLI flags, tests).
    pub fn new<C, Y>(categories: C, years: Y) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        Y: IntoIterator,
        Y::Item: Into<String>,
    {
        Self {
            active_categories: categories.into_iter().map(Into::into).collect(),
            active_years: years.into_iter().map(Into::into).collect(),
        }
    }

    pub fn active(&self, facet: Facet) -> &BTreeSet<String> {
        match facet {
            Facet::Category => &self.active_categories,
            Facet::Year => &self.active_years,
        }
    }

    /// Whether the "all" button of a dimension renders as active.
    pub fn is_unconstrained(&self, facet: Facet) -> bool {
        self.active(facet).is_empty()
    }

    pub fn is_active(&self, facet: Facet, value: &str) -> bool {
        self.active(facet).contains(value)
    }

    /// Apply a facet click and return the resulting state.
    ///
    /// - "all" clears the dimension.
    /// - A specific value toggles membership.
    /// - If that leaves every available value of the dimension selected, the
    ///   dimension collapses back to unconstrained.
    pub fn toggle(&self, facet: Facet, click: FacetClick<'_>, available: &[&str]) -> Self {
        let mut next = self.clone();
        let set = match facet {
            Facet::Category => &mut next.active_categories,
            Facet::Year => &mut next.active_years,
        };

        match click {
            FacetClick::All => set.clear(),
            FacetClick::Value(value) => {
                if !set.remove(value) {
                    set.insert(value.to_string());
                }
                if !available.is_empty() && available.iter().all(|v| set.contains(*v)) {
                    set.clear();
                }
            }
        }
        next
    }
}

/// Number of the item's categories that are currently active.
pub fn category_matches(item: &PortfolioItem, state: &FilterState) -> usize {
    if state.active_categories.is_empty() {
        return 0;
    }
    item.categories
        .iter()
        .filter(|c| state.active_categories.contains(c.as_str()))
        .count()
}

pub fn year_match(item: &PortfolioItem, state: &FilterState) -> bool {
    state.active_years.is_empty() || state.active_years.contains(&item.year.to_string())
}

/// Compute the display order for a facet selection.
///
/// Pure: the same items and state always give the same sequence.
pub fn compute_visible<'a>(items: &'a [PortfolioItem], state: &FilterState) -> Vec<&'a PortfolioItem> {
    let mut ranked: Vec<(usize, &PortfolioItem)> = items
        .iter()
        .filter(|item| year_match(item, state))
        .map(|item| (category_matches(item, state), item))
        .filter(|(matches, _)| state.active_categories.is_empty() || *matches > 0)
        .collect();

    // sort_by_key is stable; equal keys keep collection order
    ranked.sort_by_key(|(matches, item)| (Reverse(*matches), Reverse(item.year)));
    ranked.into_iter().map(|(_, item)| item).collect()
}
