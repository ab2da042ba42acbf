//! Filter facets derived from the item collection.
//!
//! The gallery shows two rows of facet buttons: categories and years. Both are
//! computed from the loaded collection rather than configured, so a new year or
//! tag shows up as soon as an item carries it. Configuration only supplies the
//! display labels and the preferred order of known categories.

use crate::config::CategoriesConfig;
use crate::types::PortfolioItem;
use std::collections::BTreeSet;

/// A facet button: the raw tag/year value and the text shown on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetOption {
    pub value: String,
    pub label: String,
    /// Number of items in the full collection carrying this facet.
    pub count: usize,
}

/// Available facets for one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxonomy {
    pub categories: Vec<FacetOption>,
    pub years: Vec<FacetOption>,
}

impl Taxonomy {
    /// Derive facets from the collection.
    ///
    /// Categories follow the configured order; tags the config doesn't know
    /// about come after, alphabetically. Years are newest first.
    pub fn from_items(items: &[PortfolioItem], labels: &CategoriesConfig) -> Self {
        let present: BTreeSet<&str> = items
            .iter()
            .flat_map(|item| item.categories.iter().map(String::as_str))
            .collect();

        let mut ordered: Vec<&str> = labels
            .order
            .iter()
            .map(String::as_str)
            .filter(|tag| present.contains(tag))
            .collect();
        ordered.extend(
            present
                .iter()
                .copied()
                .filter(|tag| !labels.order.iter().any(|known| known.as_str() == *tag)),
        );

        let categories = ordered
            .into_iter()
            .map(|tag| FacetOption {
                value: tag.to_string(),
                label: labels.label(tag).to_string(),
                count: items.iter().filter(|item| item.has_category(tag)).count(),
            })
            .collect();

        let distinct_years: BTreeSet<i32> = items.iter().map(|item| item.year).collect();
        let years = distinct_years
            .into_iter()
            .rev()
            .map(|year| FacetOption {
                value: year.to_string(),
                label: year.to_string(),
                count: items.iter().filter(|item| item.year == year).count(),
            })
            .collect();

        Self { categories, years }
    }

    pub fn category_values(&self) -> Vec<&str> {
        self.categories.iter().map(|f| f.value.as_str()).collect()
    }

    pub fn year_values(&self) -> Vec<&str> {
        self.years.iter().map(|f| f.value.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::item;

    #[test]
    fn years_are_distinct_and_descending() {
        let items = vec![
            item("a", &["street"], 2022),
            item("b", &["street"], 2024),
            item("c", &["nature"], 2022),
            item("d", &["nature"], 2023),
        ];
        let taxonomy = Taxonomy::from_items(&items, &CategoriesConfig::default());
        assert_eq!(taxonomy.year_values(), vec!["2024", "2023", "2022"]);
        assert_eq!(taxonomy.years[2].count, 2);
    }

    #[test]
    fn categories_follow_configured_order() {
        let items = vec![
            item("a", &["mono", "street"], 2022),
            item("b", &["best"], 2024),
        ];
        let taxonomy = Taxonomy::from_items(&items, &CategoriesConfig::default());
        assert_eq!(taxonomy.category_values(), vec!["best", "street", "mono"]);
        assert_eq!(taxonomy.categories[2].label, "Mono B&W");
    }

    #[test]
    fn unknown_categories_appended_alphabetically() {
        let items = vec![
            item("a", &["zoo", "street"], 2022),
            item("b", &["portrait"], 2024),
        ];
        let taxonomy = Taxonomy::from_items(&items, &CategoriesConfig::default());
        assert_eq!(
            taxonomy.category_values(),
            vec!["street", "portrait", "zoo"]
        );
        // Unknown tags are labelled with the tag itself
        assert_eq!(taxonomy.categories[1].label, "portrait");
    }

    #[test]
    fn empty_collection_has_no_facets() {
        let taxonomy = Taxonomy::from_items(&[], &CategoriesConfig::default());
        assert!(taxonomy.categories.is_empty());
        assert!(taxonomy.years.is_empty());
    }
}
