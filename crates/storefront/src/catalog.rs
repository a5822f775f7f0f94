//! In-memory filtering over a page of products.
//!
//! Each dimension holds at most one selected value. Toggling a value that is
//! already selected clears the dimension; toggling any other value replaces
//! the selection.

use std::collections::BTreeSet;

use crate::api::Product;

/// A filter dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Tribe,
    Region,
    Category,
}

/// Selected filters plus a free-text query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    tribe: Option<String>,
    region: Option<String>,
    category: Option<String>,
    query: String,
}

impl ProductFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `value` in `kind`, or clear it if it is already selected.
    pub fn toggle(&mut self, kind: FilterKind, value: &str) {
        let slot = self.slot(kind);
        if slot.as_deref() == Some(value) {
            *slot = None;
        } else {
            *slot = Some(value.to_string());
        }
    }

    /// Currently selected value in `kind`.
    #[must_use]
    pub fn selected(&self, kind: FilterKind) -> Option<&str> {
        match kind {
            FilterKind::Tribe => self.tribe.as_deref(),
            FilterKind::Region => self.region.as_deref(),
            FilterKind::Category => self.category.as_deref(),
        }
    }

    /// Set the free-text query. Matching is case-insensitive.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Drop all selections and the query.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns `true` if any selection or query is set.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.tribe.is_some()
            || self.region.is_some()
            || self.category.is_some()
            || !self.query.trim().is_empty()
    }

    /// Returns `true` if `product` passes every active filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let tribe = product.tribe.as_ref();
        let tribe_name = tribe.map(|t| t.name.as_str());
        let region = tribe.map(|t| t.region.as_str());
        let category = product.category.as_ref().map(|c| c.name.as_str());

        let selected = |want: &Option<String>, have: Option<&str>| {
            want.as_deref().is_none_or(|want| have == Some(want))
        };
        if !selected(&self.tribe, tribe_name)
            || !selected(&self.region, region)
            || !selected(&self.category, category)
        {
            return false;
        }

        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        [Some(product.name.as_str()), tribe_name, Some(product.description.as_str())]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&query))
    }

    /// The products that pass every active filter, in their original order.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }

    fn slot(&mut self, kind: FilterKind) -> &mut Option<String> {
        match kind {
            FilterKind::Tribe => &mut self.tribe,
            FilterKind::Region => &mut self.region,
            FilterKind::Category => &mut self.category,
        }
    }
}

/// Distinct values available in each dimension, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub tribes: Vec<String>,
    pub regions: Vec<String>,
    pub categories: Vec<String>,
}

impl FilterOptions {
    /// Collect the options present in `products`.
    #[must_use]
    pub fn from_products(products: &[Product]) -> Self {
        let mut tribes = BTreeSet::new();
        let mut regions = BTreeSet::new();
        let mut categories = BTreeSet::new();

        for product in products {
            if let Some(tribe) = &product.tribe {
                tribes.insert(tribe.name.clone());
                if !tribe.region.is_empty() {
                    regions.insert(tribe.region.clone());
                }
            }
            if let Some(category) = &product.category {
                categories.insert(category.name.clone());
            }
        }

        Self {
            tribes: tribes.into_iter().collect(),
            regions: regions.into_iter().collect(),
            categories: categories.into_iter().collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn products() -> Vec<Product> {
        serde_json::from_value(json!([
            {
                "id": "1", "name": "Pwo Mask", "price": 1200, "description": "Carved wood, kaolin",
                "tribe": { "id": "t1", "name": "Chokwe", "region": "Central Africa" },
                "category": { "id": "c1", "name": "Masks" }
            },
            {
                "id": "2", "name": "Kente Strip", "price": 300, "description": "Hand-woven silk",
                "tribe": { "id": "t2", "name": "Ashanti", "region": "West Africa" },
                "category": { "id": "c2", "name": "Textiles" }
            },
            {
                "id": "3", "name": "Nkisi Figure", "price": 2500, "description": "Power figure",
                "tribe": { "id": "t3", "name": "Kongo", "region": "Central Africa" },
                "category": { "id": "c3", "name": "Figures" }
            }
        ]))
        .unwrap()
    }

    fn ids(found: &[&Product]) -> Vec<String> {
        found.iter().map(|p| p.id.to_string()).collect()
    }

    #[test]
    fn test_inactive_filter_keeps_everything() {
        let products = products();
        let filter = ProductFilter::new();
        assert!(!filter.is_active());
        assert_eq!(filter.apply(&products).len(), 3);
    }

    #[test]
    fn test_toggle_is_single_select() {
        let mut filter = ProductFilter::new();
        filter.toggle(FilterKind::Tribe, "Chokwe");
        filter.toggle(FilterKind::Tribe, "Kongo");
        assert_eq!(filter.selected(FilterKind::Tribe), Some("Kongo"));

        filter.toggle(FilterKind::Tribe, "Kongo");
        assert_eq!(filter.selected(FilterKind::Tribe), None);
    }

    #[test]
    fn test_region_and_category_combine() {
        let products = products();
        let mut filter = ProductFilter::new();
        filter.toggle(FilterKind::Region, "Central Africa");
        assert_eq!(ids(&filter.apply(&products)), ["1", "3"]);

        filter.toggle(FilterKind::Category, "Figures");
        assert_eq!(ids(&filter.apply(&products)), ["3"]);
    }

    #[test]
    fn test_query_matches_name_tribe_description() {
        let products = products();
        let mut filter = ProductFilter::new();

        filter.set_query("MASK");
        assert_eq!(ids(&filter.apply(&products)), ["1"]);

        filter.set_query("ashanti");
        assert_eq!(ids(&filter.apply(&products)), ["2"]);

        filter.set_query("power");
        assert_eq!(ids(&filter.apply(&products)), ["3"]);

        filter.set_query("bronze");
        assert!(filter.apply(&products).is_empty());
    }

    #[test]
    fn test_options_are_sorted_and_unique() {
        let options = FilterOptions::from_products(&products());
        assert_eq!(options.regions, ["Central Africa", "West Africa"]);
        assert_eq!(options.tribes, ["Ashanti", "Chokwe", "Kongo"]);
        assert_eq!(options.categories.len(), 3);
    }
}
