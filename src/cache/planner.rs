//! Invalidation plan generation.
//!
//! Turns catalog events into the set of cached views to recompute and the set to drop.

use std::collections::BTreeSet;
use std::fmt;

use super::events::CatalogEvent;
use super::keys::QueryShape;

/// Shapes to refresh (recompute and store) and shapes to evict (delete).
///
/// The sets are disjoint: when a shape lands in both, eviction wins.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvalidationPlan {
    pub refresh: BTreeSet<QueryShape>,
    pub evict: BTreeSet<QueryShape>,
}

impl fmt::Display for InvalidationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InvalidationPlan {{ refresh: {}, evict: {} }}",
            self.refresh.len(),
            self.evict.len()
        )
    }
}

impl InvalidationPlan {
    /// Merge events into one deduplicated plan. Pure and deterministic.
    pub fn from_events(events: impl IntoIterator<Item = CatalogEvent>) -> Self {
        let mut plan = Self::default();

        for event in events {
            match event {
                CatalogEvent::ItemCreated { category } | CatalogEvent::ItemDeleted { category } => {
                    plan.refresh_catalog_wide(true);
                    plan.refresh_category(&category);
                }
                CatalogEvent::ItemUpdated {
                    category,
                    previous_category,
                } => {
                    plan.refresh_catalog_wide(true);
                    plan.refresh_category(&category);
                    if previous_category != category {
                        plan.refresh_category(&previous_category);
                    }
                }
                CatalogEvent::CategoryCreated { name } => {
                    plan.refresh.insert(QueryShape::AllCategories);
                    plan.refresh_category(&name);
                }
                CatalogEvent::CategoryUpdated {
                    name,
                    previous_name,
                } => {
                    plan.refresh.insert(QueryShape::AllCategories);
                    // Items embed their category, so every catalog-wide page may be stale.
                    plan.refresh_catalog_wide(false);
                    plan.refresh_category(&name);
                    if previous_name != name {
                        plan.retire_category(&previous_name);
                    }
                }
                CatalogEvent::CategoryDeleted {
                    name,
                    reassigned_to,
                } => {
                    plan.refresh.insert(QueryShape::AllCategories);
                    plan.refresh_catalog_wide(true);
                    plan.refresh_category(&reassigned_to);
                    plan.retire_category(&name);
                }
            }
        }

        let evicted = &plan.evict;
        plan.refresh.retain(|shape| !evicted.contains(shape));
        plan
    }

    pub fn is_empty(&self) -> bool {
        self.refresh.is_empty() && self.evict.is_empty()
    }

    fn refresh_catalog_wide(&mut self, with_total: bool) {
        self.refresh.extend(QueryShape::default_item_lists());
        if with_total {
            self.refresh.insert(QueryShape::ItemsQuantity);
        }
    }

    fn refresh_category(&mut self, name: &str) {
        self.refresh
            .extend(QueryShape::default_category_lists(name));
        self.refresh.insert(QueryShape::quantity_of(name));
    }

    fn retire_category(&mut self, name: &str) {
        self.evict.extend(QueryShape::default_category_lists(name));
        self.evict.insert(QueryShape::quantity_of(name));
    }
}
