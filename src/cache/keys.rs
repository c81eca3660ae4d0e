//! Query shapes and their canonical cache keys.
//!
//! Every cached view is identified by a [`QueryShape`]. [`QueryShape::cache_key`] is the only
//! place a shape becomes a string, and the mapping is injective: free-text parameters are
//! percent-escaped so they can never contain the `:` separator.

use std::fmt;

use crate::application::pagination::PageRequest;
use crate::domain::types::SortOption;

const KEY_PREFIX: &str = "catalog";

/// Which typed cache a shape belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeFamily {
    ItemList,
    CategoryList,
    Quantity,
}

impl ShapeFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeFamily::ItemList => "item list",
            ShapeFamily::CategoryList => "category list",
            ShapeFamily::Quantity => "quantity",
        }
    }
}

impl fmt::Display for ShapeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cacheable catalog query.
///
/// Variant order matters: plans execute shapes in `Ord` order, so lists are refreshed before
/// the counters that describe them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QueryShape {
    AllItems {
        sort: SortOption,
        page: PageRequest,
    },
    ItemsByCategory {
        category: String,
        sort: SortOption,
        page: PageRequest,
    },
    SearchLine {
        term: String,
        page: PageRequest,
    },
    AllCategories,
    ItemsQuantity,
    ItemsQuantityByCategory {
        category: String,
    },
}

impl QueryShape {
    pub fn family(&self) -> ShapeFamily {
        match self {
            QueryShape::AllItems { .. }
            | QueryShape::ItemsByCategory { .. }
            | QueryShape::SearchLine { .. } => ShapeFamily::ItemList,
            QueryShape::AllCategories => ShapeFamily::CategoryList,
            QueryShape::ItemsQuantity | QueryShape::ItemsQuantityByCategory { .. } => {
                ShapeFamily::Quantity
            }
        }
    }

    /// Stable label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            QueryShape::AllItems { .. } => "all_items",
            QueryShape::ItemsByCategory { .. } => "items_by_category",
            QueryShape::SearchLine { .. } => "search_line",
            QueryShape::AllCategories => "all_categories",
            QueryShape::ItemsQuantity => "items_quantity",
            QueryShape::ItemsQuantityByCategory { .. } => "items_quantity_by_category",
        }
    }

    /// Whether warm-up and invalidation keep this shape fresh. Everything else relies on TTL.
    pub fn is_enumerable(&self) -> bool {
        match self {
            QueryShape::AllItems { page, .. } | QueryShape::ItemsByCategory { page, .. } => {
                page.is_default()
            }
            QueryShape::SearchLine { .. } => false,
            QueryShape::AllCategories
            | QueryShape::ItemsQuantity
            | QueryShape::ItemsQuantityByCategory { .. } => true,
        }
    }

    pub fn cache_key(&self) -> String {
        match self {
            QueryShape::AllItems { sort, page } => format!(
                "{KEY_PREFIX}:items:all:{sort}:{}:{}",
                page.offset, page.limit
            ),
            QueryShape::ItemsByCategory {
                category,
                sort,
                page,
            } => format!(
                "{KEY_PREFIX}:items:category:{}:{sort}:{}:{}",
                escape(category),
                page.offset,
                page.limit
            ),
            QueryShape::SearchLine { term, page } => format!(
                "{KEY_PREFIX}:items:search:{}:{}:{}",
                escape(term),
                page.offset,
                page.limit
            ),
            QueryShape::AllCategories => format!("{KEY_PREFIX}:categories:all"),
            QueryShape::ItemsQuantity => format!("{KEY_PREFIX}:quantity:items"),
            QueryShape::ItemsQuantityByCategory { category } => {
                format!("{KEY_PREFIX}:quantity:category:{}", escape(category))
            }
        }
    }

    /// The default page of every sort over the whole catalog.
    pub fn default_item_lists() -> impl Iterator<Item = QueryShape> {
        SortOption::ALL.into_iter().map(|sort| QueryShape::AllItems {
            sort,
            page: PageRequest::first(),
        })
    }

    /// The default page of every sort within one category.
    pub fn default_category_lists(category: &str) -> impl Iterator<Item = QueryShape> + '_ {
        SortOption::ALL
            .into_iter()
            .map(move |sort| QueryShape::ItemsByCategory {
                category: category.to_string(),
                sort,
                page: PageRequest::first(),
            })
    }

    pub fn quantity_of(category: &str) -> QueryShape {
        QueryShape::ItemsQuantityByCategory {
            category: category.to_string(),
        }
    }
}

impl fmt::Display for QueryShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key())
    }
}

/// Percent-escape `%`, `:` and anything outside printable ASCII.
fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'%' | b':' => escaped.push_str(&format!("%{byte:02X}")),
            0x21..=0x7E => escaped.push(char::from(byte)),
            _ => escaped.push_str(&format!("%{byte:02X}")),
        }
    }
    escaped
}
