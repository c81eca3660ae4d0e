//! Shared domain enumerations for catalog queries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Name of the fallback category that absorbs items of a deleted category.
pub const SENTINEL_CATEGORY_NAME: &str = "NoCategory";

/// Ordering applied to item listings.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    #[default]
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
}

impl SortOption {
    /// Every sort order, in the order warm-up and invalidation walk them.
    pub const ALL: [SortOption; 4] = [
        SortOption::NameAsc,
        SortOption::NameDesc,
        SortOption::PriceAsc,
        SortOption::PriceDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortOption::NameAsc => "name_asc",
            SortOption::NameDesc => "name_desc",
            SortOption::PriceAsc => "price_asc",
            SortOption::PriceDesc => "price_desc",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort option `{0}`")]
pub struct UnknownSortOption(pub String);

impl FromStr for SortOption {
    type Err = UnknownSortOption;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "name_asc" => Ok(SortOption::NameAsc),
            "name_desc" => Ok(SortOption::NameDesc),
            "price_asc" => Ok(SortOption::PriceAsc),
            "price_desc" => Ok(SortOption::PriceDesc),
            other => Err(UnknownSortOption(other.to_string())),
        }
    }
}

/// What happened to an item, as seen by cache invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemChange {
    Created,
    /// `previous_category` is the category name before the update.
    Updated { previous_category: String },
    Deleted,
}

/// What happened to a category, as seen by cache invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryChange {
    Created,
    Updated { previous_name: String },
    /// Items were moved to `reassigned_to` before the category row was removed.
    Deleted { reassigned_to: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_option_round_trips_through_str() {
        for sort in SortOption::ALL {
            assert_eq!(sort.as_str().parse::<SortOption>(), Ok(sort));
        }
    }

    #[test]
    fn unknown_sort_option_is_rejected() {
        let err = "newest".parse::<SortOption>().unwrap_err();
        assert_eq!(err, UnknownSortOption("newest".to_string()));
    }

    #[test]
    fn sort_option_serializes_snake_case() {
        let json = serde_json::to_string(&SortOption::PriceDesc).expect("serialize sort");
        assert_eq!(json, "\"price_desc\"");
    }
}
