//! Offset pagination for catalog listings.

use serde::{Deserialize, Serialize};

/// Page size used when a request does not name one; also the size of every warmed page.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A validated offset/limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Build a page request, clamping `limit` into `1..=MAX_PAGE_LIMIT`.
    pub fn new(offset: u32, limit: u32) -> Self {
        Self {
            offset,
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// Resolve optional query parameters, falling back to the default page.
    pub fn from_query(offset: Option<u32>, limit: Option<u32>) -> Self {
        Self::new(offset.unwrap_or(0), limit.unwrap_or(DEFAULT_PAGE_LIMIT))
    }

    /// The first page at the default size.
    pub fn first() -> Self {
        Self::new(0, DEFAULT_PAGE_LIMIT)
    }

    /// Whether this window is the one warm-up and invalidation keep fresh.
    pub fn is_default(&self) -> bool {
        *self == Self::first()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}
