//! Catalog tables: `items` and `categories`.

mod read;
mod types;
mod write;

use sqlx::{Postgres, QueryBuilder};

use crate::domain::types::SortOption;

/// Item columns joined with their category, aliased to match [`types::ItemRow`].
const ITEM_SELECT: &str = "SELECT i.id, i.title, i.description, i.price, i.vendor, i.images, \
    i.created_at, i.updated_at, \
    c.id AS category_id, c.name AS category_name, \
    c.description AS category_description, c.image AS category_image";

const CATEGORY_SELECT: &str =
    "SELECT id, name, description, image, created_at, updated_at FROM categories";

fn order_clause(sort: SortOption) -> &'static str {
    match sort {
        SortOption::NameAsc => " ORDER BY i.title ASC, i.id ASC",
        SortOption::NameDesc => " ORDER BY i.title DESC, i.id ASC",
        SortOption::PriceAsc => " ORDER BY i.price ASC, i.id ASC",
        SortOption::PriceDesc => " ORDER BY i.price DESC, i.id ASC",
    }
}

fn push_window(qb: &mut QueryBuilder<'_, Postgres>, offset: u32, limit: u32) {
    qb.push(" LIMIT ");
    qb.push_bind(i64::from(limit));
    qb.push(" OFFSET ");
    qb.push_bind(i64::from(offset));
}

/// Escape `LIKE` wildcards so the search term matches literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
