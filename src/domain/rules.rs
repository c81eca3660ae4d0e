//! Field rules shared by the item and category write paths.

use super::error::DomainError;
use super::types::SENTINEL_CATEGORY_NAME;

/// Trim a required text field, rejecting blank input.
pub fn required_text(field: &'static str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

pub fn price(value: i64) -> Result<i64, DomainError> {
    if value < 0 {
        return Err(DomainError::validation("price", "must not be negative"));
    }
    Ok(value)
}

/// Image references keep their order; blank entries are dropped.
pub fn images(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// The fallback category must survive so every item keeps a valid category.
pub fn ensure_not_sentinel(name: &str, action: &'static str) -> Result<(), DomainError> {
    if name == SENTINEL_CATEGORY_NAME {
        return Err(DomainError::ReservedCategory {
            name: name.to_string(),
            action,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_rejected() {
        assert_eq!(
            required_text("title", "   "),
            Err(DomainError::validation("title", "must not be empty"))
        );
        assert_eq!(required_text("title", " Kettle ").as_deref(), Ok("Kettle"));
    }

    #[test]
    fn negative_price_is_rejected() {
        assert!(price(-1).is_err());
        assert_eq!(price(0), Ok(0));
    }

    #[test]
    fn sentinel_category_is_reserved() {
        let err = ensure_not_sentinel("NoCategory", "deleted").unwrap_err();
        assert_eq!(
            err.to_string(),
            "category `NoCategory` is reserved and cannot be deleted"
        );
        assert!(ensure_not_sentinel("Kitchen", "deleted").is_ok());
    }

    #[test]
    fn blank_images_are_dropped() {
        let kept = images(vec!["a.png".into(), " ".into(), "b.png ".into()]);
        assert_eq!(kept, vec!["a.png".to_string(), "b.png".to_string()]);
    }
}
