//! Catalog product identity and the snapshot stored alongside feed and shared
//! items.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors for product identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductValidationError {
    #[error("product id must not be empty")]
    EmptyId,
}

/// External catalog identifier of a product.
///
/// Opaque to this system: it may be a numeric id, a `gid://` URI, or a
/// storefront handle. Surrounding whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductId(String);

impl ProductId {
    /// Validate and construct a [`ProductId`].
    pub fn new(id: impl Into<String>) -> Result<Self, ProductValidationError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ProductValidationError::EmptyId);
        }
        if trimmed.len() == id.len() {
            return Ok(Self(id));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the identifier.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ProductId> for String {
    fn from(value: ProductId) -> Self {
        value.0
    }
}

impl TryFrom<String> for ProductId {
    type Error = ProductValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Display data captured from the catalog when an item was collected or
/// shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_ref: Option<String>,
}

impl ProductSnapshot {
    /// Snapshot with a title and nothing else.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            price: None,
            images: Vec::new(),
            shop_ref: None,
        }
    }

    /// First image, used as the thumbnail.
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// A product together with its snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: ProductId,
    pub snapshot: ProductSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_ids_are_rejected(#[case] raw: &str) {
        assert_eq!(ProductId::new(raw), Err(ProductValidationError::EmptyId));
    }

    #[rstest]
    fn ids_are_trimmed() {
        let id = ProductId::new("  gid://shopify/Product/123 ").expect("valid");
        assert_eq!(id.as_str(), "gid://shopify/Product/123");
    }

    #[rstest]
    fn deserialization_validates() {
        let result: Result<ProductId, _> = serde_json::from_str("\" \"");
        assert!(result.is_err());
    }
}
