//! Canonicalization of raw catalog records.
//!
//! Catalog providers hand over loosely shaped JSON objects. Each field is
//! resolved by probing a fixed list of JSON pointers in priority order; the
//! first non-blank hit wins.

use serde_json::Value;
use url::Url;

use super::{Product, ProductId, ProductSnapshot};

const PRODUCT_ID_PROBES: &[&str] = &["/id", "/product_id", "/productId", "/external_id", "/handle"];
const TITLE_PROBES: &[&str] = &["/title", "/name", "/product_title", "/productTitle"];
const IMAGE_PROBES: &[&str] = &[
    "/image",
    "/image_url",
    "/imageUrl",
    "/featured_image/url",
    "/featuredImage/url",
    "/images/0/url",
    "/images/0/src",
    "/images/0",
    "/thumbnail",
];
const PRICE_PROBES: &[&str] = &[
    "/price",
    "/price/amount",
    "/priceRange/minVariantPrice/amount",
    "/variants/0/price",
];
const SHOP_PROBES: &[&str] = &["/shop/id", "/shop_id", "/shopId", "/shop", "/vendor"];

/// Reasons a raw record cannot become a product.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CanonicalizeError {
    #[error("catalog record is not a JSON object")]
    NotAnObject,
    #[error("catalog record has no usable product id")]
    MissingProductId,
}

/// Errors raised when configuring the placeholder image base.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaceholderBaseError {
    #[error("placeholder image base is not a valid URL: {message}")]
    Invalid { message: String },
    #[error("placeholder image base cannot carry path segments")]
    CannotBeABase,
}

/// Turns raw catalog records into [`Product`] values.
#[derive(Debug, Clone)]
pub struct CatalogCanonicalizer {
    placeholder_base: Url,
}

impl CatalogCanonicalizer {
    /// Build a canonicalizer that mints placeholder images under `base`.
    pub fn new(placeholder_base: &str) -> Result<Self, PlaceholderBaseError> {
        let base = Url::parse(placeholder_base).map_err(|err| PlaceholderBaseError::Invalid {
            message: err.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(PlaceholderBaseError::CannotBeABase);
        }
        Ok(Self {
            placeholder_base: base,
        })
    }

    /// Resolve the external product id of a raw record.
    ///
    /// Numeric ids are stringified.
    pub fn product_id(raw: &Value) -> Result<ProductId, CanonicalizeError> {
        if !raw.is_object() {
            return Err(CanonicalizeError::NotAnObject);
        }
        probe_text(raw, PRODUCT_ID_PROBES)
            .and_then(|id| ProductId::new(id).ok())
            .ok_or(CanonicalizeError::MissingProductId)
    }

    /// Canonicalize one raw record.
    pub fn canonicalize(&self, raw: &Value) -> Result<Product, CanonicalizeError> {
        let product_id = Self::product_id(raw)?;
        let title = probe_text(raw, TITLE_PROBES).unwrap_or_else(|| product_id.to_string());
        let image = probe_text(raw, IMAGE_PROBES)
            .unwrap_or_else(|| self.placeholder_image(&product_id));
        let snapshot = ProductSnapshot {
            title,
            price: probe_text(raw, PRICE_PROBES),
            images: vec![image],
            shop_ref: probe_text(raw, SHOP_PROBES),
        };
        Ok(Product {
            product_id,
            snapshot,
        })
    }

    /// Deterministic placeholder image for a product without one.
    pub fn placeholder_image(&self, product_id: &ProductId) -> String {
        let mut url = self.placeholder_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(product_id.as_str());
        }
        url.into()
    }
}

fn probe_text(raw: &Value, probes: &[&str]) -> Option<String> {
    probes
        .iter()
        .filter_map(|pointer| raw.pointer(pointer))
        .find_map(scalar_text)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
