//! Event Collector: turns raw catalog batches into feed items.
//!
//! Every record in a batch is canonicalized and upserted independently, keyed
//! on `(user_id, product_id)`. A record that cannot be identified is skipped;
//! a record the store rejects is counted as failed. Neither aborts the batch.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::domain::ports::{FeedItemRepository, ProfileRepository, StoreError};
use crate::domain::{
    ActivityType, CatalogCanonicalizer, Error, FeedItem, Product, ProductId, ProfileSighting,
    UserId, UserValidationError,
};

/// Maximum length of a provenance tag.
pub const SOURCE_MAX: usize = 64;

/// A batch of raw catalog records observed for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub owner: ProfileSighting,
    pub items: Vec<Value>,
    pub activity_type: ActivityType,
    pub source: String,
}

/// Outcome counts of one ingestion batch.
///
/// `skipped` counts records without a usable product id plus earlier
/// duplicates that a later record in the same batch replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResult {
    pub user_id: UserId,
    pub ingested: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Batch-level collector failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectorError {
    #[error("invalid owner: {0}")]
    InvalidOwner(#[from] UserValidationError),
    #[error("source tag must be 1 to {max} characters")]
    InvalidSource { max: usize },
    #[error("profile refresh failed: {0}")]
    Store(#[from] StoreError),
}

impl From<CollectorError> for Error {
    fn from(error: CollectorError) -> Self {
        match error {
            CollectorError::InvalidOwner(inner) => {
                Self::invalid_request(inner.to_string()).with_details(json!({ "field": "owner" }))
            }
            CollectorError::InvalidSource { max } => {
                Self::invalid_request(format!("source tag must be 1 to {max} characters"))
                    .with_details(json!({ "field": "source", "max": max }))
            }
            CollectorError::Store(inner) => inner.into(),
        }
    }
}

/// Collects raw catalog batches into per-user feeds.
#[derive(Clone)]
pub struct EventCollector {
    profiles: Arc<dyn ProfileRepository>,
    feed_items: Arc<dyn FeedItemRepository>,
    canonicalizer: CatalogCanonicalizer,
    clock: Arc<dyn Clock>,
}

impl EventCollector {
    /// Create a collector over the given repositories.
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        feed_items: Arc<dyn FeedItemRepository>,
        canonicalizer: CatalogCanonicalizer,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            profiles,
            feed_items,
            canonicalizer,
            clock,
        }
    }

    /// Ingest one batch.
    ///
    /// The owner's profile is created or refreshed only when at least one
    /// item was persisted.
    ///
    /// # Errors
    ///
    /// [`CollectorError::InvalidOwner`] or [`CollectorError::InvalidSource`]
    /// before anything is written; [`CollectorError::Store`] when the profile
    /// refresh fails after items were written. Re-running the same batch is
    /// safe.
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestResult, CollectorError> {
        let IngestRequest {
            owner,
            items,
            activity_type,
            source,
        } = request;

        let now = self.clock.utc();
        let profile = owner.into_profile(now)?;
        let source = normalize_source(&source)?;
        let user_id = profile.user_id;

        let (products, skipped) = self.collapse(items);
        let mut result = IngestResult {
            user_id,
            ingested: 0,
            skipped,
            failed: 0,
        };

        for product in products {
            let item = FeedItem {
                user_id,
                product_id: product.product_id,
                snapshot: product.snapshot,
                activity_type,
                source: source.clone(),
                is_active: true,
                created_at: now,
            };
            match self.feed_items.upsert(&item).await {
                Ok(()) => result.ingested += 1,
                Err(err) => {
                    warn!(
                        %user_id,
                        product_id = %item.product_id,
                        error_kind = err.kind(),
                        error = %err,
                        "feed item upsert failed"
                    );
                    result.failed += 1;
                }
            }
        }

        if result.ingested > 0 {
            self.profiles.upsert(&profile).await?;
        }

        info!(
            %user_id,
            source = %source,
            activity_type = %activity_type,
            ingested = result.ingested,
            skipped = result.skipped,
            failed = result.failed,
            "catalog batch ingested"
        );
        Ok(result)
    }

    /// Canonicalize records, dropping unidentifiable ones and letting the
    /// last occurrence of a product id win. Products keep the position of
    /// their first occurrence.
    fn collapse(&self, items: Vec<Value>) -> (Vec<Product>, usize) {
        let mut products: Vec<Product> = Vec::with_capacity(items.len());
        let mut positions: HashMap<ProductId, usize> = HashMap::new();
        let mut skipped = 0;

        for (index, raw) in items.iter().enumerate() {
            let product = match self.canonicalizer.canonicalize(raw) {
                Ok(product) => product,
                Err(err) => {
                    debug!(index, reason = %err, "skipping catalog record");
                    skipped += 1;
                    continue;
                }
            };
            match positions.get(&product.product_id) {
                Some(&position) => {
                    debug!(index, product_id = %product.product_id, "duplicate record replaces earlier one");
                    products[position] = product;
                    skipped += 1;
                }
                None => {
                    positions.insert(product.product_id.clone(), products.len());
                    products.push(product);
                }
            }
        }
        (products, skipped)
    }
}

fn normalize_source(source: &str) -> Result<String, CollectorError> {
    let trimmed = source.trim();
    if trimmed.is_empty() || trimmed.chars().count() > SOURCE_MAX {
        return Err(CollectorError::InvalidSource { max: SOURCE_MAX });
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests;
