//! PostgreSQL-backed `SharedItemRepository`.
//!
//! The partial unique index `shared_items_active_owner_product_key` rejects a
//! second active share of the same product by the same owner.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{SharedItemRepository, StoreError};
use crate::domain::{ProductId, SharedItem, SharedItemId, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewSharedItemRow, SharedItemRow, decode_rows, encode_snapshot};
use super::pool::DbPool;
use super::schema::shared_items;

/// Diesel implementation of [`SharedItemRepository`].
#[derive(Clone)]
pub struct DieselSharedItemRepository {
    pool: DbPool,
}

impl DieselSharedItemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SharedItemRepository for DieselSharedItemRepository {
    async fn insert(&self, item: &SharedItem) -> Result<(), StoreError> {
        let snapshot = encode_snapshot(&item.snapshot)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewSharedItemRow {
            id: *item.id.as_uuid(),
            user_id: *item.user_id.as_uuid(),
            product_id: item.product_id.as_str(),
            snapshot: &snapshot,
            share_message: item.share_message.as_deref(),
            is_active: item.is_active,
            created_at: item.created_at,
        };

        diesel::insert_into(shared_items::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find(&self, item_id: &SharedItemId) -> Result<Option<SharedItem>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = shared_items::table
            .find(item_id.as_uuid())
            .select(SharedItemRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(SharedItem::try_from).transpose()
    }

    async fn find_active_for_product(
        &self,
        owner_id: &UserId,
        product_id: &ProductId,
    ) -> Result<Option<SharedItem>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = shared_items::table
            .filter(shared_items::user_id.eq(owner_id.as_uuid()))
            .filter(shared_items::product_id.eq(product_id.as_str()))
            .filter(shared_items::is_active.eq(true))
            .select(SharedItemRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(SharedItem::try_from).transpose()
    }

    async fn deactivate(&self, item_id: &SharedItemId) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(shared_items::table.find(item_id.as_uuid()))
            .set(shared_items::is_active.eq(false))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn list_active_by_owners(
        &self,
        owner_ids: &[UserId],
        limit: usize,
    ) -> Result<Vec<SharedItem>, StoreError> {
        if owner_ids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let ids: Vec<Uuid> = owner_ids.iter().map(|id| *id.as_uuid()).collect();

        let rows: Vec<SharedItemRow> = shared_items::table
            .filter(shared_items::user_id.eq_any(ids))
            .filter(shared_items::is_active.eq(true))
            .order((shared_items::created_at.desc(), shared_items::id.asc()))
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .select(SharedItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        decode_rows(rows)
    }
}
