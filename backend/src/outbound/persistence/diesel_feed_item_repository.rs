//! PostgreSQL-backed `FeedItemRepository`.
//!
//! Upserts are keyed on the `(user_id, product_id)` unique constraint so
//! concurrent collectors converge on one row; the last write wins.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{FeedItemRepository, StoreError};
use crate::domain::{ActivityType, FeedItem, ProductId, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{FeedItemOverwrite, FeedItemRow, NewFeedItemRow, decode_rows, encode_snapshot};
use super::pool::DbPool;
use super::schema::user_feed_items;

/// Diesel implementation of [`FeedItemRepository`].
#[derive(Clone)]
pub struct DieselFeedItemRepository {
    pool: DbPool,
}

impl DieselFeedItemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedItemRepository for DieselFeedItemRepository {
    async fn upsert(&self, item: &FeedItem) -> Result<(), StoreError> {
        let snapshot = encode_snapshot(&item.snapshot)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewFeedItemRow {
            id: Uuid::new_v4(),
            user_id: *item.user_id.as_uuid(),
            product_id: item.product_id.as_str(),
            snapshot: &snapshot,
            activity_type: item.activity_type.as_str(),
            source: &item.source,
            is_active: true,
            created_at: item.created_at,
        };
        let overwrite = FeedItemOverwrite {
            snapshot: &snapshot,
            activity_type: item.activity_type.as_str(),
            source: &item.source,
            is_active: true,
            created_at: item.created_at,
        };

        diesel::insert_into(user_feed_items::table)
            .values(&new_row)
            .on_conflict((user_feed_items::user_id, user_feed_items::product_id))
            .do_update()
            .set(&overwrite)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<Option<FeedItem>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = user_feed_items::table
            .filter(user_feed_items::user_id.eq(user_id.as_uuid()))
            .filter(user_feed_items::product_id.eq(product_id.as_str()))
            .select(FeedItemRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(FeedItem::try_from).transpose()
    }

    async fn list_active(&self, user_id: &UserId) -> Result<Vec<FeedItem>, StoreError> {
        self.list_active_for_users(std::slice::from_ref(user_id)).await
    }

    async fn list_active_for_users(
        &self,
        user_ids: &[UserId],
    ) -> Result<Vec<FeedItem>, StoreError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let ids: Vec<Uuid> = user_ids.iter().map(|id| *id.as_uuid()).collect();

        let rows: Vec<FeedItemRow> = user_feed_items::table
            .filter(user_feed_items::user_id.eq_any(ids))
            .filter(user_feed_items::is_active.eq(true))
            .select(FeedItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        decode_rows(rows)
    }

    async fn hide(&self, user_id: &UserId, product_id: &ProductId) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(
            user_feed_items::table
                .filter(user_feed_items::user_id.eq(user_id.as_uuid()))
                .filter(user_feed_items::product_id.eq(product_id.as_str()))
                .filter(user_feed_items::is_active.eq(true)),
        )
        .set(user_feed_items::is_active.eq(false))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn set_activity(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        activity_type: ActivityType,
    ) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(
            user_feed_items::table
                .filter(user_feed_items::user_id.eq(user_id.as_uuid()))
                .filter(user_feed_items::product_id.eq(product_id.as_str())),
        )
        .set(user_feed_items::activity_type.eq(activity_type.as_str()))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }
}
