//! PostgreSQL-backed `ProfileRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ProfileRepository, StoreError};
use crate::domain::{UserId, UserProfile};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewProfileRow, ProfileRefresh, ProfileRow};
use super::pool::DbPool;
use super::schema::user_profiles;

/// Diesel implementation of [`ProfileRepository`].
#[derive(Clone)]
pub struct DieselProfileRepository {
    pool: DbPool,
}

impl DieselProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for DieselProfileRepository {
    async fn upsert(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewProfileRow {
            user_id: *profile.user_id.as_uuid(),
            handle: &profile.handle,
            display_name: &profile.display_name,
            avatar_url: profile.avatar_url.as_deref(),
            last_active: profile.last_active,
        };
        let refresh = ProfileRefresh {
            handle: &profile.handle,
            display_name: &profile.display_name,
            avatar_url: profile.avatar_url.as_deref(),
            last_active: profile.last_active,
        };

        diesel::insert_into(user_profiles::table)
            .values(&new_row)
            .on_conflict(user_profiles::user_id)
            .do_update()
            .set(&refresh)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<UserProfile>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = user_profiles::table
            .filter(user_profiles::user_id.eq(user_id.as_uuid()))
            .select(ProfileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(UserProfile::from))
    }

    async fn find_many(&self, user_ids: &[UserId]) -> Result<Vec<UserProfile>, StoreError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let ids: Vec<uuid::Uuid> = user_ids.iter().map(|id| *id.as_uuid()).collect();

        let rows: Vec<ProfileRow> = user_profiles::table
            .filter(user_profiles::user_id.eq_any(ids))
            .select(ProfileRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(UserProfile::from).collect())
    }

    async fn list_all(&self) -> Result<Vec<UserProfile>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ProfileRow> = user_profiles::table
            .order((user_profiles::display_name.asc(), user_profiles::user_id.asc()))
            .select(ProfileRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(UserProfile::from).collect())
    }
}
