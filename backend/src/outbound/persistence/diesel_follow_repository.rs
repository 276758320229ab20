//! PostgreSQL-backed `FollowRepository`.
//!
//! Request rows are unique per ordered pair and edges are unique per ordered
//! pair. Opening and resolving a request each run in one transaction that
//! locks the request row first. Unfollowing deletes the request and the edge
//! together.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{FollowRemoval, FollowRepository, ResolveOutcome, StoreError};
use crate::domain::{Decision, FollowEdge, FollowRequest, FollowRequestId, FollowStatus, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{FollowEdgeRow, FollowRequestRow, NewFollowRequestRow, decode_rows};
use super::pool::DbPool;
use super::schema::{follow_requests, followers};

/// Diesel implementation of [`FollowRepository`].
#[derive(Clone)]
pub struct DieselFollowRepository {
    pool: DbPool,
}

impl DieselFollowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn lock_request_between(
    conn: &mut AsyncPgConnection,
    requester_id: Uuid,
    recipient_id: Uuid,
) -> Result<Option<FollowRequestRow>, DieselError> {
    follow_requests::table
        .filter(follow_requests::requester_id.eq(requester_id))
        .filter(follow_requests::recipient_id.eq(recipient_id))
        .select(FollowRequestRow::as_select())
        .for_update()
        .get_result(conn)
        .await
        .optional()
}

async fn insert_edge_row(conn: &mut AsyncPgConnection, row: &FollowEdgeRow) -> Result<usize, DieselError> {
    diesel::insert_into(followers::table)
        .values(row)
        .on_conflict((followers::follower_id, followers::following_id))
        .do_nothing()
        .execute(conn)
        .await
}

enum Resolution {
    Resolved(FollowRequestRow),
    NotPending(FollowRequestRow),
    Missing,
}

#[async_trait]
impl FollowRepository for DieselFollowRepository {
    async fn open_request(&self, request: &FollowRequest) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_row = NewFollowRequestRow::from(request);

        conn.transaction::<_, DieselError, _>(|conn| {
            async move {
                let existing =
                    lock_request_between(conn, new_row.requester_id, new_row.recipient_id).await?;
                match existing {
                    Some(row) if row.status == FollowStatus::Pending.as_str() => return Ok(false),
                    Some(row) => {
                        diesel::delete(follow_requests::table.find(row.id))
                            .execute(conn)
                            .await?;
                    }
                    None => {}
                }
                diesel::insert_into(follow_requests::table)
                    .values(&new_row)
                    .execute(conn)
                    .await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn find_request(
        &self,
        request_id: &FollowRequestId,
    ) -> Result<Option<FollowRequest>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = follow_requests::table
            .find(request_id.as_uuid())
            .select(FollowRequestRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(FollowRequest::try_from).transpose()
    }

    async fn find_request_between(
        &self,
        requester_id: &UserId,
        recipient_id: &UserId,
    ) -> Result<Option<FollowRequest>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = follow_requests::table
            .filter(follow_requests::requester_id.eq(requester_id.as_uuid()))
            .filter(follow_requests::recipient_id.eq(recipient_id.as_uuid()))
            .select(FollowRequestRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(FollowRequest::try_from).transpose()
    }

    async fn resolve_request(
        &self,
        request_id: &FollowRequestId,
        decision: Decision,
        at: DateTime<Utc>,
    ) -> Result<ResolveOutcome, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = *request_id.as_uuid();
        let status = decision.resulting_status();

        let resolution = conn
            .transaction::<_, DieselError, _>(|conn| {
                async move {
                    let current = follow_requests::table
                        .find(id)
                        .select(FollowRequestRow::as_select())
                        .for_update()
                        .get_result(conn)
                        .await
                        .optional()?;
                    let Some(current) = current else {
                        return Ok(Resolution::Missing);
                    };
                    if current.status != FollowStatus::Pending.as_str() {
                        return Ok(Resolution::NotPending(current));
                    }

                    let updated = diesel::update(follow_requests::table.find(id))
                        .set((
                            follow_requests::status.eq(status.as_str()),
                            follow_requests::updated_at.eq(at),
                        ))
                        .returning(FollowRequestRow::as_returning())
                        .get_result(conn)
                        .await?;
                    if status == FollowStatus::Accepted {
                        let edge = FollowEdgeRow {
                            follower_id: updated.requester_id,
                            following_id: updated.recipient_id,
                            followed_at: at,
                        };
                        insert_edge_row(conn, &edge).await?;
                    }
                    Ok(Resolution::Resolved(updated))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        Ok(match resolution {
            Resolution::Resolved(row) => ResolveOutcome::Resolved(row.try_into()?),
            Resolution::NotPending(row) => ResolveOutcome::NotPending(row.try_into()?),
            Resolution::Missing => ResolveOutcome::Missing,
        })
    }

    async fn remove_follow(
        &self,
        follower_id: &UserId,
        following_id: &UserId,
    ) -> Result<FollowRemoval, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let follower = *follower_id.as_uuid();
        let following = *following_id.as_uuid();

        conn.transaction::<_, DieselError, _>(|conn| {
            async move {
                let retired = diesel::delete(
                    follow_requests::table
                        .filter(follow_requests::requester_id.eq(follower))
                        .filter(follow_requests::recipient_id.eq(following))
                        .filter(follow_requests::status.ne(FollowStatus::Declined.as_str())),
                )
                .execute(conn)
                .await?;
                let removed = diesel::delete(followers::table.find((follower, following)))
                    .execute(conn)
                    .await?;
                Ok(FollowRemoval {
                    edge_removed: removed > 0,
                    request_retired: retired > 0,
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn insert_edge(&self, edge: &FollowEdge) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let inserted = insert_edge_row(&mut conn, &FollowEdgeRow::from(edge))
            .await
            .map_err(map_diesel_error)?;

        Ok(inserted > 0)
    }

    async fn delete_edge(
        &self,
        follower_id: &UserId,
        following_id: &UserId,
    ) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(followers::table.find((
            follower_id.as_uuid(),
            following_id.as_uuid(),
        )))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }

    async fn edge_exists(
        &self,
        follower_id: &UserId,
        following_id: &UserId,
    ) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(diesel::dsl::exists(
            followers::table.find((follower_id.as_uuid(), following_id.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn list_following(&self, follower_id: &UserId) -> Result<Vec<FollowEdge>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<FollowEdgeRow> = followers::table
            .filter(followers::follower_id.eq(follower_id.as_uuid()))
            .order(followers::followed_at.desc())
            .select(FollowEdgeRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(FollowEdge::from).collect())
    }

    async fn list_followers(&self, following_id: &UserId) -> Result<Vec<FollowEdge>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<FollowEdgeRow> = followers::table
            .filter(followers::following_id.eq(following_id.as_uuid()))
            .order(followers::followed_at.desc())
            .select(FollowEdgeRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(FollowEdge::from).collect())
    }

    async fn list_requests_to(
        &self,
        recipient_id: &UserId,
        status: FollowStatus,
    ) -> Result<Vec<FollowRequest>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<FollowRequestRow> = follow_requests::table
            .filter(follow_requests::recipient_id.eq(recipient_id.as_uuid()))
            .filter(follow_requests::status.eq(status.as_str()))
            .order(follow_requests::created_at.desc())
            .select(FollowRequestRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        decode_rows(rows)
    }

    async fn list_requests_from(
        &self,
        requester_id: &UserId,
        status: FollowStatus,
    ) -> Result<Vec<FollowRequest>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<FollowRequestRow> = follow_requests::table
            .filter(follow_requests::requester_id.eq(requester_id.as_uuid()))
            .filter(follow_requests::status.eq(status.as_str()))
            .order(follow_requests::created_at.desc())
            .select(FollowRequestRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        decode_rows(rows)
    }
}
