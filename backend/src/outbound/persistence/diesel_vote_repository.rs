//! PostgreSQL-backed `VoteRepository`.
//!
//! Tallies are aggregated with `GROUP BY` on every read; no counter column
//! exists to drift.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{StoreError, VoteRepository};
use crate::domain::{SharedItemId, UserId, Vote, VoteCounts, VoteType};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewVoteRow, VoteRow, decode_vote_type};
use super::pool::DbPool;
use super::schema::item_votes;

/// Diesel implementation of [`VoteRepository`].
#[derive(Clone)]
pub struct DieselVoteRepository {
    pool: DbPool,
}

impl DieselVoteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn item_uuids(item_ids: &[SharedItemId]) -> Vec<Uuid> {
    item_ids.iter().map(|id| *id.as_uuid()).collect()
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

#[async_trait]
impl VoteRepository for DieselVoteRepository {
    async fn find_vote(
        &self,
        item_id: &SharedItemId,
        voter_id: &UserId,
    ) -> Result<Option<Vote>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = item_votes::table
            .filter(item_votes::shared_item_id.eq(item_id.as_uuid()))
            .filter(item_votes::voter_id.eq(voter_id.as_uuid()))
            .select(VoteRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(Vote::try_from).transpose()
    }

    async fn insert_vote(&self, vote: &Vote) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewVoteRow {
            id: Uuid::new_v4(),
            shared_item_id: *vote.shared_item_id.as_uuid(),
            voter_id: *vote.voter_id.as_uuid(),
            vote_type: vote.vote_type.as_str(),
            created_at: vote.created_at,
        };

        diesel::insert_into(item_votes::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update_vote(
        &self,
        item_id: &SharedItemId,
        voter_id: &UserId,
        vote_type: VoteType,
    ) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(
            item_votes::table
                .filter(item_votes::shared_item_id.eq(item_id.as_uuid()))
                .filter(item_votes::voter_id.eq(voter_id.as_uuid())),
        )
        .set(item_votes::vote_type.eq(vote_type.as_str()))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn delete_vote(
        &self,
        item_id: &SharedItemId,
        voter_id: &UserId,
    ) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(
            item_votes::table
                .filter(item_votes::shared_item_id.eq(item_id.as_uuid()))
                .filter(item_votes::voter_id.eq(voter_id.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }

    async fn counts(
        &self,
        item_ids: &[SharedItemId],
    ) -> Result<HashMap<SharedItemId, VoteCounts>, StoreError> {
        if item_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(Uuid, String, i64)> = item_votes::table
            .filter(item_votes::shared_item_id.eq_any(item_uuids(item_ids)))
            .group_by((item_votes::shared_item_id, item_votes::vote_type))
            .select((
                item_votes::shared_item_id,
                item_votes::vote_type,
                diesel::dsl::count_star(),
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut counts: HashMap<SharedItemId, VoteCounts> = HashMap::new();
        for (item_id, vote_type, total) in rows {
            let entry = counts.entry(SharedItemId::from_uuid(item_id)).or_default();
            match decode_vote_type(&vote_type)? {
                VoteType::Like => entry.like_count = to_count(total),
                VoteType::Dislike => entry.dislike_count = to_count(total),
            }
        }
        Ok(counts)
    }

    async fn votes_by_voter(
        &self,
        voter_id: &UserId,
        item_ids: &[SharedItemId],
    ) -> Result<HashMap<SharedItemId, VoteType>, StoreError> {
        if item_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(Uuid, String)> = item_votes::table
            .filter(item_votes::voter_id.eq(voter_id.as_uuid()))
            .filter(item_votes::shared_item_id.eq_any(item_uuids(item_ids)))
            .select((item_votes::shared_item_id, item_votes::vote_type))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|(item_id, vote_type)| {
                Ok((SharedItemId::from_uuid(item_id), decode_vote_type(&vote_type)?))
            })
            .collect()
    }
}
