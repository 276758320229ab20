//! In-memory implementation of every persistence port.
//!
//! Mirrors the relational store's unique constraints so services observe the
//! same conflicts they would against PostgreSQL. Used by the server when no
//! database URL is configured and by behavioural tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    FeedItemRepository, FollowRemoval, FollowRepository, ProfileRepository, ResolveOutcome,
    SharedItemRepository, StoreError, VoteRepository,
};
use crate::domain::{
    ActivityType, Decision, FeedItem, FollowEdge, FollowRequest, FollowRequestId, FollowStatus,
    ProductId, SharedItem, SharedItemId, UserId, UserProfile, Vote, VoteCounts, VoteType,
};

#[derive(Debug, Default)]
struct Tables {
    profiles: HashMap<UserId, UserProfile>,
    feed_items: HashMap<(UserId, ProductId), FeedItem>,
    follow_requests: HashMap<FollowRequestId, FollowRequest>,
    followers: HashMap<(UserId, UserId), FollowEdge>,
    shared_items: HashMap<SharedItemId, SharedItem>,
    item_votes: HashMap<(SharedItemId, UserId), Vote>,
}

impl Tables {
    fn request_between(&self, requester_id: &UserId, recipient_id: &UserId) -> Option<&FollowRequest> {
        self.follow_requests
            .values()
            .find(|r| r.requester_id == *requester_id && r.recipient_id == *recipient_id)
    }
}

/// Process-local store implementing all repository ports.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    offline: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable store: every call fails with
    /// [`StoreError::Connection`] while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::connection("memory store is offline"));
        }
        self.tables
            .lock()
            .map_err(|_| StoreError::query("memory store lock poisoned"))
    }
}

fn newest_first<T>(rows: &mut [T], at: impl Fn(&T) -> DateTime<Utc>) {
    rows.sort_by_key(|row| std::cmp::Reverse(at(row)));
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn upsert(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        match tables.profiles.get_mut(&profile.user_id) {
            Some(existing) => {
                existing.handle.clone_from(&profile.handle);
                existing.display_name.clone_from(&profile.display_name);
                existing.last_active = profile.last_active;
                if profile.avatar_url.is_some() {
                    existing.avatar_url.clone_from(&profile.avatar_url);
                }
            }
            None => {
                tables.profiles.insert(profile.user_id, profile.clone());
            }
        }
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.tables()?.profiles.get(user_id).cloned())
    }

    async fn find_many(&self, user_ids: &[UserId]) -> Result<Vec<UserProfile>, StoreError> {
        let tables = self.tables()?;
        let wanted: HashSet<&UserId> = user_ids.iter().collect();
        Ok(tables
            .profiles
            .values()
            .filter(|profile| wanted.contains(&profile.user_id))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<UserProfile>, StoreError> {
        let mut profiles: Vec<UserProfile> = self.tables()?.profiles.values().cloned().collect();
        profiles.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(profiles)
    }
}

#[async_trait]
impl FeedItemRepository for MemoryStore {
    async fn upsert(&self, item: &FeedItem) -> Result<(), StoreError> {
        let mut stored = item.clone();
        stored.is_active = true;
        self.tables()?
            .feed_items
            .insert((item.user_id, item.product_id.clone()), stored);
        Ok(())
    }

    async fn find(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<Option<FeedItem>, StoreError> {
        Ok(self
            .tables()?
            .feed_items
            .get(&(*user_id, product_id.clone()))
            .cloned())
    }

    async fn list_active(&self, user_id: &UserId) -> Result<Vec<FeedItem>, StoreError> {
        self.list_active_for_users(std::slice::from_ref(user_id)).await
    }

    async fn list_active_for_users(
        &self,
        user_ids: &[UserId],
    ) -> Result<Vec<FeedItem>, StoreError> {
        let tables = self.tables()?;
        let wanted: HashSet<&UserId> = user_ids.iter().collect();
        Ok(tables
            .feed_items
            .values()
            .filter(|item| item.is_active && wanted.contains(&item.user_id))
            .cloned()
            .collect())
    }

    async fn hide(&self, user_id: &UserId, product_id: &ProductId) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        Ok(tables
            .feed_items
            .get_mut(&(*user_id, product_id.clone()))
            .filter(|item| item.is_active)
            .map(|item| item.is_active = false)
            .is_some())
    }

    async fn set_activity(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        activity_type: ActivityType,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        Ok(tables
            .feed_items
            .get_mut(&(*user_id, product_id.clone()))
            .map(|item| item.activity_type = activity_type)
            .is_some())
    }
}

#[async_trait]
impl FollowRepository for MemoryStore {
    async fn open_request(&self, request: &FollowRequest) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        let existing = tables
            .request_between(&request.requester_id, &request.recipient_id)
            .map(|r| (r.id, r.is_pending()));
        match existing {
            Some((_, true)) => return Ok(false),
            Some((id, false)) => {
                tables.follow_requests.remove(&id);
            }
            None => {}
        }
        tables.follow_requests.insert(request.id, request.clone());
        Ok(true)
    }

    async fn find_request(
        &self,
        request_id: &FollowRequestId,
    ) -> Result<Option<FollowRequest>, StoreError> {
        Ok(self.tables()?.follow_requests.get(request_id).cloned())
    }

    async fn find_request_between(
        &self,
        requester_id: &UserId,
        recipient_id: &UserId,
    ) -> Result<Option<FollowRequest>, StoreError> {
        Ok(self
            .tables()?
            .request_between(requester_id, recipient_id)
            .cloned())
    }

    async fn resolve_request(
        &self,
        request_id: &FollowRequestId,
        decision: Decision,
        at: DateTime<Utc>,
    ) -> Result<ResolveOutcome, StoreError> {
        let mut tables = self.tables()?;
        let Some(request) = tables.follow_requests.get_mut(request_id) else {
            return Ok(ResolveOutcome::Missing);
        };
        if !request.is_pending() {
            return Ok(ResolveOutcome::NotPending(request.clone()));
        }
        request.status = decision.resulting_status();
        request.updated_at = at;
        let resolved = request.clone();

        if decision == Decision::Accept {
            tables
                .followers
                .entry((resolved.requester_id, resolved.recipient_id))
                .or_insert_with(|| FollowEdge {
                    follower_id: resolved.requester_id,
                    following_id: resolved.recipient_id,
                    followed_at: at,
                });
        }
        Ok(ResolveOutcome::Resolved(resolved))
    }

    async fn remove_follow(
        &self,
        follower_id: &UserId,
        following_id: &UserId,
    ) -> Result<FollowRemoval, StoreError> {
        let mut tables = self.tables()?;
        let retirable = tables
            .request_between(follower_id, following_id)
            .filter(|request| request.status != FollowStatus::Declined)
            .map(|request| request.id);
        let request_retired = retirable
            .and_then(|id| tables.follow_requests.remove(&id))
            .is_some();
        let edge_removed = tables
            .followers
            .remove(&(*follower_id, *following_id))
            .is_some();
        Ok(FollowRemoval {
            edge_removed,
            request_retired,
        })
    }

    async fn insert_edge(&self, edge: &FollowEdge) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        let key = (edge.follower_id, edge.following_id);
        if tables.followers.contains_key(&key) {
            return Ok(false);
        }
        tables.followers.insert(key, edge.clone());
        Ok(true)
    }

    async fn delete_edge(
        &self,
        follower_id: &UserId,
        following_id: &UserId,
    ) -> Result<bool, StoreError> {
        Ok(self
            .tables()?
            .followers
            .remove(&(*follower_id, *following_id))
            .is_some())
    }

    async fn edge_exists(
        &self,
        follower_id: &UserId,
        following_id: &UserId,
    ) -> Result<bool, StoreError> {
        Ok(self
            .tables()?
            .followers
            .contains_key(&(*follower_id, *following_id)))
    }

    async fn list_following(&self, follower_id: &UserId) -> Result<Vec<FollowEdge>, StoreError> {
        let mut edges: Vec<FollowEdge> = self
            .tables()?
            .followers
            .values()
            .filter(|edge| edge.follower_id == *follower_id)
            .cloned()
            .collect();
        newest_first(&mut edges, |edge| edge.followed_at);
        Ok(edges)
    }

    async fn list_followers(&self, following_id: &UserId) -> Result<Vec<FollowEdge>, StoreError> {
        let mut edges: Vec<FollowEdge> = self
            .tables()?
            .followers
            .values()
            .filter(|edge| edge.following_id == *following_id)
            .cloned()
            .collect();
        newest_first(&mut edges, |edge| edge.followed_at);
        Ok(edges)
    }

    async fn list_requests_to(
        &self,
        recipient_id: &UserId,
        status: FollowStatus,
    ) -> Result<Vec<FollowRequest>, StoreError> {
        let mut requests: Vec<FollowRequest> = self
            .tables()?
            .follow_requests
            .values()
            .filter(|r| r.recipient_id == *recipient_id && r.status == status)
            .cloned()
            .collect();
        newest_first(&mut requests, |r| r.created_at);
        Ok(requests)
    }

    async fn list_requests_from(
        &self,
        requester_id: &UserId,
        status: FollowStatus,
    ) -> Result<Vec<FollowRequest>, StoreError> {
        let mut requests: Vec<FollowRequest> = self
            .tables()?
            .follow_requests
            .values()
            .filter(|r| r.requester_id == *requester_id && r.status == status)
            .cloned()
            .collect();
        newest_first(&mut requests, |r| r.created_at);
        Ok(requests)
    }
}

#[async_trait]
impl SharedItemRepository for MemoryStore {
    async fn insert(&self, item: &SharedItem) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let duplicate = item.is_active
            && tables.shared_items.values().any(|existing| {
                existing.is_active
                    && existing.user_id == item.user_id
                    && existing.product_id == item.product_id
            });
        if duplicate || tables.shared_items.contains_key(&item.id) {
            return Err(StoreError::conflict("shared_items_active_owner_product_key"));
        }
        tables.shared_items.insert(item.id, item.clone());
        Ok(())
    }

    async fn find(&self, item_id: &SharedItemId) -> Result<Option<SharedItem>, StoreError> {
        Ok(self.tables()?.shared_items.get(item_id).cloned())
    }

    async fn find_active_for_product(
        &self,
        owner_id: &UserId,
        product_id: &ProductId,
    ) -> Result<Option<SharedItem>, StoreError> {
        Ok(self
            .tables()?
            .shared_items
            .values()
            .find(|item| {
                item.is_active && item.user_id == *owner_id && item.product_id == *product_id
            })
            .cloned())
    }

    async fn deactivate(&self, item_id: &SharedItemId) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        Ok(tables
            .shared_items
            .get_mut(item_id)
            .map(|item| item.is_active = false)
            .is_some())
    }

    async fn list_active_by_owners(
        &self,
        owner_ids: &[UserId],
        limit: usize,
    ) -> Result<Vec<SharedItem>, StoreError> {
        let tables = self.tables()?;
        let wanted: HashSet<&UserId> = owner_ids.iter().collect();
        let mut items: Vec<SharedItem> = tables
            .shared_items
            .values()
            .filter(|item| item.is_active && wanted.contains(&item.user_id))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        items.truncate(limit);
        Ok(items)
    }
}

#[async_trait]
impl VoteRepository for MemoryStore {
    async fn find_vote(
        &self,
        item_id: &SharedItemId,
        voter_id: &UserId,
    ) -> Result<Option<Vote>, StoreError> {
        Ok(self
            .tables()?
            .item_votes
            .get(&(*item_id, *voter_id))
            .cloned())
    }

    async fn insert_vote(&self, vote: &Vote) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let key = (vote.shared_item_id, vote.voter_id);
        if tables.item_votes.contains_key(&key) {
            return Err(StoreError::conflict("item_votes_shared_item_id_voter_id_key"));
        }
        tables.item_votes.insert(key, vote.clone());
        Ok(())
    }

    async fn update_vote(
        &self,
        item_id: &SharedItemId,
        voter_id: &UserId,
        vote_type: VoteType,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        Ok(tables
            .item_votes
            .get_mut(&(*item_id, *voter_id))
            .map(|vote| vote.vote_type = vote_type)
            .is_some())
    }

    async fn delete_vote(
        &self,
        item_id: &SharedItemId,
        voter_id: &UserId,
    ) -> Result<bool, StoreError> {
        Ok(self
            .tables()?
            .item_votes
            .remove(&(*item_id, *voter_id))
            .is_some())
    }

    async fn counts(
        &self,
        item_ids: &[SharedItemId],
    ) -> Result<HashMap<SharedItemId, VoteCounts>, StoreError> {
        let tables = self.tables()?;
        let wanted: HashSet<&SharedItemId> = item_ids.iter().collect();
        let mut counts: HashMap<SharedItemId, VoteCounts> = HashMap::new();
        for vote in tables
            .item_votes
            .values()
            .filter(|vote| wanted.contains(&vote.shared_item_id))
        {
            let entry = counts.entry(vote.shared_item_id).or_default();
            match vote.vote_type {
                VoteType::Like => entry.like_count += 1,
                VoteType::Dislike => entry.dislike_count += 1,
            }
        }
        Ok(counts)
    }

    async fn votes_by_voter(
        &self,
        voter_id: &UserId,
        item_ids: &[SharedItemId],
    ) -> Result<HashMap<SharedItemId, VoteType>, StoreError> {
        let tables = self.tables()?;
        Ok(item_ids
            .iter()
            .filter_map(|item_id| {
                tables
                    .item_votes
                    .get(&(*item_id, *voter_id))
                    .map(|vote| (*item_id, vote.vote_type))
            })
            .collect())
    }
}
