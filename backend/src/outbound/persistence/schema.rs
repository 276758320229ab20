//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Enumerations
//! (activity type, follow status, vote type) are stored as lowercase text and
//! constrained by `CHECK` clauses in the migration.

diesel::table! {
    /// Profiles, created on first sighting and never hard-deleted.
    user_profiles (user_id) {
        user_id -> Uuid,
        handle -> Varchar,
        display_name -> Varchar,
        avatar_url -> Nullable<Text>,
        bio -> Nullable<Text>,
        last_active -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-user feed items, unique on `(user_id, product_id)`.
    user_feed_items (id) {
        id -> Uuid,
        user_id -> Uuid,
        product_id -> Varchar,
        /// Catalog snapshot captured at collection time.
        snapshot -> Jsonb,
        activity_type -> Varchar,
        source -> Varchar,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Follow requests, one row per ordered pair.
    follow_requests (id) {
        id -> Uuid,
        requester_id -> Uuid,
        recipient_id -> Uuid,
        status -> Varchar,
        message -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Directed follow edges.
    followers (follower_id, following_id) {
        follower_id -> Uuid,
        following_id -> Uuid,
        followed_at -> Timestamptz,
    }
}

diesel::table! {
    /// Shared pool; at most one active row per `(user_id, product_id)`.
    shared_items (id) {
        id -> Uuid,
        user_id -> Uuid,
        product_id -> Varchar,
        snapshot -> Jsonb,
        share_message -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Votes, unique on `(shared_item_id, voter_id)`.
    item_votes (id) {
        id -> Uuid,
        shared_item_id -> Uuid,
        voter_id -> Uuid,
        vote_type -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(item_votes -> shared_items (shared_item_id));

diesel::allow_tables_to_appear_in_same_query!(
    user_profiles,
    user_feed_items,
    follow_requests,
    followers,
    shared_items,
    item_votes,
);
