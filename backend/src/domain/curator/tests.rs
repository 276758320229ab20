//! Tests for the feed curator.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{FeedItemRepository as _, FollowRepository as _, MockFeedItemRepository};
use crate::domain::{ActivityType, FollowEdge, ProductSnapshot};
use crate::outbound::memory::MemoryStore;
use crate::test_support::fixture_time;

struct Fixture {
    store: Arc<MemoryStore>,
    curator: FeedCurator,
    user: UserId,
}

#[fixture]
fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let limits = FeedLimits {
        default_limit: 3,
        max_limit: 5,
        sample_window: 2,
    };
    let curator = FeedCurator::with_seed(store.clone(), store.clone(), limits, 42);
    Fixture {
        store,
        curator,
        user: UserId::random(),
    }
}

fn at(minutes: i64) -> DateTime<Utc> {
    fixture_time() + Duration::minutes(minutes)
}

async fn seed(store: &MemoryStore, user: UserId, product: &str, activity: ActivityType, minutes: i64) {
    let item = FeedItem {
        user_id: user,
        product_id: ProductId::new(product).expect("product id"),
        snapshot: ProductSnapshot::titled(product),
        activity_type: activity,
        source: "test".to_owned(),
        is_active: true,
        created_at: at(minutes),
    };
    store.upsert(&item).await.expect("seed feed item");
}

fn ids(items: &[FeedItem]) -> Vec<&str> {
    items.iter().map(|item| item.product_id.as_str()).collect()
}

#[rstest]
#[case(None, 3)]
#[case(Some(0), 1)]
#[case(Some(2), 2)]
#[case(Some(50), 5)]
fn limits_clamp(#[case] requested: Option<usize>, #[case] expected: usize) {
    let limits = FeedLimits {
        default_limit: 3,
        max_limit: 5,
        sample_window: 2,
    };
    assert_eq!(limits.clamp(requested), expected);
}

#[rstest]
#[tokio::test]
async fn feed_is_ranked_and_limited(fixture: Fixture) {
    let Fixture {
        store,
        curator,
        user,
    } = fixture;
    seed(&store, user, "browsed", ActivityType::Browsed, 50).await;
    seed(&store, user, "saved-old", ActivityType::Saved, 0).await;
    seed(&store, user, "shared", ActivityType::Shared, -10).await;
    seed(&store, user, "saved-new", ActivityType::Saved, 5).await;

    let feed = curator.get_feed(&user, None).await.expect("feed");

    assert_eq!(ids(&feed), ["shared", "saved-new", "saved-old"]);
}

#[rstest]
#[tokio::test]
async fn inactive_items_are_hidden(fixture: Fixture) {
    let Fixture {
        store,
        curator,
        user,
    } = fixture;
    seed(&store, user, "kept", ActivityType::Liked, 0).await;
    seed(&store, user, "removed", ActivityType::Liked, 1).await;

    curator
        .remove_from_feed(&user, &ProductId::new("removed").expect("id"))
        .await
        .expect("remove");

    let feed = curator.get_feed(&user, Some(5)).await.expect("feed");
    assert_eq!(ids(&feed), ["kept"]);
}

#[rstest]
#[tokio::test]
async fn removing_unknown_item_is_not_found(fixture: Fixture) {
    let err = fixture
        .curator
        .remove_from_feed(&fixture.user, &ProductId::new("nope").expect("id"))
        .await
        .expect_err("missing");
    assert!(matches!(err, CuratorError::NotFound { .. }));
    assert_eq!(Error::from(err).code(), crate::domain::ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn removing_a_hidden_item_again_is_not_found(fixture: Fixture) {
    seed(&fixture.store, fixture.user, "lamp", ActivityType::Saved, 0).await;
    let product = ProductId::new("lamp").expect("id");
    fixture
        .curator
        .remove_from_feed(&fixture.user, &product)
        .await
        .expect("first removal");

    let err = fixture
        .curator
        .remove_from_feed(&fixture.user, &product)
        .await
        .expect_err("already hidden");
    assert!(matches!(err, CuratorError::NotFound { .. }));
}

#[rstest]
#[tokio::test]
async fn pages_walk_the_whole_ranking_without_overlap(fixture: Fixture) {
    let Fixture {
        store,
        curator,
        user,
    } = fixture;
    for (index, activity) in ActivityType::BY_PRIORITY.iter().enumerate() {
        seed(&store, user, &format!("p{index}"), *activity, 0).await;
        seed(&store, user, &format!("q{index}"), *activity, 1).await;
    }

    let mut seen = Vec::new();
    let mut cursor = None;
    loop {
        let page = curator
            .get_feed_page(&user, cursor.clone(), Some(3))
            .await
            .expect("page");
        seen.extend(page.items().iter().map(|item| item.product_id.to_string()));
        match page.next_cursor() {
            Some(next) => cursor = Some(next.to_owned()),
            None => break,
        }
    }

    let full = curator.get_feed(&user, Some(5)).await.expect("feed");
    assert_eq!(seen.len(), 10);
    assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 10);
    assert_eq!(
        seen.iter().take(5).map(String::as_str).collect::<Vec<_>>(),
        ids(&full)
    );
}

#[rstest]
#[tokio::test]
async fn garbage_cursor_is_rejected(fixture: Fixture) {
    let err = fixture
        .curator
        .get_feed_page(&fixture.user, Some("***".to_owned()), None)
        .await
        .expect_err("bad cursor");
    assert!(matches!(err, CuratorError::InvalidCursor(_)));
}

#[rstest]
#[tokio::test]
async fn sample_draws_from_most_recent_window(fixture: Fixture) {
    let Fixture {
        store,
        curator,
        user,
    } = fixture;
    seed(&store, user, "old", ActivityType::Shared, 0).await;
    seed(&store, user, "newer", ActivityType::Browsed, 10).await;
    seed(&store, user, "newest", ActivityType::Browsed, 20).await;

    for _ in 0..20 {
        let sample = curator
            .get_sample(&user)
            .await
            .expect("sample")
            .expect("non-empty feed");
        assert_ne!(sample.product_id.as_str(), "old");
    }
}

#[rstest]
#[tokio::test]
async fn sample_of_empty_feed_is_none(fixture: Fixture) {
    let sample = fixture.curator.get_sample(&fixture.user).await.expect("sample");
    assert!(sample.is_none());
}

#[rstest]
#[tokio::test]
async fn friends_feed_only_includes_followed_users(fixture: Fixture) {
    let Fixture {
        store,
        curator,
        user,
    } = fixture;
    let friend = UserId::random();
    let stranger = UserId::random();
    seed(&store, friend, "friend-item", ActivityType::Saved, 0).await;
    seed(&store, stranger, "stranger-item", ActivityType::Shared, 0).await;
    seed(&store, user, "own-item", ActivityType::Shared, 0).await;
    store
        .insert_edge(&FollowEdge {
            follower_id: user,
            following_id: friend,
            followed_at: at(0),
        })
        .await
        .expect("edge");

    let feed = curator.friends_feed(&user, None).await.expect("friends feed");

    assert_eq!(ids(&feed), ["friend-item"]);
}

#[tokio::test]
async fn store_outage_surfaces_as_service_unavailable() {
    let mut feed_items = MockFeedItemRepository::new();
    feed_items
        .expect_list_active()
        .returning(|_| Err(StoreError::connection("timeout")));
    let curator = FeedCurator::with_seed(
        Arc::new(feed_items),
        Arc::new(MemoryStore::new()),
        FeedLimits::default(),
        1,
    );

    let err = curator
        .get_feed(&UserId::random(), None)
        .await
        .expect_err("outage");

    assert_eq!(
        Error::from(err).code(),
        crate::domain::ErrorCode::ServiceUnavailable
    );
}
