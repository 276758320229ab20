//! Tests for the event collector.

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::ports::{MockFeedItemRepository, MockProfileRepository};
use crate::outbound::memory::MemoryStore;
use crate::test_support::{MutableClock, canonicalizer};

struct Fixture {
    store: Arc<MemoryStore>,
    clock: Arc<MutableClock>,
    collector: EventCollector,
}

#[fixture]
fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(MutableClock::default());
    let collector = EventCollector::new(store.clone(), store.clone(), canonicalizer(), clock.clone());
    Fixture {
        store,
        clock,
        collector,
    }
}

fn request(owner: &str, items: Vec<Value>, activity_type: ActivityType) -> IngestRequest {
    IngestRequest {
        owner: ProfileSighting::named(owner),
        items,
        activity_type,
        source: "storefront".to_owned(),
    }
}

#[rstest]
#[tokio::test]
async fn ingest_persists_items_and_creates_profile(fixture: Fixture) {
    let result = fixture
        .collector
        .ingest(request(
            "Ada",
            vec![json!({ "id": "p1", "title": "Lamp" }), json!({ "id": 2 })],
            ActivityType::Saved,
        ))
        .await
        .expect("ingest succeeds");

    assert_eq!(result.ingested, 2);
    assert_eq!((result.skipped, result.failed), (0, 0));
    let items = fixture
        .store
        .list_active(&result.user_id)
        .await
        .expect("feed");
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item.source == "storefront"));
    let profile = fixture
        .store
        .find_by_id(&result.user_id)
        .await
        .expect("lookup")
        .expect("profile created");
    assert_eq!(profile.handle, "ada");
}

#[rstest]
#[tokio::test]
async fn records_without_ids_are_skipped(fixture: Fixture) {
    let result = fixture
        .collector
        .ingest(request(
            "Ada",
            vec![json!({ "title": "anonymous" }), json!("junk"), json!({ "handle": "mug" })],
            ActivityType::Browsed,
        ))
        .await
        .expect("ingest succeeds");

    assert_eq!(result.ingested, 1);
    assert_eq!(result.skipped, 2);
}

#[rstest]
#[tokio::test]
async fn batch_duplicates_collapse_to_last_occurrence(fixture: Fixture) {
    let result = fixture
        .collector
        .ingest(request(
            "Ada",
            vec![
                json!({ "id": "p1", "title": "first" }),
                json!({ "id": "p1", "title": "second" }),
            ],
            ActivityType::Liked,
        ))
        .await
        .expect("ingest succeeds");

    assert_eq!((result.ingested, result.skipped), (1, 1));
    let items = fixture
        .store
        .list_active(&result.user_id)
        .await
        .expect("feed");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].snapshot.title, "second");
}

#[rstest]
#[tokio::test]
async fn later_ingestion_overwrites_and_reactivates(fixture: Fixture) {
    let first = fixture
        .collector
        .ingest(request("Ada", vec![json!({ "id": "p1" })], ActivityType::Browsed))
        .await
        .expect("first batch");
    let product = ProductId::new("p1").expect("product id");
    fixture
        .store
        .hide(&first.user_id, &product)
        .await
        .expect("hide");
    fixture.clock.advance_seconds(60);

    let mut again = request("Ada", vec![json!({ "id": "p1" })], ActivityType::Saved);
    again.source = "wishlist".to_owned();
    fixture.collector.ingest(again).await.expect("second batch");

    let items = fixture
        .store
        .list_active(&first.user_id)
        .await
        .expect("feed");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].activity_type, ActivityType::Saved);
    assert_eq!(items[0].source, "wishlist");
    assert_eq!(items[0].created_at, fixture.clock.utc());
}

#[rstest]
#[tokio::test]
async fn nothing_persisted_means_no_profile(fixture: Fixture) {
    let result = fixture
        .collector
        .ingest(request("Ghost", vec![json!({})], ActivityType::Browsed))
        .await
        .expect("ingest succeeds");

    assert_eq!(result.ingested, 0);
    assert!(
        fixture
            .store
            .find_by_id(&result.user_id)
            .await
            .expect("lookup")
            .is_none()
    );
}

#[rstest]
#[case("")]
#[case("   ")]
#[tokio::test]
async fn blank_owner_is_rejected(fixture: Fixture, #[case] owner: &str) {
    let err = fixture
        .collector
        .ingest(request(owner, vec![json!({ "id": "p1" })], ActivityType::Saved))
        .await
        .expect_err("invalid owner");
    assert!(matches!(err, CollectorError::InvalidOwner(_)));
}

#[rstest]
#[tokio::test]
async fn blank_source_is_rejected(fixture: Fixture) {
    let mut req = request("Ada", vec![json!({ "id": "p1" })], ActivityType::Saved);
    req.source = " ".to_owned();

    let err = fixture.collector.ingest(req).await.expect_err("invalid source");
    assert_eq!(Error::from(err).code(), crate::domain::ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn failing_item_does_not_abort_the_batch() {
    let mut feed_items = MockFeedItemRepository::new();
    feed_items
        .expect_upsert()
        .times(3)
        .returning(|item| {
            if item.product_id.as_str() == "bad" {
                Err(StoreError::query("check constraint"))
            } else {
                Ok(())
            }
        });
    let mut profiles = MockProfileRepository::new();
    profiles.expect_upsert().times(1).returning(|_| Ok(()));
    let collector = EventCollector::new(
        Arc::new(profiles),
        Arc::new(feed_items),
        canonicalizer(),
        Arc::new(MutableClock::default()),
    );

    let result = collector
        .ingest(request(
            "Ada",
            vec![json!({ "id": "a" }), json!({ "id": "bad" }), json!({ "id": "c" })],
            ActivityType::Recommended,
        ))
        .await
        .expect("batch completes");

    assert_eq!((result.ingested, result.failed), (2, 1));
}

#[tokio::test]
async fn profile_refresh_failure_is_reported() {
    let mut feed_items = MockFeedItemRepository::new();
    feed_items.expect_upsert().returning(|_| Ok(()));
    let mut profiles = MockProfileRepository::new();
    profiles
        .expect_upsert()
        .times(1)
        .returning(|_| Err(StoreError::connection("pool timed out")));
    let collector = EventCollector::new(
        Arc::new(profiles),
        Arc::new(feed_items),
        canonicalizer(),
        Arc::new(MutableClock::default()),
    );

    let err = collector
        .ingest(request("Ada", vec![json!({ "id": "a" })], ActivityType::Saved))
        .await
        .expect_err("profile refresh fails");

    assert_eq!(
        Error::from(err).code(),
        crate::domain::ErrorCode::ServiceUnavailable
    );
}
