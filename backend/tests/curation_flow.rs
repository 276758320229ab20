//! End-to-end flows across the four services on the in-memory store.

use std::collections::HashSet;

use curation::domain::{
    ActivityType, Decision, FollowIntent, IngestRequest, ProfileSighting, Relationship, UserId,
};
use curation::test_support::MemoryHarness;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

#[fixture]
fn harness() -> MemoryHarness {
    MemoryHarness::new()
}

fn batch(owner: &str, items: Vec<Value>) -> IngestRequest {
    IngestRequest {
        owner: ProfileSighting::named(owner),
        items,
        activity_type: ActivityType::Browsed,
        source: "flow".to_owned(),
    }
}

fn user(name: &str) -> UserId {
    UserId::from_display_name(name).expect("valid display name")
}

#[rstest]
#[tokio::test]
async fn cursor_pages_cover_the_feed_once(harness: MemoryHarness) {
    let items = (1..=5)
        .map(|n| json!({ "id": format!("p{n}"), "title": format!("Item {n}") }))
        .collect();
    harness
        .collector
        .ingest(batch("Ada", items))
        .await
        .expect("ingest succeeds");

    let ada = user("Ada");
    let mut seen = HashSet::new();
    let mut cursor = None;
    let mut pages = 0;
    loop {
        let page = harness
            .curator
            .get_feed_page(&ada, cursor.take(), Some(2))
            .await
            .expect("page loads");
        pages += 1;
        for item in page.items() {
            assert!(seen.insert(item.product_id.clone()), "item repeated across pages");
        }
        match page.next_cursor() {
            Some(next) => cursor = Some(next.to_owned()),
            None => break,
        }
    }

    assert_eq!(seen.len(), 5);
    assert_eq!(pages, 3);
}

#[rstest]
#[tokio::test]
async fn optimistic_follow_prediction_matches_the_service(harness: MemoryHarness) {
    for owner in ["Ada", "Bob"] {
        harness
            .collector
            .ingest(batch(owner, vec![json!({ "id": format!("{owner}-1") })]))
            .await
            .expect("ingest succeeds");
    }
    let (ada, bob) = (user("Ada"), user("Bob"));

    let before = harness
        .social
        .relationship(&bob, &ada)
        .await
        .expect("relationship loads");
    assert_eq!(before, Relationship::None);
    let pending = before.apply_optimistic(FollowIntent::Request);

    let request = harness
        .social
        .send_request(&bob, &ada, Some("hello".to_owned()))
        .await
        .expect("request sent");
    let after = harness
        .social
        .relationship(&bob, &ada)
        .await
        .expect("relationship loads");
    assert!(pending.confirmed_by(&after));

    harness
        .social
        .respond(&ada, &request.id, Decision::Accept)
        .await
        .expect("accepted");
    let friends = harness
        .curator
        .friends_feed(&bob, None)
        .await
        .expect("friends feed loads");
    let products: Vec<&str> = friends.iter().map(|i| i.product_id.as_str()).collect();
    assert_eq!(products, vec!["Ada-1"]);

    let following = harness
        .social
        .relationship(&bob, &ada)
        .await
        .expect("relationship loads");
    let unfollow = following.apply_optimistic(FollowIntent::Unfollow);
    harness.social.unfollow(&bob, &ada).await.expect("unfollowed");
    let settled = harness
        .social
        .relationship(&bob, &ada)
        .await
        .expect("relationship loads");
    assert!(unfollow.confirmed_by(&settled));
    assert_eq!(settled, Relationship::None);
}

#[rstest]
#[tokio::test]
async fn removed_items_return_when_collected_again(harness: MemoryHarness) {
    harness
        .collector
        .ingest(batch("Ada", vec![json!({ "id": "lamp", "title": "Lamp" })]))
        .await
        .expect("ingest succeeds");
    let ada = user("Ada");
    let lamp = curation::domain::ProductId::new("lamp").expect("product id");

    harness
        .curator
        .remove_from_feed(&ada, &lamp)
        .await
        .expect("removed");
    assert!(harness.curator.get_feed(&ada, None).await.expect("feed").is_empty());
    assert!(harness.curator.get_sample(&ada).await.expect("sample").is_none());

    harness
        .collector
        .ingest(batch("Ada", vec![json!({ "id": "lamp", "title": "Lamp v2" })]))
        .await
        .expect("ingest succeeds");
    let feed = harness.curator.get_feed(&ada, None).await.expect("feed");
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].snapshot.title, "Lamp v2");
}
