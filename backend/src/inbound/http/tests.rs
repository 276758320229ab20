//! Handler tests against the in-memory store.

use actix_web::http::StatusCode;
use actix_web::test::{TestRequest, call_service, read_body_json};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::test_utils::{as_viewer, ingest_body, init_app};
use crate::domain::UserId;
use crate::test_support::MemoryHarness;

#[fixture]
fn harness() -> MemoryHarness {
    MemoryHarness::new()
}

fn user(name: &str) -> UserId {
    UserId::from_display_name(name).expect("valid display name")
}

macro_rules! send {
    ($app:expr, $req:expr) => {{
        let response = call_service(&$app, $req.to_request()).await;
        let status = response.status();
        let body: Value = if status == StatusCode::NO_CONTENT {
            Value::Null
        } else {
            read_body_json(response).await
        };
        (status, body)
    }};
}

#[rstest]
#[actix_web::test]
async fn ingested_items_appear_in_the_feed(harness: MemoryHarness) {
    let app = init_app(&harness).await;

    let (status, body) = send!(
        app,
        TestRequest::post()
            .uri("/api/v1/ingest")
            .set_json(ingest_body("Ada", "P123", "Desk lamp"))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ingested"], json!(1));
    assert_eq!(body["userId"], json!(user("Ada").to_string()));

    let (status, body) = send!(
        app,
        TestRequest::get()
            .uri("/api/v1/feed?limit=5")
            .insert_header(as_viewer(&user("Ada")))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["productId"], json!("P123"));
    assert_eq!(body["items"][0]["snapshot"]["title"], json!("Desk lamp"));
    assert!(body.get("nextCursor").is_none());

    let (status, body) = send!(
        app,
        TestRequest::get()
            .uri("/api/v1/feed/sample")
            .insert_header(as_viewer(&user("Ada")))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["productId"], json!("P123"));
}

#[rstest]
#[actix_web::test]
async fn requests_without_a_viewer_are_unauthorized(harness: MemoryHarness) {
    let app = init_app(&harness).await;

    let (status, body) = send!(app, TestRequest::get().uri("/api/v1/feed"));

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], json!("unauthorized"));
}

#[rstest]
#[actix_web::test]
async fn removing_a_feed_item_twice_reports_not_found(harness: MemoryHarness) {
    let app = init_app(&harness).await;
    send!(
        app,
        TestRequest::post()
            .uri("/api/v1/ingest")
            .set_json(ingest_body("Ada", "P123", "Desk lamp"))
    );
    let remove = || {
        TestRequest::delete()
            .uri("/api/v1/feed/items/P123")
            .insert_header(as_viewer(&user("Ada")))
    };

    let (status, _) = send!(app, remove());
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send!(app, remove());
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("not_found"));
}

#[rstest]
#[actix_web::test]
async fn votes_toggle_through_the_api(harness: MemoryHarness) {
    let app = init_app(&harness).await;
    send!(
        app,
        TestRequest::post()
            .uri("/api/v1/ingest")
            .set_json(ingest_body("Ada", "P123", "Desk lamp"))
    );
    let ada = user("Ada");

    let (status, shared) = send!(
        app,
        TestRequest::post()
            .uri("/api/v1/shares")
            .insert_header(as_viewer(&ada))
            .set_json(json!({ "productId": "P123", "message": "love it" }))
    );
    assert_eq!(status, StatusCode::CREATED);
    let share_id = shared["id"].as_str().expect("share id").to_owned();
    let votes_uri = format!("/api/v1/shares/{share_id}/votes");

    let (status, tally) = send!(
        app,
        TestRequest::post()
            .uri(&votes_uri)
            .insert_header(as_viewer(&ada))
            .set_json(json!({ "voteType": "like" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tally, json!({"likeCount": 1, "dislikeCount": 0, "viewerVote": "like"}));

    let (_, tally) = send!(
        app,
        TestRequest::post()
            .uri(&votes_uri)
            .insert_header(as_viewer(&ada))
            .set_json(json!({ "voteType": "like" }))
    );
    assert_eq!(tally, json!({"likeCount": 0, "dislikeCount": 0, "viewerVote": null}));

    let (status, tally) = send!(
        app,
        TestRequest::get()
            .uri(&format!("/api/v1/shares/{share_id}/tally"))
            .insert_header(as_viewer(&ada))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tally["likeCount"], json!(0));
}

#[rstest]
#[actix_web::test]
async fn duplicate_shares_conflict(harness: MemoryHarness) {
    let app = init_app(&harness).await;
    let ada = user("Ada");
    let body = json!({
        "product": { "productId": "P9", "snapshot": { "title": "Mug" } }
    });

    let (status, first) = send!(
        app,
        TestRequest::post()
            .uri("/api/v1/shares")
            .insert_header(as_viewer(&ada))
            .set_json(body.clone())
    );
    assert_eq!(status, StatusCode::CREATED);

    let (status, err) = send!(
        app,
        TestRequest::post()
            .uri("/api/v1/shares")
            .insert_header(as_viewer(&ada))
            .set_json(body)
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], json!("conflict"));
    assert_eq!(err["details"]["sharedItemId"], first["id"]);
}

#[rstest]
#[case(json!({}))]
#[case(json!({ "productId": "P1", "product": { "productId": "P1", "snapshot": { "title": "x" } } }))]
#[actix_web::test]
async fn share_needs_exactly_one_source(harness: MemoryHarness, #[case] body: Value) {
    let app = init_app(&harness).await;

    let (status, err) = send!(
        app,
        TestRequest::post()
            .uri("/api/v1/shares")
            .insert_header(as_viewer(&user("Ada")))
            .set_json(body)
    );

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], json!("invalid_request"));
}

#[rstest]
#[actix_web::test]
async fn malformed_ids_and_bodies_are_bad_requests(harness: MemoryHarness) {
    let app = init_app(&harness).await;
    let ada = user("Ada");

    let (status, err) = send!(
        app,
        TestRequest::get()
            .uri("/api/v1/shares/not-a-uuid/tally")
            .insert_header(as_viewer(&ada))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["details"]["code"], json!("invalid_uuid"));

    let (status, err) = send!(
        app,
        TestRequest::post()
            .uri("/api/v1/follow-requests")
            .insert_header(as_viewer(&ada))
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["details"]["code"], json!("invalid_body"));
}

#[rstest]
#[actix_web::test]
async fn accepted_follows_open_the_shared_feed(harness: MemoryHarness) {
    let app = init_app(&harness).await;
    for (owner, product) in [("Ada", "P1"), ("Bob", "P2")] {
        send!(
            app,
            TestRequest::post()
                .uri("/api/v1/ingest")
                .set_json(ingest_body(owner, product, "Thing"))
        );
    }
    let (ada, bob) = (user("Ada"), user("Bob"));
    send!(
        app,
        TestRequest::post()
            .uri("/api/v1/shares")
            .insert_header(as_viewer(&ada))
            .set_json(json!({ "productId": "P1" }))
    );

    let (status, request) = send!(
        app,
        TestRequest::post()
            .uri("/api/v1/follow-requests")
            .insert_header(as_viewer(&bob))
            .set_json(json!({ "recipientId": ada, "message": "hi" }))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], json!("pending"));

    let (_, relationship) = send!(
        app,
        TestRequest::get()
            .uri(&format!("/api/v1/relationships/{ada}"))
            .insert_header(as_viewer(&bob))
    );
    assert_eq!(relationship["relationship"], json!("requested"));

    let (_, pending) = send!(
        app,
        TestRequest::get()
            .uri("/api/v1/follow-requests")
            .insert_header(as_viewer(&ada))
    );
    assert_eq!(pending[0]["requester"]["displayName"], json!("Bob"));

    let request_id = request["id"].as_str().expect("request id");
    let (status, accepted) = send!(
        app,
        TestRequest::post()
            .uri(&format!("/api/v1/follow-requests/{request_id}/accept"))
            .insert_header(as_viewer(&ada))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], json!("accepted"));

    let (_, following) = send!(
        app,
        TestRequest::get()
            .uri("/api/v1/following")
            .insert_header(as_viewer(&bob))
    );
    assert_eq!(following[0]["profile"]["displayName"], json!("Ada"));

    let (_, shares) = send!(
        app,
        TestRequest::get()
            .uri("/api/v1/shares?limit=10")
            .insert_header(as_viewer(&bob))
    );
    assert_eq!(shares[0]["item"]["productId"], json!("P1"));

    let (_, friends) = send!(
        app,
        TestRequest::get()
            .uri("/api/v1/feed/friends")
            .insert_header(as_viewer(&bob))
    );
    assert_eq!(friends[0]["productId"], json!("P1"));

    let (status, _) = send!(
        app,
        TestRequest::delete()
            .uri(&format!("/api/v1/following/{ada}"))
            .insert_header(as_viewer(&bob))
    );
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, discoverable) = send!(
        app,
        TestRequest::get()
            .uri("/api/v1/discover?q=ad")
            .insert_header(as_viewer(&bob))
    );
    assert_eq!(discoverable[0]["displayName"], json!("Ada"));
}
