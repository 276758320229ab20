//! Behaviour tests for the share and vote ledger over the in-memory store.

use std::cell::RefCell;

use curation::domain::ports::VoteRepository;
use curation::domain::{
    ActivityType, Decision, IngestRequest, LedgerError, ProductId, ProfileSighting, SharedItem,
    UserId, VoteType,
};
use curation::test_support::MemoryHarness;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;
use tokio::runtime::Runtime;

struct ShareVoteWorld {
    runtime: Runtime,
    harness: MemoryHarness,
    shared: RefCell<Option<SharedItem>>,
    unshare_error: RefCell<Option<LedgerError>>,
}

impl ShareVoteWorld {
    fn new() -> Self {
        Self {
            runtime: Runtime::new().expect("create runtime"),
            harness: MemoryHarness::new(),
            shared: RefCell::new(None),
            unshare_error: RefCell::new(None),
        }
    }

    fn user(name: &str) -> UserId {
        UserId::from_display_name(name).expect("valid display name")
    }

    fn collect(&self, owner: &str, product: &str) {
        let request = IngestRequest {
            owner: ProfileSighting::named(owner),
            items: vec![json!({ "id": product, "title": format!("Product {product}") })],
            activity_type: ActivityType::Saved,
            source: "bdd".to_owned(),
        };
        let result = self
            .runtime
            .block_on(self.harness.collector.ingest(request))
            .expect("ingest succeeds");
        assert_eq!(result.ingested, 1);
    }

    fn shared_item(&self) -> SharedItem {
        self.shared.borrow().clone().expect("an item was shared")
    }

    fn vote(&self, voter: &str, vote: VoteType) -> Result<(), LedgerError> {
        let item = self.shared_item();
        self.runtime
            .block_on(self.harness.ledger.vote(&Self::user(voter), &item.id, vote))
            .map(drop)
    }

    fn shared_products(&self, viewer: &str) -> Vec<String> {
        self.runtime
            .block_on(self.harness.ledger.shared_feed(&Self::user(viewer), None))
            .expect("shared feed loads")
            .into_iter()
            .map(|view| view.item.product_id.as_str().to_owned())
            .collect()
    }
}

#[fixture]
fn world() -> ShareVoteWorld {
    ShareVoteWorld::new()
}

#[given("{owner} has shared product {product}")]
fn owner_has_shared_product(world: &ShareVoteWorld, owner: String, product: String) {
    world.collect(&owner, &product);
    let product_id = ProductId::new(product).expect("product id");
    let shared = world
        .runtime
        .block_on(world.harness.ledger.share_from_feed(
            &ShareVoteWorld::user(&owner),
            &product_id,
            None,
        ))
        .expect("share succeeds");
    *world.shared.borrow_mut() = Some(shared);
}

#[given("{follower} follows {owner}")]
fn follower_follows_owner(world: &ShareVoteWorld, follower: String, owner: String) {
    world.collect(&follower, "bdd-seed");
    let social = &world.harness.social;
    let (follower_id, owner_id) = (ShareVoteWorld::user(&follower), ShareVoteWorld::user(&owner));
    world.runtime.block_on(async {
        let request = social
            .send_request(&follower_id, &owner_id, None)
            .await
            .expect("request sent");
        social
            .respond(&owner_id, &request.id, Decision::Accept)
            .await
            .expect("request accepted");
    });
}

#[when("{voter} votes {vote} on the shared item")]
fn voter_votes_on_the_shared_item(world: &ShareVoteWorld, voter: String, vote: String) {
    let vote: VoteType = vote.parse().expect("like or dislike");
    world.vote(&voter, vote).expect("vote succeeds");
}

#[when("{owner} unshares the item")]
fn owner_unshares_the_item(world: &ShareVoteWorld, owner: String) {
    let item = world.shared_item();
    world
        .runtime
        .block_on(world.harness.ledger.unshare(&ShareVoteWorld::user(&owner), &item.id))
        .expect("owner may unshare");
}

#[when("{viewer} tries to unshare the item")]
fn viewer_tries_to_unshare_the_item(world: &ShareVoteWorld, viewer: String) {
    let item = world.shared_item();
    let outcome = world
        .runtime
        .block_on(world.harness.ledger.unshare(&ShareVoteWorld::user(&viewer), &item.id));
    *world.unshare_error.borrow_mut() = outcome.err();
}

#[then("the item has {likes} likes and {dislikes} dislikes")]
fn the_item_has_counts(world: &ShareVoteWorld, likes: String, dislikes: String) {
    let item = world.shared_item();
    let tally = world
        .runtime
        .block_on(world.harness.ledger.tally(&item.user_id, &item.id))
        .expect("tally loads");
    assert_eq!(tally.like_count, likes.parse::<u64>().expect("number"));
    assert_eq!(tally.dislike_count, dislikes.parse::<u64>().expect("number"));
}

#[then("{voter} sees their vote as {vote}")]
fn voter_sees_their_vote(world: &ShareVoteWorld, voter: String, vote: String) {
    let item = world.shared_item();
    let tally = world
        .runtime
        .block_on(world.harness.ledger.tally(&ShareVoteWorld::user(&voter), &item.id))
        .expect("tally loads");
    assert_eq!(tally.viewer_vote, Some(vote.parse().expect("like or dislike")));
}

#[then("{voter} sees no vote of their own")]
fn voter_sees_no_vote(world: &ShareVoteWorld, voter: String) {
    let item = world.shared_item();
    let tally = world
        .runtime
        .block_on(world.harness.ledger.tally(&ShareVoteWorld::user(&voter), &item.id))
        .expect("tally loads");
    assert_eq!(tally.viewer_vote, None);
}

#[then("voting on the item as {voter} fails as not found")]
fn voting_fails_as_not_found(world: &ShareVoteWorld, voter: String) {
    let err = world.vote(&voter, VoteType::Like).expect_err("inactive item");
    assert_eq!(err, LedgerError::ItemNotFound);
}

#[then("the stored votes still count {likes} likes")]
fn stored_votes_still_count(world: &ShareVoteWorld, likes: String) {
    let item = world.shared_item();
    let counts = world
        .runtime
        .block_on(VoteRepository::counts(&*world.harness.store, &[item.id]))
        .expect("counts load");
    let stored = counts.get(&item.id).map_or(0, |c| c.like_count);
    assert_eq!(stored, likes.parse::<u64>().expect("number"));
}

#[then("the shared feed of {viewer} is empty")]
fn shared_feed_is_empty(world: &ShareVoteWorld, viewer: String) {
    assert!(world.shared_products(&viewer).is_empty());
}

#[then("the shared feed of {viewer} lists {product}")]
fn shared_feed_lists(world: &ShareVoteWorld, viewer: String, product: String) {
    assert_eq!(world.shared_products(&viewer), vec![product]);
}

#[then("the unshare is refused as not owner")]
fn unshare_refused(world: &ShareVoteWorld) {
    assert_eq!(*world.unshare_error.borrow(), Some(LedgerError::NotOwner));
}

#[scenario(
    path = "tests/features/share_vote.feature",
    name = "Repeating a vote removes it and a later dislike counts alone"
)]
fn repeating_a_vote_removes_it(world: ShareVoteWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/share_vote.feature",
    name = "The opposite vote replaces an existing one"
)]
fn opposite_vote_replaces(world: ShareVoteWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/share_vote.feature",
    name = "Tallies count every voter once"
)]
fn tallies_count_every_voter_once(world: ShareVoteWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/share_vote.feature",
    name = "Unsharing hides the item but keeps its votes"
)]
fn unsharing_keeps_votes(world: ShareVoteWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/share_vote.feature",
    name = "Only the owner may unshare"
)]
fn only_the_owner_may_unshare(world: ShareVoteWorld) {
    drop(world);
}
