//! Optimistic mutations as explicit values.
//!
//! A client applies a predicted change immediately, sends the real call, then
//! either commits the authoritative state returned by the service or rolls
//! back to the state it held before the call.

use super::{FollowIntent, Relationship, VoteTally, VoteTransition, VoteType};

/// A locally applied change awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingChange<S> {
    before: S,
    predicted: S,
}

impl<S> PendingChange<S> {
    /// Record a prediction made from `before`.
    pub const fn new(before: S, predicted: S) -> Self {
        Self { before, predicted }
    }

    /// State before the change was applied.
    pub const fn before(&self) -> &S {
        &self.before
    }

    /// State shown while the call is in flight.
    pub const fn predicted(&self) -> &S {
        &self.predicted
    }

    /// Replace the prediction with the authoritative state.
    pub fn commit(self, authoritative: S) -> S {
        authoritative
    }

    /// Discard the prediction.
    pub fn rollback(self) -> S {
        self.before
    }
}

impl<S: PartialEq> PendingChange<S> {
    /// Whether the service confirmed the prediction exactly.
    pub fn confirmed_by(&self, authoritative: &S) -> bool {
        &self.predicted == authoritative
    }
}

impl VoteTally {
    /// Predict the tally after the viewer casts `vote_type`.
    ///
    /// # Examples
    /// ```
    /// use curation::domain::{VoteTally, VoteType};
    ///
    /// let pending = VoteTally::default().apply_optimistic(VoteType::Like);
    /// assert_eq!(pending.predicted().like_count, 1);
    /// assert_eq!(pending.rollback(), VoteTally::default());
    /// ```
    pub fn apply_optimistic(self, vote_type: VoteType) -> PendingChange<Self> {
        let predicted = self.applying(VoteTransition::resolve(self.viewer_vote, vote_type));
        PendingChange::new(self, predicted)
    }
}

impl Relationship {
    /// Predict the relationship after `intent` succeeds.
    pub fn apply_optimistic(self, intent: FollowIntent) -> PendingChange<Self> {
        PendingChange::new(self, self.after(intent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn commit_prefers_authoritative_state() {
        let pending = VoteTally::default().apply_optimistic(VoteType::Like);
        let authoritative = VoteTally {
            like_count: 4,
            dislike_count: 0,
            viewer_vote: Some(VoteType::Like),
        };

        assert!(!pending.confirmed_by(&authoritative));
        assert_eq!(pending.commit(authoritative), authoritative);
    }

    #[rstest]
    fn repeated_vote_predicts_removal() {
        let current = VoteTally {
            like_count: 1,
            dislike_count: 0,
            viewer_vote: Some(VoteType::Like),
        };

        let pending = current.apply_optimistic(VoteType::Like);

        assert_eq!(*pending.predicted(), VoteTally::default());
        assert_eq!(*pending.before(), current);
    }

    #[rstest]
    fn relationship_rollback_restores_previous_state() {
        let pending = Relationship::Following.apply_optimistic(FollowIntent::Unfollow);
        assert_eq!(*pending.predicted(), Relationship::None);
        assert_eq!(pending.rollback(), Relationship::Following);
    }
}
