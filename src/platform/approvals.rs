//! Reduce a review history to the current set of approvers

use crate::types::{Review, ReviewState};
use std::collections::{BTreeMap, BTreeSet};

/// Reviewers whose most recent decisive review is an approval
///
/// Reviews are ordered by submission time (stable, so platform order breaks
/// ties). Comment-only and pending reviews do not change a reviewer's state;
/// a later "changes requested" or dismissal replaces an earlier approval.
pub fn approvals_from_reviews(reviews: &[Review]) -> BTreeSet<String> {
    let mut decisive: Vec<&Review> = reviews.iter().filter(|r| r.state.is_decisive()).collect();
    decisive.sort_by_key(|r| r.submitted_at);

    let mut latest: BTreeMap<&str, ReviewState> = BTreeMap::new();
    for review in decisive {
        latest.insert(review.reviewer.as_str(), review.state);
    }

    latest
        .into_iter()
        .filter(|(_, state)| *state == ReviewState::Approved)
        .map(|(reviewer, _)| reviewer.to_string())
        .collect()
}
