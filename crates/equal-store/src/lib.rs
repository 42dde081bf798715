//! Participation store: the proposal, upvote, discussion and final-vote
//! rules of Equal Democracy.
//!
//! The store knows nothing about screens or storage. Callers restore it from
//! a snapshot, apply operations, and persist whatever changed.

pub mod error;
pub mod queries;
pub mod store;

pub use error::{Result, StoreError};
pub use store::{ParticipationStore, PromotionOutcome, UpvoteOutcome, VoteOutcome, TOP_COUNT};
