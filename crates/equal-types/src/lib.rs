//! Equal Democracy entity types.
//!
//! Plain value records shared by the participation store, the persistence
//! adapter and the presentation layer. Mutating helpers on these types never
//! change a record in place; they return the next version of it.

pub mod ids;
pub mod models;

pub use ids::{CommentId, ProposalId, UserId, VoteId};
pub use models::{Comment, Proposal, ProposalStatus, User, Vote, VoteChoice, VoteResults};
