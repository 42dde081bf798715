use equal_types::{ProposalId, UserId};
use thiserror::Error;

/// A rejected precondition. Nothing in the store changed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no active identity")]
    NoActiveIdentity,

    #[error("user {0} is not the active identity")]
    NotActiveIdentity(UserId),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    #[error("proposal {0} is not in the final round")]
    NotInFinalRound(ProposalId),
}

pub type Result<T> = std::result::Result<T, StoreError>;
