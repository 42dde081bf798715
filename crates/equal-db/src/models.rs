//! Persisted record types: the JSON shape of each stored blob.
//! Distinct from the equal-types entities so the on-disk format can stay
//! put while the in-memory model changes.

use chrono::{DateTime, Utc};
use equal_types::{
    Comment, CommentId, Proposal, ProposalId, ProposalStatus, User, UserId, Vote, VoteChoice,
    VoteId,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// `thumbs_up` is redundant with `voted_by` and only written for readers of
/// the raw blob; on restore the voter set wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalRecord {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub author_id: UserId,
    pub author_name: String,
    pub thumbs_up: usize,
    pub voted_by: Vec<UserId>,
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
    pub created_at: DateTime<Utc>,
    pub status: ProposalStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: CommentId,
    pub proposal_id: ProposalId,
    pub author_id: UserId,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    pub id: VoteId,
    pub proposal_id: ProposalId,
    pub user_id: UserId,
    pub choice: VoteChoice,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            created_at: user.created_at,
        }
    }
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            created_at: record.created_at,
        }
    }
}

impl From<&Proposal> for ProposalRecord {
    fn from(proposal: &Proposal) -> Self {
        Self {
            id: proposal.id.clone(),
            title: proposal.title.clone(),
            description: proposal.description.clone(),
            author_id: proposal.author_id.clone(),
            author_name: proposal.author_name.clone(),
            thumbs_up: proposal.thumbs_up(),
            voted_by: proposal.voters().cloned().collect(),
            comments: proposal.comments.iter().map(CommentRecord::from).collect(),
            created_at: proposal.created_at,
            status: proposal.status,
        }
    }
}

impl From<ProposalRecord> for Proposal {
    fn from(record: ProposalRecord) -> Self {
        let stored_count = record.thumbs_up;
        let proposal = Proposal {
            id: record.id,
            title: record.title,
            description: record.description,
            author_id: record.author_id,
            author_name: record.author_name,
            comments: record.comments.into_iter().map(Comment::from).collect(),
            created_at: record.created_at,
            status: record.status,
            voted_by: record.voted_by.into_iter().collect(),
        };

        if proposal.thumbs_up() != stored_count {
            warn!(
                proposal_id = %proposal.id,
                stored = stored_count,
                voters = proposal.thumbs_up(),
                "Stored upvote count disagrees with voter list, using voter list"
            );
        }
        proposal
    }
}

impl From<&Comment> for CommentRecord {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id.clone(),
            proposal_id: comment.proposal_id.clone(),
            author_id: comment.author_id.clone(),
            author_name: comment.author_name.clone(),
            text: comment.text.clone(),
            created_at: comment.created_at,
        }
    }
}

impl From<CommentRecord> for Comment {
    fn from(record: CommentRecord) -> Self {
        Self {
            id: record.id,
            proposal_id: record.proposal_id,
            author_id: record.author_id,
            author_name: record.author_name,
            text: record.text,
            created_at: record.created_at,
        }
    }
}

impl From<&Vote> for VoteRecord {
    fn from(vote: &Vote) -> Self {
        Self {
            id: vote.id.clone(),
            proposal_id: vote.proposal_id.clone(),
            user_id: vote.user_id.clone(),
            choice: vote.choice,
            created_at: vote.created_at,
        }
    }
}

impl From<VoteRecord> for Vote {
    fn from(record: VoteRecord) -> Self {
        Self {
            id: record.id,
            proposal_id: record.proposal_id,
            user_id: record.user_id,
            choice: record.choice,
            created_at: record.created_at,
        }
    }
}
