use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CommentId, ProposalId, UserId, VoteId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: UserId::generate(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Active,
    Top3,
}

/// A submitted idea.
///
/// The upvote count is not stored: it is the size of `voted_by`, so the two
/// can never disagree. Comments are kept in the order they were added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub author_id: UserId,
    pub author_name: String,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub status: ProposalStatus,
    pub voted_by: BTreeSet<UserId>,
}

impl Proposal {
    /// A fresh proposal: active, no upvotes, no comments. The author's name
    /// is copied so later renames (there are none today) cannot rewrite it.
    pub fn new(title: impl Into<String>, description: impl Into<String>, author: &User) -> Self {
        Self {
            id: ProposalId::generate(),
            title: title.into(),
            description: description.into(),
            author_id: author.id.clone(),
            author_name: author.name.clone(),
            comments: Vec::new(),
            created_at: Utc::now(),
            status: ProposalStatus::Active,
            voted_by: BTreeSet::new(),
        }
    }

    pub fn thumbs_up(&self) -> usize {
        self.voted_by.len()
    }

    pub fn has_upvoted(&self, user_id: &UserId) -> bool {
        self.voted_by.contains(user_id)
    }

    pub fn voters(&self) -> impl Iterator<Item = &UserId> {
        self.voted_by.iter()
    }

    pub fn is_active(&self) -> bool {
        self.status == ProposalStatus::Active
    }

    pub fn is_top3(&self) -> bool {
        self.status == ProposalStatus::Top3
    }

    /// Next version with `user_id` counted, or `None` if they already upvoted.
    pub fn upvoted_by(&self, user_id: &UserId) -> Option<Proposal> {
        if self.has_upvoted(user_id) {
            return None;
        }
        let mut next = self.clone();
        next.voted_by.insert(user_id.clone());
        Some(next)
    }

    pub fn with_comment(&self, comment: Comment) -> Proposal {
        let mut next = self.clone();
        next.comments.push(comment);
        next
    }

    pub fn promoted(&self) -> Proposal {
        Proposal {
            status: ProposalStatus::Top3,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub proposal_id: ProposalId,
    pub author_id: UserId,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(proposal_id: &ProposalId, author: &User, text: impl Into<String>) -> Self {
        Self {
            id: CommentId::generate(),
            proposal_id: proposal_id.clone(),
            author_id: author.id.clone(),
            author_name: author.name.clone(),
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Yes,
    No,
}

/// A final-round ballot. Never edited once cast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub id: VoteId,
    pub proposal_id: ProposalId,
    pub user_id: UserId,
    pub choice: VoteChoice,
    pub created_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(proposal_id: &ProposalId, user_id: &UserId, choice: VoteChoice) -> Self {
        Self {
            id: VoteId::generate(),
            proposal_id: proposal_id.clone(),
            user_id: user_id.clone(),
            choice,
            created_at: Utc::now(),
        }
    }
}

/// Tally of the final votes on one proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteResults {
    pub yes: usize,
    pub no: usize,
    pub total: usize,
}

impl VoteResults {
    pub fn tally<'a>(votes: impl IntoIterator<Item = &'a Vote>) -> Self {
        votes.into_iter().fold(Self::default(), |mut acc, vote| {
            match vote.choice {
                VoteChoice::Yes => acc.yes += 1,
                VoteChoice::No => acc.no += 1,
            }
            acc.total += 1;
            acc
        })
    }

    /// Share of yes votes, rounded to a whole percent. 0 when nobody voted.
    pub fn yes_percent(&self) -> u32 {
        percent(self.yes, self.total)
    }

    /// Complement of `yes_percent`, so the two always add up to 100.
    pub fn no_percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        100 - self.yes_percent()
    }
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}
