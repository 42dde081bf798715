use chrono::{DateTime, Utc};
use equal_types::{Comment, Proposal, ProposalId, UserId, VoteResults};

/// What a front-end needs to draw the current view.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Welcome,
    About { has_identity: bool },
    Home(HomeScreen),
    CreateProposal,
    Discuss(DiscussScreen),
    Vote(VoteScreen),
}

/// One proposal as seen by the current user.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalCard {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub author_name: String,
    pub thumbs_up: usize,
    pub comment_count: usize,
    pub upvoted: bool,
    pub created_at: DateTime<Utc>,
}

impl ProposalCard {
    pub fn new(proposal: &Proposal, viewer: &UserId) -> Self {
        Self {
            id: proposal.id.clone(),
            title: proposal.title.clone(),
            description: proposal.description.clone(),
            author_name: proposal.author_name.clone(),
            thumbs_up: proposal.thumbs_up(),
            comment_count: proposal.comments.len(),
            upvoted: proposal.has_upvoted(viewer),
            created_at: proposal.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HomeScreen {
    pub user_name: String,
    /// Active proposals, most upvoted first.
    pub proposals: Vec<ProposalCard>,
    pub can_promote: bool,
    pub voting_open: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscussScreen {
    pub proposal: ProposalCard,
    pub comments: Vec<Comment>,
}

/// Results stay hidden until the viewer has voted on that proposal.
#[derive(Debug, Clone, PartialEq)]
pub struct BallotEntry {
    pub proposal: ProposalCard,
    pub voted: bool,
    pub results: Option<VoteResults>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoteScreen {
    pub ballots: Vec<BallotEntry>,
}
