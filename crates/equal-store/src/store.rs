use equal_types::{Comment, Proposal, ProposalId, User, UserId, Vote, VoteChoice};
use tracing::{debug, info};

use crate::error::{Result, StoreError};

/// How many proposals move on to the final round.
pub const TOP_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpvoteOutcome {
    Added { thumbs_up: usize },
    AlreadyVoted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    Recorded(Vote),
    AlreadyVoted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionOutcome {
    /// Ids of the promoted proposals, highest upvote count first.
    Promoted(Vec<ProposalId>),
    /// A final round already exists; promotion happens once.
    AlreadyPromoted,
}

/// In-memory entity set plus the rules that change it.
///
/// Every write replaces the affected proposal with a new version, so a
/// caller holding an old `Proposal` never sees a half-applied change.
#[derive(Debug, Clone, Default)]
pub struct ParticipationStore {
    identity: Option<User>,
    proposals: Vec<Proposal>,
    votes: Vec<Vote>,
}

impl ParticipationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restore(identity: Option<User>, proposals: Vec<Proposal>, votes: Vec<Vote>) -> Self {
        debug!(
            has_identity = identity.is_some(),
            proposals = proposals.len(),
            votes = votes.len(),
            "Restoring participation store"
        );
        Self {
            identity,
            proposals,
            votes,
        }
    }

    pub fn identity(&self) -> Option<&User> {
        self.identity.as_ref()
    }

    /// All proposals in submission order.
    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    /// The final-vote log in the order votes were cast.
    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }

    // -- Identity --

    /// Create the device identity. Replaces any previous one.
    pub fn create_user(&mut self, name: &str) -> Result<&User> {
        let name = required("name", name)?;
        let user = User::new(name);
        info!(user_id = %user.id, "Created identity for {}", user.name);
        Ok(&*self.identity.insert(user))
    }

    // -- Proposals --

    pub fn create_proposal(
        &mut self,
        title: &str,
        description: &str,
        author_id: &UserId,
    ) -> Result<&Proposal> {
        let author = self.acting_user(author_id)?;
        let title = required("title", title)?;
        let description = required("description", description)?;

        let proposal = Proposal::new(title, description, author);
        info!(proposal_id = %proposal.id, author_id = %author_id, "Proposal submitted: {}", proposal.title);

        let index = self.proposals.len();
        self.proposals.push(proposal);
        Ok(&self.proposals[index])
    }

    /// One upvote per user per proposal. A repeat is a no-op, not an error.
    pub fn upvote(&mut self, proposal_id: &ProposalId, user_id: &UserId) -> Result<UpvoteOutcome> {
        self.acting_user(user_id)?;
        let index = self.position(proposal_id)?;

        match self.proposals[index].upvoted_by(user_id) {
            Some(next) => {
                let thumbs_up = next.thumbs_up();
                self.proposals[index] = next;
                debug!(proposal_id = %proposal_id, user_id = %user_id, thumbs_up, "Upvote added");
                Ok(UpvoteOutcome::Added { thumbs_up })
            }
            None => {
                debug!(proposal_id = %proposal_id, user_id = %user_id, "Already upvoted");
                Ok(UpvoteOutcome::AlreadyVoted)
            }
        }
    }

    // -- Discussion --

    pub fn add_comment(
        &mut self,
        proposal_id: &ProposalId,
        author_id: &UserId,
        text: &str,
    ) -> Result<&Comment> {
        let author = self.acting_user(author_id)?;
        let text = required("comment", text)?;
        let index = self.position(proposal_id)?;

        let comment = Comment::new(proposal_id, author, text);
        debug!(proposal_id = %proposal_id, comment_id = %comment.id, "Comment added");

        let next = self.proposals[index].with_comment(comment);
        self.proposals[index] = next;

        let comments = &self.proposals[index].comments;
        Ok(&comments[comments.len() - 1])
    }

    // -- Final round --

    /// Move the highest-upvoted active proposals into the final round.
    ///
    /// Ranking is a stable sort on upvote count, so ties keep submission
    /// order. Only the first call promotes anything; once a `top3` proposal
    /// exists the call is a no-op.
    pub fn promote_top_three(&mut self) -> PromotionOutcome {
        if self.proposals.iter().any(Proposal::is_top3) {
            debug!("Final round already started, promotion skipped");
            return PromotionOutcome::AlreadyPromoted;
        }

        let selected: Vec<ProposalId> = self
            .active_proposals()
            .into_iter()
            .take(TOP_COUNT)
            .map(|p| p.id.clone())
            .collect();

        for proposal in self.proposals.iter_mut() {
            if selected.contains(&proposal.id) {
                *proposal = proposal.promoted();
            }
        }

        info!(count = selected.len(), "Proposals promoted to the final round");
        PromotionOutcome::Promoted(selected)
    }

    /// Record a final vote. A second vote by the same user on the same
    /// proposal is ignored; the first one stands.
    pub fn cast_vote(
        &mut self,
        proposal_id: &ProposalId,
        user_id: &UserId,
        choice: VoteChoice,
    ) -> Result<VoteOutcome> {
        self.acting_user(user_id)?;
        let proposal = self
            .proposal(proposal_id)
            .ok_or_else(|| StoreError::ProposalNotFound(proposal_id.clone()))?;
        if !proposal.is_top3() {
            return Err(StoreError::NotInFinalRound(proposal_id.clone()));
        }

        if self.has_voted(proposal_id, user_id) {
            debug!(proposal_id = %proposal_id, user_id = %user_id, "Duplicate final vote ignored");
            return Ok(VoteOutcome::AlreadyVoted);
        }

        let vote = Vote::new(proposal_id, user_id, choice);
        info!(proposal_id = %proposal_id, vote_id = %vote.id, ?choice, "Final vote cast");
        self.votes.push(vote.clone());
        Ok(VoteOutcome::Recorded(vote))
    }

    fn acting_user(&self, user_id: &UserId) -> Result<&User> {
        match &self.identity {
            None => Err(StoreError::NoActiveIdentity),
            Some(user) if &user.id == user_id => Ok(user),
            Some(_) => Err(StoreError::NotActiveIdentity(user_id.clone())),
        }
    }

    fn position(&self, proposal_id: &ProposalId) -> Result<usize> {
        self.proposals
            .iter()
            .position(|p| &p.id == proposal_id)
            .ok_or_else(|| StoreError::ProposalNotFound(proposal_id.clone()))
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::EmptyField(field));
    }
    Ok(trimmed)
}
