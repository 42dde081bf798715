use std::cmp::Reverse;

use equal_types::{Proposal, ProposalId, UserId, VoteResults};

use crate::store::{ParticipationStore, TOP_COUNT};

impl ParticipationStore {
    pub fn proposal(&self, proposal_id: &ProposalId) -> Option<&Proposal> {
        self.proposals().iter().find(|p| &p.id == proposal_id)
    }

    /// Active proposals, most upvoted first. Ties keep submission order.
    pub fn active_proposals(&self) -> Vec<&Proposal> {
        ranked(self.proposals().iter().filter(|p| p.is_active()))
    }

    /// Finalists, most upvoted first.
    pub fn top_three(&self) -> Vec<&Proposal> {
        ranked(self.proposals().iter().filter(|p| p.is_top3()))
    }

    pub fn vote_results(&self, proposal_id: &ProposalId) -> VoteResults {
        VoteResults::tally(self.votes().iter().filter(|v| &v.proposal_id == proposal_id))
    }

    pub fn has_voted(&self, proposal_id: &ProposalId, user_id: &UserId) -> bool {
        self.votes()
            .iter()
            .any(|v| &v.proposal_id == proposal_id && &v.user_id == user_id)
    }

    /// Promotion is offered once enough proposals compete and no final
    /// round exists yet.
    pub fn can_promote(&self) -> bool {
        !self.voting_open() && self.active_proposals().len() >= TOP_COUNT
    }

    pub fn voting_open(&self) -> bool {
        self.proposals().iter().any(Proposal::is_top3)
    }
}

fn ranked<'a>(proposals: impl Iterator<Item = &'a Proposal>) -> Vec<&'a Proposal> {
    let mut list: Vec<&Proposal> = proposals.collect();
    list.sort_by_key(|p| Reverse(p.thumbs_up()));
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use equal_types::VoteChoice;

    #[test]
    fn empty_store_queries() {
        let store = ParticipationStore::new();
        assert!(store.active_proposals().is_empty());
        assert!(store.top_three().is_empty());
        assert!(!store.can_promote());
        assert!(!store.voting_open());
        assert_eq!(store.vote_results(&ProposalId::from("x")), VoteResults::default());
        assert!(!store.has_voted(&ProposalId::from("x"), &UserId::from("u")));
    }

    #[test]
    fn active_list_is_ranked_and_gates_promotion() {
        let mut store = ParticipationStore::new();
        let anna = store.create_user("Anna").unwrap().id.clone();
        let a = store.create_proposal("A", "a", &anna).unwrap().id.clone();
        let b = store.create_proposal("B", "b", &anna).unwrap().id.clone();
        assert!(!store.can_promote());

        store.upvote(&b, &anna).unwrap();
        let order: Vec<&ProposalId> = store.active_proposals().into_iter().map(|p| &p.id).collect();
        assert_eq!(order, vec![&b, &a]);

        store.create_proposal("C", "c", &anna).unwrap();
        assert!(store.can_promote());

        store.promote_top_three();
        assert!(!store.can_promote());
        assert!(store.voting_open());
    }

    #[test]
    fn results_only_count_their_proposal() {
        let mut store = ParticipationStore::new();
        let anna = store.create_user("Anna").unwrap().id.clone();
        let ids: Vec<ProposalId> = ["A", "B", "C"]
            .iter()
            .map(|t| store.create_proposal(t, "text", &anna).unwrap().id.clone())
            .collect();
        store.promote_top_three();

        store.cast_vote(&ids[0], &anna, VoteChoice::No).unwrap();
        store.cast_vote(&ids[1], &anna, VoteChoice::Yes).unwrap();

        assert_eq!(store.vote_results(&ids[0]), VoteResults { yes: 0, no: 1, total: 1 });
        assert_eq!(store.vote_results(&ids[1]), VoteResults { yes: 1, no: 0, total: 1 });
        assert_eq!(store.vote_results(&ids[2]), VoteResults::default());
        assert!(!store.has_voted(&ids[2], &anna));
    }
}
