use anyhow::Result;
use equal_db::{KeyValueStore, Persistence};
use equal_store::{
    ParticipationStore, PromotionOutcome, StoreError, UpvoteOutcome, VoteOutcome,
};
use equal_types::{Proposal, ProposalId, User, UserId, VoteChoice};
use tracing::{debug, info, warn};

use crate::screens::{BallotEntry, DiscussScreen, HomeScreen, ProposalCard, Screen, VoteScreen};
use crate::view::View;

/// One running instance of the app on this device.
///
/// Navigation methods return `false` when the move is not available from
/// the current view. Action methods return `Ok(false)` when the store
/// rejected the action (nothing changed, nothing written) and `Err` only
/// when the backing store failed. A failed write is rolled back, so memory
/// never holds a change the backend does not.
pub struct Session<S> {
    store: ParticipationStore,
    persistence: Persistence<S>,
    view: View,
    selected: Option<ProposalId>,
}

impl<S: KeyValueStore> Session<S> {
    pub fn start(persistence: Persistence<S>) -> Result<Self> {
        let snapshot = persistence.load()?;
        let store =
            ParticipationStore::restore(snapshot.identity, snapshot.proposals, snapshot.votes);

        let view = if store.identity().is_some() {
            View::Home
        } else {
            View::Welcome
        };
        info!(%view, "Session started");

        Ok(Self {
            store,
            persistence,
            view,
            selected: None,
        })
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn store(&self) -> &ParticipationStore {
        &self.store
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn current_user(&self) -> Option<&User> {
        self.store.identity()
    }

    pub fn selected_proposal(&self) -> Option<&Proposal> {
        self.selected.as_ref().and_then(|id| self.store.proposal(id))
    }

    // -- Navigation --

    pub fn show_about(&mut self) -> bool {
        match self.view {
            View::Welcome | View::Home => self.navigate(View::About),
            _ => false,
        }
    }

    pub fn back(&mut self) -> bool {
        let target = match self.view {
            View::About if self.current_user().is_some() => View::Home,
            View::About => View::Welcome,
            View::CreateProposal | View::Discuss | View::Vote => View::Home,
            View::Welcome | View::Home => return false,
        };
        self.selected = None;
        self.navigate(target)
    }

    pub fn open_create(&mut self) -> bool {
        self.view == View::Home && self.navigate(View::CreateProposal)
    }

    pub fn open_discussion(&mut self, proposal_id: &ProposalId) -> bool {
        if self.view != View::Home || self.store.proposal(proposal_id).is_none() {
            debug!(proposal_id = %proposal_id, "Discussion not available");
            return false;
        }
        self.selected = Some(proposal_id.clone());
        self.navigate(View::Discuss)
    }

    pub fn open_vote(&mut self) -> bool {
        self.view == View::Home && self.store.voting_open() && self.navigate(View::Vote)
    }

    // -- Actions --

    /// Create the device identity from the welcome screen.
    pub fn register(&mut self, name: &str) -> Result<bool> {
        if self.view != View::Welcome {
            return Ok(false);
        }
        let previous = self.store.clone();
        let user = match self.store.create_user(name) {
            Ok(user) => user.clone(),
            Err(e) => return Ok(ignored("register", e)),
        };

        self.write_through(previous, |p, _| p.save_identity(&user))?;
        self.navigate(View::Home);
        Ok(true)
    }

    pub fn submit_proposal(&mut self, title: &str, description: &str) -> Result<bool> {
        if self.view != View::CreateProposal {
            return Ok(false);
        }
        let previous = self.store.clone();
        let result = self
            .acting_id()
            .and_then(|me| self.store.create_proposal(title, description, &me).map(|_| ()));
        if let Err(e) = result {
            return Ok(ignored("submit proposal", e));
        }

        self.write_through(previous, |p, store| p.save_proposals(store.proposals()))?;
        self.navigate(View::Home);
        Ok(true)
    }

    pub fn upvote(&mut self, proposal_id: &ProposalId) -> Result<bool> {
        if self.view != View::Home {
            return Ok(false);
        }
        let previous = self.store.clone();
        let outcome = self
            .acting_id()
            .and_then(|me| self.store.upvote(proposal_id, &me));
        match outcome {
            Ok(UpvoteOutcome::Added { .. }) => {
                self.write_through(previous, |p, store| p.save_proposals(store.proposals()))?;
                Ok(true)
            }
            Ok(UpvoteOutcome::AlreadyVoted) => Ok(false),
            Err(e) => Ok(ignored("upvote", e)),
        }
    }

    /// Comment on the proposal open in the discussion view.
    pub fn comment(&mut self, text: &str) -> Result<bool> {
        let Some(proposal_id) = self.selected.clone().filter(|_| self.view == View::Discuss) else {
            return Ok(false);
        };
        let previous = self.store.clone();
        let result = self
            .acting_id()
            .and_then(|me| self.store.add_comment(&proposal_id, &me, text).map(|_| ()));
        if let Err(e) = result {
            return Ok(ignored("comment", e));
        }

        self.write_through(previous, |p, store| p.save_proposals(store.proposals()))?;
        Ok(true)
    }

    /// Start the final round. Only offered from the home screen while
    /// promotion is open (see `ParticipationStore::can_promote`).
    pub fn promote(&mut self) -> Result<bool> {
        if self.view != View::Home || !self.store.can_promote() {
            return Ok(false);
        }
        let previous = self.store.clone();
        match self.store.promote_top_three() {
            PromotionOutcome::Promoted(_) => {
                self.write_through(previous, |p, store| p.save_proposals(store.proposals()))?;
                Ok(true)
            }
            PromotionOutcome::AlreadyPromoted => Ok(false),
        }
    }

    pub fn vote(&mut self, proposal_id: &ProposalId, choice: VoteChoice) -> Result<bool> {
        if self.view != View::Vote {
            return Ok(false);
        }
        let previous = self.store.clone();
        let outcome = self
            .acting_id()
            .and_then(|me| self.store.cast_vote(proposal_id, &me, choice));
        match outcome {
            Ok(VoteOutcome::Recorded(_)) => {
                self.write_through(previous, |p, store| p.save_votes(store.votes()))?;
                Ok(true)
            }
            Ok(VoteOutcome::AlreadyVoted) => Ok(false),
            Err(e) => Ok(ignored("vote", e)),
        }
    }

    // -- Screens --

    pub fn screen(&self) -> Screen {
        match (self.view, self.current_user()) {
            (View::About, user) => Screen::About {
                has_identity: user.is_some(),
            },
            (View::Welcome, _) | (_, None) => Screen::Welcome,
            (View::Home, Some(user)) => Screen::Home(self.home_screen(user)),
            (View::CreateProposal, Some(_)) => Screen::CreateProposal,
            (View::Discuss, Some(user)) => match self.selected_proposal() {
                Some(proposal) => Screen::Discuss(DiscussScreen {
                    proposal: ProposalCard::new(proposal, &user.id),
                    comments: proposal.comments.clone(),
                }),
                None => Screen::Home(self.home_screen(user)),
            },
            (View::Vote, Some(user)) => Screen::Vote(self.vote_screen(&user.id)),
        }
    }

    fn home_screen(&self, user: &User) -> HomeScreen {
        HomeScreen {
            user_name: user.name.clone(),
            proposals: self
                .store
                .active_proposals()
                .into_iter()
                .map(|p| ProposalCard::new(p, &user.id))
                .collect(),
            can_promote: self.store.can_promote(),
            voting_open: self.store.voting_open(),
        }
    }

    fn vote_screen(&self, viewer: &UserId) -> VoteScreen {
        let ballots = self
            .store
            .top_three()
            .into_iter()
            .map(|p| {
                let voted = self.store.has_voted(&p.id, viewer);
                BallotEntry {
                    proposal: ProposalCard::new(p, viewer),
                    voted,
                    results: voted.then(|| self.store.vote_results(&p.id)),
                }
            })
            .collect();
        VoteScreen { ballots }
    }

    fn acting_id(&self) -> Result<UserId, StoreError> {
        self.current_user()
            .map(|u| u.id.clone())
            .ok_or(StoreError::NoActiveIdentity)
    }

    /// Persist the change just applied to the store. On failure the store
    /// goes back to `previous` and the error is returned.
    fn write_through<F>(&mut self, previous: ParticipationStore, save: F) -> Result<()>
    where
        F: FnOnce(&Persistence<S>, &ParticipationStore) -> Result<()>,
    {
        if let Err(e) = save(&self.persistence, &self.store) {
            warn!("Write failed, change rolled back: {:#}", e);
            self.store = previous;
            return Err(e);
        }
        Ok(())
    }

    fn navigate(&mut self, to: View) -> bool {
        if to.needs_identity() && self.current_user().is_none() {
            debug!(%to, "Navigation needs an identity");
            return false;
        }
        debug!(from = %self.view, %to, "Navigate");
        self.view = to;
        true
    }
}

fn ignored(action: &'static str, err: StoreError) -> bool {
    debug!(action, "Action ignored: {}", err);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use equal_db::MemoryStore;
    use equal_types::VoteResults;
    use std::cell::Cell;

    /// Memory backend whose writes can be switched to fail.
    #[derive(Default)]
    struct FailingStore {
        inner: MemoryStore,
        fail: Cell<bool>,
    }

    impl KeyValueStore for FailingStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if self.fail.get() {
                anyhow::bail!("disk full");
            }
            self.inner.set(key, value)
        }
    }

    fn session() -> Session<MemoryStore> {
        Session::start(Persistence::new(MemoryStore::new())).unwrap()
    }

    fn registered(name: &str) -> Session<MemoryStore> {
        let mut s = session();
        assert!(s.register(name).unwrap());
        s
    }

    fn propose(s: &mut Session<MemoryStore>, title: &str) -> ProposalId {
        assert!(s.open_create());
        assert!(s.submit_proposal(title, "Beskrivning").unwrap());
        s.store().proposals().last().unwrap().id.clone()
    }

    #[test]
    fn starts_on_welcome_without_identity() {
        let mut s = session();
        assert_eq!(s.view(), View::Welcome);
        assert_eq!(s.screen(), Screen::Welcome);

        // identity-only views are unreachable
        assert!(!s.open_create());
        assert!(!s.open_vote());
        assert!(!s.upvote(&ProposalId::from("x")).unwrap());
    }

    #[test]
    fn blank_name_keeps_welcome() {
        let mut s = session();
        assert!(!s.register("   ").unwrap());
        assert_eq!(s.view(), View::Welcome);
        assert!(s.persistence().kv().get(equal_db::USER_KEY).unwrap().is_none());
    }

    #[test]
    fn register_moves_home_and_persists_identity() {
        let s = registered(" Anna ");
        assert_eq!(s.view(), View::Home);
        assert_eq!(s.current_user().unwrap().name, "Anna");
        assert!(s.persistence().kv().get(equal_db::USER_KEY).unwrap().is_some());

        match s.screen() {
            Screen::Home(home) => {
                assert_eq!(home.user_name, "Anna");
                assert!(home.proposals.is_empty());
                assert!(!home.can_promote);
                assert!(!home.voting_open);
            }
            other => panic!("expected home, got {other:?}"),
        }
    }

    #[test]
    fn about_returns_where_it_makes_sense() {
        let mut s = session();
        assert!(s.show_about());
        assert_eq!(s.screen(), Screen::About { has_identity: false });
        assert!(s.back());
        assert_eq!(s.view(), View::Welcome);

        assert!(s.register("Anna").unwrap());
        assert!(s.show_about());
        assert!(s.back());
        assert_eq!(s.view(), View::Home);
        assert!(!s.back());
    }

    #[test]
    fn proposal_submission_flow() {
        let mut s = registered("Anna");
        assert!(s.open_create());
        assert!(!s.submit_proposal("Fler cykelbanor", "  ").unwrap());
        assert_eq!(s.view(), View::CreateProposal);
        assert!(s.store().proposals().is_empty());

        assert!(s.submit_proposal(" Fler cykelbanor ", "Bygg fler cykelbanor").unwrap());
        assert_eq!(s.view(), View::Home);
        assert_eq!(s.store().proposals()[0].title, "Fler cykelbanor");

        // back from create without submitting
        assert!(s.open_create());
        assert!(s.back());
        assert_eq!(s.store().proposals().len(), 1);
    }

    #[test]
    fn upvote_marks_card_once() {
        let mut s = registered("Anna");
        let pid = propose(&mut s, "Fler cykelbanor");

        assert!(s.upvote(&pid).unwrap());
        assert!(!s.upvote(&pid).unwrap());

        let Screen::Home(home) = s.screen() else { panic!("expected home") };
        assert_eq!(home.proposals[0].thumbs_up, 1);
        assert!(home.proposals[0].upvoted);
    }

    #[test]
    fn discussion_flow() {
        let mut s = registered("Anna");
        let pid = propose(&mut s, "Fler cykelbanor");

        assert!(!s.open_discussion(&ProposalId::from("missing")));
        assert!(s.open_discussion(&pid));
        assert!(s.comment("Bra idé").unwrap());
        assert!(!s.comment("  ").unwrap());

        let Screen::Discuss(discuss) = s.screen() else { panic!("expected discuss") };
        assert_eq!(discuss.proposal.comment_count, 1);
        assert_eq!(discuss.comments[0].text, "Bra idé");
        assert_eq!(discuss.comments[0].author_name, "Anna");

        assert!(s.back());
        assert!(s.selected_proposal().is_none());
        assert!(!s.comment("efter").unwrap());
    }

    #[test]
    fn promotion_gate_and_final_vote() {
        let mut s = registered("Anna");
        let a = propose(&mut s, "A");
        let b = propose(&mut s, "B");
        assert!(!s.promote().unwrap());
        let c = propose(&mut s, "C");
        let d = propose(&mut s, "D");
        s.upvote(&b).unwrap();
        s.upvote(&d).unwrap();

        assert!(!s.open_vote());
        assert!(s.promote().unwrap());
        assert!(!s.promote().unwrap());

        let Screen::Home(home) = s.screen() else { panic!("expected home") };
        assert!(home.voting_open);
        assert!(!home.can_promote);
        assert_eq!(home.proposals.len(), 1);
        assert_eq!(home.proposals[0].id, c);

        assert!(s.open_vote());
        let Screen::Vote(vote) = s.screen() else { panic!("expected vote") };
        let order: Vec<&ProposalId> = vote.ballots.iter().map(|e| &e.proposal.id).collect();
        assert_eq!(order, vec![&b, &d, &a]);
        assert!(vote.ballots.iter().all(|e| !e.voted && e.results.is_none()));

        assert!(s.vote(&b, VoteChoice::Yes).unwrap());
        assert!(!s.vote(&b, VoteChoice::No).unwrap());
        assert!(!s.vote(&c, VoteChoice::Yes).unwrap());

        let Screen::Vote(vote) = s.screen() else { panic!("expected vote") };
        assert!(vote.ballots[0].voted);
        assert_eq!(
            vote.ballots[0].results,
            Some(VoteResults { yes: 1, no: 0, total: 1 })
        );
        assert!(vote.ballots[1].results.is_none());
    }

    #[test]
    fn failed_write_leaves_memory_matching_storage() {
        let mut s = Session::start(Persistence::new(FailingStore::default())).unwrap();
        assert!(s.register("Anna").unwrap());
        let mut ids = Vec::new();
        for title in ["A", "B", "C"] {
            assert!(s.open_create());
            assert!(s.submit_proposal(title, "Beskrivning").unwrap());
            ids.push(s.store().proposals().last().unwrap().id.clone());
        }
        let fail = |s: &Session<FailingStore>, on: bool| s.persistence().kv().fail.set(on);

        fail(&s, true);
        assert!(s.upvote(&ids[0]).is_err());
        assert_eq!(s.store().proposal(&ids[0]).unwrap().thumbs_up(), 0);
        let stored = s.persistence().load().unwrap();
        assert_eq!(stored.proposals[0].thumbs_up(), 0);

        assert!(s.open_discussion(&ids[0]));
        assert!(s.comment("Bra idé").is_err());
        assert!(s.store().proposal(&ids[0]).unwrap().comments.is_empty());
        assert!(s.back());

        assert!(s.open_create());
        assert!(s.submit_proposal("D", "d").is_err());
        assert_eq!(s.view(), View::CreateProposal);
        assert_eq!(s.store().proposals().len(), 3);
        assert!(s.back());

        assert!(s.promote().is_err());
        assert!(s.store().top_three().is_empty());
        assert!(s.store().can_promote());

        // the same actions go through once the backend recovers
        fail(&s, false);
        assert!(s.upvote(&ids[0]).unwrap());
        assert!(s.promote().unwrap());
        assert!(s.open_vote());

        fail(&s, true);
        assert!(s.vote(&ids[0], VoteChoice::Yes).is_err());
        assert!(s.store().votes().is_empty());
        assert!(!s.store().has_voted(&ids[0], &s.current_user().unwrap().id));

        fail(&s, false);
        assert!(s.vote(&ids[0], VoteChoice::Yes).unwrap());
        let stored = s.persistence().load().unwrap();
        assert_eq!(stored.votes.len(), 1);
        assert_eq!(stored.proposals[0].thumbs_up(), 1);
    }

    #[test]
    fn failed_registration_keeps_welcome() {
        let store = FailingStore::default();
        store.fail.set(true);
        let mut s = Session::start(Persistence::new(store)).unwrap();

        assert!(s.register("Anna").is_err());
        assert!(s.current_user().is_none());
        assert_eq!(s.view(), View::Welcome);
    }

    #[test]
    fn actions_outside_their_view_do_nothing() {
        let mut s = registered("Anna");
        let pid = propose(&mut s, "A");
        assert!(!s.submit_proposal("B", "b").unwrap());
        assert!(!s.comment("hej").unwrap());
        assert!(!s.vote(&pid, VoteChoice::Yes).unwrap());
        assert!(!s.register("Björn").unwrap());
        assert_eq!(s.store().proposals().len(), 1);
    }
}
