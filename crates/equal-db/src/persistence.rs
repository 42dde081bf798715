use std::collections::HashSet;

use anyhow::Result;
use equal_types::{Proposal, User, Vote};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::KeyValueStore;
use crate::models::{ProposalRecord, UserRecord, VoteRecord};

pub const USER_KEY: &str = "ed_user";
pub const PROPOSALS_KEY: &str = "ed_proposals";
pub const VOTES_KEY: &str = "ed_votes";

/// Everything restored at startup. Missing or unreadable blobs come back
/// empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub identity: Option<User>,
    pub proposals: Vec<Proposal>,
    pub votes: Vec<Vote>,
}

/// Reads and writes the three participation blobs through a key-value store.
pub struct Persistence<S> {
    kv: S,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    /// Load all blobs. Each is independent: a corrupt proposal list does not
    /// cost the identity or the vote log. Only backend failures are errors.
    pub fn load(&self) -> Result<Snapshot> {
        let identity = self.read::<UserRecord>(USER_KEY)?.map(User::from);

        let proposals: Vec<Proposal> = self
            .read::<Vec<ProposalRecord>>(PROPOSALS_KEY)?
            .map(|records| records.into_iter().map(Proposal::from).collect())
            .unwrap_or_default();

        let votes = self
            .read::<Vec<VoteRecord>>(VOTES_KEY)?
            .map(|records| records.into_iter().map(Vote::from).collect())
            .and_then(one_ballot_each)
            .unwrap_or_default();

        info!(
            has_identity = identity.is_some(),
            proposals = proposals.len(),
            votes = votes.len(),
            "Participation data loaded"
        );

        Ok(Snapshot {
            identity,
            proposals,
            votes,
        })
    }

    pub fn save_identity(&self, user: &User) -> Result<()> {
        self.write(USER_KEY, &UserRecord::from(user))
    }

    pub fn save_proposals(&self, proposals: &[Proposal]) -> Result<()> {
        let records: Vec<ProposalRecord> = proposals.iter().map(ProposalRecord::from).collect();
        self.write(PROPOSALS_KEY, &records)
    }

    pub fn save_votes(&self, votes: &[Vote]) -> Result<()> {
        let records: Vec<VoteRecord> = votes.iter().map(VoteRecord::from).collect();
        self.write(VOTES_KEY, &records)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.kv.get(key)? else {
            debug!(key, "Nothing stored yet");
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, "Ignoring malformed stored data: {}", e);
                Ok(None)
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.kv.set(key, &json)?;
        debug!(key, bytes = json.len(), "Stored");
        Ok(())
    }
}

/// A vote log with two ballots from one user on one proposal cannot be
/// trusted: there is no way to tell which one counts.
fn one_ballot_each(votes: Vec<Vote>) -> Option<Vec<Vote>> {
    let mut seen = HashSet::new();
    for vote in &votes {
        if !seen.insert((&vote.proposal_id, &vote.user_id)) {
            warn!(
                proposal_id = %vote.proposal_id,
                user_id = %vote.user_id,
                "Stored vote log has duplicate ballots, ignoring it"
            );
            return None;
        }
    }
    Some(votes)
}
