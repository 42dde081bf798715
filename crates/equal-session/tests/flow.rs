use equal_db::{Database, Persistence};
use equal_session::{Screen, Session, View};
use equal_types::{ProposalId, VoteChoice, VoteResults};

fn open(path: &std::path::Path) -> Session<Database> {
    let db = Database::open(path).unwrap();
    Session::start(Persistence::new(db)).unwrap()
}

#[test]
fn state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("equal.db");

    let bikes: ProposalId;
    {
        let mut s = open(&path);
        assert_eq!(s.view(), View::Welcome);
        assert!(s.register("Anna").unwrap());

        assert!(s.open_create());
        assert!(s.submit_proposal("Fler cykelbanor", "Bygg fler cykelbanor").unwrap());
        bikes = s.store().proposals()[0].id.clone();

        assert!(s.upvote(&bikes).unwrap());
        assert!(s.open_discussion(&bikes));
        assert!(s.comment("Bra idé").unwrap());
        assert!(s.back());
    }

    let mut s = open(&path);
    assert_eq!(s.view(), View::Home);
    assert_eq!(s.current_user().unwrap().name, "Anna");

    let proposal = s.store().proposal(&bikes).unwrap();
    assert_eq!(proposal.thumbs_up(), 1);
    assert_eq!(proposal.comments.len(), 1);
    assert_eq!(proposal.comments[0].text, "Bra idé");

    // the restored voter set still blocks a second upvote
    assert!(!s.upvote(&bikes).unwrap());
}

#[test]
fn final_round_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("equal.db");

    let ids: Vec<ProposalId>;
    {
        let mut s = open(&path);
        s.register("Anna").unwrap();
        for title in ["Cykelbanor", "Park", "Bibliotek", "Badhus"] {
            assert!(s.open_create());
            assert!(s.submit_proposal(title, "Förslag").unwrap());
        }
        ids = s.store().proposals().iter().map(|p| p.id.clone()).collect();
        s.upvote(&ids[2]).unwrap();

        assert!(s.promote().unwrap());
        assert!(s.open_vote());
        assert!(s.vote(&ids[2], VoteChoice::Yes).unwrap());
    }

    let mut s = open(&path);
    assert!(!s.promote().unwrap());
    assert!(s.open_vote());
    assert!(!s.vote(&ids[2], VoteChoice::No).unwrap());

    let Screen::Vote(vote) = s.screen() else {
        panic!("expected vote screen")
    };
    assert_eq!(vote.ballots.len(), 3);
    assert_eq!(vote.ballots[0].proposal.id, ids[2]);
    assert_eq!(
        vote.ballots[0].results,
        Some(VoteResults { yes: 1, no: 0, total: 1 })
    );
    assert!(s.store().proposal(&ids[3]).unwrap().is_active());
}

#[test]
fn corrupt_proposals_start_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("equal.db");

    {
        let mut s = open(&path);
        s.register("Anna").unwrap();
        s.open_create();
        s.submit_proposal("Cykelbanor", "Förslag").unwrap();
    }
    {
        use equal_db::KeyValueStore;
        let db = Database::open(&path).unwrap();
        db.set(equal_db::PROPOSALS_KEY, "not json").unwrap();
    }

    let s = open(&path);
    assert_eq!(s.view(), View::Home);
    assert!(s.store().proposals().is_empty());
}
