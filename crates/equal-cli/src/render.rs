use std::io::{self, Write};

use equal_session::{BallotEntry, DiscussScreen, HomeScreen, ProposalCard, Screen, VoteScreen};

pub fn screen<W: Write>(out: &mut W, screen: &Screen) -> io::Result<()> {
    writeln!(out)?;
    match screen {
        Screen::Welcome => welcome(out),
        Screen::About { has_identity } => about(out, *has_identity),
        Screen::Home(home) => home_screen(out, home),
        Screen::CreateProposal => create(out),
        Screen::Discuss(discuss) => discuss_screen(out, discuss),
        Screen::Vote(vote) => vote_screen(out, vote),
    }
}

fn welcome<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "== Equal Democracy ==")?;
    writeln!(out, "Democracy in your city.")?;
    writeln!(out)?;
    writeln!(out, "What is your name? (or: about, quit; start with \\ to use one of those words as text)")
}

fn about<W: Write>(out: &mut W, has_identity: bool) -> io::Result<()> {
    writeln!(out, "== About Equal Democracy ==")?;
    writeln!(out, "Everyone can take part in the decisions that shape their city.")?;
    writeln!(out)?;
    writeln!(out, "  1. Propose ideas to improve the city")?;
    writeln!(out, "  2. Upvote the ideas you like")?;
    writeln!(out, "  3. Discuss the most popular proposals")?;
    writeln!(out, "  4. Vote yes or no on the top three")?;
    writeln!(out)?;
    let target = if has_identity { "home" } else { "welcome" };
    writeln!(out, "back - return to {target}")
}

fn home_screen<W: Write>(out: &mut W, home: &HomeScreen) -> io::Result<()> {
    writeln!(out, "== Hi {} ==", home.user_name)?;
    writeln!(out, "All proposals ({})", home.proposals.len())?;

    if home.proposals.is_empty() {
        writeln!(out, "  No proposals yet. Be the first!")?;
    }
    for (i, card) in home.proposals.iter().enumerate() {
        proposal_line(out, i + 1, card)?;
    }

    writeln!(out)?;
    write!(out, "new | up <n> | discuss <n>")?;
    if home.can_promote {
        write!(out, " | promote")?;
    }
    if home.voting_open {
        write!(out, " | vote")?;
    }
    writeln!(out, " | about | quit")
}

fn proposal_line<W: Write>(out: &mut W, n: usize, card: &ProposalCard) -> io::Result<()> {
    let mark = if card.upvoted { "*" } else { " " };
    writeln!(
        out,
        "{n:>3}. {} [{mark}{} up, {} comments] by {}",
        card.title, card.thumbs_up, card.comment_count, card.author_name
    )?;
    writeln!(out, "     {}", card.description)
}

fn create<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "== New proposal ==")?;
    writeln!(out, "Enter a title, then a description. (back to cancel, \\back for the word itself)")
}

fn discuss_screen<W: Write>(out: &mut W, discuss: &DiscussScreen) -> io::Result<()> {
    let card = &discuss.proposal;
    writeln!(out, "== {} ==", card.title)?;
    writeln!(out, "{}", card.description)?;
    writeln!(out, "by {} on {}", card.author_name, card.created_at.format("%Y-%m-%d"))?;
    writeln!(out)?;
    writeln!(out, "Discussion ({})", discuss.comments.len())?;

    if discuss.comments.is_empty() {
        writeln!(out, "  No comments yet.")?;
    }
    for comment in &discuss.comments {
        writeln!(
            out,
            "  {} ({}): {}",
            comment.author_name,
            comment.created_at.format("%Y-%m-%d"),
            comment.text
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Type a comment, or back (\\back to post the word itself)")
}

fn vote_screen<W: Write>(out: &mut W, vote: &VoteScreen) -> io::Result<()> {
    writeln!(out, "== Final vote ==")?;
    for (i, ballot) in vote.ballots.iter().enumerate() {
        ballot_line(out, i + 1, ballot)?;
    }
    writeln!(out)?;
    writeln!(out, "yes <n> | no <n> | back")
}

fn ballot_line<W: Write>(out: &mut W, n: usize, ballot: &BallotEntry) -> io::Result<()> {
    writeln!(out, "{n:>3}. {} ({} up)", ballot.proposal.title, ballot.proposal.thumbs_up)?;
    match ballot.results {
        Some(results) => writeln!(
            out,
            "     You have voted. {} votes: yes {} ({}%), no {} ({}%)",
            results.total,
            results.yes,
            results.yes_percent(),
            results.no,
            results.no_percent()
        ),
        None => writeln!(out, "     Not voted yet"),
    }
}
