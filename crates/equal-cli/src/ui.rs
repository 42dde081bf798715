use std::io::{BufRead, Write};

use anyhow::Result;
use equal_db::KeyValueStore;
use equal_session::{Screen, Session, View};
use equal_types::{ProposalId, VoteChoice};
use tracing::debug;

use crate::render;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Quit,
    About,
    Back,
    Text(String),
    New,
    Upvote(usize),
    Discuss(usize),
    Promote,
    OpenVote,
    Vote(usize, VoteChoice),
    Unknown,
}

/// Read commands line by line until `quit` or end of input, redrawing the
/// current screen before every prompt.
pub fn run<S, R, W>(session: &mut Session<S>, input: R, out: &mut W) -> Result<()>
where
    S: KeyValueStore,
    R: BufRead,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        render::screen(out, &session.screen())?;
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;

        let command = parse(session.view(), &line);
        debug!(view = %session.view(), ?command, "Command");

        match command {
            Command::Quit => break,
            Command::About => note(out, session.show_about(), "About is not available here")?,
            Command::Back => note(out, session.back(), "Nothing to go back to")?,
            Command::Text(text) => text_input(session, &mut lines, out, &text)?,
            Command::New => note(out, session.open_create(), "Cannot create a proposal here")?,
            Command::Upvote(n) => {
                let result = match pick(session, n) {
                    Some(id) => session.upvote(&id),
                    None => Ok(false),
                };
                report(out, result, "No upvote: unknown proposal or already upvoted")?;
            }
            Command::Discuss(n) => {
                let opened = pick(session, n).is_some_and(|id| session.open_discussion(&id));
                note(out, opened, "No such proposal")?;
            }
            Command::Promote => report(
                out,
                session.promote(),
                "Promotion needs at least 3 active proposals and happens once",
            )?,
            Command::OpenVote => note(out, session.open_vote(), "Voting has not started yet")?,
            Command::Vote(n, choice) => {
                let result = match pick(session, n) {
                    Some(id) => session.vote(&id, choice),
                    None => Ok(false),
                };
                report(out, result, "No vote: unknown proposal or already voted")?;
            }
            Command::Unknown => writeln!(out, "Unknown command")?,
        }
    }
    Ok(())
}

/// Free text means a name on the welcome screen, a title on the create
/// screen (the description is read next) and a comment in a discussion.
fn text_input<S, B, W>(
    session: &mut Session<S>,
    lines: &mut std::io::Lines<B>,
    out: &mut W,
    text: &str,
) -> Result<()>
where
    S: KeyValueStore,
    B: BufRead,
    W: Write,
{
    match session.view() {
        View::Welcome => report(out, session.register(text), "Please enter your name"),
        View::CreateProposal => {
            write!(out, "Description: ")?;
            out.flush()?;
            let description = match lines.next() {
                Some(line) => line?,
                None => return Ok(()),
            };
            report(
                out,
                session.submit_proposal(text, &description),
                "Title and description are both required",
            )
        }
        View::Discuss => report(out, session.comment(text), "Empty comment"),
        _ => Ok(writeln!(out, "Unknown command")?),
    }
}

/// Prefix that makes a line literal text on the text-entry screens, so a
/// name or comment can be one of the command words.
const LITERAL: char = '\\';

fn parse(view: View, line: &str) -> Command {
    let line = line.trim();
    if let (View::Welcome | View::CreateProposal | View::Discuss, Some(text)) =
        (view, line.strip_prefix(LITERAL))
    {
        return Command::Text(text.to_string());
    }
    let mut words = line.split_whitespace();
    let head = words.next().unwrap_or("").to_ascii_lowercase();
    let index = words.next().and_then(|w| w.parse::<usize>().ok());

    match (view, head.as_str(), index) {
        (_, "quit", None) => Command::Quit,
        (View::Welcome | View::Home, "about", None) => Command::About,
        (View::About, _, _) => Command::Back,
        (_, "back", None) => Command::Back,
        (View::Home, "new", None) => Command::New,
        (View::Home, "up", Some(n)) => Command::Upvote(n),
        (View::Home, "discuss", Some(n)) => Command::Discuss(n),
        (View::Home, "promote", None) => Command::Promote,
        (View::Home, "vote", None) => Command::OpenVote,
        (View::Vote, "yes", Some(n)) => Command::Vote(n, VoteChoice::Yes),
        (View::Vote, "no", Some(n)) => Command::Vote(n, VoteChoice::No),
        (View::Welcome | View::CreateProposal | View::Discuss, _, _) => {
            Command::Text(line.to_string())
        }
        _ => Command::Unknown,
    }
}

/// Resolve a 1-based list number on the current screen to a proposal.
fn pick<S: KeyValueStore>(session: &Session<S>, n: usize) -> Option<ProposalId> {
    let index = n.checked_sub(1)?;
    match session.screen() {
        Screen::Home(home) => home.proposals.get(index).map(|c| c.id.clone()),
        Screen::Vote(vote) => vote.ballots.get(index).map(|b| b.proposal.id.clone()),
        _ => None,
    }
}

/// Like `note`, but a storage failure is shown instead of ending the session.
/// The session has already rolled the change back.
fn report<W: Write>(out: &mut W, result: Result<bool>, reason: &str) -> Result<()> {
    match result {
        Ok(applied) => note(out, applied, reason),
        Err(e) => Ok(writeln!(out, "(Not saved: {e})")?),
    }
}

fn note<W: Write>(out: &mut W, applied: bool, reason: &str) -> Result<()> {
    if !applied {
        writeln!(out, "({reason})")?;
    }
    Ok(())
}
