//! Presentation-facing controller for Equal Democracy.
//!
//! Owns the participation store, the persistence adapter and the screen
//! state (current view, selected proposal). Front-ends render `Screen`s and
//! call the navigation/action methods; every accepted write is persisted
//! before the method returns.

pub mod screens;
pub mod session;
pub mod view;

pub use screens::{BallotEntry, DiscussScreen, HomeScreen, ProposalCard, Screen, VoteScreen};
pub use session::Session;
pub use view::View;
