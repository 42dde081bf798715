use std::fmt;

/// The six screens. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Welcome,
    About,
    Home,
    CreateProposal,
    Discuss,
    Vote,
}

impl View {
    pub fn name(self) -> &'static str {
        match self {
            View::Welcome => "welcome",
            View::About => "about",
            View::Home => "home",
            View::CreateProposal => "create-proposal",
            View::Discuss => "discuss",
            View::Vote => "vote",
        }
    }

    /// Views that only make sense once the device has an identity.
    pub fn needs_identity(self) -> bool {
        !matches!(self, View::Welcome | View::About)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
