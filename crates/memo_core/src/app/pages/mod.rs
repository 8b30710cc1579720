//! Headless page controllers.
//!
//! Each controller owns its form state, talks to services through the
//! shared `AppContext` and reports failures through the modal slot.

pub mod login;
pub mod memo;
pub mod profile;

use std::error::Error;
use std::fmt::{Display, Formatter};

pub use login::{LoginMode, LoginPage, SubmitOutcome};
pub use memo::MemoPage;
pub use profile::ProfilePage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageError {
    /// The page needs a signed-in user.
    NotSignedIn,
}

impl Display for PageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotSignedIn => write!(f, "page requires a signed-in user"),
        }
    }
}

impl Error for PageError {}
