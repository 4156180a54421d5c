/// Visit state definitions for pages seen by a mirroring session
///
/// Every URL goes through `Unvisited → Visiting → {Saved, Skipped, Failed}`.
use crate::MirrorError;
use std::fmt;

/// Represents the state of a URL within one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitState {
    /// Not yet taken from the work stack
    Unvisited,

    /// Counted against the page budget and being rendered
    Visiting,

    /// Rendered, rewritten and written to disk
    Saved,

    /// Renderer could not produce markup (timeout, navigation error)
    Skipped,

    /// Any other error while processing the page
    Failed,
}

impl VisitState {
    /// Returns true if no further processing will happen for this URL
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Saved | Self::Skipped | Self::Failed)
    }

    /// Returns true if this URL is already in the visited set
    ///
    /// Membership means "fetch attempted or completed", not "succeeded".
    pub fn is_visited(&self) -> bool {
        !matches!(self, Self::Unvisited)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: VisitState) -> bool {
        matches!(
            (self, next),
            (Self::Unvisited, Self::Visiting)
                | (Self::Visiting, Self::Saved)
                | (Self::Visiting, Self::Skipped)
                | (Self::Visiting, Self::Failed)
        )
    }

    /// Performs a validated transition
    pub fn transition(self, next: VisitState) -> Result<VisitState, MirrorError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(MirrorError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unvisited => "unvisited",
            Self::Visiting => "visiting",
            Self::Saved => "saved",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for VisitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
