use std::fmt;

use hosting_core::{Generation, ViewClass};

use crate::ViewId;

/// A failed operation on a view container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    Missing { id: ViewId },
    ClassMismatch { id: ViewId, expected: ViewClass },
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::Missing { id } => write!(f, "view {id} missing"),
            ViewError::ClassMismatch { id, expected } => {
                write!(f, "view {id} is not a {expected}")
            }
        }
    }
}

impl std::error::Error for ViewError {}

/// Why a build result was not mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountError {
    /// The result is older than the one already applied.
    Stale {
        generation: Generation,
        last_applied: Generation,
    },
    View(ViewError),
}

impl fmt::Display for MountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountError::Stale {
                generation,
                last_applied,
            } => write!(
                f,
                "generation {generation} is older than applied generation {last_applied}"
            ),
            MountError::View(err) => write!(f, "view container error: {err}"),
        }
    }
}

impl std::error::Error for MountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MountError::Stale { .. } => None,
            MountError::View(err) => Some(err),
        }
    }
}

impl From<ViewError> for MountError {
    fn from(err: ViewError) -> Self {
        MountError::View(err)
    }
}
