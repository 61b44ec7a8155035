use std::fmt;

use crate::scope::ScopePath;

/// Error raised by a component provider.
pub type ProviderError = Box<dyn std::error::Error + Send + Sync>;

/// A malformed component tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// Two nodes claimed the same structural path within one build.
    DuplicatePath { path: ScopePath },
    /// The provider emitted no root node.
    NoRoot,
    /// The provider emitted more than one root node.
    MultipleRoots { extra: ScopePath },
    /// State was requested with a type other than the one already stored.
    StateTypeMismatch {
        path: ScopePath,
        expected: &'static str,
    },
    /// A controller was requested with a type other than the one already stored.
    ControllerTypeMismatch {
        path: ScopePath,
        expected: &'static str,
    },
    /// State or a controller was requested for a path that was never resolved.
    UnresolvedScope { path: ScopePath },
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralError::DuplicatePath { path } => {
                write!(f, "two nodes claim scope path {path}")
            }
            StructuralError::NoRoot => f.write_str("component provider emitted no root"),
            StructuralError::MultipleRoots { extra } => {
                write!(f, "component provider emitted a second root at {extra}")
            }
            StructuralError::StateTypeMismatch { path, expected } => {
                write!(f, "state at {path} is not a {expected}")
            }
            StructuralError::ControllerTypeMismatch { path, expected } => {
                write!(f, "controller at {path} is not a {expected}")
            }
            StructuralError::UnresolvedScope { path } => {
                write!(f, "scope {path} was used before being resolved")
            }
        }
    }
}

impl std::error::Error for StructuralError {}

/// Why a build produced no result.
#[derive(Debug)]
pub enum BuildError {
    Structural(StructuralError),
    Provider(ProviderError),
    ProviderPanicked(String),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Structural(err) => write!(f, "malformed component tree: {err}"),
            BuildError::Provider(err) => write!(f, "component provider failed: {err}"),
            BuildError::ProviderPanicked(message) => {
                write!(f, "component provider panicked: {message}")
            }
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Structural(err) => Some(err),
            BuildError::Provider(err) => Some(err.as_ref()),
            BuildError::ProviderPanicked(_) => None,
        }
    }
}

impl From<StructuralError> for BuildError {
    fn from(err: StructuralError) -> Self {
        BuildError::Structural(err)
    }
}
