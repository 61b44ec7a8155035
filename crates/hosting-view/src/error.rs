use std::fmt;

use hosting_core::BuildError;
use hosting_mount::MountError;

#[derive(Debug)]
pub enum HostingError {
    /// The build failed; the previously mounted hierarchy stays in place.
    Build(BuildError),
    Mount(MountError),
    /// A rebuild was requested before any model was set.
    NoModel,
}

impl fmt::Display for HostingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostingError::Build(err) => write!(f, "build failed: {err}"),
            HostingError::Mount(err) => write!(f, "mount failed: {err}"),
            HostingError::NoModel => write!(f, "no model has been set"),
        }
    }
}

impl std::error::Error for HostingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HostingError::Build(err) => Some(err),
            HostingError::Mount(err) => Some(err),
            HostingError::NoModel => None,
        }
    }
}

impl From<BuildError> for HostingError {
    fn from(err: BuildError) -> Self {
        HostingError::Build(err)
    }
}

impl From<MountError> for HostingError {
    fn from(err: MountError) -> Self {
        HostingError::Mount(err)
    }
}
