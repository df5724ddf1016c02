// Error taxonomy shared by the navigator, the compositor and the command surface

use serde::{Serialize, Serializer};

use crate::state::window::WindowState;

/// Every failure is local and synchronous; a rejected command leaves state untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShellError {
    #[error("{kind} '{id}' already exists")]
    DuplicateId { kind: &'static str, id: String },
    #[error("Domain '{0}' not found")]
    UnknownDomain(String),
    #[error("Element '{element_id}' not found in domain '{domain_id}'")]
    UnknownElement {
        domain_id: String,
        element_id: String,
    },
    #[error("Window '{0}' not found")]
    UnknownWindow(String),
    #[error("No available slots - both compositor slots are occupied")]
    NoSlotAvailable,
    #[error("Cursor is not on a focusable element")]
    NotAtFocusable,
    #[error("Window '{id}' cannot move from {from:?} to {to:?}")]
    InvalidWindowTransition {
        id: String,
        from: WindowState,
        to: WindowState,
    },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Another command currently holds the state lock.
    #[error("Navigation is busy with another command")]
    Busy,
}

pub type ShellResult<T> = Result<T, ShellError>;

impl ShellError {
    pub(crate) fn duplicate(kind: &'static str, id: impl Into<String>) -> Self {
        ShellError::DuplicateId {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn unknown_element(domain_id: impl Into<String>, element_id: impl Into<String>) -> Self {
        ShellError::UnknownElement {
            domain_id: domain_id.into(),
            element_id: element_id.into(),
        }
    }
}

// The display layer only ever shows the message, so errors cross the boundary as strings.
impl Serialize for ShellError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
