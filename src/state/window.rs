use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ShellError;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum WindowState {
    /// Half-size window in its assigned slot
    Minimized,
    /// Full-size window spanning entire compositor
    Maximized,
    /// Window is hidden (not rendered)
    Hidden,
    /// Exit animation running; removed once the display layer confirms
    Closing,
}

impl WindowState {
    /// A closing window can only be hidden; every other move is allowed
    pub fn can_transition_to(self, next: WindowState) -> bool {
        match self {
            WindowState::Closing => matches!(next, WindowState::Closing | WindowState::Hidden),
            _ => true,
        }
    }
}

impl FromStr for WindowState {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Minimized" => Ok(WindowState::Minimized),
            "Maximized" => Ok(WindowState::Maximized),
            "Hidden" => Ok(WindowState::Hidden),
            "Closing" => Ok(WindowState::Closing),
            _ => Err(ShellError::InvalidArgument(format!(
                "Invalid window state: {}",
                s
            ))),
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum CompositorSlot {
    Left,
    Right,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct WindowInstance {
    pub id: String,              // Unique UUID
    pub content_key: String,     // What to render (e.g., "SYS_TERMINAL")
    pub title: String,           // Window Title
    pub state: WindowState,      // Minimized, Maximized, Hidden, Closing
    pub slot: CompositorSlot,    // Which slot this window occupies
    pub z_order: u32,            // Position in the creation/focus stack, 1-based
    pub source_element_id: Option<String>, // ID of element that spawned this window
    pub source_domain_id: Option<String>,  // ID of domain that spawned this window
}

impl WindowInstance {
    /// The (domain, element) pair focus should return to, when both were recorded
    pub fn focus_origin(&self) -> Option<(String, String)> {
        match (&self.source_domain_id, &self.source_element_id) {
            (Some(domain), Some(element)) => Some((domain.clone(), element.clone())),
            _ => None,
        }
    }
}
