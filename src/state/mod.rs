use std::collections::HashMap;

use tracing::{info, warn};
use uuid::Uuid;

use self::window::{CompositorSlot, WindowInstance, WindowState};
use crate::config::ShellConfig;
use crate::error::{ShellError, ShellResult};

pub mod window;

/// Window registry with exactly two compositor slots
pub struct Compositor {
    windows: HashMap<String, WindowInstance>,
    window_stack: Vec<String>, // Ordered list of IDs for focus history
    left_slot: Option<String>,  // Window ID in left slot
    right_slot: Option<String>, // Window ID in right slot
    title_prefix: String,
}

impl Compositor {
    pub fn new() -> Self {
        Self::with_config(&ShellConfig::default())
    }

    pub fn with_config(config: &ShellConfig) -> Self {
        Self {
            windows: HashMap::new(),
            window_stack: Vec::new(),
            left_slot: None,
            right_slot: None,
            title_prefix: config.title_prefix.clone(),
        }
    }

    /// Spawn a new window in the first available slot (left, then right)
    pub fn spawn_window(
        &mut self,
        content_key: String,
        source_element_id: Option<String>,
        source_domain_id: Option<String>,
    ) -> ShellResult<WindowInstance> {
        let slot = if self.left_slot.is_none() {
            CompositorSlot::Left
        } else if self.right_slot.is_none() {
            CompositorSlot::Right
        } else {
            // Caller has to close a window first
            return Err(ShellError::NoSlotAvailable);
        };

        let id = Uuid::new_v4().to_string();
        let title = format!("{}{}", self.title_prefix, content_key);
        let z_order = (self.window_stack.len() as u32) + 1;

        let window = WindowInstance {
            id: id.clone(),
            content_key,
            title,
            state: WindowState::Minimized, // Default to half-size (Minimized)
            slot,
            z_order,
            source_element_id,
            source_domain_id,
        };

        match slot {
            CompositorSlot::Left => self.left_slot = Some(id.clone()),
            CompositorSlot::Right => self.right_slot = Some(id.clone()),
        }

        info!(window = %id, content = %window.content_key, ?slot, "window spawned");

        self.windows.insert(id.clone(), window.clone());
        self.window_stack.push(id);

        Ok(window)
    }

    /// Set window state (Minimized = half, Maximized = full, Hidden = not shown).
    ///
    /// Maximizing never evicts the other slot: the display layer hides it visually
    /// so its content keeps its internal state.
    pub fn set_window_state(&mut self, id: &str, new_state: WindowState) -> ShellResult<WindowInstance> {
        let win = self
            .windows
            .get_mut(id)
            .ok_or_else(|| ShellError::UnknownWindow(id.to_string()))?;

        if !win.state.can_transition_to(new_state) {
            return Err(ShellError::InvalidWindowTransition {
                id: id.to_string(),
                from: win.state,
                to: new_state,
            });
        }

        win.state = new_state;
        Ok(win.clone())
    }

    /// First half of closing: mark the window so its exit animation can run
    pub fn close_window(&mut self, id: &str) -> ShellResult<WindowInstance> {
        let window = self.set_window_state(id, WindowState::Closing)?;
        info!(window = id, "window closing");
        Ok(window)
    }

    /// Second half of closing: drop the window and free its slot
    pub fn remove_window(&mut self, id: &str) -> ShellResult<WindowInstance> {
        let removed = self
            .windows
            .remove(id)
            .ok_or_else(|| ShellError::UnknownWindow(id.to_string()))?;

        if removed.state != WindowState::Closing {
            warn!(window = id, state = ?removed.state, "removing window that was never closed");
        }

        if self.left_slot.as_deref() == Some(id) {
            self.left_slot = None;
        } else if self.right_slot.as_deref() == Some(id) {
            self.right_slot = None;
        }

        self.window_stack.retain(|x| x != id);
        self.normalize_stack();

        info!(window = id, slot = ?removed.slot, "window removed");
        Ok(removed)
    }

    /// Check if a slot is available
    pub fn is_slot_available(&self, slot: CompositorSlot) -> bool {
        match slot {
            CompositorSlot::Left => self.left_slot.is_none(),
            CompositorSlot::Right => self.right_slot.is_none(),
        }
    }

    /// Get window in a specific slot
    pub fn get_window_in_slot(&self, slot: CompositorSlot) -> Option<&WindowInstance> {
        let id = match slot {
            CompositorSlot::Left => self.left_slot.as_ref(),
            CompositorSlot::Right => self.right_slot.as_ref(),
        };
        id.and_then(|id| self.windows.get(id))
    }

    pub fn get_window(&self, id: &str) -> Option<&WindowInstance> {
        self.windows.get(id)
    }

    /// All windows, bottom of the stack first
    pub fn get_all_windows(&self) -> Vec<WindowInstance> {
        self.window_stack
            .iter()
            .filter_map(|id| self.windows.get(id))
            .cloned()
            .collect()
    }

    fn normalize_stack(&mut self) {
        for (i, win_id) in self.window_stack.iter().enumerate() {
            if let Some(win) = self.windows.get_mut(win_id) {
                win.z_order = (i as u32) + 1;
            }
        }
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(compositor: &mut Compositor, key: &str) -> ShellResult<WindowInstance> {
        compositor.spawn_window(
            key.to_string(),
            Some(format!("launch-{}", key)),
            Some("osbar-nav".to_string()),
        )
    }

    #[test]
    fn test_slots_fill_left_then_right() {
        let mut compositor = Compositor::new();
        let first = spawn(&mut compositor, "SYS_TERMINAL").unwrap();
        let second = spawn(&mut compositor, "SYS_FILES").unwrap();

        assert_eq!(first.slot, CompositorSlot::Left);
        assert_eq!(second.slot, CompositorSlot::Right);
        assert_eq!(first.state, WindowState::Minimized);
        assert_eq!(first.title, "Window - SYS_TERMINAL");
        assert_eq!((first.z_order, second.z_order), (1, 2));

        assert_eq!(
            spawn(&mut compositor, "SYS_EXTRA"),
            Err(ShellError::NoSlotAvailable)
        );
        assert_eq!(compositor.get_all_windows().len(), 2);
    }

    #[test]
    fn test_close_then_remove_frees_slot() {
        let mut compositor = Compositor::new();
        let left = spawn(&mut compositor, "A").unwrap();
        let right = spawn(&mut compositor, "B").unwrap();

        let closing = compositor.close_window(&left.id).unwrap();
        assert_eq!(closing.state, WindowState::Closing);
        // Still present until removed
        assert!(!compositor.is_slot_available(CompositorSlot::Left));

        let removed = compositor.remove_window(&left.id).unwrap();
        assert_eq!(
            removed.focus_origin(),
            Some(("osbar-nav".to_string(), "launch-A".to_string()))
        );
        assert!(compositor.is_slot_available(CompositorSlot::Left));
        assert_eq!(compositor.get_window(&right.id).unwrap().z_order, 1);

        let again = spawn(&mut compositor, "C").unwrap();
        assert_eq!(again.slot, CompositorSlot::Left);
    }

    #[test]
    fn test_maximize_keeps_other_window() {
        let mut compositor = Compositor::new();
        let left = spawn(&mut compositor, "A").unwrap();
        let right = spawn(&mut compositor, "B").unwrap();

        compositor
            .set_window_state(&left.id, WindowState::Maximized)
            .unwrap();
        assert!(compositor.get_window(&right.id).is_some());
        assert_eq!(
            compositor
                .get_window_in_slot(CompositorSlot::Right)
                .map(|w| w.id.clone()),
            Some(right.id)
        );
    }

    #[test]
    fn test_closing_window_cannot_reopen() {
        let mut compositor = Compositor::new();
        let win = spawn(&mut compositor, "A").unwrap();
        compositor.close_window(&win.id).unwrap();

        let result = compositor.set_window_state(&win.id, WindowState::Maximized);
        assert!(matches!(
            result,
            Err(ShellError::InvalidWindowTransition { .. })
        ));
        assert!(compositor
            .set_window_state(&win.id, WindowState::Hidden)
            .is_ok());
    }

    #[test]
    fn test_unknown_window() {
        let mut compositor = Compositor::new();
        assert_eq!(
            compositor.close_window("nope"),
            Err(ShellError::UnknownWindow("nope".to_string()))
        );
        assert_eq!(
            compositor.remove_window("nope"),
            Err(ShellError::UnknownWindow("nope".to_string()))
        );
        assert!(compositor
            .set_window_state("nope", WindowState::Hidden)
            .is_err());
    }

    #[test]
    fn test_window_without_origin() {
        let mut compositor = Compositor::new();
        let win = compositor
            .spawn_window("A".to_string(), Some("btn".to_string()), None)
            .unwrap();
        assert_eq!(win.focus_origin(), None);
    }

    #[test]
    fn test_window_state_parse() {
        assert_eq!("Closing".parse::<WindowState>().unwrap(), WindowState::Closing);
        assert!("closed".parse::<WindowState>().is_err());
    }
}
