// Main domain navigation logic

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::spatial::{next_index, NavStep};
use super::types::*;
use crate::config::ShellConfig;
use crate::error::{ShellError, ShellResult};

/// Comparable copy of the whole registry, for debugging and tests
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrySnapshot {
    pub domains: BTreeMap<String, Domain>,
    pub active_domain: Option<String>,
    pub cursor: Option<CursorPosition>,
}

/// Main domain navigation state manager
pub struct DomainNavigator {
    domains: HashMap<String, Domain>,
    active_domain_id: Option<String>,
    cursor_position: Option<CursorPosition>,
    /// Cursor positions whose element was unregistered while focused.
    /// Restored when an element with the same id comes back (e.g. re-mount on resize).
    saved_cursor_positions: HashMap<String, CursorPosition>,
    fallback_domain: Option<String>,
    perpendicular_weight: f64,
}

impl DomainNavigator {
    pub fn new() -> Self {
        Self::with_config(&ShellConfig::default())
    }

    pub fn with_config(config: &ShellConfig) -> Self {
        Self {
            domains: HashMap::new(),
            active_domain_id: None,
            cursor_position: None,
            saved_cursor_positions: HashMap::new(),
            fallback_domain: config.fallback_domain.clone(),
            perpendicular_weight: config.perpendicular_weight,
        }
    }

    /// Register a new domain
    pub fn register_domain(
        &mut self,
        domain_id: String,
        parent_id: Option<String>,
        layout_mode: LayoutMode,
    ) -> ShellResult<()> {
        if self.domains.contains_key(&domain_id) {
            return Err(ShellError::duplicate("Domain", domain_id));
        }

        debug!(domain = %domain_id, parent = ?parent_id, layout = ?layout_mode, "register domain");

        let domain = Domain::new(domain_id.clone(), parent_id, layout_mode);
        self.domains.insert(domain_id.clone(), domain);

        if self.active_domain_id.is_none() {
            // Cursor follows once the first element registers
            self.active_domain_id = Some(domain_id);
        }

        Ok(())
    }

    /// Unregister a domain together with every element it owns.
    ///
    /// Returns the new cursor when the configured fallback domain took over.
    pub fn unregister_domain(&mut self, domain_id: &str) -> ShellResult<Option<CursorPosition>> {
        if self.domains.remove(domain_id).is_none() {
            return Err(ShellError::UnknownDomain(domain_id.to_string()));
        }
        self.saved_cursor_positions.remove(domain_id);
        debug!(domain = domain_id, "unregister domain");

        if self.active_domain_id.as_deref() != Some(domain_id) {
            return Ok(None);
        }

        self.active_domain_id = None;
        self.cursor_position = None;

        let Some(fallback) = self.fallback_domain.clone() else {
            return Ok(None);
        };
        let has_elements = self
            .domains
            .get(&fallback)
            .is_some_and(|d| d.element_count() > 0);
        if !has_elements {
            return Ok(None);
        }

        info!(lost = domain_id, fallback = %fallback, "active domain lost, falling back");
        self.active_domain_id = Some(fallback.clone());
        Ok(self.focus_index(&fallback, 0))
    }

    /// Register a button within a domain.
    ///
    /// Returns the cursor when it landed on the new button.
    pub fn register_button(
        &mut self,
        domain_id: String,
        button_id: String,
        bounds: Option<Rect>,
        order: usize,
    ) -> ShellResult<Option<CursorPosition>> {
        let domain = self
            .domains
            .get_mut(&domain_id)
            .ok_or_else(|| ShellError::UnknownDomain(domain_id.clone()))?;

        if domain.element_type_of(&button_id).is_some() {
            return Err(ShellError::duplicate("Button", button_id));
        }

        domain.buttons.push(ButtonElement {
            id: button_id.clone(),
            bounds,
            enabled: true,
            order,
        });
        // Stable sort keeps registration order among equal orders
        domain.buttons.sort_by_key(|b| b.order);

        debug!(
            domain = %domain_id,
            button = %button_id,
            order,
            buttons = domain.buttons.len(),
            "register button"
        );

        self.sync_current_index(&domain_id);
        Ok(self.after_element_registered(&domain_id, &button_id))
    }

    /// Unregister a button. Missing domains or buttons are ignored.
    pub fn unregister_button(&mut self, domain_id: &str, button_id: &str) {
        let Some(domain) = self.domains.get_mut(domain_id) else {
            debug!(domain = domain_id, button = button_id, "unregister button: no such domain");
            return;
        };
        let Some(index) = domain.buttons.iter().position(|b| b.id == button_id) else {
            debug!(domain = domain_id, button = button_id, "unregister button: no such button");
            return;
        };
        domain.buttons.remove(index);
        debug!(domain = domain_id, button = button_id, "unregister button");

        self.forget_focused_element(domain_id, button_id);
        self.sync_current_index(domain_id);
    }

    /// Update element bounds without unregistering (used during resize).
    /// Focus is never touched here.
    pub fn update_element_bounds(
        &mut self,
        domain_id: &str,
        element_id: &str,
        bounds: Option<Rect>,
    ) -> ShellResult<()> {
        let domain = self
            .domains
            .get_mut(domain_id)
            .ok_or_else(|| ShellError::UnknownDomain(domain_id.to_string()))?;

        if let Some(button) = domain.buttons.iter_mut().find(|b| b.id == element_id) {
            button.bounds = bounds;
        } else if let Some(gate) = domain.gates.iter_mut().find(|g| g.id == element_id) {
            gate.bounds = bounds;
        } else {
            return Err(ShellError::unknown_element(domain_id, element_id));
        }
        Ok(())
    }

    pub fn set_button_enabled(
        &mut self,
        domain_id: &str,
        button_id: &str,
        enabled: bool,
    ) -> ShellResult<()> {
        let domain = self
            .domains
            .get_mut(domain_id)
            .ok_or_else(|| ShellError::UnknownDomain(domain_id.to_string()))?;
        let button = domain
            .buttons
            .iter_mut()
            .find(|b| b.id == button_id)
            .ok_or_else(|| ShellError::unknown_element(domain_id, button_id))?;
        button.enabled = enabled;
        Ok(())
    }

    /// Register a gate within a domain
    pub fn register_gate(
        &mut self,
        gate_id: String,
        source_domain: String,
        target_domain: String,
        direction: GateDirection,
        entry_point: Option<usize>,
    ) -> ShellResult<Option<CursorPosition>> {
        let domain = self
            .domains
            .get_mut(&source_domain)
            .ok_or_else(|| ShellError::UnknownDomain(source_domain.clone()))?;

        if domain.element_type_of(&gate_id).is_some() {
            return Err(ShellError::duplicate("Gate", gate_id));
        }

        debug!(
            gate = %gate_id,
            source = %source_domain,
            target = %target_domain,
            ?direction,
            ?entry_point,
            "register gate"
        );

        domain.gates.push(GateElement {
            id: gate_id.clone(),
            bounds: None,
            target_domain,
            direction,
            entry_point,
        });

        self.sync_current_index(&source_domain);
        Ok(self.after_element_registered(&source_domain, &gate_id))
    }

    /// Unregister a gate. Missing domains or gates are ignored.
    pub fn unregister_gate(&mut self, domain_id: &str, gate_id: &str) {
        let Some(domain) = self.domains.get_mut(domain_id) else {
            return;
        };
        let Some(index) = domain.gates.iter().position(|g| g.id == gate_id) else {
            return;
        };
        domain.gates.remove(index);
        debug!(domain = domain_id, gate = gate_id, "unregister gate");

        self.forget_focused_element(domain_id, gate_id);
        self.sync_current_index(domain_id);
    }

    /// Set the active domain; the cursor moves to its first element, if any
    pub fn set_active_domain(&mut self, domain_id: &str) -> ShellResult<Option<CursorPosition>> {
        if !self.domains.contains_key(domain_id) {
            return Err(ShellError::UnknownDomain(domain_id.to_string()));
        }

        self.active_domain_id = Some(domain_id.to_string());
        self.cursor_position = None;

        Ok(self.focus_index(domain_id, 0))
    }

    /// Get current cursor position
    pub fn get_cursor_position(&self) -> Option<CursorPosition> {
        self.cursor_position.clone()
    }

    /// Get active domain ID
    pub fn get_active_domain_id(&self) -> Option<String> {
        self.active_domain_id.clone()
    }

    /// Explicitly set the cursor position (e.g. from mouse hover)
    pub fn set_cursor_position(
        &mut self,
        domain_id: &str,
        element_id: &str,
    ) -> ShellResult<CursorPosition> {
        let domain = self
            .domains
            .get(domain_id)
            .ok_or_else(|| ShellError::UnknownDomain(domain_id.to_string()))?;
        let index = domain
            .find_element_index(element_id)
            .ok_or_else(|| ShellError::unknown_element(domain_id, element_id))?;

        self.active_domain_id = Some(domain_id.to_string());
        self.focus_index(domain_id, index)
            .ok_or_else(|| ShellError::unknown_element(domain_id, element_id))
    }

    /// Handle one directional key press inside the active domain
    pub fn handle_directional_input(&mut self, direction: Direction) -> NavigationResult {
        let Some(active_domain_id) = self.active_domain_id.clone() else {
            return NavigationResult::NoActiveDomain;
        };

        let Some(domain) = self.domains.get(&active_domain_id) else {
            warn!(domain = %active_domain_id, "active domain missing from registry");
            return NavigationResult::NoActiveDomain;
        };

        if domain.element_count() == 0 {
            return NavigationResult::BoundaryReached { direction };
        }

        let current_index = self
            .cursor_position
            .as_ref()
            .filter(|cursor| cursor.domain_id == active_domain_id)
            .and_then(|cursor| domain.find_element_index(&cursor.element_id));

        let step = match current_index {
            Some(index) => next_index(
                &domain.layout_mode,
                &domain.element_bounds(),
                index,
                direction,
                self.perpendicular_weight,
            ),
            // Active domain without a focused element: any key lands on the first one
            None => NavStep::Next(0),
        };

        match step {
            NavStep::Next(index) => match self.focus_index(&active_domain_id, index) {
                Some(cursor) => self.arrival_result(cursor),
                None => NavigationResult::BoundaryReached { direction },
            },
            NavStep::Boundary => NavigationResult::BoundaryReached { direction },
            NavStep::Ignored => NavigationResult::Unchanged,
        }
    }

    /// Activate whatever the cursor sits on
    pub fn activate(&mut self) -> ShellResult<ActivationResult> {
        let cursor = self
            .cursor_position
            .clone()
            .ok_or(ShellError::NotAtFocusable)?;
        let domain = self
            .domains
            .get(&cursor.domain_id)
            .ok_or(ShellError::NotAtFocusable)?;

        match cursor.element_type {
            ElementType::Button => {
                let enabled = domain
                    .buttons
                    .iter()
                    .find(|b| b.id == cursor.element_id)
                    .is_some_and(|b| b.enabled);
                if !enabled {
                    return Err(ShellError::NotAtFocusable);
                }
                Ok(ActivationResult::ButtonActivate {
                    domain_id: cursor.domain_id,
                    element_id: cursor.element_id,
                })
            }
            ElementType::Gate => {
                let gate = domain
                    .gate(&cursor.element_id)
                    .ok_or(ShellError::NotAtFocusable)?;
                let target = gate.target_domain.clone();
                let entry_point = gate.entry_point.unwrap_or(0);
                self.enter_domain(&cursor.domain_id, &target, entry_point)
                    .map(ActivationResult::DomainSwitched)
            }
        }
    }

    /// Move the cursor into another domain at its first element
    pub fn switch_to_domain(&mut self, target_domain_id: &str) -> ShellResult<DomainSwitch> {
        let from_domain = self.active_domain_id.clone().unwrap_or_default();
        self.enter_domain(&from_domain, target_domain_id, 0)
    }

    fn enter_domain(
        &mut self,
        from_domain: &str,
        target_domain_id: &str,
        entry_point: usize,
    ) -> ShellResult<DomainSwitch> {
        let target = self
            .domains
            .get(target_domain_id)
            .ok_or_else(|| ShellError::UnknownDomain(target_domain_id.to_string()))?;

        // An empty target (or an entry past its end) leaves nothing to focus
        if target.get_element_at_index(entry_point).is_none() {
            return Err(ShellError::NotAtFocusable);
        }

        self.active_domain_id = Some(target_domain_id.to_string());
        let cursor = self
            .focus_index(target_domain_id, entry_point)
            .ok_or(ShellError::NotAtFocusable)?;

        info!(from = from_domain, to = target_domain_id, element = %cursor.element_id, "domain switched");

        Ok(DomainSwitch {
            from_domain: from_domain.to_string(),
            to_domain: target_domain_id.to_string(),
            new_element_id: cursor.element_id,
            new_element_type: cursor.element_type,
        })
    }

    /// Get domain information for debugging
    pub fn get_domain_info(&self, domain_id: &str) -> Option<Domain> {
        self.domains.get(domain_id).cloned()
    }

    /// Get all domain IDs, sorted
    pub fn get_all_domain_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.domains.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Update the layout mode of a domain
    pub fn update_layout_mode(&mut self, domain_id: &str, layout_mode: LayoutMode) -> ShellResult<()> {
        let domain = self
            .domains
            .get_mut(domain_id)
            .ok_or_else(|| ShellError::UnknownDomain(domain_id.to_string()))?;
        domain.layout_mode = layout_mode;
        Ok(())
    }

    /// Update domain bounds (for crossing between domains)
    pub fn update_domain_bounds(&mut self, domain_id: &str, bounds: Option<Rect>) -> ShellResult<()> {
        let domain = self
            .domains
            .get_mut(domain_id)
            .ok_or_else(|| ShellError::UnknownDomain(domain_id.to_string()))?;
        domain.bounds = bounds;
        Ok(())
    }

    /// Frames of non-empty domains, sorted by id
    pub fn domain_frames(&self) -> Vec<(String, Rect)> {
        let mut frames: Vec<(String, Rect)> = self
            .domains
            .values()
            .filter(|d| d.element_count() > 0)
            .filter_map(|d| d.bounds.map(|b| (d.id.clone(), b)))
            .collect();
        frames.sort_by(|a, b| a.0.cmp(&b.0));
        frames
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            domains: self
                .domains
                .iter()
                .map(|(id, d)| (id.clone(), d.clone()))
                .collect(),
            active_domain: self.active_domain_id.clone(),
            cursor: self.cursor_position.clone(),
        }
    }

    /// Put the cursor on the element at `index` of `domain_id`.
    /// Any remembered cursor for that domain is superseded.
    fn focus_index(&mut self, domain_id: &str, index: usize) -> Option<CursorPosition> {
        let domain = self.domains.get_mut(domain_id)?;
        let (element_type, element_id) = domain.get_element_at_index(index)?;
        domain.current_index = index;
        self.saved_cursor_positions.remove(domain_id);

        let cursor = CursorPosition {
            domain_id: domain_id.to_string(),
            element_id,
            element_type,
        };
        self.cursor_position = Some(cursor.clone());
        Some(cursor)
    }

    fn arrival_result(&self, cursor: CursorPosition) -> NavigationResult {
        if cursor.element_type == ElementType::Gate {
            let target = self
                .domains
                .get(&cursor.domain_id)
                .and_then(|d| d.gate(&cursor.element_id))
                .map(|g| g.target_domain.clone());
            if let Some(target_domain) = target {
                return NavigationResult::AtGate {
                    gate_id: cursor.element_id,
                    target_domain,
                };
            }
        }

        NavigationResult::CursorMoved {
            domain_id: cursor.domain_id,
            element_id: cursor.element_id,
            element_type: cursor.element_type,
        }
    }

    /// Restore a remembered cursor or auto-focus the first element
    fn after_element_registered(
        &mut self,
        domain_id: &str,
        element_id: &str,
    ) -> Option<CursorPosition> {
        if self.active_domain_id.as_deref() != Some(domain_id) {
            return None;
        }

        if let Some(saved) = self.saved_cursor_positions.get(domain_id) {
            if saved.element_id != element_id {
                // Waiting for the element the cursor was on
                return None;
            }
            let index = self.domains.get(domain_id)?.find_element_index(element_id)?;
            debug!(domain = domain_id, element = element_id, "restoring cursor");
            return self.focus_index(domain_id, index);
        }

        let cursor_in_domain = self
            .cursor_position
            .as_ref()
            .is_some_and(|c| c.domain_id == domain_id);
        if cursor_in_domain {
            return None;
        }

        // Only the element that sorts first gets focus automatically
        let index = self.domains.get(domain_id)?.find_element_index(element_id)?;
        if index != 0 {
            return None;
        }
        debug!(domain = domain_id, element = element_id, "focusing first element");
        self.focus_index(domain_id, 0)
    }

    fn forget_focused_element(&mut self, domain_id: &str, element_id: &str) {
        let focused = self
            .cursor_position
            .as_ref()
            .is_some_and(|c| c.domain_id == domain_id && c.element_id == element_id);
        if !focused {
            return;
        }
        if let Some(cursor) = self.cursor_position.take() {
            debug!(domain = domain_id, element = element_id, "saving cursor of removed element");
            self.saved_cursor_positions
                .insert(domain_id.to_string(), cursor);
        }
    }

    fn sync_current_index(&mut self, domain_id: &str) {
        let cursor_element = self
            .cursor_position
            .as_ref()
            .filter(|c| c.domain_id == domain_id)
            .map(|c| c.element_id.clone());
        if let Some(domain) = self.domains.get_mut(domain_id) {
            domain.current_index = cursor_element
                .and_then(|id| domain.find_element_index(&id))
                .unwrap_or(0);
        }
    }
}

impl Default for DomainNavigator {
    fn default() -> Self {
        Self::new()
    }
}
