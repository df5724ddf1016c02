// Command surface consumed by the display layer
//
// Navigation and window state share one lock because removing a window moves the
// cursor back to whatever spawned it. Events are published after the lock is released,
// in the same order the commands took the lock.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::config::ShellConfig;
use crate::error::{ShellError, ShellResult};
use crate::events::{ButtonActivatePayload, EventBus, EventSink, ReturnFocusPayload, ShellEvent};
use crate::input_handler::{
    ActivationResult, BoundaryPolicy, CursorPosition, Direction, Domain, DomainNavigator,
    GateDirection, LayoutMode, NavigationResult, Rect, RegistrySnapshot, Topology,
};
use crate::state::window::{CompositorSlot, WindowInstance, WindowState};
use crate::state::Compositor;

struct ShellState {
    navigator: DomainNavigator,
    compositor: Compositor,
}

impl ShellState {
    fn topology(&self) -> Topology {
        Topology {
            left: self
                .compositor
                .get_window_in_slot(CompositorSlot::Left)
                .cloned(),
            right: self
                .compositor
                .get_window_in_slot(CompositorSlot::Right)
                .cloned(),
            domain_frames: self.navigator.domain_frames(),
        }
    }
}

/// The navigation and compositor core, shareable across threads
pub struct ShellCore {
    state: Mutex<ShellState>,
    /// Held from state unlock until publish ends
    publish_order: Mutex<()>,
    events: EventBus,
    config: ShellConfig,
}

impl ShellCore {
    pub fn new(config: ShellConfig) -> Self {
        Self {
            state: Mutex::new(ShellState {
                navigator: DomainNavigator::with_config(&config),
                compositor: Compositor::with_config(&config),
            }),
            publish_order: Mutex::new(()),
            events: EventBus::new(config.event_capacity),
            config,
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShellEvent> {
        self.events.subscribe()
    }

    pub fn add_sink(&self, sink: Arc<dyn EventSink>) {
        self.events.add_sink(sink);
    }

    /// Run one command inside the critical section, then publish what it produced
    fn with_state<T>(&self, f: impl FnOnce(&mut ShellState, &mut Vec<ShellEvent>) -> T) -> T {
        let mut events = Vec::new();
        let (out, _order) = {
            let mut state = self.state.lock();
            let out = f(&mut *state, &mut events);
            (out, self.publish_order.lock())
        };
        self.events.publish(events);
        out
    }

    fn read<T>(&self, f: impl FnOnce(&ShellState) -> T) -> T {
        let state = self.state.lock();
        f(&*state)
    }

    // ===== Domain registry =====

    pub fn register_domain(
        &self,
        domain_id: &str,
        parent_domain: Option<String>,
        layout_mode: &str,
        grid_columns: Option<usize>,
    ) -> ShellResult<()> {
        let layout = LayoutMode::parse(layout_mode, grid_columns, self.config.default_grid_columns)?;
        self.with_state(|s, _| {
            s.navigator
                .register_domain(domain_id.to_string(), parent_domain, layout)
        })
        .inspect_err(|e| debug!(error = %e, "register_domain rejected"))
    }

    pub fn unregister_domain(&self, domain_id: &str) -> ShellResult<()> {
        self.with_state(|s, events| {
            if let Some(cursor) = s.navigator.unregister_domain(domain_id)? {
                events.push(ShellEvent::cursor_moved(cursor));
            }
            Ok(())
        })
        .inspect_err(|e| warn!(error = %e, "unregister_domain rejected"))
    }

    pub fn register_button(
        &self,
        domain_id: &str,
        button_id: &str,
        bounds: Option<Rect>,
        order: usize,
    ) -> ShellResult<()> {
        self.with_state(|s, events| {
            let focused = s.navigator.register_button(
                domain_id.to_string(),
                button_id.to_string(),
                bounds,
                order,
            )?;
            if let Some(cursor) = focused {
                events.push(ShellEvent::cursor_moved(cursor));
            }
            Ok(())
        })
        .inspect_err(|e| debug!(error = %e, "register_button rejected"))
    }

    pub fn unregister_button(&self, domain_id: &str, button_id: &str) {
        self.with_state(|s, _| s.navigator.unregister_button(domain_id, button_id));
    }

    /// Move a button (or gate) without touching focus; used on layout reflow
    pub fn update_button_bounds(
        &self,
        domain_id: &str,
        button_id: &str,
        bounds: Option<Rect>,
    ) -> ShellResult<()> {
        self.with_state(|s, _| s.navigator.update_element_bounds(domain_id, button_id, bounds))
    }

    pub fn set_button_enabled(&self, domain_id: &str, button_id: &str, enabled: bool) -> ShellResult<()> {
        self.with_state(|s, _| s.navigator.set_button_enabled(domain_id, button_id, enabled))
    }

    pub fn register_gate(
        &self,
        gate_id: &str,
        source_domain: &str,
        target_domain: &str,
        direction: GateDirection,
        entry_point: Option<usize>,
    ) -> ShellResult<()> {
        self.with_state(|s, events| {
            let focused = s.navigator.register_gate(
                gate_id.to_string(),
                source_domain.to_string(),
                target_domain.to_string(),
                direction,
                entry_point,
            )?;
            if let Some(cursor) = focused {
                events.push(ShellEvent::cursor_moved(cursor));
            }
            Ok(())
        })
        .inspect_err(|e| debug!(error = %e, "register_gate rejected"))
    }

    pub fn unregister_gate(&self, domain_id: &str, gate_id: &str) {
        self.with_state(|s, _| s.navigator.unregister_gate(domain_id, gate_id));
    }

    pub fn set_active_domain(&self, domain_id: &str) -> ShellResult<()> {
        self.with_state(|s, events| {
            if let Some(cursor) = s.navigator.set_active_domain(domain_id)? {
                events.push(ShellEvent::cursor_moved(cursor));
            }
            Ok(())
        })
    }

    pub fn get_active_domain(&self) -> Option<String> {
        self.read(|s| s.navigator.get_active_domain_id())
    }

    pub fn update_domain_layout(
        &self,
        domain_id: &str,
        layout_mode: &str,
        grid_columns: Option<usize>,
    ) -> ShellResult<()> {
        let layout = LayoutMode::parse(layout_mode, grid_columns, self.config.default_grid_columns)?;
        self.with_state(|s, _| s.navigator.update_layout_mode(domain_id, layout))
    }

    pub fn update_domain_bounds(&self, domain_id: &str, bounds: Option<Rect>) -> ShellResult<()> {
        self.with_state(|s, _| s.navigator.update_domain_bounds(domain_id, bounds))
    }

    // ===== Cursor =====

    pub fn get_cursor_position(&self) -> Option<CursorPosition> {
        self.read(|s| s.navigator.get_cursor_position())
    }

    /// Explicitly place the cursor (pointer hover)
    pub fn set_cursor_position(&self, domain_id: &str, element_id: &str) -> ShellResult<()> {
        self.with_state(|s, events| {
            let cursor = s.navigator.set_cursor_position(domain_id, element_id)?;
            events.push(ShellEvent::cursor_moved(cursor));
            Ok(())
        })
    }

    /// Re-announce the cursor, e.g. after the display layer reloads
    pub fn emit_cursor_position(&self) -> bool {
        self.with_state(|s, events| match s.navigator.get_cursor_position() {
            Some(cursor) => {
                events.push(ShellEvent::cursor_moved(cursor));
                true
            }
            None => false,
        })
    }

    pub fn handle_directional_input(&self, direction: Direction) -> NavigationResult {
        self.with_state(|s, events| {
            let result = s.navigator.handle_directional_input(direction);
            events.extend(ShellEvent::from_navigation(&result));
            result
        })
    }

    /// Like [`handle_directional_input`](Self::handle_directional_input) but drops the
    /// key instead of waiting when another command is in flight (key-repeat floods).
    pub fn try_handle_directional_input(&self, direction: Direction) -> ShellResult<NavigationResult> {
        let mut events = Vec::new();
        let (result, _order) = {
            let mut state = self.state.try_lock().ok_or(ShellError::Busy)?;
            let result = state.navigator.handle_directional_input(direction);
            events.extend(ShellEvent::from_navigation(&result));
            (result, self.publish_order.lock())
        };
        self.events.publish(events);
        Ok(result)
    }

    /// Directional input that crosses into a neighbouring domain when the policy names one
    pub fn navigate_with_policy<P>(&self, direction: Direction, policy: &P) -> NavigationResult
    where
        P: BoundaryPolicy + ?Sized,
    {
        self.with_state(|s, events| {
            let mut result = s.navigator.handle_directional_input(direction);

            if let NavigationResult::BoundaryReached { .. } = result {
                let neighbor = s.navigator.get_active_domain_id().and_then(|active| {
                    policy.neighbor(&active, direction, &s.topology())
                });
                if let Some(target) = neighbor {
                    match s.navigator.switch_to_domain(&target) {
                        Ok(switch) => result = NavigationResult::DomainSwitched(switch),
                        Err(e) => debug!(target = %target, error = %e, "boundary crossing refused"),
                    }
                }
            }

            events.extend(ShellEvent::from_navigation(&result));
            result
        })
    }

    pub fn activate(&self) -> ShellResult<ActivationResult> {
        self.with_state(|s, events| {
            let result = s.navigator.activate()?;
            match &result {
                ActivationResult::ButtonActivate {
                    domain_id,
                    element_id,
                } => events.push(ShellEvent::ButtonActivate(ButtonActivatePayload {
                    domain_id: domain_id.clone(),
                    element_id: element_id.clone(),
                })),
                ActivationResult::DomainSwitched(switch) => {
                    events.extend(ShellEvent::domain_switched(switch));
                }
            }
            Ok(result)
        })
        .inspect_err(|e| debug!(error = %e, "activate rejected"))
    }

    // ===== Read-only snapshots =====

    pub fn get_all_domains(&self) -> Vec<String> {
        self.read(|s| s.navigator.get_all_domain_ids())
    }

    pub fn debug_domain(&self, domain_id: &str) -> ShellResult<Domain> {
        self.read(|s| s.navigator.get_domain_info(domain_id))
            .ok_or_else(|| ShellError::UnknownDomain(domain_id.to_string()))
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.read(|s| s.navigator.snapshot())
    }

    // ===== Windows =====

    pub fn spawn_window(
        &self,
        content_key: &str,
        source_element_id: Option<String>,
        source_domain_id: Option<String>,
    ) -> ShellResult<WindowInstance> {
        self.with_state(|s, events| {
            let window = s.compositor.spawn_window(
                content_key.to_string(),
                source_element_id,
                source_domain_id,
            )?;
            events.push(ShellEvent::WindowCreated(window.clone()));
            Ok(window)
        })
        .inspect_err(|e| warn!(error = %e, "spawn_window rejected"))
    }

    pub fn set_window_state(&self, id: &str, new_state: WindowState) -> ShellResult<WindowInstance> {
        self.with_state(|s, events| {
            let window = s.compositor.set_window_state(id, new_state)?;
            events.push(ShellEvent::WindowStateChanged(window.clone()));
            Ok(window)
        })
    }

    /// Start closing: the window stays registered until [`remove_window`](Self::remove_window)
    pub fn close_window(&self, id: &str) -> ShellResult<()> {
        self.with_state(|s, events| {
            let window = s.compositor.close_window(id)?;
            events.push(ShellEvent::WindowStateChanged(window));
            Ok(())
        })
    }

    /// Finish closing after the exit animation and hand focus back to the spawner
    pub fn remove_window(&self, id: &str) -> ShellResult<()> {
        self.with_state(|s, events| {
            let removed = s.compositor.remove_window(id)?;
            events.push(ShellEvent::WindowClosed(removed.id.clone()));

            let Some((domain_id, element_id)) = removed.focus_origin() else {
                return Ok(());
            };
            events.push(ShellEvent::ReturnFocus(ReturnFocusPayload {
                domain_id: domain_id.clone(),
                element_id: element_id.clone(),
            }));

            match s.navigator.set_cursor_position(&domain_id, &element_id) {
                Ok(cursor) => events.push(ShellEvent::cursor_moved(cursor)),
                Err(e) => debug!(error = %e, "focus origin is gone, caller picks a fallback"),
            }
            Ok(())
        })
    }

    pub fn get_window(&self, id: &str) -> ShellResult<WindowInstance> {
        self.read(|s| s.compositor.get_window(id).cloned())
            .ok_or_else(|| ShellError::UnknownWindow(id.to_string()))
    }

    pub fn get_all_windows(&self) -> Vec<WindowInstance> {
        self.read(|s| s.compositor.get_all_windows())
    }

    pub fn window_topology(&self) -> Topology {
        self.read(|s| s.topology())
    }
}

impl Default for ShellCore {
    fn default() -> Self {
        Self::new(ShellConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_handler::{ElementType, SpatialAdjacency};

    fn drain(rx: &mut broadcast::Receiver<ShellEvent>) -> Vec<ShellEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    fn names(events: &[ShellEvent]) -> Vec<&'static str> {
        events.iter().map(|e| e.name()).collect()
    }

    fn osbar(core: &ShellCore) {
        core.register_domain("osbar-nav", None, "list-horizontal", None)
            .unwrap();
        for (i, id) in ["start", "terminal", "files"].iter().enumerate() {
            core.register_button("osbar-nav", id, None, i).unwrap();
        }
    }

    #[test]
    fn test_gate_crossing_emits_switch_then_cursor() {
        let core = ShellCore::default();
        core.register_domain("a", None, "list-vertical", None).unwrap();
        core.register_domain("b", None, "list-vertical", None).unwrap();
        for i in 0..3 {
            core.register_button("b", &format!("b-{}", i), None, i).unwrap();
        }
        core.register_gate("a-to-b", "a", "b", GateDirection::Right, Some(2))
            .unwrap();

        let mut rx = core.subscribe();
        core.set_cursor_position("a", "a-to-b").unwrap();
        let result = core.activate().unwrap();
        assert!(matches!(result, ActivationResult::DomainSwitched(_)));

        let events = drain(&mut rx);
        assert_eq!(
            names(&events),
            vec!["cursor-moved", "domain-switched", "cursor-moved"]
        );
        assert_eq!(events[2].payload()["element_id"], "b-2");
        assert_eq!(core.get_active_domain(), Some("b".to_string()));
        let cursor = core.get_cursor_position().unwrap();
        assert_eq!(cursor.element_id, "b-2");
        assert_eq!(cursor.element_type, ElementType::Button);
    }

    #[test]
    fn test_navigation_events() {
        let core = ShellCore::default();
        osbar(&core);
        let mut rx = core.subscribe();

        core.handle_directional_input(Direction::Right);
        core.handle_directional_input(Direction::Up);
        core.handle_directional_input(Direction::Right);
        core.handle_directional_input(Direction::Right);
        assert_eq!(
            names(&drain(&mut rx)),
            vec!["cursor-moved", "cursor-moved", "boundary-reached"]
        );

        core.activate().unwrap();
        let events = drain(&mut rx);
        assert_eq!(names(&events), vec!["button-activate"]);
        assert_eq!(events[0].payload()["element_id"], "files");
    }

    #[test]
    fn test_window_lifecycle_returns_focus() {
        let core = ShellCore::default();
        osbar(&core);
        core.set_cursor_position("osbar-nav", "terminal").unwrap();

        let left = core
            .spawn_window(
                "SYS_TERMINAL",
                Some("terminal".to_string()),
                Some("osbar-nav".to_string()),
            )
            .unwrap();
        let right = core.spawn_window("SYS_FILES", None, None).unwrap();
        assert_eq!(left.slot, CompositorSlot::Left);
        assert_eq!(right.slot, CompositorSlot::Right);
        assert_eq!(
            core.spawn_window("SYS_EXTRA", None, None),
            Err(ShellError::NoSlotAvailable)
        );

        // Focus wandered off meanwhile
        core.set_cursor_position("osbar-nav", "start").unwrap();

        let mut rx = core.subscribe();
        core.close_window(&left.id).unwrap();
        assert_eq!(core.get_window(&left.id).unwrap().state, WindowState::Closing);
        core.remove_window(&left.id).unwrap();

        let events = drain(&mut rx);
        assert_eq!(
            names(&events),
            vec!["window-state-changed", "window-closed", "return-focus", "cursor-moved"]
        );
        assert_eq!(events[1].payload(), serde_json::json!(left.id));
        assert_eq!(events[2].payload()["element_id"], "terminal");
        assert_eq!(core.get_cursor_position().unwrap().element_id, "terminal");

        let topology = core.window_topology();
        assert!(topology.left.is_none());
        assert_eq!(topology.right.map(|w| w.id), Some(right.id));

        let reopened = core.spawn_window("SYS_TERMINAL", None, None).unwrap();
        assert_eq!(reopened.slot, CompositorSlot::Left);
    }

    #[test]
    fn test_remove_without_origin_emits_no_return_focus() {
        let core = ShellCore::default();
        let win = core.spawn_window("SYS_FILES", None, None).unwrap();
        let mut rx = core.subscribe();
        core.close_window(&win.id).unwrap();
        core.remove_window(&win.id).unwrap();
        assert_eq!(
            names(&drain(&mut rx)),
            vec!["window-state-changed", "window-closed"]
        );
        assert_eq!(
            core.remove_window(&win.id),
            Err(ShellError::UnknownWindow(win.id.clone()))
        );
    }

    #[test]
    fn test_unregister_missing_leaves_registry_unchanged() {
        let core = ShellCore::default();
        osbar(&core);
        let before = core.snapshot();

        assert!(core.unregister_domain("ghost").is_err());
        core.unregister_button("osbar-nav", "ghost");
        core.unregister_button("ghost", "start");

        assert_eq!(before, core.snapshot());
    }

    #[test]
    fn test_policy_crosses_into_neighbour() {
        let core = ShellCore::default();
        osbar(&core);
        core.register_domain("window-left", None, "list-vertical", None)
            .unwrap();
        core.register_button("window-left", "min", None, 0).unwrap();
        core.update_domain_bounds("osbar-nav", Some(Rect::new(0.0, 0.0, 1200.0, 40.0)))
            .unwrap();
        core.update_domain_bounds("window-left", Some(Rect::new(0.0, 40.0, 600.0, 760.0)))
            .unwrap();

        let mut rx = core.subscribe();
        let result = core.navigate_with_policy(Direction::Down, &SpatialAdjacency::default());
        // Down is orthogonal to a horizontal list, so no boundary and no crossing
        assert_eq!(result, NavigationResult::Unchanged);

        core.set_cursor_position("window-left", "min").unwrap();
        drain(&mut rx);
        let result = core.navigate_with_policy(Direction::Up, &SpatialAdjacency::default());
        assert!(matches!(result, NavigationResult::DomainSwitched(ref s) if s.to_domain == "osbar-nav"));
        assert_eq!(
            names(&drain(&mut rx)),
            vec!["domain-switched", "cursor-moved"]
        );
        assert_eq!(core.get_cursor_position().unwrap().element_id, "start");
    }

    #[test]
    fn test_policy_declining_keeps_boundary() {
        let core = ShellCore::default();
        osbar(&core);
        let nowhere = |_: &str, _: Direction, _: &Topology| -> Option<String> { None };
        let result = core.navigate_with_policy(Direction::Left, &nowhere);
        assert_eq!(
            result,
            NavigationResult::BoundaryReached {
                direction: Direction::Left
            }
        );
    }

    #[test]
    fn test_try_input_rejects_while_busy() {
        let core = ShellCore::default();
        osbar(&core);
        {
            let _held = core.state.lock();
            assert_eq!(
                core.try_handle_directional_input(Direction::Right),
                Err(ShellError::Busy)
            );
        }
        assert!(matches!(
            core.try_handle_directional_input(Direction::Right),
            Ok(NavigationResult::CursorMoved { .. })
        ));
    }

    #[test]
    fn test_bounds_update_does_not_emit_or_move() {
        let core = ShellCore::default();
        osbar(&core);
        core.handle_directional_input(Direction::Right);
        let mut rx = core.subscribe();

        core.update_button_bounds("osbar-nav", "terminal", Some(Rect::new(10.0, 0.0, 40.0, 40.0)))
            .unwrap();
        assert!(drain(&mut rx).is_empty());
        assert_eq!(core.get_cursor_position().unwrap().element_id, "terminal");
    }

    #[test]
    fn test_gate_ids_must_be_unique() {
        let core = ShellCore::default();
        osbar(&core);
        core.register_gate("to-window", "osbar-nav", "window-left", GateDirection::Bottom, None)
            .unwrap();
        let before = core.snapshot();

        assert!(matches!(
            core.register_gate("to-window", "osbar-nav", "elsewhere", GateDirection::Top, None),
            Err(ShellError::DuplicateId { kind: "Gate", .. })
        ));
        // Buttons and gates share one id space per domain
        assert!(matches!(
            core.register_button("osbar-nav", "to-window", None, 9),
            Err(ShellError::DuplicateId { kind: "Button", .. })
        ));
        assert!(matches!(
            core.register_gate("start", "osbar-nav", "elsewhere", GateDirection::Top, None),
            Err(ShellError::DuplicateId { kind: "Gate", .. })
        ));

        assert_eq!(before, core.snapshot());
        let domain = core.debug_domain("osbar-nav").unwrap();
        assert_eq!(domain.gates[0].target_domain, "window-left");
    }

    #[test]
    fn test_fallback_domain_takeover_emits_cursor() {
        let core = ShellCore::new(ShellConfig {
            fallback_domain: Some("osbar-nav".to_string()),
            ..ShellConfig::default()
        });
        core.register_domain("window-left", None, "list-vertical", None)
            .unwrap();
        core.register_button("window-left", "min", None, 0).unwrap();
        osbar(&core);
        assert_eq!(core.get_active_domain(), Some("window-left".to_string()));

        let mut rx = core.subscribe();
        core.unregister_domain("window-left").unwrap();

        let events = drain(&mut rx);
        assert_eq!(names(&events), vec!["cursor-moved"]);
        assert_eq!(events[0].payload()["domain_id"], "osbar-nav");
        assert_eq!(events[0].payload()["element_id"], "start");
        assert_eq!(core.get_active_domain(), Some("osbar-nav".to_string()));
    }

    #[derive(Default)]
    struct LastCursor(Mutex<Option<String>>);

    impl EventSink for LastCursor {
        fn emit(&self, event: &ShellEvent) {
            if let ShellEvent::CursorMoved(p) = event {
                *self.0.lock() = Some(p.element_id.clone());
            }
        }
    }

    #[test]
    fn test_concurrent_input_publishes_in_lock_order() {
        let core = ShellCore::default();
        osbar(&core);
        let last = Arc::new(LastCursor::default());
        core.add_sink(last.clone());

        std::thread::scope(|scope| {
            for t in 0..4 {
                let core = &core;
                scope.spawn(move || {
                    for i in 0..200 {
                        let direction = if (i + t) % 2 == 0 {
                            Direction::Right
                        } else {
                            Direction::Left
                        };
                        core.handle_directional_input(direction);
                    }
                });
            }
        });

        // The display ends where the registry ends
        assert_eq!(
            last.0.lock().clone(),
            core.get_cursor_position().map(|c| c.element_id)
        );
    }

    #[test]
    fn test_bad_layout_rejected() {
        let core = ShellCore::default();
        assert!(matches!(
            core.register_domain("x", None, "diagonal", None),
            Err(ShellError::InvalidArgument(_))
        ));
        assert!(core.get_all_domains().is_empty());
    }
}
