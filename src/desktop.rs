// Tauri plugin carrying commands and events between the webview and the shell core

use std::sync::Arc;

use tauri::plugin::{Builder, TauriPlugin};
use tauri::{AppHandle, Emitter, Manager, Runtime, State};
use tauri_plugin_global_shortcut::{
    Code, GlobalShortcutExt, Modifiers, Shortcut, ShortcutEvent, ShortcutState,
};
use tracing::{debug, info, warn};

use crate::config::ShellConfig;
use crate::error::{ShellError, ShellResult};
use crate::events::{EventSink, ShellEvent};
use crate::input_handler::{
    ActivationResult, CursorPosition, Direction, Domain, GateDirection, NavigationResult, Rect,
};
use crate::shell::ShellCore;
use crate::state::window::{WindowInstance, WindowState};

/// Managed state: the one shell core shared by commands and shortcut handlers
pub struct DesktopState(pub Arc<ShellCore>);

/// Forwards shell events to the webview, plus sound cues for the audio mixer
struct WebviewSink<R: Runtime>(AppHandle<R>);

impl<R: Runtime> EventSink for WebviewSink<R> {
    fn emit(&self, event: &ShellEvent) {
        deliver(event.name(), self.0.emit(event.name(), event.payload()));
        if let Some(cue) = event.sound_cue() {
            deliver(SOUND_CUE_EVENT, self.0.emit(SOUND_CUE_EVENT, cue));
        }
    }
}

const SOUND_CUE_EVENT: &str = "sound-cue";

/// Log a failed webview emit; returns whether it went through
fn deliver<E: std::fmt::Display>(event: &str, result: Result<(), E>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(event, error = %e, "failed to emit to webview");
            false
        }
    }
}

#[derive(Clone, Copy)]
enum KeyAction {
    Move(Direction),
    Activate,
}

/// Shortcuts we want registered for navigation/activation (no modifiers)
const BINDINGS: [(Code, KeyAction); 6] = [
    (Code::KeyW, KeyAction::Move(Direction::Up)),
    (Code::KeyA, KeyAction::Move(Direction::Left)),
    (Code::KeyS, KeyAction::Move(Direction::Down)),
    (Code::KeyD, KeyAction::Move(Direction::Right)),
    (Code::Enter, KeyAction::Activate),
    (Code::Space, KeyAction::Activate),
];

fn shortcut_for(code: Code) -> Shortcut {
    Shortcut::new(Some(Modifiers::empty()), code)
}

fn handle_shortcut<R: Runtime>(app: &AppHandle<R>, shortcut: &Shortcut, event: ShortcutEvent) {
    // Only process on key press, not release
    if event.state != ShortcutState::Pressed {
        return;
    }

    let Some(action) = BINDINGS
        .iter()
        .find(|(code, _)| *shortcut == shortcut_for(*code))
        .map(|(_, action)| *action)
    else {
        return;
    };

    let shell = app.state::<DesktopState>();
    match action {
        KeyAction::Move(direction) => match shell.0.try_handle_directional_input(direction) {
            Ok(_) => {}
            Err(ShellError::Busy) => debug!(%direction, "key dropped, navigation busy"),
            Err(e) => warn!(error = %e, "directional input failed"),
        },
        KeyAction::Activate => {
            if let Err(e) = shell.0.activate() {
                debug!(error = %e, "activation ignored");
            }
        }
    }
}

// ===== Domain Navigation Commands =====

#[tauri::command]
fn register_domain(
    domain_id: String,
    parent_domain: Option<String>,
    layout_mode: String,
    grid_columns: Option<usize>,
    shell: State<'_, DesktopState>,
) -> ShellResult<()> {
    shell
        .0
        .register_domain(&domain_id, parent_domain, &layout_mode, grid_columns)
}

#[tauri::command]
fn unregister_domain(domain_id: String, shell: State<'_, DesktopState>) -> ShellResult<()> {
    shell.0.unregister_domain(&domain_id)
}

#[tauri::command]
fn register_button(
    domain_id: String,
    button_id: String,
    bounds: Option<Rect>,
    order: usize,
    shell: State<'_, DesktopState>,
) -> ShellResult<()> {
    shell.0.register_button(&domain_id, &button_id, bounds, order)
}

#[tauri::command]
fn unregister_button(domain_id: String, button_id: String, shell: State<'_, DesktopState>) {
    shell.0.unregister_button(&domain_id, &button_id);
}

/// Update button bounds without unregistering (used during resize)
#[tauri::command]
fn update_button_bounds(
    domain_id: String,
    button_id: String,
    bounds: Option<Rect>,
    shell: State<'_, DesktopState>,
) -> ShellResult<()> {
    shell.0.update_button_bounds(&domain_id, &button_id, bounds)
}

#[tauri::command]
fn set_button_enabled(
    domain_id: String,
    button_id: String,
    enabled: bool,
    shell: State<'_, DesktopState>,
) -> ShellResult<()> {
    shell.0.set_button_enabled(&domain_id, &button_id, enabled)
}

#[tauri::command]
fn register_gate(
    gate_id: String,
    source_domain: String,
    target_domain: String,
    direction: String,
    entry_point: Option<usize>,
    shell: State<'_, DesktopState>,
) -> ShellResult<()> {
    let direction: GateDirection = direction.parse()?;
    shell
        .0
        .register_gate(&gate_id, &source_domain, &target_domain, direction, entry_point)
}

#[tauri::command]
fn unregister_gate(domain_id: String, gate_id: String, shell: State<'_, DesktopState>) {
    shell.0.unregister_gate(&domain_id, &gate_id);
}

#[tauri::command]
fn set_active_domain(domain_id: String, shell: State<'_, DesktopState>) -> ShellResult<()> {
    shell.0.set_active_domain(&domain_id)
}

#[tauri::command]
fn get_active_domain(shell: State<'_, DesktopState>) -> Option<String> {
    shell.0.get_active_domain()
}

/// Directional input from the webview; accepts W/A/S/D or up/down/left/right
#[tauri::command]
fn handle_directional_input(
    key: String,
    shell: State<'_, DesktopState>,
) -> ShellResult<NavigationResult> {
    let direction: Direction = key.parse()?;
    Ok(shell.0.handle_directional_input(direction))
}

#[tauri::command]
fn activate(shell: State<'_, DesktopState>) -> ShellResult<ActivationResult> {
    shell.0.activate()
}

#[tauri::command]
fn get_cursor_position(shell: State<'_, DesktopState>) -> Option<CursorPosition> {
    shell.0.get_cursor_position()
}

/// Emit the current cursor position - useful for initial setup
#[tauri::command]
fn emit_cursor_position(shell: State<'_, DesktopState>) -> bool {
    shell.0.emit_cursor_position()
}

/// Set cursor position explicitly (e.g. from mouse hover)
#[tauri::command]
fn set_cursor_position(
    domain_id: String,
    element_id: String,
    shell: State<'_, DesktopState>,
) -> ShellResult<()> {
    shell.0.set_cursor_position(&domain_id, &element_id)
}

#[tauri::command]
fn get_all_domains(shell: State<'_, DesktopState>) -> Vec<String> {
    shell.0.get_all_domains()
}

#[tauri::command]
fn debug_domain(domain_id: String, shell: State<'_, DesktopState>) -> ShellResult<Domain> {
    shell.0.debug_domain(&domain_id)
}

#[tauri::command]
fn update_domain_layout(
    domain_id: String,
    layout_mode: String,
    grid_columns: Option<usize>,
    shell: State<'_, DesktopState>,
) -> ShellResult<()> {
    shell
        .0
        .update_domain_layout(&domain_id, &layout_mode, grid_columns)
}

/// Update domain bounds for crossing between domains
#[tauri::command]
fn update_domain_bounds(
    domain_id: String,
    bounds: Option<Rect>,
    shell: State<'_, DesktopState>,
) -> ShellResult<()> {
    shell.0.update_domain_bounds(&domain_id, bounds)
}

// ===== Window management commands =====

#[tauri::command]
fn spawn_window(
    content_key: String,
    source_element_id: Option<String>,
    source_domain_id: Option<String>,
    shell: State<'_, DesktopState>,
) -> ShellResult<WindowInstance> {
    shell
        .0
        .spawn_window(&content_key, source_element_id, source_domain_id)
}

#[tauri::command]
fn set_window_state(
    id: String,
    window_state: String,
    shell: State<'_, DesktopState>,
) -> ShellResult<WindowInstance> {
    let new_state: WindowState = window_state.parse()?;
    shell.0.set_window_state(&id, new_state)
}

#[tauri::command]
fn close_window(id: String, shell: State<'_, DesktopState>) -> ShellResult<()> {
    shell.0.close_window(&id)
}

#[tauri::command]
fn remove_window(id: String, shell: State<'_, DesktopState>) -> ShellResult<()> {
    shell.0.remove_window(&id)
}

#[tauri::command]
fn get_all_windows(shell: State<'_, DesktopState>) -> Vec<WindowInstance> {
    shell.0.get_all_windows()
}

/// Enable or disable global shortcuts (used to release bindings when window unfocused)
#[tauri::command]
fn set_global_shortcuts_enabled<R: Runtime>(app: AppHandle<R>, enabled: bool) -> Result<(), String> {
    // Start clean to avoid "already registered" errors
    app.global_shortcut()
        .unregister_all()
        .map_err(|e| format!("Failed to unregister shortcuts: {}", e))?;

    if !enabled {
        info!("global shortcuts disabled");
        return Ok(());
    }

    let mut registered = 0;
    let mut last_error = None;
    for (code, _) in BINDINGS {
        match app
            .global_shortcut()
            .on_shortcut(shortcut_for(code), handle_shortcut::<R>)
        {
            Ok(()) => registered += 1,
            Err(e) => {
                warn!(?code, error = %e, "failed to register shortcut");
                last_error = Some(e);
            }
        }
    }

    match (registered, last_error) {
        (0, Some(e)) => Err(format!("Failed to register any shortcuts: {}", e)),
        _ => {
            info!(registered, "global shortcuts enabled");
            Ok(())
        }
    }
}

/// Build the plugin. The host app must also install `tauri-plugin-global-shortcut`.
pub fn init<R: Runtime>(config: ShellConfig) -> TauriPlugin<R> {
    Builder::new("shell")
        .invoke_handler(tauri::generate_handler![
            register_domain,
            unregister_domain,
            register_button,
            unregister_button,
            update_button_bounds,
            set_button_enabled,
            register_gate,
            unregister_gate,
            set_active_domain,
            get_active_domain,
            handle_directional_input,
            activate,
            get_cursor_position,
            emit_cursor_position,
            set_cursor_position,
            get_all_domains,
            debug_domain,
            update_domain_layout,
            update_domain_bounds,
            spawn_window,
            set_window_state,
            close_window,
            remove_window,
            get_all_windows,
            set_global_shortcuts_enabled,
        ])
        .setup(move |app, _api| {
            let core = Arc::new(ShellCore::new(config));
            core.add_sink(Arc::new(WebviewSink(app.clone())));
            app.manage(DesktopState(core));
            // Shortcuts register when the webview gains focus, via set_global_shortcuts_enabled
            info!("shell navigation initialized");
            Ok(())
        })
        .build()
}
