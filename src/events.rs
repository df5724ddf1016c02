// Notifications emitted to the display layer after each command

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::input_handler::{CursorPosition, DomainSwitch, ElementType, NavigationResult};
use crate::state::window::WindowInstance;

// Event payload types for frontend communication
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorMovedPayload {
    pub domain_id: String,
    pub element_id: String,
    pub element_type: ElementType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtGatePayload {
    pub gate_id: String,
    pub target_domain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainSwitchedPayload {
    pub from_domain: String,
    pub to_domain: String,
    pub new_element_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryReachedPayload {
    pub direction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ButtonActivatePayload {
    pub domain_id: String,
    pub element_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnFocusPayload {
    pub domain_id: String,
    pub element_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShellEvent {
    CursorMoved(CursorMovedPayload),
    AtGate(AtGatePayload),
    DomainSwitched(DomainSwitchedPayload),
    BoundaryReached(BoundaryReachedPayload),
    ButtonActivate(ButtonActivatePayload),
    WindowCreated(WindowInstance),
    WindowStateChanged(WindowInstance),
    /// Carries only the removed window id
    WindowClosed(String),
    ReturnFocus(ReturnFocusPayload),
}

impl ShellEvent {
    /// Event name on the wire
    pub fn name(&self) -> &'static str {
        match self {
            ShellEvent::CursorMoved(_) => "cursor-moved",
            ShellEvent::AtGate(_) => "at-gate",
            ShellEvent::DomainSwitched(_) => "domain-switched",
            ShellEvent::BoundaryReached(_) => "boundary-reached",
            ShellEvent::ButtonActivate(_) => "button-activate",
            ShellEvent::WindowCreated(_) => "window-created",
            ShellEvent::WindowStateChanged(_) => "window-state-changed",
            ShellEvent::WindowClosed(_) => "window-closed",
            ShellEvent::ReturnFocus(_) => "return-focus",
        }
    }

    pub fn payload(&self) -> serde_json::Value {
        let value = match self {
            ShellEvent::CursorMoved(p) => serde_json::to_value(p),
            ShellEvent::AtGate(p) => serde_json::to_value(p),
            ShellEvent::DomainSwitched(p) => serde_json::to_value(p),
            ShellEvent::BoundaryReached(p) => serde_json::to_value(p),
            ShellEvent::ButtonActivate(p) => serde_json::to_value(p),
            ShellEvent::WindowCreated(w) | ShellEvent::WindowStateChanged(w) => {
                serde_json::to_value(w)
            }
            ShellEvent::WindowClosed(id) => Ok(serde_json::Value::String(id.clone())),
            ShellEvent::ReturnFocus(p) => serde_json::to_value(p),
        };
        value.unwrap_or(serde_json::Value::Null)
    }

    pub fn cursor_moved(cursor: CursorPosition) -> Self {
        ShellEvent::CursorMoved(CursorMovedPayload {
            domain_id: cursor.domain_id,
            element_id: cursor.element_id,
            element_type: cursor.element_type,
        })
    }

    /// `domain-switched` followed by the cursor update it implies
    pub fn domain_switched(switch: &DomainSwitch) -> [Self; 2] {
        [
            ShellEvent::DomainSwitched(DomainSwitchedPayload {
                from_domain: switch.from_domain.clone(),
                to_domain: switch.to_domain.clone(),
                new_element_id: switch.new_element_id.clone(),
            }),
            ShellEvent::CursorMoved(CursorMovedPayload {
                domain_id: switch.to_domain.clone(),
                element_id: switch.new_element_id.clone(),
                element_type: switch.new_element_type,
            }),
        ]
    }

    /// Events announcing a navigation result, in emission order
    pub fn from_navigation(result: &NavigationResult) -> Vec<Self> {
        match result {
            NavigationResult::CursorMoved {
                domain_id,
                element_id,
                element_type,
            } => vec![ShellEvent::CursorMoved(CursorMovedPayload {
                domain_id: domain_id.clone(),
                element_id: element_id.clone(),
                element_type: *element_type,
            })],
            NavigationResult::AtGate {
                gate_id,
                target_domain,
            } => vec![ShellEvent::AtGate(AtGatePayload {
                gate_id: gate_id.clone(),
                target_domain: target_domain.clone(),
            })],
            NavigationResult::BoundaryReached { direction } => {
                vec![ShellEvent::BoundaryReached(BoundaryReachedPayload {
                    direction: direction.to_string(),
                })]
            }
            NavigationResult::DomainSwitched(switch) => ShellEvent::domain_switched(switch).to_vec(),
            NavigationResult::NoActiveDomain | NavigationResult::Unchanged => Vec::new(),
        }
    }

    /// Cue for the audio mixer, if this event makes a sound
    pub fn sound_cue(&self) -> Option<SoundCue> {
        match self {
            ShellEvent::CursorMoved(_) | ShellEvent::AtGate(_) => Some(SoundCue::Nav),
            ShellEvent::ButtonActivate(_) => Some(SoundCue::Click),
            ShellEvent::DomainSwitched(p) => Some(SoundCue::DomainSwitch {
                domain_id: p.to_domain.clone(),
            }),
            ShellEvent::WindowStateChanged(_) => Some(SoundCue::Resize),
            _ => None,
        }
    }
}

/// Fire-and-forget requests for the audio mixer, which lives outside this crate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "cue", rename_all = "snake_case")]
pub enum SoundCue {
    Nav,
    Click,
    Resize,
    /// Switch sound plus a new ambience context for the entered domain
    DomainSwitch { domain_id: String },
}

/// Synchronous observer of shell events. Must not call back into the shell while emitting.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ShellEvent);
}

/// Fan-out of events to registered sinks and broadcast subscribers
pub struct EventBus {
    tx: broadcast::Sender<ShellEvent>,
    sinks: RwLock<Vec<Arc<dyn EventSink>>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            sinks: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShellEvent> {
        self.tx.subscribe()
    }

    pub fn add_sink(&self, sink: Arc<dyn EventSink>) {
        self.sinks.write().push(sink);
    }

    pub fn publish(&self, events: Vec<ShellEvent>) {
        if events.is_empty() {
            return;
        }
        let sinks = self.sinks.read().clone();
        for event in events {
            tracing::trace!(event = event.name(), "emit");
            for sink in &sinks {
                sink.emit(&event);
            }
            // No subscribers is fine
            let _ = self.tx.send(event);
        }
    }
}
