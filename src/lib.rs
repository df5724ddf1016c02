// Input handler module for domain-based keyboard navigation
#[path = "inputHandler/mod.rs"]
pub mod input_handler;

// Window/compositor state
pub mod state;

pub mod config;
pub mod error;
pub mod events;
pub mod shell;

// Tauri transport for the webview display layer
#[cfg(feature = "desktop")]
pub mod desktop;

pub use config::ShellConfig;
pub use error::{ShellError, ShellResult};
pub use events::{EventSink, ShellEvent, SoundCue};
pub use input_handler::{
    ActivationResult, BoundaryPolicy, CursorPosition, Direction, DomainSwitch, ElementType,
    GateDirection, LayoutMode, NavigationResult, Rect, SpatialAdjacency, Topology,
};
pub use shell::ShellCore;
pub use state::window::{CompositorSlot, WindowInstance, WindowState};

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber. `RUST_LOG` overrides `default_filter`.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
