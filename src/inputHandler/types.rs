// Core data structures for domain navigation system

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ShellError;

/// Represents a spatial rectangle for positioning elements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the center point of the rectangle
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Directional input, derived from the W/A/S/D keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Get directional unit vector (screen coordinates, y grows downward)
    pub fn direction_vector(&self) -> (f64, f64) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl FromStr for Direction {
    type Err = ShellError;

    /// Accepts the raw WASD key as well as the direction name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "w" | "up" => Ok(Direction::Up),
            "s" | "down" => Ok(Direction::Down),
            "a" | "left" => Ok(Direction::Left),
            "d" | "right" => Ok(Direction::Right),
            _ => Err(ShellError::InvalidArgument(format!(
                "Invalid direction key: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layout mode for domain navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutMode {
    /// Grid layout with specified number of columns
    Grid { columns: usize },
    /// List layout (vertical or horizontal)
    List { direction: ListDirection },
    /// Free-form spatial layout using actual coordinates
    Spatial,
}

impl LayoutMode {
    /// Parse the display layer's layout name (`grid`, `list-vertical`, `list-horizontal`, `spatial`)
    pub fn parse(
        layout_mode: &str,
        grid_columns: Option<usize>,
        default_columns: usize,
    ) -> Result<Self, ShellError> {
        match layout_mode {
            "grid" => {
                let columns = grid_columns.unwrap_or(default_columns);
                if columns == 0 {
                    return Err(ShellError::InvalidArgument(
                        "Grid layout needs at least one column".to_string(),
                    ));
                }
                Ok(LayoutMode::Grid { columns })
            }
            "list-vertical" => Ok(LayoutMode::List {
                direction: ListDirection::Vertical,
            }),
            "list-horizontal" => Ok(LayoutMode::List {
                direction: ListDirection::Horizontal,
            }),
            "spatial" => Ok(LayoutMode::Spatial),
            _ => Err(ShellError::InvalidArgument(format!(
                "Unknown layout mode: {}",
                layout_mode
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListDirection {
    Vertical,
    Horizontal,
}

/// Direction of a gate (which edge of the domain)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateDirection {
    Top,
    Bottom,
    Left,
    Right,
}

impl FromStr for GateDirection {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top" => Ok(GateDirection::Top),
            "bottom" => Ok(GateDirection::Bottom),
            "left" => Ok(GateDirection::Left),
            "right" => Ok(GateDirection::Right),
            _ => Err(ShellError::InvalidArgument(format!(
                "Invalid gate direction: {}",
                s
            ))),
        }
    }
}

impl From<Direction> for GateDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => GateDirection::Top,
            Direction::Down => GateDirection::Bottom,
            Direction::Left => GateDirection::Left,
            Direction::Right => GateDirection::Right,
        }
    }
}

/// Type of navigable element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementType {
    Button,
    Gate,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Button => "Button",
            ElementType::Gate => "Gate",
        }
    }
}

/// A navigable button element within a domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonElement {
    pub id: String,
    pub bounds: Option<Rect>,
    pub enabled: bool,
    pub order: usize, // Sequential order for list/grid layouts
}

/// A gate element that moves the cursor into another domain when activated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateElement {
    pub id: String,
    pub bounds: Option<Rect>,
    pub target_domain: String,
    pub direction: GateDirection,
    pub entry_point: Option<usize>, // Index to enter in target domain
}

/// A domain containing navigable elements.
///
/// Buttons (sorted by `order`) come first in the navigation sequence, followed by
/// gates in registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub id: String,
    pub parent_id: Option<String>,
    pub buttons: Vec<ButtonElement>,
    pub gates: Vec<GateElement>,
    pub current_index: usize,
    pub layout_mode: LayoutMode,
    /// Screen frame of the whole domain, used when crossing between domains
    pub bounds: Option<Rect>,
}

impl Domain {
    pub fn new(id: String, parent_id: Option<String>, layout_mode: LayoutMode) -> Self {
        Self {
            id,
            parent_id,
            buttons: Vec::new(),
            gates: Vec::new(),
            current_index: 0,
            layout_mode,
            bounds: None,
        }
    }

    /// Get total number of navigable elements (buttons + gates)
    pub fn element_count(&self) -> usize {
        self.buttons.len() + self.gates.len()
    }

    /// Get element by index (buttons first, then gates)
    pub fn get_element_at_index(&self, index: usize) -> Option<(ElementType, String)> {
        if index < self.buttons.len() {
            Some((ElementType::Button, self.buttons[index].id.clone()))
        } else {
            let gate_index = index - self.buttons.len();
            self.gates
                .get(gate_index)
                .map(|g| (ElementType::Gate, g.id.clone()))
        }
    }

    /// Find index of element by ID
    pub fn find_element_index(&self, element_id: &str) -> Option<usize> {
        if let Some(pos) = self.buttons.iter().position(|b| b.id == element_id) {
            return Some(pos);
        }
        self.gates
            .iter()
            .position(|g| g.id == element_id)
            .map(|pos| self.buttons.len() + pos)
    }

    pub fn element_type_of(&self, element_id: &str) -> Option<ElementType> {
        if self.buttons.iter().any(|b| b.id == element_id) {
            Some(ElementType::Button)
        } else if self.gates.iter().any(|g| g.id == element_id) {
            Some(ElementType::Gate)
        } else {
            None
        }
    }

    pub fn gate(&self, gate_id: &str) -> Option<&GateElement> {
        self.gates.iter().find(|g| g.id == gate_id)
    }

    /// Bounds of every element in navigation order
    pub fn element_bounds(&self) -> Vec<Option<Rect>> {
        self.buttons
            .iter()
            .map(|b| b.bounds)
            .chain(self.gates.iter().map(|g| g.bounds))
            .collect()
    }
}

/// Current cursor position in the navigation system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub domain_id: String,
    pub element_id: String,
    pub element_type: ElementType,
}

/// A completed hand-off of the cursor from one domain to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSwitch {
    pub from_domain: String,
    pub to_domain: String,
    pub new_element_id: String,
    pub new_element_type: ElementType,
}

/// Result of a navigation action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NavigationResult {
    /// Cursor moved to new element
    CursorMoved {
        domain_id: String,
        element_id: String,
        element_type: ElementType,
    },
    /// Cursor now sits on a gate, ready to cross
    AtGate {
        gate_id: String,
        target_domain: String,
    },
    /// Hit boundary of domain; cursor unchanged
    BoundaryReached { direction: Direction },
    /// No active domain to navigate
    NoActiveDomain,
    /// The direction means nothing for this layout (orthogonal key in a list)
    Unchanged,
    /// A boundary policy handed the cursor to a neighbouring domain
    DomainSwitched(DomainSwitch),
}

/// Result of activating the focused element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActivationResult {
    /// The caller should run whatever behavior is bound to this button
    ButtonActivate {
        domain_id: String,
        element_id: String,
    },
    DomainSwitched(DomainSwitch),
}
