use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unique identifier for a toast. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToastId(pub u64);

impl ToastId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackMode {
    #[default]
    Collapsed,
    Expanded,
}

impl StackMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StackMode::Collapsed => "collapsed",
            StackMode::Expanded => "expanded",
        }
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self, StackMode::Expanded)
    }
}

impl fmt::Display for StackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screen edge the stack grows from. Toasts arrive from (and leave towards) this edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryEdge {
    #[default]
    Top,
    Bottom,
}

impl EntryEdge {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryEdge::Top => "top",
            EntryEdge::Bottom => "bottom",
        }
    }

    /// Sign applied to offsets that move a toast off the stack through this edge.
    pub fn outward(&self) -> f64 {
        match self {
            EntryEdge::Top => -1.0,
            EntryEdge::Bottom => 1.0,
        }
    }
}

impl FromStr for EntryEdge {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(EntryEdge::Top),
            "bottom" => Ok(EntryEdge::Bottom),
            _ => Err(format!("Invalid entry edge: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToastPhase {
    #[default]
    Active,
    /// Close requested; the record stays in the store until the grace period ends.
    Removing,
}

/// Position, scale and opacity an item animates from or to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe {
    pub offset: f64,
    pub scale: f64,
    pub opacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToastGeometry {
    pub id: ToastId,
    pub vertical_offset: f64,
    pub scale: f64,
    /// Higher ranks paint above lower ones. The frontmost toast has the highest rank.
    pub z_index_rank: usize,
    pub is_frontmost: bool,
    pub enter: Keyframe,
    pub exit: Keyframe,
}

/// Transient per-item interaction state, kept next to the record it belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ToastState {
    pub phase: ToastPhase,
    pub hovered: bool,
    /// Geometry captured when the close was requested.
    pub frozen: Option<ToastGeometry>,
}

impl ToastState {
    pub fn is_removing(&self) -> bool {
        self.phase == ToastPhase::Removing
    }
}

#[derive(Debug, Clone)]
pub struct ToastRecord<T> {
    pub id: ToastId,
    pub content: T,
    pub state: ToastState,
}

impl<T> ToastRecord<T> {
    /// Insertion sequence number. Ids are handed out in creation order.
    pub fn created_order(&self) -> u64 {
        self.id.get()
    }
}

/// Read model entry for one toast, in insertion order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToastView<'a, T> {
    pub id: ToastId,
    pub content: &'a T,
    pub phase: ToastPhase,
    pub visible: bool,
    pub show_close: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<ToastGeometry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackView<'a, T> {
    pub revision: u64,
    pub mode: StackMode,
    pub hovered: bool,
    pub container_extent: f64,
    pub toasts: Vec<ToastView<'a, T>>,
}

impl<T> StackView<'_, T> {
    pub fn visible_count(&self) -> usize {
        self.toasts.iter().filter(|t| t.visible).count()
    }

    pub fn geometry(&self, id: ToastId) -> Option<&ToastGeometry> {
        self.toasts
            .iter()
            .find(|t| t.id == id)
            .and_then(|t| t.geometry.as_ref())
    }
}

/// Observable changes, published to subscribers of a stack controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum StackEvent {
    Added { id: ToastId },
    Closing { id: ToastId },
    Removed { id: ToastId },
    Cleared { count: usize },
    ModeChanged { mode: StackMode },
    HoverChanged { hovered: bool },
    ToastHoverChanged { id: ToastId, hovered: bool },
    HeightChanged { id: ToastId, height: f64 },
    AutoDismissed,
}
