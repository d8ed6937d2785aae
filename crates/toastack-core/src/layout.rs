//! Stack geometry.
//!
//! [`compute_layout`] is a pure function of the toast order, the display mode,
//! the known heights and the metrics. It keeps no state between calls, so the
//! same inputs always produce the same [`StackLayout`].
//!
//! Offsets are measured from the stack's anchor edge: 0 is the frontmost slot
//! and larger values sit further back (away from the edge the toasts arrive
//! from).

use serde::Serialize;

use crate::config::StackConfig;
use crate::heights::HeightLookup;
use crate::models::{EntryEdge, Keyframe, StackMode, ToastGeometry, ToastId};

/// Distance a new toast travels in from outside the stack.
pub const ARRIVAL_DISTANCE: f64 = 100.0;
/// Distance a leaving toast travels before it disappears.
pub const EXIT_DISTANCE: f64 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    pub max_visible: usize,
    pub collapsed_spacing: f64,
    pub expanded_spacing: f64,
    pub stack_reduction: f64,
    pub entry_edge: EntryEdge,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self::from(&StackConfig::default())
    }
}

/// Spacings are never negative.
fn spacing(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// The deepest collapsed slot must keep a non-negative scale.
fn stack_reduction(value: f64, max_visible: usize) -> f64 {
    let ceiling = 1.0 / max_visible.saturating_sub(1).max(1) as f64;
    if value.is_finite() {
        value.clamp(0.0, ceiling)
    } else {
        0.0
    }
}

impl From<&StackConfig> for LayoutMetrics {
    fn from(config: &StackConfig) -> Self {
        let max_visible = config.effective_max_visible();
        Self {
            max_visible,
            collapsed_spacing: spacing(config.collapsed_spacing()),
            expanded_spacing: spacing(config.expanded_spacing),
            stack_reduction: stack_reduction(config.stack_reduction, max_visible),
            entry_edge: config.entry_edge,
        }
    }
}

impl LayoutMetrics {
    fn cap(&self) -> usize {
        self.max_visible.max(1)
    }

    /// Collapsed scale for a toast `back_index` steps behind the front.
    pub fn back_scale(&self, back_index: usize) -> f64 {
        1.0 - back_index as f64 * self.stack_reduction
    }

    pub fn collapsed_offset(&self, back_index: usize) -> f64 {
        back_index as f64 * self.collapsed_spacing
    }

    /// The deepest slot still drawn while collapsed.
    pub fn last_collapsed_slot(&self) -> Keyframe {
        let rank = self.cap() - 1;
        Keyframe {
            offset: self.collapsed_offset(rank),
            scale: self.back_scale(rank),
            opacity: 1.0,
        }
    }

    pub fn arrival(&self) -> Keyframe {
        Keyframe {
            offset: self.entry_edge.outward() * ARRIVAL_DISTANCE,
            scale: 1.0,
            opacity: 0.0,
        }
    }

    pub fn departure(&self) -> Keyframe {
        Keyframe {
            offset: self.entry_edge.outward() * EXIT_DISTANCE,
            scale: self.last_collapsed_slot().scale,
            opacity: 0.0,
        }
    }

    /// Where a toast `back_index` steps from the front animates in from.
    ///
    /// Toasts past the collapsed cap only become visible by expanding, and they
    /// emerge from behind the last collapsed slot rather than from the edge.
    pub fn entry_origin(&self, back_index: usize) -> Keyframe {
        if back_index >= self.cap() {
            Keyframe {
                opacity: 0.0,
                ..self.last_collapsed_slot()
            }
        } else {
            self.arrival()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackLayout {
    /// Geometry for visible toasts, frontmost first.
    pub items: Vec<ToastGeometry>,
    pub container_extent: f64,
}

impl StackLayout {
    pub fn get(&self, id: ToastId) -> Option<&ToastGeometry> {
        self.items.iter().find(|g| g.id == id)
    }

    pub fn is_visible(&self, id: ToastId) -> bool {
        self.get(id).is_some()
    }

    pub fn visible_count(&self) -> usize {
        self.items.len()
    }
}

/// Lay out `order` (oldest first, frontmost last).
pub fn compute_layout(
    order: &[ToastId],
    mode: StackMode,
    heights: &impl HeightLookup,
    metrics: &LayoutMetrics,
) -> StackLayout {
    let Some(&front) = order.last() else {
        return StackLayout::default();
    };

    // A single toast has nothing to expand into.
    let mode = if order.len() <= 1 {
        StackMode::Collapsed
    } else {
        mode
    };

    match mode {
        StackMode::Collapsed => collapsed(order, heights.height(front), metrics),
        StackMode::Expanded => expanded(order, heights, metrics),
    }
}

fn collapsed(order: &[ToastId], front_height: f64, metrics: &LayoutMetrics) -> StackLayout {
    let count = order.len();
    let exit = metrics.departure();

    let items: Vec<ToastGeometry> = order
        .iter()
        .rev()
        .take(metrics.cap())
        .enumerate()
        .map(|(back_index, &id)| ToastGeometry {
            id,
            vertical_offset: metrics.collapsed_offset(back_index),
            scale: metrics.back_scale(back_index),
            z_index_rank: count - back_index,
            is_frontmost: back_index == 0,
            enter: metrics.entry_origin(back_index),
            exit,
        })
        .collect();

    let container_extent =
        front_height + (items.len() - 1) as f64 * metrics.collapsed_spacing;

    StackLayout {
        items,
        container_extent,
    }
}

fn expanded(
    order: &[ToastId],
    heights: &impl HeightLookup,
    metrics: &LayoutMetrics,
) -> StackLayout {
    let count = order.len();
    let exit = metrics.departure();
    let mut items = Vec::with_capacity(count);
    let mut offset = 0.0;
    let mut total_height = 0.0;

    for (back_index, &id) in order.iter().rev().enumerate() {
        let height = heights.height(id);
        items.push(ToastGeometry {
            id,
            vertical_offset: offset,
            scale: 1.0,
            z_index_rank: count - back_index,
            is_frontmost: back_index == 0,
            enter: metrics.entry_origin(back_index),
            exit,
        });
        offset += height + metrics.expanded_spacing;
        total_height += height;
    }

    StackLayout {
        items,
        container_extent: total_height + (count - 1) as f64 * metrics.expanded_spacing,
    }
}
