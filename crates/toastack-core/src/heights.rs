use std::collections::HashMap;

use crate::models::ToastId;

pub const DEFAULT_TOAST_HEIGHT: f64 = 80.0;

/// Outcome of a height measurement report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightReport {
    /// The value differs from the previous one; dependents must recompute.
    Recorded,
    Unchanged,
    /// Non-positive or non-finite value; ignored.
    Rejected,
    /// The id is not in the store; ignored.
    UnknownToast,
    /// The toast is on its way out and keeps its last geometry; ignored.
    Removing,
}

impl HeightReport {
    pub fn changed(&self) -> bool {
        matches!(self, HeightReport::Recorded)
    }
}

/// Anything that can answer "how tall is this toast".
pub trait HeightLookup {
    fn height(&self, id: ToastId) -> f64;
}

impl<F> HeightLookup for F
where
    F: Fn(ToastId) -> f64,
{
    fn height(&self, id: ToastId) -> f64 {
        self(id)
    }
}

/// Last measured render height per toast.
#[derive(Debug, Clone)]
pub struct HeightRegistry {
    heights: HashMap<ToastId, f64>,
    default_height: f64,
}

impl Default for HeightRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_HEIGHT)
    }
}

impl HeightRegistry {
    pub fn new(default_height: f64) -> Self {
        let default_height = if default_height.is_finite() && default_height > 0.0 {
            default_height
        } else {
            DEFAULT_TOAST_HEIGHT
        };
        Self {
            heights: HashMap::new(),
            default_height,
        }
    }

    pub fn report(&mut self, id: ToastId, height: f64) -> HeightReport {
        if !height.is_finite() || height <= 0.0 {
            return HeightReport::Rejected;
        }
        match self.heights.insert(id, height) {
            Some(prev) if prev == height => HeightReport::Unchanged,
            _ => HeightReport::Recorded,
        }
    }

    pub fn get(&self, id: ToastId) -> f64 {
        self.heights.get(&id).copied().unwrap_or(self.default_height)
    }

    pub fn is_measured(&self, id: ToastId) -> bool {
        self.heights.contains_key(&id)
    }

    pub fn forget(&mut self, id: ToastId) {
        self.heights.remove(&id);
    }

    pub fn clear(&mut self) {
        self.heights.clear();
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn default_height(&self) -> f64 {
        self.default_height
    }
}

impl HeightLookup for HeightRegistry {
    fn height(&self, id: ToastId) -> f64 {
        self.get(id)
    }
}
