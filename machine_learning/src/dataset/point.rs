use serde::{Deserialize, Serialize};

/// A point in the plane, optionally tagged with a class or cluster label.
///
/// Points are plain values: editing one means replacing it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<usize>,
}

impl Point2D {
    /// Creates an unlabeled point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, label: None }
    }

    /// Creates a point tagged with `label`.
    pub fn labeled(x: f64, y: f64, label: usize) -> Self {
        Self {
            x,
            y,
            label: Some(label),
        }
    }
}
