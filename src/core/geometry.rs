use serde::{Deserialize, Serialize};

/// Frame as reported by the recognizer: top-left origin plus size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Frame {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Frame {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_frame(frame: &Frame) -> Self {
        Self {
            x0: frame.left,
            y0: frame.top,
            x1: frame.left + frame.width.max(0.0),
            y1: frame.top + frame.height.max(0.0),
        }
    }

    /// Horizontal reading position.
    pub fn x(&self) -> f32 {
        self.x0
    }

    /// Vertical reading position.
    pub fn y(&self) -> f32 {
        self.y0
    }

    /// True when both boxes start within `tolerance` of each other vertically.
    pub fn same_band(&self, other: &Self, tolerance: f32) -> bool {
        (self.y0 - other.y0).abs() <= tolerance
    }
}
