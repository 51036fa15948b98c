//! Math utilities
//!
//! 2D primitives used by the engine core. Vector types are re-exported from glam.

use serde::{Deserialize, Serialize};

pub use glam::Vec2;

/// Axis-aligned rectangle described by its top-left corner and size
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect2 {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub w: f32,
    /// Height
    pub h: f32,
}

impl Rect2 {
    /// Zero-sized rectangle at the origin
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        w: 0.0,
        h: 0.0,
    };

    /// Create a rectangle from position and size
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Create a rectangle from a position vector and a size vector
    pub fn from_position_size(position: Vec2, size: Vec2) -> Self {
        Self::new(position.x, position.y, size.x, size.y)
    }

    /// Top-left corner
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Width and height
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }

    /// Larger of width and height
    pub fn max_extent(&self) -> f32 {
        self.w.max(self.h)
    }

    /// The four corners: top-left, top-right, bottom-left, bottom-right
    pub fn corners(&self) -> [Vec2; 4] {
        [
            Vec2::new(self.x, self.y),
            Vec2::new(self.x + self.w, self.y),
            Vec2::new(self.x, self.y + self.h),
            Vec2::new(self.x + self.w, self.y + self.h),
        ]
    }

    /// Check if a point lies inside the rectangle (edges included)
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.w
            && point.y >= self.y
            && point.y <= self.y + self.h
    }

    /// Check if this rectangle overlaps another
    pub fn overlaps(&self, other: &Rect2) -> bool {
        rectangles_overlap(self, other)
    }
}

/// Closed-interval AABB overlap test. Rectangles that only touch on an edge overlap.
pub fn rectangles_overlap(a: &Rect2, b: &Rect2) -> bool {
    a.x + a.w >= b.x && b.x + b.w >= a.x && a.y + a.h >= b.y && b.y + b.h >= a.y
}
