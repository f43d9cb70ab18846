use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Default viewport used when the host never reports one.
pub const DEFAULT_VIEWPORT_WIDTH: f32 = 1280.0;
pub const DEFAULT_VIEWPORT_HEIGHT: f32 = 720.0;

/// Size of the hosting display surface, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        let sanitize = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        Self {
            width: sanitize(width),
            height: sanitize(height),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT)
    }
}

/// Axis-aligned rectangle that entity centres must stay inside.
///
/// Always normalized: `min <= max` on both axes and every coordinate finite,
/// so clamping against it can never panic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        let a = if a.is_finite() { a } else { Vec2::ZERO };
        let b = if b.is_finite() { b } else { Vec2::ZERO };
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Motion rectangle for a viewport: the full surface shrunk by `inset` on
    /// every side. A viewport too small for the inset collapses to its centre.
    pub fn from_viewport(viewport: Viewport, inset: f32) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(viewport.width, viewport.height)).inset(inset)
    }

    /// Shrink by `margin` on every side, collapsing an axis to its midpoint
    /// when the margin does not fit.
    pub fn inset(&self, margin: f32) -> Self {
        let margin = if margin.is_finite() {
            margin.max(0.0)
        } else {
            0.0
        };
        let center = self.center();
        let shrink = |lo: f32, hi: f32, mid: f32| {
            if hi - lo >= margin * 2.0 {
                (lo + margin, hi - margin)
            } else {
                (mid, mid)
            }
        };
        let (min_x, max_x) = shrink(self.min.x, self.max.x, center.x);
        let (min_y, max_y) = shrink(self.min.y, self.max.y, center.y);
        Self {
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn clamp(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }
}
