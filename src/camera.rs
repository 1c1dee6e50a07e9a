//! Transform model: pan/zoom math and coordinate conversions.
//!
//! Every function here is pure. The transform maps world space to screen
//! space as `screen = world * scale + translate`; the scale is kept inside
//! [`MIN_SCALE`, `MAX_SCALE`] by every constructor and mutator.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_SCALE, MIN_SCALE};
use crate::doc::Card;

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of a screen-space surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle given by its top-left corner and extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Clamp a scale into the allowed range. Non-finite input falls back to 1.0.
#[must_use]
pub fn clamp_scale(scale: f64) -> f64 {
    if scale.is_finite() { scale.clamp(MIN_SCALE, MAX_SCALE) } else { 1.0 }
}

/// Camera state for the board.
///
/// `x` / `y` are a translation in screen pixels, `scale` a multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, scale: crate::consts::DEFAULT_SCALE }
    }
}

impl Transform {
    /// Build a transform, clamping `scale` into range.
    #[must_use]
    pub fn new(x: f64, y: f64, scale: f64) -> Self {
        Self { x, y, scale: clamp_scale(scale) }
    }

    /// The same transform with its scale clamped into range.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self::new(self.x, self.y, self.scale)
    }

    /// Whether every component is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.scale.is_finite()
    }

    /// Convert a world-space point to screen coordinates.
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.scale + self.x,
            y: world.y * self.scale + self.y,
        }
    }

    /// Convert a screen-space point to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.x) / self.scale,
            y: (screen.y - self.y) / self.scale,
        }
    }

    /// Translate by a screen-space delta.
    #[must_use]
    pub fn panned(&self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy, scale: self.scale }
    }
}

/// Scale by `factor` while keeping `cursor` over the same world point.
///
/// The resulting scale is clamped; when the clamp bites, the effective
/// factor shrinks accordingly so the anchor still holds.
#[must_use]
pub fn zoom_at(transform: &Transform, cursor: Point, factor: f64) -> Transform {
    let old_scale = transform.scale;
    if !(old_scale.is_finite() && old_scale > 0.0) {
        return transform.clamped();
    }
    let new_scale = clamp_scale(old_scale * factor);
    let ratio = new_scale / old_scale;
    Transform {
        x: cursor.x - (cursor.x - transform.x) * ratio,
        y: cursor.y - (cursor.y - transform.y) * ratio,
        scale: new_scale,
    }
}

/// Axis-aligned bounds over world-space points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Zero-size bounds at the world origin.
    #[must_use]
    pub fn origin() -> Self {
        Self { min_x: 0.0, min_y: 0.0, max_x: 0.0, max_y: 0.0 }
    }

    /// Smallest bounds enclosing every point, or `None` for an empty input.
    #[must_use]
    pub fn enclosing(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Self { min_x: p.x, min_y: p.y, max_x: p.x, max_y: p.y },
                Some(b) => Self {
                    min_x: b.min_x.min(p.x),
                    min_y: b.min_y.min(p.y),
                    max_x: b.max_x.max(p.x),
                    max_y: b.max_y.max(p.y),
                },
            })
        })
    }

    /// Bounds enclosing every positioned card, if any card has a position.
    #[must_use]
    pub fn of_cards<'a>(cards: impl IntoIterator<Item = &'a Card>) -> Option<Self> {
        Self::enclosing(cards.into_iter().filter_map(|c| c.pos))
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// Grow every side by `amount`.
    #[must_use]
    pub fn padded(&self, amount: f64) -> Self {
        Self {
            min_x: self.min_x - amount,
            min_y: self.min_y - amount,
            max_x: self.max_x + amount,
            max_y: self.max_y + amount,
        }
    }
}

/// Bounding box over all positioned cards; degenerate at the origin when none has a position.
#[must_use]
pub fn fit_bounds(cards: &[Card]) -> Bounds {
    Bounds::of_cards(cards).unwrap_or_else(Bounds::origin)
}
