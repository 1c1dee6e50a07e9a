//! Minimap projection between world space and the minimap canvas.
//!
//! The canvas keeps the aspect ratio of the padded card bounds, with its
//! longer side capped at `MINIMAP_MAX_SIZE`. Clicking the minimap recenters
//! the main viewport on the clicked world point at the current scale.

#[cfg(test)]
#[path = "minimap_test.rs"]
mod minimap_test;

use serde::Serialize;

use crate::camera::{Bounds, Point, Rect, Size, Transform};
use crate::consts::{
    FALLBACK_VIEWPORT_HEIGHT, FALLBACK_VIEWPORT_WIDTH, MINIMAP_EMPTY_EXTENT, MINIMAP_MAX_SIZE, MINIMAP_PADDING,
};
use crate::doc::{Card, CardKind};

/// A card marker on the minimap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinimapDot {
    pub id: String,
    pub kind: CardKind,
    pub at: Point,
}

/// Footer line of the minimap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinimapStats {
    pub card_count: usize,
    /// `scale * 100`, rounded.
    pub zoom_percent: f64,
}

impl MinimapStats {
    #[must_use]
    pub fn new(cards: &[Card], transform: &Transform) -> Self {
        Self { card_count: cards.len(), zoom_percent: (transform.scale * 100.0).round() }
    }
}

/// Projector for one set of cards and one main viewport size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapProjector {
    bounds: Bounds,
    size: Size,
    viewport: Size,
}

impl MinimapProjector {
    /// Build from the positioned cards, assuming the fallback viewport.
    #[must_use]
    pub fn new(cards: &[Card]) -> Self {
        let bounds = Bounds::of_cards(cards).map_or(
            Bounds { min_x: 0.0, min_y: 0.0, max_x: MINIMAP_EMPTY_EXTENT, max_y: MINIMAP_EMPTY_EXTENT },
            |b| b.padded(MINIMAP_PADDING),
        );
        let aspect = bounds.width() / bounds.height();
        let size = if aspect > 1.0 {
            Size::new(MINIMAP_MAX_SIZE, MINIMAP_MAX_SIZE / aspect)
        } else {
            Size::new(MINIMAP_MAX_SIZE * aspect, MINIMAP_MAX_SIZE)
        };
        Self { bounds, size, viewport: Size::new(FALLBACK_VIEWPORT_WIDTH, FALLBACK_VIEWPORT_HEIGHT) }
    }

    /// Use the real size of the main viewport. Non-positive sizes keep the fallback.
    #[must_use]
    pub fn with_viewport(mut self, viewport: Size) -> Self {
        if viewport.width > 0.0 && viewport.height > 0.0 {
            self.viewport = viewport;
        }
        self
    }

    /// Canvas size in minimap pixels.
    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Padded world bounds covered by the canvas.
    #[must_use]
    pub fn world_bounds(&self) -> Bounds {
        self.bounds
    }

    fn scale_x(&self) -> f64 {
        self.size.width / self.bounds.width()
    }

    fn scale_y(&self) -> f64 {
        self.size.height / self.bounds.height()
    }

    #[must_use]
    pub fn world_to_minimap(&self, world: Point) -> Point {
        Point::new(
            (world.x - self.bounds.min_x) * self.scale_x(),
            (world.y - self.bounds.min_y) * self.scale_y(),
        )
    }

    #[must_use]
    pub fn minimap_to_world(&self, point: Point) -> Point {
        Point::new(
            point.x / self.scale_x() + self.bounds.min_x,
            point.y / self.scale_y() + self.bounds.min_y,
        )
    }

    /// The main viewport as a rectangle on the minimap, clipped to the canvas.
    #[must_use]
    pub fn viewport_rect(&self, transform: &Transform) -> Rect {
        let origin = self.world_to_minimap(transform.screen_to_world(Point::default()));
        let width = self.viewport.width / transform.scale * self.scale_x();
        let height = self.viewport.height / transform.scale * self.scale_y();

        let left = origin.x.clamp(0.0, self.size.width);
        let top = origin.y.clamp(0.0, self.size.height);
        let right = (origin.x + width).clamp(0.0, self.size.width);
        let bottom = (origin.y + height).clamp(0.0, self.size.height);
        Rect { x: left, y: top, width: right - left, height: bottom - top }
    }

    /// Transform that centers the main viewport on the world point under
    /// `point`, keeping the current scale.
    #[must_use]
    pub fn recenter(&self, transform: &Transform, point: Point) -> Transform {
        let world = self.minimap_to_world(point);
        Transform {
            x: -(world.x * transform.scale) + self.viewport.width / 2.0,
            y: -(world.y * transform.scale) + self.viewport.height / 2.0,
            scale: transform.scale,
        }
    }

    /// One dot per positioned card.
    #[must_use]
    pub fn dots(&self, cards: &[Card]) -> Vec<MinimapDot> {
        cards
            .iter()
            .filter_map(|c| {
                c.pos.map(|pos| MinimapDot { id: c.id.clone(), kind: c.kind, at: self.world_to_minimap(pos) })
            })
            .collect()
    }
}
