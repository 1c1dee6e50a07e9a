//! Shared numeric constants for the board controller.

// ── Transform ───────────────────────────────────────────────────

/// Smallest allowed transform scale.
pub const MIN_SCALE: f64 = 0.1;

/// Largest allowed transform scale.
pub const MAX_SCALE: f64 = 3.0;

/// Scale of a freshly created board.
pub const DEFAULT_SCALE: f64 = 0.5;

/// Zoom used by `overview` when the action does not name one.
pub const OVERVIEW_ZOOM: f64 = 0.5;

/// Zoom used by `focus` when the action does not name one.
pub const FOCUS_ZOOM: f64 = 1.0;

/// Wheel zoom factor when scrolling down (zoom out).
pub const WHEEL_ZOOM_OUT: f64 = 0.9;

/// Wheel zoom factor when scrolling up (zoom in).
pub const WHEEL_ZOOM_IN: f64 = 1.1;

// ── Timing (milliseconds) ───────────────────────────────────────

/// One rendering frame at 60 Hz.
pub const FRAME_MS: u64 = 16;

/// Settle delay after an overview transform; matches the CSS transition.
pub const OVERVIEW_SETTLE_MS: u64 = 500;

/// Default focus transition duration.
pub const FOCUS_DURATION_MS: u64 = 450;

/// Lifetime of a pulse signal.
pub const PULSE_MS: u64 = 600;

/// Lock window after explicit navigation; exceeds a smooth scroll.
pub const NAV_SETTLE_MS: u64 = 1000;

// ── Scroll observer ─────────────────────────────────────────────

/// Minimum visible fraction of a step region before it becomes current.
pub const INTERSECTION_THRESHOLD: f64 = 0.6;

/// Fraction of the viewport excluded at the top and at the bottom.
pub const OBSERVER_BAND_MARGIN: f64 = 0.2;

// ── Minimap ─────────────────────────────────────────────────────

/// Maximum minimap dimension in logical pixels.
pub const MINIMAP_MAX_SIZE: f64 = 200.0;

/// World-space padding around the card bounding box.
pub const MINIMAP_PADDING: f64 = 50.0;

/// Extent of the placeholder world when no card has a position.
pub const MINIMAP_EMPTY_EXTENT: f64 = 100.0;

/// Screen size assumed when the host has not reported one.
pub const FALLBACK_VIEWPORT_WIDTH: f64 = 1000.0;

/// Screen size assumed when the host has not reported one.
pub const FALLBACK_VIEWPORT_HEIGHT: f64 = 600.0;

// ── Level of detail ─────────────────────────────────────────────

/// Below this scale cards render at the far detail level.
pub const DETAIL_FAR_BELOW: f64 = 0.6;

/// Below this scale (and at or above the far limit) cards render at mid detail.
pub const DETAIL_MID_BELOW: f64 = 1.0;

/// Line labels are drawn only above this scale.
pub const LINE_LABEL_MIN_SCALE: f64 = 0.8;

/// Lower bound for line weight.
pub const MIN_LINE_WEIGHT: f64 = 0.2;

/// Upper bound (and default) for line weight.
pub const MAX_LINE_WEIGHT: f64 = 1.0;
