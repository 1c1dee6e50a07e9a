//! Input model: board commands, the pan gesture, and the keyboard map.
//!
//! Hosts translate raw pointer, wheel, and filter-panel events into
//! [`BoardCommand`] values and hand them to the engine, so the store keeps a
//! single mutation path that can be driven without a rendering surface.
//! Keys map to [`KeyCommand`]s; the story synchronizer decides what a step
//! key means for the current trail.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::{Point, Transform};
use crate::consts::{WHEEL_ZOOM_IN, WHEEL_ZOOM_OUT};
use crate::doc::CardKind;
use crate::state::Filters;

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

impl WheelDelta {
    /// Zoom factor for this delta: out when scrolling down, in otherwise.
    #[must_use]
    pub fn zoom_factor(self) -> f64 {
        if self.dy > 0.0 { WHEEL_ZOOM_OUT } else { WHEEL_ZOOM_IN }
    }
}

/// A request to change board state, produced by the host UI.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardCommand {
    /// Primary button pressed on empty board space.
    PointerDown { screen: Point },
    /// Pointer moved; pans while a drag is active.
    PointerMove { screen: Point },
    /// Pointer released or left the board.
    PointerUp,
    /// Wheel zoom anchored at the cursor.
    Wheel { cursor: Point, delta: WheelDelta },
    /// Explicit zoom by `factor` anchored at `cursor`.
    ZoomAt { cursor: Point, factor: f64 },
    /// Replace the transform (e.g. from the minimap).
    SetTransform(Transform),
    /// Select a card by click.
    SelectCard(String),
    /// Clear selection and highlights.
    ClearSelection,
    SetFilters(Filters),
    ToggleKind(CardKind),
    ToggleTag(String),
    SetOnlyConnected(bool),
    ResetFilters,
}

/// Pointer gesture tracked between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Dragging the board.
    Panning {
        /// Screen position of the previous pointer event.
        last_screen: Point,
    },
}

/// A keyboard key relevant to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit0,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    PageUp,
    PageDown,
    Home,
    End,
    Escape,
}

impl Key {
    /// Parse a key name as reported by the browser (`"ArrowDown"`, `"0"`, ...).
    ///
    /// Short aliases (`down`, `pgdn`, `esc`, ...) are accepted for terminal use.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name.trim() {
            "0" | "Digit0" => Self::Digit0,
            "ArrowUp" | "up" => Self::ArrowUp,
            "ArrowDown" | "down" => Self::ArrowDown,
            "ArrowLeft" | "left" => Self::ArrowLeft,
            "ArrowRight" | "right" => Self::ArrowRight,
            "PageUp" | "pgup" => Self::PageUp,
            "PageDown" | "pgdn" => Self::PageDown,
            "Home" | "home" => Self::Home,
            "End" | "end" => Self::End,
            "Escape" | "Esc" | "esc" => Self::Escape,
            _ => return None,
        };
        Some(key)
    }

    /// What the key does on a board with a trail.
    #[must_use]
    pub fn command(self) -> KeyCommand {
        match self {
            Self::Digit0 => KeyCommand::Overview,
            Self::ArrowDown | Self::ArrowRight | Self::PageDown => KeyCommand::NextStep,
            Self::ArrowUp | Self::ArrowLeft | Self::PageUp => KeyCommand::PreviousStep,
            Self::Home => KeyCommand::FirstStep,
            Self::End => KeyCommand::LastStep,
            Self::Escape => KeyCommand::ClearSelection,
        }
    }
}

/// Keyboard intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Overview,
    NextStep,
    PreviousStep,
    FirstStep,
    LastStep,
    ClearSelection,
}
