//! Board controller for a pannable, zoomable card board with scripted trails.
//!
//! The board shows cards connected by typed lines. A trail is an ordered
//! list of steps, each carrying camera and highlight actions; scrolling a
//! story column or pressing navigation keys moves between steps. This crate
//! owns everything except drawing: the board state and its mutation path,
//! the action interpreter and its timing, the step synchronizer that keeps
//! scroll and keyboard navigation from fighting, and the minimap math. A
//! host renders [`render::Scene`] and feeds input back as
//! [`input::BoardCommand`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Board controller and action interpreter |
//! | [`story`] | Step synchronizer, scroll observer, location params |
//! | [`state`] | Board state, patches, and the listener store |
//! | [`doc`] | Cards, lines, trails, actions, dataset loading |
//! | [`camera`] | Pan/zoom transform and coordinate conversions |
//! | [`graph`] | Symmetric adjacency over lines |
//! | [`input`] | Board commands, pan gesture, keyboard map |
//! | [`minimap`] | Minimap projection and viewport overlay |
//! | [`render`] | Scene projection: filters, detail level, line styling |
//! | [`persist`] | Snapshot sink and tolerant restore |
//! | [`config`] | Timing configuration from the environment |
//! | [`consts`] | Shared numeric constants (zoom limits, delays, etc.) |

pub mod camera;
pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod graph;
pub mod input;
pub mod minimap;
pub mod persist;
pub mod render;
pub mod state;
pub mod story;
