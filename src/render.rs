//! Scene projection: what an external renderer should draw for the current state.
//!
//! Nothing here draws. `project` reduces the engine's cards, lines, and
//! board state to flat view records with every presentational decision
//! already made: filter visibility, level of detail, metadata fields,
//! stroke widths, and label visibility.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::collections::HashSet;

use serde::Serialize;

use crate::camera::Point;
use crate::consts::{DETAIL_FAR_BELOW, DETAIL_MID_BELOW, LINE_LABEL_MIN_SCALE};
use crate::doc::{Card, CardKind, Line, LineKind};
use crate::engine::Engine;
use crate::graph::AdjacencyIndex;
use crate::state::Filters;

/// How much of a card is drawn at the current zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// Title only.
    Far,
    /// Title, subtitle, and the kind's primary metadata field.
    Mid,
    /// Everything, tags included.
    Near,
}

impl DetailLevel {
    #[must_use]
    pub fn from_scale(scale: f64) -> Self {
        if scale < DETAIL_FAR_BELOW {
            Self::Far
        } else if scale < DETAIL_MID_BELOW {
            Self::Mid
        } else {
            Self::Near
        }
    }
}

/// Metadata field each kind shows from mid distance.
#[must_use]
pub fn primary_field(kind: CardKind) -> &'static str {
    match kind {
        CardKind::Profile => "mbti",
        CardKind::Goal => "items",
        CardKind::Hobby => "doing",
        CardKind::Skill => "level",
        CardKind::Project => "year",
    }
}

/// Whether `field` of a `kind` card is shown at `level`.
///
/// Force-expanded fields are shown at every level.
#[must_use]
pub fn field_visible(kind: CardKind, field: &str, level: DetailLevel, expanded: &[String]) -> bool {
    if expanded.iter().any(|f| f == field) {
        return true;
    }
    match level {
        DetailLevel::Far => false,
        DetailLevel::Mid => field == primary_field(kind),
        DetailLevel::Near => true,
    }
}

/// Stroke width of `line` at `scale`. Supporting lines are drawn at half width.
#[must_use]
pub fn stroke_width(line: &Line, scale: f64) -> f64 {
    let base = if line.kind == LineKind::Supports { 1.0 } else { 2.0 };
    line.weight() * base * scale.max(0.5)
}

#[must_use]
pub fn label_visible(scale: f64) -> bool {
    scale > LINE_LABEL_MIN_SCALE
}

/// Ids of the cards that pass every filter and have a position.
#[must_use]
pub fn visible_cards<'a>(cards: &'a [Card], filters: &Filters, graph: &AdjacencyIndex) -> HashSet<&'a str> {
    cards
        .iter()
        .filter(|c| c.pos.is_some())
        .filter(|c| filters.admits(c))
        .filter(|c| !filters.only_connected || graph.has_connections(&c.id))
        .map(|c| c.id.as_str())
        .collect()
}

/// One card as it should be drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub id: String,
    pub kind: CardKind,
    /// Screen position of the card anchor.
    pub screen: Point,
    pub selected: bool,
    pub pinned: bool,
    pub dimmed: bool,
    pub pulsing: bool,
    /// Metadata keys to render, sorted.
    pub fields: Vec<String>,
    pub show_tags: bool,
}

/// One line as it should be drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineView {
    pub id: String,
    pub kind: LineKind,
    pub from: Point,
    pub to: Point,
    pub stroke_width: f64,
    pub highlighted: bool,
    /// Present only when the line has a label and labels are visible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// The full drawable scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub level: DetailLevel,
    pub cards: Vec<CardView>,
    pub lines: Vec<LineView>,
    pub active_filters: usize,
}

/// Project the engine's current state into a scene.
#[must_use]
pub fn project(engine: &Engine) -> Scene {
    let state = engine.state();
    let transform = state.transform;
    let level = DetailLevel::from_scale(transform.scale);
    let visible = visible_cards(engine.cards(), &state.filters, engine.graph());

    let cards = engine
        .cards()
        .iter()
        .filter(|c| visible.contains(c.id.as_str()))
        .filter_map(|c| {
            let pos = c.pos?;
            let expanded = state.expanded_fields(&c.id);
            Some(CardView {
                id: c.id.clone(),
                kind: c.kind,
                screen: transform.world_to_screen(pos),
                selected: state.selected_card.as_deref() == Some(c.id.as_str()),
                pinned: state.is_pinned(&c.id),
                dimmed: state.is_dimmed(&c.id),
                pulsing: engine.is_pulsing(&c.id),
                fields: c
                    .meta
                    .keys()
                    .filter(|k| field_visible(c.kind, k, level, expanded))
                    .cloned()
                    .collect(),
                show_tags: level == DetailLevel::Near && !c.tags.is_empty(),
            })
        })
        .collect();

    let lines = engine
        .lines()
        .iter()
        .filter(|l| visible.contains(l.source.as_str()) && visible.contains(l.target.as_str()))
        .filter_map(|l| {
            let from = engine.card(&l.source)?.pos?;
            let to = engine.card(&l.target)?.pos?;
            Some(LineView {
                id: l.id.clone(),
                kind: l.kind,
                from: transform.world_to_screen(from),
                to: transform.world_to_screen(to),
                stroke_width: stroke_width(l, transform.scale),
                highlighted: state.is_highlighted(&l.id),
                label: l.label.clone().filter(|_| label_visible(transform.scale)),
            })
        })
        .collect();

    Scene { level, cards, lines, active_filters: state.filters.active_count() }
}
