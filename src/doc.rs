//! Document model: cards, lines, trails, and the scripted actions they carry.
//!
//! This module defines the read-only inputs of the controller. They arrive as
//! three JSON arrays produced by an upstream build step (`cards.json`,
//! `lines.json`, `trails.json`) and are never mutated after loading. Actions
//! reference cards by id; validation of those references belongs to the
//! build step, so nothing here rejects a dangling id.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::consts::{MAX_LINE_WEIGHT, MIN_LINE_WEIGHT};

/// Error returned when loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// A dataset file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A dataset file is not valid JSON for its type.
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The kind of a card. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Profile,
    Goal,
    Hobby,
    Skill,
    Project,
}

impl CardKind {
    /// Every kind, in display order.
    pub const ALL: [Self; 5] = [Self::Profile, Self::Goal, Self::Hobby, Self::Skill, Self::Project];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Goal => "goal",
            Self::Hobby => "hobby",
            Self::Skill => "skill",
            Self::Project => "project",
        }
    }
}

/// The relationship a line expresses. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Uses,
    Inspires,
    Supports,
    Relates,
}

impl LineKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uses => "uses",
            Self::Inspires => "inspires",
            Self::Supports => "supports",
            Self::Relates => "relates",
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite line id: `source-kind-target`.
#[must_use]
pub fn line_id(source: &str, kind: LineKind, target: &str) -> String {
    format!("{source}-{kind}-{target}")
}

/// A card on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Unique identifier.
    pub id: String,
    pub kind: CardKind,
    #[serde(default)]
    pub title: String,
    /// Initial world position; cards without one are not placed on the board.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<Point>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Open kind-specific fields.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl Card {
    /// Convenience constructor used by tests and tooling.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: CardKind, pos: Option<Point>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: String::new(),
            pos,
            tags: Vec::new(),
            meta: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A directed relationship between two cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: String,
    /// Card id at the tail.
    pub source: String,
    /// Card id at the head.
    pub target: String,
    pub kind: LineKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Line {
    /// Build a line whose id is derived from its endpoints and kind.
    #[must_use]
    pub fn new(source: impl Into<String>, kind: LineKind, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: line_id(&source, kind, &target),
            source,
            target,
            kind,
            weight: None,
            label: None,
        }
    }

    /// Weight clamped to [0.2, 1.0]; 1.0 when absent or not a number.
    #[must_use]
    pub fn weight(&self) -> f64 {
        match self.weight {
            Some(w) if w.is_finite() => w.clamp(MIN_LINE_WEIGHT, MAX_LINE_WEIGHT),
            _ => MAX_LINE_WEIGHT,
        }
    }
}

/// One scripted camera or highlight operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    /// Fit every card into view.
    Overview {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        zoom: Option<f64>,
    },
    /// Center on a card and dim everything it is not connected to.
    Focus {
        card: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        zoom: Option<f64>,
        /// Transition duration in milliseconds; may be fractional.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<f64>,
    },
    /// Highlight the line `from-kind-to`.
    LinkHighlight { from: String, to: String, kind: LineKind },
    /// Force-expand metadata fields of a card.
    RevealMeta { card: String, fields: Vec<String> },
    Pin { card: String },
    Unpin { card: String },
    /// One-shot attention signal.
    Pulse { card: String },
}

impl Action {
    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Overview { .. } => "overview",
            Self::Focus { .. } => "focus",
            Self::LinkHighlight { .. } => "linkHighlight",
            Self::RevealMeta { .. } => "revealMeta",
            Self::Pin { .. } => "pin",
            Self::Unpin { .. } => "unpin",
            Self::Pulse { .. } => "pulse",
        }
    }
}

/// One unit of a trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// A named, ordered sequence of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trail {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Trail {
    /// Index of the step with `id`.
    #[must_use]
    pub fn step_index(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }
}

/// The three immutable inputs, loaded together.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub cards: Vec<Card>,
    pub lines: Vec<Line>,
    pub trails: Vec<Trail>,
}

impl Dataset {
    /// Load `cards.json`, `lines.json`, and `trails.json` from `dir`.
    ///
    /// A missing `trails.json` yields an empty trail list; the board works
    /// without story mode.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or parsed.
    pub fn load_dir(dir: &Path) -> Result<Self, DataError> {
        let cards = read_json(&dir.join("cards.json"))?;
        let lines = read_json(&dir.join("lines.json"))?;
        let trails_path = dir.join("trails.json");
        let trails = if trails_path.exists() { read_json(&trails_path)? } else { Vec::new() };
        Ok(Self { cards, lines, trails })
    }

    /// Parse the three datasets from JSON strings.
    ///
    /// # Errors
    ///
    /// Returns an error if any string is not valid JSON for its type.
    pub fn from_json(cards: &str, lines: &str, trails: &str) -> Result<Self, DataError> {
        Ok(Self {
            cards: parse_json(Path::new("cards.json"), cards)?,
            lines: parse_json(Path::new("lines.json"), lines)?,
            trails: parse_json(Path::new("trails.json"), trails)?,
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    let raw = std::fs::read_to_string(path).map_err(|source| DataError::Io { path: path.to_path_buf(), source })?;
    parse_json(path, &raw)
}

fn parse_json<T: DeserializeOwned>(path: &Path, raw: &str) -> Result<T, DataError> {
    serde_json::from_str(raw).map_err(|source| DataError::Json { path: path.to_path_buf(), source })
}
