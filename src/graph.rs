//! Symmetric adjacency over the line list.
//!
//! Lines are directed, but for focus, dimming, and the "only connected"
//! filter a line links both of its endpoints. Lines whose endpoints are not
//! loaded cards still contribute; a lookup for an unknown id simply finds
//! no neighbors.

#[cfg(test)]
#[path = "graph_test.rs"]
mod graph_test;

use std::collections::{HashMap, HashSet};

use crate::doc::Line;

/// Card id -> ids of directly connected cards.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyIndex {
    neighbors: HashMap<String, HashSet<String>>,
}

impl AdjacencyIndex {
    /// Build the index from a line list.
    #[must_use]
    pub fn build(lines: &[Line]) -> Self {
        let mut neighbors: HashMap<String, HashSet<String>> = HashMap::new();
        for line in lines {
            neighbors
                .entry(line.source.clone())
                .or_default()
                .insert(line.target.clone());
            neighbors
                .entry(line.target.clone())
                .or_default()
                .insert(line.source.clone());
        }
        Self { neighbors }
    }

    /// Cards directly connected to `card_id`. Empty for unknown or isolated ids.
    #[must_use]
    pub fn connected_to(&self, card_id: &str) -> HashSet<String> {
        self.neighbors.get(card_id).cloned().unwrap_or_default()
    }

    /// `card_id` together with its direct neighbors.
    #[must_use]
    pub fn neighborhood(&self, card_id: &str) -> HashSet<String> {
        let mut set = self.connected_to(card_id);
        set.insert(card_id.to_owned());
        set
    }

    /// Whether any line touches `card_id`.
    #[must_use]
    pub fn has_connections(&self, card_id: &str) -> bool {
        self.neighbors.get(card_id).is_some_and(|n| !n.is_empty())
    }
}
