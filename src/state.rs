//! Board state and its single mutation path.
//!
//! DESIGN
//! ======
//! `BoardStore` owns the one `BoardState` of a board view. Every change goes
//! through `set_state`, which shallow-merges a `BoardPatch` and then calls
//! each listener synchronously in registration order. There is no equality
//! check: an empty patch still notifies, and callers rely on that.
//!
//! The store is single-threaded. Listeners are plain `FnMut` closures and
//! must not call back into the store.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use std::collections::{HashMap, HashSet};

use crate::camera::Transform;
use crate::doc::{Card, CardKind};

// =============================================================================
// FILTERS
// =============================================================================

/// Card visibility filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    /// Kinds that are shown.
    pub kinds: HashSet<CardKind>,
    /// When non-empty, only cards carrying one of these tags are shown.
    pub tags: HashSet<String>,
    /// Hide cards that have no lines.
    pub only_connected: bool,
}

impl Default for Filters {
    fn default() -> Self {
        Self { kinds: CardKind::ALL.into_iter().collect(), tags: HashSet::new(), only_connected: false }
    }
}

impl Filters {
    /// Number of filters that narrow the board relative to the default.
    #[must_use]
    pub fn active_count(&self) -> usize {
        let disabled_kinds = CardKind::ALL.iter().filter(|k| !self.kinds.contains(k)).count();
        disabled_kinds + self.tags.len() + usize::from(self.only_connected)
    }

    /// Whether `card` passes the kind and tag filters.
    ///
    /// `only_connected` needs the adjacency index and is applied by the
    /// scene projection.
    #[must_use]
    pub fn admits(&self, card: &Card) -> bool {
        self.kinds.contains(&card.kind) && (self.tags.is_empty() || self.tags.iter().any(|t| card.has_tag(t)))
    }
}

// =============================================================================
// BOARD STATE
// =============================================================================

/// The single source of truth for a board view.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoardState {
    pub transform: Transform,
    pub selected_card: Option<String>,
    /// Pinned by the user or a script; survives overview and focus.
    pub pinned_cards: HashSet<String>,
    /// Line ids set by the last highlight action.
    pub highlighted_lines: HashSet<String>,
    /// Card id -> metadata fields shown regardless of zoom.
    pub expanded_meta: HashMap<String, Vec<String>>,
    /// Cards outside the current focus neighborhood.
    pub dimmed_cards: HashSet<String>,
    pub filters: Filters,
}

impl BoardState {
    #[must_use]
    pub fn is_pinned(&self, card_id: &str) -> bool {
        self.pinned_cards.contains(card_id)
    }

    #[must_use]
    pub fn is_dimmed(&self, card_id: &str) -> bool {
        self.dimmed_cards.contains(card_id)
    }

    #[must_use]
    pub fn is_highlighted(&self, line_id: &str) -> bool {
        self.highlighted_lines.contains(line_id)
    }

    /// Fields force-expanded for `card_id`.
    #[must_use]
    pub fn expanded_fields(&self, card_id: &str) -> &[String] {
        self.expanded_meta.get(card_id).map_or(&[], Vec::as_slice)
    }
}

// =============================================================================
// PATCH
// =============================================================================

/// Sparse update for `BoardState`. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardPatch {
    pub transform: Option<Transform>,
    /// `Some(None)` clears the selection.
    pub selected_card: Option<Option<String>>,
    pub pinned_cards: Option<HashSet<String>>,
    pub highlighted_lines: Option<HashSet<String>>,
    pub expanded_meta: Option<HashMap<String, Vec<String>>>,
    pub dimmed_cards: Option<HashSet<String>>,
    pub filters: Option<Filters>,
}

impl BoardPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    #[must_use]
    pub fn selected_card(mut self, card: Option<String>) -> Self {
        self.selected_card = Some(card);
        self
    }

    #[must_use]
    pub fn pinned_cards(mut self, cards: HashSet<String>) -> Self {
        self.pinned_cards = Some(cards);
        self
    }

    #[must_use]
    pub fn highlighted_lines(mut self, lines: HashSet<String>) -> Self {
        self.highlighted_lines = Some(lines);
        self
    }

    #[must_use]
    pub fn expanded_meta(mut self, meta: HashMap<String, Vec<String>>) -> Self {
        self.expanded_meta = Some(meta);
        self
    }

    #[must_use]
    pub fn dimmed_cards(mut self, cards: HashSet<String>) -> Self {
        self.dimmed_cards = Some(cards);
        self
    }

    #[must_use]
    pub fn filters(mut self, filters: Filters) -> Self {
        self.filters = Some(filters);
        self
    }

    /// Merge into `state`. The transform scale is clamped on the way in.
    fn apply_to(self, state: &mut BoardState) {
        if let Some(transform) = self.transform {
            state.transform = transform.clamped();
        }
        if let Some(selected) = self.selected_card {
            state.selected_card = selected;
        }
        if let Some(pinned) = self.pinned_cards {
            state.pinned_cards = pinned;
        }
        if let Some(lines) = self.highlighted_lines {
            state.highlighted_lines = lines;
        }
        if let Some(meta) = self.expanded_meta {
            state.expanded_meta = meta;
        }
        if let Some(dimmed) = self.dimmed_cards {
            state.dimmed_cards = dimmed;
        }
        if let Some(filters) = self.filters {
            state.filters = filters;
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Handle returned by [`BoardStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&BoardState)>;

/// Owner of the board state and its change listeners.
pub struct BoardStore {
    state: BoardState,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl Default for BoardStore {
    fn default() -> Self {
        Self::new(BoardState::default())
    }
}

impl std::fmt::Debug for BoardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardStore")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl BoardStore {
    #[must_use]
    pub fn new(initial: BoardState) -> Self {
        let mut state = initial;
        state.transform = state.transform.clamped();
        Self { state, listeners: Vec::new(), next_listener: 0 }
    }

    /// The current snapshot.
    #[must_use]
    pub fn get_state(&self) -> &BoardState {
        &self.state
    }

    /// Merge `patch` and notify every listener, in registration order.
    pub fn set_state(&mut self, patch: BoardPatch) {
        patch.apply_to(&mut self.state);
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
    }

    /// Register a change listener.
    pub fn subscribe(&mut self, listener: impl FnMut(&BoardState) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }
}
