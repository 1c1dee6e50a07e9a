//! Board engine: the controller that owns board state and plays actions.
//!
//! DESIGN
//! ======
//! `Engine` holds the immutable card and line inputs, the adjacency index
//! derived from them, and the `BoardStore`. Scripted actions go through
//! `run`, host input goes through `dispatch`; both end in `set_state`.
//!
//! `run` executes actions strictly in order. Camera actions wait one frame
//! before applying the transform and then wait out their transition, so the
//! next action never races the previous animation. Everything else applies
//! synchronously. Overlapping `run` calls are impossible by construction
//! (`run` borrows the engine mutably), so serialization is the caller's
//! concern, not the interpreter's.
//!
//! ERROR HANDLING
//! ==============
//! Actions that name a card that is not loaded are skipped with a warning.
//! Playback never stops on a bad reference.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::camera::{Transform, fit_bounds, zoom_at};
use crate::config::Pacing;
use crate::consts::{FOCUS_ZOOM, OVERVIEW_ZOOM};
use crate::doc::{Action, Card, Line, LineKind, line_id};
use crate::graph::AdjacencyIndex;
use crate::input::{BoardCommand, Gesture};
use crate::state::{BoardPatch, BoardState, BoardStore, Filters, ListenerId};

/// A one-shot attention signal for the renderer. Never stored in board state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pulse {
    pub card: String,
    pub duration: Duration,
}

/// Interpreter progress through the current action list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    /// Executing the action at this index.
    Running(usize),
}

type PulseListener = Box<dyn FnMut(&Pulse)>;

/// Board controller for one view.
pub struct Engine {
    cards: Vec<Card>,
    card_index: HashMap<String, usize>,
    lines: Vec<Line>,
    line_ids: HashSet<String>,
    graph: AdjacencyIndex,
    store: BoardStore,
    pacing: Pacing,
    gesture: Gesture,
    phase: RunPhase,
    pulses: HashMap<String, Instant>,
    pulse_listeners: Vec<PulseListener>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("cards", &self.cards.len())
            .field("lines", &self.lines.len())
            .field("state", self.store.get_state())
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine with default board state.
    #[must_use]
    pub fn new(cards: Vec<Card>, lines: Vec<Line>, pacing: Pacing) -> Self {
        Self::with_state(cards, lines, pacing, BoardState::default())
    }

    /// Create an engine starting from a restored state.
    #[must_use]
    pub fn with_state(cards: Vec<Card>, lines: Vec<Line>, pacing: Pacing, initial: BoardState) -> Self {
        let mut engine = Self {
            cards: Vec::new(),
            card_index: HashMap::new(),
            lines: Vec::new(),
            line_ids: HashSet::new(),
            graph: AdjacencyIndex::default(),
            store: BoardStore::new(initial),
            pacing,
            gesture: Gesture::Idle,
            phase: RunPhase::Idle,
            pulses: HashMap::new(),
            pulse_listeners: Vec::new(),
        };
        engine.set_graph(cards, lines);
        engine
    }

    // --- Data inputs ---

    /// Replace the card and line inputs and rebuild the adjacency index.
    pub fn set_graph(&mut self, cards: Vec<Card>, lines: Vec<Line>) {
        self.card_index = cards
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        self.line_ids = lines.iter().map(|l| l.id.clone()).collect();
        self.graph = AdjacencyIndex::build(&lines);
        self.cards = cards;
        self.lines = lines;
    }

    // --- Queries ---

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    #[must_use]
    pub fn graph(&self) -> &AdjacencyIndex {
        &self.graph
    }

    #[must_use]
    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Look up a card by id.
    #[must_use]
    pub fn card(&self, id: &str) -> Option<&Card> {
        self.card_index.get(id).and_then(|&i| self.cards.get(i))
    }

    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// The current board state.
    #[must_use]
    pub fn state(&self) -> &BoardState {
        self.store.get_state()
    }

    /// Whether a pulse on `card_id` is still live.
    #[must_use]
    pub fn is_pulsing(&self, card_id: &str) -> bool {
        self.pulses.get(card_id).is_some_and(|until| Instant::now() < *until)
    }

    // --- Store access ---

    /// Merge a patch into board state and notify listeners.
    pub fn set_state(&mut self, patch: BoardPatch) {
        self.store.set_state(patch);
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&BoardState) + 'static) -> ListenerId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Register a listener for pulse signals.
    pub fn on_pulse(&mut self, listener: impl FnMut(&Pulse) + 'static) {
        self.pulse_listeners.push(Box::new(listener));
    }

    // --- Playback ---

    /// Execute `actions` in order, each settling before the next starts.
    pub async fn run(&mut self, actions: &[Action]) {
        for (index, action) in actions.iter().enumerate() {
            self.phase = RunPhase::Running(index);
            debug!(index, action = action.name(), "executing action");
            self.execute(action).await;
        }
        self.phase = RunPhase::Idle;
    }

    /// Execute a single action, honoring its timing contract.
    pub async fn execute(&mut self, action: &Action) {
        match action {
            Action::Overview { zoom } => self.overview(*zoom).await,
            Action::Focus { card, zoom, duration } => {
                self.focus(card, *zoom, duration.and_then(transition_millis)).await;
            }
            Action::LinkHighlight { from, to, kind } => self.highlight_link(from, to, *kind),
            Action::RevealMeta { card, fields } => self.reveal_meta(card, fields),
            Action::Pin { card } => self.pin(card),
            Action::Unpin { card } => self.unpin(card),
            Action::Pulse { card } => self.pulse(card),
        }
    }

    /// Center on the bounding box of all positioned cards and clear dimming and highlights.
    ///
    /// With no positioned card the transform resets to the origin at once;
    /// otherwise the change waits a frame and then the settle delay.
    pub async fn overview(&mut self, zoom: Option<f64>) {
        let zoom = zoom.unwrap_or(OVERVIEW_ZOOM);
        if !self.cards.iter().any(|c| c.pos.is_some()) {
            self.set_state(
                BoardPatch::new()
                    .transform(Transform::new(0.0, 0.0, zoom))
                    .dimmed_cards(HashSet::new())
                    .highlighted_lines(HashSet::new()),
            );
            return;
        }
        let center = fit_bounds(&self.cards).center();
        sleep(self.pacing.frame).await;
        self.set_state(
            BoardPatch::new()
                .transform(Transform::new(-center.x, -center.y, zoom))
                .dimmed_cards(HashSet::new())
                .highlighted_lines(HashSet::new()),
        );
        sleep(self.pacing.overview_settle).await;
    }

    /// Center on `card_id`, select it, and dim every card outside its neighborhood.
    ///
    /// Returns `false` without touching state when the card is unknown or has
    /// no position.
    pub async fn focus(&mut self, card_id: &str, zoom: Option<f64>, duration: Option<Duration>) -> bool {
        let Some(pos) = self.card(card_id).and_then(|c| c.pos) else {
            warn!(card = card_id, "focus target missing or unplaced; skipping");
            return false;
        };
        let neighborhood = self.graph.neighborhood(card_id);
        let dimmed = self
            .cards
            .iter()
            .filter(|c| !neighborhood.contains(&c.id))
            .map(|c| c.id.clone())
            .collect::<HashSet<_>>();
        let zoom = zoom.unwrap_or(FOCUS_ZOOM);
        let duration = duration.unwrap_or(self.pacing.focus_default);

        sleep(self.pacing.frame).await;
        self.set_state(
            BoardPatch::new()
                .transform(Transform::new(-pos.x, -pos.y, zoom))
                .selected_card(Some(card_id.to_owned()))
                .dimmed_cards(dimmed),
        );
        sleep(duration).await;
        true
    }

    /// Highlight exactly the line `from-kind-to`.
    pub fn highlight_link(&mut self, from: &str, to: &str, kind: LineKind) {
        let id = line_id(from, kind, to);
        if !self.line_ids.contains(&id) {
            warn!(line = %id, "highlighting a line that is not loaded");
        }
        self.set_state(BoardPatch::new().highlighted_lines(HashSet::from([id])));
    }

    /// Force-expand `fields` on `card_id`, replacing any earlier entry.
    pub fn reveal_meta(&mut self, card_id: &str, fields: &[String]) {
        if !self.has_card(card_id, "revealMeta") {
            return;
        }
        let mut meta = self.state().expanded_meta.clone();
        meta.insert(card_id.to_owned(), fields.to_vec());
        self.set_state(BoardPatch::new().expanded_meta(meta));
    }

    pub fn pin(&mut self, card_id: &str) {
        if !self.has_card(card_id, "pin") || self.state().is_pinned(card_id) {
            return;
        }
        let mut pinned = self.state().pinned_cards.clone();
        pinned.insert(card_id.to_owned());
        self.set_state(BoardPatch::new().pinned_cards(pinned));
    }

    pub fn unpin(&mut self, card_id: &str) {
        if !self.state().is_pinned(card_id) {
            return;
        }
        let mut pinned = self.state().pinned_cards.clone();
        pinned.remove(card_id);
        self.set_state(BoardPatch::new().pinned_cards(pinned));
    }

    /// Fire a pulse on `card_id`. Does not wait for it to finish.
    pub fn pulse(&mut self, card_id: &str) {
        if !self.has_card(card_id, "pulse") {
            return;
        }
        let now = Instant::now();
        self.pulses.retain(|_, until| *until > now);
        self.pulses.insert(card_id.to_owned(), now + self.pacing.pulse);
        let pulse = Pulse { card: card_id.to_owned(), duration: self.pacing.pulse };
        for listener in &mut self.pulse_listeners {
            listener(&pulse);
        }
    }

    /// Clear the selection and any highlighted lines.
    pub fn clear_selection(&mut self) {
        self.set_state(
            BoardPatch::new()
                .selected_card(None)
                .highlighted_lines(HashSet::new()),
        );
    }

    fn has_card(&self, card_id: &str, action: &'static str) -> bool {
        if self.card_index.contains_key(card_id) {
            return true;
        }
        warn!(card = card_id, action, "action references unknown card; skipping");
        false
    }

    // --- Host input ---

    /// Apply a host command.
    pub fn dispatch(&mut self, command: BoardCommand) {
        match command {
            BoardCommand::PointerDown { screen } => {
                self.gesture = Gesture::Panning { last_screen: screen };
            }
            BoardCommand::PointerMove { screen } => {
                if let Gesture::Panning { last_screen } = self.gesture {
                    let transform = self
                        .state()
                        .transform
                        .panned(screen.x - last_screen.x, screen.y - last_screen.y);
                    self.gesture = Gesture::Panning { last_screen: screen };
                    self.set_state(BoardPatch::new().transform(transform));
                }
            }
            BoardCommand::PointerUp => self.gesture = Gesture::Idle,
            BoardCommand::Wheel { cursor, delta } => {
                let transform = zoom_at(&self.state().transform, cursor, delta.zoom_factor());
                self.set_state(BoardPatch::new().transform(transform));
            }
            BoardCommand::ZoomAt { cursor, factor } => {
                let transform = zoom_at(&self.state().transform, cursor, factor);
                self.set_state(BoardPatch::new().transform(transform));
            }
            BoardCommand::SetTransform(transform) => {
                if transform.is_finite() {
                    self.set_state(BoardPatch::new().transform(transform));
                }
            }
            BoardCommand::SelectCard(card_id) => {
                if self.has_card(&card_id, "select") {
                    self.set_state(BoardPatch::new().selected_card(Some(card_id)));
                }
            }
            BoardCommand::ClearSelection => self.clear_selection(),
            BoardCommand::SetFilters(filters) => self.set_state(BoardPatch::new().filters(filters)),
            BoardCommand::ToggleKind(kind) => self.update_filters(|f| toggle(&mut f.kinds, kind)),
            BoardCommand::ToggleTag(tag) => self.update_filters(|f| toggle(&mut f.tags, tag)),
            BoardCommand::SetOnlyConnected(only) => self.update_filters(|f| f.only_connected = only),
            BoardCommand::ResetFilters => self.set_state(BoardPatch::new().filters(Filters::default())),
        }
    }

    /// The active pointer gesture.
    #[must_use]
    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    fn update_filters(&mut self, edit: impl FnOnce(&mut Filters)) {
        let mut filters = self.state().filters.clone();
        edit(&mut filters);
        self.set_state(BoardPatch::new().filters(filters));
    }
}

fn toggle<T: Eq + std::hash::Hash>(set: &mut HashSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

/// A millisecond count from trail data, or `None` when it is negative or not finite.
fn transition_millis(ms: f64) -> Option<Duration> {
    match Duration::try_from_secs_f64(ms / 1000.0) {
        Ok(duration) => Some(duration),
        Err(err) => {
            warn!(ms, %err, "invalid focus duration; using default");
            None
        }
    }
}
