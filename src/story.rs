//! Step synchronizer: keeps trail playback, scroll position, and location in step.
//!
//! DESIGN
//! ======
//! Two sources move the current step. Explicit navigation (`go_to_step`,
//! keys, clicks) scrolls the story column, and the scroll observer reports
//! which step region sits in the middle of the viewport. Unguarded, each
//! would trigger the other.
//!
//! Explicit navigation therefore opens a lock window (`Pacing::nav_settle`)
//! and bumps a generation counter. Observer events are dropped while the
//! window is open, and events computed under an older generation are
//! dropped even after it closes. The window is a deadline, not a timer task,
//! so nothing has to run to release it.
//!
//! Every step change runs the step's actions on the engine and mirrors the
//! `(trail, step)` pair to the host location, omitting the default trail and
//! step 0. Navigation awaits the step's actions, so two `run` calls never
//! overlap.

#[cfg(test)]
#[path = "story_test.rs"]
mod story_test;

use tokio::time::Instant;
use tracing::{debug, info};
use url::form_urlencoded;

use crate::consts::{INTERSECTION_THRESHOLD, OBSERVER_BAND_MARGIN};
use crate::doc::Trail;
use crate::engine::Engine;
use crate::input::{Key, KeyCommand};

// =============================================================================
// LOCATION
// =============================================================================

/// The `trail` / `step` query pair mirrored to the location bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavParams {
    pub trail: Option<String>,
    pub step: Option<String>,
}

impl NavParams {
    /// Parse `trail` and `step` out of a query string. A leading `?` is allowed.
    ///
    /// Values are form-decoded. Empty values are ignored and the first
    /// occurrence of a key wins.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "trail" => &mut params.trail,
                "step" => &mut params.step,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    /// Render as a form-encoded query string without the leading `?`. Empty when both are absent.
    #[must_use]
    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(trail) = &self.trail {
            query.append_pair("trail", trail);
        }
        if let Some(step) = &self.step {
            query.append_pair("step", step);
        }
        query.finish()
    }
}

/// The page hosting the story column.
pub trait StoryHost {
    /// Replace the location query without adding a history entry.
    fn replace_location(&mut self, params: &NavParams);

    /// Smoothly scroll the region of step `index` to the middle of the viewport.
    fn scroll_step_into_view(&mut self, index: usize);
}

// =============================================================================
// SCROLL OBSERVER
// =============================================================================

/// Vertical extent of one step's region in the story column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepRegion {
    pub index: usize,
    pub top: f64,
    pub height: f64,
}

/// A step region that crossed the visibility threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub step_index: usize,
    /// Visible fraction of the region inside the observer band.
    pub ratio: f64,
    /// Synchronizer generation the observation was made under.
    pub generation: u64,
}

/// Decides which step region is centered in the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollObserver {
    /// Minimum visible fraction.
    pub threshold: f64,
    /// Fraction of the viewport excluded at top and bottom.
    pub band_margin: f64,
}

impl Default for ScrollObserver {
    fn default() -> Self {
        Self { threshold: INTERSECTION_THRESHOLD, band_margin: OBSERVER_BAND_MARGIN }
    }
}

impl ScrollObserver {
    /// Fraction of `region` inside the centered band of the viewport.
    #[must_use]
    pub fn visible_ratio(&self, viewport_top: f64, viewport_height: f64, region: &StepRegion) -> f64 {
        if region.height <= 0.0 || viewport_height <= 0.0 {
            return 0.0;
        }
        let band_top = viewport_top + viewport_height * self.band_margin;
        let band_bottom = viewport_top + viewport_height * (1.0 - self.band_margin);
        let overlap = (band_bottom.min(region.top + region.height) - band_top.max(region.top)).max(0.0);
        (overlap / region.height).clamp(0.0, 1.0)
    }

    /// The most visible region meeting the threshold, if any.
    ///
    /// Ties go to the region whose center is nearer the viewport center.
    #[must_use]
    pub fn observe(
        &self,
        viewport_top: f64,
        viewport_height: f64,
        regions: &[StepRegion],
        generation: u64,
    ) -> Option<Intersection> {
        let center = viewport_top + viewport_height / 2.0;
        let distance = |r: &StepRegion| (r.top + r.height / 2.0 - center).abs();
        regions
            .iter()
            .map(|r| (r, self.visible_ratio(viewport_top, viewport_height, r)))
            .filter(|&(_, ratio)| ratio >= self.threshold)
            .min_by(|&(a, ra), &(b, rb)| rb.total_cmp(&ra).then_with(|| distance(a).total_cmp(&distance(b))))
            .map(|(r, ratio)| Intersection { step_index: r.index, ratio, generation })
    }
}

// =============================================================================
// SYNCHRONIZER
// =============================================================================

/// Whether observer events are currently accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    /// Inside the lock window of an explicit navigation.
    Locked,
}

/// Owns the engine and reconciles the two step drivers.
#[derive(Debug)]
pub struct StepSynchronizer<H> {
    engine: Engine,
    trails: Vec<Trail>,
    trail_index: usize,
    step_index: usize,
    generation: u64,
    locked_until: Option<Instant>,
    observer: ScrollObserver,
    host: H,
}

impl<H: StoryHost> StepSynchronizer<H> {
    /// Start on the first step of the first trail. Nothing runs until
    /// [`restore`](Self::restore) or a navigation call.
    #[must_use]
    pub fn new(engine: Engine, trails: Vec<Trail>, host: H) -> Self {
        Self {
            engine,
            trails,
            trail_index: 0,
            step_index: 0,
            generation: 0,
            locked_until: None,
            observer: ScrollObserver::default(),
            host,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    #[must_use]
    pub fn trails(&self) -> &[Trail] {
        &self.trails
    }

    #[must_use]
    pub fn current_trail(&self) -> Option<&Trail> {
        self.trails.get(self.trail_index)
    }

    #[must_use]
    pub fn current_step(&self) -> usize {
        self.step_index
    }

    #[must_use]
    pub fn step_count(&self) -> usize {
        self.current_trail().map_or(0, |t| t.steps.len())
    }

    /// Generation observers must tag their events with.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn phase(&self) -> SyncPhase {
        match self.locked_until {
            Some(until) if Instant::now() < until => SyncPhase::Locked,
            _ => SyncPhase::Idle,
        }
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.phase() == SyncPhase::Locked
    }

    /// The location pair for the current position.
    #[must_use]
    pub fn nav_params(&self) -> NavParams {
        let Some(trail) = self.current_trail() else {
            return NavParams::default();
        };
        NavParams {
            trail: (self.trail_index != 0).then(|| trail.id.clone()),
            step: if self.step_index == 0 {
                None
            } else {
                trail.steps.get(self.step_index).map(|s| s.id.clone())
            },
        }
    }

    // --- Drivers ---

    /// Resolve a location pair and play the step it names.
    ///
    /// An unknown trail falls back to the first trail, an unknown step to step 0.
    /// Without any trail the board opens on an overview instead.
    pub async fn restore(&mut self, params: &NavParams) {
        self.trail_index = params
            .trail
            .as_deref()
            .and_then(|id| self.trails.iter().position(|t| t.id == id))
            .unwrap_or(0);
        self.step_index = params
            .step
            .as_deref()
            .and_then(|id| self.current_trail().and_then(|t| t.step_index(id)))
            .unwrap_or(0);
        info!(trail = self.trail_index, step = self.step_index, "restored story position");
        self.host.replace_location(&self.nav_params());
        if self.trails.is_empty() {
            self.engine.overview(None).await;
            return;
        }
        self.run_current_step().await;
    }

    /// Switch to the trail with `trail_id` and play its first step.
    pub async fn select_trail(&mut self, trail_id: &str) -> bool {
        let Some(index) = self.trails.iter().position(|t| t.id == trail_id) else {
            debug!(trail = trail_id, "unknown trail");
            return false;
        };
        self.trail_index = index;
        self.step_index = 0;
        self.generation += 1;
        info!(trail = trail_id, "trail selected");
        self.host.replace_location(&self.nav_params());
        self.run_current_step().await;
        true
    }

    /// Explicit navigation to step `index`.
    ///
    /// Out-of-range indices are ignored. Otherwise the lock window opens, the
    /// location is mirrored, the host scrolls, and the step's actions run if
    /// the step changed.
    pub async fn go_to_step(&mut self, index: usize) -> bool {
        if index >= self.step_count() {
            debug!(index, count = self.step_count(), "navigation out of range");
            return false;
        }
        self.generation += 1;
        self.locked_until = Some(Instant::now() + self.engine.pacing().nav_settle);
        let changed = index != self.step_index;
        self.step_index = index;
        info!(step = index, generation = self.generation, "navigating to step");
        self.host.replace_location(&self.nav_params());
        self.host.scroll_step_into_view(index);
        if changed {
            self.run_current_step().await;
        }
        true
    }

    pub async fn next_step(&mut self) -> bool {
        self.go_to_step(self.step_index + 1).await
    }

    pub async fn previous_step(&mut self) -> bool {
        match self.step_index.checked_sub(1) {
            Some(index) => self.go_to_step(index).await,
            None => false,
        }
    }

    pub async fn first_step(&mut self) -> bool {
        self.go_to_step(0).await
    }

    pub async fn last_step(&mut self) -> bool {
        match self.step_count().checked_sub(1) {
            Some(index) => self.go_to_step(index).await,
            None => false,
        }
    }

    /// Observer-driven step change. Returns whether the step changed.
    pub async fn on_intersection(&mut self, event: Intersection) -> bool {
        if self.is_locked() {
            debug!(step = event.step_index, "observer event during navigation lock; ignored");
            return false;
        }
        if event.generation != self.generation {
            debug!(
                step = event.step_index,
                event_generation = event.generation,
                generation = self.generation,
                "stale observer event; ignored"
            );
            return false;
        }
        if event.ratio < self.observer.threshold
            || event.step_index >= self.step_count()
            || event.step_index == self.step_index
        {
            return false;
        }
        self.step_index = event.step_index;
        debug!(step = event.step_index, ratio = event.ratio, "scrolled to step");
        self.host.replace_location(&self.nav_params());
        self.run_current_step().await;
        true
    }

    /// Observe the given scroll position and apply the result.
    pub async fn on_scroll(&mut self, viewport_top: f64, viewport_height: f64, regions: &[StepRegion]) -> bool {
        if self.is_locked() {
            return false;
        }
        match self.observer.observe(viewport_top, viewport_height, regions, self.generation) {
            Some(event) => self.on_intersection(event).await,
            None => false,
        }
    }

    /// Apply a keyboard key. Returns whether it had an effect.
    pub async fn handle_key(&mut self, key: Key) -> bool {
        match key.command() {
            KeyCommand::Overview => {
                self.engine.overview(None).await;
                true
            }
            KeyCommand::NextStep => self.next_step().await,
            KeyCommand::PreviousStep => self.previous_step().await,
            KeyCommand::FirstStep => self.first_step().await,
            KeyCommand::LastStep => self.last_step().await,
            KeyCommand::ClearSelection => {
                self.engine.clear_selection();
                true
            }
        }
    }

    async fn run_current_step(&mut self) {
        let Some(step) = self
            .trails
            .get(self.trail_index)
            .and_then(|t| t.steps.get(self.step_index))
        else {
            return;
        };
        debug!(step = %step.id, actions = step.actions.len(), "running step");
        self.engine.run(&step.actions).await;
    }
}
