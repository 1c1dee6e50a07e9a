#![allow(clippy::float_cmp)]

use std::time::Duration;

use super::*;
use crate::camera::Point;
use crate::config::Pacing;
use crate::doc::{Action, Card, CardKind, Line, LineKind, Step};

#[derive(Debug, Default)]
struct RecordingHost {
    locations: Vec<String>,
    scrolls: Vec<usize>,
}

impl StoryHost for RecordingHost {
    fn replace_location(&mut self, params: &NavParams) {
        self.locations.push(params.to_query());
    }

    fn scroll_step_into_view(&mut self, index: usize) {
        self.scrolls.push(index);
    }
}

fn step(id: &str, actions: Vec<Action>) -> Step {
    Step { id: id.into(), actions }
}

fn pin(card: &str) -> Action {
    Action::Pin { card: card.into() }
}

fn trails() -> Vec<Trail> {
    vec![
        Trail {
            id: "tour".into(),
            title: "Tour".into(),
            steps: vec![
                step("intro", vec![Action::Overview { zoom: None }]),
                step("meet", vec![pin("a")]),
                step("skills", vec![Action::Focus { card: "b".into(), zoom: None, duration: None }]),
                step("end", vec![Action::LinkHighlight { from: "a".into(), to: "b".into(), kind: LineKind::Uses }]),
            ],
        },
        Trail {
            id: "side".into(),
            title: "Side".into(),
            steps: vec![step("s0", vec![pin("c")]), step("s1", Vec::new())],
        },
    ]
}

fn story() -> StepSynchronizer<RecordingHost> {
    let cards = vec![
        Card::new("a", CardKind::Profile, Some(Point::new(0.0, 0.0))),
        Card::new("b", CardKind::Skill, Some(Point::new(100.0, 0.0))),
        Card::new("c", CardKind::Project, Some(Point::new(0.0, 100.0))),
    ];
    let lines = vec![Line::new("a", LineKind::Uses, "b")];
    let engine = Engine::new(cards, lines, Pacing::default());
    StepSynchronizer::new(engine, trails(), RecordingHost::default())
}

fn event(story: &StepSynchronizer<RecordingHost>, step_index: usize) -> Intersection {
    Intersection { step_index, ratio: 1.0, generation: story.generation() }
}

async fn settle() {
    tokio::time::advance(Duration::from_millis(1000)).await;
}

// --- NavParams ---

#[test]
fn nav_params_parse_known_keys() {
    let params = NavParams::from_query("?trail=side&step=s1&utm=x");
    assert_eq!(params, NavParams { trail: Some("side".into()), step: Some("s1".into()) });
}

#[test]
fn nav_params_ignore_empty_values() {
    assert_eq!(NavParams::from_query("trail=&step"), NavParams::default());
    assert_eq!(NavParams::from_query(""), NavParams::default());
}

#[test]
fn nav_params_render() {
    assert_eq!(NavParams::default().to_query(), "");
    assert_eq!(NavParams { trail: None, step: Some("meet".into()) }.to_query(), "step=meet");
    assert_eq!(
        NavParams { trail: Some("side".into()), step: Some("s1".into()) }.to_query(),
        "trail=side&step=s1"
    );
}

#[test]
fn nav_params_escape_reserved_characters() {
    let params = NavParams { trail: Some("q&a-tour".into()), step: Some("a=b c".into()) };
    let query = params.to_query();
    assert_eq!(query, "trail=q%26a-tour&step=a%3Db+c");
    assert_eq!(NavParams::from_query(&query), params);
}

#[test]
fn nav_params_decode_browser_locations() {
    let params = NavParams::from_query("?trail=%E6%97%85%E7%A8%8B&step=a%20b");
    assert_eq!(params, NavParams { trail: Some("旅程".into()), step: Some("a b".into()) });
}

#[test]
fn nav_params_first_value_wins() {
    let params = NavParams::from_query("trail=side&trail=main&step=&step=s1");
    assert_eq!(params, NavParams { trail: Some("side".into()), step: Some("s1".into()) });
}

// --- restore / select_trail ---

#[tokio::test(start_paused = true)]
async fn restore_defaults_to_first_step_and_runs_it() {
    let mut story = story();
    story.restore(&NavParams::default()).await;
    assert_eq!(story.current_step(), 0);
    assert_eq!(story.current_trail().map(|t| t.id.as_str()), Some("tour"));
    assert_eq!(story.host().locations, [""]);
    assert_eq!(story.engine().state().transform.x, -50.0);
}

#[tokio::test(start_paused = true)]
async fn restore_without_trails_opens_on_overview() {
    let cards = vec![
        Card::new("a", CardKind::Profile, Some(Point::new(0.0, 0.0))),
        Card::new("b", CardKind::Skill, Some(Point::new(200.0, 100.0))),
    ];
    let engine = Engine::new(cards, Vec::new(), Pacing::default());
    let mut story = StepSynchronizer::new(engine, Vec::new(), RecordingHost::default());
    story.restore(&NavParams::default()).await;
    let t = story.engine().state().transform;
    assert_eq!((t.x, t.y, t.scale), (-100.0, -50.0, 0.5));
    assert_eq!(story.host().locations, [""]);
}

#[tokio::test(start_paused = true)]
async fn restore_resolves_trail_and_step() {
    let mut story = story();
    story.restore(&NavParams::from_query("trail=side&step=s1")).await;
    assert_eq!(story.current_trail().map(|t| t.id.as_str()), Some("side"));
    assert_eq!(story.current_step(), 1);
    assert_eq!(story.host().locations, ["trail=side&step=s1"]);
}

#[tokio::test(start_paused = true)]
async fn restore_unknown_ids_fall_back() {
    let mut story = story();
    story.restore(&NavParams::from_query("trail=nope&step=nope")).await;
    assert_eq!(story.current_trail().map(|t| t.id.as_str()), Some("tour"));
    assert_eq!(story.current_step(), 0);

    let mut story = self::story();
    story.restore(&NavParams::from_query("trail=side&step=meet")).await;
    assert_eq!(story.current_trail().map(|t| t.id.as_str()), Some("side"));
    assert_eq!(story.current_step(), 0);
    assert!(story.engine().state().is_pinned("c"));
}

#[tokio::test(start_paused = true)]
async fn select_trail_resets_to_first_step() {
    let mut story = story();
    story.restore(&NavParams::default()).await;
    story.go_to_step(2).await;
    let generation = story.generation();

    assert!(story.select_trail("side").await);
    assert_eq!(story.current_step(), 0);
    assert!(story.generation() > generation);
    assert_eq!(story.host().locations.last().map(String::as_str), Some("trail=side"));
    assert!(story.engine().state().is_pinned("c"));

    assert!(!story.select_trail("missing").await);
    assert_eq!(story.current_trail().map(|t| t.id.as_str()), Some("side"));
}

// --- explicit navigation ---

#[tokio::test(start_paused = true)]
async fn go_to_step_runs_actions_mirrors_and_scrolls() {
    let mut story = story();
    assert!(story.go_to_step(1).await);
    assert_eq!(story.current_step(), 1);
    assert!(story.engine().state().is_pinned("a"));
    assert_eq!(story.host().locations, ["step=meet"]);
    assert_eq!(story.host().scrolls, [1]);
    assert!(story.is_locked());
}

#[tokio::test(start_paused = true)]
async fn go_to_step_out_of_range_is_a_no_op() {
    let mut story = story();
    assert!(!story.go_to_step(4).await);
    assert_eq!(story.current_step(), 0);
    assert_eq!(story.generation(), 0);
    assert!(!story.is_locked());
    assert!(story.host().locations.is_empty());
    assert!(story.host().scrolls.is_empty());
}

#[tokio::test(start_paused = true)]
async fn go_to_current_step_does_not_rerun_actions() {
    let mut story = story();
    story.go_to_step(1).await;
    story.engine_mut().unpin("a");
    assert!(story.go_to_step(1).await);
    assert!(!story.engine().state().is_pinned("a"));
    assert_eq!(story.host().scrolls, [1, 1]);
}

#[tokio::test(start_paused = true)]
async fn lock_window_lasts_the_settle_delay() {
    let mut story = story();
    story.go_to_step(1).await;
    assert_eq!(story.phase(), SyncPhase::Locked);
    tokio::time::advance(Duration::from_millis(999)).await;
    assert!(story.is_locked());
    tokio::time::advance(Duration::from_millis(1)).await;
    assert_eq!(story.phase(), SyncPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn relative_navigation() {
    let mut story = story();
    assert!(!story.previous_step().await);
    assert!(story.last_step().await);
    assert_eq!(story.current_step(), 3);
    assert!(!story.next_step().await);
    assert!(story.previous_step().await);
    assert_eq!(story.current_step(), 2);
    assert!(story.first_step().await);
    assert_eq!(story.current_step(), 0);
}

// --- observer events ---

#[tokio::test(start_paused = true)]
async fn observer_is_ignored_during_lock_window() {
    let mut story = story();
    story.go_to_step(1).await;
    for ratio in [0.0, 0.6, 0.9, 1.0] {
        let ev = Intersection { step_index: 3, ratio, generation: story.generation() };
        assert!(!story.on_intersection(ev).await);
        assert_eq!(story.current_step(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn stale_generation_is_ignored_after_lock() {
    let mut story = story();
    let stale = event(&story, 3);
    story.go_to_step(1).await;
    settle().await;
    assert!(!story.on_intersection(stale).await);
    assert_eq!(story.current_step(), 1);
}

#[tokio::test(start_paused = true)]
async fn observer_changes_step_after_lock() {
    let mut story = story();
    story.go_to_step(1).await;
    settle().await;
    assert!(story.on_intersection(event(&story, 3)).await);
    assert_eq!(story.current_step(), 3);
    assert!(story.engine().state().is_highlighted("a-uses-b"));
    assert_eq!(story.host().locations.last().map(String::as_str), Some("step=end"));
    assert_eq!(story.host().scrolls, [1]);
    assert!(!story.is_locked());
}

#[tokio::test(start_paused = true)]
async fn observer_below_threshold_or_same_step_is_ignored() {
    let mut story = story();
    let weak = Intersection { step_index: 2, ratio: 0.59, generation: story.generation() };
    assert!(!story.on_intersection(weak).await);
    assert!(!story.on_intersection(event(&story, 0)).await);
    assert!(!story.on_intersection(event(&story, 9)).await);
    assert_eq!(story.current_step(), 0);
}

#[tokio::test(start_paused = true)]
async fn on_scroll_picks_the_centered_region() {
    let mut story = story();
    let regions: Vec<_> = [0.0, 400.0, 800.0, 1200.0]
        .into_iter()
        .enumerate()
        .map(|(index, top)| StepRegion { index, top, height: 400.0 })
        .collect();
    assert!(story.on_scroll(800.0, 1000.0, &regions).await);
    assert_eq!(story.current_step(), 3);
}

// --- keys ---

#[tokio::test(start_paused = true)]
async fn keys_drive_navigation_and_board() {
    let mut story = story();
    assert!(story.handle_key(Key::ArrowDown).await);
    assert_eq!(story.current_step(), 1);
    assert!(story.handle_key(Key::End).await);
    assert_eq!(story.current_step(), 3);
    assert!(story.engine().state().selected_card.is_none());

    assert!(story.handle_key(Key::Home).await);
    story.engine_mut().focus("b", None, None).await;
    story.engine_mut().highlight_link("a", "b", LineKind::Uses);
    assert!(story.handle_key(Key::Escape).await);
    assert!(story.engine().state().selected_card.is_none());
    assert!(story.engine().state().highlighted_lines.is_empty());
    assert!(!story.engine().state().dimmed_cards.is_empty());

    assert!(story.handle_key(Key::Digit0).await);
    assert!(story.engine().state().dimmed_cards.is_empty());
}

// --- ScrollObserver ---

#[test]
fn visible_ratio_counts_only_the_center_band() {
    let observer = ScrollObserver::default();
    let region = |top: f64| StepRegion { index: 0, top, height: 100.0 };
    assert!((observer.visible_ratio(0.0, 1000.0, &region(450.0)) - 1.0).abs() < 1e-12);
    assert!((observer.visible_ratio(0.0, 1000.0, &region(150.0)) - 0.5).abs() < 1e-12);
    assert!(observer.visible_ratio(0.0, 1000.0, &region(0.0)).abs() < 1e-12);
    assert!(observer.visible_ratio(0.0, 1000.0, &StepRegion { index: 0, top: 0.0, height: 0.0 }).abs() < 1e-12);
}

#[test]
fn observe_requires_threshold() {
    let observer = ScrollObserver::default();
    let regions = [StepRegion { index: 0, top: 100.0, height: 200.0 }];
    assert!(observer.observe(0.0, 1000.0, &regions, 0).is_none());
}

#[test]
fn observe_prefers_the_region_nearest_center_on_ties() {
    let observer = ScrollObserver::default();
    let regions = [
        StepRegion { index: 0, top: 250.0, height: 100.0 },
        StepRegion { index: 1, top: 450.0, height: 100.0 },
        StepRegion { index: 2, top: 650.0, height: 100.0 },
    ];
    let hit = observer.observe(0.0, 1000.0, &regions, 7).unwrap();
    assert_eq!(hit.step_index, 1);
    assert_eq!(hit.generation, 7);
}
