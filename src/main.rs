use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use tracing::{debug, warn};

use trailboard::camera::Size;
use trailboard::config::Pacing;
use trailboard::doc::{DataError, Dataset};
use trailboard::engine::Engine;
use trailboard::input::Key;
use trailboard::minimap::{MinimapProjector, MinimapStats};
use trailboard::persist::{FileSnapshotSink, attach_sink, restore_state};
use trailboard::render;
use trailboard::story::{NavParams, StepSynchronizer, StoryHost};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("unknown trail `{0}`")]
    UnknownTrail(String),
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
    #[error("failed to render output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "trailboard", about = "Play board trails from the terminal")]
struct Cli {
    /// Directory holding cards.json, lines.json, and trails.json.
    #[arg(long, env = "TRAILBOARD_DATA", default_value = "data")]
    data: PathBuf,

    /// Snapshot file for the transform and filters.
    #[arg(long, env = "TRAILBOARD_STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Location query to start from, e.g. `trail=career&step=intro`.
    #[arg(long, env = "TRAILBOARD_LOCATION", default_value = "")]
    location: String,

    #[arg(long, default_value_t = 1000.0)]
    viewport_width: f64,

    #[arg(long, default_value_t = 600.0)]
    viewport_height: f64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play every remaining step of a trail, printing one frame per step.
    Play(PlayArgs),
    /// Apply key names read line by line (`down`, `End`, `0`, `esc`, ...).
    Keys(KeysArgs),
    /// Print the scene and minimap for the restored position.
    Show,
}

#[derive(Args, Debug)]
struct PlayArgs {
    /// Trail to play instead of the one named by the location.
    #[arg(long)]
    trail: Option<String>,
}

#[derive(Args, Debug)]
struct KeysArgs {
    #[arg(long, default_value = "-", help = "Input file path, or - for stdin")]
    input: String,
}

/// Host that keeps the location in memory and logs scroll requests.
#[derive(Debug, Default)]
struct ConsoleHost {
    location: String,
}

impl StoryHost for ConsoleHost {
    fn replace_location(&mut self, params: &NavParams) {
        self.location = params.to_query();
        debug!(location = %self.location, "location replaced");
    }

    fn scroll_step_into_view(&mut self, index: usize) {
        debug!(step = index, "scroll step into view");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let dataset = Dataset::load_dir(&cli.data)?;
    let sink = cli.state_file.clone().map(FileSnapshotSink::new);
    let initial = restore_state(sink.as_ref().and_then(FileSnapshotSink::load).as_deref());

    let mut engine = Engine::with_state(dataset.cards, dataset.lines, Pacing::from_env(), initial);
    if let Some(sink) = sink {
        attach_sink(&mut engine, sink);
    }
    let mut story = StepSynchronizer::new(engine, dataset.trails, ConsoleHost::default());
    story.restore(&NavParams::from_query(&cli.location)).await;

    let viewport = Size::new(cli.viewport_width, cli.viewport_height);
    match cli.command {
        Command::Play(args) => run_play(&mut story, args).await,
        Command::Keys(args) => run_keys(&mut story, args).await,
        Command::Show => print_json(&show(&story, viewport)),
    }
}

async fn run_play(story: &mut StepSynchronizer<ConsoleHost>, args: PlayArgs) -> Result<(), CliError> {
    if let Some(trail) = args.trail {
        if !story.select_trail(&trail).await {
            return Err(CliError::UnknownTrail(trail));
        }
    }
    print_json(&frame(story))?;
    while story.next_step().await {
        print_json(&frame(story))?;
    }
    Ok(())
}

async fn run_keys(story: &mut StepSynchronizer<ConsoleHost>, args: KeysArgs) -> Result<(), CliError> {
    let reader: Box<dyn BufRead> = if args.input == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        Box::new(BufReader::new(File::open(&args.input)?))
    };
    for line in reader.lines() {
        let line = line?;
        let name = line.trim();
        if name.is_empty() {
            continue;
        }
        if name == "q" || name == "quit" {
            break;
        }
        let Some(key) = Key::from_name(name) else {
            warn!(key = name, "unknown key");
            continue;
        };
        story.handle_key(key).await;
        print_json(&frame(story))?;
    }
    Ok(())
}

/// Position and board state after the last command.
fn frame(story: &StepSynchronizer<ConsoleHost>) -> Value {
    let engine = story.engine();
    let state = engine.state();
    let trail = story.current_trail();
    json!({
        "trail": trail.map(|t| t.id.as_str()),
        "step": story.current_step(),
        "stepId": trail.and_then(|t| t.steps.get(story.current_step())).map(|s| s.id.as_str()),
        "location": story.host().location,
        "transform": state.transform,
        "selectedCard": state.selected_card,
        "pinnedCards": sorted(&state.pinned_cards),
        "highlightedLines": sorted(&state.highlighted_lines),
        "dimmedCards": sorted(&state.dimmed_cards),
        "stats": MinimapStats::new(engine.cards(), &state.transform),
    })
}

fn show(story: &StepSynchronizer<ConsoleHost>, viewport: Size) -> Value {
    let engine = story.engine();
    let projector = MinimapProjector::new(engine.cards()).with_viewport(viewport);
    json!({
        "frame": frame(story),
        "scene": render::project(engine),
        "minimap": {
            "size": projector.size(),
            "viewport": projector.viewport_rect(&engine.state().transform),
            "dots": projector.dots(engine.cards()),
        },
    })
}

fn sorted(set: &HashSet<String>) -> Vec<&str> {
    let mut items: Vec<_> = set.iter().map(String::as_str).collect();
    items.sort_unstable();
    items
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
