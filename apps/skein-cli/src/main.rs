use clap::{Parser, Subcommand};
use glam::Vec2;
use skein_author::{ColorTable, Session, load_state, save_state};
use skein_common::Camera;
use skein_kernel::{DebugFlags, DrawList};
use skein_stream::WorldGraph;
use skein_tools::GraphInspector;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skein-cli", about = "CLI tool for skein world-graph operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and a streaming self-check
    Info,
    /// Run a streaming demo: walk the reference position across a small graph
    Demo {
        /// Number of frames to simulate
        #[arg(short, long, default_value = "240")]
        ticks: u32,
        /// Directory for node content files
        #[arg(short, long, default_value = "skein_demo")]
        dir: PathBuf,
    },
    /// Build the demo graph and save it as a session state file
    Save {
        /// Path of the state file to write
        #[arg(default_value = "skein_demo/session.state.json")]
        path: PathBuf,
        /// Directory for node content files
        #[arg(short, long, default_value = "skein_demo")]
        dir: PathBuf,
    },
    /// Load a session state file and print the node table
    Inspect {
        /// Path of the state file to read
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("skein-cli v{}", env!("CARGO_PKG_VERSION"));
            let graph = WorldGraph::new();
            println!("{}", GraphInspector::summary(&graph));
        }
        Commands::Demo { ticks, dir } => run_demo(ticks, &dir)?,
        Commands::Save { path, dir } => {
            let mut graph = demo_graph(&dir);
            let mut session = Session::default();
            session.camera.look_at(Vec2::new(800.0, 600.0));
            let mut colors = ColorTable::new();
            if let Some(first) = graph.iter().next().map(|n| n.index()) {
                colors.set(first, [200, 120, 40, 255]);
            }
            save_state(&path, &mut graph, &session, &colors, true)?;
            graph.unload_all();
            println!("Saved session to {}", path.display());
        }
        Commands::Inspect { path } => {
            let mut graph = WorldGraph::new();
            let (session, _colors) = load_state(&path, &mut graph)?;
            println!("{}", GraphInspector::summary(&graph));
            println!(
                "Camera: center=({:.1}, {:.1}) zoom={:.2} debug={}",
                session.camera.center.x,
                session.camera.center.y,
                session.camera.zoom,
                session.render_debug
            );
            for info in GraphInspector::list_nodes(&graph) {
                println!("  {info}");
            }
        }
    }

    Ok(())
}

/// Three nodes: two adjacent connected halls and a detached island.
fn demo_graph(dir: &Path) -> WorldGraph {
    let mut graph = WorldGraph::new();
    let hub = graph.create_node("hub", dir.join("hub.node"));
    let east = graph.create_node("east_hall", dir.join("east_hall.node"));
    let island = graph.create_node("island", dir.join("island.node"));

    graph.set_node_size(hub, Vec2::new(1600.0, 1200.0)).unwrap();
    graph.set_node_size(east, Vec2::new(1600.0, 1200.0)).unwrap();
    graph.set_node_position(east, Vec2::new(1600.0, 0.0)).unwrap();
    graph.set_node_size(island, Vec2::new(800.0, 800.0)).unwrap();
    graph
        .set_node_position(island, Vec2::new(6000.0, 6000.0))
        .unwrap();
    graph.connect(hub, east).unwrap();
    graph
}

fn run_demo(ticks: u32, dir: &Path) -> anyhow::Result<()> {
    let mut graph = demo_graph(dir);
    let mut camera = Camera::new(Vec2::new(800.0, 600.0));

    // Walk from the hub's center into the east hall and on toward the
    // detached island, watching nodes stream in and out.
    let start = Vec2::new(800.0, 600.0);
    let end = Vec2::new(6400.0, 6400.0);

    for tick in 0..ticks {
        let t = tick as f32 / ticks.max(1) as f32;
        let reference = start.lerp(end, t);
        camera.look_at(reference);
        graph.update_reference_position(reference);
        graph.update(1.0 / 60.0, &camera);

        if tick % 60 == 0 {
            println!("tick {tick:4}: {}", GraphInspector::summary(&graph));
        }
    }

    graph.wait_all();
    let mut out = DrawList::new();
    graph.render_debug(&mut out, &camera, DebugFlags::default());
    println!(
        "final frame: {} draw commands, {}",
        out.len(),
        GraphInspector::summary(&graph)
    );
    for info in GraphInspector::list_nodes(&graph) {
        println!("  {info}");
    }

    graph.unload_all();
    println!("all nodes unloaded");
    Ok(())
}
