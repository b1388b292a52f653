use crate::AuthorError;
use crate::colors::ColorTable;
use skein_common::{Camera, NodeId};
use skein_persist::{StateRecord, read_state, write_state};
use skein_stream::WorldGraph;
use std::path::Path;
use tracing::info;

/// Per-session state that lives next to the world graph: the camera and
/// the debug-render switch.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub camera: Camera,
    pub render_debug: bool,
}

fn node_order(graph: &WorldGraph) -> Vec<NodeId> {
    graph.iter().map(|n| n.index()).collect()
}

/// Save the full session: camera, graph, color annotations, debug flag.
/// With `wait_for_loads` every pending node read settles first, so the
/// state on disk reflects a quiescent graph.
pub fn save_state(
    path: impl AsRef<Path>,
    graph: &mut WorldGraph,
    session: &Session,
    colors: &ColorTable,
    wait_for_loads: bool,
) -> Result<(), AuthorError> {
    if wait_for_loads {
        graph.wait_all();
    }
    let record = StateRecord {
        camera: session.camera,
        world_graph: graph.to_record(),
        node_colors: colors.to_record(&node_order(graph)),
        render_debug: session.render_debug,
    };
    write_state(&path, &record)?;
    info!(path = %path.as_ref().display(), nodes = record.world_graph.nodes.len(), "session saved");
    Ok(())
}

/// Load a session file into the graph. Nodes come back sleeping
/// (unloaded); color annotations and camera state are returned alongside.
pub fn load_state(
    path: impl AsRef<Path>,
    graph: &mut WorldGraph,
) -> Result<(Session, ColorTable), AuthorError> {
    let record = read_state(&path)?;
    graph.load_record(&record.world_graph);

    let mut colors = ColorTable::new();
    colors.apply_record(&node_order(graph), &record.node_colors);

    info!(path = %path.as_ref().display(), nodes = graph.node_count(), "session loaded");
    Ok((
        Session {
            camera: record.camera,
            render_debug: record.render_debug,
        },
        colors,
    ))
}
