//! Editor bridge: everything the authoring UI needs that is not core
//! streaming state.
//!
//! # Invariants
//! - Every authoring operation is reversible; rejected operations never
//!   reach the undo stack.
//! - Color annotations are tooling state: a side table keyed by node id,
//!   never stored inside nodes.

mod actions;
mod colors;
mod session;

pub use actions::{ActionStack, NodeAction};
pub use colors::{ColorTable, NODE_DEFAULT_COLOR};
pub use session::{Session, load_state, save_state};

use skein_persist::PersistError;
use skein_stream::StreamError;

/// Errors from authoring operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthorError {
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}
