//! Ingestion relay
//!
//! Bridges a single producer connection to the broadcast session:
//! start on accept, forward chunks in arrival order, stop on every exit.

mod ingest;
mod source;

pub use ingest::{IngestRelay, RelayStats};
pub use source::{ChunkSource, Frame};
