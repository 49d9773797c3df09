//! gbtrain model - regression tree ensembles
//!
//! Holds the artifact produced by `gbtrain-trainer`:
//!
//! - **Trees**: flat node vectors, node 0 is the root, `value <= threshold`
//!   goes left
//! - **Ensemble**: append-only list of trees, inference sums weighted leaf
//!   outputs
//! - **Export**: a read-only node walk plus canonical JSON and blake3 hashing
//!
//! # Model Format
//!
//! ```json
//! {
//!   "feature_count": 1,
//!   "trees": [
//!     {
//!       "nodes": [
//!         {"depth":0,"id":0,"kind":{"feature_idx":0,"left":1,"right":2,"threshold":2.5,"type":"split"},"parent":null,"role":"root","summary":{...}},
//!         {"depth":1,"id":1,"kind":{"type":"leaf","weight":-0.0},"parent":0,"role":"left","summary":{...}},
//!         {"depth":1,"id":2,"kind":{"type":"leaf","weight":10.0},"parent":0,"role":"right","summary":{...}}
//!       ],
//!       "weight": 1.0
//!     }
//!   ],
//!   "version": 1
//! }
//! ```

pub mod ensemble;
pub mod export;
pub mod serde_canon;
pub mod tree;

pub use ensemble::{Ensemble, ExportError, FORMAT_VERSION};
pub use export::NodeRecord;
pub use tree::{Node, NodeId, NodeKind, NodeRole, NodeSummary, Tree};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
