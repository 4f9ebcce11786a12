//! # Encore Graph
//!
//! Propagation graph of consent decisions: the rights holder at the root, one
//! node per consent category, and one node per requester linked to the
//! categories it was decided on.
//!
//! The graph is a pure function of the audit entries it is given. It never
//! fails; entries whose permission type has no category are left out.

pub mod builder;
pub mod graph;

pub use builder::{build, latest_results, normalize_requester, GraphBuilder, LatestResult};
pub use graph::{
    Graph, Link, LinkKind, Node, NodeKind, ANONYMOUS_NODE_ID, PLATFORM_PREFIX, ROOT_NODE_ID,
};
