//! Graph model (component C1, spec §3–§4.1).

pub mod cell;
pub mod edge;
pub mod graph;
pub mod group;
pub mod ids;
pub mod node;

pub use cell::Cell;
pub use edge::{Edge, EdgeCell, PortSpec};
pub use graph::Graph;
pub use group::{Group, GroupBoundary, GroupCell};
pub use ids::{EdgeId, GroupId, NodeId};
pub use node::{Node, Origin};
