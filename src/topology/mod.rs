mod build;
mod model;
mod payload;
mod provider;

pub use build::build_model;
pub use model::{Edge, EdgeKind, LiveStatus, Node, Role, TopologyModel};
pub use payload::{LiveDeviceReport, PathOutcome, PathRequest, RawTopology};
#[cfg(test)]
pub use payload::{PathResponse, RawLink, RawNode, parse_topology};
pub use provider::{FileProvider, HttpProvider, TopologyProvider};
