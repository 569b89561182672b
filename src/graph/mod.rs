pub mod builder;
pub mod spec;

pub use builder::GraphSpecBuilder;
pub use spec::{Adjacency, Edge, GraphDiagnostics, GraphSpec, NodeSpec};
