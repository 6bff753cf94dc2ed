//! Mesh data structure internals: the half edge arena, its mutation
//! primitives and the geometric predicates they rely on.

pub mod dcel;
pub mod dcel_operations;
pub mod handles;
mod line_side_info;
pub mod math;

pub use dcel::{Dcel, DirectedEdgeHandle, EdgeData, FaceData, VertexData};
pub use handles::{
    FixedDirectedEdgeHandle, FixedFaceHandle, FixedUndirectedEdgeHandle, FixedVertexHandle,
    OUTER_FACE,
};
pub use line_side_info::LineSideInfo;
