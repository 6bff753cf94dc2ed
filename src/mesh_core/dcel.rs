//! The half edge arena backing the triangulation.
//!
//! Every undirected edge owns its two half edges in a single arena slot; a
//! directed edge handle is the slot index shifted left by one with the lowest
//! bit selecting the half edge. Entries are never freed, handles stay valid
//! for the lifetime of the mesh.

use crate::Point2;

use super::handles::{
    FixedDirectedEdgeHandle, FixedFaceHandle, FixedUndirectedEdgeHandle, FixedVertexHandle,
    OUTER_FACE,
};
use super::math;
use super::LineSideInfo;

/// Payload of a mesh vertex.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexData {
    pub position: Point2<f64>,
    /// `true` for the four corners of the initial bounding quad. Bounding
    /// vertices never appear in the extracted mesh.
    pub is_bounding: bool,
    /// Set during classification: the vertex touches at least one inside face.
    pub inside: bool,
    /// Free-form interchange tag, preserved through I/O.
    pub attribute: String,
}

impl VertexData {
    pub fn new(position: Point2<f64>) -> Self {
        Self {
            position,
            is_bounding: false,
            inside: false,
            attribute: String::new(),
        }
    }

    pub fn bounding(position: Point2<f64>) -> Self {
        Self {
            is_bounding: true,
            ..Self::new(position)
        }
    }
}

/// Payload of an undirected edge.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeData {
    /// Frozen edges realize input segments. They are never flipped and block
    /// the inside/outside flood fill.
    pub frozen: bool,
    pub attribute: String,
}

/// Payload of a face. The outer face carries a default payload that is never
/// read.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FaceData {
    /// Set during classification, updated structurally afterwards: new faces
    /// created by splitting an inside face are inside as well.
    pub inside: bool,
}

#[derive(Clone, Debug)]
pub(super) struct FaceEntry {
    pub(super) adjacent_edge: Option<FixedDirectedEdgeHandle>,
    pub(super) data: FaceData,
}

#[derive(Clone, Debug)]
pub(super) struct VertexEntry {
    pub(super) data: VertexData,
    pub(super) out_edge: Option<FixedDirectedEdgeHandle>,
}

impl VertexEntry {
    pub(super) fn new(data: VertexData) -> Self {
        Self {
            data,
            out_edge: None,
        }
    }
}

#[derive(Clone, Debug)]
pub(super) struct EdgeEntry {
    pub(super) entries: [HalfEdgeEntry; 2],
    pub(super) data: EdgeData,
}

impl EdgeEntry {
    pub(super) fn new(normalized: HalfEdgeEntry, not_normalized: HalfEdgeEntry) -> Self {
        Self {
            entries: [normalized, not_normalized],
            data: EdgeData::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct HalfEdgeEntry {
    pub next: FixedDirectedEdgeHandle,
    pub prev: FixedDirectedEdgeHandle,
    pub face: FixedFaceHandle,
    pub origin: FixedVertexHandle,
}

/// The arena of all vertices, edges and faces of a triangulation.
#[derive(Clone, Debug)]
pub struct Dcel {
    pub(super) vertices: Vec<VertexEntry>,
    pub(super) edges: Vec<EdgeEntry>,
    pub(super) faces: Vec<FaceEntry>,
}

impl Dcel {
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_directed_edges(&self) -> usize {
        self.edges.len() * 2
    }

    pub fn num_undirected_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of faces, the outer face included.
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub(super) fn half_edge(&self, handle: FixedDirectedEdgeHandle) -> &HalfEdgeEntry {
        &self.edges[handle.as_undirected().index()].entries[handle.side()]
    }

    pub(super) fn half_edge_mut(&mut self, handle: FixedDirectedEdgeHandle) -> &mut HalfEdgeEntry {
        &mut self.edges[handle.as_undirected().index()].entries[handle.side()]
    }

    pub fn vertex_data(&self, handle: FixedVertexHandle) -> &VertexData {
        &self.vertices[handle.index()].data
    }

    pub fn vertex_data_mut(&mut self, handle: FixedVertexHandle) -> &mut VertexData {
        &mut self.vertices[handle.index()].data
    }

    pub fn position(&self, handle: FixedVertexHandle) -> Point2<f64> {
        self.vertices[handle.index()].data.position
    }

    pub fn vertex_out_edge(&self, handle: FixedVertexHandle) -> Option<FixedDirectedEdgeHandle> {
        self.vertices[handle.index()].out_edge
    }

    pub fn edge_data(&self, handle: FixedUndirectedEdgeHandle) -> &EdgeData {
        &self.edges[handle.index()].data
    }

    pub fn edge_data_mut(&mut self, handle: FixedUndirectedEdgeHandle) -> &mut EdgeData {
        &mut self.edges[handle.index()].data
    }

    pub fn face_data(&self, handle: FixedFaceHandle) -> &FaceData {
        &self.faces[handle.index()].data
    }

    pub fn face_data_mut(&mut self, handle: FixedFaceHandle) -> &mut FaceData {
        &mut self.faces[handle.index()].data
    }

    pub fn face_adjacent_edge(&self, handle: FixedFaceHandle) -> Option<FixedDirectedEdgeHandle> {
        self.faces[handle.index()].adjacent_edge
    }

    pub fn directed_edge(&self, handle: FixedDirectedEdgeHandle) -> DirectedEdgeHandle {
        DirectedEdgeHandle { dcel: self, handle }
    }

    /// The three vertices of an inner face in counter clockwise order.
    ///
    /// Must not be called with the outer face.
    pub fn face_vertices(&self, handle: FixedFaceHandle) -> [FixedVertexHandle; 3] {
        debug_assert!(!handle.is_outer());
        let e0 = self.faces[handle.index()]
            .adjacent_edge
            .unwrap_or_else(|| unreachable!("inner face without adjacent edge"));
        let e1 = self.half_edge(e0).next;
        let e2 = self.half_edge(e1).next;
        [
            self.half_edge(e0).origin,
            self.half_edge(e1).origin,
            self.half_edge(e2).origin,
        ]
    }

    /// The three corner positions of an inner face in counter clockwise order.
    pub fn face_positions(&self, handle: FixedFaceHandle) -> [Point2<f64>; 3] {
        self.face_vertices(handle).map(|v| self.position(v))
    }

    /// Finds the directed edge `from -> to` by circulating the out edges of
    /// `from`.
    pub fn get_edge_from_neighbors(
        &self,
        from: FixedVertexHandle,
        to: FixedVertexHandle,
    ) -> Option<FixedDirectedEdgeHandle> {
        for edge in self.out_edges(from) {
            if self.half_edge(edge.rev()).origin == to {
                return Some(edge);
            }
        }
        None
    }

    pub fn out_edges(&self, vertex: FixedVertexHandle) -> OutEdgeIterator {
        OutEdgeIterator {
            dcel: self,
            current: self.vertex_out_edge(vertex),
            start: self.vertex_out_edge(vertex),
            started: false,
        }
    }

    pub fn fixed_vertices(&self) -> impl Iterator<Item = FixedVertexHandle> {
        (0..self.num_vertices()).map(FixedVertexHandle::new)
    }

    pub fn fixed_undirected_edges(&self) -> impl Iterator<Item = FixedUndirectedEdgeHandle> {
        (0..self.num_undirected_edges()).map(FixedUndirectedEdgeHandle::new)
    }

    /// All inner faces, the outer face is skipped.
    pub fn fixed_inner_faces(&self) -> impl Iterator<Item = FixedFaceHandle> {
        (1..self.num_faces()).map(FixedFaceHandle::new)
    }

    #[cfg(test)]
    pub fn sanity_check(&self) {
        for (index, face) in self.faces.iter().enumerate() {
            let handle = FixedFaceHandle::new(index);
            let adjacent = face.adjacent_edge.unwrap();
            assert_eq!(self.half_edge(adjacent).face, handle);
        }
        for (index, vertex) in self.vertices.iter().enumerate() {
            let handle = FixedVertexHandle::new(index);
            let out_edge = vertex.out_edge.unwrap();
            assert_eq!(self.half_edge(out_edge).origin, handle);
        }

        for index in 0..self.num_directed_edges() {
            let fixed = FixedDirectedEdgeHandle::new(index);
            let edge = self.directed_edge(fixed);
            assert_eq!(edge, edge.next().prev());
            assert_eq!(edge, edge.prev().next());
            assert_eq!(edge, edge.rev().rev());
            assert_ne!(edge.face(), edge.rev().face());
            assert_ne!(edge, edge.next());
            assert_ne!(edge, edge.prev());
            assert_eq!(edge.from(), edge.rev().to());
            if !edge.is_outer_edge() {
                assert_eq!(edge, edge.next().next().next());
                assert_eq!(edge, edge.prev().prev().prev());
            }
        }
    }
}

/// A borrowed directed edge, bundling an edge handle with its mesh for
/// convenient topology navigation.
#[derive(Clone, Copy)]
pub struct DirectedEdgeHandle<'a> {
    dcel: &'a Dcel,
    handle: FixedDirectedEdgeHandle,
}

impl PartialEq for DirectedEdgeHandle<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for DirectedEdgeHandle<'_> {}

impl core::fmt::Debug for DirectedEdgeHandle<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "DirectedEdgeHandle({:?} -> {:?})", self.from(), self.to())
    }
}

impl<'a> DirectedEdgeHandle<'a> {
    pub fn fix(&self) -> FixedDirectedEdgeHandle {
        self.handle
    }

    pub fn rev(&self) -> Self {
        Self {
            dcel: self.dcel,
            handle: self.handle.rev(),
        }
    }

    pub fn next(&self) -> Self {
        Self {
            dcel: self.dcel,
            handle: self.dcel.half_edge(self.handle).next,
        }
    }

    pub fn prev(&self) -> Self {
        Self {
            dcel: self.dcel,
            handle: self.dcel.half_edge(self.handle).prev,
        }
    }

    pub fn from(&self) -> FixedVertexHandle {
        self.dcel.half_edge(self.handle).origin
    }

    pub fn to(&self) -> FixedVertexHandle {
        self.dcel.half_edge(self.handle.rev()).origin
    }

    pub fn face(&self) -> FixedFaceHandle {
        self.dcel.half_edge(self.handle).face
    }

    pub fn is_outer_edge(&self) -> bool {
        self.face() == OUTER_FACE
    }

    pub fn from_position(&self) -> Point2<f64> {
        self.dcel.position(self.from())
    }

    pub fn to_position(&self) -> Point2<f64> {
        self.dcel.position(self.to())
    }

    pub fn side_query(&self, query: Point2<f64>) -> LineSideInfo {
        math::side_query(self.from_position(), self.to_position(), query)
    }
}

/// Circulates counter clockwise around the out edges of a vertex.
pub struct OutEdgeIterator<'a> {
    dcel: &'a Dcel,
    current: Option<FixedDirectedEdgeHandle>,
    start: Option<FixedDirectedEdgeHandle>,
    started: bool,
}

impl Iterator for OutEdgeIterator<'_> {
    type Item = FixedDirectedEdgeHandle;

    fn next(&mut self) -> Option<FixedDirectedEdgeHandle> {
        let current = self.current?;
        if self.started && self.current == self.start {
            return None;
        }
        self.started = true;
        // The next out edge in ccw order shares the origin with the reversal
        // of this edge's in-face predecessor.
        self.current = Some(self.dcel.half_edge(current).prev.rev());
        Some(current)
    }
}

#[cfg(test)]
mod test {
    use super::super::dcel_operations;
    use super::*;

    fn quad_dcel() -> (Dcel, [FixedVertexHandle; 4]) {
        let mut dcel = dcel_operations::new();
        let vertices = dcel_operations::create_bounding_quad(
            &mut dcel,
            [
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 1.0),
                Point2::new(0.0, 1.0),
            ],
        );
        (dcel, vertices)
    }

    #[test]
    fn test_out_edge_circulator() {
        let (dcel, [v0, _, v2, _]) = quad_dcel();
        // v0 and v2 are on the diagonal and have three out edges each.
        assert_eq!(dcel.out_edges(v0).count(), 3);
        assert_eq!(dcel.out_edges(v2).count(), 3);
        for edge in dcel.out_edges(v0) {
            assert_eq!(dcel.half_edge(edge).origin, v0);
        }
    }

    #[test]
    fn test_get_edge_from_neighbors() {
        let (dcel, [v0, v1, v2, v3]) = quad_dcel();
        for (from, to) in [(v0, v1), (v1, v2), (v2, v3), (v3, v0), (v0, v2)] {
            let edge = dcel.get_edge_from_neighbors(from, to).unwrap();
            let edge = dcel.directed_edge(edge);
            assert_eq!(edge.from(), from);
            assert_eq!(edge.to(), to);
        }
        assert!(dcel.get_edge_from_neighbors(v1, v3).is_none());
    }

    #[test]
    fn test_face_vertices_are_ccw() {
        let (dcel, _) = quad_dcel();
        for face in dcel.fixed_inner_faces() {
            let [a, b, c] = dcel.face_positions(face);
            assert!(math::side_query(a, b, c).is_on_left_side());
        }
    }
}
