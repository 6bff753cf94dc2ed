//! Topological mutations of the half edge arena.
//!
//! All functions keep the arena consistent (`next`/`prev` cycles, face and
//! vertex back references) but know nothing about geometry. Orientation
//! requirements are stated per function; callers are responsible for them.

use crate::Point2;

use super::dcel::{Dcel, EdgeEntry, FaceEntry, HalfEdgeEntry, VertexEntry};
use super::dcel::{EdgeData, FaceData, VertexData};
use super::handles::{
    FixedDirectedEdgeHandle, FixedFaceHandle, FixedUndirectedEdgeHandle, FixedVertexHandle,
    OUTER_FACE,
};

/// Creates an empty arena containing only the outer face.
pub fn new() -> Dcel {
    let outer_face = FaceEntry {
        adjacent_edge: None,
        data: FaceData::default(),
    };

    Dcel {
        vertices: Vec::new(),
        edges: Vec::new(),
        faces: vec![outer_face],
    }
}

/// Seeds an empty arena with a quad split into two triangles.
///
/// `corners` must be in counter clockwise order; the diagonal runs from
/// `corners[0]` to `corners[2]`. All subsequent insertions must lie strictly
/// inside this quad, which keeps every later operation away from the outer
/// face.
pub fn create_bounding_quad(dcel: &mut Dcel, corners: [Point2<f64>; 4]) -> [FixedVertexHandle; 4] {
    assert!(dcel.vertices.is_empty() && dcel.edges.is_empty());

    let [v0, v1, v2, v3] = [0usize, 1, 2, 3].map(FixedVertexHandle::new);

    // Undirected edges: quad boundary plus the v0 - v2 diagonal.
    // a* are the half edges of the lower triangle f1 = (v0, v1, v2),
    // b* those of the upper triangle f2 = (v0, v2, v3),
    // o* the clockwise outer loop.
    let a0 = FixedDirectedEdgeHandle::new_normalized(0); // v0 -> v1
    let o0 = a0.rev();
    let a1 = FixedDirectedEdgeHandle::new_normalized(1); // v1 -> v2
    let o1 = a1.rev();
    let a2 = FixedDirectedEdgeHandle::new_normalized(2); // v2 -> v0 (diagonal)
    let b0 = a2.rev();
    let b1 = FixedDirectedEdgeHandle::new_normalized(3); // v2 -> v3
    let o3 = b1.rev();
    let b2 = FixedDirectedEdgeHandle::new_normalized(4); // v3 -> v0
    let o4 = b2.rev();

    let f1 = FixedFaceHandle::new(1);
    let f2 = FixedFaceHandle::new(2);

    let half = |next, prev, face, origin| HalfEdgeEntry {
        next,
        prev,
        face,
        origin,
    };

    dcel.edges.push(EdgeEntry::new(
        half(a1, a2, f1, v0),
        half(o4, o1, OUTER_FACE, v1),
    ));
    dcel.edges.push(EdgeEntry::new(
        half(a2, a0, f1, v1),
        half(o0, o3, OUTER_FACE, v2),
    ));
    dcel.edges.push(EdgeEntry::new(
        half(a0, a1, f1, v2),
        half(b1, b2, f2, v0),
    ));
    dcel.edges.push(EdgeEntry::new(
        half(b2, b0, f2, v2),
        half(o1, o4, OUTER_FACE, v3),
    ));
    dcel.edges.push(EdgeEntry::new(
        half(b0, b1, f2, v3),
        half(o3, o0, OUTER_FACE, v0),
    ));

    for (corner, out_edge) in corners.into_iter().zip([a0, a1, a2, b2]) {
        let mut entry = VertexEntry::new(VertexData::bounding(corner));
        entry.out_edge = Some(out_edge);
        dcel.vertices.push(entry);
    }

    dcel.faces[OUTER_FACE.index()].adjacent_edge = Some(o0);
    dcel.faces.push(FaceEntry {
        adjacent_edge: Some(a0),
        data: FaceData::default(),
    });
    dcel.faces.push(FaceEntry {
        adjacent_edge: Some(b0),
        data: FaceData::default(),
    });

    [v0, v1, v2, v3]
}

/// Inserts a vertex into the interior of the inner face `f0`, connecting it
/// to all three corners. The three resulting faces inherit `f0`'s region
/// flag.
pub fn insert_into_triangle(
    dcel: &mut Dcel,
    vertex: VertexData,
    f0: FixedFaceHandle,
) -> FixedVertexHandle {
    // All edges are oriented counter clockwise
    //
    // Original triangle:
    //       v1
    //      / \
    //     /   \
    //    /e1   \
    //   /   f0  \
    //  /       e0\
    // v2__e2_____v0
    //
    // With v inserted (e0, e1 and e2 as above):
    //                 .
    //               / # \
    //             /   #   \
    //       f1  /  e4 # e3  \f0
    //         /     __v__     \
    //       /   e5_#     #__e8  \
    //     / ___#             #___ \
    //   /__#   e6          e7    #__\
    // /#_____________________________#\
    //                f2
    debug_assert!(!f0.is_outer());

    let e0 = dcel.faces[f0.index()]
        .adjacent_edge
        .unwrap_or_else(|| unreachable!("inner face without adjacent edge"));

    let e1 = dcel.half_edge(e0).next;
    let e2 = dcel.half_edge(e1).next;
    let e3 = FixedDirectedEdgeHandle::new_normalized(dcel.edges.len());
    let e4 = e3.rev();
    let e5 = FixedDirectedEdgeHandle::new_normalized(dcel.edges.len() + 1);
    let e6 = e5.rev();
    let e7 = FixedDirectedEdgeHandle::new_normalized(dcel.edges.len() + 2);
    let e8 = e7.rev();

    let v = FixedVertexHandle::new(dcel.vertices.len());
    let v0 = dcel.half_edge(e0).origin;
    let v1 = dcel.half_edge(e1).origin;
    let v2 = dcel.half_edge(e2).origin;

    let f1 = FixedFaceHandle::new(dcel.faces.len());
    let f2 = FixedFaceHandle::new(dcel.faces.len() + 1);

    let inherited = FaceData {
        inside: dcel.faces[f0.index()].data.inside,
    };

    dcel.faces.push(FaceEntry {
        adjacent_edge: Some(e1),
        data: inherited.clone(),
    });
    dcel.faces.push(FaceEntry {
        adjacent_edge: Some(e2),
        data: inherited,
    });

    let mut vertex = VertexEntry::new(vertex);
    vertex.out_edge = Some(e4);
    dcel.vertices.push(vertex);

    dcel.half_edge_mut(e0).prev = e8;
    dcel.half_edge_mut(e0).next = e3;
    dcel.half_edge_mut(e1).prev = e4;
    dcel.half_edge_mut(e1).next = e5;
    dcel.half_edge_mut(e1).face = f1;
    dcel.half_edge_mut(e2).prev = e6;
    dcel.half_edge_mut(e2).next = e7;
    dcel.half_edge_mut(e2).face = f2;

    let edge3 = HalfEdgeEntry {
        next: e8,
        prev: e0,
        origin: v1,
        face: f0,
    };

    let edge4 = HalfEdgeEntry {
        next: e1,
        prev: e5,
        origin: v,
        face: f1,
    };

    let edge5 = HalfEdgeEntry {
        next: e4,
        prev: e1,
        origin: v2,
        face: f1,
    };

    let edge6 = HalfEdgeEntry {
        next: e2,
        prev: e7,
        origin: v,
        face: f2,
    };

    let edge7 = HalfEdgeEntry {
        next: e6,
        prev: e2,
        origin: v0,
        face: f2,
    };

    let edge8 = HalfEdgeEntry {
        next: e0,
        prev: e3,
        origin: v,
        face: f0,
    };

    dcel.edges.push(EdgeEntry::new(edge3, edge4));
    dcel.edges.push(EdgeEntry::new(edge5, edge6));
    dcel.edges.push(EdgeEntry::new(edge7, edge8));

    v
}

/// Splits `edge_handle` at a new vertex, subdividing the two adjacent faces.
///
/// Both adjacent faces must be inner triangles. The edge payload carries over
/// to both halves, the new faces inherit the region flags of the faces they
/// were cut from. Returns the new vertex together with the two halves of the
/// original edge, in its direction: `from -> mid` and `mid -> to`.
pub fn split_edge(
    dcel: &mut Dcel,
    edge_handle: FixedDirectedEdgeHandle,
    new_vertex: VertexData,
) -> (FixedVertexHandle, [FixedDirectedEdgeHandle; 2]) {
    // Original quad:
    //
    //     v1          v4
    //      +----------+
    //      |\   ep    |
    //      | \        |
    //      |  \    f0 |
    //      |   \e0    |
    //      |    \     |
    //      |tn   \  en|
    //      |      \   |
    //      |       \  |
    //      |  f1    \ |
    //      |    tp   \|
    //      +----------+
    //     v2          v3
    //
    // After splitting e0:
    //
    //      +----------+
    //      |\   ep   /|
    //      | \e0    / |
    //      |  \    /  |
    //      |   \  /e3 |
    //      |tn  \/    |
    //      |    /v0   |
    //      | e1/  \ en|
    //      |  /    \  |
    //      | /    e2\ |
    //      |/   tp   \|
    //      +----------+
    //
    // All edges are oriented counter clock wise
    // f0 .. f3 will denote the faces adjacent to e0 .. e3
    // t0 .. t3 will denote the twins of e0 .. e3

    let edge = *dcel.half_edge(edge_handle);
    let twin = *dcel.half_edge(edge_handle.rev());

    let f0 = edge.face;
    let f1 = twin.face;
    debug_assert!(!f0.is_outer() && !f1.is_outer());
    let f2 = FixedFaceHandle::new(dcel.faces.len());
    let f3 = FixedFaceHandle::new(dcel.faces.len() + 1);

    let e0 = edge_handle;
    let t0 = e0.rev();
    let e1 = FixedDirectedEdgeHandle::new_normalized(dcel.edges.len());
    let t1 = e1.rev();
    let e2 = FixedDirectedEdgeHandle::new_normalized(dcel.edges.len() + 1);
    let t2 = e2.rev();
    let e3 = FixedDirectedEdgeHandle::new_normalized(dcel.edges.len() + 2);
    let t3 = e3.rev();
    let ep = edge.prev;
    let en = edge.next;
    let tn = twin.next;
    let tp = twin.prev;

    let v0 = FixedVertexHandle::new(dcel.vertices.len());
    let v1 = edge.origin;
    let v2 = dcel.half_edge(tp).origin;
    let v3 = twin.origin;
    let v4 = dcel.half_edge(ep).origin;

    let edge0 = HalfEdgeEntry {
        next: t3,
        prev: ep,
        origin: v1,
        face: f0,
    };

    let twin0 = HalfEdgeEntry {
        next: tn,
        prev: e1,
        origin: v0,
        face: f1,
    };

    let edge1 = HalfEdgeEntry {
        next: t0,
        prev: tn,
        origin: v2,
        face: f1,
    };

    let twin1 = HalfEdgeEntry {
        next: tp,
        prev: e2,
        origin: v0,
        face: f2,
    };

    let edge2 = HalfEdgeEntry {
        next: t1,
        prev: tp,
        origin: v3,
        face: f2,
    };

    let twin2 = HalfEdgeEntry {
        next: en,
        prev: e3,
        origin: v0,
        face: f3,
    };

    let edge3 = HalfEdgeEntry {
        next: t2,
        prev: en,
        origin: v4,
        face: f3,
    };

    let twin3 = HalfEdgeEntry {
        next: ep,
        prev: e0,
        origin: v0,
        face: f0,
    };

    let mut new_vertex_entry = VertexEntry::new(new_vertex);
    new_vertex_entry.out_edge = Some(t0);

    let f1_inherited = FaceData {
        inside: dcel.faces[f1.index()].data.inside,
    };
    let f0_inherited = FaceData {
        inside: dcel.faces[f0.index()].data.inside,
    };

    let face2 = FaceEntry {
        adjacent_edge: Some(e2),
        data: f1_inherited,
    };

    let face3 = FaceEntry {
        adjacent_edge: Some(e3),
        data: f0_inherited,
    };

    *dcel.half_edge_mut(e0) = edge0;
    *dcel.half_edge_mut(t0) = twin0;
    dcel.edges.push(EdgeEntry::new(edge1, twin1));
    dcel.edges.push(EdgeEntry::new(edge2, twin2));
    dcel.edges.push(EdgeEntry::new(edge3, twin3));

    // The second half of the split edge keeps the original payload (in
    // particular its frozen flag).
    let original_data = dcel.edge_data(e0.as_undirected()).clone();
    *dcel.edge_data_mut(e2.as_undirected()) = original_data;

    dcel.half_edge_mut(en).next = e3;
    dcel.half_edge_mut(en).prev = t2;
    dcel.half_edge_mut(en).face = f3;

    dcel.half_edge_mut(tp).next = e2;
    dcel.half_edge_mut(tp).prev = t1;
    dcel.half_edge_mut(tp).face = f2;

    dcel.half_edge_mut(tn).next = e1;
    dcel.half_edge_mut(ep).prev = t3;

    dcel.vertices.push(new_vertex_entry);
    dcel.vertices[v3.index()].out_edge = Some(e2);

    dcel.faces[f0.index()].adjacent_edge = Some(e0);
    dcel.faces[f1.index()].adjacent_edge = Some(e1);
    dcel.faces.push(face2);
    dcel.faces.push(face3);

    (v0, [e0, t2])
}

/// Flips an edge in clockwise direction, reusing its arena slot.
///
/// Both adjacent faces must be inner triangles and the surrounding quad must
/// be convex. The edge payload is reset since the flipped edge connects a
/// different vertex pair.
pub fn flip_cw(dcel: &mut Dcel, e: FixedUndirectedEdgeHandle) {
    let e = e.normalized();
    let e_entry = *dcel.half_edge(e);
    let en = e_entry.next;
    let ep = e_entry.prev;
    let e_face = e_entry.face;
    let e_origin = e_entry.origin;

    let t = e.rev();
    let t_entry = *dcel.half_edge(t);
    let tn = t_entry.next;
    let tp = t_entry.prev;
    let t_face = t_entry.face;
    let t_origin = t_entry.origin;

    debug_assert!(!e_face.is_outer() && !t_face.is_outer());

    dcel.half_edge_mut(en).next = e;
    dcel.half_edge_mut(en).prev = tp;
    dcel.half_edge_mut(e).next = tp;
    dcel.half_edge_mut(e).prev = en;
    dcel.half_edge_mut(e).origin = dcel.half_edge(ep).origin;
    dcel.half_edge_mut(tp).next = en;
    dcel.half_edge_mut(tp).prev = e;
    dcel.half_edge_mut(tp).face = e_face;

    dcel.half_edge_mut(tn).next = t;
    dcel.half_edge_mut(tn).prev = ep;
    dcel.half_edge_mut(t).next = ep;
    dcel.half_edge_mut(t).prev = tn;
    dcel.half_edge_mut(t).origin = dcel.half_edge(tp).origin;
    dcel.half_edge_mut(ep).next = tn;
    dcel.half_edge_mut(ep).prev = t;
    dcel.half_edge_mut(ep).face = t_face;

    dcel.vertices[e_origin.index()].out_edge = Some(tn);
    dcel.vertices[t_origin.index()].out_edge = Some(en);

    dcel.faces[e_face.index()].adjacent_edge = Some(e);
    dcel.faces[t_face.index()].adjacent_edge = Some(t);

    *dcel.edge_data_mut(e.as_undirected()) = EdgeData::default();
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh_core::math;

    fn quad_corners() -> [Point2<f64>; 4] {
        [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
        ]
    }

    #[test]
    fn test_create_bounding_quad() {
        let mut dcel = new();
        let vertices = create_bounding_quad(&mut dcel, quad_corners());

        assert_eq!(dcel.num_vertices(), 4);
        assert_eq!(dcel.num_undirected_edges(), 5);
        assert_eq!(dcel.num_faces(), 3);
        for vertex in vertices {
            assert!(dcel.vertex_data(vertex).is_bounding);
        }
        dcel.sanity_check();
    }

    #[test]
    fn test_insert_into_triangle() {
        let mut dcel = new();
        create_bounding_quad(&mut dcel, quad_corners());

        let face = FixedFaceHandle::new(1);
        dcel.face_data_mut(face).inside = true;
        let v = insert_into_triangle(
            &mut dcel,
            VertexData::new(Point2::new(2.0, 1.0)),
            face,
        );

        assert_eq!(dcel.num_vertices(), 5);
        assert_eq!(dcel.num_undirected_edges(), 8);
        assert_eq!(dcel.num_faces(), 5);
        assert_eq!(dcel.out_edges(v).count(), 3);
        // All three fragments carry the region flag of the split face.
        for face in [1usize, 3, 4].map(FixedFaceHandle::new) {
            assert!(dcel.face_data(face).inside);
            assert!(dcel.face_vertices(face).contains(&v));
        }
        dcel.sanity_check();
    }

    #[test]
    fn test_split_edge() {
        let mut dcel = new();
        let [v0, _, v2, _] = create_bounding_quad(&mut dcel, quad_corners());

        let diagonal = dcel.get_edge_from_neighbors(v0, v2).unwrap();
        dcel.edge_data_mut(diagonal.as_undirected()).frozen = true;

        let (mid, [first, second]) =
            split_edge(&mut dcel, diagonal, VertexData::new(Point2::new(2.0, 2.0)));

        assert_eq!(dcel.num_vertices(), 5);
        assert_eq!(dcel.num_undirected_edges(), 8);
        assert_eq!(dcel.num_faces(), 5);

        let first = dcel.directed_edge(first);
        let second = dcel.directed_edge(second);
        assert_eq!(first.from(), v0);
        assert_eq!(first.to(), mid);
        assert_eq!(second.from(), mid);
        assert_eq!(second.to(), v2);
        assert!(dcel.edge_data(first.fix().as_undirected()).frozen);
        assert!(dcel.edge_data(second.fix().as_undirected()).frozen);
        dcel.sanity_check();
    }

    #[test]
    fn test_flip() {
        let mut dcel = new();
        let [v0, v1, v2, v3] = create_bounding_quad(&mut dcel, quad_corners());

        let diagonal = dcel.get_edge_from_neighbors(v0, v2).unwrap();
        flip_cw(&mut dcel, diagonal.as_undirected());

        assert!(dcel.get_edge_from_neighbors(v0, v2).is_none());
        let flipped = dcel.get_edge_from_neighbors(v3, v1).unwrap();
        assert!(!dcel.edge_data(flipped.as_undirected()).frozen);
        for face in dcel.fixed_inner_faces() {
            let [a, b, c] = dcel.face_positions(face);
            assert!(math::side_query(a, b, c).is_on_left_side());
        }
        dcel.sanity_check();
    }
}
