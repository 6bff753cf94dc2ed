use ruppert::{
    delaunay_triangulate, process_poly, AngleLimit, DelaunayMesh, MeshingWarning, Point2, Pslg,
    RefinementParameters, TriangleMesh,
};

fn centroid(positions: [Point2<f64>; 3]) -> Point2<f64> {
    Point2::new(
        (positions[0].x + positions[1].x + positions[2].x) / 3.0,
        (positions[0].y + positions[1].y + positions[2].y) / 3.0,
    )
}

fn vertex_id_at(mesh: &TriangleMesh, position: Point2<f64>) -> Option<usize> {
    mesh.vertices
        .iter()
        .find(|vertex| vertex.position == position)
        .map(|vertex| vertex.id)
}

/// Faces that share the edge between the given two vertex ids.
fn faces_with_edge(mesh: &TriangleMesh, from: usize, to: usize) -> usize {
    mesh.faces
        .iter()
        .filter(|face| face.vertices.contains(&from) && face.vertices.contains(&to))
        .count()
}

fn min_angle(positions: [Point2<f64>; 3]) -> f64 {
    let mut result = f64::MAX;
    for (a, b, c) in [
        (positions[0], positions[1], positions[2]),
        (positions[1], positions[2], positions[0]),
        (positions[2], positions[0], positions[1]),
    ] {
        let u = Point2::new(b.x - a.x, b.y - a.y);
        let v = Point2::new(c.x - a.x, c.y - a.y);
        let angle = (u.x * v.y - u.y * v.x).atan2(u.x * v.x + u.y * v.y).abs();
        result = result.min(angle.to_degrees());
    }
    result
}

// A unit square with its boundary and one diagonal as constraints: the
// listed diagonal must survive as an edge, the other one must not appear.
#[test]
fn square_with_diagonal_constraint() {
    let corners = [
        Point2::new(0.0, 0.0),
        Point2::new(1.0, 0.0),
        Point2::new(1.0, 1.0),
        Point2::new(0.0, 1.0),
    ];
    let pslg = Pslg::new(
        corners.to_vec(),
        vec![[0, 1], [1, 2], [2, 3], [3, 0], [0, 2]],
    );

    let output = process_poly(
        &pslg,
        &RefinementParameters::new().with_angle_limit(AngleLimit::none()),
    )
    .unwrap();

    assert!(output.refinement.complete);
    assert_eq!(output.mesh.num_vertices(), 4);
    assert_eq!(output.mesh.num_faces(), 2);

    let ids = corners.map(|corner| vertex_id_at(&output.mesh, corner).unwrap());
    // The constrained diagonal is shared by both faces; the other diagonal
    // does not exist.
    assert_eq!(faces_with_edge(&output.mesh, ids[0], ids[2]), 2);
    assert_eq!(faces_with_edge(&output.mesh, ids[1], ids[3]), 0);
    // Constraint endpoints carry the sharp attribute through extraction.
    assert!(output
        .mesh
        .vertices
        .iter()
        .all(|vertex| vertex.attribute == ruppert::SHARP_EDGE_ATTRIBUTE));
}

// Inserting a point at the circumcenter of a triangle must connect it to
// all three corners and keep the original edges.
#[test]
fn circumcenter_insertion_keeps_triangle_edges() {
    let corners = [
        Point2::new(0.0, 0.0),
        Point2::new(4.0, 0.0),
        Point2::new(2.0, 3.0),
    ];
    let circumcenter = Point2::new(2.0, 5.0 / 6.0);

    let mut mesh = DelaunayMesh::from_points(&corners).unwrap();
    mesh.classify_convex_hull();
    mesh.insert_point(circumcenter).unwrap().unwrap();

    let extracted = mesh.extract_inside();
    assert_eq!(extracted.num_vertices(), 4);
    assert_eq!(extracted.num_faces(), 3);

    let center_id = vertex_id_at(&extracted, circumcenter).unwrap();
    let corner_ids = corners.map(|corner| vertex_id_at(&extracted, corner).unwrap());
    // Every face contains the new vertex; every original edge survives in
    // exactly one face.
    for face in &extracted.faces {
        assert!(face.vertices.contains(&center_id));
    }
    for (from, to) in [
        (corner_ids[0], corner_ids[1]),
        (corner_ids[1], corner_ids[2]),
        (corner_ids[2], corner_ids[0]),
    ] {
        assert_eq!(faces_with_edge(&extracted, from, to), 1);
    }
}

// Crossing constraint segments: both diagonals of a square meet at a point
// that is not part of the input. Recovery must realize all four half
// diagonals around a new vertex, every surviving segment record must be
// backed by a frozen edge, and refinement must run to completion.
#[test]
fn crossing_diagonals_are_recovered() {
    let pslg = Pslg::new(
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ],
        vec![[0, 1], [1, 2], [2, 3], [3, 0], [0, 2], [1, 3]],
    );

    let mut mesh = DelaunayMesh::from_pslg(&pslg).unwrap();
    mesh.insert_missing_segments().unwrap();
    for segment in mesh.segments() {
        let edge = mesh
            .dcel()
            .get_edge_from_neighbors(segment.from, segment.to)
            .expect("segment record without direct edge");
        assert!(mesh.dcel().edge_data(edge.as_undirected()).frozen);
    }

    mesh.classify_inside_outside().unwrap();
    let outcome = mesh.refine(
        &RefinementParameters::new()
            .with_max_allowed_area(0.5)
            .with_max_allowed_vertices(500),
    );
    assert!(outcome.complete);

    let extracted = mesh.extract_inside();
    assert!(vertex_id_at(&extracted, Point2::new(1.0, 1.0)).is_some());
    for index in 0..extracted.num_faces() {
        let positions = extracted.face_positions(index);
        let area = ((positions[1].x - positions[0].x) * (positions[2].y - positions[0].y)
            - (positions[1].y - positions[0].y) * (positions[2].x - positions[0].x))
            .abs()
            * 0.5;
        assert!(area <= 0.5);
        let center = centroid(positions);
        assert!(center.x > 0.0 && center.x < 2.0 && center.y > 0.0 && center.y < 2.0);
    }
}

// Refining a needle triangle: away from the two sharp input corners, no
// face may stay below the angle bound unless the vertex budget ran out.
#[test]
fn needle_refinement_respects_angle_bound() {
    let tip_left = Point2::new(0.0, 0.0);
    let tip_right = Point2::new(10.0, 0.0);
    let apex = Point2::new(5.0, 5.0 * 2.0f64.to_radians().tan());
    let pslg = Pslg::new(
        vec![tip_left, tip_right, apex],
        vec![[0, 1], [1, 2], [2, 0]],
    );

    let output = process_poly(
        &pslg,
        &RefinementParameters::new()
            .with_angle_limit(AngleLimit::from_deg(20.0))
            .with_max_allowed_vertices(2000),
    )
    .unwrap();

    if !output.refinement.complete {
        assert!(output
            .warnings
            .iter()
            .any(|warning| matches!(warning, MeshingWarning::VertexBudgetExceeded { .. })));
        return;
    }

    for index in 0..output.mesh.num_faces() {
        let positions = output.mesh.face_positions(index);
        if min_angle(positions) < 20.0 - 1.0e-9 {
            // Only the segment-bounded corners are exempt from the bound.
            let touches_tip = positions
                .iter()
                .any(|&p| p == tip_left || p == tip_right);
            assert!(
                touches_tip,
                "face {index} below the angle bound away from the needle tips"
            );
        }
    }
}

// A square ring: the hole in the middle must stay empty, the ring must be
// fully meshed.
#[test]
fn square_ring_classification() {
    let pslg = {
        let mut pslg = Pslg::new(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(3.0, 0.0),
                Point2::new(3.0, 3.0),
                Point2::new(0.0, 3.0),
                Point2::new(1.0, 1.0),
                Point2::new(2.0, 1.0),
                Point2::new(2.0, 2.0),
                Point2::new(1.0, 2.0),
            ],
            vec![
                [0, 1],
                [1, 2],
                [2, 3],
                [3, 0],
                [4, 5],
                [5, 6],
                [6, 7],
                [7, 4],
            ],
        );
        pslg.holes.push(Point2::new(1.5, 1.5));
        pslg
    };

    let output = process_poly(
        &pslg,
        &RefinementParameters::new().with_max_allowed_vertices(1000),
    )
    .unwrap();
    assert!(output.refinement.complete);
    assert!(!output.mesh.faces.is_empty());

    for index in 0..output.mesh.num_faces() {
        let center = centroid(output.mesh.face_positions(index));
        let in_square = center.x > 0.0 && center.x < 3.0 && center.y > 0.0 && center.y < 3.0;
        let in_hole = center.x > 1.0 && center.x < 2.0 && center.y > 1.0 && center.y < 2.0;
        assert!(in_square, "face outside the outer boundary");
        assert!(!in_hole, "face inside the hole");
    }

    // The hole boundary must be realized: all four hole corner vertices are
    // part of the mesh.
    for corner in [
        Point2::new(1.0, 1.0),
        Point2::new(2.0, 1.0),
        Point2::new(2.0, 2.0),
        Point2::new(1.0, 2.0),
    ] {
        assert!(vertex_id_at(&output.mesh, corner).is_some());
    }
}

#[test]
fn triangulate_point_grid() {
    let mut points = Vec::new();
    for x in 0..5 {
        for y in 0..5 {
            points.push(Point2::new(x as f64, y as f64));
        }
    }
    let mesh = delaunay_triangulate(&points).unwrap();

    assert_eq!(mesh.num_vertices(), 25);
    // A triangulated 4x4 quad grid has 32 triangles.
    assert_eq!(mesh.num_faces(), 32);
    let total_area: f64 = (0..mesh.num_faces())
        .map(|index| {
            let [a, b, c] = mesh.face_positions(index);
            ((b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)).abs() * 0.5
        })
        .sum();
    assert!((total_area - 16.0).abs() < 1.0e-9);
}

#[test]
fn mesh_file_round_trip() {
    let pslg = Pslg::new(
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ],
        vec![[0, 1], [1, 2], [2, 3], [3, 0]],
    );
    let output = process_poly(&pslg, &RefinementParameters::default()).unwrap();

    let mut buffer = Vec::new();
    ruppert::io::write_mesh(&output.mesh, &mut buffer).unwrap();
    let reread = ruppert::io::read_mesh(buffer.as_slice()).unwrap();
    assert_eq!(output.mesh, reread);

    // Re-meshing the saved mesh: its boundary becomes the new constraint
    // set.
    let derived = ruppert::io::mesh_to_pslg(&reread);
    assert_eq!(derived.points.len(), reread.num_vertices());
    assert!(derived.validate().is_ok());
}
