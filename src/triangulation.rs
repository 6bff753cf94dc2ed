//! The constrained Delaunay kernel: incremental insertion, edge legalization,
//! segment recovery and inside/outside classification.

use smallvec::SmallVec;

use crate::mesh::{FaceRecord, TriangleMesh, VertexRecord};
use crate::mesh_core::{
    dcel_operations, math, Dcel, FixedDirectedEdgeHandle, FixedFaceHandle,
    FixedUndirectedEdgeHandle, FixedVertexHandle, VertexData,
};
use crate::refinement::{RefinementOutcome, RefinementParameters};
use crate::{MeshingError, MeshingWarning, Point2, Pslg};

/// Maximum recursion depth when recovering a single input segment by midpoint
/// subdivision. Crossing segments would otherwise subdivide forever.
const MAX_SEGMENT_RECOVERY_DEPTH: usize = 24;

/// Attribute tag applied to frozen constraint edges, carried through mesh
/// output.
pub const SHARP_EDGE_ATTRIBUTE: &str = "sharp";

/// A constraint that must appear as a frozen edge between its two anchor
/// vertices. Segment recovery and splitting keep this list in sync with the
/// mesh: every recovered record corresponds to a direct frozen edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    pub from: FixedVertexHandle,
    pub to: FixedVertexHandle,
}

/// The result of locating a point within the triangulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionInMesh {
    OnFace(FixedFaceHandle),
    OnEdge(FixedDirectedEdgeHandle),
    OnVertex(FixedVertexHandle),
    /// The point lies outside the bounding quad.
    Outside,
}

/// A constrained Delaunay triangulation over a bounding quad.
///
/// The mesh is seeded with two oversized triangles covering all input; every
/// input point and Steiner point is inserted strictly inside them, so the
/// insertion and flip primitives never interact with the outer face.
pub struct DelaunayMesh {
    pub(crate) dcel: Dcel,
    pub(crate) segments: Vec<Segment>,
    hole_centers: Vec<Point2<f64>>,
    /// Starting point for the next location walk, always an inner face.
    start_face: FixedFaceHandle,
    pub(crate) warnings: Vec<MeshingWarning>,
    /// Number of exactly-zero in-circle determinants seen during
    /// legalization.
    degenerate_count: usize,
}

impl DelaunayMesh {
    /// Builds the Delaunay triangulation of the input points and records the
    /// input segments for later recovery.
    ///
    /// Duplicate input points map to a single mesh vertex.
    pub fn from_pslg(pslg: &Pslg) -> Result<Self, MeshingError> {
        pslg.validate()?;

        let mut min = Point2::new(f64::MAX, f64::MAX);
        let mut max = Point2::new(f64::MIN, f64::MIN);
        for point in pslg.points.iter().chain(&pslg.holes) {
            min = Point2::new(min.x.min(point.x), min.y.min(point.y));
            max = Point2::new(max.x.max(point.x), max.y.max(point.y));
        }

        // A loose margin keeps all input strictly inside the quad, also for
        // degenerate (single point or collinear) input.
        let span = (max.x - min.x).max(max.y - min.y).max(1.0);
        let low = Point2::new(min.x - span, min.y - span);
        let high = Point2::new(max.x + span, max.y + span);
        math::validate_point(low)?;
        math::validate_point(high)?;

        let mut dcel = dcel_operations::new();
        dcel_operations::create_bounding_quad(
            &mut dcel,
            [
                low,
                Point2::new(high.x, low.y),
                high,
                Point2::new(low.x, high.y),
            ],
        );

        let mut result = Self {
            dcel,
            segments: Vec::new(),
            hole_centers: pslg.holes.clone(),
            start_face: FixedFaceHandle::new(1),
            warnings: Vec::new(),
            degenerate_count: 0,
        };

        let mut handles = Vec::with_capacity(pslg.points.len());
        for &point in &pslg.points {
            let handle =
                result
                    .insert_point(point)?
                    .ok_or_else(|| MeshingError::PointLocation {
                        x: point.x,
                        y: point.y,
                    })?;
            handles.push(handle);
        }

        for &[from, to] in &pslg.segments {
            let segment = Segment {
                from: handles[from],
                to: handles[to],
            };
            // Coincident input points can collapse a segment; drop it.
            if segment.from != segment.to {
                result.segments.push(segment);
            }
        }

        Ok(result)
    }

    /// Builds an unconstrained Delaunay triangulation of a point set.
    pub fn from_points(points: &[Point2<f64>]) -> Result<Self, MeshingError> {
        Self::from_pslg(&Pslg::new(points.to_vec(), Vec::new()))
    }

    pub fn num_vertices(&self) -> usize {
        self.dcel.num_vertices()
    }

    pub fn num_inner_faces(&self) -> usize {
        self.dcel.num_faces() - 1
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Warnings collected so far; see [MeshingWarning].
    pub fn warnings(&self) -> Vec<MeshingWarning> {
        let mut result = self.warnings.clone();
        if self.degenerate_count > 0 {
            result.push(MeshingWarning::DegeneratePredicates {
                count: self.degenerate_count,
            });
        }
        result
    }

    pub fn dcel(&self) -> &Dcel {
        &self.dcel
    }

    /// Walks from the cached start face towards `position` by orientation
    /// tests.
    ///
    /// Terminates for any valid mesh; a step budget converts topology
    /// corruption into an error instead of an endless walk.
    pub fn locate(&self, position: Point2<f64>) -> Result<PositionInMesh, MeshingError> {
        let mut current = self.start_face;
        let step_limit = 4 * self.dcel.num_faces() + 32;

        'walk: for _ in 0..step_limit {
            let adjacent = match self.dcel.face_adjacent_edge(current) {
                Some(edge) => edge,
                None => break,
            };
            let mut edge = self.dcel.directed_edge(adjacent);

            for _ in 0..3 {
                if edge.side_query(position).is_on_right_side() {
                    let neighbor = edge.rev().face();
                    if neighbor.is_outer() {
                        return Ok(PositionInMesh::Outside);
                    }
                    current = neighbor;
                    continue 'walk;
                }
                edge = edge.next();
            }

            // No edge separates the face from the query: it is contained.
            let mut edge = self.dcel.directed_edge(adjacent);
            for _ in 0..3 {
                if edge.from_position() == position {
                    return Ok(PositionInMesh::OnVertex(edge.from()));
                }
                edge = edge.next();
            }
            for _ in 0..3 {
                if edge.side_query(position).is_on_line() {
                    // On the bounding quad boundary itself; splitting such an
                    // edge would subdivide the outer face.
                    if edge.rev().is_outer_edge() {
                        return Ok(PositionInMesh::Outside);
                    }
                    return Ok(PositionInMesh::OnEdge(edge.fix()));
                }
                edge = edge.next();
            }
            return Ok(PositionInMesh::OnFace(current));
        }

        Err(MeshingError::PointLocation {
            x: position.x,
            y: position.y,
        })
    }

    /// Inserts a point and restores the Delaunay property around it.
    ///
    /// Returns the vertex holding the point, the existing vertex for a
    /// duplicate position, or `None` if the point lies outside the bounding
    /// quad.
    pub fn insert_point(
        &mut self,
        position: Point2<f64>,
    ) -> Result<Option<FixedVertexHandle>, MeshingError> {
        math::validate_point(position)?;

        let vertex = match self.locate(position)? {
            PositionInMesh::OnVertex(vertex) => return Ok(Some(vertex)),
            PositionInMesh::Outside => return Ok(None),
            PositionInMesh::OnEdge(edge) => {
                let was_frozen = self.dcel.edge_data(edge.as_undirected()).frozen;
                let endpoints = {
                    let edge = self.dcel.directed_edge(edge);
                    (edge.from(), edge.to())
                };
                let (vertex, _) =
                    dcel_operations::split_edge(&mut self.dcel, edge, VertexData::new(position));
                if was_frozen {
                    self.split_segment_records(endpoints.0, endpoints.1, vertex);
                }
                vertex
            }
            PositionInMesh::OnFace(face) => dcel_operations::insert_into_triangle(
                &mut self.dcel,
                VertexData::new(position),
                face,
            ),
        };

        self.legalize_vertex(vertex);
        self.cache_start_face(vertex);
        Ok(Some(vertex))
    }

    fn cache_start_face(&mut self, vertex: FixedVertexHandle) {
        for out_edge in self.dcel.out_edges(vertex) {
            let face = self.dcel.directed_edge(out_edge).face();
            if !face.is_outer() {
                self.start_face = face;
                return;
            }
        }
    }

    /// Replaces every segment record `from -> to` by two records meeting at
    /// `mid`. Called whenever a frozen edge is split.
    fn split_segment_records(
        &mut self,
        from: FixedVertexHandle,
        to: FixedVertexHandle,
        mid: FixedVertexHandle,
    ) {
        for index in 0..self.segments.len() {
            let segment = self.segments[index];
            if (segment.from, segment.to) == (from, to) || (segment.from, segment.to) == (to, from)
            {
                self.segments[index] = Segment {
                    from: segment.from,
                    to: mid,
                };
                self.segments.push(Segment {
                    from: mid,
                    to: segment.to,
                });
            }
        }
    }

    /// Restores the Delaunay property around a freshly inserted vertex by
    /// Lawson flips.
    ///
    /// Frozen edges and co-circular configurations are never flipped. A step
    /// budget guards against cycling on broken predicates; exceeding it is
    /// recorded as a warning.
    fn legalize_vertex(&mut self, vertex: FixedVertexHandle) {
        let mut stack: SmallVec<[FixedUndirectedEdgeHandle; 16]> = SmallVec::new();
        for out_edge in self.dcel.out_edges(vertex) {
            // The edge opposite the new vertex within each adjacent face.
            let edge = self.dcel.directed_edge(out_edge);
            if !edge.is_outer_edge() {
                stack.push(edge.next().fix().as_undirected());
            }
        }

        let step_limit = 32 * self.dcel.num_undirected_edges() + 128;
        let mut steps = 0;

        while let Some(undirected) = stack.pop() {
            steps += 1;
            if steps > step_limit {
                if !self
                    .warnings
                    .contains(&MeshingWarning::LegalizationBudgetExceeded)
                {
                    self.warnings.push(MeshingWarning::LegalizationBudgetExceeded);
                }
                return;
            }

            if self.dcel.edge_data(undirected).frozen {
                continue;
            }
            let edge = self.dcel.directed_edge(undirected.normalized());
            if edge.is_outer_edge() || edge.rev().is_outer_edge() {
                continue;
            }

            let from = edge.from_position();
            let to = edge.to_position();
            let left_apex = edge.next().to_position();
            let right_apex = edge.rev().next().to_position();

            let determinant = math::circumference_determinant(from, to, left_apex, right_apex);
            if determinant == 0.0 {
                self.degenerate_count += 1;
                continue;
            }
            if determinant < 0.0 {
                continue;
            }

            // The flip must produce two properly oriented triangles; skip
            // otherwise (possible for the non-convex quads that arise next to
            // frozen edges).
            if !math::side_query(right_apex, left_apex, from).is_on_left_side()
                || !math::side_query(left_apex, right_apex, to).is_on_left_side()
            {
                continue;
            }

            let neighbors = [
                edge.next().fix(),
                edge.prev().fix(),
                edge.rev().next().fix(),
                edge.rev().prev().fix(),
            ];
            dcel_operations::flip_cw(&mut self.dcel, undirected);
            for neighbor in neighbors {
                stack.push(neighbor.as_undirected());
            }
        }
    }

    /// Recovers every recorded segment as a chain of frozen mesh edges.
    ///
    /// Segments whose endpoints are not yet connected are subdivided at their
    /// midpoint; each recovered piece is frozen immediately so later flips
    /// cannot remove it. Pieces that cannot be recovered within the depth
    /// budget (crossing segments) are dropped with a warning.
    pub fn insert_missing_segments(&mut self) -> Result<(), MeshingError> {
        let mut work: Vec<(FixedVertexHandle, FixedVertexHandle, usize)> = self
            .segments
            .drain(..)
            .map(|segment| (segment.from, segment.to, 0))
            .collect();
        // Preserve input order of already-present segments.
        work.reverse();

        while let Some((from, to, depth)) = work.pop() {
            if from == to {
                continue;
            }
            if let Some(edge) = self.dcel.get_edge_from_neighbors(from, to) {
                let data = self.dcel.edge_data_mut(edge.as_undirected());
                data.frozen = true;
                if data.attribute.is_empty() {
                    data.attribute = SHARP_EDGE_ATTRIBUTE.into();
                }
                // Recovered pieces are recorded immediately: crossing
                // segments split already frozen edges through their midpoint
                // insertions, and `split_segment_records` can only keep the
                // ledger in sync with records it can see. Overlapping input
                // segments realize the same edge only once.
                let record = Segment { from, to };
                let reversed = Segment { from: to, to: from };
                if !self.segments.contains(&record) && !self.segments.contains(&reversed) {
                    self.segments.push(record);
                }
                continue;
            }

            if depth >= MAX_SEGMENT_RECOVERY_DEPTH {
                self.warnings
                    .push(MeshingWarning::SegmentRecoveryBudgetExceeded {
                        from: from.index(),
                        to: to.index(),
                    });
                continue;
            }

            let mid_position = self.dcel.position(from).mid(self.dcel.position(to));
            match self.insert_point(mid_position)? {
                Some(mid) => {
                    work.push((mid, to, depth + 1));
                    work.push((from, mid, depth + 1));
                }
                None => {
                    // Unreachable for a valid quad; treat like a failed
                    // recovery.
                    self.warnings
                        .push(MeshingWarning::SegmentRecoveryBudgetExceeded {
                            from: from.index(),
                            to: to.index(),
                        });
                }
            }
        }

        Ok(())
    }

    /// Splits the recovered segment with index `segment_index` at its
    /// midpoint and returns the new vertex.
    ///
    /// Used by refinement to resolve encroached segments. Operates directly
    /// on the frozen edge instead of locating the midpoint, which sidesteps
    /// any rounding of the midpoint off the segment. A record whose direct
    /// edge has gone missing is dropped with a warning instead of aborting
    /// the refinement.
    pub(crate) fn split_segment(&mut self, segment_index: usize) -> Option<FixedVertexHandle> {
        let segment = self.segments[segment_index];
        let edge = match self.dcel.get_edge_from_neighbors(segment.from, segment.to) {
            Some(edge) => edge,
            None => {
                self.warnings
                    .push(MeshingWarning::SegmentRecoveryBudgetExceeded {
                        from: segment.from.index(),
                        to: segment.to.index(),
                    });
                self.segments.swap_remove(segment_index);
                return None;
            }
        };

        let mid_position = self
            .dcel
            .position(segment.from)
            .mid(self.dcel.position(segment.to));
        let (mid, _) =
            dcel_operations::split_edge(&mut self.dcel, edge, VertexData::new(mid_position));
        self.split_segment_records(segment.from, segment.to, mid);

        self.legalize_vertex(mid);
        self.cache_start_face(mid);
        Some(mid)
    }

    /// Marks every face as inside or outside the meshed region.
    ///
    /// Outside seeds are all faces touching a bounding quad corner plus the
    /// faces containing hole markers. The outside region is grown across all
    /// non-frozen edges; frozen segment chains act as region walls. Faces the
    /// fill never reaches are inside.
    pub fn classify_inside_outside(&mut self) -> Result<(), MeshingError> {
        let mut outside = vec![false; self.dcel.num_faces()];
        let mut seeds: Vec<FixedFaceHandle> = Vec::new();

        for face in self.dcel.fixed_inner_faces() {
            if self.contains_bounding_vertex(face) {
                seeds.push(face);
            }
        }

        for index in 0..self.hole_centers.len() {
            let center = self.hole_centers[index];
            match self.locate(center)? {
                PositionInMesh::OnFace(face) => seeds.push(face),
                PositionInMesh::OnEdge(edge) => {
                    if self.dcel.edge_data(edge.as_undirected()).frozen {
                        return Err(MeshingError::InvalidPslg {
                            reason: format!(
                                "hole marker ({}, {}) lies on a segment",
                                center.x, center.y
                            ),
                        });
                    }
                    let face = self.dcel.directed_edge(edge).face();
                    if !face.is_outer() {
                        seeds.push(face);
                    }
                }
                PositionInMesh::OnVertex(_) => {
                    return Err(MeshingError::InvalidPslg {
                        reason: format!(
                            "hole marker ({}, {}) coincides with a mesh vertex",
                            center.x, center.y
                        ),
                    });
                }
                PositionInMesh::Outside => {
                    return Err(MeshingError::InvalidPslg {
                        reason: format!(
                            "hole marker ({}, {}) lies outside the triangulated region",
                            center.x, center.y
                        ),
                    });
                }
            }
        }

        let mut stack = seeds;
        while let Some(face) = stack.pop() {
            if outside[face.index()] {
                continue;
            }
            outside[face.index()] = true;

            let adjacent = match self.dcel.face_adjacent_edge(face) {
                Some(edge) => edge,
                None => continue,
            };
            let mut edge = self.dcel.directed_edge(adjacent);
            for _ in 0..3 {
                let neighbor = edge.rev().face();
                let frozen = self.dcel.edge_data(edge.fix().as_undirected()).frozen;
                if !frozen && !neighbor.is_outer() && !outside[neighbor.index()] {
                    stack.push(neighbor);
                }
                edge = edge.next();
            }
        }

        for face in self.dcel.fixed_inner_faces() {
            self.dcel.face_data_mut(face).inside = !outside[face.index()];
        }
        self.refresh_vertex_flags();
        Ok(())
    }

    /// Classification for unconstrained triangulations: everything within the
    /// convex hull of the input is inside.
    pub fn classify_convex_hull(&mut self) {
        for face in self.dcel.fixed_inner_faces() {
            let inside = !self.contains_bounding_vertex(face);
            self.dcel.face_data_mut(face).inside = inside;
        }
        self.refresh_vertex_flags();
    }

    fn refresh_vertex_flags(&mut self) {
        for vertex in self.dcel.fixed_vertices() {
            self.dcel.vertex_data_mut(vertex).inside = false;
        }
        for face in self.dcel.fixed_inner_faces() {
            if self.dcel.face_data(face).inside {
                for vertex in self.dcel.face_vertices(face) {
                    self.dcel.vertex_data_mut(vertex).inside = true;
                }
            }
        }
    }

    pub(crate) fn contains_bounding_vertex(&self, face: FixedFaceHandle) -> bool {
        self.dcel
            .face_vertices(face)
            .iter()
            .any(|&vertex| self.dcel.vertex_data(vertex).is_bounding)
    }

    /// Runs Ruppert refinement, see [RefinementParameters].
    pub fn refine(&mut self, parameters: &RefinementParameters) -> RefinementOutcome {
        crate::refinement::refine(self, parameters)
    }

    /// Extracts all inside faces as a contiguously numbered triangle mesh.
    ///
    /// Frozen edge attributes are transferred to both endpoint vertices so
    /// they survive the round trip through vertex based mesh formats.
    pub fn extract_inside(&mut self) -> TriangleMesh {
        self.refresh_vertex_flags();

        let mut vertex_ids = vec![usize::MAX; self.dcel.num_vertices()];
        let mut vertices = Vec::new();
        for index in 0..self.dcel.num_vertices() {
            let handle = FixedVertexHandle::new(index);
            let data = self.dcel.vertex_data(handle);
            if data.inside {
                vertex_ids[index] = vertices.len();
                vertices.push(VertexRecord {
                    id: vertices.len(),
                    position: data.position,
                    attribute: data.attribute.clone(),
                });
            }
        }

        for segment in &self.segments {
            if let Some(edge) = self.dcel.get_edge_from_neighbors(segment.from, segment.to) {
                let attribute = self.dcel.edge_data(edge.as_undirected()).attribute.clone();
                if attribute.is_empty() {
                    continue;
                }
                for vertex in [segment.from, segment.to] {
                    let id = vertex_ids[vertex.index()];
                    if id != usize::MAX && vertices[id].attribute.is_empty() {
                        vertices[id].attribute = attribute.clone();
                    }
                }
            }
        }

        let mut faces = Vec::new();
        for face in self.dcel.fixed_inner_faces() {
            if !self.dcel.face_data(face).inside {
                continue;
            }
            let corners = self
                .dcel
                .face_vertices(face)
                .map(|vertex| vertex_ids[vertex.index()]);
            faces.push(FaceRecord {
                id: faces.len(),
                vertices: corners,
                attribute: String::new(),
            });
        }

        TriangleMesh { vertices, faces }
    }
}

/// The complete result of a meshing run.
pub struct MeshOutput {
    pub mesh: TriangleMesh,
    pub refinement: RefinementOutcome,
    pub warnings: Vec<MeshingWarning>,
}

/// The full pipeline: triangulate, recover segments, classify and refine a
/// planar straight line graph.
pub fn process_poly(
    pslg: &Pslg,
    parameters: &RefinementParameters,
) -> Result<MeshOutput, MeshingError> {
    let mut mesh = DelaunayMesh::from_pslg(pslg)?;
    mesh.insert_missing_segments()?;
    mesh.classify_inside_outside()?;
    let refinement = mesh.refine(parameters);
    log::info!(
        "meshed {} input points into {} vertices ({} steiner), {} inside faces",
        pslg.points.len(),
        mesh.num_vertices(),
        refinement.steiner_points,
        mesh.dcel()
            .fixed_inner_faces()
            .filter(|&face| mesh.dcel().face_data(face).inside)
            .count(),
    );
    Ok(MeshOutput {
        mesh: mesh.extract_inside(),
        refinement,
        warnings: mesh.warnings(),
    })
}

/// Plain Delaunay triangulation of a point set, without constraints or
/// refinement. The result covers the convex hull of the input.
pub fn delaunay_triangulate(points: &[Point2<f64>]) -> Result<TriangleMesh, MeshingError> {
    let mut mesh = DelaunayMesh::from_points(points)?;
    mesh.classify_convex_hull();
    Ok(mesh.extract_inside())
}
