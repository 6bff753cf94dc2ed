//! Ruppert style quality refinement of a classified constrained
//! triangulation.
//!
//! The loop repeatedly picks the worst inside face, attempts to insert its
//! circumcenter and splits encroached segments first. Termination is
//! guaranteed for angle limits up to roughly 30 degrees; sharper limits are
//! accepted but may only be reached partially within the vertex budget.

use hashbrown::HashSet;

use crate::mesh_core::{math, FixedFaceHandle};
use crate::triangulation::DelaunayMesh;
use crate::{MeshingWarning, Point2};

/// A lower bound on the smallest interior angle of the refined mesh.
///
/// Internally the limit is stored as the equivalent circumradius to shortest
/// edge ratio, `ratio = 1 / (2 sin(angle))`. The default limit of 30 degrees
/// (ratio 1) is the largest bound for which the refinement provably
/// terminates.
#[derive(Clone, Copy, PartialEq)]
pub struct AngleLimit {
    radius_to_shortest_edge_limit: f64,
}

impl AngleLimit {
    /// A limit given as minimum angle in degrees.
    ///
    /// Values above 30 degrees are likely to exhaust the vertex budget
    /// instead of converging.
    pub fn from_deg(degree: f64) -> Self {
        Self::from_rad(degree.to_radians())
    }

    /// A limit given as minimum angle in radians.
    pub fn from_rad(rad: f64) -> Self {
        let sine = rad.sin();
        if sine <= 0.0 {
            Self::none()
        } else {
            Self::from_radius_to_shortest_edge_ratio(0.5 / sine)
        }
    }

    /// A limit given directly as circumradius to shortest edge ratio. Smaller
    /// ratios correspond to larger angle bounds.
    pub fn from_radius_to_shortest_edge_ratio(ratio: f64) -> Self {
        Self {
            radius_to_shortest_edge_limit: ratio,
        }
    }

    /// No angle requirement; only area bounds drive refinement.
    pub fn none() -> Self {
        Self {
            radius_to_shortest_edge_limit: f64::INFINITY,
        }
    }

    pub fn radius_to_shortest_edge_limit(&self) -> f64 {
        self.radius_to_shortest_edge_limit
    }
}

impl Default for AngleLimit {
    fn default() -> Self {
        Self::from_radius_to_shortest_edge_ratio(1.0)
    }
}

impl core::fmt::Debug for AngleLimit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let angle = (0.5 / self.radius_to_shortest_edge_limit).asin().to_degrees();
        f.debug_struct("AngleLimit")
            .field("angle (deg)", &angle)
            .finish()
    }
}

/// Controls the Ruppert refinement loop, builder style.
#[derive(Clone, Debug)]
pub struct RefinementParameters {
    angle_limit: AngleLimit,
    max_vertices: Option<usize>,
    max_area: Option<f64>,
    grading: bool,
    keep_frozen_segments: bool,
}

impl Default for RefinementParameters {
    fn default() -> Self {
        Self {
            angle_limit: AngleLimit::default(),
            max_vertices: None,
            max_area: None,
            grading: true,
            keep_frozen_segments: false,
        }
    }
}

impl RefinementParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_angle_limit(mut self, limit: AngleLimit) -> Self {
        self.angle_limit = limit;
        self
    }

    /// Caps the total number of mesh vertices. Without an explicit cap,
    /// refinement stops at ten times the unrefined vertex count.
    pub fn with_max_allowed_vertices(mut self, max_vertices: usize) -> Self {
        self.max_vertices = Some(max_vertices);
        self
    }

    /// Caps the area of inside faces. Faces above the cap are refined even if
    /// their angles are fine.
    pub fn with_max_allowed_area(mut self, max_area: f64) -> Self {
        self.max_area = Some(max_area);
        self
    }

    /// With grading (the default), triangle sizes may vary freely across the
    /// mesh. Without grading, an area cap of four times the mean inside face
    /// area is applied, producing near uniform triangle sizes.
    pub fn with_grading(mut self, grading: bool) -> Self {
        self.grading = grading;
        self
    }

    /// Never split frozen segments during refinement.
    ///
    /// Encroached segments are normally subdivided before a Steiner point is
    /// placed. With this option the input segments stay unsplit and the
    /// Steiner point is inserted regardless, trading quality guarantees near
    /// segments for exact preservation of the input edges.
    pub fn keep_frozen_segments(mut self) -> Self {
        self.keep_frozen_segments = true;
        self
    }
}

/// Statistics of a refinement run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefinementOutcome {
    /// `true` if all quality bounds were met, `false` if the vertex budget
    /// ran out first.
    pub complete: bool,
    /// Number of Steiner points added, segment split points included.
    pub steiner_points: usize,
}

struct FaceQuality {
    face: FixedFaceHandle,
    ratio: f64,
}

pub(crate) fn refine(mesh: &mut DelaunayMesh, parameters: &RefinementParameters) -> RefinementOutcome {
    let initial_vertices = mesh.num_vertices();
    let max_vertices = parameters
        .max_vertices
        .unwrap_or_else(|| 10 * initial_vertices.max(4));

    let max_area = if parameters.grading {
        parameters.max_area
    } else {
        parameters.max_area.or_else(|| mean_inside_area(mesh).map(|mean| mean * 4.0))
    };

    let mut steiner_points = 0;
    // Faces whose circumcenter could not be inserted; retried after any
    // successful insertion changes the mesh.
    let mut unimprovable: HashSet<FixedFaceHandle> = HashSet::new();

    loop {
        if mesh.num_vertices() >= max_vertices {
            let warning = MeshingWarning::VertexBudgetExceeded { max_vertices };
            if !mesh.warnings.contains(&warning) {
                mesh.warnings.push(warning);
            }
            log::debug!(
                "refinement stopped at vertex budget {max_vertices} after {steiner_points} steiner points"
            );
            return RefinementOutcome {
                complete: false,
                steiner_points,
            };
        }

        let worst = match worst_inside_face(mesh, parameters, max_area, &unimprovable) {
            Some(worst) => worst,
            None => {
                log::debug!("refinement complete after {steiner_points} steiner points");
                return RefinementOutcome {
                    complete: true,
                    steiner_points,
                };
            }
        };

        let (circumcenter, _) = math::circumcenter(mesh.dcel().face_positions(worst.face));

        if let Some(encroached) = find_encroached_segment(mesh, circumcenter) {
            if !parameters.keep_frozen_segments {
                if mesh.split_segment(encroached).is_some() {
                    steiner_points += 1;
                    unimprovable.clear();
                }
                continue;
            }
            // Frozen segments stay untouched; fall through and place the
            // Steiner point anyway.
        }

        let before = mesh.num_vertices();
        match mesh.insert_point(circumcenter) {
            Ok(Some(_)) if mesh.num_vertices() > before => {
                steiner_points += 1;
                unimprovable.clear();
            }
            // Outside the bounding quad, coincident with an existing vertex
            // or not representable: this face cannot be improved directly.
            Ok(_) | Err(_) => {
                unimprovable.insert(worst.face);
            }
        }
    }
}

fn mean_inside_area(mesh: &DelaunayMesh) -> Option<f64> {
    let mut total = 0.0;
    let mut count = 0usize;
    for face in mesh.dcel().fixed_inner_faces() {
        if mesh.dcel().face_data(face).inside {
            total += math::triangle_area(mesh.dcel().face_positions(face));
            count += 1;
        }
    }
    (count > 0).then(|| total / count as f64)
}

/// Picks the inside face most in need of refinement: the largest
/// circumradius to shortest edge ratio among faces violating a bound, ties
/// broken towards the lowest face index.
fn worst_inside_face(
    mesh: &DelaunayMesh,
    parameters: &RefinementParameters,
    max_area: Option<f64>,
    unimprovable: &HashSet<FixedFaceHandle>,
) -> Option<FaceQuality> {
    let ratio_limit = parameters.angle_limit.radius_to_shortest_edge_limit();
    let mut worst: Option<FaceQuality> = None;

    for face in mesh.dcel().fixed_inner_faces() {
        if !mesh.dcel().face_data(face).inside
            || unimprovable.contains(&face)
            || mesh.contains_bounding_vertex(face)
        {
            continue;
        }

        let positions = mesh.dcel().face_positions(face);
        let (_, ratio) = math::triangle_statistics(positions);
        let area = math::triangle_area(positions);

        let oversized = max_area.is_some_and(|max_area| area > max_area);
        let skinny = ratio > ratio_limit && !is_segment_bounded_angle(mesh, face);
        if !oversized && !skinny {
            continue;
        }

        let is_worse = match &worst {
            Some(current) => ratio > current.ratio,
            None => true,
        };
        if is_worse {
            worst = Some(FaceQuality { face, ratio });
        }
    }

    worst
}

/// A small angle enclosed by two frozen segments cannot be improved: its
/// bisecting edges are fixed. Such corners are exempt from the angle bound.
fn is_segment_bounded_angle(mesh: &DelaunayMesh, face: FixedFaceHandle) -> bool {
    let adjacent = match mesh.dcel().face_adjacent_edge(face) {
        Some(edge) => edge,
        None => return false,
    };

    // The smallest angle of a triangle faces its shortest edge; the two
    // other face edges enclose it.
    let mut edge = mesh.dcel().directed_edge(adjacent);
    let mut shortest = edge;
    let mut shortest_length = f64::MAX;
    for _ in 0..3 {
        let length = edge.from_position().distance_2(edge.to_position());
        if length < shortest_length {
            shortest_length = length;
            shortest = edge;
        }
        edge = edge.next();
    }

    // The two face edges enclosing the corner opposite `shortest`.
    let enclosing_a = shortest.next();
    let enclosing_b = shortest.prev();
    let dcel = mesh.dcel();
    dcel.edge_data(enclosing_a.fix().as_undirected()).frozen
        && dcel.edge_data(enclosing_b.fix().as_undirected()).frozen
}

/// Returns the index of a recovered segment whose diametral circle contains
/// `point`, if any.
fn find_encroached_segment(mesh: &DelaunayMesh, point: Point2<f64>) -> Option<usize> {
    for (index, segment) in mesh.segments().iter().enumerate() {
        let from = mesh.dcel().position(segment.from);
        let to = mesh.dcel().position(segment.to);
        if math::is_encroaching(from, to, point) {
            return Some(index);
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{process_poly, Pslg};

    use approx::assert_relative_eq;

    #[test]
    fn test_angle_limit() {
        let limit = AngleLimit::from_deg(30.0);
        assert_relative_eq!(limit.radius_to_shortest_edge_limit(), 1.0);

        let no_limit = AngleLimit::none();
        assert_eq!(no_limit.radius_to_shortest_edge_limit(), f64::INFINITY);

        assert_relative_eq!(
            AngleLimit::default().radius_to_shortest_edge_limit(),
            1.0
        );
    }

    fn square_pslg() -> Pslg {
        Pslg::new(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(10.0, 0.0),
                Point2::new(10.0, 10.0),
                Point2::new(0.0, 10.0),
            ],
            vec![[0, 1], [1, 2], [2, 3], [3, 0]],
        )
    }

    fn min_inside_angle(mesh: &crate::TriangleMesh) -> f64 {
        (0..mesh.num_faces())
            .map(|index| math::triangle_statistics(mesh.face_positions(index)).0)
            .fold(f64::MAX, f64::min)
    }

    #[test]
    fn test_refine_square() {
        let output = process_poly(
            &square_pslg(),
            &RefinementParameters::new().with_angle_limit(AngleLimit::from_deg(25.0)),
        )
        .unwrap();

        assert!(output.refinement.complete);
        assert!(min_inside_angle(&output.mesh) >= 25.0 - 1.0e-9);
    }

    #[test]
    fn test_refine_needle() {
        // A thin sliver attached to a square forces refinement work.
        let pslg = Pslg::new(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(10.0, 0.0),
                Point2::new(10.0, 10.0),
                Point2::new(0.0, 10.0),
                Point2::new(5.0, 0.2),
            ],
            vec![[0, 1], [1, 2], [2, 3], [3, 0]],
        );
        let output = process_poly(
            &pslg,
            &RefinementParameters::new()
                .with_angle_limit(AngleLimit::from_deg(20.0))
                .with_max_allowed_vertices(1000),
        )
        .unwrap();

        if output.refinement.complete {
            assert!(min_inside_angle(&output.mesh) >= 20.0 - 1.0e-9);
        } else {
            assert!(output
                .warnings
                .iter()
                .any(|warning| matches!(warning, MeshingWarning::VertexBudgetExceeded { .. })));
        }
    }

    #[test]
    fn test_refinement_is_idempotent() {
        let parameters = RefinementParameters::new().with_angle_limit(AngleLimit::from_deg(25.0));
        let mut mesh = crate::DelaunayMesh::from_pslg(&square_pslg()).unwrap();
        mesh.insert_missing_segments().unwrap();
        mesh.classify_inside_outside().unwrap();

        let first = mesh.refine(&parameters);
        assert!(first.complete);
        let second = mesh.refine(&parameters);
        assert!(second.complete);
        assert_eq!(second.steiner_points, 0);
    }

    #[test]
    fn test_max_area() {
        let output = process_poly(
            &square_pslg(),
            &RefinementParameters::new()
                .with_angle_limit(AngleLimit::none())
                .with_max_allowed_area(2.0)
                .with_max_allowed_vertices(2000),
        )
        .unwrap();
        assert!(output.refinement.complete);
        for index in 0..output.mesh.num_faces() {
            assert!(math::triangle_area(output.mesh.face_positions(index)) <= 2.0);
        }
    }

    #[test]
    fn test_uniform_without_grading() {
        let output = process_poly(
            &square_pslg(),
            &RefinementParameters::new().with_grading(false),
        )
        .unwrap();
        assert!(output.refinement.complete);

        let areas: Vec<f64> = (0..output.mesh.num_faces())
            .map(|index| math::triangle_area(output.mesh.face_positions(index)))
            .collect();
        let mean = areas.iter().sum::<f64>() / areas.len() as f64;
        for area in areas {
            assert!(area <= mean * 16.0);
        }
    }
}
