use crate::mesh_core::math;
use crate::{MeshingError, Point2};

/// A planar straight line graph: the input to constrained meshing.
///
/// Points are referenced by index from `segments`. Hole markers designate
/// regions that are excluded from the final mesh; a marker must lie strictly
/// inside the region it removes.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pslg {
    pub points: Vec<Point2<f64>>,
    /// Index pairs into `points`. Segments appear as edges of the final mesh
    /// (possibly subdivided) and act as region boundaries.
    pub segments: Vec<[usize; 2]>,
    pub holes: Vec<Point2<f64>>,
}

impl Pslg {
    pub fn new(points: Vec<Point2<f64>>, segments: Vec<[usize; 2]>) -> Self {
        Self {
            points,
            segments,
            holes: Vec::new(),
        }
    }

    /// Checks coordinate validity, segment index ranges and rejects
    /// zero-length segments.
    ///
    /// Crossing or duplicate segments are not detected here; crossings
    /// surface later as segment recovery failures.
    pub fn validate(&self) -> Result<(), MeshingError> {
        if self.points.is_empty() {
            return Err(MeshingError::InvalidPslg {
                reason: "input contains no points".into(),
            });
        }

        for point in self.points.iter().chain(&self.holes) {
            math::validate_point(*point)?;
        }

        for &[from, to] in &self.segments {
            if from >= self.points.len() || to >= self.points.len() {
                return Err(MeshingError::InvalidPslg {
                    reason: format!(
                        "segment ({from}, {to}) references a point index out of range (have {})",
                        self.points.len()
                    ),
                });
            }
            if from == to {
                return Err(MeshingError::InvalidPslg {
                    reason: format!("segment ({from}, {to}) has zero length"),
                });
            }
            if self.points[from] == self.points[to] {
                return Err(MeshingError::InvalidPslg {
                    reason: format!(
                        "segment ({from}, {to}) connects two points at the same position"
                    ),
                });
            }
        }

        Ok(())
    }
}
