use thiserror::Error;

/// A coordinate value that cannot be handled by the exact predicates.
///
/// See [crate::mesh_core::math::MIN_ALLOWED_VALUE] and
/// [crate::mesh_core::math::MAX_ALLOWED_VALUE] for the precise bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum CoordinateError {
    #[error("coordinate is NaN")]
    Nan,
    #[error("coordinate magnitude is too small (underflows the exact predicates)")]
    TooSmall,
    #[error("coordinate magnitude is too large (overflows the exact predicates)")]
    TooLarge,
}

/// Errors reported by triangulation, refinement and mesh I/O.
#[derive(Debug, Error)]
pub enum MeshingError {
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),

    /// The point location walk failed to terminate. This indicates a
    /// corrupted mesh topology and should never occur for validated input.
    #[error("point location did not terminate at ({x}, {y})")]
    PointLocation { x: f64, y: f64 },

    /// The input planar straight line graph is not meshable as given.
    #[error("invalid input geometry: {reason}")]
    InvalidPslg { reason: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error in line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Non-fatal conditions encountered while meshing.
///
/// Warnings are collected instead of aborting: the resulting mesh is still
/// valid and conforming, it merely fails to reach the requested quality or
/// completeness everywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshingWarning {
    /// An input segment (or one of its pieces) could not be kept as a direct
    /// frozen edge. The segment is approximated by the existing edges.
    SegmentRecoveryBudgetExceeded { from: usize, to: usize },
    /// Refinement stopped early because the maximum vertex count was reached.
    VertexBudgetExceeded { max_vertices: usize },
    /// Edge legalization was cut short. The triangulation remains valid but
    /// may contain locally non-Delaunay edges.
    LegalizationBudgetExceeded,
    /// One or more in-circle tests returned an exact zero (co-circular
    /// points). Ties were resolved by keeping the existing edge.
    DegeneratePredicates { count: usize },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MeshingError::from(CoordinateError::Nan);
        assert_eq!(err.to_string(), "coordinate is NaN");

        let err = MeshingError::Parse {
            line: 17,
            message: "expected vertex id".into(),
        };
        assert!(err.to_string().contains("line 17"));
    }
}
