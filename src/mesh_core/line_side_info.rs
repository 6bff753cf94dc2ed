/// Describes on which side of a directed line a point lies.
///
/// Returned by the orientation predicate in the math module and by
/// [crate::mesh_core::dcel::DirectedEdgeHandle::side_query].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSideInfo {
    signed_side: f64,
}

impl LineSideInfo {
    #[inline]
    pub(crate) fn from_determinant(signed_side: f64) -> LineSideInfo {
        LineSideInfo { signed_side }
    }

    /// Returns `true` if the point lies strictly on the left side of the line.
    pub fn is_on_left_side(&self) -> bool {
        self.signed_side > 0.0
    }

    /// Returns `true` if the point lies strictly on the right side of the line.
    pub fn is_on_right_side(&self) -> bool {
        self.signed_side < 0.0
    }

    /// Returns `true` if the point lies exactly on the line.
    pub fn is_on_line(&self) -> bool {
        self.signed_side == 0.0
    }
}
