//! Fixed size index handles addressing the mesh arenas.
//!
//! Every vertex, face and undirected edge is identified by its index into the
//! corresponding arena. A directed edge handle encodes an undirected edge
//! index together with a side bit: index `2 * e` refers to the first half
//! edge of undirected edge `e`, index `2 * e + 1` to its reversal.
//!
//! Handles stay valid for the whole lifetime of a mesh - the kernel never
//! removes elements, edge flips reuse the flipped edge's slot in place.

use std::convert::TryInto;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! fixed_handle {
    ($(#[$outer:meta])* $name:ident) => {
        $(#[$outer])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(
            feature = "serde",
            derive(Serialize, Deserialize),
            serde(crate = "serde")
        )]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn new(index: usize) -> Self {
                Self(index.try_into().expect("index too big - at most 2^32 elements supported"))
            }

            /// The index of the addressed element.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

fixed_handle!(
    /// Handle of a vertex.
    FixedVertexHandle
);

fixed_handle!(
    /// Handle of an undirected edge.
    FixedUndirectedEdgeHandle
);

fixed_handle!(
    /// Handle of a directed edge (half edge).
    FixedDirectedEdgeHandle
);

fixed_handle!(
    /// Handle of a face. Face 0 is always the single outer face.
    FixedFaceHandle
);

/// The outer (unbounded) face surrounding the triangulation.
pub const OUTER_FACE: FixedFaceHandle = FixedFaceHandle(0);

impl FixedFaceHandle {
    /// Returns `true` if this handle refers to the outer face.
    #[inline]
    pub fn is_outer(self) -> bool {
        self == OUTER_FACE
    }
}

impl FixedDirectedEdgeHandle {
    #[inline]
    pub(crate) fn new_normalized(undirected_index: usize) -> Self {
        FixedUndirectedEdgeHandle::new(undirected_index).normalized()
    }

    /// The oppositely directed half edge of the same undirected edge.
    #[inline]
    pub fn rev(self) -> Self {
        Self(self.0 ^ 0x1)
    }

    /// The undirected edge this half edge belongs to.
    #[inline]
    pub fn as_undirected(self) -> FixedUndirectedEdgeHandle {
        FixedUndirectedEdgeHandle(self.0 >> 1)
    }

    /// Which of the two half edge slots of the undirected edge this is.
    #[inline]
    pub(crate) fn side(self) -> usize {
        (self.0 & 0x1) as usize
    }
}

impl FixedUndirectedEdgeHandle {
    /// The first of the two half edges of this edge.
    #[inline]
    pub fn normalized(self) -> FixedDirectedEdgeHandle {
        FixedDirectedEdgeHandle(self.0 << 1)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_directed_edge_encoding() {
        let undirected = FixedUndirectedEdgeHandle::new(21);
        let normalized = undirected.normalized();
        let reversed = normalized.rev();

        assert_eq!(normalized.index(), 42);
        assert_eq!(reversed.index(), 43);
        assert_eq!(reversed.rev(), normalized);
        assert_eq!(normalized.as_undirected(), undirected);
        assert_eq!(reversed.as_undirected(), undirected);
        assert_eq!(normalized.side(), 0);
        assert_eq!(reversed.side(), 1);
    }

    #[test]
    fn test_outer_face() {
        assert!(OUTER_FACE.is_outer());
        assert!(!FixedFaceHandle::new(1).is_outer());
    }
}
