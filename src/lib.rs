//! # Ruppert
//!
//! A constrained Delaunay mesh generator for planar straight line graphs
//! with Ruppert style quality refinement.
//!
//! # Features
//! * Incremental Delaunay triangulation over a bounding quad, using exact
//!   predicates for all orientation and in-circle decisions
//! * Constraint segment recovery by midpoint subdivision; recovered segments
//!   are frozen and survive all later operations
//! * Inside/outside classification with hole markers
//! * Quality refinement with configurable angle and area bounds, see
//!   [RefinementParameters]
//! * A small tagged text format for meshes and input geometry, see the
//!   [io] module
//!
//! # Example
//! ```
//! use ruppert::{process_poly, Point2, Pslg, RefinementParameters};
//!
//! // Mesh the unit square.
//! let pslg = Pslg::new(
//!     vec![
//!         Point2::new(0.0, 0.0),
//!         Point2::new(1.0, 0.0),
//!         Point2::new(1.0, 1.0),
//!         Point2::new(0.0, 1.0),
//!     ],
//!     vec![[0, 1], [1, 2], [2, 3], [3, 0]],
//! );
//! let output = process_poly(&pslg, &RefinementParameters::default())?;
//! assert!(output.refinement.complete);
//! # Ok::<(), ruppert::MeshingError>(())
//! ```

#![forbid(unsafe_code)]

mod error;
pub mod io;
mod mesh;
pub mod mesh_core;
mod point;
mod pslg;
mod refinement;
mod triangulation;

pub use error::{CoordinateError, MeshingError, MeshingWarning};
pub use mesh::{FaceRecord, TriangleMesh, VertexRecord};
pub use point::{MeshNum, Point2};
pub use pslg::Pslg;
pub use refinement::{AngleLimit, RefinementOutcome, RefinementParameters};
pub use triangulation::{
    delaunay_triangulate, process_poly, DelaunayMesh, MeshOutput, PositionInMesh, Segment,
    SHARP_EDGE_ATTRIBUTE,
};
