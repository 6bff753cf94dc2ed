use crate::Point2;

/// A vertex of an extracted mesh.
///
/// Ids are contiguous and start at zero. The text writer emits a zero `z`
/// coordinate for interchange with surface mesh formats.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexRecord {
    pub id: usize,
    pub position: Point2<f64>,
    pub attribute: String,
}

/// A triangle of an extracted mesh, referencing vertices by id.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FaceRecord {
    pub id: usize,
    pub vertices: [usize; 3],
    pub attribute: String,
}

/// The final meshing result: all inside triangles with their vertices,
/// renumbered contiguously.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TriangleMesh {
    pub vertices: Vec<VertexRecord>,
    pub faces: Vec<FaceRecord>,
}

impl TriangleMesh {
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// The corner positions of face `index`, in counter clockwise order.
    pub fn face_positions(&self, index: usize) -> [Point2<f64>; 3] {
        self.faces[index]
            .vertices
            .map(|vertex| self.vertices[vertex].position)
    }

    /// All edges that belong to exactly one face. For a classified mesh these
    /// are the region boundaries, each pair ordered as in its face.
    pub fn boundary_edges(&self) -> Vec<[usize; 2]> {
        use hashbrown::HashMap;

        let mut edge_count: HashMap<[usize; 2], usize> = HashMap::new();
        for face in &self.faces {
            let [a, b, c] = face.vertices;
            for [from, to] in [[a, b], [b, c], [c, a]] {
                let key = if from < to { [from, to] } else { [to, from] };
                *edge_count.entry(key).or_insert(0) += 1;
            }
        }

        let mut result = Vec::new();
        for face in &self.faces {
            let [a, b, c] = face.vertices;
            for [from, to] in [[a, b], [b, c], [c, a]] {
                let key = if from < to { [from, to] } else { [to, from] };
                if edge_count[&key] == 1 {
                    result.push([from, to]);
                }
            }
        }
        result
    }
}
