//! Readers and writers for the tagged text mesh formats.
//!
//! A mesh file consists of `Vertex` and `Face` lines; the input geometry
//! format uses `Point`, `Segment` and `Hole` lines. Each element line may
//! carry a free-form attribute trailer in braces:
//!
//! ```text
//! # comment
//! Vertex 1 0.5 1.25 0 {sharp}
//! Face 1 1 2 3
//! ```
//!
//! Vertex ids in files are one based and may be sparse; readers renumber
//! elements contiguously in order of appearance.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use hashbrown::HashMap;

use crate::mesh::{FaceRecord, TriangleMesh, VertexRecord};
use crate::{MeshingError, Point2, Pslg};

pub fn write_mesh<W: Write>(mesh: &TriangleMesh, mut writer: W) -> Result<(), MeshingError> {
    for vertex in &mesh.vertices {
        write!(
            writer,
            "Vertex {} {} {} 0",
            vertex.id + 1,
            vertex.position.x,
            vertex.position.y
        )?;
        write_attribute(&mut writer, &vertex.attribute)?;
    }
    for face in &mesh.faces {
        let [a, b, c] = face.vertices;
        write!(writer, "Face {} {} {} {}", face.id + 1, a + 1, b + 1, c + 1)?;
        write_attribute(&mut writer, &face.attribute)?;
    }
    Ok(())
}

fn write_attribute<W: Write>(writer: &mut W, attribute: &str) -> Result<(), MeshingError> {
    if attribute.is_empty() {
        writeln!(writer)?;
    } else {
        writeln!(writer, " {{{attribute}}}")?;
    }
    Ok(())
}

pub fn read_mesh<R: BufRead>(reader: R) -> Result<TriangleMesh, MeshingError> {
    let mut mesh = TriangleMesh::default();
    let mut vertex_ids: HashMap<usize, usize> = HashMap::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = line_number + 1;
        let Some((body, attribute)) = split_attribute(&line, line_number)? else {
            continue;
        };
        let mut tokens = body.split_whitespace();
        let keyword = tokens.next().unwrap_or("");

        match keyword {
            "Vertex" => {
                let id = parse_token(&mut tokens, line_number, "vertex id")?;
                let x = parse_token(&mut tokens, line_number, "x coordinate")?;
                let y = parse_token(&mut tokens, line_number, "y coordinate")?;
                // The z coordinate is accepted and ignored for planar meshes.
                let _: Option<&str> = tokens.next();
                vertex_ids.insert(id, mesh.vertices.len());
                mesh.vertices.push(VertexRecord {
                    id: mesh.vertices.len(),
                    position: Point2::new(x, y),
                    attribute,
                });
            }
            "Face" => {
                let _: usize = parse_token(&mut tokens, line_number, "face id")?;
                let mut corners = [0usize; 3];
                for (slot, name) in ["first", "second", "third"].iter().enumerate() {
                    let id: usize =
                        parse_token(&mut tokens, line_number, &format!("{name} corner"))?;
                    corners[slot] = *vertex_ids.get(&id).ok_or_else(|| MeshingError::Parse {
                        line: line_number,
                        message: format!("face references unknown vertex {id}"),
                    })?;
                }
                mesh.faces.push(FaceRecord {
                    id: mesh.faces.len(),
                    vertices: corners,
                    attribute,
                });
            }
            other => {
                return Err(MeshingError::Parse {
                    line: line_number,
                    message: format!("unknown element '{other}'"),
                });
            }
        }
    }

    Ok(mesh)
}

pub fn write_pslg<W: Write>(pslg: &Pslg, mut writer: W) -> Result<(), MeshingError> {
    for (index, point) in pslg.points.iter().enumerate() {
        writeln!(writer, "Point {} {} {}", index + 1, point.x, point.y)?;
    }
    for &[from, to] in &pslg.segments {
        writeln!(writer, "Segment {} {}", from + 1, to + 1)?;
    }
    for hole in &pslg.holes {
        writeln!(writer, "Hole {} {}", hole.x, hole.y)?;
    }
    Ok(())
}

pub fn read_pslg<R: BufRead>(reader: R) -> Result<Pslg, MeshingError> {
    let mut pslg = Pslg::default();
    let mut point_ids: HashMap<usize, usize> = HashMap::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = line_number + 1;
        let Some((body, _)) = split_attribute(&line, line_number)? else {
            continue;
        };
        let mut tokens = body.split_whitespace();
        let keyword = tokens.next().unwrap_or("");

        match keyword {
            "Point" => {
                let id = parse_token(&mut tokens, line_number, "point id")?;
                let x = parse_token(&mut tokens, line_number, "x coordinate")?;
                let y = parse_token(&mut tokens, line_number, "y coordinate")?;
                point_ids.insert(id, pslg.points.len());
                pslg.points.push(Point2::new(x, y));
            }
            "Segment" => {
                let mut endpoints = [0usize; 2];
                for (slot, name) in ["first", "second"].iter().enumerate() {
                    let id: usize =
                        parse_token(&mut tokens, line_number, &format!("{name} endpoint"))?;
                    endpoints[slot] = *point_ids.get(&id).ok_or_else(|| MeshingError::Parse {
                        line: line_number,
                        message: format!("segment references unknown point {id}"),
                    })?;
                }
                pslg.segments.push(endpoints);
            }
            "Hole" => {
                let x = parse_token(&mut tokens, line_number, "x coordinate")?;
                let y = parse_token(&mut tokens, line_number, "y coordinate")?;
                pslg.holes.push(Point2::new(x, y));
            }
            other => {
                return Err(MeshingError::Parse {
                    line: line_number,
                    message: format!("unknown element '{other}'"),
                });
            }
        }
    }

    Ok(pslg)
}

/// Derives meshing input from an existing mesh: every vertex becomes a point
/// and every boundary edge (an edge with exactly one adjacent face) becomes a
/// segment.
///
/// Useful for re-meshing a previously generated or hand-built mesh with
/// different quality bounds. Interior hole boundaries become segment loops as
/// well; hole markers still have to be supplied by the caller.
pub fn mesh_to_pslg(mesh: &TriangleMesh) -> Pslg {
    let points = mesh.vertices.iter().map(|vertex| vertex.position).collect();
    Pslg {
        points,
        segments: mesh.boundary_edges(),
        holes: Vec::new(),
    }
}

pub fn load_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh, MeshingError> {
    read_mesh(BufReader::new(File::open(path)?))
}

pub fn save_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<(), MeshingError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_mesh(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

pub fn load_pslg<P: AsRef<Path>>(path: P) -> Result<Pslg, MeshingError> {
    read_pslg(BufReader::new(File::open(path)?))
}

pub fn save_pslg<P: AsRef<Path>>(pslg: &Pslg, path: P) -> Result<(), MeshingError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_pslg(pslg, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Splits a line into its token body and an optional `{...}` attribute
/// trailer. Returns `None` for blank lines and `#` comments.
fn split_attribute(
    line: &str,
    line_number: usize,
) -> Result<Option<(&str, String)>, MeshingError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    if let Some(open) = trimmed.find('{') {
        let close = trimmed.rfind('}').ok_or_else(|| MeshingError::Parse {
            line: line_number,
            message: "unterminated attribute brace".into(),
        })?;
        if close < open {
            return Err(MeshingError::Parse {
                line: line_number,
                message: "malformed attribute brace".into(),
            });
        }
        let attribute = trimmed[open + 1..close].trim().to_string();
        Ok(Some((&trimmed[..open], attribute)))
    } else {
        Ok(Some((trimmed, String::new())))
    }
}

fn parse_token<'a, T: std::str::FromStr>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line_number: usize,
    expected: &str,
) -> Result<T, MeshingError> {
    let token = tokens.next().ok_or_else(|| MeshingError::Parse {
        line: line_number,
        message: format!("missing {expected}"),
    })?;
    token.parse().map_err(|_| MeshingError::Parse {
        line: line_number,
        message: format!("cannot parse {expected} '{token}'"),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mesh_round_trip() {
        let input = "\
# a single triangle
Vertex 1 0 0 0 {sharp}
Vertex 2 1.5 0 0
Vertex 3 0 2.25 0

Face 1 1 2 3
";
        let mesh = read_mesh(input.as_bytes()).unwrap();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.vertices[0].attribute, "sharp");
        assert_eq!(mesh.vertices[1].position, Point2::new(1.5, 0.0));
        assert_eq!(mesh.faces[0].vertices, [0, 1, 2]);

        let mut buffer = Vec::new();
        write_mesh(&mesh, &mut buffer).unwrap();
        let reread = read_mesh(buffer.as_slice()).unwrap();
        assert_eq!(mesh, reread);
    }

    #[test]
    fn test_sparse_vertex_ids() {
        let input = "\
Vertex 10 0 0 0
Vertex 20 1 0 0
Vertex 30 0 1 0
Face 1 10 20 30
";
        let mesh = read_mesh(input.as_bytes()).unwrap();
        assert_eq!(mesh.faces[0].vertices, [0, 1, 2]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            read_mesh("Vertex 1 0".as_bytes()),
            Err(MeshingError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            read_mesh("Tetrahedron 1 2 3 4".as_bytes()),
            Err(MeshingError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            read_mesh("Face 1 1 2 3".as_bytes()),
            Err(MeshingError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            read_mesh("Vertex 1 0 0 0 {oops".as_bytes()),
            Err(MeshingError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_read_pslg() {
        let input = "\
# unit square with hole marker
Point 1 0 0
Point 2 1 0
Point 3 1 1
Point 4 0 1
Segment 1 2
Segment 2 3
Segment 3 4
Segment 4 1
Hole 0.5 0.5
";
        let pslg = read_pslg(input.as_bytes()).unwrap();
        assert_eq!(pslg.points.len(), 4);
        assert_eq!(pslg.segments, vec![[0, 1], [1, 2], [2, 3], [3, 0]]);
        assert_eq!(pslg.holes, vec![Point2::new(0.5, 0.5)]);
        assert!(pslg.validate().is_ok());

        let mut buffer = Vec::new();
        write_pslg(&pslg, &mut buffer).unwrap();
        let reread = read_pslg(buffer.as_slice()).unwrap();
        assert_eq!(pslg.points, reread.points);
        assert_eq!(pslg.segments, reread.segments);
    }

    #[test]
    fn test_mesh_to_pslg() {
        let input = "\
Vertex 1 0 0 0
Vertex 2 1 0 0
Vertex 3 1 1 0
Vertex 4 0 1 0
Face 1 1 2 3
Face 2 1 3 4
";
        let mesh = read_mesh(input.as_bytes()).unwrap();
        let pslg = mesh_to_pslg(&mesh);
        assert_eq!(pslg.points.len(), 4);
        // The four outer edges are boundary segments, the diagonal is not.
        assert_eq!(pslg.segments.len(), 4);
        assert!(pslg.validate().is_ok());
    }
}
