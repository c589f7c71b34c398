//! Scene mesh loading: a PLY model (or a procedural stand-in) plus the ground
//! plane, uploaded once into vertex and index buffers.

use std::io::BufRead;
use std::path::Path;

use glam::Vec3;
use linked_hash_map::LinkedHashMap;
use wgpu::util::DeviceExt;

use deferred_core::geometry::{procedural_sphere, GeometryError, MeshData, RawMesh, Vertex};

use crate::error::{checked, SetupError};

/// Center and radius of the mesh used when the model file is missing.
pub const FALLBACK_CENTER: Vec3 = Vec3::new(0.0, 45.0, 0.0);
pub const FALLBACK_RADIUS: f32 = 25.0;

#[derive(Debug)]
pub enum MeshError {
    Io(std::io::Error),
    Ply(String),
    NoVertices,
    MissingProperty(String),
    Geometry(GeometryError),
}

impl std::fmt::Display for MeshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Mesh IO error: {}", e),
            Self::Ply(msg) => write!(f, "PLY parse error: {}", msg),
            Self::NoVertices => write!(f, "PLY has no vertices"),
            Self::MissingProperty(name) => write!(f, "PLY missing property: {}", name),
            Self::Geometry(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for MeshError {}

impl From<GeometryError> for MeshError {
    fn from(e: GeometryError) -> Self {
        Self::Geometry(e)
    }
}

const ATTRIBS: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

/// Position, normal and uv at locations 0, 1 and 2.
pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBS,
    }
}

/// Parse `vertex` positions and fan-triangulated `face` index lists.
pub fn parse_ply<R: BufRead>(reader: &mut R) -> Result<RawMesh, MeshError> {
    let parser = ply_rs::parser::Parser::<ply_rs::ply::DefaultElement>::new();
    let ply = parser
        .read_ply(reader)
        .map_err(|e| MeshError::Ply(format!("{:?}", e)))?;

    let vertices = ply.payload.get("vertex").ok_or(MeshError::NoVertices)?;
    if vertices.is_empty() {
        return Err(MeshError::NoVertices);
    }

    let positions = vertices
        .iter()
        .map(|v| {
            Ok(Vec3::new(
                get_float_property(v, "x")?,
                get_float_property(v, "y")?,
                get_float_property(v, "z")?,
            ))
        })
        .collect::<Result<Vec<_>, MeshError>>()?;

    let mut triangles = Vec::new();
    if let Some(faces) = ply.payload.get("face") {
        for face in faces {
            let indices = get_index_list(face)?;
            // Fan triangulation; faces with fewer than three indices are skipped.
            for i in 1..indices.len().saturating_sub(1) {
                triangles.push([indices[0], indices[i], indices[i + 1]]);
            }
        }
    }

    Ok(RawMesh {
        positions,
        triangles,
    })
}

fn get_float_property(
    element: &LinkedHashMap<String, ply_rs::ply::Property>,
    name: &str,
) -> Result<f32, MeshError> {
    match element.get(name) {
        Some(ply_rs::ply::Property::Float(v)) => Ok(*v),
        Some(ply_rs::ply::Property::Double(v)) => Ok(*v as f32),
        Some(_) => Err(MeshError::MissingProperty(format!(
            "{} has wrong type",
            name
        ))),
        None => Err(MeshError::MissingProperty(name.to_string())),
    }
}

fn get_index_list(
    element: &LinkedHashMap<String, ply_rs::ply::Property>,
) -> Result<Vec<u32>, MeshError> {
    use ply_rs::ply::Property;

    let property = element
        .get("vertex_indices")
        .or_else(|| element.get("vertex_index"))
        .ok_or_else(|| MeshError::MissingProperty("vertex_indices".to_string()))?;

    let list: Vec<i64> = match property {
        Property::ListInt(v) => v.iter().map(|&i| i as i64).collect(),
        Property::ListUInt(v) => v.iter().map(|&i| i as i64).collect(),
        Property::ListShort(v) => v.iter().map(|&i| i as i64).collect(),
        Property::ListUShort(v) => v.iter().map(|&i| i as i64).collect(),
        Property::ListChar(v) => v.iter().map(|&i| i as i64).collect(),
        Property::ListUChar(v) => v.iter().map(|&i| i as i64).collect(),
        _ => {
            return Err(MeshError::MissingProperty(
                "vertex_indices has wrong type".to_string(),
            ))
        }
    };

    list.into_iter()
        .map(|i| u32::try_from(i).map_err(|_| MeshError::Ply(format!("negative index {}", i))))
        .collect()
}

/// Load the scene mesh: the PLY at `path` scaled by `scale`, or a procedural
/// sphere when no file is given or the file does not exist. The ground plane
/// is appended in both cases.
pub fn load_scene_mesh(path: Option<&Path>, scale: f32) -> Result<MeshData, MeshError> {
    let raw = match path {
        Some(path) if path.exists() => {
            let file = std::fs::File::open(path).map_err(MeshError::Io)?;
            let mut reader = std::io::BufReader::new(file);
            let raw = parse_ply(&mut reader)?.scaled(scale);
            tracing::info!(
                "Parsed PLY: {} vertices, {} triangles from {:?}",
                raw.positions.len(),
                raw.triangles.len(),
                path.file_name().unwrap_or_default()
            );
            raw
        }
        Some(path) => {
            tracing::warn!("Mesh file not found: {:?}, using procedural sphere", path);
            procedural_sphere(FALLBACK_CENTER, FALLBACK_RADIUS, 32, 48)
        }
        None => {
            tracing::info!("No mesh configured, using procedural sphere");
            procedural_sphere(FALLBACK_CENTER, FALLBACK_RADIUS, 32, 48)
        }
    };

    Ok(MeshData::from_raw(&raw)?)
}

/// Vertex and index buffers of the whole scene (model + ground plane).
pub struct GpuMesh {
    pub index_buffer: wgpu::Buffer,
    pub vertex_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, mesh: &MeshData) -> Result<Self, SetupError> {
        let vertex_buffer = checked(device, "Scene Vertex Buffer", || {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Scene Vertex Buffer"),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            })
        })?;

        // Pad to a 4-byte multiple for odd u16 index counts.
        let mut indices = mesh.indices.clone();
        if indices.len() % 2 == 1 {
            indices.push(0);
        }
        let index_buffer = checked(device, "Scene Index Buffer", || {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Scene Index Buffer"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        })?;

        tracing::info!(
            "Uploaded scene mesh: {} vertices, {} indices",
            mesh.vertices.len(),
            mesh.index_count()
        );

        Ok(Self {
            index_buffer,
            vertex_buffer,
            index_count: mesh.index_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD_PLY: &str = "ply
format ascii 1.0
element vertex 4
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
end_header
0 0 0
1 0 0
1 1 0
0 1 0
4 0 1 2 3
";

    #[test]
    fn test_parse_ply_fan_triangulates() {
        let mut reader = std::io::Cursor::new(QUAD_PLY.as_bytes());
        let raw = parse_ply(&mut reader).unwrap();
        assert_eq!(raw.positions.len(), 4);
        assert_eq!(raw.positions[2], Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(raw.triangles, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_parse_ply_missing_coordinate() {
        let ply = "ply
format ascii 1.0
element vertex 1
property float x
property float y
end_header
0 0
";
        let mut reader = std::io::Cursor::new(ply.as_bytes());
        match parse_ply(&mut reader) {
            Err(MeshError::MissingProperty(name)) => assert_eq!(name, "z"),
            other => panic!("unexpected result: {:?}", other.map(|m| m.positions.len())),
        }
    }

    #[test]
    fn test_parsed_mesh_gets_normals_and_ground() {
        let mut reader = std::io::Cursor::new(QUAD_PLY.as_bytes());
        let raw = parse_ply(&mut reader).unwrap().scaled(2.0);
        let mesh = MeshData::from_raw(&raw).unwrap();
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.index_count(), 12);
        assert_eq!(mesh.vertices[2].position, [2.0, 2.0, 0.0]);
        for v in &mesh.vertices[..4] {
            assert!((v.normal[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_missing_file_uses_fallback() {
        let mesh = load_scene_mesh(Some(Path::new("does/not/exist.ply")), 1.0).unwrap();
        assert!(mesh.vertices.len() > 4);
        let top = mesh
            .vertices
            .iter()
            .map(|v| v.position[1])
            .fold(f32::NEG_INFINITY, f32::max);
        assert!((top - (FALLBACK_CENTER.y + FALLBACK_RADIUS)).abs() < 1e-3);
    }

    #[test]
    fn test_vertex_layout() {
        let layout = vertex_layout();
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes.len(), 3);
        assert_eq!(layout.attributes[1].offset, 12);
        assert_eq!(layout.attributes[2].offset, 24);
        assert_eq!(layout.attributes[2].shader_location, 2);
    }
}
