use glam::{Vec2, Vec3};

/// Vertex as stored in the vertex buffer: position, normal, uv (8 floats).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Height of the ground plane in model space.
pub const GROUND_PLANE_Y: f32 = 20.0;

/// Half extent of the ground plane along x and z.
pub const GROUND_PLANE_HALF_SIZE: f32 = 100.0;

/// Largest vertex count addressable with `u16` indices.
pub const MAX_INDEXED_VERTICES: usize = u16::MAX as usize + 1;

/// Triangle soup before normals and uvs are derived.
#[derive(Debug, Clone, Default)]
pub struct RawMesh {
    pub positions: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl RawMesh {
    pub fn scaled(mut self, scale: f32) -> Self {
        for p in &mut self.positions {
            *p *= scale;
        }
        self
    }
}

/// Indexed mesh ready for upload.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    TooManyVertices(usize),
    IndexOutOfBounds { index: u32, vertex_count: usize },
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooManyVertices(n) => write!(
                f,
                "Mesh has {} vertices, 16-bit indices address at most {}",
                n, MAX_INDEXED_VERTICES
            ),
            Self::IndexOutOfBounds { index, vertex_count } => write!(
                f,
                "Triangle index {} out of bounds for {} vertices",
                index, vertex_count
            ),
        }
    }
}

impl std::error::Error for GeometryError {}

impl MeshData {
    /// Build the indexed mesh from a triangle soup, deriving smooth normals and
    /// XY-projected uvs, then append the ground plane.
    pub fn from_raw(raw: &RawMesh) -> Result<Self, GeometryError> {
        let total = raw.positions.len() + 4;
        if total > MAX_INDEXED_VERTICES {
            return Err(GeometryError::TooManyVertices(total));
        }
        for tri in &raw.triangles {
            for &index in tri {
                if index as usize >= raw.positions.len() {
                    return Err(GeometryError::IndexOutOfBounds {
                        index,
                        vertex_count: raw.positions.len(),
                    });
                }
            }
        }

        let normals = compute_surface_normals(&raw.positions, &raw.triangles);
        let uvs = compute_projected_plane_uvs(&raw.positions);

        let mut vertices: Vec<Vertex> = raw
            .positions
            .iter()
            .zip(normals.iter().zip(uvs.iter()))
            .map(|(p, (n, uv))| Vertex {
                position: p.to_array(),
                normal: n.to_array(),
                uv: uv.to_array(),
            })
            .collect();
        let mut indices: Vec<u16> = raw
            .triangles
            .iter()
            .flat_map(|tri| tri.iter().map(|&i| i as u16))
            .collect();

        append_ground_plane(&mut vertices, &mut indices);
        Ok(Self { vertices, indices })
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Four vertices at `GROUND_PLANE_Y` facing +Y and two triangles.
pub fn append_ground_plane(vertices: &mut Vec<Vertex>, indices: &mut Vec<u16>) {
    let s = GROUND_PLANE_HALF_SIZE;
    let y = GROUND_PLANE_Y;
    let base = vertices.len() as u16;
    let corners = [
        ([-s, y, -s], [0.0, 0.0]),
        ([s, y, s], [1.0, 1.0]),
        ([-s, y, s], [0.0, 1.0]),
        ([s, y, -s], [1.0, 0.0]),
    ];
    vertices.extend(corners.iter().map(|&(position, uv)| Vertex {
        position,
        normal: [0.0, 1.0, 0.0],
        uv,
    }));
    indices.extend_from_slice(&[base, base + 2, base + 1, base, base + 1, base + 3]);
}

/// Per-vertex normals averaged from the (area-weighted) face normals.
pub fn compute_surface_normals(positions: &[Vec3], triangles: &[[u32; 3]]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for &[a, b, c] in triangles {
        let (p0, p1, p2) = (
            positions[a as usize],
            positions[b as usize],
            positions[c as usize],
        );
        let face = (p1 - p0).cross(p2 - p0);
        normals[a as usize] += face;
        normals[b as usize] += face;
        normals[c as usize] += face;
    }
    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
        .collect()
}

/// Project positions onto the XY plane, normalized to the mesh bounds.
pub fn compute_projected_plane_uvs(positions: &[Vec3]) -> Vec<Vec2> {
    if positions.is_empty() {
        return Vec::new();
    }
    let (min, max) = positions.iter().fold(
        (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
        |(min, max), p| (min.min(p.truncate()), max.max(p.truncate())),
    );
    let size = (max - min).max(Vec2::splat(f32::EPSILON));
    positions
        .iter()
        .map(|p| (p.truncate() - min) / size)
        .collect()
}

/// UV sphere with outward counter-clockwise triangles.
pub fn procedural_sphere(center: Vec3, radius: f32, rings: u32, segments: u32) -> RawMesh {
    let rings = rings.max(2);
    let segments = segments.max(3);

    // Poles are shared; interior rings have `segments` vertices each.
    let top = 0u32;
    let ring = |i: u32, j: u32| 1 + (i - 1) * segments + (j % segments);
    let bottom = 1 + (rings - 1) * segments;

    let mut positions = Vec::with_capacity(bottom as usize + 1);
    positions.push(center + Vec3::Y * radius);
    for i in 1..rings {
        let theta = std::f32::consts::PI * i as f32 / rings as f32;
        for j in 0..segments {
            let phi = std::f32::consts::TAU * j as f32 / segments as f32;
            let dir = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
            positions.push(center + dir * radius);
        }
    }
    positions.push(center - Vec3::Y * radius);

    let mut triangles = Vec::with_capacity((rings * segments * 2) as usize);
    for j in 0..segments {
        triangles.push([top, ring(1, j + 1), ring(1, j)]);
    }
    for i in 1..rings - 1 {
        for j in 0..segments {
            let a = ring(i, j);
            let b = ring(i + 1, j);
            let c = ring(i + 1, j + 1);
            let d = ring(i, j + 1);
            triangles.push([a, c, b]);
            triangles.push([a, d, c]);
        }
    }
    for j in 0..segments {
        triangles.push([ring(rings - 1, j), ring(rings - 1, j + 1), bottom]);
    }

    RawMesh {
        positions,
        triangles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle() -> RawMesh {
        RawMesh {
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            triangles: vec![[0, 1, 2]],
        }
    }

    #[test]
    fn test_vertex_is_eight_floats() {
        assert_eq!(std::mem::size_of::<Vertex>(), 8 * 4);
    }

    #[test]
    fn test_from_raw_appends_ground_plane() {
        let mesh = MeshData::from_raw(&single_triangle()).unwrap();
        assert_eq!(mesh.vertices.len(), 3 + 4);
        assert_eq!(mesh.indices.len(), 3 + 6);
        assert_eq!(&mesh.indices[3..], &[3, 5, 4, 3, 4, 6]);
        for v in &mesh.vertices[3..] {
            assert_eq!(v.position[1], GROUND_PLANE_Y);
            assert_eq!(v.normal, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn test_ground_plane_faces_up() {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        append_ground_plane(&mut vertices, &mut indices);
        for tri in indices.chunks(3) {
            let p = |i: u16| Vec3::from_array(vertices[i as usize].position);
            let n = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            assert!(n.y > 0.0);
        }
    }

    #[test]
    fn test_surface_normals_follow_winding() {
        let raw = single_triangle();
        let normals = compute_surface_normals(&raw.positions, &raw.triangles);
        for n in normals {
            assert!((n - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_unreferenced_vertex_gets_fallback_normal() {
        let normals = compute_surface_normals(&[Vec3::ZERO], &[]);
        assert_eq!(normals, vec![Vec3::Y]);
    }

    #[test]
    fn test_projected_uvs_span_unit_square() {
        let uvs = compute_projected_plane_uvs(&[
            Vec3::new(-2.0, 4.0, 9.0),
            Vec3::new(2.0, 8.0, -9.0),
            Vec3::new(0.0, 6.0, 0.0),
        ]);
        assert_eq!(uvs[0], Vec2::new(0.0, 0.0));
        assert_eq!(uvs[1], Vec2::new(1.0, 1.0));
        assert_eq!(uvs[2], Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_sphere_normals_point_outward() {
        let center = Vec3::new(0.0, 45.0, 0.0);
        let raw = procedural_sphere(center, 25.0, 16, 24);
        let normals = compute_surface_normals(&raw.positions, &raw.triangles);
        for (p, n) in raw.positions.iter().zip(&normals) {
            let outward = (*p - center).normalize();
            assert!(n.dot(outward) > 0.9, "normal {} at {} points inward", n, p);
        }
    }

    #[test]
    fn test_too_many_vertices_rejected() {
        let raw = RawMesh {
            positions: vec![Vec3::ZERO; MAX_INDEXED_VERTICES],
            triangles: Vec::new(),
        };
        assert_eq!(
            MeshData::from_raw(&raw).unwrap_err(),
            GeometryError::TooManyVertices(MAX_INDEXED_VERTICES + 4)
        );
    }

    #[test]
    fn test_out_of_bounds_index_rejected() {
        let mut raw = single_triangle();
        raw.triangles.push([0, 1, 9]);
        assert!(matches!(
            MeshData::from_raw(&raw),
            Err(GeometryError::IndexOutOfBounds { index: 9, .. })
        ));
    }

    #[test]
    fn test_scaled() {
        let raw = single_triangle().scaled(3.0);
        assert_eq!(raw.positions[1], Vec3::new(3.0, 0.0, 0.0));
    }
}
