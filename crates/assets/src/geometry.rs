use bytemuck::{Pod, Zeroable};

/// Interleaved vertex shared by every built-in geometry.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// CPU-side indexed triangle mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

const fn v(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Vertex {
    Vertex {
        position,
        normal,
        uv,
    }
}

impl Geometry {
    /// Unit cube centered on the origin, one quad per face.
    pub fn cube() -> Self {
        let p = 0.5_f32;
        #[rustfmt::skip]
        let vertices = vec![
            // +Z face
            v([-p, -p,  p], [0.0, 0.0, 1.0], [0.0, 1.0]),
            v([ p, -p,  p], [0.0, 0.0, 1.0], [1.0, 1.0]),
            v([ p,  p,  p], [0.0, 0.0, 1.0], [1.0, 0.0]),
            v([-p,  p,  p], [0.0, 0.0, 1.0], [0.0, 0.0]),
            // -Z face
            v([ p, -p, -p], [0.0, 0.0, -1.0], [0.0, 1.0]),
            v([-p, -p, -p], [0.0, 0.0, -1.0], [1.0, 1.0]),
            v([-p,  p, -p], [0.0, 0.0, -1.0], [1.0, 0.0]),
            v([ p,  p, -p], [0.0, 0.0, -1.0], [0.0, 0.0]),
            // +X face
            v([ p, -p,  p], [1.0, 0.0, 0.0], [0.0, 1.0]),
            v([ p, -p, -p], [1.0, 0.0, 0.0], [1.0, 1.0]),
            v([ p,  p, -p], [1.0, 0.0, 0.0], [1.0, 0.0]),
            v([ p,  p,  p], [1.0, 0.0, 0.0], [0.0, 0.0]),
            // -X face
            v([-p, -p, -p], [-1.0, 0.0, 0.0], [0.0, 1.0]),
            v([-p, -p,  p], [-1.0, 0.0, 0.0], [1.0, 1.0]),
            v([-p,  p,  p], [-1.0, 0.0, 0.0], [1.0, 0.0]),
            v([-p,  p, -p], [-1.0, 0.0, 0.0], [0.0, 0.0]),
            // +Y face
            v([-p,  p,  p], [0.0, 1.0, 0.0], [0.0, 1.0]),
            v([ p,  p,  p], [0.0, 1.0, 0.0], [1.0, 1.0]),
            v([ p,  p, -p], [0.0, 1.0, 0.0], [1.0, 0.0]),
            v([-p,  p, -p], [0.0, 1.0, 0.0], [0.0, 0.0]),
            // -Y face
            v([-p, -p, -p], [0.0, -1.0, 0.0], [0.0, 1.0]),
            v([ p, -p, -p], [0.0, -1.0, 0.0], [1.0, 1.0]),
            v([ p, -p,  p], [0.0, -1.0, 0.0], [1.0, 0.0]),
            v([-p, -p,  p], [0.0, -1.0, 0.0], [0.0, 0.0]),
        ];
        #[rustfmt::skip]
        let indices: Vec<u16> = vec![
            0,1,2, 2,3,0,       // +Z
            4,5,6, 6,7,4,       // -Z
            8,9,10, 10,11,8,    // +X
            12,13,14, 14,15,12, // -X
            16,17,18, 18,19,16, // +Y
            20,21,22, 22,23,20, // -Y
        ];
        Self { vertices, indices }
    }

    /// Full-screen quad in clip space. UV origin is the top-left corner.
    pub fn quad() -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            v([-1.0, -1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
            v([ 1.0, -1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
            v([ 1.0,  1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            v([-1.0,  1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
        ];
        Self {
            vertices,
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Raw vertex bytes for GPU upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_counts() {
        let cube = Geometry::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.index_count(), 36);
        assert!(cube.indices.iter().all(|&i| (i as usize) < cube.vertices.len()));
    }

    #[test]
    fn cube_normals_point_outward() {
        let cube = Geometry::cube();
        for vert in &cube.vertices {
            let dot: f32 = vert
                .position
                .iter()
                .zip(vert.normal.iter())
                .map(|(p, n)| p * n)
                .sum();
            assert!((dot - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn quad_covers_clip_space() {
        let quad = Geometry::quad();
        assert_eq!(quad.index_count(), 6);
        let xs: Vec<f32> = quad.vertices.iter().map(|v| v.position[0]).collect();
        assert!(xs.contains(&-1.0) && xs.contains(&1.0));
        // Top-left clip corner maps to uv (0, 0)
        let top_left = quad
            .vertices
            .iter()
            .find(|v| v.position[0] == -1.0 && v.position[1] == 1.0)
            .map(|v| v.uv);
        assert_eq!(top_left, Some([0.0, 0.0]));
    }

    #[test]
    fn byte_views_match_lengths() {
        let cube = Geometry::cube();
        assert_eq!(cube.vertex_bytes().len(), 24 * std::mem::size_of::<Vertex>());
        assert_eq!(cube.index_bytes().len(), 36 * 2);
    }
}
