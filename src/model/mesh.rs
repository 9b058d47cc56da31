use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// Indexed triangle list on the CPU side
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Flat plane centered on the origin in the XZ plane, facing +Y
    pub fn plane(width: f32, depth: f32, segments: u32, color: [f32; 4]) -> Self {
        let segments = segments.max(1);
        let row = segments + 1;
        let mut vertices = Vec::with_capacity((row * row) as usize);
        for iz in 0..row {
            for ix in 0..row {
                let x = (ix as f32 / segments as f32 - 0.5) * width;
                let z = (iz as f32 / segments as f32 - 0.5) * depth;
                vertices.push(Vertex { pos: [x, 0.0, z], normal: [0.0, 1.0, 0.0], color });
            }
        }

        let mut indices = Vec::with_capacity((segments * segments * 6) as usize);
        for iz in 0..segments {
            for ix in 0..segments {
                let a = iz * row + ix;
                let b = a + 1;
                let c = a + row;
                let d = c + 1;
                // counter-clockwise seen from above
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }

        Self { vertices, indices }
    }

    /// Append `other` with its vertices transformed by `transform`
    pub fn append_transformed(&mut self, other: &Mesh, transform: &Mat4) {
        let normal_matrix = Mat3::from_mat4(*transform).inverse().transpose();
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices.iter().map(|v| Vertex {
            pos: transform.transform_point3(Vec3::from(v.pos)).to_array(),
            normal: (normal_matrix * Vec3::from(v.normal)).normalize_or_zero().to_array(),
            color: v.color,
        }));
        self.indices.extend(other.indices.iter().map(|i| base + i));
    }

    /// Replace vertex normals with area-weighted face normals
    pub fn compute_normals(&mut self) {
        let mut acc = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if a >= acc.len() || b >= acc.len() || c >= acc.len() {
                continue;
            }
            let pa = Vec3::from(self.vertices[a].pos);
            let pb = Vec3::from(self.vertices[b].pos);
            let pc = Vec3::from(self.vertices[c].pos);
            let face = (pb - pa).cross(pc - pa);
            acc[a] += face;
            acc[b] += face;
            acc[c] += face;
        }
        for (v, n) in self.vertices.iter_mut().zip(acc) {
            let n = n.normalize_or_zero();
            v.normal = if n == Vec3::ZERO { [0.0, 1.0, 0.0] } else { n.to_array() };
        }
    }

    pub fn upload(&self, device: &wgpu::Device, label: &str) -> MeshBuffer {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} vertices")),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} indices")),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}
