//! Polyhedral meshes: icosahedron for item placement, plane for billboards.

use std::collections::{HashMap, HashSet};

use cgmath::{InnerSpace, Vector2, Vector3, Zero};

/// Vertex of a [`Geometry`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MeshVertex {
    /// Position in model space.
    pub position: Vector3<f32>,
    /// Unit normal, or zero if none has been computed.
    pub normal: Vector3<f32>,
    /// Texture coordinate.
    pub uv: Vector2<f32>,
}
impl MeshVertex {
    /// Constructs a vertex at `position` with zero normal and UV.
    pub fn new(position: Vector3<f32>) -> Self {
        Self {
            position,
            normal: Vector3::zero(),
            uv: Vector2::zero(),
        }
    }
}

/// Triangle referencing three vertices of a [`Geometry`] by index.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Face {
    #[allow(missing_docs)]
    pub a: u32,
    #[allow(missing_docs)]
    pub b: u32,
    #[allow(missing_docs)]
    pub c: u32,
}
impl Face {
    /// Constructs a triangle from three vertex indices.
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }

    /// Returns the three edges of the triangle as unordered index pairs.
    pub fn edges(self) -> [(u32, u32); 3] {
        [
            edge_key(self.a, self.b),
            edge_key(self.b, self.c),
            edge_key(self.c, self.a),
        ]
    }
}

/// Triangle mesh built from append-only vertex and face lists.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Geometry {
    vertices: Vec<MeshVertex>,
    faces: Vec<Face>,
}
impl Geometry {
    /// Constructs an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a regular icosahedron with 12 vertices and 20 faces.
    ///
    /// Vertices are not unit length; call [`Geometry::spherize()`] to project
    /// them onto a sphere.
    pub fn icosahedron() -> Self {
        let t = 5.0_f32.sqrt() * 0.5 + 0.5;

        let mut geo = Self::new();
        for [x, y, z] in [
            [-1.0, t, 0.0],
            [1.0, t, 0.0],
            [-1.0, -t, 0.0],
            [1.0, -t, 0.0],
            [0.0, -1.0, t],
            [0.0, 1.0, t],
            [0.0, -1.0, -t],
            [0.0, 1.0, -t],
            [t, 0.0, -1.0],
            [t, 0.0, 1.0],
            [-t, 0.0, -1.0],
            [-t, 0.0, 1.0],
        ] {
            geo.add_vertex(Vector3::new(x, y, z));
        }
        #[rustfmt::skip]
        let faces = [
            [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
            [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
            [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
            [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
        ];
        for [a, b, c] in faces {
            geo.add_face(a, b, c);
        }
        geo
    }

    /// Constructs a `width` by `height` rectangle in the XY plane, centered
    /// on the origin and facing +Z, with UVs running from (0, 0) at the
    /// bottom left to (1, 1) at the top right.
    pub fn plane(width: f32, height: f32) -> Self {
        let w2 = width / 2.0;
        let h2 = height / 2.0;

        let mut geo = Self::new();
        for ([x, y], [u, v]) in [
            ([-w2, h2], [0.0, 1.0]),  // top left
            ([w2, h2], [1.0, 1.0]),   // top right
            ([-w2, -h2], [0.0, 0.0]), // bottom left
            ([w2, -h2], [1.0, 0.0]),  // bottom right
        ] {
            let i = geo.add_vertex(Vector3::new(x, y, 0.0));
            geo.vertices[i as usize].normal = Vector3::unit_z();
            geo.vertices[i as usize].uv = Vector2::new(u, v);
        }
        geo.add_face(0, 2, 1);
        geo.add_face(1, 2, 3);
        geo
    }

    /// Returns the vertices of the mesh.
    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }
    /// Returns the faces of the mesh.
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Appends a vertex and returns its index.
    pub fn add_vertex(&mut self, position: Vector3<f32>) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(MeshVertex::new(position));
        index
    }
    /// Appends a triangle.
    pub fn add_face(&mut self, a: u32, b: u32, c: u32) {
        self.faces.push(Face::new(a, b, c));
    }

    /// Splits every triangle into four, `divisions` times.
    ///
    /// Each edge gets exactly one midpoint vertex no matter how many faces
    /// share it, so the mesh stays watertight. The midpoint cache lives only
    /// for the duration of this call.
    pub fn subdivide(&mut self, divisions: usize) -> &mut Self {
        let mut midpoints = HashMap::new();

        for _ in 0..divisions {
            let old_faces = std::mem::take(&mut self.faces);
            self.faces.reserve(old_faces.len() * 4);

            for face in old_faces {
                let ab = self.midpoint(face.a, face.b, &mut midpoints);
                let bc = self.midpoint(face.b, face.c, &mut midpoints);
                let ca = self.midpoint(face.c, face.a, &mut midpoints);

                self.add_face(face.a, ab, ca);
                self.add_face(face.b, bc, ab);
                self.add_face(face.c, ca, bc);
                self.add_face(ab, bc, ca);
            }
        }

        self
    }

    fn midpoint(&mut self, a: u32, b: u32, cache: &mut HashMap<(u32, u32), u32>) -> u32 {
        if let Some(&i) = cache.get(&edge_key(a, b)) {
            return i;
        }
        let va = self.vertices[a as usize];
        let vb = self.vertices[b as usize];
        let i = self.add_vertex((va.position + vb.position) * 0.5);
        self.vertices[i as usize].uv = (va.uv + vb.uv) * 0.5;
        cache.insert(edge_key(a, b), i);
        i
    }

    /// Projects every vertex onto a sphere of the given radius centered on
    /// the origin and sets its normal to point outward.
    ///
    /// Vertices at the origin have no direction and are left unchanged.
    pub fn spherize(&mut self, radius: f32) -> &mut Self {
        for v in &mut self.vertices {
            if v.position.magnitude2() == 0.0 {
                continue;
            }
            v.normal = v.position.normalize();
            v.position = v.normal * radius;
        }
        self
    }

    /// Returns vertex positions as a flat `[x, y, z, ...]` array.
    pub fn vertex_data(&self) -> Vec<f32> {
        self.vertices
            .iter()
            .flat_map(|v| -> [f32; 3] { v.position.into() })
            .collect()
    }
    /// Returns vertex normals as a flat `[x, y, z, ...]` array.
    pub fn normal_data(&self) -> Vec<f32> {
        self.vertices
            .iter()
            .flat_map(|v| -> [f32; 3] { v.normal.into() })
            .collect()
    }
    /// Returns texture coordinates as a flat `[u, v, ...]` array.
    pub fn uv_data(&self) -> Vec<f32> {
        self.vertices
            .iter()
            .flat_map(|v| -> [f32; 2] { v.uv.into() })
            .collect()
    }
    /// Returns triangle indices as a flat `[a, b, c, ...]` array.
    pub fn index_data(&self) -> Vec<u32> {
        self.faces.iter().flat_map(|f| [f.a, f.b, f.c]).collect()
    }

    /// Returns the number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.faces
            .iter()
            .flat_map(|f| f.edges())
            .collect::<HashSet<_>>()
            .len()
    }
    /// Returns `V - E + F`, which is 2 for any closed mesh with the topology
    /// of a sphere.
    pub fn euler_characteristic(&self) -> isize {
        self.vertices.len() as isize - self.edge_count() as isize + self.faces.len() as isize
    }
}

fn edge_key(a: u32, b: u32) -> (u32, u32) {
    (a.min(b), a.max(b))
}
