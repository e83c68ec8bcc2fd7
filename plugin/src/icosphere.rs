use std::collections::HashMap;

/// Golden ratio, the icosahedron's edge proportion.
const PHI: f64 = 1.618033988749895;

const BASE_FACES: [[u32; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

/// Unit-radius triangulated sphere built by subdividing an icosahedron.
///
/// Triangles wind counter-clockwise when seen from outside.
#[derive(Debug, Clone, PartialEq)]
pub struct IcoSphere {
    pub positions: Vec<[f32; 3]>,
    pub triangles: Vec<[u32; 3]>,
}

impl IcoSphere {
    /// Build a sphere with `subdivisions` rounds of 4-way triangle splitting.
    pub fn new(subdivisions: u32) -> Self {
        let mut builder = Builder::default();
        let base = [
            (-1.0, PHI, 0.0),
            (1.0, PHI, 0.0),
            (-1.0, -PHI, 0.0),
            (1.0, -PHI, 0.0),
            (0.0, -1.0, PHI),
            (0.0, 1.0, PHI),
            (0.0, -1.0, -PHI),
            (0.0, 1.0, -PHI),
            (PHI, 0.0, -1.0),
            (PHI, 0.0, 1.0),
            (-PHI, 0.0, -1.0),
            (-PHI, 0.0, 1.0),
        ];
        for (x, y, z) in base {
            builder.push_unit([x, y, z]);
        }

        let mut faces = BASE_FACES.to_vec();
        for _ in 0..subdivisions {
            let mut next = Vec::with_capacity(faces.len() * 4);
            for [a, b, c] in faces {
                let ab = builder.midpoint(a, b);
                let bc = builder.midpoint(b, c);
                let ca = builder.midpoint(c, a);
                next.push([a, ab, ca]);
                next.push([b, bc, ab]);
                next.push([c, ca, bc]);
                next.push([ab, bc, ca]);
            }
            faces = next;
        }

        Self {
            positions: builder
                .positions
                .iter()
                .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
                .collect(),
            triangles: faces,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Flat index buffer (three indices per triangle).
    pub fn indices(&self) -> Vec<u32> {
        self.triangles.iter().flatten().copied().collect()
    }
}

#[derive(Default)]
struct Builder {
    positions: Vec<[f64; 3]>,
    midpoints: HashMap<(u32, u32), u32>,
}

impl Builder {
    fn push_unit(&mut self, p: [f64; 3]) -> u32 {
        let len = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
        self.positions.push([p[0] / len, p[1] / len, p[2] / len]);
        (self.positions.len() - 1) as u32
    }

    /// Shared edges must reuse the same midpoint vertex.
    fn midpoint(&mut self, a: u32, b: u32) -> u32 {
        let key = if a < b { (a, b) } else { (b, a) };
        if let Some(&idx) = self.midpoints.get(&key) {
            return idx;
        }
        let pa = self.positions[a as usize];
        let pb = self.positions[b as usize];
        let idx = self.push_unit([
            (pa[0] + pb[0]) * 0.5,
            (pa[1] + pb[1]) * 0.5,
            (pa[2] + pb[2]) * 0.5,
        ]);
        self.midpoints.insert(key, idx);
        idx
    }
}
