//! Mesh primitives (box, sphere, capsule, torus knot)

use crate::graph::{Mesh, Vertex};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Create a box mesh with the given dimensions
pub fn create_box_mesh(width: f32, height: f32, depth: f32) -> Mesh {
    let hw = width / 2.0;
    let hh = height / 2.0;
    let hd = depth / 2.0;

    // 8 corners
    let p = [
        [-hw, -hh, -hd],
        [hw, -hh, -hd],
        [hw, hh, -hd],
        [-hw, hh, -hd],
        [-hw, -hh, hd],
        [hw, -hh, hd],
        [hw, hh, hd],
        [-hw, hh, hd],
    ];

    // Corner order per face is CCW around the outward normal
    let faces: [([usize; 4], [f32; 3]); 6] = [
        ([0, 3, 2, 1], [0.0, 0.0, -1.0]),
        ([4, 5, 6, 7], [0.0, 0.0, 1.0]),
        ([0, 4, 7, 3], [-1.0, 0.0, 0.0]),
        ([5, 1, 2, 6], [1.0, 0.0, 0.0]),
        ([0, 1, 5, 4], [0.0, -1.0, 0.0]),
        ([3, 7, 6, 2], [0.0, 1.0, 0.0]),
    ];
    let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    let vertices = faces
        .iter()
        .flat_map(|(corners, normal)| {
            corners.iter().zip(uvs).map(move |(&c, uv)| Vertex {
                position: p[c],
                normal: *normal,
                uv,
            })
        })
        .collect();

    let indices: Vec<u32> = (0..6u32)
        .flat_map(|face| {
            let base = face * 4;
            [base, base + 1, base + 2, base, base + 2, base + 3]
        })
        .collect();

    Mesh { vertices, indices }
}

/// UV sphere. The pole rows produce single triangles per segment.
pub fn create_sphere_mesh(radius: f32, width_segments: u32, height_segments: u32) -> Mesh {
    let ws = width_segments.max(3);
    let hs = height_segments.max(2);

    let mut vertices = Vec::with_capacity(((ws + 1) * (hs + 1)) as usize);
    for iy in 0..=hs {
        let v = iy as f32 / hs as f32;
        let theta = v * PI;
        for ix in 0..=ws {
            let u = ix as f32 / ws as f32;
            let phi = u * TAU;
            let normal = [-phi.cos() * theta.sin(), theta.cos(), phi.sin() * theta.sin()];
            vertices.push(Vertex {
                position: scale(normal, radius),
                normal,
                uv: [u, 1.0 - v],
            });
        }
    }

    let row = ws + 1;
    let mut indices = Vec::new();
    for iy in 0..hs {
        for ix in 0..ws {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != hs - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    Mesh { vertices, indices }
}

/// Capsule along Y: a cylinder of `length` capped by two hemispheres
pub fn create_capsule_mesh(radius: f32, length: f32, cap_segments: u32, radial_segments: u32) -> Mesh {
    let caps = cap_segments.max(1);
    let radial = radial_segments.max(3);
    let half = length / 2.0;

    // Profile rings from the top pole down to the bottom pole
    let mut rings: Vec<(f32, f32, f32)> = Vec::new(); // (y, ring radius, polar angle)
    for i in 0..=caps {
        let a = FRAC_PI_2 * i as f32 / caps as f32;
        rings.push((half + radius * a.cos(), radius * a.sin(), a));
    }
    for i in 0..=caps {
        let a = FRAC_PI_2 + FRAC_PI_2 * i as f32 / caps as f32;
        rings.push((-half + radius * a.cos(), radius * a.sin(), a));
    }

    let ring_count = rings.len() as u32;
    let mut vertices = Vec::with_capacity((ring_count * (radial + 1)) as usize);
    for (r, &(y, ring_radius, polar)) in rings.iter().enumerate() {
        let v = 1.0 - r as f32 / (ring_count - 1) as f32;
        for j in 0..=radial {
            let u = j as f32 / radial as f32;
            let t = u * TAU;
            let (s, c) = t.sin_cos();
            vertices.push(Vertex {
                position: [ring_radius * s, y, ring_radius * c],
                normal: [polar.sin() * s, polar.cos(), polar.sin() * c],
                uv: [u, v],
            });
        }
    }

    let row = radial + 1;
    let mut indices = Vec::new();
    for r in 0..ring_count - 1 {
        for j in 0..radial {
            let a = r * row + j;
            let b = (r + 1) * row + j;
            let c = (r + 1) * row + j + 1;
            let d = r * row + j + 1;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    Mesh { vertices, indices }
}

/// (p, q) torus knot swept with a circular tube
pub fn create_torus_knot_mesh(
    radius: f32,
    tube: f32,
    tubular_segments: u32,
    radial_segments: u32,
    p: u32,
    q: u32,
) -> Mesh {
    let tubular = tubular_segments.max(3);
    let radial = radial_segments.max(3);
    let (pf, qf) = (p.max(1) as f32, q as f32);

    let curve = |u: f32| -> [f32; 3] {
        let qu_over_p = qf / pf * u;
        let cs = qu_over_p.cos();
        [
            radius * (2.0 + cs) * 0.5 * u.cos(),
            radius * (2.0 + cs) * 0.5 * u.sin(),
            radius * qu_over_p.sin() * 0.5,
        ]
    };

    let mut vertices = Vec::with_capacity(((tubular + 1) * (radial + 1)) as usize);
    for i in 0..=tubular {
        let u = i as f32 / tubular as f32 * pf * TAU;
        let p1 = curve(u);
        let p2 = curve(u + 0.01);

        let t = sub(p2, p1);
        let n = add(p2, p1);
        let b = normalize(cross(t, n));
        let n = normalize(cross(b, t));

        for j in 0..=radial {
            let v = j as f32 / radial as f32 * TAU;
            let cx = -tube * v.cos();
            let cy = tube * v.sin();
            let position = add(p1, add(scale(n, cx), scale(b, cy)));
            vertices.push(Vertex {
                position,
                normal: normalize(sub(position, p1)),
                uv: [i as f32 / tubular as f32, j as f32 / radial as f32],
            });
        }
    }

    let row = radial + 1;
    let mut indices = Vec::new();
    for j in 1..=tubular {
        for i in 1..=radial {
            let a = row * (j - 1) + (i - 1);
            let b = row * j + (i - 1);
            let c = row * j + i;
            let d = row * (j - 1) + i;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    Mesh { vertices, indices }
}

fn add(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn scale(a: [f32; 3], s: f32) -> [f32; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(a: [f32; 3]) -> [f32; 3] {
    let len = (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt();
    if len < 1e-8 {
        return [0.0, 0.0, 0.0];
    }
    scale(a, 1.0 / len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn length(a: [f32; 3]) -> f32 {
        (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt()
    }

    fn indices_in_range(mesh: &Mesh) -> bool {
        mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len())
    }

    #[test]
    fn test_box() {
        let mesh = create_box_mesh(1.0, 1.0, 1.0);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh
            .vertices
            .iter()
            .all(|v| v.position.iter().all(|c| c.abs() == 0.5)));
    }

    #[test]
    fn test_box_winding_faces_outward() {
        let mesh = create_box_mesh(2.0, 2.0, 2.0);
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.vertices[i as usize]);
            let face = cross(sub(b.position, a.position), sub(c.position, a.position));
            let dot: f32 = (0..3).map(|k| face[k] * a.normal[k]).sum();
            assert!(dot > 0.0);
        }
    }

    #[test]
    fn test_sphere() {
        let mesh = create_sphere_mesh(0.7, 64, 64);
        assert_eq!(mesh.vertex_count(), 65 * 65);
        assert_eq!(mesh.triangle_count(), 64 * (2 * 64 - 2));
        assert!(indices_in_range(&mesh));
        assert!(mesh
            .vertices
            .iter()
            .all(|v| (length(v.position) - 0.7).abs() < 1e-4));
    }

    #[test]
    fn test_capsule_extent() {
        let mesh = create_capsule_mesh(0.5, 1.0, 4, 8);
        assert_eq!(mesh.vertex_count(), 10 * 9);
        assert_eq!(mesh.triangle_count(), 9 * 8 * 2);
        assert!(indices_in_range(&mesh));

        let max_y = mesh.vertices.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        let min_y = mesh.vertices.iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
        assert!((max_y - 1.0).abs() < 1e-5);
        assert!((min_y + 1.0).abs() < 1e-5);

        let max_r = mesh
            .vertices
            .iter()
            .map(|v| (v.position[0].powi(2) + v.position[2].powi(2)).sqrt())
            .fold(0.0, f32::max);
        assert!((max_r - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_torus_knot() {
        let mesh = create_torus_knot_mesh(0.5, 0.2, 100, 16, 2, 3);
        assert_eq!(mesh.vertex_count(), 101 * 17);
        assert_eq!(mesh.triangle_count(), 100 * 16 * 2);
        assert!(indices_in_range(&mesh));
        assert!(mesh
            .vertices
            .iter()
            .all(|v| (length(v.normal) - 1.0).abs() < 1e-3));
    }
}
