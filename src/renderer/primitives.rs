use super::vertex::{v, Vertex};
use glam::Vec3;

/// Appends a unit quad centred on `normal * offset`, wound counter-clockwise
/// when seen from the side `normal` points to.
fn push_face(
    vertices: &mut Vec<Vertex>,
    indices: &mut Vec<u32>,
    normal: Vec3,
    tangent: Vec3,
    bitangent: Vec3,
    offset: f32,
    half_extent: f32,
) {
    let base = vertices.len() as u32;
    let center = normal * offset;
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
    for (s, t) in corners {
        let pos = center + tangent * (s * half_extent) + bitangent * (t * half_extent);
        let uv = [(s + 1.0) * 0.5, 1.0 - (t + 1.0) * 0.5];
        vertices.push(v(pos.to_array(), normal.to_array(), uv));
    }
    indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
}

/// Unit cube centred on the origin with outward-facing CCW triangles.
pub fn cube_mesh() -> (Vec<Vertex>, Vec<u32>) {
    // (normal, tangent, bitangent) with tangent x bitangent == normal
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, tangent, bitangent) in faces {
        push_face(&mut vertices, &mut indices, normal, tangent, bitangent, 0.5, 0.5);
    }
    (vertices, indices)
}

/// Square in the XZ plane facing +Y, `size` units on a side.
pub fn plane_mesh(size: f32) -> (Vec<Vertex>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(4);
    let mut indices = Vec::with_capacity(6);
    push_face(
        &mut vertices,
        &mut indices,
        Vec3::Y,
        Vec3::X,
        Vec3::NEG_Z,
        0.0,
        size * 0.5,
    );
    (vertices, indices)
}
