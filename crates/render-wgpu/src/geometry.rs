//! CPU-side vertex data: the unit cube, helper line sets and per-node instances.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use stagecraft_kernel::{NodeKind, Scene};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
    pub lighting: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct InstanceData {
    pub model_0: [f32; 4],
    pub model_1: [f32; 4],
    pub model_2: [f32; 4],
    pub model_3: [f32; 4],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

const MESH_COLOR: [f32; 4] = [0.2, 0.6, 1.0, 1.0];
const MORPH_COLOR: [f32; 4] = [1.0, 0.6, 0.2, 1.0];
const GRID_COLOR: [f32; 4] = [0.4, 0.4, 0.4, 1.0];
const AXIS_X: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
const AXIS_Y: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
const AXIS_Z: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

/// Unit cube centered on the origin.
pub(crate) fn cube_mesh() -> (Vec<Vertex>, Vec<u16>) {
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let base = vertices.len() as u16;
        let center = normal * 0.5;
        for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            let p = center + u * su + v * sv;
            vertices.push(Vertex {
                position: p.to_array(),
                normal: normal.to_array(),
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    (vertices, indices)
}

/// Square grid on the XZ plane spanning `-size..=size` with lines every `step`.
pub(crate) fn grid_lines(size: f32, step: f32, transform: Mat4) -> Vec<LineVertex> {
    if step <= 0.0 || size <= 0.0 || !step.is_finite() || !size.is_finite() {
        return Vec::new();
    }
    let count = (size / step).floor() as i32;
    let mut verts = Vec::with_capacity((count as usize * 2 + 1) * 4);
    for i in -count..=count {
        let offset = i as f32 * step;
        for (a, b) in [
            (Vec3::new(-size, 0.0, offset), Vec3::new(size, 0.0, offset)),
            (Vec3::new(offset, 0.0, -size), Vec3::new(offset, 0.0, size)),
        ] {
            verts.push(line_vertex(transform, a, GRID_COLOR));
            verts.push(line_vertex(transform, b, GRID_COLOR));
        }
    }
    verts
}

/// Three colored segments from the origin along +X, +Y and +Z.
pub(crate) fn axis_lines(size: f32, transform: Mat4) -> Vec<LineVertex> {
    [(Vec3::X, AXIS_X), (Vec3::Y, AXIS_Y), (Vec3::Z, AXIS_Z)]
        .into_iter()
        .flat_map(|(dir, color)| {
            [
                line_vertex(transform, Vec3::ZERO, color),
                line_vertex(transform, dir * size, color),
            ]
        })
        .collect()
}

fn line_vertex(transform: Mat4, p: Vec3, color: [f32; 4]) -> LineVertex {
    LineVertex {
        position: transform.transform_point3(p).to_array(),
        color,
    }
}

/// Line vertices for every helper node in the scene.
pub(crate) fn helper_lines(scene: &Scene) -> Vec<LineVertex> {
    let mut lines = Vec::new();
    for node in scene.graph().iter() {
        let t = &node.transform;
        let model = Mat4::from_scale_rotation_translation(t.scale, t.rotation, t.position);
        match node.kind {
            NodeKind::GridHelper { size, step } => lines.extend(grid_lines(size, step, model)),
            NodeKind::AxisHelper { size } => lines.extend(axis_lines(size, model)),
            _ => {}
        }
    }
    lines
}

/// One box instance per mesh or morph node, capped at `max`.
pub(crate) fn mesh_instances(scene: &Scene, max: usize) -> Vec<InstanceData> {
    scene
        .graph()
        .iter()
        .filter_map(|node| {
            let color = match node.kind {
                NodeKind::Mesh => MESH_COLOR,
                NodeKind::Morph => MORPH_COLOR,
                _ => return None,
            };
            let t = &node.transform;
            let cols = Mat4::from_scale_rotation_translation(t.scale, t.rotation, t.position)
                .to_cols_array_2d();
            Some(InstanceData {
                model_0: cols[0],
                model_1: cols[1],
                model_2: cols[2],
                model_3: cols[3],
                color,
            })
        })
        .take(max)
        .collect()
}
