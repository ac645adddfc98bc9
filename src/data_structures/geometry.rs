//! Shape descriptors and their tessellation into triangle meshes.
//!
//! A [`Geometry`] only describes a shape. The renderer calls
//! [`Geometry::tessellate`] once per mesh node and uploads the resulting
//! [`MeshData`]. All generated triangles wind counter-clockwise when seen from
//! outside, which is what the pipelines cull against.

use std::{borrow::Cow, f32::consts::PI, sync::Arc};

use cgmath::{InnerSpace, Vector3};

/// CPU-side triangle mesh: one entry per vertex in each attribute vector.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /**
     * Appends a quad spanned by the half-extents `u` and `v` around `center`.
     *
     * `u × v` must point along `normal` for the two triangles to face outwards.
     * Texture coordinates use wgpu's top-left origin.
     */
    fn push_quad(&mut self, center: Vector3<f32>, u: Vector3<f32>, v: Vector3<f32>, normal: [f32; 3]) {
        let base = self.positions.len() as u32;
        let corners = [
            (center - u - v, [0.0, 1.0]),
            (center + u - v, [1.0, 1.0]),
            (center + u + v, [1.0, 0.0]),
            (center - u + v, [0.0, 0.0]),
        ];
        for (position, uv) in corners {
            self.positions.push(position.into());
            self.normals.push(normal);
            self.uvs.push(uv);
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Shape of a mesh node. Built-in primitives are centred on the origin.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    /// A rectangle in the XY plane facing +Z.
    Plane { width: f32, height: f32 },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    /// Triangles that came from an external model file.
    Custom(Arc<MeshData>),
}

impl Geometry {
    pub fn cube(size: f32) -> Self {
        Geometry::Box {
            width: size,
            height: size,
            depth: size,
        }
    }

    pub fn tessellate(&self) -> Cow<'_, MeshData> {
        match self {
            Geometry::Box {
                width,
                height,
                depth,
            } => Cow::Owned(box_mesh(*width, *height, *depth)),
            Geometry::Plane { width, height } => Cow::Owned(plane_mesh(*width, *height)),
            Geometry::Sphere {
                radius,
                width_segments,
                height_segments,
            } => Cow::Owned(sphere_mesh(*radius, *width_segments, *height_segments)),
            Geometry::Custom(data) => Cow::Borrowed(data.as_ref()),
        }
    }
}

fn box_mesh(width: f32, height: f32, depth: f32) -> MeshData {
    let (hw, hh, hd) = (width * 0.5, height * 0.5, depth * 0.5);
    let mut data = MeshData::default();
    // (face centre, u, v, normal)
    let faces = [
        (Vector3::new(hw, 0.0, 0.0), Vector3::new(0.0, 0.0, -hd), Vector3::new(0.0, hh, 0.0), [1.0, 0.0, 0.0]),
        (Vector3::new(-hw, 0.0, 0.0), Vector3::new(0.0, 0.0, hd), Vector3::new(0.0, hh, 0.0), [-1.0, 0.0, 0.0]),
        (Vector3::new(0.0, hh, 0.0), Vector3::new(hw, 0.0, 0.0), Vector3::new(0.0, 0.0, -hd), [0.0, 1.0, 0.0]),
        (Vector3::new(0.0, -hh, 0.0), Vector3::new(hw, 0.0, 0.0), Vector3::new(0.0, 0.0, hd), [0.0, -1.0, 0.0]),
        (Vector3::new(0.0, 0.0, hd), Vector3::new(hw, 0.0, 0.0), Vector3::new(0.0, hh, 0.0), [0.0, 0.0, 1.0]),
        (Vector3::new(0.0, 0.0, -hd), Vector3::new(-hw, 0.0, 0.0), Vector3::new(0.0, hh, 0.0), [0.0, 0.0, -1.0]),
    ];
    for (center, u, v, normal) in faces {
        data.push_quad(center, u, v, normal);
    }
    data
}

fn plane_mesh(width: f32, height: f32) -> MeshData {
    let mut data = MeshData::default();
    data.push_quad(
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(width * 0.5, 0.0, 0.0),
        Vector3::new(0.0, height * 0.5, 0.0),
        [0.0, 0.0, 1.0],
    );
    data
}

/**
 * UV sphere laid out as a `(width_segments + 1) x (height_segments + 1)` grid.
 *
 * The first and last rows collapse onto the poles, so the triangle next to a
 * pole is emitted once per cell instead of twice.
 */
fn sphere_mesh(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let mut data = MeshData::default();

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let direction = Vector3::new(
                -(u * 2.0 * PI).cos() * (v * PI).sin(),
                (v * PI).cos(),
                (u * 2.0 * PI).sin() * (v * PI).sin(),
            );
            data.positions.push((direction * radius).into());
            let normal = if direction.magnitude2() > 0.0 {
                direction.normalize()
            } else {
                direction
            };
            data.normals.push(normal.into());
            data.uvs.push([u, v]);
        }
    }

    let row = width_segments + 1;
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            if iy != 0 {
                data.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                data.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    data
}
