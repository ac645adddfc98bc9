//! Light descriptors. A light is placed by the world transform of the node
//! that carries it.

use cgmath::Vector3;

use crate::data_structures::material::Color;

#[derive(Clone, Debug, PartialEq)]
pub enum Light {
    /// Parallel rays shining from the node's position towards `target`.
    Directional {
        color: Color,
        intensity: f32,
        target: Vector3<f32>,
    },
    /// Flat fill applied to every lit surface.
    Ambient { color: Color, intensity: f32 },
    /// Two-tone fill blended by how much a surface faces up.
    Hemisphere {
        sky: Color,
        ground: Color,
        intensity: f32,
    },
    /// `distance == 0.0` means no cut-off.
    Point {
        color: Color,
        intensity: f32,
        distance: f32,
        decay: f32,
    },
}

impl Light {
    pub fn directional(color: Color, intensity: f32) -> Self {
        Light::Directional {
            color,
            intensity,
            target: Vector3::new(0.0, 0.0, 0.0),
        }
    }

    pub fn ambient(color: Color, intensity: f32) -> Self {
        Light::Ambient { color, intensity }
    }

    pub fn hemisphere(sky: Color, ground: Color, intensity: f32) -> Self {
        Light::Hemisphere {
            sky,
            ground,
            intensity,
        }
    }

    pub fn point(color: Color, intensity: f32, distance: f32) -> Self {
        Light::Point {
            color,
            intensity,
            distance,
            decay: 2.0,
        }
    }
}
