//! Perspective camera, orbit controls and the camera uniform.
//!
//! The [`Camera`] looks from `position` at `target`. [`CameraController`]
//! orbits it around the target from pointer drag and scroll input while
//! keeping the target fixed.

use std::f32::consts::FRAC_PI_2;

use cgmath::{InnerSpace, Matrix3, Matrix4, Point3, Rad, SquareMatrix, Vector3};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Keeps the orbit away from the poles where `look_at` degenerates.
const SAFE_FRAC_PI_2: f32 = FRAC_PI_2 - 0.0001;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self::with_aspect(width as f32 / height.max(1) as f32, fovy, znear, zfar)
    }

    pub fn with_aspect<F: Into<Rad<f32>>>(aspect: f32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// Follows the viewport. Zero sized surfaces (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub projection: Projection,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P, projection: Projection) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
            projection,
        }
    }

    pub fn calc_view(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn build_view_projection(&self) -> Matrix4<f32> {
        self.projection.calc_matrix() * self.calc_view()
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).magnitude()
    }
}

/**
 * The camera as seen by the shaders.
 *
 * `sky_inv` maps clip space back to world directions with the translation
 * stripped from the view, which is all the skybox needs.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
    pub sky_inv: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
            sky_inv: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = camera.build_view_projection().into();
        let view = camera.calc_view();
        let rotation = Matrix3::from_cols(view.x.truncate(), view.y.truncate(), view.z.truncate());
        let sky = camera.projection.calc_matrix() * Matrix4::from(rotation);
        self.sky_inv = sky.invert().unwrap_or_else(Matrix4::identity).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Orbit controls: left drag rotates around the target, the wheel zooms.
#[derive(Clone, Debug)]
pub struct CameraController {
    rotate_speed: f32,
    zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    dragging: bool,
    cursor: Option<(f64, f64)>,
    yaw_delta: f32,
    pitch_delta: f32,
    zoom_delta: f32,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            min_distance: 1.0,
            max_distance: 60.0,
            dragging: false,
            cursor: None,
            yaw_delta: 0.0,
            pitch_delta: 0.0,
            zoom_delta: 0.0,
        }
    }

    pub fn with_distance_range(mut self, min_distance: f32, max_distance: f32) -> Self {
        self.min_distance = min_distance;
        self.max_distance = max_distance.max(min_distance);
        self
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Returns `true` when the event was consumed by the controller.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = *state == ElementState::Pressed;
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some((x, y)) = self.cursor {
                    self.handle_mouse(position.x - x, position.y - y);
                }
                self.cursor = Some((position.x, position.y));
                self.dragging
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.handle_scroll(match delta {
                    MouseScrollDelta::LineDelta(_, lines) => *lines,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                });
                true
            }
            _ => false,
        }
    }

    /// Pointer motion in pixels. Only counts while the left button is held.
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        if self.dragging {
            self.yaw_delta -= dx as f32 * self.rotate_speed;
            self.pitch_delta += dy as f32 * self.rotate_speed;
        }
    }

    /// Positive values zoom in.
    pub fn handle_scroll(&mut self, amount: f32) {
        self.zoom_delta += amount * self.zoom_speed;
    }

    /// Applies the accumulated input to `camera` and clears it.
    pub fn update(&mut self, camera: &mut Camera) {
        let offset = camera.position - camera.target;
        let distance = offset.magnitude();
        if distance <= f32::EPSILON {
            self.reset();
            return;
        }
        let mut yaw = offset.x.atan2(offset.z);
        let mut pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();

        yaw += self.yaw_delta;
        pitch = (pitch + self.pitch_delta).clamp(-SAFE_FRAC_PI_2, SAFE_FRAC_PI_2);
        let distance = (distance * (1.0 - self.zoom_delta).max(0.1))
            .clamp(self.min_distance, self.max_distance);

        let direction = Vector3::new(
            yaw.sin() * pitch.cos(),
            pitch.sin(),
            yaw.cos() * pitch.cos(),
        );
        camera.position = camera.target + direction.normalize() * distance;
        self.reset();
    }

    fn reset(&mut self) {
        self.yaw_delta = 0.0;
        self.pitch_delta = 0.0;
        self.zoom_delta = 0.0;
    }
}

/// GPU side of the camera: the uniform, its buffer and bind group.
#[derive(Debug)]
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: &Camera) -> Self {
        use wgpu::util::DeviceExt;

        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(camera);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, camera: &Camera) {
        self.uniform.update_view_proj(camera);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
