//! Per-frame animation of the tracked scene objects.
//!
//! The pure update functions only touch the transforms of the handles they
//! are given. [`AnimationDriver`] wraps them into a frame: convert the
//! timestamp, animate, refresh world transforms, submit to a [`Presenter`],
//! re-arm.

use futures::{Stream, StreamExt};

use crate::{
    camera::Camera,
    data_structures::scene_graph::{NodeId, Scene},
    world::World,
};

/// Ordered handles of the objects the driver moves every frame.
///
/// Handles are weak: a stale one is skipped, never dereferenced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Animated {
    pub cubes: Vec<NodeId>,
    pub spheres: Vec<NodeId>,
    pub fish: Vec<NodeId>,
}

/// Anything that can draw a scene from a camera.
pub trait Presenter {
    fn render(&mut self, scene: &Scene, camera: &Camera) -> anyhow::Result<()>;
}

pub fn cube_angle(time: f32, index: usize) -> f32 {
    time * (1.0 + index as f32 * 0.1)
}

pub fn sphere_angle(time: f32, index: usize) -> f32 {
    time * (1.0 + index as f32 * 0.05)
}

/// (x, y) of the fish patrol path; z is left to the initial placement.
pub fn fish_offset(time: f32, index: usize) -> (f32, f32) {
    let angle = time * (1.0 + index as f32 * 0.1);
    (angle.sin() * 4.5, angle.cos())
}

pub fn rotate_cubes(scene: &mut Scene, cubes: &[NodeId], time: f32) {
    for (idx, id) in cubes.iter().enumerate() {
        if let Some(node) = scene.get_mut(*id) {
            let angle = cgmath::Rad(cube_angle(time, idx));
            node.local.rotation.x = angle;
            node.local.rotation.y = angle;
        }
    }
}

pub fn spin_spheres(scene: &mut Scene, spheres: &[NodeId], time: f32) {
    for (idx, id) in spheres.iter().enumerate() {
        if let Some(node) = scene.get_mut(*id) {
            node.local.rotation.y = cgmath::Rad(sphere_angle(time, idx));
        }
    }
}

pub fn swim_fish(scene: &mut Scene, fish: &[NodeId], time: f32) {
    for (idx, id) in fish.iter().enumerate() {
        if let Some(node) = scene.get_mut(*id) {
            let (x, y) = fish_offset(time, idx);
            node.local.position.x = x;
            node.local.position.y = y;
        }
    }
}

/// Applies all three updates for `time` in seconds.
pub fn animate(scene: &mut Scene, animated: &Animated, time: f32) {
    rotate_cubes(scene, &animated.cubes, time);
    spin_spheres(scene, &animated.spheres, time);
    swim_fish(scene, &animated.fish, time);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DriverState {
    /// Waiting for the next frame tick.
    #[default]
    Armed,
    /// Inside a frame body.
    Running,
}

#[derive(Debug, Default)]
pub struct AnimationDriver {
    state: DriverState,
    frames: u64,
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Number of frames run so far, including ones whose submission failed.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /**
     * Runs one frame for a host timestamp in milliseconds.
     *
     * The driver is `Running` while the body executes and always ends up
     * `Armed` again, also when the presenter fails. The presenter's error is
     * handed back to the caller.
     */
    pub fn frame<P: Presenter + ?Sized>(
        &mut self,
        world: &mut World,
        presenter: &mut P,
        timestamp_ms: f64,
    ) -> anyhow::Result<()> {
        self.state = DriverState::Running;
        let time = (timestamp_ms * 0.001) as f32;
        animate(&mut world.scene, &world.animated, time);
        world.scene.update_world_transforms();
        let submitted = presenter.render(&world.scene, &world.camera);
        self.frames += 1;
        self.state = DriverState::Armed;
        submitted
    }

    /// One frame per tick until the tick source ends. Render errors are
    /// logged and the loop carries on with the next tick.
    pub async fn drive<S, P>(&mut self, world: &mut World, presenter: &mut P, ticks: S)
    where
        S: Stream<Item = f64>,
        P: Presenter + ?Sized,
    {
        let mut ticks = std::pin::pin!(ticks);
        while let Some(timestamp_ms) = ticks.next().await {
            if let Err(e) = self.frame(world, presenter, timestamp_ms) {
                log::error!("Unable to render frame {}: {}", self.frames, e);
            }
        }
        log::info!("Tick source closed after {} frames", self.frames);
    }
}
