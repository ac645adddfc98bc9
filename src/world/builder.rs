//! Assembly of the aquarium scene from a [`SceneConfig`].
//!
//! Every step is infallible. Asset requests return placeholders right away
//! and are filled in by the [`AssetLoader`] later; a failed load leaves its
//! placeholder untextured or empty.

use std::f32::consts::FRAC_PI_2;

use cgmath::{Deg, Point3};
use rand::Rng;

use crate::{
    animation::Animated,
    camera::{Camera, Projection},
    data_structures::{
        geometry::Geometry,
        instance::Transform,
        light::Light,
        material::{Color, Material, Side},
        scene_graph::{Background, Node, NodeId, Scene},
        texture_store::{ColorSpace, Filter, Mapping, Wrapping},
    },
    resources::AssetLoader,
    world::{
        World,
        config::{BubbleConfig, SceneConfig, Skybox},
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BubbleVariant {
    Translucent,
    Globe,
}

/// One randomly drawn bubble, before it becomes a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bubble {
    pub variant: BubbleVariant,
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    /// Tank-local position.
    pub position: [f32; 3],
}

impl Bubble {
    /**
     * Draws a bubble. The order of draws is fixed: variant, radius, detail,
     * then x, y and z, so a seeded generator always yields the same bubbles.
     */
    pub fn draw<R: Rng>(config: &BubbleConfig, rng: &mut R) -> Self {
        let variant = if unit(rng) < config.translucent_probability {
            BubbleVariant::Translucent
        } else {
            BubbleVariant::Globe
        };
        let radius = config.min_radius + unit(rng) * config.radius_range;
        let detail = unit(rng);
        let mut position = [0.0; 3];
        for (axis, value) in position.iter_mut().enumerate() {
            *value = config.min[axis] + unit(rng) * (config.max[axis] - config.min[axis]);
        }
        Self {
            variant,
            radius,
            width_segments: 6 + (detail * 10.0) as u32,
            height_segments: 4 + (detail * 8.0) as u32,
            position,
        }
    }
}

fn unit<R: Rng>(rng: &mut R) -> f32 {
    rng.gen_range(0.0..1.0)
}

pub struct SceneBuilder<'a> {
    config: &'a SceneConfig,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(config: &'a SceneConfig) -> Self {
        Self { config }
    }

    pub fn build<R: Rng>(&self, rng: &mut R, loader: &mut AssetLoader) -> World {
        let mut scene = Scene::new();
        self.add_ground(&mut scene, loader);
        self.add_skybox(&mut scene, loader);
        let tank = self.add_tank(&mut scene, loader);
        let cubes = self.add_cubes(&mut scene);
        let fish = self.add_fish(&mut scene, loader, tank);
        let spheres = self.add_decorations(&mut scene, loader, rng, tank);
        self.add_lights(&mut scene);
        scene.update_world_transforms();

        log::info!(
            "Scene built with {} nodes, {} textures requested, {} loads in flight",
            scene.node_count(),
            scene.textures.len(),
            loader.in_flight()
        );

        World {
            scene,
            camera: self.camera(),
            animated: Animated {
                cubes,
                spheres,
                fish,
            },
        }
    }

    pub fn camera(&self) -> Camera {
        let c = &self.config.camera;
        Camera::new(
            Point3::from(c.position),
            Point3::from(c.target),
            Projection::with_aspect(c.aspect, Deg(c.fov_degrees), c.near, c.far),
        )
    }

    /// A flat checkered floor. The texture is configured right after the
    /// request; the settings apply once the image arrives.
    pub fn add_ground(&self, scene: &mut Scene, loader: &mut AssetLoader) -> NodeId {
        let size = self.config.ground_size;
        let texture = loader.load_texture(&mut scene.textures, &self.config.ground_texture);
        scene.textures.configure(texture, |config| {
            config.wrap_s = Wrapping::Repeat;
            config.wrap_t = Wrapping::Repeat;
            config.mag_filter = Filter::Nearest;
            config.color_space = ColorSpace::Srgb;
            config.repeat = [size / 2.0, size / 2.0];
        });
        let material = Material::phong(Color::WHITE)
            .with_map(texture)
            .with_side(Side::Double);
        scene.add(
            Node::mesh(
                "ground",
                Geometry::Plane {
                    width: size,
                    height: size,
                },
                material,
            )
            .with_transform(Transform::new().with_rotation(-FRAC_PI_2, 0.0, 0.0)),
        )
    }

    pub fn add_skybox(&self, scene: &mut Scene, loader: &mut AssetLoader) {
        scene.background = match &self.config.skybox {
            Skybox::Color(hex) => Background::Color(Color::from_hex(*hex)),
            Skybox::Texture(path) => {
                let texture = loader.load_texture(&mut scene.textures, path);
                loader.on_texture_load(&mut scene.textures, texture, |config| {
                    config.color_space = ColorSpace::Srgb;
                });
                Background::Texture(texture)
            }
            Skybox::CubeMap(faces) => {
                let faces: [&str; 6] = std::array::from_fn(|idx| faces[idx].as_str());
                let texture = loader.load_cube_texture(&mut scene.textures, faces);
                loader.on_texture_load(&mut scene.textures, texture, |config| {
                    config.color_space = ColorSpace::Srgb;
                    config.mapping = Mapping::CubeReflection;
                });
                Background::CubeMap(texture)
            }
        };
    }

    /**
     * The glass tank: water volume, a slightly larger glass shell, textured
     * back panel, lid, sand floor and a point light. All parts hang off one
     * group so the tank moves as a unit.
     */
    pub fn add_tank(&self, scene: &mut Scene, loader: &mut AssetLoader) -> NodeId {
        let tank = &self.config.tank;
        let [w, h, d] = tank.size;
        let wall = tank.wall;
        let [x, y, z] = tank.position;
        let group = scene.add(Node::group("tank").with_transform(Transform::at(x, y, z)));

        let water = Material::phong(Color::from_hex(tank.water_color)).with_opacity(tank.water_opacity);
        scene.add_child(
            group,
            Node::mesh(
                "water",
                Geometry::Box {
                    width: w,
                    height: h,
                    depth: d,
                },
                water,
            ),
        );

        let glass = Material::phong(Color::from_hex(tank.glass_color))
            .with_opacity(tank.glass_opacity)
            .with_shininess(Color::WHITE, 100.0)
            .with_side(Side::Double);
        scene.add_child(
            group,
            Node::mesh(
                "glass",
                Geometry::Box {
                    width: w + 2.0 * wall,
                    height: h + 2.0 * wall,
                    depth: d + 2.0 * wall,
                },
                glass,
            ),
        );

        let back = loader.load_texture(&mut scene.textures, &tank.back_texture);
        scene
            .textures
            .configure(back, |config| config.color_space = ColorSpace::Srgb);
        scene.add_child(
            group,
            Node::mesh(
                "back panel",
                Geometry::Box {
                    width: w + 2.0 * wall,
                    height: h + 2.0 * wall,
                    depth: wall / 2.0,
                },
                Material::phong(Color::WHITE).with_map(back),
            )
            .with_transform(Transform::at(0.0, 0.0, -(d / 2.0 + wall * 1.25))),
        );

        scene.add_child(
            group,
            Node::mesh(
                "top panel",
                Geometry::Box {
                    width: w + 2.0 * wall,
                    height: wall / 2.0,
                    depth: d + 2.0 * wall,
                },
                Material::phong(Color::from_hex(0x333333)),
            )
            .with_transform(Transform::at(0.0, h / 2.0 + wall * 1.25, 0.0)),
        );

        let sand = loader.load_texture(&mut scene.textures, &tank.sand_texture);
        scene.textures.configure(sand, |config| {
            config.wrap_s = Wrapping::Repeat;
            config.wrap_t = Wrapping::Repeat;
            config.color_space = ColorSpace::Srgb;
            config.repeat = [w / 2.5, d / 2.0];
        });
        scene.add_child(
            group,
            Node::mesh(
                "sand",
                Geometry::Box {
                    width: w,
                    height: wall * 1.5,
                    depth: d,
                },
                Material::phong(Color::WHITE).with_map(sand),
            )
            .with_transform(Transform::at(0.0, -h / 2.0 + wall * 0.75, 0.0)),
        );

        scene.add_child(
            group,
            Node::light(
                "tank light",
                Light::point(
                    Color::from_hex(tank.light_color),
                    tank.light_intensity,
                    tank.light_distance,
                ),
            )
            .with_transform(Transform::at(0.0, h / 2.0 - 0.5, 0.0)),
        );

        group
    }

    /// Three unit cubes in a row, returned in creation order.
    pub fn add_cubes(&self, scene: &mut Scene) -> Vec<NodeId> {
        let [_, y, z] = self.config.cube_row;
        self.config
            .cube_colors
            .iter()
            .zip(self.config.cube_offsets)
            .enumerate()
            .map(|(idx, (color, x))| {
                scene.add(
                    Node::mesh(
                        format!("cube {idx}"),
                        Geometry::cube(1.0),
                        Material::phong(Color::from_hex(*color)),
                    )
                    .with_transform(Transform::at(x, y, z)),
                )
            })
            .collect()
    }

    /**
     * One posed group per fish, tracked before its model exists. The model
     * load fills a child group of it once the MTL and OBJ are parsed.
     */
    pub fn add_fish(&self, scene: &mut Scene, loader: &mut AssetLoader, tank: NodeId) -> Vec<NodeId> {
        let fish = &self.config.fish;
        let s = fish.scale;
        fish.depths
            .iter()
            .enumerate()
            .map(|(idx, z)| {
                let group = scene.add_child(
                    tank,
                    Node::group(format!("fish {idx}"))
                        .with_transform(Transform::at(0.0, 1.0, *z).with_scale(s, s, s)),
                );
                loader.load_model(scene, group, &fish.mtl, &fish.obj);
                group
            })
            .collect()
    }

    /// The globe first, then every bubble in draw order.
    pub fn add_decorations<R: Rng>(
        &self,
        scene: &mut Scene,
        loader: &mut AssetLoader,
        rng: &mut R,
        tank: NodeId,
    ) -> Vec<NodeId> {
        let globe_texture = loader.load_texture(&mut scene.textures, &self.config.globe_texture);
        scene
            .textures
            .configure(globe_texture, |config| config.color_space = ColorSpace::Srgb);

        let [x, y, z] = self.config.globe_position;
        let globe = scene.add(
            Node::mesh(
                "globe",
                Geometry::Sphere {
                    radius: self.config.globe_radius,
                    width_segments: 32,
                    height_segments: 16,
                },
                Material::phong(Color::WHITE).with_map(globe_texture),
            )
            .with_transform(Transform::at(x, y, z)),
        );

        let bubbles = &self.config.bubbles;
        let mut spheres = Vec::with_capacity(bubbles.count + 1);
        spheres.push(globe);
        for idx in 0..bubbles.count {
            let bubble = Bubble::draw(bubbles, rng);
            let material = match bubble.variant {
                BubbleVariant::Translucent => Material::phong(Color::from_hex(bubbles.color))
                    .with_opacity(bubbles.opacity)
                    .with_shininess(Color::WHITE, 100.0),
                BubbleVariant::Globe => Material::phong(Color::WHITE).with_map(globe_texture),
            };
            let [x, y, z] = bubble.position;
            spheres.push(scene.add_child(
                tank,
                Node::mesh(
                    format!("bubble {idx}"),
                    Geometry::Sphere {
                        radius: bubble.radius,
                        width_segments: bubble.width_segments,
                        height_segments: bubble.height_segments,
                    },
                    material,
                )
                .with_transform(Transform::at(x, y, z)),
            ));
        }
        spheres
    }

    pub fn add_lights(&self, scene: &mut Scene) {
        scene.add(
            Node::light("sun", Light::directional(Color::WHITE, 3.0))
                .with_transform(Transform::at(-1.0, 2.0, 4.0)),
        );
        scene.add(Node::light(
            "ambient",
            Light::ambient(Color::WHITE, 0.4),
        ));
        if self.config.hemisphere_light {
            scene.add(Node::light(
                "sky",
                Light::hemisphere(Color::from_hex(0xb1e1ff), Color::from_hex(0xb97a20), 1.0),
            ));
        }
    }
}
