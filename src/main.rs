use aquarium::{flow, world::SceneConfig};

fn main() -> anyhow::Result<()> {
    flow::run(SceneConfig::from_env())
}
