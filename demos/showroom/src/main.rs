//! The glowing showroom: one animated glb, loop start gated on its load.

use vitrine::host;
use vitrine::stage::{AssetFormat, AssetSpec, StageConfig, StartPolicy};

fn main() -> anyhow::Result<()> {
    let mut scene = AssetSpec::new("models/scene.glb", AssetFormat::Gltf);
    scene.scale = 0.01;
    scene.position = (0.0, -1.0, 0.0).into();
    scene.animate = true;
    scene.primary = true;

    let config = StageConfig {
        start: StartPolicy::GateOnPrimary,
        assets: vec![scene],
        ..Default::default()
    };

    host::run(config)
}
