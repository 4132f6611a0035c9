//! The parlor: a room and a wheel loading in parallel, the wheel spun at
//! one radian per second. The loop starts right after setup; whichever
//! model finishes first simply appears first.

use vitrine::host;
use vitrine::stage::{AssetFormat, AssetSpec, MaterialOverride, StageConfig, StartPolicy};

fn main() -> anyhow::Result<()> {
    let mut room = AssetSpec::new("models/room.obj", AssetFormat::Obj);
    room.material_override = Some(MaterialOverride {
        node: "Floor".to_string(),
        texture: "models/room/Mramor_diffuse.png".to_string(),
    });

    let mut wheel = AssetSpec::new("models/roulette.obj", AssetFormat::Obj);
    wheel.spin = true;

    let config = StageConfig {
        start: StartPolicy::Immediate,
        assets: vec![room, wheel],
        ..Default::default()
    };

    host::run(config)
}
