//! Completion-event behavior with fake asset loaders: failures leave the
//! scene live, and racing completions attach in whatever order they arrive.

use anyhow::anyhow;
use instant::Duration;
use vitrine::data_structures::scene_graph::SceneNode;
use vitrine::host::RenderLoop;
use vitrine::resources::LoadedAsset;
use vitrine::stage::{AssetFormat, AssetSpec, Stage, StartPolicy};

async fn fake_load(name: &str, delay: Duration) -> anyhow::Result<LoadedAsset> {
    tokio::time::sleep(delay).await;
    Ok(LoadedAsset {
        node: SceneNode::group(name),
        animations: Vec::new(),
    })
}

async fn fake_failing_load(delay: Duration) -> anyhow::Result<LoadedAsset> {
    tokio::time::sleep(delay).await;
    Err(anyhow!("no such file"))
}

/// What the host does with one completion event.
fn on_completion(stage: &mut Stage, spec: &AssetSpec, result: anyhow::Result<LoadedAsset>) {
    match result {
        Ok(asset) => stage.attach(spec, asset),
        Err(e) => log::error!("failed to load {}: {:?}", spec.path, e),
    }
}

#[tokio::test]
async fn failed_load_leaves_stage_live_and_loop_startable() {
    let mut stage = Stage::new();
    let nodes_before = stage.node_count();
    let mut render_loop = RenderLoop::new(StartPolicy::GateOnPrimary);

    let mut spec = AssetSpec::new("models/missing.glb", AssetFormat::Gltf);
    spec.primary = true;

    let result = fake_failing_load(Duration::from_millis(5)).await;
    on_completion(&mut stage, &spec, result);

    // the completion event still opens the gate, so the scene runs degraded
    // instead of staying dark forever
    assert!(render_loop.on_primary_asset());
    assert!(render_loop.is_running());
    assert_eq!(stage.node_count(), nodes_before);
}

#[tokio::test]
async fn completions_attach_regardless_of_arrival_order() {
    let mut stage = Stage::new();
    let specs = vec![
        AssetSpec::new("models/room.obj", AssetFormat::Obj),
        AssetSpec::new("models/wheel.obj", AssetFormat::Obj),
    ];

    // the first-requested asset finishes last
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let slow = tx.clone();
    tokio::spawn(async move {
        let result = fake_load("room", Duration::from_millis(50)).await;
        slow.send((0usize, result)).unwrap();
    });
    tokio::spawn(async move {
        let result = fake_load("wheel", Duration::from_millis(5)).await;
        tx.send((1usize, result)).unwrap();
    });

    let mut arrival = Vec::new();
    for _ in 0..2 {
        let (index, result) = rx.recv().await.unwrap();
        arrival.push(index);
        on_completion(&mut stage, &specs[index], result);
    }

    assert_eq!(arrival, vec![1, 0], "completions should have raced");
    assert!(stage.root.find("room").is_some());
    assert!(stage.root.find("wheel").is_some());
}

#[tokio::test]
async fn one_failure_does_not_block_the_other_asset() {
    let mut stage = Stage::new();
    let specs = vec![
        AssetSpec::new("models/room.obj", AssetFormat::Obj),
        AssetSpec::new("models/wheel.obj", AssetFormat::Obj),
    ];

    on_completion(
        &mut stage,
        &specs[0],
        fake_failing_load(Duration::from_millis(1)).await,
    );
    on_completion(
        &mut stage,
        &specs[1],
        fake_load("wheel", Duration::from_millis(1)).await,
    );

    assert!(stage.root.find("room").is_none());
    assert!(stage.root.find("wheel").is_some());
}
