use cgmath::{Quaternion, Rad, Rotation3, Vector3};
use vitrine::data_structures::scene_graph::SceneNode;
use vitrine::data_structures::transform::Transform;
use vitrine::resources::LoadedAsset;
use vitrine::resources::animation::NodeAnimation;
use vitrine::stage::{AssetFormat, AssetSpec, Stage};

fn group_asset(name: &str) -> LoadedAsset {
    LoadedAsset {
        node: SceneNode::group(name),
        animations: Vec::new(),
    }
}

#[test]
fn spin_angle_grows_by_exactly_the_delta() {
    let mut stage = Stage::new();
    let mut spec = AssetSpec::new("wheel.obj", AssetFormat::Obj);
    spec.spin = true;
    stage.attach(&spec, group_asset("wheel"));

    stage.advance(0.016);
    assert!((stage.spin_angle() - 0.016).abs() < 1e-6);

    stage.advance(1.0);
    assert!((stage.spin_angle() - 1.016).abs() < 1e-6);
}

#[test]
fn spin_is_applied_to_the_node_rotation() {
    let mut stage = Stage::new();
    let mut spec = AssetSpec::new("wheel.obj", AssetFormat::Obj);
    spec.spin = true;
    stage.attach(&spec, group_asset("wheel"));

    stage.advance(0.5);

    let node = stage.root.find("wheel").unwrap();
    let expected = Quaternion::from_angle_y(Rad(0.5f32));
    let got = node.local.rotation;
    assert!((got.s - expected.s).abs() < 1e-5);
    assert!((got.v.y - expected.v.y).abs() < 1e-5);
}

#[test]
fn attach_applies_scale_and_position_offset() {
    let mut stage = Stage::new();
    let mut spec = AssetSpec::new("scene.glb", AssetFormat::Gltf);
    spec.scale = 0.01;
    spec.position = Vector3::new(0.0, -1.0, 0.0);
    stage.attach(&spec, group_asset("scene"));

    let node = stage.root.find("scene").unwrap();
    assert!((node.local.scale.x - 0.01).abs() < 1e-6);
    assert!((node.local.position.y + 1.0).abs() < 1e-6);
}

#[test]
fn nodes_are_found_by_name_at_any_depth() {
    let mut inner = SceneNode::group("inner");
    inner.add_child(SceneNode::group("leaf"));
    let mut outer = SceneNode::group("outer");
    outer.add_child(SceneNode::group("sibling"));
    outer.add_child(inner);

    assert!(outer.find("leaf").is_some());
    assert!(outer.find("sibling").is_some());
    assert!(outer.find("missing").is_none());
    assert_eq!(outer.node_count(), 4);
}

#[test]
fn mixer_advances_tracks_proportionally_to_the_delta() {
    let mut asset = group_asset("rig");
    asset.node.add_child(SceneNode::group("bone"));
    let transforms = (0..3)
        .map(|i| Transform {
            position: Vector3::new(i as f32, 0.0, 0.0),
            ..Default::default()
        })
        .collect();
    asset.animations.push(NodeAnimation {
        name: "Default".to_string(),
        target: "bone".to_string(),
        timestamps: vec![0.0, 1.0, 2.0],
        transforms,
    });

    let mut stage = Stage::new();
    let mut spec = AssetSpec::new("rig.glb", AssetFormat::Gltf);
    spec.animate = true;
    stage.attach(&spec, asset);

    stage.advance(0.5);
    let x = stage.root.find("bone").unwrap().local.position.x;
    assert!((x - 0.5).abs() < 1e-5, "expected 0.5, got {x}");

    stage.advance(1.0);
    let x = stage.root.find("bone").unwrap().local.position.x;
    assert!((x - 1.5).abs() < 1e-5, "expected 1.5, got {x}");
}

#[test]
fn world_transforms_compose_parent_to_child() {
    let mut child = SceneNode::group("child");
    child.local.position = Vector3::new(1.0, 0.0, 0.0);
    let mut parent = SceneNode::group("parent");
    parent.local.scale = Vector3::new(2.0, 2.0, 2.0);
    parent.add_child(child);

    parent.update_world_transforms(&Transform::default());

    // the parent's scale applies to the child's offset
    let world = parent.find("child").unwrap().world();
    assert!((world.position.x - 2.0).abs() < 1e-6);
    assert!((world.scale.x - 2.0).abs() < 1e-6);
}
