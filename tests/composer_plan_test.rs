use vitrine::post::{PassDesc, plan_passes};
use vitrine::stage::RenderParams;

#[test]
fn passes_run_scene_then_bloom_then_tonemap() {
    let plan = plan_passes(&RenderParams::default());
    let labels: Vec<_> = plan.iter().map(PassDesc::label).collect();
    assert_eq!(labels, vec!["scene", "bloom", "tonemap"]);
}

#[test]
fn plan_is_stable_for_identical_params() {
    let params = RenderParams {
        exposure: 1.0,
        bloom_strength: 1.5,
        bloom_threshold: 0.0,
        bloom_radius: 0.0,
    };
    let first = plan_passes(&params);
    for _ in 0..10 {
        assert_eq!(plan_passes(&params), first);
    }
}

#[test]
fn plan_carries_the_configured_parameters() {
    let params = RenderParams {
        exposure: 0.8,
        bloom_strength: 2.0,
        bloom_threshold: 0.4,
        bloom_radius: 1.0,
    };
    let plan = plan_passes(&params);
    assert_eq!(plan[0], PassDesc::Scene);
    assert_eq!(
        plan[1],
        PassDesc::Bloom {
            threshold: 0.4,
            strength: 2.0,
            radius: 1.0,
        }
    );
    assert_eq!(plan[2], PassDesc::Tonemap { exposure: 0.8 });
}
