use vitrine::host::{LoopState, RenderLoop};
use vitrine::stage::StartPolicy;

#[test]
fn no_ticks_before_start() {
    let render_loop = RenderLoop::new(StartPolicy::Immediate);
    assert!(!render_loop.is_running());
    assert_eq!(render_loop.state(), LoopState::Uninitialized);
}

#[test]
fn immediate_policy_starts_after_setup() {
    let mut render_loop = RenderLoop::new(StartPolicy::Immediate);
    assert!(render_loop.on_setup_complete());
    assert!(render_loop.is_running());

    // a second setup signal must not re-trigger a start
    assert!(!render_loop.on_setup_complete());
    assert!(render_loop.is_running());
}

#[test]
fn gated_policy_holds_frames_until_primary_asset() {
    let mut render_loop = RenderLoop::new(StartPolicy::GateOnPrimary);
    assert!(!render_loop.on_setup_complete());
    assert!(
        !render_loop.is_running(),
        "no frame may run before the gating asset completes"
    );

    assert!(render_loop.on_primary_asset());
    assert!(render_loop.is_running());
}

#[test]
fn primary_asset_start_is_idempotent() {
    let mut render_loop = RenderLoop::new(StartPolicy::GateOnPrimary);
    assert!(render_loop.on_primary_asset());
    // a spurious repeat completion must not start a second loop
    assert!(!render_loop.on_primary_asset());
    assert!(render_loop.is_running());
}

#[test]
fn primary_asset_is_ignored_by_immediate_policy() {
    let mut render_loop = RenderLoop::new(StartPolicy::Immediate);
    assert!(!render_loop.on_primary_asset());
    assert_eq!(render_loop.state(), LoopState::Uninitialized);
}

#[test]
fn disposal_stops_ticks_for_good() {
    let mut render_loop = RenderLoop::new(StartPolicy::GateOnPrimary);
    assert!(render_loop.on_primary_asset());
    render_loop.dispose();
    assert!(!render_loop.is_running());
    assert_eq!(render_loop.state(), LoopState::Disposed);

    // late completion events must not resurrect a disposed loop
    assert!(!render_loop.on_primary_asset());
    assert_eq!(render_loop.state(), LoopState::Disposed);
}
