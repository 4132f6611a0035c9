//! Scene configuration records and the built stage.
//!
//! A [`StageConfig`] is the complete parameter set for one hosted scene:
//! camera placement, orbit constraints, light colors, render parameters and
//! the list of assets to load. It is read once at host start and never
//! mutated afterwards. The [`Stage`] is what the host builds from it: the
//! scene-graph root plus the per-frame animation bookkeeping.

use cgmath::{Deg, Point3, Rad, Vector3};

use crate::{
    data_structures::scene_graph::SceneNode,
    resources::{LoadedAsset, animation::Mixer},
};

/// Renderer-global visual parameters: exposure and the bloom knobs.
///
/// Set once at initialization; the post-processing chain is planned from
/// this record and never re-planned at runtime.
#[derive(Clone, Copy, Debug)]
pub struct RenderParams {
    pub exposure: f32,
    pub bloom_strength: f32,
    pub bloom_threshold: f32,
    pub bloom_radius: f32,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            bloom_strength: 1.5,
            bloom_threshold: 0.0,
            bloom_radius: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CameraConfig {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Point3::new(1.0, -6.0, 1.0),
            target: Point3::new(0.0, 5.0, 0.0),
            fovy: Deg(45.0),
            znear: 1.0,
            zfar: 100000.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct OrbitConfig {
    pub max_polar: Rad<f32>,
    pub min_distance: f32,
    pub max_distance: f32,
    pub damping: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            max_polar: Rad(std::f32::consts::FRAC_PI_2),
            min_distance: 1.0,
            max_distance: 10.0,
            damping: 0.02,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LightingConfig {
    /// Ambient term applied to every fragment.
    pub ambient: [f32; 3],
    /// Color of the point light that follows the camera.
    pub point_color: [f32; 3],
    pub point_intensity: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient: [0.25, 0.25, 0.25],
            point_color: [1.0, 1.0, 1.0],
            point_intensity: 1.0,
        }
    }
}

/// When the render loop is allowed to leave `Uninitialized`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartPolicy {
    /// Start right after synchronous setup; asset completions race with frames.
    Immediate,
    /// Hold frames until the primary asset's completion event has fired.
    GateOnPrimary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetFormat {
    Gltf,
    Obj,
}

/// Replace a named node's material with a texture loaded from `texture`.
/// Nodes are addressed by name; model-file authoring order is not a contract.
#[derive(Clone, Debug)]
pub struct MaterialOverride {
    pub node: String,
    pub texture: String,
}

/// One model to load and attach to the scene.
#[derive(Clone, Debug)]
pub struct AssetSpec {
    pub path: String,
    pub format: AssetFormat,
    pub scale: f32,
    pub position: Vector3<f32>,
    /// Spin the attached node around Y at one radian per second.
    pub spin: bool,
    /// Play the asset's first animation clip once loaded.
    pub animate: bool,
    /// The asset the `GateOnPrimary` policy waits for.
    pub primary: bool,
    pub material_override: Option<MaterialOverride>,
}

impl AssetSpec {
    pub fn new(path: impl Into<String>, format: AssetFormat) -> Self {
        Self {
            path: path.into(),
            format,
            scale: 1.0,
            position: Vector3::new(0.0, 0.0, 0.0),
            spin: false,
            animate: false,
            primary: false,
            material_override: None,
        }
    }
}

/// Everything a [`crate::host::SceneHost`] needs to know about one scene.
#[derive(Clone, Debug)]
pub struct StageConfig {
    pub clear_colour: wgpu::Color,
    pub params: RenderParams,
    pub camera: CameraConfig,
    pub orbit: OrbitConfig,
    pub lighting: LightingConfig,
    pub start: StartPolicy,
    pub assets: Vec<AssetSpec>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            // 0x120310, the dark purple the whole aesthetic hangs on
            clear_colour: wgpu::Color {
                r: 0.07,
                g: 0.01,
                b: 0.06,
                a: 1.0,
            },
            params: RenderParams::default(),
            camera: CameraConfig::default(),
            orbit: OrbitConfig::default(),
            lighting: LightingConfig::default(),
            start: StartPolicy::Immediate,
            assets: Vec::new(),
        }
    }
}

/// The built scene: graph root, animation mixer and spin bookkeeping.
///
/// Owned by the host; mutated only on the event-loop thread, either by an
/// asset completion ([`attach`](Self::attach)) or by the per-frame
/// [`advance`](Self::advance).
pub struct Stage {
    pub root: SceneNode,
    mixer: Option<Mixer>,
    spin_node: Option<String>,
    spin_angle: f32,
}

impl Stage {
    pub fn new() -> Self {
        Self {
            root: SceneNode::group("root"),
            mixer: None,
            spin_node: None,
            spin_angle: 0.0,
        }
    }

    /// Attach a loaded asset under the root, applying the [`AssetSpec`]
    /// transform and registering its animation clip and spin flag.
    pub fn attach(&mut self, spec: &AssetSpec, asset: LoadedAsset) {
        let LoadedAsset {
            mut node,
            animations,
        } = asset;

        node.local.scale = Vector3::new(spec.scale, spec.scale, spec.scale);
        node.local.position = spec.position;

        if spec.spin {
            self.spin_node = Some(node.name().to_string());
        }
        if spec.animate {
            if animations.is_empty() {
                log::warn!("asset {} has no animation clips to play", spec.path);
            } else {
                // Play the asset's first clip: keep every node track that
                // belongs to it.
                let clip = animations[0].name.clone();
                let tracks: Vec<_> = animations
                    .into_iter()
                    .filter(|track| track.name == clip)
                    .collect();
                match &mut self.mixer {
                    Some(mixer) => mixer.add_tracks(tracks),
                    None => self.mixer = Some(Mixer::new(tracks)),
                }
            }
        }

        self.root.add_child(node);
        log::info!("attached asset {}", spec.path);
    }

    /// Advance animation state by `dt` seconds.
    ///
    /// The spin node's angle grows by exactly `dt` (angular rate 1.0); the
    /// mixer advances its clips by the same delta.
    pub fn advance(&mut self, dt: f32) {
        if let Some(mixer) = &mut self.mixer {
            mixer.update(dt, &mut self.root);
        }
        if let Some(name) = &self.spin_node {
            self.spin_angle += dt;
            let angle = self.spin_angle;
            if let Some(node) = self.root.find_mut(name) {
                node.local.rotation = cgmath::Quaternion::from(cgmath::Euler {
                    x: Rad(0.0),
                    y: Rad(angle),
                    z: Rad(0.0),
                });
            }
        }
    }

    /// Accumulated spin angle in radians.
    pub fn spin_angle(&self) -> f32 {
        self.spin_angle
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}
