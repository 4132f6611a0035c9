//! Keyframe tracks and the animation mixer.
//!
//! glTF delivers one channel per transform component; [`merge`] folds the
//! channels of a clip into a single [`NodeAnimation`] track so the mixer
//! can sample a complete [`Transform`] per timestamp.

use cgmath::{InnerSpace, One, VectorSpace};

use crate::data_structures::{scene_graph::SceneNode, transform::Transform};

#[derive(Clone, Debug)]
pub enum Keyframes {
    Translation(Vec<cgmath::Vector3<f32>>),
    Rotation(Vec<cgmath::Quaternion<f32>>),
    Scale(Vec<cgmath::Vector3<f32>>),
    Other,
}

/// An animation clip as read from one gltf channel: a named animation with
/// keyframes of a single component and their timing.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    pub keyframes: Keyframes,
    pub timestamps: Vec<f32>,
}

/// A merged track: complete transforms per timestamp, bound to a node name.
#[derive(Clone, Debug)]
pub struct NodeAnimation {
    pub name: String,
    pub target: String,
    pub timestamps: Vec<f32>,
    pub transforms: Vec<Transform>,
}

impl NodeAnimation {
    pub fn duration(&self) -> f32 {
        self.timestamps.last().copied().unwrap_or(0.0)
    }

    /// Sample the track at `time` seconds, wrapping past the end.
    /// Translation and scale are lerped, rotation is slerped.
    pub fn sample(&self, time: f32) -> Option<Transform> {
        let duration = self.duration();
        if duration <= 0.0 || self.transforms.is_empty() {
            return None;
        }
        let t = time % duration;
        let next = self
            .timestamps
            .iter()
            .position(|&stamp| stamp > t)
            .unwrap_or(self.timestamps.len() - 1);
        if next == 0 {
            return self.transforms.first().cloned();
        }
        let prev = next - 1;
        let span = self.timestamps[next] - self.timestamps[prev];
        let alpha = if span > 0.0 {
            (t - self.timestamps[prev]) / span
        } else {
            0.0
        };

        let a = &self.transforms[prev.min(self.transforms.len() - 1)];
        let b = &self.transforms[next.min(self.transforms.len() - 1)];
        Some(Transform {
            position: a.position.lerp(b.position, alpha),
            rotation: a.rotation.slerp(b.rotation, alpha).normalize(),
            scale: a.scale.lerp(b.scale, alpha),
        })
    }
}

/// Fold the per-component clips of one node into merged tracks, one per
/// clip name. Components with fewer keyframes than the longest track are
/// padded with their first frame.
pub fn merge(target: &str, clips: &[AnimationClip]) -> Vec<NodeAnimation> {
    let mut merged: Vec<NodeAnimation> = Vec::new();
    let mut names: Vec<&str> = Vec::new();
    for clip in clips {
        if !names.contains(&clip.name.as_str()) {
            names.push(&clip.name);
        }
    }

    for name in names {
        let group: Vec<&AnimationClip> = clips.iter().filter(|c| c.name == name).collect();

        let timestamps = group
            .iter()
            .map(|c| &c.timestamps)
            .max_by_key(|t| t.len())
            .cloned()
            .unwrap_or_default();
        let len = timestamps.len();

        let mut translations: Vec<cgmath::Vector3<f32>> = Vec::new();
        let mut rotations: Vec<cgmath::Quaternion<f32>> = Vec::new();
        let mut scales: Vec<cgmath::Vector3<f32>> = Vec::new();
        for clip in &group {
            match &clip.keyframes {
                Keyframes::Translation(v) => translations = v.clone(),
                Keyframes::Rotation(v) => rotations = v.clone(),
                Keyframes::Scale(v) => scales = v.clone(),
                Keyframes::Other => {
                    log::warn!("unsupported keyframe type in clip {name}, skipping channel")
                }
            }
        }

        let transforms = (0..len)
            .map(|i| Transform {
                position: pad(&translations, i, cgmath::Vector3::new(0.0, 0.0, 0.0)),
                rotation: pad(&rotations, i, cgmath::Quaternion::one()),
                scale: pad(&scales, i, cgmath::Vector3::new(1.0, 1.0, 1.0)),
            })
            .collect();

        merged.push(NodeAnimation {
            name: name.to_string(),
            target: target.to_string(),
            timestamps,
            transforms,
        });
    }
    merged
}

// Index into a track, falling back to its first frame and then to the
// identity component (child nodes carry their offsets in the first frame).
fn pad<T: Clone>(track: &[T], i: usize, identity: T) -> T {
    track
        .get(i)
        .or_else(|| track.first())
        .cloned()
        .unwrap_or(identity)
}

/// Advances clip time and writes sampled transforms to target nodes; the
/// per-frame delta comes from the host's frame clock.
pub struct Mixer {
    tracks: Vec<NodeAnimation>,
    time: f32,
}

impl Mixer {
    pub fn new(tracks: Vec<NodeAnimation>) -> Self {
        Self { tracks, time: 0.0 }
    }

    pub fn add_tracks(&mut self, mut tracks: Vec<NodeAnimation>) {
        self.tracks.append(&mut tracks);
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Elapsed clip time in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn update(&mut self, dt: f32, root: &mut SceneNode) {
        self.time += dt;
        for track in &self.tracks {
            if let Some(transform) = track.sample(self.time) {
                match root.find_mut(&track.target) {
                    Some(node) => node.local = transform,
                    None => log::warn!("animation target {} not found", track.target),
                }
            }
        }
    }
}
