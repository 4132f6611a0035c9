//! vitrine
//!
//! A lightweight, cross-platform scene-host engine for native and WASM
//! targets. The crate owns a window, a wgpu renderer, an orbit camera,
//! lights, a scene graph and an ordered post-processing chain, loads models
//! asynchronously and drives an explicit-lifecycle render loop. It is meant
//! for small display scenes (showrooms, product viewers, glowing dioramas)
//! rather than full games.
//!
//! High-level modules
//! - `camera`: camera, projection, uniforms and the orbit controller
//! - `context`: central GPU and window context that owns device/queue/lights
//! - `data_structures`: engine data models (meshes, textures, scene graph)
//! - `host`: the scene host, render-loop state machine and event loop
//! - `pipelines`: scene render pipeline and light resources
//! - `post`: the post-processing chain (scene pass, bloom, tonemap)
//! - `resources`: helpers to load models/textures and create GPU resources
//! - `stage`: scene configuration records and the built stage
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod host;
pub mod pipelines;
pub mod post;
pub mod resources;
pub mod stage;

// Re-exports commonly used types for convenience in downstream code.
pub use winit::dpi::PhysicalPosition;
pub use cgmath::*;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
pub use wgpu::*;
