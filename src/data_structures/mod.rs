//! Engine data structures: models, textures, scene graph and transforms.
//!
//! This module contains the core data types for scene representation:
//!
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `transform` holds position/rotation/scale data and its GPU form
//! - `scene_graph` enables hierarchical scene organization with named lookup

pub mod model;
pub mod scene_graph;
pub mod texture;
pub mod transform;
