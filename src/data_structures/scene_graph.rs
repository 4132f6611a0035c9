//! Scene graph and hierarchical scene organization.
//!
//! A scene is a tree of named [`SceneNode`]s. Group nodes only carry a
//! transform; model nodes additionally own a [`Model`] and the GPU buffer
//! for their world transform. World transforms are the parent-to-child
//! product of local transforms and are pushed to the GPU before drawing.
//!
//! Nodes are addressed by name, never by child index: authoring order in a
//! model file is not stable enough to build against.

use wgpu::util::DeviceExt;

use crate::data_structures::{
    model::{DrawModel, Model},
    transform::Transform,
};

pub struct SceneNode {
    name: String,
    pub local: Transform,
    world: Transform,
    mesh: Option<NodeMesh>,
    children: Vec<SceneNode>,
}

/// GPU half of a model node: the model and the buffer its world transform
/// is uploaded into (bound as vertex buffer slot 1).
pub struct NodeMesh {
    pub model: Model,
    buffer: wgpu::Buffer,
}

impl SceneNode {
    /// Create an empty group node.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: Transform::default(),
            world: Transform::default(),
            mesh: None,
            children: Vec::new(),
        }
    }

    /// Create a node that renders `model` with its world transform.
    pub fn with_model(name: impl Into<String>, device: &wgpu::Device, model: Model) -> Self {
        let world = Transform::default();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Node Transform Buffer"),
            contents: bytemuck::cast_slice(&[world.to_raw()]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            name: name.into(),
            local: Transform::default(),
            world,
            mesh: Some(NodeMesh { model, buffer }),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The most recently computed world transform.
    pub fn world(&self) -> &Transform {
        &self.world
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    pub fn model_mut(&mut self) -> Option<&mut Model> {
        self.mesh.as_mut().map(|m| &mut m.model)
    }

    /// Depth-first lookup by name, including `self`.
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Depth-first lookup by name, including `self`.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(name))
    }

    /// Number of nodes in this subtree, `self` included.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(SceneNode::node_count)
            .sum::<usize>()
    }

    /// Recompute world transforms for this subtree from `parent`.
    pub fn update_world_transforms(&mut self, parent: &Transform) {
        self.world = parent * &self.local;
        for child in &mut self.children {
            child.update_world_transforms(&self.world);
        }
    }

    /// Push the current world transforms to the GPU.
    pub fn write_to_buffers(&self, queue: &wgpu::Queue) {
        if let Some(mesh) = &self.mesh {
            queue.write_buffer(&mesh.buffer, 0, bytemuck::cast_slice(&[self.world.to_raw()]));
        }
        for child in &self.children {
            child.write_to_buffers(queue);
        }
    }

    pub fn draw<'a, 'pass>(
        &'a self,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
        render_pass: &'pass mut wgpu::RenderPass<'a>,
    ) where
        'a: 'pass,
    {
        if let Some(mesh) = &self.mesh {
            if mesh.model.materials.is_empty() {
                log::warn!("node {} has no materials and will not be drawn", self.name);
            } else {
                render_pass.set_vertex_buffer(1, mesh.buffer.slice(..));
                render_pass.draw_model(&mesh.model, camera_bind_group, light_bind_group);
            }
        }
        for child in &self.children {
            child.draw(camera_bind_group, light_bind_group, render_pass);
        }
    }
}
