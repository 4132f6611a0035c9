use std::{
    collections::HashMap,
    io::{BufReader, Cursor},
    path::Path,
};

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        model::{Material, Mesh, Model, ModelVertex},
        scene_graph::SceneNode,
        texture::Texture,
    },
    resources::{
        animation::{AnimationClip, Keyframes, NodeAnimation, merge},
        texture::{diffuse_layout, load_binary, load_obj_materials, load_texture},
    },
    stage::{AssetFormat, AssetSpec},
};

/**
 * This module contains all logic for loading meshes/textures/animations from external files.
 */
pub mod animation;
pub mod texture;

/// A loaded model graph plus the animation tracks found in the file.
/// Produced by a loader task; ownership moves into the scene graph when the
/// host attaches it.
pub struct LoadedAsset {
    pub node: SceneNode,
    pub animations: Vec<NodeAnimation>,
}

/// Load the model an [`AssetSpec`] names and apply its material override.
pub async fn load_asset(
    spec: &AssetSpec,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<LoadedAsset> {
    let mut asset = match spec.format {
        AssetFormat::Gltf => load_model_gltf(&spec.path, device, queue).await?,
        AssetFormat::Obj => load_model_obj(&spec.path, device, queue).await?,
    };

    if let Some(overlay) = &spec.material_override {
        let layout = diffuse_layout(device);
        let diffuse = load_texture(&overlay.texture, device, queue, None).await?;
        let material = Material::new(device, &overlay.texture, diffuse, &layout);
        match asset.node.find_mut(&overlay.node).and_then(SceneNode::model_mut) {
            Some(model) => {
                for mesh in &mut model.meshes {
                    mesh.material = 0;
                }
                model.materials = vec![material];
            }
            None => log::warn!(
                "material override target {} not found in {}",
                overlay.node,
                spec.path
            ),
        }
    }

    Ok(asset)
}

pub async fn load_model_obj(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<LoadedAsset> {
    let bind_group_layout = diffuse_layout(device);

    let (materials, models) =
        load_obj_materials(file_name, queue, device, &bind_group_layout).await?;
    let materials = if materials.is_empty() {
        // Keep untextured exports renderable.
        let white = Texture::from_color(device, queue, [255, 255, 255, 255], file_name);
        vec![Material::new(device, file_name, white, &bind_group_layout)]
    } else {
        materials
    };

    // One child node per named object so callers can address parts by name.
    let mut root = SceneNode::group(file_stem(file_name));
    for m in &models {
        let mesh = load_obj_mesh(m, file_name, device);
        let model = Model {
            meshes: vec![mesh],
            materials: materials.clone(),
        };
        root.add_child(SceneNode::with_model(m.name.clone(), device, model));
    }

    Ok(LoadedAsset {
        node: root,
        animations: Vec::new(),
    })
}

fn load_obj_mesh(m: &tobj::Model, file_name: &str, device: &wgpu::Device) -> Mesh {
    let vertices = (0..m.mesh.positions.len() / 3)
        .map(|i| ModelVertex {
            position: [
                m.mesh.positions[i * 3],
                m.mesh.positions[i * 3 + 1],
                m.mesh.positions[i * 3 + 2],
            ],
            tex_coords: [
                m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
            ],
            normal: [
                m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
            ],
        })
        .collect::<Vec<_>>();

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Vertex Buffer", file_name)),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Index Buffer", file_name)),
        contents: bytemuck::cast_slice(&m.mesh.indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    Mesh {
        name: m.name.clone(),
        vertex_buffer,
        index_buffer,
        num_elements: m.mesh.indices.len() as u32,
        material: m.mesh.material_id.unwrap_or(0),
    }
}

pub async fn load_model_gltf(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<LoadedAsset> {
    let gltf_bytes = load_binary(file_name).await?;
    let gltf_cursor = Cursor::new(gltf_bytes);
    let gltf_reader = BufReader::new(gltf_cursor);
    let gltf = gltf::Gltf::from_reader(gltf_reader)?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                if let Some(blob) = gltf.blob.as_deref() {
                    buffer_data.push(blob.into());
                };
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(uri).await?;
                buffer_data.push(bin);
            }
        }
    }

    // Load animations, keyed by the target node's index
    let mut clips: HashMap<usize, Vec<AnimationClip>> = HashMap::new();
    for animation in gltf.animations() {
        for channel in animation.channels() {
            let reader = channel.reader(|buffer| Some(&buffer_data[buffer.index()]));
            let timestamps = match reader.read_inputs() {
                Some(gltf::accessor::Iter::Standard(times)) => times.collect(),
                Some(gltf::accessor::Iter::Sparse(_)) => {
                    log::warn!("sparse animation input in channel {}", channel.index());
                    Vec::new()
                }
                None => {
                    log::warn!("no animation input in channel {}", channel.index());
                    Vec::new()
                }
            };
            let keyframes = match reader.read_outputs() {
                Some(gltf::animation::util::ReadOutputs::Translations(translations)) => {
                    Keyframes::Translation(translations.map(Into::into).collect())
                }
                Some(gltf::animation::util::ReadOutputs::Rotations(rotations)) => {
                    Keyframes::Rotation(rotations.into_f32().map(Into::into).collect())
                }
                Some(gltf::animation::util::ReadOutputs::Scales(scales)) => {
                    Keyframes::Scale(scales.map(Into::into).collect())
                }
                Some(gltf::animation::util::ReadOutputs::MorphTargetWeights(_)) => Keyframes::Other,
                None => {
                    log::warn!("no keyframes in channel {}", channel.index());
                    Keyframes::Other
                }
            };
            let name = animation.name().unwrap_or("Default").to_string();
            let clip = AnimationClip {
                name,
                keyframes,
                timestamps,
            };
            clips
                .entry(channel.target().node().index())
                .and_modify(|v| v.push(clip.clone()))
                .or_insert(vec![clip]);
        }
    }

    // Load materials
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        let name = material.name().unwrap_or(file_name);
        let diffuse_texture = match pbr.base_color_texture().map(|t| t.texture().source().source())
        {
            Some(gltf::image::Source::View { view, mime_type }) => {
                let start = view.offset();
                let end = start + view.length();
                Texture::from_bytes(
                    device,
                    queue,
                    &buffer_data[view.buffer().index()][start..end],
                    file_name,
                    mime_type.split('/').last(),
                )?
            }
            Some(gltf::image::Source::Uri { uri, mime_type }) => {
                let format = mime_type.and_then(|mt| mt.split('/').last());
                load_texture(uri, device, queue, format).await?
            }
            None => {
                // No texture: bake the base color factor into a 1x1 texture.
                let factor = pbr.base_color_factor();
                let rgba = [
                    (factor[0] * 255.0) as u8,
                    (factor[1] * 255.0) as u8,
                    (factor[2] * 255.0) as u8,
                    (factor[3] * 255.0) as u8,
                ];
                Texture::from_color(device, queue, rgba, name)
            }
        };
        let layout = diffuse_layout(device);
        materials.push(Material::new(device, name, diffuse_texture, &layout));
    }
    if materials.is_empty() {
        let white = Texture::from_color(device, queue, [255, 255, 255, 255], file_name);
        materials.push(Material::new(
            device,
            file_name,
            white,
            &diffuse_layout(device),
        ));
    }

    let mut animations = Vec::new();
    let mut nodes = Vec::new();
    for scene in gltf.scenes() {
        for node in scene.nodes() {
            nodes.push(to_scene_node(
                node,
                &buffer_data,
                device,
                &materials,
                &clips,
                &mut animations,
            ));
        }
    }

    let root = if nodes.len() == 1 {
        nodes.into_iter().next().unwrap()
    } else {
        let mut root = SceneNode::group(file_stem(file_name));
        for node in nodes {
            root.add_child(node);
        }
        root
    };

    Ok(LoadedAsset {
        node: root,
        animations,
    })
}

fn to_scene_node(
    node: gltf::scene::Node,
    buf: &Vec<Vec<u8>>,
    device: &wgpu::Device,
    materials: &Vec<Material>,
    clips: &HashMap<usize, Vec<AnimationClip>>,
    animations: &mut Vec<NodeAnimation>,
) -> SceneNode {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));

    if let Some(node_clips) = clips.get(&node.index()) {
        animations.append(&mut merge(&name, node_clips));
    }

    let mut scene_node = match node.mesh() {
        Some(mesh) => {
            let mut meshes = Vec::new();
            for primitive in mesh.primitives() {
                let reader = primitive.reader(|buffer| Some(&buf[buffer.index()]));

                let mut vertices = Vec::new();
                if let Some(positions) = reader.read_positions() {
                    positions.for_each(|position| {
                        vertices.push(ModelVertex {
                            position,
                            tex_coords: Default::default(),
                            normal: Default::default(),
                        })
                    });
                }
                if let Some(normals) = reader.read_normals() {
                    for (i, normal) in normals.enumerate() {
                        vertices[i].normal = normal;
                    }
                }
                if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
                    for (i, tex_coord) in tex_coords.enumerate() {
                        vertices[i].tex_coords = tex_coord;
                    }
                }

                let mut indices = Vec::new();
                if let Some(indices_raw) = reader.read_indices() {
                    indices.append(&mut indices_raw.into_u32().collect::<Vec<u32>>());
                }

                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Vertex Buffer", mesh.name())),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Index Buffer", mesh.name())),
                    contents: bytemuck::cast_slice(&indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                let mat_idx = primitive.material().index().unwrap_or(0);

                meshes.push(Mesh {
                    name: mesh.name().unwrap_or("unknown_mesh").to_string(),
                    vertex_buffer,
                    index_buffer,
                    num_elements: indices.len() as u32,
                    material: mat_idx,
                });
            }
            let model = Model {
                meshes,
                materials: materials.clone(),
            };
            SceneNode::with_model(name, device, model)
        }
        None => SceneNode::group(name),
    };

    let (position, rotation, scale) = node.transform().decomposed();
    scene_node.local.position = position.into();
    scene_node.local.rotation = rotation.into();
    scene_node.local.scale = scale.into();

    for child in node.children() {
        scene_node.add_child(to_scene_node(
            child, buf, device, materials, clips, animations,
        ));
    }

    scene_node
}

fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name)
        .to_string()
}
