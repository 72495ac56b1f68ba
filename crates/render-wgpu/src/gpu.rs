use crate::target::{DEPTH_FORMAT, RenderTarget, TARGET_FORMAT};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use godray_assets::{Effect, Geometry, Vertex};
use godray_scene::Scene;
use wgpu::util::DeviceExt;

/// Scene clear color. Alpha 0 marks "sky" for the scattering pass.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.05,
    a: 0.0,
};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
}

/// Instance slots allocated up front.
const INITIAL_INSTANCE_CAPACITY: u32 = 4_096;

fn create_instance_buffer(device: &wgpu::Device, capacity: u32) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("scene_instance_buffer"),
        size: capacity as u64 * std::mem::size_of::<InstanceData>() as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Capacity able to hold `required` instances. Keeps `current` when it
/// suffices, otherwise rounds up to a power of two.
fn instance_capacity(required: usize, current: u32) -> u32 {
    let required = u32::try_from(required).unwrap_or(u32::MAX);
    if required <= current {
        current
    } else {
        required.checked_next_power_of_two().unwrap_or(u32::MAX)
    }
}

/// Every surface drawn with `effect_path`, as per-instance data.
fn collect_instances(scene: &Scene, effect_path: &str) -> Vec<InstanceData> {
    scene
        .surfaces()
        .into_iter()
        .filter(|(_, _, surface)| surface.effect == effect_path)
        .map(|(_, model, surface)| {
            let cols = model.to_cols_array_2d();
            InstanceData {
                model_0: cols[0],
                model_1: cols[1],
                model_2: cols[2],
                model_3: cols[3],
                color: surface.material.diffuse_color.to_array(),
            }
        })
        .collect()
}

pub(crate) fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
    ];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

/// Draws every surface using one effect as instanced geometry into the
/// offscreen target.
pub struct SceneRenderer {
    effect_path: String,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    instance_buffer: wgpu::Buffer,
    instance_capacity: u32,
}

impl SceneRenderer {
    pub fn new(device: &wgpu::Device, effect: &Effect, geometry: &Geometry) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene_uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(effect.name.as_str()),
            source: wgpu::ShaderSource::Wgsl(effect.source.as_str().into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(effect.vertex_entry.as_str()),
                compilation_options: Default::default(),
                buffers: &[
                    vertex_layout(),
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                            7 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(effect.fragment_entry.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene_vertex_buffer"),
            contents: geometry.vertex_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene_index_buffer"),
            contents: geometry.index_bytes(),
            usage: wgpu::BufferUsages::INDEX,
        });

        // Pre-allocated; grown in `render` when the scene outnumbers it
        let instance_capacity = INITIAL_INSTANCE_CAPACITY;
        let instance_buffer = create_instance_buffer(device, instance_capacity);

        Self {
            effect_path: effect.path.clone(),
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            vertex_buffer,
            index_buffer,
            index_count: geometry.index_count(),
            instance_buffer,
            instance_capacity,
        }
    }

    /// Render the scene's surfaces for this effect into `target`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &RenderTarget,
        view_proj: Mat4,
        scene: &Scene,
    ) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: view_proj.to_cols_array_2d(),
            }),
        );

        let instances = collect_instances(scene, &self.effect_path);
        let required = instance_capacity(instances.len(), self.instance_capacity);
        if required != self.instance_capacity {
            tracing::debug!(
                "growing instance buffer {} -> {required}",
                self.instance_capacity
            );
            self.instance_buffer = create_instance_buffer(device, required);
            self.instance_capacity = required;
        }

        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scene_encoder"),
        });

        {
            let mut pass = begin_target_pass(&mut encoder, target);
            if !instances.is_empty() {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..self.index_count, 0, 0..instances.len() as u32);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

fn begin_target_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    target: &'e RenderTarget,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("scene_pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target.color_view(),
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: target.depth_view(),
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        ..Default::default()
    })
}

/// Clear a surface view. Used for frames drawn before assets are ready.
pub fn clear(device: &wgpu::Device, queue: &wgpu::Queue, view: &wgpu::TextureView) {
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("clear_encoder"),
    });
    {
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("clear_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        a: 1.0,
                        ..CLEAR_COLOR
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            ..Default::default()
        });
    }
    queue.submit(std::iter::once(encoder.finish()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use godray_common::Transform;
    use godray_scene::{BasicMaterial, SphereRng, Surface, spawn_random_cubes};

    const BASIC: &str = "effect/Basic.effect";

    #[test]
    fn every_surface_becomes_an_instance() {
        let mut scene = Scene::new();
        let meshes = scene
            .add_child(scene.root(), Some("meshes"), Transform::default())
            .unwrap();
        let mut rng = SphereRng::new(3);
        spawn_random_cubes(&mut scene, meshes, &mut rng, 5_000, "cube", BASIC).unwrap();

        let instances = collect_instances(&scene, BASIC);
        assert_eq!(instances.len(), 5_000);
        assert!(instances.len() as u32 > INITIAL_INSTANCE_CAPACITY);
    }

    #[test]
    fn instances_are_filtered_by_effect() {
        let mut scene = Scene::new();
        let id = scene
            .add_child(scene.root(), None, Transform::default())
            .unwrap();
        scene
            .add_surface(
                id,
                Surface {
                    geometry: "cube".into(),
                    material: BasicMaterial::default(),
                    effect: "effect/Other.effect".into(),
                },
            )
            .unwrap();
        assert!(collect_instances(&scene, BASIC).is_empty());
        assert_eq!(collect_instances(&scene, "effect/Other.effect").len(), 1);
    }

    #[test]
    fn capacity_grows_to_fit() {
        assert_eq!(instance_capacity(100, INITIAL_INSTANCE_CAPACITY), 4_096);
        assert_eq!(instance_capacity(4_096, 4_096), 4_096);
        assert_eq!(instance_capacity(5_000, 4_096), 8_192);
        assert_eq!(instance_capacity(0, 8_192), 8_192);
    }
}
