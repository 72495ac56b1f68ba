use crate::gpu::vertex_layout;
use crate::target::RenderTarget;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};
use godray_assets::{Effect, Geometry};
use wgpu::util::DeviceExt;

/// Tuning for the scattering pass, read from the effect's uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatteringParams {
    pub density: f32,
    pub weight: f32,
    pub decay: f32,
    pub exposure: f32,
    pub samples: u32,
    pub sun_radius: f32,
    pub light_world: Vec3,
}

impl Default for ScatteringParams {
    fn default() -> Self {
        Self {
            density: 0.9,
            weight: 0.06,
            decay: 0.96,
            exposure: 0.7,
            samples: 64,
            sun_radius: 0.08,
            light_world: Vec3::new(275.0, 228.0, -340.0),
        }
    }
}

impl ScatteringParams {
    /// Missing uniforms fall back to the defaults. At least one sample is taken.
    pub fn from_effect(effect: &Effect) -> Self {
        let d = Self::default();
        Self {
            density: effect.uniform_or("density", d.density),
            weight: effect.uniform_or("weight", d.weight),
            decay: effect.uniform_or("decay", d.decay),
            exposure: effect.uniform_or("exposure", d.exposure),
            samples: effect.uniform_or("samples", d.samples as f32).max(1.0) as u32,
            sun_radius: effect.uniform_or("sunRadius", d.sun_radius),
            light_world: Vec3::new(
                effect.uniform_or("lightX", d.light_world.x),
                effect.uniform_or("lightY", d.light_world.y),
                effect.uniform_or("lightZ", d.light_world.z),
            ),
        }
    }
}

/// Project a world-space light into texture coordinates (origin top-left).
/// `None` when the light is behind the camera.
pub fn light_screen_position(view_proj: Mat4, light_world: Vec3) -> Option<Vec2> {
    let clip = view_proj * light_world.extend(1.0);
    if clip.w <= 0.0 {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    Some(Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5))
}

/// Scattering strength for a light at `uv`: full on screen, fading to zero
/// half a screen past any edge.
pub fn light_visibility(uv: Option<Vec2>) -> f32 {
    let Some(uv) = uv else {
        return 0.0;
    };
    let overshoot = (-uv.x).max(uv.x - 1.0).max(-uv.y).max(uv.y - 1.0).max(0.0);
    (1.0 - overshoot * 2.0).clamp(0.0, 1.0)
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct ScatteringUniforms {
    light_position: [f32; 2],
    aspect: f32,
    density: f32,
    weight: f32,
    decay: f32,
    exposure: f32,
    samples: u32,
    visibility: f32,
    sun_radius: f32,
    _pad: [f32; 2],
}

/// Full-screen pass that samples the offscreen scene as `backbuffer` and
/// writes the scattered result to the window surface.
pub struct LightScatteringPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    params: ScatteringParams,
}

impl LightScatteringPass {
    pub fn new(
        device: &wgpu::Device,
        effect: &Effect,
        quad: &Geometry,
        surface_format: wgpu::TextureFormat,
        target: &RenderTarget,
    ) -> Self {
        let params = ScatteringParams::from_effect(effect);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scattering_uniform_buffer"),
            size: std::mem::size_of::<ScatteringUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scattering_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bind_group = Self::create_bind_group(device, &bind_group_layout, &uniform_buffer, target);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scattering_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(effect.name.as_str()),
            source: wgpu::ShaderSource::Wgsl(effect.source.as_str().into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scattering_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(effect.vertex_entry.as_str()),
                compilation_options: Default::default(),
                buffers: &[vertex_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(effect.fragment_entry.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vertex_buffer"),
            contents: quad.vertex_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_index_buffer"),
            contents: quad.index_bytes(),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            pipeline,
            bind_group_layout,
            bind_group,
            uniform_buffer,
            vertex_buffer,
            index_buffer,
            index_count: quad.index_count(),
            params,
        }
    }

    pub fn params(&self) -> &ScatteringParams {
        &self.params
    }

    /// Point the pass at a recreated target (after a resize).
    pub fn rebind(&mut self, device: &wgpu::Device, target: &RenderTarget) {
        self.bind_group =
            Self::create_bind_group(device, &self.bind_group_layout, &self.uniform_buffer, target);
    }

    /// Composite the scattered scene onto `view`.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        view_proj: Mat4,
        aspect: f32,
    ) {
        let light_uv = light_screen_position(view_proj, self.params.light_world);
        let uniforms = ScatteringUniforms {
            light_position: light_uv.unwrap_or(Vec2::splat(0.5)).to_array(),
            aspect,
            density: self.params.density,
            weight: self.params.weight,
            decay: self.params.decay,
            exposure: self.params.exposure,
            samples: self.params.samples,
            visibility: light_visibility(light_uv),
            sun_radius: self.params.sun_radius,
            _pad: [0.0; 2],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scattering_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scattering_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..self.index_count, 0, 0..1);
        }
        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniform_buffer: &wgpu::Buffer,
        target: &RenderTarget,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scattering_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(target.color_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(target.sampler()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn effect_with(uniforms: &[(&str, f32)]) -> Effect {
        Effect {
            id: godray_assets::AssetId(0),
            name: "LightScattering".into(),
            path: "effect/LightScattering/LightScattering.effect".into(),
            source: String::new(),
            vertex_entry: "vs_main".into(),
            fragment_entry: "fs_main".into(),
            uniforms: uniforms
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn uniform_block_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<ScatteringUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<ScatteringUniforms>(), 48);
    }

    #[test]
    fn params_read_from_effect() {
        let params = ScatteringParams::from_effect(&effect_with(&[
            ("decay", 0.5),
            ("samples", 16.0),
            ("lightY", -1.0),
        ]));
        assert_eq!(params.decay, 0.5);
        assert_eq!(params.samples, 16);
        assert_eq!(params.light_world.y, -1.0);
        assert_eq!(params.density, ScatteringParams::default().density);
    }

    #[test]
    fn at_least_one_sample() {
        let params = ScatteringParams::from_effect(&effect_with(&[("samples", 0.0)]));
        assert_eq!(params.samples, 1);
    }

    #[test]
    fn light_ahead_projects_to_center() {
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 1.0, 0.1, 1000.0);
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let uv = light_screen_position(proj * view, Vec3::new(0.0, 0.0, -100.0)).unwrap();
        assert!((uv - Vec2::splat(0.5)).length() < 1e-5);
        assert_eq!(light_visibility(Some(uv)), 1.0);
    }

    #[test]
    fn light_above_maps_to_top_half() {
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 1.0, 0.1, 1000.0);
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let uv = light_screen_position(proj * view, Vec3::new(0.0, 10.0, -100.0)).unwrap();
        assert!(uv.y < 0.5);
    }

    #[test]
    fn light_behind_camera_is_invisible() {
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 1.0, 0.1, 1000.0);
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let uv = light_screen_position(proj * view, Vec3::new(0.0, 0.0, 100.0));
        assert!(uv.is_none());
        assert_eq!(light_visibility(uv), 0.0);
    }

    #[test]
    fn visibility_fades_off_screen() {
        assert_eq!(light_visibility(Some(Vec2::new(0.5, 0.5))), 1.0);
        assert!((light_visibility(Some(Vec2::new(1.25, 0.5))) - 0.5).abs() < 1e-6);
        assert_eq!(light_visibility(Some(Vec2::new(-1.0, 0.5))), 0.0);
    }
}
