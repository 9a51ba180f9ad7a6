//! Presents the engine's colour buffer in a window.
//!
//! The colours are uploaded to a `Bgra8Unorm` texture (a packed
//! `0x00RRGGBB` pixel is `[b, g, r, 0]` in memory) and drawn with a
//! full-screen triangle strip. The fragment shader also draws the selection
//! rectangle's outline.

use std::num::NonZeroU32;

use anyhow::Context;
use bytemuck::{Pod, Zeroable};
use log::debug;
use mandelbrot_zoom::{screen, PixelRect};
use winit::window::Window;

use crate::uniform::Uniform;

#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug)]
struct Overlay {
    rect: [f32; 4],
    grid: [f32; 2],
    surface: [f32; 2],
}

impl Overlay {
    fn new(rect: PixelRect, grid: screen::Size, surface: screen::Size) -> Self {
        Self {
            rect: [
                rect.x as f32,
                rect.y as f32,
                rect.width as f32,
                rect.height as f32,
            ],
            grid: [grid.width as f32, grid.height as f32],
            surface: [surface.width.max(1) as f32, surface.height.max(1) as f32],
        }
    }
}

/// Prefers a format without sRGB encoding so grey levels reach the screen as
/// written. Falls back to the first supported format.
fn linear_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|format| !format.describe().srgb)
        .or_else(|| formats.first().copied())
}

/// Owns every GPU resource; dropping it releases them.
pub struct Renderer {
    surface: wgpu::Surface,
    surface_configuration: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    image: wgpu::Texture,
    overlay: Uniform<Overlay>,
    bind_group: wgpu::BindGroup,
    grid: screen::Size,
    selection: PixelRect,
}

impl Renderer {
    pub fn new(window: &Window, grid: screen::Size, selection: PixelRect) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(wgpu::Backends::all());

        let size = window.inner_size();
        // The window is moved into the event loop alongside the renderer and
        // outlives the surface.
        let surface = unsafe { instance.create_surface(window) };

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: Default::default(),
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        }))
        .context("no graphics adapter can present to this window")?;
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("device"),
                features: wgpu::Features::empty(),
                limits: wgpu::Limits::default(),
            },
            None,
        ))
        .context("failed to open graphics device")?;

        let format = linear_format(&surface.get_supported_formats(&adapter))
            .context("surface supports no texture formats")?;
        debug!("surface format {:?}", format);
        let surface_configuration = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
        };
        surface.configure(&device, &surface_configuration);

        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
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

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("render-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: "vertex_main",
                buffers: &[],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: "fragment_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_configuration.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
        });

        let image = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("image-texture"),
            size: wgpu::Extent3d {
                width: grid.width,
                height: grid.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Bgra8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        });
        let image_view = image.create_view(&wgpu::TextureViewDescriptor::default());

        let surface_size = screen::Size::new(surface_configuration.width, surface_configuration.height);
        let overlay = Uniform::new(
            &device,
            "overlay-buffer",
            Overlay::new(selection, grid, surface_size),
        );

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bind-group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&image_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: overlay.binding_resource(),
                },
            ],
        });

        Ok(Self {
            surface,
            surface_configuration,
            device,
            queue,
            pipeline,
            image,
            overlay,
            bind_group,
            grid,
            selection,
        })
    }

    fn surface_size(&self) -> screen::Size {
        screen::Size::new(
            self.surface_configuration.width,
            self.surface_configuration.height,
        )
    }

    /// Copies a full row-major colour buffer into the image texture.
    pub fn upload(&self, colours: &[u32]) {
        debug_assert_eq!(colours.len(), self.grid.len());
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.image,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(colours),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: NonZeroU32::new(4 * self.grid.width),
                rows_per_image: NonZeroU32::new(self.grid.height),
            },
            wgpu::Extent3d {
                width: self.grid.width,
                height: self.grid.height,
                depth_or_array_layers: 1,
            },
        );
    }

    pub fn set_selection(&mut self, selection: PixelRect) {
        self.selection = selection;
        self.overlay.write(
            &self.queue,
            Overlay::new(selection, self.grid, self.surface_size()),
        );
    }

    /// Reconfigures the surface after it was lost or outdated.
    pub fn reconfigure(&mut self, width: u32, height: u32) {
        debug!("reconfiguring surface to {}x{}", width, height);
        self.surface_configuration.width = width.max(1);
        self.surface_configuration.height = height.max(1);
        self.surface.configure(&self.device, &self.surface_configuration);
        self.set_selection(self.selection);
    }

    pub fn render(&self) -> Result<(), wgpu::SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut command_encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        {
            let mut render_pass = command_encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..4, 0..1);
        }

        self.queue.submit([command_encoder.finish()]);
        surface_texture.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_srgb_formats() {
        let formats = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureFormat::Rgba8Unorm,
        ];
        assert_eq!(linear_format(&formats), Some(wgpu::TextureFormat::Bgra8Unorm));
    }

    #[test]
    fn falls_back_to_first_format() {
        let formats = [wgpu::TextureFormat::Bgra8UnormSrgb, wgpu::TextureFormat::Rgba8UnormSrgb];
        assert_eq!(linear_format(&formats), Some(wgpu::TextureFormat::Bgra8UnormSrgb));
        assert_eq!(linear_format(&[]), None);
    }
}
