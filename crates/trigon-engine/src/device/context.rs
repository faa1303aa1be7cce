use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::coords::{Color, Viewport};
use crate::geometry::VertexLayout;
use crate::shader::{self, ShaderStage, StageInterface};

use super::frame::{BoundProgram, DrawCall, FrameCommands};
use super::loader::{ContextResolver, DrawableTarget};
use super::{surface, GpuDevice, GpuError, GpuInit, Outcome, SurfaceErrorAction, Topology};

/// Static vertex buffer.
#[derive(Debug)]
pub struct WgpuBuffer {
    id: u64,
    buffer: wgpu::Buffer,
}

/// A shader stage object. `module` is `None` when compilation failed.
#[derive(Debug)]
pub struct WgpuShader {
    stage: ShaderStage,
    module: Option<wgpu::ShaderModule>,
    interface: Option<StageInterface>,
}

/// A program object. `pipeline` is `None` when linking failed.
#[derive(Debug)]
pub struct WgpuProgram {
    id: u64,
    pipeline: Option<wgpu::RenderPipeline>,
    topology: Topology,
}

/// Owns wgpu core objects and the surface configuration.
///
/// This type is the GPU context of a session:
/// - stores Device/Queue and the window Surface (swapchain)
/// - implements `GpuDevice` by recording bind state and encoding it on `present`
pub struct WgpuDevice {
    /// Surface bound to the window; keeps the window alive through its `Arc`.
    surface: wgpu::Surface<'static>,

    device: wgpu::Device,
    queue: wgpu::Queue,

    /// Active surface configuration.
    config: wgpu::SurfaceConfiguration,

    /// Current drawable size in physical pixels.
    size: PhysicalSize<u32>,

    viewport: Viewport,
    frame: FrameCommands,

    /// Source of buffer/program ids, so bind points can be matched on release.
    next_id: u64,
}

impl WgpuDevice {
    /// Creates a GPU context for the window behind `resolver`.
    pub async fn new<T: DrawableTarget>(
        resolver: ContextResolver<T>,
        init: &GpuInit,
    ) -> Result<Self, GpuError> {
        let ContextResolver { target, request } = resolver;
        let required_limits = super::limits_for(&request)?;

        let (width, height) = target.drawable_size();
        if width == 0 || height == 0 {
            return Err(GpuError::Surface("window has zero size".to_string()));
        }
        let size = PhysicalSize::new(width, height);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        });

        // The surface holds its own `Arc` of the window, hence `'static`.
        let surface = instance
            .create_surface(target)
            .map_err(|e| GpuError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| GpuError::Adapter(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("trigon device"),
                required_features: wgpu::Features::empty(),
                required_limits: required_limits.using_resolution(adapter.limits()),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| GpuError::Device(e.to_string()))?;

        device.on_uncaptured_error(std::sync::Arc::new(|e| {
            log::error!("wgpu uncaptured error: {e}");
        }));

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&surface_caps, init.prefer_srgb)
            .ok_or_else(|| GpuError::Surface("no supported surface formats".to_string()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface::choose_alpha_mode(&surface_caps, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        surface.configure(&device, &config);

        let info = adapter.get_info();
        log::debug!(
            "GPU context ready: {} ({:?}), surface {:?} {}x{}",
            info.name,
            info.backend,
            format,
            width,
            height
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            viewport: Viewport::full(width, height),
            frame: FrameCommands::default(),
            next_id: 1,
        })
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn create_pipeline(
        &self,
        vertex: (&wgpu::ShaderModule, &StageInterface),
        fragment: (&wgpu::ShaderModule, &StageInterface),
        layout: &VertexLayout,
        topology: Topology,
    ) -> wgpu::RenderPipeline {
        let attributes = layout.wgpu_attributes();
        let buffers = [wgpu::VertexBufferLayout {
            array_stride: layout.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &attributes,
        }];

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("trigon pipeline layout"),
                bind_group_layouts: &[],
                immediate_size: 0,
            });

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("trigon program"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vertex.0,
                    entry_point: Some(vertex.1.entry_point.as_str()),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: fragment.0,
                    entry_point: Some(fragment.1.entry_point.as_str()),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: topology.to_wgpu(),
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
    }
}

impl GpuDevice for WgpuDevice {
    type Buffer = WgpuBuffer;
    type Shader = WgpuShader;
    type Program = WgpuProgram;

    fn set_swap_interval(&mut self, interval: u32) {
        self.config.present_mode = surface::present_mode_for(interval);
        if self.size.width > 0 && self.size.height > 0 {
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        // A full-surface viewport tracks the drawable, so the swapchain follows it.
        let covers = PhysicalSize::new(viewport.x + viewport.width, viewport.y + viewport.height);
        if viewport.x == 0 && viewport.y == 0 && covers != self.size {
            surface::apply_resize(
                &self.surface,
                &self.device,
                &mut self.config,
                &mut self.size,
                covers,
            );
        }
        self.viewport = viewport;
    }

    fn create_vertex_buffer(
        &mut self,
        data: &[u8],
        layout: &VertexLayout,
    ) -> Result<WgpuBuffer, GpuError> {
        let limits = self.device.limits();
        let size = data.len() as u64;

        if size == 0 || size > limits.max_buffer_size {
            return Err(GpuError::Allocation {
                what: "vertex buffer",
                reason: format!("{size} bytes is outside 1..={}", limits.max_buffer_size),
            });
        }
        if layout.stride > u64::from(limits.max_vertex_buffer_array_stride) {
            return Err(GpuError::Allocation {
                what: "vertex buffer",
                reason: format!(
                    "stride {} exceeds device limit {}",
                    layout.stride, limits.max_vertex_buffer_array_stride
                ),
            });
        }

        // No COPY_DST: the contents never change after upload.
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("trigon vertex buffer"),
                contents: data,
                usage: wgpu::BufferUsages::VERTEX,
            });

        Ok(WgpuBuffer {
            id: self.allocate_id(),
            buffer,
        })
    }

    fn delete_vertex_buffer(&mut self, buffer: WgpuBuffer) {
        if self.frame.vertex_buffer.as_ref().is_some_and(|(id, _)| *id == buffer.id) {
            self.frame.vertex_buffer = None;
        }
        buffer.buffer.destroy();
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Outcome<WgpuShader> {
        match shader::compile_wgsl(stage, source) {
            Ok(interface) => {
                let module = self
                    .device
                    .create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some(stage.label()),
                        source: wgpu::ShaderSource::Wgsl(source.into()),
                    });
                Outcome::success(WgpuShader {
                    stage,
                    module: Some(module),
                    interface: Some(interface),
                })
            }
            Err(log) => Outcome::failure(
                WgpuShader {
                    stage,
                    module: None,
                    interface: None,
                },
                log,
            ),
        }
    }

    fn delete_shader(&mut self, shader: WgpuShader) {
        log::trace!("releasing {} shader", shader.stage);
        drop(shader);
    }

    fn link_program(
        &mut self,
        vertex: &WgpuShader,
        fragment: &WgpuShader,
        layout: &VertexLayout,
        topology: Topology,
    ) -> Outcome<WgpuProgram> {
        let id = self.allocate_id();
        let unlinked = WgpuProgram {
            id,
            pipeline: None,
            topology,
        };

        let (Some(vmod), Some(vif)) = (vertex.module.as_ref(), vertex.interface.as_ref()) else {
            return Outcome::failure(unlinked, "vertex stage is not compiled");
        };
        let (Some(fmod), Some(fif)) = (fragment.module.as_ref(), fragment.interface.as_ref())
        else {
            return Outcome::failure(unlinked, "fragment stage is not compiled");
        };

        if let Err(log) = shader::check_link(vif, fif, layout) {
            return Outcome::failure(unlinked, log);
        }

        let pipeline = self.create_pipeline((vmod, vif), (fmod, fif), layout, topology);
        Outcome::success(WgpuProgram {
            id,
            pipeline: Some(pipeline),
            topology,
        })
    }

    fn delete_program(&mut self, program: WgpuProgram) {
        if self.frame.program.as_ref().is_some_and(|bound| bound.id == program.id) {
            self.frame.program = None;
        }
        drop(program);
    }

    fn clear(&mut self, color: Color) {
        self.frame.clear = Some(color);
    }

    fn use_program(&mut self, program: Option<&WgpuProgram>) {
        self.frame.program = program.and_then(|p| {
            p.pipeline.as_ref().map(|pipeline| BoundProgram {
                id: p.id,
                pipeline: pipeline.clone(),
                topology: p.topology,
            })
        });
    }

    fn bind_vertex_buffer(&mut self, buffer: Option<&WgpuBuffer>) {
        self.frame.vertex_buffer = buffer.map(|b| (b.id, b.buffer.clone()));
    }

    fn draw_arrays(&mut self, topology: Topology, first: u32, count: u32) {
        self.frame.record_draw(DrawCall {
            topology,
            first,
            count,
        });
    }

    fn present(&mut self) -> Result<(), GpuError> {
        let clear = self.frame.clear.take();

        // Minimized: nothing to present until the drawable has a size again.
        if self.size.width == 0 || self.size.height == 0 {
            self.frame.draw = None;
            return Ok(());
        }

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(err) => {
                self.frame.draw = None;
                let action = surface::map_surface_error(
                    &self.surface,
                    &self.device,
                    &self.config,
                    self.size,
                    &err,
                );
                return match action {
                    SurfaceErrorAction::Fatal => Err(GpuError::Present(err.to_string())),
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        log::debug!("frame skipped: {err}");
                        Ok(())
                    }
                };
            }
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("trigon frame encoder"),
            });

        let load = match clear {
            Some(color) => wgpu::LoadOp::Clear(color.to_wgpu()),
            None => wgpu::LoadOp::Load,
        };
        let viewport = self.viewport.clamped_to(self.size.width, self.size.height);

        // Pass is dropped before the encoder is finished.
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("trigon frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if let Some((pipeline, buffer, draw)) = self.frame.encodable_draw() {
                if !viewport.is_empty() {
                    rpass.set_viewport(
                        viewport.x as f32,
                        viewport.y as f32,
                        viewport.width as f32,
                        viewport.height as f32,
                        0.0,
                        1.0,
                    );
                    rpass.set_pipeline(pipeline);
                    rpass.set_vertex_buffer(0, buffer.slice(..));
                    rpass.draw(draw.first..draw.first + draw.count, 0..1);
                }
            }
        }
        self.frame.draw = None;

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }
}
