use std::time::Duration;

use crate::coords::Viewport;
use crate::device::{GpuDevice, GpuLoader, Topology};
use crate::geometry::GeometryBuffer;
use crate::logging::Diagnostics;
use crate::shader::{PipelineState, ShaderError, ShaderPipeline};
use crate::time::FrameClock;
use crate::window::{Display, DisplayEvent, Key};

use super::{SessionConfig, SessionError, ShaderFailurePolicy};

/// Outcome of a session that ran to completion.
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Frames presented.
    pub frames: u64,
    /// Wall time spent in the render loop.
    pub elapsed: Duration,
    /// Pipeline state when the loop ended, before teardown.
    pub pipeline_state: PipelineState,
    /// First shader failure, when the session continued past one.
    pub shader_failure: Option<ShaderError>,
}

/// One render session, from platform start to platform shutdown.
///
/// Acquisition order: platform → window → context/device → geometry →
/// shader program. Release runs in exactly the reverse order on every path,
/// including early failures.
pub struct Session;

impl Session {
    pub fn run<D, L>(
        display: &mut D,
        loader: &mut L,
        config: &SessionConfig,
        diagnostics: &dyn Diagnostics,
    ) -> Result<SessionReport, SessionError>
    where
        D: Display,
        L: GpuLoader<D::Resolver>,
    {
        if let Err(err) = display.initialize_platform() {
            let err = SessionError::from(err);
            diagnostics.error(&err.to_string());
            return Err(err);
        }
        diagnostics.info("initialized platform");

        let result = Self::with_platform(display, loader, config, diagnostics);
        display.shutdown_platform();
        log::debug!("platform shut down");

        // Shader failures were already reported with their full log.
        if let Err(err) = &result {
            if err.is_fatal() {
                diagnostics.error(&err.to_string());
            }
        }
        result
    }

    fn with_platform<D, L>(
        display: &mut D,
        loader: &mut L,
        config: &SessionConfig,
        diagnostics: &dyn Diagnostics,
    ) -> Result<SessionReport, SessionError>
    where
        D: Display,
        L: GpuLoader<D::Resolver>,
    {
        display.request_context(config.context);
        display.create_window(&config.window)?;
        log::debug!(
            "window created: {}x{} \"{}\"",
            config.window.width,
            config.window.height,
            config.window.title
        );

        let result = Self::with_window(display, loader, config, diagnostics);
        display.destroy_window();
        result
    }

    fn with_window<D, L>(
        display: &mut D,
        loader: &mut L,
        config: &SessionConfig,
        diagnostics: &dyn Diagnostics,
    ) -> Result<SessionReport, SessionError>
    where
        D: Display,
        L: GpuLoader<D::Resolver>,
    {
        let resolver = display.make_current()?;
        let mut gpu = loader.load(resolver).map_err(SessionError::Loader)?;
        gpu.set_swap_interval(config.swap_interval);

        let result = Self::with_device(display, &mut gpu, config, diagnostics);

        // The context goes before the window it renders into.
        drop(gpu);
        result
    }

    fn with_device<D, G>(
        display: &mut D,
        gpu: &mut G,
        config: &SessionConfig,
        diagnostics: &dyn Diagnostics,
    ) -> Result<SessionReport, SessionError>
    where
        D: Display,
        G: GpuDevice,
    {
        gpu.set_viewport(Viewport::full(config.window.width, config.window.height));

        let mut geometry = config.variant.upload(gpu)?;
        let mut pipeline = ShaderPipeline::new();

        if let Err(err) = pipeline.build(
            gpu,
            &config.shader_sources(),
            geometry.layout(),
            Topology::TriangleList,
            diagnostics,
        ) {
            if config.shader_failure == ShaderFailurePolicy::Fatal {
                Self::teardown(gpu, &mut geometry, &mut pipeline);
                return Err(err.into());
            }
            log::warn!("continuing without a shader program; frames will be empty");
        }

        let mut clock = FrameClock::new();
        diagnostics.info("render loop is about to begin");
        let looped = Self::render_loop(
            display,
            gpu,
            &mut geometry,
            &mut pipeline,
            config,
            &mut clock,
        );
        diagnostics.info(&format!(
            "render loop finished after {} frames",
            clock.frames()
        ));

        let report = SessionReport {
            frames: clock.frames(),
            elapsed: clock.elapsed(),
            pipeline_state: pipeline.state(),
            shader_failure: pipeline.failure().cloned(),
        };
        Self::teardown(gpu, &mut geometry, &mut pipeline);

        looped.map(|()| report)
    }

    fn render_loop<D, G>(
        display: &mut D,
        gpu: &mut G,
        geometry: &mut GeometryBuffer<G>,
        pipeline: &mut ShaderPipeline<G>,
        config: &SessionConfig,
        clock: &mut FrameClock,
    ) -> Result<(), SessionError>
    where
        D: Display,
        G: GpuDevice,
    {
        if config.frame_limit == Some(0) {
            display.request_close();
        }
        clock.start();

        while !display.should_close() {
            display.poll_events(&mut |event| match event {
                DisplayEvent::Resized { width, height } => {
                    gpu.set_viewport(Viewport::full(width, height));
                }
            });

            if display.is_key_pressed(Key::Escape) {
                display.request_close();
            }

            gpu.clear(config.clear_color);
            pipeline.activate(gpu)?;
            geometry.bind(gpu)?;
            gpu.draw_arrays(Topology::TriangleList, 0, geometry.vertex_count());

            display.swap_buffers();
            gpu.present().map_err(SessionError::Present)?;

            let frame = clock.tick();
            log::trace!("frame {} took {:?}", frame.frame, frame.dt);

            if config.frame_limit.is_some_and(|limit| frame.frame >= limit)
                && !display.should_close()
            {
                display.request_close();
            }
        }

        if let Some(fps) = clock.average_fps() {
            log::debug!(
                "{} frames in {:?} ({fps:.1} fps, slowest {:?})",
                clock.frames(),
                clock.elapsed(),
                clock.slowest_frame()
            );
        }
        Ok(())
    }

    /// Geometry first, then the program.
    fn teardown<G: GpuDevice>(
        gpu: &mut G,
        geometry: &mut GeometryBuffer<G>,
        pipeline: &mut ShaderPipeline<G>,
    ) {
        geometry.release(gpu);
        pipeline.release(gpu);
    }
}
