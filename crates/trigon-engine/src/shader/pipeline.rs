use std::fmt;

use crate::device::{GpuDevice, Topology};
use crate::geometry::VertexLayout;
use crate::logging::Diagnostics;

use super::{DiagnosticLog, ShaderSources, ShaderStage};

/// Lifecycle of one shader program.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PipelineState {
    Uninitialized,
    Compiling(ShaderStage),
    Compiled(ShaderStage),
    CompileFailed(ShaderStage),
    Linking,
    Linked,
    LinkFailed,
    /// Bound for subsequent draws.
    Active,
    /// Terminal.
    Released,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("uninitialized"),
            Self::Compiling(stage) => write!(f, "compiling {stage}"),
            Self::Compiled(stage) => write!(f, "{stage} compiled"),
            Self::CompileFailed(stage) => write!(f, "{stage} compile failed"),
            Self::Linking => f.write_str("linking"),
            Self::Linked => f.write_str("linked"),
            Self::LinkFailed => f.write_str("link failed"),
            Self::Active => f.write_str("active"),
            Self::Released => f.write_str("released"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum StageStatus {
    Compiled,
    CompileFailed(DiagnosticLog),
}

/// A shader object waiting to be linked.
///
/// Consumed by `ShaderPipeline::link`, which releases it whatever the outcome.
#[derive(Debug)]
pub struct CompiledStage<S> {
    pub stage: ShaderStage,
    pub status: StageStatus,
    handle: S,
}

impl<S> CompiledStage<S> {
    pub fn is_compiled(&self) -> bool {
        self.status == StageStatus::Compiled
    }

    pub fn handle(&self) -> &S {
        &self.handle
    }
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ShaderError {
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: DiagnosticLog },

    #[error("shader program failed to link:\n{log}")]
    Link { log: DiagnosticLog },

    #[error("{0} stage is not compiled; link skipped")]
    NotCompiled(ShaderStage),

    #[error("expected a {expected} stage, got {found}")]
    WrongStage {
        expected: ShaderStage,
        found: ShaderStage,
    },

    #[error("operation not allowed while the pipeline is {0}")]
    InvalidState(PipelineState),
}

/// Compiles, links, binds and releases one program.
///
/// Failures are reported to the diagnostics sink and remembered; a failed
/// pipeline can still be "activated", which binds no program so draws
/// produce no fragments.
pub struct ShaderPipeline<G: GpuDevice> {
    state: PipelineState,
    program: Option<G::Program>,
    failures: Vec<ShaderError>,
}

impl<G: GpuDevice> Default for ShaderPipeline<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: GpuDevice> ShaderPipeline<G> {
    pub fn new() -> Self {
        Self {
            state: PipelineState::Uninitialized,
            program: None,
            failures: Vec::new(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// First failure recorded, if any.
    pub fn failure(&self) -> Option<&ShaderError> {
        self.failures.first()
    }

    pub fn program(&self) -> Option<&G::Program> {
        self.program.as_ref()
    }

    /// Compiles one stage. A failure here does not stop the other stage from
    /// being compiled; it only prevents the link.
    ///
    /// Refused once the program was linked, failed to link or was released.
    pub fn compile(
        &mut self,
        gpu: &mut G,
        stage: ShaderStage,
        source: &str,
        diagnostics: &dyn Diagnostics,
    ) -> Result<CompiledStage<G::Shader>, ShaderError> {
        if !matches!(
            self.state,
            PipelineState::Uninitialized
                | PipelineState::Compiling(_)
                | PipelineState::Compiled(_)
                | PipelineState::CompileFailed(_)
        ) {
            return Err(ShaderError::InvalidState(self.state));
        }

        self.transition(PipelineState::Compiling(stage));
        let outcome = gpu.compile_shader(stage, source);

        let status = match outcome.log {
            None => {
                self.transition(PipelineState::Compiled(stage));
                StageStatus::Compiled
            }
            Some(raw) => {
                let log = DiagnosticLog::capture(&raw);
                let err = ShaderError::Compile {
                    stage,
                    log: log.clone(),
                };
                diagnostics.error(&err.to_string());
                self.failures.push(err);
                self.transition(PipelineState::CompileFailed(stage));
                StageStatus::CompileFailed(log)
            }
        };

        Ok(CompiledStage {
            stage,
            status,
            handle: outcome.handle,
        })
    }

    /// Links two stages into the program and releases both stage objects.
    ///
    /// The GPU link is never issued unless both stages compiled.
    pub fn link(
        &mut self,
        gpu: &mut G,
        vertex: CompiledStage<G::Shader>,
        fragment: CompiledStage<G::Shader>,
        layout: &VertexLayout,
        topology: Topology,
        diagnostics: &dyn Diagnostics,
    ) -> Result<(), ShaderError> {
        let result = self.try_link(gpu, &vertex, &fragment, layout, topology, diagnostics);

        gpu.delete_shader(vertex.handle);
        gpu.delete_shader(fragment.handle);
        log::trace!("shader stages released after link attempt");

        result
    }

    fn try_link(
        &mut self,
        gpu: &mut G,
        vertex: &CompiledStage<G::Shader>,
        fragment: &CompiledStage<G::Shader>,
        layout: &VertexLayout,
        topology: Topology,
        diagnostics: &dyn Diagnostics,
    ) -> Result<(), ShaderError> {
        if self.program.is_some()
            || !matches!(
                self.state,
                PipelineState::Compiled(_) | PipelineState::CompileFailed(_)
            )
        {
            return Err(ShaderError::InvalidState(self.state));
        }
        for (stage, expected) in [
            (vertex, ShaderStage::Vertex),
            (fragment, ShaderStage::Fragment),
        ] {
            if stage.stage != expected {
                return Err(ShaderError::WrongStage {
                    expected,
                    found: stage.stage,
                });
            }
        }
        if let Some(failed) = [vertex, fragment].into_iter().find(|s| !s.is_compiled()) {
            self.transition(PipelineState::CompileFailed(failed.stage));
            return Err(ShaderError::NotCompiled(failed.stage));
        }

        self.transition(PipelineState::Linking);
        let outcome = gpu.link_program(&vertex.handle, &fragment.handle, layout, topology);

        match outcome.log {
            None => {
                self.program = Some(outcome.handle);
                self.transition(PipelineState::Linked);
                Ok(())
            }
            Some(raw) => {
                gpu.delete_program(outcome.handle);
                let err = ShaderError::Link {
                    log: DiagnosticLog::capture(&raw),
                };
                diagnostics.error(&err.to_string());
                self.failures.push(err.clone());
                self.transition(PipelineState::LinkFailed);
                Err(err)
            }
        }
    }

    /// Compiles both stages of `sources` and links them.
    ///
    /// Returns the first failure: a compile error takes precedence over the
    /// skipped link it caused.
    pub fn build(
        &mut self,
        gpu: &mut G,
        sources: &ShaderSources,
        layout: &VertexLayout,
        topology: Topology,
        diagnostics: &dyn Diagnostics,
    ) -> Result<(), ShaderError> {
        let vertex = self.compile(gpu, ShaderStage::Vertex, &sources.vertex, diagnostics)?;
        let fragment =
            match self.compile(gpu, ShaderStage::Fragment, &sources.fragment, diagnostics) {
                Ok(fragment) => fragment,
                Err(err) => {
                    gpu.delete_shader(vertex.handle);
                    return Err(err);
                }
            };

        self.link(gpu, vertex, fragment, layout, topology, diagnostics)
            .map_err(|err| self.failures.first().cloned().unwrap_or(err))
    }

    /// Binds the program for subsequent draws.
    ///
    /// After a compile or link failure the null program is bound instead.
    pub fn activate(&mut self, gpu: &mut G) -> Result<(), ShaderError> {
        match self.state {
            PipelineState::Linked | PipelineState::Active => {
                gpu.use_program(self.program.as_ref());
                if self.state == PipelineState::Linked {
                    self.transition(PipelineState::Active);
                }
                Ok(())
            }
            PipelineState::CompileFailed(_) | PipelineState::LinkFailed => {
                gpu.use_program(None);
                Ok(())
            }
            other => Err(ShaderError::InvalidState(other)),
        }
    }

    /// Deletes the program. Terminal: every later call is refused.
    pub fn release(&mut self, gpu: &mut G) {
        if self.state == PipelineState::Released {
            log::warn!("shader pipeline released twice");
            return;
        }
        if let Some(program) = self.program.take() {
            if self.state == PipelineState::Active {
                gpu.use_program(None);
            }
            gpu.delete_program(program);
        }
        self.transition(PipelineState::Released);
    }

    fn transition(&mut self, next: PipelineState) {
        log::debug!("shader pipeline: {} -> {}", self.state, next);
        self.state = next;
    }
}

impl<G: GpuDevice> Drop for ShaderPipeline<G> {
    fn drop(&mut self) {
        if self.program.is_some() {
            log::warn!("shader program dropped without release; freed with the GPU context");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ColorVertex, PositionVertex, Vertex};
    use crate::logging::RecordingDiagnostics;
    use crate::mock::{Call, CallTrace, MockDevice};

    const BROKEN_FRAGMENT: &str = "@fragment\nfn fs_main() -> @location(0) vec4<f32> {\n    return vec4<f32>(1.0, 0.5, 0.2 1.0);\n}\n";

    fn setup() -> (CallTrace, MockDevice, RecordingDiagnostics) {
        let trace = CallTrace::default();
        let gpu = MockDevice::new(trace.clone());
        (trace, gpu, RecordingDiagnostics::new())
    }

    #[test]
    fn valid_sources_reach_linked_then_active() {
        let (_, mut gpu, diag) = setup();
        let mut pipeline = ShaderPipeline::new();

        pipeline
            .build(
                &mut gpu,
                &ShaderSources::plain(),
                &PositionVertex::layout(),
                Topology::TriangleList,
                &diag,
            )
            .unwrap();
        assert_eq!(pipeline.state(), PipelineState::Linked);

        pipeline.activate(&mut gpu).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Active);
        assert!(diag.errors().is_empty());

        pipeline.release(&mut gpu);
        assert_eq!(pipeline.state(), PipelineState::Released);
        assert_eq!(gpu.live_objects(), 0);
    }

    #[test]
    fn valid_stage_compiles_and_invalid_stage_fails_with_log() {
        let (_, mut gpu, diag) = setup();
        let mut pipeline = ShaderPipeline::new();

        let ok = pipeline
            .compile(&mut gpu, ShaderStage::Vertex, &ShaderSources::plain().vertex, &diag)
            .unwrap();
        assert!(ok.is_compiled());
        assert_eq!(pipeline.state(), PipelineState::Compiled(ShaderStage::Vertex));

        let bad = pipeline
            .compile(&mut gpu, ShaderStage::Fragment, BROKEN_FRAGMENT, &diag)
            .unwrap();
        assert_eq!(pipeline.state(), PipelineState::CompileFailed(ShaderStage::Fragment));
        match &bad.status {
            StageStatus::CompileFailed(log) => assert!(!log.as_str().trim().is_empty()),
            StageStatus::Compiled => panic!("broken source compiled"),
        }
        assert_eq!(diag.errors().len(), 1);

        gpu.delete_shader(ok.handle);
        gpu.delete_shader(bad.handle);
    }

    #[test]
    fn failed_stage_skips_link_and_releases_both_stages() {
        let (trace, mut gpu, diag) = setup();
        let mut pipeline = ShaderPipeline::new();
        let sources = ShaderSources::new(ShaderSources::plain().vertex, BROKEN_FRAGMENT);

        let err = pipeline
            .build(
                &mut gpu,
                &sources,
                &PositionVertex::layout(),
                Topology::TriangleList,
                &diag,
            )
            .unwrap_err();

        assert!(matches!(
            err,
            ShaderError::Compile {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
        assert_eq!(pipeline.state(), PipelineState::CompileFailed(ShaderStage::Fragment));
        assert_eq!(trace.count(|c| matches!(c, Call::LinkProgram { .. })), 0);
        assert_eq!(trace.count(|c| matches!(c, Call::DeleteShader(_))), 2);
        assert_eq!(gpu.live_objects(), 0);
    }

    #[test]
    fn vertex_failure_still_compiles_fragment() {
        let (trace, mut gpu, diag) = setup();
        let mut pipeline = ShaderPipeline::new();
        let sources = ShaderSources::new("@vertex fn vs_main(", ShaderSources::plain().fragment);

        let err = pipeline
            .build(
                &mut gpu,
                &sources,
                &PositionVertex::layout(),
                Topology::TriangleList,
                &diag,
            )
            .unwrap_err();

        assert!(matches!(
            err,
            ShaderError::Compile {
                stage: ShaderStage::Vertex,
                ..
            }
        ));
        assert_eq!(
            trace.count(|c| matches!(
                c,
                Call::CompileShader {
                    stage: ShaderStage::Fragment,
                    ok: true,
                    ..
                }
            )),
            1
        );
        assert_eq!(pipeline.state(), PipelineState::CompileFailed(ShaderStage::Vertex));
    }

    #[test]
    fn interface_mismatch_fails_link_and_reports_log() {
        let (trace, mut gpu, diag) = setup();
        let mut pipeline = ShaderPipeline::new();
        let sources = ShaderSources::new(
            ShaderSources::plain().vertex,
            ShaderSources::gradient().fragment,
        );

        let err = pipeline
            .build(
                &mut gpu,
                &sources,
                &PositionVertex::layout(),
                Topology::TriangleList,
                &diag,
            )
            .unwrap_err();

        assert!(matches!(err, ShaderError::Link { .. }));
        assert_eq!(pipeline.state(), PipelineState::LinkFailed);
        assert!(pipeline.program().is_none());
        assert_eq!(trace.count(|c| matches!(c, Call::DeleteProgram(_))), 1);
        assert_eq!(trace.count(|c| matches!(c, Call::DeleteShader(_))), 2);
        assert!(diag.errors()[0].contains("failed to link"));
        assert_eq!(gpu.live_objects(), 0);
    }

    #[test]
    fn failed_pipeline_activates_null_program() {
        let (trace, mut gpu, diag) = setup();
        let mut pipeline = ShaderPipeline::new();
        let sources = ShaderSources::new(ShaderSources::plain().vertex, BROKEN_FRAGMENT);
        let _ = pipeline.build(
            &mut gpu,
            &sources,
            &PositionVertex::layout(),
            Topology::TriangleList,
            &diag,
        );

        pipeline.activate(&mut gpu).unwrap();
        assert_eq!(trace.calls().last(), Some(&Call::UseProgram(None)));
    }

    #[test]
    fn activate_before_link_is_refused() {
        let (_, mut gpu, _) = setup();
        let mut pipeline = ShaderPipeline::<MockDevice>::new();
        assert_eq!(
            pipeline.activate(&mut gpu),
            Err(ShaderError::InvalidState(PipelineState::Uninitialized))
        );
    }

    #[test]
    fn released_program_is_never_used_again() {
        let (trace, mut gpu, diag) = setup();
        let mut pipeline = ShaderPipeline::new();
        pipeline
            .build(
                &mut gpu,
                &ShaderSources::gradient(),
                &ColorVertex::layout(),
                Topology::TriangleList,
                &diag,
            )
            .unwrap();
        pipeline.activate(&mut gpu).unwrap();
        pipeline.release(&mut gpu);

        assert_eq!(
            pipeline.activate(&mut gpu),
            Err(ShaderError::InvalidState(PipelineState::Released))
        );
        pipeline.release(&mut gpu);

        let calls = trace.calls();
        let deleted = trace.position(|c| matches!(c, Call::DeleteProgram(_))).unwrap();
        assert_eq!(trace.count(|c| matches!(c, Call::DeleteProgram(_))), 1);
        assert!(calls[deleted..]
            .iter()
            .all(|c| !matches!(c, Call::UseProgram(Some(_)))));
    }

    #[test]
    fn compile_after_release_is_refused() {
        let (trace, mut gpu, diag) = setup();
        let mut pipeline = ShaderPipeline::new();
        pipeline
            .build(
                &mut gpu,
                &ShaderSources::plain(),
                &PositionVertex::layout(),
                Topology::TriangleList,
                &diag,
            )
            .unwrap();
        pipeline.release(&mut gpu);
        let compiles = trace.count(|c| matches!(c, Call::CompileShader { .. }));

        let refused = pipeline.compile(
            &mut gpu,
            ShaderStage::Vertex,
            &ShaderSources::plain().vertex,
            &diag,
        );

        assert!(matches!(
            refused,
            Err(ShaderError::InvalidState(PipelineState::Released))
        ));
        assert_eq!(pipeline.state(), PipelineState::Released);
        assert_eq!(trace.count(|c| matches!(c, Call::CompileShader { .. })), compiles);
    }

    #[test]
    fn rebuild_while_active_keeps_a_single_program() {
        let (trace, mut gpu, diag) = setup();
        let mut pipeline = ShaderPipeline::new();
        let layout = PositionVertex::layout();
        pipeline
            .build(&mut gpu, &ShaderSources::plain(), &layout, Topology::TriangleList, &diag)
            .unwrap();
        pipeline.activate(&mut gpu).unwrap();

        let again =
            pipeline.build(&mut gpu, &ShaderSources::plain(), &layout, Topology::TriangleList, &diag);
        assert_eq!(again, Err(ShaderError::InvalidState(PipelineState::Active)));
        assert_eq!(pipeline.state(), PipelineState::Active);

        pipeline.release(&mut gpu);
        assert_eq!(trace.count(|c| matches!(c, Call::LinkProgram { .. })), 1);
        assert_eq!(trace.count(|c| matches!(c, Call::DeleteProgram(_))), 1);
        assert_eq!(gpu.live_objects(), 0);
    }
}
