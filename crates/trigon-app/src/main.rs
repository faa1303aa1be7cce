use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use trigon_engine::coords::Color;
use trigon_engine::core::{Session, SessionConfig, SessionError, SessionReport, ShaderFailurePolicy, Variant};
use trigon_engine::device::{GpuInit, WgpuLoader};
use trigon_engine::logging::{init_logging, LogDiagnostics, LoggingConfig};
use trigon_engine::window::{WindowConfig, WinitDisplay};

/// Opens a window and draws one triangle until closed or Escape is pressed.
#[derive(Debug, Parser)]
#[command(name = "trigon", version, about)]
struct Args {
    /// Which triangle to draw.
    #[arg(long, value_enum, default_value_t = VariantArg::Plain)]
    variant: VariantArg,

    /// Present immediately instead of waiting for vertical refresh.
    #[arg(long)]
    no_vsync: bool,

    /// Close after this many frames.
    #[arg(long, value_name = "N")]
    frames: Option<u64>,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    #[arg(long, default_value = "trigon")]
    title: String,

    /// End the session on shader compile or link errors.
    #[arg(long)]
    strict_shaders: bool,

    /// Log filter, e.g. "debug" or "trigon=debug,wgpu_core=warn".
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum VariantArg {
    Plain,
    Gradient,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            window: WindowConfig {
                width: self.width,
                height: self.height,
                title: self.title.clone(),
            },
            swap_interval: if self.no_vsync { 0 } else { 1 },
            clear_color: Color::black(),
            shader_failure: if self.strict_shaders {
                ShaderFailurePolicy::Fatal
            } else {
                ShaderFailurePolicy::Continue
            },
            frame_limit: self.frames,
            variant: match self.variant {
                VariantArg::Plain => Variant::Plain,
                VariantArg::Gradient => Variant::Gradient,
            },
            ..SessionConfig::default()
        }
    }
}

fn run(args: &Args) -> anyhow::Result<SessionReport> {
    let config = args.session_config();
    let mut display = WinitDisplay::new();
    let mut loader = WgpuLoader::new(GpuInit::default());

    Session::run(&mut display, &mut loader, &config, &LogDiagnostics)
        .with_context(|| format!("{} triangle session failed", config.variant.name()))
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..LoggingConfig::default()
    });

    match run(&args) {
        Ok(report) => {
            log::debug!(
                "{} frames in {:?}, pipeline {}",
                report.frames,
                report.elapsed,
                report.pipeline_state
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            // The session already reported the failure through diagnostics.
            log::debug!("exiting: {err:#}");
            let code = err
                .downcast_ref::<SessionError>()
                .map_or(1, SessionError::exit_code);
            ExitCode::from(code)
        }
    }
}
