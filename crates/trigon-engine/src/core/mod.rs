//! The render session: configuration, error taxonomy and the lifecycle that
//! ties display, loader, geometry and shader pipeline together.

mod config;
mod error;
mod session;

pub use config::{SessionConfig, ShaderFailurePolicy, Variant};
pub use error::SessionError;
pub use session::{Session, SessionReport};
