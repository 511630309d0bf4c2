use std::path::PathBuf;

use thiserror::Error;

/// Crate-level error taxonomy.
///
/// Every variant is unrecoverable by design: errors propagate to the top of
/// startup (or the render-target resize step) and terminate the event loop.
#[derive(Debug, Error)]
pub enum Error {
    /// Window, surface, adapter or device setup failed.
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// A caller passed a value outside the documented domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A mesh, shader or audio file is missing or malformed.
    #[error("failed to load asset {path:?}: {detail}")]
    AssetLoad { path: PathBuf, detail: String },

    /// WGSL parse or validation failure, carrying the rendered diagnostic.
    #[error("shader compilation failed:\n{log}")]
    ShaderCompile { log: String },

    /// Stage kinds or the vertex/fragment interface did not line up.
    #[error("shader linking failed: {log}")]
    ShaderLink { log: String },

    /// An image file could not be decoded.
    #[error("failed to load texture {path:?}: {detail}")]
    TextureLoad { path: PathBuf, detail: String },

    /// An off-screen render target could not be created at the requested size.
    #[error("render target incomplete: {detail}")]
    FramebufferIncomplete { detail: String },
}
