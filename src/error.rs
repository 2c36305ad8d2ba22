//! Error types for the session pipeline and the render loop.

use crate::work::ResourceKind;

/// A failure reported by the external skeletal-animation runtime.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct RuntimeFault(pub String);

impl RuntimeFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Result of a call into a runtime handle.
pub type RuntimeResult<T> = Result<T, RuntimeFault>;

/// Error type for session operations.
///
/// Pipeline variants abort the remaining stages and become the user-visible
/// error message. `RenderRuntime` is only ever logged; a bad frame is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No hardware-accelerated drawing context could be created
    #[error("browser does not support WebGL")]
    Capability,
    /// The runtime script failed to fetch or execute
    #[error("runtime load failed: {0}")]
    RuntimeLoad(String),
    /// A resource answered with a non-success HTTP status
    #[error("asset validation failed: {resource} request returned {status}")]
    AssetValidation { resource: ResourceKind, status: u16 },
    /// A resource could not be fetched at all
    #[error("asset validation failed: {resource} request failed: {reason}")]
    AssetFetch { resource: ResourceKind, reason: String },
    /// A resource was fetched but could not be parsed
    #[error("asset validation failed: {resource} could not be parsed: {reason}")]
    AssetParse { resource: ResourceKind, reason: String },
    /// The renderer or asset manager could not be constructed
    #[error("renderer initialization failed: {0}")]
    RendererInit(String),
    /// The asset manager did not report completion within the poll budget
    #[error("asset load timed out after {attempts} polls ({waited_ms} ms)")]
    Timeout { attempts: u32, waited_ms: u64 },
    /// Loaded data could not be turned into a skeleton
    #[error("skeleton build failed: {0}")]
    SkeletonBuild(String),
    /// An exception inside a single frame
    #[error("render error: {0}")]
    RenderRuntime(String),
    /// The pipeline was started without a work
    #[error("no animation work selected")]
    NoWorkSelected,
    /// The pipeline reached renderer setup without a drawing surface
    #[error("drawing surface is not attached")]
    NoSurface,
    /// An animation or skin selection could not be applied
    #[error("{0}")]
    Selection(String),
    /// A newer pipeline run replaced this one
    #[error("pipeline run {generation} was superseded")]
    Superseded { generation: u64 },
}

impl SessionError {
    /// Superseded runs stop silently and never touch session state.
    #[inline]
    pub fn is_superseded(&self) -> bool {
        matches!(self, SessionError::Superseded { .. })
    }

    /// HTTP status carried by an asset validation failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            SessionError::AssetValidation { status, .. } => Some(*status),
            _ => None,
        }
    }
}
