//! Pipeline stages and the user-visible session state.

use crate::log_sink::LogSink;

/// Pipeline stage indicator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Nothing loaded yet
    Idle,
    /// Probing for an accelerated drawing context
    CapabilityCheck,
    /// Loading the runtime library
    RuntimeLoad,
    /// Fetching the work's resources
    AssetValidation,
    /// Building renderer, asset manager and optional helpers
    RendererInit,
    /// Waiting for the asset manager
    AssetLoad,
    /// Building the skeleton and selecting defaults
    SkeletonBuild,
    /// Rendering
    Ready,
    /// A stage failed
    Error,
}

impl Stage {
    /// Stages a successful run passes through, in order.
    pub const PIPELINE: [Stage; 7] = [
        Stage::CapabilityCheck,
        Stage::RuntimeLoad,
        Stage::AssetValidation,
        Stage::RendererInit,
        Stage::AssetLoad,
        Stage::SkeletonBuild,
        Stage::Ready,
    ];

    /// Label shown in the loading overlay.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Idle => "Initializing",
            Stage::CapabilityCheck => "Checking WebGL support",
            Stage::RuntimeLoad => "Loading runtime",
            Stage::AssetValidation => "Validating assets",
            Stage::RendererInit => "Initializing renderer",
            Stage::AssetLoad => "Loading animation assets",
            Stage::SkeletonBuild => "Building skeleton",
            Stage::Ready => "Ready",
            Stage::Error => "Error",
        }
    }

    /// Get pipeline progress percentage (0-100).
    ///
    /// `Error` reports 0; the stage that failed is in the log.
    pub fn progress_percent(self) -> u8 {
        match Self::PIPELINE.iter().position(|s| *s == self) {
            Some(i) => (((i + 1) as f32 / Self::PIPELINE.len() as f32) * 100.0) as u8,
            None => 0,
        }
    }

    /// Check if a run is in progress.
    #[inline]
    pub fn is_loading(self) -> bool {
        !matches!(self, Stage::Idle | Stage::Ready | Stage::Error)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// State read by the UI layer. One per session.
#[derive(Clone, Debug)]
pub struct SessionState {
    /// Current stage
    pub stage: Stage,
    /// Whether a run is in flight
    pub loading: bool,
    /// Message of the last fatal failure
    pub error: Option<String>,
    /// Recent diagnostic lines
    pub logs: LogSink,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(10)
    }
}

impl SessionState {
    pub fn new(log_capacity: usize) -> Self {
        Self {
            stage: Stage::Idle,
            loading: false,
            error: None,
            logs: LogSink::with_capacity(log_capacity),
        }
    }

    /// Reset for a new run.
    pub fn begin_run(&mut self) {
        self.stage = Stage::CapabilityCheck;
        self.loading = true;
        self.error = None;
        self.logs.clear();
    }

    /// Move to the next stage of a running pipeline.
    pub fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        self.loading = stage.is_loading();
    }

    /// Record a fatal failure and stop loading.
    pub fn fail(&mut self, message: String) {
        self.stage = Stage::Error;
        self.error = Some(message);
        self.loading = false;
    }

    /// Mark the run complete.
    pub fn finish(&mut self) {
        self.stage = Stage::Ready;
        self.loading = false;
    }
}
