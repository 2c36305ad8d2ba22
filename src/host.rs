//! Host environment abstraction.
//!
//! The session never touches the network, timers or the display directly.
//! Implement [`Host`] for your platform (the `web` feature ships one for
//! browsers); tests use an in-memory host.

use std::future::Future;
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::runtime::{DrawingSurface, SkeletalRuntime};

/// Result type for host I/O. Errors are the platform's message.
pub type HostResult<T> = Result<T, String>;

/// A completed HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body decoded as text
    pub body: String,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// `true` for 2xx statuses.
    #[inline]
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Platform services used by the session.
///
/// No `Send` bounds: works in single-threaded WASM contexts.
pub trait Host {
    type Surface: DrawingSurface;
    type Runtime: SkeletalRuntime<Surface = Self::Surface>;

    /// Probe for a hardware-accelerated drawing context.
    fn accelerated_context_available(&self) -> bool;

    /// Load the runtime. The future must own everything it needs so the
    /// runtime loader can share one in-flight load between requesters.
    fn load_runtime(&self) -> LocalBoxFuture<'static, HostResult<Rc<Self::Runtime>>>;

    /// Fetch a resource.
    fn fetch(&self, url: &str) -> impl Future<Output = HostResult<FetchResponse>>;

    /// Suspend for `ms` milliseconds.
    fn sleep(&self, ms: u32) -> impl Future<Output = ()>;

    /// Wall-clock time in seconds.
    fn now_seconds(&self) -> f64;

    /// Human-readable local time for log entries.
    fn clock_label(&self) -> String;

    /// Install `tick` as a callback paced to the display refresh, rescheduled
    /// forever after each call.
    fn start_frame_loop(&self, tick: Box<dyn FnMut()>);
}
