//! # skelview-core
//!
//! Session controller for previewing 2D skeletal animation assets.
//!
//! This crate provides platform-agnostic logic for:
//! - Loading a skeletal-animation runtime once and probing what it offers
//! - Validating and loading a work's atlas, skeleton description and texture
//! - Building a render context and driving a per-frame render loop
//! - Zoom, pan and drag of the drawing surface
//! - Switching animations and skins on the live skeleton
//!
//! The runtime and the platform are reached through the [`SkeletalRuntime`]
//! and [`Host`] traits; the `web` feature provides browser implementations.
//!
//! ## Features
//!
//! - `serde` - Enable serialization/deserialization for config and works
//! - `toml` - Parse `SessionConfig` from `session.toml`
//! - `web` - Enable the browser binding (canvas, WebGL, script-loaded runtime)
//!
//! ## Example
//!
//! ```rust,ignore
//! use skelview_core::{AnimationWork, Session, SessionConfig};
//!
//! let session = Session::new(host, SessionConfig::default());
//! session.attach_surface(surface);
//!
//! let work = AnimationWork::new(
//!     "pinkbunny",
//!     "Pink Bunny",
//!     "/assets/pinkbunny/pinkbunny.atlas",
//!     "/assets/pinkbunny/pinkbunny.json",
//!     "/assets/pinkbunny/pinkbunny.png",
//! );
//! session.select_work(work).await?;
//!
//! session.select_animation("hop")?;
//! session.wheel(-120.0);
//! ```

mod animation;
mod config;
mod context;
mod error;
mod host;
mod log_sink;
mod render_loop;
pub mod runtime;
mod runtime_loader;
mod session;
mod stage;
mod validator;
mod view;
mod work;

#[cfg(feature = "web")]
pub mod web;

#[cfg(test)]
mod testing;

pub use animation::{AnimationCatalog, PlaybackSettings, DEFAULT_SKIN, MAX_SPEED, MIN_SPEED};
pub use config::{SessionConfig, DEFAULT_RUNTIME_URL};
pub use context::{DebugStrategy, RenderContext};
pub use error::{RuntimeFault, RuntimeResult, SessionError};
pub use host::{FetchResponse, Host, HostResult};
pub use log_sink::LogSink;
pub use render_loop::{FrameOutcome, FrameSettings};
pub use runtime::{Capabilities, DrawingSurface, Facility, SkeletalRuntime};
pub use runtime_loader::{LoadedRuntime, RuntimeLoader};
pub use session::Session;
pub use stage::Stage;
pub use validator::{validate_assets, DescriptionSummary};
pub use view::{backing_size, ViewController, ViewLimits, ViewState, ViewTransform, PRIMARY_BUTTON};
pub use work::{is_remote, AnimationWork, ResourceKind};

#[cfg(feature = "web")]
pub use web::SkeletonViewer;
