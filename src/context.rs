//! Runtime handles bound to the active animation work.

use std::rc::Rc;

use crate::runtime::{
    AnimationState, AssetManager, Bounds, DebugRenderer, SceneRenderer, Skeleton, SkeletonData, TimeSource,
    TransformMode,
};

/// Debug overlay mechanism, resolved once when the renderer is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugStrategy {
    /// The debug renderer draws the whole skeleton
    DebugRenderer,
    /// The scene renderer's embedded debug drawer
    Embedded,
    /// One line per bone, from its parent, through the debug renderer
    BoneLines,
}

impl DebugStrategy {
    /// Pick the first available mechanism.
    ///
    /// Like the overlay itself, every strategy requires a debug renderer to
    /// have been built.
    pub fn resolve(debug: Option<&dyn DebugRenderer>, renderer: &dyn SceneRenderer) -> Option<Self> {
        let debug = debug?;
        if debug.supports_draw_skeleton() {
            Some(DebugStrategy::DebugRenderer)
        } else if renderer.has_embedded_debug() {
            Some(DebugStrategy::Embedded)
        } else if debug.supports_lines() {
            Some(DebugStrategy::BoneLines)
        } else {
            None
        }
    }
}

/// Handles built during renderer setup, before any skeleton exists.
pub struct RendererBundle {
    pub renderer: Box<dyn SceneRenderer>,
    pub assets: Box<dyn AssetManager>,
    pub debug_renderer: Option<Box<dyn DebugRenderer>>,
    pub time_source: Option<Box<dyn TimeSource>>,
}

impl RendererBundle {
    /// Attach a built skeleton, producing the live context.
    pub fn into_context(self, skeleton: SkeletonParts, bounds: Bounds, transform_mode: TransformMode) -> RenderContext {
        let debug_strategy = DebugStrategy::resolve(self.debug_renderer.as_deref(), self.renderer.as_ref());
        RenderContext {
            renderer: self.renderer,
            debug_renderer: self.debug_renderer,
            debug_strategy,
            data: skeleton.data,
            skeleton: skeleton.skeleton,
            state: skeleton.state,
            bounds,
            time_source: self.time_source,
            transform_mode,
            last_frame: None,
        }
    }
}

/// Skeleton handles built from loaded data.
pub struct SkeletonParts {
    pub data: Rc<dyn SkeletonData>,
    pub skeleton: Box<dyn Skeleton>,
    pub state: Box<dyn AnimationState>,
}

/// The live set of runtime handles consumed by the render loop.
///
/// At most one exists per session. Its renderer is disposed before any
/// replacement is built.
pub struct RenderContext {
    pub renderer: Box<dyn SceneRenderer>,
    pub debug_renderer: Option<Box<dyn DebugRenderer>>,
    pub debug_strategy: Option<DebugStrategy>,
    pub data: Rc<dyn SkeletonData>,
    pub skeleton: Box<dyn Skeleton>,
    pub state: Box<dyn AnimationState>,
    /// Bounds computed at build time; the camera viewport follows them
    pub bounds: Bounds,
    pub time_source: Option<Box<dyn TimeSource>>,
    pub transform_mode: TransformMode,
    /// Wall-clock seconds of the previous frame, when no time source exists
    pub last_frame: Option<f64>,
}

impl RenderContext {
    /// Frame delta in seconds.
    ///
    /// Uses the time source when present, otherwise the wall clock, with
    /// `fallback` for the first frame.
    pub fn frame_delta(&mut self, now: f64, fallback: f32) -> f32 {
        if let Some(time) = self.time_source.as_mut() {
            time.update();
            return time.delta();
        }
        let delta = match self.last_frame {
            Some(previous) => (now - previous) as f32,
            None => fallback,
        };
        self.last_frame = Some(now);
        delta
    }

    /// Recompute the world transform, preferring the context's mode and
    /// falling back to a plain update on failure.
    pub fn update_world_transform(&mut self) {
        update_world_transform(self.skeleton.as_mut(), self.transform_mode);
    }
}

/// Physics-aware update with a plain fallback. A failing fallback is only
/// logged; the previous pose stays in place.
pub fn update_world_transform(skeleton: &mut dyn Skeleton, mode: TransformMode) {
    if mode == TransformMode::Physics {
        match skeleton.update_world_transform(TransformMode::Physics) {
            Ok(()) => return,
            Err(e) => log::debug!(target: "skelview", "physics update failed, using plain update: {e}"),
        }
    }
    if let Err(e) = skeleton.update_world_transform(TransformMode::Plain) {
        log::debug!(target: "skelview", "world transform update failed: {e}");
    }
}

/// Dispose a renderer, logging instead of failing.
///
/// Returns the failure message, if any, for the session log.
pub fn dispose_renderer(renderer: &mut dyn SceneRenderer) -> Option<String> {
    match renderer.dispose() {
        Ok(()) => None,
        Err(e) => {
            log::warn!(target: "skelview", "renderer cleanup failed: {e}");
            Some(e.to_string())
        }
    }
}
