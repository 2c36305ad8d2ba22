//! Interface to the external skeletal-animation runtime.
//!
//! The runtime is loaded at run time and its surface varies between
//! versions, so only the renderer / asset manager / skeleton chain is
//! mandatory. Everything else is probed once through [`Capabilities`] and
//! consulted by the stages that need it.

use std::any::Any;
use std::rc::Rc;

use crate::error::RuntimeResult;

/// 2D vector in runtime world units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

/// Axis-aligned visual bounds of a posed skeleton.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    /// Lower-left corner
    pub offset: Vec2,
    /// Width and height
    pub extent: Vec2,
}

impl Bounds {
    pub fn new(offset: Vec2, extent: Vec2) -> Self {
        Self { offset, extent }
    }

    /// Center point, used to aim the camera.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.offset.x + self.extent.x / 2.0, self.offset.y + self.extent.y / 2.0)
    }
}

/// A line from a bone's parent to the bone, in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneSegment {
    pub from: Vec2,
    pub to: Vec2,
}

/// Runtime facilities probed after load, in report order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Facility {
    SceneRenderer,
    AssetManager,
    AtlasAttachmentLoader,
    SkeletonJson,
    Skeleton,
    AnimationState,
    AnimationStateData,
    TimeKeeper,
    Vector2,
    Vector3,
    Physics,
    SkeletonDebugRenderer,
    ShapeRenderer,
}

impl Facility {
    pub const ALL: [Facility; 13] = [
        Facility::SceneRenderer,
        Facility::AssetManager,
        Facility::AtlasAttachmentLoader,
        Facility::SkeletonJson,
        Facility::Skeleton,
        Facility::AnimationState,
        Facility::AnimationStateData,
        Facility::TimeKeeper,
        Facility::Vector2,
        Facility::Vector3,
        Facility::Physics,
        Facility::SkeletonDebugRenderer,
        Facility::ShapeRenderer,
    ];

    /// Name of the facility as exported by the runtime.
    pub fn name(self) -> &'static str {
        match self {
            Facility::SceneRenderer => "SceneRenderer",
            Facility::AssetManager => "AssetManager",
            Facility::AtlasAttachmentLoader => "AtlasAttachmentLoader",
            Facility::SkeletonJson => "SkeletonJson",
            Facility::Skeleton => "Skeleton",
            Facility::AnimationState => "AnimationState",
            Facility::AnimationStateData => "AnimationStateData",
            Facility::TimeKeeper => "TimeKeeper",
            Facility::Vector2 => "Vector2",
            Facility::Vector3 => "Vector3",
            Facility::Physics => "Physics",
            Facility::SkeletonDebugRenderer => "SkeletonDebugRenderer",
            Facility::ShapeRenderer => "ShapeRenderer",
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Which debug renderer variant the runtime can build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugRendererKind {
    /// Full skeleton debug renderer
    Skeleton,
    /// Plain shape renderer, only able to draw lines
    Shape,
}

/// How the skeleton's world transform is recomputed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformMode {
    /// Physics-aware update
    Physics,
    /// Plain update
    Plain,
}

/// Outcome of a structured skin lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkinLookup {
    Applied,
    NotFound,
}

/// Capability descriptor resolved once after the runtime loads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    present: [bool; 13],
}

impl Capabilities {
    /// Probe every facility on a loaded runtime.
    pub fn probe<R: SkeletalRuntime + ?Sized>(runtime: &R) -> Self {
        Self::from_fn(|facility| runtime.has(facility))
    }

    /// Build a descriptor from a presence predicate.
    pub fn from_fn(mut has: impl FnMut(Facility) -> bool) -> Self {
        let mut present = [false; 13];
        for facility in Facility::ALL {
            present[facility.index()] = has(facility);
        }
        Self { present }
    }

    #[inline]
    pub fn has(&self, facility: Facility) -> bool {
        self.present[facility.index()]
    }

    /// Number of facilities present.
    pub fn present_count(&self) -> usize {
        self.present.iter().filter(|p| **p).count()
    }

    /// Preferred debug renderer, if the runtime has one.
    pub fn debug_renderer(&self) -> Option<DebugRendererKind> {
        if self.has(Facility::SkeletonDebugRenderer) {
            Some(DebugRendererKind::Skeleton)
        } else if self.has(Facility::ShapeRenderer) {
            Some(DebugRendererKind::Shape)
        } else {
            None
        }
    }

    #[inline]
    pub fn time_source(&self) -> bool {
        self.has(Facility::TimeKeeper)
    }

    #[inline]
    pub fn physics(&self) -> bool {
        self.has(Facility::Physics)
    }

    /// Bounds are computed into runtime vectors; without them a fixed
    /// extent is used.
    #[inline]
    pub fn bounds_helper(&self) -> bool {
        self.has(Facility::Vector2)
    }

    /// Preferred world transform update.
    pub fn transform_mode(&self) -> TransformMode {
        if self.physics() {
            TransformMode::Physics
        } else {
            TransformMode::Plain
        }
    }

    /// Present/absent markers, one line per facility.
    pub fn report(&self) -> Vec<String> {
        Facility::ALL
            .iter()
            .map(|f| {
                let marker = if self.has(*f) { '✓' } else { '✗' };
                format!("{marker} {}", f.name())
            })
            .collect()
    }
}

/// Drawing surface the renderer is bound to (a canvas in the browser).
pub trait DrawingSurface {
    /// Size of the surface's layout box in CSS pixels.
    fn layout_size(&self) -> (f64, f64);

    /// Set the backing pixel dimensions.
    fn set_backing_size(&self, width: u32, height: u32);

    /// Apply the visual pan/zoom transform (CSS `transform` syntax).
    fn apply_transform(&self, css: &str);
}

/// The loaded runtime. Constructs every handle the session owns.
///
/// No `Send` bounds: the runtime lives on the single UI thread.
pub trait SkeletalRuntime {
    type Surface: DrawingSurface;

    /// Check whether a facility is exported.
    fn has(&self, facility: Facility) -> bool;

    fn create_renderer(&self, surface: &Self::Surface) -> RuntimeResult<Box<dyn SceneRenderer>>;

    fn create_asset_manager(&self, surface: &Self::Surface) -> RuntimeResult<Box<dyn AssetManager>>;

    fn create_debug_renderer(
        &self,
        kind: DebugRendererKind,
        surface: &Self::Surface,
    ) -> RuntimeResult<Box<dyn DebugRenderer>>;

    fn create_time_source(&self) -> RuntimeResult<Box<dyn TimeSource>>;

    /// Resolve a loaded atlas/description pair into skeleton data.
    fn read_skeleton_data(
        &self,
        assets: &dyn AssetManager,
        atlas_path: &str,
        json_path: &str,
    ) -> RuntimeResult<Rc<dyn SkeletonData>>;

    fn create_skeleton(&self, data: &Rc<dyn SkeletonData>) -> RuntimeResult<Box<dyn Skeleton>>;

    fn create_animation_state(&self, data: &Rc<dyn SkeletonData>) -> RuntimeResult<Box<dyn AnimationState>>;
}

/// Renderer bound to a drawing surface and its graphics context.
pub trait SceneRenderer {
    /// Aim the camera. Returns `false` when the renderer has no camera.
    fn center_camera(&mut self, position: Vec2) -> bool;

    /// Size the camera viewport. Returns `false` when there is no camera.
    fn set_viewport(&mut self, size: Vec2) -> bool;

    /// Resize affordance; renderers without one do nothing.
    fn resize(&mut self) -> RuntimeResult<()> {
        Ok(())
    }

    /// Clear the frame buffer to the given RGBA color.
    fn clear(&mut self, rgba: [f32; 4]) -> RuntimeResult<()>;

    /// Enable source-alpha / one-minus-source-alpha blending.
    fn enable_alpha_blend(&mut self) -> RuntimeResult<()>;

    fn begin(&mut self) -> RuntimeResult<()>;

    fn draw_skeleton(&mut self, skeleton: &dyn Skeleton, premultiplied_alpha: bool) -> RuntimeResult<()>;

    fn end(&mut self) -> RuntimeResult<()>;

    /// Whether the renderer carries its own debug drawing facility.
    fn has_embedded_debug(&self) -> bool {
        false
    }

    /// Turn mesh hull and triangle drawing on or off for the embedded debug drawer.
    fn set_embedded_debug_meshes(&mut self, _enabled: bool) {}

    fn draw_embedded_debug(&mut self, _skeleton: &dyn Skeleton) -> RuntimeResult<()> {
        Ok(())
    }

    /// Release GPU resources.
    fn dispose(&mut self) -> RuntimeResult<()>;
}

/// Loads texture atlases and skeleton descriptions.
pub trait AssetManager {
    fn load_texture_atlas(&mut self, path: &str);

    fn load_json(&mut self, path: &str);

    fn is_loading_complete(&self) -> bool;

    /// Concrete handle, for the runtime that built it.
    fn as_any(&self) -> &dyn Any;
}

/// Immutable skeleton data shared by the skeleton and animation state.
pub trait SkeletonData {
    fn bone_count(&self) -> usize;

    /// Animation names in declaration order.
    fn animation_names(&self) -> Vec<String>;

    /// Skin names in declaration order. `None` marks an unnamed skin.
    fn skin_names(&self) -> RuntimeResult<Vec<Option<String>>>;

    /// Whether skins can be looked up as structured objects.
    fn supports_skin_lookup(&self) -> bool;

    fn as_any(&self) -> &dyn Any;
}

/// A posable skeleton instance.
pub trait Skeleton {
    fn set_to_setup_pose(&mut self);

    fn set_slots_to_setup_pose(&mut self);

    fn update_world_transform(&mut self, mode: TransformMode) -> RuntimeResult<()>;

    /// Compute visual bounds. Only called when the bounds helper exists.
    fn bounds(&self) -> RuntimeResult<Bounds>;

    /// Look up a skin in the skeleton's data and apply it.
    fn find_and_set_skin(&mut self, name: &str) -> RuntimeResult<SkinLookup>;

    /// Apply a skin by name without structured lookup.
    fn set_skin_by_name(&mut self, name: &str) -> RuntimeResult<()>;

    /// Parent-to-child segments for every bone that has a parent.
    fn bone_segments(&self) -> Vec<BoneSegment>;

    fn as_any(&self) -> &dyn Any;
}

/// Mixes animations and applies them to a skeleton.
pub trait AnimationState {
    fn set_animation(&mut self, track: usize, name: &str, looping: bool) -> RuntimeResult<()>;

    fn update(&mut self, delta: f32);

    fn apply(&mut self, skeleton: &mut dyn Skeleton) -> RuntimeResult<()>;
}

/// Optional overlay renderer.
pub trait DebugRenderer {
    fn supports_draw_skeleton(&self) -> bool;

    fn draw_skeleton(&mut self, skeleton: &dyn Skeleton) -> RuntimeResult<()>;

    fn supports_lines(&self) -> bool;

    fn line(&mut self, from: Vec2, to: Vec2, color: u32) -> RuntimeResult<()>;
}

/// High-resolution frame timer.
pub trait TimeSource {
    fn update(&mut self);

    /// Seconds elapsed between the last two updates.
    fn delta(&self) -> f32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_order_and_markers() {
        let caps = Capabilities::from_fn(|f| f != Facility::Physics);
        let report = caps.report();
        assert_eq!(report.len(), 13);
        assert_eq!(report[0], "✓ SceneRenderer");
        assert_eq!(report[10], "✗ Physics");
        assert_eq!(caps.present_count(), 12);
    }

    #[test]
    fn test_debug_renderer_preference() {
        let all = Capabilities::from_fn(|_| true);
        assert_eq!(all.debug_renderer(), Some(DebugRendererKind::Skeleton));

        let shape_only = Capabilities::from_fn(|f| f != Facility::SkeletonDebugRenderer);
        assert_eq!(shape_only.debug_renderer(), Some(DebugRendererKind::Shape));

        let none = Capabilities::from_fn(|f| {
            f != Facility::SkeletonDebugRenderer && f != Facility::ShapeRenderer
        });
        assert_eq!(none.debug_renderer(), None);
    }

    #[test]
    fn test_transform_mode() {
        assert_eq!(Capabilities::from_fn(|_| true).transform_mode(), TransformMode::Physics);
        assert_eq!(Capabilities::default().transform_mode(), TransformMode::Plain);
        assert!(!Capabilities::default().bounds_helper());
    }

    #[test]
    fn test_bounds_center() {
        let bounds = Bounds::new(Vec2::new(-100.0, 0.0), Vec2::new(200.0, 300.0));
        assert_eq!(bounds.center(), Vec2::new(0.0, 150.0));
    }
}
