//! Runtime handles over the `window.spine` object.

use std::any::Any;
use std::rc::Rc;

use js_sys::Array;
use wasm_bindgen::JsValue;

use super::{call, construct, has_method, member, number, set, CanvasSurface};
use crate::error::{RuntimeFault, RuntimeResult};
use crate::runtime::{
    AnimationState, AssetManager, BoneSegment, Bounds, DebugRenderer, DebugRendererKind, Facility, SceneRenderer,
    SkeletalRuntime, Skeleton, SkeletonData, SkinLookup, TimeSource, TransformMode, Vec2,
};

// WebGL enums
const COLOR_BUFFER_BIT: u32 = 0x4000;
const BLEND: u32 = 0x0BE2;
const SRC_ALPHA: u32 = 0x0302;
const ONE_MINUS_SRC_ALPHA: u32 = 0x0303;

/// The script-loaded spine-webgl runtime.
pub struct JsRuntime {
    spine: JsValue,
}

impl JsRuntime {
    /// `window.spine`, once the runtime script has executed.
    pub fn from_window() -> Option<Self> {
        let window = web_sys::window()?;
        member(&window, "spine").map(|spine| Self { spine })
    }

    fn physics_update(&self) -> Option<JsValue> {
        member(&self.spine, "Physics").and_then(|physics| member(&physics, "update"))
    }
}

fn downcast<'a, T: 'static>(handle: &'a dyn Any, what: &str) -> RuntimeResult<&'a T> {
    handle
        .downcast_ref::<T>()
        .ok_or_else(|| RuntimeFault::new(format!("{what} was not built by the JS runtime")))
}

fn js_skeleton(skeleton: &dyn Skeleton) -> RuntimeResult<&JsSkeleton> {
    downcast(skeleton.as_any(), "skeleton")
}

fn js_data(data: &Rc<dyn SkeletonData>) -> RuntimeResult<&JsSkeletonData> {
    downcast(data.as_any(), "skeleton data")
}

impl SkeletalRuntime for JsRuntime {
    type Surface = CanvasSurface;

    fn has(&self, facility: Facility) -> bool {
        member(&self.spine, facility.name()).is_some()
    }

    fn create_renderer(&self, surface: &CanvasSurface) -> RuntimeResult<Box<dyn SceneRenderer>> {
        let gl = surface.webgl_context()?;
        let canvas: &JsValue = surface.canvas().as_ref();
        let renderer = construct(&self.spine, "SceneRenderer", &[canvas, &gl])?;
        let resize_mode = member(&self.spine, "ResizeMode")
            .and_then(|modes| member(&modes, "Fit"))
            .unwrap_or_else(|| JsValue::from(0));
        Ok(Box::new(JsSceneRenderer {
            renderer,
            gl,
            resize_mode,
        }))
    }

    fn create_asset_manager(&self, surface: &CanvasSurface) -> RuntimeResult<Box<dyn AssetManager>> {
        let gl = surface.webgl_context()?;
        let object = construct(&self.spine, "AssetManager", &[&gl])?;
        Ok(Box::new(JsAssetManager { object }))
    }

    fn create_debug_renderer(
        &self,
        kind: DebugRendererKind,
        surface: &CanvasSurface,
    ) -> RuntimeResult<Box<dyn DebugRenderer>> {
        let gl = surface.webgl_context()?;
        let class = match kind {
            DebugRendererKind::Skeleton => Facility::SkeletonDebugRenderer,
            DebugRendererKind::Shape => Facility::ShapeRenderer,
        };
        let object = construct(&self.spine, class.name(), &[&gl])?;
        Ok(Box::new(JsDebugRenderer { object }))
    }

    fn create_time_source(&self) -> RuntimeResult<Box<dyn TimeSource>> {
        let object = construct(&self.spine, "TimeKeeper", &[])?;
        Ok(Box::new(JsTimeSource { object }))
    }

    fn read_skeleton_data(
        &self,
        assets: &dyn AssetManager,
        atlas_path: &str,
        json_path: &str,
    ) -> RuntimeResult<Rc<dyn SkeletonData>> {
        let assets: &JsAssetManager = downcast(assets.as_any(), "asset manager")?;
        let atlas = call(&assets.object, "require", &[&JsValue::from_str(atlas_path)])?;
        let json = call(&assets.object, "require", &[&JsValue::from_str(json_path)])?;

        let loader = construct(&self.spine, "AtlasAttachmentLoader", &[&atlas])?;
        let reader = construct(&self.spine, "SkeletonJson", &[&loader])?;
        let object = call(&reader, "readSkeletonData", &[&json])?;
        Ok(Rc::new(JsSkeletonData { object }))
    }

    fn create_skeleton(&self, data: &Rc<dyn SkeletonData>) -> RuntimeResult<Box<dyn Skeleton>> {
        let data = js_data(data)?;
        let object = construct(&self.spine, "Skeleton", &[&data.object])?;
        Ok(Box::new(JsSkeleton {
            object,
            data: data.object.clone(),
            spine: self.spine.clone(),
            physics: self.physics_update(),
        }))
    }

    fn create_animation_state(&self, data: &Rc<dyn SkeletonData>) -> RuntimeResult<Box<dyn AnimationState>> {
        let data = js_data(data)?;
        let state_data = construct(&self.spine, "AnimationStateData", &[&data.object])?;
        let object = construct(&self.spine, "AnimationState", &[&state_data])?;
        Ok(Box::new(JsAnimationState { object }))
    }
}

struct JsSceneRenderer {
    renderer: JsValue,
    gl: JsValue,
    resize_mode: JsValue,
}

impl JsSceneRenderer {
    fn camera(&self) -> Option<JsValue> {
        member(&self.renderer, "camera")
    }

    fn embedded_debug(&self) -> Option<JsValue> {
        member(&self.renderer, "skeletonDebugRenderer")
    }
}

impl SceneRenderer for JsSceneRenderer {
    fn center_camera(&mut self, position: Vec2) -> bool {
        let Some(target) = self.camera().and_then(|camera| member(&camera, "position")) else {
            return false;
        };
        set(&target, "x", &JsValue::from(position.x)).is_ok() && set(&target, "y", &JsValue::from(position.y)).is_ok()
    }

    fn set_viewport(&mut self, size: Vec2) -> bool {
        let Some(camera) = self.camera() else {
            return false;
        };
        set(&camera, "viewportWidth", &JsValue::from(size.x)).is_ok() && set(&camera, "viewportHeight", &JsValue::from(size.y)).is_ok()
    }

    fn resize(&mut self) -> RuntimeResult<()> {
        if has_method(&self.renderer, "resize") {
            call(&self.renderer, "resize", &[&self.resize_mode])?;
        }
        Ok(())
    }

    fn clear(&mut self, [r, g, b, a]: [f32; 4]) -> RuntimeResult<()> {
        call(&self.gl, "clearColor", &[&JsValue::from(r), &JsValue::from(g), &JsValue::from(b), &JsValue::from(a)])?;
        call(&self.gl, "clear", &[&JsValue::from(COLOR_BUFFER_BIT)])?;
        Ok(())
    }

    fn enable_alpha_blend(&mut self) -> RuntimeResult<()> {
        call(&self.gl, "enable", &[&JsValue::from(BLEND)])?;
        call(&self.gl, "blendFunc", &[&JsValue::from(SRC_ALPHA), &JsValue::from(ONE_MINUS_SRC_ALPHA)])?;
        Ok(())
    }

    fn begin(&mut self) -> RuntimeResult<()> {
        call(&self.renderer, "begin", &[]).map(|_| ())
    }

    fn draw_skeleton(&mut self, skeleton: &dyn Skeleton, premultiplied_alpha: bool) -> RuntimeResult<()> {
        let skeleton = js_skeleton(skeleton)?;
        call(&self.renderer, "drawSkeleton", &[&skeleton.object, &JsValue::from(premultiplied_alpha)]).map(|_| ())
    }

    fn end(&mut self) -> RuntimeResult<()> {
        call(&self.renderer, "end", &[]).map(|_| ())
    }

    fn has_embedded_debug(&self) -> bool {
        self.embedded_debug().is_some()
    }

    fn set_embedded_debug_meshes(&mut self, enabled: bool) {
        if let Some(debug) = self.embedded_debug() {
            let applied = set(&debug, "drawMeshHull", &JsValue::from(enabled))
                .and_then(|_| set(&debug, "drawMeshTriangles", &JsValue::from(enabled)));
            if let Err(e) = applied {
                log::debug!(target: "skelview", "embedded debug options not applied: {e}");
            }
        }
    }

    fn draw_embedded_debug(&mut self, skeleton: &dyn Skeleton) -> RuntimeResult<()> {
        let skeleton = js_skeleton(skeleton)?;
        match self.embedded_debug() {
            Some(debug) if has_method(&debug, "draw") => call(&debug, "draw", &[&skeleton.object]).map(|_| ()),
            _ => Ok(()),
        }
    }

    fn dispose(&mut self) -> RuntimeResult<()> {
        if has_method(&self.renderer, "dispose") {
            call(&self.renderer, "dispose", &[])?;
        }
        Ok(())
    }
}

struct JsAssetManager {
    object: JsValue,
}

impl AssetManager for JsAssetManager {
    fn load_texture_atlas(&mut self, path: &str) {
        if let Err(e) = call(&self.object, "loadTextureAtlas", &[&JsValue::from_str(path)]) {
            log::warn!(target: "skelview", "atlas request failed: {e}");
        }
    }

    fn load_json(&mut self, path: &str) {
        if let Err(e) = call(&self.object, "loadJson", &[&JsValue::from_str(path)]) {
            log::warn!(target: "skelview", "skeleton data request failed: {e}");
        }
    }

    fn is_loading_complete(&self) -> bool {
        call(&self.object, "isLoadingComplete", &[]).is_ok_and(|done| done.is_truthy())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct JsSkeletonData {
    object: JsValue,
}

impl JsSkeletonData {
    fn list(&self, key: &str) -> Array {
        member(&self.object, key)
            .map(|list| Array::from(&list))
            .unwrap_or_else(Array::new)
    }
}

impl SkeletonData for JsSkeletonData {
    fn bone_count(&self) -> usize {
        self.list("bones").length() as usize
    }

    fn animation_names(&self) -> Vec<String> {
        self.list("animations")
            .iter()
            .filter_map(|animation| member(&animation, "name").and_then(|name| name.as_string()))
            .collect()
    }

    fn skin_names(&self) -> RuntimeResult<Vec<Option<String>>> {
        let skins = member(&self.object, "skins").ok_or_else(|| RuntimeFault::new("skeleton data has no skins list"))?;
        if !Array::is_array(&skins) {
            return Err(RuntimeFault::new("skins is not an array"));
        }
        Ok(Array::from(&skins)
            .iter()
            .map(|skin| member(&skin, "name").and_then(|name| name.as_string()))
            .collect())
    }

    fn supports_skin_lookup(&self) -> bool {
        has_method(&self.object, "findSkin")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct JsSkeleton {
    object: JsValue,
    data: JsValue,
    spine: JsValue,
    physics: Option<JsValue>,
}

impl JsSkeleton {
    fn call_quietly(&self, name: &str) {
        if let Err(e) = call(&self.object, name, &[]) {
            log::debug!(target: "skelview", "{name} failed: {e}");
        }
    }
}

fn world_position(bone: &JsValue) -> Vec2 {
    Vec2::new(number(bone, "worldX"), number(bone, "worldY"))
}

impl Skeleton for JsSkeleton {
    fn set_to_setup_pose(&mut self) {
        self.call_quietly("setToSetupPose");
    }

    fn set_slots_to_setup_pose(&mut self) {
        self.call_quietly("setSlotsToSetupPose");
    }

    fn update_world_transform(&mut self, mode: TransformMode) -> RuntimeResult<()> {
        let result = match (mode, self.physics.as_ref()) {
            (TransformMode::Physics, Some(physics)) => call(&self.object, "updateWorldTransform", &[physics]),
            _ => call(&self.object, "updateWorldTransform", &[]),
        };
        result.map(|_| ())
    }

    fn bounds(&self) -> RuntimeResult<Bounds> {
        let offset = construct(&self.spine, "Vector2", &[])?;
        let size = construct(&self.spine, "Vector2", &[])?;
        call(&self.object, "getBounds", &[&offset, &size, &Array::new()])?;
        Ok(Bounds::new(
            Vec2::new(number(&offset, "x"), number(&offset, "y")),
            Vec2::new(number(&size, "x"), number(&size, "y")),
        ))
    }

    fn find_and_set_skin(&mut self, name: &str) -> RuntimeResult<SkinLookup> {
        let skin = call(&self.data, "findSkin", &[&JsValue::from_str(name)])?;
        if skin.is_undefined() || skin.is_null() {
            return Ok(SkinLookup::NotFound);
        }
        call(&self.object, "setSkin", &[&skin])?;
        Ok(SkinLookup::Applied)
    }

    fn set_skin_by_name(&mut self, name: &str) -> RuntimeResult<()> {
        let method = if has_method(&self.object, "setSkinByName") {
            "setSkinByName"
        } else {
            "setSkin"
        };
        call(&self.object, method, &[&JsValue::from_str(name)]).map(|_| ())
    }

    fn bone_segments(&self) -> Vec<BoneSegment> {
        let Some(bones) = member(&self.object, "bones") else {
            return Vec::new();
        };
        Array::from(&bones)
            .iter()
            .filter_map(|bone| {
                let parent = member(&bone, "parent")?;
                Some(BoneSegment {
                    from: world_position(&parent),
                    to: world_position(&bone),
                })
            })
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct JsAnimationState {
    object: JsValue,
}

impl AnimationState for JsAnimationState {
    fn set_animation(&mut self, track: usize, name: &str, looping: bool) -> RuntimeResult<()> {
        call(
            &self.object,
            "setAnimation",
            &[&JsValue::from(track as u32), &JsValue::from_str(name), &JsValue::from(looping)],
        )
        .map(|_| ())
    }

    fn update(&mut self, delta: f32) {
        if let Err(e) = call(&self.object, "update", &[&JsValue::from(delta)]) {
            log::debug!(target: "skelview", "animation state update failed: {e}");
        }
    }

    fn apply(&mut self, skeleton: &mut dyn Skeleton) -> RuntimeResult<()> {
        let skeleton = js_skeleton(skeleton)?;
        call(&self.object, "apply", &[&skeleton.object]).map(|_| ())
    }
}

struct JsDebugRenderer {
    object: JsValue,
}

impl DebugRenderer for JsDebugRenderer {
    fn supports_draw_skeleton(&self) -> bool {
        has_method(&self.object, "drawSkeleton")
    }

    fn draw_skeleton(&mut self, skeleton: &dyn Skeleton) -> RuntimeResult<()> {
        let skeleton = js_skeleton(skeleton)?;
        call(&self.object, "drawSkeleton", &[&skeleton.object]).map(|_| ())
    }

    fn supports_lines(&self) -> bool {
        has_method(&self.object, "line")
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: u32) -> RuntimeResult<()> {
        call(
            &self.object,
            "line",
            &[&JsValue::from(from.x), &JsValue::from(from.y), &JsValue::from(to.x), &JsValue::from(to.y), &JsValue::from(color)],
        )
        .map(|_| ())
    }
}

struct JsTimeSource {
    object: JsValue,
}

impl TimeSource for JsTimeSource {
    fn update(&mut self) {
        if let Err(e) = call(&self.object, "update", &[]) {
            log::debug!(target: "skelview", "time keeper update failed: {e}");
        }
    }

    fn delta(&self) -> f32 {
        number(&self.object, "delta")
    }
}
