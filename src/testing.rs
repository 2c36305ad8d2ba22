//! In-memory host and runtime used by the unit tests.

use std::any::Any;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::future::{FutureExt, LocalBoxFuture};

use crate::error::{RuntimeFault, RuntimeResult};
use crate::host::{FetchResponse, Host, HostResult};
use crate::runtime::{
    AnimationState, AssetManager, Bounds, BoneSegment, DebugRenderer, DebugRendererKind, DrawingSurface, Facility,
    SceneRenderer, SkeletalRuntime, Skeleton, SkeletonData, SkinLookup, TimeSource, TransformMode, Vec2,
};
use crate::work::AnimationWork;

pub const PINKBUNNY_JSON: &str = r#"{
  "skeleton": { "spine": "4.2.27", "width": 120, "height": 180 },
  "bones": [ { "name": "root" }, { "name": "body", "parent": "root" } ],
  "slots": [ { "name": "body", "bone": "body", "attachment": "body" } ],
  "skins": [ { "name": "default" } ],
  "animations": { "idle": {}, "hop": {} }
}"#;

pub fn pinkbunny() -> AnimationWork {
    AnimationWork::new(
        "pinkbunny",
        "Pink Bunny",
        "/assets/pinkbunny/pinkbunny.atlas",
        "/assets/pinkbunny/pinkbunny.json",
        "/assets/pinkbunny/pinkbunny.png",
    )
}

pub fn owl() -> AnimationWork {
    AnimationWork::new(
        "owl",
        "Owl",
        "https://cdn.example.com/owl/owl.atlas",
        "https://cdn.example.com/owl/owl.json",
        "https://cdn.example.com/owl/owl.png",
    )
}

/// Everything the fakes did, shared between handles.
#[derive(Debug, Default)]
pub struct JournalData {
    pub renderers_created: usize,
    pub dispose_calls: usize,
    pub renderer_calls: Vec<&'static str>,
    pub camera_center: Option<Vec2>,
    pub viewport: Option<Vec2>,
    pub clears: Vec<[f32; 4]>,
    pub blend_enabled: usize,
    pub skeleton_draws: usize,
    pub embedded_meshes: Option<bool>,
    pub fail_draw: bool,

    pub assets_requested: Vec<String>,
    pub completion_checks: usize,

    pub animations_set: Vec<String>,
    pub state_updates: Vec<f32>,
    pub setup_poses: usize,
    pub slot_setup_poses: usize,
    pub skin_lookups: Vec<String>,
    pub skins_by_name: Vec<String>,
    pub transform_updates: Vec<TransformMode>,

    pub debug_skeleton_draws: usize,
    pub debug_lines: Vec<(Vec2, Vec2, u32)>,
}

#[derive(Clone, Debug, Default)]
pub struct Journal(Rc<RefCell<JournalData>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn borrow(&self) -> Ref<'_, JournalData> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, JournalData> {
        self.0.borrow_mut()
    }

    /// Renderers created by the runtime and not yet disposed.
    pub fn live_renderers(&self) -> usize {
        let j = self.0.borrow();
        j.renderers_created.saturating_sub(j.dispose_calls)
    }
}

/// Completes once after returning `Pending`.
#[derive(Default)]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

pub struct FakeRenderer {
    journal: Journal,
    pub embedded_debug: bool,
    pub fail_dispose: bool,
}

impl FakeRenderer {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            embedded_debug: false,
            fail_dispose: false,
        }
    }

    fn call(&self, name: &'static str) {
        self.journal.borrow_mut().renderer_calls.push(name);
    }
}

impl SceneRenderer for FakeRenderer {
    fn center_camera(&mut self, position: Vec2) -> bool {
        self.journal.borrow_mut().camera_center = Some(position);
        true
    }

    fn set_viewport(&mut self, size: Vec2) -> bool {
        self.journal.borrow_mut().viewport = Some(size);
        true
    }

    fn resize(&mut self) -> RuntimeResult<()> {
        self.call("resize");
        Ok(())
    }

    fn clear(&mut self, rgba: [f32; 4]) -> RuntimeResult<()> {
        self.journal.borrow_mut().clears.push(rgba);
        Ok(())
    }

    fn enable_alpha_blend(&mut self) -> RuntimeResult<()> {
        self.journal.borrow_mut().blend_enabled += 1;
        Ok(())
    }

    fn begin(&mut self) -> RuntimeResult<()> {
        self.call("begin");
        Ok(())
    }

    fn draw_skeleton(&mut self, _skeleton: &dyn Skeleton, _premultiplied_alpha: bool) -> RuntimeResult<()> {
        if self.journal.borrow().fail_draw {
            return Err(RuntimeFault::new("draw exploded"));
        }
        self.call("draw_skeleton");
        self.journal.borrow_mut().skeleton_draws += 1;
        Ok(())
    }

    fn end(&mut self) -> RuntimeResult<()> {
        self.call("end");
        Ok(())
    }

    fn has_embedded_debug(&self) -> bool {
        self.embedded_debug
    }

    fn set_embedded_debug_meshes(&mut self, enabled: bool) {
        self.journal.borrow_mut().embedded_meshes = Some(enabled);
    }

    fn dispose(&mut self) -> RuntimeResult<()> {
        self.journal.borrow_mut().dispose_calls += 1;
        if self.fail_dispose {
            return Err(RuntimeFault::new("context lost"));
        }
        Ok(())
    }
}

pub struct FakeAssets {
    journal: Journal,
    complete_after: Option<usize>,
}

impl FakeAssets {
    /// `None` never completes; `Some(n)` completes on check `n + 1`.
    pub fn new(journal: Journal, complete_after: Option<usize>) -> Self {
        Self { journal, complete_after }
    }
}

impl AssetManager for FakeAssets {
    fn load_texture_atlas(&mut self, path: &str) {
        self.journal.borrow_mut().assets_requested.push(path.to_string());
    }

    fn load_json(&mut self, path: &str) {
        self.journal.borrow_mut().assets_requested.push(path.to_string());
    }

    fn is_loading_complete(&self) -> bool {
        let mut j = self.journal.borrow_mut();
        let checks = j.completion_checks;
        j.completion_checks += 1;
        matches!(self.complete_after, Some(n) if checks >= n)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct FakeSkeletonData {
    animations: Vec<String>,
    skins: Vec<Option<String>>,
    pub supports_lookup: bool,
    pub fail_skins: bool,
}

impl FakeSkeletonData {
    pub fn new(animations: Vec<String>, skins: Vec<Option<String>>) -> Self {
        Self {
            animations,
            skins,
            supports_lookup: true,
            fail_skins: false,
        }
    }
}

impl SkeletonData for FakeSkeletonData {
    fn bone_count(&self) -> usize {
        3
    }

    fn animation_names(&self) -> Vec<String> {
        self.animations.clone()
    }

    fn skin_names(&self) -> RuntimeResult<Vec<Option<String>>> {
        if self.fail_skins {
            return Err(RuntimeFault::new("skins unreadable"));
        }
        Ok(self.skins.clone())
    }

    fn supports_skin_lookup(&self) -> bool {
        self.supports_lookup
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct FakeSkeleton {
    journal: Journal,
    known_skins: Vec<String>,
    pub fail_physics: bool,
    pub fail_plain: bool,
}

impl FakeSkeleton {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            known_skins: Vec::new(),
            fail_physics: false,
            fail_plain: false,
        }
    }

    pub fn with_skins(mut self, skins: Vec<String>) -> Self {
        self.known_skins = skins;
        self
    }
}

impl Skeleton for FakeSkeleton {
    fn set_to_setup_pose(&mut self) {
        self.journal.borrow_mut().setup_poses += 1;
    }

    fn set_slots_to_setup_pose(&mut self) {
        self.journal.borrow_mut().slot_setup_poses += 1;
    }

    fn update_world_transform(&mut self, mode: TransformMode) -> RuntimeResult<()> {
        self.journal.borrow_mut().transform_updates.push(mode);
        let fail = match mode {
            TransformMode::Physics => self.fail_physics,
            TransformMode::Plain => self.fail_plain,
        };
        if fail {
            return Err(RuntimeFault::new("transform failed"));
        }
        Ok(())
    }

    fn bounds(&self) -> RuntimeResult<Bounds> {
        Ok(Bounds::new(Vec2::new(-60.0, 0.0), Vec2::new(120.0, 180.0)))
    }

    fn find_and_set_skin(&mut self, name: &str) -> RuntimeResult<SkinLookup> {
        self.journal.borrow_mut().skin_lookups.push(name.to_string());
        if self.known_skins.iter().any(|s| s == name) {
            Ok(SkinLookup::Applied)
        } else {
            Ok(SkinLookup::NotFound)
        }
    }

    fn set_skin_by_name(&mut self, name: &str) -> RuntimeResult<()> {
        self.journal.borrow_mut().skins_by_name.push(name.to_string());
        Ok(())
    }

    // root -> hip -> head
    fn bone_segments(&self) -> Vec<BoneSegment> {
        vec![
            BoneSegment {
                from: Vec2::new(0.0, 0.0),
                to: Vec2::new(0.0, 40.0),
            },
            BoneSegment {
                from: Vec2::new(0.0, 40.0),
                to: Vec2::new(0.0, 90.0),
            },
        ]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct FakeState {
    journal: Journal,
}

impl FakeState {
    pub fn new(journal: Journal) -> Self {
        Self { journal }
    }
}

impl AnimationState for FakeState {
    fn set_animation(&mut self, _track: usize, name: &str, _looping: bool) -> RuntimeResult<()> {
        self.journal.borrow_mut().animations_set.push(name.to_string());
        Ok(())
    }

    fn update(&mut self, delta: f32) {
        self.journal.borrow_mut().state_updates.push(delta);
    }

    fn apply(&mut self, _skeleton: &mut dyn Skeleton) -> RuntimeResult<()> {
        Ok(())
    }
}

pub struct FakeDebugRenderer {
    journal: Journal,
    draws_skeleton: bool,
    draws_lines: bool,
    pub fail: bool,
}

impl FakeDebugRenderer {
    pub fn new(journal: Journal, draws_skeleton: bool, draws_lines: bool) -> Self {
        Self {
            journal,
            draws_skeleton,
            draws_lines,
            fail: false,
        }
    }
}

impl DebugRenderer for FakeDebugRenderer {
    fn supports_draw_skeleton(&self) -> bool {
        self.draws_skeleton
    }

    fn draw_skeleton(&mut self, _skeleton: &dyn Skeleton) -> RuntimeResult<()> {
        if self.fail {
            return Err(RuntimeFault::new("debug draw failed"));
        }
        self.journal.borrow_mut().debug_skeleton_draws += 1;
        Ok(())
    }

    fn supports_lines(&self) -> bool {
        self.draws_lines
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: u32) -> RuntimeResult<()> {
        if self.fail {
            return Err(RuntimeFault::new("debug draw failed"));
        }
        self.journal.borrow_mut().debug_lines.push((from, to, color));
        Ok(())
    }
}

pub struct FakeTimeSource {
    delta: f32,
}

impl FakeTimeSource {
    pub fn new(delta: f32) -> Self {
        Self { delta }
    }
}

impl TimeSource for FakeTimeSource {
    fn update(&mut self) {}

    fn delta(&self) -> f32 {
        self.delta
    }
}

#[derive(Debug, Default)]
pub struct SurfaceState {
    pub layout: (f64, f64),
    pub backing: Option<(u32, u32)>,
    pub transforms: Vec<String>,
}

/// Drawing surface handle; clones share state.
#[derive(Clone, Debug, Default)]
pub struct FakeSurface(Rc<RefCell<SurfaceState>>);

impl FakeSurface {
    pub fn new(width: f64, height: f64) -> Self {
        let surface = Self::default();
        surface.0.borrow_mut().layout = (width, height);
        surface
    }

    pub fn backing(&self) -> Option<(u32, u32)> {
        self.0.borrow().backing
    }

    pub fn set_layout(&self, width: f64, height: f64) {
        self.0.borrow_mut().layout = (width, height);
    }

    pub fn last_transform(&self) -> Option<String> {
        self.0.borrow().transforms.last().cloned()
    }
}

impl DrawingSurface for FakeSurface {
    fn layout_size(&self) -> (f64, f64) {
        self.0.borrow().layout
    }

    fn set_backing_size(&self, width: u32, height: u32) {
        self.0.borrow_mut().backing = Some((width, height));
    }

    fn apply_transform(&self, css: &str) {
        self.0.borrow_mut().transforms.push(css.to_string());
    }
}

/// Shape of the fake runtime and the data it serves.
#[derive(Clone, Debug)]
pub struct Scenario {
    pub journal: Journal,
    pub animations: Vec<String>,
    pub skins: Vec<Option<String>>,
    pub supports_skin_lookup: bool,
    pub missing: Vec<Facility>,
    pub complete_after: Option<usize>,
    pub embedded_debug: bool,
    pub fail_renderer: bool,
    pub fail_skins: bool,
    pub fail_dispose: bool,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            journal: Journal::new(),
            animations: vec!["idle".to_string(), "hop".to_string()],
            skins: Vec::new(),
            supports_skin_lookup: true,
            missing: Vec::new(),
            complete_after: Some(2),
            embedded_debug: false,
            fail_renderer: false,
            fail_skins: false,
            fail_dispose: false,
        }
    }
}

pub struct FakeRuntime {
    scenario: Scenario,
}

impl FakeRuntime {
    pub fn new(scenario: Scenario) -> Self {
        Self { scenario }
    }
}

impl SkeletalRuntime for FakeRuntime {
    type Surface = FakeSurface;

    fn has(&self, facility: Facility) -> bool {
        !self.scenario.missing.contains(&facility)
    }

    fn create_renderer(&self, _surface: &FakeSurface) -> RuntimeResult<Box<dyn SceneRenderer>> {
        if self.scenario.fail_renderer {
            return Err(RuntimeFault::new("no WebGL context"));
        }
        self.scenario.journal.borrow_mut().renderers_created += 1;
        let mut renderer = FakeRenderer::new(self.scenario.journal.clone());
        renderer.embedded_debug = self.scenario.embedded_debug;
        renderer.fail_dispose = self.scenario.fail_dispose;
        Ok(Box::new(renderer))
    }

    fn create_asset_manager(&self, _surface: &FakeSurface) -> RuntimeResult<Box<dyn AssetManager>> {
        Ok(Box::new(FakeAssets::new(self.scenario.journal.clone(), self.scenario.complete_after)))
    }

    fn create_debug_renderer(
        &self,
        kind: DebugRendererKind,
        _surface: &FakeSurface,
    ) -> RuntimeResult<Box<dyn DebugRenderer>> {
        let draws_skeleton = kind == DebugRendererKind::Skeleton;
        Ok(Box::new(FakeDebugRenderer::new(self.scenario.journal.clone(), draws_skeleton, true)))
    }

    fn create_time_source(&self) -> RuntimeResult<Box<dyn TimeSource>> {
        Ok(Box::new(FakeTimeSource::new(1.0 / 60.0)))
    }

    fn read_skeleton_data(
        &self,
        _assets: &dyn AssetManager,
        _atlas_path: &str,
        _json_path: &str,
    ) -> RuntimeResult<Rc<dyn SkeletonData>> {
        let mut data = FakeSkeletonData::new(self.scenario.animations.clone(), self.scenario.skins.clone());
        data.supports_lookup = self.scenario.supports_skin_lookup;
        data.fail_skins = self.scenario.fail_skins;
        Ok(Rc::new(data))
    }

    fn create_skeleton(&self, _data: &Rc<dyn SkeletonData>) -> RuntimeResult<Box<dyn Skeleton>> {
        let skins = self.scenario.skins.iter().flatten().cloned().collect();
        Ok(Box::new(FakeSkeleton::new(self.scenario.journal.clone()).with_skins(skins)))
    }

    fn create_animation_state(&self, _data: &Rc<dyn SkeletonData>) -> RuntimeResult<Box<dyn AnimationState>> {
        Ok(Box::new(FakeState::new(self.scenario.journal.clone())))
    }
}

/// In-memory host. Unserved URLs fail like a network error.
pub struct FakeHost {
    scenario: Scenario,
    accelerated: Cell<bool>,
    runtime_error: RefCell<Option<String>>,
    responses: RefCell<HashMap<String, FetchResponse>>,
    fetched: RefCell<Vec<String>>,
    sleeps: Cell<u32>,
    loads: Rc<Cell<u32>>,
    now: Cell<f64>,
    frame_loop: RefCell<Option<Box<dyn FnMut()>>>,
    loops_started: Cell<u32>,
}

impl FakeHost {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            accelerated: Cell::new(true),
            runtime_error: RefCell::new(None),
            responses: RefCell::new(HashMap::new()),
            fetched: RefCell::new(Vec::new()),
            sleeps: Cell::new(0),
            loads: Rc::new(Cell::new(0)),
            now: Cell::new(0.0),
            frame_loop: RefCell::new(None),
            loops_started: Cell::new(0),
        }
    }

    pub fn journal(&self) -> Journal {
        self.scenario.journal.clone()
    }

    pub fn serve(&self, url: &str, status: u16, body: &str) {
        self.responses
            .borrow_mut()
            .insert(url.to_string(), FetchResponse::new(status, body));
    }

    pub fn serve_work(&self, work: &AnimationWork) {
        self.serve(&work.atlas_path, 200, "pinkbunny.png\nsize: 256,256\nformat: RGBA8888\n");
        self.serve(&work.json_path, 200, PINKBUNNY_JSON);
        self.serve(&work.image_path, 200, "\u{89}PNG");
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.borrow().clone()
    }

    pub fn set_accelerated(&self, available: bool) {
        self.accelerated.set(available);
    }

    pub fn fail_runtime_load(&self, message: Option<&str>) {
        *self.runtime_error.borrow_mut() = message.map(str::to_string);
    }

    pub fn sleeps(&self) -> u32 {
        self.sleeps.get()
    }

    pub fn runtime_loads(&self) -> u32 {
        self.loads.get()
    }

    pub fn set_now(&self, seconds: f64) {
        self.now.set(seconds);
    }

    pub fn loops_started(&self) -> u32 {
        self.loops_started.get()
    }

    /// Run one frame of the installed loop. Returns `false` when none is installed.
    pub fn run_frame(&self) -> bool {
        match self.frame_loop.borrow_mut().as_mut() {
            Some(tick) => {
                tick();
                true
            }
            None => false,
        }
    }
}

impl Host for FakeHost {
    type Surface = FakeSurface;
    type Runtime = FakeRuntime;

    fn accelerated_context_available(&self) -> bool {
        self.accelerated.get()
    }

    fn load_runtime(&self) -> LocalBoxFuture<'static, HostResult<Rc<FakeRuntime>>> {
        let loads = self.loads.clone();
        let error = self.runtime_error.borrow().clone();
        let scenario = self.scenario.clone();
        async move {
            loads.set(loads.get() + 1);
            YieldNow::default().await;
            match error {
                Some(message) => Err(message),
                None => Ok(Rc::new(FakeRuntime::new(scenario))),
            }
        }
        .boxed_local()
    }

    async fn fetch(&self, url: &str) -> HostResult<FetchResponse> {
        self.fetched.borrow_mut().push(url.to_string());
        YieldNow::default().await;
        self.responses
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| format!("failed to fetch {url}"))
    }

    async fn sleep(&self, _ms: u32) {
        self.sleeps.set(self.sleeps.get() + 1);
        YieldNow::default().await;
    }

    fn now_seconds(&self) -> f64 {
        self.now.get()
    }

    fn clock_label(&self) -> String {
        "12:00:00".to_string()
    }

    fn start_frame_loop(&self, tick: Box<dyn FnMut()>) {
        self.loops_started.set(self.loops_started.get() + 1);
        *self.frame_loop.borrow_mut() = Some(tick);
    }
}
