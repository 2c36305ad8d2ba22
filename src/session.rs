//! The animation session: pipeline state machine, live render context and
//! the operations exposed to the UI layer.

use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use crate::animation::{AnimationCatalog, PlaybackSettings, DEFAULT_SKIN};
use crate::config::SessionConfig;
use crate::context::{dispose_renderer, update_world_transform, RenderContext, RendererBundle, SkeletonParts};
use crate::error::{RuntimeFault, SessionError};
use crate::host::Host;
use crate::render_loop::{render_frame, FrameOutcome, FrameSettings};
use crate::runtime::{
    AssetManager, Bounds, Capabilities, DebugRendererKind, DrawingSurface, SceneRenderer, SkeletalRuntime, Skeleton,
    SkeletonData, SkinLookup, TransformMode, Vec2,
};
use crate::runtime_loader::RuntimeLoader;
use crate::stage::{SessionState, Stage};
use crate::validator::validate_assets;
use crate::view::{backing_size, ViewController, ViewState};
use crate::work::AnimationWork;

/// One animation session bound to at most one drawing surface.
///
/// All state lives behind `Cell`/`RefCell`; the pipeline never holds a
/// borrow across a suspension point, so the frame loop may run between
/// stages.
///
/// Pipeline runs are numbered. A run that wakes up to a newer generation
/// disposes what it built and stops without touching session state.
pub struct Session<H: Host + 'static> {
    host: H,
    config: SessionConfig,
    loader: RuntimeLoader<H::Runtime>,
    surface: RefCell<Option<H::Surface>>,
    state: RefCell<SessionState>,
    view: RefCell<ViewController>,
    context: RefCell<Option<RenderContext>>,
    catalog: RefCell<AnimationCatalog>,
    playback: Cell<PlaybackSettings>,
    selected: RefCell<Option<AnimationWork>>,
    capability_report: RefCell<Vec<String>>,
    generation: Cell<u64>,
    loop_started: Cell<bool>,
    this: Weak<Session<H>>,
}

impl<H: Host + 'static> Session<H> {
    pub fn new(host: H, config: SessionConfig) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            state: RefCell::new(SessionState::new(config.log_capacity)),
            host,
            config,
            loader: RuntimeLoader::new(),
            surface: RefCell::new(None),
            view: RefCell::new(ViewController::new()),
            context: RefCell::new(None),
            catalog: RefCell::new(AnimationCatalog::default()),
            playback: Cell::new(PlaybackSettings::default()),
            selected: RefCell::new(None),
            capability_report: RefCell::new(Vec::new()),
            generation: Cell::new(0),
            loop_started: Cell::new(false),
            this: this.clone(),
        })
    }

    #[inline]
    pub fn host(&self) -> &H {
        &self.host
    }

    #[inline]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ---------------------------------------------------------------------
    // Surface and view

    /// Bind the drawing surface, sizing it and applying the current view.
    pub fn attach_surface(&self, surface: H::Surface) {
        resize_surface(&surface);
        surface.apply_transform(&self.view.borrow().transform().css());
        *self.surface.borrow_mut() = Some(surface);
    }

    /// The bound drawing surface, if any.
    pub fn surface(&self) -> Option<Ref<'_, H::Surface>> {
        Ref::filter_map(self.surface.borrow(), |s| s.as_ref()).ok()
    }

    /// Match the surface's backing pixels to its layout box.
    pub fn resize(&self) {
        if let Some(surface) = self.surface.borrow().as_ref() {
            resize_surface(surface);
        }
    }

    pub fn view_state(&self) -> ViewState {
        self.view.borrow().state().clone()
    }

    pub fn reset_view(&self) {
        self.view.borrow_mut().reset();
        self.apply_view();
    }

    pub fn set_zoom(&self, zoom: f64) {
        self.view.borrow_mut().set_zoom(zoom);
        self.apply_view();
    }

    pub fn set_pan(&self, x: f64, y: f64) {
        self.view.borrow_mut().set_pan(x, y);
        self.apply_view();
    }

    /// Wheel input; returns the new zoom.
    pub fn wheel(&self, delta_y: f64) -> f64 {
        let zoom = self.view.borrow_mut().wheel(delta_y);
        self.apply_view();
        zoom
    }

    pub fn pointer_down(&self, button: i16, x: f64, y: f64) {
        self.view.borrow_mut().pointer_down(button, x, y);
    }

    pub fn pointer_move(&self, x: f64, y: f64) {
        let moved = self.view.borrow_mut().pointer_move(x, y);
        if moved {
            self.apply_view();
        }
    }

    /// Release or pointer leave.
    pub fn pointer_up(&self) {
        self.view.borrow_mut().pointer_up();
    }

    fn apply_view(&self) {
        let css = self.view.borrow().transform().css();
        if let Some(surface) = self.surface.borrow().as_ref() {
            surface.apply_transform(&css);
        }
    }

    // ---------------------------------------------------------------------
    // Read model

    pub fn stage(&self) -> Stage {
        self.state.borrow().stage
    }

    pub fn stage_label(&self) -> &'static str {
        self.stage().label()
    }

    pub fn progress_percent(&self) -> u8 {
        self.stage().progress_percent()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn logs(&self) -> Vec<String> {
        self.state.borrow().logs.snapshot()
    }

    pub fn animations(&self) -> Vec<String> {
        self.catalog.borrow().animations().to_vec()
    }

    pub fn skins(&self) -> Vec<String> {
        self.catalog.borrow().skins().to_vec()
    }

    pub fn selected_animation(&self) -> Option<String> {
        self.catalog.borrow().selected_animation().map(str::to_string)
    }

    pub fn selected_skin(&self) -> Option<String> {
        self.catalog.borrow().selected_skin().map(str::to_string)
    }

    pub fn selected_work(&self) -> Option<AnimationWork> {
        self.selected.borrow().clone()
    }

    /// Facility report of the loaded runtime; empty before the first load.
    pub fn capability_report(&self) -> Vec<String> {
        self.capability_report.borrow().clone()
    }

    pub fn has_debug_renderer(&self) -> bool {
        self.context.borrow().as_ref().is_some_and(|c| c.debug_renderer.is_some())
    }

    pub fn has_render_context(&self) -> bool {
        self.context.borrow().is_some()
    }

    pub fn is_render_loop_running(&self) -> bool {
        self.loop_started.get()
    }

    // ---------------------------------------------------------------------
    // Playback

    pub fn playback(&self) -> PlaybackSettings {
        self.playback.get()
    }

    pub fn set_playing(&self, playing: bool) {
        self.update_playback(|p| p.playing = playing);
    }

    pub fn toggle_playing(&self) {
        self.update_playback(PlaybackSettings::toggle);
    }

    pub fn set_speed(&self, speed: f32) {
        self.update_playback(|p| p.set_speed(speed));
    }

    pub fn set_show_debug(&self, show: bool) {
        self.update_playback(|p| p.show_debug = show);
    }

    fn update_playback(&self, f: impl FnOnce(&mut PlaybackSettings)) {
        let mut playback = self.playback.get();
        f(&mut playback);
        self.playback.set(playback);
    }

    // ---------------------------------------------------------------------
    // Selection

    /// Switch the animation on track 0, looping.
    pub fn select_animation(&self, name: &str) -> Result<(), SessionError> {
        let result = self.apply_animation(name);
        match &result {
            Ok(()) => {
                self.catalog.borrow_mut().set_selected_animation(name);
                self.log(format!("animation switched: {name}"));
            }
            Err(e) => self.warn(e.to_string()),
        }
        result
    }

    fn apply_animation(&self, name: &str) -> Result<(), SessionError> {
        if !self.catalog.borrow().has_animation(name) {
            return Err(SessionError::Selection(format!("unknown animation: {name}")));
        }
        let mut context = self.context.borrow_mut();
        let context = context.as_mut().ok_or_else(no_context)?;
        context
            .state
            .set_animation(0, name, true)
            .map_err(|e| SessionError::Selection(format!("animation switch failed: {e}")))
    }

    /// Switch skins. `"default"` resets the setup pose without a lookup.
    pub fn select_skin(&self, name: &str) -> Result<(), SessionError> {
        match self.apply_skin(name) {
            Ok(message) => {
                self.catalog.borrow_mut().set_selected_skin(name);
                self.log(message);
                Ok(())
            }
            Err(e) => {
                self.warn(e.to_string());
                Err(e)
            }
        }
    }

    fn apply_skin(&self, name: &str) -> Result<String, SessionError> {
        if !self.catalog.borrow().has_skin(name) {
            return Err(SessionError::Selection(format!("unknown skin: {name}")));
        }
        let mut context = self.context.borrow_mut();
        let context = context.as_mut().ok_or_else(no_context)?;
        let skin_error = |e: RuntimeFault| SessionError::Selection(format!("skin switch failed: {e}"));

        if name == DEFAULT_SKIN {
            context.skeleton.set_to_setup_pose();
            return Ok("reset to default skin".to_string());
        }

        if context.data.supports_skin_lookup() {
            match context.skeleton.find_and_set_skin(name).map_err(skin_error)? {
                SkinLookup::Applied => {
                    context.skeleton.set_slots_to_setup_pose();
                    Ok(format!("skin switched: {name}"))
                }
                SkinLookup::NotFound => Err(SessionError::Selection(format!("skin {name} does not exist"))),
            }
        } else {
            context.skeleton.set_skin_by_name(name).map_err(skin_error)?;
            context.skeleton.set_slots_to_setup_pose();
            Ok(format!("skin switched by name: {name}"))
        }
    }

    // ---------------------------------------------------------------------
    // Pipeline

    /// Select a work and run the pipeline for it.
    ///
    /// Re-selecting the current work (same id) does nothing.
    pub async fn select_work(&self, work: AnimationWork) -> Result<(), SessionError> {
        let same = self.selected.borrow().as_ref().is_some_and(|current| current.same_entry(&work));
        if same {
            log::debug!(target: "skelview", "work {} already selected", work.id);
            return Ok(());
        }

        let previous = self.selected.replace(Some(work.clone()));
        log::info!(
            target: "skelview",
            "switching work: {} -> {}",
            previous.as_ref().map_or("none", |w| w.name.as_str()),
            work.name
        );
        self.catalog.borrow_mut().clear();
        self.run(work).await
    }

    /// Rerun the pipeline for an edited version of the selected work.
    pub async fn reload(&self, work: AnimationWork) -> Result<(), SessionError> {
        *self.selected.borrow_mut() = Some(work.clone());
        self.catalog.borrow_mut().clear();
        self.run(work).await
    }

    /// Restart the whole pipeline for the selected work.
    pub async fn retry(&self) -> Result<(), SessionError> {
        let work = self.selected.borrow().clone();
        match work {
            Some(work) => self.run(work).await,
            None => {
                let err = SessionError::NoWorkSelected;
                self.state.borrow_mut().fail(err.to_string());
                Err(err)
            }
        }
    }

    async fn run(&self, work: AnimationWork) -> Result<(), SessionError> {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        self.state.borrow_mut().begin_run();
        self.log(format!("initializing {}", work.name));

        let result = self.run_stages(generation, &work).await;

        if let Err(e) = &result {
            if self.generation.get() != generation {
                log::debug!(target: "skelview", "run {generation} for {} superseded", work.id);
                return Err(SessionError::Superseded { generation });
            }
            self.fail(e);
        }
        result
    }

    async fn run_stages(&self, generation: u64, work: &AnimationWork) -> Result<(), SessionError> {
        if !self.host.accelerated_context_available() {
            return Err(SessionError::Capability);
        }
        self.log("WebGL support check passed");

        self.enter(Stage::RuntimeLoad);
        let loaded = self.loader.ensure_loaded(|| self.host.load_runtime()).await?;
        self.checkpoint(generation)?;
        self.report_capabilities(&loaded.capabilities, loaded.fresh);

        self.enter(Stage::AssetValidation);
        validate_assets(&self.host, work, || self.checkpoint(generation), |message| self.log(message)).await?;

        self.enter(Stage::RendererInit);
        let caps = loaded.capabilities;
        let mut bundle = self.init_renderer(loaded.runtime.as_ref(), &caps)?;

        self.enter(Stage::AssetLoad);
        if let Err(e) = self.load_assets(generation, bundle.assets.as_mut(), work).await {
            self.discard(bundle);
            return Err(e);
        }

        self.enter(Stage::SkeletonBuild);
        let (parts, catalog) = match self.build_skeleton(loaded.runtime.as_ref(), &caps, bundle.assets.as_ref(), work) {
            Ok(built) => built,
            Err(e) => {
                self.discard(bundle);
                return Err(e);
            }
        };
        let bounds = self.compute_bounds(&caps, parts.skeleton.as_ref());
        self.center_camera(bundle.renderer.as_mut(), &bounds);

        self.commit(bundle.into_context(parts, bounds, caps.transform_mode()), catalog);
        Ok(())
    }

    fn checkpoint(&self, generation: u64) -> Result<(), SessionError> {
        if self.generation.get() == generation {
            Ok(())
        } else {
            Err(SessionError::Superseded { generation })
        }
    }

    fn report_capabilities(&self, caps: &Capabilities, fresh: bool) {
        let report = caps.report();
        if fresh {
            for line in &report {
                log::info!(target: "skelview", "{line}");
            }
            self.log(format!("runtime loaded, {}/{} facilities present", caps.present_count(), report.len()));
        } else {
            self.log("runtime already loaded");
        }
        *self.capability_report.borrow_mut() = report;
    }

    /// Dispose the previous context, then build the new renderer set.
    fn init_renderer(&self, runtime: &H::Runtime, caps: &Capabilities) -> Result<RendererBundle, SessionError> {
        let previous = self.context.borrow_mut().take();
        if let Some(mut previous) = previous {
            match dispose_renderer(previous.renderer.as_mut()) {
                None => self.log("previous renderer disposed"),
                Some(e) => self.warn(format!("previous renderer cleanup failed: {e}")),
            }
        }

        let surface = self.surface.borrow();
        let surface = surface.as_ref().ok_or(SessionError::NoSurface)?;
        resize_surface(surface);

        let init_error = |e: RuntimeFault| SessionError::RendererInit(e.to_string());
        let mut renderer = runtime.create_renderer(surface).map_err(init_error)?;
        let assets = match runtime.create_asset_manager(surface) {
            Ok(assets) => assets,
            Err(e) => {
                dispose_renderer(renderer.as_mut());
                return Err(init_error(e));
            }
        };
        self.log("renderer created");

        let debug_renderer = match caps.debug_renderer() {
            Some(kind) => match runtime.create_debug_renderer(kind, surface) {
                Ok(debug) => {
                    self.log(match kind {
                        DebugRendererKind::Skeleton => "skeleton debug renderer created",
                        DebugRendererKind::Shape => "shape renderer created for debug drawing",
                    });
                    Some(debug)
                }
                Err(e) => {
                    self.warn(format!("debug renderer creation failed: {e}"));
                    None
                }
            },
            None => {
                self.log("debug renderer unavailable");
                None
            }
        };

        let time_source = if caps.time_source() {
            match runtime.create_time_source() {
                Ok(time) => Some(time),
                Err(e) => {
                    self.warn(format!("time source creation failed, using wall clock: {e}"));
                    None
                }
            }
        } else {
            self.log("time source unavailable, using wall clock");
            None
        };

        if renderer.has_embedded_debug() {
            renderer.set_embedded_debug_meshes(false);
            log::debug!(target: "skelview", "embedded debug mesh hull and triangles disabled");
        }

        Ok(RendererBundle {
            renderer,
            assets,
            debug_renderer,
            time_source,
        })
    }

    async fn load_assets(
        &self,
        generation: u64,
        assets: &mut dyn AssetManager,
        work: &AnimationWork,
    ) -> Result<(), SessionError> {
        assets.load_texture_atlas(&work.atlas_path);
        assets.load_json(&work.json_path);
        self.log("atlas and skeleton data queued");

        let mut attempts = 0u32;
        while !assets.is_loading_complete() {
            if attempts >= self.config.max_poll_attempts {
                return Err(SessionError::Timeout {
                    attempts,
                    waited_ms: attempts as u64 * self.config.poll_interval_ms as u64,
                });
            }
            self.host.sleep(self.config.poll_interval_ms).await;
            attempts += 1;
            self.checkpoint(generation)?;
        }
        self.log(format!("assets loaded after {attempts} polls"));
        Ok(())
    }

    fn build_skeleton(
        &self,
        runtime: &H::Runtime,
        caps: &Capabilities,
        assets: &dyn AssetManager,
        work: &AnimationWork,
    ) -> Result<(SkeletonParts, AnimationCatalog), SessionError> {
        let build_error = |e: RuntimeFault| SessionError::SkeletonBuild(e.to_string());

        let data = runtime
            .read_skeleton_data(assets, &work.atlas_path, &work.json_path)
            .map_err(build_error)?;
        self.log(format!("skeleton data read, {} bones", data.bone_count()));

        let mut skeleton = runtime.create_skeleton(&data).map_err(build_error)?;
        let mut state = runtime.create_animation_state(&data).map_err(build_error)?;

        let animations = data.animation_names();
        self.log(format!("found {} animations: {}", animations.len(), animations.join(", ")));

        let skins = data.skin_names().unwrap_or_else(|e| {
            self.warn(format!("skin detection failed, using default skin: {e}"));
            Vec::new()
        });
        let catalog = AnimationCatalog::new(animations, skins);
        if catalog.skins() == [DEFAULT_SKIN] {
            self.log("no custom skins, using default skin");
        } else {
            self.log(format!("found {} skins: {}", catalog.skins().len(), catalog.skins().join(", ")));
        }

        if let Some(first) = catalog.selected_animation() {
            state.set_animation(0, first, true).map_err(build_error)?;
            self.log(format!("default animation: {first}"));
        }
        if let Some(first) = catalog.selected_skin() {
            self.apply_initial_skin(skeleton.as_mut(), data.as_ref(), first);
        }

        skeleton.set_to_setup_pose();
        let mode = caps.transform_mode();
        if mode == TransformMode::Plain {
            self.log("physics update unavailable, using plain world transform");
        }
        update_world_transform(skeleton.as_mut(), mode);

        Ok((SkeletonParts { data, skeleton, state }, catalog))
    }

    /// Skin failures here are logged; the skeleton keeps its default skin.
    fn apply_initial_skin(&self, skeleton: &mut dyn Skeleton, data: &dyn SkeletonData, name: &str) {
        if name == DEFAULT_SKIN || !data.supports_skin_lookup() {
            self.log("using default skin");
            return;
        }
        match skeleton.find_and_set_skin(name) {
            Ok(SkinLookup::Applied) => self.log(format!("default skin: {name}")),
            Ok(SkinLookup::NotFound) => self.warn(format!("skin {name} not found, using default skin")),
            Err(e) => self.warn(format!("skin setup failed: {e}")),
        }
    }

    fn compute_bounds(&self, caps: &Capabilities, skeleton: &dyn Skeleton) -> Bounds {
        let (width, height) = self.config.default_extent;
        let fallback = Bounds::new(Vec2::ZERO, Vec2::new(width, height));

        let bounds = if caps.bounds_helper() {
            skeleton.bounds().unwrap_or_else(|e| {
                self.warn(format!("bounds computation failed, using default extent: {e}"));
                fallback
            })
        } else {
            self.log("bounds helper unavailable, using default extent");
            fallback
        };
        self.log(format!(
            "bounds: offset({:.1}, {:.1}) size({:.1}, {:.1})",
            bounds.offset.x, bounds.offset.y, bounds.extent.x, bounds.extent.y
        ));
        bounds
    }

    fn center_camera(&self, renderer: &mut dyn SceneRenderer, bounds: &Bounds) {
        let center = bounds.center();
        if renderer.center_camera(center) {
            self.log(format!("camera centered at ({:.1}, {:.1})", center.x, center.y));
        } else {
            self.log("renderer has no camera, camera setup deferred");
        }
    }

    /// Publish the new context and enter `Ready`.
    fn commit(&self, context: RenderContext, catalog: AnimationCatalog) {
        let previous = self.context.borrow_mut().replace(context);
        if let Some(mut previous) = previous {
            dispose_renderer(previous.renderer.as_mut());
        }
        *self.catalog.borrow_mut() = catalog;

        self.view.borrow_mut().reset();
        self.apply_view();

        self.state.borrow_mut().finish();
        self.log("ready");
        self.start_render_loop();
    }

    fn discard(&self, mut bundle: RendererBundle) {
        if let Some(e) = dispose_renderer(bundle.renderer.as_mut()) {
            self.warn(format!("renderer cleanup failed: {e}"));
        }
    }

    /// Dispose whatever is live, drop its catalog and record the failure.
    fn fail(&self, err: &SessionError) {
        let previous = self.context.borrow_mut().take();
        if let Some(mut previous) = previous {
            dispose_renderer(previous.renderer.as_mut());
        }
        self.catalog.borrow_mut().clear();
        log::error!(target: "skelview", "pipeline failed: {err}");
        let mut state = self.state.borrow_mut();
        state.logs.push(&self.host.clock_label(), &format!("initialization failed: {err}"));
        state.fail(err.to_string());
    }

    fn start_render_loop(&self) {
        if self.loop_started.replace(true) {
            return;
        }
        let this = self.this.clone();
        self.host.start_frame_loop(Box::new(move || {
            if let Some(session) = this.upgrade() {
                session.tick();
            }
        }));
        self.log("render loop started");
    }

    // ---------------------------------------------------------------------
    // Frame

    /// Run one frame. Failures are logged and the frame is skipped.
    pub fn tick(&self) -> FrameOutcome {
        let settings = FrameSettings {
            now: self.host.now_seconds(),
            fallback_delta: self.config.fallback_frame_delta,
            viewport_margin: self.config.viewport_margin,
            playback: self.playback.get(),
        };
        let surface_attached = self.surface.borrow().is_some();

        let result = {
            let mut context = self.context.borrow_mut();
            render_frame(context.as_mut(), surface_attached, &settings)
        };
        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.warn(e.to_string());
                FrameOutcome::Failed(e.to_string())
            }
        }
    }

    // ---------------------------------------------------------------------
    // Log

    fn enter(&self, stage: Stage) {
        log::debug!(target: "skelview", "stage: {}", stage.label());
        self.state.borrow_mut().enter(stage);
    }

    fn log(&self, message: impl AsRef<str>) {
        self.state.borrow_mut().logs.push(&self.host.clock_label(), message.as_ref());
    }

    fn warn(&self, message: impl AsRef<str>) {
        self.state
            .borrow_mut()
            .logs
            .record(log::Level::Warn, &self.host.clock_label(), message.as_ref());
    }
}

fn resize_surface<S: DrawingSurface>(surface: &S) {
    let (width, height) = backing_size(surface.layout_size());
    surface.set_backing_size(width, height);
}

fn no_context() -> SessionError {
    SessionError::Selection("no animation loaded".to_string())
}
