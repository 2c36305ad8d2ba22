use std::future::Future;
use std::rc::Rc;

use js_sys::{Array, Promise};
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::HtmlCanvasElement;

use super::{CanvasSurface, WebHost};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::session::Session;
use crate::work::AnimationWork;

fn undefined_or_null(value: &JsValue) -> bool {
    value.is_undefined() || value.is_null()
}

fn strings(values: Vec<String>) -> Array {
    values.into_iter().map(JsValue::from).collect()
}

fn to_js_error(err: SessionError) -> JsError {
    JsError::new(&err.to_string())
}

/// Resolves once the pipeline settles. Superseded runs resolve quietly.
fn pipeline_promise(run: impl Future<Output = Result<(), SessionError>> + 'static) -> Promise {
    future_to_promise(async move {
        match run.await {
            Ok(()) | Err(SessionError::Superseded { .. }) => Ok(JsValue::UNDEFINED),
            Err(e) => Err(to_js_error(e).into()),
        }
    })
}

/// JavaScript facade over one session bound to a canvas.
#[wasm_bindgen]
pub struct SkeletonViewer {
    session: Rc<Session<WebHost>>,
}

#[wasm_bindgen]
impl SkeletonViewer {
    /// Bind a viewer to `canvas`. `config` is an optional object matching
    /// `SessionConfig`; missing fields keep their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, config: JsValue) -> Result<SkeletonViewer, JsError> {
        console_error_panic_hook::set_once();

        let config: SessionConfig = if undefined_or_null(&config) {
            SessionConfig::default()
        } else {
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?
        };

        let session = Session::new(WebHost::new(config.runtime_url.clone()), config);
        session.attach_surface(CanvasSurface::new(canvas));
        Ok(SkeletonViewer { session })
    }

    /// Select a work (`{id, name, atlasPath, jsonPath, imagePath}`) and run
    /// the pipeline for it.
    #[wasm_bindgen(js_name = selectWork)]
    pub fn select_work(&self, work: JsValue) -> Result<Promise, JsError> {
        let work: AnimationWork = swb::from_value(work).map_err(|e| JsError::new(&format!("work error: {e}")))?;
        let session = self.session.clone();
        Ok(pipeline_promise(async move { session.select_work(work).await }))
    }

    /// Rerun the pipeline for an edited version of the selected work.
    pub fn reload(&self, work: JsValue) -> Result<Promise, JsError> {
        let work: AnimationWork = swb::from_value(work).map_err(|e| JsError::new(&format!("work error: {e}")))?;
        let session = self.session.clone();
        Ok(pipeline_promise(async move { session.reload(work).await }))
    }

    pub fn retry(&self) -> Promise {
        let session = self.session.clone();
        pipeline_promise(async move { session.retry().await })
    }

    pub fn canvas(&self) -> Option<HtmlCanvasElement> {
        self.session.surface().map(|surface| surface.canvas().clone())
    }

    pub fn resize(&self) {
        self.session.resize();
    }

    #[wasm_bindgen(js_name = resetView)]
    pub fn reset_view(&self) {
        self.session.reset_view();
    }

    #[wasm_bindgen(js_name = setZoom)]
    pub fn set_zoom(&self, zoom: f64) {
        self.session.set_zoom(zoom);
    }

    #[wasm_bindgen(js_name = setPan)]
    pub fn set_pan(&self, x: f64, y: f64) {
        self.session.set_pan(x, y);
    }

    pub fn zoom(&self) -> f64 {
        self.session.view_state().zoom
    }

    pub fn pan(&self) -> Array {
        let (x, y) = self.session.view_state().pan;
        Array::of2(&JsValue::from(x), &JsValue::from(y))
    }

    /// Wheel input; returns the new zoom.
    pub fn wheel(&self, delta_y: f64) -> f64 {
        self.session.wheel(delta_y)
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&self, button: i16, x: f64, y: f64) {
        self.session.pointer_down(button, x, y);
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&self, x: f64, y: f64) {
        self.session.pointer_move(x, y);
    }

    /// Pointer release or leave.
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&self) {
        self.session.pointer_up();
    }

    #[wasm_bindgen(js_name = selectAnimation)]
    pub fn select_animation(&self, name: &str) -> Result<(), JsError> {
        self.session.select_animation(name).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = selectSkin)]
    pub fn select_skin(&self, name: &str) -> Result<(), JsError> {
        self.session.select_skin(name).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = setPlaying)]
    pub fn set_playing(&self, playing: bool) {
        self.session.set_playing(playing);
    }

    #[wasm_bindgen(js_name = togglePlaying)]
    pub fn toggle_playing(&self) {
        self.session.toggle_playing();
    }

    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.session.playback().playing
    }

    #[wasm_bindgen(js_name = setSpeed)]
    pub fn set_speed(&self, speed: f32) {
        self.session.set_speed(speed);
    }

    pub fn speed(&self) -> f32 {
        self.session.playback().speed
    }

    #[wasm_bindgen(js_name = setShowDebug)]
    pub fn set_show_debug(&self, show: bool) {
        self.session.set_show_debug(show);
    }

    #[wasm_bindgen(js_name = stageLabel)]
    pub fn stage_label(&self) -> String {
        self.session.stage_label().to_string()
    }

    pub fn progress(&self) -> u8 {
        self.session.progress_percent()
    }

    #[wasm_bindgen(js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        self.session.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.session.error()
    }

    pub fn logs(&self) -> Array {
        strings(self.session.logs())
    }

    pub fn animations(&self) -> Array {
        strings(self.session.animations())
    }

    pub fn skins(&self) -> Array {
        strings(self.session.skins())
    }

    #[wasm_bindgen(js_name = selectedAnimation)]
    pub fn selected_animation(&self) -> Option<String> {
        self.session.selected_animation()
    }

    #[wasm_bindgen(js_name = selectedSkin)]
    pub fn selected_skin(&self) -> Option<String> {
        self.session.selected_skin()
    }

    #[wasm_bindgen(js_name = capabilityReport)]
    pub fn capability_report(&self) -> Array {
        strings(self.session.capability_report())
    }

    #[wasm_bindgen(js_name = hasDebugRenderer)]
    pub fn has_debug_renderer(&self) -> bool {
        self.session.has_debug_renderer()
    }
}
