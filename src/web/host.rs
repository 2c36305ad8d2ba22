use std::cell::RefCell;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlCanvasElement, HtmlScriptElement, Response};

use super::{fault, CanvasSurface, JsRuntime};
use crate::host::{FetchResponse, Host, HostResult};

fn js_message(value: JsValue) -> String {
    fault(value).to_string()
}

/// Browser host: `fetch`, `setTimeout`, `requestAnimationFrame` and
/// script-tag loading of the runtime.
#[derive(Clone, Debug)]
pub struct WebHost {
    runtime_url: String,
}

impl WebHost {
    pub fn new(runtime_url: impl Into<String>) -> Self {
        Self {
            runtime_url: runtime_url.into(),
        }
    }
}

/// Append a `<script src=url>` to the document head and wait for it to run.
async fn inject_script(url: &str) -> HostResult<()> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or("No document available")?;
    let script = document
        .create_element("script")
        .map_err(js_message)?
        .dyn_into::<HtmlScriptElement>()
        .map_err(|_| "Failed to cast element to HtmlScriptElement")?;
    script.set_src(url);

    let loaded = js_sys::Promise::new(&mut |resolve, reject| {
        script.set_onload(Some(&resolve));
        script.set_onerror(Some(&reject));
    });

    let head = document.head().ok_or("No head element available")?;
    head.append_child(&script).map_err(js_message)?;

    JsFuture::from(loaded)
        .await
        .map(|_| ())
        .map_err(|_| format!("failed to load runtime script from {url}"))
}

fn request_frame(callback: &Closure<dyn FnMut()>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Err(e) = window.request_animation_frame(callback.as_ref().unchecked_ref()) {
        log::error!(target: "skelview", "requestAnimationFrame failed: {}", js_message(e));
    }
}

impl Host for WebHost {
    type Surface = CanvasSurface;
    type Runtime = JsRuntime;

    fn accelerated_context_available(&self) -> bool {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return false;
        };
        document
            .create_element("canvas")
            .ok()
            .and_then(|element| element.dyn_into::<HtmlCanvasElement>().ok())
            .is_some_and(|canvas| CanvasSurface::new(canvas).webgl_context().is_ok())
    }

    fn load_runtime(&self) -> LocalBoxFuture<'static, HostResult<Rc<JsRuntime>>> {
        let url = self.runtime_url.clone();
        async move {
            if let Some(runtime) = JsRuntime::from_window() {
                log::info!(target: "skelview", "runtime already present");
                return Ok(Rc::new(runtime));
            }
            log::info!(target: "skelview", "loading runtime from {url}");
            inject_script(&url).await?;
            JsRuntime::from_window()
                .map(Rc::new)
                .ok_or_else(|| "runtime script ran but window.spine is missing".to_string())
        }
        .boxed_local()
    }

    async fn fetch(&self, url: &str) -> HostResult<FetchResponse> {
        let window = web_sys::window().ok_or("No window available")?;
        let response = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(js_message)?
            .dyn_into::<Response>()
            .map_err(|_| "fetch did not return a Response")?;

        let body = JsFuture::from(response.text().map_err(js_message)?)
            .await
            .map_err(js_message)?;
        Ok(FetchResponse::new(response.status(), body.as_string().unwrap_or_default()))
    }

    async fn sleep(&self, ms: u32) {
        let timeout = i32::try_from(ms).unwrap_or(i32::MAX);
        let promise = js_sys::Promise::new(&mut |resolve, _| {
            let scheduled = web_sys::window()
                .map(|window| window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout));
            if !matches!(scheduled, Some(Ok(_))) {
                // Without a timer the wait ends now; the poll budget still applies.
                let _ = resolve.call0(&JsValue::NULL);
            }
        });
        let _ = JsFuture::from(promise).await;
    }

    fn now_seconds(&self) -> f64 {
        js_sys::Date::now() / 1000.0
    }

    fn clock_label(&self) -> String {
        js_sys::Date::new_0().to_locale_time_string("default").into()
    }

    fn start_frame_loop(&self, mut tick: Box<dyn FnMut()>) {
        // The closure reschedules itself through this slot, so it lives for
        // the rest of the page.
        let slot: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
        let next = slot.clone();

        *slot.borrow_mut() = Some(Closure::new(move || {
            tick();
            if let Some(callback) = next.borrow().as_ref() {
                request_frame(callback);
            }
        }));

        if let Some(callback) = slot.borrow().as_ref() {
            request_frame(callback);
        }
    }
}
