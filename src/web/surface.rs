use wasm_bindgen::JsValue;
use web_sys::HtmlCanvasElement;

use crate::error::{RuntimeFault, RuntimeResult};
use crate::runtime::DrawingSurface;
use crate::view::ViewTransform;

/// A canvas element used as the drawing surface.
#[derive(Clone, Debug)]
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas }
    }

    #[inline]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// WebGL context of the canvas, falling back to `experimental-webgl`.
    pub fn webgl_context(&self) -> RuntimeResult<JsValue> {
        for id in ["webgl", "experimental-webgl"] {
            if let Ok(Some(context)) = self.canvas.get_context(id) {
                return Ok(context.into());
            }
        }
        Err(RuntimeFault::new("unable to create a WebGL context"))
    }
}

impl DrawingSurface for CanvasSurface {
    fn layout_size(&self) -> (f64, f64) {
        let rect = self.canvas.get_bounding_client_rect();
        (rect.width(), rect.height())
    }

    fn set_backing_size(&self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn apply_transform(&self, css: &str) {
        let style = self.canvas.style();
        if style.set_property("transform", css).is_err()
            || style.set_property("transform-origin", ViewTransform::ORIGIN_CSS).is_err()
        {
            log::warn!(target: "skelview", "failed to apply canvas transform");
        }
    }
}
