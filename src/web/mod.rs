//! Browser binding.
//!
//! [`WebHost`] reaches the network, timers and `requestAnimationFrame`;
//! [`JsRuntime`] drives the script-loaded `window.spine` object; and
//! [`SkeletonViewer`] exposes a session to JavaScript.

mod host;
mod runtime;
mod surface;
mod viewer;

pub use host::WebHost;
pub use runtime::JsRuntime;
pub use surface::CanvasSurface;
pub use viewer::SkeletonViewer;

use js_sys::{Array, Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};

use crate::error::{RuntimeFault, RuntimeResult};

/// Turn a thrown JS value into a runtime fault.
pub(crate) fn fault(value: JsValue) -> RuntimeFault {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return RuntimeFault::new(String::from(error.message()));
    }
    RuntimeFault::new(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

/// Property `key` of `target`, or `None` when it is missing or null.
pub(crate) fn member(target: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

pub(crate) fn set(target: &JsValue, key: &str, value: &JsValue) -> RuntimeResult<()> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(fault)
}

pub(crate) fn number(target: &JsValue, key: &str) -> f32 {
    member(target, key).and_then(|v| v.as_f64()).unwrap_or(0.0) as f32
}

pub(crate) fn has_method(target: &JsValue, name: &str) -> bool {
    member(target, name).is_some_and(|v| v.is_function())
}

/// `target[name](...args)`
pub(crate) fn call(target: &JsValue, name: &str, args: &[&JsValue]) -> RuntimeResult<JsValue> {
    let method = member(target, name)
        .and_then(|v| v.dyn_into::<Function>().ok())
        .ok_or_else(|| RuntimeFault::new(format!("{name} is not a function")))?;
    let args: Array = args.iter().copied().collect();
    Reflect::apply(&method, target, &args).map_err(fault)
}

/// `new namespace[class](...args)`
pub(crate) fn construct(namespace: &JsValue, class: &str, args: &[&JsValue]) -> RuntimeResult<JsValue> {
    let constructor = member(namespace, class)
        .and_then(|v| v.dyn_into::<Function>().ok())
        .ok_or_else(|| RuntimeFault::new(format!("spine.{class} is unavailable")))?;
    let args: Array = args.iter().copied().collect();
    Reflect::construct(&constructor, &args).map_err(fault)
}
