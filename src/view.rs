//! Pan/zoom view controller for the drawing surface.

/// Zoom limits and wheel step factors.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewLimits {
    /// Smallest zoom factor
    pub min_zoom: f64,
    /// Largest zoom factor
    pub max_zoom: f64,
    /// Zoom multiplier for scrolling down
    pub zoom_out_step: f64,
    /// Zoom multiplier for scrolling up
    pub zoom_in_step: f64,
}

impl Default for ViewLimits {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 5.0,
            zoom_out_step: 0.9,
            zoom_in_step: 1.1,
        }
    }
}

impl ViewLimits {
    #[inline]
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.max(self.min_zoom).min(self.max_zoom)
    }
}

/// Zoom, pan and drag tracking for one drawing surface.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    pub zoom: f64,
    pub pan: (f64, f64),
    pub dragging: bool,
    pub drag_anchor: (f64, f64),
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: (0.0, 0.0),
            dragging: false,
            drag_anchor: (0.0, 0.0),
        }
    }
}

/// Visual transform applied to the drawing surface.
///
/// Scale by `scale`, then translate by `translate`, anchored at the
/// surface's center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    pub translate: (f64, f64),
}

impl ViewTransform {
    /// CSS `transform` value.
    pub fn css(&self) -> String {
        format!(
            "scale({}) translate({}px, {}px)",
            self.scale, self.translate.0, self.translate.1
        )
    }

    /// CSS `transform-origin` value.
    pub const ORIGIN_CSS: &'static str = "center center";
}

/// Primary pointer button.
pub const PRIMARY_BUTTON: i16 = 0;

/// Platform-agnostic pan/zoom controller.
///
/// ## Example
///
/// ```rust
/// use skelview_core::ViewController;
///
/// let mut view = ViewController::new();
/// view.wheel(100.0);
/// assert_eq!(view.zoom(), 0.9);
///
/// view.pointer_down(0, 10.0, 10.0);
/// view.pointer_move(30.0, 50.0);
/// assert_eq!(view.pan(), (20.0, 40.0));
///
/// view.reset();
/// assert_eq!(view.zoom(), 1.0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ViewController {
    state: ViewState,
    limits: ViewLimits,
}

impl ViewController {
    /// Create a controller at identity with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ViewLimits) -> Self {
        Self {
            state: ViewState::default(),
            limits,
        }
    }

    #[inline]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    #[inline]
    pub fn zoom(&self) -> f64 {
        self.state.zoom
    }

    #[inline]
    pub fn pan(&self) -> (f64, f64) {
        self.state.pan
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.state.dragging
    }

    /// Set zoom, clamped to the limits. NaN is ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_nan() {
            return;
        }
        self.state.zoom = self.limits.clamp_zoom(zoom);
    }

    pub fn set_pan(&mut self, x: f64, y: f64) {
        self.state.pan = (x, y);
    }

    /// Apply a wheel event. Positive `delta_y` (scroll down) zooms out.
    ///
    /// Returns the new zoom.
    pub fn wheel(&mut self, delta_y: f64) -> f64 {
        let step = if delta_y > 0.0 {
            self.limits.zoom_out_step
        } else {
            self.limits.zoom_in_step
        };
        self.set_zoom(self.state.zoom * step);
        self.state.zoom
    }

    /// Start a drag. Only the primary button drags.
    pub fn pointer_down(&mut self, button: i16, x: f64, y: f64) {
        if button != PRIMARY_BUTTON {
            return;
        }
        self.state.dragging = true;
        self.state.drag_anchor = (x - self.state.pan.0, y - self.state.pan.1);
    }

    /// Track the pointer during a drag.
    ///
    /// Returns `true` when the pan changed.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        if !self.state.dragging {
            return false;
        }
        let anchor = self.state.drag_anchor;
        self.state.pan = (x - anchor.0, y - anchor.1);
        true
    }

    /// End a drag (release or pointer leaving the surface). No inertia.
    pub fn pointer_up(&mut self) {
        self.state.dragging = false;
    }

    /// Return to zoom 1 and no pan.
    pub fn reset(&mut self) {
        self.state.zoom = 1.0;
        self.state.pan = (0.0, 0.0);
    }

    /// Transform for the surface. Pan is divided by zoom so perceived pan
    /// speed does not depend on the zoom level.
    pub fn transform(&self) -> ViewTransform {
        let zoom = self.state.zoom;
        ViewTransform {
            scale: zoom,
            translate: (self.state.pan.0 / zoom, self.state.pan.1 / zoom),
        }
    }
}

/// Backing pixel size matching a layout box.
#[inline]
pub fn backing_size(layout: (f64, f64)) -> (u32, u32) {
    (layout.0.max(0.0) as u32, layout.1.max(0.0) as u32)
}
