//! Animation and skin selection, and playback settings.

/// Name reported when skeleton data has no skins, or an unnamed one.
pub const DEFAULT_SKIN: &str = "default";

/// Animations and skins of the live skeleton, with the current selection.
///
/// Rebuilt every time a new render context is built.
///
/// ## Example
///
/// ```rust
/// use skelview_core::AnimationCatalog;
///
/// let catalog = AnimationCatalog::new(vec!["idle".into(), "hop".into()], vec![]);
/// assert_eq!(catalog.selected_animation(), Some("idle"));
/// assert_eq!(catalog.skins(), ["default".to_string()]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnimationCatalog {
    animations: Vec<String>,
    skins: Vec<String>,
    selected_animation: Option<String>,
    selected_skin: Option<String>,
}

impl AnimationCatalog {
    /// Build a catalog selecting the first animation and first skin.
    ///
    /// An empty skin list becomes `["default"]`; unnamed skins are reported
    /// as `"default"`.
    pub fn new(animations: Vec<String>, skins: Vec<Option<String>>) -> Self {
        let mut skins: Vec<String> = skins
            .into_iter()
            .map(|s| s.unwrap_or_else(|| DEFAULT_SKIN.to_string()))
            .collect();
        if skins.is_empty() {
            skins.push(DEFAULT_SKIN.to_string());
        }

        Self {
            selected_animation: animations.first().cloned(),
            selected_skin: skins.first().cloned(),
            animations,
            skins,
        }
    }

    /// Forget everything (used while a new work loads).
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn animations(&self) -> &[String] {
        &self.animations
    }

    #[inline]
    pub fn skins(&self) -> &[String] {
        &self.skins
    }

    #[inline]
    pub fn selected_animation(&self) -> Option<&str> {
        self.selected_animation.as_deref()
    }

    #[inline]
    pub fn selected_skin(&self) -> Option<&str> {
        self.selected_skin.as_deref()
    }

    pub fn has_animation(&self, name: &str) -> bool {
        self.animations.iter().any(|a| a == name)
    }

    pub fn has_skin(&self, name: &str) -> bool {
        self.skins.iter().any(|s| s == name)
    }

    /// Record an applied animation selection.
    pub fn set_selected_animation(&mut self, name: &str) {
        self.selected_animation = Some(name.to_string());
    }

    /// Record an applied skin selection.
    pub fn set_selected_skin(&mut self, name: &str) {
        self.selected_skin = Some(name.to_string());
    }
}

/// Playback speed range offered to the user.
pub const MIN_SPEED: f32 = 0.1;
pub const MAX_SPEED: f32 = 3.0;

/// User playback settings consulted by the render loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackSettings {
    /// Advance animations; when false frames still draw with a zero delta
    pub playing: bool,
    /// Multiplier applied to the frame delta
    pub speed: f32,
    /// Draw the debug overlay
    pub show_debug: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            playing: true,
            speed: 1.0,
            show_debug: false,
        }
    }
}

impl PlaybackSettings {
    /// Set the speed multiplier, clamped to `[0.1, 3.0]`.
    ///
    /// Non-finite values are ignored.
    pub fn set_speed(&mut self, speed: f32) {
        if speed.is_finite() {
            self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        }
    }

    /// Toggle play/pause.
    pub fn toggle(&mut self) {
        self.playing = !self.playing;
    }

    /// Delta to feed the animation state for a raw frame delta.
    #[inline]
    pub fn scaled_delta(&self, raw: f32) -> f32 {
        if self.playing {
            raw * self.speed
        } else {
            0.0
        }
    }
}
