//! Session configuration.

/// Runtime bundle loaded by the browser host when none is present.
pub const DEFAULT_RUNTIME_URL: &str =
    "https://unpkg.com/@esotericsoftware/spine-webgl@4.2.27/dist/iife/spine-webgl.js";

/// Tunables for the session pipeline and render loop.
///
/// Every field has a default, so partial `session.toml` files are accepted.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Script URL for the skeletal-animation runtime
    pub runtime_url: String,
    /// Delay between asset manager completion checks
    pub poll_interval_ms: u32,
    /// Number of completion checks before the load times out
    pub max_poll_attempts: u32,
    /// Number of entries kept by the log sink
    pub log_capacity: usize,
    /// Camera viewport scale applied to the skeleton bounds
    pub viewport_margin: f32,
    /// Bounds extent used when the runtime cannot compute bounds
    pub default_extent: (f32, f32),
    /// Frame delta in seconds used for the first wall-clock frame
    pub fallback_frame_delta: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            runtime_url: DEFAULT_RUNTIME_URL.to_string(),
            poll_interval_ms: 100,
            max_poll_attempts: 100,
            log_capacity: 10,
            viewport_margin: 1.4,
            default_extent: (400.0, 400.0),
            fallback_frame_delta: 1.0 / 60.0,
        }
    }
}

impl SessionConfig {
    /// Parse a `session.toml` string into `SessionConfig`.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Total time the asset load may take before it is abandoned.
    pub fn load_timeout_ms(&self) -> u64 {
        self.poll_interval_ms as u64 * self.max_poll_attempts as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_ten_seconds() {
        let config = SessionConfig::default();
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.max_poll_attempts, 100);
        assert_eq!(config.load_timeout_ms(), 10_000);
    }

    #[test]
    fn default_margin_and_extent() {
        let config = SessionConfig::default();
        assert!((config.viewport_margin - 1.4).abs() < f32::EPSILON);
        assert_eq!(config.default_extent, (400.0, 400.0));
        assert_eq!(config.log_capacity, 10);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn partial_toml() {
        let config = SessionConfig::from_toml_str("poll_interval_ms = 50\nlog_capacity = 4\n").unwrap();
        assert_eq!(config.poll_interval_ms, 50);
        assert_eq!(config.log_capacity, 4);
        assert_eq!(config.max_poll_attempts, 100);
        assert_eq!(config.runtime_url, DEFAULT_RUNTIME_URL);
    }
}
