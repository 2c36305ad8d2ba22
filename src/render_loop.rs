//! Per-frame update and draw of the live skeleton.

use crate::animation::PlaybackSettings;
use crate::context::{DebugStrategy, RenderContext};
use crate::error::{RuntimeResult, SessionError};
use crate::runtime::Skeleton;

/// Fully transparent, so the host page shows behind the drawing.
pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

/// Bone line color for the manual debug overlay.
pub const BONE_LINE_COLOR: u32 = 0x00ff00;

/// Per-frame inputs that do not live in the render context.
#[derive(Clone, Copy, Debug)]
pub struct FrameSettings {
    /// Wall-clock time in seconds
    pub now: f64,
    /// Delta used on the first wall-clock frame
    pub fallback_delta: f32,
    /// Camera viewport scale over the skeleton bounds
    pub viewport_margin: f32,
    pub playback: PlaybackSettings,
}

/// What happened in one frame.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameOutcome {
    /// No context or no surface yet
    Skipped,
    /// The skeleton was drawn
    Drawn {
        /// Delta fed to the animation state
        delta: f32,
        /// Debug overlay failure, if the overlay was requested and failed
        debug_error: Option<String>,
    },
    /// The frame threw and was skipped
    Failed(String),
}

/// Update and draw one frame.
///
/// Errors are `RenderRuntime` failures; the caller logs them and keeps the
/// loop running.
pub fn render_frame(
    context: Option<&mut RenderContext>,
    surface_attached: bool,
    settings: &FrameSettings,
) -> Result<FrameOutcome, SessionError> {
    let Some(context) = context else {
        return Ok(FrameOutcome::Skipped);
    };
    if !surface_attached {
        return Ok(FrameOutcome::Skipped);
    }

    let raw = context.frame_delta(settings.now, settings.fallback_delta);
    let delta = settings.playback.scaled_delta(raw);

    draw_skeleton(context, delta, settings.viewport_margin).map_err(|e| SessionError::RenderRuntime(e.to_string()))?;

    let debug_error = if settings.playback.show_debug {
        draw_debug_overlay(context).err().map(|e| {
            log::warn!(target: "skelview", "debug draw failed: {e}");
            e.to_string()
        })
    } else {
        None
    };

    Ok(FrameOutcome::Drawn { delta, debug_error })
}

fn draw_skeleton(context: &mut RenderContext, delta: f32, margin: f32) -> RuntimeResult<()> {
    context.state.update(delta);
    context.state.apply(context.skeleton.as_mut())?;
    context.update_world_transform();

    context.renderer.set_viewport(context.bounds.extent.scale(margin));
    context.renderer.resize()?;

    context.renderer.clear(CLEAR_COLOR)?;
    context.renderer.enable_alpha_blend()?;

    context.renderer.begin()?;
    context.renderer.draw_skeleton(context.skeleton.as_ref(), true)?;
    context.renderer.end()
}

/// Draw the overlay with the strategy resolved at build time.
fn draw_debug_overlay(context: &mut RenderContext) -> RuntimeResult<()> {
    let Some(strategy) = context.debug_strategy else {
        return Ok(());
    };
    let skeleton: &dyn Skeleton = context.skeleton.as_ref();

    match strategy {
        DebugStrategy::DebugRenderer => match context.debug_renderer.as_mut() {
            Some(debug) => debug.draw_skeleton(skeleton),
            None => Ok(()),
        },
        DebugStrategy::Embedded => context.renderer.draw_embedded_debug(skeleton),
        DebugStrategy::BoneLines => match context.debug_renderer.as_mut() {
            Some(debug) => {
                for segment in skeleton.bone_segments() {
                    debug.line(segment.from, segment.to, BONE_LINE_COLOR)?;
                }
                Ok(())
            }
            None => Ok(()),
        },
    }
}
