//! Pre-flight checks for the resources of an animation work.

use crate::error::SessionError;
use crate::host::Host;
use crate::work::{is_remote, AnimationWork, ResourceKind};

/// Element counts read from a skeleton data description.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DescriptionSummary {
    pub bones: usize,
    pub slots: usize,
    pub animations: usize,
}

impl DescriptionSummary {
    /// Count bones, slots and animations in a parsed description.
    ///
    /// Missing sections count as zero.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let len_of = |key: &str| value.get(key).and_then(|v| v.as_array()).map_or(0, |a| a.len());
        Self {
            bones: len_of("bones"),
            slots: len_of("slots"),
            animations: value
                .get("animations")
                .and_then(|v| v.as_object())
                .map_or(0, |o| o.len()),
        }
    }
}

/// Fetch the atlas, description and image of `work` in order.
///
/// The first non-success status aborts with that status and resource. The
/// description is parsed as JSON and its element counts are reported through
/// `on_log`.
///
/// `checkpoint` runs after every fetch; its error stops validation before
/// the response is looked at.
pub async fn validate_assets<H, C, L>(
    host: &H,
    work: &AnimationWork,
    checkpoint: C,
    on_log: L,
) -> Result<DescriptionSummary, SessionError>
where
    H: Host,
    C: Fn() -> Result<(), SessionError>,
    L: Fn(String),
{
    on_log(format!("validating resources for {}", work.name));

    let mut summary = DescriptionSummary::default();
    for resource in ResourceKind::ALL {
        let path = work.resource_path(resource);
        let response = host.fetch(path).await;
        checkpoint()?;
        let response = response.map_err(|reason| SessionError::AssetFetch { resource, reason })?;

        if !response.ok() {
            return Err(SessionError::AssetValidation {
                resource,
                status: response.status,
            });
        }

        let origin = if is_remote(path) { "remote" } else { "local" };
        match resource {
            ResourceKind::Atlas => {
                on_log(format!("atlas loaded ({} chars, {origin})", response.body.chars().count()));
            }
            ResourceKind::Description => {
                let value: serde_json::Value = serde_json::from_str(&response.body)
                    .map_err(|e| SessionError::AssetParse { resource, reason: e.to_string() })?;
                summary = DescriptionSummary::from_value(&value);
                on_log(format!("skeleton data loaded ({origin})"));
                on_log(format!(
                    "skeleton data has bones({}), slots({}), animations({})",
                    summary.bones, summary.slots, summary.animations
                ));
            }
            ResourceKind::Image => {
                on_log(format!("image loaded ({origin})"));
            }
        }
    }

    Ok(summary)
}
