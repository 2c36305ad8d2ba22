//! Asset-set descriptions supplied by the external catalog.

/// One selectable asset set: a texture atlas, a skeleton data description
/// and the atlas page image, plus display metadata.
///
/// Values are owned by the catalog; the session only reads them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AnimationWork {
    /// Stable identifier used to detect re-selection of the same work
    pub id: String,
    /// Display name
    pub name: String,
    /// Short description shown next to the drawing surface
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,
    /// Thumbnail URI for list views
    #[cfg_attr(feature = "serde", serde(default))]
    pub thumbnail: String,
    /// URI of the `.atlas` texture atlas
    pub atlas_path: String,
    /// URI of the skeleton data description (`.json`)
    pub json_path: String,
    /// URI of the atlas page image (`.png`)
    pub image_path: String,
}

impl AnimationWork {
    /// Create a work from its identity and the three resource URIs.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        atlas_path: impl Into<String>,
        json_path: impl Into<String>,
        image_path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            atlas_path: atlas_path.into(),
            json_path: json_path.into(),
            image_path: image_path.into(),
            ..Default::default()
        }
    }

    /// Get the URI for one of the required resources.
    pub fn resource_path(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::Atlas => &self.atlas_path,
            ResourceKind::Description => &self.json_path,
            ResourceKind::Image => &self.image_path,
        }
    }

    /// Check whether two values describe the same catalog entry.
    #[inline]
    pub fn same_entry(&self, other: &AnimationWork) -> bool {
        self.id == other.id
    }
}

/// The three resources every work must provide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Texture atlas text
    Atlas,
    /// Skeleton data description (structured JSON)
    Description,
    /// Atlas page image
    Image,
}

impl ResourceKind {
    /// Validation order. Atlas and description precede the skeleton build.
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Atlas, ResourceKind::Description, ResourceKind::Image];

    /// Short label used in log lines and error messages.
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Atlas => "atlas",
            ResourceKind::Description => "skeleton data",
            ResourceKind::Image => "image",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Check whether a resource URI points at a remote origin.
#[inline]
pub fn is_remote(path: &str) -> bool {
    path.starts_with("http")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_path() {
        let work = AnimationWork::new(
            "pinkbunny",
            "Pink Bunny",
            "/assets/pinkbunny.atlas",
            "/assets/pinkbunny.json",
            "/assets/pinkbunny.png",
        );

        assert_eq!(work.resource_path(ResourceKind::Atlas), "/assets/pinkbunny.atlas");
        assert_eq!(work.resource_path(ResourceKind::Description), "/assets/pinkbunny.json");
        assert_eq!(work.resource_path(ResourceKind::Image), "/assets/pinkbunny.png");
    }

    #[test]
    fn test_same_entry_compares_ids() {
        let a = AnimationWork::new("a", "A", "x.atlas", "x.json", "x.png");
        let mut edited = a.clone();
        edited.json_path = "y.json".into();
        let b = AnimationWork::new("b", "A", "x.atlas", "x.json", "x.png");

        assert!(a.same_entry(&edited));
        assert!(!a.same_entry(&b));
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://cdn.example.com/a.atlas"));
        assert!(!is_remote("/assets/a.atlas"));
    }
}
