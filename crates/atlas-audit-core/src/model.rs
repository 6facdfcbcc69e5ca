use crate::diagnostics::Diagnostics;
use crate::platform::Platform;
use crate::profile::ImportProfile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Pixel geometry of a texture, absent when the underlying pixel data
/// cannot be loaded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub is_pot: bool,
    pub is_multiple_of_four: bool,
}

impl Geometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            is_pot: is_power_of_two(width) && is_power_of_two(height),
            is_multiple_of_four: width % 4 == 0 && height % 4 == 0,
        }
    }
}

pub fn is_power_of_two(x: u32) -> bool {
    x != 0 && (x & (x - 1)) == 0
}

/// How a packable rule selects textures: by exact file path, or by
/// directory-bounded path prefix. The kind is inferred from the key's
/// shape; a key with a file extension is an exact file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RuleKind {
    ExactFile,
    FolderPrefix,
}

/// One declared entry of an atlas's contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackableRule {
    pub key: String,
    pub kind: RuleKind,
    /// Textures resolved to this rule during a scan.
    pub matched: Vec<TextureAsset>,
}

impl PackableRule {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let kind = if Path::new(&key).extension().is_some() {
            RuleKind::ExactFile
        } else {
            RuleKind::FolderPrefix
        };
        Self {
            key,
            kind,
            matched: Vec::new(),
        }
    }
}

/// A packed-texture container: its declared packable rules, per-platform
/// import profiles, and accumulated diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasAsset {
    pub path: String,
    pub type_name: String,
    pub bytes_size: u64,
    pub rules: Vec<PackableRule>,
    pub profiles: BTreeMap<Platform, ImportProfile>,
    /// Sum of rule-match counts; derived after all textures are resolved.
    pub sprite_count: usize,
    pub diagnostics: Diagnostics,
    /// Withheld from report output by the ignore patterns. Ignored atlases
    /// still participate in matching and classification.
    pub ignored: bool,
}

impl AtlasAsset {
    pub fn new(path: impl Into<String>, type_name: impl Into<String>, bytes_size: u64) -> Self {
        Self {
            path: path.into(),
            type_name: type_name.into(),
            bytes_size,
            rules: Vec::new(),
            profiles: BTreeMap::new(),
            sprite_count: 0,
            diagnostics: Diagnostics::default(),
            ignored: false,
        }
    }

    /// File name portion of the atlas path.
    pub fn name(&self) -> &str {
        file_name(&self.path)
    }

    pub fn update_sprite_count(&mut self) {
        self.sprite_count = self.rules.iter().map(|r| r.matched.len()).sum();
    }

    pub fn readable_size(&self) -> String {
        readable_size(self.bytes_size)
    }
}

/// A standalone image asset discovered during a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureAsset {
    pub path: String,
    pub type_name: String,
    pub bytes_size: u64,
    pub geometry: Option<Geometry>,
    /// Path lies under a `Resources/` directory (shipped verbatim in builds).
    pub in_resources: bool,
    /// Registered as a build-time addressable entry.
    pub is_addressable: bool,
    pub profiles: BTreeMap<Platform, ImportProfile>,
    /// Path of the atlas this texture was resolved into, if any.
    pub atlas: Option<String>,
    pub diagnostics: Diagnostics,
    /// Withheld from report output by the ignore patterns.
    pub ignored: bool,
}

impl TextureAsset {
    pub fn new(path: impl Into<String>, type_name: impl Into<String>, bytes_size: u64) -> Self {
        let path = path.into();
        let in_resources = path.contains("/Resources/");
        Self {
            path,
            type_name: type_name.into(),
            bytes_size,
            geometry: None,
            in_resources,
            is_addressable: false,
            profiles: BTreeMap::new(),
            atlas: None,
            diagnostics: Diagnostics::default(),
            ignored: false,
        }
    }

    pub fn name(&self) -> &str {
        file_name(&self.path)
    }

    pub fn readable_size(&self) -> String {
        readable_size(self.bytes_size)
    }
}

/// File name portion of an asset path, tolerating both separator styles.
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Human-readable byte size, e.g. `1.5 MB`, with up to two decimals.
pub fn readable_size(bytes: u64) -> String {
    const SIZES: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut len = bytes as f64;
    let mut order = 0;
    while len >= 1024.0 && order < SIZES.len() - 1 {
        order += 1;
        len /= 1024.0;
    }
    let formatted = format!("{:.2}", len);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZES[order])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_kind_inferred_from_key_shape() {
        assert_eq!(
            PackableRule::new("Assets/UI/icon.png").kind,
            RuleKind::ExactFile
        );
        assert_eq!(PackableRule::new("Assets/UI").kind, RuleKind::FolderPrefix);
        assert_eq!(PackableRule::new("Assets/UI/").kind, RuleKind::FolderPrefix);
    }

    #[test]
    fn geometry_flags() {
        let g = Geometry::new(256, 512);
        assert!(g.is_pot);
        assert!(g.is_multiple_of_four);
        let g = Geometry::new(100, 100);
        assert!(!g.is_pot);
        assert!(g.is_multiple_of_four);
        let g = Geometry::new(99, 100);
        assert!(!g.is_pot);
        assert!(!g.is_multiple_of_four);
    }

    #[test]
    fn readable_size_formatting() {
        assert_eq!(readable_size(512), "512 B");
        assert_eq!(readable_size(1536), "1.5 KB");
        assert_eq!(readable_size(3 * 1024 * 1024), "3 MB");
    }

    #[test]
    fn resources_flag_derived_from_path() {
        assert!(TextureAsset::new("Assets/Resources/icon.png", "Texture2D", 0).in_resources);
        assert!(!TextureAsset::new("Assets/UI/icon.png", "Texture2D", 0).in_resources);
    }
}
