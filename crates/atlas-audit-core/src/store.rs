use crate::error::Result;
use crate::format::TextureFormat;
use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What kind of asset lives at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Atlas,
    Texture,
    Other,
}

/// Raw per-platform import declaration as the store exposes it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformSettings {
    /// An explicit override is declared for this platform.
    pub overridden: bool,
    pub format: TextureFormat,
    pub compression_quality: u32,
}

impl PlatformSettings {
    /// Settings for a platform with no explicit declaration.
    pub fn automatic() -> Self {
        Self {
            overridden: false,
            format: TextureFormat::Automatic,
            compression_quality: 50,
        }
    }
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self::automatic()
    }
}

/// Importer-level flags of a texture, independent of platform.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ImporterFlags {
    pub mipmap_enabled: bool,
    pub readable: bool,
}

/// The project asset store the engine audits.
///
/// The engine never touches pixel data or the filesystem itself; everything
/// it needs is behind this trait so the classifier and resolver can be
/// tested against deterministic fakes ([`MemoryStore`]).
pub trait AssetStore {
    /// Every asset path in the project, in discovery order.
    fn all_asset_paths(&self) -> Vec<String>;

    fn asset_kind(&self, path: &str) -> AssetKind;

    /// Readable type name for reporting.
    fn type_name(&self, path: &str) -> String {
        match self.asset_kind(path) {
            AssetKind::Atlas => "SpriteAtlas".into(),
            AssetKind::Texture => "Texture2D".into(),
            AssetKind::Other => "Unknown Type".into(),
        }
    }

    fn byte_size(&self, path: &str) -> u64;

    /// Pixel dimensions, or `None` when pixel data cannot be loaded.
    fn texture_dimensions(&self, path: &str) -> Option<(u32, u32)>;

    /// Importer flags, or `None` when the import declaration cannot be
    /// loaded at all.
    fn importer_flags(&self, path: &str) -> Option<ImporterFlags>;

    /// Per-platform settings of a standalone texture. `None` only when the
    /// importer itself is missing.
    fn texture_settings(&self, path: &str, platform: Platform) -> Option<PlatformSettings>;

    /// The concrete format the platform's automatic rule would choose for
    /// this texture.
    fn automatic_format(&self, path: &str, platform: Platform) -> TextureFormat;

    /// Per-platform settings of an atlas container. `None` for the default
    /// platform means the container's settings are unreadable; `None` for
    /// other platforms means no declaration exists.
    fn atlas_settings(&self, path: &str, platform: Platform) -> Option<PlatformSettings>;

    fn atlas_mipmaps_enabled(&self, path: &str) -> bool;

    /// Declared packable entries of an atlas: file paths (with extension)
    /// or folder paths (without).
    fn atlas_packables(&self, path: &str) -> Vec<String>;

    fn write_texture_settings(
        &mut self,
        path: &str,
        platform: Platform,
        settings: &PlatformSettings,
    ) -> Result<()>;

    fn write_atlas_settings(
        &mut self,
        path: &str,
        platform: Platform,
        settings: &PlatformSettings,
    ) -> Result<()>;

    /// Re-imports an asset after its declarations changed.
    fn reimport(&mut self, path: &str) -> Result<()>;

    /// Whether the path is registered as a build-time addressable entry.
    /// Optional capability; absent by default.
    fn is_addressable(&self, _path: &str) -> bool {
        false
    }

    /// Hint that transient per-asset state can be released. Called by the
    /// cooperative scheduler between work slices.
    fn reclaim(&mut self) {}
}

// ---------------- In-memory fake ----------------

/// Texture registration for [`MemoryStore`].
#[derive(Debug, Clone, Default)]
pub struct TextureEntry {
    pub bytes: u64,
    pub dimensions: Option<(u32, u32)>,
    /// `None` models a texture whose importer cannot be loaded.
    pub importer: Option<ImporterEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct ImporterEntry {
    pub flags: ImporterFlags,
    pub platforms: BTreeMap<Platform, PlatformSettings>,
}

/// Atlas registration for [`MemoryStore`].
#[derive(Debug, Clone, Default)]
pub struct AtlasEntry {
    pub bytes: u64,
    pub mipmaps_enabled: bool,
    pub packables: Vec<String>,
    pub platforms: BTreeMap<Platform, PlatformSettings>,
}

enum MemEntry {
    Texture(TextureEntry),
    Atlas(AtlasEntry),
    Other,
}

/// Deterministic in-memory `AssetStore` used by tests and examples.
///
/// Paths keep registration order; writes mutate the registered entries so
/// idempotence of the batch engine can be asserted end to end.
#[derive(Default)]
pub struct MemoryStore {
    order: Vec<String>,
    entries: BTreeMap<String, MemEntry>,
    automatic: BTreeMap<Platform, TextureFormat>,
    addressables: Vec<String>,
    /// Paths passed to `reimport`, in call order.
    pub reimported: Vec<String>,
    /// Number of `reclaim` calls observed.
    pub reclaim_count: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut automatic = BTreeMap::new();
        automatic.insert(Platform::Default, TextureFormat::Rgba32);
        automatic.insert(Platform::Ios, TextureFormat::Astc6x6);
        automatic.insert(Platform::Android, TextureFormat::Etc2Rgba8);
        Self {
            automatic,
            ..Default::default()
        }
    }

    pub fn add_texture(&mut self, path: impl Into<String>, entry: TextureEntry) {
        let path = path.into();
        self.order.push(path.clone());
        self.entries.insert(path, MemEntry::Texture(entry));
    }

    pub fn add_atlas(&mut self, path: impl Into<String>, entry: AtlasEntry) {
        let path = path.into();
        self.order.push(path.clone());
        self.entries.insert(path, MemEntry::Atlas(entry));
    }

    pub fn add_other(&mut self, path: impl Into<String>) {
        let path = path.into();
        self.order.push(path.clone());
        self.entries.insert(path, MemEntry::Other);
    }

    pub fn add_addressable(&mut self, path: impl Into<String>) {
        self.addressables.push(path.into());
    }

    /// Overrides the automatic-format rule for a platform.
    pub fn set_automatic_format(&mut self, platform: Platform, format: TextureFormat) {
        self.automatic.insert(platform, format);
    }

    pub fn texture_entry(&self, path: &str) -> Option<&TextureEntry> {
        match self.entries.get(path) {
            Some(MemEntry::Texture(t)) => Some(t),
            _ => None,
        }
    }

    pub fn atlas_entry(&self, path: &str) -> Option<&AtlasEntry> {
        match self.entries.get(path) {
            Some(MemEntry::Atlas(a)) => Some(a),
            _ => None,
        }
    }
}

impl AssetStore for MemoryStore {
    fn all_asset_paths(&self) -> Vec<String> {
        self.order.clone()
    }

    fn asset_kind(&self, path: &str) -> AssetKind {
        match self.entries.get(path) {
            Some(MemEntry::Atlas(_)) => AssetKind::Atlas,
            Some(MemEntry::Texture(_)) => AssetKind::Texture,
            _ => AssetKind::Other,
        }
    }

    fn byte_size(&self, path: &str) -> u64 {
        match self.entries.get(path) {
            Some(MemEntry::Texture(t)) => t.bytes,
            Some(MemEntry::Atlas(a)) => a.bytes,
            _ => 0,
        }
    }

    fn texture_dimensions(&self, path: &str) -> Option<(u32, u32)> {
        self.texture_entry(path).and_then(|t| t.dimensions)
    }

    fn importer_flags(&self, path: &str) -> Option<ImporterFlags> {
        self.texture_entry(path)
            .and_then(|t| t.importer.as_ref())
            .map(|i| i.flags)
    }

    fn texture_settings(&self, path: &str, platform: Platform) -> Option<PlatformSettings> {
        let importer = self.texture_entry(path)?.importer.as_ref()?;
        Some(
            importer
                .platforms
                .get(&platform)
                .copied()
                .unwrap_or_else(PlatformSettings::automatic),
        )
    }

    fn automatic_format(&self, _path: &str, platform: Platform) -> TextureFormat {
        self.automatic
            .get(&platform)
            .copied()
            .unwrap_or(TextureFormat::Automatic)
    }

    fn atlas_settings(&self, path: &str, platform: Platform) -> Option<PlatformSettings> {
        let atlas = self.atlas_entry(path)?;
        match atlas.platforms.get(&platform) {
            Some(s) => Some(*s),
            // The default platform always has settings unless the atlas is
            // registered without any, which models an unreadable container.
            None if platform.is_default() && !atlas.platforms.is_empty() => {
                Some(PlatformSettings::automatic())
            }
            None => None,
        }
    }

    fn atlas_mipmaps_enabled(&self, path: &str) -> bool {
        self.atlas_entry(path).is_some_and(|a| a.mipmaps_enabled)
    }

    fn atlas_packables(&self, path: &str) -> Vec<String> {
        self.atlas_entry(path)
            .map(|a| a.packables.clone())
            .unwrap_or_default()
    }

    fn write_texture_settings(
        &mut self,
        path: &str,
        platform: Platform,
        settings: &PlatformSettings,
    ) -> Result<()> {
        if let Some(MemEntry::Texture(t)) = self.entries.get_mut(path) {
            if let Some(importer) = t.importer.as_mut() {
                importer.platforms.insert(platform, *settings);
            }
        }
        Ok(())
    }

    fn write_atlas_settings(
        &mut self,
        path: &str,
        platform: Platform,
        settings: &PlatformSettings,
    ) -> Result<()> {
        if let Some(MemEntry::Atlas(a)) = self.entries.get_mut(path) {
            a.platforms.insert(platform, *settings);
        }
        Ok(())
    }

    fn reimport(&mut self, path: &str) -> Result<()> {
        self.reimported.push(path.to_string());
        Ok(())
    }

    fn is_addressable(&self, path: &str) -> bool {
        self.addressables.iter().any(|p| p == path)
    }

    fn reclaim(&mut self) {
        self.reclaim_count += 1;
    }
}
