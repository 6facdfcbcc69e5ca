//! Filesystem-backed [`AssetStore`].
//!
//! The project layout it understands:
//! - image files (`.png`, `.jpg`, ...) are textures
//! - `<name>.atlas.json` documents are sprite atlases
//! - `<texture path>.import` JSON sidecars hold importer flags and
//!   per-platform settings; a texture without a sidecar uses defaults
//! - an optional `addressables.json` at the root lists addressable paths

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use atlas_audit_core::error::{AuditError, Result};
use atlas_audit_core::format::TextureFormat;
use atlas_audit_core::platform::Platform;
use atlas_audit_core::store::{AssetKind, AssetStore, ImporterFlags, PlatformSettings};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use walkdir::WalkDir;

const ATLAS_SUFFIX: &str = ".atlas.json";
const IMPORT_SUFFIX: &str = ".import";
const ADDRESSABLES_FILE: &str = "addressables.json";

/// On-disk shape of a texture's `.import` sidecar.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ImportSidecar {
    mipmap_enabled: bool,
    readable: bool,
    /// Keyed by platform name (`default`, `ios`, `android`).
    platforms: BTreeMap<String, PlatformSettings>,
}

/// On-disk shape of a `.atlas.json` document.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct AtlasDoc {
    mipmaps_enabled: bool,
    packables: Vec<String>,
    platforms: BTreeMap<String, PlatformSettings>,
}

fn platform_key(platform: Platform) -> &'static str {
    match platform {
        Platform::Default => "default",
        Platform::Ios => "ios",
        Platform::Android => "android",
    }
}

fn is_image(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "tga" | "gif")
    )
}

/// Discovers and serves project assets from a directory tree.
pub struct FsStore {
    root: PathBuf,
    paths: Vec<String>,
    kinds: HashMap<String, AssetKind>,
    addressables: HashSet<String>,
    automatic: BTreeMap<Platform, TextureFormat>,
    /// Probed pixel dimensions; dropped on `reclaim`.
    dimensions: RefCell<HashMap<String, Option<(u32, u32)>>>,
}

impl FsStore {
    /// Walks `root` and indexes every asset matching the include/exclude
    /// glob patterns (empty include means everything).
    pub fn open(root: &Path, include: &[String], exclude: &[String]) -> anyhow::Result<Self> {
        let include = build_globset(include)?;
        let exclude = build_globset(exclude)?;

        let mut paths = Vec::new();
        let mut kinds = HashMap::new();
        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if !p.is_file() {
                continue;
            }
            let rel = match p.strip_prefix(root) {
                Ok(r) => r.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            };
            if rel == ADDRESSABLES_FILE || rel.ends_with(IMPORT_SUFFIX) {
                continue;
            }
            if let Some(ex) = &exclude {
                if ex.is_match(&rel) {
                    continue;
                }
            }
            if let Some(inc) = &include {
                if !inc.is_match(&rel) {
                    continue;
                }
            }
            let kind = if rel.ends_with(ATLAS_SUFFIX) {
                AssetKind::Atlas
            } else if is_image(p) {
                AssetKind::Texture
            } else {
                continue;
            };
            kinds.insert(rel.clone(), kind);
            paths.push(rel);
        }

        let addressables = load_addressables(&root.join(ADDRESSABLES_FILE))?;
        debug!(
            assets = paths.len(),
            addressables = addressables.len(),
            root = %root.display(),
            "indexed project"
        );

        let mut automatic = BTreeMap::new();
        automatic.insert(Platform::Default, TextureFormat::Rgba32);
        automatic.insert(Platform::Ios, TextureFormat::Astc6x6);
        automatic.insert(Platform::Android, TextureFormat::Etc2Rgba8);

        Ok(Self {
            root: root.to_path_buf(),
            paths,
            kinds,
            addressables,
            automatic,
            dimensions: RefCell::new(HashMap::new()),
        })
    }

    /// Overrides what the automatic rule resolves to for a platform.
    pub fn set_automatic_format(&mut self, platform: Platform, format: TextureFormat) {
        self.automatic.insert(platform, format);
    }

    fn abs(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    fn sidecar_path(&self, rel: &str) -> PathBuf {
        self.root.join(format!("{rel}{IMPORT_SUFFIX}"))
    }

    /// Missing sidecar means importer defaults; a present but unreadable
    /// one means the importer cannot be loaded.
    fn load_sidecar(&self, rel: &str) -> Option<ImportSidecar> {
        let path = self.sidecar_path(rel);
        if !path.exists() {
            return Some(ImportSidecar::default());
        }
        let data = match fs::read_to_string(&path) {
            Ok(d) => d,
            Err(e) => {
                error!(path = %path.display(), error = %e, "cannot read import sidecar");
                return None;
            }
        };
        match serde_json::from_str(&data) {
            Ok(sidecar) => Some(sidecar),
            Err(e) => {
                error!(path = %path.display(), error = %e, "malformed import sidecar");
                None
            }
        }
    }

    fn load_atlas_doc(&self, rel: &str) -> Option<AtlasDoc> {
        let path = self.abs(rel);
        let data = fs::read_to_string(&path)
            .map_err(|e| error!(path = %path.display(), error = %e, "cannot read atlas document"))
            .ok()?;
        serde_json::from_str(&data)
            .map_err(|e| error!(path = %path.display(), error = %e, "malformed atlas document"))
            .ok()
    }

    fn write_sidecar(&self, rel: &str, sidecar: &ImportSidecar) -> Result<()> {
        let json = serde_json::to_string_pretty(sidecar)
            .map_err(|e| AuditError::Store(e.to_string()))?;
        fs::write(self.sidecar_path(rel), json)?;
        Ok(())
    }
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("bad glob pattern `{pat}`"))?);
    }
    Ok(Some(b.build()?))
}

fn load_addressables(path: &Path) -> anyhow::Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    let data = fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    let list: Vec<String> = serde_json::from_str(&data)
        .with_context(|| format!("parse {}", path.display()))?;
    Ok(list.into_iter().collect())
}

impl AssetStore for FsStore {
    fn all_asset_paths(&self) -> Vec<String> {
        self.paths.clone()
    }

    fn asset_kind(&self, path: &str) -> AssetKind {
        self.kinds.get(path).copied().unwrap_or(AssetKind::Other)
    }

    fn byte_size(&self, path: &str) -> u64 {
        fs::metadata(self.abs(path)).map(|m| m.len()).unwrap_or(0)
    }

    fn texture_dimensions(&self, path: &str) -> Option<(u32, u32)> {
        if let Some(cached) = self.dimensions.borrow().get(path) {
            return *cached;
        }
        let probed = match image::image_dimensions(self.abs(path)) {
            Ok(dims) => Some(dims),
            Err(e) => {
                warn!(path, error = %e, "cannot probe texture dimensions");
                None
            }
        };
        self.dimensions.borrow_mut().insert(path.to_string(), probed);
        probed
    }

    fn importer_flags(&self, path: &str) -> Option<ImporterFlags> {
        self.load_sidecar(path).map(|s| ImporterFlags {
            mipmap_enabled: s.mipmap_enabled,
            readable: s.readable,
        })
    }

    fn texture_settings(&self, path: &str, platform: Platform) -> Option<PlatformSettings> {
        let sidecar = self.load_sidecar(path)?;
        Some(
            sidecar
                .platforms
                .get(platform_key(platform))
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
        let doc = self.load_atlas_doc(path)?;
        match doc.platforms.get(platform_key(platform)) {
            Some(s) => Some(*s),
            None if platform.is_default() => Some(PlatformSettings::automatic()),
            None => None,
        }
    }

    fn atlas_mipmaps_enabled(&self, path: &str) -> bool {
        self.load_atlas_doc(path)
            .is_some_and(|d| d.mipmaps_enabled)
    }

    fn atlas_packables(&self, path: &str) -> Vec<String> {
        self.load_atlas_doc(path)
            .map(|d| d.packables)
            .unwrap_or_default()
    }

    fn write_texture_settings(
        &mut self,
        path: &str,
        platform: Platform,
        settings: &PlatformSettings,
    ) -> Result<()> {
        let mut sidecar = self
            .load_sidecar(path)
            .ok_or_else(|| AuditError::Store(format!("unreadable import sidecar for {path}")))?;
        sidecar
            .platforms
            .insert(platform_key(platform).to_string(), *settings);
        self.write_sidecar(path, &sidecar)
    }

    fn write_atlas_settings(
        &mut self,
        path: &str,
        platform: Platform,
        settings: &PlatformSettings,
    ) -> Result<()> {
        let mut doc = self
            .load_atlas_doc(path)
            .ok_or_else(|| AuditError::Store(format!("unreadable atlas document {path}")))?;
        doc.platforms
            .insert(platform_key(platform).to_string(), *settings);
        let json =
            serde_json::to_string_pretty(&doc).map_err(|e| AuditError::Store(e.to_string()))?;
        fs::write(self.abs(path), json)?;
        Ok(())
    }

    fn reimport(&mut self, path: &str) -> Result<()> {
        // No import pipeline to kick here; the probed dimensions may be
        // stale after a settings change.
        self.dimensions.borrow_mut().remove(path);
        debug!(path, "reimport requested");
        Ok(())
    }

    fn is_addressable(&self, path: &str) -> bool {
        self.addressables.contains(path)
    }

    fn reclaim(&mut self) {
        let mut cache = self.dimensions.borrow_mut();
        if !cache.is_empty() {
            debug!(entries = cache.len(), "dropping dimension cache");
            cache.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, data: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, data).unwrap();
    }

    #[test]
    fn indexes_textures_and_atlas_docs() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Assets/UI/coin.png", "not-a-real-png");
        write(dir.path(), "Assets/UI/coin.png.import", "{}");
        write(
            dir.path(),
            "Assets/UI/Main.atlas.json",
            r#"{"packables": ["Assets/UI"]}"#,
        );
        write(dir.path(), "Assets/notes.txt", "ignored");

        let store = FsStore::open(dir.path(), &[], &[]).unwrap();
        assert_eq!(store.asset_kind("Assets/UI/coin.png"), AssetKind::Texture);
        assert_eq!(
            store.asset_kind("Assets/UI/Main.atlas.json"),
            AssetKind::Atlas
        );
        assert_eq!(store.all_asset_paths().len(), 2);
        assert_eq!(store.atlas_packables("Assets/UI/Main.atlas.json"), [
            "Assets/UI"
        ]);
    }

    #[test]
    fn sidecar_roundtrip_through_writes() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Assets/a.png", "x");

        let mut store = FsStore::open(dir.path(), &[], &[]).unwrap();
        // No sidecar yet: defaults apply.
        let settings = store.texture_settings("Assets/a.png", Platform::Ios).unwrap();
        assert!(!settings.overridden);

        let forced = PlatformSettings {
            overridden: true,
            format: TextureFormat::Astc8x8,
            compression_quality: 50,
        };
        store
            .write_texture_settings("Assets/a.png", Platform::Ios, &forced)
            .unwrap();

        let read_back = store.texture_settings("Assets/a.png", Platform::Ios).unwrap();
        assert_eq!(read_back, forced);
        assert!(dir.path().join("Assets/a.png.import").exists());
    }

    #[test]
    fn malformed_sidecar_reads_as_missing_importer() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Assets/a.png", "x");
        write(dir.path(), "Assets/a.png.import", "{ not json");

        let store = FsStore::open(dir.path(), &[], &[]).unwrap();
        assert!(store.importer_flags("Assets/a.png").is_none());
    }
}
