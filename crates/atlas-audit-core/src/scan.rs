use crate::classify::{assign_to_atlas, classify_atlas, classify_texture, post_process_atlases};
use crate::config::{AuditConfig, IgnoreSet};
use crate::error::Result;
use crate::matcher::match_atlas;
use crate::model::{AtlasAsset, Geometry, PackableRule, TextureAsset};
use crate::report::AuditReport;
use crate::store::{AssetKind, AssetStore};
use tracing::{debug, info, instrument, warn};

/// Runs a full analysis pass over the store's assets.
///
/// Atlases are discovered and classified first, then every texture is
/// resolved against their packable rules; unassigned textures get their own
/// classification. Entries matching the ignore patterns still participate
/// in matching and classification and are only withheld from report
/// output.
#[instrument(skip_all)]
pub fn scan_project<S: AssetStore + ?Sized>(store: &S, cfg: &AuditConfig) -> Result<AuditReport> {
    let ignore = IgnoreSet::compile(&cfg.ignore_patterns)?;
    let paths = store.all_asset_paths();

    let mut atlases: Vec<AtlasAsset> = Vec::new();
    for path in &paths {
        if store.asset_kind(path) != AssetKind::Atlas {
            continue;
        }
        let mut atlas = build_atlas(store, path);
        classify_atlas(&mut atlas, store, cfg);
        atlas.ignored = ignore.is_ignored(path);
        if atlas.ignored {
            debug!(path, "atlas withheld from output by ignore pattern");
        }
        atlases.push(atlas);
    }

    let mut textures: Vec<TextureAsset> = Vec::new();
    for path in &paths {
        if store.asset_kind(path) != AssetKind::Texture {
            continue;
        }
        let mut texture = build_texture(store, path);
        let outcome = match_atlas(&mut texture, &mut atlases);
        match outcome.matched {
            Some(m) => assign_to_atlas(texture, &mut atlases, m),
            None => {
                classify_texture(&mut texture, store, cfg);
                texture.ignored = ignore.is_ignored(path);
                if texture.ignored {
                    debug!(path, "texture withheld from output by ignore pattern");
                }
                textures.push(texture);
            }
        }
    }

    post_process_atlases(&mut atlases);

    let mut report = AuditReport::new(atlases, textures);
    report.sort_default();

    let summary = report.summary();
    info!(
        atlases = summary.atlas_count,
        textures = summary.texture_count,
        "{}",
        summary.description()
    );

    Ok(report)
}

fn build_atlas<S: AssetStore + ?Sized>(store: &S, path: &str) -> AtlasAsset {
    let mut atlas = AtlasAsset::new(path, store.type_name(path), store.byte_size(path));
    for key in store.atlas_packables(path) {
        if atlas.rules.iter().any(|r| r.key == key) {
            // First registration wins; not a severity escalation.
            warn!(path, key, "packable is listed in the atlas twice");
            continue;
        }
        atlas.rules.push(PackableRule::new(key));
    }
    atlas
}

fn build_texture<S: AssetStore + ?Sized>(store: &S, path: &str) -> TextureAsset {
    let mut texture = TextureAsset::new(path, store.type_name(path), store.byte_size(path));
    texture.geometry = store
        .texture_dimensions(path)
        .map(|(w, h)| Geometry::new(w, h));
    texture.is_addressable = store.is_addressable(path);
    texture
}
