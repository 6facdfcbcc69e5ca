use crate::config::{AuditConfig, MAX_TEXTURE_DIMENSION};
use crate::diagnostics::{SEVERITY_DUPLICATE, SEVERITY_INFO, SEVERITY_WARNING};
use crate::matcher::MatchedRule;
use crate::model::{file_name, AtlasAsset, TextureAsset};
use crate::platform::Platform;
use crate::profile::{resolve_atlas_profile, resolve_texture_profile};
use crate::store::AssetStore;

const WARNING_DUPLICATE_IN_ADDRESSABLES: &str =
    "Possible duplicate in build: this texture is addressable and in atlas";
const WARNING_DUPLICATE_IN_RESOURCES: &str =
    "Possible duplicate in build: this texture is in Resources and in atlas";
const WARNING_DIMENSIONS_FALLBACK: &str =
    "Texture is neither POT nor multiple of 4: possible compression issue";

/// Evaluates the atlas rule pipeline: import-profile resolution, the
/// recommended-format allow-list, mip-maps, and automatic compression.
///
/// Sprite-count rules run separately in [`post_process_atlases`] once all
/// textures have been resolved.
pub fn classify_atlas<S: AssetStore + ?Sized>(atlas: &mut AtlasAsset, store: &S, cfg: &AuditConfig) {
    let Some(default_raw) = store.atlas_settings(&atlas.path, Platform::Default) else {
        atlas.diagnostics.raise(SEVERITY_WARNING);
        atlas
            .diagnostics
            .add_warning("Unable to retrieve default importer settings");
        return;
    };

    let default_profile =
        resolve_atlas_profile(Platform::Default, &default_raw, default_raw.format);
    let default_resolved = default_profile.resolved_format;
    atlas.profiles.insert(Platform::Default, default_profile);

    let mut any_automatic = false;
    for platform in Platform::OVERRIDABLE {
        let Some(raw) = store.atlas_settings(&atlas.path, platform) else {
            continue;
        };
        let profile = resolve_atlas_profile(platform, &raw, default_resolved);
        any_automatic |= profile.is_using_default_settings;
        if !profile.is_using_default_settings && !cfg.is_recommended(profile.resolved_format) {
            atlas.diagnostics.raise(SEVERITY_WARNING);
            atlas.diagnostics.add_warning(format!(
                "{}: does not use recommended compression ({})",
                platform, profile.resolved_format
            ));
        }
        atlas.profiles.insert(platform, profile);
    }

    if cfg.mipmaps_are_errors && store.atlas_mipmaps_enabled(&atlas.path) {
        atlas.diagnostics.raise(SEVERITY_WARNING);
        atlas
            .diagnostics
            .add_warning("Mipmap is enabled. Is it intended?");
    }

    if cfg.unoverridden_compression_are_errors && any_automatic {
        atlas.diagnostics.raise(SEVERITY_WARNING);
        atlas
            .diagnostics
            .add_warning("Atlas uses Automatic compression. Is it intended?");
    }
}

/// Sprite-count rules, run after every texture has been resolved against
/// the atlases.
pub fn post_process_atlases(atlases: &mut [AtlasAsset]) {
    for atlas in atlases {
        atlas.update_sprite_count();

        if atlas.rules.is_empty() {
            atlas.diagnostics.raise(SEVERITY_WARNING);
            atlas.diagnostics.add_warning("Packables list is empty");
        } else if atlas.sprite_count == 0 {
            atlas.diagnostics.raise(SEVERITY_INFO);
            atlas.diagnostics.add_warning(
                "Unable to detect sprites. Might be an issue with the packables \
                 or with sprite detection within subfolders",
            );
        }
    }
}

/// Evaluates the non-atlas texture rule pipeline. Run only for textures
/// the matcher did not assign to any atlas.
pub fn classify_texture<S: AssetStore + ?Sized>(
    texture: &mut TextureAsset,
    store: &S,
    cfg: &AuditConfig,
) {
    if let Some(geometry) = texture.geometry {
        if !geometry.is_pot && !geometry.is_multiple_of_four {
            texture.diagnostics.raise(SEVERITY_INFO);
            texture.diagnostics.add_warning(WARNING_DIMENSIONS_FALLBACK);
        }

        if cfg.size_over_4k_are_errors
            && (geometry.width > MAX_TEXTURE_DIMENSION || geometry.height > MAX_TEXTURE_DIMENSION)
        {
            texture.diagnostics.raise(SEVERITY_WARNING);
            texture
                .diagnostics
                .add_warning(format!("Size over {}", MAX_TEXTURE_DIMENSION));
        }
    }

    let Some(flags) = store.importer_flags(&texture.path) else {
        texture.diagnostics.raise(SEVERITY_WARNING);
        texture.diagnostics.add_warning("Unable to load an importer");
        return;
    };

    if cfg.mipmaps_are_errors && flags.mipmap_enabled {
        texture.diagnostics.raise(SEVERITY_WARNING);
        texture
            .diagnostics
            .add_warning("Mipmap is enabled. Is it intended?");
    }

    if cfg.readable_are_errors && flags.readable {
        texture.diagnostics.raise(SEVERITY_WARNING);
        texture
            .diagnostics
            .add_warning("Texture is readable. Is it intended?");
    }

    let mut any_automatic = false;
    for platform in [Platform::Ios, Platform::Android, Platform::Default] {
        let Some(raw) = store.texture_settings(&texture.path, platform) else {
            continue;
        };
        let automatic = store.automatic_format(&texture.path, platform);
        let profile = resolve_texture_profile(platform, &raw, automatic);
        if !platform.is_default() {
            any_automatic |= profile.is_using_default_settings;
        }
        texture.profiles.insert(platform, profile);
    }

    if cfg.unoverridden_compression_are_errors && any_automatic {
        texture.diagnostics.raise(SEVERITY_WARNING);
        texture
            .diagnostics
            .add_warning("Texture uses Automatic compression. Is it intended?");
    }

    let geometry = texture.geometry;
    let diagnostics = &mut texture.diagnostics;
    for (platform, profile) in &texture.profiles {
        let format = profile.resolved_format;
        if let Some(g) = geometry {
            if format.is_crunched() && !g.is_multiple_of_four {
                diagnostics.raise(SEVERITY_WARNING);
                diagnostics.add_warning(format!(
                    "{}: only multiple of 4 textures can use crunch compression",
                    platform
                ));
            }
            if format.is_pvrtc() && !g.is_pot {
                diagnostics.raise(SEVERITY_WARNING);
                diagnostics.add_warning(format!(
                    "{}: only POT textures can use PVRTC format",
                    platform
                ));
            }
        }
        if !platform.is_default()
            && !profile.is_using_default_settings
            && !cfg.is_recommended(format)
        {
            diagnostics.raise(SEVERITY_WARNING);
            diagnostics.add_warning(format!(
                "{}: does not use recommended compression ({})",
                platform, format
            ));
        }
    }
}

/// Side effects of resolving a texture into an atlas; invoked once per
/// texture when the matcher produced a candidate. The texture moves into
/// the matched rule's content list.
pub fn assign_to_atlas(mut texture: TextureAsset, atlases: &mut [AtlasAsset], m: MatchedRule) {
    if texture.is_addressable {
        texture.diagnostics.raise(SEVERITY_INFO);
        texture
            .diagnostics
            .add_warning(WARNING_DUPLICATE_IN_ADDRESSABLES);
        atlases[m.atlas].diagnostics.raise(SEVERITY_INFO);
    }

    // Leftover from a design where assignment ran inline per match. The
    // current flow assigns exactly once per texture, after full resolution,
    // so this cannot fire today; the guard stays for callers that assign
    // more than once.
    if let Some(previous) = texture.atlas.clone() {
        let texture_name = texture.name().to_string();
        texture.diagnostics.raise(SEVERITY_DUPLICATE);
        texture
            .diagnostics
            .add_warning(format!("Duplicate in atlas: {}", file_name(&previous)));
        if let Some(prev_atlas) = atlases.iter_mut().find(|a| a.path == previous) {
            prev_atlas.diagnostics.raise(SEVERITY_WARNING);
            prev_atlas.diagnostics.add_warning(format!(
                "Contains texture {} that exists in another atlas",
                texture_name
            ));
        }
    }

    texture.atlas = Some(atlases[m.atlas].path.clone());

    if texture.in_resources {
        texture.diagnostics.raise(SEVERITY_WARNING);
        texture
            .diagnostics
            .add_warning(WARNING_DUPLICATE_IN_RESOURCES);
    }

    atlases[m.atlas].rules[m.rule].matched.push(texture);
}
