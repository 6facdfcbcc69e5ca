use crate::format::TextureFormat;
use crate::platform::Platform;
use crate::store::PlatformSettings;
use serde::{Deserialize, Serialize};

/// Normalized per-(asset, platform) import declaration.
///
/// `resolved_format` is the format actually in effect: the requested one
/// when the platform is explicitly overridden, otherwise whatever the
/// automatic rule (textures) or the default platform (atlases) supplies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportProfile {
    pub platform: Platform,
    pub is_default_platform: bool,
    pub requested_format: TextureFormat,
    pub resolved_format: TextureFormat,
    /// No explicit override is in effect for this platform.
    pub is_using_default_settings: bool,
    pub compression_quality: u32,
    /// Human-readable summary, `<format>[Q<quality>]`, prefixed with
    /// `Automatic -> ` when an automatic request resolved to a concrete
    /// format.
    pub description: String,
}

/// Resolves a texture's raw platform settings into a normalized profile.
///
/// `automatic` is the format the store's platform-specific automatic rule
/// would choose; it is only consulted when no override is in effect.
pub fn resolve_texture_profile(
    platform: Platform,
    raw: &PlatformSettings,
    automatic: TextureFormat,
) -> ImportProfile {
    let requested = raw.format;
    let using_default = if platform.is_default() {
        requested == TextureFormat::Automatic
    } else {
        !raw.overridden
    };
    let resolved = if using_default { automatic } else { requested };
    let description = compose_description(using_default, resolved, raw.compression_quality);
    ImportProfile {
        platform,
        is_default_platform: platform.is_default(),
        requested_format: requested,
        resolved_format: resolved,
        is_using_default_settings: using_default,
        compression_quality: raw.compression_quality,
        description,
    }
}

/// Resolves an atlas's raw platform settings into a normalized profile.
///
/// Atlases have no per-texture automatic rule; a non-overridden platform
/// falls back to the atlas's own default-platform resolved format.
pub fn resolve_atlas_profile(
    platform: Platform,
    raw: &PlatformSettings,
    default_resolved: TextureFormat,
) -> ImportProfile {
    let requested = raw.format;
    let using_default = !raw.overridden;
    let resolved = if platform.is_default() || !using_default {
        requested
    } else {
        default_resolved
    };
    let from_automatic = !platform.is_default() && using_default;
    let description = compose_description(from_automatic, resolved, raw.compression_quality);
    ImportProfile {
        platform,
        is_default_platform: platform.is_default(),
        requested_format: requested,
        resolved_format: resolved,
        is_using_default_settings: using_default,
        compression_quality: raw.compression_quality,
        description,
    }
}

fn compose_description(from_automatic: bool, resolved: TextureFormat, quality: u32) -> String {
    let body = if resolved == TextureFormat::Automatic {
        "Automatic".to_string()
    } else if from_automatic {
        format!("Automatic -> {}", resolved)
    } else {
        resolved.to_string()
    };
    format!("{}[Q{}]", body, quality)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn automatic_request_renders_resolution_arrow() {
        let raw = PlatformSettings {
            overridden: false,
            format: TextureFormat::Automatic,
            compression_quality: 50,
        };
        let p = resolve_texture_profile(Platform::Ios, &raw, TextureFormat::Astc8x8);
        assert_eq!(p.resolved_format, TextureFormat::Astc8x8);
        assert!(p.is_using_default_settings);
        assert_eq!(p.description, "Automatic -> ASTC_8x8[Q50]");
    }

    #[test]
    fn overridden_request_renders_plain_format() {
        let raw = PlatformSettings {
            overridden: true,
            format: TextureFormat::Astc8x8,
            compression_quality: 50,
        };
        let p = resolve_texture_profile(Platform::Ios, &raw, TextureFormat::Automatic);
        assert_eq!(p.resolved_format, TextureFormat::Astc8x8);
        assert!(!p.is_using_default_settings);
        assert_eq!(p.description, "ASTC_8x8[Q50]");
    }

    #[test]
    fn unresolved_automatic_stays_automatic() {
        let raw = PlatformSettings {
            overridden: false,
            format: TextureFormat::Automatic,
            compression_quality: 0,
        };
        let p = resolve_texture_profile(Platform::Android, &raw, TextureFormat::Automatic);
        assert_eq!(p.description, "Automatic[Q0]");
    }

    #[test]
    fn atlas_platform_falls_back_to_default_format() {
        let raw = PlatformSettings {
            overridden: false,
            format: TextureFormat::Automatic,
            compression_quality: 50,
        };
        let p = resolve_atlas_profile(Platform::Android, &raw, TextureFormat::Etc2Rgba8);
        assert_eq!(p.resolved_format, TextureFormat::Etc2Rgba8);
        assert_eq!(p.description, "Automatic -> ETC2_RGBA8[Q50]");
    }
}
