use crate::error::{AuditError, Result};
use crate::format::TextureFormat;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Width/height above which a non-atlas texture is escalated when
/// `size_over_4k_are_errors` is set.
pub const MAX_TEXTURE_DIMENSION: u32 = 4096;

/// Policy knobs and configuration collaborators for a scan.
///
/// `recommended_formats` is the allow-list for non-default-platform
/// overrides; `ignore_patterns` are regular expressions that exclude
/// assets from the *reported* collections only. Matching and
/// classification always run over the full set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Treat enabled mip-map generation as a warning.
    #[serde(default = "default_true")]
    pub mipmaps_are_errors: bool,
    /// Treat CPU-readable textures as a warning (non-atlas only).
    #[serde(default)]
    pub readable_are_errors: bool,
    /// Treat dimensions above 4096 as a warning (non-atlas only).
    #[serde(default = "default_true")]
    pub size_over_4k_are_errors: bool,
    /// Treat un-overridden (automatic) iOS/Android compression as a warning.
    #[serde(default = "default_true")]
    pub unoverridden_compression_are_errors: bool,

    /// Formats considered acceptable for explicit non-default-platform
    /// overrides. Free-form configuration, not derived data.
    #[serde(default = "default_recommended_formats")]
    pub recommended_formats: Vec<TextureFormat>,

    /// Regex patterns excluding assets from report output.
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            mipmaps_are_errors: true,
            readable_are_errors: false,
            size_over_4k_are_errors: true,
            unoverridden_compression_are_errors: true,
            recommended_formats: default_recommended_formats(),
            ignore_patterns: default_ignore_patterns(),
        }
    }
}

impl AuditConfig {
    pub fn builder() -> AuditConfigBuilder {
        AuditConfigBuilder::new()
    }

    pub fn is_recommended(&self, format: TextureFormat) -> bool {
        self.recommended_formats.contains(&format)
    }
}

fn default_true() -> bool {
    true
}

fn default_recommended_formats() -> Vec<TextureFormat> {
    vec![
        TextureFormat::Astc6x6,
        TextureFormat::Astc8x8,
        TextureFormat::Astc10x10,
        TextureFormat::Astc12x12,
        TextureFormat::Etc2Rgba8Crunched,
    ]
}

fn default_ignore_patterns() -> Vec<String> {
    vec![
        r"/Editor/".into(),
        r"/Editor Default Resources/".into(),
        r"/Editor Resources/".into(),
        r"ProjectSettings/".into(),
        r"Packages/".into(),
    ]
}

/// Builder for `AuditConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct AuditConfigBuilder {
    cfg: AuditConfig,
}

impl AuditConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: AuditConfig::default(),
        }
    }
    pub fn mipmaps_are_errors(mut self, v: bool) -> Self {
        self.cfg.mipmaps_are_errors = v;
        self
    }
    pub fn readable_are_errors(mut self, v: bool) -> Self {
        self.cfg.readable_are_errors = v;
        self
    }
    pub fn size_over_4k_are_errors(mut self, v: bool) -> Self {
        self.cfg.size_over_4k_are_errors = v;
        self
    }
    pub fn unoverridden_compression_are_errors(mut self, v: bool) -> Self {
        self.cfg.unoverridden_compression_are_errors = v;
        self
    }
    pub fn recommended_formats(mut self, v: Vec<TextureFormat>) -> Self {
        self.cfg.recommended_formats = v;
        self
    }
    pub fn ignore_patterns(mut self, v: Vec<String>) -> Self {
        self.cfg.ignore_patterns = v;
        self
    }
    pub fn build(self) -> AuditConfig {
        self.cfg
    }
}

/// Compiled form of the ignore-pattern list.
#[derive(Debug, Default)]
pub struct IgnoreSet {
    patterns: Vec<Regex>,
}

impl IgnoreSet {
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pat in patterns {
            if pat.is_empty() {
                continue;
            }
            let re = Regex::new(pat).map_err(|source| AuditError::InvalidPattern {
                pattern: pat.clone(),
                source,
            })?;
            compiled.push(re);
        }
        Ok(Self { patterns: compiled })
    }

    /// True when `path` should be withheld from report output.
    pub fn is_ignored(&self, path: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(path))
    }
}
