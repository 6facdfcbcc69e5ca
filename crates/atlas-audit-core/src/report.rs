use crate::model::{AtlasAsset, TextureAsset};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Orderings selectable for report output. `Size` means byte size for
/// textures and sprite count for atlases; the comparator is the only
/// thing that changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    SeverityDesc,
    SeverityAsc,
    PathAsc,
    PathDesc,
    SizeDesc,
    SizeAsc,
}

impl FromStr for SortKey {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "severity_desc" | "severity" => Ok(Self::SeverityDesc),
            "severity_asc" => Ok(Self::SeverityAsc),
            "path_asc" | "path" => Ok(Self::PathAsc),
            "path_desc" => Ok(Self::PathDesc),
            "size_desc" | "size" => Ok(Self::SizeDesc),
            "size_asc" => Ok(Self::SizeAsc),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScanSummary {
    pub atlas_count: usize,
    pub texture_count: usize,
}

impl ScanSummary {
    pub fn description(&self) -> String {
        format!(
            "Atlases: {}. Textures: {}",
            self.atlas_count, self.texture_count
        )
    }
}

/// The finalized result of a scan: every discovered atlas and every
/// texture not resolved into one, with diagnostics attached.
///
/// Entries flagged `ignored` stay in the collections (the batch engine
/// still visits them) but are skipped by the `visible_*` accessors and the
/// summary counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditReport {
    pub atlases: Vec<AtlasAsset>,
    pub textures: Vec<TextureAsset>,
}

impl AuditReport {
    pub fn new(atlases: Vec<AtlasAsset>, textures: Vec<TextureAsset>) -> Self {
        Self { atlases, textures }
    }

    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            atlas_count: self.visible_atlases().count(),
            texture_count: self.visible_textures().count(),
        }
    }

    pub fn visible_atlases(&self) -> impl Iterator<Item = &AtlasAsset> {
        self.atlases.iter().filter(|a| !a.ignored)
    }

    pub fn visible_textures(&self) -> impl Iterator<Item = &TextureAsset> {
        self.textures.iter().filter(|t| !t.ignored)
    }

    /// Visible atlases at or above `min_severity` whose path contains
    /// `needle`. An empty needle matches every path.
    pub fn filter_atlases<'a>(
        &'a self,
        min_severity: u8,
        needle: &'a str,
    ) -> impl Iterator<Item = &'a AtlasAsset> {
        self.visible_atlases()
            .filter(move |a| a.diagnostics.severity() >= min_severity && a.path.contains(needle))
    }

    /// Visible textures at or above `min_severity` whose path contains
    /// `needle`.
    pub fn filter_textures<'a>(
        &'a self,
        min_severity: u8,
        needle: &'a str,
    ) -> impl Iterator<Item = &'a TextureAsset> {
        self.visible_textures()
            .filter(move |t| t.diagnostics.severity() >= min_severity && t.path.contains(needle))
    }

    /// Default presentation order: most severe first, discovery order on
    /// ties (sorts are stable).
    pub fn sort_default(&mut self) {
        self.sort_atlases(SortKey::SeverityDesc);
        self.sort_textures(SortKey::SeverityDesc);
    }

    pub fn sort_atlases(&mut self, key: SortKey) {
        match key {
            SortKey::SeverityDesc => self
                .atlases
                .sort_by(|a, b| b.diagnostics.severity().cmp(&a.diagnostics.severity())),
            SortKey::SeverityAsc => self
                .atlases
                .sort_by(|a, b| a.diagnostics.severity().cmp(&b.diagnostics.severity())),
            SortKey::PathAsc => self.atlases.sort_by(|a, b| a.path.cmp(&b.path)),
            SortKey::PathDesc => self.atlases.sort_by(|a, b| b.path.cmp(&a.path)),
            SortKey::SizeDesc => self
                .atlases
                .sort_by(|a, b| b.sprite_count.cmp(&a.sprite_count)),
            SortKey::SizeAsc => self
                .atlases
                .sort_by(|a, b| a.sprite_count.cmp(&b.sprite_count)),
        }
    }

    pub fn sort_textures(&mut self, key: SortKey) {
        match key {
            SortKey::SeverityDesc => self
                .textures
                .sort_by(|a, b| b.diagnostics.severity().cmp(&a.diagnostics.severity())),
            SortKey::SeverityAsc => self
                .textures
                .sort_by(|a, b| a.diagnostics.severity().cmp(&b.diagnostics.severity())),
            SortKey::PathAsc => self.textures.sort_by(|a, b| a.path.cmp(&b.path)),
            SortKey::PathDesc => self.textures.sort_by(|a, b| b.path.cmp(&a.path)),
            SortKey::SizeDesc => self
                .textures
                .sort_by(|a, b| b.bytes_size.cmp(&a.bytes_size)),
            SortKey::SizeAsc => self
                .textures
                .sort_by(|a, b| a.bytes_size.cmp(&b.bytes_size)),
        }
    }
}
