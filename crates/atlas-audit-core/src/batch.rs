use crate::error::Result;
use crate::format::TextureFormat;
use crate::platform::Platform;
use crate::profile::{resolve_atlas_profile, resolve_texture_profile, ImportProfile};
use crate::report::AuditReport;
use crate::sched::{OwnerToken, SliceBudget, TaskState};
use crate::store::{AssetStore, PlatformSettings};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Default crunch compression quality applied by normalization.
pub const DEFAULT_CRUNCH_QUALITY: u32 = 30;
/// Default ASTC compression quality applied by normalization.
pub const DEFAULT_ASTC_QUALITY: u32 = 50;

/// Parameters of a quality-normalization pass.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeParams {
    pub platform: Platform,
    /// Log decisions without persisting them.
    pub dry_run: bool,
    pub crunch_quality: u32,
    pub astc_quality: u32,
}

impl NormalizeParams {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            dry_run: false,
            crunch_quality: DEFAULT_CRUNCH_QUALITY,
            astc_quality: DEFAULT_ASTC_QUALITY,
        }
    }

    pub fn dry_run(mut self, v: bool) -> Self {
        self.dry_run = v;
        self
    }
}

/// Outcome of a cooperative normalization task.
#[derive(Debug, Clone, Copy)]
pub struct BatchOutcome {
    /// Entries whose declarations were (or, in a dry run, would be)
    /// rewritten.
    pub changed: usize,
    /// Work units actually processed before completion or cancellation.
    pub processed: usize,
    pub cancelled: bool,
}

/// Decides the rewritten settings for one profile, or `None` when the
/// entry is already normal.
///
/// Only explicitly overridden non-default platforms are eligible: entries
/// on automatic settings are left to `fix_automatic_compression`.
fn plan_change(profile: &ImportProfile, params: &NormalizeParams) -> Option<PlatformSettings> {
    if profile.is_default_platform || profile.is_using_default_settings {
        return None;
    }
    let mut format = profile.resolved_format;
    let mut quality = profile.compression_quality;
    let mut dirty = false;

    if format == TextureFormat::Etc2Rgba8Crunched && quality != params.crunch_quality {
        quality = params.crunch_quality;
        dirty = true;
    }

    if format.is_astc() {
        if let Some(replacement) = format.redundant_astc_replacement() {
            format = replacement;
            dirty = true;
        }
        if quality != params.astc_quality {
            quality = params.astc_quality;
            dirty = true;
        }
    }

    dirty.then_some(PlatformSettings {
        overridden: true,
        format,
        compression_quality: quality,
    })
}

/// Normalizes compression quality across the report's atlases.
///
/// Atlases are few and writing their settings is cheap, so this runs
/// eagerly to completion. Returns the number of changed entries.
pub fn normalize_atlases<S: AssetStore + ?Sized>(
    report: &mut AuditReport,
    store: &mut S,
    params: &NormalizeParams,
) -> Result<usize> {
    let mut changed = 0;
    for atlas in &mut report.atlases {
        let Some(profile) = atlas.profiles.get(&params.platform) else {
            continue;
        };
        let Some(settings) = plan_change(profile, params) else {
            continue;
        };
        changed += 1;
        if params.dry_run {
            info!(
                path = atlas.path,
                platform = %params.platform,
                format = %settings.format,
                quality = settings.compression_quality,
                "dry run: would rewrite atlas platform settings"
            );
            continue;
        }
        store.write_atlas_settings(&atlas.path, params.platform, &settings)?;
        let updated = resolve_atlas_profile(params.platform, &settings, settings.format);
        debug!(path = atlas.path, platform = %params.platform, "atlas settings rewritten");
        atlas.profiles.insert(params.platform, updated);
    }
    Ok(changed)
}

/// Cooperative quality normalization over the report's textures.
///
/// Each work unit handles one texture; a mutated texture is persisted and
/// reimported through the store, which is expensive, so the task yields
/// after every slice and asks the store to reclaim transient state on both
/// sides of the pause.
pub struct NormalizeTask {
    params: NormalizeParams,
    queue: VecDeque<usize>,
    budget: SliceBudget,
    owner: OwnerToken,
    changed: usize,
    processed: usize,
}

impl NormalizeTask {
    /// Plans a pass over every texture in `report`, in discovery order.
    pub fn new(report: &AuditReport, params: NormalizeParams, owner: OwnerToken) -> Self {
        let budget = if params.dry_run {
            SliceBudget::scanning()
        } else {
            SliceBudget::mutating()
        };
        Self {
            params,
            queue: (0..report.textures.len()).collect(),
            budget,
            owner,
            changed: 0,
            processed: 0,
        }
    }

    pub fn changed(&self) -> usize {
        self.changed
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Runs at most one slice of work units. Checks owner liveness first;
    /// a dead owner abandons the remaining units without touching entries
    /// already committed.
    pub fn pump<S: AssetStore + ?Sized>(
        &mut self,
        store: &mut S,
        report: &mut AuditReport,
    ) -> Result<TaskState> {
        if !self.owner.is_alive() {
            info!(
                processed = self.processed,
                remaining = self.queue.len(),
                "normalization owner is gone; cancelling"
            );
            return Ok(TaskState::Cancelled);
        }

        for _ in 0..self.budget.units {
            let Some(index) = self.queue.pop_front() else {
                return Ok(TaskState::Finished);
            };
            self.process_one(store, report, index)?;
            self.processed += 1;
        }

        if self.queue.is_empty() {
            return Ok(TaskState::Finished);
        }
        store.reclaim();
        Ok(TaskState::Running)
    }

    fn process_one<S: AssetStore + ?Sized>(
        &mut self,
        store: &mut S,
        report: &mut AuditReport,
        index: usize,
    ) -> Result<()> {
        let params = self.params;
        let Some(texture) = report.textures.get_mut(index) else {
            return Ok(());
        };
        let Some(profile) = texture.profiles.get(&params.platform) else {
            return Ok(());
        };
        let Some(settings) = plan_change(profile, &params) else {
            return Ok(());
        };
        self.changed += 1;
        if params.dry_run {
            info!(
                path = texture.path,
                platform = %params.platform,
                format = %settings.format,
                quality = settings.compression_quality,
                "dry run: would rewrite texture platform settings"
            );
            return Ok(());
        }
        store.write_texture_settings(&texture.path, params.platform, &settings)?;
        store.reimport(&texture.path)?;
        let automatic = store.automatic_format(&texture.path, params.platform);
        let updated = resolve_texture_profile(params.platform, &settings, automatic);
        debug!(path = texture.path, platform = %params.platform, "texture settings rewritten");
        texture.profiles.insert(params.platform, updated);
        Ok(())
    }

    /// Drives the task to completion or cancellation, yielding between
    /// slices for the budgeted pause with a reclamation request on each
    /// side of it.
    pub fn run<S: AssetStore + ?Sized>(
        mut self,
        store: &mut S,
        report: &mut AuditReport,
    ) -> Result<BatchOutcome> {
        loop {
            match self.pump(store, report)? {
                TaskState::Running => {
                    std::thread::sleep(self.budget.pause);
                    store.reclaim();
                }
                TaskState::Finished => {
                    return Ok(BatchOutcome {
                        changed: self.changed,
                        processed: self.processed,
                        cancelled: false,
                    });
                }
                TaskState::Cancelled => {
                    return Ok(BatchOutcome {
                        changed: self.changed,
                        processed: self.processed,
                        cancelled: true,
                    });
                }
            }
        }
    }
}

/// Forces an explicit format and quality onto entries that are still on
/// automatic settings for `platform` and carry severity 2 or above.
///
/// One-way remediation: it does not track later drift of the automatic
/// resolution and is not idempotent against it.
pub fn fix_automatic_compression<S: AssetStore + ?Sized>(
    report: &mut AuditReport,
    store: &mut S,
    platform: Platform,
    format: TextureFormat,
    quality: u32,
) -> Result<usize> {
    let settings = PlatformSettings {
        overridden: true,
        format,
        compression_quality: quality,
    };
    let mut changed = 0;

    for atlas in &mut report.atlases {
        if atlas.diagnostics.severity() < 2 {
            continue;
        }
        let eligible = atlas
            .profiles
            .get(&platform)
            .is_some_and(|p| p.is_using_default_settings);
        if !eligible {
            continue;
        }
        store.write_atlas_settings(&atlas.path, platform, &settings)?;
        atlas
            .profiles
            .insert(platform, resolve_atlas_profile(platform, &settings, format));
        changed += 1;
    }

    for texture in &mut report.textures {
        if texture.diagnostics.severity() < 2 {
            continue;
        }
        let eligible = texture
            .profiles
            .get(&platform)
            .is_some_and(|p| p.is_using_default_settings);
        if !eligible {
            continue;
        }
        store.write_texture_settings(&texture.path, platform, &settings)?;
        store.reimport(&texture.path)?;
        let automatic = store.automatic_format(&texture.path, platform);
        texture.profiles.insert(
            platform,
            resolve_texture_profile(platform, &settings, automatic),
        );
        changed += 1;
    }

    Ok(changed)
}
