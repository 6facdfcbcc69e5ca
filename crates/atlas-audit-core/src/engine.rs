use crate::batch::{
    fix_automatic_compression, normalize_atlases, BatchOutcome, NormalizeParams, NormalizeTask,
};
use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::format::TextureFormat;
use crate::platform::Platform;
use crate::report::AuditReport;
use crate::scan::scan_project;
use crate::sched::{OwnerToken, TaskState};
use crate::store::AssetStore;
use tracing::instrument;

/// Front door of the audit pipeline: owns the asset store, the active
/// configuration, the latest report, and at most one in-flight batch task.
pub struct AuditEngine<S: AssetStore> {
    store: S,
    config: AuditConfig,
    report: Option<AuditReport>,
    task: Option<NormalizeTask>,
}

impl<S: AssetStore> AuditEngine<S> {
    pub fn new(store: S, config: AuditConfig) -> Self {
        Self {
            store,
            config,
            report: None,
            task: None,
        }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn report(&self) -> Option<&AuditReport> {
        self.report.as_ref()
    }

    /// A batch task is still holding the store and report.
    pub fn is_busy(&self) -> bool {
        self.task.is_some()
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_busy() {
            return Err(AuditError::Busy);
        }
        Ok(())
    }

    fn report_mut(&mut self) -> Result<&mut AuditReport> {
        self.report.as_mut().ok_or(AuditError::NoReport)
    }

    /// Runs a full scan, replacing any previous report.
    #[instrument(skip_all)]
    pub fn scan(&mut self) -> Result<&AuditReport> {
        self.ensure_idle()?;
        let report = scan_project(&self.store, &self.config)?;
        Ok(self.report.insert(report))
    }

    /// Normalizes atlas compression quality eagerly.
    pub fn normalize_atlases(&mut self, params: &NormalizeParams) -> Result<usize> {
        self.ensure_idle()?;
        let Self { store, report, .. } = self;
        let report = report.as_mut().ok_or(AuditError::NoReport)?;
        normalize_atlases(report, store, params)
    }

    /// Runs texture normalization to completion on the calling thread,
    /// pausing between slices.
    pub fn normalize_textures(
        &mut self,
        params: NormalizeParams,
        owner: OwnerToken,
    ) -> Result<BatchOutcome> {
        self.ensure_idle()?;
        let Self { store, report, .. } = self;
        let report = report.as_mut().ok_or(AuditError::NoReport)?;
        let task = NormalizeTask::new(report, params, owner);
        task.run(store, report)
    }

    /// Queues a texture normalization task to be driven by [`pump`].
    ///
    /// [`pump`]: AuditEngine::pump
    pub fn start_normalize(&mut self, params: NormalizeParams, owner: OwnerToken) -> Result<()> {
        self.ensure_idle()?;
        let report = self.report_mut()?;
        let task = NormalizeTask::new(report, params, owner);
        self.task = Some(task);
        Ok(())
    }

    /// Advances the queued task by one slice. Callers own the pause
    /// between slices; the engine frees the task when it settles.
    pub fn pump(&mut self) -> Result<TaskState> {
        let Self {
            store,
            report,
            task,
            ..
        } = self;
        let (Some(task), Some(report)) = (task.as_mut(), report.as_mut()) else {
            return Err(AuditError::NoReport);
        };
        let state = task.pump(store, report)?;
        if state != TaskState::Running {
            self.task = None;
        }
        Ok(state)
    }

    /// Forces `format` onto flagged entries still on automatic settings.
    pub fn fix_automatic(
        &mut self,
        platform: Platform,
        format: TextureFormat,
        quality: u32,
    ) -> Result<usize> {
        self.ensure_idle()?;
        let Self { store, report, .. } = self;
        let report = report.as_mut().ok_or(AuditError::NoReport)?;
        fix_automatic_compression(report, store, platform, format, quality)
    }
}
