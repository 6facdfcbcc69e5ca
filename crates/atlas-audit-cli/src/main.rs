mod fs_store;

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::thread;

use anyhow::Context;
use atlas_audit_core::batch::{normalize_atlases, NormalizeParams, NormalizeTask};
use atlas_audit_core::config::AuditConfig;
use atlas_audit_core::diagnostics::SEVERITY_WARNING;
use atlas_audit_core::format::TextureFormat;
use atlas_audit_core::model::{AtlasAsset, TextureAsset};
use atlas_audit_core::platform::Platform;
use atlas_audit_core::profile::ImportProfile;
use atlas_audit_core::report::{AuditReport, SortKey};
use atlas_audit_core::scan::scan_project;
use atlas_audit_core::sched::{OwnerHandle, TaskState, SLICE_PAUSE};
use atlas_audit_core::store::AssetStore;
use clap::{ArgAction, Parser, Subcommand};
use fs_store::FsStore;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "atlas-audit",
    about = "Audit texture and sprite-atlas import settings",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --no-progress or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a project and report risky import settings
    Scan(ScanArgs),
    /// Rewrite compression quality on explicitly overridden platform settings
    Normalize(NormalizeArgs),
    /// Force an explicit format onto flagged assets still on automatic compression
    FixAuto(FixAutoArgs),
}

#[derive(Parser, Debug, Clone)]
struct ProjectArgs {
    /// Project root directory
    #[arg(help_heading = "Input")]
    root: PathBuf,
    /// YAML config file path (policy knobs, ignore patterns, automatic formats)
    #[arg(long, help_heading = "Input")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input")]
    exclude: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
struct ScanArgs {
    #[command(flatten)]
    project: ProjectArgs,
    /// Only report entries at warning severity or above
    #[arg(long, default_value_t = false, help_heading = "Report")]
    warnings_only: bool,
    /// Only report entries whose path contains this substring
    #[arg(long, default_value = "", help_heading = "Report")]
    path_contains: String,
    /// Additional ignore patterns (regex), appended to the configured list
    #[arg(long, help_heading = "Report")]
    ignore: Vec<String>,
    /// Sort order: severity_desc|severity_asc|path_asc|path_desc|size_desc|size_asc
    #[arg(long, default_value = "severity_desc", help_heading = "Report")]
    sort: String,
    /// Print the report as JSON instead of text
    #[arg(long, default_value_t = false, help_heading = "Report")]
    json: bool,
    /// Also write the full report (JSON) to this file
    #[arg(long, help_heading = "Report")]
    export: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
struct NormalizeArgs {
    #[command(flatten)]
    project: ProjectArgs,
    /// Platform whose overrides to normalize: ios | android
    #[arg(long, default_value = "ios", help_heading = "Normalize")]
    platform: String,
    /// Log planned changes without writing anything
    #[arg(long, default_value_t = false, help_heading = "Normalize")]
    dry_run: bool,
    /// Quality forced onto crunch-compressed overrides
    #[arg(long, default_value_t = 30, help_heading = "Normalize")]
    crunch_quality: u32,
    /// Quality forced onto ASTC overrides
    #[arg(long, default_value_t = 50, help_heading = "Normalize")]
    astc_quality: u32,
    /// What to rewrite: atlases | textures | all
    #[arg(long, value_parser = ["atlases", "textures", "all"], default_value = "all", help_heading = "Normalize")]
    scope: String,
}

#[derive(Parser, Debug, Clone)]
struct FixAutoArgs {
    #[command(flatten)]
    project: ProjectArgs,
    /// Platform to pin: ios | android
    #[arg(long, default_value = "ios", help_heading = "Fix")]
    platform: String,
    /// Format to force, e.g. astc_6x6 | etc2_rgba8_crunched
    #[arg(long, default_value = "astc_6x6", help_heading = "Fix")]
    format: String,
    /// Compression quality to force
    #[arg(long, default_value_t = 50, help_heading = "Fix")]
    quality: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Scan(args) => run_scan(args),
        Commands::Normalize(args) => run_normalize(args, cli.progress && !cli.quiet),
        Commands::FixAuto(args) => run_fix_auto(args),
    }
}

fn open_project(args: &ProjectArgs) -> anyhow::Result<(FsStore, AuditConfig)> {
    let mut store = FsStore::open(&args.root, &args.include, &args.exclude)?;
    let cfg = if let Some(path) = &args.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)?;
        y.apply_automatic_formats(&mut store);
        y.into_audit_config(AuditConfig::default())
    } else {
        AuditConfig::default()
    };
    Ok((store, cfg))
}

fn parse_platform(s: &str) -> anyhow::Result<Platform> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown platform: {} (expected ios or android)", s))
}

fn run_scan(args: &ScanArgs) -> anyhow::Result<()> {
    let (store, mut cfg) = open_project(&args.project)?;
    cfg.ignore_patterns.extend(args.ignore.iter().cloned());
    let mut report = scan_project(&store, &cfg)?;

    let sort: SortKey = args
        .sort
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown sort order: {}", args.sort))?;
    report.sort_atlases(sort);
    report.sort_textures(sort);

    if let Some(path) = &args.export {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        info!(path = %path.display(), "report exported");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let min_severity = if args.warnings_only {
        SEVERITY_WARNING
    } else {
        0
    };
    render_report(&report, min_severity, &args.path_contains);
    Ok(())
}

fn render_report(report: &AuditReport, min_severity: u8, path_contains: &str) {
    println!("== {} ==", report.summary().description());
    for atlas in report.filter_atlases(min_severity, path_contains) {
        render_atlas(atlas, min_severity);
    }
    for texture in report.filter_textures(min_severity, path_contains) {
        render_texture(texture, "");
    }
}

fn render_atlas(atlas: &AtlasAsset, min_severity: u8) {
    println!(
        "[{}] {} ({}, {}, {} sprites)",
        atlas.diagnostics.severity(),
        atlas.path,
        atlas.type_name,
        atlas.readable_size(),
        atlas.sprite_count
    );
    render_profiles(&atlas.profiles);
    render_warnings(atlas.diagnostics.warnings(), "  ");
    for rule in &atlas.rules {
        for texture in &rule.matched {
            if texture.diagnostics.severity() < min_severity {
                continue;
            }
            render_texture(texture, "  ");
        }
    }
}

fn render_texture(texture: &TextureAsset, indent: &str) {
    let dims = match texture.geometry {
        Some(g) => format!("{}x{}", g.width, g.height),
        None => "?x?".into(),
    };
    println!(
        "{}[{}] {} ({}, {}, {})",
        indent,
        texture.diagnostics.severity(),
        texture.path,
        texture.type_name,
        dims,
        texture.readable_size()
    );
    render_profiles(&texture.profiles);
    render_warnings(texture.diagnostics.warnings(), &format!("{indent}  "));
}

fn render_profiles(profiles: &BTreeMap<Platform, ImportProfile>) {
    if profiles.is_empty() {
        return;
    }
    let line: Vec<String> = profiles
        .values()
        .map(|p| format!("{}: {}", p.platform, p.description))
        .collect();
    println!("    {}", line.join("  "));
}

fn render_warnings(warnings: &[String], indent: &str) {
    for w in warnings {
        println!("{indent}- {w}");
    }
}

fn run_normalize(args: &NormalizeArgs, show_progress: bool) -> anyhow::Result<()> {
    let (mut store, cfg) = open_project(&args.project)?;
    let platform = parse_platform(&args.platform)?;
    let mut report = scan_project(&store, &cfg)?;

    let mut params = NormalizeParams::new(platform).dry_run(args.dry_run);
    params.crunch_quality = args.crunch_quality;
    params.astc_quality = args.astc_quality;

    let mut changed = 0;
    if args.scope != "textures" {
        changed += normalize_atlases(&mut report, &mut store, &params)?;
    }

    if args.scope != "atlases" {
        // The CLI invocation is the owner; the handle lives until we are
        // done so the task can only finish, never cancel.
        let owner = OwnerHandle::new();
        let mut task = NormalizeTask::new(&report, params, owner.token());

        let bar = if show_progress {
            use indicatif::{ProgressBar, ProgressStyle};
            let b = ProgressBar::new(report.textures.len() as u64);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.green} normalizing {pos}/{len} [{elapsed_precise}]",
            ) {
                b.set_style(style);
            }
            Some(b)
        } else {
            None
        };

        loop {
            let state = task.pump(&mut store, &mut report)?;
            if let Some(b) = &bar {
                b.set_position(task.processed() as u64);
            }
            match state {
                TaskState::Running => {
                    thread::sleep(SLICE_PAUSE);
                    store.reclaim();
                }
                TaskState::Finished | TaskState::Cancelled => break,
            }
        }
        if let Some(b) = &bar {
            b.finish_and_clear();
        }
        changed += task.changed();
    }

    if args.dry_run {
        info!(changed, "dry run complete; nothing written");
    } else {
        info!(changed, "normalization complete");
    }
    Ok(())
}

fn run_fix_auto(args: &FixAutoArgs) -> anyhow::Result<()> {
    let (mut store, cfg) = open_project(&args.project)?;
    let platform = parse_platform(&args.platform)?;
    let format: TextureFormat = args
        .format
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown texture format: {}", args.format))?;
    if format == TextureFormat::Automatic {
        anyhow::bail!("fix-auto needs a concrete format, not automatic");
    }

    let mut report = scan_project(&store, &cfg)?;
    let changed = atlas_audit_core::batch::fix_automatic_compression(
        &mut report,
        &mut store,
        platform,
        format,
        args.quality,
    )?;
    info!(changed, %platform, %format, "automatic compression pinned");
    Ok(())
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    mipmaps_are_errors: Option<bool>,
    readable_are_errors: Option<bool>,
    size_over_4k_are_errors: Option<bool>,
    unoverridden_compression_are_errors: Option<bool>,
    recommended_formats: Option<Vec<String>>,
    ignore_patterns: Option<Vec<String>>,
    /// Platform name -> format the automatic rule resolves to.
    automatic_formats: Option<BTreeMap<String, String>>,
}

impl YamlConfig {
    fn into_audit_config(self, mut cfg: AuditConfig) -> AuditConfig {
        if let Some(v) = self.mipmaps_are_errors {
            cfg.mipmaps_are_errors = v;
        }
        if let Some(v) = self.readable_are_errors {
            cfg.readable_are_errors = v;
        }
        if let Some(v) = self.size_over_4k_are_errors {
            cfg.size_over_4k_are_errors = v;
        }
        if let Some(v) = self.unoverridden_compression_are_errors {
            cfg.unoverridden_compression_are_errors = v;
        }
        if let Some(v) = self.recommended_formats {
            let mut formats = Vec::with_capacity(v.len());
            for name in v {
                match name.parse::<TextureFormat>() {
                    Ok(f) => formats.push(f),
                    Err(_) => warn!(name, "skipping unknown recommended format"),
                }
            }
            cfg.recommended_formats = formats;
        }
        if let Some(v) = self.ignore_patterns {
            cfg.ignore_patterns = v;
        }
        cfg
    }

    fn apply_automatic_formats(&self, store: &mut FsStore) {
        let Some(table) = &self.automatic_formats else {
            return;
        };
        for (platform, format) in table {
            match (platform.parse::<Platform>(), format.parse::<TextureFormat>()) {
                (Ok(p), Ok(f)) => store.set_automatic_format(p, f),
                _ => warn!(platform, format, "skipping unknown automatic format entry"),
            }
        }
    }
}
