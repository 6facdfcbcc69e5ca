use atlas_audit_core::batch::{normalize_atlases, NormalizeParams, NormalizeTask};
use atlas_audit_core::config::AuditConfig;
use atlas_audit_core::engine::AuditEngine;
use atlas_audit_core::error::AuditError;
use atlas_audit_core::format::TextureFormat;
use atlas_audit_core::platform::Platform;
use atlas_audit_core::scan::scan_project;
use atlas_audit_core::sched::{OwnerHandle, OwnerToken};
use atlas_audit_core::store::{
    AssetStore, AtlasEntry, ImporterEntry, MemoryStore, PlatformSettings, TextureEntry,
};

fn overridden(format: TextureFormat, quality: u32) -> PlatformSettings {
    PlatformSettings {
        overridden: true,
        format,
        compression_quality: quality,
    }
}

fn texture_with(ios: PlatformSettings) -> TextureEntry {
    let mut importer = ImporterEntry::default();
    importer.platforms.insert(Platform::Ios, ios);
    importer
        .platforms
        .insert(Platform::Android, overridden(TextureFormat::Astc6x6, 50));
    TextureEntry {
        bytes: 4096,
        dimensions: Some((256, 256)),
        importer: Some(importer),
    }
}

fn run_normalize(store: &mut MemoryStore, params: NormalizeParams) -> (usize, usize) {
    let mut report = scan_project(&*store, &AuditConfig::default()).unwrap();
    let task = NormalizeTask::new(&report, params, OwnerToken::detached());
    let outcome = task.run(store, &mut report).unwrap();
    assert!(!outcome.cancelled);
    (outcome.changed, outcome.processed)
}

#[test]
fn small_astc_blocks_are_rewritten_to_6x6() {
    let mut store = MemoryStore::new();
    store.add_texture(
        "Assets/Art/a.png",
        texture_with(overridden(TextureFormat::Astc4x4, 80)),
    );
    store.add_texture(
        "Assets/Art/b.png",
        texture_with(overridden(TextureFormat::Astc5x5, 50)),
    );

    let (changed, processed) = run_normalize(&mut store, NormalizeParams::new(Platform::Ios));

    assert_eq!(changed, 2);
    assert_eq!(processed, 2);
    for path in ["Assets/Art/a.png", "Assets/Art/b.png"] {
        let settings = store.texture_settings(path, Platform::Ios).unwrap();
        assert!(settings.overridden);
        assert_eq!(settings.format, TextureFormat::Astc6x6);
        assert_eq!(settings.compression_quality, 50);
        assert!(store.reimported.contains(&path.to_string()));
    }
}

#[test]
fn astc_quality_is_forced_to_50() {
    let mut store = MemoryStore::new();
    store.add_texture(
        "Assets/Art/a.png",
        texture_with(overridden(TextureFormat::Astc8x8, 100)),
    );

    let (changed, _) = run_normalize(&mut store, NormalizeParams::new(Platform::Ios));

    assert_eq!(changed, 1);
    let settings = store
        .texture_settings("Assets/Art/a.png", Platform::Ios)
        .unwrap();
    assert_eq!(settings.format, TextureFormat::Astc8x8);
    assert_eq!(settings.compression_quality, 50);
}

#[test]
fn crunched_quality_is_forced_to_30() {
    let mut store = MemoryStore::new();
    store.add_texture(
        "Assets/Art/a.png",
        texture_with(overridden(TextureFormat::Etc2Rgba8Crunched, 100)),
    );

    let (changed, _) = run_normalize(&mut store, NormalizeParams::new(Platform::Ios));

    assert_eq!(changed, 1);
    let settings = store
        .texture_settings("Assets/Art/a.png", Platform::Ios)
        .unwrap();
    assert_eq!(settings.format, TextureFormat::Etc2Rgba8Crunched);
    assert_eq!(settings.compression_quality, 30);
}

#[test]
fn automatic_profiles_are_left_alone() {
    let mut store = MemoryStore::new();
    store.add_texture(
        "Assets/Art/a.png",
        texture_with(PlatformSettings::automatic()),
    );

    let (changed, processed) = run_normalize(&mut store, NormalizeParams::new(Platform::Ios));

    assert_eq!(changed, 0);
    assert_eq!(processed, 1);
    assert!(store.reimported.is_empty());
    let settings = store
        .texture_settings("Assets/Art/a.png", Platform::Ios)
        .unwrap();
    assert!(!settings.overridden);
}

#[test]
fn normalization_is_idempotent() {
    let mut store = MemoryStore::new();
    store.add_texture(
        "Assets/Art/a.png",
        texture_with(overridden(TextureFormat::Astc4x4, 80)),
    );
    store.add_texture(
        "Assets/Art/b.png",
        texture_with(overridden(TextureFormat::Etc2Rgba8Crunched, 100)),
    );

    let (first, _) = run_normalize(&mut store, NormalizeParams::new(Platform::Ios));
    assert_eq!(first, 2);
    let (second, _) = run_normalize(&mut store, NormalizeParams::new(Platform::Ios));
    assert_eq!(second, 0);
}

#[test]
fn dry_run_counts_without_writing() {
    let mut store = MemoryStore::new();
    store.add_texture(
        "Assets/Art/a.png",
        texture_with(overridden(TextureFormat::Astc4x4, 80)),
    );

    let params = NormalizeParams::new(Platform::Ios).dry_run(true);
    let (changed, _) = run_normalize(&mut store, params);

    assert_eq!(changed, 1);
    assert!(store.reimported.is_empty());
    let settings = store
        .texture_settings("Assets/Art/a.png", Platform::Ios)
        .unwrap();
    assert_eq!(settings.format, TextureFormat::Astc4x4);
    assert_eq!(settings.compression_quality, 80);
}

#[test]
fn atlases_normalize_without_reimport() {
    let mut store = MemoryStore::new();
    let mut atlas = AtlasEntry::default();
    atlas
        .platforms
        .insert(Platform::Default, overridden(TextureFormat::Rgba32, 50));
    atlas
        .platforms
        .insert(Platform::Ios, overridden(TextureFormat::Astc5x5, 90));
    store.add_atlas("Assets/UI/Main.spriteatlas", atlas);

    let mut report = scan_project(&store, &AuditConfig::default()).unwrap();
    let params = NormalizeParams::new(Platform::Ios);
    let changed = normalize_atlases(&mut report, &mut store, &params).unwrap();

    assert_eq!(changed, 1);
    assert!(store.reimported.is_empty());
    let settings = store
        .atlas_settings("Assets/UI/Main.spriteatlas", Platform::Ios)
        .unwrap();
    assert_eq!(settings.format, TextureFormat::Astc6x6);
    assert_eq!(settings.compression_quality, 50);

    // The in-memory report is refreshed so a second pass finds nothing.
    let again = normalize_atlases(&mut report, &mut store, &params).unwrap();
    assert_eq!(again, 0);
}

#[test]
fn fix_automatic_forces_explicit_override_on_flagged_textures() {
    let mut store = MemoryStore::new();
    store.add_texture(
        "Assets/Art/auto.png",
        texture_with(PlatformSettings::automatic()),
    );
    store.add_texture(
        "Assets/Art/fine.png",
        texture_with(overridden(TextureFormat::Astc6x6, 50)),
    );

    let mut engine = AuditEngine::new(store, AuditConfig::default());
    engine.scan().unwrap();
    let changed = engine
        .fix_automatic(Platform::Ios, TextureFormat::Astc6x6, 50)
        .unwrap();

    assert_eq!(changed, 1);
    let settings = engine
        .store()
        .texture_settings("Assets/Art/auto.png", Platform::Ios)
        .unwrap();
    assert!(settings.overridden);
    assert_eq!(settings.format, TextureFormat::Astc6x6);
    let untouched = engine
        .store()
        .texture_settings("Assets/Art/fine.png", Platform::Ios)
        .unwrap();
    assert_eq!(untouched.format, TextureFormat::Astc6x6);
}

#[test]
fn engine_rejects_overlapping_batch_work() {
    let mut store = MemoryStore::new();
    store.add_texture(
        "Assets/Art/a.png",
        texture_with(overridden(TextureFormat::Astc4x4, 80)),
    );

    let mut engine = AuditEngine::new(store, AuditConfig::default());
    engine.scan().unwrap();

    let owner = OwnerHandle::new();
    engine
        .start_normalize(NormalizeParams::new(Platform::Ios), owner.token())
        .unwrap();
    assert!(engine.is_busy());
    assert!(matches!(engine.scan(), Err(AuditError::Busy)));
    assert!(matches!(
        engine.start_normalize(NormalizeParams::new(Platform::Ios), owner.token()),
        Err(AuditError::Busy)
    ));

    // Draining the task frees the engine.
    while engine.pump().unwrap() == atlas_audit_core::sched::TaskState::Running {}
    assert!(!engine.is_busy());
    assert!(engine.scan().is_ok());
}
