use atlas_audit_core::batch::{NormalizeParams, NormalizeTask};
use atlas_audit_core::config::AuditConfig;
use atlas_audit_core::format::TextureFormat;
use atlas_audit_core::platform::Platform;
use atlas_audit_core::scan::scan_project;
use atlas_audit_core::sched::{OwnerHandle, TaskState, MUTATE_SLICE_UNITS};
use atlas_audit_core::store::{
    AssetStore, ImporterEntry, MemoryStore, PlatformSettings, TextureEntry,
};

fn eligible_texture() -> TextureEntry {
    let mut importer = ImporterEntry::default();
    importer.platforms.insert(
        Platform::Ios,
        PlatformSettings {
            overridden: true,
            format: TextureFormat::Astc4x4,
            compression_quality: 80,
        },
    );
    importer.platforms.insert(
        Platform::Android,
        PlatformSettings {
            overridden: true,
            format: TextureFormat::Astc6x6,
            compression_quality: 50,
        },
    );
    TextureEntry {
        bytes: 4096,
        dimensions: Some((256, 256)),
        importer: Some(importer),
    }
}

fn populated_store(count: usize) -> MemoryStore {
    let mut store = MemoryStore::new();
    for i in 0..count {
        store.add_texture(format!("Assets/Art/t{i:04}.png"), eligible_texture());
    }
    store
}

#[test]
fn task_stops_at_slice_boundaries() {
    let total = MUTATE_SLICE_UNITS * 2 + 50;
    let mut store = populated_store(total);
    let mut report = scan_project(&store, &AuditConfig::default()).unwrap();

    let owner = OwnerHandle::new();
    let mut task = NormalizeTask::new(&report, NormalizeParams::new(Platform::Ios), owner.token());

    assert_eq!(task.pump(&mut store, &mut report).unwrap(), TaskState::Running);
    assert_eq!(task.processed(), MUTATE_SLICE_UNITS);
    assert!(store.reclaim_count >= 1);

    assert_eq!(task.pump(&mut store, &mut report).unwrap(), TaskState::Running);
    assert_eq!(task.pump(&mut store, &mut report).unwrap(), TaskState::Finished);
    assert_eq!(task.processed(), total);
    assert_eq!(task.changed(), total);
}

#[test]
fn dropping_the_owner_cancels_between_slices() {
    let total = MUTATE_SLICE_UNITS * 2;
    let mut store = populated_store(total);
    let mut report = scan_project(&store, &AuditConfig::default()).unwrap();

    let owner = OwnerHandle::new();
    let mut task = NormalizeTask::new(&report, NormalizeParams::new(Platform::Ios), owner.token());

    assert_eq!(task.pump(&mut store, &mut report).unwrap(), TaskState::Running);
    drop(owner);
    assert_eq!(
        task.pump(&mut store, &mut report).unwrap(),
        TaskState::Cancelled
    );

    // Exactly one slice committed; everything else is untouched.
    assert_eq!(task.changed(), MUTATE_SLICE_UNITS);
    assert_eq!(store.reimported.len(), MUTATE_SLICE_UNITS);
    let committed = store
        .all_asset_paths()
        .iter()
        .filter(|p| {
            store
                .texture_settings(p, Platform::Ios)
                .is_some_and(|s| s.format == TextureFormat::Astc6x6)
        })
        .count();
    assert_eq!(committed, MUTATE_SLICE_UNITS);
}

#[test]
fn committed_slices_survive_cancellation_consistently() {
    let total = MUTATE_SLICE_UNITS + 10;
    let mut store = populated_store(total);
    let mut report = scan_project(&store, &AuditConfig::default()).unwrap();

    let owner = OwnerHandle::new();
    let mut task = NormalizeTask::new(&report, NormalizeParams::new(Platform::Ios), owner.token());
    task.pump(&mut store, &mut report).unwrap();
    drop(owner);
    task.pump(&mut store, &mut report).unwrap();

    // Every committed entry is fully rewritten: format, quality and the
    // refreshed profile in the report agree.
    for texture in &report.textures {
        let settings = store.texture_settings(&texture.path, Platform::Ios).unwrap();
        let profile = &texture.profiles[&Platform::Ios];
        assert_eq!(profile.resolved_format, settings.format);
        assert_eq!(profile.compression_quality, settings.compression_quality);
        if settings.format == TextureFormat::Astc6x6 {
            assert_eq!(settings.compression_quality, 50);
        }
    }
}
