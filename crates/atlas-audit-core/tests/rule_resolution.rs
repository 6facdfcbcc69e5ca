use atlas_audit_core::config::AuditConfig;
use atlas_audit_core::diagnostics::SEVERITY_WARNING;
use atlas_audit_core::format::TextureFormat;
use atlas_audit_core::platform::Platform;
use atlas_audit_core::scan::scan_project;
use atlas_audit_core::store::{
    AtlasEntry, ImporterEntry, MemoryStore, PlatformSettings, TextureEntry,
};

fn overridden(format: TextureFormat, quality: u32) -> PlatformSettings {
    PlatformSettings {
        overridden: true,
        format,
        compression_quality: quality,
    }
}

fn atlas_with(packables: &[&str]) -> AtlasEntry {
    let mut atlas = AtlasEntry {
        packables: packables.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    };
    atlas
        .platforms
        .insert(Platform::Default, overridden(TextureFormat::Rgba32, 50));
    atlas
        .platforms
        .insert(Platform::Ios, overridden(TextureFormat::Astc6x6, 50));
    atlas
        .platforms
        .insert(Platform::Android, overridden(TextureFormat::Astc6x6, 50));
    atlas
}

fn texture() -> TextureEntry {
    let mut importer = ImporterEntry::default();
    importer
        .platforms
        .insert(Platform::Ios, overridden(TextureFormat::Astc6x6, 50));
    importer
        .platforms
        .insert(Platform::Android, overridden(TextureFormat::Astc6x6, 50));
    TextureEntry {
        bytes: 4096,
        dimensions: Some((256, 256)),
        importer: Some(importer),
    }
}

/// Two overlapping folder rules: the longer key is the more specific one
/// and must win regardless of atlas order, while both atlases and the
/// texture are marked ambiguous.
#[test]
fn longer_key_wins_overlapping_folder_rules() {
    for flipped in [false, true] {
        let mut store = MemoryStore::new();
        let broad = ("Assets/X.spriteatlas", atlas_with(&["Assets/A"]));
        let narrow = ("Assets/Y.spriteatlas", atlas_with(&["Assets/A/Sub"]));
        let (first, second) = if flipped {
            (narrow.clone(), broad.clone())
        } else {
            (broad.clone(), narrow.clone())
        };
        store.add_atlas(first.0, first.1);
        store.add_atlas(second.0, second.1);
        store.add_texture("Assets/A/Sub/t.png", texture());

        let report = scan_project(&store, &AuditConfig::default()).unwrap();

        let winner = report
            .atlases
            .iter()
            .find(|a| a.path == "Assets/Y.spriteatlas")
            .unwrap();
        assert_eq!(winner.sprite_count, 1, "flipped={flipped}");
        let assigned = &winner.rules[0].matched[0];
        assert_eq!(assigned.atlas.as_deref(), Some("Assets/Y.spriteatlas"));
        assert!(assigned.diagnostics.severity() >= SEVERITY_WARNING);
        assert!(assigned
            .diagnostics
            .warnings()
            .iter()
            .any(|w| w.contains("ambiguous")));

        let loser = report
            .atlases
            .iter()
            .find(|a| a.path == "Assets/X.spriteatlas")
            .unwrap();
        assert_eq!(loser.sprite_count, 0);
        for atlas in [winner, loser] {
            assert!(atlas.diagnostics.severity() >= SEVERITY_WARNING);
            assert!(atlas
                .diagnostics
                .warnings()
                .iter()
                .any(|w| w.contains("ambiguous packables")));
        }
    }
}

/// Equal key lengths have no specificity signal: the match discovered
/// last keeps the texture, so resolution depends on atlas order.
#[test]
fn equal_key_lengths_resolve_to_latest_atlas() {
    let mut store = MemoryStore::new();
    store.add_atlas("Assets/X.spriteatlas", atlas_with(&["Assets/Shared/A"]));
    store.add_atlas("Assets/Y.spriteatlas", atlas_with(&["Assets/Shared/A"]));
    store.add_texture("Assets/Shared/A/t.png", texture());

    let report = scan_project(&store, &AuditConfig::default()).unwrap();

    let second = report
        .atlases
        .iter()
        .find(|a| a.path == "Assets/Y.spriteatlas")
        .unwrap();
    assert_eq!(second.sprite_count, 1);
    let first = report
        .atlases
        .iter()
        .find(|a| a.path == "Assets/X.spriteatlas")
        .unwrap();
    assert_eq!(first.sprite_count, 0);
}

/// An exact-file rule and a folder rule overlapping the same texture
/// still follow key length alone.
#[test]
fn exact_file_rule_competes_by_key_length() {
    let mut store = MemoryStore::new();
    store.add_atlas(
        "Assets/X.spriteatlas",
        atlas_with(&["Assets/UI/Icons/coin.png"]),
    );
    store.add_atlas("Assets/Y.spriteatlas", atlas_with(&["Assets/UI"]));
    store.add_texture("Assets/UI/Icons/coin.png", texture());

    let report = scan_project(&store, &AuditConfig::default()).unwrap();

    let by_file = report
        .atlases
        .iter()
        .find(|a| a.path == "Assets/X.spriteatlas")
        .unwrap();
    assert_eq!(by_file.sprite_count, 1);
}

/// Duplicate packable keys on one atlas collapse to a single rule.
#[test]
fn duplicate_packable_keys_are_deduplicated() {
    let mut store = MemoryStore::new();
    store.add_atlas(
        "Assets/X.spriteatlas",
        atlas_with(&["Assets/UI", "Assets/UI"]),
    );
    store.add_texture("Assets/UI/coin.png", texture());

    let report = scan_project(&store, &AuditConfig::default()).unwrap();

    let atlas = &report.atlases[0];
    assert_eq!(atlas.rules.len(), 1);
    assert_eq!(atlas.sprite_count, 1);
    // No self-ambiguity from the repeated key.
    assert_eq!(atlas.diagnostics.severity(), 0);
}
