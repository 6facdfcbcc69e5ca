use crate::diagnostics::SEVERITY_WARNING;
use crate::model::{AtlasAsset, PackableRule, RuleKind, TextureAsset};

/// Index of the rule a texture resolved to: atlas position in the scan's
/// atlas list, rule position within that atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedRule {
    pub atlas: usize,
    pub rule: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct MatchOutcome {
    /// The surviving candidate after tie-breaking, if any rule matched.
    pub matched: Option<MatchedRule>,
    /// True when at least one rule matched, even if later tie-breaks
    /// replaced the candidate.
    pub any_match: bool,
    /// True when more than one rule matched.
    pub ambiguous: bool,
}

/// Resolves `texture` against every packable rule of every atlas, in
/// atlas-then-rule iteration order.
///
/// The first match becomes the running candidate. Each further match marks
/// the texture and both implicated atlases as ambiguous; the candidate with
/// the longer rule key ("more specific") is kept, and on equal key lengths
/// the most recently discovered match wins. Equal-length resolution is
/// therefore dependent on atlas enumeration order.
pub fn match_atlas(texture: &mut TextureAsset, atlases: &mut [AtlasAsset]) -> MatchOutcome {
    let mut any_match = false;
    let mut ambiguous = false;
    let mut candidate: Option<(usize, usize)> = None;

    for ai in 0..atlases.len() {
        for ri in 0..atlases[ai].rules.len() {
            if !rule_matches(&texture.path, &atlases[ai].rules[ri]) {
                continue;
            }
            any_match = true;

            if let Some((ci, cri)) = candidate {
                ambiguous = true;
                let held_name = atlases[ci].name().to_string();
                let held_key = atlases[ci].rules[cri].key.clone();
                let found_name = atlases[ai].name().to_string();
                let found_key = atlases[ai].rules[ri].key.clone();

                texture.diagnostics.raise(SEVERITY_WARNING);
                texture.diagnostics.add_warning(format!(
                    "This texture's links to atlases ({}, {}) are ambiguous; \
                     resolution is order-dependent and may be error-prone",
                    found_name, held_name
                ));
                atlases[ai].diagnostics.raise(SEVERITY_WARNING);
                atlases[ai].diagnostics.add_warning(format!(
                    "Atlas has ambiguous packables with atlas {} and its packable {}",
                    held_name, held_key
                ));
                atlases[ci].diagnostics.raise(SEVERITY_WARNING);
                atlases[ci].diagnostics.add_warning(format!(
                    "Atlas has ambiguous packables with atlas {} and its packable {}",
                    found_name, found_key
                ));

                // The longer key is treated as the more specific packable;
                // keep it. Equal lengths let the newest match overwrite.
                if held_key.len() > found_key.len() {
                    continue;
                }
            }

            candidate = Some((ai, ri));
        }
    }

    MatchOutcome {
        matched: candidate.map(|(atlas, rule)| MatchedRule { atlas, rule }),
        any_match,
        ambiguous,
    }
}

fn rule_matches(path: &str, rule: &PackableRule) -> bool {
    match rule.kind {
        RuleKind::ExactFile => path == rule.key,
        RuleKind::FolderPrefix => folder_prefix_matches(path, &rule.key),
    }
}

/// Directory-bounded prefix check, tolerant of both separator styles.
///
/// A trailing separator is appended when absent so `Assets/Buildings` does
/// not spuriously match `Assets/BuildingsIcons/...`.
fn folder_prefix_matches(path: &str, key: &str) -> bool {
    if key.ends_with('/') || key.ends_with('\\') {
        return path.contains(key);
    }
    ['/', '\\']
        .into_iter()
        .any(|sep| path.contains(&format!("{key}{sep}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_prefix_is_directory_bounded() {
        assert!(folder_prefix_matches(
            "Assets/Env/Rocks/stone1.png",
            "Assets/Env"
        ));
        assert!(folder_prefix_matches(
            "Assets/Env/Rocks/stone1.png",
            "Assets/Env/"
        ));
        assert!(!folder_prefix_matches(
            "Assets/EnvOther/stone1.png",
            "Assets/Env"
        ));
        assert!(!folder_prefix_matches(
            "Assets/BuildingsIcons/roof.png",
            "Assets/Buildings"
        ));
    }

    #[test]
    fn folder_prefix_accepts_backslash_paths() {
        assert!(folder_prefix_matches(
            r"Assets\Env\Rocks\stone1.png",
            r"Assets\Env\Rocks"
        ));
        assert!(!folder_prefix_matches(
            r"Assets\EnvOther\stone1.png",
            r"Assets\Env"
        ));
    }
}
