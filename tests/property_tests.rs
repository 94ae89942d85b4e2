//! Property-based tests for the manifest merge and branch filter.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::collections::HashSet;

use proptest::prelude::*;
use tempfile::TempDir;

use ghbackup::core::manifest::{merge, render, Manifest};
use ghbackup::engine::discover::{retain_backup_branches, DISPOSABLE_BRANCH_MARKER};

/// Strategy for manifest lines drawn from a small pool, so persisted and
/// discovered sets overlap often.
fn reference() -> impl Strategy<Value = String> {
    (0u8..12, prop_oneof![Just("main"), Just("dev"), Just("feature/x")])
        .prop_map(|(repo, branch)| format!("https://github.com/octo/repo-{}/{}", repo, branch))
}

/// Lines without duplicates, in generated order.
fn unique_references(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(reference(), 0..max).prop_map(|lines| {
        let mut seen = HashSet::new();
        lines
            .into_iter()
            .filter(|line| seen.insert(line.clone()))
            .collect()
    })
}

/// Branch names, some of them disposable.
fn branch_name() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,8}(/[a-z]{1,8})?",
        "[a-z]{0,4}".prop_map(|prefix| format!("{}dependabot/cargo/x", prefix)),
        "[A-Za-z]{1,10}",
    ]
}

proptest! {
    #[test]
    fn merge_is_idempotent(
        persisted in unique_references(16),
        discovered in unique_references(16),
    ) {
        let once = merge(&persisted, &discovered);
        let twice = merge(&once, &discovered);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merge_is_stale_then_discovered(
        persisted in unique_references(16),
        discovered in unique_references(16),
    ) {
        let merged = merge(&persisted, &discovered);
        let found: HashSet<&String> = discovered.iter().collect();
        let stale: Vec<String> = persisted
            .iter()
            .filter(|line| !found.contains(line))
            .cloned()
            .collect();

        prop_assert_eq!(merged.len(), stale.len() + discovered.len());
        prop_assert_eq!(&merged[..stale.len()], &stale[..]);
        prop_assert_eq!(&merged[stale.len()..], &discovered[..]);
    }

    #[test]
    fn merge_never_loses_a_line(
        persisted in unique_references(16),
        discovered in unique_references(16),
    ) {
        let merged: HashSet<String> = merge(&persisted, &discovered).into_iter().collect();
        for line in persisted.iter().chain(discovered.iter()) {
            prop_assert!(merged.contains(line));
        }
    }

    #[test]
    fn merge_of_unique_inputs_has_no_duplicates(
        persisted in unique_references(16),
        discovered in unique_references(16),
    ) {
        let merged = merge(&persisted, &discovered);
        let unique: HashSet<&String> = merged.iter().collect();
        prop_assert_eq!(unique.len(), merged.len());
    }

    #[test]
    fn render_terminates_every_line(lines in unique_references(16)) {
        let text = render(&lines);
        prop_assert_eq!(text.matches('\n').count(), lines.len());
        prop_assert!(lines.is_empty() || text.ends_with('\n'));
    }

    #[test]
    fn persisted_file_matches_merge(
        persisted in unique_references(12),
        discovered in unique_references(12),
    ) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gh_repos");
        std::fs::write(&path, render(&persisted)).unwrap();

        let mut manifest = Manifest::open(&path).unwrap();
        manifest.merge_and_persist(&discovered).unwrap();

        let on_disk = std::fs::read_to_string(&path).unwrap();
        prop_assert_eq!(on_disk, render(&merge(&persisted, &discovered)));
    }

    #[test]
    fn filter_drops_exactly_disposable_branches(
        branches in prop::collection::vec(branch_name(), 0..20),
    ) {
        let kept = retain_backup_branches(branches.clone());
        let expected: Vec<String> = branches
            .into_iter()
            .filter(|b| !b.contains(DISPOSABLE_BRANCH_MARKER))
            .collect();
        prop_assert_eq!(kept, expected);
    }
}
