//! End-to-end sync runs against real skill trees on disk.

use skill_sync::SyncError;
use skill_sync::config::ProposalsConfig;
use skill_sync::core::{Presence, ProposalRules, SkillSource, SyncChange};
use skill_sync::engine::{IndexWrite, SyncEngine, SyncOutcome};
use skill_sync::index::IndexStore;
use skill_sync::report::{NO_UPDATES, render};
use skill_sync::sources::FsSkillProvider;
use skill_sync::test_utils::fixtures::{SkillMarkdown, SkillTree};

fn engine_with(tree: &SkillTree, rules: ProposalRules) -> SyncEngine {
    SyncEngine::new(
        vec![
            Box::new(FsSkillProvider::plugin(tree.plugin_root())),
            Box::new(FsSkillProvider::local(tree.local_root())),
        ],
        rules,
    )
}

fn engine(tree: &SkillTree) -> SyncEngine {
    engine_with(tree, ProposalRules::none())
}

fn sync(tree: &SkillTree) -> SyncOutcome {
    engine(tree).run(&store(tree), false).unwrap()
}

fn store(tree: &SkillTree) -> IndexStore {
    IndexStore::new(tree.index_path())
}

fn skill<'a>(outcome: &'a SyncOutcome, name: &str) -> &'a skill_sync::core::SkillClassification {
    outcome
        .classification
        .skills
        .iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("no classification for {name}"))
}

#[test]
fn scenario_a_unchanged_skill_needs_no_changes() {
    let tree = SkillTree::new();
    tree.plugin_skill("coding-principles", 15);
    sync(&tree);

    // Another skill changes so the run is not a no-op.
    tree.plugin_skill("api-design", 3);
    let outcome = sync(&tree);

    let principles = skill(&outcome, "coding-principles");
    assert!(principles.sync.is_empty());
    assert_eq!(principles.section_count, 15);
    let report = render(&outcome);
    assert!(report.contains("coding-principles (plugin)\n  sections: No changes needed\n"));
    assert!(report.contains("api-design (plugin)\n  new skill added (3 sections)\n"));
}

#[test]
fn scenario_b_added_sections_are_synced() {
    let tree = SkillTree::new();
    tree.plugin_skill("typescript-testing", 5);
    sync(&tree);

    tree.plugin_skill("typescript-testing", 7);
    let outcome = sync(&tree);

    assert_eq!(
        skill(&outcome, "typescript-testing").sync,
        vec![SyncChange::SectionsAdded {
            titles: vec!["Section 6".into(), "Section 7".into()]
        }]
    );
    assert!(render(&outcome).contains("  sections: 2 added (Section 6, Section 7)\n"));
    assert_eq!(outcome.index_write, IndexWrite::Written);

    let index = store(&tree).load().unwrap().unwrap();
    assert_eq!(index.get("typescript-testing").unwrap().sections.len(), 7);
}

#[test]
fn scenario_c_local_overrides_plugin() {
    let tree = SkillTree::new();
    tree.plugin_skill("coding-principles", 15);
    tree.local_skill("coding-principles", 16);

    let outcome = sync(&tree);
    let principles = skill(&outcome, "coding-principles");
    assert_eq!(principles.source, SkillSource::LocalOverride);
    assert_eq!(principles.section_count, 16);
    assert_eq!(outcome.classification.counts.after.override_count, 1);
    assert_eq!(outcome.classification.counts.after.plugin_count, 0);

    let index = store(&tree).load().unwrap().unwrap();
    let stored = index.get("coding-principles").unwrap();
    assert_eq!(stored.source, SkillSource::LocalOverride);
    assert_eq!(stored.sections.len(), 16);
    assert_eq!(index.counts.override_count, 1);
}

#[test]
fn scenario_d_missing_plugin_root_is_a_warning() {
    let tree = SkillTree::new();
    for name in ["alpha", "beta", "gamma"] {
        tree.local_skill(name, 2);
    }

    let outcome = sync(&tree);
    assert_eq!(outcome.classification.counts.after.plugin_count, 0);
    assert_eq!(outcome.classification.counts.after.local_only_count, 3);
    assert!(outcome.warnings().any(|d| d.kind() == "SourceUnavailable"));
    assert!(!outcome.sources[0].available);

    let report = render(&outcome);
    assert!(report.contains("Warnings:\n  - SourceUnavailable: plugin root"));
    assert_eq!(store(&tree).load().unwrap().unwrap().len(), 3);
}

#[test]
fn scenario_e_nothing_changed_is_a_noop() {
    let tree = SkillTree::new();
    tree.plugin_skill("coding-principles", 4);
    tree.local_skill("project-conventions", 2);
    sync(&tree);

    let before = std::fs::read(tree.index_path()).unwrap();
    let mtime = std::fs::metadata(tree.index_path()).unwrap().modified().unwrap();

    let outcome = sync(&tree);
    assert!(outcome.is_noop());
    assert_eq!(outcome.index_write, IndexWrite::Skipped);
    assert_eq!(render(&outcome), NO_UPDATES);
    assert_eq!(std::fs::read(tree.index_path()).unwrap(), before);
    assert_eq!(
        std::fs::metadata(tree.index_path()).unwrap().modified().unwrap(),
        mtime
    );
}

#[test]
fn removed_skill_is_dropped_from_index() {
    let tree = SkillTree::new();
    tree.plugin_skill("keep", 1);
    let gone = tree.plugin_skill("gone", 1);
    sync(&tree);

    std::fs::remove_dir_all(gone.parent().unwrap()).unwrap();
    let outcome = sync(&tree);
    assert_eq!(skill(&outcome, "gone").sync, vec![SyncChange::SkillRemoved]);
    assert!(store(&tree).load().unwrap().unwrap().get("gone").is_none());
}

#[test]
fn override_removal_restores_plugin_attribution() {
    let tree = SkillTree::new();
    tree.plugin_skill("shared", 2);
    let local = tree.local_skill("shared", 3);
    sync(&tree);

    std::fs::remove_dir_all(local.parent().unwrap()).unwrap();
    let outcome = sync(&tree);
    let shared = skill(&outcome, "shared");
    assert_eq!(shared.source, SkillSource::Plugin);
    assert!(shared.sync.contains(&SyncChange::SourceChanged {
        from: SkillSource::LocalOverride,
        to: SkillSource::Plugin,
    }));
    assert!(render(&outcome).contains("  source: local-override -> plugin\n"));
}

#[test]
fn parse_failure_holds_the_previous_snapshot() {
    let tree = SkillTree::new();
    tree.plugin_skill("fragile", 3);
    sync(&tree);

    tree.write_plugin("fragile", &SkillMarkdown::new("fragile"));
    let outcome = sync(&tree);
    assert!(outcome.errors().any(|d| d.kind() == "ParseError"));
    let fragile = skill(&outcome, "fragile");
    assert_eq!(fragile.presence, Presence::Held);
    assert!(fragile.sync.is_empty());
    assert!(!outcome.classification.has_sync());

    // A later write still carries the held snapshot.
    tree.plugin_skill("other", 1);
    sync(&tree);
    let index = store(&tree).load().unwrap().unwrap();
    assert_eq!(index.get("fragile").unwrap().sections.len(), 3);
}

#[test]
fn parse_failure_holds_skill_named_apart_from_its_directory() {
    let tree = SkillTree::new();
    tree.write_plugin("ts-testing", &SkillMarkdown::numbered("typescript-testing", 3));
    sync(&tree);

    tree.write_plugin("ts-testing", &SkillMarkdown::new("typescript-testing"));
    let outcome = sync(&tree);
    let held = skill(&outcome, "typescript-testing");
    assert_eq!(held.presence, Presence::Held);
    assert!(held.sync.is_empty());
    assert_eq!(outcome.index_write, IndexWrite::Skipped);

    tree.plugin_skill("other", 1);
    sync(&tree);
    let index = store(&tree).load().unwrap().unwrap();
    assert_eq!(index.get("typescript-testing").unwrap().sections.len(), 3);
}

#[test]
fn metadata_edits_alone_are_not_synced() {
    let tree = SkillTree::new();
    tree.write_plugin("alpha", &SkillMarkdown::numbered("alpha", 2).tag("style"));
    sync(&tree);

    tree.write_plugin(
        "alpha",
        &SkillMarkdown::numbered("alpha", 2)
            .tag("formatting")
            .typical_use("Formatting Rust sources before opening review requests"),
    );
    assert!(sync(&tree).is_noop());
}

#[test]
fn proposals_never_write_the_index() {
    let tree = SkillTree::new();
    tree.write_plugin(
        "typescript-testing",
        &SkillMarkdown::numbered("typescript-testing", 2).typical_use("General"),
    );
    let rules = ProposalRules::from_config(&ProposalsConfig::default()).unwrap();
    let engine = engine_with(&tree, rules);
    engine.run(&store(&tree), false).unwrap();
    let before = std::fs::read(tree.index_path()).unwrap();

    let outcome = engine.run(&store(&tree), false).unwrap();
    assert!(!outcome.classification.has_sync());
    assert_eq!(outcome.classification.proposal_count(), 2);
    assert_eq!(outcome.index_write, IndexWrite::Skipped);
    assert_eq!(std::fs::read(tree.index_path()).unwrap(), before);

    let report = render(&outcome);
    assert!(report.contains("  tags: add `testing` (approval required)\n"));
    assert!(report.contains("typical use: \"General\" -> \"Use when working on typescript testing: section 1, section 2\" (approval required)"));
    assert!(report.contains("Summary: 0 skill(s) updated, 2 proposal(s) pending approval"));

    let stored = store(&tree).load().unwrap().unwrap();
    assert!(stored.get("typescript-testing").unwrap().tags.is_empty());
}

#[test]
fn write_failure_is_fatal_and_leaves_target_alone() {
    let tree = SkillTree::new();
    tree.plugin_skill("alpha", 1);
    // A non-empty directory where the index file should go.
    std::fs::create_dir_all(tree.index_path().join("occupied")).unwrap();

    let err = engine(&tree).run(&store(&tree), false).unwrap_err();
    assert!(matches!(err, SyncError::WriteFailure { .. }));
    assert!(tree.index_path().join("occupied").is_dir());
}

#[test]
fn file_per_skill_layout_is_supported() {
    let tree = SkillTree::new();
    tree.create_file(
        "plugin/skills/flat.md",
        &SkillMarkdown::numbered("flat", 2).render(),
    );
    tree.create_file("plugin/skills/README.md", "# Skills\n\n## About\n\ntext\n");

    let outcome = sync(&tree);
    assert_eq!(outcome.classification.counts.after.total, 1);
    assert_eq!(skill(&outcome, "flat").section_count, 2);
}
