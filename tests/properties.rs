use std::collections::BTreeMap;

use proptest::prelude::*;

use skill_sync::core::{SkillDocument, SkillSource, diff_sections, resolve};
use skill_sync::sources::SourceListing;

fn document(name: &str, source: SkillSource, sections: &[(String, String)]) -> SkillDocument {
    sections
        .iter()
        .fold(SkillDocument::new(name, source), |doc, (title, hash)| {
            doc.with_section(title.clone(), hash.clone())
        })
}

fn sections_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map("[a-z]{1,6}", "[0-9a-f]{2}", 0..12)
        .prop_map(|map: BTreeMap<String, String>| map.into_iter().collect())
}

fn listing(kind: SkillSource, names: &[String]) -> SourceListing {
    SourceListing {
        kind,
        root: kind.as_str().into(),
        available: true,
        entries: names.len(),
        documents: names
            .iter()
            .map(|n| document(n, kind, &[("Intro".to_string(), kind.as_str().to_string())]))
            .collect(),
        diagnostics: Vec::new(),
        failed: Vec::new(),
    }
}

proptest! {
    #[test]
    fn reordering_sections_is_never_a_change(
        shuffled in sections_strategy().prop_flat_map(|s| (Just(s.clone()), Just(s).prop_shuffle()))
    ) {
        let (original, reordered) = shuffled;
        let before = document("s", SkillSource::Plugin, &original);
        let after = document("s", SkillSource::Plugin, &reordered);
        prop_assert!(diff_sections(&after, Some(&before)).is_empty());
    }

    #[test]
    fn diff_is_symmetric(a in sections_strategy(), b in sections_strategy()) {
        let doc_a = document("s", SkillSource::Plugin, &a);
        let doc_b = document("s", SkillSource::Plugin, &b);
        let forward = diff_sections(&doc_a, Some(&doc_b));
        let backward = diff_sections(&doc_b, Some(&doc_a));

        let sorted = |mut v: Vec<String>| { v.sort(); v };
        prop_assert_eq!(sorted(forward.added), sorted(backward.removed));
        prop_assert_eq!(sorted(forward.removed), sorted(backward.added));
        prop_assert_eq!(sorted(forward.modified), sorted(backward.modified));
    }

    #[test]
    fn local_always_wins(
        plugin in prop::collection::btree_set("[a-e]{1,2}", 0..8),
        local in prop::collection::btree_set("[a-e]{1,2}", 0..8),
    ) {
        let plugin: Vec<String> = plugin.into_iter().collect();
        let local: Vec<String> = local.into_iter().collect();
        let merged = resolve(&[
            listing(SkillSource::Plugin, &plugin),
            listing(SkillSource::Local, &local),
        ]);

        for name in &local {
            let doc = merged.get(name).unwrap();
            let expected = if plugin.contains(name) {
                SkillSource::LocalOverride
            } else {
                SkillSource::Local
            };
            prop_assert_eq!(doc.source, expected);
            prop_assert_eq!(&doc.sections[0].body_hash, "local");
        }

        let counts = merged.counts();
        prop_assert_eq!(
            counts.plugin_count + counts.local_only_count + counts.override_count,
            counts.total
        );
        prop_assert_eq!(counts.total, merged.len());
    }

    #[test]
    fn listing_order_does_not_matter(
        plugin in prop::collection::btree_set("[a-e]{1,2}", 0..8),
        local in prop::collection::btree_set("[a-e]{1,2}", 0..8),
    ) {
        let plugin: Vec<String> = plugin.into_iter().collect();
        let local: Vec<String> = local.into_iter().collect();
        let forward = resolve(&[
            listing(SkillSource::Plugin, &plugin),
            listing(SkillSource::Local, &local),
        ]);
        let backward = resolve(&[
            listing(SkillSource::Local, &local),
            listing(SkillSource::Plugin, &plugin),
        ]);
        prop_assert_eq!(forward, backward);
    }
}
