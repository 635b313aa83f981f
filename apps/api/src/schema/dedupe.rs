//! Collapses duplicate ids in a materialized section list.
//!
//! Duplicates are expected: a schema's group declaration and its
//! `isGroup: true` leaf both surface a node for the same id. The rule is
//! deterministic and generic across all ids — within a bucket of same-id
//! entries the group-flagged variant wins, otherwise the first-seen entry
//! is kept, and first-seen positions are preserved either way.

use std::collections::HashMap;

use crate::schema::models::UiSection;

/// Returns `nodes` with exactly one entry per id. Idempotent: running it on
/// its own output is a no-op.
pub fn dedupe_sections(nodes: Vec<UiSection>) -> Vec<UiSection> {
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<UiSection> = Vec::with_capacity(nodes.len());

    for node in nodes {
        match position.get(&node.id) {
            None => {
                position.insert(node.id.clone(), out.len());
                out.push(node);
            }
            Some(&at) => {
                if node.is_group && !out[at].is_group {
                    out[at] = node;
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, title: &str, is_group: bool) -> UiSection {
        UiSection {
            id: id.to_string(),
            title: title.to_string(),
            is_group,
            ..Default::default()
        }
    }

    #[test]
    fn test_group_flagged_variant_wins() {
        let out = dedupe_sections(vec![
            node("exp", "Experience", true),
            node("exp", "dup", false),
        ]);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_group);
        assert_eq!(out[0].title, "Experience");
    }

    #[test]
    fn test_group_variant_wins_even_when_seen_second() {
        let out = dedupe_sections(vec![
            node("exp", "dup", false),
            node("other", "Other", false),
            node("exp", "Experience", true),
        ]);
        let ids: Vec<&str> = out.iter().map(|s| s.id.as_str()).collect();
        // The winner takes the first-seen position.
        assert_eq!(ids, vec!["exp", "other"]);
        assert!(out[0].is_group);
        assert_eq!(out[0].title, "Experience");
    }

    #[test]
    fn test_first_seen_wins_when_no_group_flag() {
        let out = dedupe_sections(vec![node("s1", "First", false), node("s1", "Second", false)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "First");
    }

    #[test]
    fn test_order_preserved_for_untouched_ids() {
        let out = dedupe_sections(vec![
            node("a", "A", false),
            node("b", "B", true),
            node("c", "C", false),
        ]);
        let ids: Vec<&str> = out.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_idempotent() {
        let input = vec![
            node("exp", "Experience", true),
            node("exp", "dup", false),
            node("summary", "Summary", false),
            node("summary", "Summary again", false),
        ];
        let once = dedupe_sections(input);
        let twice = dedupe_sections(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_generic_across_many_ids() {
        let out = dedupe_sections(vec![
            node("exp", "Experience", true),
            node("exp", "dup", false),
            node("edu", "dup", false),
            node("edu", "Education", true),
        ]);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|s| s.is_group));
    }
}
