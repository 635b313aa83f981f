//! Base-preserving merge of a candidate schema onto a known-good base.
//!
//! The candidate originates from an unreliable external producer and is
//! never trusted to preserve data on its own. The merge walks the base
//! first and applies the candidate as a patch, so ids and array positions
//! stay stable for everything the candidate did not touch — downstream UI
//! state (typed text) is keyed by id and title and depends on this.
//! `assert_preservation` is the final backstop that turns a silent
//! data-loss bug into a loud, attributable failure.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::warn;

use crate::schema::models::{Group, Schema, SectionNode};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("schema lost base section id={id} (not explicitly removed)")]
    LostSection { id: String },
}

/// Merges `candidate` onto `base`, honoring `removals` as the only
/// authorization for a base section to disappear.
pub fn merge_schemas(base: &Schema, candidate: &Schema, removals: &HashSet<String>) -> Schema {
    let candidate_groups = first_by_id(candidate.groups.iter().map(|g| (g.id.as_str(), g)));
    let candidate_sections = first_by_id(candidate.sections.iter().map(|s| (s.id.as_str(), s)));
    let base_group_ids: HashSet<&str> = base.groups.iter().map(|g| g.id.as_str()).collect();
    let base_section_ids: HashSet<&str> = base.sections.iter().map(|s| s.id.as_str()).collect();

    // Groups: base order, candidate fields win per id, new ids appended.
    let mut groups: Vec<Group> = base
        .groups
        .iter()
        .map(|g| match candidate_groups.get(g.id.as_str()) {
            Some(update) => Group {
                id: g.id.clone(),
                title: update.title.clone(),
            },
            None => g.clone(),
        })
        .collect();
    for g in &candidate.groups {
        if !base_group_ids.contains(g.id.as_str()) && !groups.iter().any(|x| x.id == g.id) {
            groups.push(g.clone());
        }
    }

    let group_ids: HashSet<&str> = groups.iter().map(|g| g.id.as_str()).collect();

    // Sections: base order minus explicit removals, candidate fields win,
    // new ids appended unless they re-add something explicitly deleted.
    let mut sections: Vec<SectionNode> = Vec::with_capacity(base.sections.len());
    for s in &base.sections {
        if removals.contains(&s.id) {
            continue;
        }
        match candidate_sections.get(s.id.as_str()) {
            Some(update) => sections.push(apply_update(s, update, &group_ids)),
            None => sections.push(s.clone()),
        }
    }
    for s in &candidate.sections {
        if base_section_ids.contains(s.id.as_str()) || removals.contains(&s.id) {
            continue;
        }
        if sections.iter().any(|x| x.id == s.id) {
            continue;
        }
        sections.push(new_section(s, &group_ids));
    }

    Schema {
        version: non_empty_or(&candidate.version, &base.version),
        notes: non_empty_or(&candidate.notes, &base.notes),
        groups,
        sections,
    }
}

/// Post-merge invariant: every base section id is either present in the
/// merged result or was explicitly removed. Fail-closed.
pub fn assert_preservation(
    base: &Schema,
    merged: &Schema,
    removals: &HashSet<String>,
) -> Result<(), MergeError> {
    let merged_ids: HashSet<&str> = merged.sections.iter().map(|s| s.id.as_str()).collect();
    for s in &base.sections {
        if !removals.contains(&s.id) && !merged_ids.contains(s.id.as_str()) {
            return Err(MergeError::LostSection { id: s.id.clone() });
        }
    }
    Ok(())
}

/// Candidate fields overwrite a retained base section. The id stays stable;
/// `start`/`end` anchors survive when the candidate omits them; a candidate
/// parent that does not resolve to a merged group keeps the base parent.
fn apply_update(base: &SectionNode, update: &SectionNode, group_ids: &HashSet<&str>) -> SectionNode {
    let parent_id = match &update.parent_id {
        Some(p) if group_ids.contains(p.as_str()) => Some(p.clone()),
        Some(p) => {
            warn!(
                "candidate parentId '{p}' on section '{}' does not resolve; keeping base parent",
                base.id
            );
            base.parent_id.clone()
        }
        None => None,
    };
    SectionNode {
        id: base.id.clone(),
        title: update.title.clone(),
        is_group: update.is_group,
        parent_id,
        start: update.start.clone().or_else(|| base.start.clone()),
        end: update.end.clone().or_else(|| base.end.clone()),
    }
}

/// A wholly-new candidate section. An unresolvable parent is dropped
/// (logged, not fatal) and the section lands at the root.
fn new_section(section: &SectionNode, group_ids: &HashSet<&str>) -> SectionNode {
    let mut out = section.clone();
    if let Some(p) = &out.parent_id {
        if !group_ids.contains(p.as_str()) {
            warn!(
                "candidate parentId '{p}' on new section '{}' does not resolve; adding at root",
                out.id
            );
            out.parent_id = None;
        }
    }
    out
}

fn first_by_id<'a, T>(items: impl Iterator<Item = (&'a str, &'a T)>) -> HashMap<&'a str, &'a T> {
    let mut map = HashMap::new();
    for (id, item) in items {
        map.entry(id).or_insert(item);
    }
    map
}

fn non_empty_or(preferred: &str, fallback: &str) -> String {
    if preferred.trim().is_empty() {
        fallback.to_string()
    } else {
        preferred.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::models::Group;

    fn section(id: &str, title: &str, parent: Option<&str>) -> SectionNode {
        SectionNode {
            id: id.to_string(),
            title: title.to_string(),
            parent_id: parent.map(String::from),
            ..Default::default()
        }
    }

    fn group_section(id: &str, title: &str) -> SectionNode {
        SectionNode {
            id: id.to_string(),
            title: title.to_string(),
            is_group: true,
            ..Default::default()
        }
    }

    fn base_schema() -> Schema {
        Schema {
            version: "1".to_string(),
            groups: vec![Group {
                id: "exp".to_string(),
                title: "Experience".to_string(),
            }],
            sections: vec![
                section("summary", "Summary", None),
                group_section("exp", "Experience"),
                section("exp1", "Job A", Some("exp")),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_removal_set_preserves_every_base_id() {
        let base = base_schema();
        // A hostile candidate that silently drops everything.
        let candidate = Schema::default();
        let merged = merge_schemas(&base, &candidate, &HashSet::new());
        assert_eq!(merged.sections.len(), base.sections.len());
        assert!(assert_preservation(&base, &merged, &HashSet::new()).is_ok());
    }

    #[test]
    fn test_removal_set_removes_exactly_those_ids() {
        let base = base_schema();
        let removals = HashSet::from(["summary".to_string()]);
        let merged = merge_schemas(&base, &Schema::default(), &removals);
        let ids: Vec<&str> = merged.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["exp", "exp1"]);
        assert_eq!(merged.groups, base.groups);
        assert!(assert_preservation(&base, &merged, &removals).is_ok());
    }

    #[test]
    fn test_spec_scenario_remove_summary_add_exp2() {
        let base = base_schema();
        let candidate = Schema {
            sections: vec![
                group_section("exp", "Experience"),
                section("exp1", "Job A", Some("exp")),
                section("exp2", "Job B", Some("exp")),
            ],
            groups: vec![Group {
                id: "exp".to_string(),
                title: "Experience".to_string(),
            }],
            ..Default::default()
        };
        let removals = HashSet::from(["summary".to_string()]);
        let merged = merge_schemas(&base, &candidate, &removals);

        let ids: Vec<&str> = merged.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["exp", "exp1", "exp2"]);
        let exp2 = merged.sections.iter().find(|s| s.id == "exp2").unwrap();
        assert_eq!(exp2.parent_id.as_deref(), Some("exp"));
        assert!(assert_preservation(&base, &merged, &removals).is_ok());
    }

    #[test]
    fn test_candidate_update_overwrites_title_in_place() {
        let base = base_schema();
        let candidate = Schema {
            sections: vec![section("exp1", "Senior Job A", Some("exp"))],
            ..Default::default()
        };
        let merged = merge_schemas(&base, &candidate, &HashSet::new());
        // Position 2 in base order, new title.
        assert_eq!(merged.sections[2].id, "exp1");
        assert_eq!(merged.sections[2].title, "Senior Job A");
    }

    #[test]
    fn test_candidate_cannot_re_add_an_explicitly_removed_id() {
        let base = base_schema();
        let candidate = Schema {
            sections: vec![section("summary", "Summary v2", None)],
            ..Default::default()
        };
        let removals = HashSet::from(["summary".to_string()]);
        let merged = merge_schemas(&base, &candidate, &removals);
        assert!(!merged.sections.iter().any(|s| s.id == "summary"));
    }

    #[test]
    fn test_unresolvable_parent_on_new_section_is_dropped() {
        let base = base_schema();
        let candidate = Schema {
            sections: vec![section("pubs", "Publications", Some("ghost"))],
            ..Default::default()
        };
        let merged = merge_schemas(&base, &candidate, &HashSet::new());
        let pubs = merged.sections.iter().find(|s| s.id == "pubs").unwrap();
        assert_eq!(pubs.parent_id, None);
    }

    #[test]
    fn test_unresolvable_parent_on_update_keeps_base_parent() {
        let base = base_schema();
        let candidate = Schema {
            sections: vec![section("exp1", "Job A", Some("ghost"))],
            ..Default::default()
        };
        let merged = merge_schemas(&base, &candidate, &HashSet::new());
        let exp1 = merged.sections.iter().find(|s| s.id == "exp1").unwrap();
        assert_eq!(exp1.parent_id.as_deref(), Some("exp"));
    }

    #[test]
    fn test_anchors_survive_when_candidate_omits_them() {
        let mut base = base_schema();
        base.sections[2].start = Some("ACME Corp".to_string());
        base.sections[2].end = Some("EDUCATION".to_string());
        let candidate = Schema {
            sections: vec![section("exp1", "Job A (renamed)", Some("exp"))],
            ..Default::default()
        };
        let merged = merge_schemas(&base, &candidate, &HashSet::new());
        let exp1 = merged.sections.iter().find(|s| s.id == "exp1").unwrap();
        assert_eq!(exp1.start.as_deref(), Some("ACME Corp"));
        assert_eq!(exp1.end.as_deref(), Some("EDUCATION"));
        assert_eq!(exp1.title, "Job A (renamed)");
    }

    #[test]
    fn test_new_groups_are_appended_after_base_groups() {
        let base = base_schema();
        let candidate = Schema {
            groups: vec![
                Group {
                    id: "exp".to_string(),
                    title: "Work Experience".to_string(),
                },
                Group {
                    id: "edu".to_string(),
                    title: "Education".to_string(),
                },
            ],
            ..Default::default()
        };
        let merged = merge_schemas(&base, &candidate, &HashSet::new());
        let ids: Vec<&str> = merged.groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["exp", "edu"]);
        // Update applied in place.
        assert_eq!(merged.groups[0].title, "Work Experience");
    }

    #[test]
    fn test_version_carried_from_base_unless_candidate_sets_one() {
        let base = base_schema();
        let merged = merge_schemas(&base, &Schema::default(), &HashSet::new());
        assert_eq!(merged.version, "1");

        let candidate = Schema {
            version: "2".to_string(),
            ..Default::default()
        };
        let merged = merge_schemas(&base, &candidate, &HashSet::new());
        assert_eq!(merged.version, "2");
    }

    #[test]
    fn test_preservation_assert_names_the_lost_id() {
        let base = base_schema();
        let mut broken = base.clone();
        broken.sections.retain(|s| s.id != "exp1");
        let err = assert_preservation(&base, &broken, &HashSet::new()).unwrap_err();
        assert_eq!(
            err,
            MergeError::LostSection {
                id: "exp1".to_string()
            }
        );
        assert!(err.to_string().contains("exp1"));
    }
}
