//! Derives a schema document from an existing UI section tree.
//!
//! Used to seed a schema right after initial document parsing, before any
//! schema exists for the job. The builder never fabricates structure:
//! group ids come either from sections already flagged as groups or from
//! parent ids that at least one other section actually references.

use std::collections::{HashMap, HashSet};

use crate::schema::models::{Group, Schema, SectionNode, UiSection};

/// Version tag assigned to a freshly derived schema.
const BASELINE_VERSION: &str = "1";

/// Builds a schema from a UI section list.
pub fn build_baseline(sections: &[UiSection]) -> Schema {
    let flagged: Vec<&UiSection> = sections.iter().filter(|s| s.is_group).collect();
    if !flagged.is_empty() {
        return from_flagged_groups(sections, &flagged);
    }
    from_referenced_parents(sections)
}

/// The input already distinguishes groups: those become the group set, and
/// a leaf keeps its parent only when the parent is a recognized group.
/// Parent ids are never invented.
fn from_flagged_groups(sections: &[UiSection], flagged: &[&UiSection]) -> Schema {
    let group_ids: HashSet<&str> = flagged.iter().map(|s| s.id.as_str()).collect();

    let groups = flagged
        .iter()
        .map(|s| Group {
            id: s.id.clone(),
            title: s.title.clone(),
        })
        .collect();

    let schema_sections = sections
        .iter()
        .map(|s| {
            if s.is_group {
                group_node(s)
            } else {
                SectionNode {
                    id: s.id.clone(),
                    title: s.title.clone(),
                    is_group: false,
                    parent_id: s
                        .parent_id
                        .as_ref()
                        .filter(|p| group_ids.contains(p.as_str()))
                        .cloned(),
                    start: None,
                    end: None,
                }
            }
        })
        .collect();

    Schema {
        version: BASELINE_VERSION.to_string(),
        groups,
        sections: schema_sections,
        ..Default::default()
    }
}

/// No section is flagged as a group: infer candidate group ids from the
/// parent ids other sections reference, and synthesize a group per such id
/// using the corresponding section's title when one exists.
fn from_referenced_parents(sections: &[UiSection]) -> Schema {
    let mut referenced: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for s in sections {
        let Some(parent) = s.parent_id.as_deref() else {
            continue;
        };
        if parent.is_empty() || parent == s.id {
            continue;
        }
        if seen.insert(parent) {
            referenced.push(parent);
        }
    }

    let title_by_id: HashMap<&str, &str> = sections
        .iter()
        .map(|s| (s.id.as_str(), s.title.as_str()))
        .collect();

    let groups: Vec<Group> = referenced
        .iter()
        .map(|&id| Group {
            id: id.to_string(),
            title: title_by_id.get(id).copied().unwrap_or(id).to_string(),
        })
        .collect();

    let group_ids: HashSet<&str> = referenced.iter().copied().collect();
    let schema_sections = sections
        .iter()
        .map(|s| {
            if group_ids.contains(s.id.as_str()) {
                group_node(s)
            } else {
                SectionNode {
                    id: s.id.clone(),
                    title: s.title.clone(),
                    is_group: false,
                    parent_id: s
                        .parent_id
                        .as_ref()
                        .filter(|p| group_ids.contains(p.as_str()))
                        .cloned(),
                    start: None,
                    end: None,
                }
            }
        })
        .collect();

    Schema {
        version: BASELINE_VERSION.to_string(),
        groups,
        sections: schema_sections,
        ..Default::default()
    }
}

fn group_node(s: &UiSection) -> SectionNode {
    SectionNode {
        id: s.id.clone(),
        title: s.title.clone(),
        is_group: true,
        parent_id: None,
        start: None,
        end: None,
    }
}
