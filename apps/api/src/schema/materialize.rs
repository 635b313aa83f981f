//! Turns an accepted schema into the ordered, content-bearing UI tree.
//!
//! Output order follows the schema, not the prior tree: groups in declared
//! order, each followed by its children in `sections` order, then every
//! section without a resolvable group parent as a flat root-level entry.
//! That ordering is what makes structural edits from the producer visible
//! to the user immediately. Prior text and constraints are carried over by
//! id, falling back to a whitespace-normalized title match when ids changed.

use std::collections::HashMap;

use crate::schema::models::{Schema, UiSection};

/// Materializes `schema` into a UI section list, reusing `prior` content
/// where ids (or normalized titles) match. An empty schema yields an empty
/// list; callers treat that as "no usable schema", not an error.
pub fn materialize_sections(schema: &Schema, prior: &[UiSection]) -> Vec<UiSection> {
    if schema.is_empty() {
        return Vec::new();
    }

    let carry = CarryOver::index(prior);
    let mut out: Vec<UiSection> = Vec::with_capacity(schema.groups.len() + schema.sections.len());

    for group in &schema.groups {
        out.push(UiSection {
            id: group.id.clone(),
            title: group.title.clone(),
            text: String::new(),
            parent_id: None,
            is_group: true,
            constraints: carry.constraints(&group.id, &group.title),
            ..Default::default()
        });

        for section in &schema.sections {
            if section.is_group || section.parent_id.as_deref() != Some(group.id.as_str()) {
                continue;
            }
            let (text, constraints) = carry.content(&section.id, &section.title);
            out.push(UiSection {
                id: section.id.clone(),
                title: section.title.clone(),
                text,
                parent_id: Some(group.id.clone()),
                is_group: false,
                constraints,
                ..Default::default()
            });
        }
    }

    // Everything without a resolvable group parent lands flat at the root,
    // after all groups, in schema order. Group-flagged leaves surface here
    // too; the deduplicator collapses them against their group node.
    for section in &schema.sections {
        let parented = section
            .parent_id
            .as_deref()
            .map(|p| schema.groups.iter().any(|g| g.id == p))
            .unwrap_or(false);
        if parented && !section.is_group {
            continue;
        }
        let (text, constraints) = if section.is_group {
            (String::new(), carry.constraints(&section.id, &section.title))
        } else {
            carry.content(&section.id, &section.title)
        };
        out.push(UiSection {
            id: section.id.clone(),
            title: section.title.clone(),
            text,
            parent_id: None,
            is_group: section.is_group,
            constraints,
            ..Default::default()
        });
    }

    out
}

/// Normalizes a title for carry-over matching: lowercased, whitespace
/// collapsed.
fn normalize_title(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

struct CarryOver<'a> {
    by_id: HashMap<&'a str, &'a UiSection>,
    by_title: HashMap<String, &'a UiSection>,
}

impl<'a> CarryOver<'a> {
    fn index(prior: &'a [UiSection]) -> Self {
        let mut by_id = HashMap::new();
        let mut by_title = HashMap::new();
        for section in prior {
            by_id.entry(section.id.as_str()).or_insert(section);
            let key = normalize_title(&section.title);
            if !key.is_empty() {
                by_title.entry(key).or_insert(section);
            }
        }
        Self { by_id, by_title }
    }

    fn lookup(&self, id: &str, title: &str) -> Option<&'a UiSection> {
        self.by_id
            .get(id)
            .copied()
            .or_else(|| self.by_title.get(&normalize_title(title)).copied())
    }

    fn content(&self, id: &str, title: &str) -> (String, String) {
        match self.lookup(id, title) {
            Some(prev) => (prev.text.clone(), prev.constraints.clone()),
            None => (String::new(), String::new()),
        }
    }

    fn constraints(&self, id: &str, title: &str) -> String {
        self.lookup(id, title)
            .map(|prev| prev.constraints.clone())
            .unwrap_or_default()
    }
}
