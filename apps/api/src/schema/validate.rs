//! Schema validation — total over arbitrary JSON, accumulating every issue.
//!
//! Validation runs on the *pre-normalized* document so malformed entries are
//! visible before normalization silently drops them. A document with
//! blocking errors must never be committed as current state; warnings are
//! surfaced but never block.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MalformedDocument,
    MissingArray,
    MalformedEntry,
    EmptyId,
    EmptyTitle,
    DuplicateId,
    /// A `sections` entry claims `isGroup: true` but `groups` has no entry
    /// with the same id.
    GroupDeclarationMissing,
    /// A declared group has no matching `isGroup: true` section. Tolerated
    /// for backward compatibility.
    GroupLeafMissing,
    GroupWithParent,
    ParentNotFound,
    ParentNotGroup,
    IdCollision,
    NonBooleanIsGroup,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaIssue {
    pub kind: IssueKind,
    pub message: String,
}

impl SchemaIssue {
    fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationSummary {
    pub sections_count: usize,
    pub groups_count: usize,
    pub section_ids: Vec<String>,
    pub group_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub errors: Vec<SchemaIssue>,
    pub warnings: Vec<SchemaIssue>,
    pub summary: ValidationSummary,
}

/// Validates an arbitrary value purporting to be a schema document.
///
/// Never panics and never short-circuits: all checks run to completion so a
/// single call surfaces every problem at once, which matters when debugging
/// multi-error documents coming back from the text producer.
pub fn validate_schema(doc: &Value) -> ValidationReport {
    let mut errors: Vec<SchemaIssue> = Vec::new();
    let mut warnings: Vec<SchemaIssue> = Vec::new();

    let obj = match doc.as_object() {
        Some(o) => o,
        None => {
            errors.push(SchemaIssue::new(
                IssueKind::MalformedDocument,
                "schema must be a JSON object",
            ));
            return ValidationReport {
                ok: false,
                errors,
                warnings,
                summary: ValidationSummary::default(),
            };
        }
    };

    let groups = require_array(obj.get("groups"), "groups", &mut errors);
    let sections = require_array(obj.get("sections"), "sections", &mut errors);

    // Per-array well-formedness: ids present, non-empty, unique.
    let group_ids = check_entries(&groups, "groups", &mut errors, &mut warnings);
    let section_ids = check_entries(&sections, "sections", &mut errors, &mut warnings);

    // Section id -> isGroup, for cross-checks. Non-boolean isGroup is a
    // warning and treated as false.
    let mut section_is_group: HashMap<String, bool> = HashMap::new();
    for (i, entry) in sections.iter().enumerate() {
        let Some(id) = entry_id(entry) else { continue };
        let is_group = match entry.get("isGroup") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                warnings.push(SchemaIssue::new(
                    IssueKind::NonBooleanIsGroup,
                    format!(
                        "sections[{i}] '{id}' isGroup is {other} (not a boolean); treated as false"
                    ),
                ));
                false
            }
        };
        section_is_group.entry(id).or_insert(is_group);
    }

    let group_id_set: HashSet<&String> = group_ids.iter().collect();

    // Cross-check: every isGroup:true section needs a group declaration, and
    // must not carry a parent of its own.
    for (i, entry) in sections.iter().enumerate() {
        let Some(id) = entry_id(entry) else { continue };
        let is_group = section_is_group.get(&id).copied().unwrap_or(false);

        if is_group {
            if !group_id_set.contains(&id) {
                errors.push(SchemaIssue::new(
                    IssueKind::GroupDeclarationMissing,
                    format!("sections[{i}] '{id}' is flagged isGroup but 'groups' declares no entry with that id"),
                ));
            }
            if entry_parent_id(entry).is_some() {
                errors.push(SchemaIssue::new(
                    IssueKind::GroupWithParent,
                    format!("sections[{i}] '{id}' is a group and must not carry a parentId"),
                ));
            }
            continue;
        }

        // Leaf parent resolution: the parent must exist and must itself be a
        // group section.
        match entry.get("parentId") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if s.trim().is_empty() => {}
            Some(Value::String(s)) => {
                let parent = s.trim();
                match section_is_group.get(parent) {
                    None => errors.push(SchemaIssue::new(
                        IssueKind::ParentNotFound,
                        format!(
                            "sections[{i}] '{id}' parentId '{parent}' does not resolve to any section"
                        ),
                    )),
                    Some(false) => errors.push(SchemaIssue::new(
                        IssueKind::ParentNotGroup,
                        format!("sections[{i}] '{id}' parentId '{parent}' resolves to a non-group section"),
                    )),
                    Some(true) => {}
                }
            }
            Some(other) => errors.push(SchemaIssue::new(
                IssueKind::ParentNotFound,
                format!("sections[{i}] '{id}' parentId must be a string, got {other}"),
            )),
        }
    }

    // Cross-check: a declared group without an isGroup:true leaf is only a
    // warning (older documents declared groups one-sided).
    for id in &group_ids {
        match section_is_group.get(id) {
            Some(true) => {}
            Some(false) => errors.push(SchemaIssue::new(
                IssueKind::IdCollision,
                format!("id '{id}' appears both as a group and as a non-group section"),
            )),
            None => warnings.push(SchemaIssue::new(
                IssueKind::GroupLeafMissing,
                format!("group '{id}' has no matching isGroup section entry"),
            )),
        }
    }

    let ok = errors.is_empty();
    ValidationReport {
        ok,
        errors,
        warnings,
        summary: ValidationSummary {
            sections_count: sections.len(),
            groups_count: groups.len(),
            section_ids,
            group_ids,
        },
    }
}

/// Both arrays are required to be present — even if empty — for the
/// document to count as well-formed at the outer level.
fn require_array<'a>(
    value: Option<&'a Value>,
    field: &str,
    errors: &mut Vec<SchemaIssue>,
) -> Vec<&'a Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => {
            errors.push(SchemaIssue::new(
                IssueKind::MissingArray,
                format!("'{field}' must be an array, got {other}"),
            ));
            Vec::new()
        }
        None => {
            errors.push(SchemaIssue::new(
                IssueKind::MissingArray,
                format!("'{field}' array is missing"),
            ));
            Vec::new()
        }
    }
}

/// Validates id/title well-formedness and id uniqueness within one array.
/// Returns the unique well-formed ids in declaration order.
fn check_entries(
    entries: &[&Value],
    field: &str,
    errors: &mut Vec<SchemaIssue>,
    warnings: &mut Vec<SchemaIssue>,
) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut ids: Vec<String> = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        if !entry.is_object() {
            errors.push(SchemaIssue::new(
                IssueKind::MalformedEntry,
                format!("{field}[{i}] is not an object"),
            ));
            continue;
        }

        match entry_id(entry) {
            None => {
                errors.push(SchemaIssue::new(
                    IssueKind::EmptyId,
                    format!("{field}[{i}] id must be a non-empty string"),
                ));
            }
            Some(id) => {
                if !seen.insert(id.clone()) {
                    errors.push(SchemaIssue::new(
                        IssueKind::DuplicateId,
                        format!("duplicate id '{id}' in '{field}'"),
                    ));
                } else {
                    ids.push(id);
                }
            }
        }

        let title_ok = matches!(entry.get("title"), Some(Value::String(s)) if !s.trim().is_empty());
        if !title_ok {
            warnings.push(SchemaIssue::new(
                IssueKind::EmptyTitle,
                format!("{field}[{i}] has an empty title"),
            ));
        }
    }

    ids
}

fn entry_id(entry: &Value) -> Option<String> {
    match entry.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn entry_parent_id(entry: &Value) -> Option<String> {
    match entry.get("parentId") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}
