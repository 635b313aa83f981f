//! Shape coercion for loosely-typed schema documents.
//!
//! Normalization is intentionally lossy for garbage input: entries with a
//! missing or empty id or title are dropped. It is not an invariant
//! enforcer — run `validate_schema` on the raw document first so malformed
//! entries surface as errors and warnings before they disappear here.

use serde_json::Value;

use crate::schema::models::{Group, Schema, SectionNode};

/// Coerces a loosely-typed document into a canonical `Schema`.
pub fn normalize_schema(doc: &Value) -> Schema {
    let mut schema = Schema {
        version: coerce_string(doc.get("version")).unwrap_or_default(),
        notes: coerce_string(doc.get("notes")).unwrap_or_default(),
        ..Default::default()
    };

    if let Some(groups) = doc.get("groups").and_then(Value::as_array) {
        for entry in groups {
            let (Some(id), Some(title)) = (
                coerce_string(entry.get("id")),
                coerce_string(entry.get("title")),
            ) else {
                continue;
            };
            schema.groups.push(Group { id, title });
        }
    }

    if let Some(sections) = doc.get("sections").and_then(Value::as_array) {
        for entry in sections {
            let (Some(id), Some(title)) = (
                coerce_string(entry.get("id")),
                coerce_string(entry.get("title")),
            ) else {
                continue;
            };
            schema.sections.push(SectionNode {
                id,
                title,
                is_group: entry
                    .get("isGroup")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                parent_id: coerce_string(entry.get("parentId")),
                start: coerce_string(entry.get("start")),
                end: coerce_string(entry.get("end")),
            });
        }
    }

    schema
}

/// Primitive coercion: trimmed non-empty strings pass through, numbers are
/// stringified. Everything else is treated as absent.
fn coerce_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_document_survives_unchanged() {
        let doc = json!({
            "version": "2",
            "notes": "hand-tuned",
            "groups": [{"id": "exp", "title": "Experience"}],
            "sections": [
                {"id": "exp", "title": "Experience", "isGroup": true},
                {"id": "exp1", "title": "Job A", "parentId": "exp", "start": "ACME", "end": "EDUCATION"}
            ]
        });
        let schema = normalize_schema(&doc);
        assert_eq!(schema.version, "2");
        assert_eq!(schema.groups.len(), 1);
        assert_eq!(schema.sections.len(), 2);
        assert_eq!(schema.sections[1].start.as_deref(), Some("ACME"));
        assert_eq!(schema.sections[1].parent_id.as_deref(), Some("exp"));
    }

    #[test]
    fn test_entries_missing_id_or_title_are_dropped() {
        let doc = json!({
            "groups": [
                {"id": "exp", "title": "Experience"},
                {"id": "", "title": "No Id"},
                {"title": "Still No Id"},
                {"id": "edu"}
            ],
            "sections": [
                {"id": "s1", "title": "Kept"},
                {"id": "s2", "title": "   "},
                "garbage",
                42
            ]
        });
        let schema = normalize_schema(&doc);
        assert_eq!(schema.groups.len(), 1);
        assert_eq!(schema.groups[0].id, "exp");
        assert_eq!(schema.sections.len(), 1);
        assert_eq!(schema.sections[0].id, "s1");
    }

    #[test]
    fn test_numeric_ids_and_parents_are_stringified() {
        let doc = json!({
            "groups": [{"id": 1, "title": "Experience"}],
            "sections": [{"id": 1.1, "title": "Job A", "parentId": 1}]
        });
        let schema = normalize_schema(&doc);
        assert_eq!(schema.groups[0].id, "1");
        assert_eq!(schema.sections[0].id, "1.1");
        assert_eq!(schema.sections[0].parent_id.as_deref(), Some("1"));
    }

    #[test]
    fn test_non_boolean_is_group_coerces_to_false() {
        let doc = json!({
            "groups": [],
            "sections": [{"id": "s1", "title": "One", "isGroup": "yes"}]
        });
        let schema = normalize_schema(&doc);
        assert!(!schema.sections[0].is_group);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let doc = json!({
            "groups": [{"id": "  exp  ", "title": "  Experience "}],
            "sections": []
        });
        let schema = normalize_schema(&doc);
        assert_eq!(schema.groups[0].id, "exp");
        assert_eq!(schema.groups[0].title, "Experience");
    }

    #[test]
    fn test_non_object_document_normalizes_to_empty() {
        let schema = normalize_schema(&json!("not a schema"));
        assert!(schema.is_empty());
        assert_eq!(schema.version, "");
    }
}
