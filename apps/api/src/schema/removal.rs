//! Explicit-removal detection over free-form edit instructions.
//!
//! This is a literal keyword heuristic, not language understanding. It only
//! activates when the text contains a removal verb from the allow-list, and
//! it prefers false negatives (missing an intended removal) over false
//! positives (authorizing a removal the user did not ask for) — a missed
//! removal leaves a stale section behind, a wrong one destroys user data.

use std::collections::HashSet;

use crate::schema::models::Schema;

/// Removal verbs in the two supported instruction languages. This is
/// configuration, not logic: `REMOVAL_KEYWORDS_EXTRA` extends it at runtime.
pub const REMOVAL_KEYWORDS: &[&str] = &[
    "remove", "delete", "drop", "cut", "删除", "移除", "去掉", "删去",
];

/// Returns the set of base section ids the instructions explicitly ask to
/// remove. Matching is case-insensitive and whole-word for ASCII terms;
/// terms containing non-ASCII text (CJK has no word boundaries) match by
/// substring.
pub fn extract_removals(
    instructions: &str,
    base: &Schema,
    extra_keywords: &[String],
) -> HashSet<String> {
    let text = instructions.to_lowercase();
    let mut removed = HashSet::new();

    let activated = REMOVAL_KEYWORDS
        .iter()
        .copied()
        .chain(extra_keywords.iter().map(String::as_str))
        .any(|kw| contains_term(&text, kw));
    if !activated {
        return removed;
    }

    for section in &base.sections {
        if contains_term(&text, &section.id) || contains_term(&text, &section.title) {
            removed.insert(section.id.clone());
        }
    }

    removed
}

/// Case-insensitive search for `term` in (already lowercased) `text`.
/// ASCII terms must sit on word boundaries; `_` counts as a word character
/// so `exp` does not match inside `exp_1`.
fn contains_term(text: &str, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return false;
    }
    if !term.is_ascii() {
        return text.contains(&term);
    }

    let mut from = 0;
    while let Some(pos) = text[from..].find(&term) {
        let at = from + pos;
        let end = at + term.len();
        let before_ok = text[..at]
            .chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c));
        let after_ok = text[end..].chars().next().map_or(true, |c| !is_word_char(c));
        if before_ok && after_ok {
            return true;
        }
        from = end;
    }
    false
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
