//! Prompt constants for the schema producer call.

/// System prompt for schema adjustment. The output contract matters more
/// than the editing quality: a single JSON document, nothing else — the
/// caller treats anything unparseable as a producer failure and falls back
/// to the base schema.
pub const SCHEMA_ADJUST_SYSTEM: &str = "\
    You edit CV section schemas. A schema is a JSON object of the shape \
    {\"version\": string, \"notes\": string, \"groups\": [{\"id\", \"title\"}], \
    \"sections\": [{\"id\", \"title\", \"isGroup\"?, \"parentId\"?, \"start\"?, \"end\"?}]}. \
    You MUST respond with exactly one JSON document of that shape. \
    Do NOT use markdown code fences. \
    Do NOT include prose, explanations, or apologies.";

/// User prompt template. Placeholders: `{base_schema}`, `{instructions}`.
pub const SCHEMA_ADJUST_PROMPT_TEMPLATE: &str = "\
Task:
Apply the user's instructions to the CV section schema below and return the full edited schema.

RULES (DO NOT IGNORE):
- Keep every existing group and section unless the instructions explicitly ask to remove it.
- Never change an existing id. Renames change the title only.
- New sections get a short, stable, lowercase id.
- Keep `start`/`end` anchor strings exactly as they are; never invent new anchors.
- `parentId` must reference a group id that exists in the edited schema.
- Output ONLY the JSON schema document.

Current schema:
{base_schema}

User instructions:
{instructions}
";
