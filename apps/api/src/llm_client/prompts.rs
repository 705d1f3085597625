// Cross-cutting prompt fragments for the generation client.
// Each pipeline defines its own prompts.rs alongside it; this file holds the
// pieces that wrap every call regardless of pipeline.

/// System prompt enforcing JSON-only output for every generation call.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Header placed above the output schema description appended to each prompt.
pub const SCHEMA_HINT_HEADER: &str =
    "Respond with a single JSON object containing exactly these fields:";

/// Footer placed below the schema description.
pub const SCHEMA_HINT_FOOTER: &str = "Return ONLY the JSON object. \
    Include every required field. Omit optional fields you cannot determine \
    rather than inventing values.";
