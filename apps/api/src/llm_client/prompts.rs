// Shared prompt fragments. Each module that calls the model keeps its own prompts.rs;
// only cross-cutting pieces live here.

/// Appended to prompts that run in JSON mode.
pub const JSON_ONLY_INSTRUCTION: &str = "Respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Appended to prompts whose answer is parsed as a flat list.
pub const LIST_ONLY_INSTRUCTION: &str = "Do NOT include explanations, numbering or any text \
    other than the list itself.";
