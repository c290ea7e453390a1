// Shared prompt fragments. Each service that calls the LLM keeps its own
// prompts.rs alongside it; only cross-cutting system prompts live here.

/// System prompt for every call that must come back as a bare JSON object.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// System prompt for free-text rewriting calls.
pub const RESUME_WRITER_SYSTEM: &str = "You are an expert career coach and professional \
    resume writer. You answer with the requested text only: no greetings, no preamble, \
    no closing remarks.";
