// Prompt constants for the text enhancement service.

/// Rewrite prompt template. Replace `{context}` and `{text}` before sending.
pub const ENHANCE_PROMPT_TEMPLATE: &str = r#"Rewrite the following text block to make it more impactful and professional for a resume.

Instructions:
1. Start sentences with strong, quantifiable action verbs.
2. Incorporate metrics and results where possible. If none are provided, suggest where they could be added.
3. Ensure the tone is professional and confident.
4. Correct any spelling or grammatical errors.
5. Do NOT add any introductory or concluding phrases like "Here is the enhanced version:".
6. Return ONLY the rewritten and enhanced text block. Nothing else.

Context for the text (if any): "{context}"

Original text to enhance:
---
{text}
---"#;

pub fn build_enhance_prompt(text: &str, context: &str) -> String {
    // `{context}` precedes `{text}` in the template, so placeholders typed by the
    // user are never substituted.
    ENHANCE_PROMPT_TEMPLATE
        .replacen("{text}", text, 1)
        .replacen("{context}", context, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_text_and_context() {
        let prompt = build_enhance_prompt("Managed a team", "Senior Rust developer role");
        assert!(prompt.contains("---\nManaged a team\n---"));
        assert!(prompt.contains("\"Senior Rust developer role\""));
        assert!(prompt.contains("action verbs"));
        assert!(!prompt.contains("{text}"));
        assert!(!prompt.contains("{context}"));
    }

    #[test]
    fn test_user_supplied_placeholders_stay_literal() {
        let prompt = build_enhance_prompt("Wrote {context} docs", "{text}");
        assert!(prompt.contains("\"{text}\""));
        assert!(prompt.contains("Wrote {context} docs"));
    }
}
