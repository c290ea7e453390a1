// Prompt constants for resume analysis. The system prompt is the shared
// JSON-only one from llm_client::prompts.

/// Analysis prompt template. Replace `{resume_text}` before sending.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"You are an expert career coach and professional resume reviewer.
Analyze the following resume text and provide constructive, actionable feedback.

Return a JSON object with EXACTLY these keys:
{
  "summary": "A brief, one-sentence overview of the resume's quality.",
  "strengths": ["3-4 specific positive aspects of the resume"],
  "improvements": ["3-4 specific, actionable areas for improvement"],
  "score": 72,
  "recommendations": ["Next steps the user should take"]
}

"score" is an integer estimate of overall quality from 0 to 100.

Resume text:
---
{resume_text}
---"#;

pub fn build_analysis_prompt(resume_text: &str) -> String {
    ANALYSIS_PROMPT_TEMPLATE.replacen("{resume_text}", resume_text, 1)
}
