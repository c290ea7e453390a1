//! Text Enhancement: rewrites a resume passage through the LLM.
//!
//! The service never fails the caller because of the model. Any generation error,
//! or an empty completion, degrades to returning the input unchanged.

pub mod handlers;
pub mod prompts;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{AppError, FieldErrors};
use crate::llm_client::prompts::RESUME_WRITER_SYSTEM;
use crate::llm_client::TextGenerator;
use crate::validation;

pub const MAX_TEXT_LEN: usize = 5000;
pub const MAX_CONTEXT_LEN: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct EnhanceRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EnhanceResponse {
    pub original_text: String,
    pub enhanced_text: String,
}

impl EnhanceRequest {
    /// Returns the trimmed text and context.
    pub fn validate(&self) -> Result<(String, String), AppError> {
        let mut errors = FieldErrors::new();
        let text = self.text.trim();
        if text.is_empty() {
            errors.add("text", "Text cannot be empty.");
        } else if text.chars().count() > MAX_TEXT_LEN {
            errors.add("text", validation::too_long(MAX_TEXT_LEN));
        }
        let context = validation::optional_text(
            &mut errors,
            "context",
            self.context.as_deref().unwrap_or_default(),
            MAX_CONTEXT_LEN,
        );
        errors.into_result()?;
        Ok((text.to_string(), context))
    }
}

#[derive(Clone)]
pub struct TextEnhancer {
    generator: Arc<dyn TextGenerator>,
}

impl TextEnhancer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Expects text that already passed `EnhanceRequest::validate`.
    pub async fn enhance(&self, text: &str, context: &str) -> String {
        let prompt = prompts::build_enhance_prompt(text, context);
        match self.generator.generate(&prompt, RESUME_WRITER_SYSTEM).await {
            Ok(enhanced) => {
                info!(
                    input_chars = text.chars().count(),
                    output_chars = enhanced.chars().count(),
                    "Enhanced text"
                );
                enhanced
            }
            Err(e) => {
                warn!("Text enhancement failed, returning original text: {e}");
                text.to_string()
            }
        }
    }

    pub async fn handle(&self, request: &EnhanceRequest) -> Result<EnhanceResponse, AppError> {
        let (text, context) = request.validate()?;
        let enhanced_text = self.enhance(&text, &context).await;
        Ok(EnhanceResponse {
            original_text: text,
            enhanced_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::fakes::FakeGenerator;

    fn request(text: &str, context: Option<&str>) -> EnhanceRequest {
        EnhanceRequest {
            text: text.to_string(),
            context: context.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_returns_enhanced_text() {
        let fake = FakeGenerator::replying("Led a team of 5 engineers to ship X");
        let enhancer = TextEnhancer::new(fake.clone());

        let response = enhancer
            .handle(&request("  managed a team  ", Some("Engineering manager")))
            .await
            .unwrap();

        assert_eq!(response.original_text, "managed a team");
        assert_eq!(response.enhanced_text, "Led a team of 5 engineers to ship X");
        let prompt = fake.last_prompt().unwrap();
        assert!(prompt.contains("managed a team"));
        assert!(prompt.contains("Engineering manager"));
    }

    #[tokio::test]
    async fn test_falls_back_to_original_on_ai_failure() {
        let fake = FakeGenerator::failing();
        let enhancer = TextEnhancer::new(fake.clone());

        let response = enhancer
            .handle(&request("Wrote unit tests", None))
            .await
            .unwrap();

        assert_eq!(response.enhanced_text, "Wrote unit tests");
        assert_eq!(response.original_text, "Wrote unit tests");
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn test_whitespace_text_is_rejected_without_calling_ai() {
        let fake = FakeGenerator::replying("unused");
        let enhancer = TextEnhancer::new(fake.clone());

        let err = enhancer.handle(&request("   ", None)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFields(ref f) if f.contains("text")));
        assert_eq!(fake.calls(), 0);
    }

    #[test]
    fn test_length_limits() {
        assert!(request(&"a".repeat(MAX_TEXT_LEN), None).validate().is_ok());
        let err = request(&"a".repeat(MAX_TEXT_LEN + 1), None)
            .validate()
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidFields(ref f) if f.contains("text")));

        let err = request("ok", Some(&"c".repeat(MAX_CONTEXT_LEN + 1)))
            .validate()
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidFields(ref f) if f.contains("context")));
    }

    #[test]
    fn test_blank_context_is_allowed() {
        let (text, context) = request("Shipped it", Some("  ")).validate().unwrap();
        assert_eq!(text, "Shipped it");
        assert_eq!(context, "");
    }
}
