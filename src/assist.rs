//! Invoice Assistant
//!
//! Drafts invoice copy (description, scope of work, payment terms) from a
//! short brief. One templated prompt per generation type, one model call,
//! no retries.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::llm::LLM;
use crate::types::{AppResult, LLMMessage, LLMRequest};

/// What the caller wants drafted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationType {
    Description,
    Scope,
    Terms,
    /// Description, scope and terms as one JSON object
    Full,
    /// Unknown or missing type: the prompt is forwarded verbatim
    Raw,
}

impl GenerationType {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("description") => GenerationType::Description,
            Some("scope") => GenerationType::Scope,
            Some("terms") => GenerationType::Terms,
            Some("full") => GenerationType::Full,
            _ => GenerationType::Raw,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default, rename = "type")]
    pub generation_type: Option<String>,
}

/// Successful generation: raw text, or the parsed object for `full`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Generated {
    Data { success: bool, data: serde_json::Value },
    Text { success: bool, text: String },
}

pub struct InvoiceAssistant;

impl InvoiceAssistant {
    pub fn build_prompt(generation_type: GenerationType, prompt: &str) -> String {
        match generation_type {
            GenerationType::Description => format!(
                "You are an invoice assistant. Generate a professional, concise invoice description \
                 (1-2 sentences max) based on the user's input. Only return the description, nothing else.\n\n\
                 User input: {}",
                prompt
            ),
            GenerationType::Scope => format!(
                "You are a professional contract writer. Based on the service description, generate a clear \
                 scope of work (3-5 bullet points). Format as a simple list. Be concise and professional.\n\n\
                 Service: {}",
                prompt
            ),
            GenerationType::Terms => format!(
                "You are a professional contract writer. Generate standard payment terms and conditions for a \
                 freelance invoice. Keep it brief (3-4 points). Include: payment timeline, revision policy, \
                 and any standard disclaimers.\n\n\
                 Service type: {}",
                prompt
            ),
            GenerationType::Full => format!(
                "You are an invoice assistant. Based on this brief description, generate:\n\
                 1. A professional invoice description (1 sentence)\n\
                 2. Scope of work (3-4 bullet points)\n\
                 3. Payment terms (2-3 points)\n\n\
                 Format your response as JSON with keys: description, scope, terms\n\n\
                 Brief: {}",
                prompt
            ),
            GenerationType::Raw => prompt.to_string(),
        }
    }

    /// Parse the widest `{ ... }` span of a model reply as JSON
    pub fn extract_json(text: &str) -> Option<serde_json::Value> {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        if end <= start {
            return None;
        }
        serde_json::from_str(&text[start..=end]).ok()
    }

    pub async fn generate(
        llm: &LLM,
        generation_type: GenerationType,
        prompt: &str,
    ) -> AppResult<Generated> {
        info!(
            prompt_len = prompt.len(),
            generation_type = ?generation_type,
            provider = llm.provider_name(),
            "Generating invoice copy"
        );

        let request = LLMRequest {
            provider: llm.provider_name().to_string(),
            model: llm.model().to_string(),
            messages: vec![LLMMessage::user(Self::build_prompt(generation_type, prompt))],
            max_tokens: None,
            temperature: None,
            system_instruction: None,
        };

        let response = llm.create_chat_completion(&request).await?;
        let text = response.content;

        if generation_type == GenerationType::Full {
            match Self::extract_json(&text) {
                Some(data) => return Ok(Generated::Data { success: true, data }),
                None => warn!("Full generation did not contain parseable JSON, returning raw text"),
            }
        }

        Ok(Generated::Text { success: true, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LLMAdapter;
    use crate::types::{LLMResponse, TokenUsage};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct StaticAdapter {
        reply: String,
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl LLMAdapter for StaticAdapter {
        async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
            self.seen.lock().unwrap().push(request.messages[0].content.clone());
            Ok(LLMResponse {
                content: self.reply.clone(),
                finish_reason: "STOP".to_string(),
                usage: TokenUsage::default(),
            })
        }
    }

    fn llm(reply: &str) -> (LLM, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let adapter = StaticAdapter { reply: reply.to_string(), seen: seen.clone() };
        (LLM::with_adapter(Box::new(adapter), "google", "gemini-pro"), seen)
    }

    #[test]
    fn test_parse_generation_type() {
        assert_eq!(GenerationType::parse(Some("scope")), GenerationType::Scope);
        assert_eq!(GenerationType::parse(Some("full")), GenerationType::Full);
        assert_eq!(GenerationType::parse(Some("poem")), GenerationType::Raw);
        assert_eq!(GenerationType::parse(None), GenerationType::Raw);
    }

    #[test]
    fn test_prompts_embed_brief() {
        let prompt = InvoiceAssistant::build_prompt(GenerationType::Terms, "logo design");
        assert!(prompt.ends_with("Service type: logo design"));
        assert_eq!(InvoiceAssistant::build_prompt(GenerationType::Raw, "as is"), "as is");
    }

    #[test]
    fn test_extract_json() {
        let text = "Sure!\n```json\n{\"description\": \"Edit\", \"scope\": \"- cut\"}\n```";
        let value = InvoiceAssistant::extract_json(text).unwrap();
        assert_eq!(value["description"], "Edit");

        assert!(InvoiceAssistant::extract_json("no json here").is_none());
        assert!(InvoiceAssistant::extract_json("} backwards {").is_none());
    }

    #[tokio::test]
    async fn test_full_generation_returns_data() {
        let (llm, seen) = llm("{\"description\": \"d\", \"scope\": \"s\", \"terms\": \"t\"}");
        let out = InvoiceAssistant::generate(&llm, GenerationType::Full, "video edit")
            .await
            .unwrap();

        match out {
            Generated::Data { data, .. } => assert_eq!(data["terms"], "t"),
            other => panic!("expected data, got {:?}", other),
        }
        assert!(seen.lock().unwrap()[0].contains("Brief: video edit"));
    }

    #[tokio::test]
    async fn test_full_generation_falls_back_to_text() {
        let (llm, _) = llm("I could not do that");
        let out = InvoiceAssistant::generate(&llm, GenerationType::Full, "x").await.unwrap();
        assert_eq!(
            out,
            Generated::Text { success: true, text: "I could not do that".to_string() }
        );
    }
}
