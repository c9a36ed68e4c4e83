use async_trait::async_trait;
use crate::types::{AppError, AppResult, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Configuration for an LLM provider
pub struct LLMProviderConfig {
    pub name: String,
    pub api_key: String,
    pub model: String,
}

pub struct LLM {
    adapter: Box<dyn LLMAdapter>,
    provider_name: String,
    model: String,
}

impl LLM {
    pub fn new(provider: LLMProviderConfig) -> AppResult<Self> {
        let adapter: Box<dyn LLMAdapter> = match provider.name.as_str() {
            "google" | "gemini" => Box::new(crate::llm::google::GoogleAdapter::new(&provider.api_key)),
            other => {
                return Err(AppError::InvalidRequest(format!("Unsupported provider: {}", other)));
            }
        };

        Ok(Self::with_adapter(adapter, &provider.name, &provider.model))
    }

    pub fn with_adapter(adapter: Box<dyn LLMAdapter>, provider_name: &str, model: &str) -> Self {
        Self {
            adapter,
            provider_name: provider_name.to_string(),
            model: model.to_string(),
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }
}
