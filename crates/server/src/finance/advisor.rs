//! Financial advice proxy
//!
//! Turns a summary of the user's spending plus their question into a prompt,
//! sends it to the configured language model and returns the reply as-is.
//! Each call is independent; no conversation history is kept.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use genai::chat::{ChatMessage, ChatRequest};
use genai::resolver::{AuthData, AuthResolver};
use genai::{Client as GenAIClient, ModelIden};

use crate::core::config::ServerConfig;
use crate::core::error::{Error, Result};
use crate::finance::records::FinancialRecord;
use crate::finance::summary;

/// Something that can turn a prompt into text
#[async_trait]
pub trait AdviceProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Provider backed by the genai client
pub struct GenAiProvider {
    client: GenAIClient,
    model: String,
}

impl GenAiProvider {
    pub fn new(api_key: String, model: String) -> Self {
        let auth_resolver = AuthResolver::from_resolver_fn(
            move |_model_iden: ModelIden| -> std::result::Result<Option<AuthData>, genai::resolver::Error> {
                Ok(Some(AuthData::from_single(api_key.clone())))
            },
        );

        let client = GenAIClient::builder()
            .with_auth_resolver(auth_resolver)
            .build();

        Self { client, model }
    }
}

#[async_trait]
impl AdviceProvider for GenAiProvider {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let chat_req = ChatRequest::new(vec![ChatMessage::user(prompt)]);

        info!("[Advisor] Calling {} for advice...", self.model);

        let response = self
            .client
            .exec_chat(&self.model, chat_req, None)
            .await
            .map_err(|e| anyhow::anyhow!("GenAI error: {}", e))?;

        response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("GenAI returned no text"))
    }
}

/// Spending snapshot shared with the model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub total_expenses: f64,
    pub expense_count: usize,
    pub largest_expense: f64,
}

impl UserContext {
    pub fn from_expenses(expenses: &[FinancialRecord]) -> Self {
        Self {
            total_expenses: summary::total(expenses),
            expense_count: expenses.len(),
            largest_expense: summary::min_max(expenses).1,
        }
    }
}

pub fn build_prompt(context: &UserContext, question: &str) -> Result<String> {
    let snapshot = serde_json::to_string_pretty(context)?;

    Ok(format!(
        "You are an AI financial advisor. Use the following user context to provide personalized financial advice:\n\
         \n\
         {snapshot}\n\
         \n\
         User question: {question}\n\
         \n\
         Provide a concise, helpful response addressing the user's question and considering their financial situation.\n\
         If the question is not related to finance, politely redirect the conversation to financial topics.\n"
    ))
}

pub struct AdviceProxy {
    provider: Arc<dyn AdviceProvider>,
    timeout: Duration,
}

impl AdviceProxy {
    pub fn new(provider: Arc<dyn AdviceProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Advisor talking to the real provider, or `None` without an API key
    pub fn from_config(config: &ServerConfig) -> Option<Self> {
        let api_key = config.llm_api_key.clone()?;

        info!("[Advisor] Using model: {}", config.llm_model);

        let provider = GenAiProvider::new(api_key, config.llm_model.clone());
        Some(Self::new(Arc::new(provider), config.advice_timeout))
    }

    /// One provider call, bounded by the timeout. Failures come back as
    /// `UpstreamUnavailable`; the detail stays in the logs.
    pub async fn get_advice(&self, context: &UserContext, question: &str) -> Result<String> {
        let prompt = build_prompt(context, question)?;

        match tokio::time::timeout(self.timeout, self.provider.complete(&prompt)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => {
                warn!("[Advisor] Provider failed: {}", e);
                Err(Error::UpstreamUnavailable(e.to_string()))
            }
            Err(_) => {
                warn!("[Advisor] Provider timed out after {:?}", self.timeout);
                Err(Error::UpstreamUnavailable(format!(
                    "timed out after {:?}",
                    self.timeout
                )))
            }
        }
    }
}
