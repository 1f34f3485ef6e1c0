//! Query routing: direct answer, tool execution, or retrieval augmentation.

use std::sync::Arc;

use docrag_core::{ChatModel, Error, ModelTurn, Result};
use tracing::{debug, info, warn};

use crate::tools::{ToolInvocation, UserDirectory};
use crate::Retriever;

/// Reply for tool calls the router refuses to execute
const UNSUPPORTED_REPLY: &str = "Sorry, I can't call that function.";

/// Routes a prompt to one of three terminal states.
///
/// 1. The model requests a known tool: execute it and let the model finish
///    with the tool's result.
/// 2. The model requests an unknown tool: a fixed "unsupported" reply.
/// 3. The model answers in text: retrieve context for the prompt and, when
///    any exists, regenerate with the context injected; otherwise the first
///    answer stands.
pub struct QueryRouter {
    model: Arc<dyn ChatModel>,
    directory: Arc<dyn UserDirectory>,
    retriever: Arc<Retriever>,
    top_k: usize,
}

impl QueryRouter {
    pub fn new(
        model: Arc<dyn ChatModel>,
        directory: Arc<dyn UserDirectory>,
        retriever: Arc<Retriever>,
        top_k: usize,
    ) -> Self {
        Self {
            model,
            directory,
            retriever,
            top_k,
        }
    }

    pub async fn answer(&self, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(Error::Validation("empty prompt".to_string()));
        }

        match self.model.generate(prompt).await? {
            ModelTurn::ToolCall(request) => {
                let Some(invocation) = ToolInvocation::decode(&request) else {
                    warn!(tool = %request.name, "model requested an unsupported tool");
                    return Ok(UNSUPPORTED_REPLY.to_string());
                };

                info!(tool = %request.name, "executing tool");
                let result = self.dispatch(invocation).await?;
                let reply = self
                    .model
                    .generate_with_tool_result(prompt, &request, &result)
                    .await?;
                Ok(reply)
            }
            ModelTurn::Text(text) => {
                let context = self.retriever.retrieve(prompt, self.top_k).await;
                if context.is_empty() {
                    debug!("no context retrieved, keeping direct answer");
                    return Ok(text);
                }

                let augmented = augment(prompt, &context);
                match self.model.generate(&augmented).await? {
                    ModelTurn::Text(grounded) => Ok(grounded),
                    // tool calls against an augmented prompt are off-script;
                    // fall back to the ungrounded first answer
                    ModelTurn::ToolCall(_) => Ok(text),
                }
            }
        }
    }

    async fn dispatch(&self, invocation: ToolInvocation) -> Result<serde_json::Value> {
        match invocation {
            ToolInvocation::AuthorizeUser { email } => {
                let authorized = self.directory.authorize(&email).await?;
                Ok(serde_json::json!({
                    "status": if authorized.newly_registered { "registered" } else { "known" },
                    "user": authorized.profile,
                }))
            }
            ToolInvocation::GetUserProfile { email } => {
                match self.directory.profile(&email).await? {
                    Some(profile) => Ok(serde_json::json!({ "user": profile })),
                    None => Ok(serde_json::json!({ "error": "user not found" })),
                }
            }
        }
    }
}

fn augment(prompt: &str, context: &[String]) -> String {
    format!(
        "Based ONLY on the following context, answer the question. \
         If the context does not contain the answer, say that you don't know.\n\n\
         Context:\n{}\n\nQuestion: {prompt}",
        context.join("\n\n")
    )
}
