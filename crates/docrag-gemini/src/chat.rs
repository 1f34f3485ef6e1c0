//! Gemini chat model with function calling.

use async_trait::async_trait;
use docrag_core::{ChatModel, ModelTurn, ProviderError, ToolRequest};
use serde::Deserialize;
use serde_json::json;

use crate::GeminiClient;

const MODEL: &str = "gemini-1.5-flash";

/// Chat client for `gemini-1.5-flash`.
///
/// Function declarations are attached to every request; the model decides
/// per prompt whether to answer in text or emit a `functionCall` part, which
/// surfaces as [`ModelTurn::ToolCall`].
pub struct GeminiChat {
    client: GeminiClient,
    tools: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
    #[serde(rename = "functionCall")]
    function_call: Option<FunctionCall>,
}

#[derive(Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

impl GeminiChat {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            tools: None,
        }
    }

    /// Attach function declarations in the API's `functionDeclarations`
    /// format (an array of declaration objects).
    pub fn with_tools(mut self, declarations: serde_json::Value) -> Self {
        self.tools = Some(json!([{ "functionDeclarations": declarations }]));
        self
    }

    fn request_body(&self, contents: serde_json::Value) -> serde_json::Value {
        let mut body = json!({ "contents": contents });
        if let Some(tools) = &self.tools {
            body["tools"] = tools.clone();
        }
        body
    }

    async fn call(&self, contents: serde_json::Value) -> Result<GenerateResponse, ProviderError> {
        self.client
            .post(MODEL, "generateContent", &self.request_body(contents))
            .await
    }
}

fn first_turn(response: GenerateResponse) -> Result<ModelTurn, ProviderError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::MalformedResponse("no candidates".to_string()))?;

    // a function call takes precedence wherever it sits among the parts
    let mut text = None;
    for part in candidate.content.parts {
        if let Some(call) = part.function_call {
            return Ok(ModelTurn::ToolCall(ToolRequest {
                name: call.name,
                arguments: call.args,
            }));
        }
        if text.is_none() {
            text = part.text;
        }
    }
    text.map(ModelTurn::Text).ok_or_else(|| {
        ProviderError::MalformedResponse(
            "candidate had neither text nor a function call".to_string(),
        )
    })
}

#[async_trait]
impl ChatModel for GeminiChat {
    fn model_name(&self) -> &str {
        MODEL
    }

    async fn generate(&self, prompt: &str) -> Result<ModelTurn, ProviderError> {
        let contents = json!([
            { "role": "user", "parts": [{ "text": prompt }] }
        ]);
        first_turn(self.call(contents).await?)
    }

    async fn generate_with_tool_result(
        &self,
        prompt: &str,
        call: &ToolRequest,
        result: &serde_json::Value,
    ) -> Result<String, ProviderError> {
        // replay the model's own call, then hand it the function response
        let contents = json!([
            { "role": "user", "parts": [{ "text": prompt }] },
            {
                "role": "model",
                "parts": [{ "functionCall": { "name": call.name, "args": call.arguments } }]
            },
            {
                "role": "function",
                "parts": [{
                    "functionResponse": { "name": call.name, "response": result }
                }]
            }
        ]);

        match first_turn(self.call(contents).await?)? {
            ModelTurn::Text(text) => Ok(text),
            ModelTurn::ToolCall(next) => Err(ProviderError::MalformedResponse(format!(
                "model requested another tool ({}) instead of answering",
                next.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_part_becomes_a_text_turn() {
        let json = r#"{
            "candidates": [{
                "content": { "parts": [{ "text": "hello there" }] }
            }]
        }"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        let turn = first_turn(response).unwrap();
        assert!(matches!(turn, ModelTurn::Text(t) if t == "hello there"));
    }

    #[test]
    fn function_call_part_becomes_a_tool_turn() {
        let json = r#"{
            "candidates": [{
                "content": { "parts": [{
                    "functionCall": {
                        "name": "authorize_user",
                        "args": { "email": "ada@example.com" }
                    }
                }] }
            }]
        }"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        match first_turn(response).unwrap() {
            ModelTurn::ToolCall(request) => {
                assert_eq!(request.name, "authorize_user");
                assert_eq!(request.arguments["email"], "ada@example.com");
            }
            ModelTurn::Text(_) => panic!("expected a tool call"),
        }
    }

    #[test]
    fn function_call_wins_over_text_in_the_same_candidate() {
        let json = r#"{
            "candidates": [{
                "content": { "parts": [
                    { "functionCall": { "name": "get_user_profile", "args": {} } },
                    { "text": "ignored" }
                ] }
            }]
        }"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            first_turn(response).unwrap(),
            ModelTurn::ToolCall(_)
        ));
    }

    #[test]
    fn empty_candidates_are_malformed() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(matches!(
            first_turn(response),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn tools_are_attached_to_the_request_body() {
        let chat = GeminiChat::new(GeminiClient::new("test-key").unwrap())
            .with_tools(serde_json::json!([{ "name": "authorize_user" }]));
        let body = chat.request_body(serde_json::json!([]));
        assert_eq!(
            body["tools"][0]["functionDeclarations"][0]["name"],
            "authorize_user"
        );
    }
}
