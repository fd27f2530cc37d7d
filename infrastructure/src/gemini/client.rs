//! Gemini client: the [`ModelGateway`] adapter.

use crate::config::GeminiSettings;
use crate::gemini::error::{GeminiError, Result};
use crate::gemini::protocol::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, JSON_MIME_TYPE,
};
use async_trait::async_trait;
use mcp_chat_application::ports::model_gateway::{
    GatewayError, ModelGateway, ModelRequest, ResponseFormat,
};
use mcp_chat_domain::{Conversation, ErrorReport, Message, PromptTemplate, preview};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, error, info};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const API_KEY_HEADER: &str = "x-goog-api-key";

/// HTTP client for the Gemini `generateContent` endpoint.
///
/// Keeps the multi-turn history itself; every request carries the prior
/// turns, and only requests with `persist_history` are recorded.
pub struct GeminiClient {
    http: reqwest::Client,
    settings: GeminiSettings,
    history: Mutex<Conversation>,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        info!("Gemini client initialized: model={}", settings.model);

        Ok(Self {
            http,
            settings,
            history: Mutex::new(Conversation::new()),
        })
    }

    fn endpoint(&self) -> String {
        let model = &self.settings.model;
        let model = if model.starts_with("models/") || model.starts_with("tunedModels/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        format!("{}/v1beta/{}:generateContent", self.settings.base_url, model)
    }

    fn build_request(&self, request: &ModelRequest) -> GenerateContentRequest {
        let mut contents: Vec<Content> = self
            .history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .messages()
            .iter()
            .map(Content::from)
            .collect();
        contents.push(Content::user(PromptTemplate::with_context(
            &request.prompt,
            request.context.as_deref(),
        )));

        GenerateContentRequest {
            contents,
            system_instruction: self.settings.system_instruction.as_deref().map(Content::bare),
            generation_config: match request.response_format {
                ResponseFormat::Json => Some(GenerationConfig {
                    response_mime_type: JSON_MIME_TYPE.to_string(),
                }),
                ResponseFormat::Text => None,
            },
        }
    }

    async fn generate(&self, body: &GenerateContentRequest) -> Result<String> {
        let response = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.settings.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        if let Some(text) = parsed.text() {
            return Ok(text);
        }
        match parsed.block_reason() {
            Some(reason) => Err(GeminiError::Blocked(reason.to_string())),
            None => Err(GeminiError::EmptyResponse),
        }
    }
}

#[async_trait]
impl ModelGateway for GeminiClient {
    async fn send(&self, request: ModelRequest) -> std::result::Result<String, GatewayError> {
        debug!("Sending message: {}", preview(&request.prompt, 50));

        let body = self.build_request(&request);
        let reply = match self.generate(&body).await {
            Ok(reply) => reply,
            Err(e) => {
                let report = ErrorReport::new(e.kind(), &e, Some("gemini"));
                error!("{}", report.log_message);
                return Err(e.into());
            }
        };

        debug!("Received reply: {}", preview(&reply, 50));
        if request.persist_history {
            self.history
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push_exchange(request.prompt, reply.clone());
        }
        Ok(reply)
    }

    fn history(&self) -> Vec<Message> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .messages()
            .to_vec()
    }

    fn reset_history(&self) {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        debug!("Gemini history cleared");
    }
}
