//! Chat-completions model using the `async-openai` request and response types.

use super::{LanguageModel, Message, ModelRequest, ModelResponse, ToolCallRequest, ToolDefinition};
use crate::config::ModelSettings;
use crate::error::{Result, VidmetaError};
use crate::openai::{create_client, ChatClient};
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
    FunctionObject,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Hosted chat model reached through an OpenAI-compatible API.
pub struct OpenAIModel {
    client: ChatClient,
    model: String,
    temperature: Option<f32>,
}

impl OpenAIModel {
    /// Create a model from settings, reading the API key from the environment.
    pub fn from_settings(settings: &ModelSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            model: settings.name.clone(),
            temperature: settings.temperature,
        })
    }

    /// Create a model around an existing client.
    pub fn with_client(client: ChatClient, settings: &ModelSettings) -> Self {
        Self {
            client,
            model: settings.name.clone(),
            temperature: settings.temperature,
        }
    }

    /// Use a different model identifier on the same endpoint.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

#[async_trait]
impl LanguageModel for OpenAIModel {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, request), fields(model = %self.model, messages = request.messages.len()))]
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse> {
        let messages = request
            .messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(messages);
        if !request.tools.is_empty() {
            args.tools(request.tools.iter().map(to_chat_tool).collect::<Vec<_>>());
        }
        if let Some(temperature) = self.temperature {
            args.temperature(temperature);
        }
        let chat_request = args.build().map_err(model_error)?;

        let response = self.client.create(&chat_request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| VidmetaError::model("No choices in model response"))?;

        let tool_calls: Vec<ToolCallRequest> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCallRequest {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        debug!(
            "Model replied with {} tool call(s), finish reason {:?}",
            tool_calls.len(),
            choice.finish_reason
        );

        Ok(ModelResponse {
            content: choice.message.content,
            tool_calls,
        })
    }
}

fn to_request_message(message: &Message) -> Result<ChatCompletionRequestMessage> {
    let built: ChatCompletionRequestMessage = match message {
        Message::System(content) => ChatCompletionRequestSystemMessageArgs::default()
            .content(content.clone())
            .build()
            .map_err(model_error)?
            .into(),
        Message::User(content) => ChatCompletionRequestUserMessageArgs::default()
            .content(content.clone())
            .build()
            .map_err(model_error)?
            .into(),
        Message::Assistant {
            content,
            tool_calls,
        } => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            if let Some(content) = content {
                args.content(content.clone());
            }
            if !tool_calls.is_empty() {
                args.tool_calls(
                    tool_calls
                        .iter()
                        .map(|call| ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.clone(),
                            },
                        })
                        .collect::<Vec<_>>(),
                );
            }
            args.build().map_err(model_error)?.into()
        }
        Message::Tool { call_id, content } => ChatCompletionRequestToolMessageArgs::default()
            .tool_call_id(call_id.clone())
            .content(content.clone())
            .build()
            .map_err(model_error)?
            .into(),
    };
    Ok(built)
}

fn to_chat_tool(tool: &ToolDefinition) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: tool.name.clone(),
            description: Some(tool.description.clone()),
            parameters: Some(tool.parameters.clone()),
            strict: None,
        },
    }
}

/// Request building failed before anything was sent.
fn model_error(error: OpenAIError) -> VidmetaError {
    VidmetaError::model(error.to_string())
}
