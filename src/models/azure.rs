use serde::{Deserialize, Serialize};

/// Azure OpenAI chat completions request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub messages: Vec<FlatMessage>,

    pub max_tokens: u32,

    pub temperature: f32,

    pub top_p: f32,

    pub frequency_penalty: f32,

    pub presence_penalty: f32,

    /// Retrieval configuration for "on your data" deployments, forwarded as-is
    #[serde(
        rename = "dataSources",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub data_sources: Option<serde_json::Value>,

    pub stream: bool,
}

/// Role/text pair in the provider's message format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatMessage {
    pub role: String,
    pub content: String,
}

/// One `data:` payload of a streaming response
///
/// Any valid JSON decodes. A payload that does not have the chunk shape
/// (`null`, a number, `{"choices": 5}`, ...) becomes an empty chunk that
/// carries no fragment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct ChatCompletionChunk {
    pub id: Option<String>,
    pub choices: Option<Vec<ChunkChoice>>,
}

#[derive(Deserialize)]
struct ChunkShape {
    #[serde(default)]
    id: Option<String>,

    #[serde(default)]
    choices: Option<Vec<ChunkChoice>>,
}

impl From<serde_json::Value> for ChatCompletionChunk {
    fn from(value: serde_json::Value) -> Self {
        match serde_json::from_value::<ChunkShape>(value) {
            Ok(shape) => Self {
                id: shape.id,
                choices: shape.choices,
            },
            Err(e) => {
                tracing::debug!("Payload is not a completion chunk: {}", e);
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Option<ChunkDelta>,

    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// Text fragment at `choices[0].delta.content`, if any
    pub fn delta_content(&self) -> Option<&str> {
        self.choices
            .as_ref()?
            .first()?
            .delta
            .as_ref()?
            .content
            .as_deref()
    }
}

/// Complete (non-streaming) chat completions response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub choices: Option<Vec<CompletionChoice>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub message: Option<CompletionMessage>,

    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletion {
    /// Full text at `choices[0].message.content`, if any
    pub fn content(&self) -> Option<&str> {
        self.choices
            .as_ref()?
            .first()?
            .message
            .as_ref()?
            .content
            .as_deref()
    }

    pub fn into_content(self) -> Option<String> {
        self.choices?.into_iter().next()?.message?.content
    }
}
