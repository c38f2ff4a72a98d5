use crate::models::azure::{FlatMessage, ProviderRequest};
use crate::models::ui::ConversationMessage;

pub const MAX_TOKENS: u32 = 4096;
pub const TEMPERATURE: f32 = 0.7;
pub const TOP_P: f32 = 0.95;
pub const FREQUENCY_PENALTY: f32 = 0.0;
pub const PRESENCE_PENALTY: f32 = 0.0;

/// Flatten one UI message into the provider's role/content pair
///
/// Text parts are joined with a newline in their original order. Non-text
/// parts are dropped.
pub fn flatten_message(msg: &ConversationMessage) -> FlatMessage {
    let content = msg
        .parts
        .iter()
        .filter_map(|part| part.as_text())
        .collect::<Vec<_>>()
        .join("\n");

    FlatMessage {
        role: msg.role.as_str().to_string(),
        content,
    }
}

/// Flatten a whole conversation, preserving length and order
pub fn flatten_messages(messages: &[ConversationMessage]) -> Vec<FlatMessage> {
    messages.iter().map(flatten_message).collect()
}

/// Build the outbound request with the fixed generation parameters
pub fn build_provider_request(
    messages: &[ConversationMessage],
    data_sources: Option<serde_json::Value>,
    stream: bool,
) -> ProviderRequest {
    let messages = flatten_messages(messages);
    tracing::debug!(
        message_count = messages.len(),
        stream,
        has_data_sources = data_sources.is_some(),
        "Built provider request"
    );

    ProviderRequest {
        messages,
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
        top_p: TOP_P,
        frequency_penalty: FREQUENCY_PENALTY,
        presence_penalty: PRESENCE_PENALTY,
        data_sources,
        stream,
    }
}
