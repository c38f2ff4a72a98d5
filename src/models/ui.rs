use serde::{Deserialize, Serialize};

/// Inbound chat request posted by the UI
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    /// Full conversation, oldest first
    pub messages: Vec<ConversationMessage>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversationMessage {
    /// Client-side message id (not forwarded upstream)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub role: Role,

    /// Ordered message parts; only text parts are forwarded
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

impl ConversationMessage {
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: None,
            role,
            parts: vec![ContentPart::Text { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// One part of a UI message
///
/// Anything that is not a text part (reasoning, files, tool invocations,
/// step markers, ...) lands in `Other` and is skipped during flattening.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(other)]
    Other,
}

impl ContentPart {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text { text } => Some(text),
            ContentPart::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_mixed_parts() {
        let msg: ConversationMessage = serde_json::from_value(json!({
            "id": "m1",
            "role": "user",
            "parts": [
                {"type": "text", "text": "Hi"},
                {"type": "file", "url": "https://example.com/a.png", "mediaType": "image/png"},
                {"type": "step-start"}
            ]
        }))
        .unwrap();

        assert_eq!(msg.id.as_deref(), Some("m1"));
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.parts.len(), 3);
        assert_eq!(msg.parts[0].as_text(), Some("Hi"));
        assert_eq!(msg.parts[1], ContentPart::Other);
        assert_eq!(msg.parts[2], ContentPart::Other);
    }

    #[test]
    fn test_missing_parts_defaults_to_empty() {
        let msg: ConversationMessage =
            serde_json::from_value(json!({"role": "assistant"})).unwrap();
        assert!(msg.parts.is_empty());
        assert!(msg.id.is_none());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result: Result<ConversationMessage, _> =
            serde_json::from_value(json!({"role": "tool", "parts": []}));
        assert!(result.is_err());
    }
}
