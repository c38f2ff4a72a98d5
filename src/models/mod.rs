pub mod azure;
pub mod ui;

pub use azure::{ChatCompletion, ChatCompletionChunk, FlatMessage, ProviderRequest};
pub use ui::{ChatRequest, ContentPart, ConversationMessage, Role};
