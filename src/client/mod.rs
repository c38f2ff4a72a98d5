pub mod azure;

pub use azure::AzureOpenAiClient;
