//! Model client implementations.
//!
//! Concrete implementations of the [`ModelClient`] trait defined in
//! `patter-core`. The engine speaks the OpenAI chat-completions dialect,
//! which most hosted gateways and self-hosted inference servers accept.
//!
//! [`ModelClient`]: patter_core::llm::client::ModelClient

pub mod openai_compat;

use patter_core::llm::boxed::BoxModelClient;
use patter_types::config::ModelConfig;
use patter_types::error::ModelError;
use secrecy::SecretString;

use self::openai_compat::OpenAiCompatClient;

/// Create a [`BoxModelClient`] from engine model configuration.
///
/// The API key is read from the environment variable named by
/// `config.api_key_env`; a missing or empty key is an authentication
/// failure, caught here rather than on the first request.
pub fn create_model_client(config: &ModelConfig) -> Result<BoxModelClient, ModelError> {
    let key = match std::env::var(&config.api_key_env) {
        Ok(val) if !val.is_empty() => SecretString::from(val),
        _ => return Err(ModelError::AuthenticationFailed),
    };
    let client = OpenAiCompatClient::new(key).with_base_url(&config.base_url);
    Ok(BoxModelClient::new(client))
}
