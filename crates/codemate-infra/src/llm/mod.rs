//! Completion provider implementations.
//!
//! Contains the Gemini implementation of the [`CompletionProvider`] trait
//! defined in `codemate-core`, and [`create_provider`], which builds it from
//! [`AppConfig`] and the environment-supplied key.
//!
//! [`CompletionProvider`]: codemate_core::llm::provider::CompletionProvider

pub mod gemini;

use std::time::Duration;

use secrecy::SecretString;

use codemate_core::llm::box_provider::BoxCompletionProvider;
use codemate_types::config::AppConfig;
use codemate_types::llm::LlmError;

use self::gemini::GeminiProvider;

/// Create the completion provider described by `config`.
///
/// A missing `api_key` is logged and tolerated; calls then fail upstream
/// with an authentication error.
pub fn create_provider(
    config: &AppConfig,
    api_key: Option<SecretString>,
) -> Result<BoxCompletionProvider, LlmError> {
    if api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; completion calls will be unauthenticated");
    }

    let provider = GeminiProvider::new(api_key, Duration::from_secs(config.request_timeout_secs))?
        .with_base_url(config.api_base_url.clone());
    Ok(BoxCompletionProvider::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_provider_gemini() {
        let provider =
            create_provider(&AppConfig::default(), Some(SecretString::from("key"))).unwrap();
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn test_create_provider_without_key() {
        let provider = create_provider(&AppConfig::default(), None).unwrap();
        assert_eq!(provider.name(), "gemini");
    }
}
