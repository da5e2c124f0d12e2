use std::env;

use debt_chat_openai_model::{OpenAIConfig, OpenAIConfigBuilder};

use crate::fiscal_data::DEFAULT_BASE_URL;

const API_KEY_VAR: &str = "OPENAI_API_KEY";
const MODEL_VAR: &str = "OPENAI_MODEL";
const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
const FISCAL_DATA_BASE_URL_VAR: &str = "FISCAL_DATA_BASE_URL";

/// Errors raised while reading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("{0} environment variable is not set")]
    Missing(&'static str),
}

/// Runtime configuration of the assistant.
#[derive(Clone, Debug)]
pub struct Config {
    /// Settings of the chat model.
    pub openai: OpenAIConfig,
    /// Host serving the Fiscal Data API.
    pub fiscal_data_base_url: String,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// `OPENAI_API_KEY` is required. `OPENAI_MODEL`, `OPENAI_BASE_URL` and
    /// `FISCAL_DATA_BASE_URL` override the defaults when set.
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable
    /// name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = var(API_KEY_VAR).ok_or(ConfigError::Missing(API_KEY_VAR))?;
        let mut openai = OpenAIConfigBuilder::with_api_key(api_key);
        if let Some(model) = var(MODEL_VAR) {
            openai = openai.with_model(model);
        }
        if let Some(base_url) = var(BASE_URL_VAR) {
            openai = openai.with_base_url(base_url);
        }
        let fiscal_data_base_url = var(FISCAL_DATA_BASE_URL_VAR)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());

        Ok(Self {
            openai: openai.build(),
            fiscal_data_base_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(
        vars: &[(&str, &str)],
    ) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_api_key_is_required() {
        let result = Config::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(ConfigError::Missing("OPENAI_API_KEY"))));

        let result = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults() {
        let config =
            Config::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")]))
                .unwrap();
        assert_eq!(config.openai.model(), "gpt-4o-mini");
        assert_eq!(config.openai.base_url(), "https://api.openai.com/v1");
        assert_eq!(config.fiscal_data_base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4.1"),
            ("OPENAI_BASE_URL", "http://localhost:1234/v1/"),
            ("FISCAL_DATA_BASE_URL", "http://localhost:8080"),
            ("UNRELATED", "ignored"),
        ]))
        .unwrap();
        assert_eq!(config.openai.model(), "gpt-4.1");
        assert_eq!(config.openai.base_url(), "http://localhost:1234/v1");
        assert_eq!(config.fiscal_data_base_url, "http://localhost:8080");
        assert!(!format!("{config:?}").contains("sk-test"));
    }
}
