use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Which text-generation backend normalizes resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Anthropic,
    Gemini,
}

impl FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(LlmProvider::Anthropic),
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            other => bail!("LLM_PROVIDER must be 'anthropic' or 'gemini', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_provider: LlmProvider,
    pub anthropic_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub llm_timeout_secs: u64,
    pub upload_dir: String,
    pub output_dir: String,
    pub public_base_url: String,
    pub max_concurrent_files: usize,
    pub max_upload_bytes: usize,
    pub output_retention_secs: u64,
    pub cors_allowed_origin: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let llm_provider: LlmProvider = env_or("LLM_PROVIDER", LlmProvider::Anthropic)?;
        let anthropic_api_key = optional_env("ANTHROPIC_API_KEY");
        let gemini_api_key = optional_env("GEMINI_API_KEY");

        match llm_provider {
            LlmProvider::Anthropic if anthropic_api_key.is_none() => {
                require_env("ANTHROPIC_API_KEY")?;
            }
            LlmProvider::Gemini if gemini_api_key.is_none() => {
                require_env("GEMINI_API_KEY")?;
            }
            _ => {}
        }

        let port: u16 = env_or("PORT", 8080)?;
        let max_concurrent_files: usize = env_or("MAX_CONCURRENT_FILES", 4)?;
        if max_concurrent_files == 0 {
            bail!("MAX_CONCURRENT_FILES must be at least 1");
        }

        Ok(Config {
            llm_provider,
            anthropic_api_key,
            gemini_api_key,
            gemini_model: optional_env("GEMINI_MODEL")
                .unwrap_or_else(|| "gemini-2.5-pro".to_string()),
            llm_timeout_secs: env_or("LLM_TIMEOUT_SECS", 120)?,
            upload_dir: optional_env("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string()),
            output_dir: optional_env("OUTPUT_DIR").unwrap_or_else(|| "outputs".to_string()),
            public_base_url: optional_env("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| format!("http://localhost:{port}")),
            max_concurrent_files,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            output_retention_secs: env_or("OUTPUT_RETENTION_SECS", 86_400)?,
            cors_allowed_origin: optional_env("CORS_ALLOWED_ORIGIN"),
            port,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    /// `None` when output sweeping is disabled.
    pub fn output_retention(&self) -> Option<Duration> {
        (self.output_retention_secs > 0).then(|| Duration::from_secs(self.output_retention_secs))
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{raw}': {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parses_case_insensitively() {
        assert_eq!("Gemini".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
        assert_eq!(
            " anthropic ".parse::<LlmProvider>().unwrap(),
            LlmProvider::Anthropic
        );
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let err = "openai".parse::<LlmProvider>().unwrap_err();
        assert!(err.to_string().contains("LLM_PROVIDER"));
    }

    #[test]
    fn test_env_or_falls_back_to_default_when_unset() {
        let value: u64 = env_or("ANONYMIZER_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }
}
