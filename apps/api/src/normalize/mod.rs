//! Schema Normalizer: turns extracted resume text into a validated `ResumeRecord`.
//!
//! Flow: build anonymization prompt → generation call (bounded by a timeout)
//!       → strip code fences → parse JSON → require an object with `name`
//!       → strict typed decode.
//!
//! Any failure along the way is a `NormalizationError`; a partially-populated
//! record is never returned. There is no automatic retry of malformed output.

pub mod prompts;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::errors::PipelineError;
use crate::llm_client::{strip_json_fences, GenerationHints, LlmError, TextGenerator};
use crate::models::document::ExtractedText;
use crate::models::resume::ResumeRecord;
use crate::normalize::prompts::{ANONYMIZE_PROMPT, ANONYMIZE_SYSTEM};

#[derive(Clone)]
pub struct Normalizer {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl Normalizer {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub fn backend(&self) -> &'static str {
        self.generator.backend()
    }

    pub async fn normalize(&self, text: &ExtractedText) -> Result<ResumeRecord, PipelineError> {
        let prompt = ANONYMIZE_PROMPT.replace("{resume_text}", text.as_str());

        let raw = tokio::time::timeout(
            self.timeout,
            self.generator
                .generate(ANONYMIZE_SYSTEM, &prompt, &GenerationHints::json()),
        )
        .await
        .map_err(|_| LlmError::Timeout(self.timeout.as_secs()))
        .and_then(|result| result)
        .map_err(|e| PipelineError::Normalization(format!("generation call failed: {e}")))?;

        debug!("Generation response: {raw}");

        let record = parse_response(&raw)?;
        info!(
            "Normalized resume via {}: {} skills, {} experience, {} education, {} projects",
            self.backend(),
            record.skills.len(),
            record.experience.len(),
            record.education.len(),
            record.projects.len()
        );
        Ok(record)
    }
}

/// Parses a raw generation response into a `ResumeRecord`.
pub fn parse_response(raw: &str) -> Result<ResumeRecord, PipelineError> {
    let cleaned = strip_json_fences(raw);

    let value: Value = serde_json::from_str(cleaned).map_err(|e| {
        PipelineError::Normalization(format!("response is not valid JSON: {e}"))
    })?;

    let map = match value {
        Value::Object(map) => lowercase_keys(map),
        other => {
            return Err(PipelineError::Normalization(format!(
                "expected a JSON object, got {}",
                json_type(&other)
            )))
        }
    };

    match map.get("name") {
        Some(Value::String(_)) => {}
        Some(other) => {
            return Err(PipelineError::Normalization(format!(
                "`name` must be a string, got {}",
                json_type(other)
            )))
        }
        None => {
            return Err(PipelineError::Normalization(
                "response is missing the required `name` field".to_string(),
            ))
        }
    }

    serde_json::from_value(Value::Object(map)).map_err(|e| {
        PipelineError::Normalization(format!("response does not match the resume schema: {e}"))
    })
}

/// Lowercases object keys at the top level and inside top-level arrays of objects.
/// An exact lowercase key wins over a differently-cased duplicate.
fn lowercase_keys(map: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        let lowered = key.to_lowercase();
        let value = match value {
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(entry) => Value::Object(lowercase_entry_keys(entry)),
                        other => other,
                    })
                    .collect(),
            ),
            other => other,
        };
        if lowered == key || !out.contains_key(&lowered) {
            out.insert(lowered, value);
        }
    }
    out
}

fn lowercase_entry_keys(entry: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::with_capacity(entry.len());
    for (key, value) in entry {
        let lowered = key.to_lowercase();
        if lowered == key || !out.contains_key(&lowered) {
            out.insert(lowered, value);
        }
    }
    out
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::llm_client::testing::{CannedGenerator, FailingGenerator, StalledGenerator};
    use crate::models::resume::Technologies;

    const FULL_RESPONSE: &str = r#"{
        "name": "Jane Doe",
        "summary": "Backend engineer.",
        "skills": ["Rust", "PostgreSQL"],
        "experience": [{"job_title": "Engineer", "company": "Acme", "dates": "2020-2023",
                        "description": "Built X\nLed Y"}],
        "education": [{"degree": "BSc", "school": "State U", "dates": "2016-2020"}],
        "projects": [{"title": "Crawler", "technologies": "Rust, Tokio"}],
        "achievements": ["Speaker at RustConf"]
    }"#;

    fn text(s: &str) -> ExtractedText {
        ExtractedText::new(s.to_string()).unwrap()
    }

    #[test]
    fn test_parses_full_response() {
        let record = parse_response(FULL_RESPONSE).unwrap();
        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.skills, vec!["Rust", "PostgreSQL"]);
        assert_eq!(record.experience[0].company.as_deref(), Some("Acme"));
        assert_eq!(record.education[0].description, None);
        assert_eq!(
            record.projects[0].technologies,
            Some(Technologies::Joined("Rust, Tokio".to_string()))
        );
        assert_eq!(record.achievements.len(), 1);
    }

    #[test]
    fn test_strips_code_fences_before_parsing() {
        let fenced = format!("```json\n{FULL_RESPONSE}\n```");
        assert_eq!(parse_response(&fenced).unwrap().name, "Jane Doe");
    }

    #[test]
    fn test_missing_sequences_default_to_empty() {
        let record = parse_response(r#"{"name": "Jane Doe"}"#).unwrap();
        assert!(record.skills.is_empty());
        assert!(record.experience.is_empty());
        assert!(record.projects.is_empty());
    }

    #[test]
    fn test_capitalized_keys_are_accepted() {
        let record = parse_response(
            r#"{"Name": "Jane Doe", "Skills": ["Go"],
                "Experience": [{"Job_Title": "Dev", "Company": "Acme"}]}"#,
        )
        .unwrap();
        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.skills, vec!["Go"]);
        assert_eq!(record.experience[0].job_title.as_deref(), Some("Dev"));
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        let record =
            parse_response(r#"{"name": "Jane Doe", "email": "jane@example.com"}"#).unwrap();
        let reserialized = serde_json::to_string(&record).unwrap();
        assert!(!reserialized.contains("jane@example.com"));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let err = parse_response("Sure! Here is the resume: {name: Jane}").unwrap_err();
        assert!(matches!(err, PipelineError::Normalization(_)));
    }

    #[test]
    fn test_array_response_is_rejected() {
        let err = parse_response(r#"[{"name": "Jane Doe"}]"#).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_scalar_response_is_rejected() {
        assert!(parse_response("42").is_err());
        assert!(parse_response(r#""Jane Doe""#).is_err());
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let err = parse_response(r#"{"skills": ["Rust"]}"#).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_null_name_is_rejected() {
        assert!(parse_response(r#"{"name": null}"#).is_err());
    }

    #[test]
    fn test_wrongly_typed_field_is_rejected() {
        let err =
            parse_response(r#"{"name": "Jane", "experience": [{"company": 7}]}"#).unwrap_err();
        assert!(matches!(err, PipelineError::Normalization(_)));
        assert!(parse_response(r#"{"name": "Jane", "skills": "Rust, Go"}"#).is_err());
    }

    #[tokio::test]
    async fn test_normalize_sends_resume_text_and_json_hints() {
        let generator = Arc::new(CannedGenerator::new(FULL_RESPONSE));
        let normalizer = Normalizer::new(generator.clone(), Duration::from_secs(5));

        let record = normalizer
            .normalize(&text("Jane Doe\njane@example.com\nEngineer at Acme"))
            .await
            .unwrap();

        assert_eq!(record.name, "Jane Doe");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        let seen = generator.last_request();
        assert_eq!(seen.instruction, ANONYMIZE_SYSTEM);
        assert!(seen.text.contains("Engineer at Acme"));
        assert_eq!(seen.hints, GenerationHints::json());
    }

    #[tokio::test]
    async fn test_generation_failure_is_normalization_error() {
        let normalizer = Normalizer::new(Arc::new(FailingGenerator), Duration::from_secs(5));
        let err = normalizer.normalize(&text("resume")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Normalization(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_generation_times_out() {
        let normalizer = Normalizer::new(Arc::new(StalledGenerator), Duration::from_secs(30));
        let err = normalizer.normalize(&text("resume")).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_malformed_generation_is_not_retried() {
        let generator = Arc::new(CannedGenerator::new("not json"));
        let normalizer = Normalizer::new(generator.clone(), Duration::from_secs(5));
        assert!(normalizer.normalize(&text("resume")).await.is_err());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }
}
