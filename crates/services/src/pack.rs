use std::path::Path;

use serde::{Deserialize, Serialize};

use quiz_core::model::{ConfigError, QuizDraft, SessionConfig};

use crate::error::ServiceError;

/// Subject area of a content pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Finance,
    AiLiteracy,
    MoralValues,
    Sustainability,
    Health,
    CivicResponsibility,
}

/// A named set of questions plus session knobs, as stored in a JSON file.
///
/// ```json
/// {
///   "id": "money-basics",
///   "title": "Money Basics",
///   "topic": "finance",
///   "round_time_secs": 20,
///   "pass_threshold": 3,
///   "questions": [
///     { "id": "q1", "prompt": "...", "options": [{ "id": "a", "label": "...", "is_correct": true }, ...] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizPack {
    pub id: String,
    pub title: String,
    pub topic: Topic,
    #[serde(flatten)]
    pub quiz: QuizDraft,
}

impl QuizPack {
    /// Parse a pack from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Json` if the text is not a well-formed pack.
    pub fn from_json_str(raw: &str) -> Result<Self, ServiceError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Read and parse a pack file.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Io` if the file cannot be read and
    /// `ServiceError::Json` if it cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ServiceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let pack = Self::from_json_str(&raw)?;
        tracing::debug!(
            pack_id = %pack.id,
            questions = pack.quiz.questions.len(),
            "loaded quiz pack"
        );
        Ok(pack)
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.quiz.questions.len()
    }

    /// Validate the pack's questions and settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for any invalid question or setting.
    pub fn into_config(self) -> Result<SessionConfig, ConfigError> {
        self.quiz.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACK: &str = r#"{
        "id": "eco-kids",
        "title": "Eco Kids",
        "topic": "sustainability",
        "round_time_secs": 15,
        "questions": [
            {
                "id": "bottle",
                "prompt": "Where does an empty plastic bottle go?",
                "options": [
                    { "id": "recycle", "label": "Recycling bin", "icon": "♻️", "is_correct": true },
                    { "id": "street", "label": "On the street" }
                ]
            }
        ]
    }"#;

    #[test]
    fn pack_parses_and_validates() {
        let pack = QuizPack::from_json_str(PACK).unwrap();
        assert_eq!(pack.topic, Topic::Sustainability);
        assert_eq!(pack.question_count(), 1);
        assert_eq!(pack.quiz.round_time_secs, Some(15));
        assert!(!pack.quiz.auto_advance);

        let config = pack.into_config().unwrap();
        assert!(config.is_timed());
        assert_eq!(config.pass_threshold(), None);
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = QuizPack::from_json_str("{ \"id\": 1 }").unwrap_err();
        assert!(matches!(err, ServiceError::Json(_)));
    }

    #[test]
    fn unknown_topic_is_rejected() {
        let raw = PACK.replace("sustainability", "astrology");
        assert!(QuizPack::from_json_str(&raw).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = QuizPack::load("does/not/exist.json").unwrap_err();
        match err {
            ServiceError::Io { path, .. } => assert!(path.ends_with("exist.json")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_questions_surface_config_error() {
        let raw = PACK.replace("\"is_correct\": true", "\"is_correct\": false");
        let pack = QuizPack::from_json_str(&raw).unwrap();
        let err = pack.into_config().unwrap_err();
        assert!(matches!(err, ConfigError::NoCorrectOption { .. }));
    }
}
