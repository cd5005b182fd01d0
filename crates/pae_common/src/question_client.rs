//! Question service client.
//!
//! Provides a `QuestionSource` abstraction over the LLM-backed question
//! service, an HTTP implementation and a scripted fake for tests. Game code
//! goes through `question_or_fallback` / `quiz_or_fallback`, which never fail.

use crate::error::{PaeError, PaeResult};
use crate::questions::{fallback_question, fallback_quiz, Question, QuestionRequest, QuizQuestion};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// Question service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionServiceConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Questions requested per quiz
    pub quiz_length: usize,
}

impl Default for QuestionServiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://localhost:5000".to_string(),
            timeout_secs: 10,
            quiz_length: 3,
        }
    }
}

/// Anything that can produce questions
pub trait QuestionSource: Send + Sync {
    fn generate_question(&self, request: &QuestionRequest) -> PaeResult<Question>;

    fn generate_quiz(
        &self,
        request: &QuestionRequest,
        count: usize,
    ) -> PaeResult<Vec<QuizQuestion>>;
}

/// Where a question came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionOrigin {
    Service,
    Fallback,
}

/// Question content tagged with its origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generated<T> {
    pub content: T,
    pub origin: QuestionOrigin,
}

// ============================================================================
// HTTP client
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuizRequestBody<'a> {
    #[serde(flatten)]
    request: &'a QuestionRequest,
    count: usize,
}

pub struct HttpQuestionClient {
    config: QuestionServiceConfig,
    client: reqwest::blocking::Client,
}

impl HttpQuestionClient {
    pub fn new(config: QuestionServiceConfig) -> PaeResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PaeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    /// POST a JSON body and return the response text
    fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> PaeResult<String> {
        let url = self.url(path);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().map_err(|e| {
            if e.is_timeout() {
                PaeError::ExternalService(format!(
                    "Request timeout after {} seconds",
                    self.config.timeout_secs
                ))
            } else {
                PaeError::ExternalService(format!("Request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            return Err(PaeError::ExternalService(format!(
                "HTTP {} from question service",
                response.status()
            )));
        }

        response
            .text()
            .map_err(|e| PaeError::ExternalService(format!("Failed to read response: {}", e)))
    }
}

impl QuestionSource for HttpQuestionClient {
    fn generate_question(&self, request: &QuestionRequest) -> PaeResult<Question> {
        let text = self.post("/api/generate-question", request)?;
        parse_question(&text)
    }

    fn generate_quiz(
        &self,
        request: &QuestionRequest,
        count: usize,
    ) -> PaeResult<Vec<QuizQuestion>> {
        let text = self.post("/api/generate-quiz", &QuizRequestBody { request, count })?;
        parse_quiz(&text, count)
    }
}

/// Remove a surrounding Markdown code fence (```json ... ```), if any
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse and validate a single question from a service response body
pub fn parse_question(text: &str) -> PaeResult<Question> {
    let question: Question = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| PaeError::ExternalService(format!("Invalid question JSON: {}", e)))?;
    question
        .validate()
        .map_err(|e| PaeError::ExternalService(format!("Unusable question: {}", e)))?;
    Ok(question)
}

/// Parse and validate a quiz; extra questions beyond `count` are dropped
pub fn parse_quiz(text: &str, count: usize) -> PaeResult<Vec<QuizQuestion>> {
    let mut quiz: Vec<QuizQuestion> = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| PaeError::ExternalService(format!("Invalid quiz JSON: {}", e)))?;
    if quiz.is_empty() {
        return Err(PaeError::ExternalService("Quiz contains no questions".to_string()));
    }
    for q in &quiz {
        q.validate()
            .map_err(|e| PaeError::ExternalService(format!("Unusable quiz question: {}", e)))?;
    }
    quiz.truncate(count.max(1));
    Ok(quiz)
}

// ============================================================================
// Fallback wrappers
// ============================================================================

/// Question from `source`, or the deterministic fallback when the source is
/// absent (service disabled) or fails
pub fn question_or_fallback(
    source: Option<&dyn QuestionSource>,
    request: &QuestionRequest,
) -> Generated<Question> {
    if let Some(source) = source {
        match source.generate_question(request) {
            Ok(question) => {
                return Generated {
                    content: question,
                    origin: QuestionOrigin::Service,
                };
            }
            Err(e) => warn!("Question service failed, using fallback question: {}", e),
        }
    }
    Generated {
        content: fallback_question(request.confidence, request.difficulty),
        origin: QuestionOrigin::Fallback,
    }
}

/// Quiz from `source`, or the fallback quiz. Either way at most `count`
/// questions (minimum 1) are returned.
pub fn quiz_or_fallback(
    source: Option<&dyn QuestionSource>,
    request: &QuestionRequest,
    count: usize,
) -> Generated<Vec<QuizQuestion>> {
    let limit = count.max(1);
    if let Some(source) = source {
        match source.generate_quiz(request, limit) {
            Ok(mut quiz) => {
                quiz.truncate(limit);
                return Generated {
                    content: quiz,
                    origin: QuestionOrigin::Service,
                };
            }
            Err(e) => warn!("Question service failed, using fallback quiz: {}", e),
        }
    }
    let mut quiz = fallback_quiz(request.confidence, request.difficulty);
    quiz.truncate(limit);
    Generated {
        content: quiz,
        origin: QuestionOrigin::Fallback,
    }
}

// ============================================================================
// Fake source
// ============================================================================

/// Scripted question source for tests.
///
/// Each call pops the next scripted reply; the last reply repeats. An `Err`
/// string is returned as `PaeError::ExternalService`.
pub struct FakeQuestionSource {
    questions: Mutex<Vec<Result<Question, String>>>,
    quizzes: Mutex<Vec<Result<Vec<QuizQuestion>, String>>>,
    call_count: Mutex<usize>,
}

impl FakeQuestionSource {
    pub fn new(
        questions: Vec<Result<Question, String>>,
        quizzes: Vec<Result<Vec<QuizQuestion>, String>>,
    ) -> Self {
        Self {
            questions: Mutex::new(questions),
            quizzes: Mutex::new(quizzes),
            call_count: Mutex::new(0),
        }
    }

    /// Always answers with `question`
    pub fn always(question: Question) -> Self {
        Self::new(vec![Ok(question)], vec![])
    }

    /// Always fails
    pub fn failing(message: &str) -> Self {
        Self::new(vec![Err(message.to_string())], vec![Err(message.to_string())])
    }

    /// Number of calls made to either method
    pub fn call_count(&self) -> usize {
        self.call_count.lock().map(|c| *c).unwrap_or(0)
    }

    fn bump(&self) {
        if let Ok(mut count) = self.call_count.lock() {
            *count += 1;
        }
    }
}

fn next_reply<T: Clone>(script: &Mutex<Vec<Result<T, String>>>) -> PaeResult<T> {
    let mut replies = script
        .lock()
        .map_err(|_| PaeError::ExternalService("fake source lock poisoned".to_string()))?;
    let reply = match replies.len() {
        0 => Err("no scripted reply".to_string()),
        1 => replies[0].clone(),
        _ => replies.remove(0),
    };
    reply.map_err(PaeError::ExternalService)
}

impl QuestionSource for FakeQuestionSource {
    fn generate_question(&self, _request: &QuestionRequest) -> PaeResult<Question> {
        self.bump();
        next_reply(&self.questions)
    }

    fn generate_quiz(
        &self,
        _request: &QuestionRequest,
        _count: usize,
    ) -> PaeResult<Vec<QuizQuestion>> {
        self.bump();
        next_reply(&self.quizzes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::ConfidenceBand;
    use crate::settings::Difficulty;

    fn sample() -> Question {
        Question {
            question: "Is this region reliable?".to_string(),
            options: vec!["Yes".to_string(), "No".to_string()],
            correct_answer: "Yes".to_string(),
        }
    }

    fn request() -> QuestionRequest {
        QuestionRequest::new(ConfidenceBand::High, Difficulty::Beginner)
    }

    #[test]
    fn test_config_default() {
        let config = QuestionServiceConfig::default();
        assert!(config.enabled);
        assert_eq!(config.endpoint, "http://localhost:5000");
        assert_eq!(config.quiz_length, 3);
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n[1]\n```\n"), "[1]");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_question_fenced() {
        let body = concat!(
            "```json\n",
            r#"{"question":"Q?","options":["A","B"],"correctAnswer":"A"}"#,
            "\n```"
        );
        let q = parse_question(body).unwrap();
        assert_eq!(q.correct_answer, "A");
    }

    #[test]
    fn test_parse_question_errors_are_external() {
        assert!(matches!(parse_question("not json"), Err(PaeError::ExternalService(_))));
        let missing = r#"{"question":"Q?","options":["A","B"]}"#;
        assert!(matches!(parse_question(missing), Err(PaeError::ExternalService(_))));
        let wrong = r#"{"question":"Q?","options":["A","B"],"correctAnswer":"C"}"#;
        assert!(matches!(parse_question(wrong), Err(PaeError::ExternalService(_))));
    }

    #[test]
    fn test_parse_quiz_truncates() {
        let body = r#"[
            {"question":"1","options":["A","B"],"correctAnswer":"A","explanation":"x"},
            {"question":"2","options":["A","B"],"correctAnswer":"B"},
            {"question":"3","options":["A","B"],"correctAnswer":"A"}
        ]"#;
        let quiz = parse_quiz(body, 2).unwrap();
        assert_eq!(quiz.len(), 2);
        assert_eq!(quiz[1].explanation, "");
        assert!(parse_quiz("[]", 3).is_err());
    }

    #[test]
    fn test_question_or_fallback_uses_service() {
        let fake = FakeQuestionSource::always(sample());
        let generated = question_or_fallback(Some(&fake), &request());
        assert_eq!(generated.origin, QuestionOrigin::Service);
        assert_eq!(generated.content, sample());
        assert_eq!(fake.call_count(), 1);
    }

    #[test]
    fn test_question_or_fallback_on_failure() {
        let fake = FakeQuestionSource::failing("connection refused");
        let generated = question_or_fallback(Some(&fake), &request());
        assert_eq!(generated.origin, QuestionOrigin::Fallback);
        let expected = fallback_question(ConfidenceBand::High, Difficulty::Beginner);
        assert_eq!(generated.content, expected);
    }

    #[test]
    fn test_disabled_service_skips_source() {
        let generated = question_or_fallback(None, &request());
        assert_eq!(generated.origin, QuestionOrigin::Fallback);
        let quiz = quiz_or_fallback(None, &request(), 3);
        assert_eq!(quiz.origin, QuestionOrigin::Fallback);
        assert_eq!(quiz.content.len(), 3);
    }

    #[test]
    fn test_quiz_length_honored_on_both_paths() {
        let fallback = quiz_or_fallback(None, &request(), 1);
        assert_eq!(fallback.origin, QuestionOrigin::Fallback);
        assert_eq!(fallback.content.len(), 1);
        assert_eq!(quiz_or_fallback(None, &request(), 0).content.len(), 1);

        let long = fallback_quiz(ConfidenceBand::High, Difficulty::Beginner);
        let fake = FakeQuestionSource::new(vec![], vec![Ok(long)]);
        let served = quiz_or_fallback(Some(&fake), &request(), 2);
        assert_eq!(served.origin, QuestionOrigin::Service);
        assert_eq!(served.content.len(), 2);
    }

    #[test]
    fn test_fake_source_script_order() {
        let fake = FakeQuestionSource::new(vec![Ok(sample()), Err("boom".to_string())], vec![]);
        assert!(fake.generate_question(&request()).is_ok());
        assert!(fake.generate_question(&request()).is_err());
        assert!(fake.generate_question(&request()).is_err());
        assert!(fake.generate_quiz(&request(), 3).is_err());
        assert_eq!(fake.call_count(), 4);
    }

    #[test]
    fn test_quiz_body_flattens_request() {
        let req = request();
        let quiz_body = QuizRequestBody {
            request: &req,
            count: 5,
        };
        let body = serde_json::to_value(quiz_body).unwrap();
        assert_eq!(body["count"], 5);
        assert_eq!(body["confidence"], "high");
        assert_eq!(body["difficulty"], "beginner");
    }
}
