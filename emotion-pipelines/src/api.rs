//! Request validation and JSON response envelopes for a transport layer.
//!
//! Nothing here opens a socket. A server deserializes a request body into a
//! [`serde_json::Value`], passes it to the `validate_*` functions (or to the
//! `handle_*` methods of [`EmotionService`](crate::service::EmotionService)) and
//! serializes the envelope it gets back.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::conversation::ConversationSummary;
use crate::error::ValidationError;
use crate::history::HistoryEntry;
use crate::labels::{EmotionDescriptor, EmotionLabel};
use crate::pipelines::emotion::{Prediction, PredictionResult};

pub const SERVICE_NAME: &str = "Emotion Detection API";
pub const HEALTHY: &str = "healthy";
pub const HISTORY_CLEARED: &str = "History cleared successfully";

// ============ Requests ============

/// A validated single-text prediction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictRequest {
    /// The text with surrounding whitespace removed.
    pub text: String,
    pub save_history: bool,
}

fn body(body: Option<&Value>) -> Option<&Map<String, Value>> {
    body.and_then(Value::as_object).filter(|fields| !fields.is_empty())
}

/// JSON truthiness, used for loosely typed flags.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

pub fn validate_predict(
    request: Option<&Value>,
    max_chars: usize,
) -> Result<PredictRequest, ValidationError> {
    let fields = body(request).ok_or(ValidationError::NoData)?;

    let text = fields
        .get("text")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or(ValidationError::TextRequired)?;

    if text.chars().count() > max_chars {
        return Err(ValidationError::TextTooLong { max: max_chars });
    }

    Ok(PredictRequest {
        text: text.to_string(),
        save_history: fields.get("save_history").map_or(true, truthy),
    })
}

/// Texts of a batch request. Items that are not strings become empty texts, which
/// then fail individually.
pub fn validate_batch(
    request: Option<&Value>,
    max_batch: usize,
) -> Result<Vec<String>, ValidationError> {
    let texts = body(request)
        .and_then(|fields| fields.get("texts"))
        .ok_or(ValidationError::TextsRequired)?
        .as_array()
        .ok_or(ValidationError::TextsNotArray)?;

    if texts.len() > max_batch {
        return Err(ValidationError::BatchTooLarge {
            max: max_batch,
            actual: texts.len(),
        });
    }

    Ok(texts
        .iter()
        .map(|text| text.as_str().unwrap_or_default().to_string())
        .collect())
}

pub fn validate_conversation(request: Option<&Value>) -> Result<&[Value], ValidationError> {
    body(request)
        .and_then(|fields| fields.get("messages"))
        .ok_or(ValidationError::MessagesRequired)?
        .as_array()
        .map(Vec::as_slice)
        .ok_or(ValidationError::MessagesNotArray)
}

// ============ Responses ============

/// `{"success": true, ...body}`.
#[derive(Debug, Clone, Serialize)]
pub struct Success<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Success<T> {
    pub fn new(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}

/// `{"success": false, "error": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

impl From<ValidationError> for ErrorResponse {
    fn from(value: ValidationError) -> Self {
        Self::new(value.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PredictResponse {
    Success(Success<Prediction>),
    Failure(ErrorResponse),
}

impl PredictResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, PredictResponse::Success(_))
    }
}

impl From<PredictionResult> for PredictResponse {
    fn from(result: PredictionResult) -> Self {
        match result {
            Ok(prediction) => PredictResponse::Success(Success::new(prediction)),
            Err(error) => PredictResponse::Failure(ErrorResponse::new(error.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    pub count: usize,
    pub results: Vec<PredictResponse>,
}

impl BatchResponse {
    pub fn new(results: Vec<PredictionResult>) -> Self {
        Self {
            success: true,
            count: results.len(),
            results: results.into_iter().map(PredictResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub count: usize,
    pub history: Vec<HistoryEntry>,
}

impl HistoryResponse {
    pub fn new(history: Vec<HistoryEntry>) -> Self {
        Self {
            success: true,
            count: history.len(),
            history,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub message: &'static str,
}

impl Default for ClearResponse {
    fn default() -> Self {
        Self {
            success: true,
            message: HISTORY_CLEARED,
        }
    }
}

pub type ConversationResponse = Success<ConversationSummary>;

/// Known emotions keyed by label, in display order.
#[derive(Debug, Clone)]
pub struct EmotionCatalog(pub Vec<EmotionDescriptor>);

impl Serialize for EmotionCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for descriptor in &self.0 {
            map.serialize_entry(descriptor.label.as_str(), &descriptor.profile)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmotionsResponse {
    pub success: bool,
    pub emotions: EmotionCatalog,
    pub count: usize,
}

impl EmotionsResponse {
    pub fn new(catalog: Vec<EmotionDescriptor>) -> Self {
        Self {
            success: true,
            count: catalog.len(),
            emotions: EmotionCatalog(catalog),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub service: &'static str,
    pub version: &'static str,
    pub model_loaded: bool,
    pub model_type: Option<String>,
    pub supported_emotions: Vec<EmotionLabel>,
}
