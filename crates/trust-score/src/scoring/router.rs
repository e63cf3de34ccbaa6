use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use super::classifier::Classifier;
use super::domain::ScoringRequest;
use super::pipeline::{InternalError, ScoringError, ScoringPipeline};

pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields.";
pub const POLICY_NOT_FOUND_MESSAGE: &str = "Policy number not found in dummy data.";
pub const HOME_MESSAGE: &str = "Insurance Trust Score API is running!";

/// Router builder exposing the liveness banner and the prediction endpoint.
pub fn scoring_router<C>(pipeline: Arc<ScoringPipeline<C>>) -> Router
where
    C: Classifier + 'static,
{
    Router::new()
        .route("/", get(home_handler))
        .route("/predict", post(predict_handler::<C>))
        .with_state(pipeline)
}

pub(crate) async fn home_handler() -> Json<serde_json::Value> {
    Json(json!({ "message": HOME_MESSAGE }))
}

pub(crate) async fn predict_handler<C>(
    State(pipeline): State<Arc<ScoringPipeline<C>>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response
where
    C: Classifier + 'static,
{
    let request = match payload
        .map_err(|rejection| InternalError::MalformedBody(rejection.body_text()))
        .and_then(|Json(body)| request_from_body(body))
    {
        Ok(request) => request,
        Err(error) => return ScoringError::from(error).into_response(),
    };

    match pipeline.handle(request).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Only a JSON object is a request; serde would otherwise accept arrays positionally.
fn request_from_body(body: Value) -> Result<ScoringRequest, InternalError> {
    match body {
        Value::Object(_) => serde_json::from_value(body)
            .map_err(|err| InternalError::MalformedBody(err.to_string())),
        other => Err(InternalError::MalformedBody(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl IntoResponse for ScoringError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ScoringError::MissingFields => {
                (StatusCode::BAD_REQUEST, MISSING_FIELDS_MESSAGE.to_string())
            }
            ScoringError::PolicyNotFound(_) => {
                (StatusCode::NOT_FOUND, POLICY_NOT_FOUND_MESSAGE.to_string())
            }
            ScoringError::Internal(error) => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
