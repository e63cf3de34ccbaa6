use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, error, info};

use super::classifier::{Classifier, ClassifierError};
use super::domain::{FeatureVector, PolicyNumber, ScoringRequest, ScoringResult, ValidatedRequest};
use super::features::derive_features;
use super::reference::ReferenceStore;

/// Per-request knobs that do not change the score itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Delay injected after validation; zero disables it.
    pub simulated_latency: Duration,
}

/// Validates requests, derives features against the reference store, and scores them.
pub struct ScoringPipeline<C> {
    store: Arc<ReferenceStore>,
    classifier: Arc<C>,
    options: PipelineOptions,
}

impl<C> ScoringPipeline<C>
where
    C: Classifier + 'static,
{
    pub fn new(store: Arc<ReferenceStore>, classifier: Arc<C>) -> Self {
        Self::with_options(store, classifier, PipelineOptions::default())
    }

    pub fn with_options(
        store: Arc<ReferenceStore>,
        classifier: Arc<C>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            store,
            classifier,
            options,
        }
    }

    pub fn store(&self) -> &ReferenceStore {
        &self.store
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn validate(&self, request: &ScoringRequest) -> Result<ValidatedRequest, ScoringError> {
        validate(request)
    }

    pub fn derive_features(
        &self,
        request: &ValidatedRequest,
    ) -> Result<FeatureVector, ScoringError> {
        derive_features(request, &self.store)
    }

    /// Trust score for a feature row: `100 - fraud%`, rounded to two decimals.
    pub fn score(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        let probabilities = self
            .classifier
            .predict_proba(features)
            .map_err(InternalError::from)?;

        let fraud = probabilities.fraud;
        if !(0.0..=1.0).contains(&fraud) {
            return Err(InternalError::InvalidProbability(fraud).into());
        }

        Ok(trust_score(fraud))
    }

    /// Run the full validate, lookup, derive, and score sequence for one request.
    pub async fn handle(&self, request: ScoringRequest) -> Result<ScoringResult, ScoringError> {
        let started = Instant::now();
        let outcome = self.run(&request, started).await;

        match &outcome {
            Ok(result) => info!(
                policy_number = %result.policy_number,
                trust_score = result.trust_score,
                "prediction served"
            ),
            Err(ScoringError::Internal(err)) => error!(error = %err, "prediction failed"),
            Err(err) => debug!(error = %err, "prediction rejected"),
        }

        outcome
    }

    async fn run(
        &self,
        request: &ScoringRequest,
        started: Instant,
    ) -> Result<ScoringResult, ScoringError> {
        let validated = self.validate(request)?;

        let latency = self.options.simulated_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let features = self.derive_features(&validated)?;
        debug!(?features, "derived model input");
        let trust_score = self.score(&features)?;

        let processing_time_seconds = if latency.is_zero() {
            None
        } else {
            Some(round_to(started.elapsed().as_secs_f64(), 3))
        };

        Ok(ScoringResult {
            policy_number: validated.policy_number,
            trust_score,
            incident_date: validated.incident_date,
            processing_time_seconds,
        })
    }
}

/// Check the three mandatory fields for presence and truthiness, then type them.
pub fn validate(request: &ScoringRequest) -> Result<ValidatedRequest, ScoringError> {
    let (Some(policy_number), Some(incident_date), Some(property_claim)) = (
        request.policy_number.as_ref().filter(|value| is_truthy(value)),
        request.incident_date.as_ref().filter(|value| is_truthy(value)),
        request.property_claim.as_ref().filter(|value| is_truthy(value)),
    ) else {
        return Err(ScoringError::MissingFields);
    };

    let policy_number = match policy_number {
        Value::String(raw) => PolicyNumber::new(raw),
        Value::Number(number) => PolicyNumber::new(number_key(number)),
        _ => {
            return Err(InternalError::InvalidField {
                field: "policy_number",
                expected: "string or integer",
            }
            .into())
        }
    };

    let Value::String(incident_date) = incident_date else {
        return Err(InternalError::InvalidField {
            field: "incident_date",
            expected: "YYYY-MM-DD string",
        }
        .into());
    };

    let property_claim = property_claim
        .as_f64()
        .filter(|amount| amount.is_finite())
        .ok_or(InternalError::InvalidField {
            field: "property_claim",
            expected: "number",
        })?;

    Ok(ValidatedRequest {
        policy_number,
        incident_date: incident_date.clone(),
        property_claim,
    })
}

pub fn trust_score(fraud_probability: f64) -> f64 {
    round_to(100.0 - fraud_probability * 100.0, 2)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(true, |n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Integral JSON numbers address the same record as their decimal text.
fn number_key(number: &serde_json::Number) -> String {
    if let Some(value) = number.as_i64() {
        return value.to_string();
    }
    if let Some(value) = number.as_u64() {
        return value.to_string();
    }
    match number.as_f64() {
        Some(value) if value.fract() == 0.0 && value.abs() < i64::MAX as f64 => {
            (value as i64).to_string()
        }
        _ => number.to_string(),
    }
}

/// Error raised by the scoring pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("missing required fields")]
    MissingFields,
    #[error("policy {0} not found in reference data")]
    PolicyNotFound(PolicyNumber),
    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// Failures that surface to callers as server errors, message included.
#[derive(Debug, thiserror::Error)]
pub enum InternalError {
    #[error("request body is not a valid scoring payload: {0}")]
    MalformedBody(String),
    #[error("field '{field}' must be a {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
    #[error("incident_date '{raw}' does not match format '%Y-%m-%d': {source}")]
    InvalidIncidentDate {
        raw: String,
        source: chrono::ParseError,
    },
    #[error("policy {0} has no usable bind date")]
    MissingBindDate(PolicyNumber),
    #[error("reference data has no usable bind dates")]
    MissingEpoch,
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error("classifier returned fraud probability {0} outside [0, 1]")]
    InvalidProbability(f64),
}
