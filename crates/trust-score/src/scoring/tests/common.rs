use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::{header, Request};
use axum::response::Response;
use serde_json::Value;

use crate::scoring::classifier::{
    ClassProbabilities, Classifier, ClassifierError, FeatureWeight, LogisticModel,
    LogisticModelArtifact,
};
use crate::scoring::domain::{FeatureName, FeatureVector, ScoringRequest};
use crate::scoring::pipeline::ScoringPipeline;
use crate::scoring::reference::ReferenceStore;

pub(super) const REFERENCE_CSV: &str = "policy_number,policy_bind_date,policy_state\n\
P-100,2020-01-10,OH\n\
P-200,2021-06-01,IN\n\
P-300,,IL\n\
521585,2022-10-17,OH\n";

pub(super) fn reference_store() -> Arc<ReferenceStore> {
    let store = ReferenceStore::from_reader(Cursor::new(REFERENCE_CSV)).expect("reference data loads");
    Arc::new(store)
}

/// Classifier returning a constant fraud probability and counting invocations.
pub(super) struct FixedClassifier {
    pub(super) fraud: f64,
    pub(super) calls: AtomicUsize,
}

impl FixedClassifier {
    pub(super) fn new(fraud: f64) -> Self {
        Self {
            fraud,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Classifier for FixedClassifier {
    fn predict_proba(
        &self,
        _features: &FeatureVector,
    ) -> Result<ClassProbabilities, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ClassProbabilities {
            legitimate: 1.0 - self.fraud,
            fraud: self.fraud,
        })
    }
}

pub(super) struct UnavailableClassifier;

impl Classifier for UnavailableClassifier {
    fn predict_proba(
        &self,
        _features: &FeatureVector,
    ) -> Result<ClassProbabilities, ClassifierError> {
        Err(ClassifierError::Unavailable("model offline".to_string()))
    }
}

pub(super) fn logistic_model() -> LogisticModel {
    LogisticModel::from_artifact(LogisticModelArtifact {
        model: "logistic_regression".to_string(),
        version: Some("fixture".to_string()),
        intercept: -1.2,
        features: vec![
            FeatureWeight {
                name: FeatureName::PolicyBindDate,
                mean: 400.0,
                scale: 300.0,
                coefficient: -0.2,
            },
            FeatureWeight {
                name: FeatureName::IncidentDate,
                mean: 900.0,
                scale: 250.0,
                coefficient: 0.15,
            },
            FeatureWeight {
                name: FeatureName::PropertyClaim,
                mean: 7000.0,
                scale: 4000.0,
                coefficient: 0.8,
            },
            FeatureWeight {
                name: FeatureName::TotalClaimAmount,
                mean: 7000.0,
                scale: 4000.0,
                coefficient: 0.3,
            },
        ],
    })
    .expect("fixture artifact is valid")
}

pub(super) fn fixed_pipeline(
    fraud: f64,
) -> (ScoringPipeline<FixedClassifier>, Arc<FixedClassifier>) {
    let classifier = Arc::new(FixedClassifier::new(fraud));
    let pipeline = ScoringPipeline::new(reference_store(), classifier.clone());
    (pipeline, classifier)
}

pub(super) fn logistic_pipeline() -> ScoringPipeline<LogisticModel> {
    ScoringPipeline::new(reference_store(), Arc::new(logistic_model()))
}

pub(super) fn predict_request(body: impl Into<axum::body::Body>) -> Request<axum::body::Body> {
    Request::post("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn request_body(request: ScoringRequest) -> Value {
    serde_json::to_value(request).expect("request serializes")
}
