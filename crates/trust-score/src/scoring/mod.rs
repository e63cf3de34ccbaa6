//! Trust scoring for insurance incidents.
//!
//! A [`ReferenceStore`] of policy bind dates and a [`Classifier`] are loaded once at
//! startup and injected into a [`ScoringPipeline`], which turns each request into a
//! feature row and reports `100 - fraud%` as the trust score.

pub mod classifier;
pub mod domain;
mod features;
pub mod pipeline;
pub mod reference;
pub mod router;
pub mod startup;

#[cfg(test)]
mod tests;

pub use classifier::{
    ClassProbabilities, Classifier, ClassifierError, FeatureWeight, LogisticModel,
    LogisticModelArtifact, ModelLoadError,
};
pub use domain::{
    FeatureName, FeatureVector, PolicyNumber, PolicyRecord, ScoringRequest, ScoringResult,
    ValidatedRequest,
};
pub use pipeline::{
    trust_score, validate, InternalError, PipelineOptions, ScoringError, ScoringPipeline,
};
pub use reference::{ReferenceDataError, ReferenceStore};
pub use router::scoring_router;
pub use startup::{build_pipeline, load_classifier, load_reference_store, StartupError};
